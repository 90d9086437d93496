use crate::oauth::RedditToken;
use std::path::{Path, PathBuf};
use threadlens_core::CoreError;
use tracing::debug;

/// JSON-file persistence for the single cached OAuth token. The only state
/// that outlives an analysis run.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted token, or `None` when none has been saved yet.
    pub fn load(&self) -> Result<Option<RedditToken>, CoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let token = serde_json::from_str(&contents)?;
        debug!(path = %self.path.display(), "Loaded token from store");
        Ok(Some(token))
    }

    pub fn save(&self, token: &RedditToken) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "Saved token to store");
        Ok(())
    }
}
