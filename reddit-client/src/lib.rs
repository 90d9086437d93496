pub mod api;
pub mod flatten;
pub mod oauth;
pub mod token_store;

pub use api::{parse_thread_id, RedditApiClient};
pub use flatten::flatten_comment_tree;
pub use oauth::{AuthState, RedditOAuthConfig, RedditSession, RedditToken};
pub use token_store::TokenStore;
