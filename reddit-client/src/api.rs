use crate::flatten::flatten_comment_tree;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use threadlens_core::{CoreError, RedditApiError, Thread};
use tracing::{debug, error, info};
use url::Url;

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
}

/// Extracts the thread id from a Reddit thread URL: the path segment right
/// after `comments`.
pub fn parse_thread_id(thread_url: &str) -> Result<String, CoreError> {
    let invalid = || {
        CoreError::RedditApi(RedditApiError::InvalidUrl {
            url: thread_url.to_string(),
        })
    };

    let url = Url::parse(thread_url).map_err(|_| invalid())?;
    let mut segments = url.path_segments().ok_or_else(invalid)?;
    segments
        .find(|segment| *segment == "comments")
        .ok_or_else(invalid)?;
    match segments.next() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(invalid()),
    }
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http_client,
            user_agent,
        })
    }

    /// One authenticated request, one attempt. Errors map straight onto the
    /// taxonomy; nothing here retries.
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if !query_params.is_empty() {
            request_builder = request_builder.query(query_params);
        }

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = request_builder.send().await.map_err(|e| {
            error!("Network error for {} {}: {}", method, endpoint, e);
            CoreError::Network(e)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        match status.as_u16() {
            401 => Err(CoreError::RedditApi(RedditApiError::InvalidToken)),
            403 => Err(CoreError::RedditApi(RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            })),
            404 => Err(CoreError::RedditApi(RedditApiError::ThreadNotFound {
                thread_id: endpoint.to_string(),
            })),
            code if status.is_server_error() => {
                Err(CoreError::RedditApi(RedditApiError::ServerError {
                    status_code: code,
                }))
            }
            code => Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Unexpected status {code} for {endpoint}"),
            })),
        }
    }

    /// Fetches one thread and its comment tree. Expects the two-element
    /// listing Reddit returns for `/comments/{id}`: thread metadata first,
    /// the comment tree second.
    pub async fn fetch_thread(
        &self,
        access_token: &str,
        thread_url: &str,
        comment_limit: u32,
    ) -> Result<Thread, CoreError> {
        let thread_id = parse_thread_id(thread_url)?;
        let endpoint = format!("/comments/{}", thread_id);
        let limit = comment_limit.to_string();

        let response = self
            .make_request(Method::GET, &endpoint, access_token, &[("limit", &limit)])
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::ThreadNotFound { .. }) => {
                    CoreError::RedditApi(RedditApiError::ThreadNotFound {
                        thread_id: thread_id.clone(),
                    })
                }
                other => other,
            })?;

        let listings: Vec<Value> = response.json().await.map_err(|e| {
            error!("Failed to parse thread response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse response for thread {thread_id}"),
            })
        })?;

        let thread = build_thread(&listings, &thread_id)?;
        info!(
            "Fetched thread \"{}\" with {} comments",
            thread.title,
            thread.comments.len()
        );
        Ok(thread)
    }
}

/// Maps the first listing element to thread metadata and the second to the
/// flattened comment sequence.
fn build_thread(listings: &[Value], thread_id: &str) -> Result<Thread, CoreError> {
    let invalid_response = |details: String| {
        CoreError::RedditApi(RedditApiError::InvalidResponse { details })
    };

    let [thread_listing, comment_listing] = listings else {
        return Err(invalid_response(format!(
            "Expected a two-element listing for thread {thread_id}, got {} elements",
            listings.len()
        )));
    };

    let listing: RedditListing<RedditPostData> =
        serde_json::from_value(thread_listing.clone()).map_err(|e| {
            error!("Failed to parse thread metadata: {}", e);
            invalid_response(format!("Malformed thread metadata for {thread_id}"))
        })?;

    let post = listing
        .data
        .children
        .into_iter()
        .next()
        .map(|child| child.data)
        .ok_or_else(|| invalid_response(format!("Thread listing for {thread_id} is empty")))?;

    Ok(Thread {
        title: post.title,
        author: post.author,
        body_text: post.selftext,
        score: post.score,
        url: format!("https://www.reddit.com{}", post.permalink),
        created_at: DateTime::<Utc>::from_timestamp(post.created_utc as i64, 0)
            .unwrap_or_default(),
        comments: flatten_comment_tree(comment_listing),
    })
}
