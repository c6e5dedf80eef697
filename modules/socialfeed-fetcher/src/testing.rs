// Test mocks for the fetch services.
//
// MockSource implements FeedSource with HashMap-based id→response lookups.
// Unregistered ids fail with a transport error, like an unreachable host.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use graph_client::{Bytes, FetchError, Result};

use crate::traits::FeedSource;

#[derive(Clone)]
enum MockResponse {
    Body(Bytes),
    Status(u16, String),
    Transport(String),
}

impl MockResponse {
    fn to_result(&self) -> Result<Bytes> {
        match self {
            MockResponse::Body(b) => Ok(b.clone()),
            MockResponse::Status(status, body) => Err(FetchError::HttpStatus {
                status: *status,
                body: body.clone(),
            }),
            MockResponse::Transport(msg) => Err(FetchError::Transport(msg.clone())),
        }
    }
}

/// In-memory FeedSource. Builder pattern: `.on_posts()`, `.on_media()`,
/// `.on_account()`, plus `_status` and `_transport` failure variants.
#[derive(Default)]
pub struct MockSource {
    posts: HashMap<String, MockResponse>,
    media: HashMap<String, MockResponse>,
    accounts: HashMap<String, MockResponse>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_posts(mut self, page_id: &str, body: &str) -> Self {
        self.posts.insert(
            page_id.to_string(),
            MockResponse::Body(Bytes::from(body.to_owned())),
        );
        self
    }

    pub fn on_posts_status(mut self, page_id: &str, status: u16, body: &str) -> Self {
        self.posts.insert(
            page_id.to_string(),
            MockResponse::Status(status, body.to_string()),
        );
        self
    }

    pub fn on_media(mut self, user_id: &str, body: &str) -> Self {
        self.media.insert(
            user_id.to_string(),
            MockResponse::Body(Bytes::from(body.to_owned())),
        );
        self
    }

    pub fn on_media_transport(mut self, user_id: &str, message: &str) -> Self {
        self.media.insert(
            user_id.to_string(),
            MockResponse::Transport(message.to_string()),
        );
        self
    }

    pub fn on_account(mut self, user_id: &str, body: &str) -> Self {
        self.accounts.insert(
            user_id.to_string(),
            MockResponse::Body(Bytes::from(body.to_owned())),
        );
        self
    }

    /// Every call made so far, as `"<edge>:<id>:<token>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(
        &self,
        edge: &str,
        table: &HashMap<String, MockResponse>,
        id: &str,
        token: &str,
    ) -> Result<Bytes> {
        self.calls.lock().unwrap().push(format!("{edge}:{id}:{token}"));
        match table.get(id) {
            Some(resp) => resp.to_result(),
            None => Err(FetchError::Transport(format!("no mock registered for {edge}:{id}"))),
        }
    }
}

#[async_trait]
impl FeedSource for MockSource {
    async fn page_posts(&self, page_id: &str, access_token: &str) -> Result<Bytes> {
        self.respond("posts", &self.posts, page_id, access_token)
    }

    async fn user_media(&self, user_id: &str, access_token: &str) -> Result<Bytes> {
        self.respond("media", &self.media, user_id, access_token)
    }

    async fn account(&self, user_id: &str, access_token: &str) -> Result<Bytes> {
        self.respond("account", &self.accounts, user_id, access_token)
    }
}
