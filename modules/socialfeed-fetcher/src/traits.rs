// Seam between the fetch services and the Graph API transport.
//
// GraphClient is the production implementation; tests swap in MockSource
// (see testing.rs) so absorption behavior is checked without a network.

use async_trait::async_trait;
use graph_client::{Bytes, GraphClient, Result};

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Raw body of a page's posts edge (feed shape).
    async fn page_posts(&self, page_id: &str, access_token: &str) -> Result<Bytes>;

    /// Raw body of a user's media edge (media shape).
    async fn user_media(&self, user_id: &str, access_token: &str) -> Result<Bytes>;

    /// Raw body of an account lookup.
    async fn account(&self, user_id: &str, access_token: &str) -> Result<Bytes>;
}

#[async_trait]
impl FeedSource for GraphClient {
    async fn page_posts(&self, page_id: &str, access_token: &str) -> Result<Bytes> {
        GraphClient::page_posts(self, page_id, access_token).await
    }

    async fn user_media(&self, user_id: &str, access_token: &str) -> Result<Bytes> {
        GraphClient::user_media(self, user_id, access_token).await
    }

    async fn account(&self, user_id: &str, access_token: &str) -> Result<Bytes> {
        GraphClient::account(self, user_id, access_token).await
    }
}
