pub mod error;

pub use bytes::Bytes;
pub use error::{FetchError, Result};

/// Fields requested for each item of a user's media edge.
const MEDIA_FIELDS: &str = "id,media_type,media_url,thumbnail_url,caption,timestamp";

/// Fields requested for an account lookup.
const ACCOUNT_FIELDS: &str = "id,username";

/// Thin Graph API client. Issues one GET per call and hands back the raw body.
///
/// The `reqwest::Client` is owned by the caller so connection pools and
/// timeouts are configured in one place and tests can point at a local server.
#[derive(Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl GraphClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_version: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.trim_matches('/').to_string(),
        }
    }

    /// GET `{base}/{version}/{resource}` with `params` as the query string.
    ///
    /// Any non-2xx status is returned as `FetchError::HttpStatus` carrying the
    /// response body, even when that body is well-formed JSON.
    pub async fn fetch(&self, resource: &str, params: &[(&str, &str)]) -> Result<Bytes> {
        let url = self.resource_url(resource);

        let resp = self.client.get(&url).query(params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.bytes().await?)
    }

    /// Posts published on a Facebook page (feed shape).
    pub async fn page_posts(&self, page_id: &str, access_token: &str) -> Result<Bytes> {
        self.fetch(
            &format!("{page_id}/posts"),
            &[("access_token", access_token)],
        )
        .await
    }

    /// Media items of an Instagram business user (media shape).
    pub async fn user_media(&self, user_id: &str, access_token: &str) -> Result<Bytes> {
        self.fetch(
            &format!("{user_id}/media"),
            &[("fields", MEDIA_FIELDS), ("access_token", access_token)],
        )
        .await
    }

    /// Basic account record (`id`, `username`).
    pub async fn account(&self, user_id: &str, access_token: &str) -> Result<Bytes> {
        self.fetch(
            user_id,
            &[("fields", ACCOUNT_FIELDS), ("access_token", access_token)],
        )
        .await
    }

    fn resource_url(&self, resource: &str) -> String {
        let resource = resource.trim_start_matches('/');
        if self.api_version.is_empty() {
            format!("{}/{}", self.base_url, resource)
        } else {
            format!("{}/{}/{}", self.base_url, self.api_version, resource)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str, version: &str) -> GraphClient {
        GraphClient::new(reqwest::Client::new(), base, version)
    }

    #[test]
    fn resource_url_joins_base_version_and_resource() {
        let c = client("https://graph.facebook.com/", "v17.0");
        assert_eq!(
            c.resource_url("123/posts"),
            "https://graph.facebook.com/v17.0/123/posts"
        );
    }

    #[test]
    fn leading_slash_on_resource_is_ignored() {
        let c = client("https://graph.facebook.com", "/v12.0/");
        assert_eq!(
            c.resource_url("/42/media"),
            "https://graph.facebook.com/v12.0/42/media"
        );
    }

    #[test]
    fn empty_version_is_omitted() {
        let c = client("http://localhost:8080", "");
        assert_eq!(c.resource_url("me"), "http://localhost:8080/me");
    }

    #[test]
    fn status_is_exposed_only_for_http_errors() {
        let http = FetchError::HttpStatus {
            status: 400,
            body: "{}".to_string(),
        };
        assert_eq!(http.status(), Some(400));
        assert_eq!(FetchError::Transport("dns".to_string()).status(), None);
    }
}
