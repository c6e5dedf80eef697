// Fetch services: one Graph API call, then normalization.
//
// Every failure stops here. Transport errors, non-2xx statuses, empty bodies
// and unparsable payloads are logged and turned into an empty Vec, so callers
// always get a (possibly empty) batch back.

use graph_client::{Bytes, FetchError};
use socialfeed_common::{try_normalize, FeedShape, Post};
use tracing::{debug, info, warn};

use crate::traits::FeedSource;

/// Both feeds, fetched side by side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedFeeds {
    pub facebook: Vec<Post>,
    pub instagram: Vec<Post>,
}

/// Fetch and normalize a Facebook page's posts.
pub async fn fetch_facebook_posts(
    source: &dyn FeedSource,
    page_id: &str,
    access_token: &str,
) -> Vec<Post> {
    info!(page_id, "facebook: fetching posts");

    match source.page_posts(page_id, access_token).await {
        Ok(body) => absorb_normalize("facebook", &body, FeedShape::Feed),
        Err(err) => {
            log_fetch_error("facebook", &err);
            Vec::new()
        }
    }
}

/// Fetch and normalize an Instagram user's media.
pub async fn fetch_instagram_posts(
    source: &dyn FeedSource,
    user_id: &str,
    access_token: &str,
) -> Vec<Post> {
    info!(user_id, "instagram: fetching media");

    match source.user_media(user_id, access_token).await {
        Ok(body) => absorb_normalize("instagram", &body, FeedShape::Media),
        Err(err) => {
            log_fetch_error("instagram", &err);
            Vec::new()
        }
    }
}

/// Fetch both feeds concurrently. Neither result depends on the other.
pub async fn fetch_all(
    source: &dyn FeedSource,
    page_id: &str,
    user_id: &str,
    access_token: &str,
) -> FetchedFeeds {
    let (facebook, instagram) = tokio::join!(
        fetch_facebook_posts(source, page_id, access_token),
        fetch_instagram_posts(source, user_id, access_token),
    );

    FetchedFeeds {
        facebook,
        instagram,
    }
}

/// Raw account JSON (`id`, `username`) as text, or `None` on any failure.
pub async fn fetch_account(
    source: &dyn FeedSource,
    user_id: &str,
    access_token: &str,
) -> Option<String> {
    info!(user_id, "account: fetching");

    match source.account(user_id, access_token).await {
        Ok(body) if body.is_empty() => {
            warn!(platform = "account", "No data received");
            None
        }
        Ok(body) => Some(String::from_utf8_lossy(&body).into_owned()),
        Err(err) => {
            log_fetch_error("account", &err);
            None
        }
    }
}

fn absorb_normalize(platform: &'static str, body: &Bytes, shape: FeedShape) -> Vec<Post> {
    if body.is_empty() {
        warn!(platform, "No data received");
        return Vec::new();
    }

    debug!(platform, body = %String::from_utf8_lossy(body), "Received JSON");

    match try_normalize(body, shape) {
        Ok(posts) => {
            info!(platform, count = posts.len(), "Normalized posts");
            posts
        }
        Err(err) => {
            warn!(platform, error = %err, "Error parsing posts");
            Vec::new()
        }
    }
}

fn log_fetch_error(platform: &'static str, err: &FetchError) {
    match err {
        FetchError::HttpStatus { status, body } => {
            warn!(platform, status, body = %body, "Fetch failed");
        }
        FetchError::Transport(message) => {
            warn!(platform, error = %message, "Fetch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use crate::testing::MockSource;

    /// Shared buffer that tracing-subscriber writes formatted events into.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture<F: FnOnce()>(f: F) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        logs.text()
    }

    #[test]
    fn account_failure_is_not_worded_as_posts() {
        let logs = capture(|| {
            log_fetch_error("account", &FetchError::Transport("connection refused".into()));
            log_fetch_error(
                "account",
                &FetchError::HttpStatus {
                    status: 404,
                    body: "{}".into(),
                },
            );
        });

        assert_eq!(logs.matches("Fetch failed").count(), 2, "{logs}");
        assert!(!logs.contains("posts"), "{logs}");
        assert!(logs.contains("platform=\"account\""), "{logs}");
    }

    #[tokio::test]
    async fn access_token_never_reaches_the_logs() {
        let source = MockSource::new()
            .on_posts_status("page", 400, r#"{"error":{"code":190}}"#)
            .on_media("user", r#"{"data":[]}"#);

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        fetch_all(&source, "page", "user", "SECRET_TOKEN_123").await;
        fetch_account(&source, "nobody", "SECRET_TOKEN_123").await;

        let text = logs.text();
        assert!(text.contains("Fetch failed"), "{text}");
        assert!(!text.contains("SECRET_TOKEN_123"), "{text}");
    }
}
