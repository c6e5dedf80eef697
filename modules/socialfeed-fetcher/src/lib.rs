pub mod fetcher;
pub mod present;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use fetcher::{
    fetch_account, fetch_all, fetch_facebook_posts, fetch_instagram_posts, FetchedFeeds,
};
pub use present::{ConsoleSink, JsonSink, ParallelConsoleSink, PostSink};
pub use traits::FeedSource;
