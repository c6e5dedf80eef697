pub mod config;
pub mod error;
pub mod normalize;
pub mod timestamp;
pub mod types;

pub use config::{parse_workers, Config};
pub use error::{ConfigError, NormalizeError};
pub use normalize::{
    normalize, normalize_feed, normalize_media, try_normalize, try_normalize_feed,
    try_normalize_media, FeedShape,
};
pub use timestamp::{parse_or_epoch, parse_timestamp};
pub use types::Post;
