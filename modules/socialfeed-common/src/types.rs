use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized post from either Graph API shape.
///
/// `created_time` is the Unix epoch when the source timestamp was missing or
/// could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub content: String,
    pub created_time: DateTime<Utc>,
}
