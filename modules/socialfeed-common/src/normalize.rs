// Maps the two Graph API envelopes ("feed" and "media") onto `Post`.
//
// Policy shared by both shapes:
// - malformed JSON, or no `data` array at the top level, fails the batch;
// - everything below `data` resolves to a fallback and the item is kept;
// - field names match case-insensitively, an exact match wins.
//
// The `normalize_*` entry points absorb batch failures into an empty
// sequence. Callers that need to tell "no posts" from "bad payload" use the
// `try_normalize_*` variants.

use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::timestamp::parse_or_epoch;
use crate::types::Post;

pub const NO_MESSAGE: &str = "No message available";
pub const NO_MEDIA_URL: &str = "No media URL available";
pub const NO_CAPTION: &str = "No caption available";

/// Which upstream envelope a payload is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    /// Page posts: `{ data: [ { id, message?, created_time? } ] }`
    Feed,
    /// Instagram media: `{ data: [ { id, media_url?, timestamp?, caption? } ] }`
    Media,
}

pub fn normalize(bytes: &[u8], shape: FeedShape) -> Vec<Post> {
    try_normalize(bytes, shape).unwrap_or_default()
}

pub fn try_normalize(bytes: &[u8], shape: FeedShape) -> Result<Vec<Post>, NormalizeError> {
    match shape {
        FeedShape::Feed => try_normalize_feed(bytes),
        FeedShape::Media => try_normalize_media(bytes),
    }
}

/// Normalize a feed payload. Never fails: batch errors yield an empty vec.
pub fn normalize_feed(bytes: &[u8]) -> Vec<Post> {
    try_normalize_feed(bytes).unwrap_or_default()
}

/// Normalize a media payload. Never fails: batch errors yield an empty vec.
pub fn normalize_media(bytes: &[u8]) -> Vec<Post> {
    try_normalize_media(bytes).unwrap_or_default()
}

pub fn try_normalize_feed(bytes: &[u8]) -> Result<Vec<Post>, NormalizeError> {
    let items = data_items(bytes)?;
    Ok(items.iter().map(feed_post).collect())
}

pub fn try_normalize_media(bytes: &[u8]) -> Result<Vec<Post>, NormalizeError> {
    let items = data_items(bytes)?;
    Ok(items.iter().map(media_post).collect())
}

fn feed_post(item: &Value) -> Post {
    Post {
        id: id_field(item),
        content: str_field(item, "message").unwrap_or(NO_MESSAGE).to_string(),
        created_time: parse_or_epoch(str_field(item, "created_time")),
    }
}

fn media_post(item: &Value) -> Post {
    let media_url = str_field(item, "media_url").unwrap_or(NO_MEDIA_URL);
    let caption = str_field(item, "caption").unwrap_or(NO_CAPTION);

    Post {
        id: id_field(item),
        content: format!("{caption}\nMedia URL: {media_url}"),
        created_time: parse_or_epoch(str_field(item, "timestamp")),
    }
}

/// Pull the top-level `data` array out of the envelope.
fn data_items(bytes: &[u8]) -> Result<Vec<Value>, NormalizeError> {
    let root: Value = serde_json::from_slice(bytes)?;
    let Value::Object(mut map) = root else {
        return Err(NormalizeError::MissingData);
    };

    let key = matching_key(&map, "data")
        .map(str::to_owned)
        .ok_or(NormalizeError::MissingData)?;

    match map.remove(&key) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(NormalizeError::MissingData),
    }
}

fn matching_key<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    if let Some((key, _)) = map.get_key_value(name) {
        return Some(key.as_str());
    }
    map.keys()
        .find(|k| k.eq_ignore_ascii_case(name))
        .map(String::as_str)
}

fn field<'a>(item: &'a Value, name: &str) -> Option<&'a Value> {
    let map = item.as_object()?;
    let key = matching_key(map, name)?;
    map.get(key)
}

/// A string-valued field. `null` and non-string values count as absent.
fn str_field<'a>(item: &'a Value, name: &str) -> Option<&'a str> {
    field(item, name).and_then(Value::as_str)
}

/// Ids are opaque strings; numeric ids keep their decimal text, anything else
/// (including a missing id) becomes the empty string.
fn id_field(item: &Value) -> String {
    match field(item, "id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
