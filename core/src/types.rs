//! Domain DTOs for the Pocket API.
//!
//! # Design
//! The service transmits every numeric or boolean-looking article field as a
//! JSON string (`"favorite": "0"`, `"word_count": "1093"`). Those fields stay
//! `String` here so callers get the exact wire text back. Keyed child
//! collections are plain `HashMap`s; the service's habit of sending `[]` for
//! an empty collection is absorbed by the normalizer and never surfaces.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A bookmarked item.
///
/// Deserializing an `Article` goes through the normalizer, so `images`,
/// `videos`, `tags` and `authors` are always mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct Article {
    pub item_id: String,
    pub resolved_id: String,
    pub given_url: String,
    pub given_title: String,
    pub resolved_url: String,
    pub resolved_title: String,
    pub favorite: String,
    pub status: String,
    pub excerpt: String,
    pub is_article: String,
    pub has_video: String,
    pub has_image: String,
    pub word_count: String,
    pub time_added: String,
    pub time_updated: String,
    pub time_read: String,
    pub time_favorited: String,
    pub lang: String,
    pub top_image_url: String,
    pub images: HashMap<String, Image>,
    pub videos: HashMap<String, Video>,
    pub tags: HashMap<String, Tag>,
    pub authors: HashMap<String, Author>,
}

impl TryFrom<serde_json::Value> for Article {
    type Error = crate::ApiError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        crate::normalize::article(value, "$")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub item_id: String,
    pub image_id: String,
    pub src: String,
    pub width: String,
    pub height: String,
    pub credit: String,
    pub caption: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    pub item_id: String,
    pub video_id: String,
    pub src: String,
    pub width: String,
    pub height: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub vid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub item_id: String,
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub item_id: String,
    pub author_id: String,
    pub name: String,
    pub url: String,
}

/// Outcome of a retrieve call. `list` is keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetResult {
    pub status: i64,
    pub list: HashMap<String, Article>,
    /// Cursor to pass as `since` on the next incremental retrieve.
    pub since: Option<i64>,
}

/// Outcome of an add call: the freshly resolved item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddResult {
    pub item: Article,
    pub status: i64,
}

/// Outcome of a batch modify. `action_results[i]` belongs to the i-th
/// submitted action; the service echoes no identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModifyResult {
    pub action_results: Vec<bool>,
    pub status: i64,
}

/// One batch instruction as it goes over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifyAction {
    pub action: ActionKind,
    pub item_id: String,
    pub time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Archive,
    Readd,
    Favorite,
    Unfavorite,
    Delete,
}

/// Result of the first authorization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Request token; the caller must keep it until the user comes back.
    pub request_token: String,
    /// URL the user visits to approve the application.
    pub url: String,
}

/// Result of exchanging an approved request token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessGrant {
    pub access_token: String,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Retrieve filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Unread,
    Archive,
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailType {
    #[default]
    Simple,
    Complete,
}

/// Favorite filter; leaving it unset returns both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Favorite {
    Favorited,
    Unfavorited,
}

impl Favorite {
    pub(crate) fn wire(self) -> &'static str {
        match self {
            Favorite::Favorited => "1",
            Favorite::Unfavorited => "0",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    Newest,
    Oldest,
    Title,
    Site,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Video,
    Image,
}
