//! Response normalization.
//!
//! The service encodes a keyed collection of children (an item's images,
//! videos, tags and authors, and the item list of a retrieve response) as a
//! JSON object when it has entries and as `[]` when it has none. Each such
//! field is pulled out of the document as an untyped probe and handed to
//! `keyed_map`, which maps the array case to an empty `HashMap` and decodes
//! the object case entry by entry. Everything else is decoded with plain
//! serde into structs whose scalar fields keep the wire's string form.
//!
//! Decoding is all-or-nothing: the first failure aborts with the dotted path
//! of the offending value.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::types::{AddResult, Article, GetResult};

const ROOT: &str = "$";

/// Scalar portion of an article. Absent fields default to empty, since the
/// simple detail level leaves most of them out.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ArticleFields {
    item_id: String,
    resolved_id: String,
    given_url: String,
    given_title: String,
    resolved_url: String,
    resolved_title: String,
    favorite: String,
    status: String,
    excerpt: String,
    is_article: String,
    has_video: String,
    has_image: String,
    word_count: String,
    time_added: String,
    time_updated: String,
    time_read: String,
    time_favorited: String,
    lang: String,
    top_image_url: String,
}

#[derive(Deserialize)]
struct GetEnvelope {
    status: i64,
    #[serde(default)]
    since: Option<i64>,
}

#[derive(Deserialize)]
struct AddEnvelope {
    status: i64,
}

/// Normalize one article object found at `path`.
pub(crate) fn article(value: Value, path: &str) -> Result<Article, ApiError> {
    let mut fields = object(value, path)?;
    let images = fields.remove("images");
    let videos = fields.remove("videos");
    let tags = fields.remove("tags");
    let authors = fields.remove("authors");

    let scalars: ArticleFields = typed(Value::Object(fields), path)?;

    Ok(Article {
        item_id: scalars.item_id,
        resolved_id: scalars.resolved_id,
        given_url: scalars.given_url,
        given_title: scalars.given_title,
        resolved_url: scalars.resolved_url,
        resolved_title: scalars.resolved_title,
        favorite: scalars.favorite,
        status: scalars.status,
        excerpt: scalars.excerpt,
        is_article: scalars.is_article,
        has_video: scalars.has_video,
        has_image: scalars.has_image,
        word_count: scalars.word_count,
        time_added: scalars.time_added,
        time_updated: scalars.time_updated,
        time_read: scalars.time_read,
        time_favorited: scalars.time_favorited,
        lang: scalars.lang,
        top_image_url: scalars.top_image_url,
        images: keyed_map(images, &child(path, "images"), typed)?,
        videos: keyed_map(videos, &child(path, "videos"), typed)?,
        tags: keyed_map(tags, &child(path, "tags"), typed)?,
        authors: keyed_map(authors, &child(path, "authors"), typed)?,
    })
}

/// Decode a `/get` response body.
pub(crate) fn get_result(body: &str) -> Result<GetResult, ApiError> {
    let mut doc = document(body)?;
    let list = doc.remove("list");
    let envelope: GetEnvelope = typed(Value::Object(doc), ROOT)?;

    Ok(GetResult {
        status: envelope.status,
        list: keyed_map(list, "list", article)?,
        since: envelope.since,
    })
}

/// Decode an `/add` response body.
pub(crate) fn add_result(body: &str) -> Result<AddResult, ApiError> {
    let mut doc = document(body)?;
    let item = doc
        .remove("item")
        .ok_or_else(|| ApiError::decode("item", "missing field"))?;
    let envelope: AddEnvelope = typed(Value::Object(doc), ROOT)?;

    Ok(AddResult {
        item: article(item, "item")?,
        status: envelope.status,
    })
}

/// Decode a body with no shape-ambiguous fields.
pub(crate) fn plain<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::decode(ROOT, e))
}

/// Resolve an array-or-object field into a mapping.
///
/// A missing field, `null` and any array all mean "no children". An object
/// is decoded entry by entry with `decode`, each entry at `path.<key>`. A
/// scalar is an error.
pub(crate) fn keyed_map<T, F>(
    probe: Option<Value>,
    path: &str,
    decode: F,
) -> Result<HashMap<String, T>, ApiError>
where
    F: Fn(Value, &str) -> Result<T, ApiError>,
{
    match probe {
        None | Some(Value::Null) => Ok(HashMap::new()),
        Some(Value::Array(_)) => Ok(HashMap::new()),
        Some(Value::Object(entries)) => entries
            .into_iter()
            .map(|(key, value)| {
                let entry = decode(value, &child(path, &key))?;
                Ok((key, entry))
            })
            .collect(),
        Some(other) => Err(ApiError::decode(
            path,
            format!("expected object or array, found {}", kind(&other)),
        )),
    }
}

fn typed<T: DeserializeOwned>(value: Value, path: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::decode(path, e))
}

fn document(body: &str) -> Result<Map<String, Value>, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ApiError::decode(ROOT, e))?;
    object(value, ROOT)
}

fn object(value: Value, path: &str) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::decode(
            path,
            format!("expected object, found {}", kind(&other)),
        )),
    }
}

fn child(path: &str, key: &str) -> String {
    if path == ROOT {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
