//! Fluent request builders for retrieve, add and batch modify.
//!
//! # Design
//! Each builder borrows the client, accumulates options by value through
//! chained calls and does no I/O until `send`, which consumes it. `build`
//! produces the `HttpRequest` for hosts that execute requests themselves.
//! Unset options are left out of the JSON body entirely; the service treats
//! an absent field differently from an empty one.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::PocketClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::types::{
    ActionKind, AddResult, ContentType, DetailType, Favorite, GetResult, ModifyAction, ModifyResult,
    Sort, State,
};

// ---------------------------------------------------------------------------
// Retrieve
// ---------------------------------------------------------------------------

/// Builder for `/get`. `state` and `detailType` are always sent, defaulting
/// to `unread` and `simple`.
#[derive(Debug)]
#[must_use = "a request builder does nothing until `send` or `build` is called"]
pub struct RetrieveRequest<'c, T> {
    client: &'c PocketClient<T>,
    state: State,
    detail_type: DetailType,
    favorite: Option<Favorite>,
    search: Option<String>,
    domain: Option<String>,
    tag: Option<String>,
    content_type: Option<ContentType>,
    since: Option<DateTime<Utc>>,
    sort: Option<Sort>,
    count: Option<u32>,
    offset: Option<u32>,
}

#[derive(Serialize)]
struct RetrieveParams<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    state: State,
    #[serde(rename = "detailType")]
    detail_type: DetailType,
    #[serde(skip_serializing_if = "Option::is_none")]
    favorite: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    content_type: Option<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<Sort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u32>,
}

impl<'c, T> RetrieveRequest<'c, T> {
    pub(crate) fn new(client: &'c PocketClient<T>) -> Self {
        Self {
            client,
            state: State::default(),
            detail_type: DetailType::default(),
            favorite: None,
            search: None,
            domain: None,
            tag: None,
            content_type: None,
            since: None,
            sort: None,
            count: None,
            offset: None,
        }
    }

    pub fn state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn detail(mut self, detail_type: DetailType) -> Self {
        self.detail_type = detail_type;
        self
    }

    pub fn favorite(mut self, favorite: Favorite) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Only items modified at or after `since`; sent as Unix seconds.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn build(&self) -> Result<HttpRequest, ApiError> {
        let config = self.client.config();
        self.client.post(
            "/get",
            &RetrieveParams {
                consumer_key: &config.consumer_key,
                access_token: &config.access_token,
                state: self.state,
                detail_type: self.detail_type,
                favorite: self.favorite.map(Favorite::wire),
                search: self.search.as_deref(),
                domain: self.domain.as_deref(),
                tag: self.tag.as_deref(),
                content_type: self.content_type,
                since: self.since.map(|t| t.timestamp().to_string()),
                sort: self.sort,
                count: self.count,
                offset: self.offset,
            },
        )
    }
}

impl<T: Transport> RetrieveRequest<'_, T> {
    pub fn send(self) -> Result<GetResult, ApiError> {
        let request = self.build()?;
        let response = self.client.execute(request)?;
        self.client.parse_get(response)
    }
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

#[derive(Debug)]
#[must_use = "a request builder does nothing until `send` or `build` is called"]
pub struct AddRequest<'c, T> {
    client: &'c PocketClient<T>,
    url: String,
    title: Option<String>,
    tags: Vec<String>,
    tweet_id: Option<String>,
}

#[derive(Serialize)]
struct AddParams<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tweet_id: Option<&'a str>,
}

impl<'c, T> AddRequest<'c, T> {
    pub(crate) fn new(client: &'c PocketClient<T>, url: String) -> Self {
        Self {
            client,
            url,
            title: None,
            tags: Vec::new(),
            tweet_id: None,
        }
    }

    /// Used only when the service cannot resolve a title from the page.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn tweet_id(mut self, tweet_id: impl Into<String>) -> Self {
        self.tweet_id = Some(tweet_id.into());
        self
    }

    pub fn build(&self) -> Result<HttpRequest, ApiError> {
        let config = self.client.config();
        let tags = (!self.tags.is_empty()).then(|| self.tags.join(","));
        self.client.post(
            "/add",
            &AddParams {
                consumer_key: &config.consumer_key,
                access_token: &config.access_token,
                url: &self.url,
                title: self.title.as_deref(),
                tags,
                tweet_id: self.tweet_id.as_deref(),
            },
        )
    }
}

impl<T: Transport> AddRequest<'_, T> {
    pub fn send(self) -> Result<AddResult, ApiError> {
        let request = self.build()?;
        let response = self.client.execute(request)?;
        self.client.parse_add(response)
    }
}

// ---------------------------------------------------------------------------
// Modify
// ---------------------------------------------------------------------------

/// Builder for a `/send` batch.
///
/// Actions keep the order they were added in; `ModifyResult::action_results`
/// lines up with that order. Every action in the batch is stamped with one
/// timestamp taken when the request is built.
#[derive(Debug)]
#[must_use = "a request builder does nothing until `send` or `build` is called"]
pub struct ModifyRequest<'c, T> {
    client: &'c PocketClient<T>,
    actions: Vec<(ActionKind, String)>,
}

#[derive(Serialize)]
struct ModifyParams<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    actions: Vec<ModifyAction>,
}

impl<'c, T> ModifyRequest<'c, T> {
    pub(crate) fn new(client: &'c PocketClient<T>) -> Self {
        Self {
            client,
            actions: Vec::new(),
        }
    }

    pub fn archive<I, S>(self, item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ActionKind::Archive, item_ids)
    }

    pub fn readd<I, S>(self, item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ActionKind::Readd, item_ids)
    }

    pub fn favorite<I, S>(self, item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ActionKind::Favorite, item_ids)
    }

    pub fn unfavorite<I, S>(self, item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ActionKind::Unfavorite, item_ids)
    }

    pub fn delete<I, S>(self, item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ActionKind::Delete, item_ids)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn push<I, S>(mut self, kind: ActionKind, item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions
            .extend(item_ids.into_iter().map(|id| (kind, id.into())));
        self
    }

    /// Build the batch stamped with the current time.
    pub fn build(&self) -> Result<HttpRequest, ApiError> {
        self.build_at(Utc::now().timestamp())
    }

    /// Build the batch with every action stamped `timestamp` (Unix seconds).
    pub fn build_at(&self, timestamp: i64) -> Result<HttpRequest, ApiError> {
        let time = timestamp.to_string();
        let actions = self
            .actions
            .iter()
            .map(|(kind, item_id)| ModifyAction {
                action: *kind,
                item_id: item_id.clone(),
                time: time.clone(),
            })
            .collect();

        let config = self.client.config();
        self.client.post(
            "/send",
            &ModifyParams {
                consumer_key: &config.consumer_key,
                access_token: &config.access_token,
                actions,
            },
        )
    }
}

impl<T: Transport> ModifyRequest<'_, T> {
    pub fn send(self) -> Result<ModifyResult, ApiError> {
        let request = self.build()?;
        let response = self.client.execute(request)?;
        self.client.parse_modify(response)
    }
}
