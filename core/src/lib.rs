//! Blocking client for the Pocket "save for later" API.
//!
//! # Overview
//! Retrieve, add and batch-modify bookmarked items, plus the two-step
//! authorization handshake that yields a user access token.
//!
//! ```no_run
//! use pocket_core::{ClientConfig, DetailType, PocketClient};
//!
//! let client = PocketClient::new(ClientConfig::new("consumer-key", "access-token"));
//! let result = client.retrieve().detail(DetailType::Complete).count(10).send()?;
//! for (id, article) in &result.list {
//!     println!("{id}: {}", article.resolved_title);
//! }
//! # Ok::<(), pocket_core::ApiError>(())
//! ```
//!
//! # Design
//! - `PocketClient` holds only configuration and a transport; it is safe to
//!   share by reference.
//! - Builders are split into `build` (produces an `HttpRequest`) and `send`
//!   (runs it through the client's `Transport`), so hosts can own the I/O.
//! - The normalizer absorbs the service's array-or-object encoding of keyed
//!   collections; callers only ever see `HashMap`s.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
mod normalize;
pub mod request;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use client::PocketClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse, Transport};
pub use request::{AddRequest, ModifyRequest, RetrieveRequest};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    AccessGrant, ActionKind, AddResult, Article, Author, Authorization, ContentType, DetailType,
    Favorite, GetResult, Image, ModifyAction, ModifyResult, Sort, State, Tag, Video,
};
