//! # Jongo Client
//!
//! Local-cache client for tables exposed by a Jongo REST server.
//!
//! This crate provides:
//! - Entities in one of four lifecycle states: ghost, dirty, dead or clean
//! - A [`Store`] that buffers local edits and reconciles them in one pass
//! - A [`Proxy`] mapping create/read/update/delete/query onto REST calls
//! - Page, sort and dynamic finder query builders
//! - A transport abstraction with HTTP and loopback implementations
//!
//! ## Architecture
//!
//! The store follows a **local-first** model:
//! 1. `add`, `update` and `remove` only change an entity's lifecycle state
//! 2. `sync` walks the collection and issues one remote call per pending entity
//! 3. `sync` then reloads the current page so every entity comes back clean
//!
//! ```rust,ignore
//! use jongo_client::{Endpoint, Proxy, Schema, Store, StoreConfig};
//!
//! let schema = Schema::new("car").with_identity_field("cid").fields(["model", "maker", "year"]);
//! let proxy = Proxy::new(Endpoint::new("localhost:8080", "demo", "car"), schema, transport);
//! let mut store = Store::new(proxy.into(), StoreConfig::default())?;
//!
//! store.load()?;
//! let mut car = store.schema().instance();
//! car.set("model", "206cc")?;
//! store.add(car)?;
//! store.sync()?;
//! ```
//!
//! ## Key Invariants
//!
//! - After `load`, every cached entity is clean and has an identity
//! - A ghost is always created remotely before it can be updated or deleted
//! - `sync` dispatches sequentially and stops at the first failure
//! - Bookkeeping fields are never sent over the wire

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod entity;
mod error;
mod http;
mod proxy;
mod query;
mod store;
mod transport;
mod value;

pub use config::{Endpoint, HttpConfig, StoreConfig, DEFAULT_PAGE_SIZE};
pub use entity::{BookkeepingField, Entity, EntityKey, LifecycleState, Record, Schema};
pub use error::{ClientError, ClientResult};
#[cfg(feature = "http")]
pub use http::ReqwestClient;
pub use http::{HttpClient, HttpTransport, LoopbackClient, LoopbackServer, RawResponse};
pub use proxy::{Listing, Proxy};
pub use query::{Direction, DynamicFinder, Page, Sort};
pub use store::{Store, SyncReport};
pub use transport::{Failure, Method, MockTransport, Request, Response, Transport};
pub use value::Value;

/// Name of the response header carrying the number of returned rows.
pub const CONTENT_COUNT_HEADER: &str = "Content-Count";

/// Name of the request header naming the identity column of a table.
pub const PRIMARY_KEY_HEADER: &str = "Primary-Key";
