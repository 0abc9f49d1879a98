//! # Jongo Testkit
//!
//! Test utilities for the Jongo client.
//!
//! This crate provides:
//! - [`MemoryServer`], an in-process Jongo server speaking the same wire format
//! - Demo fixtures (`user`, `car`, `maker_stats`) and proxy helpers
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jongo_testkit::prelude::*;
//!
//! #[test]
//! fn loads_demo_users() {
//!     let server = demo_server();
//!     let mut store = Store::new(user_proxy(&server), StoreConfig::default()).unwrap();
//!     store.load().unwrap();
//!     assert_eq!(store.count(), 2);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod server;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::server::*;
    pub use jongo_client::{
        ClientError, Direction, DynamicFinder, Entity, Proxy, Schema, Store, StoreConfig, Value,
    };
}

pub use fixtures::*;
pub use generators::*;
pub use server::*;
