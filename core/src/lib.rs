//! Object mapping over the Unisender marketing-email API.
//!
//! # Overview
//! Remote resources (currently contact lists) are local values with
//! `save()`/`delete()` semantics. Every operation goes through a [`Client`],
//! which issues one form-encoded POST per vendor method, retries transport
//! failures and classifies the reply as success, warning or error.
//!
//! # Design
//! - `Client` owns its configuration; there is no global instance.
//! - Each call returns a [`Response`] holding the result and a fresh
//!   [`RequestLog`]. With `ErrorPolicy::Throw` the client raises instead of
//!   logging.
//! - Entities turn a dirty log into an error at the end of `save()` and
//!   `delete()`, so entity operations fail fast while the raw calls stay
//!   inspectable.
//! - Request building and response parsing are pure; the network sits
//!   behind the [`Transport`] trait.

pub mod client;
pub mod collection;
pub mod config;
pub mod contact_list;
pub mod entity;
pub mod error;
pub mod form;
pub mod http;
pub mod log;
pub mod method;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use collection::{Collection, Key};
pub use config::{ClientConfig, ErrorPolicy};
pub use contact_list::ContactList;
pub use entity::Entity;
pub use error::{OrmError, Result, TransportError};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use log::{LogEntry, RequestLog, Response};
pub use method::Method;
pub use types::{CreatedList, IdValue, ListRecord};
