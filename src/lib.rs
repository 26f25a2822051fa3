//! Typed queries against the Plural package registry.
//!
//! Entity shapes live in one [`Registry`]; from it the [`compose`](mod@compose) module
//! builds deduplicated GraphQL documents, the [`decode`](mod@decode) module turns
//! responses back into typed [`entities`], and [`paginate`](mod@paginate) walks
//! cursor-paginated root fields one page at a time. [`PluralClient`] ties
//! them to a default HTTP transport.

mod client;
pub mod compose;
pub mod config;
pub mod decode;
pub mod entities;
mod error;
pub mod paginate;
mod query;
pub mod schema;

pub use client::{PluralClient, PluralClientError, PluralTransport};
pub use compose::Document;
pub use config::{ClientConfig, ConfigError};
pub use decode::{decode, Decode, Entity, FieldPath};
pub use error::{
    ConfigurationError, DecodeError, DecodeErrorKind, QueryError, TransportError, WireKind,
};
pub use paginate::{paginate, NodeStream};
pub use query::{fetch, BoxError};
pub use schema::{EntityKind, Registry};

/// Composes the query document for `kind` from the standard registry.
pub fn compose(kind: EntityKind) -> Result<Document, ConfigurationError> {
    Registry::standard()?.compose(kind)
}
