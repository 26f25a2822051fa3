use std::fmt;

use thiserror::Error;

use crate::{decode::FieldPath, schema::EntityKind};

/// ConfigurationError represents a broken entity schema registry.
///
/// These are detected when a [`crate::schema::Registry`] is built and never
/// depend on anything the server sends back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A nested field points at an entity kind that has no registered fragment.
    #[error("fragment `{fragment}` is not registered{}", referenced_by_suffix(.referenced_by))]
    MissingFragment {
        /// Name of the fragment that could not be found.
        fragment: String,
        /// Fragment whose selection referenced it, if any.
        referenced_by: Option<String>,
    },

    /// Fragments reference each other in a loop.
    #[error("fragment cycle: {}", cycle.join(" -> "))]
    FragmentCycle {
        /// Fragment names along the loop; the first name is repeated at the end.
        cycle: Vec<String>,
    },

    /// The same entity kind was defined more than once.
    #[error("entity `{0}` is defined more than once")]
    DuplicateDefinition(EntityKind),

    /// A composed document failed to parse as GraphQL.
    #[error("composed document for `{entity}` is not valid GraphQL: {message}")]
    Syntax {
        /// Entity whose document was being checked.
        entity: EntityKind,
        /// Parser messages, joined.
        message: String,
    },
}

fn referenced_by_suffix(referenced_by: &Option<String>) -> String {
    referenced_by
        .as_ref()
        .map(|by| format!(" (referenced by `{by}`)"))
        .unwrap_or_default()
}

/// The category of a [`DecodeError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A required field was absent or `null`.
    #[error("missing required field")]
    MissingField,

    /// A field was present with the wrong JSON type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// The kind the schema requires.
        expected: WireKind,
        /// The kind that was on the wire.
        found: WireKind,
    },

    /// An `id` field was present but empty.
    #[error("id must not be empty")]
    EmptyId,

    /// The requested entity type is not in the registry.
    #[error("unknown entity type `{name}`")]
    UnknownEntity {
        /// The name that was asked for.
        name: String,
    },
}

/// DecodeError is returned when a raw response tree does not match the shape
/// of the entity it was decoded as. No partially-built entity ever accompanies it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not decode `{path}`: {kind}")]
pub struct DecodeError {
    kind: DecodeErrorKind,
    path: FieldPath,
}

impl DecodeError {
    pub(crate) const fn new(kind: DecodeErrorKind, path: FieldPath) -> DecodeError {
        DecodeError { kind, path }
    }

    pub(crate) const fn missing(path: FieldPath) -> DecodeError {
        DecodeError::new(DecodeErrorKind::MissingField, path)
    }

    pub(crate) const fn mismatch(
        expected: WireKind,
        found: WireKind,
        path: FieldPath,
    ) -> DecodeError {
        DecodeError::new(DecodeErrorKind::TypeMismatch { expected, found }, path)
    }

    /// What went wrong.
    pub const fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// Where in the response tree it went wrong.
    pub const fn path(&self) -> &FieldPath {
        &self.path
    }
}

/// JSON value kinds, as reported in type mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// any JSON number
    Number,
    /// a JSON string
    String,
    /// a JSON array
    List,
    /// a JSON object
    Object,
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireKind::Null => "null",
            WireKind::Bool => "a boolean",
            WireKind::Number => "a number",
            WireKind::String => "a string",
            WireKind::List => "a list",
            WireKind::Object => "an object",
        };
        f.write_str(name)
    }
}

/// TransportError wraps whatever the transport collaborator failed with.
///
/// It is opaque on purpose: this crate never inspects or retries it.
#[derive(Error, Debug)]
#[error("transport failed: {source}")]
pub struct TransportError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    pub(crate) fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        TransportError {
            source: source.into(),
        }
    }

    /// Consumes the error, returning the transport's own error.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.source
    }
}

/// QueryError is the first failure met while running a query or walking pages.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The registry could not produce a document.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The response did not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The entity has no paginated root field to walk.
    #[error("`{0}` cannot be paginated")]
    NotPaginated(EntityKind),

    /// The entity has no root field at all, so it can only be reached through another one.
    #[error("`{0}` has no root query field")]
    NoRootField(EntityKind),

    /// The entity's root field is a connection and must be walked page by page.
    #[error("`{0}` is paginated")]
    Paginated(EntityKind),

    /// A required root field argument was not supplied as a variable.
    #[error("querying `{entity}` requires the `{variable}` variable")]
    MissingVariable {
        /// Entity being queried.
        entity: EntityKind,
        /// Name of the absent variable.
        variable: &'static str,
    },

    /// The caller supplied a variable the page walker sets itself.
    #[error("the `{0}` variable is set for each page and cannot be supplied")]
    ReservedVariable(&'static str),
}
