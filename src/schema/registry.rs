use std::collections::BTreeMap;

use apollo_parser::Parser;
use lazy_static::lazy_static;
use serde_json::Value;

use super::{standard, EntityDef, EntityKind};
use crate::{
    compose::{Composer, Document},
    decode::{self, Entity, FieldPath},
    ConfigurationError, DecodeError, DecodeErrorKind,
};

lazy_static! {
    static ref STANDARD: Result<Registry, ConfigurationError> =
        Registry::new(standard::definitions());
}

/// A validated, immutable set of entity definitions.
///
/// Building one composes the document of every registered entity, so a
/// registry that exists is known to be acyclic, to have no dangling fragment
/// references, and to produce documents that parse.
#[derive(Clone, Debug)]
pub struct Registry {
    definitions: BTreeMap<EntityKind, EntityDef>,
}

impl Registry {
    /// Validates `definitions` and builds a registry from them.
    /// Each kind may be defined only once.
    pub fn new(
        definitions: impl IntoIterator<Item = EntityDef>,
    ) -> Result<Registry, ConfigurationError> {
        let mut by_kind = BTreeMap::new();
        for def in definitions {
            let kind = def.kind();
            if by_kind.insert(kind, def).is_some() {
                return Err(ConfigurationError::DuplicateDefinition(kind));
            }
        }
        let definitions = by_kind;

        let composer = Composer::new(&definitions);
        for kind in definitions.keys() {
            let document = composer.compose(*kind)?;
            check_syntax(&document)?;
        }
        tracing::debug!(entities = definitions.len(), "entity registry built");

        Ok(Registry { definitions })
    }

    /// The registry of the package registry API, built once per process.
    pub fn standard() -> Result<&'static Registry, ConfigurationError> {
        STANDARD.as_ref().map_err(Clone::clone)
    }

    /// The definition of `kind`, if registered.
    pub fn get(&self, kind: EntityKind) -> Option<&EntityDef> {
        self.definitions.get(&kind)
    }

    /// Whether `kind` is registered.
    pub fn contains(&self, kind: EntityKind) -> bool {
        self.definitions.contains_key(&kind)
    }

    /// Registered kinds, in a stable order.
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.definitions.keys().copied()
    }

    /// Composes the query document for `kind`.
    pub fn compose(&self, kind: EntityKind) -> Result<Document, ConfigurationError> {
        Composer::new(&self.definitions).compose(kind)
    }

    /// Decodes `raw` as the entity registered under `type_name`.
    pub fn decode(&self, type_name: &str, raw: &Value) -> Result<Entity, DecodeError> {
        let kind = type_name
            .parse::<EntityKind>()
            .ok()
            .filter(|kind| self.contains(*kind))
            .ok_or_else(|| {
                DecodeError::new(
                    DecodeErrorKind::UnknownEntity {
                        name: type_name.to_string(),
                    },
                    FieldPath::from_name(type_name),
                )
            })?;
        decode::decode_entity(kind, raw)
    }
}

fn check_syntax(document: &Document) -> Result<(), ConfigurationError> {
    let tree = Parser::new(document.as_str()).parse();
    let errors: Vec<_> = tree.errors().collect();
    if errors.is_empty() {
        Ok(())
    } else {
        let message = errors
            .iter()
            .map(|e| e.message().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigurationError::Syntax {
            entity: document.root(),
            message,
        })
    }
}
