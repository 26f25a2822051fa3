//! Decoding of raw response trees into entities.
//!
//! Decoding is total: it either yields a fully-populated entity or a single
//! [`DecodeError`] naming the offending field by its dotted path, e.g.
//! `installation.repository.publisher.name`.

mod context;
mod path;

use std::collections::{BTreeMap, HashMap};

use heck::ToLowerCamelCase;
use serde::Serialize;
use serde_json::{Map, Value};

pub use context::ContextValue;
pub use path::FieldPath;

use crate::{
    entities::{
        Chart, ChartInstallation, Dependencies, Dependency, Installation, Publisher, Repository,
        Terraform, TerraformInstallation, User, Version, Wirings,
    },
    schema::EntityKind,
    DecodeError, DecodeErrorKind, WireKind,
};

/// Types that can be built from a raw response object.
pub trait Decode: Sized {
    /// The registry entry this type corresponds to.
    const KIND: EntityKind;

    /// Decodes `raw`, reporting errors relative to `path`.
    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError>;
}

/// Decodes `raw` as a `T`, with error paths rooted at the entity's name.
pub fn decode<T: Decode>(raw: &Value) -> Result<T, DecodeError> {
    T::decode_at(raw, FieldPath::root(T::KIND))
}

/// Any decoded entity.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Publisher(Publisher),
    Repository(Repository),
    User(User),
    Chart(Chart),
    Version(Version),
    ChartInstallation(ChartInstallation),
    Dependency(Dependency),
    Wirings(Wirings),
    Dependencies(Dependencies),
    Terraform(Terraform),
    TerraformInstallation(TerraformInstallation),
    Installation(Installation),
}

impl Entity {
    /// Which entity this is.
    pub const fn kind(&self) -> EntityKind {
        match self {
            Entity::Publisher(_) => EntityKind::Publisher,
            Entity::Repository(_) => EntityKind::Repository,
            Entity::User(_) => EntityKind::User,
            Entity::Chart(_) => EntityKind::Chart,
            Entity::Version(_) => EntityKind::Version,
            Entity::ChartInstallation(_) => EntityKind::ChartInstallation,
            Entity::Dependency(_) => EntityKind::Dependency,
            Entity::Wirings(_) => EntityKind::Wirings,
            Entity::Dependencies(_) => EntityKind::Dependencies,
            Entity::Terraform(_) => EntityKind::Terraform,
            Entity::TerraformInstallation(_) => EntityKind::TerraformInstallation,
            Entity::Installation(_) => EntityKind::Installation,
        }
    }
}

/// Decodes `raw` as whichever entity `kind` names.
pub fn decode_entity(kind: EntityKind, raw: &Value) -> Result<Entity, DecodeError> {
    Ok(match kind {
        EntityKind::Publisher => Entity::Publisher(decode(raw)?),
        EntityKind::Repository => Entity::Repository(decode(raw)?),
        EntityKind::User => Entity::User(decode(raw)?),
        EntityKind::Chart => Entity::Chart(decode(raw)?),
        EntityKind::Version => Entity::Version(decode(raw)?),
        EntityKind::ChartInstallation => Entity::ChartInstallation(decode(raw)?),
        EntityKind::Dependency => Entity::Dependency(decode(raw)?),
        EntityKind::Wirings => Entity::Wirings(decode(raw)?),
        EntityKind::Dependencies => Entity::Dependencies(decode(raw)?),
        EntityKind::Terraform => Entity::Terraform(decode(raw)?),
        EntityKind::TerraformInstallation => Entity::TerraformInstallation(decode(raw)?),
        EntityKind::Installation => Entity::Installation(decode(raw)?),
    })
}

pub(crate) const fn wire_kind(value: &Value) -> WireKind {
    match value {
        Value::Null => WireKind::Null,
        Value::Bool(_) => WireKind::Bool,
        Value::Number(_) => WireKind::Number,
        Value::String(_) => WireKind::String,
        Value::Array(_) => WireKind::List,
        Value::Object(_) => WireKind::Object,
    }
}

/// Field accessors over one JSON object, each reporting errors at the
/// field's own path.
pub(crate) struct Object<'a> {
    fields: &'a Map<String, Value>,
    path: FieldPath,
}

impl<'a> Object<'a> {
    pub(crate) fn new(raw: &'a Value, path: FieldPath) -> Result<Object<'a>, DecodeError> {
        match raw {
            Value::Object(fields) => Ok(Object { fields, path }),
            other => Err(DecodeError::mismatch(
                WireKind::Object,
                wire_kind(other),
                path,
            )),
        }
    }

    fn at(&self, name: &str) -> FieldPath {
        self.path.field(name)
    }

    /// The field's value, with `null` treated as absent.
    fn present(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    pub(crate) fn required_str(&self, name: &str) -> Result<String, DecodeError> {
        self.optional_str(name)?
            .ok_or_else(|| DecodeError::missing(self.at(name)))
    }

    pub(crate) fn optional_str(&self, name: &str) -> Result<Option<String>, DecodeError> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(DecodeError::mismatch(
                WireKind::String,
                wire_kind(other),
                self.at(name),
            )),
        }
    }

    pub(crate) fn required_bool(&self, name: &str) -> Result<bool, DecodeError> {
        match self.present(name) {
            None => Err(DecodeError::missing(self.at(name))),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(DecodeError::mismatch(
                WireKind::Bool,
                wire_kind(other),
                self.at(name),
            )),
        }
    }

    /// A required, non-empty `id`.
    pub(crate) fn id(&self) -> Result<String, DecodeError> {
        let id = self.required_str("id")?;
        if id.is_empty() {
            return Err(DecodeError::new(DecodeErrorKind::EmptyId, self.at("id")));
        }
        Ok(id)
    }

    pub(crate) fn nested<T: Decode>(&self, name: &str) -> Result<T, DecodeError> {
        match self.present(name) {
            None => Err(DecodeError::missing(self.at(name))),
            Some(value) => T::decode_at(value, self.at(name)),
        }
    }

    /// A nested `T`; absent or `null` is `T::default()`.
    pub(crate) fn nested_or_default<T>(&self, name: &str) -> Result<T, DecodeError>
    where
        T: Decode + Default,
    {
        match self.present(name) {
            None => Ok(T::default()),
            Some(value) => T::decode_at(value, self.at(name)),
        }
    }

    /// A list of `T`; absent or `null` is an empty list.
    pub(crate) fn list<T: Decode>(&self, name: &str) -> Result<Vec<T>, DecodeError> {
        self.list_with(name, T::decode_at)
    }

    pub(crate) fn list_with<T>(
        &self,
        name: &str,
        decode_item: impl Fn(&Value, FieldPath) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        match self.present(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => {
                let path = self.at(name);
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| decode_item(item, path.index(index)))
                    .collect()
            }
            Some(other) => Err(DecodeError::mismatch(
                WireKind::List,
                wire_kind(other),
                self.at(name),
            )),
        }
    }

    /// A string-to-string map; absent or `null` is an empty map.
    pub(crate) fn string_map(&self, name: &str) -> Result<HashMap<String, String>, DecodeError> {
        let Some(value) = self.present(name) else {
            return Ok(HashMap::new());
        };
        let entries = Object::new(value, self.at(name))?;
        entries
            .fields
            .keys()
            .map(|key| Ok((key.clone(), entries.required_str(key)?)))
            .collect()
    }

    /// An open key-value map; absent or `null` is an empty map.
    pub(crate) fn context(
        &self,
        name: &str,
    ) -> Result<BTreeMap<String, ContextValue>, DecodeError> {
        match self.present(name) {
            None => Ok(BTreeMap::new()),
            Some(Value::Object(fields)) => Ok(fields
                .iter()
                .map(|(key, value)| (key.clone(), ContextValue::from(value)))
                .collect()),
            Some(other) => Err(DecodeError::mismatch(
                WireKind::Object,
                wire_kind(other),
                self.at(name),
            )),
        }
    }
}

impl FieldPath {
    /// The root path for `kind`, e.g. `chartInstallation`.
    pub fn root(kind: EntityKind) -> FieldPath {
        FieldPath::from_name(&kind.type_name().to_lower_camel_case())
    }
}
