//! The entity schema registry.
//!
//! Every entity the registry API returns is described once here: its GraphQL
//! type, the fields selected for it, and the root query field (if any) that
//! fetches it. Fragments and their dependencies are derived from those field
//! lists, so a shared entity like `Publisher` is declared exactly once no
//! matter how many other fragments select it.

mod registry;
mod standard;

use heck::ToUpperCamelCase;
use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

pub use registry::Registry;
pub use standard::definitions as standard_definitions;

/// Every entity type known to the registry client.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum EntityKind {
    Publisher,
    Repository,
    User,
    Chart,
    Version,
    ChartInstallation,
    Dependency,
    Wirings,
    Dependencies,
    Terraform,
    TerraformInstallation,
    Installation,
}

impl EntityKind {
    /// The GraphQL type condition fragments for this entity are declared on.
    pub fn type_name(self) -> &'static str {
        self.into()
    }

    /// Name of the fragment selecting this entity, e.g. `ChartFragment`.
    pub fn fragment_name(self) -> String {
        format!("{}Fragment", self.type_name())
    }
}

/// How a field is selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A leaf: scalar, enum, or opaque JSON map.
    Scalar,
    /// An object selected through another entity's fragment.
    Nested(EntityKind),
}

/// A single selected field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    shape: Shape,
}

impl Field {
    /// The field name as it appears on the wire.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this is a leaf or a fragment reference.
    pub const fn shape(&self) -> Shape {
        self.shape
    }
}

/// An argument of a root query field, exposed as a same-named variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Argument {
    name: &'static str,
    type_name: &'static str,
    required: bool,
}

impl Argument {
    /// A nullable argument of GraphQL type `type_name`.
    pub const fn optional(name: &'static str, type_name: &'static str) -> Argument {
        Argument {
            name,
            type_name,
            required: false,
        }
    }

    /// A non-null argument of GraphQL type `type_name`.
    pub const fn required(name: &'static str, type_name: &'static str) -> Argument {
        Argument {
            name,
            type_name,
            required: true,
        }
    }

    /// The argument and variable name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The named GraphQL input type.
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the variable is declared non-null.
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// Variable carrying the requested page size on connection fields.
pub const FIRST_ARGUMENT: &str = "first";
/// Variable carrying the cursor to resume after on connection fields.
pub const AFTER_ARGUMENT: &str = "after";

/// The query field an entity is fetched through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootField {
    name: &'static str,
    arguments: Vec<Argument>,
    connection: bool,
}

impl RootField {
    /// A field returning one entity.
    pub const fn single(name: &'static str) -> RootField {
        RootField {
            name,
            arguments: Vec::new(),
            connection: false,
        }
    }

    /// A field returning a cursor-paginated connection of entities.
    /// The `first` and `after` arguments are added implicitly.
    pub const fn connection(name: &'static str) -> RootField {
        RootField {
            name,
            arguments: Vec::new(),
            connection: true,
        }
    }

    /// Adds an argument the caller must supply as a variable.
    pub fn argument(mut self, argument: Argument) -> RootField {
        self.arguments.push(argument);
        self
    }

    /// The field name, also the key of the response's `data` object.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The operation name used when querying this field, e.g. `ChartInstallations`.
    pub fn operation_name(&self) -> String {
        self.name.to_upper_camel_case()
    }

    /// Whether the field returns a connection.
    pub const fn is_connection(&self) -> bool {
        self.connection
    }

    /// All arguments, including the implicit pagination ones for connections.
    pub fn arguments(&self) -> Vec<Argument> {
        let mut arguments = self.arguments.clone();
        if self.connection {
            arguments.push(Argument::optional(FIRST_ARGUMENT, "Int"));
            arguments.push(Argument::optional(AFTER_ARGUMENT, "String"));
        }
        arguments
    }
}

/// The registered shape of one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityDef {
    kind: EntityKind,
    fields: Vec<Field>,
    root: Option<RootField>,
}

impl EntityDef {
    /// Starts a definition with no fields.
    pub const fn new(kind: EntityKind) -> EntityDef {
        EntityDef {
            kind,
            fields: Vec::new(),
            root: None,
        }
    }

    /// Selects a leaf field.
    pub fn scalar(mut self, name: &'static str) -> EntityDef {
        self.fields.push(Field {
            name,
            shape: Shape::Scalar,
        });
        self
    }

    /// Selects an object field through `kind`'s fragment.
    pub fn nested(mut self, name: &'static str, kind: EntityKind) -> EntityDef {
        self.fields.push(Field {
            name,
            shape: Shape::Nested(kind),
        });
        self
    }

    /// Makes the entity fetchable through `root`.
    pub fn root(mut self, root: RootField) -> EntityDef {
        self.root = Some(root);
        self
    }

    /// The entity this definition describes.
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Selected fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The root query field, if the entity can be fetched directly.
    pub const fn root_field(&self) -> Option<&RootField> {
        self.root.as_ref()
    }

    /// Entities whose fragments this one spreads, in declaration order.
    /// A kind spread by several fields is listed once.
    pub fn dependencies(&self) -> Vec<EntityKind> {
        let mut dependencies = Vec::new();
        for field in &self.fields {
            if let Shape::Nested(kind) = field.shape {
                if !dependencies.contains(&kind) {
                    dependencies.push(kind);
                }
            }
        }
        dependencies
    }
}
