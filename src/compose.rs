//! Composition of GraphQL documents from registered fragments.
//!
//! A document holds the root operation for an entity (when it has one) and
//! every fragment reachable from it, each emitted exactly once. Fragments are
//! emitted in post-order, so any fragment appears after the fragments it
//! spreads, and the order is fully determined by field declaration order.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use apollo_encoder::{
    Argument as EncodedArgument, Document as EncodedDocument, Field as EncodedField,
    FragmentDefinition, FragmentSpread, OperationDefinition, OperationType, Selection,
    SelectionSet, Type_, TypeCondition, Value, VariableDefinition,
};

use crate::{
    schema::{Argument, EntityDef, EntityKind, Field, RootField, Shape},
    ConfigurationError,
};

/// A composed query document, ready to hand to a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    root: EntityKind,
    operation_name: Option<String>,
    fragments: Vec<String>,
    text: String,
}

impl Document {
    /// The entity the document was composed for.
    pub const fn root(&self) -> EntityKind {
        self.root
    }

    /// Name of the operation to execute, if the root entity has a root field.
    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    /// Fragment names in emission order; the root's own fragment is last.
    pub fn fragment_names(&self) -> &[String] {
        &self.fragments
    }

    /// The document text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Walks the fragment dependency graph of a set of entity definitions.
#[derive(Clone, Copy, Debug)]
pub struct Composer<'a> {
    definitions: &'a BTreeMap<EntityKind, EntityDef>,
}

impl<'a> Composer<'a> {
    /// Creates a composer over `definitions`. No validation happens here;
    /// problems surface from [`Composer::compose`].
    pub const fn new(definitions: &'a BTreeMap<EntityKind, EntityDef>) -> Composer<'a> {
        Composer { definitions }
    }

    /// Builds the document for `root`.
    pub fn compose(&self, root: EntityKind) -> Result<Document, ConfigurationError> {
        let order = self.fragment_order(root)?;
        let root_def = self.lookup(root, None)?;

        let mut document = EncodedDocument::new();
        let operation_name = root_def.root_field().map(|root_field| {
            document.operation(operation(root_field, root));
            root_field.operation_name()
        });
        for def in &order {
            document.fragment(fragment(def));
        }

        Ok(Document {
            root,
            operation_name,
            fragments: order.iter().map(|def| def.kind().fragment_name()).collect(),
            text: document.to_string(),
        })
    }

    /// The definitions reachable from `root`, dependencies first.
    pub fn fragment_order(
        &self,
        root: EntityKind,
    ) -> Result<Vec<&'a EntityDef>, ConfigurationError> {
        let mut marks = HashMap::new();
        let mut path = Vec::new();
        let mut order = Vec::new();
        self.visit(root, &mut marks, &mut path, &mut order)?;
        Ok(order)
    }

    fn visit(
        &self,
        kind: EntityKind,
        marks: &mut HashMap<EntityKind, Mark>,
        path: &mut Vec<EntityKind>,
        order: &mut Vec<&'a EntityDef>,
    ) -> Result<(), ConfigurationError> {
        match marks.get(&kind) {
            Some(Mark::Visited) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|seen| *seen == kind).unwrap_or(0);
                let cycle = path[start..]
                    .iter()
                    .chain(std::iter::once(&kind))
                    .map(|kind| kind.fragment_name())
                    .collect();
                return Err(ConfigurationError::FragmentCycle { cycle });
            }
            None => {}
        }

        let def = self.lookup(kind, path.last().copied())?;
        marks.insert(kind, Mark::Visiting);
        path.push(kind);
        for dependency in def.dependencies() {
            self.visit(dependency, marks, path, order)?;
        }
        path.pop();
        marks.insert(kind, Mark::Visited);
        order.push(def);
        Ok(())
    }

    fn lookup(
        &self,
        kind: EntityKind,
        referenced_by: Option<EntityKind>,
    ) -> Result<&'a EntityDef, ConfigurationError> {
        self.definitions
            .get(&kind)
            .ok_or_else(|| ConfigurationError::MissingFragment {
                fragment: kind.fragment_name(),
                referenced_by: referenced_by.map(EntityKind::fragment_name),
            })
    }
}

fn fragment(def: &EntityDef) -> FragmentDefinition {
    let mut selection_set = SelectionSet::new();
    for field in def.fields() {
        selection_set.selection(Selection::Field(field_selection(field)));
    }
    FragmentDefinition::new(
        def.kind().fragment_name(),
        TypeCondition::new(def.kind().type_name().to_string()),
        selection_set,
    )
}

fn field_selection(field: &Field) -> EncodedField {
    match field.shape() {
        Shape::Scalar => EncodedField::new(field.name().to_string()),
        Shape::Nested(kind) => object(field.name(), spread(kind)),
    }
}

fn spread(kind: EntityKind) -> SelectionSet {
    let mut selection_set = SelectionSet::new();
    selection_set.selection(Selection::FragmentSpread(FragmentSpread::new(
        kind.fragment_name(),
    )));
    selection_set
}

fn object(name: &str, selection_set: SelectionSet) -> EncodedField {
    let mut field = EncodedField::new(name.to_string());
    field.selection_set(Some(selection_set));
    field
}

fn leaves(names: &[&str]) -> SelectionSet {
    let mut selection_set = SelectionSet::new();
    for name in names {
        selection_set.selection(Selection::Field(EncodedField::new(name.to_string())));
    }
    selection_set
}

fn operation(root_field: &RootField, kind: EntityKind) -> OperationDefinition {
    let arguments = root_field.arguments();

    let body = if root_field.is_connection() {
        let mut edges = SelectionSet::new();
        edges.selection(Selection::Field(object("node", spread(kind))));

        let mut connection = SelectionSet::new();
        connection.selection(Selection::Field(object(
            "pageInfo",
            leaves(&["hasNextPage", "endCursor"]),
        )));
        connection.selection(Selection::Field(object("edges", edges)));
        connection
    } else {
        spread(kind)
    };

    let mut field = object(root_field.name(), body);
    for argument in &arguments {
        field.argument(EncodedArgument::new(
            argument.name().to_string(),
            Value::Variable(argument.name().to_string()),
        ));
    }

    let mut selection_set = SelectionSet::new();
    selection_set.selection(Selection::Field(field));

    let mut operation = OperationDefinition::new(OperationType::Query, selection_set);
    operation.name(Some(root_field.operation_name()));
    for argument in &arguments {
        operation.variable_definition(VariableDefinition::new(
            argument.name().to_string(),
            variable_type(argument),
        ));
    }
    operation
}

fn variable_type(argument: &Argument) -> Type_ {
    let named = Type_::NamedType {
        name: argument.type_name().to_string(),
    };
    if argument.is_required() {
        Type_::NonNull {
            ty: Box::new(named),
        }
    } else {
        named
    }
}
