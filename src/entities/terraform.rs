use std::collections::HashMap;

use derive_getters::Getters;
use serde::Serialize;
use serde_json::Value;

use super::Installation;
use crate::{
    decode::{Decode, FieldPath, Object},
    schema::EntityKind,
    DecodeError,
};

/// A package another package needs installed first.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
pub struct Dependency {
    /// `HELM` or `TERRAFORM`.
    #[serde(rename = "type")]
    dependency_type: String,
    repo: String,
    name: String,
}

impl Decode for Dependency {
    const KIND: EntityKind = EntityKind::Dependency;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(Dependency {
            dependency_type: object.required_str("type")?,
            repo: object.required_str("repo")?,
            name: object.required_str("name")?,
        })
    }
}

/// Output-to-input bindings between a module and its dependencies.
///
/// The Terraform and Helm maps are independent namespaces: the same key may
/// appear in both with different values.
#[derive(Clone, Debug, Default, Eq, Getters, PartialEq, Serialize)]
pub struct Wirings {
    terraform: HashMap<String, String>,
    helm: HashMap<String, String>,
}

impl Decode for Wirings {
    const KIND: EntityKind = EntityKind::Wirings;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(Wirings {
            terraform: object.string_map("terraform")?,
            helm: object.string_map("helm")?,
        })
    }
}

/// Everything a Terraform module depends on. Empty when the module has no
/// dependencies.
#[derive(Clone, Debug, Default, Eq, Getters, PartialEq, Serialize)]
pub struct Dependencies {
    dependencies: Vec<Dependency>,
    wirings: Wirings,
}

impl Decode for Dependencies {
    const KIND: EntityKind = EntityKind::Dependencies;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(Dependencies {
            dependencies: object.list("dependencies")?,
            wirings: object.nested_or_default("wirings")?,
        })
    }
}

/// A Terraform module published in a repository.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Terraform {
    id: String,
    name: String,
    description: Option<String>,
    values_template: Option<String>,
    dependencies: Dependencies,
    package: Option<String>,
}

impl Decode for Terraform {
    const KIND: EntityKind = EntityKind::Terraform;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(Terraform {
            id: object.id()?,
            name: object.required_str("name")?,
            description: object.optional_str("description")?,
            values_template: object.optional_str("valuesTemplate")?,
            dependencies: object.nested_or_default("dependencies")?,
            package: object.optional_str("package")?,
        })
    }
}

/// A Terraform module inside an installation.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct TerraformInstallation {
    id: String,
    installation: Installation,
    terraform: Terraform,
}

impl Decode for TerraformInstallation {
    const KIND: EntityKind = EntityKind::TerraformInstallation;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(TerraformInstallation {
            id: object.id()?,
            installation: object.nested("installation")?,
            terraform: object.nested("terraform")?,
        })
    }
}
