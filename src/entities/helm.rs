use derive_getters::Getters;
use serde::Serialize;
use serde_json::Value;

use super::Installation;
use crate::{
    decode::{Decode, FieldPath, Object},
    schema::EntityKind,
    DecodeError,
};

/// A Helm chart published in a repository.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    id: String,
    name: String,
    description: Option<String>,
    latest_version: Option<String>,
}

impl Decode for Chart {
    const KIND: EntityKind = EntityKind::Chart;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(Chart {
            id: object.id()?,
            name: object.required_str("name")?,
            description: object.optional_str("description")?,
            latest_version: object.optional_str("latestVersion")?,
        })
    }
}

/// One released version of a chart.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    id: String,
    version: String,
    readme: Option<String>,
    values_template: Option<String>,
}

impl Decode for Version {
    const KIND: EntityKind = EntityKind::Version;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(Version {
            id: object.id()?,
            version: object.required_str("version")?,
            readme: object.optional_str("readme")?,
            values_template: object.optional_str("valuesTemplate")?,
        })
    }
}

/// A chart pinned at a version inside an installation.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct ChartInstallation {
    id: String,
    chart: Chart,
    version: Version,
    installation: Installation,
}

impl Decode for ChartInstallation {
    const KIND: EntityKind = EntityKind::ChartInstallation;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(ChartInstallation {
            id: object.id()?,
            chart: object.nested("chart")?,
            version: object.nested("version")?,
            installation: object.nested("installation")?,
        })
    }
}
