use super::{Argument, EntityDef, EntityKind, RootField};

/// The entity definitions of the package registry API.
pub fn definitions() -> Vec<EntityDef> {
    use EntityKind::*;

    vec![
        EntityDef::new(Publisher).scalar("id").scalar("name"),
        EntityDef::new(Repository)
            .scalar("id")
            .scalar("name")
            .nested("publisher", Publisher)
            .root(RootField::single("repository").argument(Argument::required("name", "String"))),
        EntityDef::new(User)
            .scalar("id")
            .scalar("name")
            .scalar("email")
            .nested("publisher", Publisher)
            .root(RootField::single("me")),
        EntityDef::new(Chart)
            .scalar("id")
            .scalar("name")
            .scalar("description")
            .scalar("latestVersion")
            .root(
                RootField::connection("charts").argument(Argument::required("repositoryId", "ID")),
            ),
        EntityDef::new(Version)
            .scalar("id")
            .scalar("version")
            .scalar("readme")
            .scalar("valuesTemplate")
            .root(RootField::connection("versions").argument(Argument::required("chartId", "ID"))),
        EntityDef::new(Installation)
            .scalar("id")
            .scalar("context")
            .scalar("license")
            .nested("repository", Repository)
            .nested("user", User)
            .root(RootField::connection("installations")),
        EntityDef::new(ChartInstallation)
            .scalar("id")
            .nested("chart", Chart)
            .nested("version", Version)
            .nested("installation", Installation)
            .root(
                RootField::connection("chartInstallations")
                    .argument(Argument::required("repositoryId", "ID")),
            ),
        EntityDef::new(Dependency)
            .scalar("type")
            .scalar("repo")
            .scalar("name"),
        EntityDef::new(Wirings).scalar("terraform").scalar("helm"),
        EntityDef::new(Dependencies)
            .nested("dependencies", Dependency)
            .nested("wirings", Wirings),
        EntityDef::new(Terraform)
            .scalar("id")
            .scalar("name")
            .scalar("package")
            .scalar("description")
            .nested("dependencies", Dependencies)
            .scalar("valuesTemplate")
            .root(
                RootField::connection("terraform")
                    .argument(Argument::required("repositoryId", "ID")),
            ),
        EntityDef::new(TerraformInstallation)
            .scalar("id")
            .nested("installation", Installation)
            .nested("terraform", Terraform)
            .root(
                RootField::connection("terraformInstallations")
                    .argument(Argument::required("repositoryId", "ID")),
            ),
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map, Value};
    use strum::IntoEnumIterator;

    use super::definitions;
    use crate::{
        decode::{decode_entity, FieldPath},
        schema::{EntityDef, EntityKind, Shape},
        DecodeErrorKind, WireKind,
    };

    fn definition(kind: EntityKind) -> EntityDef {
        definitions()
            .into_iter()
            .find(|def| def.kind() == kind)
            .unwrap_or_else(|| panic!("{kind} has no definition"))
    }

    /// A value of the JSON kind the decoders read for `name` on `kind`.
    fn leaf(kind: EntityKind, name: &str) -> Value {
        match (kind, name) {
            (EntityKind::Installation, "context") | (EntityKind::Wirings, _) => json!({}),
            _ => json!("x"),
        }
    }

    /// A response holding exactly the fields the fragment for `kind` selects.
    fn selected(kind: EntityKind) -> Value {
        let fields: Map<String, Value> = definition(kind)
            .fields()
            .iter()
            .map(|field| {
                let value = match field.shape() {
                    Shape::Scalar => leaf(kind, field.name()),
                    Shape::Nested(EntityKind::Dependency) => {
                        json!([selected(EntityKind::Dependency)])
                    }
                    Shape::Nested(nested) => selected(nested),
                };
                (field.name().to_string(), value)
            })
            .collect();
        Value::Object(fields)
    }

    #[test]
    fn every_entity_decodes_from_its_own_selection() {
        for kind in EntityKind::iter() {
            let decoded = decode_entity(kind, &selected(kind));
            assert!(decoded.is_ok(), "{kind}: {:?}", decoded.err());
        }
    }

    #[test]
    fn every_selected_field_is_read_by_its_decoder() {
        for kind in EntityKind::iter() {
            for field in definition(kind).fields() {
                let mut raw = selected(kind);
                raw[field.name()] = json!(7);

                let err = decode_entity(kind, &raw)
                    .err()
                    .unwrap_or_else(|| panic!("{kind}.{} is never read", field.name()));

                assert_eq!(
                    err.path().to_string(),
                    format!("{}.{}", FieldPath::root(kind), field.name())
                );
                assert!(
                    matches!(
                        err.kind(),
                        DecodeErrorKind::TypeMismatch { found: WireKind::Number, .. }
                    ),
                    "{kind}.{}: {err:?}",
                    field.name()
                );
            }
        }
    }
}
