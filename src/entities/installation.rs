use std::collections::BTreeMap;

use derive_getters::Getters;
use serde::Serialize;
use serde_json::Value;

use super::{Repository, User};
use crate::{
    decode::{ContextValue, Decode, FieldPath, Object},
    schema::EntityKind,
    DecodeError,
};

/// A repository installed into a user's workspace.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct Installation {
    id: String,
    repository: Repository,
    user: User,
    license: Option<String>,
    /// Free-form configuration captured at install time. Empty when the
    /// server omitted it.
    context: BTreeMap<String, ContextValue>,
}

impl Decode for Installation {
    const KIND: EntityKind = EntityKind::Installation;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(Installation {
            id: object.id()?,
            repository: object.nested("repository")?,
            user: object.nested("user")?,
            license: object.optional_str("license")?,
            context: object.context("context")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{json, Value};
    use speculoos::prelude::*;

    use super::Installation;
    use crate::{
        decode::{decode, ContextValue},
        DecodeErrorKind, WireKind,
    };

    fn with_context(context: Option<Value>) -> Value {
        let mut raw = json!({
            "id": "i1",
            "license": "{\"plan\":\"pro\"}",
            "repository": {
                "id": "r1",
                "name": "airflow",
                "publisher": { "id": "p1", "name": "plural" }
            },
            "user": {
                "id": "u1",
                "name": "Ada",
                "email": "ada@example.com",
                "publisher": { "id": "p2", "name": "ada-co" }
            }
        });
        if let Some(context) = context {
            raw["context"] = context;
        }
        raw
    }

    #[rstest]
    #[case::absent(None)]
    #[case::null(Some(Value::Null))]
    #[case::empty(Some(json!({})))]
    fn missing_context_decodes_to_an_empty_map(#[case] context: Option<Value>) {
        let installation: Installation = decode(&with_context(context)).unwrap();
        assert!(installation.context().is_empty());
    }

    #[test]
    fn context_values_are_typed() {
        let installation: Installation = decode(&with_context(Some(json!({
            "bucket": "plural-assets",
            "replicas": 2,
            "tags": ["a", "b"]
        }))))
        .unwrap();

        let context = installation.context();
        assert_eq!(context["bucket"], ContextValue::String("plural-assets".to_string()));
        assert_eq!(context["replicas"], ContextValue::Number(2.into()));
        assert_eq!(
            context.keys().collect::<Vec<_>>(),
            vec!["bucket", "replicas", "tags"]
        );
    }

    #[test]
    fn non_object_context_is_a_type_mismatch() {
        let err = decode::<Installation>(&with_context(Some(json!("oops")))).unwrap_err();

        assert_that!(err.kind()).is_equal_to(&DecodeErrorKind::TypeMismatch {
            expected: WireKind::Object,
            found: WireKind::String,
        });
        assert_eq!(err.path().to_string(), "installation.context");
    }

    #[test]
    fn missing_publisher_name_reports_the_deep_path() {
        let mut raw = with_context(None);
        raw["repository"]["publisher"]
            .as_object_mut()
            .unwrap()
            .remove("name");

        let err = decode::<Installation>(&raw).unwrap_err();

        assert_that!(err.kind()).is_equal_to(&DecodeErrorKind::MissingField);
        assert_eq!(err.path().to_string(), "installation.repository.publisher.name");
    }
}
