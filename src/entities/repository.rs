use derive_getters::Getters;
use serde::Serialize;
use serde_json::Value;

use crate::{
    decode::{Decode, FieldPath, Object},
    schema::EntityKind,
    DecodeError,
};

/// The account that owns repositories.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
pub struct Publisher {
    id: String,
    name: String,
}

impl Decode for Publisher {
    const KIND: EntityKind = EntityKind::Publisher;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(Publisher {
            id: object.id()?,
            name: object.required_str("name")?,
        })
    }
}

/// A package repository.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
pub struct Repository {
    id: String,
    name: String,
    publisher: Publisher,
}

impl Decode for Repository {
    const KIND: EntityKind = EntityKind::Repository;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(Repository {
            id: object.id()?,
            name: object.required_str("name")?,
            publisher: object.nested("publisher")?,
        })
    }
}

/// A registry account holder.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
pub struct User {
    id: String,
    name: String,
    email: String,
    publisher: Publisher,
}

impl Decode for User {
    const KIND: EntityKind = EntityKind::User;

    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        Ok(User {
            id: object.id()?,
            name: object.required_str("name")?,
            email: object.required_str("email")?,
            publisher: object.nested("publisher")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use speculoos::prelude::*;

    use super::{Repository, User};
    use crate::{decode::decode, DecodeErrorKind, WireKind};

    #[test]
    fn repository_decodes_with_its_publisher() {
        let repository: Repository = decode(&json!({
            "id": "r1",
            "name": "airflow",
            "publisher": { "id": "p1", "name": "plural" }
        }))
        .unwrap();

        assert_that!(repository.name()).is_equal_to(&"airflow".to_string());
        assert_that!(repository.publisher().name()).is_equal_to(&"plural".to_string());
    }

    #[test]
    fn user_without_publisher_is_missing_a_field() {
        let err = decode::<User>(&json!({
            "id": "u1",
            "name": "Ada",
            "email": "ada@example.com"
        }))
        .unwrap_err();

        assert_that!(err.kind()).is_equal_to(&DecodeErrorKind::MissingField);
        assert_that!(err.path().to_string()).is_equal_to("user.publisher".to_string());
    }

    #[test]
    fn numeric_names_are_type_mismatches() {
        let err = decode::<Repository>(&json!({
            "id": "r1",
            "name": 42,
            "publisher": { "id": "p1", "name": "plural" }
        }))
        .unwrap_err();

        assert_that!(err.kind()).is_equal_to(&DecodeErrorKind::TypeMismatch {
            expected: WireKind::String,
            found: WireKind::Number,
        });
        assert_that!(err.path().to_string()).is_equal_to("repository.name".to_string());
    }

    #[test]
    fn empty_ids_are_rejected() {
        let err = decode::<Repository>(&json!({
            "id": "",
            "name": "airflow",
            "publisher": { "id": "p1", "name": "plural" }
        }))
        .unwrap_err();

        assert_that!(err.kind()).is_equal_to(&DecodeErrorKind::EmptyId);
        assert_that!(err.path().to_string()).is_equal_to("repository.id".to_string());
    }
}
