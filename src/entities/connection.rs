use derive_getters::Getters;
use serde::Serialize;
use serde_json::Value;

use super::{Chart, ChartInstallation, Installation, Terraform, TerraformInstallation, Version};
use crate::{
    decode::{Decode, FieldPath, Object},
    DecodeError,
};

/// Where a connection page sits in the full result set.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl PageInfo {
    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path)?;
        let has_next_page = object.required_bool("hasNextPage")?;
        // a cursor is only needed when there is somewhere to go with it
        let end_cursor = if has_next_page {
            Some(object.required_str("endCursor")?)
        } else {
            object.optional_str("endCursor")?
        };
        Ok(PageInfo {
            has_next_page,
            end_cursor,
        })
    }

    /// The cursor to request the following page with, or `None` on the last page.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_next_page {
            self.end_cursor.as_deref()
        } else {
            None
        }
    }
}

/// One entry of a connection page.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
pub struct Edge<T> {
    node: T,
}

impl<T> Edge<T> {
    /// Consumes the edge, returning its node.
    pub fn into_node(self) -> T {
        self.node
    }
}

impl<T: Decode> Edge<T> {
    fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        Ok(Edge {
            node: Object::new(raw, path)?.nested("node")?,
        })
    }
}

/// A single page of a cursor-paginated root field.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    page_info: PageInfo,
    edges: Vec<Edge<T>>,
}

impl<T: Decode> Connection<T> {
    /// Decodes a `{ pageInfo, edges: [{ node }] }` payload found at `path`.
    pub fn decode_at(raw: &Value, path: FieldPath) -> Result<Self, DecodeError> {
        let object = Object::new(raw, path.clone())?;
        let page_info = match raw.get("pageInfo") {
            Some(value) if !value.is_null() => {
                PageInfo::decode_at(value, path.field("pageInfo"))?
            }
            _ => return Err(DecodeError::missing(path.field("pageInfo"))),
        };
        Ok(Connection {
            page_info,
            edges: object.list_with("edges", Edge::<T>::decode_at)?,
        })
    }
}

impl<T> Connection<T> {
    /// The nodes of this page, in server order.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }

    /// Splits the page into its info and its nodes.
    pub fn into_parts(self) -> (PageInfo, Vec<T>) {
        let nodes = self.edges.into_iter().map(Edge::into_node).collect();
        (self.page_info, nodes)
    }
}

pub type InstallationEdge = Edge<Installation>;
pub type ChartEdge = Edge<Chart>;
pub type VersionEdge = Edge<Version>;
pub type ChartInstallationEdge = Edge<ChartInstallation>;
pub type TerraformEdge = Edge<Terraform>;
pub type TerraformInstallationEdge = Edge<TerraformInstallation>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{json, Value};
    use speculoos::prelude::*;

    use super::Connection;
    use crate::{decode::FieldPath, entities::Publisher, DecodeErrorKind};

    fn decode(raw: &Value) -> Result<Connection<Publisher>, crate::DecodeError> {
        Connection::decode_at(raw, FieldPath::from_name("publishers"))
    }

    #[test]
    fn nodes_keep_server_order() {
        let page = decode(&json!({
            "pageInfo": { "hasNextPage": true, "endCursor": "YXJyYXk6MQ==" },
            "edges": [
                { "node": { "id": "p1", "name": "plural" } },
                { "node": { "id": "p2", "name": "ada-co" } }
            ]
        }))
        .unwrap();

        let names: Vec<_> = page.nodes().map(|p| p.name().as_str()).collect();
        assert_eq!(names, vec!["plural", "ada-co"]);
        assert_eq!(page.page_info().next_cursor(), Some("YXJyYXk6MQ=="));
    }

    #[rstest]
    #[case::null_cursor(json!(null))]
    #[case::stale_cursor(json!("YXJyYXk6OQ=="))]
    fn last_page_has_no_next_cursor(#[case] cursor: Value) {
        let page = decode(&json!({
            "pageInfo": { "hasNextPage": false, "endCursor": cursor },
            "edges": []
        }))
        .unwrap();

        assert_eq!(page.page_info().next_cursor(), None);
        let (_, nodes) = page.into_parts();
        assert!(nodes.is_empty());
    }

    #[test]
    fn more_pages_without_a_cursor_is_an_error() {
        let err = decode(&json!({
            "pageInfo": { "hasNextPage": true, "endCursor": null },
            "edges": []
        }))
        .unwrap_err();

        assert_that!(err.kind()).is_equal_to(&DecodeErrorKind::MissingField);
        assert_eq!(err.path().to_string(), "publishers.pageInfo.endCursor");
    }

    #[test]
    fn missing_page_info_is_an_error() {
        let err = decode(&json!({ "edges": [] })).unwrap_err();
        assert_eq!(err.path().to_string(), "publishers.pageInfo");
    }

    #[test]
    fn bad_nodes_report_their_edge_index() {
        let err = decode(&json!({
            "pageInfo": { "hasNextPage": false },
            "edges": [
                { "node": { "id": "p1", "name": "plural" } },
                { "node": { "id": "p2" } }
            ]
        }))
        .unwrap_err();

        assert_eq!(err.path().to_string(), "publishers.edges[1].node.name");
    }
}
