use apollo_parser::Parser;
use assert_fs::{prelude::*, TempDir};
use futures::TryStreamExt;
use httpmock::{Method, MockServer};
use plural_client::{compose, ClientConfig, EntityKind, PluralClient, QueryError, Registry};
use plural_graphql::GraphQLServiceError;
use pretty_assertions::assert_eq;
use serde_json::json;
use speculoos::prelude::*;
use strum::IntoEnumIterator;
use url::Url;

fn client_for(server: &MockServer) -> PluralClient {
    plural_log::init(Some(plural_log::Level::DEBUG));
    let config = ClientConfig::builder()
        .endpoint(Url::parse(&server.url("/gql")).unwrap())
        .user_agent("plural-client-tests".to_string())
        .build();
    PluralClient::new(&config).unwrap()
}

#[test]
fn it_composes_a_parseable_document_for_every_entity() {
    let registry = Registry::standard().unwrap();
    for kind in EntityKind::iter() {
        let document = compose(kind).unwrap();

        assert_eq!(document, registry.compose(kind).unwrap());
        assert_eq!(
            document.fragment_names().last(),
            Some(&kind.fragment_name()),
            "{kind} should be emitted last"
        );
        let tree = Parser::new(document.as_str()).parse();
        assert_eq!(tree.errors().count(), 0, "{kind}: {document}");
    }
}

#[tokio::test]
async fn it_walks_installations_over_http() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::POST)
            .path("/gql")
            .header("user-agent", "plural-client-tests");
        then.status(200).json_body(json!({
            "data": {
                "installations": {
                    "pageInfo": { "hasNextPage": false, "endCursor": null },
                    "edges": [
                        {
                            "node": {
                                "id": "i1",
                                "context": { "bucket": "plural-assets" },
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
                            }
                        }
                    ]
                }
            }
        }));
    });

    let installations: Vec<_> = client_for(&server)
        .installations()
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    mock.assert_calls(1);
    assert_eq!(installations.len(), 1);
    assert_eq!(installations[0].repository().name(), "airflow");
    assert_eq!(
        installations[0].context()["bucket"].as_str(),
        Some("plural-assets")
    );
}

#[tokio::test]
async fn it_reports_graphql_errors_as_transport_failures() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::POST).path("/gql");
        then.status(200).json_body(json!({
            "data": null,
            "errors": [{ "message": "forbidden" }]
        }));
    });

    let err = client_for(&server).me().await.unwrap_err();

    mock.assert_calls(1);
    let QueryError::Transport(err) = err else {
        panic!("expected a transport error, got {err:?}");
    };
    let source = err.into_inner().downcast::<GraphQLServiceError>().unwrap();
    assert!(matches!(*source, GraphQLServiceError::NoData(_)));
}

#[tokio::test]
async fn it_loads_its_endpoint_from_the_config_dir() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::POST).path("/registry/gql");
        then.status(200).json_body(json!({
            "data": {
                "repository": {
                    "id": "r1",
                    "name": "airflow",
                    "publisher": { "id": "p1", "name": "plural" }
                }
            }
        }));
    });

    let home = TempDir::new().unwrap();
    home.child("config.toml")
        .write_str(&format!(
            "endpoint = \"{}\"\npage_size = 10\n",
            server.url("/registry/gql")
        ))
        .unwrap();
    let config = ClientConfig::load_with_env(Some(home.path()), |_| None).unwrap();
    let client = PluralClient::new(&config).unwrap();

    let repository = client.repository("airflow").await.unwrap();

    mock.assert_calls(1);
    assert_that!(client.page_size().get()).is_equal_to(10);
    assert_eq!(repository.publisher().name(), "plural");
}
