#![warn(missing_docs)]

//! GraphQL middleware for HTTP services
//!
//! [`GraphQLService`] turns a composed query document plus its variables into a
//! POST against the registry endpoint and unwraps the `{data, errors}` envelope,
//! handing back the untyped `data` tree for the caller to decode.

use std::{fmt, future::Future, pin::Pin, str::FromStr};

use bytes::Bytes;
use http::{uri::InvalidUri, HeaderValue, Method, StatusCode, Uri};
use http_body_util::Full;
use plural_http::{HttpRequest, HttpResponse};
use serde::Serialize;
use serde_json::{Map, Value};
use tower::{Layer, Service};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Re-export / renamed type alias for [`graphql_client::Response`]
pub type GraphQLResponse<T = Value> = graphql_client::Response<T>;

/// Errors that may occur from using a [`GraphQLService`]
#[derive(thiserror::Error, Debug)]
pub enum GraphQLServiceError {
    /// There was no data field provided in the response
    #[error("No data field provided{}", format_messages(.0))]
    NoData(Vec<graphql_client::Error>),
    /// The response returned some data, but there were errors
    #[error("Data was returned, but with errors: {}", friendly_errors_detail.join(" "))]
    PartialError {
        /// The partial data returned
        data: Value,
        /// The GraphQL errors that were produced
        errors: Vec<graphql_client::Error>,
        /// display ready decoration of `errors`
        friendly_errors_detail: Vec<String>,
    },
    /// Data serialization error
    #[error("Serialization error")]
    Serialization(serde_json::Error),
    /// Data deserialization error
    #[error("Deserialization error (status {status_code})")]
    Deserialization {
        /// The source error
        error: serde_json::Error,
        /// The data that was attempted to be deserialized
        data: Bytes,
        /// The [`StatusCode`] of the request
        status_code: StatusCode,
    },
    /// [`http`]-related error, probably from header-related tasks
    #[error("HTTP error: {:?}", .0)]
    Http(#[from] http::Error),
    /// Error that occurs from a failure to parse a [`Uri`] from a [`Url`]
    #[error("Unable to convert URL to URI.")]
    InvalidUri(#[from] InvalidUri),
    /// Errors that occur as a result of the underlying HTTP service failing
    #[error("Upstream service error: {}", .0)]
    UpstreamService(#[from] Box<dyn std::error::Error + Send + Sync>),
}

fn format_messages(errors: &[graphql_client::Error]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(": {}", friendly_messages(errors).join(" "))
    }
}

fn friendly_messages(errors: &[graphql_client::Error]) -> Vec<String> {
    errors.iter().map(|err| err.message.clone()).collect()
}

/// A query document and the variables it is executed with
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    query: String,
    variables: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<String>,
}

impl GraphQLRequest {
    /// Constructs a new [`GraphQLRequest`]
    pub fn new(query: impl Into<String>, variables: Map<String, Value>) -> GraphQLRequest {
        GraphQLRequest {
            query: query.into(),
            variables,
            operation_name: None,
        }
    }

    /// Names the operation inside `query` that the server should run
    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> GraphQLRequest {
        self.operation_name = Some(operation_name.into());
        self
    }

    /// The query document text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Variables sent alongside the document
    pub const fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// The operation name, when one was set
    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }
}

/// [`Layer`] that wraps a service with GraphQL middleware
#[derive(Default)]
pub struct GraphQLLayer {
    endpoint: Option<Url>,
}

impl GraphQLLayer {
    /// Constructs a new [`GraphQLLayer`]
    pub const fn new(endpoint: Url) -> GraphQLLayer {
        GraphQLLayer {
            endpoint: Some(endpoint),
        }
    }
}

impl<S> Layer<S> for GraphQLLayer {
    type Service = GraphQLService<S>;
    fn layer(&self, inner: S) -> Self::Service {
        GraphQLService::new(self.endpoint.clone(), inner)
    }
}

/// Middleware that wraps a service in GraphQL functionality
#[derive(Clone, Debug)]
pub struct GraphQLService<S> {
    inner: S,
    endpoint: Option<Url>,
}

impl<S> GraphQLService<S> {
    /// Constructs a new [`GraphQLService`]
    pub const fn new(endpoint: Option<Url>, inner: S) -> GraphQLService<S> {
        GraphQLService { endpoint, inner }
    }
}

impl<S> Service<GraphQLRequest> for GraphQLService<S>
where
    S: Service<HttpRequest, Response = HttpResponse> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = Value;
    type Error = GraphQLServiceError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        tower::Service::poll_ready(&mut self.inner, cx)
            .map_err(|err| GraphQLServiceError::UpstreamService(Box::new(err)))
    }

    fn call(&mut self, req: GraphQLRequest) -> Self::Future {
        // https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
        let cloned = self.inner.clone();
        let mut client = std::mem::replace(&mut self.inner, cloned);

        let url = self.endpoint.clone();

        let fut = async move {
            tracing::debug!(
                operation_name = req.operation_name(),
                variables = ?req.variables(),
                "sending GraphQL request"
            );
            let body_bytes =
                Bytes::from(serde_json::to_vec(&req).map_err(GraphQLServiceError::Serialization)?);
            let builder = http::Request::builder();
            let builder = if let Some(url) = url.as_ref() {
                builder.uri(Uri::from_str(url.as_ref())?)
            } else {
                builder
            };
            let http_req = builder
                .method(Method::POST)
                .header(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static(JSON_CONTENT_TYPE),
                )
                .body(Full::new(body_bytes))?;
            let resp = client
                .call(http_req)
                .await
                .map_err(|err| GraphQLServiceError::UpstreamService(Box::new(err)))?;
            unwrap_envelope(resp)
        };
        Box::pin(fut)
    }
}

fn unwrap_envelope(resp: HttpResponse) -> Result<Value, GraphQLServiceError> {
    let status_code = resp.status();
    let body = resp.into_body();
    let graphql_response: GraphQLResponse = serde_json::from_slice(&body).map_err(|error| {
        GraphQLServiceError::Deserialization {
            error,
            data: body.clone(),
            status_code,
        }
    })?;

    match (graphql_response.data, graphql_response.errors) {
        (Some(data), Some(errors)) if !errors.is_empty() => {
            let friendly_errors_detail = friendly_messages(&errors);
            Err(GraphQLServiceError::PartialError {
                data,
                errors,
                friendly_errors_detail,
            })
        }
        (Some(data), _) => Ok(data),
        (None, errors) => Err(GraphQLServiceError::NoData(errors.unwrap_or_default())),
    }
}

impl fmt::Display for GraphQLRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation_name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "anonymous operation"),
        }
    }
}
