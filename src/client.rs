use std::{num::NonZeroU32, path::Path};

use plural_graphql::{GraphQLLayer, GraphQLRequest, GraphQLService};
use plural_http::{
    extend_headers::{ExtendHeaders, ExtendHeadersLayer},
    HttpService, HttpServiceError, ReqwestService,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tower::{Service, ServiceBuilder};

use crate::{
    compose::Document,
    config::{ClientConfig, ConfigError},
    decode::{Decode, Entity},
    entities::{
        Chart, ChartInstallation, Installation, Repository, Terraform, TerraformInstallation,
        User, Version,
    },
    paginate::{paginate, NodeStream},
    query::{fetch, BoxError},
    schema::{EntityKind, Registry},
    ConfigurationError, DecodeError, QueryError,
};

/// The transport [`PluralClient::new`] builds: GraphQL over reqwest.
pub type PluralTransport = GraphQLService<ExtendHeaders<HttpService>>;

/// Errors that may occur while setting up or using a [`PluralClient`].
#[derive(Error, Debug)]
pub enum PluralClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("could not build the HTTP client: {0}")]
    Http(#[from] HttpServiceError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Typed access to the package registry API.
///
/// Every query goes through a clone of one transport, so the client itself
/// can be shared freely and each page walk owns its own handle.
#[derive(Clone, Debug)]
pub struct PluralClient<S = PluralTransport> {
    registry: &'static Registry,
    transport: S,
    page_size: NonZeroU32,
}

impl PluralClient {
    /// Builds a client talking to `config`'s endpoint.
    pub fn new(config: &ClientConfig) -> Result<PluralClient, PluralClientError> {
        let http_config = config.http_config();
        let headers = http_config.default_headers();
        let http: HttpService = ReqwestService::builder()
            .config(http_config)
            .build()
            .map_err(HttpServiceError::from)?
            .into();

        let transport = ServiceBuilder::new()
            .layer(GraphQLLayer::new(config.endpoint().clone()))
            .layer(ExtendHeadersLayer::new(headers))
            .service(http);

        tracing::debug!(endpoint = %config.endpoint(), "built registry client");
        Ok(PluralClient::with_transport(transport, *config.page_size())?)
    }

    /// Loads [`ClientConfig`] from `override_home` (or the platform config
    /// directory) and the environment, then builds a client from it.
    pub fn load(override_home: Option<&Path>) -> Result<PluralClient, PluralClientError> {
        PluralClient::new(&ClientConfig::load(override_home)?)
    }
}

impl<S> PluralClient<S> {
    /// Builds a client over any GraphQL transport.
    pub fn with_transport(
        transport: S,
        page_size: NonZeroU32,
    ) -> Result<PluralClient<S>, ConfigurationError> {
        Ok(PluralClient {
            registry: Registry::standard()?,
            transport,
            page_size,
        })
    }

    pub const fn registry(&self) -> &'static Registry {
        self.registry
    }

    pub const fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    /// The query document for `kind`.
    pub fn compose(&self, kind: EntityKind) -> Result<Document, ConfigurationError> {
        self.registry.compose(kind)
    }

    /// Decodes `raw` as the entity named `type_name`.
    pub fn decode(&self, type_name: &str, raw: &Value) -> Result<Entity, DecodeError> {
        self.registry.decode(type_name, raw)
    }
}

impl<S> PluralClient<S>
where
    S: Service<GraphQLRequest, Response = Value> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    /// Walks every page of `T`'s root connection.
    pub fn paginate<T>(&self, variables: Map<String, Value>) -> Result<NodeStream<T>, QueryError>
    where
        T: Decode + Send + 'static,
    {
        paginate(self.registry, self.transport.clone(), self.page_size, variables)
    }

    /// Fetches the single entity behind `T`'s root field.
    pub async fn fetch<T: Decode>(&self, variables: Map<String, Value>) -> Result<T, QueryError> {
        let mut transport = self.transport.clone();
        fetch(self.registry, &mut transport, variables).await
    }

    /// Installations in the caller's workspace.
    pub fn installations(&self) -> Result<NodeStream<Installation>, QueryError> {
        self.paginate(Map::new())
    }

    /// Helm charts published in a repository.
    pub fn charts(&self, repository_id: &str) -> Result<NodeStream<Chart>, QueryError> {
        self.paginate(variable("repositoryId", repository_id))
    }

    /// Published versions of a chart.
    pub fn versions(&self, chart_id: &str) -> Result<NodeStream<Version>, QueryError> {
        self.paginate(variable("chartId", chart_id))
    }

    /// Terraform modules published in a repository.
    pub fn terraform(&self, repository_id: &str) -> Result<NodeStream<Terraform>, QueryError> {
        self.paginate(variable("repositoryId", repository_id))
    }

    pub fn chart_installations(
        &self,
        repository_id: &str,
    ) -> Result<NodeStream<ChartInstallation>, QueryError> {
        self.paginate(variable("repositoryId", repository_id))
    }

    pub fn terraform_installations(
        &self,
        repository_id: &str,
    ) -> Result<NodeStream<TerraformInstallation>, QueryError> {
        self.paginate(variable("repositoryId", repository_id))
    }

    /// A repository by name.
    pub async fn repository(&self, name: &str) -> Result<Repository, QueryError> {
        self.fetch(variable("name", name)).await
    }

    /// The authenticated user.
    pub async fn me(&self) -> Result<User, QueryError> {
        self.fetch(Map::new()).await
    }
}

fn variable(name: &str, value: &str) -> Map<String, Value> {
    let mut variables = Map::new();
    variables.insert(name.to_string(), Value::String(value.to_string()));
    variables
}
