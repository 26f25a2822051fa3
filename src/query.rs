//! Running composed documents against a transport.

use plural_graphql::GraphQLRequest;
use serde_json::{Map, Value};
use tower::{Service, ServiceExt};

use crate::{
    decode::{wire_kind, Decode, FieldPath},
    schema::{EntityKind, Registry},
    ConfigurationError, DecodeError, QueryError, TransportError, WireKind,
};

/// Errors a transport may fail with, once boxed.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a query for one entity kind needs: its document text and where the
/// answer sits in the response.
#[derive(Clone, Debug)]
pub(crate) struct Plan {
    kind: EntityKind,
    query: String,
    operation_name: String,
    root_name: &'static str,
    connection: bool,
}

impl Plan {
    /// Plans a query for `kind`, checking that every required argument of its
    /// root field is among `variables`.
    pub(crate) fn new(
        registry: &Registry,
        kind: EntityKind,
        variables: &Map<String, Value>,
    ) -> Result<Plan, QueryError> {
        let def = registry
            .get(kind)
            .ok_or_else(|| ConfigurationError::MissingFragment {
                fragment: kind.fragment_name(),
                referenced_by: None,
            })?;
        let root = def.root_field().ok_or(QueryError::NoRootField(kind))?;

        if let Some(argument) = root
            .arguments()
            .into_iter()
            .find(|argument| argument.is_required() && !variables.contains_key(argument.name()))
        {
            return Err(QueryError::MissingVariable {
                entity: kind,
                variable: argument.name(),
            });
        }

        let document = registry.compose(kind)?;
        Ok(Plan {
            kind,
            query: document.as_str().to_string(),
            operation_name: root.operation_name(),
            root_name: root.name(),
            connection: root.is_connection(),
        })
    }

    pub(crate) const fn kind(&self) -> EntityKind {
        self.kind
    }

    pub(crate) const fn is_connection(&self) -> bool {
        self.connection
    }

    pub(crate) fn request(&self, variables: Map<String, Value>) -> GraphQLRequest {
        GraphQLRequest::new(self.query.clone(), variables).with_operation_name(&self.operation_name)
    }

    /// Errors are reported under the root field's name, e.g. `installations.edges[0].node.id`.
    pub(crate) fn root_path(&self) -> FieldPath {
        FieldPath::from_name(self.root_name)
    }

    /// The root field's value inside a response's `data` object.
    pub(crate) fn root_value<'a>(&self, data: &'a Value) -> Result<&'a Value, DecodeError> {
        match data {
            Value::Object(fields) => fields
                .get(self.root_name)
                .filter(|value| !value.is_null())
                .ok_or_else(|| DecodeError::missing(self.root_path())),
            other => Err(DecodeError::mismatch(
                WireKind::Object,
                wire_kind(other),
                FieldPath::default(),
            )),
        }
    }
}

/// Sends one request, waiting for the transport to become ready first.
pub(crate) async fn execute<S>(
    transport: &mut S,
    request: GraphQLRequest,
) -> Result<Value, TransportError>
where
    S: Service<GraphQLRequest, Response = Value>,
    S::Error: Into<BoxError>,
{
    tracing::debug!(operation = %request, "sending query");
    let ready = transport.ready().await.map_err(TransportError::new)?;
    ready.call(request).await.map_err(TransportError::new)
}

/// Fetches the single entity behind `T`'s root field.
///
/// `variables` must hold every required argument of the root field, e.g.
/// `name` for [`Repository`](crate::entities::Repository).
pub async fn fetch<T, S>(
    registry: &Registry,
    transport: &mut S,
    variables: Map<String, Value>,
) -> Result<T, QueryError>
where
    T: Decode,
    S: Service<GraphQLRequest, Response = Value>,
    S::Error: Into<BoxError>,
{
    let plan = Plan::new(registry, T::KIND, &variables)?;
    if plan.is_connection() {
        return Err(QueryError::Paginated(plan.kind()));
    }

    let data = execute(transport, plan.request(variables)).await?;
    let raw = plan.root_value(&data)?;
    Ok(T::decode_at(raw, plan.root_path())?)
}
