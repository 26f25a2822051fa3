//! Lazy traversal of cursor-paginated root fields.
//!
//! A walk starts [`Idle`](State::Idle) with no cursor. Each time the consumer
//! runs out of buffered nodes the walker fetches exactly one page, so at most
//! one request is ever in flight and dropping the stream stops all traffic.
//!
//! ```text
//! Idle --poll--> Fetching --hasNextPage--> Idle
//!                         --last page----> Exhausted
//!                         --error--------> Failed
//! ```

use std::{collections::VecDeque, mem, num::NonZeroU32};

use futures::stream::{self, BoxStream, StreamExt};
use plural_graphql::GraphQLRequest;
use serde_json::{Map, Value};
use tower::Service;

use crate::{
    decode::Decode,
    entities::Connection,
    query::{execute, BoxError, Plan},
    schema::{Registry, AFTER_ARGUMENT, FIRST_ARGUMENT},
    QueryError,
};

/// Decoded nodes of every page, in server order. The first error ends it.
pub type NodeStream<T> = BoxStream<'static, Result<T, QueryError>>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    /// Waiting to fetch the page after `after`; `None` means the first page.
    Idle { after: Option<String> },
    Fetching,
    Exhausted,
    Failed,
}

struct Walker<T, S> {
    plan: Plan,
    transport: S,
    page_size: NonZeroU32,
    variables: Map<String, Value>,
    state: State,
    buffered: VecDeque<T>,
    pages: usize,
}

impl<T, S> Walker<T, S>
where
    T: Decode,
    S: Service<GraphQLRequest, Response = Value>,
    S::Error: Into<BoxError>,
{
    async fn next_node(&mut self) -> Option<Result<T, QueryError>> {
        loop {
            if let Some(node) = self.buffered.pop_front() {
                return Some(Ok(node));
            }

            let after = match mem::replace(&mut self.state, State::Fetching) {
                State::Idle { after } => after,
                finished => {
                    self.state = finished;
                    return None;
                }
            };

            match self.fetch_page(after).await {
                Ok((next, nodes)) => {
                    self.state = match next {
                        Some(cursor) => State::Idle {
                            after: Some(cursor),
                        },
                        None => State::Exhausted,
                    };
                    self.buffered.extend(nodes);
                }
                Err(err) => {
                    self.state = State::Failed;
                    return Some(Err(err));
                }
            }
        }
    }

    /// Fetches one page, returning the cursor of the next one (if any) and its nodes.
    async fn fetch_page(
        &mut self,
        after: Option<String>,
    ) -> Result<(Option<String>, Vec<T>), QueryError> {
        let mut variables = self.variables.clone();
        variables.insert(FIRST_ARGUMENT.to_string(), self.page_size.get().into());
        match &after {
            Some(cursor) => variables.insert(AFTER_ARGUMENT.to_string(), cursor.clone().into()),
            None => variables.remove(AFTER_ARGUMENT),
        };

        tracing::trace!(
            entity = %self.plan.kind(),
            page = self.pages,
            after = after.as_deref(),
            "fetching page"
        );
        let data = execute(&mut self.transport, self.plan.request(variables)).await?;
        self.pages += 1;

        let raw = self.plan.root_value(&data)?;
        let (page_info, nodes) =
            Connection::<T>::decode_at(raw, self.plan.root_path())?.into_parts();
        tracing::trace!(
            entity = %self.plan.kind(),
            nodes = nodes.len(),
            has_next_page = page_info.has_next_page(),
            "page fetched"
        );

        Ok((page_info.next_cursor().map(str::to_string), nodes))
    }
}

/// Walks every page of `T`'s root connection through `transport`.
///
/// `variables` carries the root field's own arguments (e.g. `repositoryId`);
/// `first` and `after` are filled in per page and are rejected if supplied.
/// Nothing is sent until the stream is first polled.
pub fn paginate<T, S>(
    registry: &Registry,
    transport: S,
    page_size: NonZeroU32,
    variables: Map<String, Value>,
) -> Result<NodeStream<T>, QueryError>
where
    T: Decode + Send + 'static,
    S: Service<GraphQLRequest, Response = Value> + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    if let Some(reserved) = [FIRST_ARGUMENT, AFTER_ARGUMENT]
        .into_iter()
        .find(|name| variables.contains_key(*name))
    {
        return Err(QueryError::ReservedVariable(reserved));
    }

    let plan = Plan::new(registry, T::KIND, &variables)?;
    if !plan.is_connection() {
        return Err(QueryError::NotPaginated(plan.kind()));
    }

    let walker = Walker {
        plan,
        transport,
        page_size,
        variables,
        state: State::Idle { after: None },
        buffered: VecDeque::new(),
        pages: 0,
    };
    Ok(stream::unfold(walker, |mut walker| async move {
        let node = walker.next_node().await?;
        Some((node, walker))
    })
    .boxed())
}
