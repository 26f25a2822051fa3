//! Middleware that stamps a fixed set of headers onto every request

use http::HeaderMap;
use tower::{Layer, Service};

/// [`Layer`] producing [`ExtendHeaders`] services
pub struct ExtendHeadersLayer {
    headers: HeaderMap,
}

impl ExtendHeadersLayer {
    /// Creates a layer that adds `headers` to each request
    pub fn new(headers: impl Into<HeaderMap>) -> ExtendHeadersLayer {
        ExtendHeadersLayer {
            headers: headers.into(),
        }
    }
}

impl<S: Clone> Layer<S> for ExtendHeadersLayer {
    type Service = ExtendHeaders<S>;
    fn layer(&self, inner: S) -> Self::Service {
        ExtendHeaders {
            headers: self.headers.clone(),
            inner,
        }
    }
}

/// Adds headers to outgoing requests, replacing values already present under the same name
#[derive(Clone, Debug)]
pub struct ExtendHeaders<S: Clone> {
    headers: HeaderMap,
    inner: S,
}

impl<Req, S> Service<http::Request<Req>> for ExtendHeaders<S>
where
    S: Service<http::Request<Req>> + Clone,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<Req>) -> Self::Future {
        req.headers_mut().extend(self.headers.clone());
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use http::{header::USER_AGENT, HeaderMap, HeaderValue};
    use speculoos::prelude::*;
    use tower::{service_fn, ServiceBuilder, ServiceExt};

    use super::ExtendHeadersLayer;

    #[tokio::test]
    async fn headers_are_added_to_requests() -> anyhow::Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("plural-client/test"));

        let service = ServiceBuilder::new()
            .layer(ExtendHeadersLayer::new(headers))
            .service(service_fn(|req: http::Request<()>| async move {
                Ok::<_, std::convert::Infallible>(req.headers().get(USER_AGENT).cloned())
            }));

        let request = http::Request::builder()
            .header(USER_AGENT, "something-else")
            .body(())?;
        let seen = service.oneshot(request).await?;

        assert_that!(seen)
            .is_some()
            .is_equal_to(HeaderValue::from_static("plural-client/test"));
        Ok(())
    }
}
