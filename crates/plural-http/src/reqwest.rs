use std::{pin::Pin, time::Duration};

use buildstructor::buildstructor;
use futures::Future;
use http::{header::USER_AGENT, HeaderValue};
use reqwest::ClientBuilder;
use tower::{util::BoxCloneService, Service, ServiceBuilder, ServiceExt};

use crate::{
    body::body_to_bytes, HttpRequest, HttpResponse, HttpService, HttpServiceConfig,
    HttpServiceError,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// A [`Service`] that wraps a [`reqwest`] client and speaks [`http`] types
#[derive(Clone, Debug)]
pub struct ReqwestService {
    client: BoxCloneService<reqwest::Request, reqwest::Response, HttpServiceError>,
}

#[buildstructor]
impl ReqwestService {
    /// Constructs a new [`ReqwestService`]
    #[builder]
    pub fn new(
        config: Option<HttpServiceConfig>,
        client: Option<reqwest::Client>,
    ) -> Result<ReqwestService, reqwest::Error> {
        let config = config.unwrap_or_default();
        let client = match client {
            Some(client) => client,
            None => {
                let builder = ClientBuilder::new().danger_accept_invalid_certs(
                    (*config.accept_invalid_certificates()).unwrap_or_default(),
                );
                let builder = match config.user_agent() {
                    Some(user_agent) => builder.user_agent(user_agent.clone()),
                    None => builder,
                };
                builder.build()?
            }
        };
        let timeout = (*config.timeout()).unwrap_or(DEFAULT_TIMEOUT);
        tracing::debug!(?timeout, "building reqwest service");
        let client = ServiceBuilder::new()
            .map_err(HttpServiceError::from)
            .timeout(timeout)
            .service(client)
            .boxed_clone();
        Ok(ReqwestService { client })
    }
}

impl From<reqwest::Error> for HttpServiceError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_body() {
            HttpServiceError::Body(value.into())
        } else if value.is_connect() {
            HttpServiceError::Connect(value.into())
        } else if value.is_timeout() {
            HttpServiceError::TimedOut
        } else if value.is_decode() {
            HttpServiceError::Decode(value.into())
        } else {
            HttpServiceError::Unexpected(value.into())
        }
    }
}

impl Service<HttpRequest> for ReqwestService {
    type Response = HttpResponse;
    type Error = HttpServiceError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.client.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        // https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
        let cloned = self.client.clone();
        let mut client = std::mem::replace(&mut self.client, cloned);
        let fut = async move {
            let (parts, mut body) = req.into_parts();
            let bytes = body_to_bytes(&mut body)
                .await
                .map_err(|err| HttpServiceError::Body(Box::new(err)))?;
            let req = http::Request::from_parts(parts, reqwest::Body::from(bytes));
            let req = reqwest::Request::try_from(req)?;
            let resp = client.call(req).await?;

            let status = resp.status();
            let headers = resp.headers().clone();
            let bytes = resp.bytes().await?;

            let mut http_resp = http::Response::new(bytes);
            *http_resp.status_mut() = status;
            *http_resp.headers_mut() = headers;
            Ok(http_resp)
        };
        Box::pin(fut)
    }
}

impl From<ReqwestService> for HttpService {
    fn from(value: ReqwestService) -> Self {
        value.boxed_clone()
    }
}

const fn default_user_agent() -> HeaderValue {
    HeaderValue::from_static(concat!("plural-http/", env!("CARGO_PKG_VERSION")))
}

impl HttpServiceConfig {
    /// Header pairs that every request built from this config should carry
    pub fn default_headers(&self) -> http::HeaderMap {
        let mut headers = http::HeaderMap::new();
        let user_agent = self
            .user_agent()
            .as_deref()
            .and_then(|ua| HeaderValue::from_str(ua).ok())
            .unwrap_or_else(default_user_agent);
        headers.insert(USER_AGENT, user_agent);
        headers
    }
}
