#![warn(missing_docs)]

//! [`tower`] services for talking HTTP to a package registry

use std::{fmt::Debug, str::Utf8Error, time::Duration};

use buildstructor::Builder;
use bytes::Bytes;
use derive_getters::Getters;
pub use http_body::Body;
pub use http_body_util::{BodyExt, Empty, Full};
use tower::{timeout::error::Elapsed, util::BoxCloneService};

pub mod body;
mod error;
pub mod extend_headers;
mod reqwest;

pub use error::HttpServiceError;
pub use reqwest::ReqwestService;

/// Request type every service in this crate accepts
pub type HttpRequest = http::Request<Full<Bytes>>;
/// Response type every service in this crate produces
pub type HttpResponse<T = Bytes> = http::Response<T>;
/// Type-erased HTTP service handed to the GraphQL layer
pub type HttpService = BoxCloneService<HttpRequest, HttpResponse, HttpServiceError>;

/// Settings for building an [`HttpService`], independent of the backing client
#[derive(Clone, Debug, Builder, Default, Getters)]
pub struct HttpServiceConfig {
    accept_invalid_certificates: Option<bool>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl From<Box<dyn std::error::Error + Send + Sync>> for HttpServiceError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        if err.is::<Elapsed>() {
            return HttpServiceError::TimedOut;
        }
        match err.downcast::<HttpServiceError>() {
            Ok(err) => *err,
            Err(err) => match err.downcast::<::reqwest::Error>() {
                Ok(err) => HttpServiceError::from(*err),
                Err(err) => HttpServiceError::Unexpected(err),
            },
        }
    }
}

impl From<Utf8Error> for HttpServiceError {
    fn from(value: Utf8Error) -> Self {
        HttpServiceError::Decode(Box::new(value))
    }
}
