use async_trait::async_trait;
use http::{header::HeaderMap, Method, StatusCode};
use url::Url;

use crate::{BoxError, ParameterSet};

/// Transport used by the proxy constructors that do not take one.
#[cfg(feature = "blocking")]
pub type DefaultTransport = reqwest::blocking::Client;
/// Transport used by the proxy constructors that do not take one.
#[cfg(not(feature = "blocking"))]
pub type DefaultTransport = reqwest::Client;

/// A fully prepared call, ready to be put on the wire.
///
/// `params` already contains the authentication parameters; a transport must
/// send them unchanged.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub params: ParameterSet,
    pub headers: HeaderMap,
}

impl HttpRequest {
    /// `GET`, `HEAD` and `DELETE` carry the parameters in the query string,
    /// everything else as an urlencoded form body.
    pub fn params_in_query(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD || self.method == Method::DELETE
    }
}

/// What came back from the server, whatever the status code.
#[derive(Debug, Clone)]
pub struct CallResponse {
    status: StatusCode,
    headers: HeaderMap,
    payload: String,
}

impl CallResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, payload: String) -> Self {
        CallResponse {
            status,
            headers,
            payload,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Canonical reason phrase of the status code, if it has one.
    pub fn status_message(&self) -> Option<&'static str> {
        self.status.canonical_reason()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Looks up a response header; `None` if absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}

/// Blocking HTTP collaborator.
///
/// Implementations shared between threads must support concurrent dispatch
/// of independent requests.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<CallResponse, BoxError>;
}

/// Async HTTP collaborator.
#[async_trait]
pub trait AsyncTransport {
    async fn execute_async(&self, request: &HttpRequest) -> Result<CallResponse, BoxError>;
}

// `reqwest::blocking::Client` keeps a connection pool behind an `Arc` and
// is documented as safe to share between threads.
#[cfg(feature = "blocking")]
impl Transport for reqwest::blocking::Client {
    fn execute(&self, request: &HttpRequest) -> Result<CallResponse, BoxError> {
        let builder = self
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        let builder = if request.params_in_query() {
            builder.query(&request.params)
        } else {
            builder.form(&request.params)
        };

        let response = builder.send()?;
        let status = response.status();
        let headers = response.headers().clone();
        let payload = response.text()?;
        Ok(CallResponse::new(status, headers, payload))
    }
}

#[async_trait]
impl AsyncTransport for reqwest::Client {
    async fn execute_async(&self, request: &HttpRequest) -> Result<CallResponse, BoxError> {
        let builder = self
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        let builder = if request.params_in_query() {
            builder.query(&request.params)
        } else {
            builder.form(&request.params)
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let payload = response.text().await?;
        Ok(CallResponse::new(status, headers, payload))
    }
}
