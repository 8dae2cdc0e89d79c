use http::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use http::Method;
use log::{debug, trace};
use url::Url;

use crate::{
    AsyncTransport, CallResponse, DefaultTransport, Error, HttpRequest, ParameterSet, Proxy,
    Result, Transport,
};

/// Lifecycle of a [`Call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    /// Parameters may be added and removed.
    New,
    /// Signed; the request is frozen.
    Prepared,
    /// Handed to the transport. A call stays here if an async send is
    /// dropped before it completes.
    InFlight,
    /// A response arrived, whatever its status code.
    Done,
    /// The transport failed.
    Failed,
}

/// One invocation of a remote function.
///
/// A call borrows its [`Proxy`] and owns its parameters. It is meant to be
/// driven by the thread that created it: set the function and parameters,
/// [`prepare`](Call::prepare), then [`send`](Call::send). A call is single
/// use; preparing or sending it twice fails with [`Error::State`].
///
/// A non-2xx answer is not an error. It leaves the call [`CallState::Done`]
/// and is reported by [`status_code`](Call::status_code).
#[derive(Debug)]
pub struct Call<'a, T = DefaultTransport> {
    proxy: &'a Proxy<T>,
    function: Option<String>,
    method: Method,
    params: ParameterSet,
    headers: HeaderMap,
    state: CallState,
    url: Option<Url>,
    response: Option<CallResponse>,
}

impl<'a, T> Call<'a, T> {
    pub(crate) fn new(proxy: &'a Proxy<T>) -> Self {
        Call {
            proxy,
            function: None,
            method: Method::GET,
            params: ParameterSet::new(),
            headers: HeaderMap::new(),
            state: CallState::New,
            url: None,
            response: None,
        }
    }

    pub fn proxy(&self) -> &'a Proxy<T> {
        self.proxy
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// The url the call is sent to, known once prepared.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Sets the remote function: a path below the base url, or the Flickr
    /// `method` name.
    pub fn set_function<S: Into<String>>(&mut self, function: S) -> Result<()> {
        self.ensure_state(CallState::New)?;
        self.function = Some(function.into());
        Ok(())
    }

    /// Sets the HTTP method, `GET` by default.
    pub fn set_method(&mut self, method: Method) -> Result<()> {
        self.ensure_state(CallState::New)?;
        self.method = method;
        Ok(())
    }

    pub fn add_param<K, V>(&mut self, key: K, value: V) -> Result<()>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.ensure_state(CallState::New)?;
        self.params.add(key, value);
        Ok(())
    }

    pub fn add_params<I, K, V>(&mut self, params: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.ensure_state(CallState::New)?;
        self.params.add_all(params);
        Ok(())
    }

    pub fn remove_param(&mut self, key: &str) -> Result<Option<String>> {
        self.ensure_state(CallState::New)?;
        Ok(self.params.remove(key))
    }

    pub fn add_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<()> {
        self.ensure_state(CallState::New)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Signs the call with the proxy's signer and freezes it.
    ///
    /// The proxy's credentials are read here, so a token set on the proxy
    /// before this point is used.
    ///
    /// # Errors
    ///
    /// [`Error::State`] unless the call is new, [`Error::Configuration`] or
    /// [`Error::InvalidArgument`] when signing is impossible. A failed
    /// prepare leaves the call new.
    pub fn prepare(&mut self) -> Result<()> {
        self.ensure_state(CallState::New)?;

        let url = self.proxy.resolve_url(self.function.as_deref())?;
        let signer = self.proxy.signer();
        signer.sign(
            self.proxy.credentials(),
            self.function.as_deref(),
            &mut self.params,
        )?;
        if let Some(user_agent) = self.proxy.user_agent() {
            self.headers
                .entry(USER_AGENT)
                .or_insert_with(|| user_agent.clone());
        }

        debug!(
            "prepared {} {} with the {} signer ({} params)",
            self.method,
            url,
            signer.name(),
            self.params.len()
        );
        self.url = Some(url);
        self.state = CallState::Prepared;
        Ok(())
    }

    /// Status code of the response, once done.
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(CallResponse::status_code)
    }

    pub fn status_message(&self) -> Option<&'static str> {
        self.response.as_ref().and_then(CallResponse::status_message)
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response.as_ref().and_then(|r| r.header(name))
    }

    pub fn payload(&self) -> Option<&str> {
        self.response.as_ref().map(CallResponse::payload)
    }

    pub fn response(&self) -> Option<&CallResponse> {
        self.response.as_ref()
    }

    pub fn into_response(self) -> Option<CallResponse> {
        self.response
    }

    fn ensure_state(&self, expected: CallState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::State {
                expected,
                actual: self.state,
            })
        }
    }

    /// Moves a prepared call in flight and returns what goes on the wire.
    fn start_send(&mut self) -> Result<HttpRequest> {
        self.ensure_state(CallState::Prepared)?;
        let url = self.url.clone().ok_or(Error::State {
            expected: CallState::Prepared,
            actual: CallState::New,
        })?;
        self.state = CallState::InFlight;
        trace!("sending {} {}", self.method, url);
        Ok(HttpRequest {
            method: self.method.clone(),
            url,
            params: self.params.clone(),
            headers: self.headers.clone(),
        })
    }

    fn finish_send(
        &mut self,
        result: std::result::Result<CallResponse, crate::BoxError>,
    ) -> Result<&CallResponse> {
        match result {
            Ok(response) => {
                debug!(
                    "{} {} answered {}",
                    self.method,
                    self.url.as_ref().map(Url::as_str).unwrap_or_default(),
                    response.status()
                );
                self.state = CallState::Done;
                let response: &CallResponse = self.response.insert(response);
                Ok(response)
            }
            Err(err) => {
                debug!(
                    "{} {} failed: {err}",
                    self.method,
                    self.url.as_ref().map(Url::as_str).unwrap_or_default()
                );
                self.state = CallState::Failed;
                Err(Error::Transport(err))
            }
        }
    }
}

impl<'a, T> Call<'a, T>
where
    T: Transport,
{
    /// Sends a prepared call and blocks until the transport answers.
    ///
    /// # Errors
    ///
    /// [`Error::State`] unless the call is prepared, [`Error::Transport`] if
    /// the request could not be completed. Transport errors are not retried.
    pub fn send(&mut self) -> Result<&CallResponse> {
        let request = self.start_send()?;
        let result = self.proxy.transport().execute(&request);
        self.finish_send(result)
    }

    /// Prepares and sends the call.
    pub fn invoke(&mut self) -> Result<&CallResponse> {
        self.prepare()?;
        self.send()
    }
}

impl<'a, T> Call<'a, T>
where
    T: AsyncTransport + Sync,
{
    /// Async counterpart of [`send`](Call::send).
    pub async fn send_async(&mut self) -> Result<&CallResponse> {
        let request = self.start_send()?;
        let result = self.proxy.transport().execute_async(&request).await;
        self.finish_send(result)
    }

    /// Async counterpart of [`invoke`](Call::invoke).
    pub async fn invoke_async(&mut self) -> Result<&CallResponse> {
        self.prepare()?;
        self.send_async().await
    }
}
