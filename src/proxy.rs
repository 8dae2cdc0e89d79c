use http::header::HeaderValue;
use log::debug;
use url::Url;

use crate::{
    flickr_signature, Call, Credentials, DefaultTransport, Error, ParameterSet, Result, Signer,
    TokenResponse, FLICKR_API_KEY_KEY, FLICKR_API_SIG_KEY, FLICKR_AUTH_URL, FLICKR_REST_URL,
};

const FLICKR_PERMS_KEY: &str = "perms";
const FLICKR_FROB_KEY: &str = "frob";
// TODO: take the permission level as an argument once write access is needed
const FLICKR_READ_PERMS: &str = "read";

/// Entry point to a REST service.
///
/// A proxy binds a base url, the credentials and the signer chosen at
/// construction, and the transport calls go through. It is a factory for
/// [`Call`]s; any number of calls may be created from one proxy, from any
/// number of threads, as long as the transport is `Sync`.
///
/// # Token rotation
///
/// Changing the token needs `&mut Proxy`, so it cannot happen while calls
/// borrowed from the proxy are outstanding. A proxy shared between threads
/// must be wrapped in a lock (e.g. `RwLock<Proxy>`) by the caller if the
/// token is to be rotated.
#[derive(Debug)]
pub struct Proxy<T = DefaultTransport> {
    base_url: Url,
    credentials: Option<Credentials>,
    signer: Signer,
    transport: T,
    user_agent: Option<HeaderValue>,
}

impl Proxy<DefaultTransport> {
    /// Constructs a new `Proxy` with a default transport.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Configuration`] if the base url cannot be parsed,
    /// or if `signer` needs credentials and none are given.
    pub fn new(base_url: &str, credentials: Option<Credentials>, signer: Signer) -> Result<Self> {
        Proxy::new_with_transport(DefaultTransport::new(), base_url, credentials, signer)
    }

    /// A proxy without credentials; calls are sent unsigned.
    pub fn plain(base_url: &str) -> Result<Self> {
        Proxy::new(base_url, None, Signer::None)
    }

    /// A proxy for the Flickr REST api.
    pub fn flickr<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Result<Self>
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        let credentials = Credentials::new(consumer_key, consumer_secret)?;
        Proxy::new(FLICKR_REST_URL, Some(credentials), Signer::Flickr)
    }

    /// A proxy for the Flickr REST api, authenticated with an access token.
    pub fn flickr_with_token<TKey, TSecret, TToken>(
        consumer_key: TKey,
        consumer_secret: TSecret,
        token: TToken,
    ) -> Result<Self>
    where
        TKey: Into<String>,
        TSecret: Into<String>,
        TToken: Into<String>,
    {
        let mut proxy = Proxy::flickr(consumer_key, consumer_secret)?;
        proxy.set_token(Some(token))?;
        Ok(proxy)
    }

    /// An OAuth 1.0 PLAINTEXT proxy without a token yet.
    pub fn oauth<TKey, TSecret>(
        base_url: &str,
        consumer_key: TKey,
        consumer_secret: TSecret,
    ) -> Result<Self>
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        let credentials = Credentials::new(consumer_key, consumer_secret)?;
        Proxy::new(base_url, Some(credentials), Signer::oauth_plaintext())
    }

    /// An OAuth 1.0 PLAINTEXT proxy with an access token and secret.
    pub fn oauth_with_token<TKey, TSecret, TToken, TTokenSecret>(
        base_url: &str,
        consumer_key: TKey,
        consumer_secret: TSecret,
        token: TToken,
        token_secret: TTokenSecret,
    ) -> Result<Self>
    where
        TKey: Into<String>,
        TSecret: Into<String>,
        TToken: Into<String>,
        TTokenSecret: Into<String>,
    {
        let credentials =
            Credentials::new(consumer_key, consumer_secret)?.token(token, token_secret);
        Proxy::new(base_url, Some(credentials), Signer::oauth_plaintext())
    }
}

impl<T> Proxy<T> {
    /// Constructs a new `Proxy` sending its calls through `transport`.
    ///
    /// Timeouts, TLS and redirect policy are whatever `transport` is
    /// configured with.
    pub fn new_with_transport(
        transport: T,
        base_url: &str,
        credentials: Option<Credentials>,
        signer: Signer,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| Error::Configuration(format!("invalid base url {base_url:?}: {err}")))?;
        if credentials.is_none() && !matches!(signer, Signer::None) {
            return Err(Error::Configuration(format!(
                "{} signer needs a consumer key and secret",
                signer.name()
            )));
        }
        debug!(
            "new proxy for {} using the {} signer",
            base_url,
            signer.name()
        );
        Ok(Proxy {
            base_url,
            credentials,
            signer,
            transport,
            user_agent: None,
        })
    }

    /// Creates a call bound to this proxy.
    ///
    /// The call reads the credentials when it is prepared, not now.
    pub fn new_call(&self) -> Call<'_, T> {
        Call::new(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn user_agent(&self) -> Option<&HeaderValue> {
        self.user_agent.as_ref()
    }

    /// Sets the `User-Agent` header sent with every call.
    pub fn set_user_agent(&mut self, user_agent: HeaderValue) {
        self.user_agent = Some(user_agent);
    }

    /// The current request or access token, if any.
    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().and_then(Credentials::get_token)
    }

    pub fn token_secret(&self) -> Option<&str> {
        self.credentials
            .as_ref()
            .and_then(Credentials::get_token_secret)
    }

    /// Replaces the current token.
    ///
    /// Affects calls prepared afterwards.
    pub fn set_token<S: Into<String>>(&mut self, token: Option<S>) -> Result<()> {
        self.credentials_mut()?.set_token(token);
        Ok(())
    }

    pub fn set_token_secret<S: Into<String>>(&mut self, token_secret: Option<S>) -> Result<()> {
        self.credentials_mut()?.set_token_secret(token_secret);
        Ok(())
    }

    /// Installs the token pair obtained from an OAuth token exchange.
    pub fn apply_token(&mut self, token: &TokenResponse) -> Result<()> {
        let credentials = self.credentials_mut()?;
        credentials.set_token(Some(token.oauth_token.as_str()));
        credentials.set_token_secret(Some(token.oauth_token_secret.as_str()));
        Ok(())
    }

    /// Computes the Flickr `api_sig` of `params` with this proxy's secret.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Configuration`] unless the proxy is a Flickr
    /// proxy.
    pub fn flickr_sign(&self, params: &ParameterSet) -> Result<String> {
        let credentials = self.flickr_credentials()?;
        Ok(flickr_signature(credentials.consumer_secret(), params))
    }

    /// Builds the url a user visits to grant read access for `frob`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] if `frob` is empty and with
    /// [`Error::Configuration`] unless the proxy is a Flickr proxy.
    pub fn build_login_url(&self, frob: &str) -> Result<String> {
        if frob.is_empty() {
            return Err(Error::InvalidArgument("frob"));
        }
        let credentials = self.flickr_credentials()?;

        let mut params = ParameterSet::new();
        params.add(FLICKR_API_KEY_KEY, credentials.consumer_key());
        params.add(FLICKR_PERMS_KEY, FLICKR_READ_PERMS);
        params.add(FLICKR_FROB_KEY, frob);
        let signature = flickr_signature(credentials.consumer_secret(), &params);

        let url = Url::parse_with_params(
            FLICKR_AUTH_URL,
            &[
                (FLICKR_API_KEY_KEY, credentials.consumer_key()),
                (FLICKR_PERMS_KEY, FLICKR_READ_PERMS),
                (FLICKR_FROB_KEY, frob),
                (FLICKR_API_SIG_KEY, signature.as_str()),
            ],
        )?;
        Ok(url.into())
    }

    /// Url a call to `function` is sent to.
    pub(crate) fn resolve_url(&self, function: Option<&str>) -> Result<Url> {
        let function = match function {
            Some(f) if !f.is_empty() && !self.signer.carries_function() => f,
            _ => return Ok(self.base_url.clone()),
        };
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(function.trim_start_matches('/'))?)
    }

    fn flickr_credentials(&self) -> Result<&Credentials> {
        match (&self.signer, &self.credentials) {
            (Signer::Flickr, Some(credentials)) => Ok(credentials),
            _ => Err(Error::Configuration(
                "flickr signing needs a flickr proxy with credentials".into(),
            )),
        }
    }

    fn credentials_mut(&mut self) -> Result<&mut Credentials> {
        self.credentials
            .as_mut()
            .ok_or_else(|| Error::Configuration("the proxy has no credentials".into()))
    }
}
