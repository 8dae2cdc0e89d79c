/*!
reqwest-rest-proxy: signed REST calls on top of reqwest.

# Overview

A [`Proxy`] binds the base url of a REST service, the consumer credentials
and a [`Signer`]. Every remote invocation is a [`Call`] created from the
proxy: set the function and parameters, `prepare` it (the signer adds the
authentication parameters), then `send` it and read the status code and
payload.

Two schemes are provided:

* Flickr signed queries: `api_sig` is the MD5 of the consumer secret followed
  by every parameter, sorted by key.
* OAuth 1.0 with the PLAINTEXT signature method.

# How to use

## Calling the Flickr api

```no_run
use reqwest_rest_proxy::Proxy;

# #[cfg(feature = "blocking")]
# fn main() -> Result<(), reqwest_rest_proxy::Error> {
let proxy = Proxy::flickr("[API_KEY]", "[SECRET]")?;

let mut call = proxy.new_call();
call.set_function("flickr.photos.getInfo")?;
call.add_param("photo_id", "2733")?;
let response = call.invoke()?;

// a non-2xx status is still a response
println!("{} {}", response.status_code(), response.payload());

// send the user here to grant access for a frob
println!("{}", proxy.build_login_url("[FROB]")?);
# Ok(())
# }
# #[cfg(not(feature = "blocking"))]
# fn main() {}
```

## OAuth PLAINTEXT and token exchange

```no_run
use reqwest_rest_proxy::{Proxy, TokenReaderExt};

# #[cfg(feature = "blocking")]
# fn main() -> Result<(), reqwest_rest_proxy::Error> {
let mut proxy = Proxy::oauth("https://example.com/", "[CONSUMER_KEY]", "[CONSUMER_SECRET]")?;

let token = {
    let mut call = proxy.new_call();
    call.set_function("oauth/request_token")?;
    call.invoke().parse_oauth_token()?
};
proxy.apply_token(&token)?;

let mut call = proxy.new_call();
call.set_function("api/me")?;
call.invoke()?;
# Ok(())
# }
# #[cfg(not(feature = "blocking"))]
# fn main() {}
```

# Threads

A [`Proxy`] is `Send + Sync` whenever its transport is, so many threads may
create and drive independent calls from one proxy (or from one proxy each).
A call belongs to the thread that drives it. Changing the token takes
`&mut Proxy`; callers that rotate tokens on a shared proxy must lock it.
*/
mod call;
mod credentials;
mod error;
mod params;
mod proxy;
mod signer;
mod token_reader;
mod transport;

// exposed to external program
pub use call::{Call, CallState};
pub use credentials::{Credentials, SecretsProvider};
pub use error::{
    BoxError, Error, Result, SignError, SignResult, TokenReaderError, TokenReaderResult,
};
pub use params::{Iter, ParameterSet};
pub use proxy::Proxy;
pub use signer::{flickr_signature, plaintext_signature, OAuthParameters, Signer};
pub use token_reader::{TokenReader, TokenReaderExt, TokenResponse};
pub use transport::{AsyncTransport, CallResponse, DefaultTransport, HttpRequest, Transport};

// exposed constant variables
/// Base url of the Flickr REST api.
pub const FLICKR_REST_URL: &str = "http://api.flickr.com/services/rest/";
/// Base url of the Flickr login page.
pub const FLICKR_AUTH_URL: &str = "http://api.flickr.com/services/auth/";
/// Represents `api_key`.
pub const FLICKR_API_KEY_KEY: &str = "api_key";
/// Represents `api_sig`.
pub const FLICKR_API_SIG_KEY: &str = "api_sig";
/// Represents `auth_token`.
pub const FLICKR_AUTH_TOKEN_KEY: &str = "auth_token";
/// Represents `method`.
pub const FLICKR_METHOD_KEY: &str = "method";
/// Represents `oauth_consumer_key`.
pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_signature`.
pub const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
/// Represents `oauth_signature_method`.
pub const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
