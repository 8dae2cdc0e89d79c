use std::{fmt, sync::Arc};

use md5::{Digest, Md5};
use time::OffsetDateTime;

use crate::{
    ParameterSet, SecretsProvider, SignError, SignResult, FLICKR_API_KEY_KEY, FLICKR_API_SIG_KEY,
    FLICKR_AUTH_TOKEN_KEY, FLICKR_METHOD_KEY, OAUTH_CONSUMER_KEY, OAUTH_NONCE_KEY,
    OAUTH_SIGNATURE_KEY, OAUTH_SIGNATURE_METHOD_KEY, OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY,
    OAUTH_VERSION_KEY,
};

const OAUTH_VERSION: &str = "1.0";
const PLAINTEXT_METHOD: &str = "PLAINTEXT";

/// Computes a Flickr `api_sig`.
///
/// The digest input is the consumer secret followed by every `key` and
/// `value` of `params`, keys sorted byte-wise, with no separators. The result
/// is the lowercase hex MD5 of that input, so insertion order never matters.
pub fn flickr_signature(consumer_secret: &str, params: &ParameterSet) -> String {
    let mut hasher = Md5::new();
    hasher.update(consumer_secret.as_bytes());
    for (key, value) in params.sorted() {
        hasher.update(key.as_bytes());
        hasher.update(value.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Computes an OAuth 1.0 PLAINTEXT `oauth_signature`.
///
/// Depends on the secrets only, never on the request parameters.
pub fn plaintext_signature(consumer_secret: &str, token_secret: Option<&str>) -> String {
    format!("{}&{}", consumer_secret, token_secret.unwrap_or_default())
}

/// Authentication scheme bound to a proxy at construction.
#[derive(Debug, Clone, Default)]
pub enum Signer {
    /// Leaves the parameters untouched.
    #[default]
    None,
    /// Flickr MD5 signed queries. The function is sent as the `method`
    /// parameter rather than as part of the URL.
    Flickr,
    /// OAuth 1.0 with the PLAINTEXT signature method.
    OAuthPlaintext(OAuthParameters),
}

impl Signer {
    /// OAuth PLAINTEXT signer with a fresh nonce and timestamp per call.
    pub fn oauth_plaintext() -> Self {
        Signer::OAuthPlaintext(OAuthParameters::new())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Signer::None => "none",
            Signer::Flickr => "flickr",
            Signer::OAuthPlaintext(_) => "oauth-plaintext",
        }
    }

    /// Whether the call function travels as a parameter instead of a path
    /// segment appended to the base url.
    pub(crate) fn carries_function(&self) -> bool {
        matches!(self, Signer::Flickr)
    }

    /// Inserts the authentication parameters into `params`, overwriting any
    /// existing values for the same keys.
    pub fn sign<S>(
        &self,
        secrets: Option<&S>,
        function: Option<&str>,
        params: &mut ParameterSet,
    ) -> SignResult<()>
    where
        S: SecretsProvider + ?Sized,
    {
        match self {
            Signer::None => Ok(()),
            Signer::Flickr => {
                let secrets = secrets.ok_or(SignError::MissingCredentials(self.name()))?;
                let method = function
                    .filter(|f| !f.is_empty())
                    .ok_or(SignError::MissingMethod)?;
                sign_flickr(secrets, method, params);
                Ok(())
            }
            Signer::OAuthPlaintext(options) => {
                let secrets = secrets.ok_or(SignError::MissingCredentials(self.name()))?;
                sign_plaintext(secrets, options, params);
                Ok(())
            }
        }
    }
}

fn sign_flickr<S>(secrets: &S, method: &str, params: &mut ParameterSet)
where
    S: SecretsProvider + ?Sized,
{
    let (consumer_key, consumer_secret) = secrets.get_consumer_key_pair();
    let (token, _) = secrets.get_token_option_pair();

    params.add(FLICKR_METHOD_KEY, method);
    params.add(FLICKR_API_KEY_KEY, consumer_key);
    if let Some(token) = token {
        params.add(FLICKR_AUTH_TOKEN_KEY, token);
    }
    // a leftover signature must not become part of its own digest
    params.remove(FLICKR_API_SIG_KEY);

    let signature = flickr_signature(consumer_secret, params);
    params.add(FLICKR_API_SIG_KEY, signature);
}

fn sign_plaintext<S>(secrets: &S, options: &OAuthParameters, params: &mut ParameterSet)
where
    S: SecretsProvider + ?Sized,
{
    let (consumer_key, consumer_secret) = secrets.get_consumer_key_pair();
    let (token, token_secret) = secrets.get_token_option_pair();

    params.add(OAUTH_VERSION_KEY, OAUTH_VERSION);
    params.add(OAUTH_TIMESTAMP_KEY, options.timestamp_value().to_string());
    params.add(OAUTH_NONCE_KEY, options.nonce_value());
    params.add(OAUTH_CONSUMER_KEY, consumer_key);
    match token {
        Some(token) => params.add(OAUTH_TOKEN_KEY, token),
        None => {
            params.remove(OAUTH_TOKEN_KEY);
        }
    }
    params.add(OAUTH_SIGNATURE_METHOD_KEY, PLAINTEXT_METHOD);
    params.add(
        OAUTH_SIGNATURE_KEY,
        plaintext_signature(consumer_secret, token_secret),
    );
}

type NonceSource = Arc<dyn Fn() -> String + Send + Sync>;
type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Sources of the volatile OAuth parameters.
///
/// Both are consulted once per prepared call. Unset, the nonce is a random
/// `u32` and the clock the current Unix time in seconds.
#[derive(Clone, Default)]
pub struct OAuthParameters {
    nonce: Option<NonceSource>,
    clock: Option<Clock>,
}

impl OAuthParameters {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the generator of oauth_nonce values
    pub fn nonce_source<F>(self, source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        OAuthParameters {
            nonce: Some(Arc::new(source)),
            ..self
        }
    }

    /// set the clock oauth_timestamp values are read from, in Unix seconds
    pub fn clock<F>(self, clock: F) -> Self
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        OAuthParameters {
            clock: Some(Arc::new(clock)),
            ..self
        }
    }

    fn nonce_value(&self) -> String {
        match self.nonce {
            Some(ref source) => source(),
            None => rand::random::<u32>().to_string(),
        }
    }

    fn timestamp_value(&self) -> u64 {
        match self.clock {
            Some(ref clock) => clock(),
            None => u64::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for OAuthParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthParameters")
            .field("nonce", &self.nonce.as_ref().map(|_| "custom"))
            .field("clock", &self.clock.as_ref().map(|_| "custom"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Credentials;

    fn params(pairs: &[(&str, &str)]) -> ParameterSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn flickr_golden_vector() {
        // md5("Sa1b2")
        assert_eq!(
            flickr_signature("S", &params(&[("a", "1"), ("b", "2")])),
            "db2c9fbfacbf0a00ca0ef83ddd01e6ff"
        );
        // md5("S")
        assert_eq!(
            flickr_signature("S", &ParameterSet::new()),
            "5dbc98dcc983a70728bd082d1a47546e"
        );
    }

    #[test]
    fn flickr_ignores_insertion_order() {
        let forward = params(&[("a", "1"), ("b", "2"), ("c", "3"), ("perms", "read")]);
        let backward = params(&[("perms", "read"), ("c", "3"), ("b", "2"), ("a", "1")]);
        assert_eq!(
            flickr_signature("secret", &forward),
            flickr_signature("secret", &backward)
        );
    }

    #[test]
    fn flickr_is_sensitive_to_every_value() {
        assert_eq!(
            flickr_signature("S", &params(&[("a", "1"), ("b", "3")])),
            "b314073a3a6458ffadf791a2cc4272e1"
        );
        let base = flickr_signature("S", &params(&[("a", "1"), ("b", "2")]));
        assert_ne!(base, flickr_signature("S", &params(&[("a", "0"), ("b", "2")])));
        assert_ne!(base, flickr_signature("T", &params(&[("a", "1"), ("b", "2")])));
    }

    #[test]
    fn plaintext_formula() {
        assert_eq!(plaintext_signature("cs", Some("ts")), "cs&ts");
        assert_eq!(plaintext_signature("cs", None), "cs&");
    }

    #[test]
    fn plaintext_injects_documented_parameters() {
        let creds = Credentials::new("ck", "cs").unwrap().token("tk", "ts");
        let signer = Signer::OAuthPlaintext(
            OAuthParameters::new()
                .nonce_source(|| "42".to_string())
                .clock(|| 1_000),
        );
        let mut p = params(&[("q", "cats")]);

        signer.sign(Some(&creds), Some("search"), &mut p).unwrap();

        let expected = params(&[
            ("q", "cats"),
            ("oauth_version", "1.0"),
            ("oauth_timestamp", "1000"),
            ("oauth_nonce", "42"),
            ("oauth_consumer_key", "ck"),
            ("oauth_token", "tk"),
            ("oauth_signature_method", "PLAINTEXT"),
            ("oauth_signature", "cs&ts"),
        ]);
        assert_eq!(p, expected);
    }

    #[test]
    fn plaintext_omits_absent_token() {
        let creds = Credentials::new("ck", "cs").unwrap();
        let signer = Signer::OAuthPlaintext(
            OAuthParameters::new()
                .nonce_source(|| "7".to_string())
                .clock(|| 5),
        );
        let mut p = ParameterSet::new();

        signer.sign(Some(&creds), None, &mut p).unwrap();

        assert_eq!(p.len(), 6);
        assert!(!p.contains(OAUTH_TOKEN_KEY));
        assert_eq!(p.get(OAUTH_SIGNATURE_KEY), Some("cs&"));
    }

    #[test]
    fn nonce_source_is_consulted_per_call() {
        let counter = Arc::new(AtomicU32::new(0));
        let source = Arc::clone(&counter);
        let signer = Signer::OAuthPlaintext(
            OAuthParameters::new().nonce_source(move || {
                source.fetch_add(1, Ordering::SeqCst).to_string()
            }),
        );
        let creds = Credentials::new("ck", "cs").unwrap();

        let nonces: Vec<String> = (0..3)
            .map(|_| {
                let mut p = ParameterSet::new();
                signer.sign(Some(&creds), None, &mut p).unwrap();
                p.get(OAUTH_NONCE_KEY).unwrap().to_string()
            })
            .collect();

        assert_eq!(nonces, vec!["0", "1", "2"]);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn plaintext_generates_fresh_nonces() {
        let creds = Credentials::new("ck", "cs").unwrap();
        let signer = Signer::oauth_plaintext();
        let nonces: HashSet<String> = (0..64)
            .map(|_| {
                let mut p = ParameterSet::new();
                signer.sign(Some(&creds), None, &mut p).unwrap();
                assert!(p.get(OAUTH_TIMESTAMP_KEY).unwrap().parse::<u64>().unwrap() > 0);
                p.get(OAUTH_NONCE_KEY).unwrap().to_string()
            })
            .collect();
        assert!(nonces.len() > 60);
    }

    #[test]
    fn flickr_signs_over_final_parameters() {
        let creds = Credentials::new("key", "secret").unwrap().token("tok", "unused");
        let mut p = params(&[("photo_id", "1"), ("api_sig", "stale")]);

        Signer::Flickr
            .sign(Some(&creds), Some("flickr.photos.getInfo"), &mut p)
            .unwrap();

        assert_eq!(p.get("method"), Some("flickr.photos.getInfo"));
        assert_eq!(p.get("api_key"), Some("key"));
        assert_eq!(p.get("auth_token"), Some("tok"));

        let mut unsigned = p.clone();
        let sig = unsigned.remove("api_sig").unwrap();
        assert_eq!(sig, flickr_signature("secret", &unsigned));
        assert_eq!(unsigned.len(), 4);
    }

    #[test]
    fn flickr_requires_method_and_credentials() {
        let creds = Credentials::new("key", "secret").unwrap();
        let mut p = ParameterSet::new();
        assert_eq!(
            Signer::Flickr.sign(Some(&creds), None, &mut p),
            Err(SignError::MissingMethod)
        );
        assert_eq!(
            Signer::Flickr.sign(Some(&creds), Some(""), &mut p),
            Err(SignError::MissingMethod)
        );
        assert_eq!(
            Signer::Flickr.sign(None::<&Credentials>, Some("m"), &mut p),
            Err(SignError::MissingCredentials("flickr"))
        );
        assert_eq!(
            Signer::oauth_plaintext().sign(None::<&Credentials>, None, &mut p),
            Err(SignError::MissingCredentials("oauth-plaintext"))
        );
        assert!(p.is_empty());
    }

    #[test]
    fn none_signer_is_a_no_op() {
        let mut p = params(&[("a", "1")]);
        Signer::None
            .sign(None::<&Credentials>, Some("ping"), &mut p)
            .unwrap();
        assert_eq!(p, params(&[("a", "1")]));
    }
}
