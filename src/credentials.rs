use std::fmt;

use crate::{Error, Result};

pub trait SecretsProvider {
    fn get_consumer_key_pair(&self) -> (&str, &str);

    fn get_token_option_pair(&self) -> (Option<&str>, Option<&str>);
}

/// Consumer key pair plus the current token, owned by a single proxy.
///
/// The consumer key and secret are fixed at construction. The token and
/// token secret may be replaced later, e.g. after a login exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    consumer_key: String,
    consumer_secret: String,
    token: Option<String>,
    token_secret: Option<String>,
}

impl Credentials {
    /// Fails with [`Error::Configuration`] if the key or the secret is empty.
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Result<Self>
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        let consumer_key = consumer_key.into();
        let consumer_secret = consumer_secret.into();
        if consumer_key.is_empty() {
            return Err(Error::Configuration("consumer key is empty".into()));
        }
        if consumer_secret.is_empty() {
            return Err(Error::Configuration("consumer secret is empty".into()));
        }
        Ok(Credentials {
            consumer_key,
            consumer_secret,
            token: None,
            token_secret: None,
        })
    }

    pub fn token<TToken, TSecret>(self, token: TToken, token_secret: TSecret) -> Self
    where
        TToken: Into<String>,
        TSecret: Into<String>,
    {
        Credentials {
            token: Some(token.into()),
            token_secret: Some(token_secret.into()),
            ..self
        }
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn get_token_secret(&self) -> Option<&str> {
        self.token_secret.as_deref()
    }

    pub fn set_token<T: Into<String>>(&mut self, token: Option<T>) {
        self.token = token.map(Into::into);
    }

    pub fn set_token_secret<T: Into<String>>(&mut self, token_secret: Option<T>) {
        self.token_secret = token_secret.map(Into::into);
    }
}

impl SecretsProvider for Credentials {
    fn get_consumer_key_pair(&self) -> (&str, &str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn get_token_option_pair(&self) -> (Option<&str>, Option<&str>) {
        (self.token.as_deref(), self.token_secret.as_deref())
    }
}

// secrets stay out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static CONSUMER_KEY: &str = "<CONSUMER_KEY>";
    static CONSUMER_SECRET: &str = "<CONSUMER_SECRET>";
    static TOKEN: &str = "<ACCESS_TOKEN>";
    static TOKEN_SECRET: &str = "<TOKEN_SECRET>";

    #[test]
    fn rejects_empty_consumer_pair() {
        assert!(matches!(
            Credentials::new("", CONSUMER_SECRET),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            Credentials::new(CONSUMER_KEY, ""),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn token_builder_and_setters() {
        let mut creds = Credentials::new(CONSUMER_KEY, CONSUMER_SECRET).unwrap();
        assert_eq!(creds.get_token_option_pair(), (None, None));

        creds = creds.token(TOKEN, TOKEN_SECRET);
        assert_eq!(
            creds.get_token_option_pair(),
            (Some(TOKEN), Some(TOKEN_SECRET))
        );

        creds.set_token(Some("rotated"));
        assert_eq!(creds.get_token(), Some("rotated"));
        assert_eq!(
            creds.get_consumer_key_pair(),
            (CONSUMER_KEY, CONSUMER_SECRET)
        );

        creds.set_token(None::<String>);
        assert_eq!(creds.get_token(), None);
    }

    #[test]
    fn debug_hides_secrets() {
        let creds = Credentials::new(CONSUMER_KEY, CONSUMER_SECRET)
            .unwrap()
            .token(TOKEN, TOKEN_SECRET);
        let printed = format!("{:?}", creds);
        assert!(printed.contains(CONSUMER_KEY));
        assert!(!printed.contains(CONSUMER_SECRET));
        assert!(!printed.contains(TOKEN_SECRET));
    }
}
