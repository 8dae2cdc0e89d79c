use std::collections::HashMap;

use serde::Deserialize;

use crate::{CallResponse, Error, Result, TokenReaderError, TokenReaderResult, OAUTH_TOKEN_KEY};

const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

/// Represents response of token acquisition.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// OAuth Token
    pub oauth_token: String,
    /// OAuth Token Secret
    pub oauth_token_secret: String,
    /// Other contents
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

/// Add parse_oauth_token feature to a call response.
// this trait is sealed
pub trait TokenReader: private::Sealed {
    fn parse_oauth_token(&self) -> Result<TokenResponse>;
}

impl TokenReader for CallResponse {
    fn parse_oauth_token(&self) -> Result<TokenResponse> {
        Ok(read_oauth_token(self.payload())?)
    }
}

/// Add parse_oauth_token feature to the result of `Call::send`.
// this trait is also sealed
pub trait TokenReaderExt: private::SealedWrapper {
    fn parse_oauth_token(self) -> Result<TokenResponse>;
}

impl<E> TokenReaderExt for std::result::Result<&CallResponse, E>
where
    E: Into<Error>,
{
    fn parse_oauth_token(self) -> Result<TokenResponse> {
        match self {
            Ok(resp) => resp.parse_oauth_token(),
            Err(err) => Err(err.into()),
        }
    }
}

fn read_oauth_token(text: &str) -> TokenReaderResult<TokenResponse> {
    // form-decoded, so `%26`, `%2B` and `+` come back as `&`, `+` and ` `
    let mut destructured = serde_urlencoded::from_str::<HashMap<String, String>>(text)
        .map_err(|err| TokenReaderError::Malformed(err.to_string(), text.to_string()))?;
    let oauth_token = destructured.remove(OAUTH_TOKEN_KEY);
    let oauth_token_secret = destructured.remove(OAUTH_TOKEN_SECRET_KEY);
    match (oauth_token, oauth_token_secret) {
        (Some(t), Some(s)) => Ok(TokenResponse {
            oauth_token: t,
            oauth_token_secret: s,
            remain: destructured,
        }),
        (None, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_KEY,
            text.to_string(),
        )),
        (_, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_SECRET_KEY,
            text.to_string(),
        )),
    }
}

mod private {
    use crate::CallResponse;

    pub trait Sealed {}
    impl Sealed for CallResponse {}
    pub trait SealedWrapper {}
    impl<E> SealedWrapper for Result<&CallResponse, E> {}
}

#[cfg(test)]
mod test {
    use http::{HeaderMap, StatusCode};

    use super::*;

    fn ok(payload: &str) -> CallResponse {
        CallResponse::new(StatusCode::OK, HeaderMap::new(), payload.to_string())
    }

    #[test]
    fn parse_response_typical() {
        let resp_str_sample = "oauth_token=Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik&oauth_token_secret=Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM&oauth_callback_confirmed=true";
        for parsed in &[
            ok(resp_str_sample).parse_oauth_token().unwrap(),
            serde_urlencoded::from_str::<TokenResponse>(resp_str_sample).unwrap(),
        ] {
            assert_eq!(
                parsed.oauth_token,
                "Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik"
            );
            assert_eq!(
                parsed.oauth_token_secret,
                "Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM"
            );
            assert_eq!(parsed.remain.len(), 1);
            assert_eq!(parsed.remain["oauth_callback_confirmed"], "true");
        }
    }

    #[test]
    fn parse_minimal() {
        let parsed = read_oauth_token("oauth_token&oauth_token_secret").unwrap();
        assert_eq!(parsed.oauth_token, "");
        assert_eq!(parsed.oauth_token_secret, "");
        assert_eq!(parsed.remain.len(), 0);
    }

    #[test]
    fn parse_token_secret_notfound() {
        let parsed = read_oauth_token("oauth_token=");
        match parsed {
            Err(TokenReaderError::TokenKeyNotFound(key, resp_str)) => {
                assert_eq!(key, OAUTH_TOKEN_SECRET_KEY);
                assert_eq!(resp_str, "oauth_token=");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parse_decodes_escaped_values() {
        let resp_str_sample = "oauth_token=a%2Fb%2Bc&oauth_token_secret=s%26t&note=hello+world";
        let parsed = ok(resp_str_sample).parse_oauth_token().unwrap();
        assert_eq!(parsed.oauth_token, "a/b+c");
        assert_eq!(parsed.oauth_token_secret, "s&t");
        assert_eq!(parsed.remain["note"], "hello world");
        assert_eq!(
            parsed,
            serde_urlencoded::from_str::<TokenResponse>(resp_str_sample).unwrap()
        );
    }

    #[test]
    fn parse_through_send_result() {
        let resp = ok("oauth_token=t&oauth_token_secret=s");
        let sent: Result<&CallResponse> = Ok(&resp);
        let parsed = sent.parse_oauth_token().unwrap();
        assert_eq!(parsed.oauth_token, "t");

        let failed: Result<&CallResponse> = Err(Error::InvalidArgument("frob"));
        assert!(matches!(
            failed.parse_oauth_token(),
            Err(Error::InvalidArgument("frob"))
        ));

        assert!(matches!(
            ok("oops").parse_oauth_token(),
            Err(Error::TokenReader(_))
        ));
    }
}
