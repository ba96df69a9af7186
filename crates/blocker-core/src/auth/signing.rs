//! ============================================================================
//! OAuth 1.0a Request Signing (HMAC-SHA1)
//! ============================================================================
//! Builds the `Authorization: OAuth ...` header for a request. Query
//! parameters on the URL are folded into the signature base string.
//! ============================================================================

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;
use url::Url;

use crate::error::ApiError;
use crate::types::ConsumerKeys;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay literal, everything else is encoded
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(crate) fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Per-request values that are normally random / time based
#[derive(Debug, Clone)]
struct Nonce {
    nonce: String,
    timestamp: i64,
}

impl Nonce {
    fn generate() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Self {
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Signs requests for one consumer and an optional token
pub struct Signer<'a> {
    consumer: &'a ConsumerKeys,
    /// (token, token secret)
    token: Option<(&'a str, &'a str)>,
}

impl<'a> Signer<'a> {
    pub fn new(consumer: &'a ConsumerKeys, token: Option<(&'a str, &'a str)>) -> Self {
        Self { consumer, token }
    }

    /// Authorization header with a fresh nonce and timestamp.
    /// `extra` carries protocol parameters such as `oauth_callback`.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &Url,
        extra: &[(&str, &str)],
    ) -> Result<String, ApiError> {
        self.authorization_header_with(method, url, extra, &Nonce::generate())
    }

    fn authorization_header_with(
        &self,
        method: &str,
        url: &Url,
        extra: &[(&str, &str)],
        nonce: &Nonce,
    ) -> Result<String, ApiError> {
        let timestamp = nonce.timestamp.to_string();

        let mut oauth: Vec<(String, String)> = vec![
            ("oauth_consumer_key".into(), self.consumer.key.clone()),
            ("oauth_nonce".into(), nonce.nonce.clone()),
            ("oauth_signature_method".into(), "HMAC-SHA1".into()),
            ("oauth_timestamp".into(), timestamp),
            ("oauth_version".into(), "1.0".into()),
        ];
        if let Some((token, _)) = self.token {
            oauth.push(("oauth_token".into(), token.to_string()));
        }
        oauth.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let mut all: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        all.extend(oauth.iter().cloned());

        let base = signature_base(method, url, &all);
        let token_secret = self.token.map(|(_, secret)| secret).unwrap_or("");
        let signature = sign(&base, &self.consumer.secret, token_secret)?;

        oauth.push(("oauth_signature".into(), signature));
        oauth.sort();

        let fields: Vec<String> = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }
}

fn signature_base(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let mut bare = url.clone();
    bare.set_query(None);
    bare.set_fragment(None);

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(bare.as_str()),
        encode(&param_string)
    )
}

fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> Result<String, ApiError> {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| ApiError::Decode(format!("invalid signing key: {}", e)))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
