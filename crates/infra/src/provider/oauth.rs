//! OAuth 1.0a request signing (HMAC-SHA1).

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha1::Sha1;

use lastff_core::{Credentials, ProviderError};

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters pass through; everything else is encoded.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(crate) fn encode(s: &str) -> String {
    utf8_percent_encode(s, UNRESERVED).to_string()
}

/// Application-level consumer key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct ConsumerKeys {
    pub key: String,
    pub secret: String,
}

impl core::fmt::Debug for ConsumerKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConsumerKeys")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Per-request values that must be unique (nonce) or current (timestamp).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl Nonce {
    pub fn fresh() -> Self {
        let nonce = rand::rng()
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

/// Build the `Authorization` header value for a request.
///
/// `params` are the query (or form) parameters of the request; they take part in the
/// signature but are not repeated in the header.
pub fn authorization_header(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer: &ConsumerKeys,
    token: &str,
    token_secret: &str,
    nonce: &Nonce,
) -> Result<String, ProviderError> {
    let timestamp = nonce.timestamp.to_string();
    let mut oauth = vec![
        ("oauth_consumer_key", consumer.key.as_str()),
        ("oauth_nonce", nonce.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", token),
        ("oauth_version", "1.0"),
    ];

    let mut all: Vec<(String, String)> = params
        .iter()
        .chain(oauth.iter())
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    all.sort();
    let param_string = all
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let key = format!("{}&{}", encode(&consumer.secret), encode(token_secret));

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| ProviderError::Signing(e.to_string()))?;
    mac.update(base.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    oauth.push(("oauth_signature", signature.as_str()));
    oauth.sort();
    let header = oauth
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {header}"))
}

/// Sign a request on behalf of the account owning `credentials`.
pub fn sign_for(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer: &ConsumerKeys,
    credentials: &Credentials,
) -> Result<String, ProviderError> {
    authorization_header(
        method,
        url,
        params,
        consumer,
        &credentials.access_token,
        &credentials.access_token_secret,
        &Nonce::fresh(),
    )
}
