//! Exchange a one-time SimpleFIN setup token for an access URL.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header::CONTENT_LENGTH, Client, Url};
use secrecy::SecretString;
use tracing::info;

use crate::config::SimpleFinConfig;
use crate::error::{Error, Result};

/// HTTP client for the claim request, bounded by the configured timeout.
pub fn claim_client(config: &SimpleFinConfig) -> Result<Client> {
    Ok(Client::builder().timeout(config.timeout).build()?)
}

/// Decode a setup token into the claim URL it wraps.
pub fn decode_setup_token(setup_token: &str) -> Result<Url> {
    let bytes = STANDARD
        .decode(setup_token.trim())
        .map_err(|e| Error::InvalidSetupToken(e.to_string()))?;
    let claim_url = String::from_utf8(bytes)
        .map_err(|_| Error::InvalidSetupToken("token is not UTF-8".to_string()))?;
    Url::parse(claim_url.trim()).map_err(|e| Error::InvalidSetupToken(e.to_string()))
}

/// Claim the access URL behind a setup token.
///
/// Tokens are single use: the bridge answers 403 once a token has been
/// claimed, which surfaces as [`Error::Http`].
pub async fn claim_access_url(client: &Client, setup_token: &str) -> Result<SecretString> {
    let claim_url = decode_setup_token(setup_token)?;
    info!(host = claim_url.host_str().unwrap_or_default(), "Claiming SimpleFIN access URL");

    let response = client
        .post(claim_url)
        .header(CONTENT_LENGTH, 0)
        .send()
        .await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            body,
        });
    }

    let access_url = body.trim();
    Url::parse(access_url).map_err(|e| Error::Config(format!("Claimed access URL is invalid: {e}")))?;
    Ok(SecretString::from(access_url.to_string()))
}
