//! Shared HTTP client for network probes.

use std::time::Duration;

/// Per-request deadline on probe HTTP calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the client shared by all HTTP probes.
///
/// `allow_invalid_certs` accepts self-signed certificates; Portainer
/// and UniFi installations commonly present them.
pub fn build(allow_invalid_certs: bool) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .danger_accept_invalid_certs(allow_invalid_certs)
        .build()?;
    Ok(client)
}
