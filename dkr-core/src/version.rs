//! Agent runtime version lookup.
//!
//! One GET against the release endpoint, bounded by the only network
//! timeout in dkr. Builds must never hard-fail because the endpoint is
//! unreachable, so every error path degrades to the `latest` sentinel.

use std::time::Duration;
use tracing::{debug, warn};

/// Release metadata endpoint for the claude-code distribution.
pub const RELEASES_URL: &str = "https://storage.googleapis.com/claude-code-dist-86c565f3-f756-42ad-8dfa-d59b1c096819/claude-code-releases/latest";

/// Sentinel version used whenever the endpoint cannot be reached.
pub const LATEST: &str = "latest";

/// Timeout bounding the version lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Latest published agent version from `url`, or [`LATEST`] on any failure.
pub fn latest_agent_version(url: &str, timeout: Duration) -> String {
    let fetch = || -> reqwest::Result<String> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        let body = client.get(url).send()?.error_for_status()?.text()?;
        Ok(body.trim().to_string())
    };
    match fetch() {
        Ok(version) if !version.is_empty() => {
            debug!(version = %version, "resolved agent version");
            version
        }
        Ok(_) => LATEST.to_string(),
        Err(err) => {
            warn!(%err, "version lookup failed, falling back");
            LATEST.to_string()
        }
    }
}

/// Version lookup against the default endpoint.
pub fn resolve_agent_version() -> String {
    latest_agent_version(RELEASES_URL, LOOKUP_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_endpoint_falls_back_to_latest() {
        let version =
            latest_agent_version("http://127.0.0.1:9/latest", Duration::from_millis(250));
        assert_eq!(version, LATEST);
    }
}
