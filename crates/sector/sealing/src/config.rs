//! Sealing configuration.

use std::time::Duration;

use tessera_primitives::MinerId;

use crate::SealingError;

/// Path of the sector number endpoint on the allocation service.
const NEXT_ID_PATH: &str = "/snake/nextid";

/// Base URL of a remote sector number service.
///
/// Accepts either a full URL or a bare `host:port`, which is treated as
/// plain HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    base: String,
}

impl RemoteEndpoint {
    /// Parse and normalise a server address.
    pub fn parse(address: &str) -> Result<Self, SealingError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(SealingError::Config("empty server address".to_string()));
        }

        let with_scheme = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };

        let url = reqwest::Url::parse(&with_scheme).map_err(|e| {
            SealingError::Config(format!("invalid server address {address:?}: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SealingError::Config(format!(
                "unsupported scheme {:?} in server address",
                url.scheme()
            )));
        }

        Ok(Self {
            base: with_scheme.trim_end_matches('/').to_string(),
        })
    }

    /// Normalised base URL, without trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Full URL of the next-id endpoint.
    pub fn next_id_url(&self) -> String {
        format!("{}{NEXT_ID_PATH}", self.base)
    }
}

/// Where sector numbers come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationStrategy {
    /// The node's persistent counter.
    Local,
    /// A shared allocation service, for several miner processes running
    /// under one miner identity.
    Remote(RemoteEndpoint),
}

/// Immutable sealing configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct SealingConfig {
    /// Miner that owns pledged sectors.
    pub miner: MinerId,
    /// Sector number source.
    pub strategy: AllocationStrategy,
    /// Ceiling on concurrently sealing sectors; 0 is unlimited.
    pub max_sealing_sectors: u64,
    /// Bound on a single remote allocation request.
    pub remote_timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_bare_address_gets_http() {
        let ep = RemoteEndpoint::parse("10.0.0.5:7777").unwrap();
        assert_eq!(ep.next_id_url(), "http://10.0.0.5:7777/snake/nextid");
    }

    #[test]
    fn test_full_url_kept() {
        let ep = RemoteEndpoint::parse("https://alloc.example.com/").unwrap();
        assert_eq!(ep.base(), "https://alloc.example.com");
        assert_eq!(
            ep.next_id_url(),
            "https://alloc.example.com/snake/nextid"
        );
    }

    #[test]
    fn test_empty_rejected() {
        assert_matches!(RemoteEndpoint::parse("  "), Err(SealingError::Config(_)));
    }

    #[test]
    fn test_bad_scheme_rejected() {
        assert_matches!(
            RemoteEndpoint::parse("ftp://host:21"),
            Err(SealingError::Config(_))
        );
    }
}
