//! Sealing CLI arguments.

use std::time::Duration;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tessera_primitives::MinerId;

use crate::{AllocationStrategy, RemoteEndpoint, SealingConfig, SealingError};

/// Default miner actor ID (first miner on a devnet).
const DEFAULT_MINER_ID: u64 = 1000;

/// Default remote allocation timeout in seconds.
const DEFAULT_ALLOCATOR_TIMEOUT_SECS: u64 = 30;

/// Sector number source selectable on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocatorKind {
    /// Persistent local counter.
    #[default]
    Local,
    /// Remote allocation service (requires a server address).
    Remote,
}

/// Sector number allocation arguments.
///
/// Everything a one-off allocation needs, without the pipeline ceiling.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Sealing")]
#[serde(default)]
pub struct AllocatorArgs {
    /// Miner actor ID that owns pledged sectors.
    #[arg(long = "sealing.miner", value_name = "ID", default_value_t = DEFAULT_MINER_ID)]
    pub miner: u64,

    /// Where sector numbers come from.
    #[arg(long = "sealing.allocator", value_enum, default_value_t = AllocatorKind::Local)]
    pub allocator: AllocatorKind,

    /// Address of the remote sector number service (`host:port` or URL).
    #[arg(long = "sealing.server-address", value_name = "ADDR")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_address: Option<String>,

    /// Timeout for a remote allocation request, in seconds.
    #[arg(
        long = "sealing.allocator-timeout",
        value_name = "SECS",
        default_value_t = DEFAULT_ALLOCATOR_TIMEOUT_SECS
    )]
    pub allocator_timeout_secs: u64,
}

impl Default for AllocatorArgs {
    fn default() -> Self {
        Self {
            miner: DEFAULT_MINER_ID,
            allocator: AllocatorKind::Local,
            server_address: None,
            allocator_timeout_secs: DEFAULT_ALLOCATOR_TIMEOUT_SECS,
        }
    }
}

/// Sealing configuration arguments.
///
/// Flatten this into commands that run a [`PledgeWorkflow`](crate::PledgeWorkflow);
/// commands that only allocate numbers take [`AllocatorArgs`].
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Sealing")]
#[serde(default)]
pub struct SealingArgs {
    /// Sector number allocation.
    #[command(flatten)]
    #[serde(flatten)]
    pub allocation: AllocatorArgs,

    /// Maximum number of sectors sealing at once (0 = unlimited).
    #[arg(long = "sealing.max-sealing", value_name = "COUNT", default_value_t = 0)]
    pub max_sealing_sectors: u64,
}

impl SealingArgs {
    /// Validate the arguments into a [`SealingConfig`].
    pub fn to_config(&self) -> Result<SealingConfig, SealingError> {
        let alloc = &self.allocation;
        let strategy = match alloc.allocator {
            AllocatorKind::Local => AllocationStrategy::Local,
            AllocatorKind::Remote => {
                let address = alloc.server_address.as_deref().ok_or_else(|| {
                    SealingError::Config(
                        "remote allocator requires --sealing.server-address".to_string(),
                    )
                })?;
                AllocationStrategy::Remote(RemoteEndpoint::parse(address)?)
            }
        };

        if alloc.allocator_timeout_secs == 0 {
            return Err(SealingError::Config(
                "allocator timeout must be at least one second".to_string(),
            ));
        }

        Ok(SealingConfig {
            miner: MinerId(alloc.miner),
            strategy,
            max_sealing_sectors: self.max_sealing_sectors,
            remote_timeout: Duration::from_secs(alloc.allocator_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_is_local_unlimited() {
        let config = SealingArgs::default().to_config().unwrap();
        assert_eq!(config.strategy, AllocationStrategy::Local);
        assert_eq!(config.max_sealing_sectors, 0);
        assert_eq!(config.miner, MinerId(1000));
        assert_eq!(config.remote_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_remote_requires_address() {
        let args = SealingArgs {
            allocation: AllocatorArgs {
                allocator: AllocatorKind::Remote,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_matches!(args.to_config(), Err(SealingError::Config(_)));
    }

    #[test]
    fn test_remote_with_address() {
        let args = SealingArgs {
            allocation: AllocatorArgs {
                allocator: AllocatorKind::Remote,
                server_address: Some("127.0.0.1:9000".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = args.to_config().unwrap();
        assert_matches!(config.strategy, AllocationStrategy::Remote(ep) => {
            assert_eq!(ep.next_id_url(), "http://127.0.0.1:9000/snake/nextid");
        });
    }

    #[test]
    fn test_local_ignores_address() {
        let args = SealingArgs {
            allocation: AllocatorArgs {
                server_address: Some("127.0.0.1:9000".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(args.to_config().unwrap().strategy, AllocationStrategy::Local);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args = SealingArgs {
            allocation: AllocatorArgs {
                allocator_timeout_secs: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_matches!(args.to_config(), Err(SealingError::Config(_)));
    }

    #[test]
    fn test_toml_keys_stay_flat() {
        let args: SealingArgs = toml::from_str(
            r#"
allocator = "remote"
server_address = "10.0.0.1:7777"
max_sealing_sectors = 4
"#,
        )
        .unwrap();
        assert_eq!(args.allocation.allocator, AllocatorKind::Remote);
        assert_eq!(args.allocation.allocator_timeout_secs, 30);
        assert_eq!(args.max_sealing_sectors, 4);

        let encoded = toml::to_string(&args).unwrap();
        assert!(encoded.contains("allocator_timeout_secs = 30"));
        assert!(!encoded.contains("allocation"));
    }
}
