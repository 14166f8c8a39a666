//! Sector number allocation.
//!
//! Two strategies, fixed at startup by [`SealingConfig`]:
//!
//! - [`LocalAllocator`] asks the node's persistent [`SectorCounter`].
//! - [`RemoteAllocator`] asks a shared HTTP service, so several miner
//!   processes running under one miner identity never pick the same number.
//!
//! Neither retries. A failed allocation consumes nothing.

use std::{sync::Arc, time::Duration};

use reqwest::StatusCode;
use tessera_api::SectorCounter;
use tessera_primitives::SectorNumber;
use tessera_tasks::TaskExecutor;
use tracing::{debug, info};

use crate::{AllocationError, AllocationStrategy, RemoteEndpoint, SealingConfig};

/// Decode the body returned by the remote allocation service.
///
/// All `"` and `\n` characters are stripped, and what remains must be an
/// unsigned 64-bit decimal number: ASCII digits only, no sign and no other
/// whitespace.
pub fn decode_sector_number(body: &str) -> Result<SectorNumber, AllocationError> {
    let stripped: String = body.chars().filter(|c| !matches!(c, '"' | '\n')).collect();

    let malformed = || AllocationError::Malformed {
        body: body.to_string(),
    };

    if stripped.is_empty() || !stripped.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    stripped.parse::<u64>().map(SectorNumber).map_err(|_| malformed())
}

/// Allocates from the local persistent counter.
#[derive(Clone)]
pub struct LocalAllocator {
    counter: Arc<dyn SectorCounter>,
    executor: TaskExecutor,
}

impl std::fmt::Debug for LocalAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAllocator").finish_non_exhaustive()
    }
}

impl LocalAllocator {
    /// Create an allocator over the given counter.
    ///
    /// Counter calls run on `executor`'s blocking pool.
    pub fn new(counter: Arc<dyn SectorCounter>, executor: TaskExecutor) -> Self {
        Self { counter, executor }
    }

    /// Issue the next number.
    pub async fn next(&self) -> Result<SectorNumber, AllocationError> {
        let counter = Arc::clone(&self.counter);
        let number = self
            .executor
            .spawn_blocking(move || counter.next())
            .await
            .map_err(|e| AllocationError::Join(e.to_string()))??;
        debug!(%number, "Allocated sector number from local counter");
        Ok(number)
    }
}

/// Allocates from a remote service via `GET <endpoint>/snake/nextid`.
#[derive(Debug, Clone)]
pub struct RemoteAllocator {
    client: reqwest::Client,
    url: String,
}

impl RemoteAllocator {
    /// Create an allocator for the given endpoint with a request timeout.
    pub fn new(endpoint: &RemoteEndpoint, timeout: Duration) -> Result<Self, AllocationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AllocationError::Client)?;
        Ok(Self {
            client,
            url: endpoint.next_id_url(),
        })
    }

    /// URL queried for each allocation.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one request for the next number.
    pub async fn next(&self) -> Result<SectorNumber, AllocationError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| AllocationError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AllocationError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(AllocationError::Body)?;
        let number = decode_sector_number(&body)?;
        info!(%number, url = %self.url, "Allocated sector number from server");
        Ok(number)
    }
}

/// The configured sector number source.
#[derive(Debug, Clone)]
pub enum SectorIdAllocator {
    /// Node-local counter.
    Local(LocalAllocator),
    /// Shared remote service.
    Remote(RemoteAllocator),
}

impl SectorIdAllocator {
    /// Build the allocator selected by `config`.
    ///
    /// `counter` and `executor` are only used by the local strategy.
    pub fn from_config(
        config: &SealingConfig,
        counter: Arc<dyn SectorCounter>,
        executor: TaskExecutor,
    ) -> Result<Self, AllocationError> {
        Ok(match &config.strategy {
            AllocationStrategy::Local => Self::Local(LocalAllocator::new(counter, executor)),
            AllocationStrategy::Remote(endpoint) => {
                Self::Remote(RemoteAllocator::new(endpoint, config.remote_timeout)?)
            }
        })
    }

    /// Issue the next sector number.
    pub async fn next(&self) -> Result<SectorNumber, AllocationError> {
        match self {
            Self::Local(local) => local.next().await,
            Self::Remote(remote) => remote.next().await,
        }
    }

    /// Short name of the strategy, for logs.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Remote(_) => "remote",
        }
    }
}
