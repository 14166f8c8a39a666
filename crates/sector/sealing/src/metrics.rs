//! Pledge metrics.

use metrics::Counter;

use crate::PledgeStage;

/// Counters for pledge requests and their outcomes.
#[derive(Clone, Debug)]
pub(crate) struct PledgeMetrics {
    /// Pledges admitted and spawned.
    pub(crate) accepted: Counter,
    /// Pledges refused by admission control.
    pub(crate) denied: Counter,
    /// Pledges registered with the sealing pipeline.
    pub(crate) completed: Counter,
}

impl Default for PledgeMetrics {
    fn default() -> Self {
        Self {
            accepted: metrics::counter!("sealing.pledge.accepted_total"),
            denied: metrics::counter!("sealing.pledge.denied_total"),
            completed: metrics::counter!("sealing.pledge.completed_total"),
        }
    }
}

impl PledgeMetrics {
    /// Record a background failure at `stage`.
    pub(crate) fn failed(&self, stage: PledgeStage) {
        let stage: &'static str = stage.into();
        metrics::counter!("sealing.pledge.failed_total", "stage" => stage).increment(1);
    }
}
