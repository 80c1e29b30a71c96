//! Shared "wait for the command queue to empty" helper used by every
//! procedure after it finishes enqueueing.

use std::time::Duration;

use picboot_core::BootloaderInterface;
use tracing::info;

/// Polls `bli.busy()` on `poll_interval` cadence, logging the remaining
/// transaction count, until the queue drains.
pub async fn await_drain(bli: &BootloaderInterface, poll_interval: Duration) {
    while bli.busy() {
        info!(remaining = bli.transactions_remaining(), "awaiting queue drain");
        tokio::time::sleep(poll_interval).await;
    }
}
