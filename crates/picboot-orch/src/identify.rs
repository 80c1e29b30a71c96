//! `identify`: repeatedly queries the device until identification
//! completes or a timeout elapses.

use std::time::Duration;

use picboot_core::{BootloaderInterface, IdentifiedProfile};
use tracing::{info, warn};

use crate::error::OrchestratorError;

/// Re-sends the identification queries on `poll_interval` cadence until
/// `bli.device_identified()` or `timeout` elapses. On timeout, shuts down
/// `bli` (without starting the application) and returns
/// [`OrchestratorError::IdentificationTimeout`].
///
/// # Errors
///
/// Returns [`OrchestratorError::IdentificationTimeout`] if the device never
/// identifies within `timeout`.
pub async fn identify(
    bli: &BootloaderInterface,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<IdentifiedProfile, OrchestratorError> {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if bli.device_identified() {
            let profile =
                bli.profile().expect("device_identified implies the profile is complete");
            info!(platform = %profile.platform, version = %profile.version, "device identified");
            return Ok(profile);
        }

        if tokio::time::Instant::now() >= deadline {
            warn!("identification timed out, shutting down session");
            let _ = bli.shutdown(false).await;
            return Err(OrchestratorError::IdentificationTimeout);
        }

        bli.query_device();
        tokio::time::sleep(poll_interval).await;
    }
}
