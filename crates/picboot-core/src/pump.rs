//! The background task that drains the command queue and ingests
//! responses.

use std::sync::{
    Arc, Mutex,
    atomic::AtomicBool,
};

use picboot_wire::{EncodeError, Framer, Transport};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::{
    error::BliError, memory::LocalMemoryMap, profile::DeviceProfile, queue::TxQueue, response,
};

/// Everything the pump needs a handle to. Constructed once by
/// [`crate::BootloaderInterface::spawn`] and moved into the spawned task.
pub struct PumpContext<T: Transport> {
    pub framer: Framer<T>,
    pub queue: TxQueue,
    pub profile: Arc<Mutex<DeviceProfile>>,
    pub memory: Arc<Mutex<Option<LocalMemoryMap>>>,
    pub identified: Arc<AtomicBool>,
    pub last_error: Arc<Mutex<Option<BliError>>>,
    pub cancel: CancellationToken,
    pub tick: std::time::Duration,
}

/// Runs the pump until `cancel` fires or the transport fails fatally.
///
/// Matches the pump loop described for this protocol: pop one command,
/// send it, sleep its settle time, poll for responses, sleep the tick
/// interval, repeat.
pub async fn run<T: Transport>(mut ctx: PumpContext<T>) {
    loop {
        if ctx.cancel.is_cancelled() {
            return;
        }

        if let Some(item) = ctx.queue.pop() {
            match ctx.framer.encode_and_send(&item.payload) {
                Ok(()) => {
                    tokio::time::sleep(item.settle).await;
                }
                Err(EncodeError::Frame(e)) => {
                    warn!(error = %e, "dropping malformed outbound payload");
                }
                Err(EncodeError::Transport(e)) => {
                    error!(error = %e, "transport write failed, stopping pump");
                    record_fatal(&ctx, e.into());
                    return;
                }
            }
        }

        if let Err(e) = ctx.framer.poll() {
            error!(error = %e, "transport read failed, stopping pump");
            record_fatal(&ctx, e.into());
            return;
        }

        while let Some(payload) = ctx.framer.try_receive() {
            response::dispatch(&payload, &ctx.profile, &ctx.memory, &ctx.identified);
        }

        tokio::time::sleep(ctx.tick).await;
    }
}

fn record_fatal<T: Transport>(ctx: &PumpContext<T>, err: BliError) {
    let mut guard = ctx.last_error.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    *guard = Some(err);
}
