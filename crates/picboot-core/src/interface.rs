//! The single-client gateway between callers and the framed wire protocol.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use picboot_wire::{Framer, Opcode, Transport, le};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    error::BliError,
    memory::LocalMemoryMap,
    profile::{DeviceProfile, IdentifiedProfile, SettleConfig},
    pump::{self, PumpContext},
    queue::{QueueItem, TxQueue},
};

/// A command gateway for one bootloader session: owns the command queue,
/// the identification profile, the flash mirror, and the background pump
/// that drives the framer.
pub struct BootloaderInterface {
    queue: TxQueue,
    profile: Arc<Mutex<DeviceProfile>>,
    memory: Arc<Mutex<Option<LocalMemoryMap>>>,
    identified: Arc<AtomicBool>,
    last_error: Arc<Mutex<Option<BliError>>>,
    cancel: CancellationToken,
    settle: SettleConfig,
    pump_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl BootloaderInterface {
    /// Wraps `transport` in a [`Framer`], spawns the background pump, and
    /// enqueues the seven identification queries. Identification completes
    /// asynchronously as responses arrive.
    pub fn spawn<T>(transport: T, settle: SettleConfig) -> Self
    where
        T: Transport + Send + 'static,
    {
        let queue = TxQueue::new();
        let profile = Arc::new(Mutex::new(DeviceProfile::default()));
        let memory = Arc::new(Mutex::new(None));
        let identified = Arc::new(AtomicBool::new(false));
        let last_error = Arc::new(Mutex::new(None));
        let cancel = CancellationToken::new();

        let ctx = PumpContext {
            framer: Framer::new(transport),
            queue: queue.clone(),
            profile: Arc::clone(&profile),
            memory: Arc::clone(&memory),
            identified: Arc::clone(&identified),
            last_error: Arc::clone(&last_error),
            cancel: cancel.clone(),
            tick: Duration::from_millis(settle.tick_ms),
        };

        let handle = tokio::spawn(pump::run(ctx));

        let bli = Self {
            queue,
            profile,
            memory,
            identified,
            last_error,
            cancel,
            settle,
            pump_handle: Arc::new(Mutex::new(Some(handle))),
        };
        bli.query_device();
        bli
    }

    /// Enqueues the seven identification commands.
    pub fn query_device(&self) {
        for opcode in [
            Opcode::ReadPlatform,
            Opcode::ReadVersion,
            Opcode::ReadRowLen,
            Opcode::ReadPageLen,
            Opcode::ReadProgLen,
            Opcode::ReadMaxProgSize,
            Opcode::ReadAppStartAddress,
        ] {
            self.enqueue(vec![opcode.as_u8()], Duration::from_millis(self.settle.identify_cmd_ms));
        }
    }

    /// Enqueues `ERASE_PAGE` for `word_addr`. Only the low 16 bits of the
    /// address are emitted, matching the device protocol's asymmetric
    /// addressing for this one opcode.
    pub fn erase_page(&self, word_addr: u32) {
        let mut payload = vec![Opcode::ErasePage.as_u8()];
        #[allow(clippy::cast_possible_truncation)]
        le::push_u16(&mut payload, word_addr as u16);
        self.enqueue(payload, Duration::from_millis(self.settle.erase_ms));
    }

    /// Enqueues `READ_ADDR` for `word_addr & !1`.
    pub fn read(&self, word_addr: u32) {
        let mut payload = vec![Opcode::ReadAddr.as_u8()];
        le::push_u32(&mut payload, word_addr & !1);
        self.enqueue(payload, Duration::from_millis(self.settle.read_word_ms));
    }

    /// Enqueues `READ_PAGE` for `word_addr & !1`. The settle time scales
    /// with the device's `max_prog_size`; if identification has not
    /// completed yet the unscaled per-128-word figure is used as a
    /// conservative stand-in.
    pub fn read_page(&self, word_addr: u32) {
        let mut payload = vec![Opcode::ReadPage.as_u8()];
        le::push_u32(&mut payload, word_addr & !1);

        let settle = self
            .profile
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .max_prog_size
            .map_or_else(|| Duration::from_millis(self.settle.read_page_ms_per_128), |m| self.settle.read_page(m));

        self.enqueue(payload, settle);
    }

    /// Enqueues `WRITE_ROW` for `word_addr` with `data`.
    ///
    /// # Errors
    ///
    /// Returns [`BliError::ProfileIncomplete`] before identification, or
    /// [`BliError::ArgumentError`] if `data.len()` does not equal the
    /// device's `row_length`.
    pub fn write_row(&self, word_addr: u32, data: &[u32]) -> Result<(), BliError> {
        let row_length = self.require_field(|p| p.row_length)?;
        if data.len() != usize::from(row_length) {
            return Err(BliError::ArgumentError(format!(
                "write_row expected {row_length} words, got {}",
                data.len()
            )));
        }

        let mut payload = vec![Opcode::WriteRow.as_u8()];
        le::push_u32(&mut payload, word_addr);
        for &word in data {
            le::push_u32(&mut payload, word);
        }
        self.enqueue(payload, Duration::from_millis(self.settle.write_row_ms));
        Ok(())
    }

    /// Enqueues `WRITE_MAX` for `word_addr` with `data`, right-padded with
    /// the erased-flash sentinel up to `max_prog_size`.
    ///
    /// # Errors
    ///
    /// Returns [`BliError::ProfileIncomplete`] before identification, or
    /// [`BliError::ArgumentError`] if `data.len()` exceeds `max_prog_size`.
    pub fn write_max(&self, word_addr: u32, data: &[u32]) -> Result<(), BliError> {
        let max_prog_size = self.require_field(|p| p.max_prog_size)?;
        if data.len() > usize::from(max_prog_size) {
            return Err(BliError::ArgumentError(format!(
                "write_max expected at most {max_prog_size} words, got {}",
                data.len()
            )));
        }

        let mut payload = vec![Opcode::WriteMax.as_u8()];
        le::push_u32(&mut payload, word_addr);
        for &word in data {
            le::push_u32(&mut payload, word);
        }
        for _ in data.len()..usize::from(max_prog_size) {
            le::push_u32(&mut payload, crate::memory::UNREAD);
        }

        self.enqueue(payload, self.settle.write_max(data.len()));
        Ok(())
    }

    /// Reads the local mirror at `word_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`BliError::ProfileIncomplete`] if the mirror has not been
    /// allocated yet (identification incomplete), or
    /// [`BliError::ArgumentError`] if `word_addr` is outside the mirror.
    pub fn get_opcode(&self, word_addr: u32) -> Result<u32, BliError> {
        let guard = self.memory.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let map = guard.as_ref().ok_or(BliError::ProfileIncomplete)?;
        map.get(word_addr as usize).ok_or_else(|| {
            BliError::ArgumentError(format!("word address {word_addr:#x} is outside the mirror"))
        })
    }

    /// True if the command queue has pending entries.
    #[must_use]
    pub fn busy(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of commands still queued.
    #[must_use]
    pub fn transactions_remaining(&self) -> usize {
        self.queue.len()
    }

    /// True once every identification field has been populated.
    #[must_use]
    pub fn device_identified(&self) -> bool {
        self.identified.load(Ordering::SeqCst)
    }

    /// The fully-populated profile, if identification has completed.
    #[must_use]
    pub fn profile(&self) -> Option<IdentifiedProfile> {
        self.profile.lock().unwrap_or_else(std::sync::PoisonError::into_inner).to_identified()
    }

    /// The fatal error that stopped the pump, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<BliError> {
        self.last_error.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Optionally enqueues `START_APP`, waits for the queue to drain, then
    /// signals the pump to exit and joins it.
    ///
    /// # Errors
    ///
    /// Returns the pump's fatal transport error, if it stopped early on its
    /// own.
    pub async fn shutdown(&self, start_app: bool) -> Result<(), BliError> {
        if start_app {
            self.enqueue(vec![Opcode::StartApp.as_u8()], Duration::from_millis(self.settle.identify_cmd_ms));
        }

        while self.busy() && self.last_error().is_none() {
            tokio::time::sleep(Duration::from_millis(self.settle.tick_ms)).await;
        }

        self.cancel.cancel();

        let handle = {
            let mut guard = self.pump_handle.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.take()
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        info!("bootloader interface shut down");
        match self.last_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn enqueue(&self, payload: Vec<u8>, settle: Duration) {
        debug!(opcode = payload[0], len = payload.len(), "enqueueing command");
        self.queue.push(QueueItem { payload, settle });
    }

    fn require_field<U>(&self, get: impl Fn(&DeviceProfile) -> Option<U>) -> Result<U, BliError> {
        let guard = self.profile.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        get(&guard).ok_or(BliError::ProfileIncomplete)
    }
}
