//! The device profile assembled during identification, and the tunable
//! settle-time table the pump uses to pace commands.

use std::time::Duration;

/// Identification fields as they are discovered, one at a time, from the
/// device's responses. `None` means "not yet answered".
///
/// Fields are write-once in practice: once identification completes the
/// whole object becomes immutable for the rest of the session (see
/// [`DeviceProfile::is_complete`]), but nothing stops a repeated
/// `query_device()` from writing the same value again — the protocol treats
/// repeats as idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Platform identification string (`READ_PLATFORM`).
    pub platform: Option<String>,
    /// Firmware version string (`READ_VERSION`).
    pub version: Option<String>,
    /// Word count per programming row (`READ_ROW_LEN`).
    pub row_length: Option<u16>,
    /// Word count per erase page (`READ_PAGE_LEN`).
    pub page_length: Option<u16>,
    /// Total program memory size, in pages (`READ_PROG_LEN`).
    pub prog_length: Option<u16>,
    /// Word count programmable in one `WRITE_MAX` (`READ_MAX_PROG_SIZE`).
    pub max_prog_size: Option<u16>,
    /// First word address owned by the application (`READ_APP_START_ADDRESS`).
    pub app_start_addr: Option<u16>,
}

impl DeviceProfile {
    /// True once every field above has been populated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.platform.is_some()
            && self.version.is_some()
            && self.row_length.is_some()
            && self.page_length.is_some()
            && self.prog_length.is_some()
            && self.max_prog_size.is_some()
            && self.app_start_addr.is_some()
    }

    /// Converts to the fully-populated view, if identification has
    /// completed.
    #[must_use]
    pub fn to_identified(&self) -> Option<IdentifiedProfile> {
        Some(IdentifiedProfile {
            platform: self.platform.clone()?,
            version: self.version.clone()?,
            row_length: self.row_length?,
            page_length: self.page_length?,
            prog_length: self.prog_length?,
            max_prog_size: self.max_prog_size?,
            app_start_addr: self.app_start_addr?,
        })
    }
}

/// The device profile after identification has completed. Every field here
/// mirrors [`DeviceProfile`] but unwrapped, since the orchestrator only ever
/// sees this after `device_identified` is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifiedProfile {
    /// Platform identification string.
    pub platform: String,
    /// Firmware version string.
    pub version: String,
    /// Word count per programming row.
    pub row_length: u16,
    /// Word count per erase page.
    pub page_length: u16,
    /// Total program memory size, in pages.
    pub prog_length: u16,
    /// Word count programmable in one `WRITE_MAX`.
    pub max_prog_size: u16,
    /// First word address owned by the application.
    pub app_start_addr: u16,
}

/// Per-command settle times, in milliseconds except where noted. Settle
/// times are empirical figures taken from the device's worst-case service
/// latency for each command; exposing them as a struct lets a deployment
/// retune them without touching the pump logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleConfig {
    /// Settle time after each of the seven identification queries.
    pub identify_cmd_ms: u64,
    /// Settle time after `ERASE_PAGE`.
    pub erase_ms: u64,
    /// Settle time after `READ_ADDR`.
    pub read_word_ms: u64,
    /// Settle time per 128 words read by `READ_PAGE`, scaled by the actual
    /// `max_prog_size`.
    pub read_page_ms_per_128: u64,
    /// Settle time after `WRITE_ROW`.
    pub write_row_ms: u64,
    /// Settle time per word written by `WRITE_MAX`.
    pub write_max_ms_per_word: f64,
    /// Delay between pump drain cycles.
    pub tick_ms: u64,
    /// Poll interval the orchestrator uses while waiting on `busy`.
    pub poll_ms: u64,
}

impl SettleConfig {
    /// Settle time for a `READ_PAGE` of `max_prog_size` words.
    #[must_use]
    pub fn read_page(&self, max_prog_size: u16) -> Duration {
        let scaled = self.read_page_ms_per_128 * u64::from(max_prog_size) / 128;
        Duration::from_millis(scaled.max(1))
    }

    /// Settle time for a `WRITE_MAX` of `word_count` words.
    #[must_use]
    pub fn write_max(&self, word_count: usize) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let ms = self.write_max_ms_per_word * word_count as f64;
        Duration::from_millis(ms.max(1.0) as u64)
    }
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            identify_cmd_ms: 10,
            erase_ms: 100,
            read_word_ms: 3,
            read_page_ms_per_128: 60,
            write_row_ms: 50,
            write_max_ms_per_word: 0.5,
            tick_ms: 10,
            poll_ms: 200,
        }
    }
}
