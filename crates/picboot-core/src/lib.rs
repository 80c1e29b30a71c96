//! The bootloader command interface: a FIFO command queue, a background
//! pump that drives the [`picboot_wire::Framer`], the device identification
//! profile, and the local flash mirror.

pub mod error;
pub mod interface;
pub mod memory;
pub mod profile;
pub mod pump;
pub mod queue;
pub mod response;

pub use error::BliError;
pub use interface::BootloaderInterface;
pub use memory::{LocalMemoryMap, UNREAD};
pub use profile::{DeviceProfile, IdentifiedProfile, SettleConfig};
pub use queue::{QueueItem, TxQueue};
