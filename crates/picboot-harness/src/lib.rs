//! Test fakes shared across the workspace: an in-memory transport pair and
//! a scripted device that answers canned responses.

pub mod loopback;
pub mod scripted_device;

pub use loopback::{LoopbackTransport, loopback_pair};
pub use scripted_device::ScriptedDevice;
