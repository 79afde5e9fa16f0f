//! In-memory stand-ins for the host collaborators.
//!
//! Available to this crate's tests and, through the `test-support`
//! feature, to downstream crates.

mod fake_devices;
mod memory_store;

pub use {
    fake_devices::{FakeDevices, FakeStream, FinalizeBehavior},
    memory_store::MemoryVideoStore,
};
