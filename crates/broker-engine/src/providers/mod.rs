//! Query engine implementations.

pub mod memory;
pub mod remote;

pub use memory::MemoryEngine;
pub use remote::RemoteEngine;
