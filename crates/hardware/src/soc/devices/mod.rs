//! Memory-Mapped IO Devices.
//!
//! The simulated system has a single device block: console output, program
//! exit and argument input, all served by [`Mmio`].

/// Console, exit and argument registers.
pub mod mmio;

pub use mmio::{ConsoleEvent, Mmio};
