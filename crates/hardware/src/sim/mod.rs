//! Simulation driver and program loading.
//!
//! Provides the [`simulator::Simulator`] facade used by the CLI and tests, and the
//! loader that turns binary, hex and ELF files into memory images.

/// Memory image formats and file loading.
pub mod loader;

/// Run loop, observers and state dumps.
pub mod simulator;
