


/// Whole-program properties checked over generated inputs.
pub mod properties;

/// Reference programs with known results.
pub mod scenarios;
