/// RV32I instruction encoder.
pub mod builder;
