//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains definitions for opcodes, function codes, and decoding logic for the
//! RV32I base integer instruction set.
//!
//! # Contents
//!
//! * `rv32i`: Opcode, funct3 and funct7 encodings.
//! * `instruction`: Bit-field extraction from raw instruction words.
//! * `decode`: Field and immediate extraction for every instruction format.
//! * `disasm`: Mnemonic rendering for traces and diagnostics.

/// Instruction decoding logic for all RV32I instruction formats.
pub mod decode;

/// Instruction disassembler for debug tracing and diagnostics.
pub mod disasm;

/// Instruction encoding structures and bit extraction utilities.
pub mod instruction;

/// Base integer instruction set (32-bit RISC-V core instructions).
pub mod rv32i;
