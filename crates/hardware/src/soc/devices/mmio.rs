//! Console, exit and argument registers.
//!
//! This module implements the side effects behind the fixed MMIO addresses. It provides:
//! 1. **Console:** Ordered byte and integer events plus the rendered text stream.
//! 2. **Exit:** The first status written to the exit register ends the run.
//! 3. **Arguments:** A FIFO of externally supplied words popped by reads.

use std::collections::VecDeque;
use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use crate::soc::memory_map::MmioRegister;

/// One item written to the console, in program order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ConsoleEvent {
    /// A byte written to the console-byte register.
    Char(u8),
    /// A word written to the console-int register.
    Int(i32),
}

/// MMIO device state.
#[derive(Debug, Default)]
pub struct Mmio {
    events: Vec<ConsoleEvent>,
    output: String,
    exit_code: Option<u32>,
    args: VecDeque<u32>,
    echo: bool,
}

impl Mmio {
    /// Creates the device; with `echo` set, console output is also written to stdout.
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            ..Self::default()
        }
    }

    /// Replaces the argument queue.
    pub fn set_args(&mut self, args: impl IntoIterator<Item = u32>) {
        self.args = args.into_iter().collect();
    }

    /// Appends one argument word.
    pub fn push_arg(&mut self, arg: u32) {
        self.args.push_back(arg);
    }

    /// Serves a register read.
    ///
    /// Only the argument register produces data; write-only registers read as 0.
    pub fn read(&mut self, reg: MmioRegister) -> u32 {
        match reg {
            MmioRegister::Arg => self.args.pop_front().unwrap_or_else(|| {
                warn!("argument read with no arguments left, returning 0");
                0
            }),
            MmioRegister::ConsoleByte | MmioRegister::ConsoleInt | MmioRegister::Exit => 0,
        }
    }

    /// Serves a register write of `value`.
    pub fn write(&mut self, reg: MmioRegister, value: u32) {
        match reg {
            MmioRegister::ConsoleByte => {
                let byte = value as u8;
                self.events.push(ConsoleEvent::Char(byte));
                self.output.push(char::from(byte));
                self.echo_text(&char::from(byte).to_string());
            }
            MmioRegister::ConsoleInt => {
                let int = value as i32;
                self.events.push(ConsoleEvent::Int(int));
                let text = int.to_string();
                self.output.push_str(&text);
                self.echo_text(&text);
            }
            MmioRegister::Exit => {
                if self.exit_code.is_none() {
                    info!(code = value, "program exited");
                    self.exit_code = Some(value);
                }
            }
            MmioRegister::Arg => {}
        }
    }

    fn echo_text(&self, text: &str) {
        if self.echo {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }

    /// Console text produced so far.
    pub fn console_output(&self) -> &str {
        &self.output
    }

    /// Console events produced so far.
    pub fn events(&self) -> &[ConsoleEvent] {
        &self.events
    }

    /// Exit status, once the program has written the exit register.
    pub const fn exit_code(&self) -> Option<u32> {
        self.exit_code
    }

    /// Arguments not yet consumed.
    pub fn remaining_args(&self) -> usize {
        self.args.len()
    }
}
