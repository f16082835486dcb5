//! RV32I pipeline simulator CLI.
//!
//! This binary drives the simulator library. It provides:
//! 1. **run:** Load a binary, hex or ELF image, run it to completion and exit with
//!    the program's exit status.
//! 2. **disasm:** Print the disassembly of an image's words.
//!
//! Configuration starts from built-in defaults or a JSON file; individual flags then
//! override single fields.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rv32sim_core::config::{Associativity, Config, ReplacementPolicy};
use rv32sim_core::isa::disasm::disassemble;
use rv32sim_core::sim::loader::{ImageFormat, MemoryImage};
use rv32sim_core::{RunOutcome, Simulator};

/// Exit status used when the cycle budget runs out.
const EXIT_CYCLE_LIMIT: u8 = 2;

/// Exit status used for simulation and setup errors.
const EXIT_FAILURE: u8 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "rv32sim",
    author,
    version,
    about = "Cycle-accurate RV32I five-stage pipeline simulator",
    long_about = "Run an RV32I program on a five-stage pipeline with split L1 caches.\n\nExamples:\n  rv32sim run prog.bin\n  rv32sim run prog.hex --ways 1 --stats\n  rv32sim run prog.elf --arg 10 --dump state.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program until it exits or the cycle budget runs out.
    Run(RunArgs),

    /// Disassemble the words of an image.
    Disasm {
        /// Image to disassemble.
        image: PathBuf,

        /// Image format.
        #[arg(long, value_enum, default_value_t = Format::Auto)]
        format: Format,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Program image.
    image: PathBuf,

    /// Image format.
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    format: Format,

    /// JSON configuration file; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ways per set for both caches.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    ways: Option<u8>,

    /// Replacement policy for both caches.
    #[arg(long, value_enum)]
    policy: Option<Policy>,

    /// Cycles for the first word of a line fill.
    #[arg(long)]
    fill_latency: Option<u64>,

    /// Words per cache line.
    #[arg(long)]
    line_words: Option<usize>,

    /// Sets per cache.
    #[arg(long)]
    sets: Option<usize>,

    /// Cycle budget.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Word returned by the argument register, in order (decimal or 0x hex).
    #[arg(long = "arg", value_parser = parse_word, allow_negative_numbers = true)]
    args: Vec<u32>,

    /// Write a JSON state dump to this path (`-` for stdout).
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Memory word to include in the dump (decimal or 0x hex).
    #[arg(long = "dump-word", value_parser = parse_word)]
    dump_words: Vec<u32>,

    /// Print statistics after the run.
    #[arg(long)]
    stats: bool,

    /// Log every pipeline event (same as `RUST_LOG=trace`).
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Auto,
    Bin,
    Hex,
    Elf,
}

impl From<Format> for ImageFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Auto => Self::Auto,
            Format::Bin => Self::Binary,
            Format::Hex => Self::Hex,
            Format::Elf => Self::Elf,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    Lru,
    Fifo,
}

impl From<Policy> for ReplacementPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Lru => Self::Lru,
            Policy::Fifo => Self::Fifo,
        }
    }
}

/// Parses a decimal (optionally negative) or `0x` hex word.
fn parse_word(s: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else if let Some(neg) = s.strip_prefix('-') {
        neg.parse::<u32>()
            .map(u32::wrapping_neg)
            .map_err(|e| e.to_string())
    } else {
        s.parse::<u32>().map_err(|e| e.to_string())
    };
    parsed.map_err(|e| format!("'{s}' is not a 32-bit word: {e}"))
}

fn init_tracing(trace: bool) {
    let filter = if trace {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &RunArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("could not read config `{}`", path.display()))?;
            Config::from_json(&json)?
        }
        None => Config::default(),
    };

    for cache in [&mut config.cache.icache, &mut config.cache.dcache] {
        if let Some(ways) = args.ways
            && let Some(assoc) = Associativity::from_ways(ways as usize)
        {
            cache.associativity = assoc;
        }
        if let Some(policy) = args.policy {
            cache.policy = policy.into();
        }
        if let Some(line_words) = args.line_words {
            cache.line_words = line_words;
        }
        if let Some(sets) = args.sets {
            cache.sets = sets;
        }
    }
    if let Some(latency) = args.fill_latency {
        config.memory.fill_base_latency = latency;
    }
    if let Some(max_cycles) = args.max_cycles {
        config.general.max_cycles = max_cycles;
    }
    config.general.echo_console = true;
    config.validate()?;
    Ok(config)
}

fn cmd_run(args: &RunArgs) -> Result<ExitCode> {
    let config = build_config(args)?;
    debug!("configuration: {:?}", config);

    let image = MemoryImage::from_file(&args.image, args.format.into())?;
    let mut sim = Simulator::new(&config)?;
    sim.load_image(&image)?;
    sim.set_args(args.args.iter().copied());

    let result = sim.run(config.general.max_cycles);

    if let Some(path) = &args.dump {
        write_dump(&sim, path, &args.dump_words)?;
    }
    if args.stats {
        sim.stats().print();
    }

    match result {
        Ok(RunOutcome::Exited(code)) => Ok(ExitCode::from(code as u8)),
        Ok(RunOutcome::CycleLimit) => {
            eprintln!(
                "\n[!] cycle limit of {} reached at pc={:#010x}",
                config.general.max_cycles,
                sim.pc()
            );
            Ok(ExitCode::from(EXIT_CYCLE_LIMIT))
        }
        Err(e) => {
            eprintln!("\n[!] FATAL: {e}");
            eprint!("{}", sim.cpu.regs.dump());
            Ok(ExitCode::from(EXIT_FAILURE))
        }
    }
}

fn write_dump(sim: &Simulator, path: &Path, words: &[u32]) -> Result<()> {
    let json = serde_json::to_string_pretty(&sim.dump(words))?;
    if path.as_os_str() == "-" {
        println!("{json}");
    } else {
        std::fs::write(path, json)
            .with_context(|| format!("could not write dump `{}`", path.display()))?;
    }
    Ok(())
}

fn cmd_disasm(path: &Path, format: Format) -> Result<ExitCode> {
    let image = MemoryImage::from_file(path, format.into())?;
    for segment in &image.segments {
        for (i, chunk) in segment.data.chunks(4).enumerate() {
            let mut bytes = [0u8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            let word = u32::from_le_bytes(bytes);
            let addr = segment.addr.wrapping_add(4 * i as u32);
            println!("{addr:08x}:  {word:08x}  {}", disassemble(word));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run(args) => {
            init_tracing(args.trace);
            cmd_run(args)
        }
        Commands::Disasm { image, format } => {
            init_tracing(false);
            cmd_disasm(image, *format)
        }
    };

    result.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        ExitCode::from(EXIT_FAILURE)
    })
}
