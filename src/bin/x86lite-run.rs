use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use x86lite::registers::Reg;
use x86lite::{exec::IntExecutor, isa::x86::X86Decoder, load, Cpu, CpuConfig, Eflags, Exit, SymbolTable};

const DEFAULT_MAX_STEPS: u64 = 10_000_000;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run an assembly program on the x86lite interpreter"
)]
struct Opts {
    /// JSON file with a CpuConfig; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Abort after this many executed lines [default: 10000000]
    #[arg(long)]
    max_steps: Option<u64>,
    /// Start at the `global` entry label instead of line 0
    #[arg(long)]
    start_at_entry: bool,
    /// Print final registers, flags and symbols as JSON to stderr
    #[arg(long)]
    dump_state: bool,
    #[arg(value_name = "SOURCE")]
    input: PathBuf,
}

#[derive(Serialize)]
struct StateDump<'a> {
    registers: BTreeMap<&'static str, u32>,
    flags: Eflags,
    call_stack: &'a [usize],
    compare: i32,
    symbols: &'a SymbolTable,
}

fn dump(cpu: &Cpu) -> Result<String> {
    let registers = Reg::ALL.iter().map(|r| (r.name(), cpu.regs.get(*r))).collect();
    let state = StateDump {
        registers,
        flags: cpu.flags,
        call_stack: &cpu.call_stack,
        compare: cpu.compare,
        symbols: &cpu.symbols,
    };
    Ok(serde_json::to_string_pretty(&state)?)
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();

    let mut cfg = match &opts.config {
        Some(path) => {
            let txt = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<CpuConfig>(&txt)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => CpuConfig::default(),
    };
    cfg.max_steps = opts.max_steps.or(cfg.max_steps).or(Some(DEFAULT_MAX_STEPS));
    cfg.start_at_entry |= opts.start_at_entry;

    let source = std::fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let program = load(&source);

    let mut cpu = Cpu::new(cfg);
    cpu.load(&program);
    let result = cpu.run(&program, &X86Decoder::new(), &IntExecutor);

    if opts.dump_state {
        eprintln!("{}", dump(&cpu)?);
    }

    match result {
        Ok(Exit::Ended(out)) => {
            println!("{out}");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Exit::FellThrough) => {
            eprintln!("program did not terminate: no `end` reached");
            Ok(ExitCode::from(2))
        }
        Err(trap) => {
            eprintln!("TRAP: {trap}");
            Ok(ExitCode::from(1))
        }
    }
}
