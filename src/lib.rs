pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod loader;
pub mod registers;
pub mod symbols;
pub mod tokenizer;

pub mod isa {
    pub mod x86; // simplified x86-like text dialect
}

pub use cpu::{Cpu, CpuConfig, Eflags, Exit, Trap, TrapKind};
pub use loader::{load, Program};
pub use symbols::{Symbol, SymbolTable};

use exec::IntExecutor;
use isa::x86::X86Decoder;

/// Loads and runs `source` with the default decoder and executor.
pub fn execute(source: &str, cfg: CpuConfig) -> Result<Exit, Trap> {
    let program = load(source);
    let mut cpu = Cpu::new(cfg);
    cpu.load(&program);
    cpu.run(&program, &X86Decoder::new(), &IntExecutor)
}

/// Output of a program that reaches `end`; `None` for every other outcome.
pub fn interpret(source: &str) -> Option<String> {
    match execute(source, CpuConfig::default()) {
        Ok(Exit::Ended(out)) => Some(out),
        _ => None,
    }
}
