use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::decoder::{Decoder, Operand};
use crate::disasm::{fmt_decoded, fmt_operand};
use crate::exec::Executor;
use crate::loader::Program;
use crate::registers::{Reg, RegRef, RegisterFile, View};
use crate::symbols::{Symbol, SymbolTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Abort with [`Trap::StepLimit`] after this many executed lines.
    pub max_steps: Option<u64>,
    /// Begin at the `global` entry label instead of line 0.
    pub start_at_entry: bool,
}

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eflags: u32 {
const CF = 1 << 0; // Carry
const PF = 1 << 2; // Parity
const AF = 1 << 4; // Adjust
const ZF = 1 << 6; // Zero
const SF = 1 << 7; // Sign
const TF = 1 << 8; // Trap
const IF = 1 << 9; // Interrupt enable
const DF = 1 << 10; // Direction
const OF = 1 << 11; // Overflow
}
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Trap {
    #[error("line {line}: unresolved symbol `{name}`")]
    UnresolvedSymbol { line: usize, name: String },
    #[error("line {line}: ret with empty call stack")]
    StackUnderflow { line: usize },
    #[error("line {line}: division by zero")]
    DivideByZero { line: usize },
    #[error("line {line}: `{name}` holds a string, not an integer")]
    TypeMismatch { line: usize, name: String },
    #[error("line {line}: `{mnemonic}` expects {expected} operand(s)")]
    MissingOperand {
        line: usize,
        mnemonic: &'static str,
        expected: usize,
    },
    #[error("line {line}: unsupported operand `{operand}`")]
    UnsupportedOperand { line: usize, operand: String },
    #[error("step limit of {limit} reached")]
    StepLimit { limit: u64 },
}

/// Coarse classification of a [`Trap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    UnresolvedSymbol,
    StackUnderflow,
    Arithmetic,
    Operand,
    StepLimit,
}

impl Trap {
    pub fn kind(&self) -> TrapKind {
        match self {
            Trap::UnresolvedSymbol { .. } => TrapKind::UnresolvedSymbol,
            Trap::StackUnderflow { .. } => TrapKind::StackUnderflow,
            Trap::DivideByZero { .. } => TrapKind::Arithmetic,
            Trap::TypeMismatch { .. }
            | Trap::MissingOperand { .. }
            | Trap::UnsupportedOperand { .. } => TrapKind::Operand,
            Trap::StepLimit { .. } => TrapKind::StepLimit,
        }
    }
}

/// How a run finished without trapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    /// `end` executed; carries the accumulated output.
    Ended(String),
    /// Ran off the end of the instruction stream.
    FellThrough,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: usize,   // next line to fetch
    pub line: usize, // line currently executing
    pub regs: RegisterFile,
    /// Decoded view of EFLAGS.
    pub flags: Eflags,
    pub call_stack: Vec<usize>,
    /// Sign of the last `cmp`: -1, 0 or 1.
    pub compare: i32,
    pub symbols: SymbolTable,
    pub output: String,
    pub halted: bool,
    pub cfg: CpuConfig,
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        Self {
            pc: 0,
            line: 0,
            regs: RegisterFile::new(),
            flags: Eflags::empty(),
            call_stack: Vec::new(),
            compare: 0,
            symbols: SymbolTable::new(),
            output: String::new(),
            halted: false,
            cfg,
        }
    }

    pub fn reset(&mut self, start: usize) {
        let cfg = self.cfg;
        *self = Self::new(cfg);
        self.pc = start;
    }

    /// Resets all state and installs the program's symbols. Picks the start
    /// line according to [`CpuConfig::start_at_entry`].
    pub fn load(&mut self, program: &Program) {
        let start = match (&program.entry, self.cfg.start_at_entry) {
            (Some(entry), true) => program.symbols.label(entry).unwrap_or(0),
            _ => 0,
        };
        self.reset(start);
        self.symbols = program.symbols.clone();
    }

    /// Fetches, decodes and executes the line at `pc`. Blank lines and a `pc`
    /// past the end just advance.
    pub fn step<D: Decoder, X: Executor>(
        &mut self,
        lines: &[String],
        dec: &D,
        exec: &X,
    ) -> Result<(), Trap> {
        let line = self.pc;
        self.line = line;
        self.pc = line + 1;
        let Some(d) = lines.get(line).and_then(|text| dec.decode(text)) else {
            return Ok(());
        };
        trace!(line, insn = %fmt_decoded(&d), "step");
        exec.exec(self, d)
    }

    pub fn run<D: Decoder, X: Executor>(
        &mut self,
        program: &Program,
        dec: &D,
        exec: &X,
    ) -> Result<Exit, Trap> {
        let mut steps = 0u64;
        while self.pc < program.lines.len() {
            if let Some(limit) = self.cfg.max_steps {
                if steps >= limit {
                    return Err(Trap::StepLimit { limit });
                }
            }
            steps += 1;
            self.step(&program.lines, dec, exec)?;
            if self.halted {
                debug!(steps, "program ended");
                return Ok(Exit::Ended(std::mem::take(&mut self.output)));
            }
        }
        debug!(steps, "fell off the end of the program");
        Ok(Exit::FellThrough)
    }

    fn unresolved(&self, name: &str) -> Trap {
        Trap::UnresolvedSymbol {
            line: self.line,
            name: name.to_string(),
        }
    }

    pub(crate) fn unsupported(&self, operand: &Operand) -> Trap {
        Trap::UnsupportedOperand {
            line: self.line,
            operand: fmt_operand(operand),
        }
    }

    /// Reads a register view or, failing that, an identifier's integer value.
    pub fn read(&self, name: &str) -> Result<i32, Trap> {
        if let Some(r) = RegRef::parse(name) {
            return Ok(self.regs.read(r) as i32);
        }
        match self.symbols.get(name) {
            Some(Symbol::Int(v)) => Ok(*v),
            Some(Symbol::Label(line)) => Ok(*line as i32),
            Some(Symbol::Str(s)) => s.trim().parse().map_err(|_| Trap::TypeMismatch {
                line: self.line,
                name: name.to_string(),
            }),
            None => Err(self.unresolved(name)),
        }
    }

    /// Writes a register view or (re)binds an identifier as an integer variable.
    pub fn write(&mut self, name: &str, value: i32) {
        match RegRef::parse(name) {
            Some(r) => self.write_reg(r, value as u32),
            None => self.symbols.set_int(name, value),
        }
    }

    pub fn write_reg(&mut self, r: RegRef, value: u32) {
        self.regs.write(r, value);
        if r.reg == Reg::Eflags {
            self.sync_flags();
        }
    }

    /// Integer literal as-is, otherwise [`Cpu::read`].
    pub fn value_of(&self, operand: &Operand) -> Result<i32, Trap> {
        match operand {
            Operand::Imm(v) => Ok(*v),
            Operand::Name(name) => self.read(name),
            Operand::Str(_) | Operand::Mem(_) => Err(self.unsupported(operand)),
        }
    }

    /// Line index bound to a label.
    pub fn label(&self, name: &str) -> Result<usize, Trap> {
        self.symbols.label(name).ok_or_else(|| self.unresolved(name))
    }

    /// Rebuilds the flag view from the EFLAGS slot.
    pub fn sync_flags(&mut self) {
        self.flags = Eflags::from_bits_truncate(self.regs.get(Reg::Eflags));
    }

    /// Sets or clears one flag in both EFLAGS and the cached view, touching no other bit.
    pub fn set_flag(&mut self, flag: Eflags, on: bool) {
        let raw = self.regs.get(Reg::Eflags);
        let raw = if on { raw | flag.bits() } else { raw & !flag.bits() };
        self.regs.set(Reg::Eflags, raw);
        self.flags.set(flag, on);
    }

    pub fn flag(&self, flag: Eflags) -> bool {
        self.flags.contains(flag)
    }

    /// EFLAGS bits 0..8.
    pub fn flags_byte(&self) -> u32 {
        self.regs.read(RegRef::new(Reg::Eflags, View::LowByte))
    }
}
