use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Mov,
    Push,
    Inc,
    Dec,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Cmp,
    And,
    Or,
    Xor,
    Jmp,
    Je,
    Jne,
    Jge,
    Jg,
    Jle,
    Jl,
    Call,
    Ret,
    Msg,
    End,
    Lahf,
    Sahf,
    Pushf,
    Popf,
    Stc,
    Clc,
    Cmc,
    Sti,
    Cli,
    Std,
    Cld,
    /// Mnemonic not in the instruction set; executes as a no-op.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Imm(i32),
    /// Contents of a quoted literal, quotes removed.
    Str(String),
    /// Register or identifier.
    Name(String),
    /// `[...]` address expression; recognised but not executable.
    Mem(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Op,
    pub mnemonic: String,
    pub operands: Vec<Operand>,
}

pub trait Decoder {
    /// Decodes one cleaned line. Returns `None` when the line holds no instruction.
    fn decode(&self, line: &str) -> Option<Decoded>;
}
