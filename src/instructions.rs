use crate::decoder::Op;

/// Operand shape an instruction expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    None,
    /// One destination or label.
    One,
    /// Destination, source.
    Two,
    /// Any number of operands.
    List,
}

impl Form {
    pub fn min_operands(self) -> usize {
        match self {
            Form::None | Form::List => 0,
            Form::One => 1,
            Form::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Op,
    pub mnemonic: &'static str,
    pub form: Form,
}

const fn desc(op: Op, mnemonic: &'static str, form: Form) -> InstrDesc {
    InstrDesc { op, mnemonic, form }
}

pub const TABLE: &[InstrDesc] = &[
    desc(Op::Mov, "mov", Form::Two),
    desc(Op::Push, "push", Form::One),
    desc(Op::Inc, "inc", Form::One),
    desc(Op::Dec, "dec", Form::One),
    desc(Op::Add, "add", Form::Two),
    desc(Op::Sub, "sub", Form::Two),
    desc(Op::Mul, "mul", Form::Two),
    desc(Op::Div, "div", Form::Two),
    desc(Op::Mod, "mod", Form::Two),
    desc(Op::Cmp, "cmp", Form::Two),
    desc(Op::And, "and", Form::Two),
    desc(Op::Or, "or", Form::Two),
    desc(Op::Xor, "xor", Form::Two),
    desc(Op::Jmp, "jmp", Form::One),
    desc(Op::Je, "je", Form::One),
    desc(Op::Jne, "jne", Form::One),
    desc(Op::Jge, "jge", Form::One),
    desc(Op::Jg, "jg", Form::One),
    desc(Op::Jle, "jle", Form::One),
    desc(Op::Jl, "jl", Form::One),
    desc(Op::Call, "call", Form::One),
    desc(Op::Ret, "ret", Form::None),
    desc(Op::Msg, "msg", Form::List),
    desc(Op::End, "end", Form::None),
    desc(Op::Lahf, "lahf", Form::None),
    desc(Op::Sahf, "sahf", Form::None),
    desc(Op::Pushf, "pushf", Form::One),
    desc(Op::Popf, "popf", Form::One),
    desc(Op::Stc, "stc", Form::None),
    desc(Op::Clc, "clc", Form::None),
    desc(Op::Cmc, "cmc", Form::None),
    desc(Op::Sti, "sti", Form::None),
    desc(Op::Cli, "cli", Form::None),
    desc(Op::Std, "std", Form::None),
    desc(Op::Cld, "cld", Form::None),
];

/// Exact, case-sensitive lookup.
pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic == mnemonic)
}

pub fn describe(op: Op) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.op == op)
}
