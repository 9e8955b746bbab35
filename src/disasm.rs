use crate::decoder::{Decoded, Operand};

pub fn fmt_operand(op: &Operand) -> String {
    match op {
        Operand::Imm(v) => v.to_string(),
        Operand::Str(s) => format!("'{s}'"),
        Operand::Name(n) => n.clone(),
        Operand::Mem(m) => format!("[{m}]"),
    }
}

/// Canonical text for a decoded instruction: mnemonic, one space, operands
/// joined by `", "`.
pub fn fmt_decoded(d: &Decoded) -> String {
    if d.operands.is_empty() {
        return d.mnemonic.clone();
    }
    let ops: Vec<String> = d.operands.iter().map(fmt_operand).collect();
    format!("{} {}", d.mnemonic, ops.join(", "))
}
