use crate::decoder::{Decoded, Decoder, Op, Operand};
use crate::instructions::lookup;
use crate::tokenizer::{split_fields, unquote};

/// Decoder for the text dialect produced by the loader: a case-sensitive
/// mnemonic followed by comma/space separated operands.
#[derive(Debug, Clone, Copy, Default)]
pub struct X86Decoder;

impl X86Decoder {
    pub fn new() -> Self {
        Self
    }
}

pub fn parse_operand(field: &str) -> Operand {
    if let Some(text) = unquote(field) {
        return Operand::Str(text.to_string());
    }
    if let Some(inner) = field.strip_prefix('[') {
        return Operand::Mem(inner.trim_end_matches(']').to_string());
    }
    match field.parse::<i32>() {
        Ok(v) => Operand::Imm(v),
        Err(_) => Operand::Name(field.to_string()),
    }
}

impl Decoder for X86Decoder {
    fn decode(&self, line: &str) -> Option<Decoded> {
        let mut fields = split_fields(line).into_iter();
        let mnemonic = fields.next()?;
        let op = lookup(&mnemonic).map_or(Op::Unknown, |d| d.op);
        let operands = fields.map(|f| parse_operand(&f)).collect();
        Some(Decoded {
            op,
            mnemonic,
            operands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_operands() {
        assert_eq!(parse_operand("-12"), Operand::Imm(-12));
        assert_eq!(parse_operand("+7"), Operand::Imm(7));
        assert_eq!(parse_operand("'a b'"), Operand::Str("a b".into()));
        assert_eq!(parse_operand("ecx"), Operand::Name("ecx".into()));
        assert_eq!(parse_operand("[eax]"), Operand::Mem("eax".into()));
    }

    #[test]
    fn mnemonics_are_case_sensitive() {
        let dec = X86Decoder::new();
        assert_eq!(dec.decode("mov eax, 1").unwrap().op, Op::Mov);
        let d = dec.decode("MOV eax, 1").unwrap();
        assert_eq!(d.op, Op::Unknown);
        assert_eq!(d.mnemonic, "MOV");
        assert!(dec.decode("   ").is_none());
    }
}
