use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use x86lite::decoder::{Decoder, Op};
use x86lite::disasm::fmt_decoded;
use x86lite::isa::x86::X86Decoder;
use x86lite::{load, Program, Symbol, SymbolTable};

pub fn load_source(path: &Path) -> Result<Program> {
    let txt = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(load(&txt))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolRow {
    pub name: String,
    pub kind: &'static str, // "int", "str" or "label"
    pub value: String,
}

pub fn symbol_rows(symbols: &SymbolTable) -> Vec<SymbolRow> {
    symbols
        .iter()
        .map(|(name, sym)| {
            let (kind, value) = match sym {
                Symbol::Int(v) => ("int", v.to_string()),
                Symbol::Str(s) => ("str", format!("{s:?}")),
                Symbol::Label(line) => ("label", line.to_string()),
            };
            SymbolRow { name: name.to_string(), kind, value }
        })
        .collect()
}

/// Labels grouped by the line they point at.
pub fn labels_by_line(symbols: &SymbolTable) -> BTreeMap<usize, Vec<&str>> {
    let mut out: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (name, sym) in symbols.iter() {
        if let Symbol::Label(line) = sym {
            out.entry(*line).or_default().push(name);
        }
    }
    out
}

/// Cleaned stream with label markers; blank lines are omitted.
pub fn render_listing(program: &Program) -> String {
    let dec = X86Decoder::new();
    let labels = labels_by_line(&program.symbols);
    let mut buf = String::new();
    for (i, text) in program.lines.iter().enumerate() {
        for name in labels.get(&i).into_iter().flatten() {
            let _ = writeln!(buf, "{name}:");
        }
        let Some(d) = dec.decode(text) else { continue };
        if d.op == Op::Unknown {
            let _ = writeln!(buf, "{i:>5}: {}    ; unknown mnemonic", fmt_decoded(&d));
        } else {
            let _ = writeln!(buf, "{i:>5}: {}", fmt_decoded(&d));
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_reads_file_and_lists_labels() {
        let cwd = std::env::current_dir().unwrap();
        let path = cwd.join("_test_listing.asm");
        std::fs::write(&path, "mov a,1\nloop: inc a ; tick\nfoo bar\n\nend\n").unwrap();
        let program = load_source(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let listing = render_listing(&program);
        assert_eq!(
            listing,
            "    0: mov a, 1\nloop:\n    1: inc a\n    2: foo bar    ; unknown mnemonic\n    4: end\n"
        );
    }

    #[test]
    fn symbol_rows_are_sorted_by_name() {
        let program = load("section .data\nz dd 3\nmsg db 'hi'\nsection .text\nstart: end");
        let rows = symbol_rows(&program.symbols);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["msg", "start", "z"]);
        assert_eq!(rows[0].value, "\"hi\"");
        assert_eq!(rows[1].kind, "label");
    }
}
