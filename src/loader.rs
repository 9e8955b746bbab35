//! Preparation pass: turns raw program text into a cleaned instruction stream
//! plus a symbol table.
//!
//! Work is split into two ordered passes over the same source lines. The first
//! binds labels, data constants and the entry point against the untouched line
//! indices. The second rewrites each line into its executable form. The output
//! stream always has one entry per source line so label indices stay valid.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::symbols::{Symbol, SymbolTable};
use crate::tokenizer::{split_fields, strip_comment, unquote};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub lines: Vec<String>,
    pub symbols: SymbolTable,
    /// Name given by a `global` directive, if any.
    pub entry: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Data,
    Text,
}

/// What the first pass decided about a line; consumed by the rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineKind {
    Blank,
    Code,
    /// Code with a `name:` prefix of the given byte length.
    Labelled(usize),
}

fn clean(line: &str) -> &str {
    strip_comment(line).trim()
}

fn section_switch(line: &str) -> Option<Option<Segment>> {
    let is_directive = ["section", "segment", "segemnt"]
        .iter()
        .any(|d| line.starts_with(d));
    if !is_directive {
        return None;
    }
    if line.ends_with(".data") || line.ends_with(".bss") {
        Some(Some(Segment::Data))
    } else if line.ends_with(".text") {
        Some(Some(Segment::Text))
    } else {
        Some(None)
    }
}

/// Returns the label name and the byte length of its `name:` prefix when the
/// first whitespace-delimited token of `line` ends with a colon.
fn label_prefix(line: &str) -> Option<(&str, usize)> {
    if !line.contains(':') {
        return None;
    }
    let head = line.split_whitespace().next()?;
    if !head.ends_with(':') {
        return None;
    }
    let colon = line.find(':')?;
    Some((&line[..colon], head.len()))
}

/// Value bound by a `db`-family directive: the quoted parts joined, or the
/// first integer when nothing is quoted. Numeric values after a string are
/// returned separately so the caller can report them.
fn define_value(values: &[String]) -> (Option<Symbol>, Vec<&str>) {
    if values.iter().any(|v| unquote(v).is_some()) {
        let mut s = String::new();
        let mut skipped = Vec::new();
        for v in values {
            match unquote(v) {
                Some(text) => s.push_str(text),
                None => skipped.push(v.as_str()),
            }
        }
        return (Some(Symbol::Str(s)), skipped);
    }
    let first = values.first().and_then(|v| v.parse::<i32>().ok());
    (first.map(Symbol::Int), Vec::new())
}

fn bind_data(line: &str, line_no: usize, symbols: &mut SymbolTable) {
    let fields = split_fields(line);
    if fields.len() < 2 {
        warn!(line = line_no, text = line, "malformed data line ignored");
        return;
    }
    let name = fields[0].trim_end_matches(':');
    let sym = match fields[1].to_ascii_lowercase().as_str() {
        "db" | "dw" | "dd" | "dq" | "dt" => {
            let (sym, skipped) = define_value(&fields[2..]);
            if !skipped.is_empty() {
                warn!(line = line_no, name, ?skipped, "non-string values after string data ignored");
            }
            sym
        }
        "equ" => line
            .find(fields[0].as_str())
            .map(|p| line[p + fields[0].len()..].trim_start_matches(|c: char| c.is_whitespace() || c == ','))
            .and_then(|rest| rest.get(fields[1].len()..))
            .map(|rest| Symbol::Str(rest.trim().to_string())),
        "resb" | "resw" | "resd" | "resq" => Some(Symbol::Int(0)),
        other => {
            warn!(line = line_no, directive = other, "unknown data directive ignored");
            return;
        }
    };
    match sym {
        Some(sym) => {
            debug!(line = line_no, name, ?sym, "bind data");
            symbols.bind(name, sym);
        }
        None => warn!(line = line_no, text = line, "malformed data value ignored"),
    }
}

fn bind_symbols(source: &[&str]) -> (SymbolTable, Option<String>, Vec<LineKind>) {
    let mut symbols = SymbolTable::new();
    let mut entry = None;
    let mut kinds = Vec::with_capacity(source.len());
    let mut segment = Segment::Text;

    for (i, raw) in source.iter().enumerate() {
        let line = clean(raw);
        if let Some(switch) = section_switch(line) {
            match switch {
                Some(s) => segment = s,
                None => warn!(line = i, text = line, "unknown section ignored"),
            }
            kinds.push(LineKind::Blank);
            continue;
        }
        match segment {
            Segment::Data => {
                if !line.is_empty() {
                    bind_data(line, i, &mut symbols);
                }
                kinds.push(LineKind::Blank);
            }
            Segment::Text => {
                if let Some(rest) = line.strip_prefix("global") {
                    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                        entry = Some(rest.trim().to_string());
                        kinds.push(LineKind::Blank);
                        continue;
                    }
                }
                match label_prefix(line) {
                    Some((name, len)) => {
                        debug!(line = i, name, "bind label");
                        if let Some(prev) = symbols.bind(name, Symbol::Label(i)) {
                            warn!(line = i, name, ?prev, "label redefined");
                        }
                        kinds.push(LineKind::Labelled(len));
                    }
                    None if line.is_empty() => kinds.push(LineKind::Blank),
                    None => kinds.push(LineKind::Code),
                }
            }
        }
    }
    (symbols, entry, kinds)
}

fn rewrite(source: &[&str], kinds: &[LineKind]) -> Vec<String> {
    source
        .iter()
        .zip(kinds)
        .map(|(raw, kind)| match kind {
            LineKind::Blank => String::new(),
            LineKind::Code => clean(raw).to_string(),
            LineKind::Labelled(len) => clean(raw)[*len..].trim().to_string(),
        })
        .collect()
}

/// Prepares `source` for execution. Never fails: malformed directives are
/// logged and skipped, and problems in code lines surface at run time.
pub fn load(source: &str) -> Program {
    let lines: Vec<&str> = source.lines().collect();
    let (symbols, entry, kinds) = bind_symbols(&lines);
    let lines = rewrite(&lines, &kinds);
    Program {
        lines,
        symbols,
        entry,
    }
}
