use std::collections::{BTreeSet, VecDeque};
use serde::Serialize;

use x86lite::decoder::{Decoder, Op, Operand};
use x86lite::isa::x86::X86Decoder;
use x86lite::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind { Fallthrough, Branch, CondBranch, Call }

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self { EdgeKind::Fallthrough => "ft", EdgeKind::Branch => "br", EdgeKind::CondBranch => "cbr", EdgeKind::Call => "call" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge { pub from: usize, pub to: usize, pub kind: EdgeKind }

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unresolved { pub line: usize, pub label: String }

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub visited: BTreeSet<usize>,
    pub edges: Vec<Edge>,
    pub rets: BTreeSet<usize>,
    pub ends: BTreeSet<usize>,
    pub unresolved: Vec<Unresolved>,
    /// Some reachable path runs past the last line.
    pub falls_off: bool,
}

fn target(d: &x86lite::decoder::Decoded) -> Option<String> {
    match d.operands.first() {
        Some(Operand::Name(n)) => Some(n.clone()),
        Some(Operand::Imm(v)) => Some(v.to_string()),
        _ => None,
    }
}

/// Worklist walk over the cleaned stream from `entries`. Calls are assumed to return.
pub fn analyze_entries(program: &Program, entries: &[usize]) -> Analysis {
    let dec = X86Decoder::new();
    let len = program.lines.len();
    let mut a = Analysis::default();
    let mut queue: VecDeque<usize> = entries.iter().copied().filter(|&e| e < len).collect();
    while let Some(line) = queue.pop_front() {
        if !a.visited.insert(line) { continue; }
        let ft = line + 1;
        let d = dec.decode(&program.lines[line]);
        let op = d.as_ref().map_or(Op::Unknown, |d| d.op);
        let mut push = |a: &mut Analysis, to: usize, kind: EdgeKind| {
            if to >= len { a.falls_off = true; return; }
            a.edges.push(Edge { from: line, to, kind });
            if !a.visited.contains(&to) { queue.push_back(to); }
        };
        match op {
            Op::End => { a.ends.insert(line); }
            Op::Ret => { a.rets.insert(line); }
            Op::Jmp | Op::Je | Op::Jne | Op::Jge | Op::Jg | Op::Jle | Op::Jl | Op::Call => {
                let kind = match op { Op::Jmp => EdgeKind::Branch, Op::Call => EdgeKind::Call, _ => EdgeKind::CondBranch };
                let name = d.as_ref().and_then(target).unwrap_or_default();
                match program.symbols.label(&name) {
                    Some(to) => push(&mut a, to, kind),
                    None => a.unresolved.push(Unresolved { line, label: name }),
                }
                if kind != EdgeKind::Branch { push(&mut a, ft, EdgeKind::Fallthrough); }
            }
            _ => push(&mut a, ft, EdgeKind::Fallthrough),
        }
    }
    a
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeOut { pub from: usize, pub to: usize, pub kind: String }

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub entries: Vec<usize>,
    pub reachable: Vec<usize>,
    pub edges: Vec<EdgeOut>,
    pub returns: Vec<usize>,
    pub ends: Vec<usize>,
    pub unresolved: Vec<Unresolved>,
    pub terminates: bool,
    pub falls_off: bool,
}

impl Report {
    pub fn new(entries: &[usize], a: &Analysis) -> Self {
        Self {
            entries: entries.to_vec(),
            reachable: a.visited.iter().copied().collect(),
            edges: a.edges.iter().map(|e| EdgeOut { from: e.from, to: e.to, kind: e.kind.as_str().to_string() }).collect(),
            returns: a.rets.iter().copied().collect(),
            ends: a.ends.iter().copied().collect(),
            unresolved: a.unresolved.clone(),
            terminates: !a.ends.is_empty(),
            falls_off: a.falls_off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x86lite::load;

    #[test]
    fn loop_edges_and_termination() {
        let program = load("mov ecx,5\nmov eax,1\nlabel: cmp ecx,0\nje done\nmul eax,ecx\ndec ecx\njmp label\ndone: msg eax\nend");
        let a = analyze_entries(&program, &[0]);
        assert_eq!(a.visited.len(), 9);
        assert!(a.edges.contains(&Edge { from: 6, to: 2, kind: EdgeKind::Branch }));
        assert!(a.edges.contains(&Edge { from: 3, to: 7, kind: EdgeKind::CondBranch }));
        assert!(a.edges.contains(&Edge { from: 3, to: 4, kind: EdgeKind::Fallthrough }));
        assert!(a.ends.contains(&8));
        assert!(!a.falls_off);
        assert!(a.unresolved.is_empty());
    }

    #[test]
    fn reports_missing_labels_and_fall_off() {
        let program = load("call nowhere\nmov eax, 1");
        let a = analyze_entries(&program, &[0]);
        assert_eq!(a.unresolved, vec![Unresolved { line: 0, label: "nowhere".into() }]);
        assert!(a.falls_off);
        let r = Report::new(&[0], &a);
        assert!(!r.terminates);
    }

    #[test]
    fn numeric_targets_are_label_names() {
        let program = load("jmp 2\nmsg 'x'\n2: je 9\nend");
        let a = analyze_entries(&program, &[0]);
        assert!(a.edges.contains(&Edge { from: 0, to: 2, kind: EdgeKind::Branch }));
        assert_eq!(a.unresolved, vec![Unresolved { line: 2, label: "9".into() }]);
    }
}
