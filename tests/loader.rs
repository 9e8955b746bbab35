use pretty_assertions::assert_eq;

use x86lite::{interpret, load, Symbol};

#[test]
fn one_output_line_per_source_line() {
    let src = "\
; header comment
section .data
x dd 7

section .text
global main
main:   mov eax, x   ; load
loop:
        dec eax
        jne loop
        end";
    let program = load(src);
    assert_eq!(program.lines.len(), src.lines().count());
    assert_eq!(
        program.lines,
        vec!["", "", "", "", "", "", "mov eax, x", "", "dec eax", "jne loop", "end"]
    );
    assert_eq!(program.entry.as_deref(), Some("main"));
}

#[test]
fn labels_point_at_their_rewritten_line() {
    let program = load("mov a, 1\nstart: inc a\n\nnext:\n  msg a\nend");
    assert_eq!(program.symbols.get("start"), Some(&Symbol::Label(1)));
    assert_eq!(program.lines[1], "inc a");
    // label-only line stays as a blank placeholder; execution flows into line 4
    assert_eq!(program.symbols.get("next"), Some(&Symbol::Label(3)));
    assert_eq!(program.lines[3], "");
    assert_eq!(program.lines[4], "msg a");
}

#[test]
fn data_directives() {
    let src = "\
segment .bss
buf  resb 64
section .data
n    DD -42
s    db 'hi; there'
nl   db 'ok', 10
two: dw 2
len  equ 13
path equ 'a b' c
bad  db
odd  xyz 1
section .text";
    let program = load(src);
    let sym = |n: &str| program.symbols.get(n).cloned();
    assert_eq!(sym("buf"), Some(Symbol::Int(0)));
    assert_eq!(sym("n"), Some(Symbol::Int(-42)));
    assert_eq!(sym("s"), Some(Symbol::Str("hi; there".into())));
    assert_eq!(sym("nl"), Some(Symbol::Str("ok".into())));
    assert_eq!(sym("two"), Some(Symbol::Int(2)));
    assert_eq!(sym("len"), Some(Symbol::Str("13".into())));
    assert_eq!(sym("path"), Some(Symbol::Str("'a b' c".into())));
    assert_eq!(sym("bad"), None);
    assert_eq!(sym("odd"), None);
    assert!(program.lines.iter().all(String::is_empty));
}

#[test]
fn colon_inside_operands_is_not_a_label() {
    let program = load("msg 'a: b'\nend");
    assert_eq!(program.lines[0], "msg 'a: b'");
    assert!(program.symbols.is_empty());
}

#[test]
fn duplicate_label_keeps_last() {
    let program = load("here: nop\nhere: end");
    assert_eq!(program.symbols.label("here"), Some(1));
}

#[test]
fn quoted_semicolon_survives_comment_strip() {
    let program = load("msg 'x;y' ; trailing\nend");
    assert_eq!(program.lines[0], "msg 'x;y'");
}

#[test]
fn string_data_ignores_numeric_trailers() {
    let src = "\
section .data
z  db 'Hi', 0
w  db 'Hi', 300
m  db 'Hi', -1
j  db 'a', 10, 'b'
section .text
msg z, w, m, j
end";
    let program = load(src);
    for name in ["z", "w", "m"] {
        assert_eq!(program.symbols.get(name), Some(&Symbol::Str("Hi".into())), "{name}");
    }
    assert_eq!(program.symbols.get("j"), Some(&Symbol::Str("ab".into())));
    assert_eq!(interpret(src).as_deref(), Some("HiHiHiab"));
}
