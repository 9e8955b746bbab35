use x86lite::exec::IntExecutor;
use x86lite::isa::x86::X86Decoder;
use x86lite::{execute, interpret, load, Cpu, CpuConfig, Exit, Trap, TrapKind};

#[test]
fn factorial_loop() {
    let src = "\
mov ecx,5
mov eax,1
label: cmp ecx,0
je done
mul eax,ecx
dec ecx
jmp label
done: msg eax
end";
    assert_eq!(interpret(src).as_deref(), Some("120"));
}

#[test]
fn string_literal_concatenation() {
    assert_eq!(
        interpret("msg 'Result: ', 42, '!'\nend").as_deref(),
        Some("Result: 42!")
    );
}

#[test]
fn unresolved_label_is_fatal() {
    let err = execute("jmp missing\nend", CpuConfig::default()).unwrap_err();
    assert_eq!(
        err,
        Trap::UnresolvedSymbol { line: 0, name: "missing".into() }
    );
    assert_eq!(err.kind(), TrapKind::UnresolvedSymbol);
    assert_eq!(interpret("jmp missing\nend"), None);
}

#[test]
fn missing_end_is_not_a_trap() {
    let r = execute("mov eax, 1\nmsg eax", CpuConfig::default());
    assert_eq!(r, Ok(Exit::FellThrough));
    assert_eq!(interpret("mov eax, 1\nmsg eax"), None);
}

#[test]
fn division_by_zero_is_fatal() {
    let err = execute("mov eax,10\nmov ebx,0\ndiv eax,ebx\nend", CpuConfig::default()).unwrap_err();
    assert_eq!(err, Trap::DivideByZero { line: 2 });
    assert_eq!(err.kind(), TrapKind::Arithmetic);
}

#[test]
fn modulo_by_zero_is_fatal() {
    let err = execute("mov eax,10\nmod eax,0\nend", CpuConfig::default()).unwrap_err();
    assert_eq!(err.kind(), TrapKind::Arithmetic);
}

#[test]
fn full_program_with_sections() {
    let src = "\
section .data
greeting db 'Hello, '
count    dd 3
width    equ 10

section .text
global _start
_start:
    mov eax, count      ; eax = 3
    add eax, width      ; + 10
    msg greeting, eax, '!'
    end";
    assert_eq!(interpret(src).as_deref(), Some("Hello, 13!"));
}

#[test]
fn step_limit_stops_infinite_loop() {
    let cfg = CpuConfig { max_steps: Some(100), ..CpuConfig::default() };
    let err = execute("top: jmp top\nend", cfg).unwrap_err();
    assert_eq!(err, Trap::StepLimit { limit: 100 });
}

#[test]
fn rerun_after_reload_is_independent() {
    let program = load("inc counter\nmsg counter\nend");
    let dec = X86Decoder::new();
    let exec = IntExecutor;
    let mut cpu = Cpu::new(CpuConfig::default());

    // `counter` is never bound, so the first read fails.
    cpu.load(&program);
    assert!(matches!(cpu.run(&program, &dec, &exec), Err(Trap::UnresolvedSymbol { .. })));

    let program = load("mov counter, 0\ninc counter\nmsg counter\nend");
    cpu.load(&program);
    assert_eq!(cpu.run(&program, &dec, &exec), Ok(Exit::Ended("1".into())));
    cpu.load(&program);
    assert_eq!(cpu.run(&program, &dec, &exec), Ok(Exit::Ended("1".into())));
}

#[test]
fn entry_point_is_ignored_unless_configured() {
    let src = "global main\nmsg 'a'\nmain: msg 'b'\nend";
    assert_eq!(interpret(src).as_deref(), Some("ab"));
    let cfg = CpuConfig { start_at_entry: true, ..CpuConfig::default() };
    assert_eq!(execute(src, cfg), Ok(Exit::Ended("b".into())));
}

#[test]
fn unknown_mnemonics_are_skipped() {
    assert_eq!(interpret("nop\nMOV eax, 1\nmsg 'ok'\nend").as_deref(), Some("ok"));
}
