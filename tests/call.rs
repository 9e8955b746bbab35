use x86lite::exec::IntExecutor;
use x86lite::isa::x86::X86Decoder;
use x86lite::{execute, interpret, load, Cpu, CpuConfig, Exit, Trap, TrapKind};

#[test]
fn call_and_ret_return_after_the_call() {
    let src = "\
call sub
msg 'back'
end
sub: msg 'in;'
ret";
    assert_eq!(interpret(src).as_deref(), Some("in;back"));
}

#[test]
fn call_pushes_its_own_line() {
    let program = load("nop\ncall f\nend\nf: ret");
    let dec = X86Decoder::new();
    let exec = IntExecutor;
    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.load(&program);
    cpu.step(&program.lines, &dec, &exec).unwrap(); // nop
    cpu.step(&program.lines, &dec, &exec).unwrap(); // call f
    assert_eq!(cpu.call_stack, vec![1]);
    assert_eq!(cpu.pc, 3);
    cpu.step(&program.lines, &dec, &exec).unwrap(); // ret
    assert!(cpu.call_stack.is_empty());
    assert_eq!(cpu.pc, 2);
}

#[test]
fn nested_calls_unwind_in_order() {
    // depth(n): msg n; if n > 0 { dec n; call depth }; msg '.'
    let src = "\
mov n, 4
call depth
msg '|'
end
depth: msg n
  cmp n, 0
  je leave
  dec n
  call depth
leave: msg '.'
  ret";
    let program = load(src);
    let dec = X86Decoder::new();
    let exec = IntExecutor;
    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.load(&program);

    let mut max_depth = 0usize;
    while !cpu.halted {
        cpu.step(&program.lines, &dec, &exec).unwrap();
        max_depth = max_depth.max(cpu.call_stack.len());
    }
    assert_eq!(max_depth, 5);
    assert!(cpu.call_stack.is_empty());
    assert_eq!(cpu.output, "43210.....|");
}

#[test]
fn ret_on_empty_stack_underflows() {
    let err = execute("msg 'x'\nret\nend", CpuConfig::default()).unwrap_err();
    assert_eq!(err, Trap::StackUnderflow { line: 1 });
    assert_eq!(err.kind(), TrapKind::StackUnderflow);
}

#[test]
fn call_to_missing_label_leaves_stack_untouched() {
    let program = load("call ghost\nend");
    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.load(&program);
    let r = cpu.run(&program, &X86Decoder::new(), &IntExecutor);
    assert!(matches!(r, Err(Trap::UnresolvedSymbol { ref name, .. }) if name == "ghost"));
    assert!(cpu.call_stack.is_empty());
}

#[test]
fn ret_past_last_line_falls_through() {
    assert_eq!(execute("jmp f\ng: ret\nf: call g", CpuConfig::default()), Ok(Exit::FellThrough));
}

#[test]
fn numeric_call_target_is_a_label_name() {
    assert_eq!(interpret("call 7\nmsg 'x'\nend\n7: msg 'y'\nret").as_deref(), Some("yx"));
    let err = execute("call 7\nend", CpuConfig::default()).unwrap_err();
    assert_eq!(err, Trap::UnresolvedSymbol { line: 0, name: "7".into() });
}
