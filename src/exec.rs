use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::cpu::{Cpu, Eflags, Trap};
use crate::decoder::{Decoded, Op, Operand};
use crate::instructions::describe;
use crate::registers::{Reg, RegRef, View};
use crate::symbols::Symbol;

const AH: RegRef = RegRef::new(Reg::Eax, View::HighByte);
const EFLAGS: RegRef = RegRef::new(Reg::Eflags, View::Dword);
const EFLAGS_LOW: RegRef = RegRef::new(Reg::Eflags, View::LowByte);

pub trait Executor {
    fn exec(&self, cpu: &mut Cpu, d: Decoded) -> Result<(), Trap>;
}

fn dest<'a>(cpu: &Cpu, op: &'a Operand) -> Result<&'a str, Trap> {
    match op {
        Operand::Name(name) => Ok(name),
        other => Err(cpu.unsupported(other)),
    }
}

/// `x <- f(x, value-of(y))`.
fn arith(cpu: &mut Cpu, x: &Operand, y: &Operand, f: fn(i32, i32) -> i32) -> Result<(), Trap> {
    let x = dest(cpu, x)?;
    let v = f(cpu.read(x)?, cpu.value_of(y)?);
    cpu.write(x, v);
    Ok(())
}

/// `x <- f(x, read(y))`; unlike [`arith`], `y` must name a register or bound identifier.
fn bitwise(cpu: &mut Cpu, x: &Operand, y: &Operand, f: fn(i32, i32) -> i32) -> Result<(), Trap> {
    let x = dest(cpu, x)?;
    let y = dest(cpu, y)?;
    let v = f(cpu.read(x)?, cpu.read(y)?);
    cpu.write(x, v);
    Ok(())
}

fn divide(cpu: &mut Cpu, x: &Operand, y: &Operand, f: fn(i32, i32) -> i32) -> Result<(), Trap> {
    let x = dest(cpu, x)?;
    let divisor = cpu.value_of(y)?;
    if divisor == 0 {
        return Err(Trap::DivideByZero { line: cpu.line });
    }
    let v = f(cpu.read(x)?, divisor);
    cpu.write(x, v);
    Ok(())
}

/// Line index of a jump or call target. A numeric target is looked up as a
/// label name like any other.
fn target(cpu: &Cpu, op: &Operand) -> Result<usize, Trap> {
    match op {
        Operand::Name(name) => cpu.label(name),
        Operand::Imm(v) => cpu.label(&v.to_string()),
        other => Err(cpu.unsupported(other)),
    }
}

fn jump(cpu: &mut Cpu, op: &Operand) -> Result<(), Trap> {
    let to = target(cpu, op)?;
    debug!(from = cpu.line, to, "jump");
    cpu.pc = to;
    Ok(())
}

fn jump_if(cpu: &mut Cpu, target: &Operand, taken: fn(Ordering) -> bool) -> Result<(), Trap> {
    if taken(cpu.compare.cmp(&0)) {
        jump(cpu, target)?;
    }
    Ok(())
}

fn print(cpu: &mut Cpu, operands: &[Operand]) -> Result<(), Trap> {
    for operand in operands {
        match operand {
            Operand::Str(text) => cpu.output.push_str(text),
            Operand::Name(name) => {
                if let Some(Symbol::Str(text)) = cpu.symbols.get(name) {
                    cpu.output.push_str(text);
                } else {
                    let v = cpu.read(name)?;
                    cpu.output.push_str(&v.to_string());
                }
            }
            other => {
                let v = cpu.value_of(other)?;
                cpu.output.push_str(&v.to_string());
            }
        }
    }
    Ok(())
}

pub struct IntExecutor;
impl Executor for IntExecutor {
    fn exec(&self, cpu: &mut Cpu, d: Decoded) -> Result<(), Trap> {
        let Some(desc) = describe(d.op) else {
            warn!(line = cpu.line, mnemonic = %d.mnemonic, "unknown instruction skipped");
            return Ok(());
        };
        let expected = desc.form.min_operands();
        if d.operands.len() < expected {
            return Err(Trap::MissingOperand {
                line: cpu.line,
                mnemonic: desc.mnemonic,
                expected,
            });
        }
        let ops = &d.operands;

        match d.op {
            Op::Mov => {
                let x = dest(cpu, &ops[0])?;
                let v = cpu.value_of(&ops[1])?;
                cpu.write(x, v);
            }
            Op::Push => {
                if let Operand::Mem(_) = ops[0] {
                    return Err(cpu.unsupported(&ops[0]));
                }
                // No addressable memory: the value is evaluated for its
                // errors and then dropped.
                let _ = cpu.value_of(&ops[0])?;
                let esp = cpu.regs.get(Reg::Esp);
                cpu.regs.set(Reg::Esp, esp.wrapping_sub(4));
            }
            Op::Inc => {
                let x = dest(cpu, &ops[0])?;
                let v = cpu.read(x)?.wrapping_add(1);
                cpu.write(x, v);
            }
            Op::Dec => {
                let x = dest(cpu, &ops[0])?;
                let v = cpu.read(x)?.wrapping_sub(1);
                cpu.write(x, v);
            }
            Op::Add => arith(cpu, &ops[0], &ops[1], i32::wrapping_add)?,
            Op::Sub => arith(cpu, &ops[0], &ops[1], i32::wrapping_sub)?,
            Op::Mul => arith(cpu, &ops[0], &ops[1], i32::wrapping_mul)?,
            Op::Div => divide(cpu, &ops[0], &ops[1], i32::wrapping_div)?,
            Op::Mod => divide(cpu, &ops[0], &ops[1], i32::wrapping_rem)?,
            Op::Cmp => {
                let a = cpu.value_of(&ops[0])?;
                let b = cpu.value_of(&ops[1])?;
                cpu.compare = a.cmp(&b) as i32;
            }
            Op::And => bitwise(cpu, &ops[0], &ops[1], |a, b| a & b)?,
            Op::Or => bitwise(cpu, &ops[0], &ops[1], |a, b| a | b)?,
            Op::Xor => bitwise(cpu, &ops[0], &ops[1], |a, b| a ^ b)?,
            Op::Jmp => jump(cpu, &ops[0])?,
            Op::Je => jump_if(cpu, &ops[0], Ordering::is_eq)?,
            Op::Jne => jump_if(cpu, &ops[0], Ordering::is_ne)?,
            Op::Jge => jump_if(cpu, &ops[0], Ordering::is_ge)?,
            Op::Jg => jump_if(cpu, &ops[0], Ordering::is_gt)?,
            Op::Jle => jump_if(cpu, &ops[0], Ordering::is_le)?,
            Op::Jl => jump_if(cpu, &ops[0], Ordering::is_lt)?,
            Op::Call => {
                let to = target(cpu, &ops[0])?;
                cpu.call_stack.push(cpu.line);
                debug!(from = cpu.line, to, depth = cpu.call_stack.len(), "call");
                cpu.pc = to;
            }
            Op::Ret => {
                let back = cpu
                    .call_stack
                    .pop()
                    .ok_or(Trap::StackUnderflow { line: cpu.line })?;
                debug!(from = cpu.line, to = back + 1, "ret");
                cpu.pc = back + 1;
            }
            Op::Msg => print(cpu, ops)?,
            Op::End => cpu.halted = true,
            Op::Lahf => {
                let low = cpu.flags_byte();
                cpu.write_reg(AH, low);
            }
            Op::Sahf => {
                let ah = cpu.regs.read(AH);
                cpu.write_reg(EFLAGS_LOW, ah);
            }
            Op::Pushf => {
                let x = dest(cpu, &ops[0])?;
                let v = cpu.regs.read(EFLAGS) as i32;
                cpu.write(x, v);
            }
            Op::Popf => {
                let v = cpu.value_of(&ops[0])?;
                cpu.write_reg(EFLAGS, v as u32);
            }
            Op::Stc => cpu.set_flag(Eflags::CF, true),
            Op::Clc => cpu.set_flag(Eflags::CF, false),
            Op::Cmc => cpu.set_flag(Eflags::CF, !cpu.flag(Eflags::CF)),
            Op::Sti => cpu.set_flag(Eflags::IF, true),
            Op::Cli => cpu.set_flag(Eflags::IF, false),
            Op::Std => cpu.set_flag(Eflags::DF, true),
            Op::Cld => cpu.set_flag(Eflags::DF, false),
            Op::Unknown => {}
        }
        Ok(())
    }
}
