//! Register file with overlapping 32/16/8-bit views.
//!
//! Each register is a single 32-bit slot. Narrower names select a bit span of
//! that slot; writes through a narrow view read-modify-write the slot so bits
//! outside the span are left untouched.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reg {
    Eax,
    Ebx,
    Ecx,
    Edx,
    Edi,
    Esi,
    Esp,
    Ebp,
    Eip,
    Eflags,
}

impl Reg {
    pub const ALL: [Reg; 10] = [
        Reg::Eax,
        Reg::Ebx,
        Reg::Ecx,
        Reg::Edx,
        Reg::Edi,
        Reg::Esi,
        Reg::Esp,
        Reg::Ebp,
        Reg::Eip,
        Reg::Eflags,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Reg::Eax => "EAX",
            Reg::Ebx => "EBX",
            Reg::Ecx => "ECX",
            Reg::Edx => "EDX",
            Reg::Edi => "EDI",
            Reg::Esi => "ESI",
            Reg::Esp => "ESP",
            Reg::Ebp => "EBP",
            Reg::Eip => "EIP",
            Reg::Eflags => "EFLAGS",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Which bit span of the backing slot a register name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Dword,    // bits 0..32
    Word,     // bits 0..16
    HighByte, // bits 8..16
    LowByte,  // bits 0..8
}

impl View {
    pub fn mask(self) -> u32 {
        match self {
            View::Dword => 0xFFFF_FFFF,
            View::Word => 0x0000_FFFF,
            View::HighByte | View::LowByte => 0x0000_00FF,
        }
    }

    pub fn shift(self) -> u32 {
        match self {
            View::HighByte => 8,
            _ => 0,
        }
    }

    pub fn width(self) -> u32 {
        match self {
            View::Dword => 32,
            View::Word => 16,
            View::HighByte | View::LowByte => 8,
        }
    }
}

/// A register name resolved to its backing slot and view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegRef {
    pub reg: Reg,
    pub view: View,
}

impl RegRef {
    pub const fn new(reg: Reg, view: View) -> Self {
        Self { reg, view }
    }

    /// Resolves a register spelling, case-insensitively. Returns `None` for
    /// anything that is not a register name.
    pub fn parse(name: &str) -> Option<Self> {
        use Reg::*;
        use View::*;
        let (reg, view) = match name.to_ascii_uppercase().as_str() {
            "EAX" => (Eax, Dword),
            "EBX" => (Ebx, Dword),
            "ECX" => (Ecx, Dword),
            "EDX" => (Edx, Dword),
            "EDI" => (Edi, Dword),
            "ESI" => (Esi, Dword),
            "ESP" => (Esp, Dword),
            "EBP" => (Ebp, Dword),
            "EIP" => (Eip, Dword),
            "EFLAGS" => (Eflags, Dword),

            "AX" => (Eax, Word),
            "BX" => (Ebx, Word),
            "CX" => (Ecx, Word),
            "DX" => (Edx, Word),
            "DI" => (Edi, Word),
            "SI" => (Esi, Word),
            "SP" => (Esp, Word),
            "BP" => (Ebp, Word),
            "IP" => (Eip, Word),
            "FLAGS" => (Eflags, Word),

            "AH" => (Eax, HighByte),
            "AL" => (Eax, LowByte),
            "BH" => (Ebx, HighByte),
            "BL" => (Ebx, LowByte),
            "CH" => (Ecx, HighByte),
            "CL" => (Ecx, LowByte),
            "DH" => (Edx, HighByte),
            "DL" => (Edx, LowByte),
            _ => return None,
        };
        Some(Self { reg, view })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    slots: [u32; 10],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full 32-bit contents of a slot.
    pub fn get(&self, reg: Reg) -> u32 {
        self.slots[reg.index()]
    }

    pub fn set(&mut self, reg: Reg, value: u32) {
        self.slots[reg.index()] = value;
    }

    /// Reads the view, zero-extended to 32 bits.
    pub fn read(&self, r: RegRef) -> u32 {
        (self.get(r.reg) >> r.view.shift()) & r.view.mask()
    }

    /// Writes `value` (truncated to the view's width) into the view's span,
    /// preserving every other bit of the slot.
    pub fn write(&mut self, r: RegRef, value: u32) {
        let span = r.view.mask() << r.view.shift();
        let old = self.get(r.reg);
        let new = (old & !span) | ((value & r.view.mask()) << r.view.shift());
        self.set(r.reg, new);
    }
}
