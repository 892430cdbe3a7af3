//! Machine-level function and instruction views handed to the encoder.

use bitflags::bitflags;

use crate::metadata::{DebugLoc, SubprogramRef};

/// Host identity of a compiled function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionRef(pub u32);

/// Assembler label handle. The object writer resolves these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub u32);

bitflags! {
    /// Per-instruction properties the encoder cares about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InstrFlags: u8 {
        /// Variable-location pseudo instruction; emits no code.
        const DEBUG_VALUE = 1 << 0;
        /// Part of the frame-setup prologue.
        const FRAME_SETUP = 1 << 1;
    }
}

/// One machine instruction, reduced to its debug-relevant parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MachineInstr {
    pub loc: Option<DebugLoc>,
    pub flags: InstrFlags,
}

impl MachineInstr {
    pub fn new(loc: Option<DebugLoc>) -> Self {
        Self {
            loc,
            flags: InstrFlags::empty(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: InstrFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_debug_value(&self) -> bool {
        self.flags.contains(InstrFlags::DEBUG_VALUE)
    }

    pub fn is_frame_setup(&self) -> bool {
        self.flags.contains(InstrFlags::FRAME_SETUP)
    }
}

/// A function as laid out by the code generator.
#[derive(Debug, Clone)]
pub struct MachineFunction<'a> {
    pub id: FunctionRef,
    /// Link name of the function symbol.
    pub link_name: &'a str,
    pub subprogram: Option<SubprogramRef>,
    /// Label at the first byte of the function.
    pub begin: Symbol,
    pub instrs: &'a [MachineInstr],
}

impl MachineFunction<'_> {
    /// Location that ends the prologue, if the prologue is non-empty.
    ///
    /// The first non-debug-value instruction that is not frame setup and has
    /// a location marks the end. The prologue counts as non-empty when any
    /// other real instruction came before it.
    pub fn prologue_end(&self) -> Option<DebugLoc> {
        let mut empty_prologue = true;
        for mi in self.instrs.iter().filter(|mi| !mi.is_debug_value()) {
            if !mi.is_frame_setup() {
                if let Some(loc) = mi.loc {
                    return (!empty_prologue).then_some(loc);
                }
            }
            empty_prologue = false;
        }
        None
    }
}

/// Strip the `\x01` "emit verbatim" marker some front ends prepend to
/// link names.
pub fn real_linkage_name(name: &str) -> &str {
    name.strip_prefix('\u{1}').unwrap_or(name)
}
