//! `CodeView` record layouts and the framing shared by all of them.
//!
//! Every type and symbol record is `u16 length, u16 kind, body`, where the
//! length counts the kind and the body but not itself. Multi-byte values are
//! little-endian. [`RecordWriter`] owns that framing; the record enums only
//! know their kind and body.

use crate::machine::Symbol;
use crate::streamer::{CodeViewStreamer, Fixup};

/// First four bytes of `.debug$S` and `.debug$T`.
pub const DEBUG_SECTION_MAGIC: u32 = 4;

/// Largest record length a reader accepts.
pub const MAX_RECORD_LENGTH: usize = 0xFF00;

// Type leaf kinds.
pub const LF_PROCEDURE: u16 = 0x1008;
pub const LF_ARGLIST: u16 = 0x1201;
pub const LF_FUNC_ID: u16 = 0x1601;

// Symbol record kinds.
pub const S_GPROC32_ID: u16 = 0x1147;
pub const S_INLINESITE: u16 = 0x114D;
pub const S_INLINESITE_END: u16 = 0x114E;
pub const S_PROC_ID_END: u16 = 0x114F;

/// `.debug$S` subsection kind holding symbol records. Line, checksum and
/// string-table subsections come from the object writer.
pub const DEBUG_S_SYMBOLS: u32 = 0xF1;

/// Index into the type table, or one of the reserved simple types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(pub u32);

impl TypeIndex {
    /// "No type".
    pub const NONE: TypeIndex = TypeIndex(0);
    /// Simple type `void`.
    pub const VOID: TypeIndex = TypeIndex(0x0003);
    /// Indices below this are simple types; records start here.
    pub const FIRST_NON_SIMPLE: u32 = 0x1000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CallingConvention {
    NearC = 0x00,
}

/// Records in `.debug$T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRecord<'a> {
    ArgList {
        args: &'a [TypeIndex],
    },
    Procedure {
        return_type: TypeIndex,
        calling_conv: CallingConvention,
        options: u8,
        param_count: u16,
        arg_list: TypeIndex,
    },
    FuncId {
        parent_scope: TypeIndex,
        function_type: TypeIndex,
        name: &'a str,
    },
}

impl TypeRecord<'_> {
    pub fn kind(&self) -> u16 {
        match self {
            Self::ArgList { .. } => LF_ARGLIST,
            Self::Procedure { .. } => LF_PROCEDURE,
            Self::FuncId { .. } => LF_FUNC_ID,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "an argument list fits in one record, far below u32::MAX entries"
    )]
    fn write_body(&self, w: &mut RecordWriter) {
        match *self {
            Self::ArgList { args } => {
                debug_assert!(args.len() * 4 + 8 <= MAX_RECORD_LENGTH);
                w.u32(args.len() as u32);
                for &arg in args {
                    w.type_index(arg);
                }
            }
            Self::Procedure {
                return_type,
                calling_conv,
                options,
                param_count,
                arg_list,
            } => {
                w.type_index(return_type);
                w.u8(calling_conv as u8);
                w.u8(options);
                w.u16(param_count);
                w.type_index(arg_list);
            }
            Self::FuncId {
                parent_scope,
                function_type,
                name,
            } => {
                w.type_index(parent_scope);
                w.type_index(function_type);
                w.name(name, 2 + 8);
            }
        }
    }
}

/// Records in a symbol subsection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRecord<'a> {
    /// Opens a global procedure. The body is mostly zeroes; the code size
    /// and the section-relative address are left to the object writer.
    ProcStart {
        begin: Symbol,
        end: Symbol,
        name: &'a str,
    },
    /// Opens an inlined call site of `inlinee` (a function-ID index).
    InlineSite { inlinee: TypeIndex },
    InlineSiteEnd,
    ProcIdEnd,
}

impl SymbolRecord<'_> {
    pub fn kind(&self) -> u16 {
        match self {
            Self::ProcStart { .. } => S_GPROC32_ID,
            Self::InlineSite { .. } => S_INLINESITE,
            Self::InlineSiteEnd => S_INLINESITE_END,
            Self::ProcIdEnd => S_PROC_ID_END,
        }
    }

    fn write_body(&self, w: &mut RecordWriter) {
        match *self {
            Self::ProcStart { begin, end, name } => {
                // Parent, end, next pointers: filled in by the linker.
                w.fill(12);
                w.fixup(Fixup::CodeSize { begin, end });
                // Debug start/end offsets and the type index are unused.
                w.fill(12);
                w.fixup(Fixup::SecRel32(begin));
                w.fixup(Fixup::SectionIndex(begin));
                // Flags.
                w.u8(0);
                w.name(name, 2 + 12 + 4 + 12 + 4 + 2 + 1);
            }
            Self::InlineSite { inlinee } => {
                // Parent and end pointers.
                w.u32(0);
                w.u32(0);
                w.type_index(inlinee);
            }
            Self::InlineSiteEnd | Self::ProcIdEnd => {}
        }
    }
}

/// Byte buffer for a run of records, with symbol fixups kept aside.
///
/// Fixups reserve zeroed bytes in the buffer so record lengths come out
/// right; [`flush_to`](Self::flush_to) hands them to the streamer in place.
#[derive(Debug, Default)]
pub struct RecordWriter {
    bytes: Vec<u8>,
    fixups: Vec<(usize, Fixup)>,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw bytes, with zeroes where fixups go.
    #[cfg(test)]
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[cfg(test)]
    pub(crate) fn fixups(&self) -> &[(usize, Fixup)] {
        &self.fixups
    }

    pub fn u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn type_index(&mut self, index: TypeIndex) {
        self.u32(index.0);
    }

    pub fn fill(&mut self, count: usize) {
        self.bytes.resize(self.bytes.len() + count, 0);
    }

    pub fn fixup(&mut self, fixup: Fixup) {
        self.fixups.push((self.bytes.len(), fixup));
        self.fill(fixup.size());
    }

    /// Write a NUL-terminated name, truncated so a record whose other parts
    /// take `fixed_len` bytes stays within [`MAX_RECORD_LENGTH`].
    fn name(&mut self, name: &str, fixed_len: usize) {
        let max = MAX_RECORD_LENGTH - fixed_len - 1;
        let mut end = name.len().min(max);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        self.bytes.extend_from_slice(&name.as_bytes()[..end]);
        self.u8(0);
    }

    /// Zero-pad to a multiple of `align` bytes.
    pub fn pad_to(&mut self, align: usize) {
        let rem = self.bytes.len() % align;
        if rem != 0 {
            self.fill(align - rem);
        }
    }

    /// Frame `body` as one record of `kind`.
    ///
    /// Bodies stay within [`MAX_RECORD_LENGTH`]: names are truncated to fit
    /// and every other field has a fixed size.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "record length is bounded by MAX_RECORD_LENGTH < u16::MAX"
    )]
    pub fn write_framed(&mut self, kind: u16, body: impl FnOnce(&mut Self)) {
        let start = self.bytes.len();
        self.u16(0);
        self.u16(kind);
        body(self);
        let len = self.bytes.len() - start - 2;
        debug_assert!(len <= MAX_RECORD_LENGTH, "record of {len} bytes");
        self.bytes[start..start + 2].copy_from_slice(&(len as u16).to_le_bytes());
    }

    pub fn write_type(&mut self, record: &TypeRecord<'_>) {
        self.write_framed(record.kind(), |w| record.write_body(w));
    }

    pub fn write_symbol(&mut self, record: &SymbolRecord<'_>) {
        self.write_framed(record.kind(), |w| record.write_body(w));
    }

    /// Send the buffer to the streamer, replacing placeholders with fixups.
    pub fn flush_to<S: CodeViewStreamer + ?Sized>(&self, out: &mut S) {
        let mut pos = 0;
        for &(offset, fixup) in &self.fixups {
            if offset > pos {
                out.emit_bytes(&self.bytes[pos..offset]);
            }
            out.emit_fixup(fixup);
            pos = offset + fixup.size();
        }
        if pos < self.bytes.len() {
            out.emit_bytes(&self.bytes[pos..]);
        }
    }
}

#[cfg(test)]
mod tests;
