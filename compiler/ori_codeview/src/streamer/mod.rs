//! Boundary between the encoder and the object-file writer.
//!
//! The encoder produces fixed-layout bytes and a handful of symbol-relative
//! values it cannot compute itself (function size, section offsets). Line
//! tables, file checksums, and the string table are delegated wholesale to
//! the writer through the `emit_cv_*` methods.

mod recording;

pub use recording::{RecordingStreamer, Relocation, StreamEvent};

use crate::machine::Symbol;

/// COFF debug sections the encoder writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugSection {
    /// `.debug$S`: symbol subsections, line tables, checksums, strings.
    Symbols,
    /// `.debug$T`: type records.
    Types,
}

/// A value the object writer must fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixup {
    /// 4-byte distance from `begin` to `end`.
    CodeSize { begin: Symbol, end: Symbol },
    /// 4-byte section-relative offset of a symbol (`IMAGE_REL_*_SECREL`).
    SecRel32(Symbol),
    /// 2-byte section index of a symbol (`IMAGE_REL_*_SECTION`).
    SectionIndex(Symbol),
}

impl Fixup {
    /// Number of bytes the fixup occupies.
    pub fn size(self) -> usize {
        match self {
            Self::CodeSize { .. } | Self::SecRel32(_) => 4,
            Self::SectionIndex(_) => 2,
        }
    }
}

/// One line-table entry: `.cv_loc` in assembler terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvLocation {
    /// Function ID of the enclosing function or inline site.
    pub function_id: u32,
    pub file_id: u32,
    pub line: u32,
    pub column: u16,
    pub prologue_end: bool,
    pub is_stmt: bool,
}

/// Object-file writer as seen by the encoder.
pub trait CodeViewStreamer {
    fn switch_section(&mut self, section: DebugSection);

    fn emit_bytes(&mut self, bytes: &[u8]);

    fn emit_fixup(&mut self, fixup: Fixup);

    /// Attach a comment to the next emitted bytes. Ignored by default.
    fn add_comment(&mut self, comment: &str) {
        let _ = comment;
    }

    /// Register file `id` with its canonical path.
    ///
    /// Returns the number of files the writer now knows about, which must
    /// equal `id` for a well-behaved writer.
    fn emit_cv_file(&mut self, id: u32, path: &str) -> u32;

    fn emit_cv_loc(&mut self, loc: &CvLocation);

    /// Emit the line-table subsection for one function.
    fn emit_cv_linetable(&mut self, function_id: u32, begin: Symbol, end: Symbol);

    /// Emit the file-checksum subsection.
    fn emit_cv_file_checksums(&mut self);

    /// Emit the string-table subsection.
    fn emit_cv_string_table(&mut self);
}

impl<T: CodeViewStreamer + ?Sized> CodeViewStreamer for &mut T {
    fn switch_section(&mut self, section: DebugSection) {
        (**self).switch_section(section);
    }

    fn emit_bytes(&mut self, bytes: &[u8]) {
        (**self).emit_bytes(bytes);
    }

    fn emit_fixup(&mut self, fixup: Fixup) {
        (**self).emit_fixup(fixup);
    }

    fn add_comment(&mut self, comment: &str) {
        (**self).add_comment(comment);
    }

    fn emit_cv_file(&mut self, id: u32, path: &str) -> u32 {
        (**self).emit_cv_file(id, path)
    }

    fn emit_cv_loc(&mut self, loc: &CvLocation) {
        (**self).emit_cv_loc(loc);
    }

    fn emit_cv_linetable(&mut self, function_id: u32, begin: Symbol, end: Symbol) {
        (**self).emit_cv_linetable(function_id, begin, end);
    }

    fn emit_cv_file_checksums(&mut self) {
        (**self).emit_cv_file_checksums();
    }

    fn emit_cv_string_table(&mut self) {
        (**self).emit_cv_string_table();
    }
}
