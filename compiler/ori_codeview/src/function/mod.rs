//! Per-function encoder state and the location tracker.

use crate::error::CodeViewError;
use crate::file_table::FileTable;
use crate::inline_sites::InlineSiteMap;
use crate::machine::{FunctionRef, Symbol};
use crate::metadata::{DebugLoc, DebugMetadata};
use crate::streamer::{CodeViewStreamer, CvLocation};

/// Largest line number a line-table entry can hold (24 bits).
pub const MAX_LINE: u32 = 0x00FF_FFFF;
/// Reserved line number meaning "always step into".
pub const ALWAYS_STEP_INTO_LINE: u32 = 0x00FE_EFEE;
/// Reserved line number meaning "never step into".
pub const NEVER_STEP_INTO_LINE: u32 = 0x00F0_0F00;

/// Line and column of `loc` if the line table can represent them exactly.
fn encodable_position(loc: &DebugLoc) -> Option<(u32, u16)> {
    let line = loc.line;
    if line > MAX_LINE || line == ALWAYS_STEP_INTO_LINE || line == NEVER_STEP_INTO_LINE {
        return None;
    }
    let column = u16::try_from(loc.column).ok()?;
    Some((line, column))
}

/// What the encoder knows about one function.
#[derive(Debug)]
pub struct FunctionInfo {
    pub function: FunctionRef,
    /// Display name for the procedure record.
    pub name: String,
    pub func_id: u32,
    pub begin: Symbol,
    /// Set when the function ends.
    pub end: Option<Symbol>,
    pub have_line_info: bool,
    pub inline_sites: InlineSiteMap,
    last_loc: Option<DebugLoc>,
    last_file_id: u32,
}

impl FunctionInfo {
    pub fn new(function: FunctionRef, name: String, func_id: u32, begin: Symbol) -> Self {
        Self {
            function,
            name,
            func_id,
            begin,
            end: None,
            have_line_info: false,
            inline_sites: InlineSiteMap::new(),
            last_loc: None,
            last_file_id: 0,
        }
    }

    /// The last location that produced a line-table entry.
    pub fn last_loc(&self) -> Option<&DebugLoc> {
        self.last_loc.as_ref()
    }

    /// Emit a line-table entry for `loc` unless it adds nothing.
    ///
    /// Returns whether an entry was emitted. Repeats of the last location,
    /// scopeless locations, and lines or columns the format cannot hold are
    /// skipped without error.
    pub fn maybe_record_location<S: CodeViewStreamer + ?Sized>(
        &mut self,
        loc: &DebugLoc,
        metadata: &DebugMetadata,
        files: &mut FileTable,
        next_func_id: &mut u32,
        out: &mut S,
    ) -> Result<bool, CodeViewError> {
        if self.last_loc.as_ref() == Some(loc) {
            return Ok(false);
        }
        let Some(file) = metadata.loc_file(loc) else {
            tracing::trace!(line = loc.line, "skipping location without scope");
            return Ok(false);
        };
        let Some((line, column)) = encodable_position(loc) else {
            tracing::trace!(
                line = loc.line,
                column = loc.column,
                "skipping unencodable location"
            );
            return Ok(false);
        };

        let same_file = self
            .last_loc
            .as_ref()
            .is_some_and(|last| metadata.loc_file(last) == Some(file));
        let file_id = if same_file {
            self.last_file_id
        } else {
            files.register(file, metadata, out)?
        };

        let function_id = if loc.inlined_at.is_some() {
            self.inline_sites.record(loc, metadata, next_func_id)?
        } else {
            self.func_id
        };

        self.have_line_info = true;
        self.last_file_id = file_id;
        self.last_loc = Some(*loc);

        tracing::trace!(function_id, file_id, line, column, "recorded location");
        out.emit_cv_loc(&CvLocation {
            function_id,
            file_id,
            line,
            column,
            prologue_end: false,
            is_stmt: false,
        });
        Ok(true)
    }
}
