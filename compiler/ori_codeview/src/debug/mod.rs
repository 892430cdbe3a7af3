//! Module-level `CodeView` encoder.
//!
//! [`CodeViewDebug`] owns everything that lives for one module: the file
//! table, the type table, function-ID allocation, and the finished
//! functions waiting to be written. The code generator drives it:
//!
//! ```text
//! begin_function ─▶ (begin_instruction, end_instruction)* ─▶ end_function
//!        ▲                                                       │
//!        └───────────────────────────────────────────────────────┘
//!                                              end_module ─▶ bytes
//! ```
//!
//! Nothing is written to the debug sections until `end_module`; the type
//! section goes first so inline-site records can reference function IDs.

use rustc_hash::FxHashSet;

use crate::error::CodeViewError;
use crate::file_table::FileTable;
use crate::function::FunctionInfo;
use crate::machine::{real_linkage_name, FunctionRef, MachineFunction, MachineInstr, Symbol};
use crate::metadata::{DebugLoc, DebugMetadata};
use crate::records::DEBUG_SECTION_MAGIC;
use crate::streamer::{CodeViewStreamer, DebugSection};
use crate::symbols;
use crate::type_table::TypeTable;

/// Where the encoder is in the module lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// No module in progress.
    Idle,
    /// Tables live, no function active.
    ModuleOpen,
    /// Tables live, one function receiving locations.
    FunctionActive,
    /// Sections being written.
    Closing,
}

/// `CodeView` encoder for one module at a time.
pub struct CodeViewDebug<'m, S: CodeViewStreamer> {
    metadata: &'m DebugMetadata,
    out: S,
    /// Send assembler comments along with the records.
    emit_comments: bool,
    state: ModuleState,
    files: FileTable,
    types: TypeTable,
    next_func_id: u32,
    current: Option<FunctionInfo>,
    /// Functions with line info, in the order they ended.
    functions: Vec<FunctionInfo>,
    finished: FxHashSet<FunctionRef>,
    prev_inst_loc: Option<DebugLoc>,
}

impl<'m, S: CodeViewStreamer> CodeViewDebug<'m, S> {
    /// Create an encoder.
    ///
    /// Returns `None` when the module carries no compile unit, in which case
    /// the code generator should skip debug-info callbacks entirely.
    #[must_use]
    pub fn new(metadata: &'m DebugMetadata, out: S) -> Option<Self> {
        if metadata.compile_units().is_empty() {
            tracing::debug!("no compile unit, CodeView emission disabled");
            return None;
        }

        Some(Self {
            metadata,
            out,
            emit_comments: false,
            state: ModuleState::Idle,
            files: FileTable::new(),
            types: TypeTable::new(),
            next_func_id: 0,
            current: None,
            functions: Vec::new(),
            finished: FxHashSet::default(),
            prev_inst_loc: None,
        })
    }

    /// Send assembler comments ("Symbol subsection for ...") to the
    /// streamer. Only useful when the streamer prints assembly.
    #[must_use]
    pub fn with_comments(mut self, emit_comments: bool) -> Self {
        self.emit_comments = emit_comments;
        self
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn streamer(&self) -> &S {
        &self.out
    }

    pub fn into_streamer(self) -> S {
        self.out
    }

    /// Functions kept for emission so far.
    pub fn pending_functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions.iter()
    }

    /// The function currently receiving locations.
    pub fn current_function(&self) -> Option<&FunctionInfo> {
        self.current.as_ref()
    }

    /// Start tracking `mf`.
    ///
    /// If the function has a non-empty prologue, the function-start location
    /// is recorded before any instruction.
    #[tracing::instrument(level = "debug", skip(self, mf), fields(function = ?mf.id))]
    pub fn begin_function(&mut self, mf: &MachineFunction<'_>) -> Result<(), CodeViewError> {
        if let Some(active) = &self.current {
            return Err(CodeViewError::FunctionAlreadyActive {
                active: active.function,
                requested: mf.id,
            });
        }
        if self.finished.contains(&mf.id) {
            return Err(CodeViewError::DuplicateFunction(mf.id));
        }

        let name = mf
            .subprogram
            .map(|sp| self.metadata.subprogram(sp).name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| real_linkage_name(mf.link_name))
            .to_owned();

        let func_id = self.next_func_id;
        self.next_func_id += 1;
        tracing::debug!(func_id, name = %name, "begin function");

        let mut info = FunctionInfo::new(mf.id, name, func_id, mf.begin);
        self.prev_inst_loc = None;

        let start = mf
            .prologue_end()
            .and_then(|loc| self.metadata.fn_start_loc(&loc));
        if let Some(start) = start {
            info.maybe_record_location(
                &start,
                self.metadata,
                &mut self.files,
                &mut self.next_func_id,
                &mut self.out,
            )?;
        }

        if self.state == ModuleState::Idle {
            tracing::debug!("opening CodeView module");
        }
        self.current = Some(info);
        self.state = ModuleState::FunctionActive;
        Ok(())
    }

    /// Record the location of an instruction about to be emitted.
    pub fn begin_instruction(&mut self, mi: &MachineInstr) -> Result<(), CodeViewError> {
        let Some(info) = self.current.as_mut() else {
            return Err(CodeViewError::NoActiveFunction);
        };
        if mi.is_debug_value() || mi.is_frame_setup() {
            return Ok(());
        }
        let Some(loc) = mi.loc else {
            return Ok(());
        };
        if self.prev_inst_loc == Some(loc) {
            return Ok(());
        }

        info.maybe_record_location(
            &loc,
            self.metadata,
            &mut self.files,
            &mut self.next_func_id,
            &mut self.out,
        )?;
        Ok(())
    }

    /// Note the location of the instruction just emitted.
    pub fn end_instruction(&mut self, mi: &MachineInstr) -> Result<(), CodeViewError> {
        if self.current.is_none() {
            return Err(CodeViewError::NoActiveFunction);
        }
        if !mi.is_debug_value() {
            self.prev_inst_loc = mi.loc;
        }
        Ok(())
    }

    /// Finish `mf`, whose code ends at `end`.
    ///
    /// A function that never produced a line-table entry is dropped.
    #[tracing::instrument(level = "debug", skip(self, mf), fields(function = ?mf.id))]
    pub fn end_function(
        &mut self,
        mf: &MachineFunction<'_>,
        end: Symbol,
    ) -> Result<(), CodeViewError> {
        let Some(mut info) = self.current.take() else {
            return Err(CodeViewError::NoActiveFunction);
        };
        if info.function != mf.id {
            let active = info.function;
            self.current = Some(info);
            return Err(CodeViewError::FunctionMismatch {
                active,
                requested: mf.id,
            });
        }
        self.state = ModuleState::ModuleOpen;
        self.prev_inst_loc = None;

        if !info.have_line_info {
            tracing::debug!("no line info, dropping function");
            return Ok(());
        }

        tracing::debug!(inline_sites = info.inline_sites.len(), "end function");
        info.end = Some(end);
        self.finished.insert(info.function);
        self.functions.push(info);
        Ok(())
    }

    /// Write the type section, then `.debug$S`, then reset for the next
    /// module.
    ///
    /// A module without any function carrying line info writes nothing.
    /// The encoder is reset even when emission fails; whatever reached the
    /// streamer by then is incomplete and must be discarded.
    #[tracing::instrument(level = "debug", skip_all, fields(functions = self.functions.len()))]
    pub fn end_module(&mut self) -> Result<(), CodeViewError> {
        if let Some(active) = &self.current {
            return Err(CodeViewError::FunctionStillActive(active.function));
        }
        if self.functions.is_empty() {
            self.clear();
            return Ok(());
        }

        self.state = ModuleState::Closing;
        let result = self.emit_module();
        self.clear();
        result
    }

    fn emit_module(&mut self) -> Result<(), CodeViewError> {
        tracing::debug!(files = self.files.len(), "emitting CodeView module");

        self.types.emit(self.metadata, &mut self.out);

        self.out.switch_section(DebugSection::Symbols);
        self.out.emit_bytes(&DEBUG_SECTION_MAGIC.to_le_bytes());

        for info in &self.functions {
            symbols::emit_function(
                info,
                self.metadata,
                &self.types,
                self.emit_comments,
                &mut self.out,
            )?;
        }

        if self.emit_comments {
            self.out
                .add_comment("File index to string table offset subsection");
        }
        self.out.emit_cv_file_checksums();

        if self.emit_comments {
            self.out.add_comment("String table");
        }
        self.out.emit_cv_string_table();
        Ok(())
    }

    /// Drop all module state.
    fn clear(&mut self) {
        self.files.clear();
        self.types.clear();
        self.next_func_id = 0;
        self.current = None;
        self.functions.clear();
        self.finished.clear();
        self.prev_inst_loc = None;
        self.state = ModuleState::Idle;
    }
}
