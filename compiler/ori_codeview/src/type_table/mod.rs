//! `.debug$T` contents: the shared `void()` signature and one function-ID
//! record per subprogram.
//!
//! Line tables only need function IDs for inline call-site frames, so every
//! subprogram gets the same parameterless `void` procedure type.

use rustc_hash::FxHashMap;

use crate::error::CodeViewError;
use crate::metadata::{DebugMetadata, SubprogramRef};
use crate::records::{
    CallingConvention, RecordWriter, TypeIndex, TypeRecord, DEBUG_SECTION_MAGIC,
};
use crate::streamer::{CodeViewStreamer, DebugSection};

/// Type-table index allocation and the subprogram → function-ID map.
#[derive(Debug)]
pub struct TypeTable {
    next_index: u32,
    func_ids: FxHashMap<SubprogramRef, TypeIndex>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        Self {
            next_index: TypeIndex::FIRST_NON_SIMPLE,
            func_ids: FxHashMap::default(),
        }
    }

    fn next_type_index(&mut self) -> TypeIndex {
        let index = TypeIndex(self.next_index);
        self.next_index += 1;
        index
    }

    /// Number of records emitted so far.
    pub fn len(&self) -> usize {
        (self.next_index - TypeIndex::FIRST_NON_SIMPLE) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Function-ID record of `sp`, if one was emitted.
    pub fn func_id(&self, sp: SubprogramRef) -> Option<TypeIndex> {
        self.func_ids.get(&sp).copied()
    }

    /// Function-ID record of an inlinee; missing records are a contract
    /// violation since every inlinee must be declared by some compile unit.
    pub fn inlinee_func_id(&self, sp: SubprogramRef) -> Result<TypeIndex, CodeViewError> {
        self.func_id(sp).ok_or(CodeViewError::UnknownInlinee(sp))
    }

    /// Write the whole type section.
    ///
    /// Subprograms are visited compile unit by compile unit, in declaration
    /// order, so indices are reproducible for a fixed input. A subprogram
    /// listed twice keeps its first record.
    pub fn emit<S: CodeViewStreamer + ?Sized>(&mut self, metadata: &DebugMetadata, out: &mut S) {
        out.switch_section(DebugSection::Types);
        out.emit_bytes(&DEBUG_SECTION_MAGIC.to_le_bytes());

        if metadata.compile_units().is_empty() {
            return;
        }

        let mut w = RecordWriter::new();

        let arg_list = self.next_type_index();
        w.write_type(&TypeRecord::ArgList { args: &[] });

        let void_proc = self.next_type_index();
        w.write_type(&TypeRecord::Procedure {
            return_type: TypeIndex::VOID,
            calling_conv: CallingConvention::NearC,
            options: 0,
            param_count: 0,
            arg_list,
        });

        for cu in metadata.compile_units() {
            for &sp in &cu.subprograms {
                if self.func_ids.contains_key(&sp) {
                    continue;
                }
                w.write_type(&TypeRecord::FuncId {
                    parent_scope: TypeIndex::NONE,
                    function_type: void_proc,
                    name: metadata.subprogram(sp).display_name(),
                });
                let index = self.next_type_index();
                self.func_ids.insert(sp, index);
            }
        }

        tracing::debug!(records = self.len(), "emitted type information");
        w.flush_to(out);
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
