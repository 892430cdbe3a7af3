//! In-memory streamer that keeps section bytes and line-table events.

use rustc_hash::FxHashMap;

use super::{CodeViewStreamer, CvLocation, DebugSection, Fixup};
use crate::machine::Symbol;

/// A fixup the recording streamer could not resolve itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub section: DebugSection,
    /// Byte offset of the placeholder within the section.
    pub offset: usize,
    pub fixup: Fixup,
}

/// Everything sent to the streamer that is not raw section bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    File { id: u32, path: String },
    Loc(CvLocation),
    LineTable {
        function_id: u32,
        begin: Symbol,
        end: Symbol,
    },
    FileChecksums,
    StringTable,
}

/// Streamer that records output instead of writing an object file.
///
/// `CodeSize` fixups are resolved when both symbols were given an offset
/// with [`define_symbol`](Self::define_symbol); every other fixup is left as
/// zero bytes plus a [`Relocation`].
#[derive(Debug)]
pub struct RecordingStreamer {
    section: DebugSection,
    symbols_section: Vec<u8>,
    types_section: Vec<u8>,
    relocations: Vec<Relocation>,
    symbol_offsets: FxHashMap<Symbol, u32>,
    events: Vec<StreamEvent>,
    comments: Vec<String>,
    file_count: u32,
}

impl Default for RecordingStreamer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingStreamer {
    pub fn new() -> Self {
        Self {
            section: DebugSection::Symbols,
            symbols_section: Vec::new(),
            types_section: Vec::new(),
            relocations: Vec::new(),
            symbol_offsets: FxHashMap::default(),
            events: Vec::new(),
            comments: Vec::new(),
            file_count: 0,
        }
    }

    /// Give `symbol` a code offset so `CodeSize` fixups can be resolved.
    pub fn define_symbol(&mut self, symbol: Symbol, offset: u32) {
        self.symbol_offsets.insert(symbol, offset);
    }

    pub fn section_bytes(&self, section: DebugSection) -> &[u8] {
        match section {
            DebugSection::Symbols => &self.symbols_section,
            DebugSection::Types => &self.types_section,
        }
    }

    pub fn relocations(&self) -> &[Relocation] {
        &self.relocations
    }

    pub fn events(&self) -> &[StreamEvent] {
        &self.events
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Line-table entries, in emission order.
    pub fn locations(&self) -> impl Iterator<Item = &CvLocation> {
        self.events.iter().filter_map(|event| match event {
            StreamEvent::Loc(loc) => Some(loc),
            _ => None,
        })
    }

    /// Registered files as `(id, path)`, in registration order.
    pub fn files(&self) -> impl Iterator<Item = (u32, &str)> {
        self.events.iter().filter_map(|event| match event {
            StreamEvent::File { id, path } => Some((*id, path.as_str())),
            _ => None,
        })
    }

    fn current(&mut self) -> &mut Vec<u8> {
        match self.section {
            DebugSection::Symbols => &mut self.symbols_section,
            DebugSection::Types => &mut self.types_section,
        }
    }

    fn resolve(&self, fixup: Fixup) -> Option<u32> {
        match fixup {
            Fixup::CodeSize { begin, end } => {
                let begin = self.symbol_offsets.get(&begin)?;
                let end = self.symbol_offsets.get(&end)?;
                end.checked_sub(*begin)
            }
            Fixup::SecRel32(_) | Fixup::SectionIndex(_) => None,
        }
    }
}

impl CodeViewStreamer for RecordingStreamer {
    fn switch_section(&mut self, section: DebugSection) {
        self.section = section;
    }

    fn emit_bytes(&mut self, bytes: &[u8]) {
        self.current().extend_from_slice(bytes);
    }

    fn emit_fixup(&mut self, fixup: Fixup) {
        if let Some(value) = self.resolve(fixup) {
            // Only 4-byte fixups resolve.
            self.current().extend_from_slice(&value.to_le_bytes());
            return;
        }
        let section = self.section;
        let buf = self.current();
        let offset = buf.len();
        buf.resize(offset + fixup.size(), 0);
        self.relocations.push(Relocation {
            section,
            offset,
            fixup,
        });
    }

    fn add_comment(&mut self, comment: &str) {
        self.comments.push(comment.to_owned());
    }

    fn emit_cv_file(&mut self, id: u32, path: &str) -> u32 {
        self.file_count += 1;
        self.events.push(StreamEvent::File {
            id,
            path: path.to_owned(),
        });
        self.file_count
    }

    fn emit_cv_loc(&mut self, loc: &CvLocation) {
        self.events.push(StreamEvent::Loc(*loc));
    }

    fn emit_cv_linetable(&mut self, function_id: u32, begin: Symbol, end: Symbol) {
        self.events.push(StreamEvent::LineTable {
            function_id,
            begin,
            end,
        });
    }

    fn emit_cv_file_checksums(&mut self) {
        self.events.push(StreamEvent::FileChecksums);
    }

    fn emit_cv_string_table(&mut self) {
        // The string table closes the module; file numbering restarts.
        self.file_count = 0;
        self.events.push(StreamEvent::StringTable);
    }
}
