//! Debug metadata supplied by the compiler front end.
//!
//! This is the read side of the compiler's debug-info graph: files,
//! subprograms, lexical scopes, compile units, and the interned chain of
//! inlined-at call-site locations. The encoder never mutates it.
//!
//! Handles are plain indices into [`DebugMetadata`]. Inlined-at locations are
//! interned by content, so two equal call sites always share one [`LocRef`].

use rustc_hash::FxHashMap;

macro_rules! define_ref {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Raw arena index.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            #[allow(
                clippy::cast_possible_truncation,
                reason = "a COFF object cannot describe 2^32 files, scopes or locations"
            )]
            fn from_len(len: usize) -> Self {
                debug_assert!(u32::try_from(len).is_ok(), "{} arena overflow", stringify!($name));
                Self(len as u32)
            }
        }
    };
}

define_ref!(
    /// Handle to a source file.
    FileRef
);
define_ref!(
    /// Handle to a subprogram (source-level function).
    SubprogramRef
);
define_ref!(
    /// Handle to a lexical scope.
    ScopeRef
);
define_ref!(
    /// Handle to an interned inlined-at location.
    LocRef
);

/// A source file as recorded by the front end: a directory and a
/// (possibly relative) filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiFile {
    pub directory: String,
    pub filename: String,
}

/// A source-level function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiSubprogram {
    /// Name as written in source. May be empty.
    pub name: String,
    /// Mangled link name.
    pub linkage_name: String,
    pub file: FileRef,
    /// Line of the opening brace; used for the function-start location.
    pub scope_line: u32,
    /// The scope this subprogram introduces.
    pub scope: ScopeRef,
}

impl DiSubprogram {
    /// The name shown by debuggers, falling back to the linkage name.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.linkage_name
        } else {
            &self.name
        }
    }
}

/// What a scope is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Subprogram(SubprogramRef),
    LexicalBlock { parent: ScopeRef },
}

#[derive(Debug, Clone, Copy)]
struct ScopeData {
    kind: ScopeKind,
    file: FileRef,
}

/// A source location attached to an instruction.
///
/// Locations compare by value: same line, column, scope, and inlined-at
/// chain. Because the chain is interned, comparing `inlined_at` handles
/// compares the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebugLoc {
    pub line: u32,
    pub column: u32,
    /// Lexical scope. Locations without one carry no debug value.
    pub scope: Option<ScopeRef>,
    /// The call site this location was inlined into, if any.
    pub inlined_at: Option<LocRef>,
}

impl DebugLoc {
    /// A location in `scope` that was not inlined.
    pub fn new(line: u32, column: u32, scope: ScopeRef) -> Self {
        Self {
            line,
            column,
            scope: Some(scope),
            inlined_at: None,
        }
    }

    /// The same location, inlined at `call_site`.
    #[must_use]
    pub fn inlined_at(mut self, call_site: LocRef) -> Self {
        self.inlined_at = Some(call_site);
        self
    }
}

/// A compile unit and the subprograms it declares, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileUnit {
    pub subprograms: Vec<SubprogramRef>,
}

/// Arena of debug metadata for one module.
#[derive(Debug, Default)]
pub struct DebugMetadata {
    files: Vec<DiFile>,
    subprograms: Vec<DiSubprogram>,
    scopes: Vec<ScopeData>,
    locations: Vec<DebugLoc>,
    location_map: FxHashMap<DebugLoc, LocRef>,
    compile_units: Vec<CompileUnit>,
}

impl DebugMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Construction --

    pub fn add_file(&mut self, directory: impl Into<String>, filename: impl Into<String>) -> FileRef {
        let id = FileRef::from_len(self.files.len());
        self.files.push(DiFile {
            directory: directory.into(),
            filename: filename.into(),
        });
        id
    }

    /// Add a subprogram together with the scope it introduces.
    pub fn add_subprogram(
        &mut self,
        name: impl Into<String>,
        linkage_name: impl Into<String>,
        file: FileRef,
        scope_line: u32,
    ) -> SubprogramRef {
        let id = SubprogramRef::from_len(self.subprograms.len());
        let scope = ScopeRef::from_len(self.scopes.len());
        self.scopes.push(ScopeData {
            kind: ScopeKind::Subprogram(id),
            file,
        });
        self.subprograms.push(DiSubprogram {
            name: name.into(),
            linkage_name: linkage_name.into(),
            file,
            scope_line,
            scope,
        });
        id
    }

    pub fn add_lexical_block(&mut self, parent: ScopeRef, file: FileRef) -> ScopeRef {
        let id = ScopeRef::from_len(self.scopes.len());
        self.scopes.push(ScopeData {
            kind: ScopeKind::LexicalBlock { parent },
            file,
        });
        id
    }

    /// Intern a location so it can serve as an inlined-at call site.
    pub fn intern_location(&mut self, loc: DebugLoc) -> LocRef {
        if let Some(&id) = self.location_map.get(&loc) {
            return id;
        }
        let id = LocRef::from_len(self.locations.len());
        self.locations.push(loc);
        self.location_map.insert(loc, id);
        id
    }

    pub fn add_compile_unit(&mut self, subprograms: Vec<SubprogramRef>) {
        self.compile_units.push(CompileUnit { subprograms });
    }

    // -- Queries --

    pub fn file(&self, file: FileRef) -> &DiFile {
        &self.files[file.index()]
    }

    pub fn subprogram(&self, sp: SubprogramRef) -> &DiSubprogram {
        &self.subprograms[sp.index()]
    }

    pub fn scope_kind(&self, scope: ScopeRef) -> ScopeKind {
        self.scopes[scope.index()].kind
    }

    pub fn scope_file(&self, scope: ScopeRef) -> FileRef {
        self.scopes[scope.index()].file
    }

    /// Walk lexical blocks outward to the enclosing subprogram.
    pub fn scope_subprogram(&self, mut scope: ScopeRef) -> SubprogramRef {
        loop {
            match self.scope_kind(scope) {
                ScopeKind::Subprogram(sp) => return sp,
                ScopeKind::LexicalBlock { parent } => scope = parent,
            }
        }
    }

    pub fn location(&self, loc: LocRef) -> &DebugLoc {
        &self.locations[loc.index()]
    }

    /// File of a location, taken from its scope.
    pub fn loc_file(&self, loc: &DebugLoc) -> Option<FileRef> {
        loc.scope.map(|scope| self.scope_file(scope))
    }

    pub fn compile_units(&self) -> &[CompileUnit] {
        &self.compile_units
    }

    /// The location a debugger should stop at when entering the function
    /// that (after inlining) contains `loc`.
    ///
    /// Walks the inlined-at chain to the outermost call site, whose scope
    /// belongs to the function actually being compiled, and returns the
    /// scope line of that subprogram with column 0.
    pub fn fn_start_loc(&self, loc: &DebugLoc) -> Option<DebugLoc> {
        let mut outer = *loc;
        while let Some(at) = outer.inlined_at {
            outer = *self.location(at);
        }
        let sp = self.subprogram(self.scope_subprogram(outer.scope?));
        Some(DebugLoc::new(sp.scope_line, 0, sp.scope))
    }
}
