//! `CodeView` debug info encoder for Ori's COFF output.
//!
//! Turns the compiler's debug metadata (source locations, inlining chains,
//! subprograms) into the `.debug$S` and `.debug$T` sections that Windows
//! debuggers read. The object writer itself sits behind
//! [`CodeViewStreamer`]; this crate decides *what* to write.
//!
//! # Debug Environment Variables
//!
//! - `RUST_LOG=ori_codeview=debug`: function and module lifecycle events.
//! - `RUST_LOG=ori_codeview=trace`: every recorded or skipped location,
//!   new files, and new inline sites.
//!
//! # Architecture
//!
//! - **Metadata** (`metadata`, `machine`): read-only view of the compiler's
//!   debug graph and machine functions
//! - **Paths / files** (`path`, `file_table`): canonical paths and dense
//!   file IDs
//! - **Per function** (`function`, `inline_sites`): line-table filtering
//!   and the inline call-site tree
//! - **Records** (`records`, `type_table`, `symbols`): byte layout
//! - **Driver** (`debug`): [`CodeViewDebug`], which owns module state
//!
//! # Example
//!
//! ```ignore
//! use ori_codeview::{CodeViewDebug, RecordingStreamer};
//!
//! // The host only builds an encoder for targets that use CodeView.
//! let Some(mut cv) = CodeViewDebug::new(&metadata, RecordingStreamer::new()) else {
//!     return Ok(());
//! };
//!
//! cv.begin_function(&mf)?;
//! for mi in mf.instrs {
//!     cv.begin_instruction(mi)?;
//!     cv.end_instruction(mi)?;
//! }
//! cv.end_function(&mf, end_symbol)?;
//! cv.end_module()?;
//! ```

pub mod debug;
pub mod error;
pub mod file_table;
pub mod function;
pub mod inline_sites;
pub mod machine;
pub mod metadata;
pub mod path;
pub mod records;
pub mod streamer;
pub mod symbols;
pub mod type_table;

pub use debug::{CodeViewDebug, ModuleState};
pub use error::CodeViewError;
pub use machine::{FunctionRef, InstrFlags, MachineFunction, MachineInstr, Symbol};
pub use metadata::{DebugLoc, DebugMetadata, FileRef, LocRef, ScopeRef, SubprogramRef};
pub use path::{canonicalize_path, full_path};
pub use streamer::{
    CodeViewStreamer, CvLocation, DebugSection, Fixup, RecordingStreamer, StreamEvent,
};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
