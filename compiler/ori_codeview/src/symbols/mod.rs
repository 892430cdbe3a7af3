//! Per-function symbol subsections.
//!
//! Each function becomes one `Symbols` subsection:
//!
//! ```text
//! S_GPROC32_ID name
//!   S_INLINESITE callee        (pre-order, children before the close)
//!     S_INLINESITE nested
//!     S_INLINESITE_END
//!   S_INLINESITE_END
//! S_PROC_ID_END
//! ```
//!
//! followed by the function's line table.

use crate::error::CodeViewError;
use crate::function::FunctionInfo;
use crate::inline_sites::InlineSite;
use crate::metadata::DebugMetadata;
use crate::records::{RecordWriter, SymbolRecord, DEBUG_S_SYMBOLS};
use crate::streamer::CodeViewStreamer;
use crate::type_table::TypeTable;

/// Emit the symbol subsection and line table for one finished function.
pub fn emit_function<S: CodeViewStreamer + ?Sized>(
    info: &FunctionInfo,
    metadata: &DebugMetadata,
    types: &TypeTable,
    emit_comments: bool,
    out: &mut S,
) -> Result<(), CodeViewError> {
    let end = info
        .end
        .ok_or(CodeViewError::MissingFunctionEnd(info.function))?;

    let mut w = RecordWriter::new();
    w.write_symbol(&SymbolRecord::ProcStart {
        begin: info.begin,
        end,
        name: &info.name,
    });
    for (_, site) in info.inline_sites.top_level(metadata) {
        emit_inline_site(info, site, types, &mut w)?;
    }
    w.write_symbol(&SymbolRecord::ProcIdEnd);

    if emit_comments {
        out.add_comment(&format!("Symbol subsection for {}", info.name));
    }
    let payload_len = subsection_len(info, w.len())?;
    out.emit_bytes(&DEBUG_S_SYMBOLS.to_le_bytes());
    out.emit_bytes(&payload_len.to_le_bytes());
    w.pad_to(4);
    w.flush_to(out);

    out.emit_cv_linetable(info.func_id, info.begin, end);
    Ok(())
}

/// Subsection lengths are 32-bit.
fn subsection_len(info: &FunctionInfo, len: usize) -> Result<u32, CodeViewError> {
    u32::try_from(len).map_err(|_| CodeViewError::SubsectionTooLarge(info.function))
}

/// Open `site`, emit its children depth-first, then close it.
fn emit_inline_site(
    info: &FunctionInfo,
    site: &InlineSite,
    types: &TypeTable,
    w: &mut RecordWriter,
) -> Result<(), CodeViewError> {
    let inlinee = types.inlinee_func_id(site.inlinee)?;
    w.write_symbol(&SymbolRecord::InlineSite { inlinee });

    for &child in &site.children {
        let child_site = info
            .inline_sites
            .get(child)
            .ok_or(CodeViewError::MissingInlineSite(child))?;
        emit_inline_site(info, child_site, types, w)?;
    }

    w.write_symbol(&SymbolRecord::InlineSiteEnd);
    Ok(())
}
