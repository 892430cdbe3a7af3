use super::*;
use crate::streamer::{DebugSection, RecordingStreamer};
use pretty_assertions::assert_eq;

#[test]
fn arg_list_layout() {
    let mut w = RecordWriter::new();
    w.write_type(&TypeRecord::ArgList { args: &[] });
    assert_eq!(w.bytes(), &[0x06, 0x00, 0x01, 0x12, 0, 0, 0, 0]);
}

#[test]
fn procedure_layout() {
    let mut w = RecordWriter::new();
    w.write_type(&TypeRecord::Procedure {
        return_type: TypeIndex::VOID,
        calling_conv: CallingConvention::NearC,
        options: 0,
        param_count: 0,
        arg_list: TypeIndex(0x1000),
    });
    assert_eq!(
        w.bytes(),
        &[
            0x0e, 0x00, 0x08, 0x10, // length 14, LF_PROCEDURE
            0x03, 0x00, 0x00, 0x00, // void
            0x00, 0x00, // near C, no options
            0x00, 0x00, // no parameters
            0x00, 0x10, 0x00, 0x00, // arg list 0x1000
        ]
    );
}

#[test]
fn func_id_layout() {
    let mut w = RecordWriter::new();
    w.write_type(&TypeRecord::FuncId {
        parent_scope: TypeIndex::NONE,
        function_type: TypeIndex(0x1001),
        name: "foo",
    });
    assert_eq!(
        w.bytes(),
        &[
            0x0e, 0x00, 0x01, 0x16, // length 2 + 8 + 4, LF_FUNC_ID
            0, 0, 0, 0, // no parent scope
            0x01, 0x10, 0, 0, // void() type
            b'f', b'o', b'o', 0,
        ]
    );
}

#[test]
fn inline_site_records() {
    let mut w = RecordWriter::new();
    w.write_symbol(&SymbolRecord::InlineSite {
        inlinee: TypeIndex(0x1003),
    });
    w.write_symbol(&SymbolRecord::InlineSiteEnd);
    w.write_symbol(&SymbolRecord::ProcIdEnd);
    assert_eq!(
        w.bytes(),
        &[
            0x0e, 0x00, 0x4d, 0x11, // length 14, S_INLINESITE
            0, 0, 0, 0, 0, 0, 0, 0, // parent, end
            0x03, 0x10, 0, 0, // inlinee
            0x02, 0x00, 0x4e, 0x11, // S_INLINESITE_END
            0x02, 0x00, 0x4f, 0x11, // S_PROC_ID_END
        ]
    );
}

#[test]
fn proc_start_reserves_fixups() {
    let mut w = RecordWriter::new();
    w.write_symbol(&SymbolRecord::ProcStart {
        begin: Symbol(1),
        end: Symbol(2),
        name: "main",
    });

    // 2 kind + 12 + 4 + 12 + 4 + 2 + 1 + "main\0"
    let expected_len: u16 = 2 + 12 + 4 + 12 + 4 + 2 + 1 + 5;
    assert_eq!(w.len(), usize::from(expected_len) + 2);
    assert_eq!(&w.bytes()[..4], &[expected_len.to_le_bytes()[0], 0, 0x47, 0x11]);
    assert_eq!(&w.bytes()[w.len() - 5..], b"main\0");
    assert_eq!(
        w.fixups(),
        &[
            (
                16,
                Fixup::CodeSize {
                    begin: Symbol(1),
                    end: Symbol(2)
                }
            ),
            (32, Fixup::SecRel32(Symbol(1))),
            (36, Fixup::SectionIndex(Symbol(1))),
        ]
    );
}

#[test]
fn flush_interleaves_fixups() {
    let mut w = RecordWriter::new();
    w.write_symbol(&SymbolRecord::ProcStart {
        begin: Symbol(1),
        end: Symbol(2),
        name: "f",
    });

    let mut out = RecordingStreamer::new();
    out.define_symbol(Symbol(1), 0);
    out.define_symbol(Symbol(2), 0x20);
    w.flush_to(&mut out);

    let bytes = out.section_bytes(DebugSection::Symbols);
    assert_eq!(bytes.len(), w.len());
    assert_eq!(&bytes[16..20], &[0x20, 0, 0, 0]);
    let offsets: Vec<usize> = out.relocations().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![32, 36]);
}

#[test]
fn pad_to_four() {
    let mut w = RecordWriter::new();
    w.u8(1);
    w.pad_to(4);
    assert_eq!(w.len(), 4);
    w.pad_to(4);
    assert_eq!(w.len(), 4);
}

#[test]
fn oversized_names_are_truncated() {
    let name = "x".repeat(MAX_RECORD_LENGTH);
    let mut w = RecordWriter::new();
    w.write_type(&TypeRecord::FuncId {
        parent_scope: TypeIndex::NONE,
        function_type: TypeIndex(0x1001),
        name: &name,
    });
    let len = u16::from_le_bytes([w.bytes()[0], w.bytes()[1]]);
    assert_eq!(usize::from(len), MAX_RECORD_LENGTH);
    assert_eq!(w.bytes().last(), Some(&0));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "record of")]
fn oversized_body_is_caught() {
    let mut w = RecordWriter::new();
    w.write_framed(LF_ARGLIST, |w| w.fill(MAX_RECORD_LENGTH));
}
