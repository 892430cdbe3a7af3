#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end tests for `CodeView` module emission.
//!
//! Drives [`CodeViewDebug`] the way a code generator would and inspects what
//! reached the [`RecordingStreamer`].

use ori_codeview::{
    CodeViewDebug, DebugLoc, DebugMetadata, DebugSection, FunctionRef, MachineFunction,
    MachineInstr, RecordingStreamer, StreamEvent, SubprogramRef, Symbol,
};
use pretty_assertions::assert_eq;

fn u16_at(bytes: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([bytes[pos], bytes[pos + 1]])
}

fn u32_at(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

/// Subsection kinds in a `.debug$S` section, skipping the leading magic.
fn subsection_kinds(section: &[u8]) -> Vec<u32> {
    let mut kinds = Vec::new();
    let mut pos = 4;
    while pos < section.len() {
        kinds.push(u32_at(section, pos));
        let len = u32_at(section, pos + 4) as usize;
        pos += 8 + len.next_multiple_of(4);
    }
    assert_eq!(pos, section.len());
    kinds
}

fn run(cv: &mut CodeViewDebug<'_, RecordingStreamer>, mf: &MachineFunction<'_>, end: Symbol) {
    cv.begin_function(mf).unwrap();
    for mi in mf.instrs {
        cv.begin_instruction(mi).unwrap();
        cv.end_instruction(mi).unwrap();
    }
    cv.end_function(mf, end).unwrap();
}

fn encoder(md: &DebugMetadata) -> CodeViewDebug<'_, RecordingStreamer> {
    CodeViewDebug::new(md, RecordingStreamer::new()).expect("module has a compile unit")
}

fn machine_function<'a>(
    id: u32,
    name: &'a str,
    sp: SubprogramRef,
    instrs: &'a [MachineInstr],
) -> MachineFunction<'a> {
    MachineFunction {
        id: FunctionRef(id),
        link_name: name,
        subprogram: Some(sp),
        begin: Symbol(id * 2),
        instrs,
    }
}

#[test]
fn relative_file_is_canonicalized_and_registered_once() {
    let mut md = DebugMetadata::new();
    let file = md.add_file("C:\\src", "a\\..\\b.c");
    let main = md.add_subprogram("main", "main", file, 1);
    md.add_compile_unit(vec![main]);
    let scope = md.subprogram(main).scope;

    let instrs = [
        MachineInstr::new(Some(DebugLoc::new(2, 1, scope))),
        MachineInstr::new(Some(DebugLoc::new(3, 1, scope))),
        MachineInstr::new(Some(DebugLoc::new(4, 1, scope))),
    ];
    let mut cv = encoder(&md);
    run(&mut cv, &machine_function(0, "main", main, &instrs), Symbol(1));
    cv.end_module().unwrap();

    let out = cv.into_streamer();
    let files: Vec<(u32, &str)> = out.files().collect();
    assert_eq!(files, vec![(1, "C:\\src\\b.c")]);
    assert!(out.locations().all(|loc| loc.file_id == 1));
}

#[test]
fn repeated_location_yields_one_marker() {
    let mut md = DebugMetadata::new();
    let file = md.add_file("C:\\src", "a.c");
    let main = md.add_subprogram("main", "main", file, 1);
    md.add_compile_unit(vec![main]);
    let scope = md.subprogram(main).scope;

    let instrs = [
        MachineInstr::new(Some(DebugLoc::new(10, 4, scope))),
        MachineInstr::new(Some(DebugLoc::new(10, 4, scope))),
        MachineInstr::new(Some(DebugLoc::new(10, 5, scope))),
    ];
    let mut cv = encoder(&md);
    run(&mut cv, &machine_function(0, "main", main, &instrs), Symbol(1));

    let positions: Vec<(u32, u16)> = cv
        .streamer()
        .locations()
        .map(|loc| (loc.line, loc.column))
        .collect();
    assert_eq!(positions, vec![(10, 4), (10, 5)]);
}

#[test]
fn module_sections_are_written_in_order() {
    let mut md = DebugMetadata::new();
    let file = md.add_file("C:\\src", "lib.c");
    let f = md.add_subprogram("f", "f", file, 1);
    let g = md.add_subprogram("g", "g", file, 10);
    let h = md.add_subprogram("h", "h", file, 20);
    md.add_compile_unit(vec![f, g, h]);
    let (fs, gs, hs) = (
        md.subprogram(f).scope,
        md.subprogram(g).scope,
        md.subprogram(h).scope,
    );
    let call = md.intern_location(DebugLoc::new(3, 5, fs));

    let f_instrs = [
        MachineInstr::new(Some(DebugLoc::new(2, 1, fs))),
        MachineInstr::new(Some(DebugLoc::new(11, 1, gs).inlined_at(call))),
        MachineInstr::new(Some(DebugLoc::new(4, 1, fs))),
    ];
    let h_instrs = [MachineInstr::new(Some(DebugLoc::new(21, 1, hs)))];

    let mut cv = encoder(&md);
    run(&mut cv, &machine_function(0, "f", f, &f_instrs), Symbol(1));
    run(&mut cv, &machine_function(1, "h", h, &h_instrs), Symbol(3));
    cv.end_module().unwrap();
    let out = cv.into_streamer();

    // Function IDs are shared between functions and inline sites.
    let ids: Vec<u32> = out.locations().map(|loc| loc.function_id).collect();
    assert_eq!(ids, vec![0, 1, 0, 2]);

    let tail: Vec<&StreamEvent> = out
        .events()
        .iter()
        .filter(|event| !matches!(event, StreamEvent::Loc(_) | StreamEvent::File { .. }))
        .collect();
    assert_eq!(
        tail,
        vec![
            &StreamEvent::LineTable {
                function_id: 0,
                begin: Symbol(0),
                end: Symbol(1),
            },
            &StreamEvent::LineTable {
                function_id: 2,
                begin: Symbol(2),
                end: Symbol(3),
            },
            &StreamEvent::FileChecksums,
            &StreamEvent::StringTable,
        ]
    );

    let types = out.section_bytes(DebugSection::Types);
    assert_eq!(u32_at(types, 0), 4);
    assert_eq!(u16_at(types, 6), 0x1201);

    let symbols = out.section_bytes(DebugSection::Symbols);
    assert_eq!(u32_at(symbols, 0), 4);
    assert_eq!(subsection_kinds(symbols), vec![0xF1, 0xF1]);
}

#[test]
fn module_without_line_info_writes_nothing() {
    let mut md = DebugMetadata::new();
    let file = md.add_file("C:\\src", "a.c");
    let main = md.add_subprogram("main", "main", file, 1);
    md.add_compile_unit(vec![main]);

    let instrs = [MachineInstr::new(None)];
    let mut cv = encoder(&md);
    run(&mut cv, &machine_function(0, "main", main, &instrs), Symbol(1));
    cv.end_module().unwrap();

    let out = cv.into_streamer();
    assert!(out.section_bytes(DebugSection::Types).is_empty());
    assert!(out.section_bytes(DebugSection::Symbols).is_empty());
    assert!(out.events().is_empty());
}
