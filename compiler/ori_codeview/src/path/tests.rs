use super::*;
use pretty_assertions::assert_eq;

#[test]
fn joins_relative_filename() {
    assert_eq!(full_path("C:\\src", "main.c"), "C:\\src\\main.c");
}

#[test]
fn collapses_parent_component() {
    assert_eq!(full_path("C:\\src", "a\\..\\b.c"), "C:\\src\\b.c");
}

#[test]
fn absolute_filename_ignores_directory() {
    assert_eq!(full_path("C:\\src", "D:\\lib\\x.h"), "D:\\lib\\x.h");
}

#[test]
fn colon_elsewhere_is_not_a_drive() {
    assert_eq!(full_path("C:\\src", "ab:c.h"), "C:\\src\\ab:c.h");
}

#[test]
fn forward_slashes_become_backslashes() {
    assert_eq!(
        full_path("C:/work/proj", "src/util/x.c"),
        "C:\\work\\proj\\src\\util\\x.c"
    );
}

#[test]
fn removes_current_dir_segments() {
    assert_eq!(canonicalize_path("C:\\a\\.\\.\\b\\.\\c.c"), "C:\\a\\b\\c.c");
}

#[test]
fn collapses_consecutive_parents() {
    assert_eq!(canonicalize_path("C:\\a\\b\\c\\..\\..\\d.c"), "C:\\a\\d.c");
}

#[test]
fn leading_parent_is_left_alone() {
    assert_eq!(canonicalize_path("\\..\\a\\..\\b.c"), "\\..\\a\\..\\b.c");
}

#[test]
fn parent_above_drive_stops_collapsing() {
    // The second `..` has nothing to its left but the drive.
    assert_eq!(canonicalize_path("C:\\a\\..\\..\\b.c"), "C:\\..\\b.c");
}

#[test]
fn parent_without_preceding_separator_stops_collapsing() {
    assert_eq!(canonicalize_path("ab\\..\\c\\..\\d"), "ab\\..\\c\\..\\d");
}

#[test]
fn duplicate_backslashes_collapse() {
    assert_eq!(canonicalize_path("C:\\\\src\\\\\\x.c"), "C:\\src\\x.c");
    assert_eq!(full_path("C:\\src\\", "x.c"), "C:\\src\\x.c");
}

#[test]
fn canonical_output_is_a_fixed_point() {
    for input in [
        "C:\\src\\a\\..\\b.c",
        "C:/x/./y//../z.c",
        "\\..\\a",
        "C:\\a\\..\\..\\b.c",
        "a\\\\..\\b",
    ] {
        let once = canonicalize_path(input);
        assert_eq!(canonicalize_path(once.clone()), once, "input: {input}");
    }
}

mod proptest_canonical {
    use super::super::canonicalize_path;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(
            chars in proptest::collection::vec(
                prop_oneof![
                    Just('a'),
                    Just('b'),
                    Just('.'),
                    Just('\\'),
                    Just('/'),
                    Just(':'),
                ],
                0..32,
            )
        ) {
            let input: String = chars.into_iter().collect();
            let once = canonicalize_path(input.as_str());
            let twice = canonicalize_path(once.as_str());
            prop_assert_eq!(twice, once, "input: {:?}", input);
        }
    }
}
