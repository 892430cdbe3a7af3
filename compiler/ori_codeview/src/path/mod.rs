//! Textual canonicalization of source paths.
//!
//! `CodeView` records full Windows paths, while the front end hands us a
//! directory and a possibly relative filename. The file may not exist on
//! the machine doing the encoding, so everything here is string surgery.

/// Join a directory and filename into one canonical absolute path.
///
/// A filename that already starts with a drive letter (`C:...`) is used
/// as-is; otherwise it is appended to the directory with a backslash.
pub fn full_path(directory: &str, filename: &str) -> String {
    let joined = if filename.find(':') == Some(1) {
        filename.to_owned()
    } else {
        format!("{directory}\\{filename}")
    };
    canonicalize_path(joined)
}

/// Canonicalize a path textually.
///
/// 1. `/` becomes `\`.
/// 2. Every `\.\` becomes `\`.
/// 3. Every `\X\..\` becomes `\`. Collapsing stops at the first `\..\` that
///    has no preceding component; the rest of the path is left untouched.
/// 4. Runs of `\` collapse to one.
///
/// The result is a fixed point: canonicalizing it again changes nothing.
pub fn canonicalize_path(path: impl Into<String>) -> String {
    let mut path: String = path.into().replace('/', "\\");

    let mut cursor = 0;
    while let Some(pos) = find_from(&path, "\\.\\", cursor) {
        path.replace_range(pos..pos + 2, "");
        cursor = pos;
    }

    cursor = 0;
    while let Some(pos) = find_from(&path, "\\..\\", cursor) {
        if pos == 0 {
            break;
        }
        let Some(prev_slash) = path[..pos].rfind('\\') else {
            break;
        };
        path.replace_range(prev_slash..pos + 3, "");
        // The next ".." may directly follow the one just removed.
        cursor = prev_slash;
    }

    cursor = 0;
    while let Some(pos) = find_from(&path, "\\\\", cursor) {
        path.remove(pos);
        cursor = pos;
    }

    path
}

#[inline]
fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack[from..].find(needle).map(|pos| pos + from)
}

#[cfg(test)]
mod tests;
