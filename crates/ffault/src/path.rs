//! Path splitting helpers.
//!
//! These operate on the textual path so that map keys in the durability
//! bookkeeping are exactly the strings the engine handed in, separator
//! quirks included.

/// Return the directory portion of a file path: everything before the last
/// separator, or the empty string when there is none. Assumes `path` names
/// a file, not a directory like `/foo/bar/`.
pub fn dir_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Trim trailing `/` separators. A string consisting only of separators is
/// returned unchanged.
pub fn trim_dirname(path: &str) -> &str {
    match path.rfind(|c| c != '/') {
        Some(idx) => &path[..=idx],
        None => path,
    }
}

/// Split a full file path into `(directory, file name)`.
pub fn dir_and_name(path: &str) -> (&str, &str) {
    let dir = dir_name(path);
    let name = if dir.is_empty() && !path.starts_with(['/', '\\']) {
        path
    } else {
        &path[dir.len() + 1..]
    };
    (dir, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_name_splits_on_last_separator() {
        assert_eq!(dir_name("/db/files/000123.sst"), "/db/files");
        assert_eq!(dir_name("/a"), "");
        assert_eq!(dir_name("relative.log"), "");
        assert_eq!(dir_name("C:\\db\\x.log"), "C:\\db");
    }

    #[test]
    fn trim_dirname_drops_trailing_slashes() {
        assert_eq!(trim_dirname("/db/"), "/db");
        assert_eq!(trim_dirname("/db///"), "/db");
        assert_eq!(trim_dirname("/db"), "/db");
        assert_eq!(trim_dirname("///"), "///");
        assert_eq!(trim_dirname(""), "");
    }

    #[test]
    fn dir_and_name_pairs() {
        assert_eq!(dir_and_name("/db/a.log"), ("/db", "a.log"));
        assert_eq!(dir_and_name("/a"), ("", "a"));
        assert_eq!(dir_and_name("bare"), ("", "bare"));
        assert_eq!(dir_and_name("/db/sub/f"), ("/db/sub", "f"));
    }
}
