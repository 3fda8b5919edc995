//! The storage engine's file naming grammar.
//!
//! Write-error injection filters on the file class parsed from the
//! basename; a name that parses as nothing is never injected unless the
//! test opts into all file types.

/// File classes produced by the engine's naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Write-ahead log: `<n>.log`.
    WalFile,
    /// The `LOCK` file guarding the database directory.
    DbLockFile,
    /// Sorted table file: `<n>.sst` or `<n>.ldb`.
    TableFile,
    /// Version manifest: `MANIFEST-<n>`.
    DescriptorFile,
    /// The `CURRENT` pointer file.
    CurrentFile,
    /// Scratch file: `<n>.dbtmp` or `OPTIONS-<n>.dbtmp`.
    TempFile,
    /// Diagnostic log: `LOG`, `LOG.old`, `LOG.old.<n>`.
    InfoLogFile,
    /// The `IDENTITY` file.
    IdentityFile,
    /// Saved options: `OPTIONS-<n>`.
    OptionsFile,
    /// Blob value file: `<n>.blob`.
    BlobFile,
}

/// Parse an engine file basename into its number and type. Fixed-name
/// files parse with number 0.
pub fn parse_file_name(name: &str) -> Option<(u64, FileType)> {
    match name {
        "CURRENT" => return Some((0, FileType::CurrentFile)),
        "LOCK" => return Some((0, FileType::DbLockFile)),
        "IDENTITY" => return Some((0, FileType::IdentityFile)),
        _ => {}
    }

    if let Some(rest) = name.strip_prefix("LOG") {
        let is_info_log = rest.is_empty()
            || rest == ".old"
            || rest
                .strip_prefix(".old.")
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if is_info_log {
            return Some((0, FileType::InfoLogFile));
        }
        return None;
    }

    if let Some(num) = name.strip_prefix("MANIFEST-") {
        return parse_number(num).map(|n| (n, FileType::DescriptorFile));
    }

    if let Some(rest) = name.strip_prefix("OPTIONS-") {
        if let Some(num) = rest.strip_suffix(".dbtmp") {
            return parse_number(num).map(|n| (n, FileType::TempFile));
        }
        return parse_number(rest).map(|n| (n, FileType::OptionsFile));
    }

    let (num, suffix) = name.split_once('.')?;
    let number = parse_number(num)?;
    let file_type = match suffix {
        "log" => FileType::WalFile,
        "sst" | "ldb" => FileType::TableFile,
        "blob" => FileType::BlobFile,
        "dbtmp" => FileType::TempFile,
        _ => return None,
    };
    Some((number, file_type))
}

/// Parse the basename of a full path. Returns `None` when no engine file
/// type matches.
pub fn try_parse_file_name(path: &str) -> Option<(u64, FileType)> {
    let basename = match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    };
    parse_file_name(basename)
}

fn parse_number(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_names() {
        assert_eq!(parse_file_name("CURRENT"), Some((0, FileType::CurrentFile)));
        assert_eq!(parse_file_name("LOCK"), Some((0, FileType::DbLockFile)));
        assert_eq!(
            parse_file_name("IDENTITY"),
            Some((0, FileType::IdentityFile))
        );
    }

    #[test]
    fn info_logs() {
        assert_eq!(parse_file_name("LOG"), Some((0, FileType::InfoLogFile)));
        assert_eq!(parse_file_name("LOG.old"), Some((0, FileType::InfoLogFile)));
        assert_eq!(
            parse_file_name("LOG.old.1234"),
            Some((0, FileType::InfoLogFile))
        );
        assert_eq!(parse_file_name("LOG.old."), None);
        assert_eq!(parse_file_name("LOGx"), None);
    }

    #[test]
    fn numbered_names() {
        assert_eq!(
            parse_file_name("MANIFEST-000005"),
            Some((5, FileType::DescriptorFile))
        );
        assert_eq!(
            parse_file_name("OPTIONS-000017"),
            Some((17, FileType::OptionsFile))
        );
        assert_eq!(
            parse_file_name("OPTIONS-000017.dbtmp"),
            Some((17, FileType::TempFile))
        );
        assert_eq!(parse_file_name("000042.log"), Some((42, FileType::WalFile)));
        assert_eq!(
            parse_file_name("000009.sst"),
            Some((9, FileType::TableFile))
        );
        assert_eq!(
            parse_file_name("000009.ldb"),
            Some((9, FileType::TableFile))
        );
        assert_eq!(
            parse_file_name("000007.blob"),
            Some((7, FileType::BlobFile))
        );
        assert_eq!(
            parse_file_name("000011.dbtmp"),
            Some((11, FileType::TempFile))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_file_name("MANIFEST-"), None);
        assert_eq!(parse_file_name("MANIFEST-12x"), None);
        assert_eq!(parse_file_name("123.unknown"), None);
        assert_eq!(parse_file_name("abc.log"), None);
        assert_eq!(parse_file_name("readme.txt"), None);
        assert_eq!(parse_file_name(""), None);
    }

    #[test]
    fn full_paths_use_the_basename() {
        assert_eq!(
            try_parse_file_name("/db/000042.log"),
            Some((42, FileType::WalFile))
        );
        assert_eq!(
            try_parse_file_name("/db/nested/CURRENT"),
            Some((0, FileType::CurrentFile))
        );
        assert_eq!(try_parse_file_name("/db/notes.txt"), None);
    }
}
