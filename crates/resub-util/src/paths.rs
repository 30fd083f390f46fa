//! String-level path munging for import specifiers.
//!
//! Redirect rules operate on specifier *strings*, which may describe files on
//! a mock filesystem that does not exist on the host. Everything here is
//! therefore lexical: no `canonicalize`, no platform `Path` semantics beyond
//! separator normalization.

/// Normalize a path string to forward-slash form and strip trailing
/// separators.
///
/// Windows separators are converted, so `some\directory\` and
/// `some/directory/` both become `some/directory`. The filesystem root `/`
/// is preserved.
#[must_use]
pub fn sep_to_unix(p: &str) -> String {
    let unix = p.replace('\\', "/");
    let trimmed = unix.trim_end_matches('/');
    if trimmed.is_empty() && unix.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Prefix a bare relative specifier with `./`.
///
/// Specifiers already anchored with a leading dot or slash are returned
/// unchanged. External resolvers distinguish `foo` (package lookup) from
/// `./foo` (file lookup); redirected candidates are always file lookups.
#[must_use]
pub fn force_relative(p: &str) -> String {
    match p.chars().next() {
        Some('.' | '/') => p.to_string(),
        _ => format!("./{p}"),
    }
}

/// Check whether a specifier string is an absolute path.
///
/// Handles unix absolute paths, Windows drive paths (`C:\`, `D:/`), and UNC
/// paths (`\\server\share`). A string-level check is required because
/// candidates may be virtual paths for another platform.
#[must_use]
pub fn is_absolute_spec(spec: &str) -> bool {
    if spec.starts_with('/') || spec.starts_with("\\\\") {
        return true;
    }

    let mut chars = spec.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(drive), Some(':'), Some('\\' | '/')) if drive.is_ascii_alphabetic()
    )
}

/// Lexically normalize a path string: fold `.` and `..` segments and collapse
/// repeated separators.
///
/// `..` at the root of an absolute path is dropped; on a relative path it is
/// preserved (`../../custom` stays meaningful until anchored).
#[must_use]
pub fn normalize(p: &str) -> String {
    let unix = p.replace('\\', "/");
    let absolute = unix.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in unix.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            _ => segments.push(segment),
        }
    }

    if absolute {
        format!("/{}", segments.join("/"))
    } else if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}

/// Resolve `p` against `base` with `path.resolve` semantics: an absolute `p`
/// wins outright, a relative `p` is joined onto `base`, and the result is
/// normalized.
#[must_use]
pub fn lexical_resolve(base: &str, p: &str) -> String {
    if is_absolute_spec(p) {
        normalize(p)
    } else {
        normalize(&format!("{base}/{p}"))
    }
}

/// Last `/`-separated segment of a path string (the file name with its
/// extension, or the leaf directory name).
#[must_use]
pub fn last_segment(p: &str) -> &str {
    p.rsplit('/').next().unwrap_or(p)
}
