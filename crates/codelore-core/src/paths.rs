//! Lexical helpers for repository-relative `/`-separated paths.
//!
//! Fact records carry paths as strings, never touching the file system, so
//! these helpers work on the string form only.

/// Final path segment (`src/auth/login.ts` → `login.ts`).
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

/// Directory portion of a path, empty for root-level files.
pub fn parent_dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => &trimmed[..i],
        None => "",
    }
}

/// File name without its last extension (`index.test.ts` → `index.test`).
///
/// Dotfiles keep their name (`.eslintrc` → `.eslintrc`).
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// Directory segments of a path, excluding the final segment.
pub fn dir_segments(path: &str) -> impl Iterator<Item = &str> {
    parent_dir(path).split('/').filter(|s| !s.is_empty())
}

/// Join `relative` onto `base_dir` and normalize `.` and `..` segments.
///
/// Returns `None` when `..` climbs above the repository root.
pub fn join_normalized(base_dir: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in base_dir.split('/').chain(relative.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }

    Some(segments.join("/"))
}

/// Check whether an import specifier is relative to the importing file.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}
