//! Selection predicates deciding which candidate entities become nodes.

use crate::facts::FunctionFact;
use crate::paths::{dir_segments, file_name, file_stem};
use crate::rules::GraphRules;

/// Only exported functions become nodes, regardless of size or documentation.
pub fn should_create_function_node(function: &FunctionFact) -> bool {
    function.is_exported
}

/// Decide whether a directory materializes as a module node.
///
/// `member_paths` are all file paths believed to live directly in the
/// directory. A directory qualifies when one member is its index file (a lone
/// index file is enough) or when it has at least `min_module_members` members.
pub fn should_create_module_node<S: AsRef<str>>(member_paths: &[S], rules: &GraphRules) -> bool {
    let has_index = member_paths
        .iter()
        .any(|p| file_stem(file_name(p.as_ref())) == rules.index_stem);

    has_index || member_paths.len() >= rules.min_module_members
}

/// Check whether a path names a test file.
///
/// True when the extension-less file name ends in a test marker
/// (`login.test.ts`, `login.spec.tsx`) or when a directory segment is a tests
/// directory (`src/__tests__/login.ts`). A name that merely contains "test"
/// (`testing.ts`, `latest.ts`) is not a test file.
pub fn is_test_file(path: &str, rules: &GraphRules) -> bool {
    let stem = file_stem(file_name(path));
    rules.strip_test_marker(stem).is_some() || dir_segments(path).any(|s| rules.is_test_dir(s))
}

/// Identity shared by a source file and the test files covering it.
///
/// The directory part drops tests-directory segments, and the file part drops
/// its extension and any trailing test marker, so `src/a/index.ts`,
/// `src/a/index.test.ts` and `src/a/__tests__/index.spec.tsx` all map to
/// `src/a/index`.
pub fn logical_unit_name(path: &str, rules: &GraphRules) -> String {
    let stem = file_stem(file_name(path));
    let unit = rules.strip_test_marker(stem).unwrap_or(stem);

    let mut parts: Vec<&str> = dir_segments(path).filter(|s| !rules.is_test_dir(s)).collect();
    parts.push(unit);
    parts.join("/")
}
