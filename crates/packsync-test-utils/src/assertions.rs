//! Assertion helpers for files and package trees.

use crate::fixtures::list_files;
use std::path::Path;

/// Assert that a file's content equals expected text exactly.
pub fn assert_file_equals(path: &Path, expected: &str) {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    assert_strings_equal(&content, expected);
}

/// Assert that two strings are equal, printing a unified diff on failure.
pub fn assert_strings_equal(actual: &str, expected: &str) {
    if actual != expected {
        let diff = similar::TextDiff::from_lines(expected, actual)
            .unified_diff()
            .header("expected", "actual")
            .to_string();
        panic!("Strings are not equal.\n{diff}");
    }
}

/// Assert that `root` holds exactly these visible files with these contents.
///
/// # Example
///
/// ```rust
/// use packsync_test_utils::assertions::assert_tree;
/// use packsync_test_utils::fixtures::TestPackage;
///
/// let package = TestPackage::new("Song").with_file("a.txt", "1").build();
/// assert_tree(package.path(), &[("a.txt", "1")]);
/// ```
pub fn assert_tree(root: &Path, expected: &[(&str, &str)]) {
    let mut expected_paths: Vec<&str> = expected.iter().map(|(p, _)| *p).collect();
    expected_paths.sort();
    let actual_paths = list_files(root);

    assert_eq!(
        actual_paths,
        expected_paths,
        "Tree {} has different files",
        root.display()
    );

    for (rel, contents) in expected {
        assert_file_equals(&root.join(rel), contents);
    }
}

/// Assert that two trees hold the same visible files with the same bytes.
pub fn assert_trees_equal(actual: &Path, expected: &Path) {
    let actual_files = list_files(actual);
    let expected_files = list_files(expected);
    assert_eq!(
        actual_files,
        expected_files,
        "Trees {} and {} have different files",
        actual.display(),
        expected.display()
    );

    for rel in &actual_files {
        let a = std::fs::read(actual.join(rel))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", rel, e));
        let b = std::fs::read(expected.join(rel))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", rel, e));
        assert!(a == b, "File {} differs between trees", rel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestPackage;

    #[test]
    fn test_assert_tree_passes() {
        let package = TestPackage::new("Song")
            .with_file("a.txt", "1")
            .with_file("Dir/b.txt", "2")
            .build();
        assert_tree(package.path(), &[("a.txt", "1"), ("Dir/b.txt", "2")]);
    }

    #[test]
    #[should_panic(expected = "different files")]
    fn test_assert_tree_detects_extra_file() {
        let package = TestPackage::new("Song")
            .with_file("a.txt", "1")
            .with_file("extra.txt", "x")
            .build();
        assert_tree(package.path(), &[("a.txt", "1")]);
    }

    #[test]
    #[should_panic(expected = "Strings are not equal")]
    fn test_assert_strings_equal_reports_diff() {
        assert_strings_equal("a\nb\n", "a\nc\n");
    }

    #[test]
    fn test_assert_trees_equal() {
        let one = TestPackage::new("One").with_file("x", "1").build();
        let two = TestPackage::new("Two").with_file("x", "1").build();
        assert_trees_equal(one.path(), two.path());
    }
}
