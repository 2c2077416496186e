use std::collections::BTreeSet;

use crate::analysis::file_metrics::extension_of;
use crate::models::{CodeFile, RepositoryStructure, TreeEntry, TreeEntryKind};

pub const CODE_EXTENSIONS: &[&str] = &[
    ".rb", ".js", ".ts", ".jsx", ".tsx", ".py", ".java", ".cpp", ".c", ".cs", ".php", ".go",
    ".rs", ".swift", ".kt",
];

pub fn is_code_file(path: &str) -> bool {
    CODE_EXTENSIONS.contains(&extension_of(path).as_str())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StructureScanner;

impl StructureScanner {
    pub fn new() -> Self {
        Self
    }

    /// Summarizes a recursive tree listing. Every entry counts towards
    /// `total_files`; only blobs are classified by extension.
    pub fn scan(&self, tree: &[TreeEntry]) -> RepositoryStructure {
        let mut structure = RepositoryStructure {
            total_files: tree.len(),
            ..Default::default()
        };
        let mut directories = BTreeSet::new();

        for entry in tree {
            match entry.kind {
                TreeEntryKind::Tree => {
                    directories.insert(entry.path.clone());
                }
                TreeEntryKind::Blob => {
                    *structure
                        .file_types
                        .entry(extension_of(&entry.path))
                        .or_insert(0) += 1;

                    if is_code_file(&entry.path) {
                        structure.code_files.push(CodeFile {
                            path: entry.path.clone(),
                            content_ref: entry.sha.clone(),
                            size: entry.size.unwrap_or(0),
                        });
                    }
                }
                TreeEntryKind::Commit | TreeEntryKind::Other => {}
            }
        }

        structure.directories = directories.into_iter().collect();
        structure
    }
}

impl RepositoryStructure {
    /// The `limit` largest code files, largest first; equal sizes keep tree order.
    pub fn select_largest(&self, limit: usize) -> Vec<CodeFile> {
        let mut files = self.code_files.clone();
        files.sort_by(|a, b| b.size.cmp(&a.size));
        files.truncate(limit);
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(path: &str, size: Option<u64>) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: TreeEntryKind::Blob,
            sha: format!("sha-{}", path),
            size,
        }
    }

    fn dir(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: TreeEntryKind::Tree,
            sha: format!("sha-{}", path),
            size: None,
        }
    }

    #[test]
    fn test_scan_classifies_entries() {
        let tree = vec![
            dir("app"),
            blob("app/models.rb", Some(120)),
            blob("app/view.erb", Some(40)),
            blob("README.md", Some(10)),
            blob("Gemfile", None),
            blob("lib/Tool.RS", None),
        ];
        let structure = StructureScanner::new().scan(&tree);

        assert_eq!(structure.total_files, 6);
        assert_eq!(structure.directories, vec!["app"]);
        assert_eq!(structure.file_types.get(".rb"), Some(&1));
        assert_eq!(structure.file_types.get(".erb"), Some(&1));
        assert_eq!(structure.file_types.get(""), Some(&1));
        assert_eq!(structure.file_types.get(".rs"), Some(&1));

        let paths: Vec<_> = structure.code_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["app/models.rb", "lib/Tool.RS"]);
        assert_eq!(structure.code_files[1].size, 0);
        assert_eq!(structure.code_files[0].content_ref, "sha-app/models.rb");
    }

    #[test]
    fn test_select_at_most_ten_largest() {
        let tree: Vec<_> = (0..25u64)
            .map(|i| blob(&format!("src/f{}.py", i), Some((i * 37) % 25 * 10)))
            .collect();
        let structure = StructureScanner::new().scan(&tree);

        let selected = structure.select_largest(10);
        assert_eq!(selected.len(), 10);

        let smallest_selected = selected.iter().map(|f| f.size).min().unwrap();
        let skipped_max = structure
            .code_files
            .iter()
            .filter(|f| !selected.iter().any(|s| s.path == f.path))
            .map(|f| f.size)
            .max()
            .unwrap();
        assert!(smallest_selected >= skipped_max);
        assert!(selected.windows(2).all(|w| w[0].size >= w[1].size));
    }

    #[test]
    fn test_select_keeps_tree_order_on_ties() {
        let tree = vec![blob("a.go", Some(5)), blob("b.go", Some(9)), blob("c.go", Some(5))];
        let selected = StructureScanner::new().scan(&tree).select_largest(10);

        let paths: Vec<_> = selected.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["b.go", "a.go", "c.go"]);
    }
}
