//! Content loader - walks the content root and builds categories and documents

use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::frontmatter::parse_file;
use super::{Category, Document};
use crate::error::{IndexError, Result};

/// File name that turns its directory into a category
pub const INDEX_MARKER: &str = "_index.md";

/// Documents keyed by slug, plus the tag index built in the same pass
#[derive(Debug, Default)]
pub struct DocumentSet {
    pub documents: BTreeMap<String, Document>,
    pub tags: BTreeMap<String, Vec<String>>,
}

/// Loads categories and documents from a content root
pub struct ContentLoader<'a> {
    root: &'a Path,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Load every category marker under the root, in walk order
    pub fn load_categories(&self) -> Result<IndexMap<String, Category>> {
        let mut categories = IndexMap::new();

        for path in self.markdown_files()? {
            if !is_index_marker(&path) {
                continue;
            }

            let slug = match path.strip_prefix(self.root).ok().and_then(Path::parent) {
                Some(dir) => path_to_slug(dir),
                None => continue,
            };

            match parse_file(&path) {
                Ok(source) => {
                    categories.insert(slug.clone(), Category::from_source(slug, source));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping category");
                }
            }
        }

        tracing::debug!(count = categories.len(), "Loaded categories");
        Ok(categories)
    }

    /// Load every non-marker Markdown file under the root
    pub fn load_documents(&self) -> Result<DocumentSet> {
        let mut set = DocumentSet::default();

        for path in self.markdown_files()? {
            if is_index_marker(&path) {
                continue;
            }

            let relative = match path.strip_prefix(self.root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            let slug = path_to_slug(&relative.with_extension(""));
            let category_slug = relative.parent().map(path_to_slug).unwrap_or_default();

            if set.documents.contains_key(&slug) {
                tracing::warn!(path = %path.display(), slug = %slug, "Duplicate document slug, skipping");
                continue;
            }

            let source = match parse_file(&path) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping document");
                    continue;
                }
            };

            let document = Document::from_source(slug.clone(), category_slug, source);
            for tag in &document.tags {
                set.tags.entry(tag.clone()).or_default().push(slug.clone());
            }
            set.documents.insert(slug, document);
        }

        tracing::debug!(
            documents = set.documents.len(),
            tags = set.tags.len(),
            "Loaded documents"
        );
        Ok(set)
    }

    /// Ensure the root exists and is a directory
    fn check_root(&self) -> Result<()> {
        let metadata = fs::metadata(self.root).map_err(|e| IndexError::io(self.root, e))?;
        if !metadata.is_dir() {
            return Err(IndexError::NotADirectory(self.root.to_path_buf()));
        }
        Ok(())
    }

    /// All Markdown files under the root, sorted by path within each directory
    fn markdown_files(&self) -> Result<Vec<PathBuf>> {
        self.check_root()?;

        let mut files = Vec::new();
        let walker = WalkDir::new(self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(IndexError::io(self.root, e.into()));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_file() && is_markdown_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }
}

/// Check if a file is a markdown file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

fn is_index_marker(path: &Path) -> bool {
    path.file_name().map(|n| n == INDEX_MARKER).unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Join path components with `/` regardless of platform
fn path_to_slug(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "_index.md", "---\nname: Home\nsort: 5\n---\nWelcome\n");
        write(root, "about.md", "---\nname: About\n---\nAbout us\n");
        write(root, "guide/_index.md", "---\nname: Guide\nsort: 1\n---\n");
        write(
            root,
            "guide/intro.md",
            "---\nname: Intro\ntags: [b, a]\n---\nIntro body\n",
        );
        write(root, "guide/setup/linux.md", "---\nname: Linux\ntags: a\n---\n");
        write(root, "notes/loose.md", "no front matter");
        write(root, "notes/readme.txt", "not markdown");
        write(root, ".git/ignored.md", "---\nname: Hidden\n---\n");
        dir
    }

    #[test]
    fn test_load_categories() {
        let dir = fixture();
        let categories = ContentLoader::new(dir.path()).load_categories().unwrap();

        let slugs: Vec<_> = categories.keys().cloned().collect();
        assert_eq!(slugs, vec!["", "guide"]);
        assert_eq!(categories["guide"].name, "Guide");
        assert_eq!(categories[""].raw_markdown, "Welcome\n");
        assert_eq!(categories["guide"].document_count, 0);
    }

    #[test]
    fn test_load_documents_slugs() {
        let dir = fixture();
        let set = ContentLoader::new(dir.path()).load_documents().unwrap();

        let slugs: Vec<_> = set.documents.keys().cloned().collect();
        assert_eq!(
            slugs,
            vec!["about", "guide/intro", "guide/setup/linux", "notes/loose"]
        );
        assert_eq!(set.documents["about"].category_slug, "");
        assert_eq!(set.documents["guide/intro"].category_slug, "guide");
        assert_eq!(set.documents["guide/setup/linux"].category_slug, "guide/setup");
        assert_eq!(set.documents["notes/loose"].raw_markdown, "no front matter");
        assert!(set.documents["notes/loose"].published);
    }

    #[test]
    fn test_load_documents_tags() {
        let dir = fixture();
        let set = ContentLoader::new(dir.path()).load_documents().unwrap();

        assert_eq!(set.documents["guide/intro"].tags, vec!["a", "b"]);
        assert_eq!(set.tags["a"], vec!["guide/intro", "guide/setup/linux"]);
        assert_eq!(set.tags["b"], vec!["guide/intro"]);
    }

    #[test]
    fn test_bad_file_is_skipped() {
        let dir = fixture();
        write(dir.path(), "guide/broken.md", "---\nname: [oops\n---\n");
        write(dir.path(), "broken/_index.md", "---\nsort: {x\n---\n");

        let loader = ContentLoader::new(dir.path());
        let set = loader.load_documents().unwrap();
        assert!(!set.documents.contains_key("guide/broken"));
        assert_eq!(set.documents.len(), 4);

        let categories = loader.load_categories().unwrap();
        assert!(!categories.contains_key("broken"));
        assert_eq!(categories.len(), 2);
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = ContentLoader::new(&missing).load_documents().unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
    }

    #[test]
    fn test_root_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.md");
        fs::write(&file, "x").unwrap();
        let err = ContentLoader::new(&file).load_categories().unwrap_err();
        assert!(matches!(err, IndexError::NotADirectory(_)));
    }

    #[test]
    fn test_is_markdown_file() {
        assert!(is_markdown_file(Path::new("a/b.md")));
        assert!(is_markdown_file(Path::new("b.markdown")));
        assert!(!is_markdown_file(Path::new("b.txt")));
        assert!(!is_markdown_file(Path::new("md")));
    }
}
