//! Catalog queries built on top of the content index
//!
//! Every method reads a single snapshot, so the categories and documents in
//! one answer always come from the same generation.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::content::{paginate, sort_by, Category, Document, Page, SortSpec};
use crate::index::{ContentIndex, Snapshot};

/// A category together with its documents
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDocuments {
    pub category: Category,
    #[serde(rename = "document_list")]
    pub documents: Vec<Document>,
}

/// A document together with its category, when that category exists
#[derive(Debug, Clone, Serialize)]
pub struct DocumentEntry {
    pub category: Option<Category>,
    pub document: Document,
}

/// Read-side facade used by the HTTP layer and the CLI
#[derive(Debug, Clone)]
pub struct Catalog {
    index: Arc<ContentIndex>,
    include_drafts: bool,
}

impl Catalog {
    pub fn new(index: Arc<ContentIndex>) -> Self {
        Self {
            index,
            include_drafts: false,
        }
    }

    /// Also return unpublished categories and documents
    pub fn with_drafts(mut self, include_drafts: bool) -> Self {
        self.include_drafts = include_drafts;
        self
    }

    pub fn index(&self) -> &Arc<ContentIndex> {
        &self.index
    }

    fn shows_document(&self, document: &Document) -> bool {
        self.include_drafts || document.published
    }

    fn shows_category(&self, category: &Category) -> bool {
        self.include_drafts || category.published
    }

    /// Visible documents for the given slugs, sorted
    fn resolve<'a>(
        &self,
        snapshot: &'a Snapshot,
        slugs: &[String],
        sort: SortSpec,
    ) -> Vec<&'a Document> {
        let mut documents: Vec<&Document> = slugs
            .iter()
            .filter_map(|slug| snapshot.document(slug))
            .filter(|d| self.shows_document(d))
            .collect();
        sort_by(&mut documents, sort);
        documents
    }

    fn with_documents(
        &self,
        snapshot: &Snapshot,
        category: &Category,
        sort: SortSpec,
    ) -> CategoryDocuments {
        let documents: Vec<Document> = self
            .resolve(snapshot, snapshot.document_slugs_by_category(&category.slug), sort)
            .into_iter()
            .cloned()
            .collect();

        let mut category = category.clone();
        category.document_count = documents.len();
        CategoryDocuments {
            category,
            documents,
        }
    }

    /// Visible categories in listing order, with visible document counts
    pub fn categories(&self) -> Vec<Category> {
        let snapshot = self.index.snapshot();
        snapshot
            .categories()
            .into_iter()
            .filter(|c| self.shows_category(c))
            .map(|c| {
                let mut category = c.clone();
                category.document_count = snapshot
                    .document_slugs_by_category(&c.slug)
                    .iter()
                    .filter_map(|slug| snapshot.document(slug))
                    .filter(|d| self.shows_document(d))
                    .count();
                category
            })
            .collect()
    }

    /// Every visible category with its sorted documents
    pub fn categories_with_documents(&self, sort: SortSpec) -> Vec<CategoryDocuments> {
        let snapshot = self.index.snapshot();
        snapshot
            .categories()
            .into_iter()
            .filter(|c| self.shows_category(c))
            .map(|c| self.with_documents(&snapshot, c, sort))
            .collect()
    }

    /// One category with its sorted documents
    pub fn category_documents(&self, slug: &str, sort: SortSpec) -> Option<CategoryDocuments> {
        let snapshot = self.index.snapshot();
        let category = snapshot.category(slug).filter(|c| self.shows_category(c))?;
        Some(self.with_documents(&snapshot, category, sort))
    }

    /// A document and the category it lives in
    pub fn document(&self, slug: &str) -> Option<DocumentEntry> {
        let snapshot = self.index.snapshot();
        let document = snapshot.document(slug).filter(|d| self.shows_document(d))?;
        Some(DocumentEntry {
            category: snapshot.category(&document.category_slug).cloned(),
            document: document.clone(),
        })
    }

    /// All visible documents, sorted and paginated
    pub fn documents_page(&self, page: i64, page_size: i64, sort: SortSpec) -> Page<Document> {
        let snapshot = self.index.snapshot();
        let mut documents: Vec<&Document> = snapshot
            .documents()
            .into_iter()
            .filter(|d| self.shows_document(d))
            .collect();
        sort_by(&mut documents, sort);
        paginate(documents, page, page_size).map(Document::clone)
    }

    /// Documents carrying `tag`, grouped by category in listing order.
    /// Documents whose category does not exist are left out.
    pub fn tag_documents(&self, tag: &str, sort: SortSpec) -> Vec<CategoryDocuments> {
        let snapshot = self.index.snapshot();

        let mut by_category: HashMap<&str, Vec<&Document>> = HashMap::new();
        for document in self.resolve(&snapshot, snapshot.documents_by_tag(tag), sort) {
            by_category
                .entry(document.category_slug.as_str())
                .or_default()
                .push(document);
        }

        snapshot
            .categories()
            .into_iter()
            .filter(|c| self.shows_category(c))
            .filter_map(|c| {
                let documents = by_category.remove(c.slug.as_str())?;
                let mut category = c.clone();
                category.document_count = documents.len();
                Some(CategoryDocuments {
                    category,
                    documents: documents.into_iter().cloned().collect(),
                })
            })
            .collect()
    }

    /// All tag names, sorted
    pub fn tags(&self) -> Vec<String> {
        self.index.all_tags()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{SortKey, SortOrder};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn catalog() -> (TempDir, Catalog) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "dev/_index.md", "---\nname: Dev\nsort: 1\n---\n");
        write(root, "ops/_index.md", "---\nname: Ops\nsort: 2\n---\n");
        write(root, "wip/_index.md", "---\nname: WIP\npublished: false\n---\n");
        write(root, "dev/b.md", "---\nname: B\nsort: 2\ntags: [rust]\n---\n");
        write(root, "dev/a.md", "---\nname: A\nsort: 1\ntags: [rust, web]\n---\n");
        write(root, "dev/draft.md", "---\nname: Draft\npublished: false\n---\n");
        write(root, "ops/deploy.md", "---\nname: Deploy\nsort: 3\ntags: [rust]\n---\n");
        write(root, "loose/orphan.md", "---\nname: Orphan\ntags: [rust]\n---\n");

        let index = Arc::new(ContentIndex::load(root).unwrap());
        (dir, Catalog::new(index))
    }

    fn by_weight() -> SortSpec {
        SortSpec::new(SortKey::Sort, SortOrder::Asc)
    }

    #[test]
    fn test_categories_hide_drafts() {
        let (_dir, catalog) = catalog();

        let categories = catalog.categories();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Dev", "Ops"]);
        assert_eq!(categories[0].document_count, 2);

        let with_drafts = catalog.clone().with_drafts(true).categories();
        assert_eq!(with_drafts.len(), 3);
        assert_eq!(with_drafts.iter().find(|c| c.slug == "dev").unwrap().document_count, 3);
    }

    #[test]
    fn test_category_documents_sorted() {
        let (_dir, catalog) = catalog();

        let dev = catalog.category_documents("dev", by_weight()).unwrap();
        let names: Vec<_> = dev.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(catalog.category_documents("missing", by_weight()).is_none());
        assert!(catalog.category_documents("wip", by_weight()).is_none());
    }

    #[test]
    fn test_categories_with_documents() {
        let (_dir, catalog) = catalog();
        let all = catalog.categories_with_documents(by_weight());
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].category.slug, "ops");
        assert_eq!(all[1].documents[0].slug, "ops/deploy");
    }

    #[test]
    fn test_document_with_missing_category() {
        let (_dir, catalog) = catalog();

        let entry = catalog.document("loose/orphan").unwrap();
        assert!(entry.category.is_none());

        let entry = catalog.document("dev/a").unwrap();
        assert_eq!(entry.category.unwrap().name, "Dev");

        assert!(catalog.document("dev/draft").is_none());
        assert!(catalog.document("nope").is_none());
    }

    #[test]
    fn test_documents_page() {
        let (_dir, catalog) = catalog();

        let page = catalog.documents_page(1, 2, by_weight());
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 2);
        let slugs: Vec<_> = page.items.iter().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, vec!["loose/orphan", "dev/a"]);

        let last = catalog.documents_page(9, 2, by_weight());
        assert_eq!(last.page, 2);
        assert_eq!(last.items.len(), 2);
    }

    #[test]
    fn test_tag_documents_grouped() {
        let (_dir, catalog) = catalog();

        let groups = catalog.tag_documents("rust", by_weight());
        let slugs: Vec<_> = groups.iter().map(|g| g.category.slug.as_str()).collect();
        assert_eq!(slugs, vec!["dev", "ops"]);
        assert_eq!(groups[0].documents.len(), 2);
        assert_eq!(groups[0].category.document_count, 2);

        assert!(catalog.tag_documents("absent", by_weight()).is_empty());
        assert_eq!(catalog.tags(), vec!["rust", "web"]);
    }
}
