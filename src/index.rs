//! In-memory content index
//!
//! The index holds one immutable [`Snapshot`] behind a swappable reference.
//! Readers clone the reference and query it without further locking; a
//! reload builds a complete new snapshot privately and publishes it with a
//! single swap, so readers see either the old generation or the new one.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::content::sort::sort_categories;
use crate::content::{Category, ContentLoader, Document, DocumentSet};
use crate::error::Result;

/// One consistent generation of categories, documents, tags and the
/// category join
#[derive(Debug)]
pub struct Snapshot {
    generation: u64,
    built_at: DateTime<Local>,
    categories: IndexMap<String, Category>,
    documents: BTreeMap<String, Document>,
    tags: BTreeMap<String, Vec<String>>,
    category_documents: HashMap<String, Vec<String>>,
}

impl Snapshot {
    /// A snapshot with nothing in it
    pub fn empty() -> Self {
        Self {
            generation: 0,
            built_at: Local::now(),
            categories: IndexMap::new(),
            documents: BTreeMap::new(),
            tags: BTreeMap::new(),
            category_documents: HashMap::new(),
        }
    }

    /// Load everything under `root` into a new snapshot
    pub fn build(root: &Path, generation: u64) -> Result<Self> {
        let loader = ContentLoader::new(root);
        let categories = loader.load_categories()?;
        let DocumentSet { documents, tags } = loader.load_documents()?;
        Ok(Self::assemble(generation, categories, documents, tags))
    }

    /// Derive the category join and document counts from already loaded maps
    fn assemble(
        generation: u64,
        mut categories: IndexMap<String, Category>,
        documents: BTreeMap<String, Document>,
        tags: BTreeMap<String, Vec<String>>,
    ) -> Self {
        let mut category_documents: HashMap<String, Vec<String>> = categories
            .keys()
            .map(|slug| (slug.clone(), Vec::new()))
            .collect();

        for document in documents.values() {
            category_documents
                .entry(document.category_slug.clone())
                .or_default()
                .push(document.slug.clone());
        }

        for (slug, category) in categories.iter_mut() {
            category.document_count = category_documents.get(slug).map_or(0, Vec::len);
        }

        Self {
            generation,
            built_at: Local::now(),
            categories,
            documents,
            tags,
            category_documents,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built_at(&self) -> DateTime<Local> {
        self.built_at
    }

    /// Categories by ascending weight, ties in discovery order
    pub fn categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.categories.values().collect();
        sort_categories(&mut categories);
        categories
    }

    pub fn category(&self, slug: &str) -> Option<&Category> {
        self.categories.get(slug)
    }

    /// All documents, ordered by slug
    pub fn documents(&self) -> Vec<&Document> {
        self.documents.values().collect()
    }

    pub fn document(&self, slug: &str) -> Option<&Document> {
        self.documents.get(slug)
    }

    pub fn documents_by_tag(&self, tag: &str) -> &[String] {
        self.tags.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn document_slugs_by_category(&self, slug: &str) -> &[String] {
        self.category_documents
            .get(slug)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn document_count(&self, category_slug: &str) -> usize {
        self.document_slugs_by_category(category_slug).len()
    }

    /// Tag names in lexicographic order
    pub fn tags(&self) -> Vec<&str> {
        self.tags.keys().map(String::as_str).collect()
    }
}

/// Shared owner of the live snapshot
#[derive(Debug)]
pub struct ContentIndex {
    live: RwLock<Arc<Snapshot>>,
    reload_lock: Mutex<()>,
}

impl Default for ContentIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentIndex {
    /// Create an index serving an empty snapshot
    pub fn new() -> Self {
        Self {
            live: RwLock::new(Arc::new(Snapshot::empty())),
            reload_lock: Mutex::new(()),
        }
    }

    /// Create an index and perform the first load
    pub fn load(root: &Path) -> Result<Self> {
        let index = Self::new();
        index.reload(root)?;
        Ok(index)
    }

    /// The current generation. Hold on to it to answer several queries
    /// against the same data.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.live.read())
    }

    pub fn list_categories(&self) -> Vec<Category> {
        self.snapshot().categories().into_iter().cloned().collect()
    }

    pub fn get_category(&self, slug: &str) -> Option<Category> {
        self.snapshot().category(slug).cloned()
    }

    pub fn list_documents(&self) -> Vec<Document> {
        self.snapshot().documents().into_iter().cloned().collect()
    }

    pub fn get_document(&self, slug: &str) -> Option<Document> {
        self.snapshot().document(slug).cloned()
    }

    pub fn documents_by_tag(&self, tag: &str) -> Vec<String> {
        self.snapshot().documents_by_tag(tag).to_vec()
    }

    pub fn document_slugs_by_category(&self, slug: &str) -> Vec<String> {
        self.snapshot().document_slugs_by_category(slug).to_vec()
    }

    pub fn document_count(&self, category_slug: &str) -> usize {
        self.snapshot().document_count(category_slug)
    }

    pub fn all_tags(&self) -> Vec<String> {
        self.snapshot().tags().into_iter().map(str::to_string).collect()
    }

    /// Rebuild from `root` and publish the result.
    ///
    /// Reloads run one at a time. On failure the previous snapshot stays
    /// live and the error is returned.
    pub fn reload(&self, root: &Path) -> Result<()> {
        let _guard = self.reload_lock.lock();
        let start = Instant::now();
        let generation = self.snapshot().generation + 1;

        let snapshot = match Snapshot::build(root, generation) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(
                    root = %root.display(),
                    error = %e,
                    "Reload failed, keeping previous snapshot"
                );
                return Err(e);
            }
        };

        tracing::info!(
            generation,
            categories = snapshot.categories.len(),
            documents = snapshot.documents.len(),
            tags = snapshot.tags.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Content index loaded"
        );

        *self.live.write() = Arc::new(snapshot);
        Ok(())
    }
}
