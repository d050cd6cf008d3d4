//! Content module - front matter, categories, documents and loading

mod category;
mod document;
mod frontmatter;
pub mod loader;
mod markdown;
pub mod sort;

pub use category::Category;
pub use document::Document;
pub use frontmatter::{parse_file, FrontMatter, SourceFile};
pub use loader::{ContentLoader, DocumentSet, INDEX_MARKER};
pub use markdown::render_html;
pub use sort::{paginate, sort_by, Page, SortKey, SortOrder, SortSpec, Sortable};
