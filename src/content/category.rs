//! Category model

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::frontmatter::SourceFile;

/// A directory carrying an index marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Directory path relative to the content root, `/`-separated
    pub slug: String,

    pub name: String,

    pub keywords: String,

    pub description: String,

    pub icon: String,

    pub image: String,

    /// Listing weight, ascending
    pub sort: i64,

    pub published: bool,

    /// Number of documents in this category, filled in when the index is built
    pub document_count: usize,

    pub create_time: DateTime<Local>,

    /// Modification time of the index marker file
    pub update_time: DateTime<Local>,

    pub custom: serde_yaml::Value,

    /// Body of the index marker file
    #[serde(rename = "markdown")]
    pub raw_markdown: String,
}

impl Category {
    /// Build a category from its parsed index marker
    pub fn from_source(slug: String, source: SourceFile) -> Self {
        let fm = source.front_matter;
        Self {
            slug,
            name: fm.name,
            keywords: fm.keywords,
            description: fm.description,
            icon: fm.icon,
            image: fm.image,
            sort: fm.sort,
            published: fm.published,
            document_count: 0,
            create_time: source.create_time,
            update_time: source.update_time,
            custom: fm.custom,
            raw_markdown: source.body,
        }
    }
}
