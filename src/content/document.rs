//! Document model

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::frontmatter::SourceFile;

/// A Markdown file that is not an index marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the content root without extension, `/`-separated
    pub slug: String,

    /// Parent directory of the slug; empty at the content root
    #[serde(rename = "cate_slug")]
    pub category_slug: String,

    pub name: String,

    pub keywords: String,

    pub description: String,

    pub published: bool,

    pub sort: i64,

    pub icon: String,

    /// External link
    pub url: String,

    /// Sorted, without duplicates
    pub tags: Vec<String>,

    pub image: String,

    pub create_time: DateTime<Local>,

    /// Always the file modification time
    pub update_time: DateTime<Local>,

    pub custom: serde_yaml::Value,

    /// Markdown body after the front-matter block
    #[serde(rename = "markdown")]
    pub raw_markdown: String,
}

impl Document {
    /// Build a document from its parsed source file
    pub fn from_source(slug: String, category_slug: String, source: SourceFile) -> Self {
        let fm = source.front_matter;

        let mut tags = fm.tags;
        tags.sort();
        tags.dedup();

        Self {
            slug,
            category_slug,
            name: fm.name,
            keywords: fm.keywords,
            description: fm.description,
            published: fm.published,
            sort: fm.sort,
            icon: fm.icon,
            url: fm.url,
            tags,
            image: fm.image,
            create_time: source.create_time,
            update_time: source.update_time,
            custom: fm.custom,
            raw_markdown: source.body,
        }
    }

    /// Render the Markdown body to HTML
    pub fn render_html(&self) -> String {
        super::markdown::render_html(&self.raw_markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;

    #[test]
    fn test_tags_sorted_and_deduplicated() {
        let now = Local::now();
        let source = SourceFile {
            front_matter: FrontMatter {
                tags: vec!["b".to_string(), "a".to_string(), "b".to_string()],
                ..Default::default()
            },
            body: String::new(),
            create_time: now,
            update_time: now,
        };

        let doc = Document::from_source("guide/intro".into(), "guide".into(), source);
        assert_eq!(doc.tags, vec!["a", "b"]);
        assert!(doc.published);
    }

    #[test]
    fn test_json_keys() {
        let now = Local::now();
        let source = SourceFile {
            front_matter: FrontMatter::default(),
            body: "# Intro\n".to_string(),
            create_time: now,
            update_time: now,
        };

        let doc = Document::from_source("guide/intro".into(), "guide".into(), source);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["cate_slug"], "guide");
        assert_eq!(json["markdown"], "# Intro\n");
        assert!(json.get("category_slug").is_none());
    }
}
