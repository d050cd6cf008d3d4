//! List indexed content

use anyhow::Result;
use std::sync::Arc;

use crate::Mdnav;

/// List content by type
pub fn run(app: &Mdnav, content_type: &str) -> Result<()> {
    let index = app.load_index()?;
    let catalog = app.catalog(Arc::clone(&index));

    match content_type {
        "category" | "categories" => {
            let categories = catalog.categories();
            println!("Categories ({}):", categories.len());
            for category in categories {
                println!(
                    "  {} [{}] ({})",
                    category.name, category.slug, category.document_count
                );
            }
        }
        "document" | "documents" | "doc" | "docs" => {
            let sort = app.config.content.sort_spec();
            let page = catalog.documents_page(1, i64::MAX, sort);
            println!("Documents ({}):", page.total);
            for document in page.items {
                println!(
                    "  {} - {} [{}]",
                    document.update_time.format("%Y-%m-%d"),
                    document.name,
                    document.slug
                );
            }
        }
        "tag" | "tags" => {
            let snapshot = index.snapshot();
            let mut tags: Vec<_> = snapshot
                .tags()
                .into_iter()
                .map(|tag| (tag, snapshot.documents_by_tag(tag).len()))
                .collect();
            println!("Tags ({}):", tags.len());
            tags.sort_by(|a, b| b.1.cmp(&a.1));
            for (tag, count) in tags {
                println!("  {} ({})", tag, count);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: categories, documents, tags",
                content_type
            );
        }
    }

    Ok(())
}
