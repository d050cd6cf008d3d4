//! Sorting and pagination for documents and categories

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{Category, Document};

/// Page size used when the requested one is below 1
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Field to sort on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Custom `sort` weight from front matter
    Sort,
    CreateTime,
    #[default]
    UpdateTime,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "sort" => Some(SortKey::Sort),
            "create_time" => Some(SortKey::CreateTime),
            "update_time" => Some(SortKey::UpdateTime),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "asc" | "ascending" => Some(SortOrder::Asc),
            "desc" | "descending" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Sort key plus direction. Defaults to newest update first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Build from loosely-typed request parameters.
    ///
    /// An unknown key yields the default (`update_time`, descending) whatever
    /// the order says; an unknown order on a known key is descending.
    pub fn from_params(sort_by: &str, order: &str) -> Self {
        match SortKey::parse(sort_by) {
            Some(key) => Self::new(key, SortOrder::parse(order).unwrap_or_default()),
            None => Self::default(),
        }
    }
}

/// Anything that can be ordered by weight or timestamps
pub trait Sortable {
    fn weight(&self) -> i64;
    fn create_time(&self) -> DateTime<Local>;
    fn update_time(&self) -> DateTime<Local>;
}

impl Sortable for Document {
    fn weight(&self) -> i64 {
        self.sort
    }

    fn create_time(&self) -> DateTime<Local> {
        self.create_time
    }

    fn update_time(&self) -> DateTime<Local> {
        self.update_time
    }
}

impl Sortable for Category {
    fn weight(&self) -> i64 {
        self.sort
    }

    fn create_time(&self) -> DateTime<Local> {
        self.create_time
    }

    fn update_time(&self) -> DateTime<Local> {
        self.update_time
    }
}

impl<T: Sortable + ?Sized> Sortable for &T {
    fn weight(&self) -> i64 {
        (**self).weight()
    }

    fn create_time(&self) -> DateTime<Local> {
        (**self).create_time()
    }

    fn update_time(&self) -> DateTime<Local> {
        (**self).update_time()
    }
}

fn compare<T: Sortable>(a: &T, b: &T, key: SortKey) -> Ordering {
    match key {
        SortKey::Sort => a.weight().cmp(&b.weight()),
        SortKey::CreateTime => a.create_time().cmp(&b.create_time()),
        SortKey::UpdateTime => a.update_time().cmp(&b.update_time()),
    }
}

/// Stable sort: items with equal keys keep their input order in both directions
pub fn sort_by<T: Sortable>(items: &mut [T], spec: SortSpec) {
    items.sort_by(|a, b| match spec.order {
        SortOrder::Asc => compare(a, b, spec.key),
        SortOrder::Desc => compare(b, a, spec.key),
    });
}

/// Ascending weight, ties in input order
pub fn sort_categories<T: Sortable>(items: &mut [T]) {
    sort_by(items, SortSpec::new(SortKey::Sort, SortOrder::Asc));
}

/// One page of a sequence plus its paging metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    #[serde(rename = "list")]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Convert the items while keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Cut `items` down to the requested 1-based page.
///
/// Pages below 1 become 1, sizes below 1 become [`DEFAULT_PAGE_SIZE`], and a
/// page past the end is clamped to the last one.
pub fn paginate<T>(items: Vec<T>, page: i64, page_size: i64) -> Page<T> {
    let mut page = usize::try_from(page.max(1)).unwrap_or(usize::MAX);
    let page_size = if page_size < 1 {
        DEFAULT_PAGE_SIZE
    } else {
        usize::try_from(page_size).unwrap_or(usize::MAX)
    };

    let total = items.len();
    let total_pages = total.div_ceil(page_size);

    if page > total_pages && total_pages > 0 {
        page = total_pages;
    }

    let start = (page - 1).saturating_mul(page_size);
    let items = if start >= total {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(page_size).collect()
    };

    Page {
        total,
        page,
        page_size,
        total_pages,
        items,
    }
}
