//! Paginated response model

use serde::{Deserialize, Serialize};

/// One page of a server-driven listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, alias = "page", alias = "number")]
    pub page_number: u32,
    #[serde(default, alias = "size")]
    pub page_size: u32,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub first: bool,
}

impl<T> Page<T> {
    /// Empty first page
    pub fn empty(page_size: u32) -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            page_number: 0,
            page_size,
            last: true,
            first: true,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        !self.last && self.page_number + 1 < self.total_pages
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_more_pages().then(|| self.page_number + 1)
    }

    pub fn previous_page(&self) -> Option<u32> {
        (!self.first && self.page_number > 0).then(|| self.page_number - 1)
    }

    /// Human readable range such as "21-40 of 45"
    pub fn item_range(&self) -> String {
        if self.total_elements == 0 {
            return "0 of 0".to_string();
        }
        let start = self.page_number as u64 * self.page_size as u64 + 1;
        let end = (start + self.content.len() as u64).saturating_sub(1);
        format!("{}-{} of {}", start, end, self.total_elements)
    }

    /// Convert the items while keeping the paging metadata
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            page_number: self.page_number,
            page_size: self.page_size,
            last: self.last,
            first: self.first,
        }
    }
}
