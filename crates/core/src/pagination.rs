//! Fixed-size page slicing and bounded page navigation
//!
//! Pages are 1-indexed. Slicing never fails: a page outside the
//! collection yields an empty slice, and navigation past either edge is
//! a no-op.

use crate::filter::FilterState;
use serde::Serialize;
use std::num::NonZeroUsize;

/// Page size used by the exercise list
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

/// Pagination metadata for a page slice
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// One page of a collection together with its metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice<'a, T> {
    pub items: &'a [T],
    pub info: PageInfo,
}

/// Calculate the `[start, end)` bounds of `page`, clamped to `total_items`
///
/// Returns `None` when the page holds no items.
pub fn page_bounds(
    total_items: usize,
    page_size: NonZeroUsize,
    page: usize,
) -> Option<(usize, usize)> {
    let size = page_size.get();
    let start = page.checked_sub(1)?.checked_mul(size)?;

    if start >= total_items {
        return None;
    }

    let end = start.saturating_add(size).min(total_items);
    Some((start, end))
}

/// Build pagination metadata without slicing
pub fn page_info(total_items: usize, page_size: NonZeroUsize, current_page: usize) -> PageInfo {
    let size = page_size.get();

    PageInfo {
        current_page,
        page_size: size,
        total_items,
        total_pages: total_items.div_ceil(size),
        has_next_page: current_page.saturating_mul(size) < total_items,
        has_previous_page: current_page > 1,
    }
}

/// Slice `items` into the requested page
pub fn paginate<T>(items: &[T], page_size: NonZeroUsize, current_page: usize) -> PageSlice<'_, T> {
    let slice: &[T] = match page_bounds(items.len(), page_size, current_page) {
        Some((start, end)) => &items[start..end],
        None => &[],
    };

    PageSlice {
        items: slice,
        info: page_info(items.len(), page_size, current_page),
    }
}

/// Page number after moving forward; unchanged on the last page
pub fn next_page(info: &PageInfo) -> usize {
    if info.has_next_page {
        info.current_page + 1
    } else {
        info.current_page
    }
}

/// Page number after moving back; never below 1
pub fn previous_page(info: &PageInfo) -> usize {
    if info.has_previous_page {
        info.current_page - 1
    } else {
        info.current_page
    }
}

/// Ready-to-run commands for the neighbouring pages
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct NavigationCommands {
    pub next_page_command: Option<String>,
    pub prev_page_command: Option<String>,
}

fn list_command(filter: &FilterState, page: usize, page_size: usize) -> String {
    let mut command = String::from("unifit exercises list");

    if let Some(category) = &filter.selected_category {
        command.push_str(&format!(" --category {}", quote_arg(category)));
    }
    if !filter.search_query.is_empty() {
        command.push_str(&format!(" --search {}", quote_arg(&filter.search_query)));
    }
    if page_size != DEFAULT_PAGE_SIZE.get() {
        command.push_str(&format!(" --page-size {page_size}"));
    }

    command.push_str(&format!(" --page {page}"));
    command
}

fn quote_arg(value: &str) -> String {
    if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('"', "\\\""))
    }
}

/// Build next/previous list commands for the given page
pub fn navigation_commands(info: &PageInfo, filter: &FilterState) -> NavigationCommands {
    NavigationCommands {
        next_page_command: info
            .has_next_page
            .then(|| list_command(filter, info.current_page + 1, info.page_size)),
        prev_page_command: info
            .has_previous_page
            .then(|| list_command(filter, info.current_page - 1, info.page_size)),
    }
}
