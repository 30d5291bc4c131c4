//! FILENAME: pipeline-engine/src/pagination.rs
//! Windowing of the final ordered sequence.

use serde::Serialize;

use crate::definition::{NullGroupPlacement, PaginationWindow};
use crate::grouping::GroupNode;

/// Position metadata for the page that was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub offset: usize,
    /// Requested page size (the item count when unpaginated).
    pub size: usize,
    /// Items available for paging.
    pub total_items: usize,
    pub page_index: usize,
    pub page_count: usize,
}

impl PageInfo {
    pub fn new(total_items: usize, window: Option<PaginationWindow>) -> Self {
        match window {
            Some(w) if w.size > 0 => PageInfo {
                offset: w.offset,
                size: w.size,
                total_items,
                page_index: w.offset / w.size,
                page_count: total_items.div_ceil(w.size),
            },
            // A zero-size window yields an empty page.
            Some(w) => PageInfo {
                offset: w.offset,
                size: 0,
                total_items,
                page_index: 0,
                page_count: 0,
            },
            None => PageInfo {
                offset: 0,
                size: total_items,
                total_items,
                page_index: 0,
                page_count: usize::from(total_items > 0),
            },
        }
    }

    pub fn has_next(&self) -> bool {
        self.size > 0 && self.offset.saturating_add(self.size) < self.total_items
    }

    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }
}

impl Default for PageInfo {
    fn default() -> Self {
        PageInfo::new(0, None)
    }
}

/// The items at `[offset, offset + size)`, clamped to the sequence. An
/// offset at or past the end gives an empty page.
pub fn paginate<T: Clone>(items: &[T], window: Option<PaginationWindow>) -> Vec<T> {
    match window {
        None => items.to_vec(),
        Some(w) => {
            if w.offset >= items.len() {
                return Vec::new();
            }
            let end = w.offset.saturating_add(w.size).min(items.len());
            items[w.offset..end].to_vec()
        }
    }
}

/// Pages over top-level groups. With `FirstPageOnly`, the null-sentinel
/// group is left out of the paged list and shown ahead of the first page.
pub fn paginate_groups(
    groups: &[GroupNode],
    window: Option<PaginationWindow>,
    placement: NullGroupPlacement,
) -> (Vec<GroupNode>, PageInfo) {
    match placement {
        NullGroupPlacement::Uniform => (paginate(groups, window), PageInfo::new(groups.len(), window)),
        NullGroupPlacement::FirstPageOnly => {
            let (null_groups, keyed): (Vec<GroupNode>, Vec<GroupNode>) =
                groups.iter().cloned().partition(|g| g.group_key.is_null());
            let mut page = paginate(&keyed, window);
            let first_page = window.map_or(true, |w| w.offset == 0);
            if first_page && !null_groups.is_empty() {
                let mut with_nulls = null_groups;
                with_nulls.append(&mut page);
                page = with_nulls;
            }
            (page, PageInfo::new(keyed.len(), window))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_slicing() {
        let items: Vec<u32> = (0..5).collect();
        assert_eq!(paginate(&items, Some(PaginationWindow::new(0, 2))), vec![0, 1]);
        assert_eq!(paginate(&items, Some(PaginationWindow::new(4, 2))), vec![4]);
        assert!(paginate(&items, Some(PaginationWindow::new(5, 2))).is_empty());
        assert_eq!(paginate(&items, None).len(), 5);
    }

    #[test]
    fn test_pages_cover_sequence() {
        let items: Vec<u32> = (0..7).collect();
        let mut seen = Vec::new();
        for page in 0..4 {
            seen.extend(paginate(&items, Some(PaginationWindow::page(page, 3))));
        }
        assert_eq!(seen, items);
    }

    #[test]
    fn test_page_info() {
        let info = PageInfo::new(7, Some(PaginationWindow::page(1, 3)));
        assert_eq!(info.page_index, 1);
        assert_eq!(info.page_count, 3);
        assert!(info.has_next());
        assert!(info.has_previous());

        let all = PageInfo::new(0, None);
        assert_eq!(all.page_count, 0);
        assert!(!all.has_next());
    }

    #[test]
    fn test_zero_size_window_reports_empty_page() {
        let items: Vec<u32> = (0..4).collect();
        let window = Some(PaginationWindow::new(0, 0));
        assert!(paginate(&items, window).is_empty());

        let info = PageInfo::new(items.len(), window);
        assert_eq!(info.size, 0);
        assert_eq!(info.page_count, 0);
        assert_eq!(info.total_items, 4);
        assert!(!info.has_next());
    }
}
