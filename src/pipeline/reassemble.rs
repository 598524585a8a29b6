/*!
 * Index-order reassembly of possibly out-of-order completions.
 */

use std::collections::BTreeMap;

use crate::document::PageTranslation;

/// Produce the ordered sequence of completed pages for a document of
/// `total_pages` pages, skipping indices that never completed.
///
/// Pure function with no failure mode; an empty cache yields an empty
/// sequence. Callers compare the returned count against `total_pages` to
/// detect partial completion.
pub fn reassemble(
    total_pages: usize,
    completed: &BTreeMap<u32, PageTranslation>,
) -> Vec<PageTranslation> {
    (1..=total_pages as u32)
        .filter_map(|index| completed.get(&index).cloned())
        .collect()
}
