/*!
 * Document ingestion collaborators.
 *
 * Turns source material into the ordered page-unit list the pipeline
 * consumes: form-feed-delimited text (the page delimiter pdftotext emits),
 * or a directory of numbered page images. PDF parsing itself is out of
 * scope; these loaders consume what an upstream extractor produced.
 */

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use log::debug;

use crate::document::PageUnit;

/// Form feed, the page delimiter used by pdftotext and friends
const PAGE_DELIMITER: char = '\u{0c}';

/// Split extracted document text into ordered text page units.
///
/// Pages are separated by form feeds; a document without any form feed is a
/// single page. Indices are 1-based and contiguous. A trailing delimiter
/// does not produce an extra empty page.
pub fn pages_from_text(text: &str) -> Vec<PageUnit> {
    let trimmed = text.strip_suffix(PAGE_DELIMITER).unwrap_or(text);
    if trimmed.is_empty() {
        return Vec::new();
    }

    trimmed
        .split(PAGE_DELIMITER)
        .enumerate()
        .map(|(i, page)| PageUnit::text(i as u32 + 1, page))
        .collect()
}

/// Load a text document from disk and split it into page units
pub fn pages_from_text_file(path: impl AsRef<Path>) -> Result<Vec<PageUnit>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read text document: {:?}", path))?;

    let pages = pages_from_text(&text);
    debug!("Ingested {} text pages from {:?}", pages.len(), path);
    Ok(pages)
}

/// Load a directory of rendered page images as image page units.
///
/// Accepts `.png`, `.jpg`, and `.jpeg` files; pages are ordered by file
/// name, which matches page order for the zero-padded `page_NNN` naming an
/// upstream renderer produces. Indices are assigned 1-based in that order.
pub fn pages_from_image_dir(dir: impl AsRef<Path>) -> Result<Vec<PageUnit>> {
    let dir = dir.as_ref();
    let mut image_files: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read image directory: {:?}", dir))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false)
        })
        .collect();

    image_files.sort();

    let mut pages = Vec::with_capacity(image_files.len());
    for (i, path) in image_files.iter().enumerate() {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read page image: {:?}", path))?;
        pages.push(PageUnit::image(i as u32 + 1, Bytes::from(bytes)));
    }

    debug!("Ingested {} image pages from {:?}", pages.len(), dir);
    Ok(pages)
}
