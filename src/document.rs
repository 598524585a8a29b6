/*!
 * Page-unit data model.
 *
 * A document is ingested into an ordered sequence of page units, each tagged
 * as extractable text or as an image that must go through a vision model.
 * The page index is the sole join key across the whole pipeline: page units,
 * translation results, and cache record keys all share it.
 */

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// How a page must be handed to the translator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Page with extractable text content
    Text,
    /// Page that must be translated from a rendered image
    Image,
}

/// Content payload of a single page
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Extracted page text
    Text(String),
    /// Encoded page image (PNG or JPEG bytes)
    Image(Bytes),
}

/// One page of the source document, immutable once produced by ingestion
#[derive(Debug, Clone)]
pub struct PageUnit {
    /// 1-based page number, unique and contiguous with the document order
    pub index: u32,

    /// Whether the page carries text or an image
    pub kind: PageKind,

    /// The page payload
    pub content: PageContent,
}

impl PageUnit {
    /// Create a text page unit
    pub fn text(index: u32, content: impl Into<String>) -> Self {
        Self {
            index,
            kind: PageKind::Text,
            content: PageContent::Text(content.into()),
        }
    }

    /// Create an image page unit
    pub fn image(index: u32, content: impl Into<Bytes>) -> Self {
        Self {
            index,
            kind: PageKind::Image,
            content: PageContent::Image(content.into()),
        }
    }
}

/// Completed translation of a single page, produced exactly once per
/// successfully translated page unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTranslation {
    /// Page number, mirrors the source `PageUnit` index
    pub index: u32,

    /// Original page text (empty for image pages, where the provider
    /// transcription serves as the original)
    pub original: String,

    /// Translated page text
    pub translated: String,
}

/// Record of a page whose translation permanently failed.
///
/// A failed page does not occupy a cache slot and does not abort the batch;
/// it is surfaced through the progress callback and in the final report, and
/// a subsequent resume run will retry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    /// Page number of the failed unit
    pub index: u32,

    /// Description of the last error after retries were exhausted
    pub error: String,
}
