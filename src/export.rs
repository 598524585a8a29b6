/*!
 * Output rendering collaborators.
 *
 * Consumes the ordered page list the pipeline produces and writes text
 * documents: translation only, or bilingual pages with per-language section
 * headers. Rich formats (DOCX, PDF) are out of scope; these writers are the
 * reference consumers of the core's output contract.
 */

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::document::PageTranslation;

/// Write the translated pages as a single text document, pages separated by
/// blank lines.
pub fn write_translated_text(pages: &[PageTranslation], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let merged = pages
        .iter()
        .map(|page| page.translated.trim())
        .collect::<Vec<_>>()
        .join("\n\n");

    fs::write(path, merged)
        .with_context(|| format!("Failed to write translated document: {:?}", path))?;
    info!("Wrote {} translated pages to {:?}", pages.len(), path);
    Ok(())
}

/// Write original and translation side by side, one labeled section pair
/// per page.
pub fn write_bilingual_text(
    pages: &[PageTranslation],
    path: impl AsRef<Path>,
    source_language: &str,
    target_language: &str,
) -> Result<()> {
    let path = path.as_ref();
    let merged = pages
        .iter()
        .map(|page| {
            format!(
                "# {} #\n{}\n\n# {} #\n{}",
                source_language,
                page.original.trim(),
                target_language,
                page.translated.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    fs::write(path, merged)
        .with_context(|| format!("Failed to write bilingual document: {:?}", path))?;
    info!("Wrote {} bilingual pages to {:?}", pages.len(), path);
    Ok(())
}
