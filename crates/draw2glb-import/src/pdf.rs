use anyhow::{anyhow, Result};
use std::panic;

/// Embedded text of the first page.
///
/// Scanned PDFs without a text layer come back as an empty string. The
/// extractor panics on some malformed files; that is reported as an error.
pub fn first_page_text(bytes: &[u8]) -> Result<String> {
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| anyhow!("PDF text extraction panicked"))?
        .map_err(|e| anyhow!("extract PDF text: {e}"))?;

    tracing::debug!(pages = pages.len(), "extracted PDF text");
    Ok(pages.into_iter().next().unwrap_or_default())
}
