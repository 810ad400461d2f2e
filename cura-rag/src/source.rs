//! Loading the reference document into page blocks.
//!
//! [`TextDocumentSource`] reads UTF-8 text where pages are separated by form
//! feeds (`\x0c`), the convention `pdftotext` emits. [`PdfDocumentSource`]
//! (feature `pdf`) extracts one block per PDF page with `pdf-extract`.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::document::PageBlock;
use crate::error::{RagError, Result};

/// Loads a reference document as page-tagged text blocks.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load `path`, returning blocks in page order. Page numbers are 1-based.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DocumentError`] if the file is missing or cannot
    /// be parsed.
    async fn load(&self, path: &Path) -> Result<Vec<PageBlock>>;
}

fn document_error(path: &Path, message: impl Into<String>) -> RagError {
    RagError::DocumentError { path: path.display().to_string(), message: message.into() }
}

fn pages_to_blocks(pages: impl IntoIterator<Item = String>) -> Vec<PageBlock> {
    pages.into_iter().zip(1u32..).map(|(text, page)| PageBlock { text, page }).collect()
}

/// Plain-text document source with form-feed page breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDocumentSource;

impl TextDocumentSource {
    /// Split already-loaded text into page blocks.
    pub fn parse(text: &str) -> Vec<PageBlock> {
        let text = text.strip_suffix('\x0c').unwrap_or(text);
        pages_to_blocks(text.split('\x0c').map(str::to_string))
    }
}

#[async_trait]
impl DocumentSource for TextDocumentSource {
    async fn load(&self, path: &Path) -> Result<Vec<PageBlock>> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| document_error(path, format!("failed to read file: {e}")))?;
        let blocks = Self::parse(&text);
        debug!(path = %path.display(), page_count = blocks.len(), "loaded text document");
        Ok(blocks)
    }
}

/// PDF document source backed by `pdf-extract`.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDocumentSource;

#[cfg(feature = "pdf")]
#[async_trait]
impl DocumentSource for PdfDocumentSource {
    async fn load(&self, path: &Path) -> Result<Vec<PageBlock>> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| document_error(path, format!("failed to read file: {e}")))?;

        // Extraction is CPU-bound; keep it off the async workers.
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })
        .await
        .map_err(|e| document_error(path, format!("extraction task failed: {e}")))?
        .map_err(|e| document_error(path, format!("PDF extraction error: {e}")))?;

        let blocks = pages_to_blocks(pages);
        debug!(path = %path.display(), page_count = blocks.len(), "loaded PDF document");
        Ok(blocks)
    }
}

/// Pick a source by file extension: PDF when the `pdf` feature is enabled,
/// plain text otherwise.
pub fn source_for_path(path: &Path) -> Result<Box<dyn DocumentSource>> {
    let is_pdf =
        path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Ok(Box::new(TextDocumentSource));
    }
    #[cfg(feature = "pdf")]
    {
        Ok(Box::new(PdfDocumentSource))
    }
    #[cfg(not(feature = "pdf"))]
    {
        Err(document_error(path, "PDF support requires the `pdf` feature"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_feeds_separate_pages() {
        let blocks = TextDocumentSource::parse("first\x0csecond\x0cthird\x0c");
        assert_eq!(
            blocks,
            vec![
                PageBlock::new("first", 1),
                PageBlock::new("second", 2),
                PageBlock::new("third", 3)
            ]
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_document_error() {
        let err = TextDocumentSource.load(Path::new("/definitely/not/here.txt")).await.unwrap_err();
        assert!(matches!(err, RagError::DocumentError { .. }));
    }

    #[test]
    fn text_paths_use_the_text_source() {
        assert!(source_for_path(Path::new("data/bnf.txt")).is_ok());
    }
}
