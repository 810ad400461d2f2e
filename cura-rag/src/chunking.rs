//! Chunking of page blocks into overlapping, embeddable windows.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`]: fixed character windows with an exact overlap
//! - [`RecursiveChunker`]: splits on paragraphs, lines, sentences, then words
//!
//! Sizes are counted in characters, never bytes, so multi-byte text is never
//! cut inside a code point. Chunks never cross a page boundary: every chunk
//! inherits the page of the block it was cut from.

use crate::document::{DocumentChunk, PageBlock};

/// A strategy for splitting page blocks into chunks.
///
/// Implementations produce [`DocumentChunk`]s with text and page but no
/// embeddings. Embeddings are attached later by the populator.
pub trait Chunker: Send + Sync {
    /// Split page blocks into an ordered sequence of chunks.
    ///
    /// Blocks with empty or whitespace-only text produce no chunks.
    fn chunk(&self, blocks: &[PageBlock]) -> Vec<DocumentChunk>;
}

/// Splits each page into fixed-size character windows.
///
/// Consecutive chunks of the same page share exactly `chunk_overlap`
/// characters, and no chunk exceeds `chunk_size` characters. Windows start
/// every `chunk_size - chunk_overlap` characters, so only statements of at
/// most `chunk_overlap + 1` characters are guaranteed to appear whole in
/// some chunk, wherever they fall on the page.
///
/// # Example
///
/// ```rust,ignore
/// use cura_rag::{FixedSizeChunker, PageBlock};
///
/// let chunker = FixedSizeChunker::new(1000, 200);
/// let chunks = chunker.chunk(&[PageBlock::new(text, 42)]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: characters shared by consecutive chunks; must be
    ///   smaller than `chunk_size` (see [`RagConfig`](crate::RagConfig))
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, blocks: &[PageBlock]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        for block in blocks {
            if block.text.trim().is_empty() {
                continue;
            }
            for text in split_by_size(&block.text, self.chunk_size, self.chunk_overlap) {
                push_chunk(&mut chunks, text, block.page);
            }
        }
        chunks
    }
}

/// Splits each page hierarchically: paragraphs → lines → sentences → words.
///
/// Pieces are merged greedily up to `chunk_size`. Each new chunk starts with
/// the tail of the previous one (at most `chunk_overlap` characters, trimmed
/// to a word boundary when possible). Runs with no separator at all fall back
/// to fixed-size windows. Chunks never exceed `chunk_size`, but the overlap
/// span is approximate.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

impl Chunker for RecursiveChunker {
    fn chunk(&self, blocks: &[PageBlock]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        for block in blocks {
            if block.text.trim().is_empty() {
                continue;
            }
            let pieces = split_recursive(&block.text, self.chunk_size, &SEPARATORS);
            for text in merge_with_overlap(pieces, self.chunk_size, self.chunk_overlap) {
                if !text.trim().is_empty() {
                    push_chunk(&mut chunks, text, block.page);
                }
            }
        }
        chunks
    }
}

fn push_chunk(chunks: &mut Vec<DocumentChunk>, text: String, page: u32) {
    let id = format!("{page}_{}", chunks.len());
    chunks.push(DocumentChunk { id, text, page, source_vectors: Vec::new() });
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Character-based windows with overlap. The final window ends at the end of
/// the text; no window is a suffix of the one before it.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    // Byte offset of every char boundary, plus the end of the string.
    let boundaries: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let total = boundaries.len() - 1;
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(total);
        chunks.push(text[boundaries[start]..boundaries[end]].to_string());
        if end == total {
            break;
        }
        start += step;
    }
    chunks
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Break `text` into pieces no longer than `chunk_size`, using the coarsest
/// separator that works.
fn split_recursive(text: &str, chunk_size: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }
    // Pieces must stay contiguous; overlap is added when merging.
    let Some((separator, rest)) = separators.split_first() else {
        return split_by_size(text, chunk_size, 0);
    };

    let segments = split_keeping_separator(text, separator);
    if segments.len() == 1 {
        return split_recursive(text, chunk_size, rest);
    }

    segments.into_iter().flat_map(|segment| split_recursive(segment, chunk_size, rest)).collect()
}

/// Greedily merge pieces up to `chunk_size`, seeding each new chunk with the
/// tail of the previous one.
fn merge_with_overlap(pieces: Vec<String>, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        let piece_len = char_len(&piece);
        if current_len + piece_len <= chunk_size {
            current.push_str(&piece);
            current_len += piece_len;
            continue;
        }

        let tail = overlap_tail(&current, chunk_overlap);
        let tail_len = char_len(tail);
        let next = if tail_len + piece_len <= chunk_size {
            let mut next = String::with_capacity(tail.len() + piece.len());
            next.push_str(tail);
            next.push_str(&piece);
            next
        } else {
            piece
        };
        if !current.is_empty() {
            chunks.push(std::mem::replace(&mut current, next));
        } else {
            current = next;
        }
        current_len = char_len(&current);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// The last `max_chars` characters of `text`, advanced past the first
/// whitespace so the overlap starts on a word.
fn overlap_tail(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    let len = char_len(text);
    if len <= max_chars {
        return text;
    }
    let start = text.char_indices().nth(len - max_chars).map_or(text.len(), |(i, _)| i);
    let tail = &text[start..];
    match tail.find(char::is_whitespace) {
        Some(ws) if ws + 1 < tail.len() => tail[ws..].trim_start(),
        _ => tail,
    }
}
