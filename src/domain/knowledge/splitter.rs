//! Recursive character text splitter.
//!
//! Breaks text into chunks no longer than `chunk_size` characters, trying
//! paragraph breaks first, then lines, sentences, words and finally single
//! characters. Adjacent chunks share up to `chunk_overlap` characters of
//! trailing context.

use std::collections::VecDeque;

use crate::domain::foundation::ValidationError;

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Splits documents into overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl TextSplitter {
    /// # Errors
    ///
    /// - `InvalidFormat` if `chunk_size` is zero or `chunk_overlap >= chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ValidationError> {
        if chunk_size == 0 {
            return Err(ValidationError::invalid_format(
                "chunk_size",
                "must be greater than zero",
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ValidationError::invalid_format(
                "chunk_overlap",
                "must be smaller than chunk_size",
            ));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits `text` into trimmed, non-empty chunks in document order.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, SEPARATORS)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let idx = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(idx).copied().unwrap_or("");
        let remaining = separators.get(idx + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    /// Packs small pieces into chunks, carrying overlap from one chunk to the next.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let piece_len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { sep_len };

            if total + piece_len + joiner > self.chunk_size && !current.is_empty() {
                docs.push(join(&current, separator));

                while total > self.chunk_overlap
                    || (total > 0
                        && total + piece_len + if current.is_empty() { 0 } else { sep_len }
                            > self.chunk_size)
                {
                    let Some(removed) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(removed) + if current.is_empty() { 0 } else { sep_len };
                }
            }

            total += piece_len + if current.is_empty() { 0 } else { sep_len };
            current.push_back(piece);
        }

        if !current.is_empty() {
            docs.push(join(&current, separator));
        }
        docs
    }
}

fn join(pieces: &VecDeque<&str>, separator: &str) -> String {
    pieces.iter().copied().collect::<Vec<_>>().join(separator)
}
