/*!
 * Bounded-size text chunking for services with input-length limits.
 */

use std::iter::FusedIterator;

/// Splits a text into contiguous chunks of at most `max_chars` characters.
///
/// Chunks cover the text without overlap or gaps, except that chunks which are
/// whitespace-only are skipped. A text no longer than the limit yields itself.
/// Iteration is lazy and can be restarted any number of times.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker<'a> {
    text: &'a str,
    max_chars: usize,
}

impl<'a> TextChunker<'a> {
    /// Create a chunker. A zero limit is treated as one character.
    pub fn new(text: &'a str, max_chars: usize) -> Self {
        Self {
            text,
            max_chars: max_chars.max(1),
        }
    }

    /// Start a fresh pass over the chunks.
    pub fn chunks(&self) -> Chunks<'a> {
        Chunks {
            rest: self.text,
            max_chars: self.max_chars,
        }
    }

    /// Number of chunks a pass will yield.
    pub fn count(&self) -> usize {
        self.chunks().count()
    }
}

impl<'a> IntoIterator for &TextChunker<'a> {
    type Item = &'a str;
    type IntoIter = Chunks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks()
    }
}

/// Iterator over the chunks of a `TextChunker`.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_chars: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.rest.is_empty() {
            let end = self
                .rest
                .char_indices()
                .nth(self.max_chars)
                .map(|(index, _)| index)
                .unwrap_or(self.rest.len());
            let (chunk, tail) = self.rest.split_at(end);
            self.rest = tail;
            if !chunk.trim().is_empty() {
                return Some(chunk);
            }
        }
        None
    }
}

impl FusedIterator for Chunks<'_> {}
