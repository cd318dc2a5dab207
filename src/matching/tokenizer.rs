// Fixed-width character windows.
//
// A document is sliced into every run of `width` consecutive characters,
// one per starting position. Nothing is normalized: case, whitespace and
// punctuation all pass through as-is. Widths count `char`s, not bytes, so
// Japanese or emoji-heavy posts are never cut inside a character.

use std::num::NonZeroUsize;
use std::str::CharIndices;

/// Slices documents into overlapping windows of a fixed character width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    width: NonZeroUsize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            width: NonZeroUsize::MIN,
        }
    }
}

impl Tokenizer {
    pub fn new(width: NonZeroUsize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width.get()
    }

    /// Lazily iterate over the windows of `document`.
    ///
    /// Yields `chars - width + 1` tokens, or nothing when the document is
    /// shorter than the window. The iterator is `Clone`, so a scan can be
    /// restarted from any point.
    pub fn tokens<'a>(&self, document: &'a str) -> Tokens<'a> {
        let starts = document.char_indices();
        let mut ends = document.char_indices();
        // Park `ends` on the last character of the first window.
        let mut exhausted = false;
        for _ in 1..self.width.get() {
            if ends.next().is_none() {
                exhausted = true;
                break;
            }
        }
        Tokens {
            document,
            starts,
            ends,
            exhausted,
        }
    }
}

/// Iterator over the windows of one document.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    document: &'a str,
    starts: CharIndices<'a>,
    ends: CharIndices<'a>,
    exhausted: bool,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.exhausted {
            return None;
        }
        let Some((last, ch)) = self.ends.next() else {
            self.exhausted = true;
            return None;
        };
        let (start, _) = self.starts.next()?;
        Some(&self.document[start..last + ch.len_utf8()])
    }
}
