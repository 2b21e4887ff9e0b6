//! Word-aware wrapping for streamed text
//!
//! Text arrives from the model in arbitrary chunks. The wrapper keeps its
//! position across chunks so a word split between two chunks is still
//! wrapped as one word.

use super::console::RIGHT_PADDING;

/// A piece of output produced by the wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Left padding at the start of a line
    Indent(usize),
    /// Visible text (a word or a single whitespace char)
    Text(String),
    /// Line break
    Newline,
}

/// Incremental word wrapper with left padding
#[derive(Debug, Clone)]
pub struct WordWrapper {
    indent: usize,
    wrap: bool,
    max_line_width: usize,
    position: usize,
    word: String,
    at_line_start: bool,
}

impl WordWrapper {
    pub fn new(width: usize, indent: usize, wrap: bool) -> Self {
        let max_line_width = width
            .saturating_sub(indent)
            .saturating_sub(RIGHT_PADDING)
            .max(1);
        Self {
            indent,
            wrap,
            max_line_width,
            position: 0,
            word: String::new(),
            at_line_start: true,
        }
    }

    pub fn max_line_width(&self) -> usize {
        self.max_line_width
    }

    /// True when the next char will start a fresh line
    pub fn at_line_start(&self) -> bool {
        self.at_line_start
    }

    /// Feed a chunk of text, returning what can be written so far
    pub fn push(&mut self, chunk: &str) -> Vec<Fragment> {
        let mut out = Vec::new();

        for c in chunk.chars() {
            if self.at_line_start {
                out.push(Fragment::Indent(self.indent));
                self.at_line_start = false;
                self.position = 0;
            }

            if c == '\n' {
                if !self.word.is_empty() {
                    out.push(Fragment::Text(std::mem::take(&mut self.word)));
                }
                out.push(Fragment::Newline);
                self.at_line_start = true;
            } else if (c == ' ' || c == '\t') && self.wrap {
                if !self.word.is_empty() {
                    let len = self.word.chars().count();
                    if self.position + len > self.max_line_width {
                        out.push(Fragment::Newline);
                        out.push(Fragment::Indent(self.indent));
                        self.position = 0;
                    }
                    out.push(Fragment::Text(std::mem::take(&mut self.word)));
                    self.position += len;
                }
                out.push(Fragment::Text(c.to_string()));
                self.position += 1;
            } else {
                self.word.push(c);
            }
        }

        out
    }

    /// Flush the buffered word at the end of the stream
    pub fn finish(&mut self) -> Vec<Fragment> {
        let mut out = Vec::new();
        if self.word.is_empty() {
            return out;
        }

        let len = self.word.chars().count();
        if self.wrap && self.position + len > self.max_line_width {
            out.push(Fragment::Newline);
            out.push(Fragment::Indent(self.indent));
            self.position = 0;
        }
        out.push(Fragment::Text(std::mem::take(&mut self.word)));
        self.position += len;
        out
    }
}
