//! `COMNT` comment block codec.
//!
//! A block is the 5-byte tag followed by `lines` fixed 64-byte lines. The
//! line count is not stored in the block itself; it lives in the record's
//! Comments field.

use std::borrow::Cow;

use sauce_error::{Result, SauceError};
use tracing::trace;

use crate::layout::{
    COMMENT_ID, COMMENT_ID_SIZE, COMMENT_LINE_LENGTH, MAX_COMMENT_LINES, comment_block_size,
    comment_string_length,
};

/// Owned comment text: exactly `lines * 64` bytes.
///
/// The byte length is always derived from the line count, so the two can
/// never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Comment {
    lines: u8,
    text: Vec<u8>,
}

impl Comment {
    /// Build a comment sized by [`comment_lines_for`]. Text past 255 lines
    /// is dropped; the last line is space padded.
    #[must_use]
    pub fn new(text: impl AsRef<[u8]>) -> Self {
        let text = text.as_ref();
        Self::with_lines(text, comment_lines_for(text))
    }

    /// Build a comment with an explicit line count, truncating or space
    /// padding `text` to fit.
    #[must_use]
    pub fn with_lines(text: impl AsRef<[u8]>, lines: u8) -> Self {
        Self {
            lines,
            text: fit_text(text.as_ref(), lines),
        }
    }

    /// Number of 64-byte lines.
    #[must_use]
    pub const fn lines(&self) -> u8 {
        self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Raw comment bytes, `lines * 64` long, padding included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    /// Iterate the individual 64-byte lines.
    pub fn line_iter(&self) -> impl Iterator<Item = &[u8]> {
        self.text.chunks_exact(COMMENT_LINE_LENGTH)
    }

    /// Text with trailing spaces and NULs removed, lossily decoded.
    #[must_use]
    pub fn text_lossy(&self) -> Cow<'_, str> {
        let end = self
            .text
            .iter()
            .rposition(|&byte| byte != b' ' && byte != 0)
            .map_or(0, |idx| idx + 1);
        String::from_utf8_lossy(&self.text[..end])
    }

    /// Encode as a full `COMNT` block.
    #[must_use]
    pub fn to_block(&self) -> Vec<u8> {
        encode_comment_block(&self.text, self.lines)
    }

    /// A copy holding only the first `lines` lines (or all of them, if
    /// fewer are stored).
    #[must_use]
    pub fn prefix(&self, lines: u8) -> Self {
        let lines = lines.min(self.lines);
        Self {
            lines,
            text: self.text[..comment_string_length(lines)].to_vec(),
        }
    }
}

/// Number of 64-byte lines needed to hold `text`: 0 for empty input,
/// otherwise `ceil(len / 64)`, saturating at 255.
#[must_use]
pub fn comment_lines_for(text: impl AsRef<[u8]>) -> u8 {
    let lines = text.as_ref().len().div_ceil(COMMENT_LINE_LENGTH);
    u8::try_from(lines).unwrap_or(MAX_COMMENT_LINES)
}

/// Encode `text` as a `COMNT` block of exactly `lines` lines. Short text is
/// space padded, long text truncated. Zero lines yields an empty vector.
#[must_use]
pub fn encode_comment_block(text: &[u8], lines: u8) -> Vec<u8> {
    if lines == 0 {
        return Vec::new();
    }
    let mut block = Vec::with_capacity(comment_block_size(lines));
    block.extend_from_slice(&COMMENT_ID);
    block.extend_from_slice(&fit_text(text, lines));
    block
}

/// Decode a block declared to hold `lines` lines.
///
/// `block` must start at the `COMNT` tag and hold at least
/// `comment_block_size(lines)` bytes; anything after that is ignored.
pub fn decode_comment_block(block: &[u8], lines: u8) -> Result<Comment> {
    if lines == 0 {
        return Ok(Comment::default());
    }
    let required = comment_block_size(lines);
    if block.len() < required {
        return Err(SauceError::CommentTooShort {
            lines,
            required: required as u64,
            available: block.len() as u64,
        });
    }
    if block[..COMMENT_ID_SIZE] != COMMENT_ID {
        return Err(SauceError::CommentNotFound { lines });
    }
    trace!(lines, "decoded comment block");
    Ok(Comment {
        lines,
        text: block[COMMENT_ID_SIZE..required].to_vec(),
    })
}

/// Compare the first `lines * 64` bytes of two comment texts. Bytes past
/// that point are not compared; a side too short to hold them is unequal.
#[must_use]
pub fn comments_equal(a: &[u8], b: &[u8], lines: u8) -> bool {
    let len = comment_string_length(lines);
    match (a.get(..len), b.get(..len)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn fit_text(text: &[u8], lines: u8) -> Vec<u8> {
    let len = comment_string_length(lines);
    let copied = text.len().min(len);
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&text[..copied]);
    out.resize(len, b' ');
    out
}
