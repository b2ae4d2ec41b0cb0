//! Tail Locator: classify the SAUCE structure at the end of a byte source.
//!
//! The locator reads the last 128 bytes, and, if the record declares
//! comment lines, the `COMNT` tag where the block should start. It never
//! mutates the source. Every read, write and remove operation consumes the
//! [`TailLayout`] it returns instead of re-deriving offsets on its own.

use sauce_error::{Result, SauceError};
use sauce_types::{
    COMMENT_ID, COMMENT_ID_SIZE, EOF_CHAR, RECORD_SIZE, SauceRecord, comment_block_size,
};
use tracing::{debug, trace, warn};

use crate::store::TailSource;

const RECORD_LEN: u64 = RECORD_SIZE as u64;

/// State of the comment block the record declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentState {
    /// The record declares zero lines.
    Absent,
    /// A `COMNT` block of the declared size precedes the record.
    Present,
    /// The declared span fits but does not start with `COMNT`.
    Missing,
    /// The source is too short to hold the declared span.
    TooShort,
}

impl CommentState {
    /// Whether the structure is self-consistent (no comment, or a valid one).
    pub const fn is_consistent(self) -> bool {
        matches!(self, Self::Absent | Self::Present)
    }
}

/// Classification of a byte source's tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailLayout {
    /// Total length of the source.
    pub source_len: u64,
    /// Offset of the 128-byte record (`source_len - 128`).
    pub record_offset: u64,
    /// The decoded record.
    pub record: SauceRecord,
    pub comment: CommentState,
    /// Comments field of the record.
    pub declared_lines: u8,
    /// Whether the byte right before the span is `0x1A`.
    pub has_eof: bool,
    /// Start of the SAUCE span: the comment block when present, otherwise
    /// the record.
    pub span_start: u64,
    /// Length of the span (comment block when present, plus record).
    pub span_len: u64,
}

impl TailLayout {
    /// Offset of the EOF marker, if there is one.
    pub const fn eof_offset(&self) -> Option<u64> {
        if self.has_eof {
            Some(self.span_start - 1)
        } else {
            None
        }
    }

    /// Offset where host content ends: the EOF marker when present,
    /// otherwise the span start.
    pub const fn content_end(&self) -> u64 {
        if self.has_eof {
            self.span_start - 1
        } else {
            self.span_start
        }
    }

    /// Offset of the `COMNT` tag when the comment is present.
    pub fn comment_offset(&self) -> Option<u64> {
        (self.comment == CommentState::Present).then_some(self.span_start)
    }

    pub const fn has_comment(&self) -> bool {
        matches!(self.comment, CommentState::Present)
    }

    /// The error a comment-targeted operation reports for this layout, or
    /// `None` when the comment state is consistent.
    pub fn comment_error(&self) -> Option<SauceError> {
        match self.comment {
            CommentState::Absent | CommentState::Present => None,
            CommentState::Missing => Some(SauceError::CommentNotFound {
                lines: self.declared_lines,
            }),
            CommentState::TooShort => Some(SauceError::CommentTooShort {
                lines: self.declared_lines,
                required: comment_block_size(self.declared_lines) as u64,
                available: self.record_offset,
            }),
        }
    }
}

/// Classify the tail of `source`.
///
/// Fails with [`SauceError::Empty`], [`SauceError::TooShort`] or
/// [`SauceError::RecordNotFound`] when there is no record. A present record
/// with a broken comment is not an error here; it shows up as
/// [`CommentState::Missing`] or [`CommentState::TooShort`].
pub fn locate<S>(source: &S) -> Result<TailLayout>
where
    S: TailSource + ?Sized,
{
    let source_len = source.byte_len();
    if source_len == 0 {
        return Err(SauceError::Empty);
    }
    if source_len < RECORD_LEN {
        return Err(SauceError::TooShort {
            len: source_len,
            required: RECORD_LEN,
        });
    }

    let record_offset = source_len - RECORD_LEN;
    let mut raw = [0u8; RECORD_SIZE];
    source.read_exact_at(record_offset, &mut raw)?;
    trace!(source_len, record_offset, "probed record tail");

    let record = SauceRecord::decode(&raw);
    if !record.has_valid_id() {
        return Err(SauceError::RecordNotFound);
    }

    let declared_lines = record.comments;
    let (comment, span_start) = if declared_lines == 0 {
        (CommentState::Absent, record_offset)
    } else {
        let block_len = comment_block_size(declared_lines) as u64;
        match record_offset.checked_sub(block_len) {
            None => {
                warn!(
                    declared_lines,
                    record_offset, block_len, "declared comment block does not fit"
                );
                (CommentState::TooShort, record_offset)
            }
            Some(block_start) => {
                let mut tag = [0u8; COMMENT_ID_SIZE];
                source.read_exact_at(block_start, &mut tag)?;
                if tag == COMMENT_ID {
                    (CommentState::Present, block_start)
                } else {
                    warn!(
                        declared_lines,
                        block_start, "declared comment block has no COMNT tag"
                    );
                    (CommentState::Missing, record_offset)
                }
            }
        }
    };

    let has_eof = if span_start == 0 {
        false
    } else {
        let mut marker = [0u8; 1];
        source.read_exact_at(span_start - 1, &mut marker)?;
        marker[0] == EOF_CHAR
    };

    let layout = TailLayout {
        source_len,
        record_offset,
        record,
        comment,
        declared_lines,
        has_eof,
        span_start,
        span_len: source_len - span_start,
    };
    debug!(
        source_len,
        span_start,
        span_len = layout.span_len,
        declared_lines,
        comment = ?comment,
        has_eof,
        "located sauce tail"
    );
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sauce_types::encode_comment_block;

    fn record_with_lines(lines: u8) -> SauceRecord {
        SauceRecord {
            comments: lines,
            ..SauceRecord::default()
        }
    }

    #[test]
    fn empty_and_short_sources_have_no_record() {
        let empty: &[u8] = &[];
        assert!(matches!(locate(empty), Err(SauceError::Empty)));

        let short = [b'x'; 50];
        assert!(matches!(
            locate(&short[..]),
            Err(SauceError::TooShort {
                len: 50,
                required: 128
            })
        ));

        let untagged = [b'x'; 200];
        assert!(matches!(
            locate(&untagged[..]),
            Err(SauceError::RecordNotFound)
        ));
    }

    #[test]
    fn record_only_without_eof() {
        let data = SauceRecord::default().encode().to_vec();
        let layout = locate(&data).expect("record");
        assert_eq!(layout.comment, CommentState::Absent);
        assert!(!layout.has_eof);
        assert_eq!(layout.span_start, 0);
        assert_eq!(layout.span_len, 128);
        assert_eq!(layout.content_end(), 0);
        assert_eq!(layout.eof_offset(), None);
    }

    #[test]
    fn record_and_comment_with_eof() {
        let mut data = b"host".to_vec();
        data.push(EOF_CHAR);
        data.extend_from_slice(&encode_comment_block(b"hi", 2));
        data.extend_from_slice(&record_with_lines(2).encode());

        let layout = locate(&data).expect("record");
        assert_eq!(layout.comment, CommentState::Present);
        assert!(layout.has_eof);
        assert_eq!(layout.span_start, 5);
        assert_eq!(layout.span_len, 133 + 128);
        assert_eq!(layout.comment_offset(), Some(5));
        assert_eq!(layout.eof_offset(), Some(4));
        assert_eq!(layout.content_end(), 4);
        assert!(layout.comment_error().is_none());
    }

    #[test]
    fn missing_tag_keeps_record_present() {
        let mut data = vec![b'.'; 3 * 64 + 5];
        data.extend_from_slice(&record_with_lines(3).encode());
        let layout = locate(&data).expect("record");
        assert_eq!(layout.comment, CommentState::Missing);
        assert_eq!(layout.span_start, layout.record_offset);
        assert!(matches!(
            layout.comment_error(),
            Some(SauceError::CommentNotFound { lines: 3 })
        ));
    }

    #[test]
    fn declared_span_longer_than_source() {
        let mut data = vec![EOF_CHAR; 10];
        data.extend_from_slice(&record_with_lines(1).encode());
        let layout = locate(&data).expect("record");
        assert_eq!(layout.comment, CommentState::TooShort);
        assert!(layout.has_eof);
        assert!(matches!(
            layout.comment_error(),
            Some(SauceError::CommentTooShort {
                lines: 1,
                required: 69,
                available: 10
            })
        ));
    }

    #[test]
    fn orphan_comment_block_is_ignored() {
        let mut data = encode_comment_block(b"stray", 1);
        data.extend_from_slice(&record_with_lines(0).encode());
        let layout = locate(&data).expect("record");
        assert_eq!(layout.comment, CommentState::Absent);
        assert_eq!(layout.span_start, 69);
        assert!(!layout.has_eof);
    }
}
