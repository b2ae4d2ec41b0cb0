//! Read, write and remove operations over any [`TailStore`].
//!
//! Each mutation plans one [`Splice`] that replaces the tail from some
//! offset to the end of the source, then hands it to the store. The store
//! applies it as a unit, so a failed operation leaves the source as it was.

use sauce_error::{Result, SauceError};
use sauce_types::{
    Comment, EOF_CHAR, RECORD_SIZE, SauceRecord, comment_block_size, comment_lines_for,
    decode_comment_block,
};
use tracing::{debug, warn};

use crate::locate::{CommentState, TailLayout, locate};
use crate::splice::{Splice, to_usize};
use crate::store::{TailSource, TailStore};

/// Worst-case growth of [`write_record`]: an EOF marker plus a record.
pub const WRITE_RECORD_GROWTH: usize = RECORD_SIZE + 1;

/// Worst-case growth of [`write_comment_lines`] for a block of `lines`.
pub const fn write_comment_growth(lines: u8) -> usize {
    comment_block_size(lines) + 1
}

/// Decode the record at the tail. A broken comment does not prevent this.
pub fn read_record<S>(source: &S) -> Result<SauceRecord>
where
    S: TailSource + ?Sized,
{
    locate(source).map(|layout| layout.record)
}

/// Read up to `requested` comment lines.
///
/// A record without a comment yields an empty [`Comment`]. Asking for more
/// lines than are stored returns all of them.
pub fn read_comment<S>(source: &S, requested: u8) -> Result<Comment>
where
    S: TailSource + ?Sized,
{
    let layout = locate(source)?;
    if let Some(err) = layout.comment_error() {
        return Err(err);
    }
    let Some(offset) = layout.comment_offset() else {
        return Ok(Comment::default());
    };
    let lines = requested.min(layout.declared_lines);
    if lines == 0 {
        return Ok(Comment::default());
    }
    let mut block = vec![0u8; comment_block_size(lines)];
    source.read_exact_at(offset, &mut block)?;
    decode_comment_block(&block, lines)
}

/// Whether the source holds a record whose comment state is consistent.
/// Never fails; every defect reads as `false`.
pub fn check<S>(source: &S) -> bool
where
    S: TailSource + ?Sized,
{
    match locate(source) {
        Ok(layout) => layout.comment.is_consistent(),
        Err(err) => {
            debug!(error = %err, "sauce check failed");
            false
        }
    }
}

/// Write `record` to the tail and return the new length.
///
/// Without a record, an EOF marker and the record are appended, with the
/// Comments field forced to 0. With a record, it is replaced in place and
/// the existing Comments field is kept; an EOF marker is inserted before
/// the span unless the byte there already is one.
pub fn write_record<S>(store: &mut S, record: &SauceRecord) -> Result<u64>
where
    S: TailStore + ?Sized,
{
    let splice = match locate(&*store) {
        Ok(layout) => plan_replace_record(&*store, &layout, record)?,
        Err(err) if err.is_absent() => {
            let len = store.byte_len();
            debug!(len, error = %err, "appending sauce record");
            let mut tail = Vec::with_capacity(WRITE_RECORD_GROWTH);
            tail.push(EOF_CHAR);
            tail.extend_from_slice(&with_comments(record, 0).encode());
            Splice::replace_tail(len, len, tail)?
        }
        Err(err) => return Err(err),
    };
    apply(store, &splice)
}

fn plan_replace_record<S>(store: &S, layout: &TailLayout, record: &SauceRecord) -> Result<Splice>
where
    S: TailSource + ?Sized,
{
    let encoded = with_comments(record, layout.declared_lines).encode();
    if layout.has_eof {
        return Splice::replace_tail(layout.source_len, layout.record_offset, encoded.to_vec());
    }

    warn!(
        span_start = layout.span_start,
        "no EOF marker before sauce span, inserting one"
    );
    let block_len = to_usize(layout.record_offset - layout.span_start)?;
    let mut tail = Vec::with_capacity(1 + block_len + RECORD_SIZE);
    tail.push(EOF_CHAR);
    tail.resize(1 + block_len, 0);
    store.read_exact_at(layout.span_start, &mut tail[1..])?;
    tail.extend_from_slice(&encoded);
    Splice::replace_tail(layout.source_len, layout.span_start, tail)
}

/// Write `text` as the comment, sized by [`comment_lines_for`].
pub fn write_comment<S>(store: &mut S, text: &[u8]) -> Result<u64>
where
    S: TailStore + ?Sized,
{
    write_comment_lines(store, text, comment_lines_for(text))
}

/// Write `text` as a comment of exactly `lines` lines, replacing any
/// existing block, and set the record's Comments field to match.
///
/// Zero lines drops the block while keeping the record. Fails when there
/// is no record or the existing comment is broken.
pub fn write_comment_lines<S>(store: &mut S, text: &[u8], lines: u8) -> Result<u64>
where
    S: TailStore + ?Sized,
{
    let layout = locate(&*store)?;
    if let Some(err) = layout.comment_error() {
        return Err(err);
    }
    let block = Comment::with_lines(text, lines).to_block();
    let mut tail = Vec::with_capacity(1 + block.len() + RECORD_SIZE);
    tail.push(EOF_CHAR);
    tail.extend_from_slice(&block);
    tail.extend_from_slice(&with_comments(&layout.record, lines).encode());
    debug!(
        old_lines = layout.declared_lines,
        new_lines = lines,
        from = layout.content_end(),
        "replacing sauce comment"
    );
    apply(
        store,
        &Splice::replace_tail(layout.source_len, layout.content_end(), tail)?,
    )
}

/// Remove the comment block, keep the record with Comments reset to 0,
/// and leave exactly one EOF marker in front of it.
pub fn remove_comment<S>(store: &mut S) -> Result<u64>
where
    S: TailStore + ?Sized,
{
    let layout = locate(&*store)?;
    match layout.comment {
        CommentState::Present => {}
        CommentState::Absent => return Err(SauceError::NoComment),
        CommentState::Missing | CommentState::TooShort => {
            return Err(layout
                .comment_error()
                .unwrap_or(SauceError::CommentNotFound {
                    lines: layout.declared_lines,
                }));
        }
    }
    let mut tail = Vec::with_capacity(1 + RECORD_SIZE);
    tail.push(EOF_CHAR);
    tail.extend_from_slice(&with_comments(&layout.record, 0).encode());
    apply(
        store,
        &Splice::replace_tail(layout.source_len, layout.content_end(), tail)?,
    )
}

/// Remove the record, its comment block and the EOF marker before them.
pub fn remove_record<S>(store: &mut S) -> Result<u64>
where
    S: TailStore + ?Sized,
{
    let layout = locate(&*store)?;
    if let Some(err) = layout.comment_error() {
        return Err(err);
    }
    apply(
        store,
        &Splice::replace_tail(layout.source_len, layout.content_end(), Vec::new())?,
    )
}

fn with_comments(record: &SauceRecord, lines: u8) -> SauceRecord {
    SauceRecord {
        comments: lines,
        ..record.clone()
    }
}

fn apply<S>(store: &mut S, splice: &Splice) -> Result<u64>
where
    S: TailStore + ?Sized,
{
    let new_len = splice.resulting_len(store.byte_len())?;
    store.splice(splice)?;
    debug!(
        offset = splice.offset,
        removed = splice.remove,
        inserted = splice.insert.len(),
        new_len,
        "sauce tail spliced"
    );
    Ok(new_len)
}
