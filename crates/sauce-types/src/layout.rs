//! Byte-exact SAUCE layout constants.
//!
//! A SAUCE tail looks like this (comment block and EOF marker optional):
//!
//! ```text
//! | host content | 0x1A | "COMNT" + N * 64 bytes | 128-byte record |
//! ```
//!
//! All offsets in the locator and splice engine are derived from these
//! values; `RECORD_SIZE` in particular must stay 128.

/// Required value of the record ID field.
pub const RECORD_ID: [u8; 5] = *b"SAUCE";
/// Required value of the record version field.
pub const RECORD_VERSION: [u8; 2] = *b"00";
/// Required value of the comment block ID.
pub const COMMENT_ID: [u8; 5] = *b"COMNT";

/// Size of an encoded record in bytes.
pub const RECORD_SIZE: usize = 128;
/// Length of one comment line in bytes.
pub const COMMENT_LINE_LENGTH: usize = 64;
/// Size of the `COMNT` tag that opens a comment block.
pub const COMMENT_ID_SIZE: usize = 5;
/// Largest comment line count the one-byte Comments field can express.
pub const MAX_COMMENT_LINES: u8 = u8::MAX;
/// End-of-file marker conventionally placed before SAUCE data.
pub const EOF_CHAR: u8 = 0x1A;

/// Size in bytes of a comment block holding `lines` lines, including the
/// `COMNT` tag. Zero lines means no block at all.
#[must_use]
pub const fn comment_block_size(lines: u8) -> usize {
    if lines == 0 {
        0
    } else {
        lines as usize * COMMENT_LINE_LENGTH + COMMENT_ID_SIZE
    }
}

/// Length of the comment text carried by `lines` lines (tag excluded).
#[must_use]
pub const fn comment_string_length(lines: u8) -> usize {
    lines as usize * COMMENT_LINE_LENGTH
}

/// Size of a record plus an optional comment block of `lines` lines.
/// The EOF marker is not included.
#[must_use]
pub const fn total_size(lines: u8) -> usize {
    RECORD_SIZE + comment_block_size(lines)
}
