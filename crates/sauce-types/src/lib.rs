//! Core SAUCE types: the fixed 128-byte record, the `COMNT` comment block,
//! and the layout constants every tail computation is built on.
//!
//! Reference: <https://www.acid.org/info/sauce/sauce.htm>

pub mod comment;
pub mod layout;
pub mod record;

pub use comment::{
    Comment, comment_lines_for, comments_equal, decode_comment_block, encode_comment_block,
};
pub use layout::{
    COMMENT_ID, COMMENT_ID_SIZE, COMMENT_LINE_LENGTH, EOF_CHAR, MAX_COMMENT_LINES, RECORD_ID,
    RECORD_SIZE, RECORD_VERSION, comment_block_size, comment_string_length, total_size,
};
pub use record::{DataType, SauceRecord};
