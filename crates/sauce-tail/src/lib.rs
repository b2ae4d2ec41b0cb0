//! Tail locator and splice engine for SAUCE metadata.
//!
//! SAUCE data lives at the very end of a host file:
//!
//! ```text
//! | host content | EOF (0x1A)? | COMNT block? | 128-byte record |
//! ```
//!
//! [`locate`] classifies that tail into a [`TailLayout`]. The [`engine`]
//! turns each read/write/remove request into a single [`Splice`] over a
//! [`TailStore`], which is implemented for growable vectors, fixed
//! caller-owned buffers ([`FixedBuffer`]) and files ([`FileStore`]).
//! The [`buffer`] and [`file`] modules are the convenience surfaces most
//! callers want.

pub mod buffer;
pub mod engine;
pub mod file;
pub mod locate;
pub mod splice;
pub mod store;

pub use engine::{WRITE_RECORD_GROWTH, write_comment_growth};
pub use locate::{CommentState, TailLayout, locate};
pub use splice::{Splice, apply_to_slice, apply_to_vec, delete_span, insert_span};
pub use store::{FileStore, FixedBuffer, TailSource, TailStore};
