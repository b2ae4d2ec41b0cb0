//! In-memory surface.
//!
//! Read operations take the data as a plain slice. Mutating operations
//! come in two flavours:
//!
//! - `(buf, len)` functions work in caller-owned storage whose first `len`
//!   bytes are in use. The storage must have room for the growth: up to
//!   [`WRITE_RECORD_GROWTH`](crate::engine::WRITE_RECORD_GROWTH) bytes for
//!   [`write_record`] and
//!   [`write_comment_growth`](crate::engine::write_comment_growth) for
//!   comment writes. Too little room fails with `CapacityExceeded` and
//!   leaves the storage untouched.
//! - `*_vec` functions grow or shrink an owned `Vec<u8>`.
//!
//! All mutating functions return the new logical length.

use sauce_error::Result;
use sauce_types::{Comment, SauceRecord};

use crate::engine;
use crate::locate::TailLayout;
use crate::splice::to_usize;
use crate::store::FixedBuffer;

pub fn locate(data: &[u8]) -> Result<TailLayout> {
    crate::locate::locate(data)
}

pub fn read_record(data: &[u8]) -> Result<SauceRecord> {
    engine::read_record(data)
}

pub fn read_comment(data: &[u8], lines: u8) -> Result<Comment> {
    engine::read_comment(data, lines)
}

pub fn check(data: &[u8]) -> bool {
    engine::check(data)
}

fn with_fixed<'a>(
    buf: &'a mut [u8],
    len: usize,
    op: impl FnOnce(&mut FixedBuffer<'a>) -> Result<u64>,
) -> Result<usize> {
    let mut fixed = FixedBuffer::new(buf, len)?;
    to_usize(op(&mut fixed)?)
}

pub fn write_record(buf: &mut [u8], len: usize, record: &SauceRecord) -> Result<usize> {
    with_fixed(buf, len, |store| engine::write_record(store, record))
}

pub fn write_comment(buf: &mut [u8], len: usize, text: &[u8]) -> Result<usize> {
    with_fixed(buf, len, |store| engine::write_comment(store, text))
}

pub fn write_comment_lines(buf: &mut [u8], len: usize, text: &[u8], lines: u8) -> Result<usize> {
    with_fixed(buf, len, |store| {
        engine::write_comment_lines(store, text, lines)
    })
}

pub fn remove_record(buf: &mut [u8], len: usize) -> Result<usize> {
    with_fixed(buf, len, |store| engine::remove_record(store))
}

pub fn remove_comment(buf: &mut [u8], len: usize) -> Result<usize> {
    with_fixed(buf, len, |store| engine::remove_comment(store))
}

pub fn write_record_vec(data: &mut Vec<u8>, record: &SauceRecord) -> Result<usize> {
    to_usize(engine::write_record(data, record)?)
}

pub fn write_comment_vec(data: &mut Vec<u8>, text: &[u8]) -> Result<usize> {
    to_usize(engine::write_comment(data, text)?)
}

pub fn write_comment_lines_vec(data: &mut Vec<u8>, text: &[u8], lines: u8) -> Result<usize> {
    to_usize(engine::write_comment_lines(data, text, lines)?)
}

pub fn remove_record_vec(data: &mut Vec<u8>) -> Result<usize> {
    to_usize(engine::remove_record(data)?)
}

pub fn remove_comment_vec(data: &mut Vec<u8>) -> Result<usize> {
    to_usize(engine::remove_comment(data)?)
}
