//! Byte-span insert/delete primitives.
//!
//! Every mutation of a SAUCE tail is expressed as a [`Splice`]: remove
//! `remove` bytes at `offset` and put `insert` in their place. Buffer
//! backends apply it with exactly two primitives, [`delete_span`] and
//! [`insert_span`], so the shifting arithmetic lives in one place.

use sauce_error::{Result, SauceError};

/// One contiguous replacement inside a byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    /// Absolute offset of the first replaced byte.
    pub offset: u64,
    /// Number of bytes removed at `offset`.
    pub remove: u64,
    /// Bytes written at `offset` after the removal.
    pub insert: Vec<u8>,
}

impl Splice {
    /// Replace everything from `offset` to the end of a source of length
    /// `len` with `insert`.
    pub fn replace_tail(len: u64, offset: u64, insert: Vec<u8>) -> Result<Self> {
        let remove = len.checked_sub(offset).ok_or_else(|| {
            SauceError::internal(format!("tail offset {offset} past source length {len}"))
        })?;
        Ok(Self {
            offset,
            remove,
            insert,
        })
    }

    /// Check the splice against a source of length `len` and return the
    /// resulting length.
    pub fn resulting_len(&self, len: u64) -> Result<u64> {
        let end = self
            .offset
            .checked_add(self.remove)
            .filter(|&end| end <= len)
            .ok_or_else(|| {
                SauceError::internal(format!(
                    "splice {}+{} out of bounds for length {len}",
                    self.offset, self.remove
                ))
            })?;
        Ok(len - (end - self.offset) + self.insert.len() as u64)
    }
}

/// Insert `bytes` at `offset`, shifting `buf[offset..len]` right.
///
/// `buf` is the full backing storage and `len` the logical length in use.
/// Returns the new logical length. Nothing is touched on error.
pub fn insert_span(buf: &mut [u8], len: usize, offset: usize, bytes: &[u8]) -> Result<usize> {
    check_region(buf, len, offset, 0)?;
    let new_len = len
        .checked_add(bytes.len())
        .filter(|&new_len| new_len <= buf.len())
        .ok_or_else(|| SauceError::CapacityExceeded {
            required: len.saturating_add(bytes.len()),
            capacity: buf.len(),
        })?;
    buf.copy_within(offset..len, offset + bytes.len());
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    Ok(new_len)
}

/// Delete `count` bytes at `offset`, shifting `buf[offset + count..len]`
/// left. Returns the new logical length. Bytes between the new and old
/// length are left as they were.
pub fn delete_span(buf: &mut [u8], len: usize, offset: usize, count: usize) -> Result<usize> {
    check_region(buf, len, offset, count)?;
    buf.copy_within(offset + count..len, offset);
    Ok(len - count)
}

/// Apply `splice` to `buf[..len]`, validating capacity before any byte
/// moves.
pub fn apply_to_slice(buf: &mut [u8], len: usize, splice: &Splice) -> Result<usize> {
    let new_len = to_usize(splice.resulting_len(len as u64)?)?;
    if new_len > buf.len() {
        return Err(SauceError::CapacityExceeded {
            required: new_len,
            capacity: buf.len(),
        });
    }
    let offset = to_usize(splice.offset)?;
    let remove = to_usize(splice.remove)?;
    let len = delete_span(buf, len, offset, remove)?;
    insert_span(buf, len, offset, &splice.insert)
}

/// Apply `splice` to a growable vector.
pub fn apply_to_vec(vec: &mut Vec<u8>, splice: &Splice) -> Result<usize> {
    let len = vec.len();
    let new_len = to_usize(splice.resulting_len(len as u64)?)?;
    if new_len > len {
        vec.resize(new_len, 0);
    }
    match apply_to_slice(vec, len, splice) {
        Ok(written) => {
            vec.truncate(written);
            Ok(written)
        }
        Err(err) => {
            vec.truncate(len);
            Err(err)
        }
    }
}

pub(crate) fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| SauceError::internal(format!("offset {value} does not fit in memory")))
}

fn check_region(buf: &[u8], len: usize, offset: usize, count: usize) -> Result<()> {
    if len > buf.len() {
        return Err(SauceError::CapacityExceeded {
            required: len,
            capacity: buf.len(),
        });
    }
    match offset.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(SauceError::internal(format!(
            "span {offset}+{count} out of bounds for length {len}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_shifts_tail_right() {
        let mut buf = *b"abcdef\0\0\0";
        let len = insert_span(&mut buf, 6, 2, b"XYZ").expect("fits");
        assert_eq!(len, 9);
        assert_eq!(&buf, b"abXYZcdef");
    }

    #[test]
    fn insert_at_end_appends() {
        let mut buf = *b"ab\0\0";
        let len = insert_span(&mut buf, 2, 2, b"cd").expect("fits");
        assert_eq!(&buf[..len], b"abcd");
    }

    #[test]
    fn insert_without_room_leaves_buffer_alone() {
        let mut buf = *b"abcd\0";
        let err = insert_span(&mut buf, 4, 1, b"XY").unwrap_err();
        assert!(matches!(
            err,
            SauceError::CapacityExceeded {
                required: 6,
                capacity: 5
            }
        ));
        assert_eq!(&buf, b"abcd\0");
    }

    #[test]
    fn delete_shifts_tail_left() {
        let mut buf = *b"abXYZcdef";
        let len = delete_span(&mut buf, 9, 2, 3).expect("in bounds");
        assert_eq!(&buf[..len], b"abcdef");
    }

    #[test]
    fn delete_out_of_bounds_is_rejected() {
        let mut buf = *b"abc";
        assert!(delete_span(&mut buf, 3, 2, 2).is_err());
        assert!(delete_span(&mut buf, 4, 0, 1).is_err());
        assert_eq!(&buf, b"abc");
    }

    #[test]
    fn apply_grows_and_shrinks_in_slice() {
        let mut buf = [0u8; 16];
        buf[..6].copy_from_slice(b"hello!");
        let grow = Splice {
            offset: 5,
            remove: 1,
            insert: b", world".to_vec(),
        };
        let len = apply_to_slice(&mut buf, 6, &grow).expect("fits");
        assert_eq!(&buf[..len], b"hello, world");

        let shrink = Splice::replace_tail(len as u64, 5, Vec::new()).expect("valid");
        let len = apply_to_slice(&mut buf, len, &shrink).expect("fits");
        assert_eq!(&buf[..len], b"hello");
    }

    #[test]
    fn apply_checks_capacity_before_moving_bytes() {
        let mut buf = *b"0123456789";
        let splice = Splice {
            offset: 2,
            remove: 2,
            insert: vec![b'x'; 5],
        };
        let err = apply_to_slice(&mut buf, 10, &splice).unwrap_err();
        assert!(matches!(
            err,
            SauceError::CapacityExceeded {
                required: 13,
                capacity: 10
            }
        ));
        assert_eq!(&buf, b"0123456789");
    }

    #[test]
    fn apply_to_vec_resizes() {
        let mut data = b"content".to_vec();
        let append = Splice::replace_tail(7, 7, b"+tail".to_vec()).expect("valid");
        assert_eq!(apply_to_vec(&mut data, &append).expect("applies"), 12);
        assert_eq!(data, b"content+tail");

        let cut = Splice::replace_tail(12, 3, b"!".to_vec()).expect("valid");
        assert_eq!(apply_to_vec(&mut data, &cut).expect("applies"), 4);
        assert_eq!(data, b"con!");
    }

    #[test]
    fn replace_tail_rejects_offset_past_end() {
        assert!(Splice::replace_tail(4, 5, Vec::new()).is_err());
    }

    #[test]
    fn resulting_len_rejects_overlong_removal() {
        let splice = Splice {
            offset: 3,
            remove: 5,
            insert: Vec::new(),
        };
        assert!(splice.resulting_len(6).is_err());
        assert_eq!(splice.resulting_len(8).expect("in bounds"), 3);
    }
}
