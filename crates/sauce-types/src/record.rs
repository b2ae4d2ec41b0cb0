//! The fixed 128-byte SAUCE record.
//!
//! Field layout (little-endian numerics, no padding):
//!
//! | offset | size | field    |
//! |-------:|-----:|----------|
//! | 0      | 5    | ID       |
//! | 5      | 2    | Version  |
//! | 7      | 35   | Title    |
//! | 42     | 20   | Author   |
//! | 62     | 20   | Group    |
//! | 82     | 8    | Date     |
//! | 90     | 4    | FileSize |
//! | 94     | 1    | DataType |
//! | 95     | 1    | FileType |
//! | 96     | 2    | TInfo1   |
//! | 98     | 2    | TInfo2   |
//! | 100    | 2    | TInfo3   |
//! | 102    | 2    | TInfo4   |
//! | 104    | 1    | Comments |
//! | 105    | 1    | TFlags   |
//! | 106    | 22   | TInfoS   |

use std::fmt;

use sauce_error::{Result, SauceError};

use crate::layout::{RECORD_ID, RECORD_SIZE, RECORD_VERSION};

const TITLE_LEN: usize = 35;
const AUTHOR_LEN: usize = 20;
const GROUP_LEN: usize = 20;
const DATE_LEN: usize = 8;
const TINFOS_LEN: usize = 22;

/// Offset of the one-byte Comments field inside an encoded record.
pub const COMMENTS_OFFSET: usize = 104;

/// ID and Version.
const HEADER_LEN: usize = 5 + 2;
const TEXT_FIELDS_LEN: usize = TITLE_LEN + AUTHOR_LEN + GROUP_LEN + DATE_LEN;
/// FileSize, DataType, FileType and TInfo1 through TInfo4.
const TYPE_FIELDS_LEN: usize = 4 + 1 + 1 + (2 * 4);

const _: () = assert!(HEADER_LEN + TEXT_FIELDS_LEN + TYPE_FIELDS_LEN == COMMENTS_OFFSET);
const _: () = assert!(COMMENTS_OFFSET + 1 + 1 + TINFOS_LEN == RECORD_SIZE);

/// Broad class of the file a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    /// Undefined file type.
    None = 0,
    /// Character based file (ASCII, ANSi, RIP, ...).
    Character = 1,
    /// Bitmap graphic and animation files.
    Bitmap = 2,
    /// Vector graphic file.
    Vector = 3,
    /// Audio file.
    Audio = 4,
    /// Raw memory copy of a text mode screen (`.BIN`).
    BinaryText = 5,
    /// XBin or eXtended BIN file.
    XBin = 6,
    /// Archive file.
    Archive = 7,
    /// Executable file.
    Executable = 8,
}

impl TryFrom<u8> for DataType {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Character,
            2 => Self::Bitmap,
            3 => Self::Vector,
            4 => Self::Audio,
            5 => Self::BinaryText,
            6 => Self::XBin,
            7 => Self::Archive,
            8 => Self::Executable,
            other => return Err(other),
        })
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        value as Self
    }
}

/// A decoded SAUCE record.
///
/// Text fields are kept as fixed-width raw bytes (SAUCE text is CP437, not
/// UTF-8). Equality compares every field byte for byte, including whatever
/// follows an embedded NUL.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SauceRecord {
    pub id: [u8; 5],
    pub version: [u8; 2],
    pub title: [u8; TITLE_LEN],
    pub author: [u8; AUTHOR_LEN],
    pub group: [u8; GROUP_LEN],
    /// `CCYYMMDD`, all spaces when unknown.
    pub date: [u8; DATE_LEN],
    /// Original file size, not counting SAUCE data.
    pub file_size: u32,
    pub data_type: u8,
    pub file_type: u8,
    pub tinfo1: u16,
    pub tinfo2: u16,
    pub tinfo3: u16,
    pub tinfo4: u16,
    /// Number of comment lines; 0 means no comment block.
    pub comments: u8,
    pub tflags: u8,
    pub tinfos: [u8; TINFOS_LEN],
}

impl Default for SauceRecord {
    fn default() -> Self {
        Self {
            id: RECORD_ID,
            version: RECORD_VERSION,
            title: [b' '; TITLE_LEN],
            author: [b' '; AUTHOR_LEN],
            group: [b' '; GROUP_LEN],
            date: [b' '; DATE_LEN],
            file_size: 0,
            data_type: 0,
            file_type: 0,
            tinfo1: 0,
            tinfo2: 0,
            tinfo3: 0,
            tinfo4: 0,
            comments: 0,
            tflags: 0,
            tinfos: [0; TINFOS_LEN],
        }
    }
}

impl fmt::Debug for SauceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SauceRecord")
            .field("id", &String::from_utf8_lossy(&self.id))
            .field("version", &String::from_utf8_lossy(&self.version))
            .field("title", &String::from_utf8_lossy(&self.title))
            .field("author", &String::from_utf8_lossy(&self.author))
            .field("group", &String::from_utf8_lossy(&self.group))
            .field("date", &String::from_utf8_lossy(&self.date))
            .field("file_size", &self.file_size)
            .field("data_type", &self.data_type)
            .field("file_type", &self.file_type)
            .field("tinfo1", &self.tinfo1)
            .field("tinfo2", &self.tinfo2)
            .field("tinfo3", &self.tinfo3)
            .field("tinfo4", &self.tinfo4)
            .field("comments", &self.comments)
            .field("tflags", &self.tflags)
            .field("tinfos", &String::from_utf8_lossy(&self.tinfos))
            .finish()
    }
}

impl SauceRecord {
    /// A record with the required ID and version, spaces in the text
    /// fields and zeros everywhere else.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a record from its 128-byte encoding. The ID is not checked.
    #[must_use]
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut cursor = FieldCursor::new(bytes);
        Self {
            id: cursor.array(),
            version: cursor.array(),
            title: cursor.array(),
            author: cursor.array(),
            group: cursor.array(),
            date: cursor.array(),
            file_size: u32::from_le_bytes(cursor.array()),
            data_type: cursor.byte(),
            file_type: cursor.byte(),
            tinfo1: u16::from_le_bytes(cursor.array()),
            tinfo2: u16::from_le_bytes(cursor.array()),
            tinfo3: u16::from_le_bytes(cursor.array()),
            tinfo4: u16::from_le_bytes(cursor.array()),
            comments: cursor.byte(),
            tflags: cursor.byte(),
            tinfos: cursor.array(),
        }
    }

    /// Decode from a slice that must be exactly [`RECORD_SIZE`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: &[u8; RECORD_SIZE] = bytes.try_into().map_err(|_| {
            SauceError::invalid_argument(format!(
                "record encoding must be {RECORD_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::decode(raw))
    }

    /// Encode into the on-disk 128-byte layout.
    #[must_use]
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = FieldWriter::new();
        out.put(&self.id);
        out.put(&self.version);
        out.put(&self.title);
        out.put(&self.author);
        out.put(&self.group);
        out.put(&self.date);
        out.put(&self.file_size.to_le_bytes());
        out.put(&[self.data_type, self.file_type]);
        out.put(&self.tinfo1.to_le_bytes());
        out.put(&self.tinfo2.to_le_bytes());
        out.put(&self.tinfo3.to_le_bytes());
        out.put(&self.tinfo4.to_le_bytes());
        out.put(&[self.comments, self.tflags]);
        out.put(&self.tinfos);
        out.finish()
    }

    /// Whether the ID field holds `SAUCE`.
    #[must_use]
    pub fn has_valid_id(&self) -> bool {
        self.id == RECORD_ID
    }

    /// Known data type, or `None` for codes outside the SAUCE table.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        DataType::try_from(self.data_type).ok()
    }

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type.into();
    }

    /// Title with trailing padding removed.
    #[must_use]
    pub fn title(&self) -> &[u8] {
        trim_padding(&self.title)
    }

    #[must_use]
    pub fn author(&self) -> &[u8] {
        trim_padding(&self.author)
    }

    #[must_use]
    pub fn group(&self) -> &[u8] {
        trim_padding(&self.group)
    }

    #[must_use]
    pub fn date(&self) -> &[u8] {
        trim_padding(&self.date)
    }

    /// Type dependent string (usually a font name) without trailing NULs.
    #[must_use]
    pub fn tinfos(&self) -> &[u8] {
        trim_padding(&self.tinfos)
    }

    /// Copy `value` into the title, truncating or space padding to 35 bytes.
    pub fn set_title(&mut self, value: impl AsRef<[u8]>) {
        fill_field(&mut self.title, value.as_ref(), b' ');
    }

    pub fn set_author(&mut self, value: impl AsRef<[u8]>) {
        fill_field(&mut self.author, value.as_ref(), b' ');
    }

    pub fn set_group(&mut self, value: impl AsRef<[u8]>) {
        fill_field(&mut self.group, value.as_ref(), b' ');
    }

    /// Set the `CCYYMMDD` date field.
    pub fn set_date(&mut self, value: impl AsRef<[u8]>) {
        fill_field(&mut self.date, value.as_ref(), b' ');
    }

    /// TInfoS is a C string in the wild, so it is NUL padded.
    pub fn set_tinfos(&mut self, value: impl AsRef<[u8]>) {
        fill_field(&mut self.tinfos, value.as_ref(), 0);
    }
}

/// Sequential reader over a record encoding. Every read is in bounds
/// because the field sizes sum to `RECORD_SIZE` (checked at compile time).
struct FieldCursor<'a> {
    bytes: &'a [u8; RECORD_SIZE],
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    const fn new(bytes: &'a [u8; RECORD_SIZE]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn byte(&mut self) -> u8 {
        let [value] = self.array::<1>();
        value
    }
}

/// Sequential writer mirroring [`FieldCursor`].
struct FieldWriter {
    bytes: [u8; RECORD_SIZE],
    pos: usize,
}

impl FieldWriter {
    const fn new() -> Self {
        Self {
            bytes: [0; RECORD_SIZE],
            pos: 0,
        }
    }

    fn put(&mut self, field: &[u8]) {
        let end = self.pos + field.len();
        self.bytes[self.pos..end].copy_from_slice(field);
        self.pos = end;
    }

    fn finish(self) -> [u8; RECORD_SIZE] {
        debug_assert_eq!(self.pos, RECORD_SIZE);
        self.bytes
    }
}

fn fill_field(field: &mut [u8], value: &[u8], pad: u8) {
    let copied = value.len().min(field.len());
    field[..copied].copy_from_slice(&value[..copied]);
    field[copied..].fill(pad);
}

fn trim_padding(field: &[u8]) -> &[u8] {
    let end = field
        .iter()
        .rposition(|&byte| byte != b' ' && byte != 0)
        .map_or(0, |idx| idx + 1);
    &field[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_record() -> SauceRecord {
        let mut record = SauceRecord::new();
        record.set_title("TestFile1");
        record.set_author("marcomer");
        record.set_date("20240625");
        record.file_size = 0x18;
        record.set_data_type(DataType::Character);
        record.file_type = 1;
        record.tinfo1 = 0x0A;
        record.tinfo2 = 0x02;
        record.comments = 2;
        record.tflags = 0x02;
        record.set_tinfos("IBM VGA");
        record
    }

    #[test]
    fn default_record_matches_required_values() {
        let record = SauceRecord::default();
        assert_eq!(&record.id, b"SAUCE");
        assert_eq!(&record.version, b"00");
        assert!(record.title.iter().all(|&b| b == b' '));
        assert!(record.author.iter().all(|&b| b == b' '));
        assert!(record.group.iter().all(|&b| b == b' '));
        assert!(record.date.iter().all(|&b| b == b' '));
        assert_eq!(record.file_size, 0);
        assert_eq!(record.comments, 0);
        assert_eq!(record.tinfos, [0; 22]);
        assert!(record.has_valid_id());
    }

    #[test]
    fn encode_places_fields_at_documented_offsets() {
        let record = sample_record();
        let bytes = record.encode();

        assert_eq!(&bytes[0..5], b"SAUCE");
        assert_eq!(&bytes[5..7], b"00");
        assert_eq!(&bytes[7..16], b"TestFile1");
        assert_eq!(bytes[16], b' ');
        assert_eq!(&bytes[42..50], b"marcomer");
        assert_eq!(&bytes[82..90], b"20240625");
        assert_eq!(&bytes[90..94], &[0x18, 0, 0, 0]);
        assert_eq!(bytes[94], 1);
        assert_eq!(bytes[95], 1);
        assert_eq!(&bytes[96..98], &[0x0A, 0]);
        assert_eq!(&bytes[98..100], &[0x02, 0]);
        assert_eq!(bytes[COMMENTS_OFFSET], 2);
        assert_eq!(bytes[105], 0x02);
        assert_eq!(&bytes[106..113], b"IBM VGA");
        assert_eq!(bytes[113], 0);
    }

    #[test]
    fn decode_reads_little_endian_numerics() {
        let mut bytes = SauceRecord::default().encode();
        bytes[90..94].copy_from_slice(&0x0102_0304_u32.to_le_bytes());
        bytes[102..104].copy_from_slice(&u16::MAX.to_le_bytes());
        let record = SauceRecord::decode(&bytes);
        assert_eq!(record.file_size, 0x0102_0304);
        assert_eq!(record.tinfo4, u16::MAX);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let err = SauceRecord::from_slice(&[0u8; 127]).unwrap_err();
        assert_eq!(err.kind(), sauce_error::ErrorKind::InvalidArgument);
        assert!(SauceRecord::from_slice(&SauceRecord::default().encode()).is_ok());
    }

    #[test]
    fn equality_compares_bytes_after_embedded_nul() {
        let mut a = sample_record();
        let mut b = sample_record();
        a.tinfos[10] = b'x';
        b.tinfos[10] = b'y';
        assert_ne!(a, b);
        b.tinfos[10] = b'x';
        assert_eq!(a, b);
    }

    #[test]
    fn text_setters_truncate_and_pad() {
        let mut record = SauceRecord::default();
        record.set_title("x".repeat(50));
        assert_eq!(record.title.len(), 35);
        assert!(record.title.iter().all(|&b| b == b'x'));

        record.set_author("ab");
        assert_eq!(&record.author[..3], b"ab ");
        assert_eq!(record.author(), b"ab");

        record.set_tinfos("Font");
        assert_eq!(record.tinfos(), b"Font");
        assert_eq!(record.tinfos[4], 0);
    }

    #[test]
    fn data_type_accessor_keeps_unknown_codes_raw() {
        let mut record = SauceRecord::default();
        assert_eq!(record.data_type(), Some(DataType::None));
        record.data_type = 6;
        assert_eq!(record.data_type(), Some(DataType::XBin));
        record.data_type = 42;
        assert_eq!(record.data_type(), None);
        assert_eq!(record.data_type, 42);
    }

    fn arb_record() -> impl Strategy<Value = SauceRecord> {
        (
            (
                any::<[u8; 5]>(),
                any::<[u8; 2]>(),
                proptest::collection::vec(any::<u8>(), 35),
                any::<[u8; 20]>(),
                any::<[u8; 20]>(),
                any::<[u8; 8]>(),
            ),
            (any::<u32>(), any::<u8>(), any::<u8>()),
            (any::<u16>(), any::<u16>(), any::<u16>(), any::<u16>()),
            (
                any::<u8>(),
                any::<u8>(),
                proptest::collection::vec(any::<u8>(), 22),
            ),
        )
            .prop_map(
                |(
                    (id, version, title, author, group, date),
                    (file_size, data_type, file_type),
                    (tinfo1, tinfo2, tinfo3, tinfo4),
                    (comments, tflags, tinfos),
                )| {
                    let mut record = SauceRecord {
                        id,
                        version,
                        author,
                        group,
                        date,
                        file_size,
                        data_type,
                        file_type,
                        tinfo1,
                        tinfo2,
                        tinfo3,
                        tinfo4,
                        comments,
                        tflags,
                        ..SauceRecord::default()
                    };
                    record.title.copy_from_slice(&title);
                    record.tinfos.copy_from_slice(&tinfos);
                    record
                },
            )
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(record in arb_record()) {
            let decoded = SauceRecord::decode(&record.encode());
            prop_assert_eq!(decoded, record);
        }
    }
}
