//! Byte sources the locator reads from and the engine splices into.
//!
//! [`TailSource`] is the read side (length plus positioned reads);
//! [`TailStore`] adds the single mutation every operation is built on.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sauce_error::{Result, SauceError};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::splice::{Splice, apply_to_slice, apply_to_vec, to_usize};

/// Read access to a byte source of known length.
pub trait TailSource {
    /// Total length of the source in bytes.
    fn byte_len(&self) -> u64;

    /// Fill `buf` from `offset`. Reading past the end is an error.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;
}

/// A [`TailSource`] that can be mutated.
pub trait TailStore: TailSource {
    /// Apply `splice` as a single step. On error the source must be left
    /// exactly as it was.
    fn splice(&mut self, splice: &Splice) -> Result<()>;
}

fn read_from_slice(data: &[u8], offset: u64, buf: &mut [u8]) -> Result<()> {
    let start = to_usize(offset)?;
    let src = start
        .checked_add(buf.len())
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| {
            SauceError::internal(format!(
                "read of {} bytes at {offset} past length {}",
                buf.len(),
                data.len()
            ))
        })?;
    buf.copy_from_slice(src);
    Ok(())
}

impl TailSource for [u8] {
    fn byte_len(&self) -> u64 {
        self.len() as u64
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        read_from_slice(self, offset, buf)
    }
}

impl TailSource for Vec<u8> {
    fn byte_len(&self) -> u64 {
        self.len() as u64
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        read_from_slice(self, offset, buf)
    }
}

impl TailStore for Vec<u8> {
    fn splice(&mut self, splice: &Splice) -> Result<()> {
        apply_to_vec(self, splice).map(|_| ())
    }
}

/// Caller-owned storage with a logical length smaller than or equal to
/// its capacity. Mutations may grow `len` up to `buf.len()`.
#[derive(Debug)]
pub struct FixedBuffer<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> FixedBuffer<'a> {
    /// Wrap `buf` whose first `len` bytes hold data.
    pub fn new(buf: &'a mut [u8], len: usize) -> Result<Self> {
        if len > buf.len() {
            return Err(SauceError::CapacityExceeded {
                required: len,
                capacity: buf.len(),
            });
        }
        Ok(Self { buf, len })
    }

    /// Logical length in use.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The bytes in use.
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl TailSource for FixedBuffer<'_> {
    fn byte_len(&self) -> u64 {
        self.len as u64
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        read_from_slice(self.data(), offset, buf)
    }
}

impl TailStore for FixedBuffer<'_> {
    fn splice(&mut self, splice: &Splice) -> Result<()> {
        self.len = apply_to_slice(self.buf, self.len, splice)?;
        Ok(())
    }
}

/// A file on disk. Reads go through the open handle; every mutation
/// rewrites the file through a temporary sibling that is renamed over the
/// original once complete.
///
/// The path is resolved on open, so a symlink is followed and the file it
/// points to is the one rewritten.
#[derive(Debug)]
pub struct FileStore {
    /// Path as given by the caller, used in error messages.
    path: PathBuf,
    /// Resolved path the rewrite renames onto.
    target: PathBuf,
    file: File,
    len: u64,
}

impl FileStore {
    /// Open `path` for reading and measure it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::open_with(path, OpenOptions::new().read(true))
    }

    /// Open `path` for reading and writing. Fails with
    /// [`SauceError::CannotOpen`] when the file is read-only, before
    /// anything is written.
    pub fn open_writable(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let store = Self::open_with(path, OpenOptions::new().read(true).write(true))?;
        let permissions = store
            .file
            .metadata()
            .map_err(store.io_err("stat"))?
            .permissions();
        if permissions.readonly() {
            return Err(SauceError::CannotOpen {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "file is read-only"),
            });
        }
        Ok(store)
    }

    fn open_with(path: &Path, options: &OpenOptions) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(SauceError::invalid_argument("file path is empty"));
        }
        let cannot_open = |source| SauceError::CannotOpen {
            path: path.to_path_buf(),
            source,
        };
        let file = options.open(path).map_err(cannot_open)?;
        let target = fs::canonicalize(path).map_err(cannot_open)?;
        let len = file
            .metadata()
            .map_err(|source| SauceError::file_io(path, "stat", source))?
            .len();
        trace!(path = %path.display(), target = %target.display(), len, "opened sauce file");
        Ok(Self {
            path: path.to_path_buf(),
            target,
            file,
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The resolved path mutations are written to.
    pub fn target(&self) -> &Path {
        &self.target
    }

    fn io_err(&self, op: &'static str) -> impl FnOnce(io::Error) -> SauceError + '_ {
        move |source| SauceError::file_io(&self.path, op, source)
    }

    /// Write the spliced image of the current file into `tmp`.
    fn write_spliced(&self, tmp: &mut File, splice: &Splice) -> Result<()> {
        let mut reader = &self.file;
        reader
            .seek(SeekFrom::Start(0))
            .map_err(self.io_err("seek"))?;
        let copied = io::copy(&mut reader.take(splice.offset), tmp).map_err(self.io_err("copy"))?;
        if copied != splice.offset {
            return Err(SauceError::file_io(
                &self.path,
                "copy",
                io::Error::from(io::ErrorKind::UnexpectedEof),
            ));
        }
        tmp.write_all(&splice.insert)
            .map_err(self.io_err("write"))?;

        let resume = splice.offset + splice.remove;
        if resume < self.len {
            reader
                .seek(SeekFrom::Start(resume))
                .map_err(self.io_err("seek"))?;
            io::copy(&mut reader, tmp).map_err(self.io_err("copy"))?;
        }
        tmp.flush().map_err(self.io_err("flush"))?;
        tmp.sync_all().map_err(self.io_err("sync"))?;
        Ok(())
    }
}

impl TailSource for FileStore {
    fn byte_len(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut reader = &self.file;
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(self.io_err("seek"))?;
        reader.read_exact(buf).map_err(self.io_err("read"))?;
        Ok(())
    }
}

impl TailStore for FileStore {
    fn splice(&mut self, splice: &Splice) -> Result<()> {
        let new_len = splice.resulting_len(self.len)?;
        let dir = match self.target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        debug!(
            path = %self.path.display(),
            offset = splice.offset,
            remove = splice.remove,
            insert = splice.insert.len(),
            new_len,
            "rewriting sauce file"
        );

        let mut tmp = NamedTempFile::new_in(&dir).map_err(self.io_err("create temp file"))?;
        self.write_spliced(tmp.as_file_mut(), splice)?;

        let permissions = self
            .file
            .metadata()
            .map_err(self.io_err("stat"))?
            .permissions();
        fs::set_permissions(tmp.path(), permissions).map_err(self.io_err("set permissions"))?;

        let file = tmp
            .persist(&self.target)
            .map_err(|err| SauceError::file_io(&self.path, "rename", err.error))?;

        // Best effort: make the rename durable.
        if let Ok(dir) = File::open(&dir) {
            let _ = dir.sync_all();
        }

        self.file = file;
        self.len = new_len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_reads_are_bounds_checked() {
        let data: &[u8] = b"0123456789";
        let mut buf = [0u8; 3];
        data.read_exact_at(7, &mut buf).expect("in bounds");
        assert_eq!(&buf, b"789");
        assert!(data.read_exact_at(8, &mut buf).is_err());
        assert!(data.read_exact_at(u64::MAX, &mut buf).is_err());
    }

    #[test]
    fn fixed_buffer_rejects_len_past_capacity() {
        let mut storage = [0u8; 4];
        let err = FixedBuffer::new(&mut storage, 5).unwrap_err();
        assert!(matches!(
            err,
            SauceError::CapacityExceeded {
                required: 5,
                capacity: 4
            }
        ));
    }

    #[test]
    fn fixed_buffer_splice_updates_len() {
        let mut storage = [0u8; 8];
        storage[..3].copy_from_slice(b"abc");
        let mut fixed = FixedBuffer::new(&mut storage, 3).expect("fits");
        fixed
            .splice(&Splice::replace_tail(3, 3, b"de".to_vec()).expect("valid"))
            .expect("fits");
        assert_eq!(fixed.len(), 5);
        assert_eq!(fixed.data(), b"abcde");
        assert_eq!(fixed.byte_len(), 5);
    }

    #[test]
    fn file_store_rewrites_through_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("art.ans");
        fs::write(&path, b"host bytes|old tail").expect("write fixture");

        let mut store = FileStore::open(&path).expect("open");
        assert_eq!(store.byte_len(), 19);
        store
            .splice(&Splice::replace_tail(19, 11, b"new".to_vec()).expect("valid"))
            .expect("splice");
        assert_eq!(store.byte_len(), 14);
        assert_eq!(fs::read(&path).expect("read back"), b"host bytes|new");

        let mut buf = [0u8; 3];
        store.read_exact_at(11, &mut buf).expect("read");
        assert_eq!(&buf, b"new");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("list dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "temp file left behind: {leftovers:?}");
    }

    #[test]
    fn file_store_copies_bytes_after_removed_span() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mid.bin");
        fs::write(&path, b"aaaXXXbbb").expect("write fixture");

        let mut store = FileStore::open(&path).expect("open");
        store
            .splice(&Splice {
                offset: 3,
                remove: 3,
                insert: b"-".to_vec(),
            })
            .expect("splice");
        assert_eq!(fs::read(&path).expect("read back"), b"aaa-bbb");
    }

    #[test]
    fn file_store_open_missing_is_cannot_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FileStore::open(dir.path().join("missing.ans")).unwrap_err();
        assert!(matches!(err, SauceError::CannotOpen { .. }));
        assert_eq!(err.error_code(), -1);
    }

    #[test]
    fn file_store_open_writable_rejects_read_only_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("locked.ans");
        fs::write(&path, b"locked").expect("write fixture");
        let mut permissions = fs::metadata(&path).expect("stat").permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions).expect("chmod");

        assert!(FileStore::open(&path).is_ok());
        let err = FileStore::open_writable(&path).unwrap_err();
        assert!(matches!(err, SauceError::CannotOpen { .. }));
        assert_eq!(err.error_code(), -1);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_resolves_symlink_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let real = dir.path().join("real.ans");
        let link = dir.path().join("link.ans");
        fs::write(&real, b"host|tail").expect("write fixture");
        std::os::unix::fs::symlink(&real, &link).expect("symlink");

        let mut store = FileStore::open_writable(&link).expect("open");
        assert_eq!(store.path(), link.as_path());
        assert_eq!(
            store.target(),
            fs::canonicalize(&real).expect("canonical").as_path()
        );
        store
            .splice(&Splice::replace_tail(9, 5, b"new tail".to_vec()).expect("valid"))
            .expect("splice");

        assert!(fs::symlink_metadata(&link).expect("lstat").file_type().is_symlink());
        assert_eq!(fs::read(&real).expect("read back"), b"host|new tail");
    }

    #[test]
    fn file_store_rejects_empty_path() {
        let err = FileStore::open("").unwrap_err();
        assert_eq!(err.kind(), sauce_error::ErrorKind::InvalidArgument);
    }
}
