//! Path-based surface. The file length is measured on open; mutations
//! are rewritten through a temporary file in the same directory and
//! renamed over the original, so a failure leaves the original intact.

use std::path::Path;

use sauce_error::Result;
use sauce_types::{Comment, SauceRecord};
use tracing::{debug, info};

use crate::engine;
use crate::locate::TailLayout;
use crate::store::{FileStore, TailSource};

pub fn locate(path: impl AsRef<Path>) -> Result<TailLayout> {
    let store = FileStore::open(path)?;
    crate::locate::locate(&store)
}

pub fn read_record(path: impl AsRef<Path>) -> Result<SauceRecord> {
    let store = FileStore::open(path)?;
    engine::read_record(&store)
}

pub fn read_comment(path: impl AsRef<Path>, lines: u8) -> Result<Comment> {
    let store = FileStore::open(path)?;
    engine::read_comment(&store, lines)
}

/// `false` for unreadable files as well as structural defects.
pub fn check(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match FileStore::open(path) {
        Ok(store) => engine::check(&store),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "sauce check could not open file");
            false
        }
    }
}

fn mutate(
    path: &Path,
    op: &'static str,
    run: impl FnOnce(&mut FileStore) -> Result<u64>,
) -> Result<u64> {
    let mut store = FileStore::open_writable(path)?;
    let old_len = store.byte_len();
    let new_len = run(&mut store)?;
    info!(path = %path.display(), op, old_len, new_len, "sauce file updated");
    Ok(new_len)
}

pub fn write_record(path: impl AsRef<Path>, record: &SauceRecord) -> Result<u64> {
    mutate(path.as_ref(), "write record", |store| {
        engine::write_record(store, record)
    })
}

pub fn write_comment(path: impl AsRef<Path>, text: &[u8]) -> Result<u64> {
    mutate(path.as_ref(), "write comment", |store| {
        engine::write_comment(store, text)
    })
}

pub fn write_comment_lines(path: impl AsRef<Path>, text: &[u8], lines: u8) -> Result<u64> {
    mutate(path.as_ref(), "write comment", |store| {
        engine::write_comment_lines(store, text, lines)
    })
}

pub fn remove_record(path: impl AsRef<Path>) -> Result<u64> {
    mutate(path.as_ref(), "remove record", |store| {
        engine::remove_record(store)
    })
}

pub fn remove_comment(path: impl AsRef<Path>) -> Result<u64> {
    mutate(path.as_ref(), "remove comment", |store| {
        engine::remove_comment(store)
    })
}
