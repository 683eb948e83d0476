//! Platform layer: the mapped shared file and its byte-range locks.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::{RangeGuard, RangeLocker, current_pid, pid_is_running, running_processes_same_user};

use crate::error::{IpcError, IpcResult};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{self, File, OpenOptions};
use std::ops::Range;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::atomic::AtomicU32;
use tracing::debug;

/// Writable view of the mapped file.
pub struct MappedBytes {
    map: MmapMut,
}

impl MappedBytes {
    /// Bytes in `range`.
    pub fn read(&self, range: Range<usize>) -> &[u8] {
        &self.map[range]
    }

    /// Mutable bytes in `range`.
    pub fn slice_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.map[range]
    }

    /// Modification counter stored at `offset`.
    ///
    /// Panics if `offset` is out of bounds or not 4-byte aligned; the
    /// layout only hands out aligned counter offsets.
    pub fn counter(&self, offset: usize) -> &AtomicU32 {
        let bytes = &self.map[offset..offset + size_of::<u32>()];
        let ptr = bytes.as_ptr() as *mut u32;
        assert!(ptr.is_aligned(), "counter offset {offset} is not aligned");
        // SAFETY: the pointer is in bounds and aligned, and the mapping
        // outlives the returned reference. Counters are only ever accessed
        // atomically by every process sharing the file.
        unsafe { AtomicU32::from_ptr(ptr) }
    }
}

/// The opened and mapped shared file.
///
/// Lock state and mapped bytes are separate fields so that a held
/// [`RangeGuard`] does not prevent writes through the mapping.
pub struct SharedFile {
    pub(crate) locker: RangeLocker,
    pub(crate) map: MappedBytes,
}

impl SharedFile {
    /// Open or create the file at `path` and map `len` bytes.
    ///
    /// A new or empty file is extended to `len` and reads as zeros. An
    /// existing file of any other length was written with a different
    /// schema and is refused with [`IpcError::LayoutMismatch`].
    pub fn open(path: &Path, len: usize) -> IpcResult<Self> {
        let map_failed = |source| IpcError::MapFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(map_failed)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .mode(0o600)
            .open(path)
            .map_err(map_failed)?;

        let actual = file.metadata().map_err(map_failed)?.len();
        if actual == 0 {
            debug!("Sizing new shared file {} to {} bytes", path.display(), len);
            file.set_len(len as u64).map_err(map_failed)?;
        } else if actual != len as u64 {
            return Err(IpcError::LayoutMismatch {
                path: path.to_path_buf(),
                expected: len as u64,
                actual,
            });
        }

        let map = map_file(&file, len).map_err(map_failed)?;
        Ok(Self {
            locker: RangeLocker::new(file),
            map: MappedBytes { map },
        })
    }}

fn map_file(file: &File, len: usize) -> std::io::Result<MmapMut> {
    // SAFETY: the file stays open for the lifetime of the mapping, and
    // concurrent modification by other processes is coordinated through
    // byte-range locks and atomic counters.
    unsafe { MmapOptions::new().len(len).map_mut(file) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_open_creates_sized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".gio.dir").join("shared.1");

        let shared = SharedFile::open(&path, 128).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 128);
        assert!(shared.map.read(0..128).iter().all(|b| *b == 0));
    }

    #[test]
    fn test_existing_file_with_other_size_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.1");
        fs::write(&path, [1u8; 64]).unwrap();

        let result = SharedFile::open(&path, 128);
        assert!(matches!(
            result,
            Err(IpcError::LayoutMismatch {
                expected: 128,
                actual: 64,
                ..
            })
        ));
    }

    #[test]
    fn test_mappings_share_bytes_and_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.1");

        let mut first = SharedFile::open(&path, 64).unwrap();
        let second = SharedFile::open(&path, 64).unwrap();

        first.map.slice_mut(60..64).copy_from_slice(b"gio!");
        first.map.counter(44).fetch_add(3, Ordering::Release);

        assert_eq!(second.map.read(60..64), b"gio!");
        assert_eq!(second.map.counter(44).load(Ordering::Acquire), 3);
    }
}
