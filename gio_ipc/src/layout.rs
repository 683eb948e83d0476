//! On-disk layout of the shared file header.
//!
//! ```text
//! offset 0   : u16 magic (0x013E)
//! offset 2   : u16 live process count
//! offset 4   : i32[10] process ids        (unused slots = -1)
//! offset 44  : u32 global modification counter
//! offset 48  : u32[n] per-variable modification counters
//! offset 48+4n : data region
//! ```
//!
//! All fields use native byte order; a file is only ever shared between
//! processes of one device.

use crate::liveness::Pid;
use gio_common::consts::MAX_PROCESSES;
use static_assertions::const_assert_eq;

/// Magic number marking a file owned by this store.
pub const MAGIC: u16 = 0x013E;

/// Offset of the magic number.
pub const MAGIC_OFFSET: usize = 0;

/// Offset of the live process count.
pub const PROCESS_COUNT_OFFSET: usize = 2;

/// Offset of the first PID slot.
pub const PID_SLOTS_OFFSET: usize = 4;

/// Size of one PID slot.
pub const PID_SLOT_SIZE: usize = 4;

/// Sentinel stored in unused PID slots.
pub const EMPTY_SLOT: Pid = -1;

/// Header size; also the base address of the meta region.
pub const HEADER_SIZE: usize = PID_SLOTS_OFFSET + MAX_PROCESSES * PID_SLOT_SIZE;

/// Size of one modification counter.
pub const COUNTER_SIZE: usize = 4;

const_assert_eq!(HEADER_SIZE, 44);
// Counters are accessed as aligned atomics.
const_assert_eq!(HEADER_SIZE % COUNTER_SIZE, 0);

/// Fixed-capacity process table as stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessTable {
    slots: [Pid; MAX_PROCESSES],
    count: usize,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self {
            slots: [EMPTY_SLOT; MAX_PROCESSES],
            count: 0,
        }
    }
}

impl ProcessTable {
    /// Build a table from a list of PIDs.
    ///
    /// Returns `None` when more than [`MAX_PROCESSES`] PIDs are given.
    pub fn from_pids(pids: &[Pid]) -> Option<Self> {
        if pids.len() > MAX_PROCESSES {
            return None;
        }
        let mut table = Self::default();
        table.slots[..pids.len()].copy_from_slice(pids);
        table.count = pids.len();
        Some(table)
    }

    /// Decode the table from the header bytes.
    ///
    /// A count larger than the slot array is clamped; negative slots are
    /// skipped by [`pids`](Self::pids).
    pub fn read(header: &[u8]) -> Self {
        let count = usize::from(read_u16(header, PROCESS_COUNT_OFFSET)).min(MAX_PROCESSES);
        let mut table = Self::default();
        for (i, slot) in table.slots.iter_mut().enumerate().take(count) {
            *slot = read_i32(header, PID_SLOTS_OFFSET + i * PID_SLOT_SIZE);
        }
        table.count = count;
        table
    }

    /// Encode the table into the header bytes. Unused slots get `-1`.
    pub fn write(&self, header: &mut [u8]) {
        write_u16(header, PROCESS_COUNT_OFFSET, self.count as u16);
        for (i, pid) in self.slots.iter().enumerate() {
            let value = if i < self.count { *pid } else { EMPTY_SLOT };
            let offset = PID_SLOTS_OFFSET + i * PID_SLOT_SIZE;
            header[offset..offset + PID_SLOT_SIZE].copy_from_slice(&value.to_ne_bytes());
        }
    }

    /// Live count as stored.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Stored PIDs, skipping empty or negative slots.
    pub fn pids(&self) -> impl Iterator<Item = Pid> + '_ {
        self.slots[..self.count].iter().copied().filter(|pid| *pid >= 0)
    }
}

/// Read the magic number from the header bytes.
pub fn read_magic(header: &[u8]) -> u16 {
    read_u16(header, MAGIC_OFFSET)
}

/// Write the magic number into the header bytes.
pub fn write_magic(header: &mut [u8]) {
    write_u16(header, MAGIC_OFFSET, MAGIC);
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_ne_bytes([bytes[offset], bytes[offset + 1]])
}

fn write_u16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_ne_bytes());
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_ne_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
