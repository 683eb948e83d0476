//! Shared-variable store.
//!
//! The store keeps an in-process cache of every declared variable and, in
//! multi-process mode, mirrors writes into the mapped file. Reads trust the
//! cache until the file's global modification counter moves; only then are
//! per-variable counters compared and stale entries re-read under a lock on
//! their own byte range.
//!
//! # Locking
//!
//! One mutex serializes threads of this process. Across processes the file
//! is protected by blocking byte-range locks:
//!
//! - process table `[0, 44)`: taken only at attach and close, never nested
//! - data slot of one variable: taken by reads of a stale entry and by writes
//! - meta region (all counters): taken by writers while holding their data
//!   lock, and released first
//!
//! # Failure handling
//!
//! Schema misuse is reported to the caller and changes nothing. Lock and I/O
//! failures are logged and returned, but the store stays usable: reads serve
//! the cached value and writes keep their in-process update.

use crate::codec::{self, SharedValue, Value};
use crate::error::{IpcError, IpcResult, LockRegion};
use crate::layout::{self, HEADER_SIZE, MAGIC, ProcessTable};
use crate::liveness::{self, AliveList, Liveness, Pid, ProcessProbe};
use crate::platform::{MappedBytes, SharedFile};
use crate::schema::{SchemaLayout, ValueKind, VarIndex, VariableDescriptor};
use crate::snapshot::{StoreSnapshot, VariableSnapshot};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Option<Value>,
    /// Per-variable counter this entry was last synchronised with
    seen_mod: Option<u32>,
    dirty: bool,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            value: None,
            seen_mod: None,
            dirty: true,
        }
    }
}

struct StoreState {
    /// `None` in single-process mode
    shared: Option<SharedFile>,
    cache: Vec<CacheEntry>,
    seen_global: Option<u32>,
    liveness: Liveness,
}

/// Typed key-value store shared between processes through one mapped file.
pub struct Store {
    layout: SchemaLayout,
    path: PathBuf,
    pid: Pid,
    state: Mutex<StoreState>,
}

impl Store {
    /// Map the shared file at `path`, degrading to single-process mode if
    /// the file cannot be mapped or was created with another layout.
    ///
    /// With `multi_process` off the file is never touched.
    pub fn open(path: &Path, layout: SchemaLayout, multi_process: bool, pid: Pid) -> Self {
        if !multi_process {
            debug!("Multi-process sharing disabled for {}", path.display());
            return Self::build(layout, path.to_path_buf(), pid, None);
        }
        match Self::try_open(path, layout.clone(), pid) {
            Ok(store) => store,
            Err(e) => {
                warn!("Shared file unavailable, running single-process: {}", e);
                Self::build(layout, path.to_path_buf(), pid, None)
            }
        }
    }

    /// Map the shared file at `path`, failing instead of degrading.
    pub fn try_open(path: &Path, layout: SchemaLayout, pid: Pid) -> IpcResult<Self> {
        let shared = SharedFile::open(path, layout.total_size())?;
        debug!(
            "Mapped {} ({} bytes, {} variables)",
            path.display(),
            layout.total_size(),
            layout.len()
        );
        Ok(Self::build(layout, path.to_path_buf(), pid, Some(shared)))
    }

    /// Store that never touches a file.
    pub fn single_process(layout: SchemaLayout, pid: Pid) -> Self {
        Self::build(layout, PathBuf::new(), pid, None)
    }

    fn build(layout: SchemaLayout, path: PathBuf, pid: Pid, shared: Option<SharedFile>) -> Self {
        let cache = vec![CacheEntry::default(); layout.len()];
        Self {
            layout,
            path,
            pid,
            state: Mutex::new(StoreState {
                shared,
                cache,
                seen_global: None,
                liveness: Liveness::Unknown,
            }),
        }
    }

    /// Register this process in the file's PID table.
    ///
    /// Dead PIDs are pruned using `probe`. The outcome is decided once per
    /// store; later calls return it unchanged. A single-process store is
    /// always a cold start.
    ///
    /// On a bad magic number, a failed table lock or a full table the store
    /// drops to single-process mode and the error is returned. Its private
    /// cache starts empty, so [`liveness`](Self::liveness) reports a cold start.
    pub fn finalize_and_register(&self, probe: &dyn ProcessProbe) -> IpcResult<Liveness> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.liveness != Liveness::Unknown {
            return Ok(state.liveness);
        }

        let Some(shared) = state.shared.as_mut() else {
            state.liveness = Liveness::ColdStart;
            info!("Single-process store attached, cold start");
            return Ok(Liveness::ColdStart);
        };

        match register(shared, self.pid, probe) {
            Ok(liveness) => {
                info!(
                    "Registered pid {} with {}: {:?}",
                    self.pid,
                    self.path.display(),
                    liveness
                );
                state.liveness = liveness;
                Ok(liveness)
            }
            Err(e) => {
                warn!(
                    "Disabling multi-process mode for {}: {}",
                    self.path.display(),
                    e
                );
                state.shared = None;
                state.liveness = Liveness::ColdStart;
                Err(e)
            }
        }
    }

    /// Read a variable.
    ///
    /// Only schema misuse is reported. If the shared file cannot be read
    /// the cached value is returned; use [`get_checked`](Self::get_checked)
    /// to observe such failures.
    pub fn get<T: SharedValue>(&self, index: VarIndex) -> IpcResult<T> {
        let descriptor = self.descriptor_for(index, T::KIND)?;
        let mut state = self.state.lock();
        if let Err(e) = state.refresh(&self.layout, descriptor) {
            debug!("Serving cached {}: {}", descriptor.name(), e);
        }
        Ok(T::from_value(state.cache[index.get()].value.as_ref()))
    }

    /// Read a variable, reporting refresh failures.
    pub fn get_checked<T: SharedValue>(&self, index: VarIndex) -> IpcResult<T> {
        let descriptor = self.descriptor_for(index, T::KIND)?;
        let mut state = self.state.lock();
        state.refresh(&self.layout, descriptor)?;
        Ok(T::from_value(state.cache[index.get()].value.as_ref()))
    }

    /// Read a variable without knowing its type.
    pub fn read_value(&self, index: VarIndex) -> IpcResult<Option<Value>> {
        let descriptor = self.layout.descriptor(index)?;
        let mut state = self.state.lock();
        state.refresh(&self.layout, descriptor)?;
        Ok(state.cache[index.get()].value.clone())
    }

    /// Write a variable.
    ///
    /// The value is validated first; a rejected value changes nothing. The
    /// in-process cache is then updated, so this process reads the new
    /// value even if the shared write fails.
    pub fn put<T: SharedValue>(&self, index: VarIndex, value: T) -> IpcResult<()> {
        let descriptor = self.descriptor_for(index, T::KIND)?;
        let value = value.into_value();
        codec::check_value(descriptor, value.as_ref())?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let entry = &mut state.cache[index.get()];
        entry.value = value;
        entry.dirty = false;
        state.write_through(&self.layout, descriptor)
    }

    /// Read a string variable.
    pub fn get_string(&self, index: VarIndex) -> IpcResult<Option<String>> {
        self.get(index)
    }

    /// Write a string variable. An empty string is stored as `None`.
    pub fn put_string(&self, index: VarIndex, value: Option<&str>) -> IpcResult<()> {
        self.put(index, value.map(str::to_owned))
    }

    /// Read a byte-array variable.
    pub fn get_bytes(&self, index: VarIndex) -> IpcResult<Option<Vec<u8>>> {
        self.get(index)
    }

    /// Write a byte-array variable. An empty array is stored as `None`.
    pub fn put_bytes(&self, index: VarIndex, value: Option<&[u8]>) -> IpcResult<()> {
        self.put(index, value.map(<[u8]>::to_vec))
    }

    /// Atomically replace an int variable if it currently equals `expected`.
    ///
    /// Returns whether the value was replaced.
    pub fn compare_and_set_int(&self, index: VarIndex, expected: i32, new: i32) -> IpcResult<bool> {
        let descriptor = self.descriptor_for(index, ValueKind::Int)?;
        let (_, replaced) = self.modify(descriptor, |current| {
            (i32::from_value(current) == expected).then_some(Value::Int(new))
        })?;
        Ok(replaced)
    }

    /// Atomically add `delta` to a long variable and return the new value.
    pub fn add_long(&self, index: VarIndex, delta: i64) -> IpcResult<i64> {
        let descriptor = self.descriptor_for(index, ValueKind::Long)?;
        let (value, _) = self.modify(descriptor, |current| {
            Some(Value::Long(i64::from_value(current).wrapping_add(delta)))
        })?;
        Ok(i64::from_value(value.as_ref()))
    }

    /// Registered processes that are still running.
    ///
    /// This process is included once it has registered, and always in
    /// single-process mode.
    pub fn alive_processes(&self, probe: &dyn ProcessProbe) -> IpcResult<AliveList> {
        let state = self.state.lock();
        let Some(shared) = state.shared.as_ref() else {
            let mut alive = AliveList::new();
            let _ = alive.push(self.pid);
            return Ok(alive);
        };

        let _table = shared
            .locker
            .lock(0..HEADER_SIZE, LockRegion::ProcessTable)?;
        let stored = ProcessTable::read(shared.map.read(0..HEADER_SIZE));
        let mut alive = liveness::alive_others(&stored, self.pid, probe);
        // Not in the table until registered.
        if state.liveness != Liveness::Unknown {
            let _ = alive.push(self.pid);
        }
        Ok(alive)
    }

    /// Remove this process from the PID table and unmap the file.
    ///
    /// The store keeps working on its cache in single-process mode.
    pub fn close(&self) -> IpcResult<()> {
        let mut state = self.state.lock();
        let Some(mut shared) = state.shared.take() else {
            return Ok(());
        };
        if state.liveness == Liveness::Unknown {
            return Ok(());
        }

        let SharedFile { locker, map } = &mut shared;
        let _table = locker.lock(0..HEADER_SIZE, LockRegion::ProcessTable)?;
        let header = map.slice_mut(0..HEADER_SIZE);
        if layout::read_magic(header) == MAGIC {
            liveness::deregister(&ProcessTable::read(header), self.pid).write(header);
        }
        info!("Closed {} for pid {}", self.path.display(), self.pid);
        Ok(())
    }

    /// Whether values are shared through the file.
    pub fn is_multi_process(&self) -> bool {
        self.state.lock().shared.is_some()
    }

    /// Attach outcome, [`Liveness::Unknown`] before registration.
    pub fn liveness(&self) -> Liveness {
        self.state.lock().liveness
    }

    /// Whether no other live process shared the file at attach.
    pub fn is_cold_start(&self) -> bool {
        self.liveness() == Liveness::ColdStart
    }

    /// Declared schema.
    pub fn layout(&self) -> &SchemaLayout {
        &self.layout
    }

    /// Shared file path; empty for a store created by
    /// [`single_process`](Self::single_process).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID this store registers as.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Diagnostic view of the cache, counters and PID table.
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock();
        let descriptors = self.layout.descriptors();

        let (processes, global_mod_count, file_mods) = match state.shared.as_ref() {
            Some(shared) => {
                let processes: Vec<Pid> = match shared.locker.lock(0..HEADER_SIZE, LockRegion::ProcessTable) {
                    Ok(_table) => ProcessTable::read(shared.map.read(0..HEADER_SIZE))
                        .pids()
                        .collect(),
                    Err(_) => Vec::new(),
                };
                let global = shared
                    .map
                    .counter(self.layout.global_counter_offset())
                    .load(Ordering::Acquire);
                let mods: Vec<Option<u32>> = descriptors
                    .iter()
                    .map(|d| Some(load_counter(&self.layout, &shared.map, d)))
                    .collect();
                (processes, Some(global), mods)
            }
            None => (Vec::new(), None, vec![None; descriptors.len()]),
        };

        let variables = descriptors
            .iter()
            .zip(&state.cache)
            .zip(file_mods)
            .map(|((descriptor, entry), file_mod_count)| VariableSnapshot {
                name: descriptor.name().to_string(),
                kind: descriptor.kind(),
                capacity: descriptor.capacity(),
                value: entry.value.clone(),
                seen_mod_count: entry.seen_mod,
                file_mod_count,
                dirty: entry.dirty,
            })
            .collect();

        StoreSnapshot {
            path: self.path.clone(),
            pid: self.pid,
            multi_process: state.shared.is_some(),
            liveness: state.liveness,
            processes,
            global_mod_count,
            seen_global_mod_count: state.seen_global,
            variables,
        }
    }

    /// Human-readable [`snapshot`](Self::snapshot).
    pub fn dump(&self) -> String {
        self.snapshot().to_string()
    }

    fn descriptor_for(&self, index: VarIndex, kind: ValueKind) -> IpcResult<&VariableDescriptor> {
        let descriptor = self.layout.descriptor(index)?;
        codec::check_kind(descriptor, kind)?;
        Ok(descriptor)
    }

    /// Read-modify-write under the variable's data lock.
    ///
    /// `f` receives the current value and returns the replacement, or
    /// `None` to leave it. Returns the resulting value and whether it was
    /// replaced.
    fn modify(
        &self,
        descriptor: &VariableDescriptor,
        f: impl FnOnce(Option<&Value>) -> Option<Value>,
    ) -> IpcResult<(Option<Value>, bool)> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let index = descriptor.index().get();

        let Some(shared) = state.shared.as_mut() else {
            let entry = &mut state.cache[index];
            let Some(new) = f(entry.value.as_ref()) else {
                return Ok((entry.value.clone(), false));
            };
            let new = codec::normalize(Some(new));
            codec::check_value(descriptor, new.as_ref())?;
            entry.value = new.clone();
            entry.dirty = false;
            return Ok((new, true));
        };

        let SharedFile { locker, map } = shared;
        let range = self.layout.slot_range(descriptor);
        let _data = locker.lock(range.clone(), LockRegion::Data { index })?;
        let current = codec::decode_slot(descriptor, map.read(range.clone()))?;

        let Some(new) = f(current.as_ref()) else {
            let entry = &mut state.cache[index];
            entry.value = current.clone();
            entry.dirty = false;
            return Ok((current, false));
        };
        let new = codec::normalize(Some(new));
        codec::encode_slot(descriptor, new.as_ref(), map.slice_mut(range))?;
        let entry = &mut state.cache[index];
        entry.value = new.clone();
        entry.dirty = false;

        let meta = locker.lock(self.layout.meta_range(), LockRegion::Meta)?;
        publish(&self.layout, map, descriptor, &mut state.cache, &mut state.seen_global);
        drop(meta);
        Ok((new, true))
    }
}

impl StoreState {
    /// Bring the cache entry for `descriptor` up to date with the file.
    fn refresh(&mut self, layout: &SchemaLayout, descriptor: &VariableDescriptor) -> IpcResult<()> {
        let Some(shared) = self.shared.as_ref() else {
            return Ok(());
        };
        detect_changes(layout, &shared.map, &mut self.cache, &mut self.seen_global);

        let index = descriptor.index().get();
        if !self.cache[index].dirty {
            return Ok(());
        }

        let range = layout.slot_range(descriptor);
        let _data = shared.locker.lock(range.clone(), LockRegion::Data { index })?;
        let decoded = codec::decode_slot(descriptor, shared.map.read(range));
        let entry = &mut self.cache[index];
        entry.dirty = false;
        match decoded {
            Ok(value) => {
                entry.value = value;
                Ok(())
            }
            Err(e) => {
                warn!("Keeping cached {}: {}", descriptor.name(), e);
                Err(e)
            }
        }
    }

    /// Copy the cached value of `descriptor` into the file and publish it.
    fn write_through(&mut self, layout: &SchemaLayout, descriptor: &VariableDescriptor) -> IpcResult<()> {
        let Some(shared) = self.shared.as_mut() else {
            return Ok(());
        };
        let SharedFile { locker, map } = shared;
        let index = descriptor.index().get();
        let range = layout.slot_range(descriptor);

        let _data = locker.lock(range.clone(), LockRegion::Data { index })?;
        codec::encode_slot(descriptor, self.cache[index].value.as_ref(), map.slice_mut(range))?;

        let meta = locker.lock(layout.meta_range(), LockRegion::Meta)?;
        publish(layout, map, descriptor, &mut self.cache, &mut self.seen_global);
        drop(meta);
        Ok(())
    }
}

fn register(shared: &mut SharedFile, pid: Pid, probe: &dyn ProcessProbe) -> IpcResult<Liveness> {
    let SharedFile { locker, map } = shared;
    let _table = locker.lock(0..HEADER_SIZE, LockRegion::ProcessTable)?;
    let header = map.slice_mut(0..HEADER_SIZE);

    match layout::read_magic(header) {
        0 => {
            debug!("Initialising shared file header");
            layout::write_magic(header);
        }
        MAGIC => {}
        found => return Err(IpcError::BadMagic { found }),
    }

    let stored = ProcessTable::read(header);
    let (liveness, table) = liveness::reconcile(&stored, pid, probe)?;
    table.write(header);
    Ok(liveness)
}

fn load_counter(layout: &SchemaLayout, map: &MappedBytes, descriptor: &VariableDescriptor) -> u32 {
    map.counter(layout.counter_offset(descriptor))
        .load(Ordering::Acquire)
}

/// Mark cache entries whose counter moved since they were last seen.
///
/// Lock-free: a writer bumps the per-variable counter before the global
/// one, so seeing a new global value guarantees seeing every per-variable
/// change that preceded it.
fn detect_changes(
    layout: &SchemaLayout,
    map: &MappedBytes,
    cache: &mut [CacheEntry],
    seen_global: &mut Option<u32>,
) {
    let global = map
        .counter(layout.global_counter_offset())
        .load(Ordering::Acquire);
    if *seen_global == Some(global) {
        return;
    }

    for (descriptor, entry) in layout.descriptors().iter().zip(cache.iter_mut()) {
        let count = load_counter(layout, map, descriptor);
        if entry.seen_mod != Some(count) {
            entry.seen_mod = Some(count);
            entry.dirty = true;
        }
    }
    *seen_global = Some(global);
}

/// Bump the counters for a variable just written. Caller holds the meta lock.
fn publish(
    layout: &SchemaLayout,
    map: &MappedBytes,
    descriptor: &VariableDescriptor,
    cache: &mut [CacheEntry],
    seen_global: &mut Option<u32>,
) {
    // Catch up first so changes by others are not hidden behind our bump.
    detect_changes(layout, map, cache, seen_global);

    let var = map
        .counter(layout.counter_offset(descriptor))
        .fetch_add(1, Ordering::AcqRel)
        .wrapping_add(1);
    let global = map
        .counter(layout.global_counter_offset())
        .fetch_add(1, Ordering::AcqRel)
        .wrapping_add(1);

    let entry = &mut cache[descriptor.index().get()];
    entry.seen_mod = Some(var);
    entry.dirty = false;
    *seen_global = Some(global);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::VariableRegistry;
    use std::collections::HashSet;

    struct Vars {
        session: VarIndex,
        pause: VarIndex,
        count: VarIndex,
    }

    fn schema() -> (SchemaLayout, Vars) {
        let mut registry = VariableRegistry::new();
        let session = registry.declare_string("sessionId", 10).unwrap();
        let pause = registry.declare_long("lastPauseTime").unwrap();
        let count = registry.declare_int("count").unwrap();
        (registry.finalize(), Vars { session, pause, count })
    }

    #[test]
    fn test_single_process_read_your_writes() {
        let (layout, vars) = schema();
        let store = Store::single_process(layout, 1);
        assert_eq!(store.finalize_and_register(&HashSet::<Pid>::new()).unwrap(), Liveness::ColdStart);
        assert!(!store.is_multi_process());

        assert_eq!(store.get::<i64>(vars.pause).unwrap(), 0);
        assert_eq!(store.get_string(vars.session).unwrap(), None);

        store.put(vars.pause, 1000i64).unwrap();
        store.put_string(vars.session, Some("abc123")).unwrap();
        assert_eq!(store.get::<i64>(vars.pause).unwrap(), 1000);
        assert_eq!(store.get_string(vars.session).unwrap().as_deref(), Some("abc123"));

        store.put_string(vars.session, Some("")).unwrap();
        assert_eq!(store.get_string(vars.session).unwrap(), None);
    }

    #[test]
    fn test_type_mismatch_and_oversize_change_nothing() {
        let (layout, vars) = schema();
        let store = Store::single_process(layout, 1);
        store.put_string(vars.session, Some("keep")).unwrap();

        assert!(matches!(
            store.put(vars.session, 5i32),
            Err(IpcError::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.get::<i32>(vars.pause),
            Err(IpcError::TypeMismatch { .. })
        ));

        let long = "x".repeat(41);
        let err = store.put_string(vars.session, Some(&long)).unwrap_err();
        assert!(err.is_programmer_error());
        assert_eq!(store.get_string(vars.session).unwrap().as_deref(), Some("keep"));
    }

    #[test]
    fn test_unknown_index_is_rejected() {
        let (layout, _) = schema();
        let store = Store::single_process(layout, 1);

        let mut other = VariableRegistry::new();
        for name in ["a", "b", "c", "d"] {
            other.declare_int(name).unwrap();
        }
        let foreign = other.declare_int("e").unwrap();
        assert!(matches!(
            store.get::<i32>(foreign),
            Err(IpcError::UnknownVariable { index: 4 })
        ));
    }

    #[test]
    fn test_atomic_updates_single_process() {
        let (layout, vars) = schema();
        let store = Store::single_process(layout, 1);

        assert!(store.compare_and_set_int(vars.count, 0, 5).unwrap());
        assert!(!store.compare_and_set_int(vars.count, 0, 9).unwrap());
        assert_eq!(store.get::<i32>(vars.count).unwrap(), 5);

        assert_eq!(store.add_long(vars.pause, 10).unwrap(), 10);
        assert_eq!(store.add_long(vars.pause, -3).unwrap(), 7);
    }

    #[test]
    fn test_register_is_decided_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.1");
        let (layout, _) = schema();
        let store = Store::try_open(&path, layout, 100).unwrap();
        assert_eq!(store.liveness(), Liveness::Unknown);

        let running: HashSet<Pid> = [100].into();
        assert_eq!(store.finalize_and_register(&running).unwrap(), Liveness::ColdStart);
        assert_eq!(store.finalize_and_register(&running).unwrap(), Liveness::ColdStart);
        assert!(store.is_cold_start());

        let alive = store.alive_processes(&running).unwrap();
        assert_eq!(alive.as_slice(), &[100]);
    }

    #[test]
    fn test_bad_magic_disables_sharing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.1");
        let (layout, vars) = schema();
        let mut bytes = vec![0u8; layout.total_size()];
        bytes[..2].copy_from_slice(&0xBEEFu16.to_ne_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let store = Store::open(&path, layout, true, 100);
        assert!(store.is_multi_process());
        let result = store.finalize_and_register(&HashSet::from([100]));
        assert!(matches!(result, Err(IpcError::BadMagic { found: 0xBEEF })));
        assert_eq!(store.liveness(), Liveness::ColdStart);
        assert!(!store.is_multi_process());

        store.put(vars.pause, 1i64).unwrap();
        assert_eq!(store.get::<i64>(vars.pause).unwrap(), 1);
        // Nothing reached the file.
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_snapshot_reports_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.1");
        let (layout, vars) = schema();
        let store = Store::open(&path, layout, true, 100);
        store.finalize_and_register(&HashSet::from([100])).unwrap();

        store.put(vars.pause, 42i64).unwrap();
        store.put(vars.pause, 43i64).unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.multi_process);
        assert_eq!(snapshot.processes, vec![100]);
        assert_eq!(snapshot.global_mod_count, Some(2));
        let pause = &snapshot.variables[vars.pause.get()];
        assert_eq!(pause.value, Some(Value::Long(43)));
        assert_eq!(pause.file_mod_count, Some(2));
        assert_eq!(pause.seen_mod_count, Some(2));
        assert!(store.dump().contains("lastPauseTime"));
    }

    #[test]
    fn test_close_deregisters_and_keeps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.1");
        let (layout, vars) = schema();
        let running: HashSet<Pid> = [100, 200].into();

        let first = Store::open(&path, layout.clone(), true, 100);
        first.finalize_and_register(&running).unwrap();
        let second = Store::open(&path, layout, true, 200);
        assert_eq!(second.finalize_and_register(&running).unwrap(), Liveness::WarmStart);

        second.put(vars.count, 3i32).unwrap();
        second.close().unwrap();
        assert!(!second.is_multi_process());
        assert_eq!(second.get::<i32>(vars.count).unwrap(), 3);

        let alive = first.alive_processes(&running).unwrap();
        assert_eq!(alive.as_slice(), &[100]);
    }
}
