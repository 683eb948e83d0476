//! Two store handles on one file, standing in for two processes

use gio_ipc::{IpcError, IpcResult, Liveness, Pid, SchemaLayout, Store, VarIndex, VariableRegistry};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::os::unix::fs::FileExt;
use std::path::Path;

struct Vars {
    session: VarIndex,
    pause: VarIndex,
    flag: VarIndex,
    blob: VarIndex,
}

fn schema() -> IpcResult<(SchemaLayout, Vars)> {
    let mut registry = VariableRegistry::new();
    let vars = Vars {
        session: registry.declare_string("sessionId", 10)?,
        pause: registry.declare_long("lastPauseTime")?,
        flag: registry.declare_bool("flag")?,
        blob: registry.declare_bytes("blob", 16)?,
    };
    Ok((registry.finalize(), vars))
}

fn attach(path: &Path, layout: &SchemaLayout, pid: Pid) -> IpcResult<Store> {
    let running: HashSet<Pid> = [100, 200].into();
    let store = Store::try_open(path, layout.clone(), pid)?;
    store.finalize_and_register(&running)?;
    Ok(store)
}

#[test]
fn test_values_written_by_one_instance_are_read_by_another() -> IpcResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(".gio.dir").join("gio.core.ipc.1");
    let (layout, vars) = schema()?;

    let a = attach(&path, &layout, 100)?;
    let b = attach(&path, &layout, 200)?;
    assert_eq!(a.liveness(), Liveness::ColdStart);
    assert_eq!(b.liveness(), Liveness::WarmStart);

    a.put_string(vars.session, Some("abc123"))?;
    a.put(vars.pause, 1000i64)?;

    assert_eq!(b.get_string(vars.session)?.as_deref(), Some("abc123"));
    assert_eq!(b.get::<i64>(vars.pause)?, 1000);
    Ok(())
}

#[test]
fn test_change_is_picked_up_after_counter_moves() -> IpcResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shared.1");
    let (layout, vars) = schema()?;

    let a = attach(&path, &layout, 100)?;
    let b = attach(&path, &layout, 200)?;

    assert!(!b.get::<bool>(vars.flag)?);
    a.put(vars.flag, true)?;
    assert!(b.get::<bool>(vars.flag)?);

    a.put_bytes(vars.blob, Some(&[1, 2, 3]))?;
    assert_eq!(b.get_bytes(vars.blob)?, Some(vec![1, 2, 3]));

    // Writes flow both ways and each side keeps its own reads coherent.
    b.put(vars.flag, false)?;
    assert!(!a.get::<bool>(vars.flag)?);
    assert!(!b.get::<bool>(vars.flag)?);

    let snapshot = a.snapshot();
    assert_eq!(snapshot.global_mod_count, Some(3));
    Ok(())
}

#[test]
fn test_repeated_reads_use_the_cache() -> IpcResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shared.1");
    let (layout, vars) = schema()?;

    let a = attach(&path, &layout, 100)?;
    let b = attach(&path, &layout, 200)?;
    a.put(vars.pause, 5i64)?;
    assert_eq!(b.get::<i64>(vars.pause)?, 5);

    let before = b.snapshot();
    assert_eq!(b.get::<i64>(vars.pause)?, 5);
    let after = b.snapshot();
    assert_eq!(before.seen_global_mod_count, after.seen_global_mod_count);
    assert!(!after.variables[vars.pause.get()].dirty);
    Ok(())
}

#[test]
fn test_slot_change_without_counter_bump_stays_invisible() -> IpcResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shared.1");
    let (layout, vars) = schema()?;

    let a = attach(&path, &layout, 100)?;
    let b = attach(&path, &layout, 200)?;
    a.put(vars.pause, 5i64)?;
    assert_eq!(b.get::<i64>(vars.pause)?, 5);

    let slot = layout.slot_range(layout.descriptor(vars.pause)?);
    let file = OpenOptions::new().write(true).open(&path)?;
    file.write_all_at(&9i64.to_ne_bytes(), slot.start as u64)?;
    assert_eq!(std::fs::read(&path)?[slot], 9i64.to_ne_bytes());

    assert_eq!(b.get::<i64>(vars.pause)?, 5);

    // A global change for another variable does not mark this one dirty.
    a.put(vars.flag, true)?;
    assert!(b.get::<bool>(vars.flag)?);
    assert_eq!(b.get::<i64>(vars.pause)?, 5);
    Ok(())
}

#[test]
fn test_oversize_string_leaves_file_unchanged() -> IpcResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shared.1");
    let (layout, vars) = schema()?;

    let a = attach(&path, &layout, 100)?;
    let b = attach(&path, &layout, 200)?;
    a.put_string(vars.session, Some("short"))?;
    let bytes_before = std::fs::read(&path)?;

    let result = a.put_string(vars.session, Some(&"y".repeat(41)));
    assert!(matches!(
        result,
        Err(IpcError::ValueTooLarge {
            len: 41,
            capacity: 40,
            ..
        })
    ));

    assert_eq!(std::fs::read(&path)?, bytes_before);
    assert_eq!(a.get_string(vars.session)?.as_deref(), Some("short"));
    assert_eq!(b.get_string(vars.session)?.as_deref(), Some("short"));

    // Exactly at capacity is accepted.
    let full = "z".repeat(40);
    a.put_string(vars.session, Some(&full))?;
    assert_eq!(b.get_string(vars.session)?, Some(full));
    Ok(())
}

#[test]
fn test_null_string_is_shared() -> IpcResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shared.1");
    let (layout, vars) = schema()?;

    let a = attach(&path, &layout, 100)?;
    let b = attach(&path, &layout, 200)?;
    a.put_string(vars.session, Some("abc"))?;
    assert!(b.get_string(vars.session)?.is_some());

    a.put_string(vars.session, None)?;
    assert_eq!(b.get_string(vars.session)?, None);
    Ok(())
}

#[test]
fn test_atomic_updates_across_instances() -> IpcResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shared.1");
    let mut registry = VariableRegistry::new();
    let count = registry.declare_int("count")?;
    let total = registry.declare_long("total")?;
    let layout = registry.finalize();

    let a = attach(&path, &layout, 100)?;
    let b = attach(&path, &layout, 200)?;

    assert!(a.compare_and_set_int(count, 0, 1)?);
    // b's cache still says 0 but the swap reads the file.
    assert!(!b.compare_and_set_int(count, 0, 7)?);
    assert!(b.compare_and_set_int(count, 1, 2)?);
    assert_eq!(a.get::<i32>(count)?, 2);

    assert_eq!(a.add_long(total, 10)?, 10);
    assert_eq!(b.add_long(total, 5)?, 15);
    assert_eq!(a.get::<i64>(total)?, 15);
    Ok(())
}

#[test]
fn test_layout_mismatch_falls_back_to_single_process() -> IpcResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shared.1");
    let (layout, vars) = schema()?;
    let _a = attach(&path, &layout, 100)?;

    let mut registry = VariableRegistry::new();
    let other = registry.declare_long("somethingElse")?;
    let other_layout = registry.finalize();

    let strict = Store::try_open(&path, other_layout.clone(), 200);
    assert!(matches!(strict, Err(IpcError::LayoutMismatch { .. })));

    let degraded = Store::open(&path, other_layout, true, 200);
    assert!(!degraded.is_multi_process());
    degraded.put(other, 9i64)?;
    assert_eq!(degraded.get::<i64>(other)?, 9);

    // The original file is untouched by the degraded store.
    let b = attach(&path, &layout, 200)?;
    assert_eq!(b.get::<i64>(vars.pause)?, 0);
    Ok(())
}
