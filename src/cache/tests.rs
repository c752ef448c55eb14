//! Behavioural tests for the caching wrapper.

use super::*;
use crate::{from_fn, Operation};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use tracing_test::traced_test;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// A clock tests can move by hand.
#[derive(Clone)]
struct ManualClock(Rc<Cell<NaiveDateTime>>);

impl ManualClock {
    fn starting_at(t: NaiveDateTime) -> Self {
        ManualClock(Rc::new(Cell::new(t)))
    }

    fn advance(&self, secs: i64) {
        self.0.set(self.0.get() + TimeDelta::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|listing| {
            listing
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn test_second_call_is_served_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Cell::new(0);
    let op = from_fn("add", |(a, b): &(i32, i32)| {
        calls.set(calls.get() + 1);
        Ok::<_, String>(a + b)
    });
    let mut cache = Cache::new(op, CacheConfig::new().with_dir(dir.path())).unwrap();

    assert_eq!(cache.execute(&(2, 3)).unwrap(), 5);
    assert_eq!(cache.execute(&(2, 3)).unwrap(), 5);
    assert_eq!(calls.get(), 1);

    assert_eq!(cache.execute(&(3, 2)).unwrap(), 5);
    assert_eq!(calls.get(), 2);
    assert_eq!(files_in(dir.path()).len(), 2);
}

#[test]
fn test_file_is_named_after_call() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::starting_at(at(9, 8, 7));
    let op = from_fn("gauss", |_: &(f64, f64)| Ok::<_, String>(1.25));
    let mut cache = Cache::with_clock(op, CacheConfig::new().with_dir(dir.path()), clock).unwrap();

    cache.execute(&(10.0, 3.0)).unwrap();

    let fp = fingerprint("gauss", &CallArgs::new().arg(10.0).arg(3.0));
    assert_eq!(
        files_in(dir.path()),
        [format!("gauss_{}_2026-10-16_090807.bin", fp)]
    );
    assert_eq!(cache.inventory().newest(&fp).unwrap().created_at, at(9, 8, 7));
}

#[test]
fn test_stale_entry_is_recomputed() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::starting_at(at(12, 0, 0));
    let calls = Cell::new(0);
    let op = from_fn("tick", |_: &()| {
        calls.set(calls.get() + 1);
        Ok::<_, String>(calls.get())
    });
    let config = CacheConfig::new()
        .with_dir(dir.path())
        .with_reachback("1 hour");
    let mut cache = Cache::with_clock(op, config, clock.clone()).unwrap();

    assert_eq!(cache.execute(&()).unwrap(), 1);
    clock.advance(3600);
    // exactly at the cutoff still counts as fresh
    assert_eq!(cache.execute(&()).unwrap(), 1);
    clock.advance(1);
    assert_eq!(cache.execute(&()).unwrap(), 2);
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_set_reachback_forces_recompute() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::starting_at(at(12, 0, 0));
    let calls = Cell::new(0);
    let op = from_fn("tick", |_: &()| {
        calls.set(calls.get() + 1);
        Ok::<_, String>(calls.get())
    });
    let mut cache = Cache::with_clock(op, CacheConfig::new().with_dir(dir.path()), clock.clone()).unwrap();

    assert_eq!(cache.execute(&()).unwrap(), 1);
    clock.advance(10);
    assert_eq!(cache.execute(&()).unwrap(), 1);

    cache.set_reachback("2026-10-16 12:00:05").unwrap();
    assert_eq!(cache.execute(&()).unwrap(), 2);
    assert_eq!(cache.execute(&()).unwrap(), 2);
    assert_eq!(calls.get(), 2);

    assert!(cache.set_reachback("later").is_err());
    assert_eq!(cache.reachback().to_string(), "2026-10-16 12:00:05");
}

#[test]
fn test_single_version_keeps_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::starting_at(at(8, 0, 0));
    let op = from_fn("tick", |_: &()| Ok::<_, String>(7u8));
    let config = CacheConfig::new().with_dir(dir.path()).with_reachback("0 seconds");
    let mut cache = Cache::with_clock(op, config, clock.clone()).unwrap();

    cache.execute(&()).unwrap();
    clock.advance(1);
    cache.execute(&()).unwrap();

    let files = files_in(dir.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_2026-10-16_080001.bin"));
    assert_eq!(cache.inventory().len(), 1);
}

#[test]
fn test_hoard_keeps_every_file() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::starting_at(at(8, 0, 0));
    let op = from_fn("tick", |_: &()| Ok::<_, String>(7u8));
    let config = CacheConfig::new()
        .with_dir(dir.path())
        .with_reachback("0 seconds")
        .with_hoard(true);
    let mut cache = Cache::with_clock(op, config, clock.clone()).unwrap();

    cache.execute(&()).unwrap();
    clock.advance(1);
    cache.execute(&()).unwrap();

    assert_eq!(files_in(dir.path()).len(), 2);
    assert_eq!(cache.inventory().len(), 2);
    assert!(cache.is_hoarding());
}

#[test]
fn test_same_second_rewrite_keeps_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::starting_at(at(8, 0, 0));
    let calls = Cell::new(0u32);
    let op = from_fn("tick", |_: &()| {
        calls.set(calls.get() + 1);
        Ok::<_, String>(calls.get())
    });
    let config = CacheConfig::new()
        .with_dir(dir.path())
        .with_reachback("2026-10-16 08:00:01");
    let mut cache = Cache::with_clock(op, config, clock).unwrap();

    assert_eq!(cache.execute(&()).unwrap(), 1);
    assert_eq!(cache.execute(&()).unwrap(), 2);

    assert_eq!(files_in(dir.path()).len(), 1);
    assert_eq!(cache.inventory().len(), 1);
    let fp = fingerprint("tick", &CallArgs::new());
    let path = cache.inventory().newest(&fp).unwrap().path.clone();
    assert_eq!(super::store::read::<u32>(&path).unwrap(), 2);
}

#[test]
fn test_existing_files_are_found_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Cell::new(0);
    let make_op = || {
        from_fn("slow_square", |(x,): &(u64,)| {
            calls.set(calls.get() + 1);
            Ok::<_, String>(x * x)
        })
    };

    let mut first = Cache::new(make_op(), CacheConfig::new().with_dir(dir.path())).unwrap();
    assert_eq!(first.execute(&(9,)).unwrap(), 81);
    drop(first);

    let mut second = Cache::new(make_op(), CacheConfig::new().with_dir(dir.path())).unwrap();
    assert_eq!(second.inventory().len(), 1);
    assert_eq!(second.execute(&(9,)).unwrap(), 81);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_rescan_sees_external_removal() {
    let dir = tempfile::tempdir().unwrap();
    let op = from_fn("one", |_: &()| Ok::<_, String>(1i32));
    let mut cache = Cache::new(op, CacheConfig::new().with_dir(dir.path())).unwrap();

    cache.execute(&()).unwrap();
    for name in files_in(dir.path()) {
        std::fs::remove_file(dir.path().join(name)).unwrap();
    }

    // the inventory still points at the deleted file
    assert!(matches!(cache.execute(&()), Err(CachedCallError::Storage(CacheError::Io { .. }))));

    cache.rescan().unwrap();
    assert!(cache.inventory().is_empty());
    assert_eq!(cache.execute(&()).unwrap(), 1);
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let op = from_fn("one", |_: &()| Ok::<_, String>(1.0f64));
    let mut cache = Cache::new(op, CacheConfig::new().with_dir(dir.path())).unwrap();
    cache.execute(&()).unwrap();

    let name = &files_in(dir.path())[0];
    std::fs::write(dir.path().join(name), b"xx").unwrap();

    let err = cache.execute(&()).unwrap_err();
    assert!(err.is_storage());
    assert!(err.to_string().contains("codec"));
}

#[test]
#[traced_test]
fn test_absent_result_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Cell::new(0);
    let op = from_fn("lookup", |(key,): &(&str,)| {
        calls.set(calls.get() + 1);
        Ok::<_, String>(if *key == "known" { Some(1u32) } else { None })
    });
    let mut cache = Cache::new(op, CacheConfig::new().with_dir(dir.path())).unwrap();

    assert_eq!(cache.execute(&("unknown",)).unwrap(), None);
    assert_eq!(cache.execute(&("unknown",)).unwrap(), None);
    assert_eq!(calls.get(), 2);
    assert!(files_in(dir.path()).is_empty());
    assert!(logs_contain("operation returned no result, not caching"));

    assert_eq!(cache.execute(&("known",)).unwrap(), Some(1));
    assert_eq!(cache.execute(&("known",)).unwrap(), Some(1));
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_operation_error_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Cell::new(0);
    let op = from_fn("flaky", |_: &()| {
        calls.set(calls.get() + 1);
        if calls.get() == 1 {
            Err("timeout".to_string())
        } else {
            Ok(5i32)
        }
    });
    let mut cache = Cache::new(op, CacheConfig::new().with_dir(dir.path())).unwrap();

    let err = cache.execute(&()).unwrap_err();
    assert_eq!(err.into_operation(), Some("timeout".to_string()));
    assert!(files_in(dir.path()).is_empty());

    assert_eq!(cache.execute(&()).unwrap(), 5);
    assert_eq!(cache.execute(&()).unwrap(), 5);
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_tables_are_stored_as_csv() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Cell::new(0);
    let op = from_fn("report", |(n,): &(usize,)| {
        calls.set(calls.get() + 1);
        let mut table = Table::new(["i", "square"]);
        for i in 0..*n {
            table.push_row([i, i * i]);
        }
        Ok::<_, String>(table)
    });
    let mut cache = Cache::new(op, CacheConfig::new().with_dir(dir.path())).unwrap();

    let fresh = cache.execute(&(3,)).unwrap();
    let served = cache.execute(&(3,)).unwrap();
    assert_eq!(fresh, served);
    assert_eq!(calls.get(), 1);

    let name = &files_in(dir.path())[0];
    assert!(name.ends_with(".csv"));
    let text = std::fs::read_to_string(dir.path().join(name)).unwrap();
    assert_eq!(text, "i,square\n0,0\n1,1\n2,4\n");
}

#[test]
#[traced_test]
fn test_logs_hits_and_misses() {
    let dir = tempfile::tempdir().unwrap();
    let op = from_fn("logged", |_: &()| Ok::<_, String>(0u8));
    let mut cache = Cache::new(op, CacheConfig::new().with_dir(dir.path())).unwrap();

    cache.execute(&()).unwrap();
    cache.execute(&()).unwrap();

    assert!(logs_contain("cache miss"));
    assert!(logs_contain("stored result"));
    assert!(logs_contain("cache hit"));
}

#[test]
fn test_construction_errors() {
    let dir = tempfile::tempdir().unwrap();

    let op = from_fn("ok", |_: &()| Ok::<_, String>(0u8));
    let bad_reachback = CacheConfig::new().with_dir(dir.path()).with_reachback("whenever");
    assert!(matches!(
        Cache::new(op, bad_reachback),
        Err(CacheError::Reachback(ReachbackError::Malformed(_)))
    ));

    let op = from_fn("../escape", |_: &()| Ok::<_, String>(0u8));
    assert!(matches!(
        Cache::new(op, CacheConfig::new().with_dir(dir.path())),
        Err(CacheError::InvalidName(_))
    ));
}

#[test]
fn test_cache_is_an_operation() {
    fn run<O: Operation<(i32,)>>(op: &mut O, x: i32) -> Result<O::Output, O::Error> {
        op.call(&(x,))
    }

    let dir = tempfile::tempdir().unwrap();
    let op = from_fn("neg", |(x,): &(i32,)| Ok::<_, String>(-x));
    let mut cache = Cache::new(op, CacheConfig::new().with_dir(dir.path())).unwrap();

    assert_eq!(run(&mut cache, 4).unwrap(), -4);
    assert_eq!(run(&mut cache, 4).unwrap(), -4);
    assert_eq!(Operation::<(i32,)>::name(&cache), "neg");
    assert_eq!(cache.name(), "neg");
}
