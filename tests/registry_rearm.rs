// tests/registry_rearm.rs

use std::error::Error;
use std::fs;

use tempfile::TempDir;
use watchsh::watch::{NotifyChannel, RegistryError, WatchDescriptor, WatchRegistry, MAX_WATCH_COUNT};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn existing_paths_register_and_resolve() -> TestResult {
    let dir = TempDir::new()?;
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "a")?;
    fs::write(&b, "b")?;

    let channel = NotifyChannel::init()?;
    let mut registry = WatchRegistry::new();

    let wd_a = registry.register(&channel, &a)?;
    let wd_b = registry.register(&channel, &b)?;

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.resolve(wd_a), Some(a.as_path()));
    assert_eq!(registry.resolve(wd_b), Some(b.as_path()));

    // Entries stay in original registration order.
    let paths: Vec<_> = registry.paths().collect();
    assert_eq!(paths, vec![a.as_path(), b.as_path()]);
    Ok(())
}

#[tokio::test]
async fn failed_registration_is_not_tracked() -> TestResult {
    let dir = TempDir::new()?;
    let missing = dir.path().join("does-not-exist.txt");

    let channel = NotifyChannel::init()?;
    let mut registry = WatchRegistry::new();

    let err = registry.register(&channel, &missing).unwrap_err();
    assert!(matches!(err, RegistryError::Watch { .. }));
    assert!(registry.is_empty());
    Ok(())
}

#[tokio::test]
async fn resolve_unknown_descriptor_is_none() -> TestResult {
    let registry = WatchRegistry::new();
    assert_eq!(registry.resolve(WatchDescriptor::from_raw(9999)), None);
    Ok(())
}

#[tokio::test]
async fn rearm_round_trip_keeps_path_resolvable() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("watched.txt");
    fs::write(&path, "seed")?;

    let channel = NotifyChannel::init()?;
    let mut registry = WatchRegistry::new();

    registry.register(&channel, &path)?;
    fs::write(&path, "changed")?;

    let wd = registry.rearm(&channel, &path)?;
    assert_eq!(registry.resolve(wd), Some(path.as_path()));
    assert_eq!(registry.len(), 1);
    Ok(())
}

#[tokio::test]
async fn rearm_failure_drops_the_path() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("fleeting.txt");
    fs::write(&path, "seed")?;

    let channel = NotifyChannel::init()?;
    let mut registry = WatchRegistry::new();

    let wd = registry.register(&channel, &path)?;
    fs::remove_file(&path)?;

    let err = registry.rearm(&channel, &path).unwrap_err();
    assert!(matches!(err, RegistryError::Watch { .. }));
    assert_eq!(registry.resolve(wd), None);
    assert!(registry.is_exhausted());
    Ok(())
}

#[tokio::test]
async fn capacity_bound_is_enforced() -> TestResult {
    let dir = TempDir::new()?;
    let channel = NotifyChannel::init()?;
    let mut registry = WatchRegistry::new();

    for index in 0..MAX_WATCH_COUNT - 1 {
        let path = dir.path().join(format!("file-{index}.txt"));
        fs::write(&path, "x")?;
        registry.register(&channel, &path)?;
    }
    assert_eq!(registry.len(), MAX_WATCH_COUNT - 1);

    let over = dir.path().join("one-too-many.txt");
    fs::write(&over, "x")?;
    let err = registry.register(&channel, &over).unwrap_err();
    assert!(matches!(err, RegistryError::CapacityExceeded));
    assert_eq!(registry.len(), MAX_WATCH_COUNT - 1);
    Ok(())
}

#[tokio::test]
async fn reregistering_a_tracked_path_does_not_consume_capacity() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("stable.txt");
    fs::write(&path, "x")?;

    let channel = NotifyChannel::init()?;
    let mut registry = WatchRegistry::new();

    registry.register(&channel, &path)?;
    registry.register(&channel, &path)?;
    assert_eq!(registry.len(), 1);
    Ok(())
}
