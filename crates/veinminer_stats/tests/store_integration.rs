//! Integration tests for the statistics store: concurrent recording,
//! exactly-once milestones across restarts, and the save path.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use uuid::Uuid;
use veinminer_stats::{
    LoadedDocument, MemoryRepository, PersistedRecord, PlayerId, SaveMode, SaveOutcome, StatisticsStore, StatsError,
    StatsRepository, StatsResult, StatsSettings, TomlFileRepository,
};

fn temp_path(tag: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_veinminer_{tag}_{id}.toml"))
}

fn store(repo: Arc<dyn StatsRepository>) -> StatisticsStore {
    StatisticsStore::new(StatsSettings::default(), repo).unwrap()
}

/// Repository whose writes block until released, and optionally fail.
#[derive(Default)]
struct GatedRepository {
    inner: MemoryRepository,
    released: Mutex<bool>,
    cv: Condvar,
    writes_started: AtomicUsize,
    fail: Mutex<bool>,
}

impl GatedRepository {
    fn release(&self) {
        *self.released.lock() = true;
        self.cv.notify_all();
    }

    fn wait_for_write(&self) {
        while self.writes_started.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl StatsRepository for GatedRepository {
    fn load_all(&self) -> StatsResult<LoadedDocument> {
        self.inner.load_all()
    }

    fn write_all(&self, records: &BTreeMap<PlayerId, PersistedRecord>) -> StatsResult<()> {
        self.writes_started.fetch_add(1, Ordering::SeqCst);
        let mut released = self.released.lock();
        while !*released {
            self.cv.wait(&mut released);
        }
        drop(released);

        if *self.fail.lock() {
            return Err(StatsError::Backend("disk full".to_string()));
        }
        self.inner.write_all(records)
    }
}

#[test]
fn test_concurrent_first_records_share_one_player() {
    let store = Arc::new(store(Arc::new(MemoryRepository::new())));
    let player = Uuid::from_u128(42);
    let counts: Vec<u64> = (1..=16).collect();
    let barrier = Arc::new(Barrier::new(counts.len()));

    let handles: Vec<_> = counts
        .iter()
        .map(|&count| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.record_vein_mine(player, "Racer", count);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stats = store.get_stats(player, "Racer");
    assert_eq!(stats.total_veins, 16);
    assert_eq!(stats.total_blocks, counts.iter().sum::<u64>());
    assert_eq!(stats.largest_vein, 16);
    assert_eq!(store.player_count(), 1);
}

#[test]
fn test_concurrent_crossing_grants_each_milestone_once() {
    let store = Arc::new(store(Arc::new(MemoryRepository::new())));
    let player = Uuid::from_u128(43);

    // 8 threads x 100 records x 10 blocks = 8000 blocks: crosses 100..5000
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..100)
                    .flat_map(|_| store.record_vein_mine(player, "Racer", 10))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut granted: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    granted.sort_unstable();

    assert_eq!(granted, vec![100, 500, 1_000, 5_000]);
    assert_eq!(store.pending_rewards(), 4);
}

#[test]
fn test_save_load_round_trip() {
    let path = temp_path("round_trip");
    let players = [
        (Uuid::from_u128(1), "Steve", vec![40u64, 80]),
        (Uuid::from_u128(2), "Alex", vec![600]),
        (Uuid::from_u128(3), "Notch", vec![5, 5, 5]),
    ];

    let first = store(Arc::new(TomlFileRepository::new(&path)));
    for (id, name, veins) in &players {
        for &blocks in veins {
            first.record_vein_mine(*id, name, blocks);
        }
    }
    assert_eq!(
        first.save(SaveMode::Blocking).unwrap(),
        SaveOutcome::Written { players: 3 }
    );

    let second = store(Arc::new(TomlFileRepository::new(&path)));
    let report = second.load().unwrap();
    assert_eq!(report.loaded, 3);
    assert!(report.rejected.is_empty());

    for (id, name, _) in &players {
        assert_eq!(second.get_stats(*id, name), first.get_stats(*id, name));
        assert_eq!(second.milestones().achieved(*id), first.milestones().achieved(*id));
    }
    assert_eq!(second.milestones().achieved(Uuid::from_u128(1)), vec![100]);
    assert_eq!(second.milestones().achieved(Uuid::from_u128(2)), vec![100, 500]);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_restart_does_not_regrant() {
    let path = temp_path("restart");
    let player = Uuid::from_u128(7);

    let first = store(Arc::new(TomlFileRepository::new(&path)));
    assert_eq!(first.record_vein_mine(player, "Steve", 150), vec![100]);
    first.shutdown().unwrap();

    // Fresh process that never called load(): hydration alone must prevent
    // re-granting the 100 milestone
    let second = store(Arc::new(TomlFileRepository::new(&path)));
    assert!(second.record_vein_mine(player, "Steve", 150).is_empty());
    assert_eq!(second.record_vein_mine(player, "Steve", 400), vec![500]);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_save_preserves_milestones_of_untouched_players() {
    let path = temp_path("untouched");
    let veteran = Uuid::from_u128(8);
    let newcomer = Uuid::from_u128(9);

    let first = store(Arc::new(TomlFileRepository::new(&path)));
    first.record_vein_mine(veteran, "Veteran", 600);
    first.shutdown().unwrap();

    let second = store(Arc::new(TomlFileRepository::new(&path)));
    second.load().unwrap();
    second.record_vein_mine(newcomer, "Newcomer", 3);
    assert!(!second.milestones().is_hydrated(veteran));
    second.save(SaveMode::Blocking).unwrap();

    let third = store(Arc::new(TomlFileRepository::new(&path)));
    assert_eq!(third.milestones().achieved(veteran), vec![100, 500]);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_at_most_one_save_in_flight() {
    let repo = Arc::new(GatedRepository::default());
    let source: Arc<dyn StatsRepository> = repo.clone();
    let store = store(source);
    store.record_vein_mine(Uuid::from_u128(1), "Steve", 5);

    assert_eq!(
        store.save(SaveMode::Background).unwrap(),
        SaveOutcome::Queued { players: 1 }
    );
    repo.wait_for_write();

    assert!(store.save_in_flight());
    assert_eq!(store.save(SaveMode::Background).unwrap(), SaveOutcome::AlreadyInFlight);
    assert_eq!(store.save(SaveMode::Blocking).unwrap(), SaveOutcome::AlreadyInFlight);

    repo.release();
    while store.save_in_flight() {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(repo.writes_started.load(Ordering::SeqCst), 1);
    assert_eq!(repo.inner.write_count(), 1);
}

#[test]
fn test_failed_save_releases_guard() {
    let repo = Arc::new(GatedRepository::default());
    *repo.fail.lock() = true;
    repo.release();
    let source: Arc<dyn StatsRepository> = repo.clone();
    let store = store(source);
    store.record_vein_mine(Uuid::from_u128(1), "Steve", 5);

    assert!(matches!(store.save(SaveMode::Blocking), Err(StatsError::Backend(_))));
    assert!(!store.save_in_flight());

    // In-memory stats survive, and the next save goes through
    *repo.fail.lock() = false;
    assert_eq!(
        store.save(SaveMode::Blocking).unwrap(),
        SaveOutcome::Written { players: 1 }
    );
    assert_eq!(repo.inner.records()[&Uuid::from_u128(1)].total_blocks, 5);
}

#[test]
fn test_failed_background_save_releases_guard() {
    let repo = Arc::new(GatedRepository::default());
    *repo.fail.lock() = true;
    repo.release();
    let source: Arc<dyn StatsRepository> = repo.clone();
    let store = store(source);
    store.record_vein_mine(Uuid::from_u128(1), "Steve", 5);

    store.save(SaveMode::Background).unwrap();
    repo.wait_for_write();
    while store.save_in_flight() {
        thread::sleep(Duration::from_millis(1));
    }

    assert!(matches!(
        store.save(SaveMode::Background).unwrap(),
        SaveOutcome::Queued { .. }
    ));
}

#[test]
fn test_corrupt_entry_does_not_lose_other_players() {
    let path = temp_path("corrupt");
    std::fs::write(
        &path,
        r#"
        ["00000000-0000-0000-0000-000000000001"]
        name = "Steve"
        totalVeins = 2
        totalBlocks = 20
        largestVein = 12
        milestones = []

        ["00000000-0000-0000-0000-000000000002"]
        name = "Broken"
        totalBlocks = -5
        "#,
    )
    .unwrap();

    let store = store(Arc::new(TomlFileRepository::new(&path)));
    let report = store.load().unwrap();

    assert_eq!(report.loaded, 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(store.get_stats(Uuid::from_u128(1), "Steve").largest_vein, 12);
    assert!(store.get_stats(Uuid::from_u128(2), "Broken").is_empty());

    std::fs::remove_file(&path).ok();
}
