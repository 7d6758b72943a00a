//! # Stats Repository
//!
//! The persisted form of the statistics: one keyed document, one entry per
//! player, always rewritten in full.
//!
//! ```toml
//! ["6f1c2a9e-0d7b-4c55-9f0e-1b2c3d4e5f60"]
//! name = "Steve"
//! totalVeins = 12
//! totalBlocks = 431
//! largestVein = 64
//! lastMinedAt = 1767225600000
//! milestones = [100]
//! ```
//!
//! Entries are decoded one at a time so a single corrupt record never
//! costs the other players their data.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StatsError, StatsResult};
use crate::player::{PlayerId, StatsSnapshot};

/// On-disk representation of one player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedRecord {
    /// Display name.
    pub name: String,
    /// Number of vein-mining events.
    pub total_veins: u64,
    /// Blocks broken across all veins.
    pub total_blocks: u64,
    /// Largest single vein.
    pub largest_vein: u64,
    /// Last vein-mining time (ms since epoch).
    pub last_mined_at: u64,
    /// Achieved milestone thresholds, ascending.
    pub milestones: Vec<u64>,
}

impl PersistedRecord {
    /// Builds a record from a stats snapshot and a milestone set.
    #[must_use]
    pub fn new(stats: &StatsSnapshot, milestones: Vec<u64>) -> Self {
        Self {
            name: stats.name.clone(),
            total_veins: stats.total_veins,
            total_blocks: stats.total_blocks,
            largest_vein: stats.largest_vein,
            last_mined_at: stats.last_mined_at,
            milestones,
        }
    }

    /// The statistics part of the record.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            name: self.name.clone(),
            total_veins: self.total_veins,
            total_blocks: self.total_blocks,
            largest_vein: self.largest_vein,
            last_mined_at: self.last_mined_at,
        }
    }
}

/// An entry that could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedEntry {
    /// The document key.
    pub key: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Everything read from a stats document.
#[derive(Clone, Debug, Default)]
pub struct LoadedDocument {
    /// Successfully decoded records.
    pub records: BTreeMap<PlayerId, PersistedRecord>,
    /// Entries skipped because they were corrupt.
    pub rejected: Vec<RejectedEntry>,
}

/// Storage backend for the stats document.
///
/// Called from the save worker thread and from lazy milestone hydration,
/// so implementations must be thread-safe.
pub trait StatsRepository: Send + Sync {
    /// Reads the whole document. A missing document is empty, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read or is
    /// not a keyed document at all. Corrupt entries are reported in
    /// [`LoadedDocument::rejected`] instead.
    fn load_all(&self) -> StatsResult<LoadedDocument>;

    /// Reads one player's achieved milestones, `None` if the player has no
    /// entry.
    ///
    /// # Errors
    ///
    /// Same conditions as [`StatsRepository::load_all`].
    fn load_milestones(&self, player: PlayerId) -> StatsResult<Option<Vec<u64>>> {
        Ok(self
            .load_all()?
            .records
            .remove(&player)
            .map(|record| record.milestones))
    }

    /// Replaces the whole document with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded or written.
    fn write_all(&self, records: &BTreeMap<PlayerId, PersistedRecord>) -> StatsResult<()>;
}

/// Decodes a TOML stats document entry by entry.
///
/// # Errors
///
/// Returns [`StatsError::Parse`] if `text` is not a TOML table at all.
pub fn decode_document(text: &str) -> StatsResult<LoadedDocument> {
    let table: toml::Table = text
        .parse()
        .map_err(|e: toml::de::Error| StatsError::Parse(e.to_string()))?;

    let mut doc = LoadedDocument::default();
    for (key, value) in table {
        let id = match Uuid::parse_str(&key) {
            Ok(id) => id,
            Err(e) => {
                doc.rejected.push(RejectedEntry {
                    reason: StatsError::InvalidPlayerId(e.to_string()).to_string(),
                    key,
                });
                continue;
            }
        };
        match value.try_into::<PersistedRecord>() {
            Ok(mut record) => {
                record.milestones.sort_unstable();
                record.milestones.dedup();
                doc.records.insert(id, record);
            }
            Err(e) => doc.rejected.push(RejectedEntry {
                key,
                reason: e.to_string(),
            }),
        }
    }
    Ok(doc)
}

/// Encodes records as a TOML stats document.
///
/// # Errors
///
/// Returns [`StatsError::Serialize`] if a value cannot be represented
/// (e.g. a counter above `i64::MAX`).
pub fn encode_document(records: &BTreeMap<PlayerId, PersistedRecord>) -> StatsResult<String> {
    let keyed: BTreeMap<String, &PersistedRecord> = records
        .iter()
        .map(|(id, record)| (id.hyphenated().to_string(), record))
        .collect();
    toml::to_string(&keyed).map_err(|e| StatsError::Serialize(e.to_string()))
}

/// Stats document stored as a TOML file.
///
/// Writes go to a sibling temp file which is then renamed over the
/// document, so a crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct TomlFileRepository {
    /// Document path.
    path: PathBuf,
}

impl TomlFileRepository {
    /// Creates a repository for the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StatsError {
        StatsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StatsRepository for TomlFileRepository {
    fn load_all(&self) -> StatsResult<LoadedDocument> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadedDocument::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        decode_document(&text)
    }

    fn write_all(&self, records: &BTreeMap<PlayerId, PersistedRecord>) -> StatsResult<()> {
        let text = encode_document(records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

/// Stats document held in memory.
///
/// For hosts that keep statistics only for the life of the process, and
/// for tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    /// Current document.
    records: Mutex<BTreeMap<PlayerId, PersistedRecord>>,
    /// Number of completed `write_all` calls.
    writes: Mutex<u64>,
    /// Number of document or milestone reads.
    reads: Mutex<u64>,
}

impl MemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: BTreeMap<PlayerId, PersistedRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            writes: Mutex::new(0),
            reads: Mutex::new(0),
        }
    }

    /// Copy of the current document.
    #[must_use]
    pub fn records(&self) -> BTreeMap<PlayerId, PersistedRecord> {
        self.records.lock().clone()
    }

    /// Number of completed writes.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        *self.writes.lock()
    }

    /// Number of reads served.
    #[must_use]
    pub fn read_count(&self) -> u64 {
        *self.reads.lock()
    }
}

impl StatsRepository for MemoryRepository {
    fn load_all(&self) -> StatsResult<LoadedDocument> {
        *self.reads.lock() += 1;
        Ok(LoadedDocument {
            records: self.records.lock().clone(),
            rejected: Vec::new(),
        })
    }

    fn load_milestones(&self, player: PlayerId) -> StatsResult<Option<Vec<u64>>> {
        *self.reads.lock() += 1;
        Ok(self.records.lock().get(&player).map(|r| r.milestones.clone()))
    }

    fn write_all(&self, records: &BTreeMap<PlayerId, PersistedRecord>) -> StatsResult<()> {
        *self.records.lock() = records.clone();
        *self.writes.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("test_stats_repo_{id}.toml"))
    }

    fn sample() -> BTreeMap<PlayerId, PersistedRecord> {
        let mut records = BTreeMap::new();
        records.insert(
            Uuid::from_u128(1),
            PersistedRecord {
                name: "Steve".to_string(),
                total_veins: 3,
                total_blocks: 150,
                largest_vein: 64,
                last_mined_at: 1_700_000_000_000,
                milestones: vec![100],
            },
        );
        records.insert(
            Uuid::from_u128(2),
            PersistedRecord {
                name: "Alex".to_string(),
                ..PersistedRecord::default()
            },
        );
        records
    }

    #[test]
    fn test_document_uses_camel_case_fields() {
        let text = encode_document(&sample()).unwrap();
        assert!(text.contains("totalVeins = 3"));
        assert!(text.contains("lastMinedAt = 1700000000000"));
        assert!(text.contains("milestones = [100]"));
        assert!(text.contains("00000000-0000-0000-0000-000000000001"));
    }

    #[test]
    fn test_decode_isolates_corrupt_entries() {
        let text = r#"
            ["00000000-0000-0000-0000-000000000001"]
            name = "Steve"
            totalVeins = 2
            totalBlocks = 20

            ["00000000-0000-0000-0000-000000000002"]
            name = "Broken"
            totalVeins = "lots"

            ["not-a-uuid"]
            name = "Ghost"
        "#;

        let doc = decode_document(text).unwrap();
        assert_eq!(doc.records.len(), 1);
        assert_eq!(doc.records[&Uuid::from_u128(1)].total_blocks, 20);
        // Missing fields default to zero
        assert_eq!(doc.records[&Uuid::from_u128(1)].largest_vein, 0);
        assert_eq!(doc.rejected.len(), 2);
    }

    #[test]
    fn test_decode_rejects_garbage_document() {
        assert!(matches!(decode_document("this is [not toml"), Err(StatsError::Parse(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let path = temp_path();
        let repo = TomlFileRepository::new(&path);

        repo.write_all(&sample()).unwrap();
        let doc = repo.load_all().unwrap();
        assert_eq!(doc.records, sample());
        assert!(doc.rejected.is_empty());

        assert_eq!(repo.load_milestones(Uuid::from_u128(1)).unwrap(), Some(vec![100]));
        assert_eq!(repo.load_milestones(Uuid::from_u128(9)).unwrap(), None);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_empty() {
        let repo = TomlFileRepository::new(temp_path());
        let doc = repo.load_all().unwrap();
        assert!(doc.records.is_empty());
    }

    #[test]
    fn test_memory_repository_counts_writes() {
        let repo = MemoryRepository::new();
        repo.write_all(&sample()).unwrap();
        repo.write_all(&sample()).unwrap();
        assert_eq!(repo.write_count(), 2);
        assert_eq!(repo.records(), sample());
    }
}
