use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::batch::WriteBatch;
use crate::error::{StoreError, StoreResult};
use crate::traits::{KvRange, KvStore};

/// Flush/sync strategy for the batch log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every commit (safest, highest latency).
    #[default]
    EveryWrite,
    /// Flush to the OS and rely on its page cache.
    OsDefault,
}

/// What replay found when the log was opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Batches applied to the in-memory view.
    pub batches: u64,
    /// Complete frames whose CRC did not match; skipped.
    pub corrupt_frames: u64,
    /// Bytes of torn tail cut off the end of the file.
    pub truncated_bytes: u64,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// The file end the writer appends to.
trait LogFile: Write {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Appends frames and tracks where the last whole frame ends.
///
/// A frame that fails to write or sync is cut off again, so the file never
/// holds a batch whose commit reported an error.
struct LogWriter<F> {
    file: F,
    /// Length of the log up to the end of the last committed frame.
    offset: u64,
    /// Set when a failed frame could not be cut off.
    failed: bool,
}

impl<F: LogFile> LogWriter<F> {
    fn new(file: F, offset: u64) -> Self {
        Self {
            file,
            offset,
            failed: false,
        }
    }

    fn append(&mut self, frame: &[u8], sync: SyncMode) -> StoreResult<()> {
        if self.failed {
            return Err(StoreError::LogFailed);
        }
        let written = self.file.write_all(frame).and_then(|()| match sync {
            SyncMode::EveryWrite => self.file.sync(),
            SyncMode::OsDefault => self.file.flush(),
        });
        match written {
            Ok(()) => {
                self.offset += frame.len() as u64;
                Ok(())
            }
            Err(e) => {
                warn!(offset = self.offset, error = %e, "frame append failed; truncating");
                let cut = self.file.truncate(self.offset).and_then(|()| self.file.sync());
                if let Err(cut) = cut {
                    warn!(offset = self.offset, error = %cut, "cannot truncate failed frame");
                    self.failed = true;
                }
                Err(e.into())
            }
        }
    }
}

/// Durable store backed by an append-only log of write batches.
///
/// On-disk format, one frame per committed batch:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized WriteBatch)]
/// ```
///
/// The whole log is replayed into an ordered map on open and reads are
/// served from that map. A batch reaches the map only after its frame has
/// been written, and a frame that did not make it to disk whole is dropped
/// on the next open, so every batch is applied all-or-nothing.
pub struct LogKvStore {
    path: PathBuf,
    sync: SyncMode,
    writer: Mutex<LogWriter<File>>,
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    stats: ReplayStats,
}

impl LogKvStore {
    /// Open (or create) a log file at the given path and replay it.
    pub fn open(path: &Path, sync: SyncMode) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut entries = BTreeMap::new();
        let (valid_len, mut stats) = replay(&data, &mut entries);

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        if valid_len < data.len() as u64 {
            stats.truncated_bytes = data.len() as u64 - valid_len;
            warn!(
                path = %path.display(),
                valid_len,
                dropped = stats.truncated_bytes,
                "torn tail in batch log; truncating"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        info!(
            path = %path.display(),
            batches = stats.batches,
            keys = entries.len(),
            "batch log opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            sync,
            writer: Mutex::new(LogWriter::new(file, valid_len)),
            entries: RwLock::new(entries),
            stats,
        })
    }

    /// Replay statistics from the most recent open.
    pub fn replay_stats(&self) -> ReplayStats {
        self.stats
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rewrite the log as a single frame holding the current contents.
    ///
    /// The replacement is written beside the log and renamed over it, so a
    /// crash mid-compaction leaves the old log intact.
    pub fn compact(&self) -> StoreResult<()> {
        let mut writer = self.writer.lock().map_err(|_| StoreError::LockPoisoned)?;
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;

        let mut snapshot = WriteBatch::new();
        for (key, value) in entries.iter() {
            snapshot.put(key.clone(), value.clone());
        }
        let frame = encode_frame(&snapshot)?;

        let tmp_path = self.path.with_extension("compact");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&frame)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        *writer = LogWriter::new(file, frame.len() as u64);

        debug!(keys = entries.len(), bytes = frame.len(), "batch log compacted");
        Ok(())
    }
}

impl KvStore for LogKvStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn range(&self, start: &[u8], end: &[u8]) -> StoreResult<KvRange> {
        if start >= end {
            return Ok(KvRange::empty());
        }
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        let pairs = entries
            .range::<[u8], _>((
                std::ops::Bound::Included(start),
                std::ops::Bound::Excluded(end),
            ))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(KvRange::new(pairs))
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let frame = encode_frame(&batch)?;

        // Holding the writer lock across the map update keeps the map in log order.
        let mut writer = self.writer.lock().map_err(|_| StoreError::LockPoisoned)?;
        writer.append(&frame, self.sync)?;

        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        batch.apply_to(&mut entries);

        debug!(ops = batch.len(), bytes = frame.len(), "batch committed");
        Ok(())
    }
}

impl std::fmt::Debug for LogKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogKvStore")
            .field("path", &self.path)
            .field("sync", &self.sync)
            .field("key_count", &self.len())
            .finish()
    }
}

fn encode_frame(batch: &WriteBatch) -> StoreResult<Vec<u8>> {
    let payload =
        bincode::serialize(batch).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization("batch exceeds 4 GiB".into()))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Apply every intact frame in `data` to `entries`.
///
/// Returns the byte length of the well-formed prefix of the log. Frames
/// with a bad CRC are skipped; an impossible length or a short final frame
/// ends replay.
fn replay(data: &[u8], entries: &mut BTreeMap<Vec<u8>, Vec<u8>>) -> (u64, ReplayStats) {
    let mut stats = ReplayStats::default();
    let mut offset = 0usize;

    while offset + HEADER_SIZE <= data.len() {
        let header = &data[offset..offset + HEADER_SIZE];
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let payload_start = offset + HEADER_SIZE;
        if length == 0 || payload_start + length > data.len() {
            warn!(offset, length, "invalid or truncated frame; stopping replay");
            break;
        }
        let payload = &data[payload_start..payload_start + length];
        let next = payload_start + length;

        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping frame"
            );
            stats.corrupt_frames += 1;
            offset = next;
            continue;
        }

        match bincode::deserialize::<WriteBatch>(payload) {
            Ok(batch) => {
                batch.apply_to(entries);
                stats.batches += 1;
            }
            Err(e) => {
                let err = StoreError::CorruptFrame {
                    offset: offset as u64,
                    reason: e.to_string(),
                };
                warn!(error = %err, "undecodable frame; skipping");
                stats.corrupt_frames += 1;
            }
        }
        offset = next;
    }

    debug!(batches = stats.batches, "batch log replay complete");
    (offset as u64, stats)
}
