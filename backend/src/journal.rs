// =============================================================================
// Trading Journal: bounded record of every successful analysis
// =============================================================================
//
// One `TradingRecord` per analysis: the latest bar, the predicted action and
// the indicator snapshot it was based on. Records live in a ring buffer
// (oldest evicted first) and, when a path is configured, are appended to a
// JSON-lines file that is replayed at startup.
// =============================================================================

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::Analysis;
use crate::indicators::IndicatorSnapshot;
use crate::types::Action;

pub const DEFAULT_CAPACITY: usize = 500;

/// A single journal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingRecord {
    /// UUID v4.
    pub id: String,
    pub symbol: String,
    /// RFC 3339 time the record was written.
    pub timestamp: String,
    /// Open time of the analysed bar, ms since the epoch.
    pub bar_timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub action: Action,
    pub confidence: f64,
    pub indicators: IndicatorSnapshot,
}

impl TradingRecord {
    pub fn new(symbol: &str, analysis: &Analysis) -> Self {
        let bar = &analysis.bar;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            bar_timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            action: analysis.decision.action,
            confidence: analysis.result.confidence,
            indicators: analysis.snapshot.clone(),
        }
    }
}

/// Rows kept in the JSON-lines file before it is rewritten down to the
/// in-memory ring, as a multiple of the capacity.
const COMPACT_FACTOR: usize = 2;

struct Ring {
    records: VecDeque<TradingRecord>,
    /// Rows currently in the backing file, valid or not.
    file_rows: usize,
}

impl Ring {
    fn push(&mut self, record: TradingRecord, capacity: usize) {
        self.records.push_back(record);
        while self.records.len() > capacity {
            self.records.pop_front();
        }
    }
}

pub struct Journal {
    ring: RwLock<Ring>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl Journal {
    /// In-memory journal only.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            ring: RwLock::new(Ring {
                records: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                file_rows: 0,
            }),
            capacity: capacity.max(1),
            path: None,
        }
    }

    /// Journal backed by a JSON-lines file; existing rows are replayed.
    ///
    /// # Edge cases
    /// - A missing file starts an empty journal.
    /// - Lines that fail to parse are skipped with a warning.
    /// - The file is read line by line and rewritten down to the last
    ///   `capacity` records once it holds more than `2 * capacity` rows.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut journal = Self::in_memory(capacity);

        if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("failed to read journal from {}", path.display()))?;
            let mut skipped = 0usize;
            {
                let mut ring = journal.ring.write();
                for line in BufReader::new(file).lines() {
                    let line = line.with_context(|| format!("failed to read journal from {}", path.display()))?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    ring.file_rows += 1;
                    match serde_json::from_str::<TradingRecord>(&line) {
                        Ok(record) => ring.push(record, journal.capacity),
                        Err(_) => skipped += 1,
                    }
                }
            }
            if skipped > 0 {
                warn!(path = %path.display(), skipped, "skipped unreadable journal lines");
            }
            if !journal.is_empty() {
                info!(path = %path.display(), records = journal.len(), "journal loaded");
            }
        }

        journal.path = Some(path);
        {
            let mut ring = journal.ring.write();
            journal.compact_if_needed(&mut ring)?;
        }
        Ok(journal)
    }

    pub fn len(&self) -> usize {
        self.ring.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.read().records.is_empty()
    }

    /// Store `record`, evicting the oldest when full, and append it to the
    /// backing file if there is one.
    ///
    /// The in-memory copy is kept even when the file write fails.
    pub fn append(&self, record: TradingRecord) -> Result<()> {
        let mut ring = self.ring.write();
        let persisted = match &self.path {
            Some(path) => append_line(path, &record).map(|()| ring.file_rows += 1),
            None => Ok(()),
        };
        ring.push(record, self.capacity);

        persisted.and_then(|()| self.compact_if_needed(&mut ring))
    }

    /// Most recent records first, optionally filtered by symbol.
    pub fn recent(&self, symbol: Option<&str>, limit: usize) -> Vec<TradingRecord> {
        self.ring
            .read()
            .records
            .iter()
            .rev()
            .filter(|r| symbol.map_or(true, |s| r.symbol.eq_ignore_ascii_case(s)))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Rewrite the backing file to hold exactly the in-memory records
    /// (tmp file + rename) once it has grown past the compaction limit.
    fn compact_if_needed(&self, ring: &mut Ring) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if ring.file_rows <= self.capacity * COMPACT_FACTOR {
            return Ok(());
        }

        let mut content = String::new();
        for record in &ring.records {
            content.push_str(&serde_json::to_string(record).context("failed to serialise journal record")?);
            content.push('\n');
        }
        let tmp_path = path.with_extension("jsonl.tmp");
        std::fs::write(&tmp_path, content)
            .with_context(|| format!("failed to write tmp journal to {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp journal to {}", path.display()))?;

        debug!(path = %path.display(), dropped = ring.file_rows - ring.records.len(), "journal file compacted");
        ring.file_rows = ring.records.len();
        Ok(())
    }
}

fn append_line(path: &Path, record: &TradingRecord) -> Result<()> {
    let line = serde_json::to_string(record).context("failed to serialise journal record")?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open journal at {}", path.display()))?;
    writeln!(file, "{line}").with_context(|| format!("failed to append to journal at {}", path.display()))?;
    Ok(())
}
