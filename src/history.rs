//! Append-only logs of what the bot has already handled
//!
//! Both files are read in full at startup and appended to one line at a
//! time, so a crash mid-run keeps every decision written before it.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::TonkbotError;
use crate::models::DecisionRecord;
use crate::models::Prediction;
use crate::Result;

/// Replace tabs and line breaks so a value fits in one TSV field
pub fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}

/// What history remembers about one id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub prediction: Prediction,
    pub action: bool,
}

/// Decision records keyed by post (or mention) id
#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
    entries: HashMap<String, HistoryEntry>,
}

impl HistoryLog {
    /// Read every record in `path`
    ///
    /// Lines are `post_id\tprediction\taction\tcommunity\ttitle`. Blank lines
    /// are skipped; an action other than `1` reads as no action.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TonkbotError::MissingFile(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;

        let mut entries = HashMap::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.splitn(5, '\t').collect();
            if fields.len() < 3 {
                return Err(TonkbotError::MalformedHistory {
                    line: index + 1,
                    reason: format!("expected 5 tab-separated fields, found {}", fields.len()),
                });
            }
            let prediction = fields[1]
                .parse::<Prediction>()
                .map_err(|reason| TonkbotError::MalformedHistory {
                    line: index + 1,
                    reason,
                })?;
            entries.insert(
                fields[0].to_string(),
                HistoryEntry {
                    prediction,
                    action: fields[2] == "1",
                },
            );
        }

        debug!("Loaded {} history records from {}", entries.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<HistoryEntry> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist `record` and remember it
    pub fn append(&mut self, record: &DecisionRecord) -> Result<()> {
        let line = format!(
            "{}\t{}\t{}\t{}\t{}",
            single_line(&record.post_id),
            record.prediction,
            u8::from(record.action),
            single_line(&record.community),
            single_line(&record.title)
        );
        append_line(&self.path, &line)?;
        debug!("Saved decision for {} to {}", record.post_id, self.path.display());

        self.entries.insert(
            record.post_id.clone(),
            HistoryEntry {
                prediction: record.prediction,
                action: record.action,
            },
        );
        Ok(())
    }
}

/// Ids of comments already removed or otherwise settled
#[derive(Debug)]
pub struct DeletedLog {
    path: PathBuf,
    ids: HashSet<String>,
}

impl DeletedLog {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TonkbotError::MissingFile(path.to_path_buf()));
        }
        let ids = std::fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            ids,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Record `id`; returns false without writing when it is already known
    pub fn append(&mut self, id: &str) -> Result<bool> {
        if self.ids.contains(id) {
            return Ok(false);
        }
        append_line(&self.path, id)?;
        self.ids.insert(id.to_string());
        Ok(true)
    }
}
