//! Work store: pending mutation jobs and their results.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mutants::{WorkItem, WorkResult};

pub trait WorkStore {
    /// Items that have no result yet, in insertion order.
    fn pending_work_items(&self) -> Result<Vec<WorkItem>>;

    /// Records `result` for every job in `job_ids` as one write.
    fn set_multiple_results(&mut self, job_ids: &[String], result: &WorkResult) -> Result<()>;

    fn add_work_items(&mut self, items: Vec<WorkItem>) -> Result<()>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub work_items: Vec<WorkItem>,
    #[serde(default)]
    pub results: BTreeMap<String, WorkResult>,
}

impl Session {
    fn pending(&self) -> Vec<WorkItem> {
        self.work_items
            .iter()
            .filter(|item| !self.results.contains_key(&item.job_id))
            .cloned()
            .collect()
    }

    fn record(&mut self, job_ids: &[String], result: &WorkResult) {
        for job_id in job_ids {
            self.results.insert(job_id.clone(), result.clone());
        }
    }
}

/// Session kept in a JSON file. Every write rewrites the whole file through a
/// temporary sibling and a rename, so readers never see half a session.
#[derive(Debug)]
pub struct JsonWorkStore {
    path: PathBuf,
    session: Session,
}

impl JsonWorkStore {
    pub fn open(path: &Path) -> Result<Self> {
        let session = load_from_path(path)?;
        Ok(JsonWorkStore {
            path: path.to_path_buf(),
            session,
        })
    }

    /// Opens `path`, starting an empty session if the file does not exist.
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::open(path)
        } else {
            Ok(JsonWorkStore {
                path: path.to_path_buf(),
                session: Session::default(),
            })
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn result(&self, job_id: &str) -> Option<&WorkResult> {
        self.session.results.get(job_id)
    }
}

impl WorkStore for JsonWorkStore {
    fn pending_work_items(&self) -> Result<Vec<WorkItem>> {
        Ok(self.session.pending())
    }

    fn set_multiple_results(&mut self, job_ids: &[String], result: &WorkResult) -> Result<()> {
        let mut updated = self.session.clone();
        updated.record(job_ids, result);
        save_to_path(&updated, &self.path)?;
        self.session = updated;
        Ok(())
    }

    fn add_work_items(&mut self, items: Vec<WorkItem>) -> Result<()> {
        let mut updated = self.session.clone();
        updated.work_items.extend(items);
        save_to_path(&updated, &self.path)?;
        self.session = updated;
        Ok(())
    }
}

pub fn load_from_path(path: &Path) -> Result<Session> {
    let data = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_to_path(session: &Session, path: &Path) -> Result<()> {
    let write_err = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_string_pretty(session).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, json).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)
}

/// In-memory store. Counts bulk writes so callers can check how often the
/// store was written.
#[derive(Debug, Default)]
pub struct MemoryWorkStore {
    session: Session,
    bulk_writes: usize,
}

impl MemoryWorkStore {
    pub fn new(items: Vec<WorkItem>) -> Self {
        MemoryWorkStore {
            session: Session {
                work_items: items,
                results: BTreeMap::new(),
            },
            bulk_writes: 0,
        }
    }

    pub fn result(&self, job_id: &str) -> Option<&WorkResult> {
        self.session.results.get(job_id)
    }

    pub fn results(&self) -> &BTreeMap<String, WorkResult> {
        &self.session.results
    }

    pub fn bulk_writes(&self) -> usize {
        self.bulk_writes
    }
}

impl WorkStore for MemoryWorkStore {
    fn pending_work_items(&self) -> Result<Vec<WorkItem>> {
        Ok(self.session.pending())
    }

    fn set_multiple_results(&mut self, job_ids: &[String], result: &WorkResult) -> Result<()> {
        self.session.record(job_ids, result);
        self.bulk_writes += 1;
        Ok(())
    }

    fn add_work_items(&mut self, items: Vec<WorkItem>) -> Result<()> {
        self.session.work_items.extend(items);
        Ok(())
    }
}
