use anyhow::{Context, Result};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::db::{Database, StorageScope};
use crate::error::BoardError;
use crate::models::{seed_postings, JobId, JobPosting, PostingDraft};

const POSTINGS_KEY: &str = "jobs";
const APPLIED_KEY: &str = "applied";
const SAVED_KEY: &str = "saved";

/// Canonical posting list plus the applied/saved side records.
pub struct JobStore {
    db: Database,
    applied_scope: StorageScope,
    postings: Vec<JobPosting>,
}

impl JobStore {
    pub fn open(db: Database, applied_scope: StorageScope) -> Result<Self> {
        let mut store = Self {
            db,
            applied_scope,
            postings: Vec::new(),
        };
        store.postings = store.load()?;
        Ok(store)
    }

    pub fn postings(&self) -> &[JobPosting] {
        &self.postings
    }

    pub fn find(&self, id: JobId) -> Option<&JobPosting> {
        self.postings.iter().find(|j| j.id == id)
    }

    /// Reads the persisted list, seeding storage when it is absent or unreadable.
    pub fn load(&self) -> Result<Vec<JobPosting>> {
        let Some(raw) = self.db.get_item(StorageScope::Device, POSTINGS_KEY)? else {
            debug!("no stored postings, seeding defaults");
            return self.reseed();
        };
        match serde_json::from_str::<Vec<JobPosting>>(&raw) {
            Ok(postings) => Ok(postings),
            Err(e) => {
                warn!(error = %e, "stored postings are malformed, re-seeding");
                self.reseed()
            }
        }
    }

    fn reseed(&self) -> Result<Vec<JobPosting>> {
        let seeds = seed_postings();
        self.save(&seeds)?;
        Ok(seeds)
    }

    /// Overwrites the whole persisted list.
    pub fn save(&self, postings: &[JobPosting]) -> Result<()> {
        let raw = serde_json::to_string(postings).context("Failed to serialize postings")?;
        self.db.set_item(StorageScope::Device, POSTINGS_KEY, &raw)
    }

    /// Prepends a new posting built from `draft` and persists the list.
    pub fn add_posting(&mut self, draft: PostingDraft, fallback_location: &str) -> Result<JobPosting> {
        let missing = draft.missing_fields();
        let Some(level) = draft.level.filter(|_| missing.is_empty()) else {
            return Err(BoardError::MissingFields(missing).into());
        };

        let location = match draft.location.trim() {
            "" => fallback_location.to_string(),
            loc => loc.to_string(),
        };
        let posting = JobPosting {
            id: self.next_id(),
            title: draft.title.trim().to_string(),
            company: draft.company.trim().to_string(),
            category: draft.category.trim().to_string(),
            location,
            level,
            description: draft.description.trim().to_string(),
            duration: None,
        };

        self.postings.insert(0, posting.clone());
        self.save(&self.postings)?;
        debug!(id = posting.id, title = %posting.title, "posting added");
        Ok(posting)
    }

    fn next_id(&self) -> JobId {
        let stamp = chrono::Utc::now().timestamp_millis();
        let max = self.postings.iter().map(|j| j.id).max().unwrap_or(0);
        if stamp > max { stamp } else { max + 1 }
    }

    /// Re-reads the persisted list into memory.
    pub fn reload(&mut self) -> Result<()> {
        self.postings = self.load()?;
        Ok(())
    }

    /// Drops the stored list and re-seeds.
    pub fn reset(&mut self) -> Result<()> {
        self.db.remove_item(StorageScope::Device, POSTINGS_KEY)?;
        self.reload()
    }

    /// Wipes postings and both side records, then re-seeds.
    pub fn clear_all(&mut self) -> Result<()> {
        self.db.clear(StorageScope::Device)?;
        self.db.clear(StorageScope::Session)?;
        self.reload()
    }

    // --- Side records ---

    pub fn applied_ids(&self) -> Result<Vec<JobId>> {
        self.read_ids(self.applied_scope, APPLIED_KEY)
    }

    pub fn saved_ids(&self) -> Result<Vec<JobId>> {
        self.read_ids(StorageScope::Device, SAVED_KEY)
    }

    pub fn applied_set(&self) -> Result<BTreeSet<JobId>> {
        Ok(self.applied_ids()?.into_iter().collect())
    }

    pub fn saved_set(&self) -> Result<BTreeSet<JobId>> {
        Ok(self.saved_ids()?.into_iter().collect())
    }

    pub fn is_applied(&self, id: JobId) -> Result<bool> {
        Ok(self.applied_ids()?.contains(&id))
    }

    pub fn is_saved(&self, id: JobId) -> Result<bool> {
        Ok(self.saved_ids()?.contains(&id))
    }

    /// Returns true when `id` was not already recorded.
    pub fn record_applied(&self, id: JobId) -> Result<bool> {
        self.insert_id(self.applied_scope, APPLIED_KEY, id)
    }

    pub fn record_saved(&self, id: JobId) -> Result<bool> {
        self.insert_id(StorageScope::Device, SAVED_KEY, id)
    }

    fn read_ids(&self, scope: StorageScope, key: &str) -> Result<Vec<JobId>> {
        let Some(raw) = self.db.get_item(scope, key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(ids) => Ok(ids),
            Err(e) => {
                warn!(key, error = %e, "stored id list is malformed, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn insert_id(&self, scope: StorageScope, key: &str, id: JobId) -> Result<bool> {
        let mut ids = self.read_ids(scope, key)?;
        if ids.contains(&id) {
            return Ok(false);
        }
        ids.push(id);
        let raw = serde_json::to_string(&ids)?;
        self.db.set_item(scope, key, &raw)?;
        Ok(true)
    }
}
