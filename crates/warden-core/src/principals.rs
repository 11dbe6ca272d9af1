//! Primary owner + persisted co-owner set.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{domain::PrincipalId, errors::Error, ports::CoOwnerRepository, Result};

/// Ordered, duplicate-free list of co-owners.
///
/// Order has no meaning for authorization; it is kept so the persisted file is
/// deterministic (insertion order).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoOwnerSet {
    ids: Vec<PrincipalId>,
}

impl CoOwnerSet {
    /// Builds a set from persisted ids, keeping the first occurrence of duplicates.
    pub fn from_ids(ids: impl IntoIterator<Item = PrincipalId>) -> Self {
        let mut set = Self::default();
        for id in ids {
            set.add(id);
        }
        set
    }

    pub fn contains(&self, id: PrincipalId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns `false` (and leaves the set alone) if `id` is already present.
    pub fn add(&mut self, id: PrincipalId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Returns `false` (and leaves the set alone) if `id` is absent.
    pub fn remove(&mut self, id: PrincipalId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|x| *x != id);
        self.ids.len() != before
    }

    pub fn as_slice(&self) -> &[PrincipalId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Result of a membership edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edit {
    Applied,
    /// Already in the requested state; nothing was written.
    Unchanged,
}

/// Owns the authorization principals.
///
/// The primary owner is fixed for the process lifetime. Co-owner edits hold the lock
/// across the in-memory change and the `save`, so two concurrent edits are applied
/// one after the other and a failed `save` is rolled back.
pub struct PrincipalStore {
    primary_owner: PrincipalId,
    co_owners: Mutex<CoOwnerSet>,
    repo: Arc<dyn CoOwnerRepository>,
}

impl PrincipalStore {
    pub async fn open(primary_owner: PrincipalId, repo: Arc<dyn CoOwnerRepository>) -> Result<Self> {
        let ids = repo.load().await?;
        Ok(Self {
            primary_owner,
            co_owners: Mutex::new(CoOwnerSet::from_ids(ids)),
            repo,
        })
    }

    pub fn primary_owner(&self) -> PrincipalId {
        self.primary_owner
    }

    pub async fn contains(&self, id: PrincipalId) -> bool {
        self.co_owners.lock().await.contains(id)
    }

    pub async fn co_owners(&self) -> Vec<PrincipalId> {
        self.co_owners.lock().await.as_slice().to_vec()
    }

    /// Primary owner first, then co-owners in insertion order.
    pub async fn supervisors(&self) -> Vec<PrincipalId> {
        let set = self.co_owners.lock().await;
        let mut out = Vec::with_capacity(set.len() + 1);
        out.push(self.primary_owner);
        out.extend(
            set.as_slice()
                .iter()
                .copied()
                .filter(|id| *id != self.primary_owner),
        );
        out
    }

    pub async fn add(&self, id: PrincipalId) -> Result<Edit> {
        let mut set = self.co_owners.lock().await;
        let before = set.clone();
        if !set.add(id) {
            return Ok(Edit::Unchanged);
        }
        if let Err(e) = self.repo.save(set.as_slice()).await {
            *set = before;
            return Err(e);
        }
        Ok(Edit::Applied)
    }

    pub async fn remove(&self, id: PrincipalId) -> Result<Edit> {
        let mut set = self.co_owners.lock().await;
        let before = set.clone();
        if !set.remove(id) {
            return Ok(Edit::Unchanged);
        }
        if let Err(e) = self.repo.save(set.as_slice()).await {
            *set = before;
            return Err(e);
        }
        Ok(Edit::Applied)
    }
}

/// Co-owner list stored as a pretty-printed JSON array of ids.
#[derive(Clone, Debug)]
pub struct JsonCoOwnerFile {
    path: PathBuf,
}

impl JsonCoOwnerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "coowners.json".into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    fn persistence_error(&self, reason: impl std::fmt::Display) -> Error {
        Error::Persistence {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl CoOwnerRepository for JsonCoOwnerFile {
    async fn load(&self) -> Result<Vec<PrincipalId>> {
        let txt = match tokio::fs::read_to_string(&self.path).await {
            Ok(txt) => txt,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.persistence_error(e)),
        };
        if txt.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&txt).map_err(|e| self.persistence_error(e))
    }

    async fn save(&self, ids: &[PrincipalId]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.persistence_error(e))?;
        }

        let txt = serde_json::to_string_pretty(ids)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, txt)
            .await
            .map_err(|e| self.persistence_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.persistence_error(e))?;
        Ok(())
    }
}
