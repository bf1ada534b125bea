//! File-backed session store for one namespace.
//!
//! Layout: `{root}/{namespace}/{key}.json`, one file per session, where `key`
//! is [`resolve_key`] of the session id. There is no index file; the
//! directory listing is the source of truth.
//!
//! Writes go to a hidden temp file in the same directory and are renamed
//! into place, so readers never see a half-written entry. Concurrent writers
//! to the same session id are last-writer-wins.

use std::fmt;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::config::NamespaceConfig;
use crate::error::{Error, Result};
use crate::eviction::{EvictionCandidate, EvictionPolicy};
use crate::key::resolve_key;
use crate::record::{CacheEntry, SessionRecord};
use crate::ttl::{ExpiryPolicy, STALE_TEMP_AGE, SweepReport};

/// Persistent, bounded, self-cleaning store of [`SessionRecord`]s.
///
/// The store never keeps records in memory between calls, so several short
/// lived processes can use the same namespace directory one after another.
///
/// - expired and corrupt entries are removed when a load runs into them
/// - a save into a namespace at 80% capacity sweeps expired entries first
/// - a save that leaves more than `max_entries` entries evicts by policy
pub struct NamespaceStore<T> {
    config: NamespaceConfig,
    expiry: ExpiryPolicy,
    dir: PathBuf,
    ready: Arc<OnceCell<()>>,
    clock: Arc<dyn Clock>,
    _payload: PhantomData<fn() -> T>,
}

/// A physical entry found in the namespace directory.
struct StoredFile {
    key: String,
    path: PathBuf,
}

impl<T> NamespaceStore<T> {
    /// Create a store rooted at `root`. Nothing is touched on disk until the
    /// first save.
    pub fn new(root: impl AsRef<Path>, config: NamespaceConfig) -> Self {
        Self::with_clock(root, config, Arc::new(SystemClock))
    }

    /// Create a store that reads time from `clock`.
    pub fn with_clock(root: impl AsRef<Path>, config: NamespaceConfig, clock: Arc<dyn Clock>) -> Self {
        let dir = root.as_ref().join(resolve_key(&config.namespace));
        Self {
            expiry: ExpiryPolicy::new(config.ttl),
            config,
            dir,
            ready: Arc::new(OnceCell::new()),
            clock,
            _payload: PhantomData,
        }
    }

    pub fn config(&self) -> &NamespaceConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Directory holding this namespace's entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Physical location of the entry for `session_id`.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.entry_path(&resolve_key(session_id))
    }

    /// Remove the entry for `session_id`. Returns whether anything was removed.
    pub async fn delete(&self, session_id: &str) -> Result<bool> {
        let path = self.path_for(session_id);
        let removed = self.remove(&path).await?;
        if removed {
            debug!(namespace = %self.config.namespace, session_id = %session_id, "Session deleted");
        }
        Ok(removed)
    }

    /// Remove every expired or undecodable entry in the namespace, along
    /// with abandoned write temp files.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let (report, _) = self.sweep_collect().await?;
        if report.removed() > 0 || report.failed > 0 {
            debug!(
                namespace = %self.config.namespace,
                scanned = report.scanned,
                expired = report.expired,
                corrupt = report.corrupt,
                stale_temp = report.stale_temp,
                failed = report.failed,
                "Swept namespace"
            );
        }
        Ok(report)
    }

    /// Read-only snapshot of the namespace.
    pub async fn stats(&self) -> Result<StoreStats> {
        let now = self.clock.now_millis();
        let files = self.scan().await?;
        let mut live_count = 0;

        for file in &files {
            if let Ok(Some(bytes)) = self.read_bytes(&file.path).await
                && let Ok(meta) = codec::decode::<IgnoredAny>(&bytes)
                && !ExpiryPolicy::is_expired(meta.expires_at, now)
            {
                live_count += 1;
            }
        }

        Ok(StoreStats {
            namespace: self.config.namespace.clone(),
            live_count,
            total_entries: files.len(),
            ttl: self.config.ttl,
            max_entries: self.config.max_entries,
            eviction_policy: self.config.eviction_policy,
            storage_location: self.dir.clone(),
        })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, codec::EXTENSION))
    }

    /// Create the namespace directory once; concurrent callers share the
    /// same in-flight creation.
    async fn ensure_dir(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                fs::create_dir_all(&self.dir)
                    .await
                    .map_err(|e| Error::persistence("create directory", &self.dir, e))?;
                debug!(
                    namespace = %self.config.namespace,
                    path = %self.dir.display(),
                    "Namespace directory ready"
                );
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    /// List physical entries, sorted by key. A missing directory is empty.
    async fn scan(&self) -> Result<Vec<StoredFile>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::persistence("read directory", &self.dir, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| Error::persistence("read directory", &self.dir, e))?
        {
            let path = entry.path();
            let Some(key) = entry_key(&path) else {
                continue;
            };
            if !entry.file_type().await.is_ok_and(|t| t.is_file()) {
                continue;
            }
            files.push(StoredFile { key, path });
        }

        files.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(files)
    }

    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::persistence("read", path, e)),
        }
    }

    async fn remove(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::persistence("delete", path, e)),
        }
    }

    /// Remove an entry found to be expired or corrupt. Failures are logged.
    async fn discard(&self, path: &Path, reason: &str) -> bool {
        match self.remove(path).await {
            Ok(_) => {
                debug!(
                    namespace = %self.config.namespace,
                    path = %path.display(),
                    reason,
                    "Discarded entry"
                );
                true
            }
            Err(err) => {
                warn!(
                    namespace = %self.config.namespace,
                    path = %path.display(),
                    reason,
                    error = %err,
                    "Failed to discard entry"
                );
                false
            }
        }
    }

    /// Sweep, returning the surviving live entries as eviction candidates.
    async fn sweep_collect(&self) -> Result<(SweepReport, Vec<EvictionCandidate>)> {
        let now = self.clock.now_millis();
        let mut report = SweepReport::default();
        let mut live = Vec::new();

        for file in self.scan().await? {
            report.scanned += 1;

            let bytes = match self.read_bytes(&file.path).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(err) => {
                    warn!(namespace = %self.config.namespace, error = %err, "Skipping unreadable entry");
                    continue;
                }
            };

            match codec::decode::<IgnoredAny>(&bytes) {
                Ok(meta) if ExpiryPolicy::is_expired(meta.expires_at, now) => {
                    if self.discard(&file.path, "expired").await {
                        report.expired += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                Ok(meta) => live.push(EvictionCandidate {
                    key: file.key,
                    path: file.path,
                    created_at: meta.data.created_at,
                    last_accessed_at: meta.data.last_accessed_at,
                }),
                Err(err) => {
                    warn!(
                        namespace = %self.config.namespace,
                        path = %file.path.display(),
                        error = %err,
                        "Corrupt entry found during sweep"
                    );
                    if self.discard(&file.path, "corrupt").await {
                        report.corrupt += 1;
                    } else {
                        report.failed += 1;
                    }
                }
            }
        }

        self.remove_stale_temps(&mut report).await;
        Ok((report, live))
    }

    /// Delete write temp files left behind by a writer that died before its
    /// rename. Age comes from the file's mtime, not the store clock.
    async fn remove_stale_temps(&self, report: &mut SweepReport) {
        let Ok(mut dir) = fs::read_dir(&self.dir).await else {
            return;
        };
        let now = SystemTime::now();

        while let Ok(Some(entry)) = dir.next_entry().await {
            let path = entry.path();
            if !is_temp_file(&path) {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            let stale = meta.is_file()
                && meta
                    .modified()
                    .ok()
                    .and_then(|mtime| now.duration_since(mtime).ok())
                    .is_some_and(|age| age >= STALE_TEMP_AGE);
            if !stale {
                continue;
            }

            if self.discard(&path, "stale temp file").await {
                report.stale_temp += 1;
            } else {
                report.failed += 1;
            }
        }
    }

    /// Sweep, then evict live entries until at most `max_entries` remain.
    ///
    /// The entry under `keep` was just written and is never a victim; it
    /// takes one slot and the rest are ordered by policy.
    async fn enforce_capacity(&self, keep: &str) -> Result<usize> {
        let (_, mut live) = self.sweep_collect().await?;
        let before = live.len();
        live.retain(|c| c.key != keep);
        let slots = if live.len() < before {
            self.config.max_entries.saturating_sub(1)
        } else {
            self.config.max_entries
        };

        let victims = self.config.eviction_policy.select_victims(live, slots);
        Ok(self.evict(victims).await)
    }

    /// Remove `victims`. A failed removal is logged and skipped.
    async fn evict(&self, victims: Vec<EvictionCandidate>) -> usize {
        let mut evicted = 0;
        for victim in victims {
            match self.remove(&victim.path).await {
                Ok(_) => {
                    evicted += 1;
                    debug!(
                        namespace = %self.config.namespace,
                        key = %victim.key,
                        policy = %self.config.eviction_policy,
                        "Evicted entry over capacity"
                    );
                }
                Err(err) => {
                    warn!(
                        namespace = %self.config.namespace,
                        key = %victim.key,
                        error = %err,
                        "Failed to evict entry"
                    );
                }
            }
        }
        evicted
    }
}

impl<T: Serialize + DeserializeOwned> NamespaceStore<T> {
    /// Save `payload` under `session_id`, replacing any previous entry.
    ///
    /// `created_at` carries over from a live previous entry. Returns the
    /// record as stored.
    pub async fn save(&self, session_id: &str, payload: T) -> Result<SessionRecord<T>> {
        self.ensure_dir().await?;
        let key = resolve_key(session_id);

        let occupancy = self.scan().await?.len();
        if ExpiryPolicy::should_sweep(occupancy, self.config.max_entries)
            && let Err(err) = self.sweep().await
        {
            warn!(namespace = %self.config.namespace, error = %err, "Pre-save sweep failed");
        }

        let now = self.clock.now_millis();
        let path = self.entry_path(&key);
        let created_at = match self.read_bytes(&path).await? {
            Some(bytes) => codec::decode::<IgnoredAny>(&bytes)
                .ok()
                .filter(|prior| !ExpiryPolicy::is_expired(prior.expires_at, now))
                .map(|prior| prior.data.created_at),
            None => None,
        }
        .unwrap_or(now);

        let entry = CacheEntry {
            data: SessionRecord {
                session_id: session_id.to_string(),
                created_at,
                last_accessed_at: now.max(created_at),
                payload,
            },
            saved_at: now,
            expires_at: self.expiry.expires_at(now),
        };
        self.write_entry(&key, &entry).await?;

        trace!(
            namespace = %self.config.namespace,
            session_id = %session_id,
            key = %key,
            "Session saved"
        );

        match self.scan().await {
            Ok(files) if files.len() >= self.config.max_entries => {
                match self.enforce_capacity(&key).await {
                    Ok(0) => {}
                    Ok(evicted) => {
                        debug!(namespace = %self.config.namespace, evicted, "Namespace trimmed to capacity")
                    }
                    Err(err) => {
                        warn!(namespace = %self.config.namespace, error = %err, "Eviction failed")
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(namespace = %self.config.namespace, error = %err, "Post-save scan failed")
            }
        }

        Ok(entry.data)
    }

    /// Load the record for `session_id`.
    ///
    /// Missing, expired and corrupt entries all come back as `None`; the
    /// latter two are deleted on the way. An expired hit also sweeps the
    /// namespace. In LRU namespaces a hit bumps `last_accessed_at` (expiry
    /// is left alone).
    pub async fn load(&self, session_id: &str) -> Result<Option<SessionRecord<T>>> {
        let key = resolve_key(session_id);
        let path = self.entry_path(&key);

        let Some(bytes) = self.read_bytes(&path).await? else {
            trace!(namespace = %self.config.namespace, session_id = %session_id, "Session not found");
            return Ok(None);
        };

        let mut entry = match codec::decode::<T>(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(
                    namespace = %self.config.namespace,
                    session_id = %session_id,
                    error = %err,
                    "Corrupt session entry, removing"
                );
                self.discard(&path, "corrupt").await;
                return Ok(None);
            }
        };

        let now = self.clock.now_millis();
        if ExpiryPolicy::is_expired(entry.expires_at, now) {
            debug!(namespace = %self.config.namespace, session_id = %session_id, "Session expired");
            self.discard(&path, "expired").await;
            if let Err(err) = self.sweep().await {
                warn!(namespace = %self.config.namespace, error = %err, "Sweep after expiry failed");
            }
            return Ok(None);
        }

        if self.config.eviction_policy.refreshes_on_load() {
            entry.data.last_accessed_at = now.max(entry.data.created_at);
            if let Err(err) = self.write_entry(&key, &entry).await {
                warn!(
                    namespace = %self.config.namespace,
                    session_id = %session_id,
                    error = %err,
                    "Failed to refresh access time"
                );
            }
        }

        Ok(Some(entry.data))
    }

    /// All live records, oldest first. Does not touch access times; corrupt
    /// entries are logged and skipped.
    pub async fn list(&self) -> Result<Vec<SessionRecord<T>>> {
        let now = self.clock.now_millis();
        let mut records = Vec::new();

        for file in self.scan().await? {
            let bytes = match self.read_bytes(&file.path).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(err) => {
                    warn!(namespace = %self.config.namespace, error = %err, "Skipping unreadable entry");
                    continue;
                }
            };

            match codec::decode::<T>(&bytes) {
                Ok(entry) if ExpiryPolicy::is_expired(entry.expires_at, now) => {
                    trace!(namespace = %self.config.namespace, key = %file.key, "Skipping expired entry");
                }
                Ok(entry) => records.push(entry.data),
                Err(err) => {
                    warn!(
                        namespace = %self.config.namespace,
                        key = %file.key,
                        error = %err,
                        "Skipping corrupt entry"
                    );
                }
            }
        }

        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(records)
    }

    async fn write_entry(&self, key: &str, entry: &CacheEntry<T>) -> Result<()> {
        self.ensure_dir().await?;
        let bytes = codec::encode(entry)?;
        let path = self.entry_path(key);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));

        let mut written = fs::write(&tmp, &bytes).await;
        if let Err(e) = &written
            && e.kind() == ErrorKind::NotFound
        {
            // Directory removed since it was first created
            debug!(namespace = %self.config.namespace, path = %self.dir.display(), "Recreating namespace directory");
            fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| Error::persistence("create directory", &self.dir, e))?;
            written = fs::write(&tmp, &bytes).await;
        }
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(Error::persistence("write", &tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(Error::persistence("write", &path, e));
        }
        Ok(())
    }
}

impl<T> Clone for NamespaceStore<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            expiry: self.expiry,
            dir: self.dir.clone(),
            ready: Arc::clone(&self.ready),
            clock: Arc::clone(&self.clock),
            _payload: PhantomData,
        }
    }
}

impl<T> fmt::Debug for NamespaceStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceStore")
            .field("config", &self.config)
            .field("dir", &self.dir)
            .finish()
    }
}

/// Whether `path` names one of our `.{key}.{uuid}.tmp` write files.
fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n.ends_with(".tmp"))
}

/// Storage key of an entry file, or `None` for anything that is not one
/// (temp files, foreign files).
fn entry_key(path: &Path) -> Option<String> {
    if path.extension()? != codec::EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(stem.to_string())
}

/// Namespace statistics.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub namespace: String,

    /// Entries that decode and have not expired.
    pub live_count: usize,

    /// Physical entries, including expired and corrupt ones not yet swept.
    pub total_entries: usize,

    pub ttl: Duration,
    pub max_entries: usize,
    pub eviction_policy: EvictionPolicy,
    pub storage_location: PathBuf,
}
