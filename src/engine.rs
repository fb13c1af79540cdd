use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::discover;
use crate::error::TierfigError;
use crate::expand;
use crate::index::{self, ControlBlock, Index, SourceFile};
use crate::ops::{self, IndexResult};
use crate::overlay::{Overlay, Slot};
use crate::resolve::{self, Location, Query};
use crate::settings::Settings;
use crate::store;
use crate::tree::Node;
use crate::types::{IndexAction, Refresh, RootPath};

/// Default name of the reserved control section.
pub const DEFAULT_CONTROL_KEY: &str = "tierfig";

/// Builder for opening a [`KeyIndex`].
///
/// Anything not set explicitly comes from [`Settings`], which in turn reads
/// `TIERFIG_HOME` and `TIERFIG_INDEX_FILE` from the environment.
#[derive(Debug, Clone)]
pub struct KeyIndexBuilder {
    root: Option<RootPath>,
    index_file: Option<String>,
    settings: Option<Settings>,
    cache: bool,
    refresh: Refresh,
    control_key: String,
    force_rebuild: bool,
}

impl Default for KeyIndexBuilder {
    fn default() -> Self {
        Self {
            root: None,
            index_file: None,
            settings: None,
            cache: true,
            refresh: Refresh::default(),
            control_key: DEFAULT_CONTROL_KEY.to_string(),
            force_rebuild: false,
        }
    }
}

impl KeyIndexBuilder {
    /// Set the configuration root (default: `Settings::home`).
    pub fn root(mut self, root: RootPath) -> Self {
        self.root = Some(root);
        self
    }

    /// Shorthand for `root(RootPath::Path(dir))`.
    pub fn root_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.root(RootPath::Path(dir.into()))
    }

    /// Override the cache artifact's file name (default: `Settings::index_file`).
    pub fn index_file(mut self, name: &str) -> Self {
        self.index_file = Some(name.to_string());
        self
    }

    /// Use these settings instead of reading the environment.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Never read or write the cache artifact.
    pub fn no_cache(mut self) -> Self {
        self.cache = false;
        self
    }

    /// Set the refresh policy (default: [`Refresh::OnAccess`]).
    pub fn refresh(mut self, refresh: Refresh) -> Self {
        self.refresh = refresh;
        self
    }

    /// Rename the reserved control section (default: `tierfig`).
    pub fn control_key(mut self, key: &str) -> Self {
        self.control_key = key.to_string();
        self
    }

    /// Ignore any existing cache on open and build from the documents.
    pub fn force_rebuild(mut self) -> Self {
        self.force_rebuild = true;
        self
    }

    fn effective_settings(&self) -> Result<Settings, TierfigError> {
        match &self.settings {
            Some(s) => Ok(s.clone()),
            None => Settings::from_env(),
        }
    }

    fn effective_root(&self) -> Result<PathBuf, TierfigError> {
        match &self.root {
            Some(root) => root.resolve().ok_or(TierfigError::RootUnresolved),
            None => Ok(self.effective_settings()?.home),
        }
    }

    fn effective_index_file(&self) -> Result<String, TierfigError> {
        match &self.index_file {
            Some(name) => Ok(name.clone()),
            None => Ok(self.effective_settings()?.index_file),
        }
    }

    fn effective_cache_path(&self, root: &Path) -> Result<Option<PathBuf>, TierfigError> {
        if !self.cache {
            return Ok(None);
        }
        Ok(Some(root.join(self.effective_index_file()?)))
    }

    /// Discover documents and load or build the index.
    ///
    /// Fails only if the root cannot be resolved or enumerated. A stale or
    /// broken cache is rebuilt; a cache that cannot be written is logged.
    pub fn open(self) -> Result<KeyIndex, TierfigError> {
        let root = self.effective_root()?;
        let cache_path = self.effective_cache_path(&root)?;
        let files = discover::discover(&root, cache_path.as_deref())?;

        let cached = match &cache_path {
            Some(path) if !self.force_rebuild => store::load(path, &self.control_key),
            _ => None,
        };
        let (index, built) = match cached {
            Some(cached) => match store::staleness(&cached, &files) {
                None => {
                    debug!(root = %root.display(), "index cache is fresh");
                    (cached, false)
                }
                Some(reason) => {
                    let reason = reason.to_string();
                    (build_and_store(files, &self.control_key, cache_path.as_deref(), &reason), true)
                }
            },
            None => {
                let reason = if self.force_rebuild { "forced" } else { "cold start" };
                (build_and_store(files, &self.control_key, cache_path.as_deref(), reason), true)
            }
        };

        Ok(KeyIndex {
            root,
            cache_path,
            control_key: self.control_key,
            refresh: self.refresh,
            current: RwLock::new(Snapshot {
                index: Arc::new(index),
                generation: 0,
            }),
            rebuild_lock: Mutex::new(()),
            overlay: RwLock::new(Overlay::new()),
            rebuilds: AtomicU64::new(u64::from(built)),
        })
    }
}

fn build_and_store(
    files: Vec<SourceFile>,
    control_key: &str,
    cache_path: Option<&Path>,
    reason: &str,
) -> Index {
    let index = index::build(files, control_key);
    info!(
        reason,
        documents = index.files().len(),
        keys = index.key_count(),
        skipped = index.skipped().len(),
        "index built"
    );
    if let Some(path) = cache_path
        && let Err(e) = store::save(&index, path, control_key)
    {
        warn!(error = %e, "could not write index cache");
    }
    index
}

fn overlay_slot(index: &Index, query: &Query) -> Slot {
    match resolve::resolve(index, query) {
        Ok(Some(entry)) => Slot::at(index, entry),
        _ => Slot::of(query),
    }
}

struct Snapshot {
    index: Arc<Index>,
    generation: u64,
}

/// A hierarchical key index over a configuration directory.
///
/// Lookups run concurrently against an immutable snapshot. When documents
/// change, the first caller to notice rebuilds; other callers that noticed
/// the same change wait for that rebuild instead of starting their own.
pub struct KeyIndex {
    root: PathBuf,
    cache_path: Option<PathBuf>,
    control_key: String,
    refresh: Refresh,
    current: RwLock<Snapshot>,
    rebuild_lock: Mutex<()>,
    overlay: RwLock<Overlay>,
    rebuilds: AtomicU64,
}

impl KeyIndex {
    pub fn builder() -> KeyIndexBuilder {
        KeyIndexBuilder::default()
    }

    /// Open with everything taken from the environment.
    pub fn from_env() -> Result<KeyIndex, TierfigError> {
        Self::builder().open()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    pub fn control_key(&self) -> &str {
        &self.control_key
    }

    fn observe(&self) -> (Arc<Index>, u64) {
        let current = self.current.read();
        (Arc::clone(&current.index), current.generation)
    }

    /// Rebuild unless another caller already replaced generation `observed`.
    fn rebuild_from(&self, observed: u64, files: Vec<SourceFile>, reason: &str) -> bool {
        let _guard = self.rebuild_lock.lock();
        if self.current.read().generation != observed {
            debug!("index already rebuilt by another caller");
            return false;
        }
        let index = build_and_store(files, &self.control_key, self.cache_path.as_deref(), reason);
        let mut current = self.current.write();
        current.index = Arc::new(index);
        current.generation += 1;
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Poll the documents and rebuild if any changed. Returns whether this
    /// call performed a rebuild. Discovery failures keep the current index.
    pub fn ensure_fresh(&self) -> bool {
        let (index, generation) = self.observe();
        let files = match discover::discover(&self.root, self.cache_path.as_deref()) {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "keeping current index");
                return false;
            }
        };
        match store::staleness(&index, &files) {
            Some(reason) => self.rebuild_from(generation, files, &reason.to_string()),
            None => false,
        }
    }

    /// Check the documents now, regardless of the refresh policy. With
    /// `force`, rebuild even if nothing changed.
    pub fn reload(&self, force: bool) -> Result<bool, TierfigError> {
        let (index, generation) = self.observe();
        let files = discover::discover(&self.root, self.cache_path.as_deref())?;
        let reason = match store::staleness(&index, &files) {
            Some(reason) => reason.to_string(),
            None if force => "forced".to_string(),
            None => return Ok(false),
        };
        Ok(self.rebuild_from(generation, files, &reason))
    }

    /// The current index, refreshed first under [`Refresh::OnAccess`].
    pub fn snapshot(&self) -> Arc<Index> {
        if self.refresh == Refresh::OnAccess {
            self.ensure_fresh();
        }
        self.observe().0
    }

    /// Incremented each time a rebuild replaces the index.
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Number of index builds so far, including the one at open. Zero if
    /// the index came from the cache and nothing changed since.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    /// Resolve a key to its value with environment references expanded.
    ///
    /// An overlay value set for the resolved entry, or for the exact address
    /// the query names, replaces the document value. `Ok(None)` means the key
    /// is not defined; several equally-ranked definitions are an
    /// [`AmbiguousKey`](TierfigError::AmbiguousKey) error unless the query
    /// allows the first match.
    pub fn lookup(&self, query: impl Into<Query>) -> Result<Option<Node>, TierfigError> {
        let query = query.into();
        let index = self.snapshot();
        let overlay = self.overlay.read();
        if let Some(value) = overlay.get(&Slot::of(&query)) {
            return Ok(Some(expand::expand_node(value.clone())));
        }
        let entry = resolve::resolve(&index, &query)?;
        Ok(entry.map(|e| {
            let value = overlay.get(&Slot::at(&index, e)).unwrap_or(&e.value);
            expand::expand_node(value.clone())
        }))
    }

    /// Resolve and deserialize into `T`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        query: impl Into<Query>,
    ) -> Result<Option<T>, TierfigError> {
        let query = query.into();
        let Some(node) = self.lookup(query.clone())? else {
            return Ok(None);
        };
        node.deserialize_into()
            .map(Some)
            .map_err(|e| TierfigError::InvalidValue {
                key: query.to_string(),
                reason: e.to_string(),
            })
    }

    /// Resolve, falling back to `default` when the key is not defined.
    pub fn get_or(
        &self,
        query: impl Into<Query>,
        default: impl Into<Node>,
    ) -> Result<Node, TierfigError> {
        Ok(self.lookup(query)?.unwrap_or_else(|| default.into()))
    }

    /// Whether the key is set in the overlay or defined in any document
    /// passing the query's filters. Never fails on ambiguity.
    pub fn contains(&self, query: impl Into<Query>) -> bool {
        let query = query.into();
        let index = self.snapshot();
        self.overlay.read().get(&Slot::of(&query)).is_some()
            || !resolve::filter(&index, &query).is_empty()
    }

    /// Where the winning definitions of a key live. Several locations mean
    /// the key is ambiguous; an empty list means it is not defined.
    pub fn whereis(&self, query: impl Into<Query>) -> Vec<Location> {
        resolve::locate(&self.snapshot(), &query.into())
    }

    /// Every definition passing the query's filters, before precedence.
    pub fn occurrences(&self, query: impl Into<Query>) -> Vec<Location> {
        resolve::occurrences(&self.snapshot(), &query.into())
    }

    /// Key names with their occurrence counts, sorted by name.
    pub fn keys(&self) -> Vec<(String, usize)> {
        self.snapshot()
            .key_counts()
            .map(|(k, n)| (k.to_string(), n))
            .collect()
    }

    /// Options merged from the documents' control sections.
    pub fn control(&self) -> ControlBlock {
        self.snapshot().control().clone()
    }

    /// Set an in-memory value that takes precedence over the documents.
    ///
    /// The value replaces the entry the query resolves to right now, so any
    /// other query resolving to that entry sees it as well. A query that
    /// matches nothing or is ambiguous sets the value at its own address.
    /// Returns the overlay value it replaces.
    pub fn set(&self, query: impl Into<Query>, value: impl Into<Node>) -> Option<Node> {
        let query = query.into();
        let slot = overlay_slot(&self.snapshot(), &query);
        self.overlay.write().set(slot, value.into())
    }

    /// Remove an overlay value, returning it if it was set.
    pub fn unset(&self, query: impl Into<Query>) -> Option<Node> {
        let query = query.into();
        let index = self.snapshot();
        let mut overlay = self.overlay.write();
        overlay
            .unset(&Slot::of(&query))
            .or_else(|| overlay.unset(&overlay_slot(&index, &query)))
    }

    pub fn clear_overlay(&self) {
        self.overlay.write().clear();
    }

    /// Overlay entries as `(dotted address, value)`.
    pub fn overlay_entries(&self) -> Vec<(String, Node)> {
        self.overlay
            .read()
            .iter()
            .map(|(address, value)| (address, value.clone()))
            .collect()
    }

    /// Handle an [`IndexAction`] and print the result to stdout.
    pub fn handle_and_print(&self, action: &IndexAction) -> Result<(), TierfigError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle an [`IndexAction`] (keys / get / whereis / rebuild).
    pub fn handle(&self, action: &IndexAction) -> Result<IndexResult, TierfigError> {
        match action {
            IndexAction::Keys => Ok(ops::list_keys(self.keys())),
            IndexAction::Get { query } => {
                let value = self.lookup(query.clone())?;
                Ok(ops::key_value(query, value))
            }
            IndexAction::Whereis { query } => Ok(ops::locations(query, self.whereis(query.clone()))),
            IndexAction::Rebuild { force } => {
                let rebuilt = self.reload(*force)?;
                Ok(ops::rebuild_summary(rebuilt, &self.observe().0))
            }
        }
    }
}
