//! Directory-backed table registry.
//!
//! Maps table names to open backends. Opening goes through one mutex so two
//! callers asking for the same name concurrently share a single backend
//! instead of opening the store file twice.

use crate::backend::Backend;
use crate::codec::{Codec, TableCodecs};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::table::Table;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Get-or-create cache of backends for a [`StoreConfig`] directory.
pub struct TableRegistry<B: Backend> {
    config: StoreConfig,
    backends: Mutex<HashMap<String, Arc<B>>>,
}

impl<B: Backend> TableRegistry<B> {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            backends: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens table `name`, reusing the backend if it is already open.
    ///
    /// Every returned handle shares the backend; closing one handle does not
    /// affect the others.
    pub fn open_table<H: Codec, R: Codec, V: Codec>(
        &self,
        name: &str,
        codecs: TableCodecs<H, R, V>,
    ) -> Result<Table<B, H, R, V>> {
        let backend = self.backend(name)?;
        Ok(Table::new(name, backend, codecs))
    }

    /// Returns the backend for `name`, opening it on first use.
    pub fn backend(&self, name: &str) -> Result<Arc<B>> {
        let path = self.config.table_path(name)?;

        let mut backends = self.backends.lock();
        if let Some(backend) = backends.get(name) {
            return Ok(Arc::clone(backend));
        }

        let backend = Arc::new(B::open(&path, &self.config)?);
        backends.insert(name.to_string(), Arc::clone(&backend));
        tracing::debug!(table = name, path = %path.display(), "registered backend");
        Ok(backend)
    }

    /// Evicts `name` from the cache. Returns whether it was cached.
    ///
    /// Fails with [`Error::InUse`] while any table handle still holds the
    /// backend, so a later `open_table` never opens the same store twice.
    pub fn close_table(&self, name: &str) -> Result<bool> {
        let evicted = evict(&mut self.backends.lock(), name)?;
        if evicted {
            tracing::debug!(table = name, "evicted backend");
        }
        Ok(evicted)
    }

    /// Evicts `name` and removes its backing store.
    ///
    /// Fails with [`Error::InUse`] while any table handle still holds the
    /// backend.
    pub fn destroy_table(&self, name: &str) -> Result<()> {
        let path = self.config.table_path(name)?;

        let mut backends = self.backends.lock();
        evict(&mut backends, name)?;
        B::destroy(&path)?;
        tracing::debug!(table = name, path = %path.display(), "destroyed table");
        Ok(())
    }

    /// Names of the currently cached tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Removes `name` unless a handle outside the cache still shares it.
///
/// New references are only handed out under the cache lock, so a count of
/// one cannot grow while the caller holds `backends`.
fn evict<B>(backends: &mut HashMap<String, Arc<B>>, name: &str) -> Result<bool> {
    match backends.get(name) {
        None => Ok(false),
        Some(backend) if Arc::strong_count(backend) > 1 => {
            Err(Error::InUse(format!("table {name}")))
        }
        Some(_) => Ok(backends.remove(name).is_some()),
    }
}

impl<B: Backend> std::fmt::Debug for TableRegistry<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRegistry")
            .field("config", &self.config)
            .field("tables", &self.table_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, RedbBackend};
    use crate::codec::{StringCodec, U64Codec};
    use tempfile::TempDir;

    type Codecs = TableCodecs<StringCodec, U64Codec, StringCodec>;

    #[test]
    fn test_get_or_create_shares_backend() {
        let registry: TableRegistry<MemoryBackend> =
            TableRegistry::new(StoreConfig::new("unused").unwrap());

        let first = registry.open_table("events", Codecs::default()).unwrap();
        let second = registry.open_table("events", Codecs::default()).unwrap();
        let h = "k".to_string();
        first.put(&h, Some(&1), &"a".to_string()).unwrap();

        assert_eq!(second.get(&h, Some(&1)).unwrap().as_deref(), Some("a"));
        assert!(Arc::ptr_eq(
            &registry.backend("events").unwrap(),
            &registry.backend("events").unwrap()
        ));
        assert_eq!(registry.table_names(), vec!["events".to_string()]);

        first.close();
        assert_eq!(second.get(&h, Some(&1)).unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn test_invalid_name() {
        let registry: TableRegistry<MemoryBackend> =
            TableRegistry::new(StoreConfig::new("unused").unwrap());

        assert!(matches!(
            registry.open_table("../escape", Codecs::default()),
            Err(Error::InvalidConfig(_))
        ));
        assert!(registry.table_names().is_empty());
    }

    #[test]
    fn test_close_and_destroy_redb() {
        let dir = TempDir::new().unwrap();
        let registry: TableRegistry<RedbBackend> =
            TableRegistry::new(StoreConfig::new(dir.path()).unwrap());
        let path = registry.config().table_path("events").unwrap();
        let h = "k".to_string();

        let table = registry.open_table("events", Codecs::default()).unwrap();
        table.put(&h, Some(&1), &"a".to_string()).unwrap();
        table.close();
        assert!(path.exists());

        assert!(registry.close_table("events").unwrap());
        assert!(!registry.close_table("events").unwrap());

        // Reopening reads the persisted rows
        let table = registry.open_table("events", Codecs::default()).unwrap();
        assert_eq!(table.get(&h, Some(&1)).unwrap().as_deref(), Some("a"));
        table.close();

        registry.destroy_table("events").unwrap();
        assert!(!path.exists());
        assert!(registry.table_names().is_empty());
    }

    #[test]
    fn test_eviction_refused_while_handle_open() {
        let dir = TempDir::new().unwrap();
        let registry: TableRegistry<RedbBackend> =
            TableRegistry::new(StoreConfig::new(dir.path()).unwrap());
        let h = "k".to_string();

        let table = registry.open_table("events", Codecs::default()).unwrap();
        table.put(&h, Some(&1), &"a".to_string()).unwrap();

        assert!(matches!(registry.close_table("events"), Err(Error::InUse(_))));
        assert!(matches!(registry.destroy_table("events"), Err(Error::InUse(_))));
        assert_eq!(registry.table_names(), vec!["events".to_string()]);

        // Still cached, so a second handle shares the open store
        let second = registry.open_table("events", Codecs::default()).unwrap();
        assert_eq!(second.get(&h, Some(&1)).unwrap().as_deref(), Some("a"));

        second.close();
        table.close();
        assert!(registry.close_table("events").unwrap());

        let reopened = registry.open_table("events", Codecs::default()).unwrap();
        assert_eq!(reopened.get(&h, Some(&1)).unwrap().as_deref(), Some("a"));
    }
}
