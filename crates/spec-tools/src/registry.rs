//! Name-keyed store of loaded documents.

use crate::document::Document;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory registry of loaded API descriptions.
///
/// Registering under an existing name silently replaces the previous document
/// (last-write-wins). Documents are handed out as `Arc` snapshots, so a reader
/// holding a resolved document is unaffected by a concurrent overwrite and
/// never observes one mid-replacement.
#[derive(Debug, Default)]
pub struct SpecRegistry {
    docs: RwLock<HashMap<String, Arc<Document>>>,
}

impl SpecRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under `name`, replacing any previous entry.
    pub fn register(&self, name: impl Into<String>, doc: Document) {
        let name = name.into();
        let replaced = self.docs.write().insert(name.clone(), Arc::new(doc));
        if replaced.is_some() {
            tracing::info!(spec = %name, "replaced previously registered spec");
        } else {
            tracing::info!(spec = %name, "registered spec");
        }
    }

    /// Look up a document by name. Pure read; never fails.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<Document>> {
        self.docs.read().get(name).cloned()
    }

    /// Names of all registered documents, sorted for stable output.
    /// Ordering is a convenience, not a contract.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.docs.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}
