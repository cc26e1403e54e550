use crate::core::error::{GenerateError, Result};
use crate::core::params::ParameterSet;
use dashmap::DashMap;
use uuid::Uuid;

/// Keyed storage for saved parameter sets. Contents live only as long as
/// the store; nothing is persisted or evicted.
pub trait ConfigStore: Send + Sync {
    fn put(&self, params: ParameterSet) -> Uuid;
    fn get(&self, id: Uuid) -> Option<ParameterSet>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves an identifier as received from a client. Malformed ids are
    /// reported the same way as unknown ones.
    fn load(&self, id: &str) -> Result<ParameterSet> {
        Uuid::parse_str(id.trim())
            .ok()
            .and_then(|uuid| self.get(uuid))
            .ok_or_else(|| GenerateError::ConfigNotFound(id.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    inner: DashMap<Uuid, ParameterSet>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn put(&self, params: ParameterSet) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.insert(id, params);
        id
    }

    fn get(&self, id: Uuid) -> Option<ParameterSet> {
        self.inner.get(&id).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
