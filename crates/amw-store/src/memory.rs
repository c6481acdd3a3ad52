//! Process-local repository.

use parking_lot::RwLock;

use crate::{upsert, Keyed, Repository, StoreError};

#[derive(Debug)]
pub struct InMemoryRepository<T> {
    items: RwLock<Vec<T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Repository<T> for InMemoryRepository<T>
where
    T: Keyed + Clone + Send + Sync,
{
    fn save(&self, item: T) -> Result<(), StoreError> {
        upsert(&mut self.items.write(), item);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.items.read().clone())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|item| item.key() != key);
        Ok(items.len() != before)
    }
}
