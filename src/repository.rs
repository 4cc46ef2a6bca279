use crate::error::StorageError;
use crate::models::{Task, User, UserWithPassword};
use crate::storage::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const SESSION_KEY: &str = "taskboard_current_user";
pub const USERS_KEY: &str = "taskboard_users";
pub const TASKS_KEY: &str = "taskboard_tasks";
pub const CATEGORIES_KEY: &str = "taskboard_categories";

pub const DEFAULT_CATEGORIES: [&str; 5] = ["Work", "Personal", "Shopping", "Health", "Education"];

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Typed access to the persisted slices. All reads and writes of the
/// key-value store go through here.
pub struct Repository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Repository<S> {
        Repository { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn into_store(self) -> S {
        self.store
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Json {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn load_or<T: DeserializeOwned>(&self, key: &str, default: impl FnOnce() -> T) -> T {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => default(),
            Err(err) => {
                tracing::warn!(%err, key, "falling back to default");
                default()
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &raw)
    }

    pub fn load_session(&self) -> Result<Option<User>, StorageError> {
        self.load(SESSION_KEY)
    }

    pub fn save_session(&mut self, user: &User) -> Result<(), StorageError> {
        self.save(SESSION_KEY, user)
    }

    pub fn clear_session(&mut self) -> Result<(), StorageError> {
        self.store.remove(SESSION_KEY)
    }

    pub fn load_users(&self) -> Vec<UserWithPassword> {
        self.load_or(USERS_KEY, Vec::new)
    }

    pub fn save_users(&mut self, users: &[UserWithPassword]) -> Result<(), StorageError> {
        self.save(USERS_KEY, users)
    }

    pub fn load_tasks(&self) -> Vec<Task> {
        self.load_or(TASKS_KEY, Vec::new)
    }

    pub fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        self.save(TASKS_KEY, tasks)
    }

    pub fn load_categories(&self) -> Vec<String> {
        self.load_or(CATEGORIES_KEY, default_categories)
    }

    pub fn save_categories(&mut self, categories: &[String]) -> Result<(), StorageError> {
        self.save(CATEGORIES_KEY, categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_missing_slices_use_defaults() {
        let repo = Repository::new(MemoryStore::new());
        assert!(repo.load_users().is_empty());
        assert!(repo.load_tasks().is_empty());
        assert_eq!(
            repo.load_categories(),
            vec!["Work", "Personal", "Shopping", "Health", "Education"]
        );
        assert_eq!(repo.load_session().unwrap(), None);
    }

    #[test]
    fn test_corrupt_slice_falls_back() {
        let mut store = MemoryStore::new();
        store.set(TASKS_KEY, "{not json").unwrap();
        store.set(SESSION_KEY, "nope").unwrap();
        let repo = Repository::new(store);
        assert!(repo.load_tasks().is_empty());
        assert!(matches!(
            repo.load_session(),
            Err(StorageError::Json { .. })
        ));
    }

    #[test]
    fn test_session_save_and_clear() {
        let mut repo = Repository::new(MemoryStore::new());
        let user = User {
            id: "1".to_string(),
            username: "ann".to_string(),
            email: "ann@example.com".to_string(),
            profile_image: "img".to_string(),
        };
        repo.save_session(&user).unwrap();
        assert_eq!(repo.load_session().unwrap(), Some(user));
        repo.clear_session().unwrap();
        assert_eq!(repo.load_session().unwrap(), None);
    }
}
