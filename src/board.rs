use crate::auth::AuthState;
use crate::error::{AuthError, StorageError, TaskError};
use crate::models::{Filter, NewTask, SortBy, Task, TaskUpdate, User};
use crate::repository::Repository;
use crate::storage::KeyValueStore;
use crate::tasks::TaskState;
use crate::view::{self, TaskStats, ViewQuery};
use chrono::{DateTime, Utc};

// Storage failures never reach the caller; the in-memory state stays authoritative
fn log_failure(result: Result<(), StorageError>, what: &str) {
    if let Err(err) = result {
        tracing::warn!(%err, "failed to persist {what}");
    }
}

/// The application state container: both slices plus the repository they
/// are mirrored to after every successful mutation.
pub struct TaskBoard<S: KeyValueStore> {
    repo: Repository<S>,
    pub auth: AuthState,
    pub tasks: TaskState,
}

impl<S: KeyValueStore> TaskBoard<S> {
    /// Reads the roster, tasks and categories. The session is restored
    /// separately with [`TaskBoard::load_user`].
    pub fn open(store: S) -> TaskBoard<S> {
        let repo = Repository::new(store);
        let auth = AuthState::new(repo.load_users());
        let tasks = TaskState::new(repo.load_tasks(), repo.load_categories());
        tracing::debug!(
            users = auth.users.len(),
            tasks = tasks.tasks.len(),
            "board opened"
        );
        TaskBoard { repo, auth, tasks }
    }

    #[cfg(test)]
    pub fn repository(&self) -> &Repository<S> {
        &self.repo
    }

    #[cfg(test)]
    pub fn into_store(self) -> S {
        self.repo.into_store()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.auth.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated
    }

    fn save_tasks(&mut self) {
        log_failure(self.repo.save_tasks(&self.tasks.tasks), "tasks");
    }

    // Auth

    pub fn load_user(&mut self) {
        match self.repo.load_session() {
            Ok(session) => self.auth.restore(session),
            Err(err) => {
                tracing::warn!(%err, "could not restore session");
                self.auth.restore(None);
            }
        }
    }

    pub fn signup(&mut self, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.auth.signup(username, email, password)?;
        log_failure(self.repo.save_users(&self.auth.users), "users");
        log_failure(self.repo.save_session(&user), "session");
        Ok(user)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.auth.login(email, password)?;
        log_failure(self.repo.save_session(&user), "session");
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.auth.logout();
        log_failure(self.repo.clear_session(), "session");
    }

    // Tasks

    pub fn add_task(&mut self, new: NewTask) -> String {
        let id = self.tasks.add_task(new, Utc::now());
        self.save_tasks();
        id
    }

    pub fn toggle_task(&mut self, id: &str) -> Result<bool, TaskError> {
        let completed = self.tasks.toggle_task(id)?;
        self.save_tasks();
        Ok(completed)
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> Result<(), TaskError> {
        self.tasks.update_task(id, update)?;
        self.save_tasks();
        Ok(())
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, TaskError> {
        let removed = self.tasks.delete_task(id)?;
        self.save_tasks();
        Ok(removed)
    }

    pub fn duplicate_task(&mut self, id: &str) -> Result<String, TaskError> {
        let copy = self.tasks.duplicate_task(id, Utc::now())?;
        self.save_tasks();
        Ok(copy)
    }

    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<bool, TaskError> {
        let completed = self.tasks.toggle_subtask(task_id, subtask_id)?;
        self.save_tasks();
        Ok(completed)
    }

    pub fn add_subtask(&mut self, task_id: &str, title: &str) -> Result<String, TaskError> {
        let id = self.tasks.add_subtask(task_id, title)?;
        self.save_tasks();
        Ok(id)
    }

    pub fn add_category(&mut self, name: &str) -> bool {
        let added = self.tasks.add_category(name);
        if added {
            log_failure(self.repo.save_categories(&self.tasks.categories), "categories");
        }
        added
    }

    // View-state, never persisted

    pub fn set_filter(&mut self, filter: Filter) {
        self.tasks.set_filter(filter);
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.tasks.set_sort_by(sort_by);
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.tasks.set_search_query(query);
    }

    /// The current user's tasks under the current selections.
    pub fn visible_tasks(&self, now: DateTime<Utc>) -> Vec<&Task> {
        let Some(user) = self.current_user() else {
            return Vec::new();
        };
        let query = ViewQuery {
            user_id: &user.id,
            filter: self.tasks.filter,
            sort_by: self.tasks.sort_by,
            search: &self.tasks.search_query,
            now,
        };
        view::visible_tasks(&self.tasks.tasks, &query)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> TaskStats {
        match self.current_user() {
            Some(user) => view::stats(&self.tasks.tasks, &user.id, now),
            None => TaskStats::default(),
        }
    }
}
