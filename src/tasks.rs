use crate::error::TaskError;
use crate::models::{Filter, NewTask, SortBy, Subtask, Task, TaskUpdate};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const COPY_SUFFIX: &str = " (Copy)";

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Task collection, categories, and the session-only view selections.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub tasks: Vec<Task>,
    pub categories: Vec<String>,
    pub filter: Filter,
    pub sort_by: SortBy,
    pub search_query: String,
}

impl TaskState {
    pub fn new(tasks: Vec<Task>, categories: Vec<String>) -> TaskState {
        TaskState {
            tasks,
            categories,
            filter: Filter::All,
            sort_by: SortBy::DueDate,
            search_query: String::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))
    }

    pub fn add_task(&mut self, new: NewTask, now: DateTime<Utc>) -> String {
        let task = Task {
            id: new_id(),
            title: new.title,
            description: new.description,
            completed: new.completed,
            due_date: new.due_date,
            created_at: now,
            user_id: new.user_id,
            priority: new.priority,
            category: new.category,
            subtasks: new.subtasks.unwrap_or_default(),
        };
        let id = task.id.clone();
        tracing::debug!(task_id = %id, "task added");
        self.tasks.push(task);
        id
    }

    /// Returns the new completion state.
    pub fn toggle_task(&mut self, id: &str) -> Result<bool, TaskError> {
        let task = self.get_mut(id)?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> Result<(), TaskError> {
        let task = self.get_mut(id)?;
        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(completed) = update.completed {
            task.completed = completed;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(category) = update.category {
            task.category = category;
        }
        if let Some(subtasks) = update.subtasks {
            task.subtasks = subtasks;
        }
        Ok(())
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, TaskError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))?;
        Ok(self.tasks.remove(index))
    }

    pub fn duplicate_task(&mut self, id: &str, now: DateTime<Utc>) -> Result<String, TaskError> {
        let original = self
            .get(id)
            .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))?;
        let copy = Task {
            id: new_id(),
            title: format!("{}{COPY_SUFFIX}", original.title),
            completed: false,
            created_at: now,
            ..original.clone()
        };
        let copy_id = copy.id.clone();
        self.tasks.push(copy);
        Ok(copy_id)
    }

    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<bool, TaskError> {
        let task = self.get_mut(task_id)?;
        let subtask = task
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| TaskError::SubtaskNotFound {
                task_id: task_id.to_string(),
                subtask_id: subtask_id.to_string(),
            })?;
        subtask.completed = !subtask.completed;
        Ok(subtask.completed)
    }

    pub fn add_subtask(&mut self, task_id: &str, title: &str) -> Result<String, TaskError> {
        let task = self.get_mut(task_id)?;
        let subtask = Subtask {
            id: new_id(),
            title: title.to_string(),
            completed: false,
        };
        let id = subtask.id.clone();
        task.subtasks.push(subtask);
        Ok(id)
    }

    pub fn set_filter(&mut self, filter: Filter) {
        tracing::debug!(filter = filter.as_str(), "filter changed");
        self.filter = filter;
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        tracing::debug!(sort_by = sort_by.as_str(), "sort changed");
        self.sort_by = sort_by;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Returns false when the category already exists.
    pub fn add_category(&mut self, name: &str) -> bool {
        if self.categories.iter().any(|c| c == name) {
            return false;
        }
        self.categories.push(name.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn state() -> TaskState {
        TaskState::new(vec![], vec!["Work".to_string()])
    }

    fn milk() -> NewTask {
        NewTask {
            title: "Buy milk".to_string(),
            user_id: "u1".to_string(),
            priority: Priority::Low,
            category: "Shopping".to_string(),
            ..NewTask::default()
        }
    }

    #[test]
    fn test_add_task_assigns_id_timestamp_and_empty_subtasks() {
        let mut s = state();
        let a = s.add_task(milk(), now());
        let b = s.add_task(milk(), now());
        assert_ne!(a, b);
        let task = s.get(&a).unwrap();
        assert_eq!(task.created_at, now());
        assert!(task.subtasks.is_empty());
        assert!(!task.completed);
    }

    #[test]
    fn test_toggle_twice_restores_completion() {
        let mut s = state();
        let id = s.add_task(milk(), now());
        assert_eq!(s.toggle_task(&id), Ok(true));
        assert_eq!(s.toggle_task(&id), Ok(false));
        assert!(!s.get(&id).unwrap().completed);
    }

    #[test]
    fn test_missing_ids_are_reported() {
        let mut s = state();
        let missing = TaskError::TaskNotFound("nope".to_string());
        assert_eq!(s.toggle_task("nope"), Err(missing.clone()));
        assert_eq!(s.update_task("nope", TaskUpdate::default()), Err(missing.clone()));
        assert_eq!(s.delete_task("nope").unwrap_err(), missing.clone());
        assert_eq!(s.duplicate_task("nope", now()), Err(missing.clone()));
        assert_eq!(s.add_subtask("nope", "x"), Err(missing));

        let id = s.add_task(milk(), now());
        assert!(matches!(
            s.toggle_subtask(&id, "nope"),
            Err(TaskError::SubtaskNotFound { .. })
        ));
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let mut s = state();
        let id = s.add_task(milk(), now());
        s.update_task(
            &id,
            TaskUpdate {
                title: Some("Buy oat milk".to_string()),
                completed: Some(true),
                ..TaskUpdate::default()
            },
        )
        .unwrap();
        let task = s.get(&id).unwrap();
        assert_eq!(task.title, "Buy oat milk");
        assert!(task.completed);
        assert_eq!(task.category, "Shopping");
        assert_eq!(task.created_at, now());
    }

    #[test]
    fn test_update_can_clear_due_date() {
        let mut s = state();
        let mut new = milk();
        new.due_date = chrono::NaiveDate::from_ymd_opt(2024, 7, 1);
        let id = s.add_task(new, now());
        s.update_task(
            &id,
            TaskUpdate {
                due_date: Some(None),
                ..TaskUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(s.get(&id).unwrap().due_date, None);
    }

    #[test]
    fn test_delete_removes_only_that_task() {
        let mut s = state();
        let a = s.add_task(milk(), now());
        let b = s.add_task(milk(), now());
        s.delete_task(&a).unwrap();
        assert!(s.get(&a).is_none());
        assert!(s.get(&b).is_some());
    }

    #[test]
    fn test_duplicate_copies_with_reset_completion() {
        let mut s = state();
        let id = s.add_task(milk(), now());
        let sub = s.add_subtask(&id, "check fridge").unwrap();
        s.toggle_subtask(&id, &sub).unwrap();
        s.toggle_task(&id).unwrap();

        let later = now() + chrono::Duration::hours(1);
        let copy_id = s.duplicate_task(&id, later).unwrap();
        assert_ne!(copy_id, id);

        let original = s.get(&id).unwrap().clone();
        let copy = s.get(&copy_id).unwrap();
        assert_eq!(copy.title, "Buy milk (Copy)");
        assert!(!copy.completed);
        assert_eq!(copy.created_at, later);
        assert_eq!(copy.subtasks, original.subtasks);
        assert!(copy.subtasks[0].completed);

        assert_eq!(original.title, "Buy milk");
        assert!(original.completed);
        assert_eq!(original.created_at, now());
    }

    #[test]
    fn test_subtasks_keep_insertion_order_and_toggle_independently() {
        let mut s = state();
        let id = s.add_task(milk(), now());
        let first = s.add_subtask(&id, "one").unwrap();
        s.add_subtask(&id, "two").unwrap();
        assert_eq!(s.toggle_subtask(&id, &first), Ok(true));

        let task = s.get(&id).unwrap();
        let titles: Vec<_> = task.subtasks.iter().map(|st| st.title.as_str()).collect();
        assert_eq!(titles, ["one", "two"]);
        assert!(!task.completed);
        assert_eq!(task.subtask_progress(), (1, 2));
    }

    #[test]
    fn test_add_category_skips_duplicates() {
        let mut s = state();
        assert!(!s.add_category("Work"));
        assert!(s.add_category("Garden"));
        assert_eq!(s.categories, ["Work", "Garden"]);
    }
}
