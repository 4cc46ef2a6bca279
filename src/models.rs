use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Public identity, also the persisted session record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile_image: String,
}

// Roster entry; `password` holds the encoded credential, never the session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithPassword {
    #[serde(flatten)]
    pub user: User,
    pub password: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn weight(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn next(self) -> Priority {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "1" => Ok(Priority::Low),
            "medium" | "2" => Ok(Priority::Medium),
            "high" | "3" => Ok(Priority::High),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// The moment a task becomes due: midnight UTC of its due date.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_at().is_some_and(|due| due < now)
    }

    /// (completed, total) subtask counts.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        (done, self.subtasks.len())
    }
}

// Everything a caller supplies when creating a task
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub user_id: String,
    pub priority: Priority,
    pub category: String,
    pub subtasks: Option<Vec<Subtask>>,
}

/// Partial update merged field-by-field into an existing task.
///
/// `due_date: Some(None)` clears the due date.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub subtasks: Option<Vec<Subtask>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Pending,
    Completed,
    Overdue,
}

impl Filter {
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Pending => "pending",
            Filter::Completed => "completed",
            Filter::Overdue => "overdue",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All Tasks",
            Filter::Pending => "Pending Tasks",
            Filter::Completed => "Completed Tasks",
            Filter::Overdue => "Overdue Tasks",
        }
    }

    pub fn next(self) -> Filter {
        match self {
            Filter::All => Filter::Pending,
            Filter::Pending => Filter::Completed,
            Filter::Completed => Filter::Overdue,
            Filter::Overdue => Filter::All,
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Filter::All),
            "pending" => Ok(Filter::Pending),
            "completed" => Ok(Filter::Completed),
            "overdue" => Ok(Filter::Overdue),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    DueDate,
    Priority,
    CreatedAt,
    Title,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::DueDate => "dueDate",
            SortBy::Priority => "priority",
            SortBy::CreatedAt => "createdAt",
            SortBy::Title => "title",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortBy::DueDate => "Due Date",
            SortBy::Priority => "Priority",
            SortBy::CreatedAt => "Created",
            SortBy::Title => "Title",
        }
    }

    pub fn next(self) -> SortBy {
        match self {
            SortBy::DueDate => SortBy::Priority,
            SortBy::Priority => SortBy::CreatedAt,
            SortBy::CreatedAt => SortBy::Title,
            SortBy::Title => SortBy::DueDate,
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dueDate" => Ok(SortBy::DueDate),
            "priority" => Ok(SortBy::Priority),
            "createdAt" => Ok(SortBy::CreatedAt),
            "title" => Ok(SortBy::Title),
            other => Err(other.to_string()),
        }
    }
}
