use crate::models::{Filter, SortBy, Task};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// What the board shows: selections applied to a task collection.
#[derive(Debug, Clone, Copy)]
pub struct ViewQuery<'a> {
    pub user_id: &'a str,
    pub filter: Filter,
    pub sort_by: SortBy,
    pub search: &'a str,
    pub now: DateTime<Utc>,
}

fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task.category.to_lowercase().contains(needle)
}

fn matches_filter(task: &Task, filter: Filter, now: DateTime<Utc>) -> bool {
    match filter {
        Filter::All => true,
        Filter::Pending => !task.completed,
        Filter::Completed => task.completed,
        Filter::Overdue => task.is_overdue(now),
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn compare(a: &Task, b: &Task, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::DueDate => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortBy::Priority => b.priority.weight().cmp(&a.priority.weight()),
        SortBy::Title => compare_titles(&a.title, &b.title),
        SortBy::CreatedAt => b.created_at.cmp(&a.created_at),
    }
}

/// Owner, then search, then status filter, then sort.
pub fn visible_tasks<'t>(tasks: &'t [Task], query: &ViewQuery<'_>) -> Vec<&'t Task> {
    let needle = query.search.to_lowercase();
    let mut out: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.user_id == query.user_id)
        .filter(|t| matches_search(t, &needle))
        .filter(|t| matches_filter(t, query.filter, query.now))
        .collect();
    out.sort_by(|a, b| compare(a, b, query.sort_by));
    out
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub due_today: usize,
}

pub fn stats(tasks: &[Task], user_id: &str, now: DateTime<Utc>) -> TaskStats {
    let today = now.date_naive();
    tasks
        .iter()
        .filter(|t| t.user_id == user_id)
        .fold(TaskStats::default(), |mut s, t| {
            s.total += 1;
            if t.completed {
                s.completed += 1;
            } else {
                s.pending += 1;
            }
            if t.is_overdue(now) {
                s.overdue += 1;
            }
            if t.due_date == Some(today) {
                s.due_today += 1;
            }
            s
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, Priority};
    use crate::tasks::TaskState;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()
    }

    fn task(title: &str, priority: Priority, due: Option<(i32, u32, u32)>) -> NewTask {
        NewTask {
            title: title.to_string(),
            user_id: "u1".to_string(),
            priority,
            due_date: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            category: "Work".to_string(),
            ..NewTask::default()
        }
    }

    fn query(filter: Filter, sort_by: SortBy, now: DateTime<Utc>) -> ViewQuery<'static> {
        ViewQuery {
            user_id: "u1",
            filter,
            sort_by,
            search: "",
            now,
        }
    }

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_buy_milk_scenario() {
        let mut s = TaskState::new(vec![], vec![]);
        let id = s.add_task(
            NewTask {
                title: "Buy milk".to_string(),
                user_id: "u1".to_string(),
                priority: Priority::Low,
                category: "Shopping".to_string(),
                ..NewTask::default()
            },
            now(),
        );

        let shown = |s: &TaskState, f| visible_tasks(&s.tasks, &query(f, SortBy::DueDate, now())).len();
        assert_eq!(shown(&s, Filter::All), 1);
        assert_eq!(shown(&s, Filter::Pending), 1);
        assert_eq!(shown(&s, Filter::Completed), 0);
        assert_eq!(shown(&s, Filter::Overdue), 0);

        s.toggle_task(&id).unwrap();
        assert_eq!(shown(&s, Filter::All), 1);
        assert_eq!(shown(&s, Filter::Pending), 0);
        assert_eq!(shown(&s, Filter::Completed), 1);
        assert_eq!(shown(&s, Filter::Overdue), 0);
    }

    #[test]
    fn test_overdue_follows_the_clock() {
        let mut s = TaskState::new(vec![], vec![]);
        s.add_task(task("report", Priority::High, Some((2024, 6, 12))), now());

        let before = visible_tasks(&s.tasks, &query(Filter::Overdue, SortBy::DueDate, now()));
        assert!(before.is_empty());

        let after_due = Utc.with_ymd_and_hms(2024, 6, 12, 0, 0, 1).unwrap();
        let after = visible_tasks(&s.tasks, &query(Filter::Overdue, SortBy::DueDate, after_due));
        assert_eq!(titles(&after), ["report"]);
    }

    #[test]
    fn test_priority_sort_is_high_medium_low() {
        let mut s = TaskState::new(vec![], vec![]);
        s.add_task(task("low", Priority::Low, None), now());
        s.add_task(task("high", Priority::High, None), now());
        s.add_task(task("medium", Priority::Medium, None), now());
        s.add_task(task("high2", Priority::High, None), now());

        let out = visible_tasks(&s.tasks, &query(Filter::All, SortBy::Priority, now()));
        assert_eq!(titles(&out), ["high", "high2", "medium", "low"]);
    }

    #[test]
    fn test_due_date_sort_puts_undated_last() {
        let mut s = TaskState::new(vec![], vec![]);
        s.add_task(task("none-a", Priority::Low, None), now());
        s.add_task(task("late", Priority::Low, Some((2024, 9, 1))), now());
        s.add_task(task("none-b", Priority::Low, None), now());
        s.add_task(task("early", Priority::Low, Some((2024, 7, 1))), now());

        let out = visible_tasks(&s.tasks, &query(Filter::All, SortBy::DueDate, now()));
        assert_eq!(titles(&out), ["early", "late", "none-a", "none-b"]);

        s.tasks.reverse();
        let out = visible_tasks(&s.tasks, &query(Filter::All, SortBy::DueDate, now()));
        assert_eq!(titles(&out)[..2], ["early", "late"]);
    }

    #[test]
    fn test_created_at_sort_is_newest_first() {
        let mut s = TaskState::new(vec![], vec![]);
        s.add_task(task("old", Priority::Low, None), now());
        s.add_task(task("new", Priority::Low, None), now() + chrono::Duration::minutes(5));
        let out = visible_tasks(&s.tasks, &query(Filter::All, SortBy::CreatedAt, now()));
        assert_eq!(titles(&out), ["new", "old"]);
    }

    #[test]
    fn test_title_sort_ignores_case() {
        let mut s = TaskState::new(vec![], vec![]);
        s.add_task(task("banana", Priority::Low, None), now());
        s.add_task(task("Apple", Priority::Low, None), now());
        s.add_task(task("cherry", Priority::Low, None), now());
        let out = visible_tasks(&s.tasks, &query(Filter::All, SortBy::Title, now()));
        assert_eq!(titles(&out), ["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_search_and_owner_filtering() {
        let mut s = TaskState::new(vec![], vec![]);
        let mut mine = task("Quarterly report", Priority::Low, None);
        mine.description = "numbers for Q3".to_string();
        s.add_task(mine, now());
        s.add_task(task("Gym", Priority::Low, None), now());
        let mut theirs = task("Quarterly report", Priority::Low, None);
        theirs.user_id = "u2".to_string();
        s.add_task(theirs, now());

        let mut q = query(Filter::All, SortBy::Title, now());
        q.search = "REPORT";
        assert_eq!(titles(&visible_tasks(&s.tasks, &q)), ["Quarterly report"]);
        q.search = "q3";
        assert_eq!(visible_tasks(&s.tasks, &q).len(), 1);
        q.search = "work";
        assert_eq!(visible_tasks(&s.tasks, &q).len(), 2);
    }

    #[test]
    fn test_stats_counts() {
        let mut s = TaskState::new(vec![], vec![]);
        s.add_task(task("past", Priority::Low, Some((2024, 6, 1))), now());
        s.add_task(task("today", Priority::Low, Some((2024, 6, 10))), now());
        let done = s.add_task(task("done", Priority::Low, None), now());
        s.toggle_task(&done).unwrap();

        let st = stats(&s.tasks, "u1", now());
        assert_eq!(
            st,
            TaskStats {
                total: 3,
                completed: 1,
                pending: 2,
                overdue: 2,
                due_today: 1,
            }
        );
        assert_eq!(stats(&s.tasks, "u2", now()), TaskStats::default());
    }
}
