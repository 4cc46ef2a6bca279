use crate::models::Priority;
use chrono::NaiveDate;
use regex::Regex;

#[derive(Debug, PartialEq)]
pub struct ParsedTask {
    pub title: String,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
}

// Quick-add line: "Buy milk !high #Shopping @2024-06-01"
// A token starts the input or follows whitespace, so "alice@example.com" stays intact
pub fn parse_task_input(input: &str) -> ParsedTask {
    let priority_re = Regex::new(r"(?:^|\s)!(\w+)").unwrap();
    let category_re = Regex::new(r"(?:^|\s)#(\S+)").unwrap();
    let due_re = Regex::new(r"(?:^|\s)@(\S+)").unwrap();

    let mut priority = None;
    let mut category = None;
    let mut due_date = None;

    // Priority
    for caps in priority_re.captures_iter(input) {
        if let Some(priority_match) = caps.get(1) {
            if let Ok(p) = priority_match.as_str().parse::<Priority>() {
                if priority.is_none() {
                    priority = Some(p);
                }
            }
        }
    }

    // Category
    if let Some(caps) = category_re.captures(input) {
        category = caps.get(1).map(|m| m.as_str().to_string());
    }

    // Due date
    for caps in due_re.captures_iter(input) {
        if let Some(date_match) = caps.get(1) {
            if let Ok(d) = NaiveDate::parse_from_str(date_match.as_str(), "%Y-%m-%d") {
                if due_date.is_none() {
                    due_date = Some(d);
                }
            }
        }
    }

    let title = priority_re.replace_all(input, " ");
    let title = category_re.replace_all(&title, " ");
    let title = due_re.replace_all(&title, " ").to_string();

    let title = Regex::new(r"\s+")
        .unwrap()
        .replace_all(&title, " ")
        .trim()
        .to_string();

    ParsedTask {
        title,
        priority,
        category,
        due_date,
    }
}
