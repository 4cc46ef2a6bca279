use crate::board::TaskBoard;
use crate::models::{NewTask, Priority, Subtask, Task, TaskUpdate};
use crate::parser::parse_task_input;
use crate::storage::KeyValueStore;
use crate::validate;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Signup,
    Board,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Insert,
    Search,
    Subtask,
}

pub const LOGIN_FIELDS: &[&str] = &["Email", "Password"];
pub const SIGNUP_FIELDS: &[&str] = &["Username", "Email", "Password"];
pub const EDITOR_FIELDS: &[&str] = &[
    "Title",
    "Description",
    "Due date (YYYY-MM-DD)",
    "Category",
    "New subtask",
];

const TITLE: usize = 0;
const DESCRIPTION: usize = 1;
const DUE_DATE: usize = 2;
const CATEGORY: usize = 3;
const NEW_SUBTASK: usize = 4;

/// A set of labelled text inputs with one active field.
#[derive(Debug, Clone)]
pub struct Form {
    pub labels: &'static [&'static str],
    pub values: Vec<String>,
    pub active: usize,
}

impl Form {
    pub fn new(labels: &'static [&'static str]) -> Form {
        Form {
            labels,
            values: vec![String::new(); labels.len()],
            active: 0,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        &self.values[index]
    }

    pub fn active_mut(&mut self) -> &mut String {
        &mut self.values[self.active]
    }

    pub fn next_field(&mut self) {
        self.active = (self.active + 1) % self.values.len();
    }

    pub fn previous_field(&mut self) {
        self.active = (self.active + self.values.len() - 1) % self.values.len();
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(String::clear);
        self.active = 0;
    }
}

pub struct TaskEditor {
    /// Id of the task being edited; `None` while creating.
    pub editing: Option<String>,
    pub form: Form,
    pub priority: Priority,
    pub subtasks: Vec<Subtask>,
}

impl TaskEditor {
    fn blank(default_category: &str) -> TaskEditor {
        let mut form = Form::new(EDITOR_FIELDS);
        form.values[CATEGORY] = default_category.to_string();
        TaskEditor {
            editing: None,
            form,
            priority: Priority::Medium,
            subtasks: Vec::new(),
        }
    }

    fn for_task(task: &Task) -> TaskEditor {
        let mut form = Form::new(EDITOR_FIELDS);
        form.values[TITLE] = task.title.clone();
        form.values[DESCRIPTION] = task.description.clone();
        form.values[DUE_DATE] = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        form.values[CATEGORY] = task.category.clone();
        TaskEditor {
            editing: Some(task.id.clone()),
            form,
            priority: task.priority,
            subtasks: task.subtasks.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub text: String,
    pub is_error: bool,
}

pub struct App<S: KeyValueStore> {
    pub board: TaskBoard<S>,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub state: ListState,
    pub login: Form,
    pub signup: Form,
    pub accept_terms: bool,
    pub editor: TaskEditor,
    pub subtask_input: String,
    pub show_details: bool,
    pub flash: Option<Flash>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(board: TaskBoard<S>) -> App<S> {
        let screen = if board.is_authenticated() {
            Screen::Board
        } else {
            Screen::Login
        };
        let mut app = App {
            board,
            screen,
            input_mode: InputMode::Normal,
            state: ListState::default(),
            login: Form::new(LOGIN_FIELDS),
            signup: Form::new(SIGNUP_FIELDS),
            accept_terms: false,
            editor: TaskEditor::blank("Work"),
            subtask_input: String::new(),
            show_details: false,
            flash: None,
        };
        app.clamp_selection();
        app
    }

    fn info(&mut self, text: impl Into<String>) {
        self.flash = Some(Flash {
            text: text.into(),
            is_error: false,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.flash = Some(Flash {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.board.visible_tasks(Utc::now())
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let index = self.state.selected()?;
        self.visible_tasks().get(index).copied()
    }

    fn selected_task_id(&self) -> Option<String> {
        self.selected_task().map(|t| t.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        let selected = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.state.select(selected);
    }

    pub fn next(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    fn enter_board(&mut self) {
        self.screen = Screen::Board;
        self.input_mode = InputMode::Normal;
        self.state.select(None);
        self.clamp_selection();
    }

    fn submit_login(&mut self) {
        let email = self.login.value(0).trim().to_string();
        let password = self.login.value(1).to_string();
        if let Err(err) = validate::login(&email, &password) {
            self.error(err.to_string());
            return;
        }
        match self.board.login(&email, &password) {
            Ok(_) => {
                self.login.clear();
                self.enter_board();
                self.info("Login successful! Welcome back to TaskBoard.");
            }
            Err(err) => self.error(err.to_string()),
        }
    }

    fn submit_signup(&mut self) {
        let username = self.signup.value(0).trim().to_string();
        let email = self.signup.value(1).trim().to_string();
        let password = self.signup.value(2).to_string();
        if let Err(err) = validate::signup(&username, &email, &password, self.accept_terms) {
            self.error(err.to_string());
            return;
        }
        match self.board.signup(&username, &email, &password) {
            Ok(_) => {
                self.signup.clear();
                self.accept_terms = false;
                self.enter_board();
                self.info("Account created! You're now logged in.");
            }
            Err(err) => self.error(err.to_string()),
        }
    }

    fn open_editor(&mut self, task_id: Option<String>) {
        let task = task_id.as_deref().and_then(|id| self.board.tasks.get(id));
        self.editor = match task {
            Some(task) => TaskEditor::for_task(task),
            None => {
                let category = self
                    .board
                    .tasks
                    .categories
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Work".to_string());
                TaskEditor::blank(&category)
            }
        };
        self.screen = Screen::Editor;
        self.input_mode = InputMode::Insert;
    }

    fn cycle_category(&mut self) {
        let categories = &self.board.tasks.categories;
        if categories.is_empty() {
            return;
        }
        let current = self.editor.form.value(CATEGORY);
        let next = match categories.iter().position(|c| c == current) {
            Some(i) => (i + 1) % categories.len(),
            None => 0,
        };
        self.editor.form.values[CATEGORY] = categories[next].clone();
    }

    fn push_editor_subtask(&mut self) {
        let title = self.editor.form.value(NEW_SUBTASK).trim().to_string();
        if title.is_empty() {
            return;
        }
        self.editor.subtasks.push(Subtask {
            id: Uuid::new_v4().to_string(),
            title,
            completed: false,
        });
        self.editor.form.values[NEW_SUBTASK].clear();
    }

    fn save_editor(&mut self) {
        let Some(user_id) = self.board.current_user().map(|u| u.id.clone()) else {
            self.enter_login();
            return;
        };
        let form = self.editor.form.clone();

        // Quick-add tokens only apply when creating
        let (title, priority, category, mut due_date) = if self.editor.editing.is_none() {
            let parsed = parse_task_input(form.value(TITLE));
            (parsed.title, parsed.priority, parsed.category, parsed.due_date)
        } else {
            (form.value(TITLE).trim().to_string(), None, None, None)
        };
        if let Err(err) = validate::task_title(&title) {
            self.error(err.to_string());
            return;
        }
        match validate::due_date(form.value(DUE_DATE)) {
            Ok(Some(date)) => due_date = Some(date),
            Ok(None) => {}
            Err(err) => {
                self.error(err.to_string());
                return;
            }
        }
        let priority = priority.unwrap_or(self.editor.priority);
        let category = category.unwrap_or_else(|| form.value(CATEGORY).trim().to_string());
        let description = form.value(DESCRIPTION).to_string();
        let subtasks = self.editor.subtasks.clone();

        if !category.is_empty() {
            self.board.add_category(&category);
        }

        match self.editor.editing.clone() {
            Some(id) => {
                let update = TaskUpdate {
                    title: Some(title),
                    description: Some(description),
                    due_date: Some(due_date),
                    priority: Some(priority),
                    category: Some(category),
                    subtasks: Some(subtasks),
                    ..TaskUpdate::default()
                };
                match self.board.update_task(&id, update) {
                    Ok(()) => self.info("Task updated"),
                    Err(err) => self.error(err.to_string()),
                }
            }
            None => {
                self.board.add_task(NewTask {
                    title,
                    description,
                    completed: false,
                    due_date,
                    user_id,
                    priority,
                    category,
                    subtasks: Some(subtasks),
                });
                self.info("Task created");
            }
        }
        self.screen = Screen::Board;
        self.input_mode = InputMode::Normal;
        self.clamp_selection();
    }

    fn enter_login(&mut self) {
        self.screen = Screen::Login;
        self.input_mode = InputMode::Normal;
        self.show_details = false;
        self.state.select(None);
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        match self.board.toggle_task(&id) {
            Ok(true) => self.info("Task completed"),
            Ok(false) => self.info("Task marked as pending"),
            Err(err) => self.error(err.to_string()),
        }
        self.clamp_selection();
    }

    fn toggle_selected_subtask(&mut self, n: usize) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let Some(subtask) = n.checked_sub(1).and_then(|i| task.subtasks.get(i)) else {
            return;
        };
        let (task_id, subtask_id) = (task.id.clone(), subtask.id.clone());
        if let Err(err) = self.board.toggle_subtask(&task_id, &subtask_id) {
            self.error(err.to_string());
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match self.screen {
            Screen::Login | Screen::Signup => self.handle_account_input(key),
            Screen::Board => self.handle_board_input(key),
            Screen::Editor => {
                self.handle_editor_input(key);
                false
            }
        }
    }

    fn handle_account_input(&mut self, key: KeyEvent) -> bool {
        let on_signup = self.screen == Screen::Signup;
        match self.input_mode {
            InputMode::Insert => {
                let form = if on_signup {
                    &mut self.signup
                } else {
                    &mut self.login
                };
                match key.code {
                    KeyCode::Char(c) => form.active_mut().push(c),
                    KeyCode::Backspace => {
                        form.active_mut().pop();
                    }
                    KeyCode::Tab => form.next_field(),
                    KeyCode::BackTab => form.previous_field(),
                    KeyCode::Enter if on_signup => self.submit_signup(),
                    KeyCode::Enter => self.submit_login(),
                    KeyCode::Esc => self.input_mode = InputMode::Normal,
                    _ => {}
                }
            }
            _ => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('i') => self.input_mode = InputMode::Insert,
                KeyCode::Tab | KeyCode::Char('j') => {
                    if on_signup {
                        self.signup.next_field()
                    } else {
                        self.login.next_field()
                    }
                }
                KeyCode::BackTab | KeyCode::Char('k') => {
                    if on_signup {
                        self.signup.previous_field()
                    } else {
                        self.login.previous_field()
                    }
                }
                KeyCode::Char('t') if on_signup => self.accept_terms = !self.accept_terms,
                KeyCode::Char('s') => {
                    self.screen = if on_signup {
                        Screen::Login
                    } else {
                        Screen::Signup
                    };
                    self.flash = None;
                }
                KeyCode::Enter if on_signup => self.submit_signup(),
                KeyCode::Enter => self.submit_login(),
                _ => {}
            },
        }
        false
    }

    fn handle_board_input(&mut self, key: KeyEvent) -> bool {
        match self.input_mode {
            InputMode::Search => {
                let mut query = self.board.tasks.search_query.clone();
                match key.code {
                    KeyCode::Char(c) => query.push(c),
                    KeyCode::Backspace => {
                        query.pop();
                    }
                    KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Normal,
                    _ => {}
                }
                self.board.set_search_query(query);
                self.clamp_selection();
            }
            InputMode::Subtask => match key.code {
                KeyCode::Char(c) => self.subtask_input.push(c),
                KeyCode::Backspace => {
                    self.subtask_input.pop();
                }
                KeyCode::Enter => {
                    let title = self.subtask_input.trim().to_string();
                    if let (Some(id), false) = (self.selected_task_id(), title.is_empty()) {
                        match self.board.add_subtask(&id, &title) {
                            Ok(_) => self.info("Subtask added"),
                            Err(err) => self.error(err.to_string()),
                        }
                    }
                    self.subtask_input.clear();
                    self.input_mode = InputMode::Normal;
                }
                KeyCode::Esc => {
                    self.subtask_input.clear();
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },
            _ => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char(' ') => self.toggle_selected(),
                KeyCode::Char('a') => self.open_editor(None),
                KeyCode::Char('e') => {
                    if let Some(id) = self.selected_task_id() {
                        self.open_editor(Some(id));
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected_task_id() {
                        match self.board.delete_task(&id) {
                            Ok(_) => self.info("Task deleted"),
                            Err(err) => self.error(err.to_string()),
                        }
                        self.clamp_selection();
                    }
                }
                KeyCode::Char('y') => {
                    if let Some(id) = self.selected_task_id() {
                        match self.board.duplicate_task(&id) {
                            Ok(_) => self.info("Task duplicated"),
                            Err(err) => self.error(err.to_string()),
                        }
                    }
                }
                KeyCode::Char('f') => {
                    let next = self.board.tasks.filter.next();
                    self.board.set_filter(next);
                    self.clamp_selection();
                }
                KeyCode::Char('s') => {
                    let next = self.board.tasks.sort_by.next();
                    self.board.set_sort_by(next);
                }
                KeyCode::Char('/') => self.input_mode = InputMode::Search,
                KeyCode::Char('+') => {
                    if self.selected_task().is_some() {
                        self.subtask_input.clear();
                        self.input_mode = InputMode::Subtask;
                    }
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let n = c.to_digit(10).unwrap_or(0) as usize;
                    self.toggle_selected_subtask(n);
                }
                KeyCode::Enter => self.show_details = !self.show_details,
                KeyCode::Char('L') => {
                    self.board.logout();
                    self.enter_login();
                    self.info("Logged out");
                }
                _ => {}
            },
        }
        false
    }

    fn handle_editor_input(&mut self, key: KeyEvent) {
        match self.input_mode {
            InputMode::Insert => match key.code {
                KeyCode::Char(c) => self.editor.form.active_mut().push(c),
                KeyCode::Backspace => {
                    self.editor.form.active_mut().pop();
                }
                KeyCode::Tab => self.editor.form.next_field(),
                KeyCode::BackTab => self.editor.form.previous_field(),
                KeyCode::Enter if self.editor.form.active == NEW_SUBTASK => {
                    self.push_editor_subtask()
                }
                KeyCode::Enter => self.save_editor(),
                KeyCode::Esc => self.input_mode = InputMode::Normal,
                _ => {}
            },
            _ => match key.code {
                KeyCode::Char('i') => self.input_mode = InputMode::Insert,
                KeyCode::Tab | KeyCode::Char('j') => self.editor.form.next_field(),
                KeyCode::BackTab | KeyCode::Char('k') => self.editor.form.previous_field(),
                KeyCode::Char('p') => self.editor.priority = self.editor.priority.next(),
                KeyCode::Char('c') => self.cycle_category(),
                KeyCode::Char('x') => {
                    self.editor.subtasks.pop();
                }
                KeyCode::Enter => self.save_editor(),
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.screen = Screen::Board;
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },
        }
    }
}
