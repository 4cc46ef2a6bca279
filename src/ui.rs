use crate::app::{App, Form, InputMode, Screen};
use crate::models::{Priority, Task};
use crate::storage::KeyValueStore;
use chrono::Utc;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

// Computed in u32; width * percent overflows u16 on wide terminals
fn percent_of(width: u16, percent: u16) -> u16 {
    (u32::from(width) * u32::from(percent) / 100) as u16
}

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn key_hint(keys: &[(&'static str, &'static str)]) -> Text<'static> {
    let spans: Vec<Span<'static>> = keys
        .iter()
        .flat_map(|(key, what)| {
            [
                Span::styled(format!(" {key} "), Style::default().fg(Color::Red)),
                Span::raw(format!(": {what} ")),
            ]
        })
        .collect();
    Text::from(Line::from(spans))
}

fn get_legend(screen: Screen, input_mode: InputMode) -> Text<'static> {
    match (screen, input_mode) {
        (_, InputMode::Search) => key_hint(&[("Enter", "Done"), ("Esc", "Done")]),
        (_, InputMode::Subtask) => key_hint(&[("Enter", "Add Subtask"), ("Esc", "Cancel")]),
        (Screen::Login | Screen::Signup, InputMode::Insert) => key_hint(&[
            ("Tab", "Next Field"),
            ("Enter", "Submit"),
            ("Esc", "Normal Mode"),
        ]),
        (Screen::Login, _) => key_hint(&[
            ("q", "Quit"),
            ("i", "Type"),
            ("Tab", "Next Field"),
            ("Enter", "Log In"),
            ("s", "Sign Up Instead"),
        ]),
        (Screen::Signup, _) => key_hint(&[
            ("q", "Quit"),
            ("i", "Type"),
            ("Tab", "Next Field"),
            ("t", "Accept Terms"),
            ("Enter", "Sign Up"),
            ("s", "Log In Instead"),
        ]),
        (Screen::Editor, InputMode::Insert) => key_hint(&[
            ("Tab", "Next Field"),
            ("Enter", "Save / Add Subtask"),
            ("Esc", "Normal Mode"),
        ]),
        (Screen::Editor, _) => key_hint(&[
            ("i", "Type"),
            ("p", "Priority"),
            ("c", "Category"),
            ("x", "Drop Last Subtask"),
            ("Enter", "Save"),
            ("Esc", "Cancel"),
        ]),
        (Screen::Board, _) => key_hint(&[
            ("q", "Quit"),
            ("j/k", "Move"),
            ("Space", "Toggle"),
            ("a", "Add"),
            ("e", "Edit"),
            ("d", "Delete"),
            ("y", "Duplicate"),
            ("f", "Filter"),
            ("s", "Sort"),
            ("/", "Search"),
            ("+", "Subtask"),
            ("1-9", "Toggle Subtask"),
            ("Enter", "Details"),
            ("L", "Log Out"),
        ]),
    }
}

fn form_lines(form: &Form, masked: &[usize], insert: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, label) in form.labels.iter().enumerate() {
        let active = i == form.active;
        let value = if masked.contains(&i) {
            "*".repeat(form.values[i].chars().count())
        } else {
            form.values[i].clone()
        };
        let label_style = if active {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let cursor = if active && insert { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("{label}: "), label_style),
            Span::raw(format!("{value}{cursor}")),
        ]));
    }
    lines
}

fn draw_account(f: &mut Frame, app: &App<impl KeyValueStore>, area: Rect) {
    let insert = app.input_mode == InputMode::Insert;
    let (title, mut lines) = match app.screen {
        Screen::Signup => {
            let mut lines = form_lines(&app.signup, &[2], insert);
            let mark = if app.accept_terms { "[x]" } else { "[ ]" };
            lines.push(Line::from(format!(
                "{mark} I accept the terms and conditions"
            )));
            ("Sign up", lines)
        }
        _ => ("Log in", form_lines(&app.login, &[1], insert)),
    };
    lines.insert(0, Line::from(""));

    let popup_area = centered_rect_absolute(60, lines.len() as u16 + 2, area);
    let form = Paragraph::new(lines)
        .block(
            Block::default()
                .title(format!("TaskBoard: {title}"))
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        )
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(form, popup_area);
}

fn task_line(task: &Task, overdue: bool) -> Line<'static> {
    let mut spans = Vec::new();
    if task.completed {
        spans.push(Span::styled("DONE ", Style::default().fg(Color::Green)));
    } else if overdue {
        spans.push(Span::styled("LATE ", Style::default().fg(Color::Red)));
    }
    spans.push(Span::styled(
        "● ",
        Style::default().fg(priority_color(task.priority)),
    ));
    spans.push(Span::raw(task.title.clone()));
    let (done, total) = task.subtask_progress();
    if total > 0 {
        spans.push(Span::styled(
            format!("  {done}/{total}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(due) = task.due_date {
        spans.push(Span::styled(
            format!("  {}", due.format("%b %-d, %Y")),
            Style::default().fg(Color::Cyan),
        ));
    }
    Line::from(spans)
}

fn detail_lines(task: &Task, overdue: bool) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(Line::from(Span::styled(task.title.clone(), bold)));

    let due_date = match task.due_date {
        Some(date) if overdue => format!("{} (Overdue)", date.format("%b %-d, %Y")),
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => "No due date".to_string(),
    };
    lines.push(Line::from(vec![
        Span::styled("Due Date: ", bold),
        Span::raw(due_date),
    ]));

    lines.push(Line::from(vec![
        Span::styled("Priority: ", bold),
        Span::styled(
            task.priority.to_string(),
            Style::default().fg(priority_color(task.priority)),
        ),
    ]));

    lines.push(Line::from(vec![
        Span::styled("Category: ", bold),
        Span::styled(
            format!(" {} ", task.category),
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
    ]));

    lines.push(Line::from(vec![
        Span::styled("Created: ", bold),
        Span::raw(task.created_at.format("%b %-d, %Y %H:%M").to_string()),
    ]));

    lines.push(Line::from(Span::styled("Description: ", bold)));
    if task.description.trim().is_empty() {
        lines.push(Line::from("No description"));
    } else {
        lines.extend(task.description.lines().map(|l| Line::from(l.to_string())));
    }

    let (done, total) = task.subtask_progress();
    lines.push(Line::from(Span::styled(
        format!("Subtasks ({done}/{total}):"),
        bold,
    )));
    for (i, subtask) in task.subtasks.iter().enumerate() {
        let mark = if subtask.completed { "[x]" } else { "[ ]" };
        lines.push(Line::from(format!("{} {mark} {}", i + 1, subtask.title)));
    }
    lines
}

fn draw_board(f: &mut Frame, app: &mut App<impl KeyValueStore>, area: Rect) {
    let now = Utc::now();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    // Header: who is logged in, counts, and the active selections
    let stats = app.board.stats(now);
    let who = app
        .board
        .current_user()
        .map(|u| format!("{} <{}>", u.username, u.email))
        .unwrap_or_default();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(who, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "   Total {}  Completed {}  Pending {}  Overdue {}  Today {}",
            stats.total, stats.completed, stats.pending, stats.overdue, stats.due_today
        )),
        Span::styled(
            format!(
                "   Sort: {}  Search: {}",
                app.board.tasks.sort_by.label(),
                app.board.tasks.search_query
            ),
            Style::default().fg(Color::Cyan),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title("TaskBoard Pro"));
    f.render_widget(header, chunks[0]);

    let body = if app.show_details {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
            .split(chunks[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)].as_ref())
            .split(chunks[1])
    };

    let tasks = app.visible_tasks();
    let list_title = format!("{} ({})", app.board.tasks.filter.label(), tasks.len());
    let items: Vec<ListItem<'static>> = if tasks.is_empty() {
        let empty = if app.board.tasks.search_query.is_empty() {
            "No tasks yet. Press a to get started!"
        } else {
            "No tasks match your search"
        };
        vec![ListItem::new(empty)]
    } else {
        tasks
            .iter()
            .map(|task| ListItem::new(task_line(task, task.is_overdue(now))))
            .collect()
    };
    let details = app
        .state
        .selected()
        .and_then(|i| tasks.get(i))
        .map(|task| detail_lines(task, task.is_overdue(now)));

    let tasks_widget = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    f.render_stateful_widget(tasks_widget, body[0], &mut app.state);

    if app.show_details {
        let detail_block = Block::default().borders(Borders::ALL).title("Task Details");
        let paragraph = match details {
            Some(lines) => Paragraph::new(lines),
            None => Paragraph::new("No task selected"),
        };
        f.render_widget(
            paragraph.block(detail_block).wrap(Wrap { trim: true }),
            body[1],
        );
    }

    let prompt = match app.input_mode {
        InputMode::Search => Some(("Search tasks", app.board.tasks.search_query.clone())),
        InputMode::Subtask => Some(("New subtask", app.subtask_input.clone())),
        _ => None,
    };
    if let Some((title, value)) = prompt {
        let popup_area = centered_rect_absolute(percent_of(area.width, 60), 3, area);
        let input = Paragraph::new(format!("{value}_"))
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Green)),
            );
        f.render_widget(Clear, popup_area);
        f.render_widget(input, popup_area);
    }
}

fn draw_editor(f: &mut Frame, app: &App<impl KeyValueStore>, area: Rect) {
    let editor = &app.editor;
    let mut lines = form_lines(&editor.form, &[], app.input_mode == InputMode::Insert);
    lines.push(Line::from(vec![
        Span::styled("Priority: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            editor.priority.to_string(),
            Style::default().fg(priority_color(editor.priority)),
        ),
    ]));
    lines.push(Line::from(Span::styled(
        "Subtasks:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for subtask in &editor.subtasks {
        let mark = if subtask.completed { "[x]" } else { "[ ]" };
        lines.push(Line::from(format!("  {mark} {}", subtask.title)));
    }

    let title = if editor.editing.is_some() {
        "Edit Task"
    } else {
        "Add New Task (!high #Category @YYYY-MM-DD)"
    };
    let popup_width = percent_of(area.width, 70).max(40);
    let popup_height = (lines.len() as u16 + 2).min(area.height);
    let popup_area = centered_rect_absolute(popup_width, popup_height, area);
    let input = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn draw(f: &mut Frame, app: &mut App<impl KeyValueStore>) {
    let size = f.area();

    // Split the main layout into body and footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(size);

    let body_chunk = chunks[0];
    let footer_chunk = chunks[1];

    match app.screen {
        Screen::Login | Screen::Signup => draw_account(f, app, body_chunk),
        Screen::Board => draw_board(f, app, body_chunk),
        Screen::Editor => {
            draw_board(f, app, body_chunk);
            draw_editor(f, app, body_chunk);
        }
    }

    let mut footer = Text::default();
    if let Some(flash) = &app.flash {
        let color = if flash.is_error { Color::Red } else { Color::Green };
        footer.push_line(Line::from(Span::styled(
            flash.text.clone(),
            Style::default().fg(color),
        )));
    }
    footer
        .lines
        .extend(get_legend(app.screen, app.input_mode).lines);

    let legend = Paragraph::new(footer)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(legend, footer_chunk);
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App<impl KeyValueStore>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let should_quit = app.handle_input(key);
                if should_quit {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of_wide_terminal() {
        assert_eq!(percent_of(200, 60), 120);
        assert_eq!(percent_of(u16::MAX, 70), 45874);
        assert_eq!(percent_of(0, 70), 0);
    }

    #[test]
    fn test_centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect_absolute(percent_of(area.width, 60), 3, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 3);
        assert_eq!(popup.x, 20);
    }
}
