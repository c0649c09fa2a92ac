use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::io;

use super::types::SessionSummary;
use crate::utils::ChatboxError;

/// Show a selection UI for choosing a session to switch to.
///
/// Returns the chosen session id, or `None` when cancelled.
pub fn select_session(
    sessions: Vec<SessionSummary>,
    active: &str,
) -> Result<Option<String>, ChatboxError> {
    if sessions.is_empty() {
        println!("No saved sessions.");
        return Ok(None);
    }

    let selected = sessions.iter().position(|s| s.id == active).unwrap_or(0);
    let mut picker = SessionPicker {
        sessions,
        selected,
        active: active.to_string(),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_picker(&mut terminal, &mut picker);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

struct SessionPicker {
    sessions: Vec<SessionSummary>,
    selected: usize,
    active: String,
}

impl SessionPicker {
    fn handle_key(&mut self, code: KeyCode) -> Option<PickerAction> {
        let last = self.sessions.len().saturating_sub(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(PickerAction::Cancel),
            KeyCode::Enter => return Some(PickerAction::Choose(self.selected)),
            KeyCode::Down | KeyCode::Char('j') => self.selected = (self.selected + 1).min(last),
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = last,
            _ => {}
        }
        None
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PickerAction {
    Cancel,
    Choose(usize),
}

fn run_picker(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    picker: &mut SessionPicker,
) -> Result<Option<String>, ChatboxError> {
    loop {
        terminal.draw(|f| render_picker(f, picker))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match picker.handle_key(key.code) {
                Some(PickerAction::Cancel) => return Ok(None),
                Some(PickerAction::Choose(i)) => {
                    return Ok(picker.sessions.get(i).map(|s| s.id.clone()));
                }
                None => {}
            }
        }
    }
}

fn render_picker(f: &mut Frame, picker: &SessionPicker) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    let title = Paragraph::new("Select a session to switch to")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(" Chatbox - Sessions "));
    f.render_widget(title, chunks[0]);

    let items: Vec<ListItem> = picker
        .sessions
        .iter()
        .enumerate()
        .map(|(i, session)| {
            let style = if i == picker.selected {
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker = if session.id == picker.active { "● " } else { "  " };

            ListItem::new(vec![
                Line::from(vec![Span::styled(
                    format!("{}{}", marker, session.label),
                    style,
                )]),
                Line::from(vec![Span::styled(
                    format!("    {} | {} messages", session.id, session.message_count),
                    style.fg(Color::Gray),
                )]),
            ])
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Saved Sessions "),
    );
    f.render_widget(list, chunks[1]);

    let help = vec![Line::from(vec![
        Span::raw("Up/k: Up  Down/j: Down  "),
        Span::styled("Enter", Style::default().fg(Color::Green)),
        Span::raw(": Switch  "),
        Span::styled("q/Esc", Style::default().fg(Color::Red)),
        Span::raw(": Cancel"),
    ])];
    let help_widget = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help_widget, chunks[2]);
}
