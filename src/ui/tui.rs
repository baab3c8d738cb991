mod filter;

use crate::core::error::{Error, Result};
use crate::env::{Prompt, SelectItem, SelectList, SelectRequest};
use async_trait::async_trait;
use filter::filter_items;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::cursor;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Lines of context shown above and below the previewed line
const PREVIEW_CONTEXT: usize = 8;
/// Rows moved by PageUp / PageDown
const PAGE_SIZE: usize = 10;

/// Full-screen result list drawn with ratatui
#[derive(Debug, Clone, Copy, Default)]
pub struct TuiSelectList;

impl TuiSelectList {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SelectList for TuiSelectList {
    async fn select(&self, request: SelectRequest) -> Result<Prompt<SelectItem>> {
        tokio::task::spawn_blocking(move || ResultList::new(request).run())
            .await
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?
    }
}

/// State of one open list
struct ResultList {
    request: SelectRequest,
    filter: String,
    visible: Vec<usize>,
    selected: usize,
    sources: HashMap<PathBuf, Vec<String>>,
}

enum Action {
    Continue,
    Confirm,
    Cancel,
}

impl ResultList {
    fn new(request: SelectRequest) -> Self {
        let visible = (0..request.items.len()).collect();
        Self {
            request,
            filter: String::new(),
            visible,
            selected: 0,
            sources: HashMap::new(),
        }
    }

    fn run(mut self) -> Result<Prompt<SelectItem>> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        // Always restore terminal, even if we early-return with an error.
        struct TerminalRestore;
        impl Drop for TerminalRestore {
            fn drop(&mut self) {
                let _ = disable_raw_mode();
                let mut stdout = io::stdout();
                let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
            }
        }
        let _restore = TerminalRestore;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;

        loop {
            self.load_preview_source();
            terminal.draw(|f| self.render(f))?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let action = match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Action::Cancel
                    }
                    KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.set_filter(String::new());
                        Action::Continue
                    }
                    KeyCode::Esc => Action::Cancel,
                    KeyCode::Enter => Action::Confirm,
                    KeyCode::Up => self.move_by(-1),
                    KeyCode::Down => self.move_by(1),
                    KeyCode::PageUp => self.move_by(-(PAGE_SIZE as isize)),
                    KeyCode::PageDown => self.move_by(PAGE_SIZE as isize),
                    KeyCode::Home => self.move_by(isize::MIN / 2),
                    KeyCode::End => self.move_by(isize::MAX / 2),
                    KeyCode::Backspace => {
                        let mut filter = self.filter.clone();
                        filter.pop();
                        self.set_filter(filter);
                        Action::Continue
                    }
                    KeyCode::Char(c) => {
                        let mut filter = self.filter.clone();
                        filter.push(c);
                        self.set_filter(filter);
                        Action::Continue
                    }
                    _ => Action::Continue,
                };

                match action {
                    Action::Continue => {}
                    Action::Cancel => return Ok(Prompt::Cancelled),
                    Action::Confirm => {
                        if let Some(item) = self.highlighted() {
                            return Ok(Prompt::Value(item.clone()));
                        }
                    }
                }
            }
        }
    }

    fn set_filter(&mut self, filter: String) {
        self.visible = filter_items(&self.request.items, &filter);
        self.filter = filter;
        self.selected = 0;
    }

    fn move_by(&mut self, delta: isize) -> Action {
        if self.visible.is_empty() {
            return Action::Continue;
        }
        let last = self.visible.len() - 1;
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, last as isize) as usize;
        Action::Continue
    }

    fn highlighted(&self) -> Option<&SelectItem> {
        self.visible
            .get(self.selected)
            .and_then(|index| self.request.items.get(*index))
    }

    /// Read the highlighted file once so the preview can be drawn
    fn load_preview_source(&mut self) {
        if !self.request.preview {
            return;
        }
        let Some(path) = self
            .highlighted()
            .map(|item| item.position(&self.request.cwd).file)
        else {
            return;
        };
        if self.sources.contains_key(&path) {
            return;
        }
        let lines = match std::fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_string)
                .collect(),
            Err(e) => vec![format!("<cannot read {}: {}>", path.display(), e)],
        };
        self.sources.insert(path, lines);
    }

    fn render(&self, f: &mut Frame) {
        let size = f.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(3), // Filter
                Constraint::Min(0),    // Results (+ preview)
                Constraint::Length(2), // Footer
            ])
            .split(size);

        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                "cscope-nav",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  {}  ({}/{})",
                self.request.word,
                self.visible.len(),
                self.request.items.len()
            )),
        ]))
        .alignment(Alignment::Left);
        f.render_widget(title, chunks[0]);

        let filter_text = if self.filter.is_empty() {
            Span::styled("Type to filter...", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(self.filter.as_str(), Style::default().fg(Color::White))
        };
        let filter = Paragraph::new(Line::from(vec![filter_text])).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title("Filter"),
        );
        f.render_widget(filter, chunks[1]);

        if self.request.preview {
            let body = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[2]);
            self.render_list(f, body[0]);
            self.render_preview(f, body[1]);
        } else {
            self.render_list(f, chunks[2]);
        }

        let footer = Paragraph::new(Line::from(vec![
            Span::styled("↑↓", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(": Navigate | "),
            Span::styled("Enter", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(": Jump | "),
            Span::styled("Esc", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(": Cancel"),
        ]))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(footer, chunks[3]);
    }

    fn render_list(&self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .visible
            .iter()
            .filter_map(|index| self.request.items.get(*index))
            .map(|item| {
                let code = Line::from(vec![
                    Span::styled(
                        format!("{} ", item.label),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(item.detail.clone(), Style::default().fg(Color::White)),
                ]);
                let location = Line::from(vec![Span::styled(
                    format!("  {} ({}:{})", item.file, item.line + 1, item.column + 1),
                    Style::default().fg(Color::DarkGray),
                )]);
                ListItem::new(Text::from(vec![code, location]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Results"))
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );

        let mut list_state = ListState::default();
        if !self.visible.is_empty() {
            list_state.select(Some(self.selected));
        }
        f.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_preview(&self, f: &mut Frame, area: Rect) {
        let source = self.highlighted().and_then(|item| {
            let path = item.position(&self.request.cwd).file;
            self.sources.get(&path).map(|source| (item, source))
        });
        let Some((item, source)) = source else {
            let block = Block::default().borders(Borders::ALL).title("Preview");
            f.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let first = item.line.saturating_sub(PREVIEW_CONTEXT);
        let lines: Vec<Line> = source
            .iter()
            .enumerate()
            .skip(first)
            .take(PREVIEW_CONTEXT * 2 + 1)
            .map(|(number, text)| {
                let style = if number == item.line {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{:>5} ", number + 1), Style::default().fg(Color::DarkGray)),
                    Span::styled(text.clone(), style),
                ])
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Preview: {}", item.file));
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}
