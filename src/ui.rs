use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::{io, time::Duration};
use tui_input::{backend::crossterm::EventHandler, Input};

use statusreel::media::{relative_time_label, resolve_media_url, segment_fill};
use statusreel::models::{MediaType, StatusCollection, UserId};
use statusreel::playback::{Direction, PlaybackSnapshot, PlaybackState, TapZone, ViewerRole};

// Export types needed by main module
pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

/// Rows a drag has to travel downwards to count as a swipe-down
const SWIPE_ROWS: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Feed,
    Viewer,
}

/// What the main loop should do after an input event
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Quit,
    Refresh,
    OpenAuthor(UserId),
    Press(TapZone),
    Release,
    SwipeDown,
    Tap(Direction),
    TogglePause,
    OpenReply,
    SendReply(String),
    CancelReply,
    ConfirmDelete,
    Delete,
    CancelDelete,
    Close,
}

struct FeedEntry {
    author_id: UserId,
    label: String,
    unviewed: bool,
    mine: bool,
}

pub struct StatusUI {
    screen: Screen,
    entries: Vec<FeedEntry>,
    selected: usize,
    input: Input,
    reply_open: bool,
    delete_confirm: bool,
    notice: Option<String>,
    media_base_url: String,
    content_area: Rect,
    press_row: Option<u16>,
}

impl StatusUI {
    pub fn new(media_base_url: &str) -> Self {
        StatusUI {
            screen: Screen::Feed,
            entries: Vec::new(),
            selected: 0,
            input: Input::default(),
            reply_open: false,
            delete_confirm: false,
            notice: None,
            media_base_url: media_base_url.to_string(),
            content_area: Rect::default(),
            press_row: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn show_viewer(&mut self) {
        self.screen = Screen::Viewer;
        self.reply_open = false;
        self.delete_confirm = false;
        self.press_row = None;
        self.input.reset();
    }

    pub fn show_feed(&mut self) {
        self.screen = Screen::Feed;
        self.reply_open = false;
        self.delete_confirm = false;
        self.press_row = None;
    }

    pub fn set_reply_open(&mut self, open: bool) {
        self.reply_open = open;
        if !open {
            self.input.reset();
        }
    }

    pub fn set_delete_confirm(&mut self, open: bool) {
        self.delete_confirm = open;
    }

    /// Dismissible error or info line
    pub fn show_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn set_feed(&mut self, mine: Option<&StatusCollection>, others: &[StatusCollection]) {
        let mut entries = Vec::with_capacity(others.len() + 1);
        if let Some(mine) = mine {
            entries.push(FeedEntry {
                author_id: mine.user.id,
                label: format!(
                    "My status ({} update{})",
                    mine.len(),
                    if mine.len() == 1 { "" } else { "s" }
                ),
                unviewed: false,
                mine: true,
            });
        }
        for collection in others {
            let when = collection
                .latest()
                .map(|s| relative_time_label(s.created_at, chrono::Utc::now()))
                .unwrap_or_default();
            entries.push(FeedEntry {
                author_id: collection.user.id,
                label: format!("{}  {}", collection.user.username, when),
                unviewed: collection.has_unviewed(),
                mine: false,
            });
        }
        self.entries = entries;
        self.selected = self.selected.min(self.entries.len().saturating_sub(1));
    }

    pub fn handle_input(&mut self) -> Result<Option<UiAction>> {
        if !event::poll(Duration::from_millis(10))? {
            return Ok(None);
        }
        let event = event::read()?;

        if self.notice.is_some() {
            if let Event::Key(key) = &event {
                if key.kind == KeyEventKind::Press {
                    self.notice = None;
                    return Ok(None);
                }
            }
        }

        match self.screen {
            Screen::Feed => Ok(self.handle_feed_event(&event)),
            Screen::Viewer => Ok(self.handle_viewer_event(&event)),
        }
    }

    fn handle_feed_event(&mut self, event: &Event) -> Option<UiAction> {
        let Event::Key(key) = event else {
            return None;
        };
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(UiAction::Quit),
            KeyCode::Char('R') | KeyCode::F(5) => Some(UiAction::Refresh),
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                if self.selected + 1 < self.entries.len() {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Enter => self.entries.get(self.selected).map(|e| UiAction::OpenAuthor(e.author_id)),
            _ => None,
        }
    }

    fn handle_viewer_event(&mut self, event: &Event) -> Option<UiAction> {
        if self.delete_confirm {
            let Event::Key(key) = event else {
                return None;
            };
            if key.kind != KeyEventKind::Press {
                return None;
            }
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.delete_confirm = false;
                    Some(UiAction::Delete)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.delete_confirm = false;
                    Some(UiAction::CancelDelete)
                }
                _ => None,
            };
        }

        if self.reply_open {
            let Event::Key(key) = event else {
                return None;
            };
            if key.kind != KeyEventKind::Press {
                return None;
            }
            return match key.code {
                KeyCode::Esc => {
                    self.set_reply_open(false);
                    Some(UiAction::CancelReply)
                }
                KeyCode::Enter => {
                    let text = self.input.value().to_string();
                    self.set_reply_open(false);
                    Some(UiAction::SendReply(text))
                }
                _ => {
                    self.input.handle_event(event);
                    None
                }
            };
        }

        match event {
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    if !contains(self.content_area, mouse.column, mouse.row) {
                        return None;
                    }
                    self.press_row = Some(mouse.row);
                    let x = mouse.column.saturating_sub(self.content_area.x) as f32;
                    Some(UiAction::Press(TapZone::from_position(x, self.content_area.width as f32)))
                }
                MouseEventKind::Drag(MouseButton::Left) => match self.press_row {
                    Some(start) if mouse.row >= start + SWIPE_ROWS => {
                        self.press_row = None;
                        Some(UiAction::SwipeDown)
                    }
                    _ => None,
                },
                MouseEventKind::Up(MouseButton::Left) => self.press_row.take().map(|_| UiAction::Release),
                _ => None,
            },
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Left => Some(UiAction::Tap(Direction::Previous)),
                KeyCode::Right => Some(UiAction::Tap(Direction::Next)),
                KeyCode::Char(' ') => Some(UiAction::TogglePause),
                KeyCode::Down => Some(UiAction::SwipeDown),
                KeyCode::Esc | KeyCode::Char('q') => Some(UiAction::Close),
                KeyCode::Char('r') => Some(UiAction::OpenReply),
                KeyCode::Char('d') => Some(UiAction::ConfirmDelete),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn draw<B: Backend>(&mut self, frame: &mut Frame<B>, snapshot: Option<&PlaybackSnapshot>) {
        let size = frame.size();
        match (self.screen, snapshot) {
            (Screen::Viewer, Some(snapshot)) => self.draw_viewer(frame, snapshot, size),
            _ => self.draw_feed(frame, size),
        }

        if let Some(notice) = &self.notice {
            draw_notice(frame, notice, size);
        }
    }

    fn draw_feed<B: Backend>(&self, frame: &mut Frame<B>, size: Rect) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(size);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let ring = if entry.mine {
                    Span::styled("◎ ", Style::default().fg(Color::Rgb(0x12, 0x8C, 0x7E)))
                } else if entry.unviewed {
                    Span::styled("● ", Style::default().fg(Color::Rgb(0x25, 0xD3, 0x66)))
                } else {
                    Span::styled("○ ", Style::default().fg(Color::Gray))
                };
                ListItem::new(Line::from(vec![ring, Span::raw(entry.label.clone())]))
            })
            .collect();

        let title = if self.entries.is_empty() { "Status (nothing to show)" } else { "Status" };
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        if !self.entries.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let help = Paragraph::new("↑/↓ select | Enter view | R refresh | Esc quit")
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(help, chunks[1]);
    }

    fn draw_viewer<B: Backend>(&mut self, frame: &mut Frame<B>, snapshot: &PlaybackSnapshot, size: Rect) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(1), // Progress segments
                Constraint::Length(2), // Header
                Constraint::Min(3),    // Content
                Constraint::Length(3), // Reply box / owner panel
                Constraint::Length(1), // Help line
            ])
            .split(size);

        draw_progress(frame, snapshot, chunks[0]);
        draw_header(frame, snapshot, chunks[1]);

        self.content_area = chunks[2];
        self.draw_content(frame, snapshot, chunks[2]);

        match snapshot.role {
            ViewerRole::Visitor => {
                let title = if self.reply_open { "Reply (Enter send, Esc cancel)" } else { "Reply" };
                let text = if self.reply_open { self.input.value() } else { "press r to reply" };
                let reply = Paragraph::new(text).block(
                    Block::default()
                        .title(title)
                        .borders(Borders::ALL)
                        .border_style(if self.reply_open {
                            Style::default().fg(Color::Yellow)
                        } else {
                            Style::default()
                        }),
                );
                frame.render_widget(reply, chunks[3]);
                if self.reply_open {
                    frame.set_cursor(chunks[3].x + self.input.cursor() as u16 + 1, chunks[3].y + 1);
                }
            }
            ViewerRole::Owner => {
                let views = snapshot.owner_panel.as_ref().map(|p| p.label()).unwrap_or_default();
                let panel = Paragraph::new(Line::from(vec![
                    Span::styled(format!("👁 {}", views), Style::default().fg(Color::White)),
                    Span::styled("   d delete", Style::default().fg(Color::Red)),
                ]))
                .block(Block::default().borders(Borders::ALL));
                frame.render_widget(panel, chunks[3]);
            }
        }

        let help = Paragraph::new("click left/right or ←/→ | hold or Space pause | drag down or ↓ close | Esc close")
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(help, chunks[4]);

        if self.delete_confirm {
            draw_delete_confirm(frame, size);
        }
    }

    fn draw_content<B: Backend>(&self, frame: &mut Frame<B>, snapshot: &PlaybackSnapshot, area: Rect) {
        let Some(status) = &snapshot.status else {
            return;
        };
        let content = status.content.clone().unwrap_or_default();

        match status.media_type {
            MediaType::Text => {
                let background = status
                    .display_background()
                    .and_then(parse_hex_color)
                    .unwrap_or(Color::Green);
                let width = area.width.saturating_sub(4).max(1) as usize;
                let lines: Vec<Line> = textwrap::wrap(&content, width)
                    .into_iter()
                    .map(|l| Line::from(l.into_owned()))
                    .collect();
                let card = Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::White).bg(background).add_modifier(Modifier::BOLD))
                    .block(Block::default().borders(Borders::NONE));
                frame.render_widget(card, area);
            }
            MediaType::Image | MediaType::Video => {
                let kind = if status.media_type == MediaType::Image { "image" } else { "video" };
                let url = status
                    .media()
                    .and_then(|u| resolve_media_url(&self.media_base_url, u))
                    .unwrap_or_else(|| "(no media)".to_string());
                let mut lines = vec![
                    Line::from(Span::styled(format!("[{}]", kind), Style::default().fg(Color::Cyan))),
                    Line::from(url),
                ];
                if !content.is_empty() {
                    lines.push(Line::from(""));
                    lines.push(Line::from(content));
                }
                let media = Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(media, area);
            }
        }
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

/// `#RRGGBB` to a terminal colour
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

fn draw_progress<B: Backend>(frame: &mut Frame<B>, snapshot: &PlaybackSnapshot, area: Rect) {
    let total = snapshot.total.max(1) as u32;
    let constraints: Vec<Constraint> = (0..total).map(|_| Constraint::Ratio(1, total)).collect();
    let segments = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, segment) in segments.iter().enumerate() {
        let fill = segment_fill(i, snapshot.current_index, snapshot.progress);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::White).bg(Color::DarkGray))
            .percent(fill as u16)
            .label("");
        frame.render_widget(gauge, *segment);
    }
}

fn draw_header<B: Backend>(frame: &mut Frame<B>, snapshot: &PlaybackSnapshot, area: Rect) {
    let when = snapshot
        .status
        .as_ref()
        .map(|s| relative_time_label(s.created_at, chrono::Utc::now()))
        .unwrap_or_default();
    let state = match snapshot.state {
        PlaybackState::Playing => "",
        PlaybackState::Paused(_) => "  ⏸",
        PlaybackState::Closed => "  ■",
    };
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(snapshot.author.username.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(state),
        ]),
        Line::from(Span::styled(when, Style::default().fg(Color::Gray))),
    ]);
    frame.render_widget(header, area);
}

fn centered(width: u16, height: u16, size: Rect) -> Rect {
    let width = width.min(size.width);
    let height = height.min(size.height);
    Rect::new(
        size.x + (size.width - width) / 2,
        size.y + (size.height - height) / 2,
        width,
        height,
    )
}

fn draw_delete_confirm<B: Backend>(frame: &mut Frame<B>, size: Rect) {
    let area = centered(44, 5, size);
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(vec![
        Line::from("Are you sure you want to delete this status?"),
        Line::from(""),
        Line::from(Span::styled("y delete | n cancel", Style::default().fg(Color::Yellow))),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().title("Delete Status").borders(Borders::ALL));
    frame.render_widget(popup, area);
}

fn draw_notice<B: Backend>(frame: &mut Frame<B>, notice: &str, size: Rect) {
    let area = centered(50, 5, size);
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(vec![
        Line::from(notice.to_string()),
        Line::from(""),
        Line::from(Span::styled("press any key", Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().title("Error").borders(Borders::ALL).border_style(Style::default().fg(Color::Red)));
    frame.render_widget(popup, area);
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
