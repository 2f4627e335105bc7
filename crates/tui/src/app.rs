use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use railbook_core::{Booking, BookingService, TicketRenderer};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::form::{parse_booking_id, BookingForm, Field};

const TICK_RATE: Duration = Duration::from_millis(250);

const MENU_ITEMS: [&str; 6] = [
    "List Trains",
    "Book Ticket",
    "View All Bookings",
    "Search Booking by ID",
    "Cancel Booking",
    "Exit",
];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    success: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Trains,
    Book,
    Bookings,
    Lookup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupAction {
    Search,
    Cancel,
}

impl LookupAction {
    fn title(self) -> &'static str {
        match self {
            LookupAction::Search => "Search Booking",
            LookupAction::Cancel => "Cancel Booking",
        }
    }
}

#[derive(Debug, Clone)]
struct LookupPrompt {
    action: LookupAction,
    input: String,
    details: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Info,
    Success,
    Error,
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front end over a [`BookingService`].
pub struct RailbookApp {
    service: BookingService,
    renderer: TicketRenderer,
    screen: Screen,
    menu_cursor: usize,
    form: BookingForm,
    lookup: LookupPrompt,
    bookings_state: ListState,
    status: String,
    tone: Tone,
    theme: Theme,
    should_quit: bool,
}

impl RailbookApp {
    pub fn new(service: BookingService, renderer: TicketRenderer) -> Self {
        Self {
            service,
            renderer,
            screen: Screen::Menu,
            menu_cursor: 0,
            form: BookingForm::default(),
            lookup: LookupPrompt {
                action: LookupAction::Search,
                input: String::new(),
                details: Vec::new(),
            },
            bookings_state: ListState::default(),
            status: "Ready".to_string(),
            tone: Tone::Info,
            theme: Theme::default(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.set_status(
            Tone::Info,
            format!("Loaded {} bookings", self.service.booking_count()),
        );

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let outcome = loop {
            if let Err(err) = terminal.draw(|frame| self.draw(frame)) {
                break Err(err).context("failed to draw frame");
            }
            if self.should_quit {
                break Ok(());
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => self.handle_input(event),
                Some(AppEvent::Tick) => {}
                None => break Ok(()),
            }
        };

        restore_terminal(&mut terminal)?;
        outcome?;

        self.service
            .flush()
            .context("failed to save bookings on exit")?;
        info!(bookings = self.service.booking_count(), "bookings saved on exit");
        Ok(())
    }

    fn set_status(&mut self, tone: Tone, message: impl Into<String>) {
        self.tone = tone;
        self.status = message.into();
    }

    fn go_to(&mut self, screen: Screen) {
        debug!(?screen, "screen change");
        self.screen = screen;
    }

    fn handle_input(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.handle_global_shortcut(&key) {
            return;
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Trains => self.handle_trains_key(key),
            Screen::Book => self.handle_book_key(key),
            Screen::Bookings => self.handle_bookings_key(key),
            Screen::Lookup => self.handle_lookup_key(key),
        }
    }

    fn handle_global_shortcut(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
                info!("quit requested from keyboard");
                self.should_quit = true;
            }
            // Control chords never reach text fields or the menu.
            return true;
        }
        key.modifiers.contains(KeyModifiers::ALT)
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.menu_cursor = (self.menu_cursor + 1) % MENU_ITEMS.len();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.menu_cursor = (self.menu_cursor + MENU_ITEMS.len() - 1) % MENU_ITEMS.len();
            }
            KeyCode::Enter => self.select_menu_item(self.menu_cursor),
            KeyCode::Char(ch) => match ch.to_digit(10) {
                Some(choice @ 1..=6) => {
                    self.menu_cursor = choice as usize - 1;
                    self.select_menu_item(self.menu_cursor);
                }
                _ => self.set_status(Tone::Error, "Invalid choice. Please choose 1-6."),
            },
            _ => {}
        }
    }

    fn select_menu_item(&mut self, index: usize) {
        match index {
            0 => {
                self.go_to(Screen::Trains);
                self.set_status(Tone::Info, "Seats available per train");
            }
            1 => {
                self.go_to(Screen::Book);
                self.set_status(
                    Tone::Info,
                    "Tab/arrows move between fields, Enter on the last field books",
                );
            }
            2 => {
                if self.service.booking_count() == 0 {
                    self.set_status(Tone::Info, "No bookings found.");
                    return;
                }
                self.bookings_state.select(Some(0));
                self.go_to(Screen::Bookings);
                self.set_status(
                    Tone::Info,
                    format!("{} bookings", self.service.booking_count()),
                );
            }
            3 => self.open_lookup(LookupAction::Search),
            4 => self.open_lookup(LookupAction::Cancel),
            5 => self.should_quit = true,
            _ => {}
        }
    }

    fn open_lookup(&mut self, action: LookupAction) {
        self.lookup = LookupPrompt {
            action,
            input: String::new(),
            details: Vec::new(),
        };
        self.go_to(Screen::Lookup);
        self.set_status(Tone::Info, "Enter a booking ID and press Enter");
    }

    fn handle_trains_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')
        ) {
            self.go_to(Screen::Menu);
        }
    }

    fn handle_book_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.form.clear();
                self.go_to(Screen::Menu);
                self.set_status(Tone::Info, "Booking abandoned");
            }
            KeyCode::Tab | KeyCode::Down => self.form.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.form.move_focus(-1),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Enter if !self.form.on_last_field() => self.form.move_focus(1),
            KeyCode::Enter => self.submit_booking(),
            KeyCode::Char(ch) => self.form.insert(ch),
            _ => {}
        }
    }

    fn submit_booking(&mut self) {
        let draft = match self.form.to_draft() {
            Ok(draft) => draft,
            Err(err) => {
                self.set_status(Tone::Error, err.to_string());
                return;
            }
        };

        let booking = match self.service.book(draft) {
            Ok(booking) => booking,
            Err(err) => {
                warn!(%err, "booking rejected");
                self.set_status(Tone::Error, format!("Booking failed: {err}"));
                return;
            }
        };

        let train = self.service.train_for(&booking).cloned();
        let mut message = format!(
            "Booking successful! Booking ID: {} | {} | {} | Class: {}",
            booking.booking_id,
            booking.passenger_name,
            train
                .as_ref()
                .map(|train| train.display_name())
                .unwrap_or_else(|| format!("Train {}", booking.train_id)),
            booking.travel_class
        );
        match self.renderer.render(&booking, train.as_ref()) {
            Ok(artifacts) => {
                message.push_str(&format!(" | Ticket: {}", artifacts.ticket.display()));
            }
            Err(err) => {
                warn!(?err, booking_id = booking.booking_id, "ticket rendering failed");
                message.push_str(&format!(" | Ticket not written: {err:#}"));
            }
        }

        self.form.clear();
        self.go_to(Screen::Menu);
        self.set_status(Tone::Success, message);
    }

    fn handle_bookings_key(&mut self, key: KeyEvent) {
        let total = self.service.booking_count();
        let current = self.bookings_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.go_to(Screen::Menu),
            KeyCode::Char('j') | KeyCode::Down if total > 0 => {
                self.bookings_state.select(Some((current + 1).min(total - 1)));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.bookings_state.select(Some(current.saturating_sub(1)));
            }
            KeyCode::Home => self.bookings_state.select(Some(0)),
            KeyCode::End if total > 0 => self.bookings_state.select(Some(total - 1)),
            _ => {}
        }
    }

    fn handle_lookup_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.go_to(Screen::Menu),
            KeyCode::Backspace => {
                self.lookup.input.pop();
            }
            KeyCode::Enter => self.submit_lookup(),
            KeyCode::Char(ch) if self.lookup.input.len() < 10 => self.lookup.input.push(ch),
            _ => {}
        }
    }

    fn submit_lookup(&mut self) {
        let booking_id = match parse_booking_id(&self.lookup.input) {
            Ok(id) => id,
            Err(err) => {
                self.lookup.input.clear();
                self.set_status(Tone::Error, err.to_string());
                return;
            }
        };
        self.lookup.input.clear();

        match self.lookup.action {
            LookupAction::Search => match self.service.find(booking_id) {
                Ok(booking) => {
                    self.lookup.details = self.describe(booking);
                    self.set_status(Tone::Success, "Booking found");
                }
                Err(err) => {
                    self.lookup.details.clear();
                    self.set_status(Tone::Error, err.to_string());
                }
            },
            LookupAction::Cancel => match self.service.cancel(booking_id) {
                Ok(booking) => {
                    self.lookup.details.clear();
                    self.set_status(
                        Tone::Success,
                        format!(
                            "Booking {} canceled successfully ({})",
                            booking.booking_id, booking.passenger_name
                        ),
                    );
                }
                Err(err) => {
                    warn!(%err, booking_id, "cancellation failed");
                    self.set_status(Tone::Error, format!("Cancellation failed: {err}"));
                }
            },
        }
    }

    fn describe(&self, booking: &Booking) -> Vec<String> {
        let train = self
            .service
            .train_for(booking)
            .map(|train| train.display_name())
            .unwrap_or_else(|| format!("Unknown (train {})", booking.train_id));
        vec![
            format!("Booking ID: {}", booking.booking_id),
            format!("Name: {}", booking.passenger_name),
            format!("Age: {}", booking.age),
            format!("Gender: {}", booking.gender),
            format!("Train: {train}"),
            format!("Class: {}", booking.travel_class),
        ]
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        match self.screen {
            Screen::Menu => self.draw_menu(frame, chunks[1]),
            Screen::Trains => self.draw_trains(frame, chunks[1]),
            Screen::Book => self.draw_book(frame, chunks[1]),
            Screen::Bookings => self.draw_bookings(frame, chunks[1]),
            Screen::Lookup => self.draw_lookup(frame, chunks[1]),
        }
        self.render_status(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(Span::styled(
            "Railway Ticket Booker",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, area);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let menu_height = (MENU_ITEMS.len() as u16 + 2).min(area.height);
        let menu_width = 34.min(area.width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, area);

        let lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {}. {item}", idx + 1),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {}. {item}", idx + 1),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();

        let menu = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Menu"));
        frame.render_widget(menu, menu_area);
    }

    fn draw_trains(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(Span::styled(
                format!(
                    "{:<4} {:<18} {:<10}    {:<10} {:>11}",
                    "ID", "Name", "From", "To", "Seats Avail"
                ),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("-".repeat(59)),
        ];
        for entry in self.service.availability() {
            let style = if entry.available == 0 {
                Style::default().fg(self.theme.danger)
            } else {
                Style::default().fg(self.theme.primary_fg)
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "{:<4} {:<18} {:<10} -> {:<10} {:>11}",
                    entry.train.id,
                    entry.train.name,
                    entry.train.origin,
                    entry.train.destination,
                    entry.available
                ),
                style,
            )));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Available Trains"));
        frame.render_widget(paragraph, area);
    }

    fn draw_book(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let focus = self.form.focus();
        let lines: Vec<Line> = Field::ALL
            .iter()
            .map(|field| {
                let focused = *field == focus;
                let marker = if focused { "▶ " } else { "  " };
                let cursor = if focused { "_" } else { "" };
                let style = if focused {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                Line::from(vec![
                    Span::styled(format!("{marker}{}: ", field.label()), style),
                    Span::raw(format!("{}{cursor}", self.form.value(*field))),
                ])
            })
            .collect();
        let form = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Book Ticket"))
            .wrap(Wrap { trim: false });
        frame.render_widget(form, chunks[0]);

        let trains: Vec<Line> = self
            .service
            .availability()
            .into_iter()
            .map(|entry| {
                Line::from(Span::styled(
                    format!(
                        "{} {}: {} seats",
                        entry.train.id,
                        entry.train.display_name(),
                        entry.available
                    ),
                    Style::default().fg(self.theme.muted),
                ))
            })
            .collect();
        let help = Paragraph::new(trains)
            .block(Block::default().borders(Borders::ALL).title("Trains"))
            .wrap(Wrap { trim: true });
        frame.render_widget(help, chunks[1]);
    }

    fn draw_bookings(&mut self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .service
            .bookings()
            .map(|booking| {
                let train = self
                    .service
                    .train_for(booking)
                    .map(|train| train.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                ListItem::new(format!(
                    "{:<4} {:<28} {:<3}  {:<6}  {:<15} {}",
                    booking.booking_id,
                    booking.passenger_name,
                    booking.age,
                    booking.gender,
                    train,
                    booking.travel_class
                ))
            })
            .collect();

        let title = format!(
            "All Bookings | {:<4} {:<28} {:<3}  {:<6}  {:<15} {}",
            "ID", "Name", "Age", "Gender", "Train", "Class"
        );
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut self.bookings_state);
    }

    fn draw_lookup(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    "Booking ID: ",
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{}_", self.lookup.input)),
            ]),
            Line::from(""),
        ];
        lines.extend(self.lookup.details.iter().cloned().map(Line::from));
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.lookup.action.title()),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let color = match self.tone {
            Tone::Info => self.theme.primary_fg,
            Tone::Success => self.theme.success,
            Tone::Error => self.theme.danger,
        };
        let secondary = format!(
            "Bookings: {}  •  Esc: back  •  q: quit from menu",
            self.service.booking_count()
        );
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(self.status.clone(), Style::default().fg(color))),
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
