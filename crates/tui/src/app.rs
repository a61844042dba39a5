use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fruit_dealer_core::{
    command::{self, format_money, Outcome, COMMAND_HELP},
    setup, AppConfig, GameEngine, GameState, SaveEntry, SaveManager,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_NAME_LEN: usize = 20;
const MAX_INPUT_LEN: usize = 64;
const MESSAGE_HISTORY: usize = 50;
const MENU_ITEMS: [&str; 3] = ["New Game", "Continue", "Quit"];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Magenta,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Continue,
    Play,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
struct Message {
    kind: MessageKind,
    text: String,
    hint: Option<String>,
}

/// Single-line text field with a cursor, used for the name prompt and the
/// command line.
#[derive(Debug, Clone, Default)]
struct TextInput {
    value: String,
    cursor: usize,
    limit: usize,
}

impl TextInput {
    fn new(limit: usize) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            limit,
        }
    }

    fn insert(&mut self, ch: char) {
        if self.value.chars().count() >= self.limit {
            return;
        }
        let idx = self.byte_index();
        self.value.insert(idx, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let idx = self.byte_index();
        self.value.remove(idx);
    }

    fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let idx = self.byte_index();
            self.value.remove(idx);
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.value.chars().count() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }

    /// Returns `true` when the key was consumed as an edit.
    fn handle_edit_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert(ch);
                true
            }
            KeyCode::Backspace => {
                self.backspace();
                true
            }
            KeyCode::Delete => {
                self.delete();
                true
            }
            KeyCode::Left => {
                self.move_cursor(-1);
                true
            }
            KeyCode::Right => {
                self.move_cursor(1);
                true
            }
            KeyCode::Home => {
                self.move_home();
                true
            }
            KeyCode::End => {
                self.move_end();
                true
            }
            _ => false,
        }
    }
}

struct PlayState {
    engine: GameEngine,
    save: Option<SaveEntry>,
    input: TextInput,
    messages: Vec<Message>,
    show_help: bool,
}

impl PlayState {
    fn new(engine: GameEngine, save: Option<SaveEntry>) -> Self {
        Self {
            engine,
            save,
            input: TextInput::new(MAX_INPUT_LEN),
            messages: Vec::new(),
            show_help: false,
        }
    }

    fn push_message(&mut self, kind: MessageKind, text: impl Into<String>, hint: Option<String>) {
        self.messages.push(Message {
            kind,
            text: text.into(),
            hint,
        });
        if self.messages.len() > MESSAGE_HISTORY {
            let excess = self.messages.len() - MESSAGE_HISTORY;
            self.messages.drain(..excess);
        }
    }
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    continue_cursor: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            continue_cursor: 0,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_menu_cursor(&mut self, delta: isize) {
        let len = MENU_ITEMS.len() as isize;
        self.menu_cursor = (self.menu_cursor as isize + delta).rem_euclid(len) as usize;
    }

    fn move_continue_cursor(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.continue_cursor = 0;
            return;
        }
        self.continue_cursor =
            (self.continue_cursor as isize + delta).clamp(0, total as isize - 1) as usize;
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// High-level application state for the terminal frontend.
pub struct FruitDealerApp {
    config: AppConfig,
    save_manager: SaveManager,
    saves: Vec<SaveEntry>,
    screen: Screen,
    state: UiState,
    name_prompt: Option<TextInput>,
    play_state: Option<PlayState>,
    theme: Theme,
}

impl FruitDealerApp {
    pub fn new(config: AppConfig) -> Self {
        let save_manager = SaveManager::new(config.save_dir.clone());
        Self {
            config,
            save_manager,
            saves: Vec::new(),
            screen: Screen::Menu,
            state: UiState::default(),
            name_prompt: None,
            play_state: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        match self.refresh_saves() {
            Ok(()) if !self.saves.is_empty() => {
                self.state
                    .set_status(format!("{} saved games found", self.saves.len()));
            }
            Ok(()) => {}
            Err(err) => {
                self.state
                    .set_status(format!("Failed to load saves: {err}"));
            }
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let result = loop {
            if let Err(err) = terminal.draw(|frame| self.draw(frame)) {
                break Err(err.into());
            }
            if self.state.should_quit {
                break Ok(());
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => {
                    if let Err(err) = self.handle_input(event) {
                        error!(?err, "Input handling failed");
                        self.state.set_status(format!("Error: {err}"));
                    }
                }
                Some(AppEvent::Tick) => {}
                None => break Ok(()),
            }
        };

        restore_terminal(&mut terminal)?;
        info!("Exiting");
        result
    }

    fn refresh_saves(&mut self) -> Result<()> {
        self.saves = self.save_manager.entries()?;
        Ok(())
    }

    fn make_rng(&self) -> StdRng {
        match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn start_new_game(&mut self, raw_name: &str) -> Result<()> {
        let world = setup::new_world(raw_name, &self.config)?;
        let engine =
            GameEngine::new(world, self.make_rng()).with_travel_cost(self.config.travel_cost);
        let name = engine.player().name.clone();
        info!(player = %name, "New game started");

        let save = match self
            .save_manager
            .create_save(None, GameState::capture(engine.world()))
        {
            Ok(entry) => Some(entry),
            Err(err) => {
                error!(?err, "Failed to create save for new game");
                None
            }
        };

        let mut play = PlayState::new(engine, save);
        play.push_message(
            MessageKind::Success,
            format!("New game started for {name}!"),
            Some("Type 'help' to see available commands.".to_string()),
        );
        if play.save.is_none() {
            play.push_message(
                MessageKind::Error,
                "Could not create a save file",
                Some(format!("Check {}", self.save_manager.root().display())),
            );
        }
        self.play_state = Some(play);
        self.screen = Screen::Play;
        self.state.set_status(format!("Playing as {name}"));
        Ok(())
    }

    fn load_save_entry(&mut self, entry: SaveEntry) -> Result<()> {
        let world = self.save_manager.load_world(&entry)?;
        let engine =
            GameEngine::restore(world, self.make_rng()).with_travel_cost(self.config.travel_cost);
        info!(save = %entry.name, day = entry.day, "Save loaded");

        let mut play = PlayState::new(engine, Some(entry));
        play.push_message(MessageKind::Success, "Game loaded successfully!", None);
        self.play_state = Some(play);
        self.screen = Screen::Play;
        self.state.set_status("Game loaded".to_string());
        Ok(())
    }

    fn persist(&mut self, play: &mut PlayState) -> Result<()> {
        let state = GameState::capture(play.engine.world());
        let entry = match &play.save {
            Some(entry) => self.save_manager.update_save(entry, state)?,
            None => self.save_manager.create_save(None, state)?,
        };
        debug!(path = %entry.path.display(), day = entry.day, "Game saved");
        play.save = Some(entry);
        Ok(())
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.quit_app();
            return Ok(());
        }
        if self.name_prompt.is_some() {
            return self.handle_name_prompt_key(key);
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Continue => self.handle_continue_key(key),
            Screen::Play => self.handle_play_key(key),
        }
    }

    fn quit_app(&mut self) {
        if let Some(mut play) = self.play_state.take() {
            if let Err(err) = self.persist(&mut play) {
                error!(?err, "Final save failed");
            }
        }
        self.state.should_quit = true;
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.move_menu_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_menu_cursor(-1),
            KeyCode::Enter => match self.state.menu_cursor {
                0 => {
                    self.name_prompt = Some(TextInput::new(MAX_NAME_LEN));
                    self.state.set_status("Enter your player name".to_string());
                }
                1 => match self.refresh_saves() {
                    Ok(()) => {
                        self.screen = Screen::Continue;
                        self.state.move_continue_cursor(0, self.saves.len());
                        if self.saves.is_empty() {
                            self.state.set_status("No save file found".to_string());
                        } else {
                            self.state
                                .set_status("Select a save to continue".to_string());
                        }
                    }
                    Err(err) => {
                        self.state
                            .set_status(format!("Failed to load saves: {err}"));
                    }
                },
                _ => self.state.should_quit = true,
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_name_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(prompt) = self.name_prompt.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.name_prompt = None;
                self.state.set_status("New game cancelled".to_string());
            }
            KeyCode::Enter => {
                let raw = prompt.value.clone();
                match self.start_new_game(&raw) {
                    Ok(()) => self.name_prompt = None,
                    Err(err) => {
                        warn!(name = %raw, "Rejected player name");
                        self.state.set_status(err.to_string());
                    }
                }
            }
            _ => {
                prompt.handle_edit_key(&key);
            }
        }
        Ok(())
    }

    fn handle_continue_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.screen = Screen::Menu;
                self.state.set_status("Ready".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.move_continue_cursor(1, self.saves.len());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.move_continue_cursor(-1, self.saves.len());
            }
            KeyCode::Enter => {
                let Some(entry) = self.saves.get(self.state.continue_cursor).cloned() else {
                    return Ok(());
                };
                if let Err(err) = self.load_save_entry(entry) {
                    error!(?err, "Failed to load save");
                    self.state
                        .set_status(format!("Save file is incompatible: {err:#}"));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_play_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(mut play) = self.play_state.take() else {
            self.screen = Screen::Menu;
            return Ok(());
        };
        let keep_playing = self.handle_play_key_with(&mut play, key);
        if keep_playing {
            self.play_state = Some(play);
        } else {
            if let Err(err) = self.persist(&mut play) {
                error!(?err, "Save on exit failed");
            }
            self.screen = Screen::Menu;
            if let Err(err) = self.refresh_saves() {
                warn!(?err, "Could not refresh saves");
            }
            self.state.set_status("Back at the main menu".to_string());
        }
        Ok(())
    }

    /// Returns `false` when the player leaves the game.
    fn handle_play_key_with(&mut self, play: &mut PlayState, key: KeyEvent) -> bool {
        if play.show_help
            && play.input.is_empty()
            && matches!(key.code, KeyCode::Esc | KeyCode::Enter)
        {
            play.show_help = false;
            return true;
        }
        match key.code {
            KeyCode::Esc => {
                if play.input.is_empty() {
                    return false;
                }
                play.input.take();
                true
            }
            KeyCode::Enter => {
                let line = play.input.take();
                self.run_command(play, &line)
            }
            _ => {
                play.input.handle_edit_key(&key);
                true
            }
        }
    }

    fn run_command(&mut self, play: &mut PlayState, line: &str) -> bool {
        let command = match command::parse_command(line) {
            Ok(command) => command,
            Err(err) => {
                play.push_message(MessageKind::Error, err.to_string(), Some(err.hint()));
                return true;
            }
        };
        debug!(%command, "Executing command");

        match command::execute(&mut play.engine, command) {
            Ok(Outcome::Done(message)) => {
                play.push_message(MessageKind::Success, message, None);
                if let Err(err) = self.persist(play) {
                    error!(?err, "Auto-save failed");
                    play.push_message(MessageKind::Error, format!("Auto-save failed: {err}"), None);
                }
                true
            }
            Ok(Outcome::ShowHelp) => {
                play.show_help = true;
                true
            }
            Ok(Outcome::ShowStatus) => {
                let world = play.engine.world();
                let text = format!(
                    "Day {} in {}: {} cash, net worth {}",
                    world.current_day(),
                    world.player().current_location,
                    format_money(world.player().money),
                    format_money(world.net_worth())
                );
                play.push_message(MessageKind::Info, text, None);
                true
            }
            Ok(Outcome::SaveRequested) => {
                match self.persist(play) {
                    Ok(()) => play.push_message(MessageKind::Success, "Game saved!", None),
                    Err(err) => {
                        error!(?err, "Manual save failed");
                        play.push_message(MessageKind::Error, format!("Save failed: {err}"), None);
                    }
                }
                true
            }
            Ok(Outcome::Quit) => false,
            Err(err) => {
                play.push_message(MessageKind::Error, err.to_string(), None);
                true
            }
        }
    }

    fn draw(&self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Continue => self.draw_continue(frame),
            Screen::Play => self.draw_play(frame),
        }
        if let Some(prompt) = &self.name_prompt {
            self.render_name_prompt(frame, prompt);
        }
    }

    fn draw_menu(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let title = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "🍉 Fruit Dealer 🍊",
                Style::default()
                    .fg(self.theme.accent_alt)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Trade smart. Travel far. Get rich.",
                Style::default()
                    .fg(self.theme.muted)
                    .add_modifier(Modifier::ITALIC),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(title, layout[0]);

        let menu_height = (MENU_ITEMS.len() as u16)
            .saturating_mul(2)
            .saturating_add(2)
            .min(layout[1].height);
        let menu_width = 28.min(layout[1].width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, layout[1]);

        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .flat_map(|(idx, item)| {
                let line = if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                };
                [line, Line::from("")]
            })
            .collect();

        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Main Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
        self.render_status(frame, layout[2]);
    }

    fn draw_continue(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);

        let items: Vec<ListItem> = if self.saves.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "No saves yet. Start a new game from the menu.",
                Style::default().fg(self.theme.muted),
            )))]
        } else {
            self.saves
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    let selected = idx == self.state.continue_cursor;
                    let marker = if selected { "▶ " } else { "  " };
                    let style = if selected {
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(self.theme.primary_fg)
                    };
                    let updated = entry.updated_at.with_timezone(&Local);
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{marker}{}", entry.name), style),
                        Span::styled(
                            format!(
                                "  ({} · day {} · {})",
                                entry.player,
                                entry.day,
                                updated.format("%Y-%m-%d %H:%M")
                            ),
                            Style::default().fg(self.theme.muted),
                        ),
                    ]))
                })
                .collect()
        };

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Continue · Enter to load · Esc to go back"),
        );
        frame.render_widget(list, layout[0]);
        self.render_status(frame, layout[1]);
    }

    fn draw_play(&self, frame: &mut Frame) {
        let Some(play) = &self.play_state else {
            return;
        };
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(7),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_play_header(frame, layout[0], play);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(42),
                Constraint::Percentage(28),
            ])
            .split(layout[1]);
        self.render_player_panel(frame, body[0], play);
        self.render_market(frame, body[1], play);
        self.render_cities(frame, body[2], play);
        self.render_messages(frame, layout[2], play);
        self.render_command_line(frame, layout[3], play);

        if play.show_help {
            self.render_help(frame, area);
        }
    }

    fn render_play_header(&self, frame: &mut Frame, area: Rect, play: &PlayState) {
        let world = play.engine.world();
        let player = world.player();
        let text = format!(
            "{} in {} · Day {}",
            player.name,
            player.current_location,
            world.current_day()
        );
        let header = Paragraph::new(Line::from(Span::styled(
            text,
            Style::default()
                .fg(self.theme.warning)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, area);
    }

    fn render_player_panel(&self, frame: &mut Frame, area: Rect, play: &PlayState) {
        let world = play.engine.world();
        let player = world.player();
        let label = Style::default().fg(self.theme.accent);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Money      ", label),
                Span::raw(format_money(player.money)),
            ]),
            Line::from(vec![
                Span::styled("Net worth  ", label),
                Span::raw(format_money(world.net_worth())),
            ]),
            Line::from(vec![
                Span::styled("Travel     ", label),
                Span::raw(format_money(play.engine.travel_cost())),
            ]),
            Line::from(""),
            Line::from(Span::styled("Inventory", label)),
        ];

        let held: Vec<_> = player
            .inventory
            .iter()
            .filter(|(_, qty)| **qty > 0)
            .collect();
        if held.is_empty() {
            lines.push(Line::from(Span::styled(
                "  empty",
                Style::default().fg(self.theme.muted),
            )));
        } else {
            for (name, qty) in held {
                let icon = world
                    .commodity(name)
                    .map(|commodity| commodity.label.as_str())
                    .unwrap_or("");
                lines.push(Line::from(format!("  {icon} {name} x{qty}")));
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Player"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_market(&self, frame: &mut Frame, area: Rect, play: &PlayState) {
        let world = play.engine.world();
        let player = world.player();
        let location = player.current_location.as_str();

        let rows: Vec<Row> = world
            .commodities()
            .iter()
            .map(|commodity| {
                let price = play.engine.get_price(&commodity.name, location);
                let price_cell = if price == 0 {
                    Cell::from(Span::styled("-", Style::default().fg(self.theme.muted)))
                } else {
                    Cell::from(format_money(price))
                };
                let modifier = world
                    .location(location)
                    .map(|loc| loc.modifier_for(&commodity.name))
                    .unwrap_or(1.0);
                let trend = if modifier < 1.0 {
                    Span::styled("cheap", Style::default().fg(self.theme.success))
                } else if modifier > 1.0 {
                    Span::styled("pricey", Style::default().fg(self.theme.danger))
                } else {
                    Span::raw("")
                };
                Row::new(vec![
                    Cell::from(format!("{} {}", commodity.label, commodity.name)),
                    price_cell,
                    Cell::from(player.quantity_of(&commodity.name).to_string()),
                    Cell::from(trend),
                ])
            })
            .collect();

        let header = Row::new(vec!["Fruit", "Price", "Held", ""]).style(
            Style::default()
                .fg(self.theme.success)
                .add_modifier(Modifier::BOLD),
        );
        let table = Table::new(
            rows,
            [
                Constraint::Min(12),
                Constraint::Length(12),
                Constraint::Length(6),
                Constraint::Length(7),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Market Prices · {location}")),
        );
        frame.render_widget(table, area);
    }

    fn render_cities(&self, frame: &mut Frame, area: Rect, play: &PlayState) {
        let world = play.engine.world();
        let here = world.player().current_location.as_str();
        let items: Vec<ListItem> = world
            .locations()
            .iter()
            .map(|location| {
                if location.name == here {
                    ListItem::new(Line::from(Span::styled(
                        format!("📍 {}", location.name),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )))
                } else {
                    ListItem::new(Line::from(format!("   {}", location.name)))
                }
            })
            .collect();
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Cities"));
        frame.render_widget(list, area);
    }

    fn render_messages(&self, frame: &mut Frame, area: Rect, play: &PlayState) {
        let visible = area.height.saturating_sub(2) as usize;
        let mut lines: Vec<Line> = Vec::new();
        for message in &play.messages {
            let color = match message.kind {
                MessageKind::Info => self.theme.primary_fg,
                MessageKind::Success => self.theme.success,
                MessageKind::Error => self.theme.danger,
            };
            lines.push(Line::from(Span::styled(
                message.text.clone(),
                Style::default().fg(color),
            )));
            if let Some(hint) = &message.hint {
                lines.push(Line::from(Span::styled(
                    format!("  {hint}"),
                    Style::default().fg(self.theme.muted),
                )));
            }
        }
        let skip = lines.len().saturating_sub(visible);
        let lines: Vec<Line> = lines.into_iter().skip(skip).collect();
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Messages"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_command_line(&self, frame: &mut Frame, area: Rect, play: &PlayState) {
        let paragraph = Paragraph::new(Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(play.input.value.as_str()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Command · 'help' for commands · Esc for menu"),
        );
        frame.render_widget(paragraph, area);
        if !play.show_help {
            let x = area.x + 3 + play.input.cursor as u16;
            frame.set_cursor(x.min(area.right().saturating_sub(2)), area.y + 1);
        }
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let height = (COMMAND_HELP.len() as u16 + 4).min(area.height);
        let width = 64.min(area.width);
        let popup = centered_rect(width, height, area);

        let mut lines: Vec<Line> = COMMAND_HELP
            .iter()
            .map(|(usage, description)| {
                Line::from(vec![
                    Span::styled(
                        format!("{usage:<20}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(*description),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Esc or Enter to close",
            Style::default().fg(self.theme.muted),
        )));

        frame.render_widget(Clear, popup);
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Help"));
        frame.render_widget(paragraph, popup);
    }

    fn render_name_prompt(&self, frame: &mut Frame, prompt: &TextInput) {
        let area = frame.size();
        let popup = centered_rect(44.min(area.width), 6.min(area.height), area);
        frame.render_widget(Clear, popup);

        let lines = vec![
            Line::from(vec![
                Span::styled("Name: ", Style::default().fg(self.theme.accent)),
                Span::raw(prompt.value.as_str()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "2-20 letters, spaces or hyphens · Enter / Esc",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("New Game")
                .border_style(Style::default().fg(self.theme.success)),
        );
        frame.render_widget(paragraph, popup);
        frame.set_cursor(popup.x + 7 + prompt.cursor as u16, popup.y + 1);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let paragraph = Paragraph::new(Line::from(self.state.status.clone()))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
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

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_edits_at_cursor() {
        let mut input = TextInput::new(10);
        for ch in "buy apl".chars() {
            input.insert(ch);
        }
        input.move_cursor(-1);
        input.insert('p');
        assert_eq!(input.value, "buy appl");
        input.move_end();
        input.backspace();
        assert_eq!(input.value, "buy app");
        input.move_home();
        input.delete();
        assert_eq!(input.value, "uy app");
        assert_eq!(input.take(), "uy app");
        assert!(input.is_empty());
    }

    #[test]
    fn text_input_respects_limit_and_multibyte() {
        let mut input = TextInput::new(3);
        for ch in "Öxyz".chars() {
            input.insert(ch);
        }
        assert_eq!(input.value, "Öxy");
        input.move_cursor(-10);
        input.delete();
        assert_eq!(input.value, "xy");
    }

    #[test]
    fn menu_cursor_wraps() {
        let mut state = UiState::default();
        state.move_menu_cursor(-1);
        assert_eq!(state.menu_cursor, MENU_ITEMS.len() - 1);
        state.move_menu_cursor(1);
        assert_eq!(state.menu_cursor, 0);
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect(30, 4, area);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.y, 3);
    }
}
