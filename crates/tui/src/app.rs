use std::{cmp, io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gamedex_core::{
    catalog::gather_details, CatalogClient, CatalogError, GameDetail, GameId, GamePage,
    GameSummary, LocalStore, RequestScope, RequestTicket,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const FAVORITE_MARK: &str = "★";
const MIN_SEARCH_CHARS: usize = 3;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    favorite: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            favorite: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Onboarding,
    Browse,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Trending,
    Upcoming,
    Search,
    Favorites,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Trending, Tab::Upcoming, Tab::Search, Tab::Favorites];

    fn title(self) -> &'static str {
        match self {
            Tab::Trending => "Trending",
            Tab::Upcoming => "Upcoming",
            Tab::Search => "Search",
            Tab::Favorites => "Favorites",
        }
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|tab| *tab == self)
            .unwrap_or_default()
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn empty_message(self) -> &'static str {
        match self {
            Tab::Favorites => "No favorites yet. Press f on a game to add it.",
            Tab::Search => "No results. Press / to search again.",
            _ => "No games found.",
        }
    }
}

/// Games shown in the list pane plus pagination hints.
#[derive(Debug, Default)]
struct Listing {
    games: Vec<GameSummary>,
    total: Option<u64>,
    has_next: bool,
    has_previous: bool,
}

impl From<GamePage> for Listing {
    fn from(page: GamePage) -> Self {
        Self {
            has_next: page.has_next(),
            has_previous: page.has_previous(),
            total: Some(page.count),
            games: page.results,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    ListingLoaded {
        ticket: RequestTicket,
        result: Result<Listing, CatalogError>,
    },
    DetailLoaded {
        ticket: RequestTicket,
        result: Result<GameDetail, CatalogError>,
    },
}

/// Terminal front-end over the catalog client and local store.
pub struct GamedexApp {
    catalog: Arc<CatalogClient>,
    store: LocalStore,
    theme: Theme,
    state: UiState,
    screen: Screen,
    listing_scope: RequestScope,
    detail_scope: RequestScope,
    detail_target: Option<(GameId, String)>,
    detail: Option<GameDetail>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
}

impl GamedexApp {
    pub fn new(catalog: CatalogClient, store: LocalStore) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store,
            theme: Theme::default(),
            state: UiState::default(),
            screen: Screen::Onboarding,
            listing_scope: RequestScope::new(),
            detail_scope: RequestScope::new(),
            detail_target: None,
            detail: None,
            event_tx: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.screen = if self.store.has_onboarded() {
            Screen::Browse
        } else {
            Screen::Onboarding
        };
        self.state.favorites = self.store.favorites();

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        if self.screen == Screen::Browse {
            self.load_listing();
        }

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }

            if self.state.should_quit {
                break;
            }
        }

        self.listing_scope.invalidate();
        self.detail_scope.invalidate();
        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                self.handle_input(event);
                true
            }
            Some(AppEvent::Tick) => true,
            Some(AppEvent::ListingLoaded { ticket, result }) => {
                self.apply_listing(&ticket, result);
                true
            }
            Some(AppEvent::DetailLoaded { ticket, result }) => {
                self.apply_detail(&ticket, result);
                true
            }
            None => false,
        }
    }

    fn load_listing(&mut self) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let ticket = self.listing_scope.begin();
        let catalog = Arc::clone(&self.catalog);
        let store = self.store.clone();
        let tab = self.state.tab;
        let page = self.state.page;
        let search = self.state.search.clone();

        debug!(tab = tab.title(), page, generation = ticket.generation(), "loading listing");
        self.state.loading = true;
        self.state.set_status(format!("Loading {}...", tab.title()));

        tokio::spawn(async move {
            let outcome = ticket
                .run(fetch_listing(&catalog, &store, tab, page, &search))
                .await;
            if let Some(result) = outcome {
                let _ = tx.send(AppEvent::ListingLoaded { ticket, result }).await;
            }
        });
    }

    fn apply_listing(&mut self, ticket: &RequestTicket, result: Result<Listing, CatalogError>) {
        if !self.listing_scope.is_current(ticket) {
            debug!(generation = ticket.generation(), "discarding stale listing");
            return;
        }
        self.state.loading = false;

        match result {
            Ok(listing) => {
                let count = listing.games.len();
                info!(tab = self.state.tab.title(), page = self.state.page, count, "listing loaded");
                self.state.set_listing(listing);
                if count == 0 {
                    self.state.set_status(self.state.tab.empty_message().to_string());
                } else {
                    let total = self
                        .state
                        .total
                        .map(|total| format!(" of {total}"))
                        .unwrap_or_default();
                    self.state.set_status(format!(
                        "{} · page {} · {count}{total} games",
                        self.state.tab.title(),
                        self.state.page
                    ));
                }
            }
            Err(err) => {
                error!(error = %err, tab = self.state.tab.title(), "listing failed");
                self.state.set_listing(Listing::default());
                self.state
                    .set_status(format!("Failed to load games: {err}. Press r to retry."));
            }
        }
    }

    fn open_details(&mut self) {
        let Some(game) = self.state.current_game() else {
            return;
        };
        let target = (game.id, game.name.clone());
        self.load_details(target);
    }

    fn load_details(&mut self, target: (GameId, String)) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let ticket = self.detail_scope.begin();
        let catalog = Arc::clone(&self.catalog);
        let id = target.0;

        self.state.set_status(format!("Loading {}...", target.1));
        self.detail = None;
        self.detail_target = Some(target);
        self.state.detail_scroll = 0;
        self.screen = Screen::Details;

        tokio::spawn(async move {
            if let Some(result) = ticket.run(catalog.game_details(id)).await {
                let _ = tx.send(AppEvent::DetailLoaded { ticket, result }).await;
            }
        });
    }

    fn apply_detail(&mut self, ticket: &RequestTicket, result: Result<GameDetail, CatalogError>) {
        if self.screen != Screen::Details || !self.detail_scope.is_current(ticket) {
            debug!(generation = ticket.generation(), "discarding stale detail");
            return;
        }

        match result {
            Ok(detail) => {
                info!(game_id = detail.id(), "details loaded");
                self.state.set_status(detail.name().to_string());
                self.detail = Some(detail);
            }
            Err(err) => {
                error!(error = %err, "details failed");
                self.state
                    .set_status(format!("Failed to load details: {err}. Press r to retry."));
            }
        }
    }

    fn close_details(&mut self) {
        self.detail_scope.invalidate();
        self.detail = None;
        self.detail_target = None;
        self.screen = Screen::Browse;
        if self.state.tab == Tab::Favorites {
            self.load_listing();
        } else {
            self.state.set_status(self.state.tab.title().to_string());
        }
    }

    fn toggle_favorite(&mut self, id: GameId, name: &str) {
        if self.store.is_favorite(id) {
            self.store.remove_favorite(id);
        } else {
            self.store.add_favorite(id);
        }
        self.state.favorites = self.store.favorites();

        if self.state.favorites.contains(&id) {
            self.state.set_status(format!("Added {name} to favorites"));
        } else {
            self.state.set_status(format!("{name} is not in favorites"));
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if tab == self.state.tab {
            return;
        }
        self.state.tab = tab;
        self.state.page = 1;
        self.state.set_listing(Listing::default());

        if tab == Tab::Search && self.state.search.is_empty() {
            self.listing_scope.invalidate();
            self.begin_search();
        } else {
            self.load_listing();
        }
    }

    fn begin_search(&mut self) {
        self.state.mode = Mode::Search;
        self.state.search_draft = self.state.search.clone();
        self.state
            .set_status("Type a search and press Enter".to_string());
    }

    fn finish_onboarding(&mut self) {
        self.store.set_has_onboarded();
        self.screen = Screen::Browse;
        self.load_listing();
    }

    fn handle_input(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Onboarding => self.handle_onboarding_key(key),
            Screen::Browse if self.state.mode == Mode::Search => self.handle_search_key(key),
            Screen::Browse => self.handle_browse_key(key),
            Screen::Details => self.handle_details_key(key),
        }
    }

    fn handle_onboarding_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => self.finish_onboarding(),
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if !search_ready(&self.state.search_draft) {
                    self.state.set_status(format!(
                        "Type at least {MIN_SEARCH_CHARS} characters to search"
                    ));
                    return;
                }
                self.state.mode = Mode::Browse;
                self.state.search = self.state.search_draft.trim().to_string();
                self.state.page = 1;
                if self.state.tab != Tab::Search {
                    self.state.tab = Tab::Search;
                }
                self.load_listing();
            }
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.set_status("Search cancelled".to_string());
            }
            KeyCode::Backspace => {
                self.state.search_draft.pop();
            }
            KeyCode::Char(ch) => self.state.search_draft.push(ch),
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                self.switch_tab(self.state.tab.next())
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                self.switch_tab(self.state.tab.previous())
            }
            KeyCode::Char(ch @ '1'..='4') => {
                let index = ch as usize - '1' as usize;
                self.switch_tab(Tab::ALL[index]);
            }
            KeyCode::Down | KeyCode::Char('j') => self.state.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.state.move_cursor(-1),
            KeyCode::PageDown => self.state.move_cursor(10),
            KeyCode::PageUp => self.state.move_cursor(-10),
            KeyCode::Home | KeyCode::Char('g') => self.state.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.state.cursor = self.state.games.len().saturating_sub(1)
            }
            KeyCode::Enter => self.open_details(),
            KeyCode::Char('f') => {
                if let Some(game) = self.state.current_game() {
                    let (id, name) = (game.id, game.name.clone());
                    self.toggle_favorite(id, &name);
                }
            }
            KeyCode::Char('/') => {
                if self.state.tab != Tab::Search {
                    self.state.tab = Tab::Search;
                    self.state.set_listing(Listing::default());
                    self.listing_scope.invalidate();
                }
                self.begin_search();
            }
            KeyCode::Char('r') => self.load_listing(),
            KeyCode::Char('n') if self.state.has_next && !self.state.loading => {
                self.state.page += 1;
                self.load_listing();
            }
            KeyCode::Char('p')
                if self.state.has_previous && self.state.page > 1 && !self.state.loading =>
            {
                self.state.page -= 1;
                self.load_listing();
            }
            KeyCode::Char('C') if self.state.tab == Tab::Favorites => {
                self.store.clear_favorites();
                self.state.favorites = self.store.favorites();
                self.load_listing();
            }
            _ => {}
        }
    }

    fn handle_details_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => self.close_details(),
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('f') => {
                if let Some((id, name)) = self.detail_target.clone() {
                    self.toggle_favorite(id, &name);
                }
            }
            KeyCode::Char('r') => {
                if let Some(target) = self.detail_target.clone() {
                    self.load_details(target);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.detail_scroll = self.state.detail_scroll.saturating_add(1)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.detail_scroll = self.state.detail_scroll.saturating_sub(1)
            }
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Onboarding => self.draw_onboarding(frame),
            Screen::Browse => self.draw_browse(frame),
            Screen::Details => self.draw_details(frame),
        }
    }

    fn draw_onboarding(&self, frame: &mut Frame) {
        let area = centered_rect(56, 11, frame.size());
        let accent = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(Span::styled("Welcome to GameDex", accent)),
            Line::from(""),
            Line::from("Browse trending and upcoming games,"),
            Line::from("search the catalog and keep a list"),
            Line::from("of your favorites."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Enter to start · q to quit",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("GameDex"))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_browse(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(frame.size());

        self.render_tabs(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);
        self.render_game_list(frame, body[0]);
        self.render_preview(frame, body[1]);
        self.render_status(frame, chunks[2]);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(idx, tab)| Line::from(format!("{} {}", idx + 1, tab.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("GameDex"))
            .select(self.state.tab.index())
            .style(Style::default().fg(self.theme.muted))
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn render_game_list(&self, frame: &mut Frame, area: Rect) {
        let mut list_state = ListState::default();
        if !self.state.games.is_empty() {
            list_state.select(Some(self.state.cursor));
        }

        let items: Vec<ListItem> = self
            .state
            .games
            .iter()
            .map(|game| {
                let marker = if self.state.favorites.contains(&game.id) {
                    Span::styled(
                        format!("{FAVORITE_MARK} "),
                        Style::default().fg(self.theme.favorite),
                    )
                } else {
                    Span::raw("  ")
                };
                let mut spans = vec![
                    marker,
                    Span::styled(
                        game.name.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                ];
                if let Some(rating) = game.rating_label() {
                    spans.push(Span::styled(
                        format!("  {rating}"),
                        Style::default().fg(self.theme.muted),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let title = if self.state.loading {
            format!("{} (loading)", self.state.tab.title())
        } else {
            format!("{} · page {}", self.state.tab.title(), self.state.page)
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_preview(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Game");
        let Some(game) = self.state.current_game() else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let label = Style::default().fg(self.theme.muted);
        let mut lines = vec![
            Line::from(Span::styled(
                game.name.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Genres: ", label),
                Span::raw(or_placeholder(game.genre_label(3))),
            ]),
            Line::from(vec![
                Span::styled("Rating: ", label),
                Span::raw(game.rating_label().unwrap_or_else(|| "n/a".to_string())),
            ]),
        ];
        if self.state.favorites.contains(&game.id) {
            lines.push(Line::from(Span::styled(
                format!("{FAVORITE_MARK} Favorite"),
                Style::default().fg(self.theme.favorite),
            )));
        }
        if let Some(image) = &game.background_image {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(image.clone(), label)));
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.mode == Mode::Search {
            format!("Search: {}_", self.state.search_draft)
        } else {
            self.state.status.clone()
        };
        let hints = match self.screen {
            Screen::Details => "Esc back · f favorite · r retry · ↑↓ scroll · q quit",
            _ if self.state.mode == Mode::Search => "Enter search · Esc cancel",
            _ => "Tab switch · ↑↓ move · Enter details · f favorite · / search · n/p page · r reload · q quit",
        };
        let paragraph = Paragraph::new(vec![
            Line::from(primary),
            Line::from(Span::styled(hints, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_details(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(4)])
            .split(frame.size());

        let name = self
            .detail_target
            .as_ref()
            .map(|(_, name)| name.clone())
            .unwrap_or_default();
        let is_favorite = self
            .detail_target
            .as_ref()
            .map(|(id, _)| self.state.favorites.contains(id))
            .unwrap_or(false);
        let title = if is_favorite {
            format!("{name} {FAVORITE_MARK}")
        } else {
            name
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        let lines = match &self.detail {
            Some(detail) => self.detail_lines(detail),
            None => vec![Line::from(Span::styled(
                self.state.status.clone(),
                Style::default().fg(if self.state.status.starts_with("Failed") {
                    self.theme.danger
                } else {
                    self.theme.muted
                }),
            ))],
        };

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.state.detail_scroll, 0));
        frame.render_widget(paragraph, chunks[0]);
        self.render_status(frame, chunks[1]);
    }

    fn detail_lines(&self, detail: &GameDetail) -> Vec<Line<'static>> {
        let label = Style::default().fg(self.theme.muted);
        let field = |name: &'static str, value: String| {
            Line::from(vec![Span::styled(name, label), Span::raw(value)])
        };

        let released = detail
            .released
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "TBA".to_string());
        let rating = match detail.summary.rating_label() {
            Some(rating) => format!("{rating} ({} ratings)", detail.ratings_count),
            None => "n/a".to_string(),
        };
        let developers = detail
            .developers
            .iter()
            .map(|company| company.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let publishers = detail
            .publishers
            .iter()
            .map(|company| company.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut lines = vec![
            Line::from(Span::styled(
                detail.name().to_string(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            field("Released:   ", released),
            field("Rating:     ", rating),
            field(
                "Genres:     ",
                or_placeholder(detail.summary.genre_label(usize::MAX)),
            ),
            field(
                "Platforms:  ",
                or_placeholder(detail.platform_names().join(", ")),
            ),
            field("Developers: ", or_placeholder(developers)),
            field("Publishers: ", or_placeholder(publishers)),
            field(
                "Screenshots:",
                format!(" {}", detail.screenshot_urls().len()),
            ),
            Line::from(""),
        ];
        lines.extend(
            detail
                .description
                .lines()
                .map(|line| Line::from(line.to_string())),
        );
        lines
    }
}

async fn fetch_listing(
    catalog: &CatalogClient,
    store: &LocalStore,
    tab: Tab,
    page: u32,
    search: &str,
) -> Result<Listing, CatalogError> {
    match tab {
        Tab::Trending => catalog.trending_games(page).await.map(Listing::from),
        Tab::Upcoming => catalog.upcoming_games(page).await.map(Listing::from),
        Tab::Search => {
            let query = search.trim();
            if query.is_empty() {
                return Ok(Listing::default());
            }
            catalog.search_games(query, page).await.map(Listing::from)
        }
        Tab::Favorites => {
            let ids = store.favorites();
            let details = gather_details(catalog, &ids).await;
            Ok(Listing {
                total: Some(details.len() as u64),
                games: details.into_iter().map(|detail| detail.summary).collect(),
                has_next: false,
                has_previous: false,
            })
        }
    }
}

fn search_ready(query: &str) -> bool {
    query.trim().chars().count() >= MIN_SEARCH_CHARS
}

fn or_placeholder(value: String) -> String {
    if value.is_empty() {
        "n/a".to_string()
    } else {
        value
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
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

struct UiState {
    tab: Tab,
    mode: Mode,
    page: u32,
    games: Vec<GameSummary>,
    total: Option<u64>,
    has_next: bool,
    has_previous: bool,
    favorites: Vec<GameId>,
    cursor: usize,
    search: String,
    search_draft: String,
    status: String,
    loading: bool,
    detail_scroll: u16,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: Tab::Trending,
            mode: Mode::Browse,
            page: 1,
            games: Vec::new(),
            total: None,
            has_next: false,
            has_previous: false,
            favorites: Vec::new(),
            cursor: 0,
            search: String::new(),
            search_draft: String::new(),
            status: "Ready".to_string(),
            loading: false,
            detail_scroll: 0,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_listing(&mut self, listing: Listing) {
        self.games = listing.games;
        self.total = listing.total;
        self.has_next = listing.has_next;
        self.has_previous = listing.has_previous;
        self.loading = false;
        self.clamp_cursor();
    }

    fn current_game(&self) -> Option<&GameSummary> {
        self.games.get(self.cursor)
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.games.is_empty() {
            self.cursor = 0;
            return;
        }
        let max = self.games.len() as isize - 1;
        self.cursor = cmp::min(cmp::max(self.cursor as isize + delta, 0), max) as usize;
    }

    fn clamp_cursor(&mut self) {
        if self.cursor >= self.games.len() {
            self.cursor = self.games.len().saturating_sub(1);
        }
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamedex_core::store::MemoryBackend;
    use std::net::TcpListener;

    fn test_app() -> GamedexApp {
        let port = TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .map(|addr| addr.port())
            .unwrap();
        let catalog = CatalogClient::new(format!("http://127.0.0.1:{port}/api"), "test").unwrap();
        let store = LocalStore::new(Arc::new(MemoryBackend::new()), "@Test");
        GamedexApp::new(catalog, store)
    }

    fn detail(id: GameId) -> GameDetail {
        GameDetail {
            summary: summary(id),
            description: String::new(),
            released: None,
            platforms: Vec::new(),
            developers: Vec::new(),
            publishers: Vec::new(),
            screenshots: Vec::new(),
            ratings_count: 0,
        }
    }

    fn listing(ids: &[GameId]) -> Listing {
        Listing {
            games: ids.iter().copied().map(summary).collect(),
            ..Listing::default()
        }
    }

    fn game_ids(app: &GamedexApp) -> Vec<GameId> {
        app.state.games.iter().map(|game| game.id).collect()
    }

    fn summary(id: GameId) -> GameSummary {
        GameSummary {
            id,
            name: format!("Game {id}"),
            background_image: None,
            genres: Vec::new(),
            rating: None,
        }
    }

    #[test]
    fn tabs_cycle_both_ways() {
        assert_eq!(Tab::Trending.next(), Tab::Upcoming);
        assert_eq!(Tab::Favorites.next(), Tab::Trending);
        assert_eq!(Tab::Trending.previous(), Tab::Favorites);
        assert_eq!(Tab::Search.index(), 2);
    }

    #[test]
    fn cursor_stays_within_listing() {
        let mut state = UiState::default();
        state.move_cursor(3);
        assert_eq!(state.cursor, 0);

        state.set_listing(Listing {
            games: vec![summary(1), summary(2), summary(3)],
            ..Listing::default()
        });
        state.move_cursor(10);
        assert_eq!(state.cursor, 2);
        state.move_cursor(-1);
        assert_eq!(state.current_game().map(|game| game.id), Some(2));

        state.set_listing(Listing {
            games: vec![summary(9)],
            ..Listing::default()
        });
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn listing_from_page_keeps_pagination() {
        let page = GamePage {
            count: 40,
            next: Some("https://api.rawg.io/api/games?page=2".into()),
            previous: None,
            results: vec![summary(1)],
        };
        let listing = Listing::from(page);
        assert!(listing.has_next);
        assert!(!listing.has_previous);
        assert_eq!(listing.total, Some(40));
        assert_eq!(listing.games.len(), 1);
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect(56, 11, area);
        assert_eq!(rect, Rect::new(0, 0, 20, 10));
        let rect = centered_rect(10, 4, area);
        assert_eq!(rect, Rect::new(5, 3, 10, 4));
    }

    #[test]
    fn superseded_listing_is_discarded() {
        let mut app = test_app();
        app.screen = Screen::Browse;
        app.state.set_listing(listing(&[1]));

        let stale = app.listing_scope.begin();
        let current = app.listing_scope.begin();

        app.apply_listing(&stale, Ok(listing(&[7, 8])));
        assert_eq!(game_ids(&app), vec![1]);

        app.apply_listing(&stale, Err(CatalogError::InvalidQuery("late".into())));
        assert_eq!(game_ids(&app), vec![1]);

        app.apply_listing(&current, Ok(listing(&[2, 3])));
        assert_eq!(game_ids(&app), vec![2, 3]);
        assert!(!app.state.loading);
    }

    #[tokio::test]
    async fn detail_after_leaving_details_is_discarded() {
        let mut app = test_app();
        let (tx, mut rx) = mpsc::channel(8);
        app.event_tx = Some(tx);
        app.screen = Screen::Browse;
        app.state.set_listing(listing(&[42]));

        app.open_details();
        assert_eq!(app.screen, Screen::Details);
        let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap();
        let Some(AppEvent::DetailLoaded { ticket, .. }) = event else {
            panic!("expected a detail load");
        };

        app.close_details();
        assert_eq!(app.screen, Screen::Browse);
        app.apply_detail(&ticket, Ok(detail(42)));
        assert!(app.detail.is_none());

        app.open_details();
        app.apply_detail(&ticket, Ok(detail(42)));
        assert!(app.detail.is_none());
        assert_eq!(app.screen, Screen::Details);
    }

    #[test]
    fn current_detail_is_applied() {
        let mut app = test_app();
        app.screen = Screen::Details;
        let ticket = app.detail_scope.begin();

        app.apply_detail(&ticket, Ok(detail(5)));
        assert_eq!(app.detail.as_ref().map(GameDetail::id), Some(5));
    }

    #[test]
    fn short_searches_are_not_sent() {
        assert!(!search_ready(""));
        assert!(!search_ready("  ab "));
        assert!(search_ready("zel"));
        assert!(search_ready("ゼルダの"));

        let mut app = test_app();
        app.screen = Screen::Browse;
        app.state.mode = Mode::Search;
        app.state.search_draft = "ab".to_string();
        app.handle_search_key(KeyEvent::from(KeyCode::Enter));
        assert_eq!(app.state.mode, Mode::Search);
        assert!(app.state.search.is_empty());
        assert_eq!(app.listing_scope.generation(), 0);
    }
}
