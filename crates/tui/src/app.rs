use std::{
    collections::HashSet,
    io, thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use cinefav_core::{
    config::AppConfig,
    favorites::{toggle_message, FavoritesStore},
    models::{
        Credits, FavoriteInput, FavoriteMovie, MovieDetails, MovieId, MovieSummary, SearchPage,
    },
    tmdb::{certification_to_age, TmdbClient, TrendingWindow, DEFAULT_CERTIFICATION_COUNTRY},
    view::FavoritesView,
};
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
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::state::{format_release_date, ListCursor, SearchBox};

const TICK_RATE: Duration = Duration::from_millis(100);
const CAST_LIMIT: usize = 10;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    favorite: Color,
    rating: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Red,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            favorite: Color::LightRed,
            rating: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    Search,
    Favorites,
    Detail,
}

impl Screen {
    const TABS: [Screen; 3] = [Screen::Home, Screen::Search, Screen::Favorites];

    fn title(self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Search => "Search",
            Screen::Favorites => "Favorites",
            Screen::Detail => "Detail",
        }
    }

    fn tab_index(self) -> Option<usize> {
        Self::TABS.iter().position(|tab| *tab == self)
    }

    fn cycle(self, delta: isize) -> Screen {
        let len = Self::TABS.len() as isize;
        let index = self.tab_index().unwrap_or(0) as isize;
        Self::TABS[(index + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HomeFeed {
    Trending,
    NowPlaying,
}

impl HomeFeed {
    fn title(self) -> &'static str {
        match self {
            HomeFeed::Trending => "Trending Now",
            HomeFeed::NowPlaying => "Now Playing",
        }
    }

    fn toggled(self) -> HomeFeed {
        match self {
            HomeFeed::Trending => HomeFeed::NowPlaying,
            HomeFeed::NowPlaying => HomeFeed::Trending,
        }
    }
}

struct MovieDetail {
    details: MovieDetails,
    credits: Credits,
    certification: Option<String>,
}

enum DetailState {
    Loading(MovieId),
    Ready(Box<MovieDetail>),
    Failed(String),
}

enum AppEvent {
    Input(Event),
    Tick,
    FavoritesChanged,
    HomeLoaded { feed: HomeFeed, result: Result<SearchPage> },
    SearchLoaded { generation: u64, page: SearchPage },
    DetailLoaded { id: MovieId, result: Box<Result<MovieDetail>> },
}

/// Terminal movie browser with a synchronised favorites list.
pub struct CinefavApp {
    config: AppConfig,
    client: TmdbClient,
    favorites: FavoritesView,
    theme: Theme,
    screen: Screen,
    return_to: Screen,
    home_feed: HomeFeed,
    home: Vec<MovieSummary>,
    home_list: ListCursor,
    loading_home: bool,
    search: SearchBox,
    search_page: SearchPage,
    search_list: ListCursor,
    search_focused: bool,
    searching: bool,
    favorites_list: ListCursor,
    detail: Option<DetailState>,
    detail_scroll: u16,
    status: String,
    event_tx: mpsc::Sender<AppEvent>,
    event_rx: Option<mpsc::Receiver<AppEvent>>,
    should_quit: bool,
}

impl CinefavApp {
    pub fn new(config: AppConfig, client: TmdbClient, store: FavoritesStore) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<AppEvent>(128);

        let notifier = event_tx.clone();
        let favorites = FavoritesView::mount_with(&store, move || {
            // Full channel means a redraw is already queued.
            let _ = notifier.try_send(AppEvent::FavoritesChanged);
        });

        let mut favorites_list = ListCursor::default();
        favorites_list.reset(favorites.len());

        Self {
            config,
            client,
            favorites,
            theme: Theme::default(),
            screen: Screen::Home,
            return_to: Screen::Home,
            home_feed: HomeFeed::Trending,
            home: Vec::new(),
            home_list: ListCursor::default(),
            loading_home: false,
            search: SearchBox::default(),
            search_page: SearchPage::empty(),
            search_list: ListCursor::default(),
            search_focused: false,
            searching: false,
            favorites_list,
            detail: None,
            detail_scroll: 0,
            status: "Ready".to_string(),
            event_tx,
            event_rx: Some(event_rx),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut event_rx = self
            .event_rx
            .take()
            .context("application is already running")?;

        if !self.config.has_credentials() {
            self.set_status("No API credentials configured; set api_token in config.toml");
        }
        self.load_home();

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        spawn_input_thread(self.event_tx.clone());

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) || self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Event::Key(key) = event {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::FavoritesChanged) => {
                self.favorites_list.set_len(self.favorites.len());
                true
            }
            Some(AppEvent::HomeLoaded { feed, result }) => {
                if feed != self.home_feed {
                    return true;
                }
                self.loading_home = false;
                match result {
                    Ok(page) => {
                        info!(count = page.results.len(), feed = feed.title(), "home feed loaded");
                        self.home = page.results;
                        self.home_list.reset(self.home.len());
                    }
                    Err(err) => {
                        error!(?err, feed = feed.title(), "home feed request failed");
                        self.set_status(format!("Failed to load {}: {err:#}", feed.title()));
                    }
                }
                true
            }
            Some(AppEvent::SearchLoaded { generation, page }) => {
                if self.search.is_current(generation) {
                    self.searching = false;
                    self.search_list.reset(page.results.len());
                    self.search_page = page;
                }
                true
            }
            Some(AppEvent::DetailLoaded { id, result }) => {
                let waiting = matches!(
                    self.detail,
                    Some(DetailState::Loading(pending)) if pending == id
                );
                if waiting {
                    self.detail = Some(match *result {
                        Ok(detail) => DetailState::Ready(Box::new(detail)),
                        Err(err) => {
                            error!(?err, id, "detail request failed");
                            DetailState::Failed(format!("{err:#}"))
                        }
                    });
                }
                true
            }
            None => false,
        }
    }

    fn handle_tick(&mut self) {
        if let Some((generation, query)) = self.search.poll(Instant::now()) {
            self.dispatch_search(generation, query, 1);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.screen == Screen::Search && self.search_focused {
            self.handle_search_input_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.switch_to(self.tab_screen().cycle(1)),
            KeyCode::BackTab => self.switch_to(self.tab_screen().cycle(-1)),
            KeyCode::Char('1') => self.switch_to(Screen::Home),
            KeyCode::Char('2') => self.switch_to(Screen::Search),
            KeyCode::Char('3') => self.switch_to(Screen::Favorites),
            KeyCode::Char('/') => {
                self.switch_to(Screen::Search);
                self.search_focused = true;
            }
            KeyCode::Char('f') => self.toggle_selected(),
            _ if self.screen == Screen::Detail => self.handle_detail_key(key),
            _ => self.handle_list_key(key),
        }
    }

    fn handle_search_input_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        match key.code {
            KeyCode::Esc | KeyCode::Down | KeyCode::Tab => self.search_focused = false,
            KeyCode::Enter => {
                self.search_focused = false;
                let (generation, query) = self.search.force();
                self.dispatch_search(generation, query, 1);
            }
            KeyCode::Backspace => self.search.pop(now),
            KeyCode::Char('u') if key.modifiers == KeyModifiers::CONTROL => self.search.clear(now),
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.search.push(ch, now)
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') if self.screen == Screen::Home => self.load_home(),
            KeyCode::Char('t') if self.screen == Screen::Home => {
                self.home_feed = self.home_feed.toggled();
                self.home.clear();
                self.home_list.reset(0);
                self.load_home();
            }
            KeyCode::Char('n') if self.screen == Screen::Search => self.change_search_page(1),
            KeyCode::Char('p') if self.screen == Screen::Search => self.change_search_page(-1),
            KeyCode::Up if self.screen == Screen::Search && self.search_list.cursor == 0 => {
                self.search_focused = true;
            }
            KeyCode::Enter => self.open_detail(),
            _ => {
                let Some(list) = self.active_list() else {
                    return;
                };
                match key.code {
                    KeyCode::Char('j') | KeyCode::Down => list.move_by(1),
                    KeyCode::Char('k') | KeyCode::Up => list.move_by(-1),
                    KeyCode::Char('g') | KeyCode::Home => list.move_to(0),
                    KeyCode::Char('G') | KeyCode::End => list.move_to_end(),
                    KeyCode::PageDown => list.page(1),
                    KeyCode::PageUp => list.page(-1),
                    _ => {}
                }
            }
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace => {
                self.screen = self.return_to;
                self.detail = None;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.detail_scroll = self.detail_scroll.saturating_add(1)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1)
            }
            _ => {}
        }
    }

    fn switch_to(&mut self, screen: Screen) {
        self.screen = screen;
        self.detail = None;
        if screen != Screen::Search {
            self.search_focused = false;
        }
    }

    fn tab_screen(&self) -> Screen {
        match self.screen {
            Screen::Detail => self.return_to,
            other => other,
        }
    }

    fn active_list(&mut self) -> Option<&mut ListCursor> {
        match self.screen {
            Screen::Home => Some(&mut self.home_list),
            Screen::Search => Some(&mut self.search_list),
            Screen::Favorites => Some(&mut self.favorites_list),
            Screen::Detail => None,
        }
    }

    fn selected_input(&self) -> Option<FavoriteInput> {
        match self.screen {
            Screen::Home => self
                .home_list
                .selected()
                .and_then(|index| self.home.get(index))
                .map(FavoriteInput::from),
            Screen::Search => self
                .search_list
                .selected()
                .and_then(|index| self.search_page.results.get(index))
                .map(FavoriteInput::from),
            Screen::Favorites => {
                let items = self.favorites.items();
                self.favorites_list
                    .selected()
                    .and_then(|index| items.get(index))
                    .map(FavoriteInput::from)
            }
            Screen::Detail => match &self.detail {
                Some(DetailState::Ready(detail)) => {
                    Some(FavoriteInput::from(&detail.details.summary))
                }
                _ => None,
            },
        }
    }

    fn toggle_selected(&mut self) {
        let Some(input) = self.selected_input() else {
            return;
        };
        let title = input.title.clone();
        let now_favorited = self.favorites.toggle(input);
        self.favorites_list.set_len(self.favorites.len());
        info!(%title, now_favorited, "favorite toggled");
        self.set_status(format!("{}: {title}", toggle_message(now_favorited)));
    }

    fn open_detail(&mut self) {
        let Some(input) = self.selected_input() else {
            return;
        };
        let id = input.id;
        self.return_to = self.screen;
        self.screen = Screen::Detail;
        self.detail = Some(DetailState::Loading(id));
        self.detail_scroll = 0;

        let client = self.client.clone();
        let sender = self.event_tx.clone();
        tokio::spawn(async move {
            let result = Box::new(fetch_detail(&client, id).await);
            let _ = sender.send(AppEvent::DetailLoaded { id, result }).await;
        });
    }

    fn load_home(&mut self) {
        self.loading_home = true;
        let feed = self.home_feed;
        let client = self.client.clone();
        let sender = self.event_tx.clone();
        tokio::spawn(async move {
            let result = match feed {
                HomeFeed::Trending => client.trending(TrendingWindow::Day).await,
                HomeFeed::NowPlaying => client.now_playing(1).await,
            };
            let _ = sender.send(AppEvent::HomeLoaded { feed, result }).await;
        });
    }

    fn change_search_page(&mut self, delta: i64) {
        let target = i64::from(self.search_page.page) + delta;
        if target < 1 || (delta > 0 && !self.search_page.has_next()) {
            return;
        }
        let (generation, query) = self.search.force();
        self.dispatch_search(generation, query, target as u32);
    }

    fn dispatch_search(&mut self, generation: u64, query: String, page: u32) {
        if query.is_empty() {
            self.searching = false;
            self.search_page = SearchPage::empty();
            self.search_list.reset(0);
            return;
        }
        self.searching = true;
        let client = self.client.clone();
        let sender = self.event_tx.clone();
        tokio::spawn(async move {
            let page = client.search_or_empty(&query, page, None).await;
            let _ = sender.send(AppEvent::SearchLoaded { generation, page }).await;
        });
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(size);

        self.render_tabs(frame, chunks[0]);
        match self.screen {
            Screen::Home => self.draw_home(frame, chunks[1]),
            Screen::Search => self.draw_search(frame, chunks[1]),
            Screen::Favorites => self.draw_favorites(frame, chunks[1]),
            Screen::Detail => self.draw_detail(frame, chunks[1]),
        }
        self.render_status(frame, chunks[2]);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<&str> = Screen::TABS.iter().map(|screen| screen.title()).collect();
        let selected = self.tab_screen().tab_index().unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title("cinefav"))
            .style(Style::default().fg(self.theme.muted))
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_home(&mut self, frame: &mut Frame, area: Rect) {
        let columns = split_columns(area);
        let ids = self.favorites.ids();
        let title = if self.loading_home {
            format!("{} (loading…)", self.home_feed.title())
        } else {
            format!("{} · t to switch", self.home_feed.title())
        };
        render_summary_list(
            &self.theme,
            frame,
            columns[0],
            &title,
            &self.home,
            &mut self.home_list,
            &ids,
        );
        let selected = self
            .home_list
            .selected()
            .and_then(|index| self.home.get(index));
        self.render_summary_info(frame, columns[1], selected, &ids);
    }

    fn draw_search(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let input_style = if self.search_focused {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let mut spans = vec![Span::raw(self.search.query().to_string())];
        if self.search_focused {
            spans.push(Span::styled("▏", Style::default().fg(self.theme.accent)));
        }
        let input = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(input_style)
                .title("Search Movie"),
        );
        frame.render_widget(input, rows[0]);

        let columns = split_columns(rows[1]);
        let ids = self.favorites.ids();
        if self.search.query().trim().is_empty() && self.search_page.results.is_empty() {
            let hint = Paragraph::new("Type something in the search box…")
                .style(Style::default().fg(self.theme.muted))
                .block(Block::default().borders(Borders::ALL).title("Results"));
            frame.render_widget(hint, columns[0]);
        } else {
            let title = if self.searching {
                format!("Searching “{}”…", self.search.query().trim())
            } else {
                format!(
                    "Results · page {}/{}",
                    self.search_page.page, self.search_page.total_pages
                )
            };
            render_summary_list(
                &self.theme,
                frame,
                columns[0],
                &title,
                &self.search_page.results,
                &mut self.search_list,
                &ids,
            );
        }
        let selected = self
            .search_list
            .selected()
            .and_then(|index| self.search_page.results.get(index));
        self.render_summary_info(frame, columns[1], selected, &ids);
    }

    fn draw_favorites(&mut self, frame: &mut Frame, area: Rect) {
        let items = self.favorites.items();
        if items.is_empty() {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Data Empty",
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "You don't have a favorite movie yet",
                    Style::default().fg(self.theme.muted),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press 1 to explore movies",
                    Style::default().fg(self.theme.accent),
                )),
            ];
            let empty = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Favorites"));
            frame.render_widget(empty, area);
            return;
        }

        let columns = split_columns(area);
        self.favorites_list
            .set_height(columns[0].height.saturating_sub(2) as usize);
        self.favorites_list.set_len(items.len());

        let rows: Vec<ListItem> = items
            .iter()
            .map(|movie| {
                movie_row(
                    &self.theme,
                    &movie.title,
                    movie.release_year(),
                    movie.vote_average,
                    true,
                )
            })
            .collect();
        render_list(
            &self.theme,
            frame,
            columns[0],
            &format!("Favorites ({})", items.len()),
            rows,
            &self.favorites_list,
        );

        let selected = self
            .favorites_list
            .selected()
            .and_then(|index| items.get(index));
        let Some(movie) = selected else {
            return;
        };
        let mut lines = vec![
            Line::from(Span::styled(
                movie.title.clone(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            )),
            self.rating_line(movie.vote_average, movie.release_year()),
            Line::from(""),
            Line::from(
                movie
                    .overview
                    .clone()
                    .unwrap_or_else(|| "No overview available.".to_string()),
            ),
            Line::from(""),
        ];
        lines.extend(self.link_lines(
            movie.poster_path.as_deref(),
            movie.trailer_search_url(),
        ));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter: details · f: remove from favorites",
            Style::default().fg(self.theme.muted),
        )));
        let info = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Movie"))
            .wrap(Wrap { trim: true });
        frame.render_widget(info, columns[1]);
    }

    fn draw_detail(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Movie Detail");
        let lines = match &self.detail {
            None => vec![Line::from("Nothing selected")],
            Some(DetailState::Loading(id)) => vec![Line::from(format!("Loading movie {id}…"))],
            Some(DetailState::Failed(err)) => vec![Line::from(Span::styled(
                format!("Failed to load movie: {err}"),
                Style::default().fg(self.theme.danger),
            ))],
            Some(DetailState::Ready(detail)) => self.detail_lines(detail),
        };
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.detail_scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn detail_lines(&self, detail: &MovieDetail) -> Vec<Line<'static>> {
        let summary = &detail.details.summary;
        let favorited = self.favorites.contains(summary.id);
        let heading = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);

        let age = detail
            .certification
            .as_deref()
            .and_then(certification_to_age)
            .map(|age| format!("{age}+"))
            .unwrap_or_else(|| "—".to_string());

        let mut lines = vec![
            Line::from(Span::styled(
                summary.display_title().to_string(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Released {}",
                format_release_date(summary.release_date.as_deref())
            )),
            self.rating_line(summary.vote_average, None),
            Line::from(format!(
                "Genre: {}   Age limit: {}   Runtime: {}",
                detail.details.main_genre().unwrap_or("—"),
                age,
                detail
                    .details
                    .runtime
                    .map(|minutes| format!("{minutes} min"))
                    .unwrap_or_else(|| "—".to_string()),
            )),
            self.favorite_line(favorited),
            Line::from(""),
        ];

        if let Some(tagline) = detail.details.tagline.as_deref().filter(|t| !t.is_empty()) {
            lines.push(Line::from(Span::styled(
                tagline.to_string(),
                Style::default()
                    .fg(self.theme.muted)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        lines.push(Line::from(Span::styled("Overview", heading)));
        lines.push(Line::from(
            summary
                .overview
                .clone()
                .unwrap_or_else(|| "No overview available.".to_string()),
        ));
        lines.push(Line::from(""));

        lines.push(Line::from(Span::styled("Cast & Crew", heading)));
        if detail.credits.cast.is_empty() {
            lines.push(Line::from("No cast information."));
        }
        for member in detail.credits.cast.iter().take(CAST_LIMIT) {
            let character = member.character.as_deref().unwrap_or("");
            lines.push(Line::from(vec![
                Span::raw(format!("  {}", member.display_name())),
                Span::styled(
                    format!("  {character}"),
                    Style::default().fg(self.theme.muted),
                ),
            ]));
        }
        lines.push(Line::from(""));
        lines.extend(self.link_lines(
            summary.poster_path.as_deref(),
            summary.trailer_search_url(),
        ));
        lines
    }

    fn render_summary_info(
        &self,
        frame: &mut Frame,
        area: Rect,
        movie: Option<&MovieSummary>,
        favorites: &HashSet<MovieId>,
    ) {
        let block = Block::default().borders(Borders::ALL).title("Movie");
        let Some(movie) = movie else {
            frame.render_widget(block, area);
            return;
        };
        let snapshot = FavoriteMovie::from(FavoriteInput::from(movie));
        let lines = vec![
            Line::from(Span::styled(
                movie.display_title().to_string(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            )),
            self.rating_line(movie.vote_average, snapshot.release_year()),
            self.favorite_line(favorites.contains(&movie.id)),
            Line::from(""),
            Line::from(
                movie
                    .overview
                    .clone()
                    .unwrap_or_else(|| "No overview available.".to_string()),
            ),
            Line::from(""),
            Line::from(Span::styled(
                format!("Poster: {}", self.config.image_url(movie.poster_path.as_deref())),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(Span::styled(
                "Enter: details · f: toggle favorite",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let info = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(info, area);
    }

    fn rating_line(&self, rating: Option<f64>, year: Option<i32>) -> Line<'static> {
        let mut spans = Vec::new();
        if let Some(rating) = rating {
            spans.push(Span::styled(
                format!("★ {rating:.1}/10"),
                Style::default().fg(self.theme.rating),
            ));
        }
        if let Some(year) = year {
            if !spans.is_empty() {
                spans.push(Span::raw(" · "));
            }
            spans.push(Span::raw(year.to_string()));
        }
        Line::from(spans)
    }

    fn favorite_line(&self, favorited: bool) -> Line<'static> {
        if favorited {
            Line::from(Span::styled(
                "♥ In your favorites",
                Style::default().fg(self.theme.favorite),
            ))
        } else {
            Line::from(Span::styled(
                "♡ Not in favorites",
                Style::default().fg(self.theme.muted),
            ))
        }
    }

    fn link_lines(&self, poster_path: Option<&str>, trailer: String) -> Vec<Line<'static>> {
        let muted = Style::default().fg(self.theme.muted);
        vec![
            Line::from(Span::styled(
                format!("Poster:  {}", self.config.image_url(poster_path)),
                muted,
            )),
            Line::from(Span::styled(format!("Trailer: {trailer}"), muted)),
        ]
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let sync = if self.favorites.is_synced() {
            "live sync on"
        } else {
            "live sync off"
        };
        let summary = Span::styled(
            format!("  ♥ {} favorites · {sync}", self.favorites.len()),
            Style::default().fg(self.theme.muted),
        );
        let help = match self.screen {
            Screen::Search if self.search_focused => "Enter search · Esc leave input",
            Screen::Detail => "Esc back · f favorite · j/k scroll",
            _ => "Tab switch · / search · f favorite · Enter details · q quit",
        };
        let paragraph = Paragraph::new(vec![
            Line::from(vec![Span::raw(self.status.clone()), summary]),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(Block::default().borders(Borders::TOP))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

async fn fetch_detail(client: &TmdbClient, id: MovieId) -> Result<MovieDetail> {
    let (details, credits, certification) = tokio::join!(
        client.details(id),
        client.credits(id),
        client.release_certification(id, DEFAULT_CERTIFICATION_COUNTRY),
    );
    let certification = certification.unwrap_or_else(|err| {
        warn!(?err, id, "release dates unavailable");
        None
    });
    Ok(MovieDetail {
        details: details?,
        credits: credits?,
        certification,
    })
}

fn split_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area)
}

fn movie_row(
    theme: &Theme,
    title: &str,
    year: Option<i32>,
    rating: Option<f64>,
    favorited: bool,
) -> ListItem<'static> {
    let marker = if favorited {
        Span::styled("♥ ", Style::default().fg(theme.favorite))
    } else {
        Span::raw("  ")
    };
    let mut spans = vec![
        marker,
        Span::styled(
            title.to_string(),
            Style::default()
                .fg(theme.primary_fg)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(year) = year {
        spans.push(Span::styled(
            format!(" ({year})"),
            Style::default().fg(theme.muted),
        ));
    }
    if let Some(rating) = rating {
        spans.push(Span::styled(
            format!("  ★ {rating:.1}"),
            Style::default().fg(theme.rating),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn render_summary_list(
    theme: &Theme,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    movies: &[MovieSummary],
    cursor: &mut ListCursor,
    favorites: &HashSet<MovieId>,
) {
    cursor.set_height(area.height.saturating_sub(2) as usize);
    cursor.set_len(movies.len());
    let rows: Vec<ListItem> = movies
        .iter()
        .map(|movie| {
            let year = FavoriteMovie::from(FavoriteInput::from(movie)).release_year();
            movie_row(
                theme,
                movie.display_title(),
                year,
                movie.vote_average,
                favorites.contains(&movie.id),
            )
        })
        .collect();
    render_list(theme, frame, area, title, rows, cursor);
}

fn render_list(
    theme: &Theme,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: Vec<ListItem<'static>>,
    cursor: &ListCursor,
) {
    let mut list_state = ListState::default()
        .with_offset(cursor.offset)
        .with_selected(cursor.selected());
    let list = List::new(rows)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .highlight_style(Style::default().bg(theme.selection_bg))
        .highlight_symbol("▶ ");
    frame.render_stateful_widget(list, area, &mut list_state);
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
