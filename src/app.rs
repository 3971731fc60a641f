use crate::announcer::Announcer;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::focus::{FocusId, FocusRegistry};
use crate::modal::ModalController;
use crate::net::{Destination, Request, Transport};
use crate::omdb::{MovieDetails, MovieIndex, MovieSummary, OmdbClient};
use crate::query::{Query, QueryState};
use crate::render::{Bounds, LazyImages};
use crate::search::{SearchDebouncer, SearchOutcome};
use crate::services::{Services, WorkerLink};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::views::{page_lines, PageLine};
use crate::ui::{self, FrameLayout};
use crate::worker::{
  ClientCommand, Lifecycle, Notification, WorkerHandle, ACTION_DISMISS, ACTION_OPEN,
  BACKGROUND_SYNC_TAG,
};
use color_eyre::Result;
use crossterm::event::{
  DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
  MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::collections::HashSet;
use std::io::stdout;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

/// One home screen row: a titled search that loads on startup
pub struct CategoryRow {
  pub title: String,
  pub query_text: String,
  pub query: Query<Vec<Arc<MovieSummary>>>,
}

struct DetailsLoad {
  id: String,
  query: Query<Arc<MovieDetails>>,
}

/// Main application state
pub struct App {
  config: Config,
  client: OmdbClient,
  /// Poster loads go through here so the worker sees them
  transport: Arc<dyn Transport>,
  worker: Option<WorkerHandle>,

  search_input: SearchInput,
  search: SearchDebouncer,
  categories: Vec<CategoryRow>,
  index: MovieIndex,

  focus: FocusRegistry,
  modal: ModalController,
  details: Option<DetailsLoad>,
  announcer: Announcer,

  images: LazyImages,
  broken_posters: HashSet<String>,
  notification: Option<Notification>,

  scroll: usize,
  /// Regions from the last draw
  layout: FrameLayout,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, services: Services, event_tx: mpsc::UnboundedSender<Event>) -> Self {
    let Services {
      transport,
      client,
      worker,
    } = services;

    let worker = worker.map(|link| {
      let WorkerLink {
        handle,
        mut commands,
        lifecycle,
      } = link;
      if lifecycle == Lifecycle::Waiting {
        handle.skip_waiting();
      }
      let tx = event_tx.clone();
      tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
          if tx.send(Event::Worker(command)).is_err() {
            break;
          }
        }
      });
      handle
    });

    let categories = config
      .categories
      .iter()
      .map(|category| {
        let client = client.clone();
        let query_text = category.query.clone();
        let text = query_text.clone();
        CategoryRow {
          title: category.title.clone(),
          query_text,
          query: Query::new(move || {
            let client = client.clone();
            let text = text.clone();
            async move { client.search_movies(&text, 1).await }
          }),
        }
      })
      .collect();

    let images = if config.images.lazy {
      LazyImages::new(config.images.root_margin)
    } else {
      LazyImages::eager()
    };

    let search = SearchDebouncer::new(
      client.clone(),
      event_tx.clone(),
      config.debounce(),
      config.search.min_query_len,
    );

    let mut focus = FocusRegistry::new();
    focus.register(FocusId::SearchInput);
    focus.focus(&FocusId::SearchInput);

    Self {
      config,
      client,
      transport,
      worker,
      search_input: SearchInput::new(),
      search,
      categories,
      index: MovieIndex::new(),
      focus,
      modal: ModalController::new(),
      details: None,
      announcer: Announcer::new(),
      images,
      broken_posters: HashSet::new(),
      notification: None,
      scroll: 0,
      layout: FrameLayout::default(),
      event_tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self, mut events: EventHandler) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    self.start();
    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(DisableMouseCapture)?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      let layout = {
        let app: &App = self;
        let mut layout = FrameLayout::default();
        terminal.draw(|frame| layout = ui::draw(frame, app))?;
        layout
      };
      self.layout = layout;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  /// Kick off the category loads and ask the worker who it is.
  fn start(&mut self) {
    for row in &mut self.categories {
      row.query.fetch();
    }

    if let Some(worker) = self.worker.clone() {
      tokio::spawn(async move {
        match worker.version().await {
          Some(version) => info!("offline worker version {}", version),
          None => warn!("offline worker did not report a version"),
        }
      });
    }
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Mouse(mouse) => self.handle_mouse(mouse),
      Event::Resize => {}
      Event::Tick => self.on_tick(),
      Event::Search(update) => {
        if let Some(outcome) = self.search.handle(update) {
          self.on_search_outcome(outcome);
        }
      }
      Event::Poster { url, ok } => {
        if ok {
          self.images.loaded(&url);
        } else {
          debug!("poster {} failed to load", url);
          self.broken_posters.insert(url.clone());
          self.images.failed(&url);
        }
      }
      Event::Worker(command) => self.handle_worker_command(command),
    }
    self.sync_focus();
  }

  fn on_tick(&mut self) {
    let mut loaded = Vec::new();
    for row in &mut self.categories {
      if row.query.poll() {
        match row.query.state() {
          QueryState::Success(movies) => loaded.extend(movies.iter().cloned()),
          QueryState::Error(e) => warn!("loading {} failed: {}", row.query_text, e),
          _ => {}
        }
      }
    }
    self.track_movies(&loaded);

    if let Some(load) = &mut self.details {
      if load.query.poll() {
        let result = match load.query.state() {
          QueryState::Success(details) => Some(Ok(Arc::clone(details))),
          QueryState::Error(e) => Some(Err(e.clone())),
          _ => None,
        };
        if let Some(result) = result {
          self.modal.settle(&load.id, result, &mut self.focus);
        }
      }
    }

    self.announcer.tick();
    self.sync_focus();
    self.observe_posters();
  }

  fn on_search_outcome(&mut self, outcome: SearchOutcome) {
    if let SearchOutcome::Failed { query, error } = &outcome {
      if error.is_not_found() {
        debug!("no results for \"{}\": {}", query, error);
      } else {
        warn!("search for \"{}\" failed: {}", query, error);
      }
    }
    if let Some(message) = outcome.announcement() {
      self.announcer.announce(message);
    }
    if let Some(movies) = self.search.results().map(|movies| movies.to_vec()) {
      self.track_movies(&movies);
    }
    self.scroll = 0;
  }

  fn handle_worker_command(&mut self, command: ClientCommand) {
    match command {
      ClientCommand::ShowNotification(notification) => {
        info!("notification: {}", notification.title);
        self
          .announcer
          .announce(format!("Notification: {}", notification.title));
        self.notification = Some(notification);
      }
      ClientCommand::OpenMovie(id) => self.open_details(&id),
    }
  }

  /// Index `movies` and register their posters.
  fn track_movies(&mut self, movies: &[Arc<MovieSummary>]) {
    self.index.insert_all(movies);
    for movie in movies {
      if let Some(url) = &movie.poster_url {
        if let Some(src) = self.images.register(url.clone(), url.clone()) {
          self.load_poster(src);
        }
      }
    }
  }

  fn load_poster(&self, src: String) {
    let transport = Arc::clone(&self.transport);
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let ok = match Url::parse(&src) {
        Ok(url) => {
          let request = Request::get(url).with_destination(Destination::Image);
          matches!(transport.fetch(request).await, Ok(response) if response.is_ok())
        }
        Err(_) => false,
      };
      let _ = tx.send(Event::Poster { url: src, ok });
    });
  }

  /// Start loading posters whose rows are on or near the screen.
  fn observe_posters(&mut self) {
    let area = self.layout.content;
    let width = i32::from(area.width.max(1));
    let viewport = Bounds::new(0, self.scroll as i32, width, i32::from(area.height));

    let positions: Vec<(String, Bounds)> = page_lines(self)
      .iter()
      .enumerate()
      .filter_map(|(row, line)| match line {
        PageLine::Card(movie) => movie
          .poster_url
          .clone()
          .filter(|url| !self.broken_posters.contains(url))
          .map(|url| (url, Bounds::new(0, row as i32, width, 1))),
        _ => None,
      })
      .collect();

    let started = self.images.observe(
      viewport,
      positions.iter().map(|(key, bounds)| (key.as_str(), *bounds)),
    );
    for (_, src) in started {
      self.load_poster(src);
    }
  }

  /// Register the cards currently on the page, in page order.
  fn sync_focus(&mut self) {
    let cards: Vec<FocusId> = page_lines(self)
      .iter()
      .filter_map(PageLine::card_id)
      .collect();
    self.focus.replace_cards(cards);
  }

  // ==========================================================================
  // Details dialog
  // ==========================================================================

  fn open_details(&mut self, id: &str) {
    self.modal.open(id, &mut self.focus, &mut self.announcer);
    self.load_details(id.to_string());
  }

  fn load_details(&mut self, id: String) {
    let client = self.client.clone();
    let fetch_id = id.clone();
    let mut query = Query::new(move || {
      let client = client.clone();
      let id = fetch_id.clone();
      async move { client.fetch_details(&id).await }
    });
    query.fetch();
    self.details = Some(DetailsLoad { id, query });
  }

  fn retry_details(&mut self) {
    let Some(id) = self.modal.retry(&mut self.focus) else {
      return;
    };
    match &mut self.details {
      Some(load) if load.id == id => load.query.refetch(),
      _ => self.load_details(id),
    }
  }

  fn close_details(&mut self) {
    self.details = None;
    self.modal.close(&mut self.focus, &mut self.announcer);
    self.scroll_to_focus();
  }

  // ==========================================================================
  // Keys
  // ==========================================================================

  fn handle_key(&mut self, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
      return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    if self.modal.is_open() {
      self.handle_modal_key(key);
      return;
    }

    if self.focus.is_focused(&FocusId::SearchInput) {
      match self.search_input.handle_key(key) {
        KeyResult::Handled => return,
        KeyResult::Event(SearchEvent::Changed(value)) => {
          self.search.input(&value);
          self.scroll = 0;
          return;
        }
        KeyResult::Event(SearchEvent::Submitted) => {
          self.focus_first_result();
          return;
        }
        KeyResult::Event(SearchEvent::Cleared) => {
          self.search.clear();
          return;
        }
        KeyResult::NotHandled => {}
      }
    }

    self.handle_page_key(key);
  }

  fn handle_modal_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => self.close_details(),
      KeyCode::Tab => self.modal.trap_tab(false, &mut self.focus),
      KeyCode::BackTab => self.modal.trap_tab(true, &mut self.focus),
      KeyCode::Enter => match self.focus.focused() {
        Some(FocusId::ModalRetry) => self.retry_details(),
        _ => self.close_details(),
      },
      KeyCode::Char('r') => self.retry_details(),
      _ => {}
    }
  }

  fn handle_page_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Tab => {
        self.focus.cycle(false);
        self.scroll_to_focus();
      }
      KeyCode::BackTab => {
        self.focus.cycle(true);
        self.scroll_to_focus();
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if self.focus.is_focused(&FocusId::SearchInput) {
          self.focus_first_result();
        } else {
          self.focus.cycle(false);
          self.scroll_to_focus();
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.focus.cycle(true);
        self.scroll_to_focus();
      }
      KeyCode::Enter => {
        if let Some(FocusId::Card(id)) = self.focus.focused().cloned() {
          self.open_details(&id);
        }
      }
      KeyCode::Char('/') => {
        self.focus.focus(&FocusId::SearchInput);
      }
      KeyCode::Char('o') => self.click_notification(ACTION_OPEN),
      KeyCode::Char('x') => self.click_notification(ACTION_DISMISS),
      KeyCode::Esc => {
        if self.notification.is_some() {
          self.click_notification(ACTION_DISMISS);
        }
      }
      KeyCode::PageDown => self.scroll_by(self.page_height() as isize),
      KeyCode::PageUp => self.scroll_by(-(self.page_height() as isize)),
      KeyCode::F(5) => match &self.worker {
        Some(worker) => {
          worker.sync(BACKGROUND_SYNC_TAG);
          self.announcer.announce("Cleaning up expired responses");
        }
        None => self.announcer.announce("Offline cache is off"),
      },
      KeyCode::Char('q') => self.should_quit = true,
      _ => {}
    }
  }

  /// Down or Enter from the search input. Only search results qualify; with
  /// none showing, focus stays on the input.
  fn focus_first_result(&mut self) {
    let Some(first) = self.search.results().and_then(|movies| movies.first()) else {
      return;
    };
    let card = FocusId::Card(first.id.clone());
    self.sync_focus();
    if self.focus.focus(&card) {
      self.scroll_to_focus();
    }
  }

  fn click_notification(&mut self, action: &str) {
    let Some(notification) = self.notification.take() else {
      return;
    };
    if let Some(command) = notification.click(action) {
      self.handle_worker_command(command);
    }
  }

  // ==========================================================================
  // Mouse
  // ==========================================================================

  fn handle_mouse(&mut self, mouse: MouseEvent) {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
      MouseEventKind::Down(MouseButton::Left) => {
        if self.modal.is_open() {
          self.click_modal(column, row);
          return;
        }
        if ui::contains(self.layout.search, column, row) {
          self.focus.focus(&FocusId::SearchInput);
          return;
        }
        let clicked = self
          .layout
          .cards
          .iter()
          .find(|(card_row, _)| *card_row == row)
          .map(|(_, id)| id.clone());
        if let Some(FocusId::Card(id)) = clicked {
          self.focus.focus(&FocusId::Card(id.clone()));
          self.open_details(&id);
        }
      }
      MouseEventKind::ScrollDown => self.scroll_by(3),
      MouseEventKind::ScrollUp => self.scroll_by(-3),
      _ => {}
    }
  }

  fn click_modal(&mut self, column: u16, row: u16) {
    let Some(modal) = self.layout.modal else {
      return;
    };
    if ui::contains(modal.close, column, row) {
      self.close_details();
    } else if modal
      .retry
      .is_some_and(|retry| ui::contains(retry, column, row))
    {
      self.retry_details();
    } else if !ui::contains(modal.dialog, column, row) {
      // Backdrop
      self.close_details();
    }
  }

  // ==========================================================================
  // Scrolling
  // ==========================================================================

  fn page_height(&self) -> usize {
    usize::from(self.layout.content.height.max(1))
  }

  fn scroll_by(&mut self, delta: isize) {
    if self.modal.is_scroll_locked() {
      return;
    }
    let max = page_lines(self).len().saturating_sub(1);
    self.scroll = self.scroll.saturating_add_signed(delta).min(max);
  }

  /// Keep the focused card on screen.
  fn scroll_to_focus(&mut self) {
    if self.modal.is_scroll_locked() {
      return;
    }
    let Some(focused @ FocusId::Card(_)) = self.focus.focused().cloned() else {
      return;
    };
    let Some(row) = page_lines(self)
      .iter()
      .position(|line| line.card_id().as_ref() == Some(&focused))
    else {
      return;
    };

    let height = self.page_height();
    if row < self.scroll {
      // Keep the section heading in view when possible
      self.scroll = row.saturating_sub(1);
    } else if row >= self.scroll + height {
      self.scroll = row + 1 - height;
    }
  }

  // ==========================================================================
  // Accessors for UI rendering
  // ==========================================================================

  pub fn title(&self) -> &str {
    self.config.title()
  }

  pub fn search(&self) -> &SearchDebouncer {
    &self.search
  }

  pub fn search_input(&self) -> &SearchInput {
    &self.search_input
  }

  pub fn categories(&self) -> &[CategoryRow] {
    &self.categories
  }

  pub fn index(&self) -> &MovieIndex {
    &self.index
  }

  pub fn images(&self) -> &LazyImages {
    &self.images
  }

  pub fn focus(&self) -> &FocusRegistry {
    &self.focus
  }

  pub fn modal(&self) -> &ModalController {
    &self.modal
  }

  pub fn announcer(&self) -> &Announcer {
    &self.announcer
  }

  pub fn notification(&self) -> Option<&Notification> {
    self.notification.as_ref()
  }

  pub fn scroll(&self) -> usize {
    self.scroll
  }

  pub fn has_worker(&self) -> bool {
    self.worker.is_some()
  }
}
