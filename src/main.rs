mod backend;
mod route;
mod ui;

use backend::api::{self, AnimeCard, AnimeDetail, EpisodePayload, Genre, HomeFeed, PageInfo};
use backend::theme;
use image::DynamicImage;
use route::{PageRequest, ViewRoute};
use ui::ui::{
    App, DetailFocus, GenreContext, HomeFocus, ListFocus, Loadable, ModalState, PlayerSession,
    SearchSlot, View, download_entries, ui,
};

use crossterm::{
    event::{Event, EventStream, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use ratatui_image::protocol::StatefulProtocol;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use std::{error::Error, io};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingKind {
    Ongoing,
    Complete,
    Genre,
}

enum BackgroundTask {
    HomeLoaded {
        feed: Option<HomeFeed>,
    },
    ListingLoaded {
        kind: ListingKind,
        cards: Option<Vec<AnimeCard>>,
        page_info: Option<PageInfo>,
    },
    SearchResults {
        query: String,
        results: Option<Vec<AnimeCard>>,
    },
    GenresLoaded {
        genres: Option<Vec<Genre>>,
    },
    DetailLoaded {
        detail: Option<AnimeDetail>,
    },
    EpisodeLoaded {
        payload: Option<EpisodePayload>,
    },
    PosterLoaded {
        poster_url: String,
        image: DynamicImage,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(theme::load());

    let (task_tx, mut task_rx) = mpsc::unbounded_channel::<BackgroundTask>();

    // Direct navigation: an optional `page?key=value` argument picks the
    // first view. Anything that does not resolve falls back to home.
    let request = std::env::args()
        .nth(1)
        .and_then(|arg| ViewRoute::parse(&arg))
        .and_then(|parsed| route::dispatch(&parsed))
        .unwrap_or(PageRequest::Home);
    open_request(&mut app, request, &task_tx);

    let res = run_app(&mut terminal, &mut app, &mut task_rx, task_tx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err}");
    }
    Ok(())
}

fn spawn_home_loader(tx: mpsc::UnboundedSender<BackgroundTask>) {
    tokio::spawn(async move {
        let feed = api::get_home().await;
        let _ = tx.send(BackgroundTask::HomeLoaded { feed });
    });
}

fn spawn_listing_loader(
    kind: ListingKind,
    slug: Option<String>,
    page: u32,
    tx: mpsc::UnboundedSender<BackgroundTask>,
) {
    tokio::spawn(async move {
        let result = match kind {
            ListingKind::Ongoing => api::get_ongoing(page).await,
            ListingKind::Complete => api::get_complete(page).await,
            ListingKind::Genre => match slug {
                Some(slug) => api::get_genre_anime(&slug, page).await,
                None => None,
            },
        };
        let (cards, page_info) = match result {
            Some((cards, page_info)) => (Some(cards), page_info),
            None => (None, None),
        };
        let _ = tx.send(BackgroundTask::ListingLoaded {
            kind,
            cards,
            page_info,
        });
    });
}

fn spawn_search(query: String, tx: mpsc::UnboundedSender<BackgroundTask>) {
    tokio::spawn(async move {
        let results = api::search_anime(&query).await;
        let _ = tx.send(BackgroundTask::SearchResults { query, results });
    });
}

fn spawn_genres_loader(tx: mpsc::UnboundedSender<BackgroundTask>) {
    tokio::spawn(async move {
        let genres = api::get_genres().await;
        let _ = tx.send(BackgroundTask::GenresLoaded { genres });
    });
}

fn spawn_detail_loader(slug: String, tx: mpsc::UnboundedSender<BackgroundTask>) {
    tokio::spawn(async move {
        let detail = api::get_anime_detail(&slug).await;
        let _ = tx.send(BackgroundTask::DetailLoaded { detail });
    });
}

fn spawn_episode_loader(slug: String, tx: mpsc::UnboundedSender<BackgroundTask>) {
    tokio::spawn(async move {
        let payload = api::get_episode(&slug).await;
        let _ = tx.send(BackgroundTask::EpisodeLoaded { payload });
    });
}

fn spawn_poster(
    poster_url: String,
    pending: &mut HashSet<String>,
    loaded: &HashMap<String, StatefulProtocol>,
    tx: mpsc::UnboundedSender<BackgroundTask>,
) {
    if poster_url.is_empty() || loaded.contains_key(&poster_url) || pending.contains(&poster_url) {
        return;
    }
    pending.insert(poster_url.clone());

    tokio::spawn(async move {
        if let Some(image) = api::fetch_poster(&poster_url).await {
            let _ = tx.send(BackgroundTask::PosterLoaded { poster_url, image });
        }
    });
}

fn spawn_poster_loaders(
    cards: &[AnimeCard],
    start: usize,
    count: usize,
    pending: &mut HashSet<String>,
    loaded: &HashMap<String, StatefulProtocol>,
    tx: mpsc::UnboundedSender<BackgroundTask>,
) {
    for card in cards.iter().skip(start).take(count) {
        spawn_poster(card.poster().to_string(), pending, loaded, tx.clone());
    }
}

/// Runs one page controller: flips the target view's slot to its loading
/// placeholder, opens the view, and issues the single fetch behind it.
fn open_request(app: &mut App, request: PageRequest, tx: &mpsc::UnboundedSender<BackgroundTask>) {
    match request {
        PageRequest::Home => {
            app.home = Loadable::Loading;
            app.home_focus = HomeFocus::Ongoing;
            app.home_ongoing_offset = 0;
            app.home_complete_offset = 0;
            app.open_view(View::Home);
            spawn_home_loader(tx.clone());
        }
        PageRequest::OngoingList { page } => {
            app.ongoing.begin(page);
            app.open_view(View::OngoingList);
            spawn_listing_loader(ListingKind::Ongoing, None, page, tx.clone());
        }
        PageRequest::Complete { page } => {
            app.complete.begin(page);
            app.open_view(View::Complete);
            spawn_listing_loader(ListingKind::Complete, None, page, tx.clone());
        }
        PageRequest::Search => {
            app.open_view(View::Search);
        }
        PageRequest::Genres => {
            app.genres = Loadable::Loading;
            app.genre_cursor = 0;
            app.open_view(View::Genres);
            spawn_genres_loader(tx.clone());
        }
        PageRequest::GenreResult { slug, name, page } => {
            app.genre_ctx = Some(GenreContext {
                slug: slug.clone(),
                name,
            });
            app.genre_results.begin(page);
            app.open_view(View::GenreResult);
            spawn_listing_loader(ListingKind::Genre, Some(slug), page, tx.clone());
        }
        PageRequest::Detail { slug } => {
            app.detail = Loadable::Loading;
            app.detail_focus = DetailFocus::Episodes;
            app.detail_genre_cursor = 0;
            app.episode_list_state.select(None);
            app.open_view(View::Detail);
            spawn_detail_loader(slug, tx.clone());
        }
        PageRequest::Player { slug, title } => {
            app.player = Some(PlayerSession::loading(title));
            app.open_view(View::Player);
            spawn_episode_loader(slug, tx.clone());
        }
    }
}

/// Pagination reload: swaps the page number in place and refetches without
/// touching the navigation stack.
fn reload_listing(app: &mut App, view: View, page: u32, tx: &mpsc::UnboundedSender<BackgroundTask>) {
    match view {
        View::OngoingList => {
            app.ongoing.begin(page);
            app.ongoing.focus = ListFocus::Pager;
            spawn_listing_loader(ListingKind::Ongoing, None, page, tx.clone());
        }
        View::Complete => {
            app.complete.begin(page);
            app.complete.focus = ListFocus::Pager;
            spawn_listing_loader(ListingKind::Complete, None, page, tx.clone());
        }
        View::GenreResult => {
            let slug = app.genre_ctx.as_ref().map(|ctx| ctx.slug.clone());
            app.genre_results.begin(page);
            app.genre_results.focus = ListFocus::Pager;
            spawn_listing_loader(ListingKind::Genre, slug, page, tx.clone());
        }
        _ => {}
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    task_rx: &mut mpsc::UnboundedReceiver<BackgroundTask>,
    task_tx: mpsc::UnboundedSender<BackgroundTask>,
) -> io::Result<()> {
    let mut event_stream = EventStream::new();
    let mut pending_posters: HashSet<String> = HashSet::new();

    const DEBOUNCE_MS: u64 = 500;

    loop {
        terminal.draw(|f| ui(f, app))?;

        // A search fires after 500ms of input inactivity. Debounce only
        // suppresses starting calls; responses already in flight land
        // whenever they land.
        if let Some(debounce_time) = app.search_debounce {
            if debounce_time.elapsed().as_millis() >= DEBOUNCE_MS as u128 {
                app.search_debounce = None;
                if app.search_query.trim().is_empty() {
                    app.search = SearchSlot::Prompt;
                    app.last_search_query.clear();
                } else if !app.searching && app.search_query != app.last_search_query {
                    app.searching = true;
                    app.last_search_query = app.search_query.clone();
                    app.search = SearchSlot::Searching;
                    spawn_search(app.search_query.clone(), task_tx.clone());
                }
            }
        }

        tokio::select! {
            // Timeout to check the debounce timer
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(50)) => {}

            // Keyboard events
            Some(Ok(event)) = event_stream.next() => {
                if let Event::Key(key) = event {
                    if handle_key(app, key.code, &mut pending_posters, &task_tx) {
                        return Ok(());
                    }
                }
            }

            // Background task results
            Some(task) = task_rx.recv() => {
                apply_task(app, task, &mut pending_posters, &task_tx);
            }
        }
    }
}

/// Routes one key press. Returns true when the app should quit.
fn handle_key(
    app: &mut App,
    key: KeyCode,
    pending: &mut HashSet<String>,
    tx: &mpsc::UnboundedSender<BackgroundTask>,
) -> bool {
    let view = app.current_view();

    // the search view owns the keyboard for typing
    if view == View::Search {
        handle_search_input(app, key, pending, tx);
        return false;
    }

    // an open modal captures everything
    if view == View::Player {
        if let Some(session) = app.player.as_mut() {
            if session.modal.is_some() {
                handle_modal_input(session, key);
                return false;
            }
        }
    }

    match key {
        KeyCode::Char('q') => return true,
        KeyCode::Char('d') => {
            app.toggle_theme();
            return false;
        }
        KeyCode::Esc => {
            app.go_back();
            return false;
        }
        _ => {}
    }

    match view {
        View::Home => handle_home_input(app, key, pending, tx),
        View::OngoingList | View::Complete | View::GenreResult => {
            handle_listing_input(app, view, key, pending, tx)
        }
        View::Genres => handle_genres_input(app, key, tx),
        View::Detail => handle_detail_input(app, key, tx),
        View::Player => handle_player_input(app, key),
        View::Search => {}
    }
    false
}

fn handle_home_input(
    app: &mut App,
    key: KeyCode,
    pending: &mut HashSet<String>,
    tx: &mpsc::UnboundedSender<BackgroundTask>,
) {
    match key {
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
            app.home_focus = match app.home_focus {
                HomeFocus::Ongoing => HomeFocus::Complete,
                HomeFocus::Complete => HomeFocus::Ongoing,
            };
        }
        KeyCode::Left => match app.home_focus {
            HomeFocus::Ongoing => {
                app.home_ongoing_offset = app.home_ongoing_offset.saturating_sub(1);
            }
            HomeFocus::Complete => {
                app.home_complete_offset = app.home_complete_offset.saturating_sub(1);
            }
        },
        KeyCode::Right => {
            if let Loadable::Ready(feed) = &app.home {
                match app.home_focus {
                    HomeFocus::Ongoing => {
                        let max_offset = feed.ongoing.len().saturating_sub(1);
                        if app.home_ongoing_offset < max_offset {
                            app.home_ongoing_offset += 1;
                        }
                        spawn_poster_loaders(
                            &feed.ongoing,
                            app.home_ongoing_offset,
                            8,
                            pending,
                            &app.image_states,
                            tx.clone(),
                        );
                    }
                    HomeFocus::Complete => {
                        let max_offset = feed.complete.len().saturating_sub(1);
                        if app.home_complete_offset < max_offset {
                            app.home_complete_offset += 1;
                        }
                        spawn_poster_loaders(
                            &feed.complete,
                            app.home_complete_offset,
                            8,
                            pending,
                            &app.image_states,
                            tx.clone(),
                        );
                    }
                }
            }
        }
        KeyCode::Enter => {
            let selected = match (&app.home, app.home_focus) {
                (Loadable::Ready(feed), HomeFocus::Ongoing) => {
                    feed.ongoing.get(app.home_ongoing_offset)
                }
                (Loadable::Ready(feed), HomeFocus::Complete) => {
                    feed.complete.get(app.home_complete_offset)
                }
                _ => None,
            };
            let slug = selected.map(|card| card.slug().to_string());
            if let Some(slug) = slug {
                open_request(app, PageRequest::Detail { slug }, tx);
            }
        }
        KeyCode::Char('o') => open_request(app, PageRequest::OngoingList { page: 1 }, tx),
        KeyCode::Char('c') => open_request(app, PageRequest::Complete { page: 1 }, tx),
        KeyCode::Char('g') => open_request(app, PageRequest::Genres, tx),
        KeyCode::Char('s') => open_request(app, PageRequest::Search, tx),
        _ => {}
    }
}

fn handle_listing_input(
    app: &mut App,
    view: View,
    key: KeyCode,
    pending: &mut HashSet<String>,
    tx: &mpsc::UnboundedSender<BackgroundTask>,
) {
    match key {
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
            let listing = match view {
                View::OngoingList => &mut app.ongoing,
                View::Complete => &mut app.complete,
                _ => &mut app.genre_results,
            };
            if listing.bar.is_some() {
                listing.focus = match listing.focus {
                    ListFocus::Grid => ListFocus::Pager,
                    ListFocus::Pager => ListFocus::Grid,
                };
            }
        }
        KeyCode::Left => {
            let listing = match view {
                View::OngoingList => &mut app.ongoing,
                View::Complete => &mut app.complete,
                _ => &mut app.genre_results,
            };
            match listing.focus {
                ListFocus::Grid => listing.offset = listing.offset.saturating_sub(1),
                ListFocus::Pager => {
                    if let Some(bar) = &mut listing.bar {
                        bar.select_left();
                    }
                }
            }
        }
        KeyCode::Right => {
            let listing = match view {
                View::OngoingList => &mut app.ongoing,
                View::Complete => &mut app.complete,
                _ => &mut app.genre_results,
            };
            match listing.focus {
                ListFocus::Grid => {
                    let max_offset = listing.ready_cards().len().saturating_sub(1);
                    if listing.offset < max_offset {
                        listing.offset += 1;
                    }
                    let start = listing.offset;
                    spawn_poster_loaders(
                        listing.ready_cards(),
                        start,
                        8,
                        pending,
                        &app.image_states,
                        tx.clone(),
                    );
                }
                ListFocus::Pager => {
                    if let Some(bar) = &mut listing.bar {
                        bar.select_right();
                    }
                }
            }
        }
        KeyCode::Enter => {
            enum Activation {
                Open(String),
                Jump(u32),
            }

            let activation = {
                let listing = match view {
                    View::OngoingList => &app.ongoing,
                    View::Complete => &app.complete,
                    _ => &app.genre_results,
                };
                match listing.focus {
                    ListFocus::Grid => listing
                        .ready_cards()
                        .get(listing.offset)
                        .map(|card| Activation::Open(card.slug().to_string())),
                    // the host blocks activation of disabled prev/next;
                    // their targets stay attached regardless
                    ListFocus::Pager => listing.bar.as_ref().and_then(|bar| {
                        let control = bar.selected_control();
                        if control.enabled {
                            control.target.map(Activation::Jump)
                        } else {
                            None
                        }
                    }),
                }
            };

            match activation {
                Some(Activation::Open(slug)) => {
                    open_request(app, PageRequest::Detail { slug }, tx);
                }
                Some(Activation::Jump(page)) => reload_listing(app, view, page, tx),
                None => {}
            }
        }
        _ => {}
    }
}

fn handle_search_input(
    app: &mut App,
    key: KeyCode,
    pending: &mut HashSet<String>,
    tx: &mpsc::UnboundedSender<BackgroundTask>,
) {
    match key {
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.search_debounce = Some(Instant::now());
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            if app.search_query.is_empty() {
                app.search = SearchSlot::Prompt;
                app.last_search_query.clear();
                app.search_debounce = None;
            } else {
                app.search_debounce = Some(Instant::now());
            }
        }
        KeyCode::Enter => {
            let selected = match &app.search {
                SearchSlot::Ready(results) => results
                    .get(app.search_offset)
                    .map(|card| card.slug().to_string()),
                _ => None,
            };
            if let Some(slug) = selected {
                open_request(app, PageRequest::Detail { slug }, tx);
            } else if !app.search_query.trim().is_empty() && !app.searching {
                // immediate search bypasses the debounce
                app.searching = true;
                app.last_search_query = app.search_query.clone();
                app.search_debounce = None;
                app.search = SearchSlot::Searching;
                spawn_search(app.search_query.clone(), tx.clone());
            }
        }
        KeyCode::Left => {
            app.search_offset = app.search_offset.saturating_sub(1);
        }
        KeyCode::Right => {
            if let SearchSlot::Ready(results) = &app.search {
                let max_offset = results.len().saturating_sub(1);
                if app.search_offset < max_offset {
                    app.search_offset += 1;
                }
                spawn_poster_loaders(
                    results,
                    app.search_offset,
                    8,
                    pending,
                    &app.image_states,
                    tx.clone(),
                );
            }
        }
        KeyCode::Esc => app.go_back(),
        _ => {}
    }
}

fn handle_genres_input(app: &mut App, key: KeyCode, tx: &mpsc::UnboundedSender<BackgroundTask>) {
    match key {
        KeyCode::Up => app.genre_cursor = app.genre_cursor.saturating_sub(1),
        KeyCode::Down => {
            if let Loadable::Ready(genres) = &app.genres {
                if app.genre_cursor + 1 < genres.len() {
                    app.genre_cursor += 1;
                }
            }
        }
        KeyCode::Enter => {
            let request = match &app.genres {
                Loadable::Ready(genres) => genres.get(app.genre_cursor).map(|genre| {
                    PageRequest::GenreResult {
                        slug: genre.slug.clone(),
                        name: genre.name.clone(),
                        page: 1,
                    }
                }),
                _ => None,
            };
            if let Some(request) = request {
                open_request(app, request, tx);
            }
        }
        _ => {}
    }
}

fn handle_detail_input(app: &mut App, key: KeyCode, tx: &mpsc::UnboundedSender<BackgroundTask>) {
    match key {
        KeyCode::Tab => {
            app.detail_focus = match app.detail_focus {
                DetailFocus::Episodes => DetailFocus::Genres,
                DetailFocus::Genres => DetailFocus::Episodes,
            };
        }
        KeyCode::Up => {
            if app.detail_focus == DetailFocus::Episodes {
                let selected = app.episode_list_state.selected().unwrap_or(0);
                if selected > 0 {
                    app.episode_list_state.select(Some(selected - 1));
                }
            }
        }
        KeyCode::Down => {
            if app.detail_focus == DetailFocus::Episodes {
                if let Loadable::Ready(detail) = &app.detail {
                    let selected = app.episode_list_state.selected().unwrap_or(0);
                    if selected + 1 < detail.episode_lists.len() {
                        app.episode_list_state.select(Some(selected + 1));
                    }
                }
            }
        }
        KeyCode::Left => {
            if app.detail_focus == DetailFocus::Genres {
                app.detail_genre_cursor = app.detail_genre_cursor.saturating_sub(1);
            }
        }
        KeyCode::Right => {
            if app.detail_focus == DetailFocus::Genres {
                if let Loadable::Ready(detail) = &app.detail {
                    if app.detail_genre_cursor + 1 < detail.genres.len() {
                        app.detail_genre_cursor += 1;
                    }
                }
            }
        }
        KeyCode::Enter => {
            let request = match (&app.detail, app.detail_focus) {
                (Loadable::Ready(detail), DetailFocus::Episodes) => app
                    .episode_list_state
                    .selected()
                    .and_then(|idx| detail.episode_lists.get(idx))
                    .map(|ep| PageRequest::Player {
                        slug: ep.slug.clone(),
                        title: format!("{} - {}", detail.title, ep.episode),
                    }),
                (Loadable::Ready(detail), DetailFocus::Genres) => {
                    detail.genres.get(app.detail_genre_cursor).map(|genre| {
                        PageRequest::GenreResult {
                            slug: genre.slug.clone(),
                            name: genre.name.clone(),
                            page: 1,
                        }
                    })
                }
                _ => None,
            };
            if let Some(request) = request {
                open_request(app, request, tx);
            }
        }
        _ => {}
    }
}

fn handle_player_input(app: &mut App, key: KeyCode) {
    let Some(session) = app.player.as_mut() else {
        return;
    };

    match key {
        KeyCode::Up => session.quality_cursor = session.quality_cursor.saturating_sub(1),
        KeyCode::Down => {
            if session.quality_cursor + 1 < session.qualities.len() {
                session.quality_cursor += 1;
            }
        }
        KeyCode::Enter => {
            if let (Some(payload), Some(quality)) = (session.payload(), session.selected_quality())
            {
                if let Some(url) = payload.stream_url(quality) {
                    if let Err(err) = webbrowser::open(&url) {
                        log::error!("failed to hand stream to the system player: {err}");
                    }
                }
            }
        }
        KeyCode::Char('l') => {
            if session.payload().is_some() {
                session.modal = Some(ModalState::default());
            }
        }
        _ => {}
    }
}

fn handle_modal_input(session: &mut PlayerSession, key: KeyCode) {
    let entries = session
        .payload()
        .map(|payload| download_entries(&payload.download_urls))
        .unwrap_or_default();

    match key {
        KeyCode::Esc => session.modal = None,
        KeyCode::Up => {
            if let Some(modal) = session.modal.as_mut() {
                modal.cursor = modal.cursor.saturating_sub(1);
            }
        }
        KeyCode::Down => {
            if let Some(modal) = session.modal.as_mut() {
                if modal.cursor + 1 < entries.len() {
                    modal.cursor += 1;
                }
            }
        }
        KeyCode::Enter => {
            if let Some(modal) = session.modal.as_ref() {
                if let Some(entry) = entries.get(modal.cursor) {
                    if let Err(err) = webbrowser::open(&entry.url) {
                        log::error!("failed to open download link: {err}");
                    }
                }
            }
        }
        _ => {}
    }
}

fn apply_task(
    app: &mut App,
    task: BackgroundTask,
    pending: &mut HashSet<String>,
    tx: &mpsc::UnboundedSender<BackgroundTask>,
) {
    match task {
        BackgroundTask::HomeLoaded { feed } => match feed {
            None => app.home = Loadable::Failed,
            Some(feed) if feed.ongoing.is_empty() && feed.complete.is_empty() => {
                app.home = Loadable::Empty;
            }
            Some(feed) => {
                spawn_poster_loaders(&feed.ongoing, 0, 6, pending, &app.image_states, tx.clone());
                spawn_poster_loaders(&feed.complete, 0, 6, pending, &app.image_states, tx.clone());
                app.home = Loadable::Ready(feed);
            }
        },
        BackgroundTask::ListingLoaded {
            kind,
            cards,
            page_info,
        } => {
            if let Some(cards) = &cards {
                spawn_poster_loaders(cards, 0, 8, pending, &app.image_states, tx.clone());
            }
            let listing = match kind {
                ListingKind::Ongoing => &mut app.ongoing,
                ListingKind::Complete => &mut app.complete,
                ListingKind::Genre => &mut app.genre_results,
            };
            listing.apply(cards, page_info);
        }
        BackgroundTask::SearchResults { query, results } => {
            app.searching = false;
            app.search_offset = 0;
            app.search = SearchSlot::from_results(query, results);
            if let SearchSlot::Ready(results) = &app.search {
                spawn_poster_loaders(results, 0, 6, pending, &app.image_states, tx.clone());
            }
        }
        BackgroundTask::GenresLoaded { genres } => {
            app.genres = match genres {
                None => Loadable::Failed,
                Some(list) if list.is_empty() => Loadable::Empty,
                Some(list) => Loadable::Ready(list),
            };
        }
        BackgroundTask::DetailLoaded { detail } => match detail {
            None => app.detail = Loadable::Failed,
            Some(detail) => {
                spawn_poster(detail.poster.clone(), pending, &app.image_states, tx.clone());
                if !detail.episode_lists.is_empty() {
                    app.episode_list_state.select(Some(0));
                }
                app.detail = Loadable::Ready(detail);
            }
        },
        BackgroundTask::EpisodeLoaded { payload } => {
            if let Some(session) = app.player.as_mut() {
                session.apply(payload);
            }
        }
        BackgroundTask::PosterLoaded { poster_url, image } => {
            app.add_poster_image(&poster_url, image);
            pending.remove(&poster_url);
        }
    }
}
