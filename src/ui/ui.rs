use image::DynamicImage;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use ratatui_image::{Resize, StatefulImage, picker::Picker, protocol::StatefulProtocol};
use std::collections::HashMap;
use std::time::Instant;

use crate::backend::api::{
    AnimeCard, AnimeDetail, DownloadUrls, EpisodePayload, Genre, HomeFeed, PageInfo,
};
use crate::ui::pagination::{ControlKind, PaginationBar};

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    OngoingList,
    Complete,
    Search,
    Genres,
    GenreResult,
    Detail,
    Player,
}

/// Lifecycle of a view's data slot. Every controller moves its slot to
/// `Loading` before the fetch and replaces it with exactly one of the
/// other states when the result arrives. `Empty` and `Failed` render
/// distinct placeholders.
#[derive(Debug, Clone)]
pub enum Loadable<T> {
    Loading,
    Ready(T),
    Empty,
    Failed,
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Loading
    }
}

/// The search view adds a prompt state: an empty or whitespace-only query
/// is an invitation to type, not a failed search.
#[derive(Debug, Clone, Default)]
pub enum SearchSlot {
    #[default]
    Prompt,
    Searching,
    Ready(Vec<AnimeCard>),
    NoResults {
        query: String,
    },
    Failed,
}

impl SearchSlot {
    /// Maps a finished search onto its slot state: a failed fetch and an
    /// empty result list get different placeholders.
    pub fn from_results(query: String, results: Option<Vec<AnimeCard>>) -> Self {
        match results {
            None => SearchSlot::Failed,
            Some(results) if results.is_empty() => SearchSlot::NoResults { query },
            Some(results) => SearchSlot::Ready(results),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFocus {
    #[default]
    Grid,
    Pager,
}

/// State of one paginated listing view: the card slot, the pager built
/// from the listing's pagination block, and the grid cursor.
#[derive(Debug, Default)]
pub struct ListingView {
    pub cards: Loadable<Vec<AnimeCard>>,
    pub bar: Option<PaginationBar>,
    pub page: u32,
    pub offset: usize,
    pub focus: ListFocus,
}

impl ListingView {
    pub fn begin(&mut self, page: u32) {
        self.cards = Loadable::Loading;
        self.bar = None;
        self.page = page;
        self.offset = 0;
        self.focus = ListFocus::Grid;
    }

    pub fn apply(&mut self, cards: Option<Vec<AnimeCard>>, info: Option<PageInfo>) {
        match cards {
            None => {
                self.cards = Loadable::Failed;
                self.bar = None;
            }
            Some(list) if list.is_empty() => {
                self.cards = Loadable::Empty;
                self.bar = None;
            }
            Some(list) => {
                self.cards = Loadable::Ready(list);
                self.bar = info.as_ref().and_then(PaginationBar::build);
            }
        }
    }

    pub fn ready_cards(&self) -> &[AnimeCard] {
        match &self.cards {
            Loadable::Ready(cards) => cards,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenreContext {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomeFocus {
    #[default]
    Ongoing,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailFocus {
    #[default]
    Episodes,
    Genres,
}

#[derive(Debug, Default)]
pub struct ModalState {
    pub cursor: usize,
}

/// Everything the player view needs for its lifetime, episode payload
/// included, so the download modal opens from this session without a
/// second fetch.
#[derive(Debug)]
pub struct PlayerSession {
    pub title: String,
    pub episode: Loadable<EpisodePayload>,
    pub qualities: Vec<u32>,
    pub quality_cursor: usize,
    pub modal: Option<ModalState>,
}

impl PlayerSession {
    pub fn loading(title: String) -> Self {
        PlayerSession {
            title,
            episode: Loadable::Loading,
            qualities: Vec::new(),
            quality_cursor: 0,
            modal: None,
        }
    }

    pub fn apply(&mut self, payload: Option<EpisodePayload>) {
        match payload {
            Some(payload) if !payload.stream_list.is_empty() => {
                // highest first, so the cursor starts on the numeric maximum
                self.qualities = payload.qualities();
                self.quality_cursor = 0;
                self.episode = Loadable::Ready(payload);
            }
            _ => self.episode = Loadable::Failed,
        }
    }

    pub fn payload(&self) -> Option<&EpisodePayload> {
        match &self.episode {
            Loadable::Ready(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn selected_quality(&self) -> Option<u32> {
        self.qualities.get(self.quality_cursor).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadEntry {
    pub format: &'static str,
    pub resolution: String,
    pub provider: String,
    pub url: String,
}

/// Flattens the download map into modal rows, MP4 sections before MKV,
/// in upstream order.
pub fn download_entries(urls: &DownloadUrls) -> Vec<DownloadEntry> {
    let mut entries = Vec::new();
    for (format, groups) in [("MP4", &urls.mp4), ("MKV", &urls.mkv)] {
        for group in groups {
            for link in &group.urls {
                entries.push(DownloadEntry {
                    format,
                    resolution: group.resolution.clone(),
                    provider: link.provider.clone(),
                    url: link.url.clone(),
                });
            }
        }
    }
    entries
}

pub struct Palette {
    pub frame: Color,
    pub text: Color,
    pub dim: Color,
    pub accent: Color,
    pub active: Color,
    pub badge: Color,
    pub disabled: Color,
}

const DARK: Palette = Palette {
    frame: Color::Cyan,
    text: Color::White,
    dim: Color::DarkGray,
    accent: Color::Yellow,
    active: Color::Magenta,
    badge: Color::LightGreen,
    disabled: Color::DarkGray,
};

const LIGHT: Palette = Palette {
    frame: Color::Blue,
    text: Color::Black,
    dim: Color::Gray,
    accent: Color::Magenta,
    active: Color::Blue,
    badge: Color::Green,
    disabled: Color::Gray,
};

pub fn palette(dark: bool) -> &'static Palette {
    if dark { &DARK } else { &LIGHT }
}

pub struct App {
    pub dark_mode: bool,
    view_stack: Vec<View>,
    pub picker: Option<Picker>,
    pub image_states: HashMap<String, StatefulProtocol>,

    pub home: Loadable<HomeFeed>,
    pub home_focus: HomeFocus,
    pub home_ongoing_offset: usize,
    pub home_complete_offset: usize,

    pub ongoing: ListingView,
    pub complete: ListingView,
    pub genre_results: ListingView,
    pub genre_ctx: Option<GenreContext>,

    pub genres: Loadable<Vec<Genre>>,
    pub genre_cursor: usize,

    pub search_query: String,
    pub last_search_query: String,
    pub searching: bool,
    pub search_debounce: Option<Instant>,
    pub search: SearchSlot,
    pub search_offset: usize,

    pub detail: Loadable<AnimeDetail>,
    pub detail_focus: DetailFocus,
    pub detail_genre_cursor: usize,
    pub episode_list_state: ListState,

    pub player: Option<PlayerSession>,
}

impl App {
    pub fn new(dark_mode: bool) -> Self {
        let picker = Picker::from_query_stdio().ok();

        Self {
            dark_mode,
            view_stack: vec![View::Home],
            picker,
            image_states: HashMap::new(),
            home: Loadable::Loading,
            home_focus: HomeFocus::Ongoing,
            home_ongoing_offset: 0,
            home_complete_offset: 0,
            ongoing: ListingView::default(),
            complete: ListingView::default(),
            genre_results: ListingView::default(),
            genre_ctx: None,
            genres: Loadable::Loading,
            genre_cursor: 0,
            search_query: String::new(),
            last_search_query: String::new(),
            searching: false,
            search_debounce: None,
            search: SearchSlot::Prompt,
            search_offset: 0,
            detail: Loadable::Loading,
            detail_focus: DetailFocus::Episodes,
            detail_genre_cursor: 0,
            episode_list_state: ListState::default(),
            player: None,
        }
    }

    pub fn current_view(&self) -> View {
        *self.view_stack.last().unwrap_or(&View::Home)
    }

    pub fn open_view(&mut self, view: View) {
        if self.current_view() != view {
            self.view_stack.push(view);
        }
    }

    pub fn go_back(&mut self) {
        if self.view_stack.len() > 1 {
            self.view_stack.pop();
        }
    }

    pub fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
        crate::backend::theme::store(self.dark_mode);
    }

    pub fn add_poster_image(&mut self, poster_url: &str, image: DynamicImage) {
        if let Some(ref picker) = self.picker {
            let protocol = picker.new_resize_protocol(image);
            self.image_states.insert(poster_url.to_string(), protocol);
        }
    }
}

const CARD_WIDTH: u16 = 30;

pub fn ui(f: &mut Frame, app: &mut App) {
    let pal = palette(app.dark_mode);
    let area = f.area();

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(10),   // content
            Constraint::Length(3), // footer
        ])
        .split(area);

    draw_header(f, root[0], app, pal);

    match app.current_view() {
        View::Home => draw_home(f, root[1], app, pal),
        View::OngoingList => draw_ongoing_list(f, root[1], app, pal),
        View::Complete => draw_complete_list(f, root[1], app, pal),
        View::Search => draw_search(f, root[1], app, pal),
        View::Genres => draw_genres(f, root[1], app, pal),
        View::GenreResult => draw_genre_results(f, root[1], app, pal),
        View::Detail => draw_detail(f, root[1], app, pal),
        View::Player => draw_player(f, root[1], app, pal),
    }

    draw_footer(f, root[2], app.current_view(), pal);

    if app.current_view() == View::Player {
        if let Some(session) = &app.player {
            if session.modal.is_some() {
                draw_download_modal(f, area, session, pal);
            }
        }
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App, pal: &Palette) {
    let mode_icon = if app.dark_mode { "☾" } else { "☀" };

    match app.current_view() {
        View::Home | View::OngoingList | View::Complete | View::Search | View::Genres => {
            let titles = vec!["Home", "Ongoing", "Complete", "Search", "Genres"];
            let selected = match app.current_view() {
                View::Home => 0,
                View::OngoingList => 1,
                View::Complete => 2,
                View::Search => 3,
                _ => 4,
            };

            let tabs = Tabs::new(titles)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("KitaNime {mode_icon}"))
                        .border_style(Style::default().fg(pal.frame)),
                )
                .select(selected)
                .style(Style::default().fg(pal.dim))
                .highlight_style(Style::default().fg(pal.accent).add_modifier(Modifier::BOLD));

            f.render_widget(tabs, area);
        }
        View::GenreResult => {
            let name = app
                .genre_ctx
                .as_ref()
                .map(|ctx| ctx.name.clone())
                .unwrap_or_else(|| "Genre".to_string());
            draw_title_bar(f, area, &name, mode_icon, pal);
        }
        View::Detail => {
            let title = match &app.detail {
                Loadable::Ready(detail) => detail.title.clone(),
                _ => "Anime Detail".to_string(),
            };
            draw_title_bar(f, area, &title, mode_icon, pal);
        }
        View::Player => {
            let title = app
                .player
                .as_ref()
                .map(|session| session.title.clone())
                .unwrap_or_else(|| "Player".to_string());
            draw_title_bar(f, area, &title, mode_icon, pal);
        }
    }
}

fn draw_title_bar(f: &mut Frame, area: Rect, title: &str, mode_icon: &str, pal: &Palette) {
    let text = truncate_text(title, area.width.saturating_sub(4) as usize);
    let bar = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default().fg(pal.text).add_modifier(Modifier::BOLD),
    )]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("KitaNime {mode_icon}"))
            .border_style(Style::default().fg(pal.frame)),
    )
    .alignment(Alignment::Center);
    f.render_widget(bar, area);
}

fn draw_notice(f: &mut Frame, area: Rect, text: &str, pal: &Palette) {
    let notice = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(pal.dim));
    f.render_widget(notice, area);
}

fn draw_home(f: &mut Frame, area: Rect, app: &mut App, pal: &Palette) {
    match &app.home {
        Loadable::Loading => draw_notice(f, area, "Loading anime...", pal),
        Loadable::Failed => draw_notice(f, area, "Failed to load anime.", pal),
        Loadable::Empty => draw_notice(f, area, "No anime available", pal),
        Loadable::Ready(feed) => {
            let sections = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area);

            draw_card_section(
                f,
                sections[0],
                "Ongoing",
                &feed.ongoing,
                &mut app.home_ongoing_offset,
                app.home_focus == HomeFocus::Ongoing,
                &mut app.image_states,
                pal,
            );
            draw_card_section(
                f,
                sections[1],
                "Complete",
                &feed.complete,
                &mut app.home_complete_offset,
                app.home_focus == HomeFocus::Complete,
                &mut app.image_states,
                pal,
            );
        }
    }
}

fn draw_ongoing_list(f: &mut Frame, area: Rect, app: &mut App, pal: &Palette) {
    draw_listing(
        f,
        area,
        "Ongoing Anime",
        "Failed to load ongoing anime.",
        "No ongoing anime found.",
        &mut app.ongoing,
        &mut app.image_states,
        pal,
    );
}

fn draw_complete_list(f: &mut Frame, area: Rect, app: &mut App, pal: &Palette) {
    draw_listing(
        f,
        area,
        "Complete Anime",
        "Failed to load complete anime.",
        "No complete anime found.",
        &mut app.complete,
        &mut app.image_states,
        pal,
    );
}

fn draw_genre_results(f: &mut Frame, area: Rect, app: &mut App, pal: &Palette) {
    draw_listing(
        f,
        area,
        "Results",
        "Failed to load anime.",
        "No anime found in this genre.",
        &mut app.genre_results,
        &mut app.image_states,
        pal,
    );
}

fn draw_listing(
    f: &mut Frame,
    area: Rect,
    title: &str,
    failed_text: &str,
    empty_text: &str,
    listing: &mut ListingView,
    image_states: &mut HashMap<String, StatefulProtocol>,
    pal: &Palette,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(area);

    let title = if listing.page > 1 {
        format!("{title} (page {})", listing.page)
    } else {
        title.to_string()
    };

    match &listing.cards {
        Loadable::Loading => draw_notice(f, rows[0], "Loading...", pal),
        Loadable::Failed => draw_notice(f, rows[0], failed_text, pal),
        Loadable::Empty => draw_notice(f, rows[0], empty_text, pal),
        Loadable::Ready(cards) => {
            draw_card_section(
                f,
                rows[0],
                &title,
                cards,
                &mut listing.offset,
                listing.focus == ListFocus::Grid,
                image_states,
                pal,
            );
        }
    }

    if let Some(bar) = &listing.bar {
        let focused = listing.focus == ListFocus::Pager;
        let line = pagination_line(bar, focused, pal);
        let pager = Paragraph::new(line).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if focused { pal.accent } else { pal.frame })),
        );
        f.render_widget(pager, rows[1]);
    }
}

fn pagination_line(bar: &PaginationBar, focused: bool, pal: &Palette) -> Line<'static> {
    let mut spans = Vec::new();

    for (idx, control) in bar.controls().iter().enumerate() {
        let label = match control.kind {
            ControlKind::Previous => "« Prev".to_string(),
            ControlKind::Next => "Next »".to_string(),
            ControlKind::Page(page) => page.to_string(),
            ControlKind::Gap => "...".to_string(),
        };

        let mut style = match control.kind {
            ControlKind::Gap => Style::default().fg(pal.dim),
            _ if control.active => Style::default().fg(pal.active).add_modifier(Modifier::BOLD),
            _ if !control.enabled => Style::default().fg(pal.disabled),
            _ => Style::default().fg(pal.text),
        };
        if focused && idx == bar.selected_index() {
            style = style.add_modifier(Modifier::REVERSED);
        }

        spans.push(Span::styled(format!(" {label} "), style));
    }

    Line::from(spans)
}

fn draw_search(f: &mut Frame, area: Rect, app: &mut App, pal: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8)])
        .split(area);

    let input = Paragraph::new(Line::from(vec![
        Span::styled(app.search_query.clone(), Style::default().fg(pal.text)),
        Span::styled("▏", Style::default().fg(pal.accent)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search")
            .border_style(Style::default().fg(pal.accent)),
    );
    f.render_widget(input, rows[0]);

    match &app.search {
        SearchSlot::Prompt => draw_notice(f, rows[1], "Enter a query to search.", pal),
        SearchSlot::Searching => draw_notice(
            f,
            rows[1],
            &format!("Searching for \"{}\"...", app.search_query),
            pal,
        ),
        SearchSlot::NoResults { query } => draw_notice(
            f,
            rows[1],
            &format!("No results found for \"{query}\"."),
            pal,
        ),
        SearchSlot::Failed => draw_notice(f, rows[1], "Search failed.", pal),
        SearchSlot::Ready(results) => {
            draw_card_section(
                f,
                rows[1],
                "Results",
                results,
                &mut app.search_offset,
                true,
                &mut app.image_states,
                pal,
            );
        }
    }
}

fn draw_genres(f: &mut Frame, area: Rect, app: &mut App, pal: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Genres")
        .border_style(Style::default().fg(pal.frame));
    let inner = block.inner(area);
    f.render_widget(block, area);

    match &app.genres {
        Loadable::Loading => draw_notice(f, inner, "Loading genres...", pal),
        Loadable::Failed => draw_notice(f, inner, "Failed to load genres.", pal),
        Loadable::Empty => draw_notice(f, inner, "No genres available.", pal),
        Loadable::Ready(genres) => {
            let items: Vec<ListItem> = genres
                .iter()
                .map(|genre| ListItem::new(genre.name.clone()))
                .collect();
            let list = List::new(items)
                .style(Style::default().fg(pal.text))
                .highlight_style(
                    Style::default()
                        .fg(pal.accent)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                )
                .highlight_symbol("▸ ");

            let mut state = ListState::default();
            state.select(Some(app.genre_cursor.min(genres.len().saturating_sub(1))));
            f.render_stateful_widget(list, inner, &mut state);
        }
    }
}

fn draw_detail(f: &mut Frame, area: Rect, app: &mut App, pal: &Palette) {
    match &app.detail {
        Loadable::Loading => draw_notice(f, area, "Loading details...", pal),
        Loadable::Failed | Loadable::Empty => draw_notice(f, area, "Failed to load details.", pal),
        Loadable::Ready(detail) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(9),      // poster + meta
                    Constraint::Length(2),      // genres
                    Constraint::Min(4),         // synopsis
                    Constraint::Percentage(40), // episodes
                ])
                .split(area);

            let top = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(22), Constraint::Min(20)])
                .split(rows[0]);

            if let Some(state) = app.image_states.get_mut(&detail.poster) {
                let poster = StatefulImage::new().resize(Resize::Scale(None));
                f.render_stateful_widget(poster, top[0], state);
            } else {
                draw_notice(f, top[0], "Loading...", pal);
            }

            let meta_lines = vec![
                Line::from(Span::styled(
                    detail.title.clone(),
                    Style::default().fg(pal.text).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                meta_line("Rating", &rating_label(&detail.rating), pal),
                meta_line("Status", &detail.status, pal),
                meta_line("Total Eps", &detail.episode_count, pal),
                meta_line("Duration", &detail.duration, pal),
                meta_line("Studio", &detail.studio, pal),
                meta_line("Released", &detail.release_date, pal),
            ];
            f.render_widget(Paragraph::new(meta_lines), top[1]);

            let genre_spans = genre_line(
                &detail.genres,
                app.detail_focus == DetailFocus::Genres,
                app.detail_genre_cursor,
                pal,
            );
            f.render_widget(Paragraph::new(genre_spans), rows[1]);

            let synopsis = if detail.synopsis.is_empty() {
                "No synopsis available.".to_string()
            } else {
                detail.synopsis.clone()
            };
            let synopsis = Paragraph::new(synopsis)
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(pal.dim))
                .block(
                    Block::default()
                        .borders(Borders::TOP)
                        .title("Synopsis")
                        .border_style(Style::default().fg(pal.frame)),
                );
            f.render_widget(synopsis, rows[2]);

            let items: Vec<ListItem> = detail
                .episode_lists
                .iter()
                .map(|ep| ListItem::new(ep.episode.clone()))
                .collect();
            let focused = app.detail_focus == DetailFocus::Episodes;
            let list = List::new(items)
                .style(Style::default().fg(pal.text))
                .highlight_style(if focused {
                    Style::default()
                        .fg(pal.accent)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(pal.accent)
                })
                .highlight_symbol("▸ ")
                .block(
                    Block::default()
                        .borders(Borders::TOP)
                        .title("Episodes")
                        .border_style(Style::default().fg(pal.frame)),
                );
            f.render_stateful_widget(list, rows[3], &mut app.episode_list_state);
        }
    }
}

fn meta_line(label: &str, value: &str, pal: &Palette) -> Line<'static> {
    let value = if value.is_empty() { "?" } else { value };
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(pal.dim)),
        Span::styled(value.to_string(), Style::default().fg(pal.text)),
    ])
}

fn genre_line(genres: &[Genre], focused: bool, cursor: usize, pal: &Palette) -> Line<'static> {
    let mut spans = vec![Span::styled("Genres: ", Style::default().fg(pal.dim))];
    for (idx, genre) in genres.iter().enumerate() {
        let mut style = Style::default().fg(pal.badge);
        if focused && idx == cursor {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }
        spans.push(Span::styled(format!(" {} ", genre.name), style));
    }
    Line::from(spans)
}

fn draw_player(f: &mut Frame, area: Rect, app: &mut App, pal: &Palette) {
    let Some(session) = &app.player else {
        draw_notice(f, area, "Loading player...", pal);
        return;
    };

    match &session.episode {
        Loadable::Loading => draw_notice(f, area, "Loading player...", pal),
        Loadable::Failed | Loadable::Empty => draw_notice(f, area, "Failed to load stream.", pal),
        Loadable::Ready(_) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(2), Constraint::Min(4)])
                .split(area);

            let hint = Paragraph::new("Playback is handed to your system player.")
                .style(Style::default().fg(pal.dim))
                .alignment(Alignment::Center);
            f.render_widget(hint, rows[0]);

            let items: Vec<ListItem> = session
                .qualities
                .iter()
                .map(|quality| ListItem::new(format!("{quality}p")))
                .collect();
            let list = List::new(items)
                .style(Style::default().fg(pal.text))
                .highlight_style(
                    Style::default()
                        .fg(pal.accent)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                )
                .highlight_symbol("▸ ")
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Stream Quality")
                        .border_style(Style::default().fg(pal.frame)),
                );

            let mut state = ListState::default();
            state.select(Some(session.quality_cursor));
            f.render_stateful_widget(list, rows[1], &mut state);
        }
    }
}

fn draw_download_modal(f: &mut Frame, area: Rect, session: &PlayerSession, pal: &Palette) {
    let popup = centered_rect(70, 60, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(truncate_text(
            &session.title,
            popup.width.saturating_sub(4) as usize,
        ))
        .border_style(Style::default().fg(pal.accent));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let entries = session
        .payload()
        .map(|payload| download_entries(&payload.download_urls))
        .unwrap_or_default();

    if entries.is_empty() {
        draw_notice(f, inner, "No download links available.", pal);
        return;
    }

    let cursor = session
        .modal
        .as_ref()
        .map(|modal| modal.cursor.min(entries.len() - 1))
        .unwrap_or(0);

    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<4}", entry.format),
                    Style::default().fg(pal.badge),
                ),
                Span::styled(
                    format!("{:<6}", entry.resolution),
                    Style::default().fg(pal.text),
                ),
                Span::styled(entry.provider.clone(), Style::default().fg(pal.accent)),
            ]))
        })
        .collect();
    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▸ ");

    let mut state = ListState::default();
    state.select(Some(cursor));
    f.render_stateful_widget(list, inner, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn draw_card_section(
    f: &mut Frame,
    area: Rect,
    title: &str,
    cards: &[AnimeCard],
    offset: &mut usize,
    focused: bool,
    image_states: &mut HashMap<String, StatefulProtocol>,
    pal: &Palette,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(if focused {
            Style::default().fg(pal.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(pal.frame)
        });

    let inner = block.inner(area);
    f.render_widget(block, area);

    if cards.is_empty() {
        draw_notice(f, inner, "No anime available", pal);
        return;
    }

    let max_offset = cards.len().saturating_sub(1);
    if *offset > max_offset {
        *offset = max_offset;
    }

    let available_width = inner.width as usize;
    let cards_visible = (available_width / CARD_WIDTH as usize).max(1);

    let card_constraints: Vec<Constraint> = (0..cards_visible)
        .map(|_| Constraint::Length(CARD_WIDTH))
        .collect();

    let card_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(card_constraints)
        .split(inner);

    for (i, card_area) in card_areas.iter().enumerate() {
        let card_idx = *offset + i;
        if card_idx >= cards.len() {
            break;
        }
        let card = &cards[card_idx];
        draw_card(
            f,
            *card_area,
            card,
            focused && i == 0,
            image_states.get_mut(card.poster()),
            pal,
        );
    }

    if *offset > 0 {
        let left = Paragraph::new("◀")
            .style(Style::default().fg(pal.accent).add_modifier(Modifier::BOLD));
        let left_area = Rect::new(inner.x, inner.y + inner.height / 2, 1, 1);
        f.render_widget(left, left_area);
    }

    if *offset + cards_visible < cards.len() {
        let right = Paragraph::new("▶")
            .style(Style::default().fg(pal.accent).add_modifier(Modifier::BOLD));
        let right_area = Rect::new(
            inner.x + inner.width.saturating_sub(1),
            inner.y + inner.height / 2,
            1,
            1,
        );
        f.render_widget(right, right_area);
    }
}

fn draw_card(
    f: &mut Frame,
    area: Rect,
    card: &AnimeCard,
    selected: bool,
    image_state: Option<&mut StatefulProtocol>,
    pal: &Palette,
) {
    let border_style = if selected {
        Style::default().fg(pal.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(pal.dim)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height < 4 || inner.width < 5 {
        return;
    }

    let card_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // poster
            Constraint::Length(1), // badge
            Constraint::Length(2), // title
            Constraint::Length(1), // secondary info
        ])
        .split(inner);

    if let Some(state) = image_state {
        let poster = StatefulImage::new().resize(Resize::Scale(None));
        f.render_stateful_widget(poster, card_layout[0], state);
    } else {
        let placeholder = vec![
            Line::from(""),
            Line::from(Span::styled("▣", Style::default().fg(pal.active))),
            Line::from(Span::styled("Loading...", Style::default().fg(pal.dim))),
        ];
        let poster_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(pal.dim));
        let placeholder = Paragraph::new(placeholder)
            .block(poster_block)
            .alignment(Alignment::Center);
        f.render_widget(placeholder, card_layout[0]);
    }

    let badge = Paragraph::new(card_badge(card))
        .style(Style::default().fg(pal.badge).add_modifier(Modifier::BOLD));
    f.render_widget(badge, card_layout[1]);

    let title = truncate_text(card.title(), (inner.width.saturating_sub(2)) as usize);
    let title = Paragraph::new(title)
        .style(Style::default().fg(pal.text).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Left);
    f.render_widget(title, card_layout[2]);

    let secondary = truncate_text(&card_secondary(card), inner.width as usize);
    let secondary = Paragraph::new(secondary).style(Style::default().fg(pal.dim));
    f.render_widget(secondary, card_layout[3]);
}

/// Badge text for a card: ongoing listings show the episode badge, every
/// other listing kind shows the rating badge.
pub fn card_badge(card: &AnimeCard) -> String {
    match card {
        AnimeCard::Ongoing(anime) => anime.current_episode.clone(),
        AnimeCard::Complete(anime) => rating_label(&anime.rating),
        AnimeCard::Search(anime) => rating_label(&anime.rating),
        AnimeCard::Genre(anime) => rating_label(&anime.rating),
    }
}

/// Secondary info line under the title, varying by listing kind.
pub fn card_secondary(card: &AnimeCard) -> String {
    match card {
        AnimeCard::Ongoing(anime) => {
            format!("{}  {}", anime.release_day, anime.newest_release_date)
        }
        AnimeCard::Complete(anime) => format!("{} Episodes", anime.episode_count),
        AnimeCard::Search(anime) => anime
            .genres
            .iter()
            .map(|genre| genre.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        AnimeCard::Genre(anime) => {
            if anime.episode_count.is_empty() {
                String::new()
            } else {
                format!("{} Episodes", anime.episode_count)
            }
        }
    }
}

pub fn rating_label(rating: &str) -> String {
    if rating.trim().is_empty() {
        "⭐ N/A".to_string()
    } else {
        format!("⭐ {rating}")
    }
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        format!(
            "{}...",
            text.chars()
                .take(max_len.saturating_sub(3))
                .collect::<String>()
        )
    }
}

fn draw_footer(f: &mut Frame, area: Rect, view: View, pal: &Palette) {
    let hints: &[(&str, &str)] = match view {
        View::Home => &[
            ("Tab", ": section  "),
            ("←/→", ": scroll  "),
            ("Enter", ": open  "),
            ("o/c/g/s", ": pages  "),
            ("d", ": theme  "),
            ("q", ": quit"),
        ],
        View::OngoingList | View::Complete | View::GenreResult => &[
            ("Tab", ": grid/pager  "),
            ("←/→", ": move  "),
            ("Enter", ": open  "),
            ("Esc", ": back  "),
            ("q", ": quit"),
        ],
        View::Search => &[
            ("type", ": search  "),
            ("←/→", ": results  "),
            ("Enter", ": open  "),
            ("Esc", ": back"),
        ],
        View::Genres => &[
            ("↑/↓", ": select  "),
            ("Enter", ": open  "),
            ("Esc", ": back  "),
            ("q", ": quit"),
        ],
        View::Detail => &[
            ("↑/↓", ": episode  "),
            ("Tab", ": genres  "),
            ("Enter", ": play  "),
            ("Esc", ": back"),
        ],
        View::Player => &[
            ("↑/↓", ": quality  "),
            ("Enter", ": play  "),
            ("l", ": downloads  "),
            ("Esc", ": back"),
        ],
    };

    let mut spans = Vec::new();
    for (key, action) in hints {
        spans.push(Span::styled(*key, Style::default().fg(pal.accent)));
        spans.push(Span::raw(*action));
    }

    let footer = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(pal.frame)),
        )
        .alignment(Alignment::Center);
    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::api::{
        CompleteAnime, GenreAnime, OngoingAnime, ProviderLink, ResolutionLinks, SearchAnime,
    };

    fn ongoing_card() -> AnimeCard {
        AnimeCard::Ongoing(OngoingAnime {
            title: "Frieren".into(),
            slug: "frieren-sub".into(),
            poster: String::new(),
            current_episode: "Episode 12".into(),
            release_day: "Jumat".into(),
            newest_release_date: "5 Agu".into(),
        })
    }

    #[test]
    fn ongoing_cards_show_the_episode_badge() {
        let card = ongoing_card();
        assert_eq!(card_badge(&card), "Episode 12");
        assert_eq!(card_secondary(&card), "Jumat  5 Agu");
    }

    #[test]
    fn complete_cards_show_rating_and_episode_count() {
        let card = AnimeCard::Complete(CompleteAnime {
            title: "Steins;Gate".into(),
            slug: "sg".into(),
            poster: String::new(),
            episode_count: "24".into(),
            rating: "9.1".into(),
        });
        assert_eq!(card_badge(&card), "⭐ 9.1");
        assert_eq!(card_secondary(&card), "24 Episodes");
    }

    #[test]
    fn genre_cards_show_rating_and_optional_episode_count() {
        let card = AnimeCard::Genre(GenreAnime {
            title: "Mushishi".into(),
            slug: "mushishi".into(),
            poster: String::new(),
            rating: "8.7".into(),
            episode_count: "26".into(),
        });
        assert_eq!(card_badge(&card), "⭐ 8.7");
        assert_eq!(card_secondary(&card), "26 Episodes");

        let card = AnimeCard::Genre(GenreAnime {
            title: "Mushishi".into(),
            slug: "mushishi".into(),
            poster: String::new(),
            rating: String::new(),
            episode_count: String::new(),
        });
        assert_eq!(card_badge(&card), "⭐ N/A");
        assert_eq!(card_secondary(&card), "");
    }

    #[test]
    fn search_cards_list_their_genres() {
        let card = AnimeCard::Search(SearchAnime {
            title: "Naruto".into(),
            slug: "naruto".into(),
            poster: String::new(),
            rating: String::new(),
            genres: vec![
                Genre {
                    name: "Action".into(),
                    slug: "action".into(),
                },
                Genre {
                    name: "Shounen".into(),
                    slug: "shounen".into(),
                },
            ],
        });
        assert_eq!(card_badge(&card), "⭐ N/A");
        assert_eq!(card_secondary(&card), "Action, Shounen");
    }

    #[test]
    fn download_entries_flatten_mp4_before_mkv() {
        let urls = DownloadUrls {
            mp4: vec![ResolutionLinks {
                resolution: "720p".into(),
                urls: vec![
                    ProviderLink {
                        provider: "Zippy".into(),
                        url: "https://dl/1".into(),
                    },
                    ProviderLink {
                        provider: "Mega".into(),
                        url: "https://dl/2".into(),
                    },
                ],
            }],
            mkv: vec![ResolutionLinks {
                resolution: "1080p".into(),
                urls: vec![ProviderLink {
                    provider: "Drive".into(),
                    url: "https://dl/3".into(),
                }],
            }],
        };

        let entries = download_entries(&urls);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].format, "MP4");
        assert_eq!(entries[0].provider, "Zippy");
        assert_eq!(entries[1].provider, "Mega");
        assert_eq!(entries[2].format, "MKV");
        assert_eq!(entries[2].resolution, "1080p");
    }

    #[test]
    fn empty_download_map_has_no_entries() {
        assert!(download_entries(&DownloadUrls::default()).is_empty());
    }

    #[test]
    fn listing_slot_separates_empty_from_failed() {
        let mut listing = ListingView::default();

        listing.apply(None, None);
        assert!(matches!(listing.cards, Loadable::Failed));
        assert!(listing.bar.is_none());

        listing.apply(Some(Vec::new()), None);
        assert!(matches!(listing.cards, Loadable::Empty));

        listing.apply(
            Some(vec![ongoing_card()]),
            Some(PageInfo {
                current_page: 1,
                has_previous_page: false,
                previous_page: None,
                has_next_page: true,
                next_page: Some(2),
                last_visible_page: 12,
            }),
        );
        assert!(matches!(listing.cards, Loadable::Ready(_)));
        assert!(listing.bar.is_some());
    }

    #[test]
    fn single_page_listing_builds_no_pager() {
        let mut listing = ListingView::default();
        listing.apply(
            Some(vec![ongoing_card()]),
            Some(PageInfo {
                current_page: 1,
                has_previous_page: false,
                previous_page: None,
                has_next_page: false,
                next_page: None,
                last_visible_page: 1,
            }),
        );
        assert!(matches!(listing.cards, Loadable::Ready(_)));
        assert!(listing.bar.is_none());
    }

    #[test]
    fn player_session_defaults_to_highest_quality() {
        let payload: EpisodePayload = serde_json::from_value(serde_json::json!({
            "steramList": {"360p": "/a", "480p": "/b", "720p": "/c"}
        }))
        .unwrap();

        let mut session = PlayerSession::loading("Naruto - Episode 1".into());
        assert!(matches!(session.episode, Loadable::Loading));

        session.apply(Some(payload));
        assert_eq!(session.qualities, vec![720, 480, 360]);
        assert_eq!(session.selected_quality(), Some(720));
    }

    #[test]
    fn player_session_fails_without_streams() {
        let mut session = PlayerSession::loading("x".into());
        session.apply(None);
        assert!(matches!(session.episode, Loadable::Failed));

        let mut session = PlayerSession::loading("x".into());
        session.apply(Some(EpisodePayload::default()));
        assert!(matches!(session.episode, Loadable::Failed));
    }

    #[test]
    fn search_slot_separates_no_results_from_failure() {
        let slot = SearchSlot::from_results("naruto".into(), Some(Vec::new()));
        match slot {
            SearchSlot::NoResults { query } => assert_eq!(query, "naruto"),
            other => panic!("expected NoResults, got {other:?}"),
        }

        assert!(matches!(
            SearchSlot::from_results("naruto".into(), None),
            SearchSlot::Failed
        ));

        assert!(matches!(
            SearchSlot::from_results("frieren".into(), Some(vec![ongoing_card()])),
            SearchSlot::Ready(_)
        ));
    }

    #[test]
    fn truncation_keeps_short_text_intact() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a rather long title", 10), "a rathe...");
    }
}
