use image::DynamicImage;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;

const API_BASE_URL: &str = "https://kitanime-api.vercel.app/v1";
pub const STREAM_BASE_URL: &str = "https://kitanimev2.vercel.app";

/// Pagination block as the catalogue API ships it alongside listing data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageInfo {
    pub current_page: u32,
    #[serde(default)]
    pub has_previous_page: bool,
    #[serde(default)]
    pub previous_page: Option<u32>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub next_page: Option<u32>,
    pub last_visible_page: u32,
}

/// Every endpoint wraps its payload in `{ data, pagination? }`. Failures of
/// any kind (transport, status, body shape) collapse into the empty envelope.
#[derive(Debug, Default)]
pub struct Envelope {
    pub data: Option<Value>,
    pub pagination: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    data: Value,
    #[serde(default)]
    pagination: Option<PageInfo>,
}

fn parse_envelope(body: &str) -> Option<Envelope> {
    let raw: RawEnvelope = serde_json::from_str(body).ok()?;
    let data = match raw.data {
        Value::Null => None,
        value => Some(value),
    };
    Some(Envelope {
        data,
        pagination: raw.pagination,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Genre {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OngoingAnime {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub current_episode: String,
    #[serde(default)]
    pub release_day: String,
    #[serde(default)]
    pub newest_release_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteAnime {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub episode_count: String,
    #[serde(default)]
    pub rating: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchAnime {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreAnime {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub episode_count: String,
}

/// One card in a listing grid. The listing kind decides which badge and
/// secondary line a card shows, so each kind keeps its own record type.
#[derive(Debug, Clone)]
pub enum AnimeCard {
    Ongoing(OngoingAnime),
    Complete(CompleteAnime),
    Search(SearchAnime),
    Genre(GenreAnime),
}

impl AnimeCard {
    pub fn title(&self) -> &str {
        match self {
            AnimeCard::Ongoing(a) => &a.title,
            AnimeCard::Complete(a) => &a.title,
            AnimeCard::Search(a) => &a.title,
            AnimeCard::Genre(a) => &a.title,
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            AnimeCard::Ongoing(a) => &a.slug,
            AnimeCard::Complete(a) => &a.slug,
            AnimeCard::Search(a) => &a.slug,
            AnimeCard::Genre(a) => &a.slug,
        }
    }

    pub fn poster(&self) -> &str {
        match self {
            AnimeCard::Ongoing(a) => &a.poster,
            AnimeCard::Complete(a) => &a.poster,
            AnimeCard::Search(a) => &a.poster,
            AnimeCard::Genre(a) => &a.poster,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HomeData {
    #[serde(default)]
    ongoing_anime: Vec<OngoingAnime>,
    #[serde(default)]
    complete_anime: Vec<CompleteAnime>,
}

#[derive(Debug, Clone, Default)]
pub struct HomeFeed {
    pub ongoing: Vec<AnimeCard>,
    pub complete: Vec<AnimeCard>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeRef {
    #[serde(default)]
    pub episode: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimeDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub episode_count: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub studio: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub episode_lists: Vec<EpisodeRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderLink {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolutionLinks {
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub urls: Vec<ProviderLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadUrls {
    #[serde(default)]
    pub mp4: Vec<ResolutionLinks>,
    #[serde(default)]
    pub mkv: Vec<ResolutionLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodePayload {
    // "steramList" is the upstream's own spelling of the quality->URL map.
    #[serde(rename = "steramList", default)]
    pub stream_list: HashMap<String, String>,
    #[serde(default)]
    pub download_urls: DownloadUrls,
}

impl EpisodePayload {
    /// Available stream qualities, highest first.
    pub fn qualities(&self) -> Vec<u32> {
        let mut qualities: Vec<u32> = self.stream_list.keys().filter_map(parse_quality).collect();
        qualities.sort_unstable_by(|a, b| b.cmp(a));
        qualities.dedup();
        qualities
    }

    /// Default selection is the numeric maximum of the quality set.
    pub fn default_quality(&self) -> Option<u32> {
        self.stream_list.keys().filter_map(parse_quality).max()
    }

    /// Playable URL for a quality, resolved against the stream host.
    pub fn stream_url(&self, quality: u32) -> Option<String> {
        self.stream_list
            .iter()
            .find(|(label, _)| parse_quality(label) == Some(quality))
            .map(|(_, path)| format!("{STREAM_BASE_URL}{path}"))
    }
}

fn parse_quality<S: AsRef<str>>(label: S) -> Option<u32> {
    label.as_ref().trim().trim_end_matches('p').parse().ok()
}

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("kitanime-tui/0.1.0")
        .build()
        .expect("Failed to build HTTP client")
}

/// Single network chokepoint. One GET against the API base, body parsed as
/// the standard envelope. Never errors: any failure is logged and returned
/// as the empty envelope so callers uniformly check for absent data.
async fn fetch_envelope(path: &str) -> Envelope {
    let url = format!("{API_BASE_URL}/{path}");
    let client = build_client();

    let response = match client.get(&url).send().await.and_then(|r| r.error_for_status()) {
        Ok(response) => response,
        Err(err) => {
            log::error!("request for {path} failed: {err}");
            return Envelope::default();
        }
    };

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            log::error!("reading response for {path} failed: {err}");
            return Envelope::default();
        }
    };

    match parse_envelope(&body) {
        Some(envelope) => envelope,
        None => {
            log::error!("malformed response body for {path}");
            Envelope::default()
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(path: &str, data: Value) -> Option<T> {
    match serde_json::from_value(data) {
        Ok(value) => Some(value),
        Err(err) => {
            log::error!("unexpected payload shape for {path}: {err}");
            None
        }
    }
}

pub async fn get_home() -> Option<HomeFeed> {
    let envelope = fetch_envelope("home").await;
    let data: HomeData = decode("home", envelope.data?)?;
    Some(HomeFeed {
        ongoing: data.ongoing_anime.into_iter().map(AnimeCard::Ongoing).collect(),
        complete: data.complete_anime.into_iter().map(AnimeCard::Complete).collect(),
    })
}

pub async fn search_anime(query: &str) -> Option<Vec<AnimeCard>> {
    let path = format!("search/{}", urlencoding::encode(query));
    let envelope = fetch_envelope(&path).await;
    let results: Vec<SearchAnime> = decode(&path, envelope.data?)?;
    Some(results.into_iter().map(AnimeCard::Search).collect())
}

pub async fn get_genres() -> Option<Vec<Genre>> {
    let envelope = fetch_envelope("genres").await;
    decode("genres", envelope.data?)
}

#[derive(Debug, Deserialize)]
struct GenreListing {
    #[serde(default)]
    anime: Vec<GenreAnime>,
    // some deployments nest the pagination block inside the data payload
    #[serde(default)]
    pagination: Option<PageInfo>,
}

pub async fn get_genre_anime(slug: &str, page: u32) -> Option<(Vec<AnimeCard>, Option<PageInfo>)> {
    let path = format!("genres/{slug}/{page}");
    let envelope = fetch_envelope(&path).await;
    let pagination = envelope.pagination;
    let listing: GenreListing = decode(&path, envelope.data?)?;
    let cards = listing.anime.into_iter().map(AnimeCard::Genre).collect();
    Some((cards, pagination.or(listing.pagination)))
}

pub async fn get_ongoing(page: u32) -> Option<(Vec<AnimeCard>, Option<PageInfo>)> {
    let path = format!("ongoing-anime/{page}");
    let envelope = fetch_envelope(&path).await;
    let pagination = envelope.pagination;
    let listing: Vec<OngoingAnime> = decode(&path, envelope.data?)?;
    let cards = listing.into_iter().map(AnimeCard::Ongoing).collect();
    Some((cards, pagination))
}

pub async fn get_complete(page: u32) -> Option<(Vec<AnimeCard>, Option<PageInfo>)> {
    let path = format!("complete-anime/{page}");
    let envelope = fetch_envelope(&path).await;
    let pagination = envelope.pagination;
    let listing: Vec<CompleteAnime> = decode(&path, envelope.data?)?;
    let cards = listing.into_iter().map(AnimeCard::Complete).collect();
    Some((cards, pagination))
}

pub async fn get_anime_detail(slug: &str) -> Option<AnimeDetail> {
    let path = format!("anime/{slug}");
    let envelope = fetch_envelope(&path).await;
    decode(&path, envelope.data?)
}

pub async fn get_episode(slug: &str) -> Option<EpisodePayload> {
    let path = format!("episode/{slug}");
    let envelope = fetch_envelope(&path).await;
    decode(&path, envelope.data?)
}

pub async fn fetch_poster(poster_url: &str) -> Option<DynamicImage> {
    if poster_url.is_empty() {
        return None;
    }

    let client = build_client();
    let response = client.get(poster_url).send().await.ok()?;
    let bytes = response.bytes().await.ok()?;

    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .decode()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_pagination() {
        let body = r#"{
            "data": [{"title": "One Piece", "slug": "one-piece"}],
            "pagination": {
                "current_page": 2,
                "has_previous_page": true,
                "previous_page": 1,
                "has_next_page": true,
                "next_page": 3,
                "last_visible_page": 54
            }
        }"#;

        let envelope = parse_envelope(body).expect("envelope should parse");
        assert!(envelope.data.is_some());
        let info = envelope.pagination.expect("pagination should parse");
        assert_eq!(info.current_page, 2);
        assert_eq!(info.previous_page, Some(1));
        assert_eq!(info.next_page, Some(3));
        assert_eq!(info.last_visible_page, 54);
    }

    #[test]
    fn envelope_without_pagination() {
        let envelope = parse_envelope(r#"{"data": {"title": "Naruto"}}"#).unwrap();
        assert!(envelope.data.is_some());
        assert!(envelope.pagination.is_none());
    }

    #[test]
    fn envelope_null_data_is_absent() {
        let envelope = parse_envelope(r#"{"data": null}"#).unwrap();
        assert!(envelope.data.is_none());
    }

    #[test]
    fn malformed_bodies_do_not_parse() {
        assert!(parse_envelope("").is_none());
        assert!(parse_envelope("<html>502</html>").is_none());
        assert!(parse_envelope(r#"{"status": "ok"}"#).is_none());
    }

    #[test]
    fn ongoing_listing_decodes() {
        let data = serde_json::json!([{
            "title": "Frieren",
            "slug": "frieren-sub",
            "poster": "https://img.example/frieren.jpg",
            "current_episode": "Episode 12",
            "release_day": "Jumat",
            "newest_release_date": "5 Agu"
        }]);
        let listing: Vec<OngoingAnime> = serde_json::from_value(data).unwrap();
        assert_eq!(listing[0].current_episode, "Episode 12");
        assert_eq!(listing[0].release_day, "Jumat");
    }

    #[test]
    fn search_listing_tolerates_missing_fields() {
        let data = serde_json::json!([{
            "title": "Naruto",
            "slug": "naruto-sub",
            "genres": [{"name": "Action", "slug": "action"}]
        }]);
        let listing: Vec<SearchAnime> = serde_json::from_value(data).unwrap();
        assert_eq!(listing[0].genres[0].name, "Action");
        assert_eq!(listing[0].slug, "naruto-sub");
        assert!(listing[0].rating.is_empty());
        assert!(listing[0].poster.is_empty());
    }

    #[test]
    fn genre_listing_keeps_nested_pagination() {
        let data = serde_json::json!({
            "anime": [{"title": "Bleach", "slug": "bleach-sub", "rating": "8.1"}],
            "pagination": {"current_page": 1, "last_visible_page": 9}
        });
        let listing: GenreListing = serde_json::from_value(data).unwrap();
        assert_eq!(listing.anime.len(), 1);
        assert_eq!(listing.pagination.unwrap().last_visible_page, 9);
    }

    #[test]
    fn episode_payload_reads_upstream_spelling() {
        let data = serde_json::json!({
            "steramList": {"360p": "/s/ep1-360", "720p": "/s/ep1-720", "480p": "/s/ep1-480"},
            "download_urls": {
                "mp4": [{"resolution": "720p", "urls": [{"provider": "Zippy", "url": "https://dl.example/1"}]}],
                "mkv": []
            }
        });
        let payload: EpisodePayload = serde_json::from_value(data).unwrap();
        assert_eq!(payload.qualities(), vec![720, 480, 360]);
        assert_eq!(payload.default_quality(), Some(720));
        assert_eq!(
            payload.stream_url(480).as_deref(),
            Some("https://kitanimev2.vercel.app/s/ep1-480")
        );
        assert_eq!(payload.download_urls.mp4[0].urls[0].provider, "Zippy");
    }

    #[test]
    fn default_quality_is_numeric_maximum() {
        let payload: EpisodePayload = serde_json::from_value(serde_json::json!({
            "steramList": {"360p": "/a", "720p": "/b"}
        }))
        .unwrap();
        assert_eq!(payload.default_quality(), Some(720));

        let empty = EpisodePayload::default();
        assert_eq!(empty.default_quality(), None);
        assert!(empty.qualities().is_empty());
    }
}
