use std::collections::HashMap;

/// Closed set of page kinds the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    OngoingList,
    Complete,
    Search,
    Genres,
    GenreResult,
    Detail,
    Player,
}

impl PageKind {
    fn from_id(id: &str) -> Option<Self> {
        match id {
            "home" => Some(PageKind::Home),
            "ongoing" => Some(PageKind::OngoingList),
            "complete" => Some(PageKind::Complete),
            "search" => Some(PageKind::Search),
            "genres" => Some(PageKind::Genres),
            "genre" => Some(PageKind::GenreResult),
            "detail" => Some(PageKind::Detail),
            "player" => Some(PageKind::Player),
            _ => None,
        }
    }
}

/// A navigation target: page id plus query parameters, resolved once per
/// navigation. Pagination reloads swap the page number in place instead of
/// producing a new route.
#[derive(Debug, Clone)]
pub struct ViewRoute {
    pub page: PageKind,
    pub params: HashMap<String, String>,
}

impl ViewRoute {
    /// Parses a directly-navigated target like `detail?slug=one-piece` or
    /// `genre?slug=action&name=Action`. Unknown page ids do not parse;
    /// parameter values are percent-decoded.
    pub fn parse(input: &str) -> Option<Self> {
        let (id, query) = match input.split_once('?') {
            Some((id, query)) => (id, query),
            None => (input, ""),
        };
        let page = PageKind::from_id(id)?;

        let mut params = HashMap::new();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string());
            params.insert(key.to_string(), value);
        }

        Some(ViewRoute { page, params })
    }
}

/// Typed request a page controller runs. Produced by [`dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Home,
    OngoingList { page: u32 },
    Complete { page: u32 },
    Search,
    Genres,
    GenreResult { slug: String, name: String, page: u32 },
    Detail { slug: String },
    Player { slug: String, title: String },
}

/// Resolves a route into at most one page request. A missing required
/// parameter yields `None`: malformed direct navigation is a normal
/// condition, so the page stays in its static state instead of erroring.
pub fn dispatch(route: &ViewRoute) -> Option<PageRequest> {
    let param = |key: &str| {
        route
            .params
            .get(key)
            .filter(|value| !value.is_empty())
            .cloned()
    };
    let page = route
        .params
        .get("page")
        .and_then(|value| value.parse().ok())
        .unwrap_or(1);

    match route.page {
        PageKind::Home => Some(PageRequest::Home),
        PageKind::OngoingList => Some(PageRequest::OngoingList { page }),
        PageKind::Complete => Some(PageRequest::Complete { page }),
        PageKind::Search => Some(PageRequest::Search),
        PageKind::Genres => Some(PageRequest::Genres),
        PageKind::GenreResult => {
            let slug = param("slug")?;
            let name = param("name")?;
            Some(PageRequest::GenreResult { slug, name, page })
        }
        PageKind::Detail => Some(PageRequest::Detail { slug: param("slug")? }),
        PageKind::Player => {
            let slug = param("slug")?;
            let title = param("title").unwrap_or_else(|| slug.clone());
            Some(PageRequest::Player { slug, title })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_id_and_params() {
        let route = ViewRoute::parse("genre?slug=slice-of-life&name=Slice%20of%20Life").unwrap();
        assert_eq!(route.page, PageKind::GenreResult);
        assert_eq!(route.params.get("slug").unwrap(), "slice-of-life");
        assert_eq!(route.params.get("name").unwrap(), "Slice of Life");
    }

    #[test]
    fn parses_bare_page_id() {
        let route = ViewRoute::parse("ongoing").unwrap();
        assert_eq!(route.page, PageKind::OngoingList);
        assert!(route.params.is_empty());
    }

    #[test]
    fn unknown_page_id_does_not_parse() {
        assert!(ViewRoute::parse("reader?slug=x").is_none());
        assert!(ViewRoute::parse("").is_none());
    }

    #[test]
    fn detail_requires_slug() {
        let route = ViewRoute::parse("detail").unwrap();
        assert_eq!(dispatch(&route), None);

        let route = ViewRoute::parse("detail?slug=").unwrap();
        assert_eq!(dispatch(&route), None);

        let route = ViewRoute::parse("detail?slug=one-piece").unwrap();
        assert_eq!(
            dispatch(&route),
            Some(PageRequest::Detail { slug: "one-piece".into() })
        );
    }

    #[test]
    fn genre_result_requires_slug_and_name() {
        let route = ViewRoute::parse("genre?slug=action").unwrap();
        assert_eq!(dispatch(&route), None);

        let route = ViewRoute::parse("genre?slug=action&name=Action&page=3").unwrap();
        assert_eq!(
            dispatch(&route),
            Some(PageRequest::GenreResult {
                slug: "action".into(),
                name: "Action".into(),
                page: 3,
            })
        );
    }

    #[test]
    fn player_title_falls_back_to_slug() {
        let route = ViewRoute::parse("player?slug=op-ep-1").unwrap();
        assert_eq!(
            dispatch(&route),
            Some(PageRequest::Player {
                slug: "op-ep-1".into(),
                title: "op-ep-1".into(),
            })
        );

        let route = ViewRoute::parse("player").unwrap();
        assert_eq!(dispatch(&route), None);
    }

    #[test]
    fn listing_page_defaults_to_one() {
        let route = ViewRoute::parse("complete").unwrap();
        assert_eq!(dispatch(&route), Some(PageRequest::Complete { page: 1 }));

        let route = ViewRoute::parse("complete?page=nonsense").unwrap();
        assert_eq!(dispatch(&route), Some(PageRequest::Complete { page: 1 }));

        let route = ViewRoute::parse("ongoing?page=4").unwrap();
        assert_eq!(dispatch(&route), Some(PageRequest::OngoingList { page: 4 }));
    }
}
