use crate::backend::api::PageInfo;

/// One entry in the windowed page-number sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Page(u32),
    Ellipsis,
}

/// Windowed page-number sequence for a pager: up to 7 pages are shown in
/// full, anything longer keeps the first page, the last page, and a window
/// around the current page, with elided ranges marked by an ellipsis.
///
/// Emission order is ascending, so duplicates produced at the boundaries
/// (current page 1, 2, last, last-1) collapse by first occurrence. The
/// ellipsis marker takes part in that pass too, so at most one ellipsis
/// token survives.
pub fn page_tokens(current_page: u32, last_page: u32) -> Vec<PageToken> {
    let mut raw = Vec::new();

    if last_page <= 7 {
        for page in 1..=last_page {
            raw.push(PageToken::Page(page));
        }
    } else {
        raw.push(PageToken::Page(1));
        if current_page > 3 {
            raw.push(PageToken::Ellipsis);
        }
        if current_page > 2 {
            raw.push(PageToken::Page(current_page - 1));
        }
        if current_page != 1 && current_page != last_page {
            raw.push(PageToken::Page(current_page));
        }
        if current_page < last_page - 1 {
            raw.push(PageToken::Page(current_page + 1));
        }
        if current_page < last_page - 2 {
            raw.push(PageToken::Ellipsis);
        }
        raw.push(PageToken::Page(last_page));
    }

    let mut tokens: Vec<PageToken> = Vec::with_capacity(raw.len());
    for token in raw {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Previous,
    Next,
    Page(u32),
    Gap,
}

/// One pager control. Disabled prev/next controls still carry their target
/// page: disabling only blocks input, it is the host that refrains from
/// activating them. Gap controls are static separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageControl {
    pub kind: ControlKind,
    pub target: Option<u32>,
    pub enabled: bool,
    pub active: bool,
}

/// The rendered pager as plain control data plus a cursor. The hosting
/// layer moves the cursor, draws the controls, and maps an activation of
/// the selected control onto the owning view's reload.
#[derive(Debug, Clone)]
pub struct PaginationBar {
    controls: Vec<PageControl>,
    selected: usize,
}

impl PaginationBar {
    /// Builds the control row, or nothing for single-page listings.
    pub fn build(info: &PageInfo) -> Option<Self> {
        if info.last_visible_page <= 1 {
            return None;
        }

        let mut controls = Vec::new();
        controls.push(PageControl {
            kind: ControlKind::Previous,
            target: info.previous_page,
            enabled: info.has_previous_page,
            active: false,
        });

        for token in page_tokens(info.current_page, info.last_visible_page) {
            match token {
                PageToken::Page(page) => controls.push(PageControl {
                    kind: ControlKind::Page(page),
                    target: Some(page),
                    enabled: true,
                    active: page == info.current_page,
                }),
                PageToken::Ellipsis => controls.push(PageControl {
                    kind: ControlKind::Gap,
                    target: None,
                    enabled: false,
                    active: false,
                }),
            }
        }

        controls.push(PageControl {
            kind: ControlKind::Next,
            target: info.next_page,
            enabled: info.has_next_page,
            active: false,
        });

        let selected = controls
            .iter()
            .position(|control| control.active)
            .unwrap_or(0);

        Some(PaginationBar { controls, selected })
    }

    pub fn controls(&self) -> &[PageControl] {
        &self.controls
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_control(&self) -> &PageControl {
        &self.controls[self.selected]
    }

    /// Moves the cursor left, skipping gap separators.
    pub fn select_left(&mut self) {
        let mut idx = self.selected;
        while idx > 0 {
            idx -= 1;
            if self.controls[idx].kind != ControlKind::Gap {
                self.selected = idx;
                return;
            }
        }
    }

    /// Moves the cursor right, skipping gap separators.
    pub fn select_right(&mut self) {
        let mut idx = self.selected;
        while idx + 1 < self.controls.len() {
            idx += 1;
            if self.controls[idx].kind != ControlKind::Gap {
                self.selected = idx;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(current: u32, last: u32) -> PageInfo {
        PageInfo {
            current_page: current,
            has_previous_page: current > 1,
            previous_page: (current > 1).then(|| current - 1),
            has_next_page: current < last,
            next_page: (current < last).then(|| current + 1),
            last_visible_page: last,
        }
    }

    fn pages_of(tokens: &[PageToken]) -> Vec<u32> {
        tokens
            .iter()
            .filter_map(|token| match token {
                PageToken::Page(page) => Some(*page),
                PageToken::Ellipsis => None,
            })
            .collect()
    }

    fn ellipses_of(tokens: &[PageToken]) -> usize {
        tokens
            .iter()
            .filter(|token| **token == PageToken::Ellipsis)
            .count()
    }

    #[test]
    fn short_listings_show_every_page() {
        for last in 1..=7 {
            for current in 1..=last {
                let tokens = page_tokens(current, last);
                assert_eq!(pages_of(&tokens), (1..=last).collect::<Vec<_>>());
                assert_eq!(ellipses_of(&tokens), 0);
            }
        }
    }

    #[test]
    fn first_page_of_eight_has_no_duplicate_one() {
        let tokens = page_tokens(1, 8);
        assert_eq!(
            tokens,
            vec![
                PageToken::Page(1),
                PageToken::Page(2),
                PageToken::Ellipsis,
                PageToken::Page(8),
            ]
        );
    }

    #[test]
    fn last_page_of_eight() {
        let tokens = page_tokens(8, 8);
        assert_eq!(
            tokens,
            vec![
                PageToken::Page(1),
                PageToken::Ellipsis,
                PageToken::Page(7),
                PageToken::Page(8),
            ]
        );
    }

    #[test]
    fn middle_of_a_long_listing() {
        let tokens = page_tokens(50, 100);
        assert_eq!(
            tokens,
            vec![
                PageToken::Page(1),
                PageToken::Ellipsis,
                PageToken::Page(49),
                PageToken::Page(50),
                PageToken::Page(51),
                PageToken::Page(100),
            ]
        );
    }

    #[test]
    fn second_and_penultimate_pages_collapse_cleanly() {
        assert_eq!(pages_of(&page_tokens(2, 8)), vec![1, 2, 3, 8]);
        assert_eq!(pages_of(&page_tokens(7, 8)), vec![1, 6, 7, 8]);
        assert_eq!(pages_of(&page_tokens(3, 8)), vec![1, 2, 3, 4, 8]);
    }

    #[test]
    fn windowing_sweep_holds_invariants() {
        for last in 8..=12 {
            for current in 1..=last {
                let tokens = page_tokens(current, last);
                let pages = pages_of(&tokens);

                assert_eq!(pages.first(), Some(&1), "last={last} current={current}");
                assert_eq!(pages.last(), Some(&last), "last={last} current={current}");
                assert!(
                    pages.windows(2).all(|pair| pair[0] < pair[1]),
                    "not ascending: last={last} current={current} pages={pages:?}"
                );
                assert!(
                    ellipses_of(&tokens) <= 2,
                    "too many ellipses: last={last} current={current}"
                );
                assert!(
                    pages.contains(&current),
                    "window misses current: last={last} current={current}"
                );
            }
        }
    }

    #[test]
    fn single_page_renders_no_controls() {
        assert!(PaginationBar::build(&info(1, 1)).is_none());

        let degenerate = PageInfo {
            current_page: 1,
            has_previous_page: false,
            previous_page: None,
            has_next_page: false,
            next_page: None,
            last_visible_page: 0,
        };
        assert!(PaginationBar::build(&degenerate).is_none());
    }

    #[test]
    fn bar_marks_exactly_one_active_page() {
        for last in [2, 7, 8, 12, 100] {
            for current in 1..=last {
                let bar = PaginationBar::build(&info(current, last)).unwrap();
                let active: Vec<_> = bar
                    .controls()
                    .iter()
                    .filter(|control| control.active)
                    .collect();
                assert_eq!(active.len(), 1, "last={last} current={current}");
                assert_eq!(active[0].kind, ControlKind::Page(current));
            }
        }
    }

    #[test]
    fn prev_and_next_mirror_the_wire_flags() {
        let bar = PaginationBar::build(&info(1, 9)).unwrap();
        let prev = bar.controls().first().unwrap();
        let next = bar.controls().last().unwrap();
        assert_eq!(prev.kind, ControlKind::Previous);
        assert!(!prev.enabled);
        assert_eq!(prev.target, None);
        assert_eq!(next.kind, ControlKind::Next);
        assert!(next.enabled);
        assert_eq!(next.target, Some(2));

        let bar = PaginationBar::build(&info(9, 9)).unwrap();
        assert!(bar.controls().first().unwrap().enabled);
        assert!(!bar.controls().last().unwrap().enabled);
        assert_eq!(bar.controls().first().unwrap().target, Some(8));
    }

    #[test]
    fn disabled_prev_still_carries_its_target() {
        // upstream may flag prev disabled while naming a page; the target
        // stays attached and only input blocking keeps it from firing
        let wire = PageInfo {
            current_page: 1,
            has_previous_page: false,
            previous_page: Some(1),
            has_next_page: true,
            next_page: Some(2),
            last_visible_page: 9,
        };
        let bar = PaginationBar::build(&wire).unwrap();
        let prev = bar.controls().first().unwrap();
        assert!(!prev.enabled);
        assert_eq!(prev.target, Some(1));
    }

    #[test]
    fn cursor_starts_on_active_and_skips_gaps() {
        let mut bar = PaginationBar::build(&info(5, 20)).unwrap();
        // controls: Prev 1 … 4 [5] 6 Next
        assert_eq!(bar.selected_control().kind, ControlKind::Page(5));

        bar.select_left();
        assert_eq!(bar.selected_control().kind, ControlKind::Page(4));
        bar.select_left();
        assert_eq!(bar.selected_control().kind, ControlKind::Page(1));
        bar.select_left();
        assert_eq!(bar.selected_control().kind, ControlKind::Previous);
        bar.select_left();
        assert_eq!(bar.selected_control().kind, ControlKind::Previous);

        bar.select_right();
        assert_eq!(bar.selected_control().kind, ControlKind::Page(1));
        bar.select_right();
        assert_eq!(bar.selected_control().kind, ControlKind::Page(4));
    }
}
