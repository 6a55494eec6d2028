use std::ops::Range;

use maud::{html, Markup};

const SURROUNDING_PAGES: u64 = 3;

/// Page control for listing pages. `current_page` is 1-based; hrefs keep
/// the caller's filter query intact and only swap the `page` parameter.
pub struct PaginationCtl {
    pages: u64,
    current_page: u64,
    item_count: u64,
    base_query: String,
    singular: String,
    plural: String,
}

impl PaginationCtl {
    pub fn new<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        current_page: u64,
        page_size: u8,
        item_count: u64,
        base_query: S1,
        singular: S2,
        plural: S3,
    ) -> Self {
        let page_size = page_size.max(1) as u64;
        let pages = (item_count + page_size - 1) / page_size;
        Self {
            pages,
            current_page: current_page.max(1),
            item_count,
            base_query: base_query.into(),
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    pub fn current_offset(current_page: u64, page_size: u8) -> u64 {
        (current_page.max(1) - 1) * page_size as u64
    }

    /// Returns true if pagination should be shown for this listing
    pub fn need_pagination(&self) -> bool {
        self.pages > 1
    }

    pub fn page_count(&self) -> u64 {
        self.pages
    }

    pub fn caption(&self) -> String {
        format!(
            "{} {}",
            self.item_count,
            if self.item_count == 1 {
                &self.singular
            } else {
                &self.plural
            }
        )
    }

    fn href(&self, page: u64) -> String {
        if self.base_query.is_empty() {
            format!("?page={}", page)
        } else {
            format!("?{}&page={}", self.base_query, page)
        }
    }

    fn left_gap(&self) -> bool {
        self.current_page.saturating_sub(SURROUNDING_PAGES) > 1
    }

    fn left_page_numbers(&self) -> Range<u64> {
        self.current_page.saturating_sub(SURROUNDING_PAGES).max(1)..self.current_page
    }

    fn right_gap(&self) -> bool {
        self.current_page + SURROUNDING_PAGES < self.pages
    }

    fn right_page_numbers(&self) -> Range<u64> {
        self.current_page + 1..(self.current_page + SURROUNDING_PAGES + 1).min(self.pages + 1)
    }

    pub fn pagination(&self) -> Markup {
        html! {
            @if self.pages > 1 {
                nav.pagination {
                    @if self.current_page != 1 {
                        a href=(self.href(1)) { "« First" }
                        a.js-prev href=(self.href(self.current_page - 1)) { "‹ Prev" }
                    }

                    @if self.left_gap() {
                        span.page.gap { "…" }
                    }

                    @for number in self.left_page_numbers() {
                        a href=(self.href(number)) { (number) }
                    }

                    span.page-current { (self.current_page) }

                    @for number in self.right_page_numbers() {
                        a href=(self.href(number)) { (number) }
                    }

                    @if self.right_gap() {
                        span.page.gap { "…" }
                    }

                    @if self.current_page != self.pages {
                        a.js-next href=(self.href(self.current_page + 1)) { "Next ›" }
                        a href=(self.href(self.pages)) { "Last »" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(PaginationCtl::new(1, 25, 0, "", "row", "rows").page_count(), 0);
        assert_eq!(PaginationCtl::new(1, 25, 25, "", "row", "rows").page_count(), 1);
        assert_eq!(PaginationCtl::new(1, 25, 26, "", "row", "rows").page_count(), 2);
    }

    #[test]
    fn offsets_are_zero_based_for_one_based_pages() {
        assert_eq!(PaginationCtl::current_offset(1, 25), 0);
        assert_eq!(PaginationCtl::current_offset(3, 25), 50);
        // page 0 is treated as page 1
        assert_eq!(PaginationCtl::current_offset(0, 25), 0);
    }

    #[test]
    fn single_page_needs_no_pagination() {
        assert!(!PaginationCtl::new(1, 25, 10, "", "row", "rows").need_pagination());
        assert!(PaginationCtl::new(1, 25, 60, "", "row", "rows").need_pagination());
    }

    #[test]
    fn gaps_appear_only_away_from_the_edges() {
        let ctl = PaginationCtl::new(1, 10, 1000, "", "row", "rows");
        assert!(!ctl.left_gap());
        assert!(ctl.right_gap());
        let ctl = PaginationCtl::new(50, 10, 1000, "", "row", "rows");
        assert!(ctl.left_gap());
        assert!(ctl.right_gap());
        let ctl = PaginationCtl::new(100, 10, 1000, "", "row", "rows");
        assert!(ctl.left_gap());
        assert!(!ctl.right_gap());
    }

    #[test]
    fn surrounding_page_windows_stay_in_bounds() {
        let ctl = PaginationCtl::new(2, 10, 1000, "", "row", "rows");
        assert_eq!(ctl.left_page_numbers(), 1..2);
        assert_eq!(ctl.right_page_numbers(), 3..6);
        let ctl = PaginationCtl::new(99, 10, 1000, "", "row", "rows");
        assert_eq!(ctl.right_page_numbers(), 100..101);
    }

    #[test]
    fn hrefs_keep_the_filter_query() {
        let ctl = PaginationCtl::new(2, 10, 100, "city=springfield&sort=rent", "row", "rows");
        assert_eq!(ctl.href(3), "?city=springfield&sort=rent&page=3");
        let bare = PaginationCtl::new(2, 10, 100, "", "row", "rows");
        assert_eq!(bare.href(3), "?page=3");
    }

    #[test]
    fn caption_picks_the_plural() {
        assert_eq!(
            PaginationCtl::new(1, 25, 1, "", "property", "properties").caption(),
            "1 property"
        );
        assert_eq!(
            PaginationCtl::new(1, 25, 2, "", "property", "properties").caption(),
            "2 properties"
        );
    }
}
