use std::ops::Range;

/// Page sizes offered when cycling through sizes from the dashboard.
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [5, 10, 20, 50, 100];

/// Current page position over a collection of `len` rows.
///
/// The window never stores the collection length. Every operation takes the
/// current length and clamps, so an out of range page can not be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page_index: usize,
    page_size: usize,
}

impl PageWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self, len: usize) -> usize {
        std::cmp::max(1, len.div_ceil(self.page_size))
    }

    pub fn can_go_next(&self, len: usize) -> bool {
        self.page_index + 1 < self.page_count(len)
    }

    pub fn can_go_prev(&self) -> bool {
        self.page_index > 0
    }

    pub fn next_page(&mut self, len: usize) {
        self.page_index = std::cmp::min(self.page_index + 1, self.page_count(len) - 1);
    }

    pub fn prev_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    pub fn first_page(&mut self) {
        self.page_index = 0;
    }

    pub fn last_page(&mut self, len: usize) {
        self.page_index = self.page_count(len) - 1;
    }

    /// Pull the page index back into range after the collection changed.
    pub fn clamp(&mut self, len: usize) {
        self.page_index = std::cmp::min(self.page_index, self.page_count(len) - 1);
    }

    /// Change the page size, keeping the first row of the current page visible.
    pub fn set_page_size(&mut self, page_size: usize, len: usize) {
        let first_row = self.page_index * self.page_size;
        self.page_size = page_size.max(1);
        self.page_index = first_row / self.page_size;
        self.clamp(len);
    }

    /// Row range of the visible page. Always within `0..len`.
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = std::cmp::min(self.page_index * self.page_size, len);
        let end = std::cmp::min(start + self.page_size, len);
        start..end
    }

    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        &rows[self.range(rows.len())]
    }
}

/// Next page size in `PAGE_SIZE_OPTIONS`, wrapping in neither direction.
pub fn cycle_page_size(current: usize, larger: bool) -> usize {
    if larger {
        PAGE_SIZE_OPTIONS
            .iter()
            .copied()
            .find(|&s| s > current)
            .unwrap_or(current)
    } else {
        PAGE_SIZE_OPTIONS
            .iter()
            .rev()
            .copied()
            .find(|&s| s < current)
            .unwrap_or(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_matches_ceiling() {
        for page_size in 1..=12 {
            let window = PageWindow::new(page_size);
            for len in 0usize..=60 {
                let expected = std::cmp::max(1, len.div_ceil(page_size));
                assert_eq!(window.page_count(len), expected, "len {len} size {page_size}");
            }
        }
    }

    #[test]
    fn every_reachable_page_has_the_right_slice_length() {
        for page_size in 1..=7 {
            for len in 0usize..=30 {
                let rows: Vec<usize> = (0..len).collect();
                let mut window = PageWindow::new(page_size);
                loop {
                    let visible = window.slice(&rows);
                    let expected =
                        std::cmp::min(page_size, len - window.page_index() * page_size);
                    assert!(visible.len() <= page_size);
                    assert_eq!(visible.len(), expected);
                    if !window.can_go_next(len) {
                        break;
                    }
                    window.next_page(len);
                }
            }
        }
    }

    #[test]
    fn next_then_prev_round_trips_from_interior_page() {
        let len = 100;
        let mut window = PageWindow::new(10);
        window.next_page(len);
        window.next_page(len);
        let start = window.page_index();
        window.next_page(len);
        window.prev_page();
        assert_eq!(window.page_index(), start);
    }

    #[test]
    fn boundary_flags() {
        let len = 25;
        let mut window = PageWindow::new(10);
        assert!(!window.can_go_prev());
        assert!(window.can_go_next(len));

        window.last_page(len);
        assert_eq!(window.page_index(), 2);
        assert!(window.can_go_prev());
        assert!(!window.can_go_next(len));

        let single = PageWindow::new(10);
        assert!(!single.can_go_prev());
        assert!(!single.can_go_next(10));
    }

    #[test]
    fn twenty_five_rows_in_pages_of_ten() {
        let rows: Vec<usize> = (0..25).collect();
        let mut window = PageWindow::new(10);
        assert_eq!(window.page_count(rows.len()), 3);

        window.next_page(rows.len());
        window.next_page(rows.len());
        assert_eq!(window.page_index(), 2);
        assert_eq!(window.slice(&rows), &[20, 21, 22, 23, 24]);

        window.next_page(rows.len());
        assert_eq!(window.page_index(), 2);
    }

    #[test]
    fn empty_collection() {
        let rows: Vec<usize> = Vec::new();
        let mut window = PageWindow::new(10);
        assert_eq!(window.page_count(0), 1);
        assert!(window.slice(&rows).is_empty());
        assert!(!window.can_go_next(0));
        assert!(!window.can_go_prev());

        window.next_page(0);
        window.prev_page();
        assert_eq!(window.page_index(), 0);
    }

    #[test]
    fn shrinking_collection_clamps() {
        let mut window = PageWindow::new(10);
        window.last_page(95);
        assert_eq!(window.page_index(), 9);

        // An unclamped window still yields an in bounds, empty range.
        assert_eq!(window.range(12), 12..12);

        window.clamp(12);
        assert_eq!(window.page_index(), 1);
        assert_eq!(window.range(12), 10..12);
    }

    #[test]
    fn zero_page_size_is_raised_to_one() {
        let window = PageWindow::new(0);
        assert_eq!(window.page_size(), 1);
        assert_eq!(window.page_count(3), 3);
    }

    #[test]
    fn page_size_change_keeps_first_row_visible() {
        let len = 100;
        let mut window = PageWindow::new(10);
        window.next_page(len);
        window.next_page(len);
        window.next_page(len); // rows 30..40
        window.set_page_size(20, len);
        assert_eq!(window.page_index(), 1); // rows 20..40
        assert!(window.range(len).contains(&30));

        window.set_page_size(5, len);
        assert_eq!(window.range(len), 20..25);
    }

    #[test]
    fn page_size_cycles_within_options() {
        assert_eq!(cycle_page_size(10, true), 20);
        assert_eq!(cycle_page_size(10, false), 5);
        assert_eq!(cycle_page_size(100, true), 100);
        assert_eq!(cycle_page_size(5, false), 5);
        assert_eq!(cycle_page_size(7, true), 10);
    }
}
