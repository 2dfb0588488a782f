use tracing::{debug, trace};

use crate::columns::{Column, product_columns};
use crate::detail::{DetailRequest, DetailView};
use crate::domain::Message;
use crate::item::Item;
use crate::pagination::{PageWindow, cycle_page_size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: usize,
    pub ascending: bool,
}

/// Controller for the paginated product table of one mounted dashboard.
///
/// `items` is the collection in the order it was received. `rows` maps the
/// displayed row position to an index into `items` and is the only thing a
/// sort touches.
pub struct ProductTable {
    items: Vec<Item>,
    rows: Vec<usize>,
    columns: Vec<Column>,
    window: PageWindow,
    load_state: LoadState,
    sort: Option<SortOrder>,
    cursor_row: usize,    // Row inside the current page
    cursor_column: usize, // Index into columns
    offset_column: usize, // First rendered column
    visible_columns: Vec<(usize, usize)>,
    detail: DetailView,
    generation: u64,
}

impl ProductTable {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            rows: Vec::new(),
            columns: product_columns(),
            window: PageWindow::new(page_size),
            load_state: LoadState::Loading,
            sort: None,
            cursor_row: 0,
            cursor_column: 0,
            offset_column: 0,
            visible_columns: Vec::new(),
            detail: DetailView::Closed,
            generation: 0,
        }
    }

    // -------------------------- Collection ------------------------------ //

    /// Replace the whole collection with a freshly loaded one.
    pub fn replace_collection(&mut self, items: Vec<Item>) {
        debug!("Replacing collection with {} items", items.len());
        self.items = items;
        self.rows = (0..self.items.len()).collect();
        self.load_state = LoadState::Loaded;
        if let Some(order) = self.sort {
            self.apply_sort(order);
        }
        self.clamp();
    }

    /// Loading failed, the collection stays as it was.
    pub fn collection_failed(&mut self) {
        self.load_state = LoadState::Failed;
    }

    pub fn begin_reload(&mut self) {
        self.load_state = LoadState::Loading;
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    // -------------------------- Pagination ------------------------------ //

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn page_index(&self) -> usize {
        self.window.page_index()
    }

    pub fn page_count(&self) -> usize {
        self.window.page_count(self.len())
    }

    pub fn can_go_next(&self) -> bool {
        self.window.can_go_next(self.len())
    }

    pub fn can_go_prev(&self) -> bool {
        self.window.can_go_prev()
    }

    pub fn next_page(&mut self) {
        self.window.next_page(self.len());
        self.clamp();
    }

    pub fn prev_page(&mut self) {
        self.window.prev_page();
        self.clamp();
    }

    pub fn first_page(&mut self) {
        self.window.first_page();
        self.clamp();
    }

    pub fn last_page(&mut self) {
        self.window.last_page(self.len());
        self.clamp();
    }

    pub fn cycle_page_size(&mut self, larger: bool) {
        let size = cycle_page_size(self.window.page_size(), larger);
        let first_selected = self.window.range(self.len()).start + self.cursor_row;
        self.window.set_page_size(size, self.len());
        // Keep the selected row selected if it is still on the page.
        let range = self.window.range(self.len());
        self.cursor_row = if range.contains(&first_selected) {
            first_selected - range.start
        } else {
            0
        };
        self.clamp();
    }

    /// Items of the visible page, in display order.
    pub fn page(&self) -> Vec<&Item> {
        self.window
            .slice(&self.rows)
            .iter()
            .map(|&idx| &self.items[idx])
            .collect()
    }

    /// Displayed row range of the current page, `start..end` over all rows.
    pub fn page_rows(&self) -> std::ops::Range<usize> {
        self.window.range(self.len())
    }

    fn clamp(&mut self) {
        self.window.clamp(self.len());
        let visible = self.page_rows().len();
        self.cursor_row = std::cmp::min(self.cursor_row, visible.saturating_sub(1));
        self.cursor_column = std::cmp::min(self.cursor_column, self.columns.len() - 1);
        self.offset_column = std::cmp::min(self.offset_column, self.cursor_column);
    }

    // -------------------------- Selection ------------------------------- //

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn cursor_column(&self) -> usize {
        self.cursor_column
    }

    pub fn selected_item(&self) -> Option<&Item> {
        let row = self.page_rows().start + self.cursor_row;
        self.rows.get(row).map(|&idx| &self.items[idx])
    }

    pub fn move_up(&mut self) {
        self.cursor_row = self.cursor_row.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let visible = self.page_rows().len();
        if self.cursor_row + 1 < visible {
            self.cursor_row += 1;
        }
    }

    pub fn move_left(&mut self) {
        self.cursor_column = self.cursor_column.saturating_sub(1);
        if self.cursor_column < self.offset_column {
            self.offset_column = self.cursor_column;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_column + 1 < self.columns.len() {
            self.cursor_column += 1;
        }
    }

    /// Work out which columns fit into `width` characters, starting at the
    /// column offset. Columns are separated by one space and the last one may
    /// be cut. The offset moves so the cursor column is always rendered.
    pub fn layout_columns(&mut self, width: usize) {
        loop {
            let visible = Self::fit_columns(&self.columns, self.offset_column, width);
            let cursor_shown = visible.iter().any(|&(c, _)| c == self.cursor_column);
            if cursor_shown || self.offset_column >= self.cursor_column {
                trace!(
                    "Visible columns {:?} at offset {} for width {}",
                    visible, self.offset_column, width
                );
                self.visible_columns = visible;
                return;
            }
            self.offset_column += 1;
        }
    }

    /// `(column index, render width)` of the columns to draw.
    pub fn visible_columns(&self) -> &[(usize, usize)] {
        &self.visible_columns
    }

    fn fit_columns(columns: &[Column], offset: usize, width: usize) -> Vec<(usize, usize)> {
        let mut visible = Vec::new();
        let mut used = 0;
        for (cidx, column) in columns.iter().enumerate().skip(offset) {
            if used + column.width() + 1 <= width {
                visible.push((cidx, column.width()));
                used += column.width() + 1;
            } else {
                // Add the last partially visible column
                if used < width {
                    visible.push((cidx, width - used));
                }
                break;
            }
        }
        visible
    }

    /// Activate the cell under the cursor, falling back to the row action when
    /// the cursor sits on a plain field.
    pub fn activate(&self) -> Option<Message> {
        let item = self.selected_item()?;
        self.columns[self.cursor_column].invoke(item).or_else(|| {
            self.columns
                .iter()
                .find_map(|column| column.invoke(item))
        })
    }

    // ---------------------------- Sorting ------------------------------- //

    pub fn sort(&self) -> Option<SortOrder> {
        self.sort
    }

    /// Sort by the column under the cursor. The actions column is not sortable.
    pub fn sort_current_column(&mut self, ascending: bool) -> bool {
        if self.columns[self.cursor_column].field().is_none() {
            return false;
        }
        let order = SortOrder {
            column: self.cursor_column,
            ascending,
        };
        self.apply_sort(order);
        self.sort = Some(order);
        self.clamp();
        true
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.rows = (0..self.items.len()).collect();
        self.clamp();
    }

    fn apply_sort(&mut self, order: SortOrder) {
        let column = &self.columns[order.column];
        let Some(field) = column.field() else {
            return;
        };
        let items = &self.items;
        // Stable sort, equal keys keep the received order.
        self.rows.sort_by(|&a, &b| {
            let ordering = field.compare(&items[a], &items[b]);
            if order.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        if order.ascending {
            trace!("Sorted by {} ascending", column.key());
        } else {
            trace!("Sorted by {} descending", column.key());
        }
    }

    /// Copy of the selected row as one csv line.
    pub fn selected_row_csv(&self) -> Option<String> {
        let item = self.selected_item()?;
        let line = self
            .columns
            .iter()
            .filter(|c| c.field().is_some())
            .map(|c| wrap_cell_content(&c.cell(item).text()))
            .collect::<Vec<String>>()
            .join(",");
        Some(line)
    }

    // ------------------------- Detail dialog ---------------------------- //

    pub fn detail(&self) -> &DetailView {
        &self.detail
    }

    /// Open the detail dialog for `id` and hand out the request to fetch.
    pub fn open_detail(&mut self, id: u64) -> DetailRequest {
        self.generation += 1;
        let request = DetailRequest {
            id,
            generation: self.generation,
        };
        self.detail.open(request);
        request
    }

    pub fn resolve_detail<E>(&mut self, request: DetailRequest, result: Result<Item, E>) -> bool {
        self.detail.resolve(request, result)
    }

    pub fn close_detail(&mut self) {
        self.detail.close();
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping || needs_escaping {
        out = format!("\"{out}\"");
    }
    out
}
