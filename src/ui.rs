use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, Wrap},
};

use crate::columns::Cell as TableCell;
use crate::config::AppConfig;
use crate::detail::DetailView;
use crate::domain::Route;
use crate::login::{LoginField, LoginForm};
use crate::model::{Dashboard, Model};
use crate::table::{LoadState, ProductTable};

pub const SIDENAV_WIDTH: usize = 16;
pub const STATUSLINE_HEIGHT: usize = 1;
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);
const LOGIN_WIDTH: u16 = 44;
const LOGIN_HEIGHT: u16 = 15;

pub struct TableUI {
    base_url: String,
}

impl TableUI {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
        }
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let [body, statusline] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        match (model.route(), model.dashboard()) {
            (Route::Dashboard, Some(dashboard)) => self.draw_dashboard(dashboard, frame, body),
            // Guard redirected or not yet mounted, nothing to render for the dashboard.
            (Route::Dashboard, None) => {}
            (Route::Login, _) => self.draw_login(model.login(), frame, body),
        }
        self.draw_statusline(model, frame, statusline);

        if let Some(message) = model.popup_message() {
            draw_popup(frame, " Help ", message);
        }
    }

    // ------------------------------ Login -------------------------------- //

    fn draw_login(&self, form: &LoginForm, frame: &mut Frame, area: Rect) {
        let [area] = Layout::horizontal([Constraint::Length(LOGIN_WIDTH)])
            .flex(Flex::Center)
            .areas(area);
        let [area] = Layout::vertical([Constraint::Length(LOGIN_HEIGHT)])
            .flex(Flex::Center)
            .areas(area);

        let block = Block::bordered()
            .title(Line::from(" Login ".bold()).centered())
            .title_bottom(
                Line::from(vec![
                    " Next ".into(),
                    "<Tab>".blue().bold(),
                    " Submit ".into(),
                    "<Enter>".blue().bold(),
                    " Quit ".into(),
                    "<Ctrl-c> ".blue().bold(),
                ])
                .centered(),
            )
            .border_set(border::THICK);
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);

        let [banner, user, user_error, pass, pass_error, _, button] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        if let Some(failure) = form.failure() {
            frame.render_widget(
                Paragraph::new(Line::from(failure.to_string().red().bold()).centered()),
                banner,
            );
        }

        for (field, input_area, error_area, label, value, error) in [
            (
                LoginField::Username,
                user,
                user_error,
                "Username",
                form.username().display(),
                form.username_error(),
            ),
            (
                LoginField::Password,
                pass,
                pass_error,
                "Password",
                form.password().display(),
                form.password_error(),
            ),
        ] {
            let focused = form.focus() == field;
            let mut style = Style::default();
            if error.is_some() {
                style = style.red();
            } else if focused {
                style = style.yellow();
            }
            let block = Block::bordered().title(label).border_style(style);
            let cursor_x = input_area.x + 1 + self.cursor_column(form, field) as u16;
            frame.render_widget(Paragraph::new(value).block(block), input_area);
            if let Some(error) = error {
                frame.render_widget(Paragraph::new(error.red()), error_area);
            }
            if focused && !form.is_pending() {
                frame.set_cursor_position((
                    cursor_x.min(input_area.right().saturating_sub(2)),
                    input_area.y + 1,
                ));
            }
        }

        let label = if form.is_pending() {
            "Logging in ...".dim()
        } else {
            "[ Login ]".bold()
        };
        frame.render_widget(Paragraph::new(Line::from(label).centered()), button);
    }

    fn cursor_column(&self, form: &LoginForm, field: LoginField) -> usize {
        match field {
            LoginField::Username => form.username().cursor_pos(),
            LoginField::Password => form.password().cursor_pos(),
        }
    }

    // ---------------------------- Dashboard ------------------------------ //

    fn draw_dashboard(&self, dashboard: &Dashboard, frame: &mut Frame, area: Rect) {
        let [sidenav, main] = Layout::horizontal([
            Constraint::Length(SIDENAV_WIDTH as u16),
            Constraint::Min(0),
        ])
        .areas(area);

        let nav = Text::from(vec![
            Line::from("Catalog".bold()),
            Line::from(""),
            Line::from("▸ Products".yellow()),
            Line::from(""),
            Line::from(vec!["<L>".blue().bold(), " Logout".into()]),
        ]);
        frame.render_widget(
            Paragraph::new(nav).block(Block::bordered().border_set(border::PLAIN)),
            sidenav,
        );

        let table = &dashboard.table;
        let [table_area, pager] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(main);

        let block = Block::bordered()
            .title(Line::from(" Products ".bold()))
            .title(Line::from(format!(" {} ", self.base_url).dim()).right_aligned())
            .border_set(border::THICK);

        if table.is_empty() {
            let text = match table.load_state() {
                LoadState::Loading => "Loading products ...".dim(),
                LoadState::Failed => "Could not load products. Press r to retry.".red(),
                LoadState::Loaded => "No products".dim(),
            };
            frame.render_widget(
                Paragraph::new(Line::from(text).centered()).block(block),
                table_area,
            );
        } else {
            frame.render_widget(product_table(table).block(block), table_area);
        }

        frame.render_widget(Paragraph::new(pager_line(table)), pager);

        if table.detail().is_open() {
            draw_detail(frame, table.detail());
        }
    }

    fn draw_statusline(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let message = if model.last_status_message_update().elapsed() < STATUS_MESSAGE_TIMEOUT {
            model.status_message().to_string()
        } else {
            String::new()
        };
        let user = if model.session().is_authenticated() {
            "signed in"
        } else {
            "signed out"
        };
        let state = match model.dashboard().map(|d| d.table.load_state()) {
            Some(LoadState::Loading) => " | loading",
            Some(LoadState::Loaded) => " | loaded",
            Some(LoadState::Failed) => " | load failed",
            None => "",
        };
        let right = format!("{}{state} | {user} | ? help ", model.route().path());
        let [left_area, right_area] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(right.chars().count() as u16),
        ])
        .areas(area);
        frame.render_widget(Paragraph::new(format!(" {message}")).reversed(), left_area);
        frame.render_widget(Paragraph::new(right).reversed(), right_area);
    }
}

fn product_table(table: &ProductTable) -> Table<'static> {
    let visible = table.visible_columns();
    let columns = table.columns();
    let sort = table.sort();

    let header = Row::new(visible.iter().map(|&(cidx, width)| {
        let mut label = columns[cidx].label().to_string();
        if let Some(order) = sort.filter(|o| o.column == cidx) {
            label.push_str(if order.ascending { " ▲" } else { " ▼" });
        }
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if cidx == table.cursor_column() {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        Cell::from(visible_text(&label, width)).style(style)
    }));

    let rows = table.page().into_iter().enumerate().map(|(ridx, item)| {
        let selected_row = ridx == table.cursor_row();
        let cells = visible.iter().map(|&(cidx, width)| {
            let cell = columns[cidx].cell(item);
            let mut style = match &cell {
                TableCell::Control(_) => Style::default().blue(),
                TableCell::Text(_) => Style::default(),
            };
            if selected_row && cidx == table.cursor_column() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let text = visible_text(&cell.text(), width);
            let numeric = columns[cidx].field().is_some_and(|f| f.is_numeric());
            if numeric {
                Cell::from(format!("{text:>width$}")).style(style)
            } else {
                Cell::from(text).style(style)
            }
        });
        let row = Row::new(cells.collect::<Vec<Cell>>());
        if selected_row {
            row.style(Style::default().add_modifier(Modifier::BOLD).yellow())
        } else {
            row
        }
    });

    let widths = visible
        .iter()
        .map(|&(_, width)| Constraint::Length(width as u16))
        .collect::<Vec<Constraint>>();

    Table::new(rows.collect::<Vec<Row>>(), widths)
        .header(header)
        .column_spacing(1)
}

fn pager_line(table: &ProductTable) -> Line<'static> {
    let range = table.page_rows();
    let rows = if range.is_empty() {
        format!("0 of {}", table.len())
    } else {
        format!("{}–{} of {}", range.start + 1, range.end, table.len())
    };
    let prev = if table.can_go_prev() {
        "‹ Prev <p>".blue().bold()
    } else {
        "‹ Prev <p>".dim()
    };
    let next = if table.can_go_next() {
        "Next <n> ›".blue().bold()
    } else {
        "Next <n> ›".dim()
    };
    Line::from(vec![
        format!(" Rows per page: {}   ", table.window().page_size()).into(),
        rows.into(),
        format!("   Page {}/{}   ", table.page_index() + 1, table.page_count()).into(),
        prev,
        "  ".into(),
        next,
    ])
    .right_aligned()
}

fn draw_detail(frame: &mut Frame, detail: &DetailView) {
    let text = if detail.is_loading() {
        Text::from(Line::from("Loading ...".dim()).centered())
    } else if let Some(item) = detail.selected() {
        Text::from(vec![
            Line::from(item.title.clone().bold()),
            Line::from(""),
            Line::from(item.description.clone()),
        ])
    } else {
        Text::from("No product selected")
    };
    let area = popup_area(frame.area(), 60, 40);
    let block = Block::bordered()
        .title(Line::from(" Product Reviews ".bold()))
        .title_bottom(Line::from(vec![" Close ".into(), "<Esc> ".blue().bold()]).right_aligned())
        .border_set(border::THICK);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_popup(frame: &mut Frame, title: &str, message: &str) {
    let area = popup_area(frame.area(), 60, 80);
    let block = Block::bordered()
        .title(Line::from(Span::from(title.to_string()).bold()))
        .title_bottom(Line::from(vec![" Close ".into(), "<Esc> ".blue().bold()]).right_aligned())
        .border_set(border::THICK);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(message.to_string()).block(block), area);
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

/// Cut `text` to `width` characters, marking the cut with "...".
fn visible_text(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width < 3 {
        return text.chars().take(width).collect();
    }
    let mut reduced: String = text.chars().take(width - 3).collect();
    reduced.push_str("...");
    reduced
}
