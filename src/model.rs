use std::time::Instant;

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, error, info, trace, warn};

use crate::catalog::FetchError;
use crate::config::AppConfig;
use crate::detail::DetailRequest;
use crate::domain::{AppError, Command, HELP_TEXT, Message, Route};
use crate::item::Item;
use crate::login::{FormAction, LoginForm};
use crate::session::{GuardDecision, Session, guard};
use crate::table::{LoadState, ProductTable};
use crate::ui::{SIDENAV_WIDTH, STATUSLINE_HEIGHT};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    DETAIL,
    POPUP,
}

/// State of a mounted dashboard. Dropped on unmount.
pub struct Dashboard {
    mount: u64,
    pub table: ProductTable,
}

pub struct Model {
    config: AppConfig,
    pub status: Status,
    route: Route,
    session: Session,
    login: LoginForm,
    dashboard: Option<Dashboard>,
    mounts: u64,
    modus: Modus,
    previous_modus: Modus,
    popup_message: Option<String>,
    width: usize,
    height: usize,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    /// Create the model and enter `route`. The returned commands are the
    /// effects of that first navigation.
    pub fn init(
        config: &AppConfig,
        session: Session,
        route: Route,
        ui_width: usize,
        ui_height: usize,
    ) -> (Self, Vec<Command>) {
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            route: Route::Login,
            session,
            login: LoginForm::default(),
            dashboard: None,
            mounts: 0,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            popup_message: None,
            width: ui_width,
            height: ui_height,
            status_message: "Started catalog-admin!".to_string(),
            last_status_message_update: Instant::now(),
        };
        let commands = model.navigate(route);
        (model, commands)
    }

    // ------------------------------ Access ------------------------------- //

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn login(&self) -> &LoginForm {
        &self.login
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn popup_message(&self) -> Option<&str> {
        match self.modus {
            Modus::POPUP => self.popup_message.as_deref(),
            _ => None,
        }
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    /// On the login screen every key goes to the form.
    pub fn raw_keyevents(&self) -> bool {
        self.route == Route::Login
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    // ----------------------------- Routing ------------------------------- //

    fn navigate(&mut self, route: Route) -> Vec<Command> {
        trace!("Navigate {} -> {}", self.route.path(), route.path());
        if self.route == Route::Dashboard && route != Route::Dashboard {
            self.unmount_dashboard();
        }
        self.route = route;
        match route {
            Route::Login => Vec::new(),
            Route::Dashboard => self.mount_dashboard(),
        }
    }

    fn mount_dashboard(&mut self) -> Vec<Command> {
        if let GuardDecision::Redirect(target) = guard(&self.session) {
            info!("Dashboard requires a session, redirecting to {}", target.path());
            self.route = target;
            self.dashboard = None;
            return Vec::new();
        }
        if let Some(dashboard) = &self.dashboard {
            debug!("Dashboard {} already mounted", dashboard.mount);
            return Vec::new();
        }

        self.mounts += 1;
        let mut table = ProductTable::new(self.config.page_size);
        table.layout_columns(self.table_width());
        self.dashboard = Some(Dashboard {
            mount: self.mounts,
            table,
        });
        self.modus = Modus::TABLE;
        self.set_status_message("Loading products ...");
        info!("Mounted dashboard {}", self.mounts);
        vec![Command::FetchProducts { mount: self.mounts }]
    }

    fn unmount_dashboard(&mut self) {
        if let Some(dashboard) = self.dashboard.take() {
            info!("Unmounted dashboard {}", dashboard.mount);
        }
        self.modus = Modus::TABLE;
        self.popup_message = None;
    }

    fn table_width(&self) -> usize {
        self.width.saturating_sub(SIDENAV_WIDTH + 2)
    }

    fn resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.width, width, self.height, height
        );
        self.width = width;
        self.height = height.max(STATUSLINE_HEIGHT);
        let table_width = self.table_width();
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.table.layout_columns(table_width);
        }
    }

    // ------------------------------ Update ------------------------------- //

    pub fn update(&mut self, message: Option<Message>) -> Vec<Command> {
        let Some(msg) = message else {
            return Vec::new();
        };

        let commands = match msg {
            Message::Quit => {
                self.quit();
                Vec::new()
            }
            Message::Resize(width, height) => {
                self.resize(width, height);
                Vec::new()
            }
            Message::LoginFinished(result) => self.login_finished(result),
            Message::ProductsLoaded { mount, result } => self.products_loaded(mount, result),
            Message::DetailLoaded {
                mount,
                request,
                result,
            } => self.detail_loaded(mount, request, result),
            msg => match self.route {
                Route::Login => self.update_login(msg),
                Route::Dashboard => self.update_dashboard(msg),
            },
        };

        // Cursor or page changes can move the cursor column out of view.
        let table_width = self.table_width();
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.table.layout_columns(table_width);
        }
        commands
    }

    fn update_login(&mut self, msg: Message) -> Vec<Command> {
        match msg {
            Message::RawKey(key) => self.login_key(key),
            _ => Vec::new(),
        }
    }

    fn login_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match self.login.handle_key(key) {
            FormAction::Submit(credentials) => {
                info!("Logging in as {}", credentials.username);
                self.set_status_message("Logging in ...");
                vec![Command::Login(credentials)]
            }
            FormAction::None => Vec::new(),
        }
    }

    fn login_finished(&mut self, result: Result<String, FetchError>) -> Vec<Command> {
        match result {
            Ok(token) => {
                self.login.login_succeeded();
                self.session.sign_in(token);
                if !self.session.is_authenticated() {
                    self.login.login_failed("Invalid username or password");
                    error!("Login answered with an empty token");
                    return Vec::new();
                }
                self.set_status_message("Logged in");
                let mut commands = vec![Command::PersistSession(self.session.clone())];
                commands.extend(self.navigate(Route::Dashboard));
                commands
            }
            Err(e) => {
                error!("{}", AppError::Login(e));
                self.login.login_failed("Invalid username or password");
                self.set_status_message("Invalid username or password");
                Vec::new()
            }
        }
    }

    fn logout(&mut self) -> Vec<Command> {
        info!("Logging out");
        self.session.sign_out();
        self.set_status_message("Logged out");
        let mut commands = vec![Command::ClearSession];
        commands.extend(self.navigate(Route::Login));
        commands
    }

    fn products_loaded(&mut self, mount: u64, result: Result<Vec<Item>, FetchError>) -> Vec<Command> {
        let Some(dashboard) = self.dashboard.as_mut().filter(|d| d.mount == mount) else {
            warn!("Dropping products for unmounted dashboard {mount}");
            return Vec::new();
        };
        let message = match result {
            Ok(items) => {
                let count = items.len();
                dashboard.table.replace_collection(items);
                format!("Loaded {count} products")
            }
            Err(e) => {
                dashboard.table.collection_failed();
                error!("{}", AppError::CollectionFetch(e));
                "Could not load products, press r to retry".to_string()
            }
        };
        self.set_status_message(message);
        Vec::new()
    }

    fn detail_loaded(
        &mut self,
        mount: u64,
        request: DetailRequest,
        result: Result<Item, FetchError>,
    ) -> Vec<Command> {
        let Some(dashboard) = self.dashboard.as_mut().filter(|d| d.mount == mount) else {
            warn!("Dropping product {} for unmounted dashboard {mount}", request.id);
            return Vec::new();
        };
        let failed = result.is_err();
        let result = result.map_err(|source| {
            let err = AppError::DetailFetch {
                id: request.id,
                source,
            };
            error!("{err}");
            err
        });
        if dashboard.table.resolve_detail(request, result) && failed {
            self.set_status_message(format!("Could not load product {}", request.id));
        }
        Vec::new()
    }

    fn update_dashboard(&mut self, msg: Message) -> Vec<Command> {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return Vec::new();
        };
        let mount = dashboard.mount;
        let table = &mut dashboard.table;

        match self.modus {
            Modus::TABLE => match msg {
                Message::MoveUp => table.move_up(),
                Message::MoveDown => table.move_down(),
                Message::MoveLeft => table.move_left(),
                Message::MoveRight => table.move_right(),
                Message::NextPage => table.next_page(),
                Message::PrevPage => table.prev_page(),
                Message::FirstPage => table.first_page(),
                Message::LastPage => table.last_page(),
                Message::LargerPages => table.cycle_page_size(true),
                Message::SmallerPages => table.cycle_page_size(false),
                Message::SortAscending => {
                    if !table.sort_current_column(true) {
                        self.set_status_message("Column can not be sorted");
                    }
                }
                Message::SortDescending => {
                    if !table.sort_current_column(false) {
                        self.set_status_message("Column can not be sorted");
                    }
                }
                Message::ClearSort => table.clear_sort(),
                Message::Activate => {
                    if let Some(next) = table.activate() {
                        return self.update_dashboard(next);
                    }
                }
                Message::ViewDetails(id) => {
                    let request = table.open_detail(id);
                    self.previous_modus = self.modus;
                    self.modus = Modus::DETAIL;
                    return vec![Command::FetchProduct { mount, request }];
                }
                Message::CopyRow => {
                    if let Some(line) = table.selected_row_csv() {
                        self.set_status_message("Copied row to clipboard");
                        return vec![Command::CopyToClipboard(line)];
                    }
                }
                Message::Retry => {
                    if table.load_state() == LoadState::Failed {
                        table.begin_reload();
                        self.set_status_message("Loading products ...");
                        return vec![Command::FetchProducts { mount }];
                    }
                }
                Message::Logout => return self.logout(),
                Message::Help => self.show_help(),
                _ => (),
            },
            Modus::DETAIL => match msg {
                Message::Exit | Message::Activate => {
                    table.close_detail();
                    self.modus = Modus::TABLE;
                    self.previous_modus = Modus::DETAIL;
                }
                // Paging stays usable while a detail is open.
                Message::NextPage => table.next_page(),
                Message::PrevPage => table.prev_page(),
                Message::Help => self.show_help(),
                _ => (),
            },
            Modus::POPUP => {
                if let Message::Exit = msg {
                    trace!("Close popup ...");
                    self.modus = self.previous_modus;
                    self.previous_modus = Modus::POPUP;
                    self.popup_message = None;
                }
            }
        }
        Vec::new()
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.popup_message = Some(HELP_TEXT.to_string());
    }
}

#[cfg(test)]
mod tests {
    use ratatui::crossterm::event::KeyCode;

    use super::*;
    use crate::detail::DetailView;
    use crate::inputter::key;
    use crate::item::sample;

    fn model(session: Session) -> (Model, Vec<Command>) {
        Model::init(&AppConfig::default(), session, Route::Dashboard, 120, 40)
    }

    /// Authenticated model with a loaded collection of `n` products.
    fn loaded(n: u64) -> Model {
        let (mut model, _) = model(Session::with_token("t"));
        model.update(Some(Message::ProductsLoaded {
            mount: 1,
            result: Ok((1..=n).map(sample).collect()),
        }));
        model
    }

    fn table(model: &Model) -> &ProductTable {
        &model.dashboard().unwrap().table
    }

    fn ids(model: &Model) -> Vec<u64> {
        table(model).page().iter().map(|item| item.id).collect()
    }

    fn type_into(model: &mut Model, text: &str) -> Vec<Command> {
        text.chars()
            .flat_map(|c| model.update(Some(Message::RawKey(key(KeyCode::Char(c))))))
            .collect()
    }

    #[test]
    fn anonymous_dashboard_redirects_to_login() {
        let (model, commands) = model(Session::anonymous());
        assert!(commands.is_empty());
        assert_eq!(model.route(), Route::Login);
        assert!(model.dashboard().is_none());
        assert!(model.raw_keyevents());
    }

    #[test]
    fn mounting_dashboard_fetches_products() {
        let (model, commands) = model(Session::with_token("t"));
        assert_eq!(commands, vec![Command::FetchProducts { mount: 1 }]);
        assert_eq!(model.route(), Route::Dashboard);
        assert_eq!(table(&model).load_state(), LoadState::Loading);
        assert!(table(&model).is_empty());
    }

    #[test]
    fn loaded_collection_pages_by_ten() {
        let mut model = loaded(25);
        assert_eq!(table(&model).load_state(), LoadState::Loaded);
        assert_eq!(ids(&model), (1..=10).collect::<Vec<u64>>());
        assert!(!table(&model).can_go_prev());

        model.update(Some(Message::NextPage));
        model.update(Some(Message::NextPage));
        assert_eq!(ids(&model), (21..=25).collect::<Vec<u64>>());
        assert!(!table(&model).can_go_next());

        // Stays on the last page.
        model.update(Some(Message::NextPage));
        assert_eq!(table(&model).page_index(), 2);

        model.update(Some(Message::FirstPage));
        assert_eq!(table(&model).page_index(), 0);
    }

    #[test]
    fn answers_for_old_mounts_are_dropped() {
        let mut model = loaded(3);
        model.update(Some(Message::ProductsLoaded {
            mount: 99,
            result: Ok((1..=25).map(sample).collect()),
        }));
        assert_eq!(table(&model).len(), 3);
    }

    #[test]
    fn view_details_opens_loading_dialog() {
        let mut model = loaded(25);
        let commands = model.update(Some(Message::ViewDetails(4)));
        let request = DetailRequest {
            id: 4,
            generation: 1,
        };
        assert_eq!(commands, vec![Command::FetchProduct { mount: 1, request }]);
        assert!(table(&model).detail().is_open());
        assert!(table(&model).detail().is_loading());

        model.update(Some(Message::DetailLoaded {
            mount: 1,
            request,
            result: Ok(sample(4)),
        }));
        assert_eq!(table(&model).detail().selected().map(|i| i.id), Some(4));
    }

    #[test]
    fn activate_opens_detail_of_selected_row() {
        let mut model = loaded(25);
        model.update(Some(Message::MoveDown));
        let commands = model.update(Some(Message::Activate));
        assert!(matches!(
            commands.as_slice(),
            [Command::FetchProduct { request, .. }] if request.id == 2
        ));
    }

    #[test]
    fn failed_detail_then_close() {
        let mut model = loaded(25);
        model.update(Some(Message::ViewDetails(7)));
        model.update(Some(Message::DetailLoaded {
            mount: 1,
            request: DetailRequest {
                id: 7,
                generation: 1,
            },
            result: Err(FetchError::Status {
                url: "http://fake/products/7".to_string(),
                status: 500,
            }),
        }));
        assert_eq!(*table(&model).detail(), DetailView::Failed(7));
        assert_eq!(model.status_message(), "Could not load product 7");

        model.update(Some(Message::Exit));
        assert!(!table(&model).detail().is_open());

        // Back in table mode, keys move the cursor again.
        model.update(Some(Message::MoveDown));
        assert_eq!(table(&model).cursor_row(), 1);
    }

    #[test]
    fn stale_detail_answer_is_ignored() {
        let mut model = loaded(25);
        model.update(Some(Message::ViewDetails(1)));
        model.update(Some(Message::Exit));
        model.update(Some(Message::ViewDetails(2)));
        model.update(Some(Message::DetailLoaded {
            mount: 1,
            request: DetailRequest {
                id: 1,
                generation: 1,
            },
            result: Ok(sample(1)),
        }));
        assert!(table(&model).detail().is_loading());
    }

    #[test]
    fn successful_login_persists_and_mounts() {
        let (mut model, _) = model(Session::anonymous());
        type_into(&mut model, "emilys");
        model.update(Some(Message::RawKey(key(KeyCode::Tab))));
        type_into(&mut model, "emilyspass");
        let commands = model.update(Some(Message::RawKey(key(KeyCode::Enter))));
        assert!(matches!(
            commands.as_slice(),
            [Command::Login(c)] if c.username == "emilys" && c.password == "emilyspass"
        ));
        assert!(model.login().is_pending());

        let commands = model.update(Some(Message::LoginFinished(Ok("token-abc".to_string()))));
        assert_eq!(
            commands,
            vec![
                Command::PersistSession(Session::with_token("token-abc")),
                Command::FetchProducts { mount: 1 },
            ]
        );
        assert_eq!(model.route(), Route::Dashboard);
        assert_eq!(model.session().token(), Some("token-abc"));
    }

    #[test]
    fn failed_login_stays_on_form() {
        let (mut model, _) = model(Session::anonymous());
        model.update(Some(Message::RawKey(key(KeyCode::Tab))));
        let commands = model.update(Some(Message::RawKey(key(KeyCode::Enter))));
        assert!(commands.is_empty());
        assert_eq!(model.login().username_error(), Some("Username is required"));

        model.update(Some(Message::RawKey(key(KeyCode::Tab))));
        type_into(&mut model, "emilys");
        model.update(Some(Message::RawKey(key(KeyCode::Tab))));
        type_into(&mut model, "wrong");
        let commands = model.update(Some(Message::RawKey(key(KeyCode::Enter))));
        assert_eq!(commands.len(), 1);
        let commands = model.update(Some(Message::LoginFinished(Err(FetchError::Unauthorized))));
        assert!(commands.is_empty());
        assert_eq!(model.route(), Route::Login);
        assert_eq!(model.login().failure(), Some("Invalid username or password"));
        assert!(!model.login().is_pending());
    }

    #[test]
    fn logout_clears_session_and_unmounts() {
        let mut model = loaded(5);
        let commands = model.update(Some(Message::Logout));
        assert_eq!(commands, vec![Command::ClearSession]);
        assert_eq!(model.route(), Route::Login);
        assert!(model.dashboard().is_none());
        assert!(!model.session().is_authenticated());

        // A late answer for the unmounted dashboard changes nothing.
        model.update(Some(Message::ProductsLoaded {
            mount: 1,
            result: Ok(Vec::new()),
        }));
        assert!(model.dashboard().is_none());
    }

    #[test]
    fn retry_only_after_failure() {
        let (mut model, _) = model(Session::with_token("t"));
        assert!(model.update(Some(Message::Retry)).is_empty());

        model.update(Some(Message::ProductsLoaded {
            mount: 1,
            result: Err(FetchError::Unauthorized),
        }));
        assert_eq!(table(&model).load_state(), LoadState::Failed);
        assert_eq!(
            model.update(Some(Message::Retry)),
            vec![Command::FetchProducts { mount: 1 }]
        );
        assert_eq!(table(&model).load_state(), LoadState::Loading);
    }

    #[test]
    fn help_popup_captures_keys_until_closed() {
        let mut model = loaded(25);
        model.update(Some(Message::Help));
        assert!(model.popup_message().is_some());

        model.update(Some(Message::MoveDown));
        assert_eq!(table(&model).cursor_row(), 0);

        model.update(Some(Message::Exit));
        assert!(model.popup_message().is_none());
        model.update(Some(Message::MoveDown));
        assert_eq!(table(&model).cursor_row(), 1);
    }

    #[test]
    fn copy_row_requests_clipboard() {
        let mut model = loaded(2);
        let commands = model.update(Some(Message::CopyRow));
        assert!(matches!(
            commands.as_slice(),
            [Command::CopyToClipboard(line)] if line.starts_with("1,")
        ));
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut model = loaded(1);
        model.update(Some(Message::Quit));
        assert_eq!(model.status, Status::QUITTING);
    }
}
