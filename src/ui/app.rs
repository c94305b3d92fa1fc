//! Application state: routes, the two controllers, and API event handling

use crate::api::{DEFAULT_PAGE_SIZE, RegistryClient};
use crate::models::{RoleSelection, User};
use crate::notify::{Notifications, Severity};
use super::event::ApiEvent;
use super::input::{InputMode, KeyBindings};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Routes of the application, mirroring the view tree: the search results
/// view plus the detail/edit pair scoped to one user key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    UserSearch,
    UserDetail { key: String },
    UserEdit { key: String },
}

impl Route {
    /// The user key this route is scoped to, if any
    pub fn user_key(&self) -> Option<&str> {
        match self {
            Route::UserSearch => None,
            Route::UserDetail { key } | Route::UserEdit { key } => Some(key),
        }
    }
}

/// Search controller state
#[derive(Debug, Default)]
pub struct SearchState {
    /// Query of the last applied search, shown in the results title
    pub search_string: String,
    pub results: Vec<User>,
    pub count: i64,
    pub index: usize,
    pub loading: bool,
    /// Token of the latest issued search; older completions are stale
    seq: u64,
}

/// Labels of the edit form's text fields, ahead of the country selector and
/// the role checkboxes
pub const EDIT_TEXT_FIELDS: [&str; 3] = ["First name", "Last name", "Email"];

/// Row index of the country selector in the edit form
pub const FIELD_COUNTRY: usize = EDIT_TEXT_FIELDS.len();

/// Number of form rows ahead of the role checkboxes
pub const FIXED_EDIT_FIELDS: usize = EDIT_TEXT_FIELDS.len() + 1;

/// Detail/edit controller for one user key.
///
/// Torn down and rebuilt whenever navigation enters a user route it does not
/// already cover; the detail/edit views share one activation.
#[derive(Debug)]
pub struct UserController {
    pub key: String,
    pub user: Option<User>,

    /// Selection map derived on load; its key set equals the role catalog
    pub roles: Option<RoleSelection>,

    /// Country enumeration for the edit form, fetched once per activation
    pub countries: Vec<String>,

    /// Working copy bound to the edit form
    pub draft: Option<User>,
    pub draft_roles: Option<RoleSelection>,
    pub field_index: usize,

    pub loading: bool,
    pub saving: bool,

    load_seq: u64,
    countries_seq: u64,
    mutation_seq: u64,
}

impl UserController {
    fn new(key: String) -> Self {
        Self {
            key,
            user: None,
            roles: None,
            countries: Vec::new(),
            draft: None,
            draft_roles: None,
            field_index: 0,
            loading: false,
            saving: false,
            load_seq: 0,
            countries_seq: 0,
            mutation_seq: 0,
        }
    }

    fn begin_edit(&mut self) {
        if self.draft.is_none() {
            self.draft = self.user.clone();
            self.draft_roles = self.roles.clone();
            self.field_index = 0;
        }
    }

    fn discard_draft(&mut self) {
        self.draft = None;
        self.draft_roles = None;
    }

    /// Number of rows in the edit form (text fields + country + roles)
    pub fn edit_field_count(&self) -> usize {
        FIXED_EDIT_FIELDS + self.draft_roles.as_ref().map(|r| r.len()).unwrap_or(0)
    }
}

/// Main application struct
pub struct App {
    /// Registry API client
    pub client: Arc<RegistryClient>,

    /// Route-scoped notification queues
    pub notifications: Notifications,

    /// Current route
    pub route: Route,

    /// Key binding style
    pub key_bindings: KeyBindings,

    /// Input mode
    pub input_mode: InputMode,

    /// Search popup input
    pub search_query: String,

    /// Inline text-field editing buffer
    pub edit_buffer: String,

    /// Search controller state
    pub search: SearchState,

    /// Detail/edit controller, present on user routes
    pub user: Option<UserController>,

    /// Feedback message (exports)
    pub message: Option<String>,

    /// Should quit
    pub should_quit: bool,

    events_tx: UnboundedSender<ApiEvent>,
    seq_counter: u64,
}

impl App {
    /// Create a new app instance
    pub fn new(
        client: Arc<RegistryClient>,
        key_bindings: KeyBindings,
        events_tx: UnboundedSender<ApiEvent>,
    ) -> Self {
        Self {
            client,
            notifications: Notifications::new(),
            route: Route::UserSearch,
            key_bindings,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            edit_buffer: String::new(),
            search: SearchState::default(),
            user: None,
            message: None,
            should_quit: false,
            events_tx,
            seq_counter: 0,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq_counter += 1;
        self.seq_counter
    }

    /// Change route.
    ///
    /// Promotes next-route notifications, re-activates the user controller
    /// when the target is a user route it does not already cover, and issues
    /// a fresh empty search when re-entering the search view.
    pub fn navigate(&mut self, route: Route) {
        self.notifications.route_changed();
        let entering_search = route == Route::UserSearch && self.route != Route::UserSearch;

        let activation_key = match route.user_key() {
            Some(key) if !self.user.as_ref().is_some_and(|c| c.key == key) => {
                Some(key.to_string())
            }
            Some(_) => None,
            None => {
                self.user = None;
                None
            }
        };
        self.route = route;

        if let Some(key) = activation_key {
            self.user = Some(UserController::new(key));
            self.load();
            self.load_countries();
        }

        // the controller reads its view from the route
        if let Some(controller) = self.user.as_mut() {
            match self.route {
                Route::UserEdit { .. } => controller.begin_edit(),
                _ => controller.discard_draft(),
            }
        }

        if entering_search {
            self.search(String::new());
        }
    }

    /// Issue a server-side search. The previous results stay visible until
    /// the response for this token arrives.
    pub fn search(&mut self, query: String) {
        let seq = self.next_seq();
        self.search.seq = seq;
        self.search.loading = true;

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = client.search_users(&query, DEFAULT_PAGE_SIZE).await;
            let _ = tx.send(ApiEvent::SearchCompleted { seq, query, outcome });
        });
    }

    /// Get the currently selected search result
    pub fn get_selected_user(&self) -> Option<&User> {
        self.search.results.get(self.search.index)
    }

    /// Open the detail view for the selected search result
    pub fn open_selected_user(&mut self) {
        if let Some(user) = self.get_selected_user() {
            let key = user.key.clone();
            self.navigate(Route::UserDetail { key });
        }
    }

    /// Fetch the user, then the role catalog, and derive the selection map.
    /// The two stages run sequentially and share one token.
    pub fn load(&mut self) {
        let seq = self.next_seq();
        let Some(controller) = self.user.as_mut() else {
            return;
        };
        controller.load_seq = seq;
        controller.loading = true;
        controller.roles = None;

        let key = controller.key.clone();
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = client.get_user(&key).await;
            let _ = tx.send(ApiEvent::UserLoaded { seq, outcome });
        });
    }

    fn load_roles(&mut self, seq: u64) {
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = client.get_roles().await;
            let _ = tx.send(ApiEvent::RolesLoaded { seq, outcome });
        });
    }

    fn load_countries(&mut self) {
        let seq = self.next_seq();
        let Some(controller) = self.user.as_mut() else {
            return;
        };
        controller.countries_seq = seq;

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = client.get_countries().await;
            let _ = tx.send(ApiEvent::CountriesLoaded { seq, outcome });
        });
    }

    /// Whether the edit view can open (user and role catalog are loaded)
    pub fn can_edit(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|c| c.user.is_some() && c.roles.is_some())
    }

    /// Open the edit view for the loaded user
    pub fn edit_user(&mut self) {
        if !self.can_edit() {
            return;
        }
        if let Some(key) = self.route.user_key().map(str::to_string) {
            self.navigate(Route::UserEdit { key });
        }
    }

    /// Rebuild the draft's roles from the selection map and persist it
    pub fn save(&mut self) {
        let seq = self.next_seq();
        let Some(controller) = self.user.as_mut() else {
            return;
        };
        let (Some(draft), Some(selection)) =
            (controller.draft.as_mut(), controller.draft_roles.as_ref())
        else {
            return;
        };
        selection.apply_to(draft);
        let user = draft.clone();
        controller.mutation_seq = seq;
        controller.saving = true;

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = client.update_user(&user).await;
            let _ = tx.send(ApiEvent::SaveCompleted { seq, outcome });
        });
    }

    /// Remove the user via the backend
    pub fn delete(&mut self) {
        let seq = self.next_seq();
        let Some(controller) = self.user.as_mut() else {
            return;
        };
        controller.mutation_seq = seq;

        let key = controller.key.clone();
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = client.delete_user(&key).await;
            let _ = tx.send(ApiEvent::DeleteCompleted { seq, outcome });
        });
    }

    /// Clear the deleted marker in place and persist the entity.
    /// Only meaningful for deleted users; never navigates.
    pub fn restore(&mut self) {
        let seq = self.next_seq();
        let Some(controller) = self.user.as_mut() else {
            return;
        };
        let Some(user) = controller.user.as_mut() else {
            return;
        };
        if user.deleted.is_none() {
            return;
        }
        user.deleted = None;
        let entity = user.clone();
        controller.mutation_seq = seq;

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = client.update_user(&entity).await;
            let _ = tx.send(ApiEvent::RestoreCompleted { seq, outcome });
        });
    }

    /// Discard unsaved edits: reload the user and return to the detail view
    pub fn cancel_edit(&mut self) {
        let Some(key) = self.route.user_key().map(str::to_string) else {
            return;
        };
        self.load();
        self.navigate(Route::UserDetail { key });
    }

    /// Navigate up in the current list
    pub fn navigate_up(&mut self) {
        match self.route {
            Route::UserSearch => {
                if self.search.index > 0 {
                    self.search.index -= 1;
                }
            }
            Route::UserEdit { .. } => {
                if let Some(controller) = self.user.as_mut() {
                    if controller.field_index > 0 {
                        controller.field_index -= 1;
                    }
                }
            }
            Route::UserDetail { .. } => {}
        }
    }

    /// Navigate down in the current list
    pub fn navigate_down(&mut self) {
        match self.route {
            Route::UserSearch => {
                if !self.search.results.is_empty()
                    && self.search.index < self.search.results.len() - 1
                {
                    self.search.index += 1;
                }
            }
            Route::UserEdit { .. } => {
                if let Some(controller) = self.user.as_mut() {
                    let count = controller.edit_field_count();
                    if count > 0 && controller.field_index < count - 1 {
                        controller.field_index += 1;
                    }
                }
            }
            Route::UserDetail { .. } => {}
        }
    }

    /// Toggle the role checkbox under the cursor
    pub fn edit_toggle_role(&mut self) {
        if let Some(controller) = self.user.as_mut() {
            if controller.field_index >= FIXED_EDIT_FIELDS {
                let role_index = controller.field_index - FIXED_EDIT_FIELDS;
                if let Some(selection) = controller.draft_roles.as_mut() {
                    selection.toggle(role_index);
                }
            }
        }
    }

    /// Cycle the country selector under the cursor through (none) plus the
    /// enumeration
    pub fn edit_cycle_country(&mut self, forward: bool) {
        let Some(controller) = self.user.as_mut() else {
            return;
        };
        if controller.field_index != FIELD_COUNTRY || controller.countries.is_empty() {
            return;
        }
        let Some(draft) = controller.draft.as_mut() else {
            return;
        };

        let options = controller.countries.len() + 1; // position 0 is (none)
        let position = match &draft.country {
            None => 0,
            Some(country) => controller
                .countries
                .iter()
                .position(|c| c == country)
                .map(|i| i + 1)
                .unwrap_or(0),
        };
        let position = if forward {
            (position + 1) % options
        } else {
            (position + options - 1) % options
        };
        draft.country = if position == 0 {
            None
        } else {
            Some(controller.countries[position - 1].clone())
        };
    }

    /// Start editing the text field under the cursor; returns false when the
    /// cursor is not on a text field
    pub fn edit_begin_text(&mut self) -> bool {
        let Some(controller) = self.user.as_ref() else {
            return false;
        };
        if controller.field_index >= EDIT_TEXT_FIELDS.len() {
            return false;
        }
        let Some(draft) = controller.draft.as_ref() else {
            return false;
        };
        let value = match controller.field_index {
            0 => draft.first_name.clone(),
            1 => draft.last_name.clone(),
            _ => draft.email.clone(),
        };
        self.edit_buffer = value.unwrap_or_default();
        true
    }

    /// Commit the editing buffer into the draft field under the cursor
    pub fn edit_commit_text(&mut self) {
        let buffer = std::mem::take(&mut self.edit_buffer);
        let Some(controller) = self.user.as_mut() else {
            return;
        };
        let Some(draft) = controller.draft.as_mut() else {
            return;
        };
        let value = if buffer.is_empty() { None } else { Some(buffer) };
        match controller.field_index {
            0 => draft.first_name = value,
            1 => draft.last_name = value,
            2 => draft.email = value,
            _ => {}
        }
    }

    /// Label of the text field under the cursor, for the editing popup
    pub fn editing_field_label(&self) -> &'static str {
        self.user
            .as_ref()
            .and_then(|c| EDIT_TEXT_FIELDS.get(c.field_index))
            .copied()
            .unwrap_or("Value")
    }

    /// Export the current search results
    pub fn export_results(&mut self) {
        if self.search.results.is_empty() {
            self.message = Some("No results to export".to_string());
            return;
        }

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("users_{}.csv", timestamp);
        let path_str = format!("exports/{}", filename);
        let path = std::path::Path::new(&path_str);

        match crate::export::export_users(
            &self.search.results,
            crate::export::ExportFormat::Csv,
            path,
        ) {
            Ok(p) => self.message = Some(format!("Exported to {}", p)),
            Err(e) => self.message = Some(format!("Export failed: {}", e)),
        }
    }

    /// Apply a completion event, discarding it when its token is stale
    pub fn handle_api_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::SearchCompleted { seq, query, outcome } => {
                if seq != self.search.seq {
                    tracing::debug!(seq, "discarding stale search response");
                    return;
                }
                self.search.loading = false;
                match outcome {
                    Ok(page) => {
                        self.search.count = page.count.unwrap_or(page.results.len() as i64);
                        self.search.results = page.results;
                        self.search.search_string = query;
                        self.search.index = 0;
                    }
                    Err(e) => {
                        // previous results stay on screen
                        tracing::warn!(error = %e, "user search failed");
                    }
                }
            }
            ApiEvent::UserLoaded { seq, outcome } => {
                let Some(controller) = self.user.as_mut() else {
                    return;
                };
                if seq != controller.load_seq {
                    tracing::debug!(seq, "discarding stale user response");
                    return;
                }
                match outcome {
                    Ok(user) => {
                        controller.user = Some(user);
                        // stage two: the role catalog
                        self.load_roles(seq);
                    }
                    Err(e) => {
                        controller.loading = false;
                        tracing::warn!(error = %e, "user load failed");
                        self.notifications.push_for_current_route(
                            format!("Failed to load user: {}", e),
                            Severity::Error,
                        );
                    }
                }
            }
            ApiEvent::RolesLoaded { seq, outcome } => {
                let route_is_edit = matches!(self.route, Route::UserEdit { .. });
                let Some(controller) = self.user.as_mut() else {
                    return;
                };
                if seq != controller.load_seq {
                    tracing::debug!(seq, "discarding stale roles response");
                    return;
                }
                controller.loading = false;
                match outcome {
                    Ok(catalog) => {
                        let held = controller
                            .user
                            .as_ref()
                            .map(|u| u.roles.clone())
                            .unwrap_or_default();
                        controller.roles = Some(RoleSelection::derive(catalog, &held));
                        if route_is_edit && controller.draft_roles.is_none() {
                            controller.draft = controller.user.clone();
                            controller.draft_roles = controller.roles.clone();
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "role catalog load failed");
                        self.notifications.push_for_current_route(
                            format!("Failed to load roles: {}", e),
                            Severity::Error,
                        );
                    }
                }
            }
            ApiEvent::CountriesLoaded { seq, outcome } => {
                let Some(controller) = self.user.as_mut() else {
                    return;
                };
                if seq != controller.countries_seq {
                    tracing::debug!(seq, "discarding stale countries response");
                    return;
                }
                match outcome {
                    Ok(countries) => controller.countries = countries,
                    Err(e) => {
                        tracing::warn!(error = %e, "country enumeration load failed");
                        self.notifications.push_for_current_route(
                            format!("Failed to load countries: {}", e),
                            Severity::Error,
                        );
                    }
                }
            }
            ApiEvent::SaveCompleted { seq, outcome } => {
                let Some(controller) = self.user.as_mut() else {
                    return;
                };
                if seq != controller.mutation_seq {
                    tracing::debug!(seq, "discarding stale save response");
                    return;
                }
                controller.saving = false;
                match outcome {
                    Ok(()) => {
                        // the saved draft becomes the bound user; the working
                        // selection already matches it
                        if let Some(draft) = controller.draft.take() {
                            controller.user = Some(draft);
                        }
                        if let Some(selection) = controller.draft_roles.take() {
                            controller.roles = Some(selection);
                        }
                        let key = controller.key.clone();
                        self.notifications
                            .push_for_next_route("User successfully updated", Severity::Info);
                        self.navigate(Route::UserDetail { key });
                    }
                    Err(e) => {
                        self.notifications
                            .push_for_current_route(e.body(), Severity::Error);
                    }
                }
            }
            ApiEvent::DeleteCompleted { seq, outcome } => {
                let Some(controller) = self.user.as_mut() else {
                    return;
                };
                if seq != controller.mutation_seq {
                    tracing::debug!(seq, "discarding stale delete response");
                    return;
                }
                match outcome {
                    Ok(()) => {
                        let key = controller.key.clone();
                        self.notifications
                            .push_for_next_route("User successfully deleted", Severity::Info);
                        self.load();
                        self.navigate(Route::UserDetail { key });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "user delete failed");
                        self.notifications.push_for_current_route(
                            format!("Failed to delete user: {}", e),
                            Severity::Error,
                        );
                    }
                }
            }
            ApiEvent::RestoreCompleted { seq, outcome } => {
                let Some(controller) = self.user.as_mut() else {
                    return;
                };
                if seq != controller.mutation_seq {
                    tracing::debug!(seq, "discarding stale restore response");
                    return;
                }
                match outcome {
                    Ok(()) => {
                        self.notifications
                            .push_for_current_route("User successfully restored", Severity::Info);
                    }
                    Err(e) => {
                        self.notifications
                            .push_for_current_route(e.body(), Severity::Error);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::auth::BasicAuthenticator;
    use crate::models::PagingResponse;
    use reqwest::StatusCode;
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let auth = Arc::new(BasicAuthenticator::new("http://localhost:1", None, None));
        let client = Arc::new(RegistryClient::new(auth));
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(client, KeyBindings::Arrows, tx)
    }

    fn user_fixture(json: &str) -> User {
        serde_json::from_str(json).unwrap()
    }

    fn page(users: Vec<User>) -> PagingResponse<User> {
        PagingResponse {
            count: Some(users.len() as i64),
            results: users,
            end_of_records: Some(true),
        }
    }

    fn server_error(body: &str) -> ApiError {
        ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            body: body.to_string(),
        }
    }

    /// Drive a detail controller to the fully loaded state
    fn load_user(app: &mut App, user_json: &str, catalog: &[&str]) {
        let seq = app.user.as_ref().unwrap().load_seq;
        app.handle_api_event(ApiEvent::UserLoaded {
            seq,
            outcome: Ok(user_fixture(user_json)),
        });
        app.handle_api_event(ApiEvent::RolesLoaded {
            seq,
            outcome: Ok(catalog.iter().map(|s| s.to_string()).collect()),
        });
    }

    #[tokio::test]
    async fn test_search_replaces_results_and_count() {
        let mut app = test_app();
        app.search("alice".to_string());
        assert!(app.search.loading);

        let seq = app.search.seq;
        app.handle_api_event(ApiEvent::SearchCompleted {
            seq,
            query: "alice".to_string(),
            outcome: Ok(page(vec![user_fixture(
                r#"{"key": "u1", "firstName": "Alice"}"#,
            )])),
        });

        assert!(!app.search.loading);
        assert_eq!(app.search.count, 1);
        assert_eq!(app.search.results.len(), 1);
        assert_eq!(app.search.search_string, "alice");
    }

    #[tokio::test]
    async fn test_empty_search_on_empty_backend() {
        let mut app = test_app();
        app.search(String::new());
        let seq = app.search.seq;
        app.handle_api_event(ApiEvent::SearchCompleted {
            seq,
            query: String::new(),
            outcome: Ok(PagingResponse {
                count: Some(0),
                results: Vec::new(),
                end_of_records: Some(true),
            }),
        });

        assert!(!app.search.loading);
        assert_eq!(app.search.count, 0);
        assert!(app.search.results.is_empty());
        assert!(app.notifications.current().is_empty());
    }

    #[tokio::test]
    async fn test_stale_search_response_discarded() {
        let mut app = test_app();
        app.search("a".to_string());
        let first = app.search.seq;
        app.search("ab".to_string());
        let second = app.search.seq;

        // the newer search resolves first...
        app.handle_api_event(ApiEvent::SearchCompleted {
            seq: second,
            query: "ab".to_string(),
            outcome: Ok(page(vec![user_fixture(r#"{"key": "u2"}"#)])),
        });
        // ...and the older response lands afterwards; it must not overwrite
        app.handle_api_event(ApiEvent::SearchCompleted {
            seq: first,
            query: "a".to_string(),
            outcome: Ok(page(vec![user_fixture(r#"{"key": "u1"}"#)])),
        });

        assert_eq!(app.search.results[0].key, "u2");
        assert_eq!(app.search.search_string, "ab");
    }

    #[tokio::test]
    async fn test_failed_search_keeps_previous_results() {
        let mut app = test_app();
        app.search("a".to_string());
        let seq = app.search.seq;
        app.handle_api_event(ApiEvent::SearchCompleted {
            seq,
            query: "a".to_string(),
            outcome: Ok(page(vec![user_fixture(r#"{"key": "u1"}"#)])),
        });

        app.search("b".to_string());
        let seq = app.search.seq;
        app.handle_api_event(ApiEvent::SearchCompleted {
            seq,
            query: "b".to_string(),
            outcome: Err(server_error("boom")),
        });

        assert!(!app.search.loading);
        assert_eq!(app.search.results[0].key, "u1");
        assert_eq!(app.search.search_string, "a");
    }

    #[tokio::test]
    async fn test_selecting_result_opens_detail() {
        let mut app = test_app();
        app.search(String::new());
        let seq = app.search.seq;
        app.handle_api_event(ApiEvent::SearchCompleted {
            seq,
            query: String::new(),
            outcome: Ok(page(vec![user_fixture(
                r#"{"key": "u1", "firstName": "Alice"}"#,
            )])),
        });

        app.open_selected_user();

        assert_eq!(
            app.route,
            Route::UserDetail {
                key: "u1".to_string()
            }
        );
        let controller = app.user.as_ref().unwrap();
        assert_eq!(controller.key, "u1");
        assert!(controller.loading);
    }

    #[tokio::test]
    async fn test_load_derives_selection_map() {
        let mut app = test_app();
        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        load_user(
            &mut app,
            r#"{"key": "u1", "roles": ["ADMIN"]}"#,
            &["ADMIN", "VIEWER"],
        );

        let controller = app.user.as_ref().unwrap();
        assert!(!controller.loading);
        let selection = controller.roles.as_ref().unwrap();
        assert_eq!(selection.len(), 2);
        assert!(selection.is_selected("ADMIN"));
        assert!(!selection.is_selected("VIEWER"));
    }

    #[tokio::test]
    async fn test_stale_load_ignored_after_reactivation() {
        let mut app = test_app();
        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        let stale = app.user.as_ref().unwrap().load_seq;

        app.navigate(Route::UserSearch);
        app.navigate(Route::UserDetail {
            key: "u2".to_string(),
        });

        app.handle_api_event(ApiEvent::UserLoaded {
            seq: stale,
            outcome: Ok(user_fixture(r#"{"key": "u1"}"#)),
        });

        let controller = app.user.as_ref().unwrap();
        assert_eq!(controller.key, "u2");
        assert!(controller.user.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_raises_error_notification() {
        let mut app = test_app();
        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        let seq = app.user.as_ref().unwrap().load_seq;
        app.handle_api_event(ApiEvent::UserLoaded {
            seq,
            outcome: Err(server_error("gone")),
        });

        let controller = app.user.as_ref().unwrap();
        assert!(controller.user.is_none());
        assert!(!controller.loading);
        let current = app.notifications.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_save_updates_roles_and_navigates_to_detail() {
        let mut app = test_app();
        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        load_user(
            &mut app,
            r#"{"key": "u1", "roles": ["ADMIN"]}"#,
            &["ADMIN", "VIEWER"],
        );

        app.edit_user();
        assert_eq!(
            app.route,
            Route::UserEdit {
                key: "u1".to_string()
            }
        );

        app.user.as_mut().unwrap().field_index = FIXED_EDIT_FIELDS + 1;
        app.edit_toggle_role();
        app.save();

        let controller = app.user.as_ref().unwrap();
        assert!(controller.saving);
        // the persisted draft carries the rebuilt role list
        assert_eq!(
            controller.draft.as_ref().unwrap().roles,
            vec!["ADMIN".to_string(), "VIEWER".to_string()]
        );

        let seq = controller.mutation_seq;
        app.handle_api_event(ApiEvent::SaveCompleted {
            seq,
            outcome: Ok(()),
        });

        assert_eq!(
            app.route,
            Route::UserDetail {
                key: "u1".to_string()
            }
        );
        let messages: Vec<_> = app
            .notifications
            .current()
            .iter()
            .map(|n| n.message.as_str())
            .collect();
        assert_eq!(messages, vec!["User successfully updated"]);
        let controller = app.user.as_ref().unwrap();
        assert_eq!(
            controller.user.as_ref().unwrap().roles,
            vec!["ADMIN".to_string(), "VIEWER".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_save_stays_on_edit_with_raw_body() {
        let mut app = test_app();
        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        load_user(&mut app, r#"{"key": "u1"}"#, &["ADMIN"]);
        app.edit_user();
        app.save();

        let seq = app.user.as_ref().unwrap().mutation_seq;
        app.handle_api_event(ApiEvent::SaveCompleted {
            seq,
            outcome: Err(server_error("duplicate")),
        });

        assert!(matches!(app.route, Route::UserEdit { .. }));
        let current = app.notifications.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].message, "duplicate");
        assert_eq!(current[0].severity, Severity::Error);
        // the draft survives so the user can correct and retry
        assert!(app.user.as_ref().unwrap().draft.is_some());
    }

    #[tokio::test]
    async fn test_delete_notifies_next_route_and_reloads() {
        let mut app = test_app();
        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        load_user(&mut app, r#"{"key": "u1"}"#, &["ADMIN"]);

        app.delete();
        let seq = app.user.as_ref().unwrap().mutation_seq;
        app.handle_api_event(ApiEvent::DeleteCompleted {
            seq,
            outcome: Ok(()),
        });

        assert_eq!(
            app.route,
            Route::UserDetail {
                key: "u1".to_string()
            }
        );
        let messages: Vec<_> = app
            .notifications
            .current()
            .iter()
            .map(|n| n.message.as_str())
            .collect();
        assert_eq!(messages, vec!["User successfully deleted"]);
        // the reload is already in flight
        assert!(app.user.as_ref().unwrap().loading);
    }

    #[tokio::test]
    async fn test_restore_clears_deleted_marker_without_navigation() {
        let mut app = test_app();
        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        load_user(
            &mut app,
            r#"{"key": "u1", "deleted": "2024-05-01T10:00:00Z"}"#,
            &["ADMIN"],
        );

        app.restore();
        let controller = app.user.as_ref().unwrap();
        assert!(controller.user.as_ref().unwrap().deleted.is_none());

        let seq = controller.mutation_seq;
        app.handle_api_event(ApiEvent::RestoreCompleted {
            seq,
            outcome: Ok(()),
        });

        assert_eq!(
            app.route,
            Route::UserDetail {
                key: "u1".to_string()
            }
        );
        let current = app.notifications.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].message, "User successfully restored");
        assert_eq!(current[0].severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_returning_to_search_issues_fresh_search() {
        let mut app = test_app();
        app.search("alice".to_string());
        let seq = app.search.seq;
        app.handle_api_event(ApiEvent::SearchCompleted {
            seq,
            query: "alice".to_string(),
            outcome: Ok(page(vec![user_fixture(r#"{"key": "u1"}"#)])),
        });

        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        assert!(app.user.is_some());

        app.navigate(Route::UserSearch);
        assert!(app.user.is_none());
        assert!(app.search.loading);
        assert_ne!(app.search.seq, seq);
    }

    #[tokio::test]
    async fn test_country_cycling_wraps_through_none() {
        let mut app = test_app();
        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        load_user(&mut app, r#"{"key": "u1"}"#, &["ADMIN"]);

        let seq = app.user.as_ref().unwrap().countries_seq;
        app.handle_api_event(ApiEvent::CountriesLoaded {
            seq,
            outcome: Ok(vec!["DK".to_string(), "NO".to_string()]),
        });

        app.edit_user();
        app.user.as_mut().unwrap().field_index = FIELD_COUNTRY;

        app.edit_cycle_country(true);
        assert_eq!(draft_country(&app), Some("DK".to_string()));
        app.edit_cycle_country(true);
        assert_eq!(draft_country(&app), Some("NO".to_string()));
        app.edit_cycle_country(true);
        assert_eq!(draft_country(&app), None);
        app.edit_cycle_country(false);
        assert_eq!(draft_country(&app), Some("NO".to_string()));
    }

    fn draft_country(app: &App) -> Option<String> {
        app.user
            .as_ref()
            .and_then(|c| c.draft.as_ref())
            .and_then(|d| d.country.clone())
    }

    #[tokio::test]
    async fn test_text_field_editing_round_trip() {
        let mut app = test_app();
        app.navigate(Route::UserDetail {
            key: "u1".to_string(),
        });
        load_user(&mut app, r#"{"key": "u1", "firstName": "Alice"}"#, &["ADMIN"]);
        app.edit_user();

        assert!(app.edit_begin_text());
        assert_eq!(app.edit_buffer, "Alice");

        app.edit_buffer = "Alicia".to_string();
        app.edit_commit_text();

        let draft = app.user.as_ref().unwrap().draft.as_ref().unwrap();
        assert_eq!(draft.first_name.as_deref(), Some("Alicia"));
        // the bound user is untouched until save
        let user = app.user.as_ref().unwrap().user.as_ref().unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Alice"));
    }
}
