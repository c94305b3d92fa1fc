//! UI rendering components

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::app::{App, Route, UserController, EDIT_TEXT_FIELDS};
use super::input::InputMode;
use crate::notify::Severity;

/// Render the complete UI
pub fn render(frame: &mut Frame, app: &mut App) {
    let notif_height = match app.notifications.current().len() {
        0 => 0,
        n => n as u16 + 2,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Header
            Constraint::Length(notif_height), // Notifications
            Constraint::Min(0),               // Main content
            Constraint::Length(3),            // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    if notif_height > 0 {
        render_notifications(frame, app, chunks[1]);
    }
    render_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Input popups
    if app.input_mode == InputMode::Search {
        render_search_popup(frame, app);
    }
    if app.input_mode == InputMode::Editing {
        render_editing_popup(frame, app);
    }
}

/// Render the header with the route breadcrumb
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let breadcrumb = match &app.route {
        Route::UserSearch => "Users".to_string(),
        Route::UserDetail { key } => format!("Users ▸ {}", key),
        Route::UserEdit { key } => format!("Users ▸ {} ▸ Edit", key),
    };

    let header = Paragraph::new(breadcrumb)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(" Regman "));
    frame.render_widget(header, area);
}

/// Render the notifications banner for the current route
fn render_notifications(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .notifications
        .current()
        .iter()
        .map(|n| {
            let style = match n.severity {
                Severity::Info => Style::default().fg(Color::Green),
                Severity::Error => Style::default().fg(Color::Red),
            };
            Line::from(Span::styled(n.message.clone(), style))
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Notifications "))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Render the main content area
fn render_content(frame: &mut Frame, app: &mut App, area: Rect) {
    let route = app.route.clone();
    match route {
        Route::UserSearch => render_search_results(frame, app, area),
        Route::UserDetail { .. } => render_user_detail(frame, app, area),
        Route::UserEdit { .. } => render_user_edit(frame, app, area),
    }
}

/// Render the search results view
fn render_search_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .search
        .results
        .iter()
        .map(|user| {
            let status = if user.is_deleted() { "⊘" } else { "●" };
            let content = format!(
                "{} {:<30} {:<28} {}",
                status,
                user.get_display_name(),
                user.email.as_deref().unwrap_or(""),
                user.roles.join(", ")
            );

            let style = if user.is_deleted() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(content).style(style)
        })
        .collect();

    let title = if app.search.search_string.is_empty() {
        format!(" Users ({}) ", app.search.count)
    } else {
        format!(
            " Users ({}) – \"{}\" ",
            app.search.count, app.search.search_string
        )
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(" ↑↓ Navigate │ Enter: Open │ /: Search │ x: Export │ q: Quit "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(50, 50, 80))
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut list_state = ListState::default();
    list_state.select(Some(app.search.index));

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Render the user detail view
fn render_user_detail(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(controller) = &app.user else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // User header
            Constraint::Min(0),    // Overview + roles
        ])
        .split(area);

    let heading = match &controller.user {
        Some(user) => format!("{} [{}]", user.get_display_name(), user.get_status()),
        None if controller.loading => "Loading...".to_string(),
        None => format!("User {}", controller.key),
    };
    let header = Paragraph::new(heading)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_user_overview(frame, controller, columns[0]);
    render_user_roles(frame, controller, columns[1]);
}

/// Render user overview fields
fn render_user_overview(frame: &mut Frame, controller: &UserController, area: Rect) {
    let hints = " e: Edit │ d: Delete │ r: Restore │ Esc: Back ";

    let Some(user) = &controller.user else {
        let placeholder = if controller.loading {
            "Loading user..."
        } else {
            "No user loaded"
        };
        let paragraph = Paragraph::new(placeholder)
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Overview ")
                    .title_bottom(hints),
            );
        frame.render_widget(paragraph, area);
        return;
    };

    let info = vec![
        format!("Key:         {}", user.key),
        format!("Username:    {}", user.user_name.as_deref().unwrap_or("-")),
        format!("First name:  {}", user.first_name.as_deref().unwrap_or("-")),
        format!("Last name:   {}", user.last_name.as_deref().unwrap_or("-")),
        format!("Email:       {}", user.email.as_deref().unwrap_or("-")),
        format!("Country:     {}", user.country.as_deref().unwrap_or("-")),
        format!("Status:      {}", user.get_status()),
        format!("Deleted:     {}", user.deleted.as_deref().unwrap_or("-")),
    ];

    let text: Vec<Line> = info.into_iter().map(Line::from).collect();

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Overview ")
                .title_bottom(hints),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Render the assigned-roles panel
fn render_user_roles(frame: &mut Frame, controller: &UserController, area: Rect) {
    let items: Vec<ListItem> = match &controller.roles {
        Some(selection) => selection
            .roles()
            .iter()
            .map(|role| {
                let assigned = selection.is_selected(role);
                let checkbox = if assigned { "[✓]" } else { "[ ]" };
                let style = if assigned {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(format!("{} {}", checkbox, role)).style(style)
            })
            .collect(),
        None => vec![ListItem::new("Loading roles...").style(Style::default().fg(Color::DarkGray))],
    };

    let assigned = controller
        .roles
        .as_ref()
        .map(|s| s.selected_roles().len())
        .unwrap_or(0);

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Roles ({} assigned) ", assigned)),
    );
    frame.render_widget(list, area);
}

/// Render the user edit form
fn render_user_edit(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(controller) = &app.user else {
        return;
    };
    let (Some(draft), Some(selection)) = (&controller.draft, &controller.draft_roles) else {
        let paragraph = Paragraph::new("Loading...")
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(" Edit "));
        frame.render_widget(paragraph, area);
        return;
    };

    let mut items: Vec<ListItem> = Vec::new();

    let values = [
        draft.first_name.as_deref().unwrap_or(""),
        draft.last_name.as_deref().unwrap_or(""),
        draft.email.as_deref().unwrap_or(""),
    ];
    for (label, value) in EDIT_TEXT_FIELDS.iter().zip(values) {
        items.push(ListItem::new(format!("{:<12} {}", format!("{}:", label), value)));
    }

    items.push(ListItem::new(format!(
        "{:<12} ← {} →",
        "Country:",
        draft.country.as_deref().unwrap_or("(none)")
    )));

    for role in selection.roles() {
        let checkbox = if selection.is_selected(role) { "[✓]" } else { "[ ]" };
        items.push(ListItem::new(format!("{} {}", checkbox, role)));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Edit {} ", draft.get_display_name()))
                .title_bottom(
                    " ↑↓ Field │ Enter: Edit │ Space: Toggle role │ Ctrl-s: Save │ Esc: Cancel ",
                ),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(50, 50, 80))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut list_state = ListState::default();
    list_state.select(Some(controller.field_index));

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let busy =
        app.search.loading || app.user.as_ref().is_some_and(|c| c.loading || c.saving);

    let state_indicator = if busy {
        Span::styled(" ● Loading ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" ● Connected ", Style::default().fg(Color::Green))
    };

    let message = app
        .message
        .as_deref()
        .map(|m| format!(" │ {} ", m))
        .unwrap_or_default();

    let status = Line::from(vec![
        state_indicator,
        Span::raw(format!("│ {} ", app.client.server_url())),
        Span::styled(message, Style::default().fg(Color::Magenta)),
    ]);

    let paragraph = Paragraph::new(status).block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

/// Render search popup
fn render_search_popup(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 3, frame.area());

    frame.render_widget(Clear, area);

    let input = Paragraph::new(app.search_query.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search users (Enter to apply, Esc to cancel) ")
                .style(Style::default().fg(Color::Cyan)),
        );

    frame.render_widget(input, area);

    // Show cursor
    frame.set_cursor_position((area.x + app.search_query.len() as u16 + 1, area.y + 1));
}

/// Render the text-field editing popup
fn render_editing_popup(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 3, frame.area());

    frame.render_widget(Clear, area);

    let input = Paragraph::new(app.edit_buffer.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(
                    " {} (Enter to apply, Esc to cancel) ",
                    app.editing_field_label()
                ))
                .style(Style::default().fg(Color::Cyan)),
        );

    frame.render_widget(input, area);

    frame.set_cursor_position((area.x + app.edit_buffer.len() as u16 + 1, area.y + 1));
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((r.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
