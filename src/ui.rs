use anyhow::Result;
use change_of_address::{AddressBook, CatalogEntry, Notification, Profile};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_JUMP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Profiles,
    Services,
    Notifications,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Profiles => Page::Services,
            Page::Services => Page::Notifications,
            Page::Notifications => Page::Profiles,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Profiles => Page::Notifications,
            Page::Services => Page::Profiles,
            Page::Notifications => Page::Services,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Profiles => "Profiles",
            Page::Services => "Service Catalog",
            Page::Notifications => "Notifications",
        }
    }
}

pub struct App {
    pub profiles: Vec<Profile>,
    pub catalog: Vec<(String, CatalogEntry)>,
    pub notifications: Vec<Notification>,
    pub filtered_notifications: Vec<Notification>,
    /// Profile id the notifications page is narrowed to
    pub notification_filter: Option<String>,
    pub profile_state: TableState,
    pub catalog_state: TableState,
    pub notification_state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
}

impl App {
    pub fn load(book: &AddressBook) -> Result<Self> {
        let profiles = book.profiles.list()?.into_values().collect();
        let catalog = book.catalog.list()?.into_iter().collect();
        let notifications = book.notifications.list(None)?;
        Ok(Self::new(profiles, catalog, notifications))
    }

    pub fn new(
        profiles: Vec<Profile>,
        catalog: Vec<(String, CatalogEntry)>,
        notifications: Vec<Notification>,
    ) -> Self {
        let mut app = Self {
            profiles,
            catalog,
            filtered_notifications: notifications.clone(),
            notifications,
            notification_filter: None,
            profile_state: TableState::default(),
            catalog_state: TableState::default(),
            notification_state: TableState::default(),
            current_page: Page::Profiles,
            show_detail: false,
        };

        if !app.profiles.is_empty() {
            app.profile_state.select(Some(0));
        }
        if !app.catalog.is_empty() {
            app.catalog_state.select(Some(0));
        }
        if !app.filtered_notifications.is_empty() {
            app.notification_state.select(Some(0));
        }

        app
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_profile(&self) -> Option<&Profile> {
        self.profile_state.selected().and_then(|i| self.profiles.get(i))
    }

    /// Narrow the notifications page to the selected profile, or widen it
    /// again when it is already narrowed.
    pub fn toggle_profile_filter(&mut self) {
        if self.notification_filter.is_some() {
            self.clear_filter();
            return;
        }

        if let Some(id) = self.selected_profile().map(|p| p.id.clone()) {
            self.filtered_notifications = self
                .notifications
                .iter()
                .filter(|n| n.profile_id == id)
                .cloned()
                .collect();
            self.notification_filter = Some(id);
            self.reset_notification_selection();
        }
    }

    pub fn clear_filter(&mut self) {
        self.notification_filter = None;
        self.filtered_notifications = self.notifications.clone();
        self.reset_notification_selection();
    }

    fn reset_notification_selection(&mut self) {
        if self.filtered_notifications.is_empty() {
            self.notification_state.select(None);
        } else {
            self.notification_state.select(Some(0));
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn active_table(&mut self) -> (&mut TableState, usize) {
        match self.current_page {
            Page::Profiles => (&mut self.profile_state, self.profiles.len()),
            Page::Services => (&mut self.catalog_state, self.catalog.len()),
            Page::Notifications => (&mut self.notification_state, self.filtered_notifications.len()),
        }
    }

    pub fn next(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = state.selected().map_or(0, |i| (i + PAGE_JUMP).min(len - 1));
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = state.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
        state.select(Some(i));
    }

    pub fn first(&mut self) {
        let (state, len) = self.active_table();
        if len > 0 {
            state.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        let (state, len) = self.active_table();
        if len > 0 {
            state.select(Some(len - 1));
        }
    }

    pub fn stats(&self) -> BookStats {
        BookStats {
            profiles: self.profiles.len(),
            linked_services: self.profiles.iter().map(|p| p.services.len()).sum(),
            notifications: self.notifications.len(),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct BookStats {
    pub profiles: usize,
    pub linked_services: usize,
    pub notifications: usize,
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Ok(());
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter if app.current_page == Page::Profiles => app.toggle_detail(),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('f') => {
                    app.toggle_profile_filter();
                    app.current_page = Page::Notifications;
                }
                KeyCode::Char('c') => app.clear_filter(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Profiles if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[1]);

            render_profiles(f, content_chunks[0], app);
            render_profile_detail(f, content_chunks[1], app);
        }
        Page::Profiles => render_profiles(f, chunks[1], app),
        Page::Services => render_catalog(f, chunks[1], app),
        Page::Notifications => render_notifications(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn header_cell(title: &str) -> Cell<'_> {
    Cell::from(title).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

fn highlight() -> Style {
    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();

    let mut tab_spans = vec![];
    for (i, page) in [Page::Profiles, Page::Services, Page::Notifications].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Profiles: {}", stats.profiles),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Linked: {}", stats.linked_services),
        Style::default().fg(Color::Cyan),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Notices: {}", stats.notifications),
        Style::default().fg(Color::Yellow),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_profiles(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(["Id", "Name", "Current Address", "Services"].map(header_cell))
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.profiles.iter().map(|p| {
        Row::new(vec![
            Cell::from(p.id.clone()),
            Cell::from(truncate(&p.name, 24)),
            Cell::from(truncate(&p.current_address, 40)),
            Cell::from(p.services.len().to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(26),
            Constraint::Min(20),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Profiles "))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.profile_state);
}

fn render_profile_detail(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Profile Details ");

    let Some(profile) = app.selected_profile() else {
        f.render_widget(Paragraph::new("No profile selected").block(block), area);
        return;
    };

    let label = |text: &'static str| {
        Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };

    let mut content = vec![
        Line::from(""),
        Line::from(vec![label("  Name: "), Span::raw(profile.name.as_str())]),
        Line::from(vec![label("  Email: "), Span::raw(profile.email.as_str())]),
        Line::from(vec![label("  Phone: "), Span::raw(profile.phone.as_str())]),
        Line::from(""),
        Line::from(vec![
            label("  Current: "),
            Span::styled(profile.current_address.as_str(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            label("  Previous: "),
            Span::styled(profile.previous_address.as_str(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            label("  Updated: "),
            Span::raw(profile.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(vec![Span::styled(
            "  LINKED SERVICES",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
    ];

    if profile.services.is_empty() {
        content.push(Line::from(Span::styled(
            "  (none)",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    for (key, link) in &profile.services {
        content.push(Line::from(vec![
            Span::raw("  • "),
            Span::styled(link.display_name(key).into_owned(), Style::default().fg(Color::White)),
            Span::styled(format!(" [{}]", key), Style::default().fg(Color::DarkGray)),
        ]));

        let summary = change_of_address::contact_summary(link);
        if !summary.is_empty() {
            content.push(Line::from(Span::styled(
                format!("    {}", summary),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Enter close | f notifications for this profile",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_catalog(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(["Key", "Name", "Category"].map(header_cell))
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.catalog.iter().map(|(key, entry)| {
        Row::new(vec![
            Cell::from(key.clone()),
            Cell::from(entry.name.clone()),
            Cell::from(entry.category.to_string()).style(Style::default().fg(Color::Cyan)),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Length(20), Constraint::Length(28), Constraint::Length(14)],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Service Catalog "))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.catalog_state);
}

fn render_notifications(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(["Id", "Profile", "Service", "New Address", "Contact", "Status"].map(header_cell))
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_notifications.iter().map(|n| {
        Row::new(vec![
            Cell::from(n.id.clone()),
            Cell::from(n.profile_id.clone()),
            Cell::from(truncate(&n.service_name, 24)),
            Cell::from(truncate(&n.new_address, 30)),
            Cell::from(truncate(&n.contact_info, 40)),
            Cell::from(n.status.as_str()).style(Style::default().fg(Color::Yellow)),
        ])
    });

    let title = match &app.notification_filter {
        Some(id) => format!(" Notifications - {} ", id),
        None => " Notifications ".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(26),
            Constraint::Length(32),
            Constraint::Min(20),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.notification_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Profiles => (app.profile_state.selected(), app.profiles.len()),
        Page::Services => (app.catalog_state.selected(), app.catalog.len()),
        Page::Notifications => (app.notification_state.selected(), app.filtered_notifications.len()),
    };

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected.map(|i| i + 1).unwrap_or(0), total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(id) = &app.notification_filter {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", id),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    for (key, action) in [("Enter", " Details | "), ("Tab", " Page | "), ("f", " Filter | "), ("↑/↓", " Nav | ")] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(action));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
