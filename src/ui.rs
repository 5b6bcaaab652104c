use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{first_line, non_empty, Company, Founder, Stats};
use crate::roster::{Roster, SortColumn};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use tracing::{error, info};

const PAGE_JUMP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Roster,
    Founders,
    Dashboard,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Roster => Page::Founders,
            Page::Founders => Page::Dashboard,
            Page::Dashboard => Page::Roster,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Roster => Page::Dashboard,
            Page::Founders => Page::Roster,
            Page::Dashboard => Page::Founders,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Roster => "Companies",
            Page::Founders => "Founders",
            Page::Dashboard => "Dashboard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

/// Work the event loop must do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    OpenCompany(i64),
    LoadStats,
    LoadFounders,
    Reload,
}

/// Company detail modal, with an optional founder popup on top.
#[derive(Debug, Clone)]
pub struct CompanyDetail {
    pub company_id: i64,
    pub company: Result<Company, String>,
    pub selected: usize,
    pub popup: Option<usize>,
}

impl CompanyDetail {
    fn founders(&self) -> &[Founder] {
        match &self.company {
            Ok(company) => &company.founders,
            Err(_) => &[],
        }
    }

    pub fn popup_founder(&self) -> Option<&Founder> {
        self.popup.and_then(|i| self.founders().get(i))
    }
}

/// Something fetched on demand: not yet asked for, loaded, or failed.
#[derive(Debug, Clone)]
pub enum Remote<T> {
    NotLoaded,
    Loaded(T),
    Failed(String),
}

impl<T> Remote<T> {
    fn from_result(result: ClientResult<T>, what: &str) -> Self {
        match result {
            Ok(value) => Remote::Loaded(value),
            Err(e) => {
                error!(error = %e, "Error loading {}", what);
                Remote::Failed(format!("Error loading {}: {}", what, e.placeholder()))
            }
        }
    }

    fn is_loaded(&self) -> bool {
        !matches!(self, Remote::NotLoaded)
    }
}

pub struct App {
    pub roster: Roster,
    pub roster_error: Option<String>,
    pub state: TableState,
    pub current_page: Page,
    pub input_mode: InputMode,
    pub search_input: String,
    pub detail: Option<CompanyDetail>,
    pub founders: Remote<Vec<Founder>>,
    pub founder_search: String,
    pub founders_state: TableState,
    pub stats: Remote<Stats>,
}

impl App {
    pub fn new(roster: Roster) -> Self {
        let mut state = TableState::default();
        if !roster.visible().is_empty() {
            state.select(Some(0));
        }

        Self {
            roster,
            roster_error: None,
            state,
            current_page: Page::Roster,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            detail: None,
            founders: Remote::NotLoaded,
            founder_search: String::new(),
            founders_state: TableState::default(),
            stats: Remote::NotLoaded,
        }
    }

    /// App whose initial load failed; the table shows the error instead.
    pub fn with_error(message: String) -> Self {
        let mut app = Self::new(Roster::default());
        app.roster_error = Some(message);
        app
    }

    pub fn set_roster(&mut self, result: ClientResult<Roster>) {
        match result {
            Ok(roster) => {
                info!(companies = roster.all().len(), "roster reloaded");
                self.roster = roster;
                self.roster_error = None;
                self.search_input.clear();
                self.reset_selection();
            }
            Err(e) => {
                error!(error = %e, "Error loading companies");
                self.roster_error = Some(format!("Error loading companies: {}", e.placeholder()));
            }
        }
    }

    pub fn set_stats(&mut self, result: ClientResult<Stats>) {
        self.stats = Remote::from_result(result, "stats");
    }

    pub fn set_founders(&mut self, result: ClientResult<Vec<Founder>>) {
        self.founders = Remote::from_result(result, "founders");
        let has_rows = matches!(&self.founders, Remote::Loaded(f) if !f.is_empty());
        self.founders_state.select(if has_rows { Some(0) } else { None });
    }

    pub fn show_company(&mut self, company_id: i64, result: ClientResult<Company>) {
        let company = result.map_err(|e: ClientError| {
            error!(error = %e, company_id, "Error loading company details");
            format!("Error loading company details: {}", e.placeholder())
        });

        self.detail = Some(CompanyDetail {
            company_id,
            company,
            selected: 0,
            popup: None,
        });
    }

    pub fn selected_company(&self) -> Option<&Company> {
        self.state.selected().and_then(|i| self.roster.visible().get(i))
    }

    fn reset_selection(&mut self) {
        if self.roster.visible().is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    fn apply_search(&mut self) {
        self.roster.set_search(&self.search_input);
        self.reset_selection();
    }

    pub fn sort_by(&mut self, column: SortColumn) {
        self.roster.click_header(column);
        self.reset_selection();
    }

    pub fn clear_filter(&mut self) {
        self.search_input.clear();
        self.roster.reset();
        self.reset_selection();
    }

    fn switch_page(&mut self, page: Page) -> Action {
        self.current_page = page;
        self.input_mode = InputMode::Normal;

        match page {
            Page::Dashboard if !self.stats.is_loaded() => Action::LoadStats,
            Page::Founders if !self.founders.is_loaded() => Action::LoadFounders,
            _ => Action::None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.input_mode == InputMode::Search {
            return self.handle_search_key(key);
        }

        if self.detail.is_some() {
            return self.handle_detail_key(key);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Tab => self.switch_page(self.current_page.next()),
            KeyCode::BackTab => self.switch_page(self.current_page.previous()),
            KeyCode::Char('/') if self.current_page != Page::Dashboard => {
                self.input_mode = InputMode::Search;
                Action::None
            }
            KeyCode::Char('r') => match self.current_page {
                Page::Roster => Action::Reload,
                Page::Founders => Action::LoadFounders,
                Page::Dashboard => Action::LoadStats,
            },
            KeyCode::Char('n') if self.current_page == Page::Roster => {
                self.sort_by(SortColumn::Name);
                Action::None
            }
            KeyCode::Char('b') if self.current_page == Page::Roster => {
                self.sort_by(SortColumn::Batch);
                Action::None
            }
            KeyCode::Char('f') if self.current_page == Page::Roster => {
                self.sort_by(SortColumn::Founders);
                Action::None
            }
            KeyCode::Char('c') if self.current_page == Page::Roster => {
                self.clear_filter();
                Action::None
            }
            KeyCode::Enter if self.current_page == Page::Roster => self
                .selected_company()
                .map(|c| Action::OpenCompany(c.id))
                .unwrap_or(Action::None),
            code => {
                self.navigate(code);
                Action::None
            }
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Action {
        let on_roster = self.current_page == Page::Roster;

        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                if !on_roster && key.code == KeyCode::Enter {
                    return Action::LoadFounders;
                }
            }
            KeyCode::Backspace => {
                if on_roster {
                    self.search_input.pop();
                    self.apply_search();
                } else {
                    self.founder_search.pop();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if on_roster {
                    self.search_input.push(c);
                    self.apply_search();
                } else {
                    self.founder_search.push(c);
                }
            }
            _ => {}
        }

        Action::None
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Action {
        let Some(detail) = self.detail.as_mut() else {
            return Action::None;
        };
        let count = detail.founders().len();

        if key.code == KeyCode::Char('q') {
            return Action::Quit;
        }

        if detail.popup.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                detail.popup = None;
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Esc => self.detail = None,
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                detail.selected = (detail.selected + 1) % count;
            }
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                detail.selected = (detail.selected + count - 1) % count;
            }
            KeyCode::Enter if count > 0 => detail.popup = Some(detail.selected),
            _ => {}
        }

        Action::None
    }

    fn navigate(&mut self, code: KeyCode) {
        let (state, len) = match self.current_page {
            Page::Roster => (&mut self.state, self.roster.visible().len()),
            Page::Founders => {
                let len = match &self.founders {
                    Remote::Loaded(f) => f.len(),
                    _ => 0,
                };
                (&mut self.founders_state, len)
            }
            Page::Dashboard => return,
        };

        if len == 0 {
            return;
        }

        let current = state.selected().unwrap_or(0);
        let next = match code {
            KeyCode::Down | KeyCode::Char('j') => {
                if current >= len - 1 {
                    0
                } else {
                    current + 1
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if current == 0 {
                    len - 1
                } else {
                    current - 1
                }
            }
            KeyCode::PageDown => (current + PAGE_JUMP).min(len - 1),
            KeyCode::PageUp => current.saturating_sub(PAGE_JUMP),
            KeyCode::Home => 0,
            KeyCode::End => len - 1,
            _ => return,
        };

        state.select(Some(next));
    }
}

pub fn run_ui(app: &mut App, client: &ApiClient) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, client);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "terminal UI stopped");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &ApiClient,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match app.handle_key(key) {
                Action::None => {}
                Action::Quit => return Ok(()),
                Action::OpenCompany(id) => {
                    let result = client.company(id);
                    app.show_company(id, result);
                }
                Action::LoadStats => app.set_stats(client.stats()),
                Action::LoadFounders => {
                    let result = client.founders(Some(app.founder_search.as_str()));
                    app.set_founders(result);
                }
                Action::Reload => app.set_roster(client.load_roster()),
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_search(f, chunks[1], app);

    match app.current_page {
        Page::Roster => render_table(f, chunks[2], app),
        Page::Founders => render_founders(f, chunks[2], app),
        Page::Dashboard => render_dashboard(f, chunks[2], app),
    }

    render_status_bar(f, chunks[3], app);

    if app.detail.is_some() {
        render_company_modal(f, f.size(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Roster, Page::Founders, Page::Dashboard];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
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

    let with_founders = app
        .roster
        .all()
        .iter()
        .filter(|c| !c.founders.is_empty())
        .count();

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{}/{} companies with founders", with_founders, app.roster.all().len()),
        Style::default().fg(Color::White),
    ));

    let unmatched = app.roster.unmatched_founders();
    if unmatched > 0 {
        tab_spans.push(Span::raw("  "));
        tab_spans.push(Span::styled(
            format!("({} unmatched founders)", unmatched),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(tab_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_search(f: &mut Frame, area: Rect, app: &App) {
    let (term, hint) = match app.current_page {
        Page::Roster => (app.search_input.as_str(), " Search companies "),
        Page::Founders => (app.founder_search.as_str(), " Search founders (Enter to fetch) "),
        Page::Dashboard => ("", " Search "),
    };

    let editing = app.input_mode == InputMode::Search;
    let border = if editing { Color::Yellow } else { Color::White };

    let mut spans = vec![Span::raw(" "), Span::raw(term.to_string())];
    if editing {
        spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
    } else if term.is_empty() && app.current_page != Page::Dashboard {
        spans.push(Span::styled(
            "press / to search",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }

    let search = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(hint),
    );

    f.render_widget(search, area);
}

fn header_label(app: &App, column: SortColumn, label: &str) -> String {
    match app.roster.sort_state().active() {
        Some((active, direction)) if active == column => format!("{} {}", label, direction.arrow()),
        _ => label.to_string(),
    }
}

fn founders_summary(company: &Company) -> String {
    company
        .founders
        .iter()
        .map(|f| match non_empty(&f.role) {
            Some(role) => format!("{} ({})", f.name, role),
            None => f.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholder_row(message: &str, columns: usize) -> Row<'static> {
    let mut cells = vec![Cell::from(message.to_string())
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))];
    cells.extend((1..columns).map(|_| Cell::from("")));
    Row::new(cells)
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = [
        header_label(app, SortColumn::Name, "[n] Company"),
        header_label(app, SortColumn::Batch, "[b] Batch"),
        header_label(app, SortColumn::Founders, "[f] Founders"),
    ]
    .into_iter()
    .map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let placeholder = Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);

    let rows: Vec<Row> = if let Some(message) = &app.roster_error {
        vec![placeholder_row(message, 3)]
    } else if app.roster.visible().is_empty() {
        vec![placeholder_row("No companies found", 3)]
    } else {
        app.roster
            .visible()
            .iter()
            .map(|company| {
                let batch = match non_empty(&company.batch) {
                    Some(batch) => Cell::from(batch.to_string()).style(Style::default().fg(Color::Cyan)),
                    None => Cell::from("—").style(placeholder),
                };

                let founders = if company.founders.is_empty() {
                    Cell::from("No founders").style(placeholder)
                } else {
                    Cell::from(founders_summary(company))
                };

                Row::new(vec![
                    Cell::from(truncate(company.display_name(), 40)),
                    batch,
                    founders,
                ])
                .height(1)
            })
            .collect()
    };

    let title = format!(
        " Companies ({} of {}) ",
        app.roster.visible().len(),
        app.roster.all().len()
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(42),
            Constraint::Length(10),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_founders(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Name", "Company", "Role", "Previous"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = match &app.founders {
        Remote::NotLoaded => vec![placeholder_row("Loading founders...", 4)],
        Remote::Failed(message) => vec![placeholder_row(message, 4)],
        Remote::Loaded(founders) if founders.is_empty() => {
            vec![placeholder_row("No founders found", 4)]
        }
        Remote::Loaded(founders) => founders
            .iter()
            .map(|founder| {
                let company = founder.join_name().map(first_line).unwrap_or("Unknown Company");
                Row::new(vec![
                    Cell::from(truncate(&founder.name, 28)),
                    Cell::from(truncate(company, 30)),
                    Cell::from(truncate(non_empty(&founder.role).unwrap_or(""), 24)),
                    Cell::from(truncate(non_empty(&founder.previous_company).unwrap_or(""), 24))
                        .style(Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(32),
            Constraint::Length(26),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Founders "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.founders_state);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Dashboard ");

    let stats = match &app.stats {
        Remote::Loaded(stats) => stats,
        Remote::NotLoaded => {
            f.render_widget(Paragraph::new("  Loading stats...").block(block), area);
            return;
        }
        Remote::Failed(message) => {
            let text = Paragraph::new(format!("  {}", message))
                .style(Style::default().fg(Color::Red))
                .block(block);
            f.render_widget(text, area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let section = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Companies: ", label),
            Span::raw(stats.total_companies.to_string()),
            Span::styled("    Founders: ", label),
            Span::raw(stats.total_founders.to_string()),
            Span::styled("    With founders: ", label),
            Span::raw(stats.companies_with_founders.to_string()),
        ]),
        Line::from(""),
        Line::from(Span::styled("  TOP COMPANIES BY FOUNDERS", section)),
        Line::from(""),
    ];

    if stats.top_companies.is_empty() {
        content.push(Line::from(Span::styled(
            "  No founders yet",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let widest = stats.top_companies.iter().map(|c| c.founder_count).max().unwrap_or(0);
    for top in &stats.top_companies {
        let name = truncate(first_line(&top.company_name), 20);
        content.push(Line::from(vec![
            Span::raw(format!("  {:<22}", name)),
            Span::styled(bar(top.founder_count, widest, 30), Style::default().fg(Color::Blue)),
            Span::raw(format!(" {}", top.founder_count)),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled("  COMPANIES BY BATCH", section)));
    content.push(Line::from(""));

    let widest = stats.batch_stats.iter().map(|b| b.count).max().unwrap_or(0);
    for batch in &stats.batch_stats {
        let name = non_empty(&batch.batch).unwrap_or("Unknown");
        content.push(Line::from(vec![
            Span::raw(format!("  {:<22}", name)),
            Span::styled(bar(batch.count, widest, 30), Style::default().fg(Color::Magenta)),
            Span::raw(format!(" {}", batch.count)),
        ]));
    }

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);
    let mut status_spans = vec![];

    if app.current_page == Page::Roster {
        let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
        status_spans.push(Span::styled(
            format!(" Row: {}/{} ", selected, app.roster.visible().len()),
            Style::default().fg(Color::Cyan),
        ));

        if let Some((column, direction)) = app.roster.sort_state().active() {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(
                format!("Sort: {} {}", column.as_str(), direction.arrow()),
                Style::default().fg(Color::Green),
            ));
        }

        if !app.roster.search().is_empty() || app.roster.sort_state().active().is_some() {
            status_spans.push(Span::raw(" ("));
            status_spans.push(Span::styled("c", key));
            status_spans.push(Span::raw(" clear)"));
        }

        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("Enter", key));
        status_spans.push(Span::raw(" Details | "));
    } else {
        status_spans.push(Span::raw(" "));
    }

    status_spans.push(Span::styled("/", key));
    status_spans.push(Span::raw(" Search | "));
    status_spans.push(Span::styled("Tab", key));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("r", key));
    status_spans.push(Span::raw(" Reload | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_company_modal(f: &mut Frame, area: Rect, app: &App) {
    let Some(detail) = &app.detail else {
        return;
    };

    let modal = centered_rect(70, 70, area);
    f.render_widget(Clear, modal);

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let (title, content) = match &detail.company {
        Err(message) => (
            " Company Details ".to_string(),
            vec![
                Line::from(""),
                Line::from(Span::styled(format!("  {}", message), Style::default().fg(Color::Red))),
            ],
        ),
        Ok(company) => {
            let mut lines = vec![Line::from("")];

            let fields = [
                ("Batch", &company.batch),
                ("Location", &company.location),
                ("Industry", &company.industry),
                ("Website", &company.website),
                ("YC", &company.yc_url),
            ];
            for (name, value) in fields {
                if let Some(value) = non_empty(value) {
                    lines.push(Line::from(vec![
                        Span::styled(format!("  {}: ", name), label),
                        Span::raw(value.to_string()),
                    ]));
                }
            }
            if company.is_hiring == Some(true) {
                lines.push(Line::from(Span::styled("  Hiring", Style::default().fg(Color::Green))));
            }
            if let Some(description) = non_empty(&company.description) {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("  {}", description),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }

            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  FOUNDERS",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )));
            lines.push(Line::from(""));

            if company.founders.is_empty() {
                lines.push(Line::from(Span::styled(
                    "  No founders found",
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }

            for (i, founder) in company.founders.iter().enumerate() {
                let marker = if i == detail.selected { "→ " } else { "  " };
                let mut spans = vec![
                    Span::raw(format!("  {}", marker)),
                    Span::styled(founder.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                ];
                if let Some(role) = non_empty(&founder.role) {
                    spans.push(Span::styled(format!("  {}", role), Style::default().fg(Color::DarkGray)));
                }
                let links = founder.links();
                if !links.is_empty() {
                    let labels: Vec<&str> = links.iter().map(|(label, _)| *label).collect();
                    spans.push(Span::styled(
                        format!("  [{}]", labels.join(", ")),
                        Style::default().fg(Color::Blue),
                    ));
                }
                lines.push(Line::from(spans));
            }

            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  ↑/↓ select founder, Enter for links, Esc to close",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));

            (format!(" {} ", company.display_name()), lines)
        }
    };

    let panel = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );
    f.render_widget(panel, modal);

    if let Some(founder) = detail.popup_founder() {
        render_founder_popup(f, area, founder);
    }
}

fn render_founder_popup(f: &mut Frame, area: Rect, founder: &Founder) {
    let popup = centered_rect(50, 40, area);
    f.render_widget(Clear, popup);

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut content = vec![Line::from("")];

    if let Some(role) = non_empty(&founder.role) {
        content.push(Line::from(Span::styled(
            format!("  {}", role),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
        content.push(Line::from(""));
    }

    let links = founder.links();
    if links.is_empty() {
        content.push(Line::from(Span::styled(
            "  No social links available",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    for (name, url) in links {
        content.push(Line::from(vec![
            Span::styled(format!("  {}: ", name), label),
            Span::styled(url.to_string(), Style::default().fg(Color::Blue)),
        ]));
    }

    if let Some(email) = non_empty(&founder.email) {
        content.push(Line::from(vec![
            Span::styled("  Email: ", label),
            Span::raw(email.to_string()),
        ]));
    }

    let panel = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(format!(" {} ", founder.name)),
    );
    f.render_widget(panel, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn bar(value: i64, widest: i64, width: usize) -> String {
    if widest <= 0 || value <= 0 {
        return String::new();
    }
    let len = ((value as f64 / widest as f64) * width as f64).round().max(1.0) as usize;
    "█".repeat(len)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
