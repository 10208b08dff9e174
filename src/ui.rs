use anyhow::Result;
use chrono::{Months, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use finance_tracker::entities::Transaction;
use finance_tracker::reports::{self, AccountBalance, Charts, Dashboard, DateRange};
use finance_tracker::{ChartSeries, TransactionKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

/// Days shown by the statement page when it opens
const STATEMENT_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Accounts,
    Statement,
    Charts,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::Accounts,
            Page::Accounts => Page::Statement,
            Page::Statement => Page::Charts,
            Page::Charts => Page::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dashboard => Page::Charts,
            Page::Accounts => Page::Dashboard,
            Page::Statement => Page::Accounts,
            Page::Charts => Page::Statement,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Accounts => "Accounts",
            Page::Statement => "Statement",
            Page::Charts => "Charts",
        }
    }
}

/// Snapshot of every report the terminal dashboard shows
pub struct App {
    pub today: NaiveDate,
    pub current_page: Page,
    pub dashboard: Dashboard,
    pub balances: Vec<AccountBalance>,
    pub charts: Charts,
    pub statement: Vec<Transaction>,
    pub statement_range: DateRange,

    /// Window the statement opened with; shifts are month offsets from it
    statement_base: DateRange,
    statement_offset: i32,
    pub state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn load(conn: &Connection, today: NaiveDate) -> Result<Self> {
        let start = today
            .checked_sub_days(chrono::Days::new(STATEMENT_DAYS))
            .unwrap_or(today);
        let statement_range = DateRange::new(start, today);

        let mut app = Self {
            today,
            current_page: Page::Dashboard,
            dashboard: reports::dashboard(conn, today)?,
            balances: reports::account_balances(conn)?,
            charts: reports::charts(conn, today)?,
            statement: reports::transactions_in_range(conn, statement_range.start, statement_range.end)?,
            statement_range,
            statement_base: statement_range,
            statement_offset: 0,
            state: TableState::default(),
            show_detail: false,
        };
        app.reset_selection();
        Ok(app)
    }

    /// Re-run every report against current storage
    pub fn refresh(&mut self, conn: &Connection) -> Result<()> {
        self.dashboard = reports::dashboard(conn, self.today)?;
        self.balances = reports::account_balances(conn)?;
        self.charts = reports::charts(conn, self.today)?;
        self.statement =
            reports::transactions_in_range(conn, self.statement_range.start, self.statement_range.end)?;
        self.reset_selection();
        Ok(())
    }

    /// Move the statement window by whole months (negative = back in time)
    pub fn shift_statement(&mut self, conn: &Connection, months: i32) -> Result<()> {
        let offset = self.statement_offset.saturating_add(months);
        let shift = |d: NaiveDate| {
            if offset < 0 {
                d.checked_sub_months(Months::new(offset.unsigned_abs()))
            } else {
                d.checked_add_months(Months::new(offset.unsigned_abs()))
            }
        };

        let base = self.statement_base;
        if let (Some(start), Some(end)) = (shift(base.start), shift(base.end)) {
            self.statement_offset = offset;
            self.statement_range = DateRange::new(start, end);
            self.statement = reports::transactions_in_range(conn, start, end)?;
            self.reset_selection();
        }
        Ok(())
    }

    fn rows_len(&self) -> usize {
        match self.current_page {
            Page::Accounts => self.balances.len(),
            Page::Statement => self.statement.len(),
            Page::Dashboard | Page::Charts => 0,
        }
    }

    fn reset_selection(&mut self) {
        if self.rows_len() > 0 {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.state.selected().and_then(|i| self.statement.get(i))
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.show_detail = false;
        self.reset_selection();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.show_detail = false;
        self.reset_selection();
    }

    pub fn next(&mut self) {
        let len = self.rows_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.rows_len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + 20).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.rows_len() == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(20));
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App, conn: &Connection) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, conn);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    conn: &Connection,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter if app.current_page == Page::Statement => app.toggle_detail(),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('r') => app.refresh(conn)?,
                KeyCode::Char('[') if app.current_page == Page::Statement => app.shift_statement(conn, -1)?,
                KeyCode::Char(']') if app.current_page == Page::Statement => app.shift_statement(conn, 1)?,
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
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
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::Accounts => render_accounts(f, chunks[1], app),
        Page::Statement if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);
            render_statement(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Statement => render_statement(f, chunks[1], app),
        Page::Charts => render_charts(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn money_color(value: f64) -> Color {
    if value < 0.0 {
        Color::Red
    } else {
        Color::Green
    }
}

fn kind_color(kind: TransactionKind) -> Color {
    match kind {
        TransactionKind::Income => Color::Green,
        TransactionKind::Expense => Color::Red,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Dashboard, Page::Accounts, Page::Statement, Page::Charts];

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

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Balance: {:.2}", app.dashboard.total_balance),
        Style::default().fg(money_color(app.dashboard.total_balance)),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(area);

    let dash = &app.dashboard;
    let last_expense = match &dash.last_expense {
        Some(tx) => format!("{} - {} ({:.2})", tx.date, tx.description, tx.amount),
        None => "No expenses recorded".to_string(),
    };

    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let content = vec![
        Line::from(""),
        Line::from(vec![
            label("  Total balance:       "),
            Span::styled(format!("{:.2}", dash.total_balance), Style::default().fg(money_color(dash.total_balance))),
        ]),
        Line::from(vec![
            label("  Income this month:   "),
            Span::styled(format!("{:.2}", dash.month_income), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            label("  Expenses this month: "),
            Span::styled(format!("{:.2}", dash.month_expense), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![label("  Last expense:        "), Span::raw(last_expense)]),
    ];

    let summary = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Summary - {} ", app.today)),
    );
    f.render_widget(summary, chunks[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_series_chart(f, bottom[0], &dash.expense_series, Color::Red);
    render_series_table(f, bottom[1], &dash.expense_breakdown);
}

/// Bars are whole currency units; negatives are drawn as zero
fn bar_data(series: &ChartSeries) -> Vec<(&str, u64)> {
    series
        .points
        .iter()
        .map(|p| (p.label.as_str(), p.value.max(0.0).round() as u64))
        .collect()
}

fn render_series_chart(f: &mut Frame, area: Rect, series: &ChartSeries, color: Color) {
    let data = bar_data(series);
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", series.name)))
        .data(data.as_slice())
        .bar_width(7)
        .bar_gap(1)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(Color::Black).bg(color));

    f.render_widget(chart, area);
}

fn render_series_table(f: &mut Frame, area: Rect, series: &ChartSeries) {
    let header = Row::new(["Label", "Total"].map(|h| Cell::from(h).style(header_style())))
        .style(Style::default().bg(Color::DarkGray));

    let rows = series.points.iter().map(|p| {
        Row::new(vec![
            Cell::from(truncate(&p.label, 24)),
            Cell::from(format!("{:.2}", p.value)),
        ])
    });

    let table = Table::new(rows, [Constraint::Length(26), Constraint::Length(14)])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", series.name)));

    f.render_widget(table, area);
}

fn render_accounts(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(
        ["Account", "Type", "Initial", "Current"].map(|h| Cell::from(h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.balances.iter().map(|account| {
        Row::new(vec![
            Cell::from(truncate(&account.name, 28)),
            Cell::from(truncate(&account.account_type, 16)),
            Cell::from(format!("{:.2}", account.initial_balance)),
            Cell::from(format!("{:.2}", account.balance))
                .style(Style::default().fg(money_color(account.balance))),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Accounts - derived balances "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_statement(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(
        ["Date", "Description", "Account", "Kind", "Amount"].map(|h| Cell::from(h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.statement.iter().map(|tx| {
        let color = kind_color(tx.kind);
        Row::new(vec![
            Cell::from(tx.date.to_string()),
            Cell::from(truncate(&tx.description, 30)),
            Cell::from(truncate(tx.account_name.as_deref().unwrap_or("-"), 18)),
            Cell::from(tx.kind.title()).style(Style::default().fg(color)),
            Cell::from(format!("{:.2}", tx.amount)).style(Style::default().fg(color)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(32),
            Constraint::Length(20),
            Constraint::Length(9),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(format!(
        " Statement {} → {} ",
        app.statement_range.start, app.statement_range.end
    )))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Transaction Details ");

    let Some(tx) = app.selected_transaction() else {
        f.render_widget(Paragraph::new("No transaction selected").block(block), area);
        return;
    };

    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(name, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(value),
        ])
    };

    let content = vec![
        Line::from(""),
        field("  Kind: ", tx.kind.title().to_string()),
        field("  Date: ", tx.date.to_string()),
        field("  Amount: ", format!("{:.2}", tx.amount)),
        field("  Category: ", tx.category_name.clone().unwrap_or_else(|| "-".to_string())),
        field("  Account: ", tx.account_name.clone().unwrap_or_else(|| "-".to_string())),
        Line::from(""),
        field("  Description: ", tx.description.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "  Press Enter to close",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_charts(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let mut income = ChartSeries::new("Income per month");
    let mut expense = ChartSeries::new("Expenses per month");
    for month in &app.charts.revenue_vs_expense {
        income.push(month.label.clone(), month.income);
        expense.push(month.label.clone(), month.expense);
    }

    render_series_chart(f, top[0], &income, Color::Green);
    render_series_chart(f, top[1], &expense, Color::Red);
    render_series_table(f, bottom[0], &app.charts.income_by_category);
    render_series_table(f, bottom[1], &app.charts.expense_by_category);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if matches!(app.current_page, Page::Accounts | Page::Statement) {
        let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
        status_spans.push(Span::styled(
            format!(" Row: {}/{} ", selected, app.rows_len()),
            Style::default().fg(Color::Cyan),
        ));
        status_spans.push(Span::raw("| "));
    }

    if app.current_page == Page::Statement {
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Details | "));
        status_spans.push(Span::styled("[ ]", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Month | "));
    }

    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Refresh | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)])
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finance_tracker::entities::account::{insert_account, NewAccount};
    use finance_tracker::entities::transaction::{insert_transaction, NewTransaction};
    use finance_tracker::setup_database;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let account_id = insert_account(
            &conn,
            &NewAccount {
                name: "Wallet".to_string(),
                account_type: "cash".to_string(),
                initial_balance: 100.0,
            },
        )
        .unwrap();

        for (day, amount) in [(1, 10.0), (5, 20.0), (9, 30.0)] {
            insert_transaction(
                &conn,
                TransactionKind::Expense,
                &NewTransaction {
                    description: format!("expense {}", day),
                    amount,
                    category_id: 1,
                    account_id,
                    date: date(2025, 3, day),
                },
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn test_page_cycle() {
        let mut page = Page::Dashboard;
        for _ in 0..4 {
            page = page.next();
        }
        assert_eq!(page, Page::Dashboard);
        assert_eq!(Page::Dashboard.previous(), Page::Charts);
    }

    #[test]
    fn test_load_snapshot() {
        let conn = seeded_conn();
        let app = App::load(&conn, date(2025, 3, 10)).unwrap();

        assert_eq!(app.dashboard.total_balance, 40.0);
        assert_eq!(app.balances.len(), 1);
        assert_eq!(app.statement.len(), 3);
        assert_eq!(app.statement_range.start, date(2025, 2, 8));
    }

    #[test]
    fn test_navigation_wraps_on_statement() {
        let conn = seeded_conn();
        let mut app = App::load(&conn, date(2025, 3, 10)).unwrap();
        app.next_page();
        app.next_page();
        assert_eq!(app.current_page, Page::Statement);
        assert_eq!(app.state.selected(), Some(0));

        app.previous();
        assert_eq!(app.state.selected(), Some(2));
        app.next();
        assert_eq!(app.state.selected(), Some(0));

        app.page_down();
        assert_eq!(app.state.selected(), Some(2));
        app.page_up();
        assert_eq!(app.state.selected(), Some(0));

        // Newest first
        assert_eq!(app.selected_transaction().unwrap().date, date(2025, 3, 9));
    }

    #[test]
    fn test_shift_statement_window() {
        let conn = seeded_conn();
        let mut app = App::load(&conn, date(2025, 3, 10)).unwrap();

        app.shift_statement(&conn, -1).unwrap();
        assert_eq!(app.statement_range.end, date(2025, 2, 10));
        assert!(app.statement.is_empty());

        app.shift_statement(&conn, 1).unwrap();
        assert_eq!(app.statement_range.end, date(2025, 3, 10));
        assert_eq!(app.statement.len(), 3);
    }

    #[test]
    fn test_shift_statement_round_trips_month_ends() {
        let conn = seeded_conn();
        let mut app = App::load(&conn, date(2025, 3, 31)).unwrap();
        assert_eq!(app.statement_range.start, date(2025, 3, 1));

        app.shift_statement(&conn, -1).unwrap();
        assert_eq!(app.statement_range.start, date(2025, 2, 1));
        assert_eq!(app.statement_range.end, date(2025, 2, 28));

        app.shift_statement(&conn, 1).unwrap();
        assert_eq!(app.statement_range.start, date(2025, 3, 1));
        assert_eq!(app.statement_range.end, date(2025, 3, 31));
        assert_eq!(app.statement.len(), 3);
    }

    #[test]
    fn test_bar_data_clamps_negatives() {
        let mut series = ChartSeries::new("x");
        series.push("a", -5.0);
        series.push("b", 12.6);
        assert_eq!(bar_data(&series), vec![("a", 0), ("b", 13)]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long description", 10), "a very ...");
    }
}
