// src/tui/mod.rs
use crate::core::ledger::Account;
use crate::storage::StateStore;
use crate::types::{TickerMark, TradeOutcome, UiEvent};
use crate::utils::precision::{percent, signed_usd, usd};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Terminal,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::{
    io,
    time::{Duration, Instant},
};
use tokio::sync::{mpsc, watch};
use tracing::warn;

const CARDS_PER_ROW: usize = 5;
const HISTORY_ROWS: usize = 5;
const LOG_LINES: usize = 20;

pub struct App {
    pub strategy: String,
    pub tickers: Vec<String>,
    pub account: Option<Account>,
    pub marks: HashMap<String, TickerMark>,
    pub logs: Vec<String>,
    pub trading_enabled: bool,
    pub needs_reload: bool,
}

impl App {
    pub fn new(strategy: String, tickers: Vec<String>) -> Self {
        Self {
            strategy,
            tickers,
            account: None,
            marks: HashMap::new(),
            logs: Vec::new(),
            trading_enabled: true,
            needs_reload: true,
        }
    }

    pub fn on_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Marks(marks) => {
                for mark in marks {
                    self.marks.insert(mark.ticker.clone(), mark);
                }
            }
            UiEvent::Ledger(event) => {
                self.push_log(event.describe().replace('\n', " | "));
                self.needs_reload = true;
            }
            UiEvent::Log(msg) => self.push_log(msg),
        }
    }

    fn push_log(&mut self, msg: String) {
        self.logs.push(msg);
        if self.logs.len() > LOG_LINES {
            self.logs.remove(0);
        }
    }

    fn open_positions(&self) -> usize {
        self.account.as_ref().map_or(0, Account::open_positions)
    }
}

pub struct Dashboard {
    pub rx: mpsc::Receiver<UiEvent>,
    pub store: Arc<dyn StateStore>,
    pub trading_enabled: watch::Sender<bool>,
    pub refresh: Duration,
}

pub async fn run(dashboard: Dashboard, app: App) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(e) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            return Err(e.into());
        }
    };

    let result = event_loop(&mut terminal, dashboard, app).await;

    // Restore the terminal on every exit path.
    let restored = restore_terminal(&mut terminal);
    result.and(restored)
}

#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Continue,
    Quit,
}

fn handle_key(app: &mut App, key: KeyEvent, trading_enabled: &watch::Sender<bool>) -> KeyAction {
    match key.code {
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('e') => {
            trading_enabled.send_modify(|enabled| *enabled = !*enabled);
            app.trading_enabled = *trading_enabled.borrow();
            let state = if app.trading_enabled { "enabled" } else { "paused" };
            app.push_log(format!("Entries {state} by operator"));
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn restore_terminal<B: Backend + io::Write>(terminal: &mut Terminal<B>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    dashboard: Dashboard,
    mut app: App,
) -> anyhow::Result<()> {
    let Dashboard {
        mut rx,
        store,
        trading_enabled,
        refresh,
    } = dashboard;

    let mut last_reload = Instant::now();
    app.trading_enabled = *trading_enabled.borrow();

    loop {
        if app.needs_reload || last_reload.elapsed() >= refresh {
            match store.load().await {
                Ok(Some(account)) => app.account = Some(account),
                Ok(None) => {}
                Err(e) => warn!("Dashboard could not read state: {}", e),
            }
            app.needs_reload = false;
            last_reload = Instant::now();
        }

        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if handle_key(&mut app, key, &trading_enabled) == KeyAction::Quit {
                    return Ok(());
                }
            }
        }

        while let Ok(event) = rx.try_recv() {
            app.on_event(event);
        }
    }
}

fn ui(f: &mut ratatui::Frame, app: &App) {
    let card_rows = app.tickers.len().div_ceil(CARDS_PER_ROW).max(1);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(4 * card_rows as u16),
                Constraint::Length(3),
                Constraint::Length(HISTORY_ROWS as u16 + 3),
                Constraint::Min(5),
            ]
            .as_ref(),
        )
        .split(f.size());

    render_header(f, app, chunks[0]);
    render_cards(f, app, chunks[1], card_rows);
    render_metrics(f, app, chunks[2]);
    render_history(f, app, chunks[3]);

    let logs: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .map(|s| ListItem::new(Line::from(Span::raw(s))))
        .collect();
    let logs_list =
        List::new(logs).block(Block::default().borders(Borders::ALL).title("System Logs"));
    f.render_widget(logs_list, chunks[4]);
}

fn render_header(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let (mode, mode_style) = if app.trading_enabled {
        ("ACTIVE", Style::default().fg(Color::Green))
    } else {
        ("PAUSED", Style::default().fg(Color::Red))
    };
    let updated = app
        .account
        .as_ref()
        .and_then(|a| a.last_update)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("Paper Trader [{}]", app.strategy),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Entries: "),
        Span::styled(mode, mode_style.add_modifier(Modifier::BOLD)),
        Span::raw(format!(" | Last trade: {updated} | q quit, e toggle")),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(header, area);
}

fn render_cards(f: &mut ratatui::Frame, app: &App, area: Rect, card_rows: usize) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, card_rows as u32); card_rows])
        .split(area);

    for (row_area, tickers) in rows.iter().zip(app.tickers.chunks(CARDS_PER_ROW)) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, CARDS_PER_ROW as u32); CARDS_PER_ROW])
            .split(*row_area);

        for (col_area, ticker) in cols.iter().zip(tickers) {
            f.render_widget(ticker_card(app, ticker), *col_area);
        }
    }
}

fn ticker_card<'a>(app: &'a App, ticker: &'a str) -> Paragraph<'a> {
    let position = app.account.as_ref().and_then(|a| a.position(ticker));
    let mark = app.marks.get(ticker);

    let (border, body) = match position.filter(|p| p.is_invested()) {
        Some(position) => {
            let pnl = mark.and_then(|m| m.net_pnl).or(position.last_pnl);
            let pnl_line = match pnl {
                Some(pnl) => {
                    let color = if pnl.is_sign_positive() && !pnl.is_zero() {
                        Color::Green
                    } else {
                        Color::Red
                    };
                    Line::from(Span::styled(signed_usd(pnl), Style::default().fg(color)))
                }
                None => Line::from("…"),
            };
            (
                Color::Green,
                vec![pnl_line, Line::from(format!("Inv: {}", usd(position.invested)))],
            )
        }
        None => {
            let price = mark
                .and_then(|m| m.price)
                .map(usd)
                .unwrap_or_else(|| "—".to_string());
            (Color::Gray, vec![Line::from(price)])
        }
    };

    Paragraph::new(body).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Span::styled(ticker, Style::default().add_modifier(Modifier::BOLD))),
    )
}

fn render_metrics(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, 4); 4])
        .split(area);

    let (equity, cash, win_rate) = match &app.account {
        Some(a) => (usd(a.equity), usd(a.balance), format!("{:.1}%", a.win_rate())),
        None => ("—".into(), "—".into(), "—".into()),
    };
    let metrics = [
        ("Account Value", equity),
        ("Cash", cash),
        (
            "Positions",
            format!("{} / {}", app.open_positions(), app.tickers.len()),
        ),
        ("Win Rate", win_rate),
    ];

    for ((title, value), col) in metrics.into_iter().zip(cols.iter()) {
        let widget = Paragraph::new(Span::styled(
            value,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(widget, *col);
    }
}

fn render_history(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = app
        .account
        .iter()
        .flat_map(|a| a.history.iter().rev().take(HISTORY_ROWS))
        .map(|record| {
            let (label, color) = match record.outcome {
                TradeOutcome::Win => ("WIN", Color::Green),
                TradeOutcome::Loss => ("LOSS", Color::Red),
            };
            Row::new(vec![
                Cell::from(record.ticker.clone()),
                Cell::from(label).style(Style::default().fg(color)),
                Cell::from(signed_usd(record.net_pnl)),
                Cell::from(percent(record.net_pnl_pct)),
                Cell::from(record.closed_at.format("%m-%d %H:%M").to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Min(11),
        ],
    )
    .header(
        Row::new(vec!["Ticker", "Res", "P/L", "%", "Closed"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Recent Trades"));
    f.render_widget(table, area);
}
