use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use komputer_core::{
    catalog::{CatalogClient, CatalogEvent},
    models::ItemId,
    store::{Action, ImageState, Outcome, Store},
    view::{BankView, HeaderView, LaptopView, Listing, SoldOutView, StoreView, WorkView},
    Money,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_LOAN_INPUT_LEN: usize = 12;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct LoanPromptModal {
    input: String,
    cursor: usize,
    error: Option<String>,
}

impl LoanPromptModal {
    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_LOAN_INPUT_LEN {
            return;
        }
        if ch.is_ascii_digit() || ch == '.' {
            self.input.insert(self.cursor, ch);
            self.cursor += 1;
            self.error = None;
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
            self.error = None;
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
            self.error = None;
        }
    }

    fn amount(&self) -> Result<Money, String> {
        self.input.parse::<Money>().map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone)]
enum Modal {
    LoanPrompt(LoanPromptModal),
    Notice(String),
}

enum AppEvent {
    Input(Event),
    Tick,
    ImageResolved { id: ItemId, url: Option<String> },
}

/// Terminal frontend for the store.
pub struct StoreApp {
    store: Store,
    client: CatalogClient,
    catalog_rx: Option<mpsc::Receiver<CatalogEvent>>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    modal: Option<Modal>,
    status: String,
    theme: Theme,
    should_quit: bool,
}

impl StoreApp {
    pub fn new(store: Store, client: CatalogClient) -> Self {
        Self {
            store,
            client,
            catalog_rx: None,
            event_tx: None,
            modal: None,
            status: "Fetching laptops…".to_string(),
            theme: Theme::default(),
            should_quit: false,
        }
    }

    pub fn attach_catalog(&mut self, receiver: mpsc::Receiver<CatalogEvent>) {
        self.catalog_rx = Some(receiver);
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        let mut catalog_rx = self.catalog_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            if let Some(rx) = catalog_rx.as_mut() {
                let mut catalog_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_catalog = rx.recv() => {
                        match maybe_catalog {
                            Some(event) => self.handle_catalog_event(event),
                            None => catalog_closed = true,
                        }
                    }
                }
                if catalog_closed {
                    catalog_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }

            self.request_selected_image();
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn handle_catalog_event(&mut self, event: CatalogEvent) {
        match &event {
            CatalogEvent::Loaded(catalog) => {
                self.set_status(format!("Loaded {} laptops", catalog.len()));
            }
            CatalogEvent::Error(err) => {
                self.set_status(format!("Catalog unavailable: {err}"));
            }
        }
        self.store.apply_catalog_event(event);
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) if key.kind != KeyEventKind::Release => {
                if self.modal.is_some() {
                    self.handle_modal_key(key);
                } else {
                    self.handle_key(key);
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            Some(AppEvent::ImageResolved { id, url }) => {
                debug!(id, url = url.as_deref().unwrap_or("none"), "Image resolved");
                self.store.record_image(id, url);
                true
            }
            None => false,
        }
    }

    fn request_selected_image(&mut self) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let Some(item) = self.store.begin_image_request() else {
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            let url = client.resolve_image(&item).await;
            if tx
                .send(AppEvent::ImageResolved { id: item.id, url })
                .await
                .is_err()
            {
                warn!(id = item.id, "Image resolved after the UI closed");
            }
        });
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        let action = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('l') => {
                self.modal = Some(Modal::LoanPrompt(LoanPromptModal::default()));
                return;
            }
            KeyCode::Char('r') if !self.store.economy().has_loan() => return,
            KeyCode::Char('w') => Action::Work,
            KeyCode::Char('b') => Action::Bank,
            KeyCode::Char('r') => Action::RepayLoan,
            KeyCode::Up | KeyCode::Char('k') => Action::SelectPrevious,
            KeyCode::Down | KeyCode::Char('j') => Action::SelectNext,
            KeyCode::Home => Action::Select(0),
            KeyCode::End => Action::Select(usize::MAX),
            KeyCode::Enter | KeyCode::Char('n') if self.store.selected_item().is_some() => {
                Action::Buy
            }
            _ => return,
        };
        self.dispatch(action);
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };
        match modal {
            Modal::Notice(_) => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    self.modal = None;
                }
            }
            Modal::LoanPrompt(prompt) => match key.code {
                KeyCode::Esc => self.modal = None,
                KeyCode::Enter => match prompt.amount() {
                    Ok(amount) => {
                        self.modal = None;
                        self.dispatch(Action::RequestLoan(amount));
                    }
                    Err(reason) => prompt.error = Some(reason),
                },
                KeyCode::Left => prompt.move_cursor(-1),
                KeyCode::Right => prompt.move_cursor(1),
                KeyCode::Home => prompt.move_home(),
                KeyCode::End => prompt.move_end(),
                KeyCode::Backspace => prompt.backspace(),
                KeyCode::Delete => prompt.delete(),
                KeyCode::Char(ch) => prompt.insert(ch),
                _ => {}
            },
        }
    }

    fn dispatch(&mut self, action: Action) {
        match self.store.dispatch(action) {
            Ok(Outcome::Status(message)) => {
                if !message.is_empty() {
                    self.set_status(message);
                }
            }
            Ok(Outcome::Notice(message)) => {
                self.set_status(message.clone());
                self.modal = Some(Modal::Notice(message));
            }
            Err(err) => {
                info!(?action, reason = %err, "Action rejected");
                self.modal = Some(Modal::Notice(err.to_string()));
            }
        }
    }

    fn set_status(&mut self, message: String) {
        self.status = format!("[{}] {}", Local::now().format("%H:%M:%S"), message);
    }

    fn draw(&self, frame: &mut Frame) {
        let view = StoreView::from_store(&self.store);
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(8),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(frame, rows[0], &view.header);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(30),
                Constraint::Percentage(40),
            ])
            .split(rows[1]);
        self.render_bank(frame, panels[0], &view.bank);
        self.render_work(frame, panels[1], &view.work);
        self.render_menu(frame, panels[2], &view.listing);
        self.render_details(frame, rows[2], &view.listing);
        self.render_status(frame, rows[3]);

        match &self.modal {
            Some(Modal::LoanPrompt(prompt)) => self.render_loan_prompt(frame, prompt),
            Some(Modal::Notice(message)) => self.render_notice(frame, message),
            None => {}
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, header: &HeaderView) {
        let lines = vec![
            Line::from(Span::styled(
                "Komputer Store",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::raw(header.mood.caption()),
                Span::styled(
                    format!("  (laptops owned: {})", header.items_owned),
                    Style::default().fg(self.theme.muted),
                ),
            ]),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_bank(&self, frame: &mut Frame, area: Rect, bank: &BankView) {
        let mut lines = vec![Line::from(vec![
            Span::raw("Balance  "),
            Span::styled(
                bank.balance.clone(),
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            ),
        ])];
        if let Some(loan) = &bank.loan {
            lines.push(Line::from(vec![
                Span::raw("Loan     "),
                Span::styled(loan.clone(), Style::default().fg(self.theme.warning)),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(self.key_hint("l", "Get a loan"));

        let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Bank"));
        frame.render_widget(paragraph, area);
    }

    fn render_work(&self, frame: &mut Frame, area: Rect, work: &WorkView) {
        let mut lines = vec![
            Line::from(vec![
                Span::raw("Pay  "),
                Span::styled(
                    work.pay.clone(),
                    Style::default()
                        .fg(self.theme.success)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            self.key_hint("w", "Work"),
            self.key_hint("b", "Bank"),
        ];
        if work.show_repay {
            lines.push(self.key_hint("r", "Repay loan"));
        }

        let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Work"));
        frame.render_widget(paragraph, area);
    }

    fn render_menu(&self, frame: &mut Frame, area: Rect, listing: &Listing) {
        let block = Block::default().borders(Borders::ALL).title("Laptops");
        let laptops = match listing {
            Listing::Available(laptops) => laptops,
            Listing::Loading => {
                let paragraph = Paragraph::new("Loading…")
                    .style(Style::default().fg(self.theme.muted))
                    .block(block);
                frame.render_widget(paragraph, area);
                return;
            }
            Listing::Unavailable(_) | Listing::SoldOut(_) => {
                frame.render_widget(block, area);
                return;
            }
        };

        let items: Vec<ListItem> = laptops
            .titles
            .iter()
            .map(|title| ListItem::new(title.clone()))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(laptops.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect, listing: &Listing) {
        match listing {
            Listing::Available(laptop) => self.render_laptop(frame, area, laptop),
            Listing::SoldOut(sold_out) => self.render_sold_out(frame, area, sold_out),
            Listing::Loading => {
                let paragraph = Paragraph::new("Waiting for the catalog…")
                    .style(Style::default().fg(self.theme.muted))
                    .block(Block::default().borders(Borders::ALL).title("Laptop"));
                frame.render_widget(paragraph, area);
            }
            Listing::Unavailable(reason) => {
                let paragraph = Paragraph::new(format!("The catalog could not be loaded.\n{reason}"))
                    .style(Style::default().fg(self.theme.danger))
                    .block(Block::default().borders(Borders::ALL).title("Laptop"))
                    .wrap(Wrap { trim: true });
                frame.render_widget(paragraph, area);
            }
        }
    }

    fn render_laptop(&self, frame: &mut Frame, area: Rect, laptop: &LaptopView) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let mut lines = vec![
            Line::from(Span::styled(
                laptop.title.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        lines.extend(laptop.description.lines().map(|line| Line::from(line.to_string())));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            laptop.price.clone(),
            Style::default()
                .fg(self.theme.success)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(self.key_hint("Enter", "Buy now"));
        lines.push(Line::from(""));
        lines.push(Line::from(self.image_line(&laptop.title, &laptop.image)));

        let details = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Laptop"))
            .wrap(Wrap { trim: false });
        frame.render_widget(details, columns[0]);

        let features = Paragraph::new(laptop.features.as_str())
            .block(Block::default().borders(Borders::ALL).title("Features"))
            .wrap(Wrap { trim: true });
        frame.render_widget(features, columns[1]);
    }

    fn image_line(&self, title: &str, image: &ImageState) -> Span<'static> {
        match image {
            ImageState::Resolving => Span::styled(
                format!("Fetching image of {title}…"),
                Style::default().fg(self.theme.muted),
            ),
            ImageState::Found(url) => Span::styled(
                format!("Picture of {title}: {url}"),
                Style::default().fg(self.theme.muted),
            ),
            ImageState::Missing => Span::styled(
                "No picture available".to_string(),
                Style::default().fg(self.theme.muted),
            ),
        }
    }

    fn render_sold_out(&self, frame: &mut Frame, area: Rect, sold_out: &SoldOutView) {
        let mut lines = vec![
            Line::from(Span::styled(
                sold_out.title.clone(),
                Style::default()
                    .fg(self.theme.danger)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        lines.extend(sold_out.description.lines().map(|line| Line::from(line.to_string())));
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Features: {}", sold_out.features)));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Laptop"))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let help = Span::styled(
            "  ↑/↓ select • q quit",
            Style::default().fg(self.theme.muted),
        );
        let paragraph = Paragraph::new(Line::from(vec![Span::raw(self.status.clone()), help]))
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_loan_prompt(&self, frame: &mut Frame, prompt: &LoanPromptModal) {
        let area = centered_rect(48, 8, frame.size());
        frame.render_widget(Clear, area);

        let (before, after) = prompt.input.split_at(prompt.cursor.min(prompt.input.len()));
        let mut lines = vec![
            Line::from("How much would you like to borrow?"),
            Line::from(Span::styled(
                format!(
                    "You can borrow up to {}.",
                    self.store.economy().loan_limit()
                ),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(vec![
                Span::raw("€ "),
                Span::styled(before.to_string(), Style::default().fg(self.theme.primary_fg)),
                Span::styled("▏", Style::default().fg(self.theme.accent)),
                Span::styled(after.to_string(), Style::default().fg(self.theme.primary_fg)),
            ]),
        ];
        if let Some(error) = &prompt.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(self.theme.danger),
            )));
        }
        lines.push(Line::from(Span::styled(
            "Enter to confirm • Esc to cancel",
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Get a loan"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_notice(&self, frame: &mut Frame, message: &str) {
        let width = (message.chars().count() as u16 + 6).clamp(30, 72);
        let area = centered_rect(width, 6, frame.size());
        frame.render_widget(Clear, area);

        let lines = vec![
            Line::from(message.to_string()),
            Line::from(""),
            Line::from(Span::styled(
                "Press Enter to continue",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.warning))
                    .title("Notice"),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn key_hint(&self, key: &str, label: &str) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("[{key}] "),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(label.to_string()),
        ])
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_prompt_accepts_only_amount_characters() {
        let mut prompt = LoanPromptModal::default();
        for ch in "1a5-0.5".chars() {
            prompt.insert(ch);
        }
        assert_eq!(prompt.input, "150.5");
        assert_eq!(prompt.amount(), Ok(Money::from_cents(15_050)));

        prompt.move_home();
        prompt.delete();
        prompt.move_end();
        prompt.backspace();
        assert_eq!(prompt.input, "50.");
        assert_eq!(prompt.amount(), Ok(Money::from_euros(50)));
    }

    #[test]
    fn empty_loan_prompt_reports_error() {
        let prompt = LoanPromptModal::default();
        assert!(prompt.amount().is_err());
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect(40, 4, area);
        assert_eq!(rect, Rect::new(0, 3, 20, 4));
    }
}
