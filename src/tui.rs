use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::controller::{BoardEvent, BoardView, JobCard, Renderer, ViewController};
use crate::filter::{CategoryChoice, Choice};
use crate::models::{Level, PostingDraft, CATEGORY_PALETTE, LOCATIONS};
use crate::notice::NoticeKind;
use crate::store::JobStore;

/// Keeps the latest view for the draw loop.
#[derive(Default)]
pub struct SnapshotRenderer {
    view: BoardView,
}

impl SnapshotRenderer {
    pub fn view(&self) -> &BoardView {
        &self.view
    }
}

impl Renderer for SnapshotRenderer {
    fn render(&mut self, view: &BoardView) -> Result<()> {
        self.view = view.clone();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    Form,
}

const FORM_FIELDS: [&str; 6] = ["Title", "Company", "Category", "Location", "Level", "Description"];

#[derive(Debug, Default)]
struct EmployerForm {
    field: usize,
    title: String,
    company: String,
    category: usize,
    location: String,
    level: usize,
    description: String,
}

impl EmployerForm {
    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            0 => Some(&mut self.title),
            1 => Some(&mut self.company),
            3 => Some(&mut self.location),
            5 => Some(&mut self.description),
            _ => None,
        }
    }

    fn cycle(&mut self, forward: bool) {
        let (idx, len) = match self.field {
            2 => (&mut self.category, CATEGORY_PALETTE.len()),
            4 => (&mut self.level, Level::ALL.len()),
            _ => return,
        };
        *idx = if forward { (*idx + 1) % len } else { (*idx + len - 1) % len };
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.title.clone(),
            1 => self.company.clone(),
            2 => format!("< {} >", CATEGORY_PALETTE[self.category]),
            3 => self.location.clone(),
            4 => format!("< {} >", Level::ALL[self.level]),
            _ => self.description.clone(),
        }
    }

    fn draft(&self) -> PostingDraft {
        PostingDraft {
            title: self.title.clone(),
            company: self.company.clone(),
            category: CATEGORY_PALETTE[self.category].to_string(),
            location: self.location.clone(),
            level: Some(Level::ALL[self.level]),
            description: self.description.clone(),
        }
    }
}

struct AppState {
    mode: Mode,
    selected: usize,
    scroll_offset: u16,
    level_idx: usize,
    location_idx: usize,
    keyword: String,
    form: EmployerForm,
}

impl AppState {
    fn new() -> Self {
        Self {
            mode: Mode::Browse,
            selected: 0,
            scroll_offset: 0,
            level_idx: 0,
            location_idx: 0,
            keyword: String::new(),
            form: EmployerForm::default(),
        }
    }

    fn clamp(&mut self, view: &BoardView) {
        if self.selected >= view.cards.len() {
            self.selected = view.cards.len().saturating_sub(1);
        }
    }

    fn current<'a>(&self, view: &'a BoardView) -> Option<&'a JobCard> {
        view.cards.get(self.selected)
    }

    fn next(&mut self, view: &BoardView) {
        if !view.cards.is_empty() && self.selected < view.cards.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    /// Any -> Internship -> Junior -> Mid -> Any
    fn cycle_level(&mut self) -> Choice<Level> {
        self.level_idx = (self.level_idx + 1) % (Level::ALL.len() + 1);
        match self.level_idx {
            0 => Choice::Any,
            i => Choice::Exact(Level::ALL[i - 1]),
        }
    }

    fn cycle_location(&mut self) -> Choice<String> {
        self.location_idx = (self.location_idx + 1) % (LOCATIONS.len() + 1);
        match self.location_idx {
            0 => Choice::Any,
            i => Choice::Exact(LOCATIONS[i - 1].to_string()),
        }
    }
}

pub fn run_board(store: JobStore, config: &Config) -> Result<()> {
    let mut ctl = ViewController::new(store, SnapshotRenderer::default(), config);
    ctl.init(config, Instant::now())?;
    let mut state = AppState::new();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, &mut ctl);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    ctl: &mut ViewController<SnapshotRenderer>,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        state.clamp(ctl.renderer().view());
        list_state.select(Some(state.selected));
        terminal.draw(|frame| draw(frame, state, ctl, &mut list_state))?;

        // Wake for the debounce deadline or notice expiry, whichever is sooner.
        let now = Instant::now();
        let timeout = ctl
            .next_deadline()
            .map(|at| at.saturating_duration_since(now))
            .unwrap_or(Duration::from_millis(100))
            .min(Duration::from_millis(100));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !handle_key(key, state, ctl)? {
                    break;
                }
            }
        }
        ctl.tick(Instant::now())?;
    }
    Ok(())
}

/// Returns false when the user quits.
fn handle_key(
    key: KeyEvent,
    state: &mut AppState,
    ctl: &mut ViewController<SnapshotRenderer>,
) -> Result<bool> {
    let now = Instant::now();
    match state.mode {
        Mode::Search => match key.code {
            KeyCode::Enter | KeyCode::Esc => state.mode = Mode::Browse,
            KeyCode::Backspace => {
                state.keyword.pop();
                ctl.handle(BoardEvent::KeywordChanged(state.keyword.clone()), now)?;
            }
            KeyCode::Char(c) => {
                state.keyword.push(c);
                ctl.handle(BoardEvent::KeywordChanged(state.keyword.clone()), now)?;
            }
            _ => {}
        },
        Mode::Form => match key.code {
            KeyCode::Esc => state.mode = Mode::Browse,
            KeyCode::Enter => {
                ctl.handle(BoardEvent::EmployerSubmit(state.form.draft()), now)?;
                if ctl.notices().last().is_some_and(|n| n.kind == NoticeKind::Success) {
                    state.form = EmployerForm::default();
                    state.mode = Mode::Browse;
                    state.selected = 0;
                }
            }
            KeyCode::Tab | KeyCode::Down => state.form.field = (state.form.field + 1) % FORM_FIELDS.len(),
            KeyCode::BackTab | KeyCode::Up => {
                state.form.field = (state.form.field + FORM_FIELDS.len() - 1) % FORM_FIELDS.len()
            }
            KeyCode::Left => state.form.cycle(false),
            KeyCode::Right => state.form.cycle(true),
            KeyCode::Backspace => {
                if let Some(text) = state.form.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = state.form.text_mut() {
                    text.push(c);
                }
            }
            _ => {}
        },
        Mode::Browse => {
            let view = ctl.renderer().view();
            let selected_id = state.current(view).map(|card| card.posting.id);
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
                KeyCode::Down | KeyCode::Char('j') => state.next(view),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => {
                    state.scroll_offset = state.scroll_offset.saturating_add(3)
                }
                KeyCode::Char('K') | KeyCode::PageUp => {
                    state.scroll_offset = state.scroll_offset.saturating_sub(3)
                }
                KeyCode::Char('/') => state.mode = Mode::Search,
                KeyCode::Char('e') => state.mode = Mode::Form,
                KeyCode::Char('0') => {
                    ctl.handle(BoardEvent::CategorySelected(CategoryChoice::All), now)?;
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let idx = c as usize - '1' as usize;
                    if let Some(cat) = CATEGORY_PALETTE.get(idx) {
                        let choice = CategoryChoice::Category(cat.to_string());
                        ctl.handle(BoardEvent::CategorySelected(choice), now)?;
                    }
                }
                KeyCode::Char('l') => {
                    let level = state.cycle_level();
                    ctl.handle(BoardEvent::LevelChanged(level), now)?;
                }
                KeyCode::Char('o') => {
                    let location = state.cycle_location();
                    ctl.handle(BoardEvent::LocationChanged(location), now)?;
                }
                KeyCode::Char('m') => ctl.handle(BoardEvent::LoadMore, now)?,
                KeyCode::Char('a') => {
                    if let Some(id) = selected_id {
                        ctl.handle(BoardEvent::Apply(id), now)?;
                    }
                }
                KeyCode::Char('s') => {
                    if let Some(id) = selected_id {
                        ctl.handle(BoardEvent::Save(id), now)?;
                    }
                }
                _ => {}
            }
        }
    }
    Ok(true)
}

fn draw(
    frame: &mut Frame,
    state: &AppState,
    ctl: &ViewController<SnapshotRenderer>,
    list_state: &mut ListState,
) {
    let view = ctl.renderer().view();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(palette_bar(ctl), rows[0]);
    frame.render_widget(filter_bar(state, ctl, view), rows[1]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[2]);

    // Left panel: cards
    let mut items: Vec<ListItem> = view
        .cards
        .iter()
        .map(|card| {
            let marker = match (card.applied, card.saved) {
                (true, _) => "+",
                (false, true) => "*",
                _ => " ",
            };
            ListItem::new(format!(
                "{} {} | {}",
                marker,
                truncate(&card.posting.title, 30),
                card.posting.company
            ))
            .style(level_style(card.posting.level))
        })
        .collect();
    if view.has_more {
        items.push(
            ListItem::new(format!("  ... {} more (m: load more)", view.total - view.cards.len()))
                .style(Style::default().fg(Color::DarkGray)),
        );
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", view.results_line)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: detail
    let detail = Paragraph::new(build_detail(state, view))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(detail, chunks[1]);

    let help = match state.mode {
        Mode::Browse => " j/k:navigate 0-5:category /:search l:level o:location m:more a:apply s:save e:employer q:quit",
        Mode::Search => " type to search  enter/esc:done",
        Mode::Form => " tab:next field  left/right:choose  enter:submit  esc:cancel",
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[3],
    );

    if state.mode == Mode::Form {
        draw_form(frame, &state.form);
    }
    draw_notices(frame, ctl);
}

fn palette_bar(ctl: &ViewController<SnapshotRenderer>) -> Paragraph<'static> {
    let selection = &ctl.filter().categories;
    let mut spans = Vec::new();
    let entries = std::iter::once(("0", CategoryChoice::All)).chain(
        CATEGORY_PALETTE
            .iter()
            .enumerate()
            .map(|(i, c)| (["1", "2", "3", "4", "5"][i], CategoryChoice::Category(c.to_string()))),
    );
    for (key, choice) in entries {
        let label = match &choice {
            CategoryChoice::All => "All".to_string(),
            CategoryChoice::Category(c) => c.clone(),
        };
        let style = if selection.is_active(&choice) {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {}:{} ", key, label), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        format!("  suggested: {}", ctl.suggestion()),
        Style::default().fg(Color::DarkGray),
    ));
    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(" Categories "))
}

fn filter_bar<'a>(
    state: &AppState,
    ctl: &'a ViewController<SnapshotRenderer>,
    view: &'a BoardView,
) -> Paragraph<'a> {
    let search_style = if state.mode == Mode::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let filter = ctl.filter();
    Paragraph::new(Line::from(vec![
        Span::styled(format!("search: {}_", ctl.keyword_input()), search_style),
        Span::raw(format!("   level: {}   location: {}", filter.level, filter.location)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(format!(" {} ", view.filter_summary)))
}

fn build_detail<'a>(state: &AppState, view: &'a BoardView) -> Text<'a> {
    let Some(card) = state.current(view) else {
        return Text::raw(if view.is_empty() { view.results_line.as_str() } else { "No job selected" });
    };
    let job = &card.posting;

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        job.title.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", job.company)));
    lines.push(Line::from(Span::styled(
        format!("{} • {} • {}", job.location, job.category, job.level),
        level_style(job.level),
    )));
    if let Some(duration) = &job.duration {
        lines.push(Line::from(format!("Duration: {}", duration)));
    }
    lines.push(Line::from(""));
    for line in textwrap::fill(&job.description, 70).lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::from(""));

    if card.applied {
        lines.push(Line::from(Span::styled("Applied", Style::default().fg(Color::Cyan))));
    }
    if card.saved {
        lines.push(Line::from(Span::styled("Saved", Style::default().fg(Color::Yellow))));
    }

    Text::from(lines)
}

fn draw_form(frame: &mut Frame, form: &EmployerForm) {
    let area = centered(frame.area(), 60, FORM_FIELDS.len() as u16 + 2);
    let lines: Vec<Line> = FORM_FIELDS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let style = if i == form.field {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(Span::styled(format!("{:<12} {}", name, form.value(i)), style))
        })
        .collect();
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Post a job ")),
        area,
    );
}

fn draw_notices(frame: &mut Frame, ctl: &ViewController<SnapshotRenderer>) {
    let area = frame.area();
    let width = 48.min(area.width);
    for (i, notice) in ctl.notices().iter().rev().take(5).enumerate() {
        let y = area.y + 1 + (i as u16) * 3;
        if y + 3 > area.height {
            break;
        }
        let rect = Rect::new(area.x + area.width - width, y, width, 3);
        let color = match notice.kind {
            NoticeKind::Info => Color::Blue,
            NoticeKind::Success => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(notice.message.as_str())
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color))),
            rect,
        );
    }
}

fn level_style(level: Level) -> Style {
    match level {
        Level::Internship => Style::default().fg(Color::Green),
        Level::Junior => Style::default().fg(Color::Cyan),
        Level::Mid => Style::default().fg(Color::Magenta),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_cycle_wraps_through_any() {
        let mut state = AppState::new();
        assert_eq!(state.cycle_level(), Choice::Exact(Level::Internship));
        assert_eq!(state.cycle_level(), Choice::Exact(Level::Junior));
        assert_eq!(state.cycle_level(), Choice::Exact(Level::Mid));
        assert_eq!(state.cycle_level(), Choice::Any);
    }

    #[test]
    fn location_cycle_wraps_through_any() {
        let mut state = AppState::new();
        assert_eq!(state.cycle_location(), Choice::Exact("Windhoek".to_string()));
        state.cycle_location();
        state.cycle_location();
        assert_eq!(state.cycle_location(), Choice::Any);
    }

    #[test]
    fn form_draft_uses_selected_choices() {
        let mut form = EmployerForm::default();
        form.title = "QA Tester".into();
        form.field = 4;
        form.cycle(false);
        let draft = form.draft();
        assert_eq!(draft.level, Some(Level::Mid));
        assert_eq!(draft.category, "IT");
        assert!(draft.location.is_empty());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Civil Engineering Assistant", 10), "Civil E...");
        assert_eq!(truncate("é".repeat(12).as_str(), 6), "ééé...");
    }
}
