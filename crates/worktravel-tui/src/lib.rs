// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::warn;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use worktravel_app::{
    AppCommand, AppEvent, AppState, DeleteChoice, DeletePrompt, ListMode, Snapshot, ToDoId,
    VisibleItem,
};

const TRASH_MARK: &str = "✗";
const EDIT_CARET: &str = "▏";
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

/// Side effects the screen needs from the outside world.
pub trait AppRuntime {
    /// Hands the full current state to storage. Must not block on I/O.
    fn persist(&mut self, snapshot: Snapshot) -> Result<()>;
    /// Short feedback pulse when an edit starts.
    fn pulse_haptic(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Input,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Default)]
struct ViewData {
    focus: Focus,
    cursor: usize,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Applies `command`, then fires the side effects its events ask for.
fn dispatch_and_persist<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) -> Vec<AppEvent> {
    let events = state.dispatch(command);

    if events
        .iter()
        .any(|event| matches!(event, AppEvent::EditStarted(_)))
    {
        runtime.pulse_haptic();
    }

    for event in &events {
        match event {
            AppEvent::ToDoAdded(_) => {
                let message = format!("added to {}", state.mode.label().to_ascii_lowercase());
                emit_status(state, view_data, internal_tx, message);
            }
            AppEvent::ToDoDeleted(_) => emit_status(state, view_data, internal_tx, "deleted"),
            _ => {}
        }
    }

    // A failed save outranks the success message above.
    if events.iter().any(AppEvent::touches_storage)
        && let Err(error) = runtime.persist(state.snapshot())
    {
        warn!("event=persist_failed error={error:#}");
        emit_status(state, view_data, internal_tx, format!("save failed: {error}"));
    }

    clamp_cursor(state, view_data);
    events
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
        dispatch_and_persist(
            state,
            runtime,
            view_data,
            internal_tx,
            AppCommand::CommitEdit,
        );
        return true;
    }

    if state.pending_delete.is_some() {
        handle_delete_prompt_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if ctrl {
        match key.code {
            KeyCode::Char('w') => {
                switch_mode(state, runtime, view_data, internal_tx, ListMode::Work);
            }
            KeyCode::Char('t') => {
                switch_mode(state, runtime, view_data, internal_tx, ListMode::Travel);
            }
            _ => {}
        }
        return false;
    }

    if state.editing.is_some() {
        handle_edit_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match view_data.focus {
        Focus::Input => handle_input_key(state, runtime, view_data, internal_tx, key),
        Focus::List => handle_list_key(state, runtime, view_data, internal_tx, key),
    }
    false
}

/// Leaving the list or the screen blurs the edit field, which saves it.
fn switch_mode<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mode: ListMode,
) {
    dispatch_and_persist(state, runtime, view_data, internal_tx, AppCommand::CommitEdit);
    if state.mode != mode {
        dispatch_and_persist(
            state,
            runtime,
            view_data,
            internal_tx,
            AppCommand::SetMode(mode),
        );
        view_data.cursor = 0;
    }
}

fn handle_input_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
            let mut draft = state.draft.clone();
            draft.push(c);
            state.dispatch(AppCommand::SetDraft(draft));
        }
        KeyCode::Backspace => {
            let mut draft = state.draft.clone();
            if draft.pop().is_some() {
                state.dispatch(AppCommand::SetDraft(draft));
            }
        }
        KeyCode::Enter => {
            dispatch_and_persist(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::SubmitDraft,
            );
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Esc => {
            view_data.focus = Focus::List;
            clamp_cursor(state, view_data);
        }
        _ => {}
    }
}

fn handle_list_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let selected = selected_id(state, view_data);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => move_cursor(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => {
            if view_data.cursor == 0 {
                view_data.focus = Focus::Input;
            } else {
                move_cursor(state, view_data, -1);
            }
        }
        KeyCode::Char('g') | KeyCode::Home => view_data.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => {
            view_data.cursor = state.visible_items().count().saturating_sub(1);
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(id) = selected {
                dispatch_and_persist(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    AppCommand::ToggleComplete(id),
                );
            }
        }
        KeyCode::Char('e') => {
            if let Some(id) = selected {
                dispatch_and_persist(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    AppCommand::StartEdit(id),
                );
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(id) = selected {
                state.dispatch(AppCommand::RequestDelete(id));
            }
        }
        KeyCode::Char('w') | KeyCode::Left => {
            switch_mode(state, runtime, view_data, internal_tx, ListMode::Work);
        }
        KeyCode::Char('t') | KeyCode::Right => {
            switch_mode(state, runtime, view_data, internal_tx, ListMode::Travel);
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('i') | KeyCode::Esc => {
            view_data.focus = Focus::Input;
        }
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
}

fn handle_edit_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(current) = state.editing.as_ref().map(|session| session.text.clone()) else {
        return;
    };
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
            let mut text = current;
            text.push(c);
            state.dispatch(AppCommand::SetEditText(text));
        }
        KeyCode::Backspace => {
            let mut text = current;
            if text.pop().is_some() {
                state.dispatch(AppCommand::SetEditText(text));
            }
        }
        KeyCode::Enter | KeyCode::Esc => {
            dispatch_and_persist(state, runtime, view_data, internal_tx, AppCommand::CommitEdit);
        }
        KeyCode::Tab | KeyCode::BackTab => {
            dispatch_and_persist(state, runtime, view_data, internal_tx, AppCommand::CommitEdit);
            view_data.focus = Focus::Input;
        }
        KeyCode::Up | KeyCode::Down => {
            dispatch_and_persist(state, runtime, view_data, internal_tx, AppCommand::CommitEdit);
            let delta = if key.code == KeyCode::Up { -1 } else { 1 };
            move_cursor(state, view_data, delta);
        }
        _ => {}
    }
}

fn handle_delete_prompt_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match key.code {
        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
            AppCommand::SwitchDeleteChoice
        }
        KeyCode::Char('y') => {
            state.dispatch(AppCommand::ChooseDelete(DeleteChoice::Sure));
            AppCommand::ConfirmDelete
        }
        KeyCode::Char('n') | KeyCode::Esc => AppCommand::CancelDelete,
        KeyCode::Enter => AppCommand::ConfirmDelete,
        _ => return,
    };
    dispatch_and_persist(state, runtime, view_data, internal_tx, command);
}

fn selected_id(state: &AppState, view_data: &ViewData) -> Option<ToDoId> {
    state
        .visible_items()
        .nth(view_data.cursor)
        .map(|visible| visible.id)
}

fn move_cursor(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let len = state.visible_items().count();
    if len == 0 {
        view_data.cursor = 0;
        return;
    }
    let next = view_data.cursor.saturating_add_signed(delta);
    view_data.cursor = next.min(len - 1);
}

fn clamp_cursor(state: &AppState, view_data: &mut ViewData) {
    let len = state.visible_items().count();
    view_data.cursor = view_data.cursor.min(len.saturating_sub(1));
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = ListMode::ALL
        .iter()
        .position(|mode| *mode == state.mode)
        .unwrap_or(0);
    let tabs = Tabs::new(ListMode::ALL.map(ListMode::label).to_vec())
        .block(Block::default().title("worktravel").borders(Borders::ALL))
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    render_input(frame, layout[1], state, view_data);
    render_list(frame, layout[2], state, view_data);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if let Some(prompt) = state.pending_delete {
        let area = centered_rect(60, 40, frame.area());
        frame.render_widget(Clear, area);
        let dialog = Paragraph::new(delete_prompt_lines(state, prompt)).block(
            Block::default()
                .title(DeletePrompt::TITLE)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White)),
        );
        frame.render_widget(dialog, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_input(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let focused = view_data.focus == Focus::Input && state.editing.is_none();
    let (text, is_placeholder) = input_line_text(state);
    let style = if is_placeholder {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let input = Paragraph::new(Span::styled(text, style)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(input, area);

    if focused && state.pending_delete.is_none() && !view_data.help_visible {
        let typed = u16::try_from(state.draft.chars().count()).unwrap_or(u16::MAX);
        let max_x = area.x + area.width.saturating_sub(2);
        let cursor_x = area.x.saturating_add(1).saturating_add(typed).min(max_x);
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

fn render_list(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(state.mode.label().to_ascii_lowercase());
    let editing = state.editing.as_ref();
    let items = state
        .visible_items()
        .map(|visible| {
            let edit_text = editing
                .filter(|session| session.id == visible.id)
                .map(|session| session.text.as_str());
            ListItem::new(item_line(visible, edit_text))
        })
        .collect::<Vec<_>>();

    if items.is_empty() {
        let empty = Paragraph::new(Span::styled(
            empty_list_text(state.mode),
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let highlight = if view_data.focus == Focus::List {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(block)
        .highlight_style(highlight)
        .highlight_symbol("› ");
    let mut list_state = ListState::default().with_selected(Some(view_data.cursor));
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// The draft, or the mode's placeholder when the draft is empty.
fn input_line_text(state: &AppState) -> (String, bool) {
    if state.draft.is_empty() {
        (state.mode.placeholder().to_owned(), true)
    } else {
        (state.draft.clone(), false)
    }
}

fn item_line(visible: VisibleItem<'_>, edit_text: Option<&str>) -> Line<'static> {
    let body = match edit_text {
        Some(text) => Span::styled(
            format!("{text}{EDIT_CARET}"),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::UNDERLINED),
        ),
        None if visible.completed => Span::styled(
            visible.item.text.clone(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        ),
        None => Span::styled(visible.item.text.clone(), Style::default().fg(Color::White)),
    };
    Line::from(vec![
        body,
        Span::raw("  "),
        Span::styled(TRASH_MARK, Style::default().fg(Color::Red)),
    ])
}

fn empty_list_text(mode: ListMode) -> &'static str {
    match mode {
        ListMode::Work => "nothing to do; type above and press enter",
        ListMode::Travel => "no trips planned; type above and press enter",
    }
}

fn delete_prompt_lines(state: &AppState, prompt: DeletePrompt) -> Vec<Line<'static>> {
    let item_text = state
        .todos
        .get(&prompt.id)
        .map(|item| item.text.clone())
        .unwrap_or_default();

    let mut choices = Vec::new();
    for choice in DeleteChoice::ALL {
        let mut style = if choice.is_destructive() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        };
        let label = if choice == prompt.choice {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
            format!("[ {} ]", choice.label())
        } else {
            format!("  {}  ", choice.label())
        };
        choices.push(Span::styled(label, style));
        choices.push(Span::raw("   "));
    }
    choices.pop();

    vec![
        Line::from(DeletePrompt::MESSAGE),
        Line::from(""),
        Line::from(Span::styled(
            format!("\"{item_text}\""),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(choices),
    ]
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let (badge, hints) = if state.pending_delete.is_some() {
        ("CONFIRM", "←/→ choose | enter pick | y sure | n/esc cancel")
    } else if state.editing.is_some() {
        ("EDIT", "type to change | enter/esc save | tab save+input")
    } else {
        match view_data.focus {
            Focus::Input => (
                "INPUT",
                "enter add | tab list | ctrl+w work | ctrl+t travel | ctrl+q quit",
            ),
            Focus::List => (
                "LIST",
                "space done | e edit | d delete | w/t switch | tab input | ? help | ctrl+q quit",
            ),
        }
    };

    match &state.status_line {
        Some(status) => format!("{badge} | {status}"),
        None => format!("{badge} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "input\n  type, enter       add to the current list\n  tab / esc / down  move to the list\n\nlist\n  j/k, up/down      move\n  space / enter     mark done or not done\n  e                 edit text (saved when you leave the field)\n  d / delete        delete, after confirmation\n  w / t, left/right switch between Work and Travel\n\nanywhere\n  ctrl+w / ctrl+t   switch list\n  ctrl+q            quit\n  ?                 close this help"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, Focus, ViewData, delete_prompt_lines, handle_key_event, help_overlay_text,
        input_line_text, render, status_text,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;
    use worktravel_app::{AppState, DeleteChoice, DeletePrompt, ListMode, Snapshot};
    use worktravel_testkit::{ToDoFaker, fixture_id};

    #[derive(Debug, Default)]
    struct TestRuntime {
        persisted: Vec<Snapshot>,
        pulses: usize,
        fail_persist: bool,
    }

    impl AppRuntime for TestRuntime {
        fn persist(&mut self, snapshot: Snapshot) -> Result<()> {
            if self.fail_persist {
                return Err(anyhow!("disk full"));
            }
            self.persisted.push(snapshot);
            Ok(())
        }

        fn pulse_haptic(&mut self) {
            self.pulses += 1;
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<super::InternalEvent>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_state(AppState::default())
        }

        fn with_state(state: AppState) -> Self {
            let (tx, _rx) = mpsc::channel();
            Self {
                state,
                runtime: TestRuntime::default(),
                view_data: ViewData::default(),
                tx,
            }
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            )
        }

        fn type_text(&mut self, text: &str) {
            for c in text.chars() {
                self.press(KeyCode::Char(c));
            }
        }

        fn last_persisted(&self) -> &Snapshot {
            self.runtime.persisted.last().expect("a snapshot was persisted")
        }
    }

    fn two_list_state() -> AppState {
        let mut state = AppState::default();
        state.add_at("standup", fixture_id(0));
        state.add_at("review PR", fixture_id(1));
        state.set_mode(ListMode::Travel);
        state.add_at("Lisbon", fixture_id(2));
        state.set_mode(ListMode::Work);
        state
    }

    fn screen_text(state: &AppState, view_data: &ViewData) -> Result<String> {
        let mut terminal = Terminal::new(TestBackend::new(70, 20))?;
        terminal.draw(|frame| render(frame, state, view_data))?;
        Ok(terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect())
    }

    #[test]
    fn typing_then_enter_adds_item_and_persists() {
        let mut harness = Harness::new();
        harness.type_text("Buy milk");
        assert_eq!(harness.state.draft, "Buy milk");
        assert!(harness.runtime.persisted.is_empty());

        harness.press(KeyCode::Enter);
        assert!(harness.state.draft.is_empty());
        let persisted = harness.last_persisted();
        assert_eq!(persisted.todos.len(), 1);
        let item = persisted.todos.values().next().expect("one item");
        assert_eq!(item.text, "Buy milk");
        assert!(item.working);
        assert_eq!(harness.state.status_line.as_deref(), Some("added to work"));
    }

    #[test]
    fn enter_on_empty_draft_does_nothing() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Enter);
        assert!(harness.state.todos.is_empty());
        assert!(harness.runtime.persisted.is_empty());
    }

    #[test]
    fn backspace_edits_draft() {
        let mut harness = Harness::new();
        harness.type_text("Oslp");
        harness.press(KeyCode::Backspace);
        harness.type_text("o");
        assert_eq!(harness.state.draft, "Oslo");
    }

    #[test]
    fn space_toggles_selected_item() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        assert_eq!(harness.view_data.focus, Focus::List);

        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));
        assert!(harness.state.is_completed(fixture_id(1)));
        assert!(harness.last_persisted().completed.contains(&fixture_id(1)));

        harness.press(KeyCode::Enter);
        assert!(!harness.state.is_completed(fixture_id(1)));
        assert_eq!(harness.runtime.persisted.len(), 2);
    }

    #[test]
    fn cursor_stays_within_visible_items() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        for _ in 0..5 {
            harness.press(KeyCode::Down);
        }
        assert_eq!(harness.view_data.cursor, 1);

        harness.press(KeyCode::Up);
        harness.press(KeyCode::Up);
        assert_eq!(harness.view_data.focus, Focus::Input);
    }

    #[test]
    fn edit_pulses_and_blur_saves_text() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char('e'));
        assert_eq!(harness.runtime.pulses, 1);
        assert_eq!(harness.state.editing_id(), Some(fixture_id(0)));
        assert!(harness.runtime.persisted.is_empty());

        harness.type_text(" 9:30");
        harness.press(KeyCode::Esc);
        assert!(harness.state.editing.is_none());
        let persisted = harness.last_persisted();
        assert_eq!(persisted.todos[&fixture_id(0)].text, "standup 9:30");
        assert!(persisted.todos[&fixture_id(0)].working);
    }

    #[test]
    fn edit_keys_do_not_trigger_list_shortcuts() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char('e'));
        harness.type_text(" dtw");
        assert!(harness.state.pending_delete.is_none());
        assert_eq!(harness.state.mode, ListMode::Work);
        assert_eq!(
            harness
                .state
                .editing
                .as_ref()
                .map(|session| session.text.as_str()),
            Some("standup dtw")
        );
    }

    #[test]
    fn switching_list_saves_open_edit_first() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char('e'));
        harness.press(KeyCode::Backspace);
        harness.press_with(KeyCode::Char('t'), KeyModifiers::CONTROL);

        assert_eq!(harness.state.mode, ListMode::Travel);
        assert_eq!(harness.state.todos[&fixture_id(0)].text, "standu");
        let persisted = harness.last_persisted();
        assert_eq!(persisted.mode, ListMode::Travel);
        assert_eq!(persisted.todos[&fixture_id(0)].text, "standu");
        assert_eq!(harness.state.visible_ids(), vec![fixture_id(2)]);
    }

    #[test]
    fn mode_switch_keys_in_list() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Right);
        assert_eq!(harness.state.mode, ListMode::Travel);
        harness.press(KeyCode::Char('w'));
        assert_eq!(harness.state.mode, ListMode::Work);
        assert_eq!(harness.runtime.persisted.len(), 2);

        harness.press(KeyCode::Char('w'));
        assert_eq!(harness.runtime.persisted.len(), 2);
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char('d'));
        assert_eq!(
            harness.state.pending_delete,
            Some(DeletePrompt::new(fixture_id(0)))
        );

        harness.press(KeyCode::Enter);
        assert!(harness.state.pending_delete.is_none());
        assert!(harness.state.todos.contains_key(&fixture_id(0)));
        assert!(harness.runtime.persisted.is_empty());

        harness.press(KeyCode::Char('d'));
        harness.press(KeyCode::Right);
        assert_eq!(
            harness.state.pending_delete.map(|prompt| prompt.choice),
            Some(DeleteChoice::Sure)
        );
        harness.press(KeyCode::Enter);
        assert!(!harness.state.todos.contains_key(&fixture_id(0)));
        assert!(
            !harness
                .last_persisted()
                .todos
                .contains_key(&fixture_id(0))
        );
        assert_eq!(harness.state.status_line.as_deref(), Some("deleted"));
    }

    #[test]
    fn y_confirms_and_n_cancels_delete() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char('d'));
        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.state.todos.len(), 3);

        harness.press(KeyCode::Delete);
        harness.press(KeyCode::Char('y'));
        assert_eq!(harness.state.todos.len(), 2);
        assert_eq!(harness.view_data.cursor, 0);
    }

    #[test]
    fn persist_failure_is_reported_not_fatal() {
        let mut harness = Harness::new();
        harness.runtime.fail_persist = true;
        harness.type_text("Renew passport");
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.todos.len(), 1);
        assert!(harness.runtime.persisted.is_empty());
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("save failed: disk full")
        );
        let status = status_text(&harness.state, &harness.view_data);
        assert!(status.contains("save failed"));
    }

    #[test]
    fn ctrl_q_quits_and_saves_open_edit() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char('e'));
        harness.type_text("!");
        assert!(harness.press_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert_eq!(
            harness.last_persisted().todos[&fixture_id(0)].text,
            "standup!"
        );
    }

    #[test]
    fn help_overlay_swallows_keys_until_closed() {
        let mut harness = Harness::with_state(two_list_state());
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char('?'));
        assert!(harness.view_data.help_visible);
        harness.press(KeyCode::Char('d'));
        assert!(harness.state.pending_delete.is_none());
        harness.press(KeyCode::Esc);
        assert!(!harness.view_data.help_visible);
        assert!(help_overlay_text().contains("ctrl+q"));
    }

    #[test]
    fn placeholder_follows_mode() {
        let mut state = AppState::default();
        assert_eq!(input_line_text(&state), ("Add a TODO!".to_owned(), true));
        state.set_mode(ListMode::Travel);
        assert_eq!(
            input_line_text(&state),
            ("Where do you want to go?".to_owned(), true)
        );
        state.draft = "Kyoto".to_owned();
        assert_eq!(input_line_text(&state), ("Kyoto".to_owned(), false));
    }

    #[test]
    fn status_badge_tracks_interaction_state() {
        let mut state = two_list_state();
        let mut view_data = ViewData::default();
        assert!(status_text(&state, &view_data).starts_with("INPUT"));

        view_data.focus = Focus::List;
        assert!(status_text(&state, &view_data).starts_with("LIST"));

        state.start_edit(fixture_id(0));
        assert!(status_text(&state, &view_data).starts_with("EDIT"));

        state.commit_edit();
        state.pending_delete = Some(DeletePrompt::new(fixture_id(0)));
        assert!(status_text(&state, &view_data).starts_with("CONFIRM"));
    }

    #[test]
    fn delete_prompt_highlights_current_choice() {
        let state = two_list_state();
        let mut prompt = DeletePrompt::new(fixture_id(1));
        let text = |lines: Vec<ratatui::text::Line<'static>>| {
            lines
                .iter()
                .map(|line| line.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        };

        let cancel = text(delete_prompt_lines(&state, prompt));
        assert!(cancel.contains(DeletePrompt::MESSAGE));
        assert!(cancel.contains("\"review PR\""));
        assert!(cancel.contains("[ Cancel ]"));

        prompt.choice = DeleteChoice::Sure;
        let sure = text(delete_prompt_lines(&state, prompt));
        assert!(sure.contains("[ Sure ]"));
        assert!(!sure.contains("[ Cancel ]"));
    }

    #[test]
    fn screen_shows_only_current_list() -> Result<()> {
        let state = two_list_state();
        let view_data = ViewData::default();
        let screen = screen_text(&state, &view_data)?;
        assert!(screen.contains("Work"));
        assert!(screen.contains("Travel"));
        assert!(screen.contains("standup"));
        assert!(screen.contains("Add a TODO!"));
        assert!(!screen.contains("Lisbon"));
        Ok(())
    }

    #[test]
    fn screen_renders_delete_dialog() -> Result<()> {
        let mut state = two_list_state();
        state.pending_delete = Some(DeletePrompt::new(fixture_id(0)));
        let screen = screen_text(&state, &ViewData::default())?;
        assert!(screen.contains(DeletePrompt::TITLE));
        assert!(screen.contains("Sure"));
        Ok(())
    }

    #[test]
    fn screen_renders_many_faker_items() -> Result<()> {
        let state = AppState::from_snapshot(ToDoFaker::new(21).snapshot(60));
        let view_data = ViewData {
            focus: Focus::List,
            cursor: 3,
            ..ViewData::default()
        };
        let screen = screen_text(&state, &view_data)?;
        assert!(screen.contains("LIST"));
        Ok(())
    }

    #[test]
    fn buy_milk_scenario_through_keys() -> Result<()> {
        let mut harness = Harness::new();
        harness.type_text("Buy milk");
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char(' '));

        harness.press_with(KeyCode::Char('t'), KeyModifiers::CONTROL);
        let travel = screen_text(&harness.state, &harness.view_data)?;
        assert!(!travel.contains("Buy milk"));
        assert!(travel.contains("Where do you want to go?"));

        harness.press_with(KeyCode::Char('w'), KeyModifiers::CONTROL);
        let work = screen_text(&harness.state, &harness.view_data)?;
        assert!(work.contains("Buy milk"));
        let visible = harness.state.visible_items().collect::<Vec<_>>();
        assert!(visible[0].completed);

        harness.press(KeyCode::Char('d'));
        harness.press(KeyCode::Char('y'));
        assert_eq!(harness.state.visible_items().count(), 0);
        let persisted = harness.last_persisted();
        assert!(persisted.todos.is_empty());
        assert!(persisted.completed.is_empty());
        assert_eq!(persisted.mode, ListMode::Work);
        Ok(())
    }
}
