// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    CompletedSet, DeleteChoice, DeletePrompt, EditSession, ListMode, Snapshot, SnapshotParts,
    ToDoCollection, ToDoId, ToDoItem,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub mode: ListMode,
    pub todos: ToDoCollection,
    pub completed: CompletedSet,
    pub draft: String,
    pub editing: Option<EditSession>,
    pub pending_delete: Option<DeletePrompt>,
    pub status_line: Option<String>,
    /// Records that may be written back. Starts from what loaded cleanly and
    /// grows as the user changes each part.
    pub writable: SnapshotParts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SetMode(ListMode),
    SetDraft(String),
    SubmitDraft,
    StartEdit(ToDoId),
    SetEditText(String),
    CommitEdit,
    ToggleComplete(ToDoId),
    RequestDelete(ToDoId),
    SwitchDeleteChoice,
    ChooseDelete(DeleteChoice),
    ConfirmDelete,
    CancelDelete,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(ListMode),
    DraftChanged,
    ToDoAdded(ToDoId),
    EditStarted(ToDoId),
    EditTextChanged,
    ToDoEdited(ToDoId),
    CompletionToggled { id: ToDoId, completed: bool },
    DeletePrompted(ToDoId),
    DeleteChoiceChanged(DeleteChoice),
    ToDoDeleted(ToDoId),
    DeleteCancelled,
    StatusUpdated(String),
    StatusCleared,
}

impl AppEvent {
    /// True when the event changed something that lives in storage.
    pub const fn touches_storage(&self) -> bool {
        matches!(
            self,
            Self::ModeChanged(_)
                | Self::ToDoAdded(_)
                | Self::ToDoEdited(_)
                | Self::CompletionToggled { .. }
                | Self::ToDoDeleted(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleItem<'a> {
    pub id: ToDoId,
    pub item: &'a ToDoItem,
    pub completed: bool,
}

impl AppState {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut state = Self::default();
        state.hydrate(snapshot);
        state
    }

    /// Installs loaded state. Completed keys without a matching item are
    /// dropped; returns how many were dropped. Nothing is pruned when the
    /// collection itself failed to load, since every key would look orphaned.
    pub fn hydrate(&mut self, snapshot: Snapshot) -> usize {
        let Snapshot {
            mode,
            todos,
            mut completed,
            parts,
        } = snapshot;
        let before = completed.len();
        if parts.todos {
            completed.retain(|id| todos.contains_key(id));
        }
        self.mode = mode;
        self.todos = todos;
        self.completed = completed;
        self.writable = parts;
        self.editing = None;
        self.pending_delete = None;
        before - self.completed.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            todos: self.todos.clone(),
            completed: self.completed.clone(),
            parts: self.writable,
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SetMode(mode) => self.set_mode(mode),
            AppCommand::SetDraft(text) => {
                self.draft = text;
                vec![AppEvent::DraftChanged]
            }
            AppCommand::SubmitDraft => {
                let text = self.draft.clone();
                self.add(&text)
            }
            AppCommand::StartEdit(id) => self.start_edit(id),
            AppCommand::SetEditText(text) => match self.editing.as_mut() {
                Some(session) => {
                    session.text = text;
                    vec![AppEvent::EditTextChanged]
                }
                None => Vec::new(),
            },
            AppCommand::CommitEdit => self.commit_edit(),
            AppCommand::ToggleComplete(id) => self.toggle_complete(id),
            AppCommand::RequestDelete(id) => {
                if !self.todos.contains_key(&id) {
                    return Vec::new();
                }
                self.pending_delete = Some(DeletePrompt::new(id));
                vec![AppEvent::DeletePrompted(id)]
            }
            AppCommand::SwitchDeleteChoice => match self.pending_delete.as_mut() {
                Some(prompt) => {
                    prompt.choice = prompt.choice.other();
                    vec![AppEvent::DeleteChoiceChanged(prompt.choice)]
                }
                None => Vec::new(),
            },
            AppCommand::ChooseDelete(choice) => match self.pending_delete.as_mut() {
                Some(prompt) if prompt.choice != choice => {
                    prompt.choice = choice;
                    vec![AppEvent::DeleteChoiceChanged(choice)]
                }
                _ => Vec::new(),
            },
            AppCommand::ConfirmDelete => self.confirm_delete(),
            AppCommand::CancelDelete => match self.pending_delete.take() {
                Some(_) => vec![AppEvent::DeleteCancelled],
                None => Vec::new(),
            },
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn set_mode(&mut self, mode: ListMode) -> Vec<AppEvent> {
        self.mode = mode;
        self.writable.mode = true;
        vec![AppEvent::ModeChanged(mode)]
    }

    /// Adds `text` to the current list. Only the exact empty string is
    /// rejected; whitespace-only text is kept as typed.
    pub fn add(&mut self, text: &str) -> Vec<AppEvent> {
        self.add_at(text, ToDoId::from_clock())
    }

    pub fn add_at(&mut self, text: &str, clock: ToDoId) -> Vec<AppEvent> {
        if text.is_empty() {
            return Vec::new();
        }

        let latest = self.todos.keys().next_back().copied();
        let Some(id) = clock.after(latest) else {
            return Vec::new();
        };
        self.todos.insert(id, ToDoItem::new(text, self.mode));
        self.writable.todos = true;
        self.draft.clear();
        vec![AppEvent::ToDoAdded(id), AppEvent::DraftChanged]
    }

    pub fn start_edit(&mut self, id: ToDoId) -> Vec<AppEvent> {
        let Some(text) = self.todos.get(&id).map(|item| item.text.clone()) else {
            return Vec::new();
        };

        let mut events = match self.editing_id() {
            Some(current) if current == id => return Vec::new(),
            Some(_) => self.commit_edit(),
            None => Vec::new(),
        };
        self.editing = Some(EditSession { id, text });
        events.push(AppEvent::EditStarted(id));
        events
    }

    pub fn commit_edit(&mut self) -> Vec<AppEvent> {
        let Some(session) = self.editing.take() else {
            return Vec::new();
        };
        match self.todos.get_mut(&session.id) {
            Some(item) => {
                item.text = session.text;
                self.writable.todos = true;
                vec![AppEvent::ToDoEdited(session.id)]
            }
            None => Vec::new(),
        }
    }

    pub fn toggle_complete(&mut self, id: ToDoId) -> Vec<AppEvent> {
        if !self.todos.contains_key(&id) {
            return Vec::new();
        }
        let completed = if self.completed.remove(&id) {
            false
        } else {
            self.completed.insert(id);
            true
        };
        self.writable.completed = true;
        vec![AppEvent::CompletionToggled { id, completed }]
    }

    /// Resolves the prompt with its highlighted choice; only `Sure` deletes.
    fn confirm_delete(&mut self) -> Vec<AppEvent> {
        let Some(prompt) = self.pending_delete.take() else {
            return Vec::new();
        };
        if prompt.choice != DeleteChoice::Sure {
            return vec![AppEvent::DeleteCancelled];
        }
        if self.todos.remove(&prompt.id).is_none() {
            return Vec::new();
        }
        self.writable.todos = true;
        if self.completed.remove(&prompt.id) {
            self.writable.completed = true;
        }
        if self
            .editing
            .as_ref()
            .is_some_and(|session| session.id == prompt.id)
        {
            self.editing = None;
        }
        vec![AppEvent::ToDoDeleted(prompt.id)]
    }

    pub fn visible_items(&self) -> impl Iterator<Item = VisibleItem<'_>> + '_ {
        let working = self.mode.is_work();
        self.todos
            .iter()
            .filter(move |(_, item)| item.working == working)
            .map(|(id, item)| VisibleItem {
                id: *id,
                item,
                completed: self.completed.contains(id),
            })
    }

    pub fn visible_ids(&self) -> Vec<ToDoId> {
        self.visible_items().map(|visible| visible.id).collect()
    }

    pub fn is_completed(&self, id: ToDoId) -> bool {
        self.completed.contains(&id)
    }

    pub fn editing_id(&self) -> Option<ToDoId> {
        self.editing.as_ref().map(|session| session.id)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
