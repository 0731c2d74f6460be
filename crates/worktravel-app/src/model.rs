// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::ids::ToDoId;

/// Which of the two lists is on screen. `Work` is the `working == true` side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ListMode {
    #[default]
    Work,
    Travel,
}

impl ListMode {
    pub const ALL: [Self; 2] = [Self::Work, Self::Travel];

    pub const fn from_working(working: bool) -> Self {
        if working { Self::Work } else { Self::Travel }
    }

    pub const fn is_work(self) -> bool {
        matches!(self, Self::Work)
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Work => Self::Travel,
            Self::Travel => Self::Work,
        }
    }

    /// Sentinel written to the mode record.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "working",
            Self::Travel => "travel",
        }
    }

    /// Only the travel sentinel selects Travel; anything else, including a
    /// missing record, falls back to Work.
    pub fn parse_stored(value: Option<&str>) -> Self {
        match value {
            Some("travel") => Self::Travel,
            _ => Self::Work,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Travel => "Travel",
        }
    }

    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Work => "Add a TODO!",
            Self::Travel => "Where do you want to go?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToDoItem {
    pub text: String,
    pub working: bool,
}

impl ToDoItem {
    pub fn new(text: impl Into<String>, mode: ListMode) -> Self {
        Self {
            text: text.into(),
            working: mode.is_work(),
        }
    }

    pub const fn mode(&self) -> ListMode {
        ListMode::from_working(self.working)
    }
}

pub type ToDoCollection = BTreeMap<ToDoId, ToDoItem>;

pub type CompletedSet = BTreeSet<ToDoId>;

/// Which records of a [`Snapshot`] hold trustworthy data. A record that
/// failed to load stays unset until the user changes that part of the
/// state, so its stored value is never replaced by an empty fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotParts {
    pub mode: bool,
    pub todos: bool,
    pub completed: bool,
}

impl SnapshotParts {
    pub const ALL: Self = Self {
        mode: true,
        todos: true,
        completed: true,
    };

    pub const fn is_complete(self) -> bool {
        self.mode && self.todos && self.completed
    }
}

impl Default for SnapshotParts {
    fn default() -> Self {
        Self::ALL
    }
}

/// Full persisted state, written as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub mode: ListMode,
    pub todos: ToDoCollection,
    pub completed: CompletedSet,
    pub parts: SnapshotParts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: ToDoId,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteChoice {
    Cancel,
    Sure,
}

impl DeleteChoice {
    pub const ALL: [Self; 2] = [Self::Cancel, Self::Sure];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cancel => "Cancel",
            Self::Sure => "Sure",
        }
    }

    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Sure)
    }

    pub const fn other(self) -> Self {
        match self {
            Self::Cancel => Self::Sure,
            Self::Sure => Self::Cancel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePrompt {
    pub id: ToDoId,
    pub choice: DeleteChoice,
}

impl DeletePrompt {
    pub const TITLE: &'static str = "Delete TO DO";
    pub const MESSAGE: &'static str = "Are you sure you want to delete?";

    pub const fn new(id: ToDoId) -> Self {
        Self {
            id,
            choice: DeleteChoice::Cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeleteChoice, DeletePrompt, ListMode, Snapshot, SnapshotParts, ToDoItem};
    use crate::ToDoId;

    #[test]
    fn stored_mode_defaults_to_work_unless_travel() {
        assert_eq!(ListMode::parse_stored(Some("travel")), ListMode::Travel);
        assert_eq!(ListMode::parse_stored(Some("working")), ListMode::Work);
        assert_eq!(ListMode::parse_stored(Some("Travel")), ListMode::Work);
        assert_eq!(ListMode::parse_stored(Some("")), ListMode::Work);
        assert_eq!(ListMode::parse_stored(None), ListMode::Work);
    }

    #[test]
    fn mode_sentinel_parses_back() {
        for mode in ListMode::ALL {
            assert_eq!(ListMode::parse_stored(Some(mode.as_str())), mode);
        }
    }

    #[test]
    fn item_working_flag_tracks_mode() {
        assert!(ToDoItem::new("standup", ListMode::Work).working);
        let trip = ToDoItem::new("Lisbon", ListMode::Travel);
        assert!(!trip.working);
        assert_eq!(trip.mode(), ListMode::Travel);
    }

    #[test]
    fn delete_prompt_starts_on_cancel() {
        let prompt = DeletePrompt::new(ToDoId::new(1));
        assert_eq!(prompt.choice, DeleteChoice::Cancel);
        assert!(!prompt.choice.is_destructive());
        assert!(prompt.choice.other().is_destructive());
    }

    #[test]
    fn new_snapshots_write_every_record() {
        assert_eq!(Snapshot::default().parts, SnapshotParts::ALL);
        assert!(SnapshotParts::ALL.is_complete());
        let partial = SnapshotParts {
            todos: false,
            ..SnapshotParts::ALL
        };
        assert!(!partial.is_complete());
    }
}
