// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identifier of a to-do item: its creation time in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToDoId(i64);

impl ToDoId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub fn from_clock() -> Self {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    /// Returns `self` unless it would not sort after `latest`, in which case
    /// the id right after `latest` is used instead. `None` once `latest` is
    /// already the largest possible id.
    pub fn after(self, latest: Option<Self>) -> Option<Self> {
        match latest {
            Some(latest) if self <= latest => latest.0.checked_add(1).map(Self),
            _ => Some(self),
        }
    }
}

impl From<i64> for ToDoId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ToDoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
