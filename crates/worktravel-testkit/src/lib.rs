// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use worktravel_app::{ListMode, Snapshot, ToDoId, ToDoItem};

const WORK_VERBS: [&str; 10] = [
    "Review", "Draft", "Ship", "Fix", "Plan", "Email", "Sync on", "Triage", "Demo", "Document",
];

const WORK_OBJECTS: [&str; 10] = [
    "the release notes",
    "quarterly budget",
    "onboarding guide",
    "flaky CI job",
    "design review",
    "vendor contract",
    "sprint board",
    "incident report",
    "API changelog",
    "hiring loop",
];

const DESTINATIONS: [&str; 14] = [
    "Lisbon",
    "Kyoto",
    "Reykjavik",
    "Oaxaca",
    "Tbilisi",
    "Hanoi",
    "Porto",
    "Cape Town",
    "Valparaiso",
    "Ljubljana",
    "Sapporo",
    "Marrakesh",
    "Tallinn",
    "Queenstown",
];

const TRAVEL_PLANS: [&str; 6] = [
    "Book flights to",
    "Find a hostel in",
    "Learn phrases for",
    "Pack for",
    "Rent a car in",
    "Visit",
];

/// Texts that tend to break naive codecs.
const AWKWARD_TEXTS: [&str; 6] = [
    "",
    "   ",
    "emoji 🧳✈️ and accents: café, naïve",
    "quotes \" and \\ backslashes",
    "line one\nline two\ttabbed",
    "日本語のタスク",
];

const BASE_ID: i64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of to-do items; the same seed always yields the same
/// items, ids included.
#[derive(Debug, Clone)]
pub struct ToDoFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl ToDoFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: BASE_ID,
        }
    }

    pub fn next_id(&mut self) -> ToDoId {
        let gap = 1 + self.rng.int_n(5_000) as i64;
        self.next_id += gap;
        ToDoId::new(self.next_id)
    }

    pub fn work_text(&mut self) -> String {
        format!(
            "{} {}",
            self.pick(&WORK_VERBS),
            self.pick(&WORK_OBJECTS)
        )
    }

    pub fn travel_text(&mut self) -> String {
        format!(
            "{} {}",
            self.pick(&TRAVEL_PLANS),
            self.pick(&DESTINATIONS)
        )
    }

    pub fn item(&mut self, mode: ListMode) -> ToDoItem {
        let text = match mode {
            ListMode::Work => self.work_text(),
            ListMode::Travel => self.travel_text(),
        };
        ToDoItem::new(text, mode)
    }

    /// `count` items split randomly across both lists, roughly a third of
    /// them completed.
    pub fn snapshot(&mut self, count: usize) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for _ in 0..count {
            let mode = if self.rng.bool() {
                ListMode::Work
            } else {
                ListMode::Travel
            };
            let id = self.next_id();
            snapshot.todos.insert(id, self.item(mode));
            if self.rng.int_n(3) == 0 {
                snapshot.completed.insert(id);
            }
        }
        snapshot
    }

    /// Items whose texts cover empty, unicode, escape-heavy and very long
    /// strings on both lists.
    pub fn awkward_snapshot(&mut self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        let long_text = "long ".repeat(4_096);
        let texts = AWKWARD_TEXTS
            .iter()
            .map(|text| (*text).to_owned())
            .chain(std::iter::once(long_text));
        for (index, text) in texts.enumerate() {
            let mode = if index % 2 == 0 {
                ListMode::Work
            } else {
                ListMode::Travel
            };
            let id = self.next_id();
            snapshot.todos.insert(id, ToDoItem::new(text, mode));
        }
        snapshot
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("worktravel.db");
    Ok((dir, db_path))
}

pub fn fixture_id(offset: i64) -> ToDoId {
    ToDoId::new(BASE_ID + offset)
}

pub fn destinations() -> &'static [&'static str] {
    &DESTINATIONS
}
