// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use log::{debug, warn};
use std::io::{self, Write};
use worktravel_app::Snapshot;
use worktravel_db::SnapshotWriter;

const BELL: &[u8] = b"\x07";

/// Connects the screen to the background writer. The terminal bell stands
/// in for a haptic pulse.
pub struct WriterRuntime<W: Write = io::Stdout> {
    writer: SnapshotWriter,
    haptics: bool,
    bell: W,
}

impl WriterRuntime {
    pub fn new(writer: SnapshotWriter, haptics: bool) -> Self {
        Self::with_bell(writer, haptics, io::stdout())
    }
}

impl<W: Write> WriterRuntime<W> {
    pub fn with_bell(writer: SnapshotWriter, haptics: bool, bell: W) -> Self {
        Self {
            writer,
            haptics,
            bell,
        }
    }

    pub fn into_writer(self) -> SnapshotWriter {
        self.writer
    }
}

impl<W: Write> worktravel_tui::AppRuntime for WriterRuntime<W> {
    fn persist(&mut self, snapshot: Snapshot) -> Result<()> {
        let items = snapshot.todos.len();
        let seq = self.writer.submit(snapshot)?;
        debug!("event=snapshot_submitted seq={seq} items={items}");
        Ok(())
    }

    fn pulse_haptic(&mut self) {
        if !self.haptics {
            return;
        }
        if let Err(error) = self.bell.write_all(BELL).and_then(|()| self.bell.flush()) {
            warn!("event=haptic_failed error={error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WriterRuntime;
    use anyhow::Result;
    use std::time::Duration;
    use worktravel_app::{AppCommand, AppState, ListMode};
    use worktravel_db::{SnapshotWriter, Store};
    use worktravel_testkit::{fixture_id, temp_db_path};
    use worktravel_tui::AppRuntime;

    fn writer_on_temp_db() -> Result<(tempfile::TempDir, SnapshotWriter)> {
        let (dir, path) = temp_db_path()?;
        let store = Store::open(&path)?;
        store.bootstrap()?;
        Ok((dir, SnapshotWriter::spawn(store)?))
    }

    #[test]
    fn persist_reaches_store_after_shutdown() -> Result<()> {
        let (_dir, writer) = writer_on_temp_db()?;
        let mut runtime = WriterRuntime::with_bell(writer, true, Vec::new());

        let mut state = AppState::default();
        state.add_at("Book hotel", fixture_id(0));
        runtime.persist(state.snapshot())?;
        state.dispatch(AppCommand::SetMode(ListMode::Travel));
        runtime.persist(state.snapshot())?;

        let store = runtime.into_writer().shutdown(Duration::from_secs(5))?;
        assert_eq!(store.load_mode()?, ListMode::Travel);
        assert_eq!(store.load_todos()?, state.todos);
        Ok(())
    }

    #[test]
    fn haptic_pulse_rings_bell_only_when_enabled() -> Result<()> {
        let (_dir, writer) = writer_on_temp_db()?;
        let mut runtime = WriterRuntime::with_bell(writer, true, Vec::new());
        runtime.pulse_haptic();
        runtime.pulse_haptic();
        assert_eq!(runtime.bell, b"\x07\x07".to_vec());

        let (_dir, writer) = writer_on_temp_db()?;
        let mut quiet = WriterRuntime::with_bell(writer, false, Vec::new());
        quiet.pulse_haptic();
        assert!(quiet.bell.is_empty());
        Ok(())
    }
}
