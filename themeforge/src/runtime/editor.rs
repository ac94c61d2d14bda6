//! Editor-side session: owns the theme document, the palette, and the
//! command log, and drives the render process over the command channel.
//!
//! Launch flow:
//! ```md
//! EditorSession::launch_renderer ->
//! spawn render_process (mode + document path) ->
//! await listener-ready marker ->
//! initial render_refresh over the channel
//! ```
//! Sends are fire-and-forget; a failed send means editor and renderer are
//! out of sync and the only recovery is a renderer relaunch plus refresh,
//! so `ChannelUnavailable` is surfaced to the caller instead of retried.

use std::env;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command as ProcessCommand, Stdio};
use std::thread;

use crate::core::prelude::*;
use crate::document::model::{
    AppearanceMode, ModeValue, NO_COLOR, PropertyValue, ThemeDocument,
    load_document, merge_documents, save_document,
};
use crate::document::palette::Palette;
use crate::history::{CommandLog, DocumentState, PropertyVector, UndoOutcome};
use crate::protocol::channel::{CommandSender, CommandSink};
use crate::protocol::command::{Command, Domain, Operation};
use crate::protocol::rendezvous::{
    LAUNCH_POLL_INTERVAL, LAUNCH_POLLS, Rendezvous,
};

pub struct EditorSession<S: CommandSink> {
    document: ThemeDocument,
    document_path: PathBuf,
    palette: Palette,
    log: CommandLog,
    sink: S,
    rendezvous: Rendezvous,
    mode: AppearanceMode,
    renderer: Option<Child>,
}

impl EditorSession<CommandSender> {
    pub fn open(
        document_path: impl Into<PathBuf>,
        sender: CommandSender,
        rendezvous: Rendezvous,
        mode: AppearanceMode,
    ) -> Result<Self> {
        Self::with_sink(document_path, sender, rendezvous, mode)
    }

    /// Spawns the render process next to the current executable, forwards
    /// its stdout, and blocks until its listener signals ready (extended
    /// launch budget). Stale markers from a crashed session are cleared
    /// first so an old `listener-ready` cannot fake readiness.
    pub fn launch_renderer(&mut self) -> Result<()> {
        self.rendezvous.clear_stale()?;

        let exe = render_process_path()?;
        let mut child = ProcessCommand::new(exe)
            .arg(self.mode.to_string())
            .arg(&self.document_path)
            .arg("--port")
            .arg(self.sink.endpoint().port.to_string())
            .arg("--rendezvous-dir")
            .arg(self.rendezvous.dir())
            .stdout(Stdio::piped())
            .spawn()?;

        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            thread::spawn(move || {
                for line in reader.lines().map_while(std::result::Result::ok) {
                    println!("{}", line);
                }
            });
        }
        self.renderer = Some(child);

        if let Err(e) =
            self.rendezvous.await_ready(LAUNCH_POLLS, LAUNCH_POLL_INTERVAL)
        {
            error!(
                "Render listener on port {} never became ready",
                self.sink.endpoint().port
            );
            return Err(e);
        }

        self.sink.send(&Command::RenderRefresh)?;
        info!("Render process ready on port {}", self.sink.endpoint().port);
        Ok(())
    }

    /// Graceful teardown: stop marker first, then the quit command, then
    /// wait for the child. Whichever signal the renderer sees first makes
    /// it exit and remove every marker, so none are left for the next
    /// session to mistake for live state. A dead channel here is expected
    /// (the renderer may already be gone), so send failures are logged
    /// rather than propagated.
    pub fn shutdown(mut self) -> Result<()> {
        self.rendezvous.request_stop()?;
        if let Err(e) = self.sink.send(&Command::Quit) {
            warn!("Quit command not delivered: {}", e);
        }

        if let Some(mut child) = self.renderer.take() {
            child.wait()?;
        }
        Ok(())
    }
}

impl<S: CommandSink> EditorSession<S> {
    pub fn with_sink(
        document_path: impl Into<PathBuf>,
        sink: S,
        rendezvous: Rendezvous,
        mode: AppearanceMode,
    ) -> Result<Self> {
        let document_path = document_path.into();
        let document = load_document(&document_path)?;

        Ok(Self {
            document,
            document_path,
            palette: Palette::default(),
            log: CommandLog::new(),
            sink,
            rendezvous,
            mode,
            renderer: None,
        })
    }

    pub fn document(&self) -> &ThemeDocument {
        &self.document
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn mode(&self) -> AppearanceMode {
        self.mode
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn is_dirty(&self) -> bool {
        self.log.state() == DocumentState::Dirty
    }

    pub fn set_colour(
        &mut self,
        widget: &str,
        property: &str,
        value: &str,
    ) -> Result<()> {
        let old = match self.document.value_at(widget, property, self.mode) {
            Some(ModeValue::Color(old)) => old.clone(),
            Some(ModeValue::Number(_)) => {
                return Err(Error::InvalidCommand(format!(
                    "{}.{} is a geometry property",
                    widget, property
                )));
            }
            None => {
                return Err(Error::InvalidCommand(format!(
                    "{}.{} has no color to edit",
                    widget, property
                )));
            }
        };

        let vector = PropertyVector::new(
            Domain::Color,
            Operation::UpdateWidgetColour,
            widget,
            property,
            self.mode,
            ModeValue::Color(old),
            ModeValue::Color(value.to_string()),
        )?;
        self.log.execute(&mut self.document, &self.sink, vector)
    }

    pub fn set_geometry(
        &mut self,
        widget: &str,
        property: &str,
        value: i64,
    ) -> Result<()> {
        let old = match self.document.value_at(widget, property, self.mode) {
            Some(ModeValue::Number(old)) => *old,
            _ => {
                return Err(Error::InvalidCommand(format!(
                    "{}.{} is not a geometry property",
                    widget, property
                )));
            }
        };

        let vector = PropertyVector::new(
            Domain::Geometry,
            Operation::UpdateWidgetGeometry,
            widget,
            property,
            self.mode,
            ModeValue::Number(old),
            ModeValue::Number(value),
        )?;
        self.log.execute(&mut self.document, &self.sink, vector)
    }

    /// Palette edits are editor-local scratch state: logged for undo, never
    /// sent over the channel.
    pub fn set_palette_colour(&mut self, slot: &str, value: &str) -> Result<()> {
        let entry = self.palette.entry_mut(slot).ok_or_else(|| {
            Error::InvalidCommand(format!("unknown palette slot {:?}", slot))
        })?;
        let old = entry.color(self.mode).to_string();
        entry.set_color(self.mode, value);

        let vector = PropertyVector::new(
            Domain::PaletteColor,
            Operation::UpdatePaletteColour,
            slot,
            "color",
            self.mode,
            ModeValue::Color(old),
            ModeValue::Color(value.to_string()),
        )?;
        self.log.execute(&mut self.document, &self.sink, vector)
    }

    /// Confirmed cascade: writes the slot's color into every linked
    /// (widget, property) pair, one independently-undoable vector per pair.
    /// Returns how many properties changed.
    pub fn cascade(&mut self, slot: &str, value: &str) -> Result<usize> {
        let vectors = self.palette.cascade_vectors(
            &self.document,
            slot,
            value,
            self.mode,
        )?;
        let count = vectors.len();

        for vector in vectors {
            self.log.execute(&mut self.document, &self.sink, vector)?;
        }
        Ok(count)
    }

    pub fn undo(&mut self) -> Result<UndoOutcome> {
        let outcome = self.log.undo(&mut self.document, &self.sink)?;
        self.restore_palette(&outcome);
        Ok(outcome)
    }

    pub fn redo(&mut self) -> Result<UndoOutcome> {
        let outcome = self.log.redo(&mut self.document, &self.sink)?;
        self.restore_palette(&outcome);
        Ok(outcome)
    }

    fn restore_palette(&mut self, outcome: &UndoOutcome) {
        if outcome.domain != Domain::PaletteColor {
            return;
        }
        if let (Some(entry), ModeValue::Color(color)) = (
            self.palette.entry_mut(&outcome.widget),
            &outcome.restored,
        ) {
            entry.set_color(outcome.mode, color);
        }
    }

    /// Swaps the light/dark slots of every color-valued property. Bulk edit:
    /// not vector-wrapped, so it dirties the session without touching the
    /// stacks.
    pub fn flip_modes(&mut self) -> Result<()> {
        self.document.flip_appearance_modes();
        self.log.mark_dirty();
        self.resync_renderer()
    }

    /// Replays the full document over the channel, slot by slot, then
    /// repaints. The render shadow learns state only from commands, so
    /// every mutation that bypasses the log (flip, merge, reload) must be
    /// followed by a full replay or the two documents silently diverge.
    fn resync_renderer(&self) -> Result<()> {
        for (widget, props) in &self.document.widgets {
            for (property, value) in props {
                match value {
                    PropertyValue::NoColor => {
                        self.sink.send(&Command::UpdateWidgetColour {
                            widget: widget.clone(),
                            property: property.clone(),
                            value: NO_COLOR.to_string(),
                            mode: AppearanceMode::Light,
                        })?;
                    }
                    PropertyValue::Pair(pair) => {
                        for mode in
                            [AppearanceMode::Light, AppearanceMode::Dark]
                        {
                            let command = match &pair[mode.index()] {
                                ModeValue::Color(color) => {
                                    Command::UpdateWidgetColour {
                                        widget: widget.clone(),
                                        property: property.clone(),
                                        value: color.clone(),
                                        mode,
                                    }
                                }
                                ModeValue::Number(n) => {
                                    Command::UpdateWidgetGeometry {
                                        widget: widget.clone(),
                                        property: property.clone(),
                                        value: *n,
                                        mode,
                                    }
                                }
                            };
                            self.sink.send(&command)?;
                        }
                    }
                }
            }
        }
        self.sink.send(&Command::RenderRefresh)
    }

    /// Replaces the document with a merge of it and a second document: this
    /// document's `primary_mode` colors land at `mapped_primary_mode`, the
    /// other document's `secondary_mode` colors at the opposite slot.
    pub fn merge_with(
        &mut self,
        secondary_path: impl AsRef<Path>,
        primary_mode: AppearanceMode,
        secondary_mode: AppearanceMode,
        mapped_primary_mode: AppearanceMode,
    ) -> Result<()> {
        let secondary = load_document(secondary_path)?;
        self.document = merge_documents(
            &self.document,
            primary_mode,
            &secondary,
            secondary_mode,
            mapped_primary_mode,
        );
        self.log.mark_dirty();
        self.resync_renderer()
    }

    pub fn switch_mode(&mut self, mode: AppearanceMode) -> Result<()> {
        self.mode = mode;
        self.sink.send(&Command::SwitchAppearanceMode(mode))
    }

    pub fn refresh(&self) -> Result<()> {
        self.sink.send(&Command::RenderRefresh)
    }

    /// Writes the document to disk and empties the history. A saved file is
    /// the new baseline; edits from before it are no longer undoable.
    pub fn save(&mut self) -> Result<()> {
        save_document(&self.document, &self.document_path)?;
        self.log.reset();
        info!("Saved {}", self.document_path.display());
        Ok(())
    }

    /// Re-reads the document from disk, drops all history, and pushes the
    /// reloaded state to the renderer, overwriting edits its shadow applied
    /// since launch.
    pub fn reload(&mut self) -> Result<()> {
        self.document = load_document(&self.document_path)?;
        self.log.reset();
        self.resync_renderer()
    }
}

fn render_process_path() -> Result<PathBuf> {
    let exe = env::current_exe()?;
    let dir = exe.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "current executable has no parent directory",
        )
    })?;
    Ok(dir.join(format!("render_process{}", env::consts::EXE_SUFFIX)))
}
