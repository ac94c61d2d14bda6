//! Render-process runtime: seeds a read-only document shadow from the file
//! given at launch, then reconstructs all further state purely from received
//! commands. All shadow mutation happens on this loop thread; connection
//! handlers only feed the mpsc channel.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;

use crate::core::prelude::*;
use crate::document::model::{
    AppearanceMode, ModeValue, NO_COLOR, ThemeDocument, load_document,
};
use crate::protocol::channel::{CommandListener, Endpoint};
use crate::protocol::command::Command;
use crate::protocol::rendezvous::Rendezvous;
use crate::runtime::settings;
use crate::runtime::storage;

/// Stop marker poll bound; a requested shutdown is observed within this.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Parser)]
#[command(name = "render_process", about = "Live widget-theme preview")]
pub struct RenderArgs {
    /// Initial appearance mode.
    #[arg(value_enum)]
    pub mode: AppearanceMode,

    /// Theme document used to seed the preview.
    pub document: PathBuf,

    #[arg(long, default_value_t = settings::DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, default_value = settings::DEFAULT_HOST)]
    pub host: String,

    /// Marker-file directory shared with the editor.
    #[arg(long)]
    pub rendezvous_dir: Option<PathBuf>,
}

pub fn run(args: RenderArgs) -> Result<()> {
    info!(
        "Starting render process: {} preview of {}",
        args.mode,
        args.document.display()
    );

    // The shadow is read once at startup and never re-read while live.
    let shadow = load_document(&args.document)?;

    let rendezvous_dir = args
        .rendezvous_dir
        .or_else(storage::cache_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let rendezvous = Rendezvous::new(rendezvous_dir);

    let (tx, rx) = mpsc::channel();
    let endpoint = Endpoint::new(args.host, args.port);
    let listener = match CommandListener::spawn(&endpoint, tx) {
        Ok(listener) => listener,
        Err(e) => {
            error!(
                "Cannot bind port {}: another render preview instance is \
                 probably already running ({})",
                endpoint.port, e
            );
            return Err(e);
        }
    };

    rendezvous.signal_ready()?;
    rendezvous.acknowledge_start()?;
    debug!("Listener ready on port {}", listener.port());

    let mut view = ShadowView::new(shadow, args.mode);
    serve(rx, &rendezvous, &mut view)
}

/// Command loop plus marker cleanup. Whatever ends the loop (quit command,
/// stop marker, closed channel), no marker may outlive this process: a
/// leftover `listener-ready` would fake readiness for the next session.
fn serve(
    rx: mpsc::Receiver<Command>,
    rendezvous: &Rendezvous,
    view: &mut ShadowView,
) -> Result<()> {
    loop {
        match rx.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(command) => {
                if !view.apply(command) {
                    info!("Quit command received");
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                warn!("Command channel closed; stopping");
                break;
            }
        }

        if rendezvous.observe_stop()? {
            break;
        }
    }

    rendezvous.clear_stale()?;
    Ok(())
}

/// The renderer's read-only document shadow plus the widget-facing apply
/// step. Widget layout itself lives elsewhere; this is the state it reads.
pub struct ShadowView {
    shadow: ThemeDocument,
    mode: AppearanceMode,
    repaints: u64,
}

impl ShadowView {
    pub fn new(shadow: ThemeDocument, mode: AppearanceMode) -> Self {
        Self { shadow, mode, repaints: 0 }
    }

    pub fn shadow(&self) -> &ThemeDocument {
        &self.shadow
    }

    pub fn mode(&self) -> AppearanceMode {
        self.mode
    }

    pub fn repaints(&self) -> u64 {
        self.repaints
    }

    /// Applies one command to the shadow. Returns false when the process
    /// should exit. Every command here is an absolute-state overwrite, so
    /// duplicate delivery is harmless.
    pub fn apply(&mut self, command: Command) -> bool {
        trace!("Applying {:?}", command.operation());

        match command {
            Command::RenderRefresh => {
                self.repaints += 1;
                info!("Repainting preview ({})", self.mode);
            }
            Command::SwitchAppearanceMode(mode) => {
                self.mode = mode;
                self.repaints += 1;
                info!("Switched preview to {}", mode);
            }
            // Updates land in the slot named by the command, not the
            // preview's current mode: an undo replayed after a mode switch
            // must still reverse the slot the editor reversed.
            Command::UpdateWidgetColour { widget, property, value, mode } => {
                if value == NO_COLOR {
                    self.shadow.set_no_color(&widget, &property);
                } else {
                    self.shadow.set_value(
                        &widget,
                        &property,
                        mode,
                        ModeValue::Color(value),
                    );
                }
                self.repaints += 1;
            }
            Command::UpdateWidgetGeometry { widget, property, value, mode } => {
                self.shadow.set_value(
                    &widget,
                    &property,
                    mode,
                    ModeValue::Number(value),
                );
                self.repaints += 1;
            }
            // Palette state is editor-local; nothing to show here.
            Command::UpdatePaletteColour { slot, .. } => {
                debug!("Ignoring palette update for {}", slot);
            }
            Command::NoOp => {}
            Command::Quit => return false,
            // Filtered out by the channel; harmless if one slips through.
            Command::Disconnect => {}
        }

        true
    }
}
