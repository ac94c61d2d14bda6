//! Editor entry point. The widget UI proper lives elsewhere; this binary
//! wires the session together and drives it from stdin lines, one edit per
//! line, which is enough to exercise the whole sync core end to end:
//!
//! ```md
//! set CTkButton fg_color #222222
//! geom CTkFrame corner_radius 8
//! palette primary #ff0000
//! cascade primary #ff0000
//! mode Dark
//! flip
//! merge other_theme.json Light Dark Light
//! undo | redo | save | reload | quit
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use themeforge::prelude::*;
use themeforge::runtime::storage;

#[derive(Debug, Parser)]
#[command(name = "themeforge", about = "Widget-theme editor core")]
struct Args {
    /// Theme document to edit.
    document: PathBuf,

    /// Initial appearance mode.
    #[arg(long, value_enum, default_value_t = AppearanceMode::Light)]
    mode: AppearanceMode,

    /// Override the command-channel port from the preference store.
    #[arg(long)]
    port: Option<u16>,
}

fn main() {
    init_logger();

    if let Err(err) = run(Args::parse()) {
        eprintln!("themeforge failed: {}", err);
        exit(1);
    }
}

fn run(args: Args) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let prefs = match Settings::default_path() {
        Some(path) => Settings::load_or_default(path)?,
        None => Settings::default(),
    };

    let mut endpoint = prefs.endpoint();
    if let Some(port) = args.port {
        endpoint = Endpoint::new(endpoint.host, port);
    }

    // Bare file names resolve against the themes dir.
    let document = if args.document.exists() || args.document.is_absolute() {
        args.document.clone()
    } else {
        storage::default_themes_dir().join(&args.document)
    };

    let rendezvous = Rendezvous::new(
        storage::cache_dir().unwrap_or_else(|| PathBuf::from(".")),
    );
    let mut session = EditorSession::open(
        &document,
        CommandSender::new(endpoint),
        rendezvous,
        args.mode,
    )?;
    session.launch_renderer()?;

    let stdin = io::stdin();
    print_prompt(&session);

    for line in stdin.lock().lines() {
        let line = line?;
        match dispatch(&mut session, &line) {
            Ok(Dispatch::Continue) => {}
            Ok(Dispatch::Quit) => break,
            // A dead channel means the preview is out of sync with no way
            // back; bail out so the user relaunches.
            Err(e @ Error::ChannelUnavailable { .. }) => {
                return Err(e.into());
            }
            Err(e) => eprintln!("{}", e),
        }
        print_prompt(&session);
    }

    session.shutdown()?;
    Ok(())
}

enum Dispatch {
    Continue,
    Quit,
}

fn dispatch(
    session: &mut EditorSession<CommandSender>,
    line: &str,
) -> Result<Dispatch> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts.as_slice() {
        [] => {}
        ["set", widget, property, value] => {
            session.set_colour(widget, property, value)?;
        }
        ["geom", widget, property, value] => {
            let value = value.parse().map_err(|_| {
                Error::InvalidCommand(format!("{:?} is not an integer", value))
            })?;
            session.set_geometry(widget, property, value)?;
        }
        ["palette", slot, value] => {
            session.set_palette_colour(slot, value)?;
        }
        ["cascade", slot, value] => {
            let count = session.cascade(slot, value)?;
            println!("cascaded to {} properties", count);
        }
        ["mode", mode] => {
            session.switch_mode(mode.parse()?)?;
        }
        ["flip"] => session.flip_modes()?,
        ["merge", path, primary, secondary, mapped] => {
            session.merge_with(
                path,
                primary.parse()?,
                secondary.parse()?,
                mapped.parse()?,
            )?;
        }
        ["undo"] => println!("{}", session.undo()?),
        ["redo"] => println!("{}", session.redo()?),
        ["save"] => session.save()?,
        ["reload"] => session.reload()?,
        ["quit"] => return Ok(Dispatch::Quit),
        _ => {
            return Err(Error::InvalidCommand(format!(
                "unrecognized input {:?}",
                line
            )));
        }
    }

    Ok(Dispatch::Continue)
}

fn print_prompt(session: &EditorSession<CommandSender>) {
    print!(
        "[{}{}{}] > ",
        session.mode(),
        if session.is_dirty() { " *" } else { "" },
        if session.can_undo() { "" } else { " (no history)" },
    );
    let _ = io::stdout().flush();
}
