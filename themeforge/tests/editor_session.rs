//! Editor session tests against an in-memory command sink: document loading
//! with migration and back-fill, the edit/undo/redo surface, and the
//! palette/cascade flow.

use std::fs;
use std::sync::Mutex;

use themeforge::prelude::*;

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<Command>>,
}

impl RecordingSink {
    fn sent(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }
}

impl CommandSink for RecordingSink {
    fn send(&self, command: &Command) -> Result<()> {
        self.sent.lock().unwrap().push(command.clone());
        Ok(())
    }
}

fn session(
    document_json: &str,
) -> (tempfile::TempDir, EditorSession<RecordingSink>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("theme.json");
    fs::write(&path, document_json).unwrap();

    let rendezvous = Rendezvous::new(dir.path().join("markers"));
    let session = EditorSession::with_sink(
        &path,
        RecordingSink::default(),
        rendezvous,
        AppearanceMode::Light,
    )
    .unwrap();
    (dir, session)
}

const MINIMAL_DOC: &str = r##"{
  "CTkButton": {
    "fg_color": ["#111111", "#1f538d"]
  }
}"##;

#[test]
fn loading_backfills_missing_properties_from_the_reference() {
    let (_dir, session) = session(MINIMAL_DOC);
    let doc = session.document();

    // The edited property survives; everything else is back-filled.
    assert_eq!(
        doc.value_at("CTkButton", "fg_color", AppearanceMode::Light),
        Some(&ModeValue::Color("#111111".to_string()))
    );
    assert!(doc.get("CTkButton", "hover_color").is_some());
    assert!(doc.get("CTkEntry", "placeholder_text_color").is_some());
}

#[test]
fn loading_migrates_legacy_widget_type_names() {
    let legacy = r##"{
  "CTkCheckbox": {
    "fg_color": ["#aaaaaa", "#bbbbbb"]
  },
  "CTkRadiobutton": {
    "fg_color": ["#cccccc", "#dddddd"]
  }
}"##;
    let (_dir, session) = session(legacy);
    let doc = session.document();

    assert!(!doc.widgets.contains_key("CTkCheckbox"));
    assert_eq!(
        doc.value_at("CTkCheckBox", "fg_color", AppearanceMode::Dark),
        Some(&ModeValue::Color("#bbbbbb".to_string()))
    );
    assert_eq!(
        doc.value_at("CTkRadioButton", "fg_color", AppearanceMode::Light),
        Some(&ModeValue::Color("#cccccc".to_string()))
    );
}

#[test]
fn colour_edit_sends_undo_restores_redo_reapplies() {
    let (_dir, mut session) = session(MINIMAL_DOC);

    session.set_colour("CTkButton", "fg_color", "#222222").unwrap();
    assert!(session.is_dirty());
    assert!(session.can_undo());
    assert_eq!(
        session.sink_commands().last().unwrap(),
        &Command::UpdateWidgetColour {
            widget: "CTkButton".to_string(),
            property: "fg_color".to_string(),
            value: "#222222".to_string(),
            mode: AppearanceMode::Light,
        }
    );

    let outcome = session.undo().unwrap();
    assert!(outcome.description.contains("#111111"));
    assert_eq!(
        session
            .document()
            .value_at("CTkButton", "fg_color", AppearanceMode::Light),
        Some(&ModeValue::Color("#111111".to_string()))
    );

    session.redo().unwrap();
    assert_eq!(
        session
            .document()
            .value_at("CTkButton", "fg_color", AppearanceMode::Light),
        Some(&ModeValue::Color("#222222".to_string()))
    );
}

#[test]
fn editing_an_unknown_property_is_rejected() {
    let (_dir, mut session) = session(MINIMAL_DOC);
    assert!(matches!(
        session.set_colour("CTkButton", "no_such_property", "#222222"),
        Err(Error::InvalidCommand(_))
    ));
    assert!(!session.can_undo());
}

#[test]
fn palette_edits_stay_local_and_cascade_is_per_property_undoable() {
    let (_dir, mut session) = session(MINIMAL_DOC);

    session.set_palette_colour("primary", "#ff0000").unwrap();
    assert!(session.sink_commands().is_empty());
    assert_eq!(
        session.palette().entry("primary").unwrap().light,
        "#ff0000"
    );

    let count = session.cascade("primary", "#ff0000").unwrap();
    assert!(count > 1);
    assert_eq!(session.sink_commands().len(), count);
    assert_eq!(
        session
            .document()
            .value_at("CTkButton", "fg_color", AppearanceMode::Light),
        Some(&ModeValue::Color("#ff0000".to_string()))
    );

    // One undo reverses exactly one cascaded property.
    let outcome = session.undo().unwrap();
    assert_eq!(outcome.domain, Domain::Color);
    let reverted = session
        .document()
        .value_at(&outcome.widget, &outcome.property, AppearanceMode::Light)
        .unwrap();
    assert_eq!(reverted, &outcome.restored);

    // Undoing everything restores the palette slot too.
    while session.can_undo() {
        session.undo().unwrap();
    }
    assert_eq!(
        session.palette().entry("primary").unwrap().light,
        "#3a7ebf"
    );
}

#[test]
fn save_returns_to_clean_and_reload_drops_history() {
    let (_dir, mut session) = session(MINIMAL_DOC);

    session.set_colour("CTkButton", "fg_color", "#333333").unwrap();
    session.save().unwrap();
    assert!(!session.is_dirty());
    assert!(!session.can_undo());

    session.set_colour("CTkButton", "fg_color", "#444444").unwrap();
    session.reload().unwrap();
    assert!(!session.is_dirty());
    assert!(!session.can_undo());

    // The save above persisted #333333; reload picked it back up.
    assert_eq!(
        session
            .document()
            .value_at("CTkButton", "fg_color", AppearanceMode::Light),
        Some(&ModeValue::Color("#333333".to_string()))
    );
    assert_eq!(
        session.sink_commands().last().unwrap(),
        &Command::RenderRefresh
    );
}

#[test]
fn mode_switch_routes_subsequent_edits_to_the_other_slot() {
    let (_dir, mut session) = session(MINIMAL_DOC);

    session.switch_mode(AppearanceMode::Dark).unwrap();
    session.set_colour("CTkButton", "fg_color", "#555555").unwrap();

    let doc = session.document();
    assert_eq!(
        doc.value_at("CTkButton", "fg_color", AppearanceMode::Dark),
        Some(&ModeValue::Color("#555555".to_string()))
    );
    assert_eq!(
        doc.value_at("CTkButton", "fg_color", AppearanceMode::Light),
        Some(&ModeValue::Color("#111111".to_string()))
    );
}

#[test]
fn undo_after_a_mode_switch_keeps_the_preview_in_step() {
    let (_dir, mut session) = session(MINIMAL_DOC);
    let mut view =
        ShadowView::new(session.document().clone(), AppearanceMode::Light);

    session.set_colour("CTkButton", "fg_color", "#222222").unwrap();
    session.switch_mode(AppearanceMode::Dark).unwrap();
    session.undo().unwrap();

    for command in session.sink_commands() {
        view.apply(command);
    }

    // The undo targeted the Light slot; the preview switched to Dark in
    // between, but both documents must land identical.
    assert_eq!(view.shadow(), session.document());
    assert_eq!(
        view.shadow()
            .value_at("CTkButton", "fg_color", AppearanceMode::Light),
        Some(&ModeValue::Color("#111111".to_string()))
    );
    assert_eq!(
        view.shadow()
            .value_at("CTkButton", "fg_color", AppearanceMode::Dark),
        Some(&ModeValue::Color("#1f538d".to_string()))
    );
}

#[test]
fn reload_and_flip_replay_full_state_to_the_preview() {
    let (_dir, mut session) = session(MINIMAL_DOC);
    let mut view =
        ShadowView::new(session.document().clone(), AppearanceMode::Light);

    // The preview's shadow only learns state from commands, so bulk
    // mutations must be followed by a full replay.
    session.set_colour("CTkButton", "fg_color", "#222222").unwrap();
    session.reload().unwrap();
    session.flip_modes().unwrap();

    for command in session.sink_commands() {
        view.apply(command);
    }

    assert_eq!(view.shadow(), session.document());
    assert_eq!(
        session
            .document()
            .value_at("CTkButton", "fg_color", AppearanceMode::Dark),
        Some(&ModeValue::Color("#111111".to_string()))
    );
}

trait SinkCommands {
    fn sink_commands(&self) -> Vec<Command>;
}

impl SinkCommands for EditorSession<RecordingSink> {
    fn sink_commands(&self) -> Vec<Command> {
        self.sink().sent()
    }
}
