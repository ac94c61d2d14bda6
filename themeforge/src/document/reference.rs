//! Canonical reference document for the active toolkit version, plus the
//! legacy widget-type rename table. Loaded documents are back-filled against
//! this so older files stay editable.

use std::sync::LazyLock;

use crate::document::model::ThemeDocument;

/// Widget types whose capitalization changed in an older toolkit release.
pub const WIDGET_RENAMES: [(&str, &str); 2] = [
    ("CTkCheckbox", "CTkCheckBox"),
    ("CTkRadiobutton", "CTkRadioButton"),
];

static REFERENCE: LazyLock<ThemeDocument> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../../assets/reference_theme.json"))
        .expect("reference theme asset must parse")
});

pub fn reference_document() -> &'static ThemeDocument {
    &REFERENCE
}
