//! Editor-local color palette: a fixed set of named slots, each holding one
//! color per appearance mode, optionally linked to document properties via
//! cascade rules. Palette state is scratch state; it reaches the render
//! process only indirectly, through a cascade or a save.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::prelude::*;
use crate::document::model::{AppearanceMode, ModeValue, ThemeDocument};
use crate::history::PropertyVector;
use crate::protocol::command::{Domain, Operation};

pub const PALETTE_SIZE: usize = 16;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub name: String,
    pub light: String,
    pub dark: String,
}

impl PaletteEntry {
    fn new(name: &str, light: &str, dark: &str) -> Self {
        Self {
            name: name.to_string(),
            light: light.to_string(),
            dark: dark.to_string(),
        }
    }

    pub fn color(&self, mode: AppearanceMode) -> &str {
        match mode {
            AppearanceMode::Light => &self.light,
            AppearanceMode::Dark => &self.dark,
        }
    }

    pub fn set_color(&mut self, mode: AppearanceMode, color: &str) {
        match mode {
            AppearanceMode::Light => self.light = color.to_string(),
            AppearanceMode::Dark => self.dark = color.to_string(),
        }
    }
}

/// Cascade rule: slot name -> (widget, property) pairs updated in lockstep
/// when the slot's color changes and the user confirms the cascade.
pub type CascadeRules = IndexMap<String, Vec<(String, String)>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    rules: CascadeRules,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: default_entries(),
            rules: default_rules(),
        }
    }
}

impl Palette {
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn entry(&self, slot: &str) -> Option<&PaletteEntry> {
        self.entries.iter().find(|e| e.name == slot)
    }

    pub fn entry_mut(&mut self, slot: &str) -> Option<&mut PaletteEntry> {
        self.entries.iter_mut().find(|e| e.name == slot)
    }

    pub fn rule(&self, slot: &str) -> &[(String, String)] {
        self.rules.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_rule(&mut self, slot: &str, targets: Vec<(String, String)>) {
        self.rules.insert(slot.to_string(), targets);
    }

    /// Computes one reversible vector per (widget, property) pair linked to
    /// `slot`, each writing `color` into the document at the active mode's
    /// slot. Nothing is applied here; the caller executes each vector through
    /// its command log so every pair is independently undoable. Pairs whose
    /// property currently carries no color are skipped — there is no slot to
    /// restore on undo.
    pub fn cascade_vectors(
        &self,
        document: &ThemeDocument,
        slot: &str,
        color: &str,
        mode: AppearanceMode,
    ) -> Result<Vec<PropertyVector>> {
        let mut vectors = Vec::new();

        for (widget, property) in self.rule(slot) {
            let old = match document.value_at(widget, property, mode) {
                Some(ModeValue::Color(old)) => old.clone(),
                Some(ModeValue::Number(_)) => {
                    return Err(Error::InvalidCommand(format!(
                        "cascade target {}.{} is a geometry property",
                        widget, property
                    )));
                }
                None => {
                    warn!(
                        "Skipping cascade target {}.{}: no color slot",
                        widget, property
                    );
                    continue;
                }
            };

            vectors.push(PropertyVector::new(
                Domain::Color,
                Operation::UpdateWidgetColour,
                widget.as_str(),
                property.as_str(),
                mode,
                ModeValue::Color(old),
                ModeValue::Color(color.to_string()),
            )?);
        }

        Ok(vectors)
    }
}

fn default_entries() -> Vec<PaletteEntry> {
    vec![
        PaletteEntry::new("primary", "#3a7ebf", "#1f538d"),
        PaletteEntry::new("primary-hover", "#325882", "#14375e"),
        PaletteEntry::new("secondary", "#939ba2", "#4d4d4d"),
        PaletteEntry::new("secondary-hover", "#6e7174", "#7a848d"),
        PaletteEntry::new("surface", "#dbdbdb", "#2b2b2b"),
        PaletteEntry::new("surface-raised", "#cfcfcf", "#333333"),
        PaletteEntry::new("window", "#ebebeb", "#242424"),
        PaletteEntry::new("field", "#f9f9fa", "#343638"),
        PaletteEntry::new("border", "#979da2", "#565b5e"),
        PaletteEntry::new("text", "#1a1a1a", "#dce4ee"),
        PaletteEntry::new("text-inverse", "#dce4ee", "#dce4ee"),
        PaletteEntry::new("text-disabled", "#9fa5ab", "#7a848d"),
        PaletteEntry::new("accent", "#f59e0b", "#b45309"),
        PaletteEntry::new("success", "#16a34a", "#15803d"),
        PaletteEntry::new("warning", "#dc2626", "#991b1b"),
        PaletteEntry::new("scratch", "#000000", "#ffffff"),
    ]
}

fn default_rules() -> CascadeRules {
    let pair = |w: &str, p: &str| (w.to_string(), p.to_string());
    let mut rules = CascadeRules::default();

    rules.insert(
        "primary".to_string(),
        vec![
            pair("CTkButton", "fg_color"),
            pair("CTkCheckBox", "fg_color"),
            pair("CTkRadioButton", "fg_color"),
            pair("CTkSlider", "progress_color"),
            pair("CTkSwitch", "progress_color"),
            pair("CTkProgressBar", "progress_color"),
            pair("CTkOptionMenu", "fg_color"),
            pair("CTkSegmentedButton", "selected_color"),
        ],
    );
    rules.insert(
        "primary-hover".to_string(),
        vec![
            pair("CTkButton", "hover_color"),
            pair("CTkCheckBox", "hover_color"),
            pair("CTkRadioButton", "hover_color"),
            pair("CTkSegmentedButton", "selected_hover_color"),
        ],
    );
    rules.insert(
        "surface".to_string(),
        vec![pair("CTkFrame", "fg_color")],
    );
    rules.insert(
        "border".to_string(),
        vec![
            pair("CTkEntry", "border_color"),
            pair("CTkComboBox", "border_color"),
            pair("CTkProgressBar", "border_color"),
            pair("CTkTextbox", "border_color"),
        ],
    );
    rules.insert(
        "text".to_string(),
        vec![
            pair("CTkLabel", "text_color"),
            pair("CTkEntry", "text_color"),
            pair("CTkCheckBox", "text_color"),
            pair("CTkSwitch", "text_color"),
            pair("CTkRadioButton", "text_color"),
            pair("CTkTextbox", "text_color"),
        ],
    );

    rules
}
