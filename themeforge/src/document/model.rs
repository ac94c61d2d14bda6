//! In-memory theme document: widget type -> property -> value, with one
//! value slot per appearance mode.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::prelude::*;
use crate::document::reference;

/// Literal stored in place of a value pair when a property carries no color.
pub const NO_COLOR: &str = "no-color";

/// The two supported appearance modes. Slot order inside value pairs is
/// `[Light, Dark]`; [`AppearanceMode::index`] is the one place that mapping
/// is defined.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[value(rename_all = "PascalCase")]
pub enum AppearanceMode {
    Light,
    Dark,
}

impl AppearanceMode {
    pub fn index(self) -> usize {
        match self {
            AppearanceMode::Light => 0,
            AppearanceMode::Dark => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            AppearanceMode::Light => AppearanceMode::Dark,
            AppearanceMode::Dark => AppearanceMode::Light,
        }
    }
}

impl fmt::Display for AppearanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppearanceMode::Light => write!(f, "Light"),
            AppearanceMode::Dark => write!(f, "Dark"),
        }
    }
}

impl FromStr for AppearanceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Light" => Ok(AppearanceMode::Light),
            "Dark" => Ok(AppearanceMode::Dark),
            other => Err(Error::InvalidCommand(format!(
                "unknown appearance mode {:?}",
                other
            ))),
        }
    }
}

/// One slot of a value pair: a `#RRGGBB` color string, or an integer for
/// geometry properties (corner radius, border width).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeValue {
    Number(i64),
    Color(String),
}

impl fmt::Display for ModeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeValue::Number(n) => write!(f, "{}", n),
            ModeValue::Color(c) => write!(f, "{}", c),
        }
    }
}

/// A property is either the [`NO_COLOR`] sentinel or a `[light, dark]` pair.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    NoColor,
    Pair([ModeValue; 2]),
}

impl PropertyValue {
    pub fn slot(&self, mode: AppearanceMode) -> Option<&ModeValue> {
        match self {
            PropertyValue::NoColor => None,
            PropertyValue::Pair(pair) => Some(&pair[mode.index()]),
        }
    }

    /// True when both slots hold colors (as opposed to geometry numbers).
    pub fn is_color(&self) -> bool {
        matches!(
            self,
            PropertyValue::Pair([ModeValue::Color(_), ModeValue::Color(_)])
        )
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PropertyValue::NoColor => serializer.serialize_str(NO_COLOR),
            PropertyValue::Pair(pair) => pair.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Pair([ModeValue; 2]),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Pair(pair) => Ok(PropertyValue::Pair(pair)),
            Raw::Text(text) if text == NO_COLOR => Ok(PropertyValue::NoColor),
            Raw::Text(text) => Err(D::Error::custom(format!(
                "expected {:?} or a [light, dark] pair, got {:?}",
                NO_COLOR, text
            ))),
        }
    }
}

pub type PropertyMap = IndexMap<String, PropertyValue>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeDocument {
    #[serde(flatten)]
    pub widgets: IndexMap<String, PropertyMap>,
}

impl ThemeDocument {
    pub fn get(&self, widget: &str, property: &str) -> Option<&PropertyValue> {
        self.widgets.get(widget).and_then(|props| props.get(property))
    }

    pub fn value_at(
        &self,
        widget: &str,
        property: &str,
        mode: AppearanceMode,
    ) -> Option<&ModeValue> {
        self.get(widget, property).and_then(|value| value.slot(mode))
    }

    /// Writes `value` into the property's slot for `mode`. A property that
    /// was absent or the sentinel becomes a pair with the value in both
    /// slots before the mode slot is written.
    pub fn set_value(
        &mut self,
        widget: &str,
        property: &str,
        mode: AppearanceMode,
        value: ModeValue,
    ) {
        let props = self.widgets.entry(widget.to_string()).or_default();
        let entry = props
            .entry(property.to_string())
            .or_insert_with(|| PropertyValue::Pair([value.clone(), value.clone()]));

        if let PropertyValue::NoColor = entry {
            *entry = PropertyValue::Pair([value.clone(), value.clone()]);
        }
        if let PropertyValue::Pair(pair) = entry {
            pair[mode.index()] = value;
        }
    }

    /// Replaces the property with the [`NO_COLOR`] sentinel, whatever its
    /// prior shape.
    pub fn set_no_color(&mut self, widget: &str, property: &str) {
        self.widgets
            .entry(widget.to_string())
            .or_default()
            .insert(property.to_string(), PropertyValue::NoColor);
    }

    /// Swaps the light/dark slots of every color-valued property in place.
    pub fn flip_appearance_modes(&mut self) {
        for props in self.widgets.values_mut() {
            for value in props.values_mut() {
                if value.is_color() {
                    if let PropertyValue::Pair(pair) = value {
                        pair.swap(0, 1);
                    }
                }
            }
        }
    }
}

/// Combines two documents into one: every color-valued property takes
/// `primary`'s `primary_mode` slot at `mapped_primary_mode` and `secondary`'s
/// `secondary_mode` slot at the opposite mode. Non-color properties come
/// wholesale from `primary`.
pub fn merge_documents(
    primary: &ThemeDocument,
    primary_mode: AppearanceMode,
    secondary: &ThemeDocument,
    secondary_mode: AppearanceMode,
    mapped_primary_mode: AppearanceMode,
) -> ThemeDocument {
    let mut merged = primary.clone();

    for (widget, props) in &mut merged.widgets {
        for (property, value) in props {
            if !value.is_color() {
                continue;
            }
            let from_primary = primary
                .value_at(widget, property, primary_mode)
                .cloned();
            let from_secondary = secondary
                .value_at(widget, property, secondary_mode)
                .cloned();

            if let (PropertyValue::Pair(pair), Some(light)) =
                (&mut *value, from_primary)
            {
                pair[mapped_primary_mode.index()] = light;
            }
            if let (PropertyValue::Pair(pair), Some(dark)) =
                (&mut *value, from_secondary)
            {
                pair[mapped_primary_mode.other().index()] = dark;
            }
        }
    }

    merged
}

/// Loads a document, migrates legacy widget-type names, and back-fills any
/// property missing relative to the canonical reference document so that
/// files written under an older schema stay fully editable.
pub fn load_document(path: impl AsRef<Path>) -> Result<ThemeDocument> {
    let bytes = fs::read(path.as_ref())?;
    let mut document: ThemeDocument = serde_json::from_slice(&bytes)?;

    migrate_widget_names(&mut document);
    backfill_from_reference(&mut document);

    Ok(document)
}

pub fn save_document(
    document: &ThemeDocument,
    path: impl AsRef<Path>,
) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path.as_ref(), json)?;
    Ok(())
}

fn migrate_widget_names(document: &mut ThemeDocument) {
    for (old, new) in reference::WIDGET_RENAMES {
        if let Some(props) = document.widgets.shift_remove(old) {
            debug!("Migrating legacy widget type {} -> {}", old, new);
            document.widgets.insert(new.to_string(), props);
        }
    }
}

fn backfill_from_reference(document: &mut ThemeDocument) {
    for (widget, props) in &reference::reference_document().widgets {
        let target = document.widgets.entry(widget.clone()).or_default();
        for (property, value) in props {
            if !target.contains_key(property) {
                debug!("Back-filling {}.{} from reference", widget, property);
                target.insert(property.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(widget: &str, property: &str, light: &str, dark: &str) -> ThemeDocument {
        let mut doc = ThemeDocument::default();
        doc.widgets.entry(widget.to_string()).or_default().insert(
            property.to_string(),
            PropertyValue::Pair([
                ModeValue::Color(light.to_string()),
                ModeValue::Color(dark.to_string()),
            ]),
        );
        doc
    }

    #[test]
    fn set_value_writes_only_the_mode_slot() {
        let mut doc = doc_with("CTkButton", "fg_color", "#111111", "#999999");
        doc.set_value(
            "CTkButton",
            "fg_color",
            AppearanceMode::Light,
            ModeValue::Color("#222222".to_string()),
        );

        assert_eq!(
            doc.value_at("CTkButton", "fg_color", AppearanceMode::Light),
            Some(&ModeValue::Color("#222222".to_string()))
        );
        assert_eq!(
            doc.value_at("CTkButton", "fg_color", AppearanceMode::Dark),
            Some(&ModeValue::Color("#999999".to_string()))
        );
    }

    #[test]
    fn set_value_promotes_sentinel_to_pair() {
        let mut doc = ThemeDocument::default();
        doc.widgets
            .entry("CTkLabel".to_string())
            .or_default()
            .insert("fg_color".to_string(), PropertyValue::NoColor);

        doc.set_value(
            "CTkLabel",
            "fg_color",
            AppearanceMode::Dark,
            ModeValue::Color("#333333".to_string()),
        );

        assert_eq!(
            doc.value_at("CTkLabel", "fg_color", AppearanceMode::Dark),
            Some(&ModeValue::Color("#333333".to_string()))
        );
    }

    #[test]
    fn flip_swaps_color_pairs_but_not_geometry() {
        let mut doc = doc_with("CTkButton", "fg_color", "#111111", "#999999");
        doc.widgets.get_mut("CTkButton").unwrap().insert(
            "corner_radius".to_string(),
            PropertyValue::Pair([ModeValue::Number(6), ModeValue::Number(8)]),
        );

        doc.flip_appearance_modes();

        assert_eq!(
            doc.value_at("CTkButton", "fg_color", AppearanceMode::Light),
            Some(&ModeValue::Color("#999999".to_string()))
        );
        assert_eq!(
            doc.value_at("CTkButton", "corner_radius", AppearanceMode::Light),
            Some(&ModeValue::Number(6))
        );
    }

    #[test]
    fn merge_takes_one_slot_from_each_document() {
        let a = doc_with("CTkLabel", "text_color", "#000000", "#111111");
        let b = doc_with("CTkLabel", "text_color", "#222222", "#333333");

        let merged = merge_documents(
            &a,
            AppearanceMode::Light,
            &b,
            AppearanceMode::Dark,
            AppearanceMode::Light,
        );

        assert_eq!(
            merged.get("CTkLabel", "text_color"),
            Some(&PropertyValue::Pair([
                ModeValue::Color("#000000".to_string()),
                ModeValue::Color("#333333".to_string()),
            ]))
        );
    }

    #[test]
    fn merge_keeps_non_color_properties_from_primary() {
        let mut a = doc_with("CTkButton", "fg_color", "#000000", "#111111");
        a.widgets.get_mut("CTkButton").unwrap().insert(
            "border_width".to_string(),
            PropertyValue::Pair([ModeValue::Number(1), ModeValue::Number(2)]),
        );
        let mut b = doc_with("CTkButton", "fg_color", "#222222", "#333333");
        b.widgets.get_mut("CTkButton").unwrap().insert(
            "border_width".to_string(),
            PropertyValue::Pair([ModeValue::Number(9), ModeValue::Number(9)]),
        );

        let merged = merge_documents(
            &a,
            AppearanceMode::Light,
            &b,
            AppearanceMode::Dark,
            AppearanceMode::Light,
        );

        assert_eq!(
            merged.get("CTkButton", "border_width"),
            Some(&PropertyValue::Pair([
                ModeValue::Number(1),
                ModeValue::Number(2),
            ]))
        );
    }

    #[test]
    fn property_value_serde_round_trips_sentinel_and_pairs() {
        let json = r##"{"CTkFrame":{"fg_color":["#eeeeee","#222222"],"top_fg_color":"no-color","corner_radius":[6,6]}}"##;
        let doc: ThemeDocument = serde_json::from_str(json).unwrap();

        assert_eq!(
            doc.get("CTkFrame", "top_fg_color"),
            Some(&PropertyValue::NoColor)
        );
        assert_eq!(
            doc.value_at("CTkFrame", "corner_radius", AppearanceMode::Dark),
            Some(&ModeValue::Number(6))
        );

        let back = serde_json::to_string(&doc).unwrap();
        let again: ThemeDocument = serde_json::from_str(&back).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn arbitrary_string_value_is_rejected() {
        let json = r#"{"CTkFrame":{"fg_color":"transparent"}}"#;
        assert!(serde_json::from_str::<ThemeDocument>(json).is_err());
    }
}
