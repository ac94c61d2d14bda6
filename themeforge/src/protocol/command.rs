//! Wire command model for the editor -> render process channel.
//!
//! The wire format is one JSON object per frame:
//! `{"domain": string, "operation": string, "parameters": [...]}`. In memory
//! the same commands are a closed tagged union, so an unknown operation is
//! unrepresentable once decoding has succeeded; the string whitelist lives
//! only at the wire boundary and fails fast with `InvalidCommand`.
//!
//! Delivery is at-least-once with no dedup, so every command here must stay
//! idempotent under duplicate application: the update commands overwrite
//! absolute values, `render_refresh`/`switch_appearance_mode`/`no_op` are
//! idempotent by construction, and a duplicate `quit` only ever reaches a
//! listener that is already gone.

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::document::model::AppearanceMode;

/// Command domains, as spelled on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Color,
    Geometry,
    PaletteColor,
    Process,
}

impl Domain {
    pub fn wire_name(self) -> &'static str {
        match self {
            Domain::Color => "color",
            Domain::Geometry => "geometry",
            Domain::PaletteColor => "palette-color",
            Domain::Process => "process",
        }
    }

    fn parse(name: &str) -> Result<Self> {
        match name {
            "color" => Ok(Domain::Color),
            "geometry" => Ok(Domain::Geometry),
            "palette-color" => Ok(Domain::PaletteColor),
            "process" => Ok(Domain::Process),
            other => Err(Error::InvalidCommand(format!(
                "unknown domain {:?}",
                other
            ))),
        }
    }
}

/// The closed set of recognized operation names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    RenderRefresh,
    SwitchAppearanceMode,
    UpdateWidgetColour,
    UpdateWidgetGeometry,
    UpdatePaletteColour,
    Quit,
    NoOp,
    Disconnect,
}

impl Operation {
    pub fn wire_name(self) -> &'static str {
        match self {
            Operation::RenderRefresh => "render_refresh",
            Operation::SwitchAppearanceMode => "switch_appearance_mode",
            Operation::UpdateWidgetColour => "update_widget_colour",
            Operation::UpdateWidgetGeometry => "update_widget_geometry",
            Operation::UpdatePaletteColour => "update_palette_colour",
            Operation::Quit => "quit",
            Operation::NoOp => "no_op",
            Operation::Disconnect => "disconnect",
        }
    }

    /// The domain each operation belongs to.
    pub fn domain(self) -> Domain {
        match self {
            Operation::UpdateWidgetColour => Domain::Color,
            Operation::UpdateWidgetGeometry => Domain::Geometry,
            Operation::UpdatePaletteColour => Domain::PaletteColor,
            Operation::RenderRefresh
            | Operation::SwitchAppearanceMode
            | Operation::Quit
            | Operation::NoOp
            | Operation::Disconnect => Domain::Process,
        }
    }

    fn parse(name: &str) -> Result<Self> {
        match name {
            "render_refresh" => Ok(Operation::RenderRefresh),
            "switch_appearance_mode" => Ok(Operation::SwitchAppearanceMode),
            "update_widget_colour" => Ok(Operation::UpdateWidgetColour),
            "update_widget_geometry" => Ok(Operation::UpdateWidgetGeometry),
            "update_palette_colour" => Ok(Operation::UpdatePaletteColour),
            "quit" => Ok(Operation::Quit),
            "no_op" => Ok(Operation::NoOp),
            "disconnect" => Ok(Operation::Disconnect),
            other => Err(Error::InvalidCommand(format!(
                "unknown operation {:?}",
                other
            ))),
        }
    }
}

/// The raw wire shape. Only used at the serialization boundary; everything
/// past decode works with [`Command`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub domain: String,
    pub operation: String,
    pub parameters: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    RenderRefresh,
    SwitchAppearanceMode(AppearanceMode),
    /// Colour updates name the mode slot they target so the render process
    /// lands undo/redo replays in the same slot the editor mutated, even
    /// when the preview has since switched modes.
    UpdateWidgetColour {
        widget: String,
        property: String,
        value: String,
        mode: AppearanceMode,
    },
    UpdateWidgetGeometry {
        widget: String,
        property: String,
        value: i64,
        mode: AppearanceMode,
    },
    UpdatePaletteColour {
        slot: String,
        value: String,
    },
    Quit,
    NoOp,
    /// Reserved terminal frame closing the connection.
    Disconnect,
}

impl Command {
    pub fn operation(&self) -> Operation {
        match self {
            Command::RenderRefresh => Operation::RenderRefresh,
            Command::SwitchAppearanceMode(_) => Operation::SwitchAppearanceMode,
            Command::UpdateWidgetColour { .. } => Operation::UpdateWidgetColour,
            Command::UpdateWidgetGeometry { .. } => {
                Operation::UpdateWidgetGeometry
            }
            Command::UpdatePaletteColour { .. } => {
                Operation::UpdatePaletteColour
            }
            Command::Quit => Operation::Quit,
            Command::NoOp => Operation::NoOp,
            Command::Disconnect => Operation::Disconnect,
        }
    }

    pub fn domain(&self) -> Domain {
        self.operation().domain()
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, Command::Disconnect)
    }

    pub fn to_envelope(&self) -> Envelope {
        let parameters = match self {
            Command::RenderRefresh | Command::Quit | Command::NoOp => vec![],
            Command::SwitchAppearanceMode(mode) => vec![mode.to_string()],
            Command::UpdateWidgetColour {
                widget,
                property,
                value,
                mode,
            } => vec![
                widget.clone(),
                property.clone(),
                value.clone(),
                mode.to_string(),
            ],
            Command::UpdateWidgetGeometry {
                widget,
                property,
                value,
                mode,
            } => vec![
                widget.clone(),
                property.clone(),
                value.to_string(),
                mode.to_string(),
            ],
            Command::UpdatePaletteColour { slot, value } => {
                vec![slot.clone(), value.clone()]
            }
            Command::Disconnect => vec![String::new()],
        };

        Envelope {
            domain: self.domain().wire_name().to_string(),
            operation: self.operation().wire_name().to_string(),
            parameters,
        }
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let domain = Domain::parse(&envelope.domain)?;
        let operation = Operation::parse(&envelope.operation)?;
        if operation.domain() != domain {
            return Err(Error::InvalidCommand(format!(
                "operation {:?} does not belong to domain {:?}",
                envelope.operation, envelope.domain
            )));
        }

        let params = &envelope.parameters;
        let command = match operation {
            Operation::RenderRefresh => Command::RenderRefresh,
            Operation::SwitchAppearanceMode => Command::SwitchAppearanceMode(
                param(params, 0, operation)?.parse()?,
            ),
            Operation::UpdateWidgetColour => Command::UpdateWidgetColour {
                widget: param(params, 0, operation)?.to_string(),
                property: param(params, 1, operation)?.to_string(),
                value: param(params, 2, operation)?.to_string(),
                mode: param(params, 3, operation)?.parse()?,
            },
            Operation::UpdateWidgetGeometry => {
                let raw = param(params, 2, operation)?;
                Command::UpdateWidgetGeometry {
                    widget: param(params, 0, operation)?.to_string(),
                    property: param(params, 1, operation)?.to_string(),
                    value: raw.parse().map_err(|_| {
                        Error::InvalidCommand(format!(
                            "geometry value {:?} is not an integer",
                            raw
                        ))
                    })?,
                    mode: param(params, 3, operation)?.parse()?,
                }
            }
            Operation::UpdatePaletteColour => Command::UpdatePaletteColour {
                slot: param(params, 0, operation)?.to_string(),
                value: param(params, 1, operation)?.to_string(),
            },
            Operation::Quit => Command::Quit,
            Operation::NoOp => Command::NoOp,
            Operation::Disconnect => Command::Disconnect,
        };

        Ok(command)
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_envelope())?)
    }

    pub fn decode(json: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(json)
            .map_err(|e| Error::InvalidCommand(format!("bad envelope: {}", e)))?;
        Command::from_envelope(&envelope)
    }
}

fn param<'a>(
    params: &'a [String],
    index: usize,
    operation: Operation,
) -> Result<&'a str> {
    params.get(index).map(String::as_str).ok_or_else(|| {
        Error::InvalidCommand(format!(
            "{} expects at least {} parameters, got {}",
            operation.wire_name(),
            index + 1,
            params.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_round_trip_through_the_wire() {
        let commands = [
            Command::RenderRefresh,
            Command::SwitchAppearanceMode(AppearanceMode::Dark),
            Command::UpdateWidgetColour {
                widget: "CTkButton".to_string(),
                property: "fg_color".to_string(),
                value: "#222222".to_string(),
                mode: AppearanceMode::Light,
            },
            Command::UpdateWidgetGeometry {
                widget: "CTkFrame".to_string(),
                property: "corner_radius".to_string(),
                value: 8,
                mode: AppearanceMode::Dark,
            },
            Command::UpdatePaletteColour {
                slot: "primary".to_string(),
                value: "#3a7ebf".to_string(),
            },
            Command::Quit,
            Command::NoOp,
            Command::Disconnect,
        ];

        for command in commands {
            let json = command.encode().unwrap();
            assert_eq!(Command::decode(&json).unwrap(), command);
        }
    }

    #[test]
    fn disconnect_payload_matches_the_reserved_shape() {
        let json = Command::Disconnect.encode().unwrap();
        assert_eq!(
            json,
            r#"{"domain":"process","operation":"disconnect","parameters":[""]}"#
        );
    }

    #[test]
    fn unknown_operation_is_invalid_command() {
        let json = r#"{"domain":"color","operation":"update_widget_color","parameters":["a","b","c"]}"#;
        assert!(matches!(
            Command::decode(json),
            Err(Error::InvalidCommand(_))
        ));
    }

    #[test]
    fn unknown_domain_is_invalid_command() {
        let json = r#"{"domain":"font","operation":"no_op","parameters":[]}"#;
        assert!(matches!(
            Command::decode(json),
            Err(Error::InvalidCommand(_))
        ));
    }

    #[test]
    fn mismatched_domain_and_operation_is_rejected() {
        let json = r#"{"domain":"geometry","operation":"update_widget_colour","parameters":["a","b","c"]}"#;
        assert!(matches!(
            Command::decode(json),
            Err(Error::InvalidCommand(_))
        ));
    }

    #[test]
    fn missing_parameters_are_rejected() {
        let json = r#"{"domain":"color","operation":"update_widget_colour","parameters":["CTkButton"]}"#;
        assert!(matches!(
            Command::decode(json),
            Err(Error::InvalidCommand(_))
        ));
    }

    #[test]
    fn colour_update_without_a_mode_parameter_is_rejected() {
        let json = r##"{"domain":"color","operation":"update_widget_colour","parameters":["CTkButton","fg_color","#222222"]}"##;
        assert!(matches!(
            Command::decode(json),
            Err(Error::InvalidCommand(_))
        ));
    }

    #[test]
    fn third_appearance_mode_is_rejected() {
        let json = r#"{"domain":"process","operation":"switch_appearance_mode","parameters":["Sepia"]}"#;
        assert!(matches!(
            Command::decode(json),
            Err(Error::InvalidCommand(_))
        ));
    }
}
