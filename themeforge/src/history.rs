//! Command log: every document mutation wrapped as a reversible vector, with
//! undo/redo replaying the inverse or forward value against both the local
//! document and the render process.
//!
//! The log is an owned instance living alongside its document session; there
//! is deliberately no shared or static stack state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::prelude::*;
use crate::document::model::{AppearanceMode, ModeValue, ThemeDocument};
use crate::protocol::channel::CommandSink;
use crate::protocol::command::{Command, Domain, Operation};

/// An immutable record of one reversible edit. Created at the moment of a
/// user edit; only ever moved between the two stacks afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyVector {
    domain: Domain,
    operation: Operation,
    widget: String,
    property: String,
    mode: AppearanceMode,
    old_value: ModeValue,
    new_value: ModeValue,
}

impl PropertyVector {
    /// Fails with [`Error::InvalidCommand`] when the operation does not
    /// belong to the domain. The closed enums already make unknown names
    /// unrepresentable; this guards the remaining cross-field mistake.
    pub fn new(
        domain: Domain,
        operation: Operation,
        widget: impl Into<String>,
        property: impl Into<String>,
        mode: AppearanceMode,
        old_value: ModeValue,
        new_value: ModeValue,
    ) -> Result<Self> {
        if operation.domain() != domain {
            return Err(Error::InvalidCommand(format!(
                "operation {} does not belong to domain {}",
                operation.wire_name(),
                domain.wire_name()
            )));
        }

        Ok(Self {
            domain,
            operation,
            widget: widget.into(),
            property: property.into(),
            mode,
            old_value,
            new_value,
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn widget(&self) -> &str {
        &self.widget
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn mode(&self) -> AppearanceMode {
        self.mode
    }

    pub fn old_value(&self) -> &ModeValue {
        &self.old_value
    }

    pub fn new_value(&self) -> &ModeValue {
        &self.new_value
    }

    fn value(&self, direction: Direction) -> &ModeValue {
        match direction {
            Direction::Forward => &self.new_value,
            Direction::Inverse => &self.old_value,
        }
    }

    /// The channel command equivalent to replaying this vector in the given
    /// direction. `palette-color` vectors are editor-local and have no
    /// channel equivalent.
    fn command(&self, direction: Direction) -> Result<Option<Command>> {
        let command = match self.domain {
            Domain::Color => Some(Command::UpdateWidgetColour {
                widget: self.widget.clone(),
                property: self.property.clone(),
                value: self.value(direction).to_string(),
                mode: self.mode,
            }),
            Domain::Geometry => match self.value(direction) {
                ModeValue::Number(value) => {
                    Some(Command::UpdateWidgetGeometry {
                        widget: self.widget.clone(),
                        property: self.property.clone(),
                        value: *value,
                        mode: self.mode,
                    })
                }
                ModeValue::Color(value) => {
                    return Err(Error::InvalidCommand(format!(
                        "geometry vector for {}.{} holds non-integer {:?}",
                        self.widget, self.property, value
                    )));
                }
            },
            Domain::PaletteColor => None,
            Domain::Process => match self.operation {
                Operation::RenderRefresh => Some(Command::RenderRefresh),
                Operation::NoOp => Some(Command::NoOp),
                _ => None,
            },
        };
        Ok(command)
    }

    fn apply(&self, document: &mut ThemeDocument, direction: Direction) {
        match self.domain {
            Domain::Color | Domain::Geometry => {
                document.set_value(
                    &self.widget,
                    &self.property,
                    self.mode,
                    self.value(direction).clone(),
                );
            }
            // Palette state lives outside the document; the session restores
            // it from the returned outcome.
            Domain::PaletteColor => {}
            Domain::Process => {}
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Inverse,
}

/// Whether the document has unsaved history since open/save/reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentState {
    Clean,
    Dirty,
}

/// What an undo/redo reversed, returned so the caller can refresh any cached
/// UI state (and re-apply palette restores locally).
#[derive(Clone, Debug, PartialEq)]
pub struct UndoOutcome {
    pub description: String,
    pub domain: Domain,
    pub widget: String,
    pub property: String,
    pub mode: AppearanceMode,
    pub restored: ModeValue,
}

impl fmt::Display for UndoOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

#[derive(Default)]
pub struct CommandLog {
    undo_stack: Vec<PropertyVector>,
    redo_stack: Vec<PropertyVector>,
    dirty: bool,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DocumentState {
        if self.dirty { DocumentState::Dirty } else { DocumentState::Clean }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn depths(&self) -> (usize, usize) {
        (self.undo_stack.len(), self.redo_stack.len())
    }

    /// Applies the forward edit to the document, sends the equivalent
    /// command through the sink (palette vectors excepted), pushes the
    /// vector onto the undo stack and clears the redo stack.
    pub fn execute(
        &mut self,
        document: &mut ThemeDocument,
        sink: &impl CommandSink,
        vector: PropertyVector,
    ) -> Result<()> {
        vector.apply(document, Direction::Forward);
        if let Some(command) = vector.command(Direction::Forward)? {
            sink.send(&command)?;
        }

        self.undo_stack.push(vector);
        self.redo_stack.clear();
        self.dirty = true;
        Ok(())
    }

    pub fn undo(
        &mut self,
        document: &mut ThemeDocument,
        sink: &impl CommandSink,
    ) -> Result<UndoOutcome> {
        let Some(vector) = self.undo_stack.pop() else {
            return Err(Error::EmptyStack { action: "undo" });
        };

        vector.apply(document, Direction::Inverse);
        if let Some(command) = vector.command(Direction::Inverse)? {
            sink.send(&command)?;
        }

        let outcome = outcome(&vector, Direction::Inverse, "Undid");
        self.redo_stack.push(vector);
        Ok(outcome)
    }

    pub fn redo(
        &mut self,
        document: &mut ThemeDocument,
        sink: &impl CommandSink,
    ) -> Result<UndoOutcome> {
        let Some(vector) = self.redo_stack.pop() else {
            return Err(Error::EmptyStack { action: "redo" });
        };

        vector.apply(document, Direction::Forward);
        if let Some(command) = vector.command(Direction::Forward)? {
            sink.send(&command)?;
        }

        let outcome = outcome(&vector, Direction::Forward, "Redid");
        self.undo_stack.push(vector);
        Ok(outcome)
    }

    /// Empties both stacks without applying anything and returns to Clean.
    /// Save and reload run through here; undo alone never returns to Clean,
    /// because non-stack mutations may have dirtied the document
    /// independently of stack depth.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.dirty = false;
    }

    /// For bulk mutations (merge, mode flip) that dirty the document without
    /// going through a vector.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

fn outcome(
    vector: &PropertyVector,
    direction: Direction,
    verb: &str,
) -> UndoOutcome {
    let restored = vector.value(direction).clone();
    UndoOutcome {
        description: format!(
            "{} {} {}.{} ({}): restored {}",
            verb,
            vector.domain.wire_name(),
            vector.widget,
            vector.property,
            vector.mode,
            restored
        ),
        domain: vector.domain,
        widget: vector.widget.clone(),
        property: vector.property.clone(),
        mode: vector.mode,
        restored,
    }
}
