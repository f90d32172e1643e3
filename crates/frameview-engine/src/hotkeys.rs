//! Hotkey dispatch: mapping an external key-event source onto engine
//! actions.
//!
//! The engine never talks to the OS input layer. A host feeds key chords
//! (opaque strings like `"ctrl+shift+r"`) into a channel; the
//! [`HotkeyMap`] turns each chord into an [`EngineAction`] the host then
//! applies to the engine. Actions form a closed set so a binding table
//! loaded from config cannot name behavior that does not exist.

use std::collections::HashMap;

use crossbeam_channel::Receiver;
use thiserror::Error;
use tracing::debug;

/// The closed set of actions a hotkey may trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    /// Start capture if stopped, stop it if running.
    ToggleCapture,

    /// Ask the host to move to the next configured source.
    SwitchSource,

    /// Pause capture if running, resume if paused.
    TogglePause,

    /// Abort an in-progress region selection.
    CancelSelection,
}

impl EngineAction {
    /// Parse a binding-table action name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "toggle-capture" => Some(Self::ToggleCapture),
            "switch-source" => Some(Self::SwitchSource),
            "toggle-pause" => Some(Self::TogglePause),
            "cancel-selection" => Some(Self::CancelSelection),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ToggleCapture => "toggle-capture",
            Self::SwitchSource => "switch-source",
            Self::TogglePause => "toggle-pause",
            Self::CancelSelection => "cancel-selection",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum HotkeyError {
    /// A binding referred to an action name outside the closed set.
    #[error("unknown hotkey action: {0}")]
    UnknownAction(String),
}

/// One key event from the host's input layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Normalized chord, e.g. `"ctrl+shift+r"`.
    pub chord: String,
}

/// Chord-to-action binding table.
#[derive(Debug, Default)]
pub struct HotkeyMap {
    bindings: HashMap<String, EngineAction>,
}

impl HotkeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `chord` to the action named `action`. Rebinding a chord
    /// replaces the old action.
    pub fn bind(&mut self, chord: impl Into<String>, action: &str) -> Result<(), HotkeyError> {
        let action = EngineAction::parse(action)
            .ok_or_else(|| HotkeyError::UnknownAction(action.to_string()))?;
        let chord = chord.into();
        debug!(chord = %chord, action = action.name(), "hotkey bound");
        self.bindings.insert(chord, action);
        Ok(())
    }

    pub fn unbind(&mut self, chord: &str) -> Option<EngineAction> {
        self.bindings.remove(chord)
    }

    /// The action bound to `chord`, if any. Unbound chords are ignored,
    /// not errors: the host forwards every key event it sees.
    pub fn lookup(&self, chord: &str) -> Option<EngineAction> {
        self.bindings.get(chord).copied()
    }

    /// Drain all pending key events from `events` and translate the
    /// bound ones into actions, preserving arrival order.
    pub fn drain(&self, events: &Receiver<KeyEvent>) -> Vec<EngineAction> {
        events
            .try_iter()
            .filter_map(|event| self.lookup(&event.chord))
            .collect()
    }
}
