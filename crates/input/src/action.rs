use serde::{Deserialize, Serialize};
use std::fmt;

/// A named action that the control panel or a keyboard shortcut can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Append one batch of particles.
    AddBatch,
    /// Clear the field and restore reset values.
    ResetAll,
    /// Move the camera back to its home position.
    ResetCamera,
    /// Log the current field.
    OutputObjects,
    /// Flip the explode flag.
    ToggleExplode,
    /// Flip camera auto-rotation.
    ToggleRotateCamera,
    /// Show or hide the control panel.
    TogglePanel,
}

impl ControlAction {
    pub const ALL: [ControlAction; 7] = [
        ControlAction::AddBatch,
        ControlAction::ResetAll,
        ControlAction::ResetCamera,
        ControlAction::OutputObjects,
        ControlAction::ToggleExplode,
        ControlAction::ToggleRotateCamera,
        ControlAction::TogglePanel,
    ];

    /// Stable identifier, used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::AddBatch => "add_batch",
            Self::ResetAll => "reset_all",
            Self::ResetCamera => "reset_camera",
            Self::OutputObjects => "output_objects",
            Self::ToggleExplode => "toggle_explode",
            Self::ToggleRotateCamera => "toggle_rotate_camera",
            Self::TogglePanel => "toggle_panel",
        }
    }

    /// Button caption for the control panel.
    pub fn label(self) -> &'static str {
        match self {
            Self::AddBatch => "Add Cubes",
            Self::ResetAll => "Reset All",
            Self::ResetCamera => "Reset Camera",
            Self::OutputObjects => "Output Objects",
            Self::ToggleExplode => "Explode",
            Self::ToggleRotateCamera => "Rotate Camera",
            Self::TogglePanel => "Toggle Panel",
        }
    }

    /// Keyboard shortcut shown next to the label.
    pub fn shortcut(self) -> &'static str {
        match self {
            Self::AddBatch => "N",
            Self::ResetAll => "R",
            Self::ResetCamera => "C",
            Self::OutputObjects => "O",
            Self::ToggleExplode => "E",
            Self::ToggleRotateCamera => "Space",
            Self::TogglePanel => "F1",
        }
    }

    /// `"Add Cubes (N)"`
    pub fn caption(self) -> String {
        format!("{} ({})", self.label(), self.shortcut())
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
