//! Registry configuration.

/// How strictly network mutators re-check their preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValidationMode {
    /// Every `add_*` re-runs the matching `can_add_*` and fails on violation.
    Strict,
    /// Callers are trusted to have checked; mutators insert unconditionally.
    Trusted,
}

impl ValidationMode {
    pub const fn is_strict(self) -> bool {
        matches!(self, ValidationMode::Strict)
    }
}

impl Default for ValidationMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ValidationMode::Strict
        } else {
            ValidationMode::Trusted
        }
    }
}

/// Settings for a [`NetworkRegistry`](crate::NetworkRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegistryConfig {
    /// Precondition checking applied to every network the registry owns.
    pub validation: ValidationMode,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the validation mode.
    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }
}
