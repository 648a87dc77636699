//! Error types reported by the UI core

use alloc::string::String;
use thiserror_no_std::Error;

/// Reasons a navigation request could not be carried out.
///
/// The screen controller never panics on these; the boolean navigation API
/// logs them and returns `false`, leaving the active screen untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// No factory is registered under the requested name
    #[error("no screen registered as `{0}`")]
    UnknownScreen(String),

    /// Back-navigation found neither a stacked nor a remembered screen
    #[error("nothing to go back to")]
    NothingToGoBackTo,
}

/// Errors raised when building a value editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Minimum is above maximum, or the step is not positive
    #[error("invalid value range")]
    InvalidRange,
}
