use std::{error::Error, fmt::Display};

use crate::guidance::GuidanceError;

/// Things that can go wrong while the navigator owns the terminal.
#[derive(Debug)]
pub enum GuideGuiError {
    /// Drawing or reading keys failed.
    IOError(std::io::Error),
    /// The guide refused a transition the UI asked for.
    Guidance(GuidanceError),
}

impl Display for GuideGuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuideGuiError::IOError(e) => write!(f, "terminal error: {}", e),
            GuideGuiError::Guidance(e) => write!(f, "guidance error: {}", e),
        }
    }
}

impl Error for GuideGuiError {}

impl From<std::io::Error> for GuideGuiError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<GuidanceError> for GuideGuiError {
    fn from(value: GuidanceError) -> Self {
        Self::Guidance(value)
    }
}
