//! Module for errors.
use crate::descriptor::DescriptorCode;
use std::{error::Error, fmt::Display};

/// Error from the export compiler.
#[derive(Debug, PartialEq)]
pub enum ExportError {
    /// An export was requested for an empty batch of observations.
    EmptyBatch,
    /// A flight report carried neither a pressure nor a height to derive a level from.
    NoLevelKey,
    /// More than one variable matched a slot that requires exactly one.
    AmbiguousValue(DescriptorCode, DescriptorCode),
    /// A required variable was completely absent from the observation.
    MissingRequired(&'static str),
    /// A filled subset did not line up with the descriptor skeleton.
    InconsistentSubset(&'static str),
    /// There was an internal logic error.
    LogicError(&'static str),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::ExportError::*;

        match self {
            EmptyBatch => write!(f, "cannot export an empty batch of observations"),
            NoLevelKey => write!(f, "no pressure or height to derive a flight level from"),
            AmbiguousValue(first, second) => write!(
                f,
                "more than one candidate for a single-value slot: {} and {}",
                first, second
            ),
            MissingRequired(what) => write!(f, "required variable missing: {}", what),
            InconsistentSubset(msg) => {
                write!(f, "subset does not match descriptor skeleton: {}", msg)
            }
            LogicError(msg) => write!(f, "internal logic error: {}", msg),
        }
    }
}

impl Error for ExportError {}
