#![deny(missing_docs)]
//! Package to compile decoded weather observations into BUFR and CREX export templates.
//!
//! The input is an [`Observation`]: a semantically organized point report (station values
//! plus zero or more level groups, each holding time-ranged variables). The output is a
//! [`TargetMessage`]: the ordered WMO descriptor skeleton describing the message shape and
//! one filled [`Subset`] per observation, ready for a bit-level BUFR or CREX encoder.
//! Neither the binary codec nor any storage layer lives here.

//
// Public API
//
pub use crate::descriptor::{DescriptorClass, DescriptorCode};
pub use crate::errors::ExportError;
pub use crate::export::engine::FieldId;
pub use crate::export::{export, resolve, ExporterDefinition};
pub use crate::message::{Encoding, Slot, Subset, TargetMessage};
pub use crate::observation::{
    Datum, Level, LevelGroup, Observation, ObservationKind, Trange, Value, Variable,
};

//
// Implementation only
//
#[macro_use]
extern crate strum_macros;

mod descriptor;
mod errors;
mod export;
mod message;
mod observation;
