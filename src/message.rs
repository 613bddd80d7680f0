//! The compiled message handed to the bit-level codec.
//!
//! A [`TargetMessage`] pairs one descriptor skeleton with one [`Subset`] per exported
//! observation. Order is semantically significant on both sides: a decoder lines the
//! stored slots up against the expanded descriptor list, so the two must agree exactly.
//! [`TargetMessage::validate`] checks that agreement before handoff.

use crate::{
    descriptor::{DescriptorClass, DescriptorCode},
    errors::ExportError,
    observation::{Value, Variable},
};
use chrono::{NaiveDate, NaiveDateTime};

/// The target wire encoding of a message.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumString, AsStaticStr, EnumIter)]
pub enum Encoding {
    /// The WMO binary format.
    #[strum(to_string = "BUFR", serialize = "bufr")]
    Bufr,
    /// The WMO character format.
    #[strum(to_string = "CREX", serialize = "crex")]
    Crex,
}

impl Encoding {
    /// The default edition number stamped on messages of this encoding.
    pub fn default_edition(self) -> u8 {
        match self {
            Encoding::Bufr => 4,
            Encoding::Crex => 2,
        }
    }
}

/// One stored slot of a subset: an element descriptor paired with a value or an explicit
/// missing marker, plus the quality attributes copied from the source variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    /// The element descriptor code of this slot.
    pub code: DescriptorCode,
    /// The value, or `None` for an explicit missing marker.
    pub value: Option<Value>,
    /// Quality attributes carried over from the source variable.
    pub attrs: Vec<Variable>,
}

/// One observation's worth of stored slots, in emission order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subset {
    /// The stored slots, strictly in emission order.
    pub slots: Vec<Slot>,
}

/// A compiled message: descriptor skeleton, metadata, and one subset per observation.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetMessage {
    /// The target encoding.
    pub encoding: Encoding,
    /// The format edition number.
    pub edition: u8,
    /// Data category (BUFR table A).
    pub category: u8,
    /// International data subcategory.
    pub subcategory: u8,
    /// Local data subcategory.
    pub local_subcategory: u16,
    /// Nominal year of the message, from the first observation when present.
    pub year: Option<i32>,
    /// Nominal month.
    pub month: Option<u32>,
    /// Nominal day.
    pub day: Option<u32>,
    /// Nominal hour.
    pub hour: Option<u32>,
    /// Nominal minute.
    pub minute: Option<u32>,
    /// The descriptor skeleton shared by all subsets.
    pub descriptors: Vec<DescriptorCode>,
    /// One filled subset per exported observation, in input order.
    pub subsets: Vec<Subset>,
}

impl TargetMessage {
    /// A new, empty message for the given encoding and report type triple.
    pub fn new(encoding: Encoding, category: u8, subcategory: u8, local_subcategory: u16) -> Self {
        TargetMessage {
            encoding,
            edition: encoding.default_edition(),
            category,
            subcategory,
            local_subcategory,
            year: None,
            month: None,
            day: None,
            hour: None,
            minute: None,
            descriptors: vec![],
            subsets: vec![],
        }
    }

    /// The nominal date and time, when all five parts are present.
    pub fn nominal_datetime(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)?;
        date.and_hms_opt(self.hour?, self.minute?, 0)
    }

    /// Check every subset against the descriptor skeleton.
    ///
    /// Element descriptors consume exactly one slot with a matching code. A replication
    /// descriptor with `y` > 0 expands the following `x` descriptors that many times; with
    /// `y` = 0 a class 31 count element follows, and its stored integer in each subset
    /// drives the expansion. Sequence descriptors are not permitted: skeletons built here
    /// are always pre-expanded element lists.
    pub fn validate(&self) -> Result<(), ExportError> {
        for subset in &self.subsets {
            let mut cursor = 0;
            walk_segment(&self.descriptors, subset, &mut cursor)?;
            if cursor != subset.slots.len() {
                return Err(ExportError::InconsistentSubset(
                    "subset holds more slots than the skeleton describes",
                ));
            }
        }
        Ok(())
    }
}

// Walk one run of descriptors, advancing the slot cursor through the subset.
fn walk_segment(
    descriptors: &[DescriptorCode],
    subset: &Subset,
    cursor: &mut usize,
) -> Result<(), ExportError> {
    let mut i = 0;

    while i < descriptors.len() {
        let desc = descriptors[i];

        match desc.class {
            DescriptorClass::Element => {
                consume_slot(desc, subset, cursor)?;
                i += 1;
            }
            DescriptorClass::Operator => {
                i += 1;
            }
            DescriptorClass::Sequence => {
                return Err(ExportError::InconsistentSubset(
                    "sequence descriptor in a skeleton",
                ));
            }
            DescriptorClass::Replication => {
                let group_len = desc.x as usize;
                let (count, body_start) = if desc.y > 0 {
                    (desc.y as usize, i + 1)
                } else {
                    // Delayed count: the next descriptor names the count element and the
                    // subset stores the resolved count there.
                    let count_desc = *descriptors.get(i + 1).ok_or(
                        ExportError::InconsistentSubset("replication with no count element"),
                    )?;
                    if !count_desc.is_delayed_count() {
                        return Err(ExportError::InconsistentSubset(
                            "delayed replication not followed by a class 31 count",
                        ));
                    }
                    let slot = consume_slot(count_desc, subset, cursor)?;
                    let count = slot
                        .value
                        .as_ref()
                        .and_then(Value::as_i64)
                        .filter(|c| *c >= 0)
                        .ok_or(ExportError::InconsistentSubset(
                            "delayed replication count is missing or negative",
                        ))?;
                    (count as usize, i + 2)
                };

                let body_end = body_start + group_len;
                if body_end > descriptors.len() {
                    return Err(ExportError::InconsistentSubset(
                        "replication extends past the end of the skeleton",
                    ));
                }

                for _ in 0..count {
                    walk_segment(&descriptors[body_start..body_end], subset, cursor)?;
                }
                i = body_end;
            }
        }
    }

    Ok(())
}

fn consume_slot<'a>(
    desc: DescriptorCode,
    subset: &'a Subset,
    cursor: &mut usize,
) -> Result<&'a Slot, ExportError> {
    let slot = subset
        .slots
        .get(*cursor)
        .ok_or(ExportError::InconsistentSubset(
            "subset ran out of slots before the skeleton did",
        ))?;

    if slot.code != desc {
        return Err(ExportError::InconsistentSubset(
            "slot code does not match the skeleton descriptor",
        ));
    }

    *cursor += 1;
    Ok(slot)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
