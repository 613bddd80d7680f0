//! Generic machinery shared by all template programs.
//!
//! A template program does two things: assemble the descriptor skeleton for its report
//! type, and fill one [`Subset`] per observation. Everything the programs have in common
//! lives here: the slot-by-slot store rules (a missed lookup still emits an explicit
//! missing slot, never a skipped one), the shortcut field lookups, the shared station /
//! date-time / position blocks, and the BUFR-only quality attribute section.

use crate::{
    descriptor::DescriptorCode,
    message::{Encoding, Slot, Subset},
    observation::{Observation, Value, Variable},
};

/// WMO element descriptor codes used across the templates.
///
/// The names follow the WMO table B numbering; the comment gives the element name.
#[allow(missing_docs)]
pub(crate) mod codes {
    use crate::descriptor::DescriptorCode;

    pub const B01001: DescriptorCode = DescriptorCode::element(1, 1); // WMO block number
    pub const B01002: DescriptorCode = DescriptorCode::element(1, 2); // WMO station number
    pub const B01005: DescriptorCode = DescriptorCode::element(1, 5); // Buoy/platform identifier
    pub const B01006: DescriptorCode = DescriptorCode::element(1, 6); // Aircraft flight number
    pub const B01008: DescriptorCode = DescriptorCode::element(1, 8); // Aircraft registration
    pub const B01011: DescriptorCode = DescriptorCode::element(1, 11); // Ship or mobile station identifier
    pub const B01012: DescriptorCode = DescriptorCode::element(1, 12); // Direction of motion
    pub const B01013: DescriptorCode = DescriptorCode::element(1, 13); // Speed of motion
    pub const B01019: DescriptorCode = DescriptorCode::element(1, 19); // Long station name
    pub const B01031: DescriptorCode = DescriptorCode::element(1, 31); // Generating centre
    pub const B01032: DescriptorCode = DescriptorCode::element(1, 32); // Generating application
    pub const B01063: DescriptorCode = DescriptorCode::element(1, 63); // ICAO location indicator
    pub const B02001: DescriptorCode = DescriptorCode::element(2, 1); // Type of station
    pub const B02011: DescriptorCode = DescriptorCode::element(2, 11); // Radiosonde type
    pub const B04001: DescriptorCode = DescriptorCode::element(4, 1); // Year
    pub const B04002: DescriptorCode = DescriptorCode::element(4, 2); // Month
    pub const B04003: DescriptorCode = DescriptorCode::element(4, 3); // Day
    pub const B04004: DescriptorCode = DescriptorCode::element(4, 4); // Hour
    pub const B04005: DescriptorCode = DescriptorCode::element(4, 5); // Minute
    pub const B04086: DescriptorCode = DescriptorCode::element(4, 86); // Long time period, seconds
    pub const B05001: DescriptorCode = DescriptorCode::element(5, 1); // Latitude
    pub const B06001: DescriptorCode = DescriptorCode::element(6, 1); // Longitude
    pub const B07002: DescriptorCode = DescriptorCode::element(7, 2); // Height or altitude
    pub const B07004: DescriptorCode = DescriptorCode::element(7, 4); // Pressure (vertical coordinate)
    pub const B07030: DescriptorCode = DescriptorCode::element(7, 30); // Height of station ground
    pub const B08001: DescriptorCode = DescriptorCode::element(8, 1); // Vertical sounding significance
    pub const B08002: DescriptorCode = DescriptorCode::element(8, 2); // Vertical significance (cloud)
    pub const B08004: DescriptorCode = DescriptorCode::element(8, 4); // Phase of aircraft flight
    pub const B10003: DescriptorCode = DescriptorCode::element(10, 3); // Geopotential
    pub const B10004: DescriptorCode = DescriptorCode::element(10, 4); // Pressure
    pub const B10051: DescriptorCode = DescriptorCode::element(10, 51); // Pressure reduced to MSL
    pub const B10052: DescriptorCode = DescriptorCode::element(10, 52); // Altimeter setting (QNH)
    pub const B10061: DescriptorCode = DescriptorCode::element(10, 61); // 3-hour pressure change
    pub const B10063: DescriptorCode = DescriptorCode::element(10, 63); // Characteristic of tendency
    pub const B11001: DescriptorCode = DescriptorCode::element(11, 1); // Wind direction
    pub const B11002: DescriptorCode = DescriptorCode::element(11, 2); // Wind speed
    pub const B11031: DescriptorCode = DescriptorCode::element(11, 31); // Degree of turbulence
    pub const B11041: DescriptorCode = DescriptorCode::element(11, 41); // Maximum wind gust speed
    pub const B12001: DescriptorCode = DescriptorCode::element(12, 1); // Temperature/dry bulb
    pub const B12003: DescriptorCode = DescriptorCode::element(12, 3); // Dew point temperature
    pub const B13002: DescriptorCode = DescriptorCode::element(13, 2); // Mixing ratio
    pub const B13003: DescriptorCode = DescriptorCode::element(13, 3); // Relative humidity
    pub const B13019: DescriptorCode = DescriptorCode::element(13, 19); // Precipitation past 1 hour
    pub const B13020: DescriptorCode = DescriptorCode::element(13, 20); // Precipitation past 3 hours
    pub const B13021: DescriptorCode = DescriptorCode::element(13, 21); // Precipitation past 6 hours
    pub const B13022: DescriptorCode = DescriptorCode::element(13, 22); // Precipitation past 12 hours
    pub const B13023: DescriptorCode = DescriptorCode::element(13, 23); // Precipitation past 24 hours
    pub const B20001: DescriptorCode = DescriptorCode::element(20, 1); // Horizontal visibility
    pub const B20003: DescriptorCode = DescriptorCode::element(20, 3); // Present weather
    pub const B20004: DescriptorCode = DescriptorCode::element(20, 4); // Past weather (1)
    pub const B20005: DescriptorCode = DescriptorCode::element(20, 5); // Past weather (2)
    pub const B20010: DescriptorCode = DescriptorCode::element(20, 10); // Cloud cover (total)
    pub const B20011: DescriptorCode = DescriptorCode::element(20, 11); // Cloud amount
    pub const B20012: DescriptorCode = DescriptorCode::element(20, 12); // Cloud type
    pub const B20013: DescriptorCode = DescriptorCode::element(20, 13); // Height of base of cloud
    pub const B20041: DescriptorCode = DescriptorCode::element(20, 41); // Airframe icing
    pub const B22011: DescriptorCode = DescriptorCode::element(22, 11); // Period of waves
    pub const B22021: DescriptorCode = DescriptorCode::element(22, 21); // Height of waves
    pub const B22042: DescriptorCode = DescriptorCode::element(22, 42); // Sea temperature
    pub const B31002: DescriptorCode = DescriptorCode::element(31, 2); // Extended delayed replication factor
    pub const B31031: DescriptorCode = DescriptorCode::element(31, 31); // Data present indicator (bitmap)
    pub const B33007: DescriptorCode = DescriptorCode::element(33, 7); // Percent confidence
    pub const C22000: DescriptorCode = DescriptorCode::operator(22, 0); // Quality information follows
}

/// Generating centre stamped into every BUFR quality section.
pub(crate) const GENERATING_CENTRE: i64 = 200;
/// Generating application stamped into every BUFR quality section.
pub(crate) const GENERATING_APPLICATION: i64 = 101;

/// Shortcut identifiers for scalar, non-repeated fields.
///
/// Each maps to one element descriptor; [`lookup_by_id`] resolves it to at most one
/// variable anywhere in an observation, station values first.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldId {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Block,
    Station,
    StationType,
    StationHeight,
    Latitude,
    Longitude,
    Ident,
}

impl FieldId {
    /// The element descriptor this shortcut resolves through.
    pub fn code(self) -> DescriptorCode {
        use self::codes::*;

        match self {
            FieldId::Year => B04001,
            FieldId::Month => B04002,
            FieldId::Day => B04003,
            FieldId::Hour => B04004,
            FieldId::Minute => B04005,
            FieldId::Block => B01001,
            FieldId::Station => B01002,
            FieldId::StationType => B02001,
            FieldId::StationHeight => B07030,
            FieldId::Latitude => B05001,
            FieldId::Longitude => B06001,
            FieldId::Ident => B01011,
        }
    }
}

/// Resolve a shortcut field to at most one variable, station values first.
pub(crate) fn lookup_by_id(obs: &Observation, id: FieldId) -> Option<&Variable> {
    obs.find_any(id.code())
}

/// Builds one subset slot by slot, enforcing the store rules every template shares.
pub(crate) struct SubsetBuilder {
    encoding: Encoding,
    subset: Subset,
}

impl SubsetBuilder {
    pub(crate) fn new(encoding: Encoding) -> Self {
        SubsetBuilder {
            encoding,
            subset: Subset::default(),
        }
    }

    /// Store a looked-up variable, or an explicit missing marker when the lookup failed.
    /// The value and the attributes of a found variable are copied verbatim.
    pub(crate) fn store(&mut self, code: DescriptorCode, var: Option<&Variable>) {
        debug_assert!(code.takes_value());

        let (value, attrs) = match var {
            Some(var) => (var.value.clone(), var.attrs.clone()),
            None => (None, vec![]),
        };

        self.subset.slots.push(Slot { code, value, attrs });
    }

    /// Store an explicit missing marker.
    pub(crate) fn store_missing(&mut self, code: DescriptorCode) {
        self.store(code, None);
    }

    /// Store a bare value with no attributes.
    pub(crate) fn store_value(&mut self, code: DescriptorCode, value: Value) {
        debug_assert!(code.takes_value());

        self.subset.slots.push(Slot {
            code,
            value: Some(value),
            attrs: vec![],
        });
    }

    /// Store a constant integer, for template literals like cloud group significance.
    pub(crate) fn store_i(&mut self, code: DescriptorCode, value: i64) {
        self.store_value(code, Value::Int(value));
    }

    /// Store an optional integer, missing when `None`.
    pub(crate) fn store_opt_i(&mut self, code: DescriptorCode, value: Option<i32>) {
        match value {
            Some(v) => self.store_i(code, i64::from(v)),
            None => self.store_missing(code),
        }
    }

    /// Look up a shortcut field and store it.
    pub(crate) fn store_field(&mut self, obs: &Observation, id: FieldId) {
        self.store(id.code(), lookup_by_id(obs, id));
    }

    /// Append the quality attribute section. A no-op for CREX, which has no
    /// representation for the optional quality mark section.
    ///
    /// For BUFR: one data present bitmap slot sized to the main slots stored so far, the
    /// generating centre and application constants, then a delayed count and one attribute
    /// slot per main slot, carrying the first class 33 attribute of the corresponding
    /// variable or an explicit missing marker.
    pub(crate) fn append_quality_section(&mut self) {
        use self::codes::{B01031, B01032, B31002, B31031, B33007};

        if self.encoding != Encoding::Bufr {
            return;
        }

        let main_count = self.subset.slots.len();

        let bitmap: String = self
            .subset
            .slots
            .iter()
            .map(|slot| {
                if slot.attrs.iter().any(|a| a.code.is_quality()) {
                    '+'
                } else {
                    '-'
                }
            })
            .collect();

        let attr_values: Vec<Option<Value>> = self
            .subset
            .slots
            .iter()
            .map(|slot| {
                slot.attrs
                    .iter()
                    .find(|a| a.code.is_quality())
                    .and_then(|a| a.value.clone())
            })
            .collect();

        self.store_value(B31031, Value::Str(bitmap));
        self.store_i(B01031, GENERATING_CENTRE);
        self.store_i(B01032, GENERATING_APPLICATION);
        self.store_i(B31002, main_count as i64);

        for value in attr_values {
            self.subset.slots.push(Slot {
                code: B33007,
                value,
                attrs: vec![],
            });
        }
    }

    pub(crate) fn finish(self) -> Subset {
        self.subset
    }
}

/// The descriptors of the quality attribute section, in skeleton order.
const QUALITY_DESCRIPTORS: [DescriptorCode; 7] = [
    codes::C22000,
    codes::B31031,
    codes::B01031,
    codes::B01032,
    DescriptorCode::replication(1, 0),
    codes::B31002,
    codes::B33007,
];

/// Append the quality section descriptors for BUFR targets. CREX skeletons stop before
/// the quality operator, so nothing is appended for them.
pub(crate) fn push_quality_descriptors(descriptors: &mut Vec<DescriptorCode>, encoding: Encoding) {
    if encoding == Encoding::Bufr {
        descriptors.extend_from_slice(&QUALITY_DESCRIPTORS);
    }
}

//
// Shared template blocks.
//

/// Date and time of observation, `B04001..B04005`.
pub(crate) const DATETIME_DESCRIPTORS: [DescriptorCode; 5] = [
    codes::B04001,
    codes::B04002,
    codes::B04003,
    codes::B04004,
    codes::B04005,
];

/// Fill the date and time block from the station values.
pub(crate) fn fill_datetime(builder: &mut SubsetBuilder, obs: &Observation) {
    for id in &[
        FieldId::Year,
        FieldId::Month,
        FieldId::Day,
        FieldId::Hour,
        FieldId::Minute,
    ] {
        builder.store_field(obs, *id);
    }
}

/// Horizontal position, `B05001 B06001`.
pub(crate) const POSITION_DESCRIPTORS: [DescriptorCode; 2] = [codes::B05001, codes::B06001];

/// Fill the position block from the station values.
pub(crate) fn fill_position(builder: &mut SubsetBuilder, obs: &Observation) {
    builder.store_field(obs, FieldId::Latitude);
    builder.store_field(obs, FieldId::Longitude);
}

/// Fixed land station identification, `B01001 B01002 B02001`.
pub(crate) const WMO_STATION_DESCRIPTORS: [DescriptorCode; 3] =
    [codes::B01001, codes::B01002, codes::B02001];

/// Fill the land station identification block.
pub(crate) fn fill_wmo_station(builder: &mut SubsetBuilder, obs: &Observation) {
    builder.store_field(obs, FieldId::Block);
    builder.store_field(obs, FieldId::Station);
    builder.store_field(obs, FieldId::StationType);
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::observation::{ObservationKind, Variable};

    #[test]
    fn test_store_missing_is_explicit() {
        let mut builder = SubsetBuilder::new(Encoding::Bufr);
        builder.store(codes::B12001, None);
        builder.store(
            codes::B10004,
            Some(&Variable::int(codes::B10004, 100000)),
        );

        let subset = builder.finish();
        assert_eq!(subset.slots.len(), 2);
        assert_eq!(subset.slots[0].code, codes::B12001);
        assert!(subset.slots[0].value.is_none());
        assert_eq!(subset.slots[1].value, Some(Value::Int(100000)));
    }

    #[test]
    fn test_store_copies_attrs() {
        let var = Variable::float(codes::B12001, 285.4)
            .with_attr(Variable::int(codes::B33007, 70));

        let mut builder = SubsetBuilder::new(Encoding::Bufr);
        builder.store(codes::B12001, Some(&var));

        let subset = builder.finish();
        assert_eq!(subset.slots[0].attrs.len(), 1);
        assert_eq!(subset.slots[0].attrs[0].value, Some(Value::Int(70)));
    }

    #[test]
    fn test_quality_section_bufr() {
        let attributed = Variable::float(codes::B12001, 285.4)
            .with_attr(Variable::int(codes::B33007, 70));

        let mut builder = SubsetBuilder::new(Encoding::Bufr);
        builder.store(codes::B10004, Some(&Variable::int(codes::B10004, 100000)));
        builder.store(codes::B12001, Some(&attributed));
        builder.store_missing(codes::B12003);
        builder.append_quality_section();

        let subset = builder.finish();
        // 3 main + bitmap + centre + application + count + 3 attribute slots.
        assert_eq!(subset.slots.len(), 10);

        assert_eq!(subset.slots[3].code, codes::B31031);
        assert_eq!(subset.slots[3].value, Some(Value::Str("-+-".to_owned())));
        assert_eq!(subset.slots[4].value, Some(Value::Int(GENERATING_CENTRE)));
        assert_eq!(
            subset.slots[5].value,
            Some(Value::Int(GENERATING_APPLICATION))
        );
        assert_eq!(subset.slots[6].value, Some(Value::Int(3)));

        assert!(subset.slots[7].value.is_none());
        assert_eq!(subset.slots[8].value, Some(Value::Int(70)));
        assert!(subset.slots[9].value.is_none());
    }

    #[test]
    fn test_quality_section_never_for_crex() {
        let mut builder = SubsetBuilder::new(Encoding::Crex);
        builder.store(codes::B10004, Some(&Variable::int(codes::B10004, 100000)));
        builder.append_quality_section();

        assert_eq!(builder.finish().slots.len(), 1);

        let mut descriptors = vec![codes::B10004];
        push_quality_descriptors(&mut descriptors, Encoding::Crex);
        assert_eq!(descriptors.len(), 1);

        push_quality_descriptors(&mut descriptors, Encoding::Bufr);
        assert_eq!(descriptors.len(), 8);
        assert_eq!(descriptors[1], codes::C22000);
    }

    #[test]
    fn test_lookup_by_id_prefers_station_values() {
        let mut obs = crate::observation::Observation::new(ObservationKind::Synop);
        obs.insert(
            crate::observation::Level::isobaric(100000),
            crate::observation::Trange::instant(),
            Variable::int(codes::B04004, 12),
        );
        obs.insert_station(Variable::int(codes::B04004, 6));

        let var = lookup_by_id(&obs, FieldId::Hour).unwrap();
        assert_eq!(var.value, Some(Value::Int(6)));

        assert!(lookup_by_id(&obs, FieldId::Minute).is_none());
    }
}
