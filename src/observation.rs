//! The decoded observation model consumed by the export compiler.
//!
//! An [`Observation`] is produced upstream by an import/decoding step and is read only
//! here. It owns level groups in insertion order; each level group owns time-ranged
//! variables. Station values (identifiers, position, date and time) live on the pseudo
//! level 257 so the same lookup machinery covers them.

use crate::descriptor::DescriptorCode;

/// A scalar carried by a variable.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// An integer value, already scaled to WMO units.
    Int(i64),
    /// A floating point value.
    Float(f64),
    /// A character value.
    Str(String),
}

impl Value {
    /// View the value as a float where that makes sense.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Str(_) => None,
        }
    }

    /// View the value as an integer where that makes sense.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::Str(_) => None,
        }
    }

    /// View the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A single physical quantity with its quality attributes.
///
/// A variable with no value ("unset") still participates in template lookup, which makes
/// it distinguishable from a variable that is absent altogether.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    /// The semantic code, always an element descriptor.
    pub code: DescriptorCode,
    /// The value, or `None` when the variable is present but unset.
    pub value: Option<Value>,
    /// Quality attributes, conventionally class 33 codes, in insertion order.
    pub attrs: Vec<Variable>,
}

impl Variable {
    /// A variable holding an integer value.
    pub fn int(code: DescriptorCode, value: i64) -> Self {
        Variable {
            code,
            value: Some(Value::Int(value)),
            attrs: vec![],
        }
    }

    /// A variable holding a float value.
    pub fn float(code: DescriptorCode, value: f64) -> Self {
        Variable {
            code,
            value: Some(Value::Float(value)),
            attrs: vec![],
        }
    }

    /// A variable holding a character value.
    pub fn string(code: DescriptorCode, value: &str) -> Self {
        Variable {
            code,
            value: Some(Value::Str(value.to_owned())),
            attrs: vec![],
        }
    }

    /// A present but unset variable.
    pub fn unset(code: DescriptorCode) -> Self {
        Variable {
            code,
            value: None,
            attrs: vec![],
        }
    }

    /// Attach a quality attribute, builder style.
    pub fn with_attr(mut self, attr: Variable) -> Self {
        self.attrs.push(attr);
        self
    }

    /// The first class 33 attribute, if any.
    pub fn quality_attr(&self) -> Option<&Variable> {
        self.attrs.iter().find(|a| a.code.is_quality())
    }
}

/// A vertical level or layer.
///
/// `None` fields mean "missing" on a datum and "wildcard" when the level is used as a
/// lookup filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Level {
    /// Type of the first surface.
    pub ltype1: Option<i32>,
    /// Value of the first surface.
    pub l1: Option<i32>,
    /// Type of the second surface, for layers.
    pub ltype2: Option<i32>,
    /// Value of the second surface, for layers.
    pub l2: Option<i32>,
}

/// Level type for isobaric surfaces, in pascals.
pub(crate) const LTYPE_ISOBARIC: i32 = 100;
/// Level type for height above station ground, in millimetres.
pub(crate) const LTYPE_HEIGHT: i32 = 103;
/// Pseudo level type for cloud groups.
pub(crate) const LTYPE_CLOUD: i32 = 256;
/// Pseudo level type for cloud group sequence numbers.
pub(crate) const LTYPE_CLOUD_SEQ: i32 = 258;
/// Pseudo level type for station values.
pub(crate) const LTYPE_STATION: i32 = 257;

impl Level {
    /// A plain single-surface level.
    pub const fn new(ltype1: i32, l1: i32) -> Self {
        Level {
            ltype1: Some(ltype1),
            l1: Some(l1),
            ltype2: None,
            l2: None,
        }
    }

    /// The pseudo level holding station values.
    pub const fn station() -> Self {
        Level {
            ltype1: Some(LTYPE_STATION),
            l1: None,
            ltype2: None,
            l2: None,
        }
    }

    /// An isobaric surface at `pa` pascals.
    pub const fn isobaric(pa: i32) -> Self {
        Level::new(LTYPE_ISOBARIC, pa)
    }

    /// A height above station ground, in millimetres.
    pub const fn height(mm: i32) -> Self {
        Level::new(LTYPE_HEIGHT, mm)
    }

    /// The pseudo level of the `n`-th cloud layer group, counted from 1.
    pub const fn cloud(n: i32) -> Self {
        Level {
            ltype1: Some(LTYPE_CLOUD),
            l1: None,
            ltype2: Some(LTYPE_CLOUD_SEQ),
            l2: Some(n),
        }
    }

    /// The all-wildcard filter.
    pub const fn any() -> Self {
        Level {
            ltype1: None,
            l1: None,
            ltype2: None,
            l2: None,
        }
    }

    /// True when this is the station value pseudo level.
    pub fn is_station(&self) -> bool {
        self.ltype1 == Some(LTYPE_STATION)
    }

    /// Match against a filter level, where `None` filter fields accept anything.
    pub fn matches(&self, filter: &Level) -> bool {
        fn field(actual: Option<i32>, wanted: Option<i32>) -> bool {
            match wanted {
                None => true,
                some => actual == some,
            }
        }

        field(self.ltype1, filter.ltype1)
            && field(self.l1, filter.l1)
            && field(self.ltype2, filter.ltype2)
            && field(self.l2, filter.l2)
    }
}

/// A time range qualifying a datum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Trange {
    /// Time range indicator (instantaneous, accumulation, average, ...).
    pub pind: Option<i32>,
    /// First time offset, in seconds.
    pub p1: Option<i32>,
    /// Second time offset or period length, in seconds.
    pub p2: Option<i32>,
}

impl Trange {
    /// A fully specified time range.
    pub const fn new(pind: i32, p1: i32, p2: i32) -> Self {
        Trange {
            pind: Some(pind),
            p1: Some(p1),
            p2: Some(p2),
        }
    }

    /// An instantaneous value.
    pub const fn instant() -> Self {
        Trange::new(254, 0, 0)
    }

    /// An accumulation over the past `seconds`.
    pub const fn accumulated(seconds: i32) -> Self {
        Trange::new(1, 0, seconds)
    }

    /// The time range of station values, all missing.
    pub const fn station() -> Self {
        Trange {
            pind: None,
            p1: None,
            p2: None,
        }
    }

    /// The all-wildcard filter.
    pub const fn any() -> Self {
        Trange::station()
    }

    /// Match against a filter, where `None` filter fields accept anything.
    pub fn matches(&self, filter: &Trange) -> bool {
        fn field(actual: Option<i32>, wanted: Option<i32>) -> bool {
            match wanted {
                None => true,
                some => actual == some,
            }
        }

        field(self.pind, filter.pind) && field(self.p1, filter.p1) && field(self.p2, filter.p2)
    }
}

/// One variable qualified by its time range.
#[derive(Clone, Debug, PartialEq)]
pub struct Datum {
    /// The time range the variable refers to.
    pub trange: Trange,
    /// The variable itself.
    pub var: Variable,
}

/// All the data observed at one vertical level or layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelGroup {
    /// The level or layer.
    pub level: Level,
    /// The data at this level, in insertion order.
    pub data: Vec<Datum>,
}

impl LevelGroup {
    /// Find the first variable in this group with the given code, any time range.
    pub fn find(&self, code: DescriptorCode) -> Option<&Variable> {
        self.data.iter().find(|d| d.var.code == code).map(|d| &d.var)
    }

    /// Find the first variable in this group matching code and time range filter.
    pub fn find_at(&self, code: DescriptorCode, trange: &Trange) -> Option<&Variable> {
        self.data
            .iter()
            .find(|d| d.var.code == code && d.trange.matches(trange))
            .map(|d| &d.var)
    }
}

/// The report kinds the exporter registry knows about.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumString, AsStaticStr, EnumIter)]
pub enum ObservationKind {
    #[strum(to_string = "generic", serialize = "GENERIC")]
    Generic,
    #[strum(to_string = "synop", serialize = "SYNOP")]
    Synop,
    #[strum(to_string = "pilot", serialize = "PILOT")]
    Pilot,
    #[strum(to_string = "temp", serialize = "TEMP")]
    Temp,
    #[strum(to_string = "temp_ship", serialize = "TEMP_SHIP")]
    TempShip,
    #[strum(to_string = "airep", serialize = "AIREP")]
    Airep,
    #[strum(to_string = "amdar", serialize = "AMDAR")]
    Amdar,
    #[strum(to_string = "acars", serialize = "ACARS")]
    Acars,
    #[strum(to_string = "ship", serialize = "SHIP")]
    Ship,
    #[strum(to_string = "buoy", serialize = "BUOY")]
    Buoy,
    #[strum(to_string = "metar", serialize = "METAR")]
    Metar,
    #[strum(to_string = "pollution", serialize = "POLLUTION")]
    Pollution,
    #[strum(to_string = "sat", serialize = "SAT")]
    Sat,
}

/// A decoded point observation, the input of the export compiler.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// The report kind tag.
    pub kind: ObservationKind,
    /// The level groups, in insertion order.
    pub levels: Vec<LevelGroup>,
}

impl Observation {
    /// A new, empty observation of the given kind.
    pub fn new(kind: ObservationKind) -> Self {
        Observation {
            kind,
            levels: vec![],
        }
    }

    /// Insert a variable at a level and time range, creating the level group as needed.
    pub fn insert(&mut self, level: Level, trange: Trange, var: Variable) {
        let idx = match self.levels.iter().position(|g| g.level == level) {
            Some(idx) => idx,
            None => {
                self.levels.push(LevelGroup {
                    level,
                    data: vec![],
                });
                self.levels.len() - 1
            }
        };
        self.levels[idx].data.push(Datum { trange, var });
    }

    /// Insert a station value.
    pub fn insert_station(&mut self, var: Variable) {
        self.insert(Level::station(), Trange::station(), var);
    }

    /// The station value level group, if any values were set.
    pub fn station_group(&self) -> Option<&LevelGroup> {
        self.levels.iter().find(|g| g.level.is_station())
    }

    /// Find a station value by code.
    pub fn find_station(&self, code: DescriptorCode) -> Option<&Variable> {
        self.station_group().and_then(|g| g.find(code))
    }

    /// Find the first variable matching a code plus wildcard-capable level and time range
    /// filters, scanning level groups in insertion order.
    pub fn find(&self, code: DescriptorCode, level: &Level, trange: &Trange) -> Option<&Variable> {
        self.levels
            .iter()
            .filter(|g| g.level.matches(level))
            .flat_map(|g| g.data.iter())
            .find(|d| d.var.code == code && d.trange.matches(trange))
            .map(|d| &d.var)
    }

    /// Find a variable by code anywhere in the observation, station values first.
    pub fn find_any(&self, code: DescriptorCode) -> Option<&Variable> {
        self.find_station(code)
            .or_else(|| self.find(code, &Level::any(), &Trange::any()))
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use std::str::FromStr;
    use strum::{AsStaticRef, IntoEnumIterator};

    const B12001: DescriptorCode = DescriptorCode::element(12, 1);
    const B10004: DescriptorCode = DescriptorCode::element(10, 4);
    const B01001: DescriptorCode = DescriptorCode::element(1, 1);

    #[test]
    fn round_trip_strings_for_kind() {
        for kind in ObservationKind::iter() {
            assert_eq!(
                ObservationKind::from_str(kind.as_static()).unwrap(),
                kind
            );
        }
    }

    #[test]
    fn test_level_matching() {
        let lvl = Level::isobaric(85000);

        assert!(lvl.matches(&Level::any()));
        assert!(lvl.matches(&Level::isobaric(85000)));
        assert!(lvl.matches(&Level {
            ltype1: Some(100),
            l1: None,
            ltype2: None,
            l2: None,
        }));
        assert!(!lvl.matches(&Level::isobaric(50000)));
        assert!(!lvl.matches(&Level::station()));
    }

    #[test]
    fn test_trange_matching() {
        let tr = Trange::accumulated(86400);

        assert!(tr.matches(&Trange::any()));
        assert!(tr.matches(&Trange::accumulated(86400)));
        assert!(!tr.matches(&Trange::instant()));
    }

    #[test]
    fn test_insert_groups_by_level() {
        let mut obs = Observation::new(ObservationKind::Synop);
        obs.insert(
            Level::isobaric(100000),
            Trange::instant(),
            Variable::int(B10004, 100000),
        );
        obs.insert(
            Level::isobaric(100000),
            Trange::instant(),
            Variable::float(B12001, 285.4),
        );
        obs.insert_station(Variable::int(B01001, 16));

        assert_eq!(obs.levels.len(), 2);
        assert_eq!(obs.levels[0].data.len(), 2);
        assert_eq!(obs.find_station(B01001), Some(&Variable::int(B01001, 16)));
    }

    #[test]
    fn test_find_with_filters() {
        let mut obs = Observation::new(ObservationKind::Temp);
        obs.insert(
            Level::isobaric(100000),
            Trange::instant(),
            Variable::float(B12001, 285.4),
        );
        obs.insert(
            Level::isobaric(50000),
            Trange::instant(),
            Variable::float(B12001, 250.1),
        );

        let at_500 = obs
            .find(B12001, &Level::isobaric(50000), &Trange::any())
            .unwrap();
        assert_eq!(at_500.value, Some(Value::Float(250.1)));

        // First match in insertion order when the filter is a wildcard.
        let first = obs.find(B12001, &Level::any(), &Trange::any()).unwrap();
        assert_eq!(first.value, Some(Value::Float(285.4)));

        assert!(obs.find(B10004, &Level::any(), &Trange::any()).is_none());
    }

    #[test]
    fn test_unset_is_found() {
        let mut obs = Observation::new(ObservationKind::Synop);
        obs.insert_station(Variable::unset(B01001));

        let var = obs.find_station(B01001).unwrap();
        assert!(var.value.is_none());
    }

    #[test]
    fn test_quality_attr() {
        let var = Variable::float(B12001, 285.4)
            .with_attr(Variable::int(DescriptorCode::element(33, 7), 80));

        let attr = var.quality_attr().unwrap();
        assert_eq!(attr.value, Some(Value::Int(80)));

        assert!(Variable::float(B12001, 285.4).quality_attr().is_none());
    }
}
