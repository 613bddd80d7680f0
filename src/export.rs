//! The export driver and the exporter registry.
//!
//! [`export`] turns a batch of observations of one report kind into a single
//! [`TargetMessage`]: it resolves the right exporter definition, builds the descriptor
//! skeleton once, fills one subset per observation, and stamps the nominal date and time
//! from the first observation. [`resolve`] is the registry lookup, with kind inference
//! when the caller does not name a report type triple.

use crate::{
    descriptor::DescriptorCode,
    errors::ExportError,
    export::engine::{lookup_by_id, FieldId},
    message::{Encoding, Subset, TargetMessage},
    observation::{Observation, ObservationKind, Value},
};

pub(crate) mod engine;

mod flight;
mod generic;
mod marine;
mod metar;
mod pollution;
mod synop;
mod temp;

/// A template program: the per-report-type rules for building a descriptor skeleton and
/// filling one subset. Pure over its observation input.
pub(crate) trait TemplateProgram: Sync {
    /// The ordered descriptor list for a message holding observations shaped like `obs`.
    fn skeleton(
        &self,
        obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError>;

    /// Fill one subset for `obs`, in exactly the order the skeleton describes.
    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError>;
}

/// One entry of the exporter registry: a report type triple, the observation kind it
/// accepts, and its template program.
pub struct ExporterDefinition {
    /// Data category (BUFR table A).
    pub category: u8,
    /// International data subcategory.
    pub subcategory: u8,
    /// Local data subcategory; the discriminating key of the registry.
    pub local_subcategory: u16,
    /// The observation kind this definition accepts.
    pub kind: ObservationKind,
    program: &'static dyn TemplateProgram,
}

impl ExporterDefinition {
    /// Build the descriptor skeleton for observations shaped like `obs`.
    pub fn skeleton(
        &self,
        obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        self.program.skeleton(obs, encoding)
    }

    /// Fill one subset for `obs`.
    pub fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        self.program.fill(obs, encoding)
    }
}

// Local subcategories of the registry, ECMWF legacy numbering.
const LOCAL_SYNOP_MANUAL: u16 = 1;
const LOCAL_SYNOP_HIGH: u16 = 2;
const LOCAL_SYNOP_AUTO: u16 = 3;
const LOCAL_METAR: u16 = 140;
const LOCAL_SHIP_MANUAL: u16 = 11;
const LOCAL_SHIP_AUTO: u16 = 13;
const LOCAL_BUOY: u16 = 21;
const LOCAL_PILOT: u16 = 91;
const LOCAL_TEMP: u16 = 101;
const LOCAL_TEMP_SHIP: u16 = 102;
const LOCAL_AIREP: u16 = 142;
const LOCAL_AMDAR: u16 = 144;
const LOCAL_ACARS: u16 = 145;
const LOCAL_POLLUTION: u16 = 171;
const LOCAL_GENERIC: u16 = 0;

static REGISTRY: [ExporterDefinition; 15] = [
    ExporterDefinition {
        category: 0,
        subcategory: 255,
        local_subcategory: LOCAL_SYNOP_MANUAL,
        kind: ObservationKind::Synop,
        program: &synop::SYNOP_MANUAL,
    },
    ExporterDefinition {
        category: 0,
        subcategory: 255,
        local_subcategory: LOCAL_SYNOP_HIGH,
        kind: ObservationKind::Synop,
        program: &synop::SYNOP_HIGH,
    },
    ExporterDefinition {
        category: 0,
        subcategory: 255,
        local_subcategory: LOCAL_SYNOP_AUTO,
        kind: ObservationKind::Synop,
        program: &synop::SYNOP_AUTO,
    },
    ExporterDefinition {
        category: 0,
        subcategory: 255,
        local_subcategory: LOCAL_METAR,
        kind: ObservationKind::Metar,
        program: &metar::METAR,
    },
    ExporterDefinition {
        category: 1,
        subcategory: 255,
        local_subcategory: LOCAL_SHIP_MANUAL,
        kind: ObservationKind::Ship,
        program: &marine::SHIP_MANUAL,
    },
    ExporterDefinition {
        category: 1,
        subcategory: 255,
        local_subcategory: LOCAL_SHIP_AUTO,
        kind: ObservationKind::Ship,
        program: &marine::SHIP_AUTO,
    },
    ExporterDefinition {
        category: 1,
        subcategory: 255,
        local_subcategory: LOCAL_BUOY,
        kind: ObservationKind::Buoy,
        program: &marine::BUOY,
    },
    ExporterDefinition {
        category: 2,
        subcategory: 255,
        local_subcategory: LOCAL_PILOT,
        kind: ObservationKind::Pilot,
        program: &temp::PILOT,
    },
    ExporterDefinition {
        category: 2,
        subcategory: 255,
        local_subcategory: LOCAL_TEMP,
        kind: ObservationKind::Temp,
        program: &temp::TEMP,
    },
    ExporterDefinition {
        category: 2,
        subcategory: 255,
        local_subcategory: LOCAL_TEMP_SHIP,
        kind: ObservationKind::TempShip,
        program: &temp::TEMP_SHIP,
    },
    ExporterDefinition {
        category: 4,
        subcategory: 255,
        local_subcategory: LOCAL_AIREP,
        kind: ObservationKind::Airep,
        program: &flight::AIREP,
    },
    ExporterDefinition {
        category: 4,
        subcategory: 255,
        local_subcategory: LOCAL_AMDAR,
        kind: ObservationKind::Amdar,
        program: &flight::AMDAR,
    },
    ExporterDefinition {
        category: 4,
        subcategory: 255,
        local_subcategory: LOCAL_ACARS,
        kind: ObservationKind::Acars,
        program: &flight::ACARS,
    },
    ExporterDefinition {
        category: 8,
        subcategory: 255,
        local_subcategory: LOCAL_POLLUTION,
        kind: ObservationKind::Pollution,
        program: &pollution::POLLUTION,
    },
    ExporterDefinition {
        category: 255,
        subcategory: 255,
        local_subcategory: LOCAL_GENERIC,
        kind: ObservationKind::Generic,
        program: &generic::GENERIC,
    },
];

fn registry_get(category: u16, local_subcategory: u16) -> Option<&'static ExporterDefinition> {
    REGISTRY
        .iter()
        .find(|def| u16::from(def.category) == category && def.local_subcategory == local_subcategory)
}

fn generic_definition() -> &'static ExporterDefinition {
    registry_get(255, LOCAL_GENERIC).unwrap_or(&REGISTRY[REGISTRY.len() - 1])
}

// The manual/automatic split for synop and ship reports: the first character of the
// station type variable selects the subtype, with '1' or an absent variable meaning a
// manned station.
fn station_is_manual(obs: &Observation) -> bool {
    let var = match obs.find_station(engine::codes::B02001) {
        Some(var) => var,
        None => return true,
    };

    let first = match &var.value {
        None => return true,
        Some(Value::Str(s)) => s.chars().next(),
        Some(Value::Int(i)) => i.to_string().chars().next(),
        Some(Value::Float(f)) => (*f as i64).to_string().chars().next(),
    };

    first == Some('1') || first.is_none()
}

fn infer(obs: &Observation) -> &'static ExporterDefinition {
    use crate::observation::ObservationKind::*;

    let (category, local) = match obs.kind {
        Generic | Sat => (255, LOCAL_GENERIC),
        Synop => (
            0,
            if station_is_manual(obs) {
                LOCAL_SYNOP_MANUAL
            } else {
                LOCAL_SYNOP_AUTO
            },
        ),
        Ship => (
            1,
            if station_is_manual(obs) {
                LOCAL_SHIP_MANUAL
            } else {
                LOCAL_SHIP_AUTO
            },
        ),
        Buoy => (1, LOCAL_BUOY),
        Metar => (0, LOCAL_METAR),
        Pilot => (2, LOCAL_PILOT),
        Temp => (2, LOCAL_TEMP),
        TempShip => (2, LOCAL_TEMP_SHIP),
        Airep => (4, LOCAL_AIREP),
        Amdar => (4, LOCAL_AMDAR),
        Acars => (4, LOCAL_ACARS),
        Pollution => (8, LOCAL_POLLUTION),
    };

    registry_get(category, local).unwrap_or_else(generic_definition)
}

/// Resolve the exporter definition for an observation.
///
/// With both `category` and `subcategory` given (non-zero), the registry is searched for
/// an exact match on `(category, local_subcategory)`; an unknown combination silently
/// degrades to the generic definition. With neither given, the triple is inferred from
/// the observation kind. Either way, an observation resolving to the plain synop slot
/// that reports geopotential on an isobaric surface is rerouted to the high-level station
/// variant, which is a template ambiguity workaround rather than a distinct report kind.
pub fn resolve(
    obs: &Observation,
    category: Option<u16>,
    subcategory: Option<u16>,
) -> &'static ExporterDefinition {
    let cat = category.unwrap_or(0);
    let sub = subcategory.unwrap_or(0);

    let def = if cat == 0 && sub == 0 {
        infer(obs)
    } else {
        registry_get(cat, sub).unwrap_or_else(generic_definition)
    };

    if def.category == 0
        && def.local_subcategory == LOCAL_SYNOP_MANUAL
        && synop::isobaric_geopotential_group(obs).is_some()
    {
        if let Some(high) = registry_get(0, LOCAL_SYNOP_HIGH) {
            return high;
        }
    }

    def
}

/// Export a batch of observations of one report kind into a single message.
///
/// The exporter is resolved against the first observation only; all observations in one
/// call are assumed to share a report kind and template. The descriptor skeleton is built
/// once, one subset is filled per observation in input order, and the message nominal
/// date and time are copied from the first observation's station values, leaving absent
/// parts unset. The produced message is checked against its own skeleton before it is
/// returned, so the downstream bit-level codec never sees a malformed message from here.
pub fn export(
    observations: &[Observation],
    encoding: Encoding,
    category: Option<u16>,
    subcategory: Option<u16>,
) -> Result<TargetMessage, ExportError> {
    let first = observations.first().ok_or(ExportError::EmptyBatch)?;

    let def = resolve(first, category, subcategory);

    let mut msg = TargetMessage::new(
        encoding,
        def.category,
        def.subcategory,
        def.local_subcategory,
    );
    msg.descriptors = def.skeleton(first, encoding)?;

    for obs in observations {
        msg.subsets.push(def.fill(obs, encoding)?);
    }

    stamp_nominal_datetime(&mut msg, first);

    msg.validate()?;

    Ok(msg)
}

fn stamp_nominal_datetime(msg: &mut TargetMessage, obs: &Observation) {
    fn part(obs: &Observation, id: FieldId) -> Option<i64> {
        lookup_by_id(obs, id)
            .and_then(|var| var.value.as_ref())
            .and_then(Value::as_i64)
    }

    msg.year = part(obs, FieldId::Year).map(|y| y as i32);
    msg.month = part(obs, FieldId::Month).and_then(|m| if (1..=12).contains(&m) {
        Some(m as u32)
    } else {
        None
    });
    msg.day = part(obs, FieldId::Day).and_then(|d| if (1..=31).contains(&d) {
        Some(d as u32)
    } else {
        None
    });
    msg.hour = part(obs, FieldId::Hour).and_then(|h| if (0..=23).contains(&h) {
        Some(h as u32)
    } else {
        None
    });
    msg.minute = part(obs, FieldId::Minute).and_then(|m| if (0..=59).contains(&m) {
        Some(m as u32)
    } else {
        None
    });
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::{
        export::engine::codes::*,
        observation::{Level, Trange, Variable},
    };

    fn synop_obs(station_type: Option<&str>) -> Observation {
        let mut obs = Observation::new(ObservationKind::Synop);
        if let Some(st) = station_type {
            obs.insert_station(Variable::string(B02001, st));
        }
        obs.insert(
            Level::isobaric(100000),
            Trange::instant(),
            Variable::int(B10004, 100000),
        );
        obs
    }

    #[test]
    fn test_export_empty_batch_fails() {
        assert_eq!(
            export(&[], Encoding::Bufr, None, None).unwrap_err(),
            ExportError::EmptyBatch
        );
    }

    #[test]
    fn test_infer_synop_manual_vs_automatic() {
        let manual = resolve(&synop_obs(Some("1")), None, None);
        assert_eq!(manual.local_subcategory, 1);

        let absent = resolve(&synop_obs(None), None, None);
        assert_eq!(absent.local_subcategory, 1);

        let auto = resolve(&synop_obs(Some("0")), None, None);
        assert_eq!(auto.local_subcategory, 3);
    }

    #[test]
    fn test_infer_ship_split_and_others() {
        let mut ship = Observation::new(ObservationKind::Ship);
        ship.insert_station(Variable::string(B02001, "0"));
        let def = resolve(&ship, None, None);
        assert_eq!((def.category, def.local_subcategory), (1, 13));

        let temp = Observation::new(ObservationKind::Temp);
        let def = resolve(&temp, None, None);
        assert_eq!((def.category, def.local_subcategory), (2, 101));

        let sat = Observation::new(ObservationKind::Sat);
        let def = resolve(&sat, None, None);
        assert_eq!((def.category, def.local_subcategory), (255, 0));
    }

    #[test]
    fn test_unknown_triple_degrades_to_generic() {
        let obs = synop_obs(Some("1"));
        let def = resolve(&obs, Some(77), Some(912));
        assert_eq!(def.kind, ObservationKind::Generic);
        assert_eq!((def.category, def.local_subcategory), (255, 0));
    }

    #[test]
    fn test_explicit_triple_lookup() {
        let obs = Observation::new(ObservationKind::Metar);
        let def = resolve(&obs, Some(0), Some(140));
        assert_eq!(def.kind, ObservationKind::Metar);
    }

    #[test]
    fn test_high_level_station_substitution() {
        let mut obs = synop_obs(Some("1"));
        obs.insert(
            Level::isobaric(85000),
            Trange::instant(),
            Variable::float(B10003, 14230.0),
        );

        let def = resolve(&obs, None, None);
        assert_eq!(def.local_subcategory, 2);

        // Explicit requests for other slots are left alone.
        let def = resolve(&obs, Some(0), Some(3));
        assert_eq!(def.local_subcategory, 3);
    }

    #[test]
    fn test_round_trip_scenario() {
        // Manual synop with a station pressure of 100000 Pa, inferred triple, BUFR.
        let obs = synop_obs(Some("1"));
        let msg = export(&[obs], Encoding::Bufr, Some(0), Some(0)).unwrap();

        assert_eq!(msg.category, 0);
        assert_eq!(msg.local_subcategory, 1);
        assert_eq!(msg.edition, 4);
        assert_eq!(msg.subsets.len(), 1);

        // Identification (3) + date/time (5) + position (2) + height (1) precede the
        // station pressure slot.
        let slot = &msg.subsets[0].slots[11];
        assert_eq!(slot.code, B10004);
        assert_eq!(slot.value, Some(crate::observation::Value::Int(100000)));

        msg.validate().unwrap();
    }

    #[test]
    fn test_nominal_datetime_stamping() {
        let mut obs = synop_obs(Some("1"));
        obs.insert_station(Variable::int(B04001, 2009));
        obs.insert_station(Variable::int(B04002, 2));
        obs.insert_station(Variable::int(B04003, 13));
        obs.insert_station(Variable::int(B04004, 23));

        let msg = export(&[obs], Encoding::Bufr, None, None).unwrap();

        assert_eq!(msg.year, Some(2009));
        assert_eq!(msg.month, Some(2));
        assert_eq!(msg.day, Some(13));
        assert_eq!(msg.hour, Some(23));
        // The minute was never reported and must stay unset rather than default to zero.
        assert_eq!(msg.minute, None);
        assert!(msg.nominal_datetime().is_none());
    }

    #[test]
    fn test_export_is_deterministic() {
        let obs = synop_obs(Some("1"));
        let a = export(&[obs.clone()], Encoding::Bufr, None, None).unwrap();
        let b = export(&[obs], Encoding::Bufr, None, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_multiple_subsets_share_one_skeleton() {
        let batch = vec![synop_obs(Some("1")), synop_obs(Some("1"))];
        let msg = export(&batch, Encoding::Crex, None, None).unwrap();

        assert_eq!(msg.subsets.len(), 2);
        assert_eq!(msg.subsets[0].slots.len(), msg.subsets[1].slots.len());
        msg.validate().unwrap();
    }

    #[test]
    fn test_crex_skeleton_has_no_quality_section() {
        let obs = synop_obs(Some("1"));
        let msg = export(&[obs], Encoding::Crex, None, None).unwrap();

        assert!(msg.descriptors.iter().all(|d| *d != C22000));
        assert!(msg.subsets[0].slots.iter().all(|s| s.code != B33007));
        assert_eq!(msg.edition, 2);
    }
}
