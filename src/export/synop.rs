//! Surface land station reports: synop, in manual, automatic and high-level variants.
//!
//! The high-level variant exists to work around a template ambiguity: a mountain station
//! reporting geopotential on a standard isobaric surface does not fit the mean sea level
//! slot of the plain template, so the registry reroutes it here.

use crate::{
    descriptor::DescriptorCode,
    errors::ExportError,
    export::{
        engine::{self, codes::*, SubsetBuilder},
        TemplateProgram,
    },
    message::{Encoding, Subset},
    observation::{Level, LevelGroup, Observation, Trange},
};

pub(crate) struct Synop {
    automatic: bool,
    high_level: bool,
}

pub(crate) static SYNOP_MANUAL: Synop = Synop {
    automatic: false,
    high_level: false,
};
pub(crate) static SYNOP_AUTO: Synop = Synop {
    automatic: true,
    high_level: false,
};
pub(crate) static SYNOP_HIGH: Synop = Synop {
    automatic: false,
    high_level: true,
};

// Longest accumulation period present wins.
const PRECIPITATION_PREFERENCE: [DescriptorCode; 5] = [B13023, B13022, B13021, B13020, B13019];

/// The precipitation descriptor this observation's data select.
///
/// Both the skeleton build and the subset fill call this one function, so the chosen
/// descriptor and the stored slot cannot diverge. With no accumulation present at all the
/// 24 hour slot is emitted, to be filled with an explicit missing marker.
pub(crate) fn precipitation_code(obs: &Observation) -> DescriptorCode {
    PRECIPITATION_PREFERENCE
        .iter()
        .copied()
        .find(|code| obs.find_any(*code).is_some())
        .unwrap_or(B13023)
}

/// The first isobaric surface group reporting geopotential, if any.
///
/// Its presence is what reroutes a synop to the high-level station variant, and the
/// high-level fill reads its pressure and geopotential from the same group.
pub(crate) fn isobaric_geopotential_group(obs: &Observation) -> Option<&LevelGroup> {
    obs.levels
        .iter()
        .find(|g| g.level.ltype1 == Some(100) && g.find(B10003).is_some())
}

const CLOUD_GROUP_COUNT: u16 = 4;

impl TemplateProgram for Synop {
    fn skeleton(
        &self,
        obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        let mut d = Vec::with_capacity(48);

        d.extend_from_slice(&engine::WMO_STATION_DESCRIPTORS);
        d.extend_from_slice(&engine::DATETIME_DESCRIPTORS);
        d.extend_from_slice(&engine::POSITION_DESCRIPTORS);
        d.push(B07030);

        d.push(B10004);
        if self.high_level {
            d.push(B07004);
            d.push(B10003);
        } else {
            d.push(B10051);
        }
        d.push(B10061);
        d.push(B10063);

        d.push(B11001);
        d.push(B11002);

        d.push(B12001);
        d.push(B12003);
        d.push(B13003);

        d.push(B20001);
        if !self.automatic {
            d.push(B20003);
            d.push(B20004);
            d.push(B20005);
        }

        d.push(precipitation_code(obs));

        d.push(B20010);

        // Cloud base section, then the four individual cloud layer groups.
        d.push(B08002);
        d.push(B20011);
        d.push(B20013);
        d.push(B20012);

        d.push(DescriptorCode::replication(4, CLOUD_GROUP_COUNT));
        d.push(B08002);
        d.push(B20011);
        d.push(B20012);
        d.push(B20013);

        engine::push_quality_descriptors(&mut d, encoding);

        Ok(d)
    }

    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        let mut b = SubsetBuilder::new(encoding);
        let whenever = Trange::any();

        engine::fill_wmo_station(&mut b, obs);
        engine::fill_datetime(&mut b, obs);
        engine::fill_position(&mut b, obs);
        b.store_field(obs, engine::FieldId::StationHeight);

        b.store(B10004, obs.find_any(B10004));
        if self.high_level {
            match isobaric_geopotential_group(obs) {
                Some(group) => {
                    b.store_opt_i(B07004, group.level.l1);
                    b.store(B10003, group.find(B10003));
                }
                None => {
                    b.store_missing(B07004);
                    b.store_missing(B10003);
                }
            }
        } else {
            b.store(B10051, obs.find_any(B10051));
        }
        b.store(B10061, obs.find_any(B10061));
        b.store(B10063, obs.find_any(B10063));

        b.store(B11001, obs.find_any(B11001));
        b.store(B11002, obs.find_any(B11002));

        b.store(B12001, obs.find_any(B12001));
        b.store(B12003, obs.find_any(B12003));
        b.store(B13003, obs.find_any(B13003));

        b.store(B20001, obs.find_any(B20001));
        if !self.automatic {
            b.store(B20003, obs.find_any(B20003));
            b.store(B20004, obs.find_any(B20004));
            b.store(B20005, obs.find_any(B20005));
        }

        let precip = precipitation_code(obs);
        b.store(precip, obs.find_any(precip));

        b.store(B20010, obs.find_any(B20010));

        let base = Level::cloud(0);
        b.store(B08002, obs.find(B08002, &base, &whenever));
        b.store(B20011, obs.find(B20011, &base, &whenever));
        b.store(B20013, obs.find(B20013, &base, &whenever));
        b.store(B20012, obs.find(B20012, &base, &whenever));

        for n in 1..=i64::from(CLOUD_GROUP_COUNT) {
            let layer = Level::cloud(n as i32);
            // The vertical significance of each layer group is a template constant, not
            // data.
            b.store_i(B08002, n);
            b.store(B20011, obs.find(B20011, &layer, &whenever));
            b.store(B20012, obs.find(B20012, &layer, &whenever));
            b.store(B20013, obs.find(B20013, &layer, &whenever));
        }

        b.append_quality_section();

        Ok(b.finish())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
