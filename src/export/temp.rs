//! Upper air sounding reports: temp, temp ship, and pilot.
//!
//! All three share the replicated layer algorithm: count the qualifying sounding levels,
//! store the count, then emit one fixed block of slots per level. A level qualifies when
//! it sits on an isobaric surface and carries a vertical sounding significance. Temp
//! family messages order their layers by decreasing pressure no matter how the import
//! step inserted them; pilot keeps storage order. Consumers rely on that ordering, so it
//! is an invariant, not a presentation choice.

use crate::{
    descriptor::DescriptorCode,
    errors::ExportError,
    export::{
        engine::{self, codes::*, FieldId, SubsetBuilder},
        TemplateProgram,
    },
    message::{Encoding, Subset},
    observation::{LevelGroup, Observation},
};

pub(crate) struct Temp {
    ship: bool,
}

pub(crate) struct Pilot;

pub(crate) static TEMP: Temp = Temp { ship: false };
pub(crate) static TEMP_SHIP: Temp = Temp { ship: true };
pub(crate) static PILOT: Pilot = Pilot;

// The repeated per-level block of the temp family.
const TEMP_LEVEL_DESCRIPTORS: [DescriptorCode; 6] = [B07004, B08001, B12001, B12003, B11001, B11002];
// Pilot levels report wind only.
const PILOT_LEVEL_DESCRIPTORS: [DescriptorCode; 4] = [B07004, B08001, B11001, B11002];

fn sounding_groups(obs: &Observation) -> Vec<&LevelGroup> {
    obs.levels
        .iter()
        .filter(|g| g.level.ltype1 == Some(100) && g.find(B08001).is_some())
        .collect()
}

// The pressure that orders a sounding level: an explicit pressure variable wins over the
// level's own key.
fn pressure_key(group: &LevelGroup) -> f64 {
    group
        .find(B10004)
        .and_then(|var| var.value.as_ref())
        .and_then(crate::observation::Value::as_f64)
        .or_else(|| group.level.l1.map(f64::from))
        .unwrap_or(std::f64::NEG_INFINITY)
}

fn fill_level(builder: &mut SubsetBuilder, group: &LevelGroup, descriptors: &[DescriptorCode]) {
    // The leading pressure slot prefers an explicit pressure variable, falling back to
    // the level key itself.
    match group.find(B10004) {
        Some(var) => builder.store(B07004, Some(var)),
        None => builder.store_opt_i(B07004, group.level.l1),
    }

    for code in &descriptors[1..] {
        builder.store(*code, group.find(*code));
    }
}

fn sounding_skeleton(
    identification: &[DescriptorCode],
    level_block: &[DescriptorCode],
    encoding: Encoding,
) -> Vec<DescriptorCode> {
    let mut d = Vec::with_capacity(identification.len() + level_block.len() + 18);

    d.extend_from_slice(identification);
    d.extend_from_slice(&engine::DATETIME_DESCRIPTORS);
    d.extend_from_slice(&engine::POSITION_DESCRIPTORS);
    d.push(B07030);

    d.push(DescriptorCode::replication(level_block.len() as u8, 0));
    d.push(B31002);
    d.extend_from_slice(level_block);

    engine::push_quality_descriptors(&mut d, encoding);

    d
}

impl TemplateProgram for Temp {
    fn skeleton(
        &self,
        _obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        let identification: &[DescriptorCode] = if self.ship {
            &[B01011, B02011]
        } else {
            &[B01001, B01002, B02011]
        };

        Ok(sounding_skeleton(
            identification,
            &TEMP_LEVEL_DESCRIPTORS,
            encoding,
        ))
    }

    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        let mut b = SubsetBuilder::new(encoding);

        if self.ship {
            b.store_field(obs, FieldId::Ident);
        } else {
            b.store_field(obs, FieldId::Block);
            b.store_field(obs, FieldId::Station);
        }
        b.store(B02011, obs.find_any(B02011));

        engine::fill_datetime(&mut b, obs);
        engine::fill_position(&mut b, obs);
        b.store_field(obs, FieldId::StationHeight);

        let mut groups = sounding_groups(obs);
        // Highest pressure (lowest altitude) first.
        groups.sort_by(|a, b| {
            pressure_key(b)
                .partial_cmp(&pressure_key(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        b.store_i(B31002, groups.len() as i64);
        for group in groups {
            fill_level(&mut b, group, &TEMP_LEVEL_DESCRIPTORS);
        }

        b.append_quality_section();

        Ok(b.finish())
    }
}

impl TemplateProgram for Pilot {
    fn skeleton(
        &self,
        _obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        Ok(sounding_skeleton(
            &[B01001, B01002, B02011],
            &PILOT_LEVEL_DESCRIPTORS,
            encoding,
        ))
    }

    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        let mut b = SubsetBuilder::new(encoding);

        b.store_field(obs, FieldId::Block);
        b.store_field(obs, FieldId::Station);
        b.store(B02011, obs.find_any(B02011));

        engine::fill_datetime(&mut b, obs);
        engine::fill_position(&mut b, obs);
        b.store_field(obs, FieldId::StationHeight);

        // Pilot layers go out in storage order.
        let groups = sounding_groups(obs);

        b.store_i(B31002, groups.len() as i64);
        for group in groups {
            fill_level(&mut b, group, &PILOT_LEVEL_DESCRIPTORS);
        }

        b.append_quality_section();

        Ok(b.finish())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
