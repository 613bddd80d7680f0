//! Chemical pollutant concentration reports.
//!
//! Unlike the weather templates, pollution export requires its payload: exactly one
//! class 15 concentration variable. Absence is a hard error, and two candidates are an
//! ambiguity error rather than a silent pick.

use crate::{
    descriptor::{DescriptorClass, DescriptorCode},
    errors::ExportError,
    export::{
        engine::{self, codes::*, FieldId, SubsetBuilder},
        TemplateProgram,
    },
    message::{Encoding, Subset},
    observation::{Datum, Observation},
};

pub(crate) struct Pollution;

pub(crate) static POLLUTION: Pollution = Pollution;

/// Find the single concentration datum of a pollution observation.
///
/// Shared by the skeleton build (which needs the pollutant's own descriptor code) and the
/// fill (which stores its value and averaging period), so the two cannot disagree.
fn concentration(obs: &Observation) -> Result<&Datum, ExportError> {
    let mut found: Option<&Datum> = None;

    for group in obs.levels.iter().filter(|g| !g.level.is_station()) {
        for datum in &group.data {
            if datum.var.code.class == DescriptorClass::Element && datum.var.code.x == 15 {
                if let Some(first) = found {
                    return Err(ExportError::AmbiguousValue(first.var.code, datum.var.code));
                }
                found = Some(datum);
            }
        }
    }

    found.ok_or(ExportError::MissingRequired("pollutant concentration"))
}

impl TemplateProgram for Pollution {
    fn skeleton(
        &self,
        obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        let datum = concentration(obs)?;

        let mut d = Vec::with_capacity(16);

        d.push(B01019);
        d.extend_from_slice(&engine::DATETIME_DESCRIPTORS);
        d.extend_from_slice(&engine::POSITION_DESCRIPTORS);
        d.push(B07030);
        d.push(B04086);
        d.push(datum.var.code);

        engine::push_quality_descriptors(&mut d, encoding);

        Ok(d)
    }

    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        let datum = concentration(obs)?;

        let mut b = SubsetBuilder::new(encoding);

        b.store(B01019, obs.find_any(B01019));
        engine::fill_datetime(&mut b, obs);
        engine::fill_position(&mut b, obs);
        b.store_field(obs, FieldId::StationHeight);

        // Averaging period of the measurement, from the datum's own time range.
        b.store_opt_i(B04086, datum.trange.p2);

        b.store(datum.var.code, Some(&datum.var));

        b.append_quality_section();

        Ok(b.finish())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
