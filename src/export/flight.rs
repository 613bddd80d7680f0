//! Single level upper air reports from aircraft: airep, amdar, and acars.
//!
//! A flight report hangs all its data off one derived level key: a reported pressure
//! converted to an isobaric level when present, otherwise a reported height as an
//! altitude level. With neither reading the report cannot be placed vertically and the
//! export fails.

use crate::{
    descriptor::DescriptorCode,
    errors::ExportError,
    export::{
        engine::{self, codes::*, SubsetBuilder},
        TemplateProgram,
    },
    message::{Encoding, Subset},
    observation::{Level, Observation, Trange, Value},
};

#[derive(Clone, Copy, PartialEq)]
enum Variant {
    Airep,
    Amdar,
    Acars,
}

pub(crate) struct Flight {
    variant: Variant,
}

pub(crate) static AIREP: Flight = Flight {
    variant: Variant::Airep,
};
pub(crate) static AMDAR: Flight = Flight {
    variant: Variant::Amdar,
};
pub(crate) static ACARS: Flight = Flight {
    variant: Variant::Acars,
};

/// Derive the level key of a flight observation.
///
/// Called from both the skeleton build (to pick the level slot descriptor) and the fill
/// (to pick the lookup level and the stored value), so the two cannot disagree. The level
/// key reuses the reading's raw integer value.
pub(crate) fn flight_level(obs: &Observation) -> Result<(DescriptorCode, Level, Value), ExportError> {
    if let Some(p) = obs
        .find_any(B10004)
        .and_then(|var| var.value.as_ref())
        .and_then(Value::as_i64)
    {
        return Ok((B07004, Level::isobaric(p as i32), Value::Int(p)));
    }

    if let Some(h) = obs
        .find_any(B07002)
        .and_then(|var| var.value.as_ref())
        .and_then(Value::as_i64)
    {
        return Ok((B07002, Level::height(h as i32), Value::Int(h)));
    }

    Err(ExportError::NoLevelKey)
}

impl TemplateProgram for Flight {
    fn skeleton(
        &self,
        obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        let (level_code, _, _) = flight_level(obs)?;

        let mut d = Vec::with_capacity(20);

        d.push(B01006);
        if self.variant == Variant::Acars {
            d.push(B01008);
        }
        d.extend_from_slice(&engine::DATETIME_DESCRIPTORS);
        d.extend_from_slice(&engine::POSITION_DESCRIPTORS);

        d.push(B08004);
        d.push(level_code);

        d.push(B12001);
        if self.variant == Variant::Acars {
            d.push(B13002);
        }
        d.push(B11001);
        d.push(B11002);
        if self.variant == Variant::Amdar {
            d.push(B11031);
            d.push(B20041);
        }

        engine::push_quality_descriptors(&mut d, encoding);

        Ok(d)
    }

    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        let (level_code, level, level_value) = flight_level(obs)?;
        let whenever = Trange::any();

        let mut b = SubsetBuilder::new(encoding);

        b.store(B01006, obs.find_any(B01006));
        if self.variant == Variant::Acars {
            b.store(B01008, obs.find_any(B01008));
        }
        engine::fill_datetime(&mut b, obs);
        engine::fill_position(&mut b, obs);

        b.store(B08004, obs.find_any(B08004));
        b.store_value(level_code, level_value);

        b.store(B12001, obs.find(B12001, &level, &whenever));
        if self.variant == Variant::Acars {
            b.store(B13002, obs.find(B13002, &level, &whenever));
        }
        b.store(B11001, obs.find(B11001, &level, &whenever));
        b.store(B11002, obs.find(B11002, &level, &whenever));
        if self.variant == Variant::Amdar {
            b.store(B11031, obs.find(B11031, &level, &whenever));
            b.store(B20041, obs.find(B20041, &level, &whenever));
        }

        b.append_quality_section();

        Ok(b.finish())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
