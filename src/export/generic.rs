//! The generic fallback exporter.
//!
//! Where the fixed templates encode meaning by position, the generic exporter encodes it
//! explicitly: every datum goes out as its level and time range context, spelled through
//! local descriptors, followed by the variable under its own code. Any observation shape
//! survives, at the cost of verbosity, which is what makes this the safe target for
//! unknown report type triples.

use crate::{
    descriptor::DescriptorCode,
    errors::ExportError,
    export::{
        engine::{self, SubsetBuilder},
        TemplateProgram,
    },
    message::{Encoding, Subset},
    observation::Observation,
};

pub(crate) struct Generic;

pub(crate) static GENERIC: Generic = Generic;

// Local context descriptors: level type and values, then time range.
const B07192: DescriptorCode = DescriptorCode::element(7, 192);
const B07193: DescriptorCode = DescriptorCode::element(7, 193);
const B07194: DescriptorCode = DescriptorCode::element(7, 194);
const B07195: DescriptorCode = DescriptorCode::element(7, 195);
const B04192: DescriptorCode = DescriptorCode::element(4, 192);
const B04193: DescriptorCode = DescriptorCode::element(4, 193);
const B04194: DescriptorCode = DescriptorCode::element(4, 194);

const CONTEXT_DESCRIPTORS: [DescriptorCode; 7] =
    [B07192, B07193, B07194, B07195, B04192, B04193, B04194];

impl TemplateProgram for Generic {
    fn skeleton(
        &self,
        obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        let mut d = vec![];

        for group in &obs.levels {
            for datum in &group.data {
                d.extend_from_slice(&CONTEXT_DESCRIPTORS);
                d.push(datum.var.code);
            }
        }

        engine::push_quality_descriptors(&mut d, encoding);

        Ok(d)
    }

    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        let mut b = SubsetBuilder::new(encoding);

        for group in &obs.levels {
            for datum in &group.data {
                b.store_opt_i(B07192, group.level.ltype1);
                b.store_opt_i(B07193, group.level.l1);
                b.store_opt_i(B07194, group.level.ltype2);
                b.store_opt_i(B07195, group.level.l2);
                b.store_opt_i(B04192, datum.trange.pind);
                b.store_opt_i(B04193, datum.trange.p1);
                b.store_opt_i(B04194, datum.trange.p2);
                b.store(datum.var.code, Some(&datum.var));
            }
        }

        b.append_quality_section();

        Ok(b.finish())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
