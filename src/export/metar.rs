//! Aerodrome routine reports: metar.

use crate::{
    descriptor::DescriptorCode,
    errors::ExportError,
    export::{
        engine::{self, codes::*, FieldId, SubsetBuilder},
        TemplateProgram,
    },
    message::{Encoding, Subset},
    observation::Observation,
};

pub(crate) struct Metar;

pub(crate) static METAR: Metar = Metar;

const BODY_DESCRIPTORS: [DescriptorCode; 9] = [
    B11001, B11002, B11041, B20001, B12001, B12003, B10052, B10004, B20003,
];

impl TemplateProgram for Metar {
    fn skeleton(
        &self,
        _obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        let mut d = Vec::with_capacity(22);

        d.push(B01063);
        d.extend_from_slice(&engine::DATETIME_DESCRIPTORS);
        d.extend_from_slice(&engine::POSITION_DESCRIPTORS);
        d.push(B07030);
        d.extend_from_slice(&BODY_DESCRIPTORS);

        engine::push_quality_descriptors(&mut d, encoding);

        Ok(d)
    }

    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        let mut b = SubsetBuilder::new(encoding);

        b.store(B01063, obs.find_any(B01063));
        engine::fill_datetime(&mut b, obs);
        engine::fill_position(&mut b, obs);
        b.store_field(obs, FieldId::StationHeight);

        for code in &BODY_DESCRIPTORS {
            b.store(*code, obs.find_any(*code));
        }

        b.append_quality_section();

        Ok(b.finish())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::{
        export::export,
        observation::{Level, ObservationKind, Trange, Value, Variable},
    };

    #[test]
    fn test_metar_export() {
        let mut obs = Observation::new(ObservationKind::Metar);
        obs.insert_station(Variable::string(B01063, "LIRF"));
        obs.insert(
            Level::height(10000),
            Trange::instant(),
            Variable::int(B11001, 240),
        );
        obs.insert(
            Level::height(10000),
            Trange::instant(),
            Variable::float(B11002, 4.6),
        );

        let msg = export(&[obs], Encoding::Bufr, None, None).unwrap();
        assert_eq!(msg.category, 0);
        assert_eq!(msg.local_subcategory, 140);

        let ident = &msg.subsets[0].slots[0];
        assert_eq!(ident.code, B01063);
        assert_eq!(ident.value, Some(Value::Str("LIRF".to_owned())));

        let gust = msg.subsets[0]
            .slots
            .iter()
            .find(|s| s.code == B11041)
            .unwrap();
        assert!(gust.value.is_none());

        msg.validate().unwrap();
    }

    #[test]
    fn test_metar_crex_skeleton_length() {
        let obs = Observation::new(ObservationKind::Metar);

        let bufr = METAR.skeleton(&obs, Encoding::Bufr).unwrap();
        let crex = METAR.skeleton(&obs, Encoding::Crex).unwrap();

        assert_eq!(bufr.len(), crex.len() + 7);
        assert!(crex.iter().all(|d| *d != C22000));
    }
}
