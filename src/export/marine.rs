//! Surface sea station reports: ship (manual and automatic) and buoy.

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

pub(crate) struct Ship {
    automatic: bool,
}

pub(crate) struct Buoy;

pub(crate) static SHIP_MANUAL: Ship = Ship { automatic: false };
pub(crate) static SHIP_AUTO: Ship = Ship { automatic: true };
pub(crate) static BUOY: Buoy = Buoy;

const SEA_DESCRIPTORS: [DescriptorCode; 3] = [B22011, B22021, B22042];

impl TemplateProgram for Ship {
    fn skeleton(
        &self,
        _obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        let mut d = Vec::with_capacity(32);

        d.push(B01011);
        d.push(B01012);
        d.push(B01013);
        d.push(B02001);
        d.extend_from_slice(&engine::DATETIME_DESCRIPTORS);
        d.extend_from_slice(&engine::POSITION_DESCRIPTORS);

        d.push(B10004);
        d.push(B10051);
        d.push(B11001);
        d.push(B11002);
        d.push(B12001);
        d.push(B12003);

        if !self.automatic {
            d.push(B20001);
            d.push(B20003);
            d.push(B20004);
            d.push(B20005);
        }

        d.extend_from_slice(&SEA_DESCRIPTORS);

        engine::push_quality_descriptors(&mut d, encoding);

        Ok(d)
    }

    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        let mut b = SubsetBuilder::new(encoding);

        b.store_field(obs, FieldId::Ident);
        b.store(B01012, obs.find_any(B01012));
        b.store(B01013, obs.find_any(B01013));
        b.store_field(obs, FieldId::StationType);
        engine::fill_datetime(&mut b, obs);
        engine::fill_position(&mut b, obs);

        b.store(B10004, obs.find_any(B10004));
        b.store(B10051, obs.find_any(B10051));
        b.store(B11001, obs.find_any(B11001));
        b.store(B11002, obs.find_any(B11002));
        b.store(B12001, obs.find_any(B12001));
        b.store(B12003, obs.find_any(B12003));

        if !self.automatic {
            b.store(B20001, obs.find_any(B20001));
            b.store(B20003, obs.find_any(B20003));
            b.store(B20004, obs.find_any(B20004));
            b.store(B20005, obs.find_any(B20005));
        }

        for code in &SEA_DESCRIPTORS {
            b.store(*code, obs.find_any(*code));
        }

        b.append_quality_section();

        Ok(b.finish())
    }
}

impl TemplateProgram for Buoy {
    fn skeleton(
        &self,
        _obs: &Observation,
        encoding: Encoding,
    ) -> Result<Vec<DescriptorCode>, ExportError> {
        let mut d = Vec::with_capacity(22);

        d.push(B01005);
        d.push(B02001);
        d.extend_from_slice(&engine::DATETIME_DESCRIPTORS);
        d.extend_from_slice(&engine::POSITION_DESCRIPTORS);

        d.push(B10004);
        d.push(B10051);
        d.push(B11001);
        d.push(B11002);
        d.push(B12001);
        d.push(B22042);

        engine::push_quality_descriptors(&mut d, encoding);

        Ok(d)
    }

    fn fill(&self, obs: &Observation, encoding: Encoding) -> Result<Subset, ExportError> {
        let mut b = SubsetBuilder::new(encoding);

        b.store(B01005, obs.find_any(B01005));
        b.store_field(obs, FieldId::StationType);
        engine::fill_datetime(&mut b, obs);
        engine::fill_position(&mut b, obs);

        b.store(B10004, obs.find_any(B10004));
        b.store(B10051, obs.find_any(B10051));
        b.store(B11001, obs.find_any(B11001));
        b.store(B11002, obs.find_any(B11002));
        b.store(B12001, obs.find_any(B12001));
        b.store(B22042, obs.find_any(B22042));

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

    fn ship_obs(station_type: &str) -> Observation {
        let mut obs = Observation::new(ObservationKind::Ship);
        obs.insert_station(Variable::string(B01011, "DFLN"));
        obs.insert_station(Variable::string(B02001, station_type));
        obs.insert(
            Level::new(1, 0),
            Trange::instant(),
            Variable::float(B22042, 288.2),
        );
        obs
    }

    #[test]
    fn test_ship_manual_vs_automatic() {
        let manual = export(&[ship_obs("1")], Encoding::Bufr, None, None).unwrap();
        assert_eq!((manual.category, manual.local_subcategory), (1, 11));
        assert!(manual.descriptors.contains(&B20003));

        let auto = export(&[ship_obs("0")], Encoding::Bufr, None, None).unwrap();
        assert_eq!((auto.category, auto.local_subcategory), (1, 13));
        assert!(!auto.descriptors.contains(&B20003));

        manual.validate().unwrap();
        auto.validate().unwrap();
    }

    #[test]
    fn test_ship_sea_temperature() {
        let msg = export(&[ship_obs("1")], Encoding::Crex, None, None).unwrap();
        let sea = msg.subsets[0]
            .slots
            .iter()
            .find(|s| s.code == B22042)
            .unwrap();
        assert_eq!(sea.value, Some(Value::Float(288.2)));
    }

    #[test]
    fn test_buoy_export() {
        let mut obs = Observation::new(ObservationKind::Buoy);
        obs.insert_station(Variable::int(B01005, 61234));
        obs.insert(
            Level::height(10000),
            Trange::instant(),
            Variable::float(B11002, 7.7),
        );

        let msg = export(&[obs], Encoding::Bufr, None, None).unwrap();
        assert_eq!((msg.category, msg.local_subcategory), (1, 21));

        let ident = &msg.subsets[0].slots[0];
        assert_eq!(ident.code, B01005);
        assert_eq!(ident.value, Some(Value::Int(61234)));

        // Waves are not part of the buoy template.
        assert!(msg.descriptors.iter().all(|d| *d != B22021));
        msg.validate().unwrap();
    }
}
