use std::sync::Arc;

use h3o::{CellIndex, LatLng, Resolution};

use crate::{config::CodeRange, types::{AgeBracket, Gender}};

/// One end of a trip leg.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Endpoint {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Administrative (department) code of the location.
    pub admin_code: Option<f64>,
}

impl Endpoint {
    pub fn new(lat: f64, lon: f64, admin_code: f64) -> Self {
        Self { lat: Some(lat), lon: Some(lon), admin_code: Some(admin_code) }
    }

    /// True when the administrative code falls in the city range.
    #[inline]
    pub fn in_city(&self, codes: &CodeRange) -> bool {
        self.admin_code.is_some_and(|code| codes.contains(code))
    }

    /// Locate the endpoint at `fine` and roll it up to `target`.
    /// Missing or non-finite coordinates yield no cell.
    pub fn locate(&self, fine: Resolution, target: Resolution) -> Option<CellIndex> {
        let latlng = LatLng::new(self.lat?, self.lon?).ok()?;
        latlng.to_cell(fine).parent(target)
    }
}

/// A single public-transport trip leg as published in the raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct TripLeg {
    pub card_id: Option<Arc<str>>,
    pub expansion_factor: Option<f64>,
    pub age: AgeBracket,
    pub gender: Gender,
    pub origin: Endpoint,
    pub destination: Endpoint,
}

impl TripLeg {
    /// Card id and expansion factor, if the leg carries both.
    pub(super) fn weight(&self) -> Option<(&Arc<str>, f64)> {
        let card = self.card_id.as_ref().filter(|card| !card.trim().is_empty())?;
        let factor = self.expansion_factor.filter(|factor| factor.is_finite())?;
        Some((card, factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_roll_up_to_the_target_resolution() {
        let endpoint = Endpoint::new(-34.6037, -58.3816, 2001.0);
        let cell = endpoint.locate(Resolution::Ten, Resolution::Nine).unwrap();
        assert_eq!(cell.resolution(), Resolution::Nine);
        assert_eq!(cell, LatLng::new(-34.6037, -58.3816).unwrap().to_cell(Resolution::Ten).parent(Resolution::Nine).unwrap());
    }

    #[test]
    fn missing_coordinates_have_no_cell() {
        let endpoint = Endpoint { lat: None, lon: Some(-58.38), admin_code: Some(2001.0) };
        assert!(endpoint.locate(Resolution::Ten, Resolution::Nine).is_none());

        let endpoint = Endpoint { lat: Some(f64::NAN), ..Endpoint::new(0.0, -58.38, 2001.0) };
        assert!(endpoint.locate(Resolution::Ten, Resolution::Nine).is_none());
    }

    #[test]
    fn city_membership_uses_the_code_range() {
        let codes = CodeRange::default();
        assert!(Endpoint::new(0.0, 0.0, 2000.0).in_city(&codes));
        assert!(!Endpoint::new(0.0, 0.0, 6000.0).in_city(&codes));
        assert!(!Endpoint { admin_code: None, ..Endpoint::default() }.in_city(&codes));
    }
}
