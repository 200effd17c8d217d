use serde::{Deserialize, Serialize};

use crate::domain::types::{CityId, CityName, CountryId};

/// City row as served by the `api/Cities` endpoints.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: i32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country_id: i32,
    /// Name of the owning country, only present in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
}

/// Validated city payload used for create/update calls and duplicate checks.
#[derive(Clone, Debug, PartialEq)]
pub struct NewCity {
    pub name: CityName,
    pub lat: f64,
    pub lon: f64,
    pub country_id: CountryId,
}

impl NewCity {
    #[must_use]
    pub fn new(name: CityName, lat: f64, lon: f64, country_id: CountryId) -> Self {
        Self {
            name,
            lat,
            lon,
            country_id,
        }
    }

    /// Builds the wire representation. The server expects id `0` for a city
    /// that does not exist yet.
    pub fn to_city(&self, id: Option<CityId>) -> City {
        City {
            id: id.map_or(0, CityId::get),
            name: self.name.as_str().to_string(),
            lat: self.lat,
            lon: self.lon,
            country_id: self.country_id.get(),
            country_name: None,
        }
    }
}
