use serde::{Deserialize, Serialize};

use crate::domain::types::{CountryId, CountryName, IsoCode};

/// Country row as served by the `api/Countries` endpoints.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: i32,
    pub name: String,
    pub iso2: String,
    pub iso3: String,
    /// Number of cities referencing this country, only present in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cities: Option<i32>,
}

/// Validated country payload used for create/update calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCountry {
    pub name: CountryName,
    pub iso2: IsoCode,
    pub iso3: IsoCode,
}

impl NewCountry {
    #[must_use]
    pub fn new(name: CountryName, iso2: IsoCode, iso3: IsoCode) -> Self {
        Self { name, iso2, iso3 }
    }

    /// Builds the wire representation, `0` standing for a new country.
    pub fn to_country(&self, id: Option<CountryId>) -> Country {
        Country {
            id: id.map_or(0, CountryId::get),
            name: self.name.as_str().to_string(),
            iso2: self.iso2.as_str().to_string(),
            iso3: self.iso3.as_str().to_string(),
            total_cities: None,
        }
    }
}
