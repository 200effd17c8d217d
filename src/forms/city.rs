use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::Validate;

use crate::domain::city::{City, NewCity};
use crate::domain::types::{CityName, CountryId, parse_coordinate};
use crate::domain::validation::ValidationIntent;
use crate::forms::FormError;

static COORDINATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]+(\.[0-9]{1,4})?$").expect("unable to compile coordinate regex")
});

/// Field name of the record-level duplicate check.
pub const CITY_CHECK: &str = "city";

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Form data for creating or editing a city.
pub struct CityForm {
    #[validate(length(min = 1))]
    pub name: String,
    /// Latitude with at most four decimals.
    #[validate(regex(path = *COORDINATE_RE))]
    pub lat: String,
    #[validate(regex(path = *COORDINATE_RE))]
    pub lon: String,
    /// Selected country, `None` until the user picks one.
    #[validate(required)]
    pub country_id: Option<i32>,
}

impl CityForm {
    pub const FIELDS: [&'static str; 4] = ["name", "lat", "lon", "country_id"];

    /// Validates the form and converts it into a [`NewCity`] payload.
    pub fn to_new_city(&self) -> Result<NewCity, FormError> {
        self.validate()?;
        let country_id = self
            .country_id
            .ok_or(FormError::InvalidCountryId)
            .and_then(|id| CountryId::new(id).map_err(|_| FormError::InvalidCountryId))?;

        Ok(NewCity::new(
            CityName::new(self.name.as_str())?,
            parse_coordinate(&self.lat, 90.0)?,
            parse_coordinate(&self.lon, 180.0)?,
            country_id,
        ))
    }

    /// Record-level uniqueness check for the city being edited. Fails while
    /// the form is locally invalid, since there is no candidate to send yet.
    pub fn intent(&self, city_id: Option<i32>) -> Result<ValidationIntent<NewCity>, FormError> {
        Ok(ValidationIntent::new(city_id, CITY_CHECK, self.to_new_city()?))
    }
}

impl From<&City> for CityForm {
    fn from(city: &City) -> Self {
        Self {
            name: city.name.clone(),
            lat: city.lat.to_string(),
            lon: city.lon.to_string(),
            country_id: Some(city.country_id),
        }
    }
}
