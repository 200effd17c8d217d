use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::Validate;

use crate::domain::country::{Country, NewCountry};
use crate::domain::types::{CountryName, IsoCode};
use crate::domain::validation::ValidationIntent;
use crate::forms::FormError;

static ISO2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{2}$").expect("unable to compile iso2 regex"));
static ISO3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{3}$").expect("unable to compile iso3 regex"));

#[derive(Clone, Debug, Default, Deserialize, Validate)]
/// Form data for creating or editing a country.
pub struct CountryForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(regex(path = *ISO2_RE))]
    pub iso2: String,
    #[validate(regex(path = *ISO3_RE))]
    pub iso3: String,
}

impl CountryForm {
    /// Fields that are also checked for uniqueness on the server.
    pub const FIELDS: [&'static str; 3] = ["name", "iso2", "iso3"];

    pub fn to_new_country(&self) -> Result<NewCountry, FormError> {
        self.validate()?;
        Ok(NewCountry::new(
            CountryName::new(self.name.as_str())?,
            IsoCode::new(self.iso2.as_str(), 2)?,
            IsoCode::new(self.iso3.as_str(), 3)?,
        ))
    }

    /// Uniqueness check for `field` of the country identified by `country_id`.
    /// Returns `None` for unknown fields.
    ///
    /// The value is normalized the way [`Self::to_new_country`] stores it;
    /// values that do not pass local validation are sent as typed.
    pub fn intent(&self, country_id: Option<i32>, field: &str) -> Option<ValidationIntent> {
        let (raw, normalized) = match field {
            "name" => (&self.name, CountryName::new(self.name.as_str()).map(String::from)),
            "iso2" => (&self.iso2, IsoCode::new(self.iso2.as_str(), 2).map(IsoCode::into_inner)),
            "iso3" => (&self.iso3, IsoCode::new(self.iso3.as_str(), 3).map(IsoCode::into_inner)),
            _ => return None,
        };
        let value = normalized.unwrap_or_else(|_| raw.clone());
        Some(ValidationIntent::new(country_id, field, value))
    }
}

impl From<&Country> for CountryForm {
    fn from(country: &Country) -> Self {
        Self {
            name: country.name.clone(),
            iso2: country.iso2.clone(),
            iso3: country.iso3.clone(),
        }
    }
}
