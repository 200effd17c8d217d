use crate::domain::city::City;
use crate::domain::country::Country;
use crate::forms::city::CityForm;

/// Everything the city edit screen needs to render.
#[derive(Debug)]
pub struct CityEditData {
    pub title: String,
    /// City being edited, `None` in create mode.
    pub city: Option<City>,
    pub form: CityForm,
    /// Options of the country select, ordered by name.
    pub countries: Vec<Country>,
}
