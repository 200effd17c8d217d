use crate::domain::country::Country;
use crate::forms::country::CountryForm;

/// Everything the country edit screen needs to render.
#[derive(Debug)]
pub struct CountryEditData {
    pub title: String,
    pub country: Option<Country>,
    pub form: CountryForm,
}
