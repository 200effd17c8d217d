//! Services behind the country edit screen.

use crate::domain::country::Country;
use crate::domain::types::CountryId;
use crate::dto::countries::CountryEditData;
use crate::forms::country::CountryForm;
use crate::repository::{CountryReader, CountryWriter};
use crate::services::{COUNTRIES_ROUTE, SaveOutcome, ServiceResult};

/// Prepares the country edit screen. `country_id` is `None` in create mode.
pub async fn load_country_edit<R>(
    repo: &R,
    country_id: Option<i32>,
) -> ServiceResult<CountryEditData>
where
    R: CountryReader + ?Sized,
{
    let Some(country_id) = country_id else {
        return Ok(CountryEditData {
            title: "Create a new Country".to_string(),
            country: None,
            form: CountryForm::default(),
        });
    };

    let country = repo
        .get_country(CountryId::new(country_id)?)
        .await
        .map_err(|err| {
            log::error!("Failed to load country {country_id}: {err}");
            err
        })?;

    Ok(CountryEditData {
        title: format!("Edit - {}", country.name),
        form: CountryForm::from(&country),
        country: Some(country),
    })
}

/// Validates the form and creates or updates the country.
pub async fn save_country<R>(
    repo: &R,
    country_id: Option<i32>,
    form: &CountryForm,
) -> ServiceResult<SaveOutcome<Country>>
where
    R: CountryWriter + ?Sized,
{
    let new_country = form.to_new_country()?;

    let country = match country_id {
        Some(id) => repo.update_country(CountryId::new(id)?, &new_country).await,
        None => repo.create_country(&new_country).await,
    }
    .map_err(|err| {
        log::error!("Failed to save country: {err}");
        err
    })?;

    log::info!("Country {} has been saved.", country.id);
    Ok(SaveOutcome {
        entity: country,
        redirect_to: COUNTRIES_ROUTE,
    })
}
