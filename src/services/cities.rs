//! Services behind the city edit screen.

use crate::domain::city::City;
use crate::domain::country::Country;
use crate::domain::types::CityId;
use crate::dto::cities::CityEditData;
use crate::forms::city::CityForm;
use crate::pagination::{LOOKUP_PAGE_SIZE, PageQuery, SortOrder};
use crate::repository::{CityReader, CityWriter, PageSource};
use crate::services::{CITIES_ROUTE, SaveOutcome, ServiceResult};

/// Loads every country for the select box, ordered by name.
pub async fn load_country_options<R>(repo: &R) -> ServiceResult<Vec<Country>>
where
    R: PageSource<Country> + ?Sized,
{
    let query = PageQuery::first_page(LOOKUP_PAGE_SIZE, "name", SortOrder::Asc)?;
    match repo.fetch_page(&query).await {
        Ok(page) => Ok(page.data),
        Err(err) => {
            log::error!("Failed to load countries: {err}");
            Err(err.into())
        }
    }
}

/// Prepares the city edit screen. `city_id` is `None` in create mode.
pub async fn load_city_edit<R>(repo: &R, city_id: Option<i32>) -> ServiceResult<CityEditData>
where
    R: CityReader + PageSource<Country> + ?Sized,
{
    let countries = load_country_options(repo).await?;

    let Some(city_id) = city_id else {
        return Ok(CityEditData {
            title: "Create a new City".to_string(),
            city: None,
            form: CityForm::default(),
            countries,
        });
    };

    let city = match repo.get_city(CityId::new(city_id)?).await {
        Ok(city) => city,
        Err(err) => {
            log::error!("Failed to load city {city_id}: {err}");
            return Err(err.into());
        }
    };

    Ok(CityEditData {
        title: format!("Edit - {}", city.name),
        form: CityForm::from(&city),
        city: Some(city),
        countries,
    })
}

/// Validates the form and creates or updates the city.
pub async fn save_city<R>(
    repo: &R,
    city_id: Option<i32>,
    form: &CityForm,
) -> ServiceResult<SaveOutcome<City>>
where
    R: CityWriter + ?Sized,
{
    let new_city = form.to_new_city()?;

    let saved = match city_id {
        Some(id) => repo.update_city(CityId::new(id)?, &new_city).await,
        None => repo.create_city(&new_city).await,
    };

    match saved {
        Ok(city) => {
            log::info!("City {} has been saved.", city.id);
            Ok(SaveOutcome {
                entity: city,
                redirect_to: CITIES_ROUTE,
            })
        }
        Err(err) => {
            log::error!("Failed to save city: {err}");
            Err(err.into())
        }
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use futures::FutureExt;
    use futures::future::ready;

    use super::*;
    use crate::pagination::PageResult;
    use crate::repository::ApiError;
    use crate::repository::mock::MockRepository;
    use crate::services::ServiceError;

    fn berlin() -> City {
        City {
            id: 5,
            name: "Berlin".to_string(),
            lat: 52.52,
            lon: 13.405,
            country_id: 2,
            country_name: None,
        }
    }

    fn countries() -> PageResult<Country> {
        PageResult {
            data: vec![Country {
                id: 2,
                name: "Germany".to_string(),
                iso2: "DE".to_string(),
                iso3: "DEU".to_string(),
                total_cities: None,
            }],
            page_index: 0,
            page_size: LOOKUP_PAGE_SIZE,
            total_count: 1,
            total_pages: 1,
            sort_column: Some("name".to_string()),
            sort_order: Some(SortOrder::Asc),
            filter_column: None,
            filter_query: None,
        }
    }

    fn form() -> CityForm {
        CityForm {
            name: "Berlin".to_string(),
            lat: "52.52".to_string(),
            lon: "13.405".to_string(),
            country_id: Some(2),
        }
    }

    #[tokio::test]
    async fn edit_mode_loads_city_and_countries() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_page()
            .withf(|query| {
                query.page_size == LOOKUP_PAGE_SIZE
                    && query.sort_column == "name"
                    && query.sort_order == SortOrder::Asc
            })
            .times(1)
            .returning(|_| ready(Ok(countries())).boxed());
        repo.expect_get_city()
            .withf(|id| id.get() == 5)
            .times(1)
            .returning(|_| ready(Ok(berlin())).boxed());

        let data = load_city_edit(&repo, Some(5)).await.unwrap();

        assert_eq!(data.title, "Edit - Berlin");
        assert_eq!(data.form.name, "Berlin");
        assert_eq!(data.countries.len(), 1);
    }

    #[tokio::test]
    async fn create_mode_skips_city_lookup() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_page()
            .times(1)
            .returning(|_| ready(Ok(countries())).boxed());
        repo.expect_get_city().times(0);

        let data = load_city_edit(&repo, None).await.unwrap();

        assert_eq!(data.title, "Create a new City");
        assert!(data.city.is_none());
    }

    #[tokio::test]
    async fn missing_city_maps_to_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_page()
            .returning(|_| ready(Ok(countries())).boxed());
        repo.expect_get_city()
            .returning(|_| ready(Err(ApiError::NotFound)).boxed());

        let result = load_city_edit(&repo, Some(99)).await;

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn save_updates_existing_city() {
        let mut repo = MockRepository::new();
        repo.expect_update_city()
            .withf(|id, city| id.get() == 5 && city.name.as_str() == "Berlin")
            .times(1)
            .returning(|_, _| ready(Ok(berlin())).boxed());
        repo.expect_create_city().times(0);

        let outcome = save_city(&repo, Some(5), &form()).await.unwrap();

        assert_eq!(outcome.redirect_to, "/cities");
        assert_eq!(outcome.entity.id, 5);
    }

    #[tokio::test]
    async fn save_rejects_invalid_form_without_calling_api() {
        let mut repo = MockRepository::new();
        repo.expect_create_city().times(0);
        let mut form = form();
        form.lon = "east".to_string();

        let result = save_city(&repo, None, &form).await;

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[tokio::test]
    async fn save_propagates_transport_errors() {
        let mut repo = MockRepository::new();
        repo.expect_create_city()
            .times(1)
            .returning(|_| ready(Err(ApiError::Transport("connection reset".into()))).boxed());

        let result = save_city(&repo, None, &form()).await;

        assert!(matches!(result, Err(ServiceError::Api(ApiError::Transport(_)))));
    }
}
