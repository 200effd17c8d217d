//! reqwest-backed implementation of the repository traits.

use std::time::Duration;

use futures::FutureExt;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::city::{City, NewCity};
use crate::domain::country::{Country, NewCountry};
use crate::domain::types::{CityId, CountryId};
use crate::domain::validation::ValidationIntent;
use crate::pagination::{PageQuery, PageResult};
use crate::repository::{
    ApiError, ApiFuture, ApiResult, CityReader, CityWriter, CountryReader, CountryWriter,
    DupeProbe, PageSource,
};

const CITIES: &str = "api/Cities";
const COUNTRIES: &str = "api/Countries";

/// Query string of the field-level duplicate check.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DupeFieldParams<'a> {
    country_id: i32,
    field_name: &'a str,
    field_value: &'a str,
}

/// Repository talking JSON to the admin API rooted at `base_url`.
#[derive(Clone, Debug)]
pub struct HttpRepository {
    client: Client,
    base_url: Url,
}

impl HttpRepository {
    /// Creates a repository for `base_url`, e.g. `http://localhost:5000/`.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base url `{base_url}`: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::Transport(format!("invalid path `{path}`: {e}")))?;
        Ok(self.client.request(method, url))
    }

    fn send<T>(&self, request: ApiResult<RequestBuilder>) -> ApiFuture<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        async move {
            let response = request?.send().await?;
            decode(response).await
        }
        .boxed()
    }

    fn list<T>(&self, path: &str, query: &PageQuery) -> ApiFuture<PageResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let page = self.send::<PageResult<T>>(
            self.request(Method::GET, path)
                .map(|request| request.query(query)),
        );
        async move {
            let page = page.await?;
            page.check().map_err(ApiError::Decode)?;
            Ok(page)
        }
        .boxed()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }
    if !status.is_success() {
        return Err(ApiError::Transport(format!(
            "{} returned {status}",
            response.url().path()
        )));
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

impl PageSource<City> for HttpRepository {
    fn fetch_page(&self, query: &PageQuery) -> ApiFuture<PageResult<City>> {
        self.list(CITIES, query)
    }
}

impl PageSource<Country> for HttpRepository {
    fn fetch_page(&self, query: &PageQuery) -> ApiFuture<PageResult<Country>> {
        self.list(COUNTRIES, query)
    }
}

impl CityReader for HttpRepository {
    fn get_city(&self, id: CityId) -> ApiFuture<City> {
        self.send(self.request(Method::GET, &format!("{CITIES}/{id}")))
    }
}

impl CityWriter for HttpRepository {
    fn create_city(&self, city: &NewCity) -> ApiFuture<City> {
        let body = city.to_city(None);
        self.send(
            self.request(Method::POST, CITIES)
                .map(|request| request.json(&body)),
        )
    }

    fn update_city(&self, id: CityId, city: &NewCity) -> ApiFuture<City> {
        let body = city.to_city(Some(id));
        self.send(
            self.request(Method::PUT, &format!("{CITIES}/{id}"))
                .map(|request| request.json(&body)),
        )
    }
}

impl CountryReader for HttpRepository {
    fn get_country(&self, id: CountryId) -> ApiFuture<Country> {
        self.send(self.request(Method::GET, &format!("{COUNTRIES}/{id}")))
    }
}

impl CountryWriter for HttpRepository {
    fn create_country(&self, country: &NewCountry) -> ApiFuture<Country> {
        let body = country.to_country(None);
        self.send(
            self.request(Method::POST, COUNTRIES)
                .map(|request| request.json(&body)),
        )
    }

    fn update_country(&self, id: CountryId, country: &NewCountry) -> ApiFuture<Country> {
        let body = country.to_country(Some(id));
        self.send(
            self.request(Method::PUT, &format!("{COUNTRIES}/{id}"))
                .map(|request| request.json(&body)),
        )
    }
}

/// Field-level check: `POST api/Countries/IsDupeField?countryId&fieldName&fieldValue`.
impl DupeProbe<String> for HttpRepository {
    fn is_dupe(&self, intent: &ValidationIntent<String>) -> ApiFuture<bool> {
        let params = DupeFieldParams {
            country_id: intent.entity_id.unwrap_or(0),
            field_name: &intent.field_name,
            field_value: &intent.field_value,
        };
        self.send(
            self.request(Method::POST, &format!("{COUNTRIES}/IsDupeField"))
                .map(|request| request.query(&params)),
        )
    }
}

/// Record-level check: `POST api/Cities/IsDupeCity` with the candidate city.
impl DupeProbe<NewCity> for HttpRepository {
    fn is_dupe(&self, intent: &ValidationIntent<NewCity>) -> ApiFuture<bool> {
        let id = intent.entity_id.and_then(|id| CityId::new(id).ok());
        let body = intent.field_value.to_city(id);
        self.send(
            self.request(Method::POST, &format!("{CITIES}/IsDupeCity"))
                .map(|request| request.json(&body)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_a_trailing_slash() {
        let repo = HttpRepository::new("http://localhost:5000/admin", None).unwrap();
        assert_eq!(repo.base_url().as_str(), "http://localhost:5000/admin/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpRepository::new("not a url", None),
            Err(ApiError::Transport(_))
        ));
    }
}
