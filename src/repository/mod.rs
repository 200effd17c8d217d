//! Access to the admin API.
//!
//! Every call returns an [`ApiFuture`]: a boxed, `'static` future that owns
//! everything it needs, so the gates can keep it in flight independently of
//! the repository borrow and simply drop it on teardown.

use futures::future::BoxFuture;

use crate::domain::city::{City, NewCity};
use crate::domain::country::{Country, NewCountry};
use crate::domain::types::{CityId, CountryId};
use crate::domain::validation::ValidationIntent;
use crate::pagination::{PageQuery, PageResult};

pub use crate::repository::errors::{ApiError, ApiResult};

pub mod errors;
pub mod http;
#[cfg(feature = "test-mocks")]
pub mod mock;

pub use crate::repository::http::HttpRepository;

pub type ApiFuture<T> = BoxFuture<'static, ApiResult<T>>;

/// Generic list endpoint serving pages of `T`.
pub trait PageSource<T>: Send + Sync {
    fn fetch_page(&self, query: &PageQuery) -> ApiFuture<PageResult<T>>;
}

/// Server-side uniqueness check for values of type `V`.
pub trait DupeProbe<V>: Send + Sync {
    fn is_dupe(&self, intent: &ValidationIntent<V>) -> ApiFuture<bool>;
}

pub trait CityReader {
    fn get_city(&self, id: CityId) -> ApiFuture<City>;
}

pub trait CityWriter {
    fn create_city(&self, city: &NewCity) -> ApiFuture<City>;
    fn update_city(&self, id: CityId, city: &NewCity) -> ApiFuture<City>;
}

pub trait CountryReader {
    fn get_country(&self, id: CountryId) -> ApiFuture<Country>;
}

pub trait CountryWriter {
    fn create_country(&self, country: &NewCountry) -> ApiFuture<Country>;
    fn update_country(&self, id: CountryId, country: &NewCountry) -> ApiFuture<Country>;
}
