//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::city::{City, NewCity};
use crate::domain::country::{Country, NewCountry};
use crate::domain::types::{CityId, CountryId};
use crate::pagination::{PageQuery, PageResult};
use crate::repository::{
    ApiFuture, CityReader, CityWriter, CountryReader, CountryWriter, PageSource,
};

mock! {
    pub Repository {}

    impl CityReader for Repository {
        fn get_city(&self, id: CityId) -> ApiFuture<City>;
    }

    impl CityWriter for Repository {
        fn create_city(&self, city: &NewCity) -> ApiFuture<City>;
        fn update_city(&self, id: CityId, city: &NewCity) -> ApiFuture<City>;
    }

    impl CountryReader for Repository {
        fn get_country(&self, id: CountryId) -> ApiFuture<Country>;
    }

    impl CountryWriter for Repository {
        fn create_country(&self, country: &NewCountry) -> ApiFuture<Country>;
        fn update_country(&self, id: CountryId, country: &NewCountry) -> ApiFuture<Country>;
    }

    impl PageSource<Country> for Repository {
        fn fetch_page(&self, query: &PageQuery) -> ApiFuture<PageResult<Country>>;
    }
}
