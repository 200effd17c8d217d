use std::sync::Arc;
use std::time::Duration;

use cities_admin::domain::city::{City, NewCity};
use cities_admin::domain::country::{Country, NewCountry};
use cities_admin::domain::types::{CityId, CityName, CountryId, CountryName, IsoCode};
use cities_admin::domain::validation::{ValidationIntent, Verdict};
use cities_admin::gate::validation::ValidationGate;
use cities_admin::pagination::{PageQuery, PageResult, QueryPatch, SortOrder};
use cities_admin::repository::{
    ApiError, CityReader, CityWriter, CountryWriter, DupeProbe, HttpRepository, PageSource,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repo(server: &MockServer) -> HttpRepository {
    HttpRepository::new(&server.uri(), Some(Duration::from_secs(5))).unwrap()
}

fn first_page() -> PageQuery {
    PageQuery::first_page(10, "name", SortOrder::Asc).unwrap()
}

fn berlin() -> NewCity {
    NewCity::new(
        CityName::new("Berlin").unwrap(),
        52.52,
        13.405,
        CountryId::new(2).unwrap(),
    )
}

// ── Listings ────────────────────────────────────────────────────

#[tokio::test]
async fn filtered_city_page_is_requested_and_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Cities"))
        .and(query_param("pageIndex", "1"))
        .and(query_param("pageSize", "10"))
        .and(query_param("sortColumn", "name"))
        .and(query_param("sortOrder", "desc"))
        .and(query_param("filterColumn", "name"))
        .and(query_param("filterQuery", "Ber"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 7, "name": "Bern", "lat": 46.948, "lon": 7.4474, "countryId": 3, "countryName": "Switzerland"}
            ],
            "pageIndex": 1,
            "pageSize": 10,
            "totalCount": 11,
            "totalPages": 2,
            "sortColumn": "name",
            "sortOrder": "desc",
            "filterColumn": "name",
            "filterQuery": "Ber"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = first_page()
        .build(QueryPatch::sort("name", SortOrder::Desc))
        .and_then(|query| query.build(QueryPatch::filter("name", "Ber")))
        .and_then(|query| query.build(QueryPatch::page(1, 10)))
        .unwrap();
    let page: PageResult<City> = repo(&server).fetch_page(&query).await.unwrap();

    assert_eq!(page.total_count, 11);
    assert_eq!(page.sort_order, Some(SortOrder::Desc));
    assert_eq!(page.data[0].country_name.as_deref(), Some("Switzerland"));
    assert_eq!(page.data[0].country_id, 3);
}

#[tokio::test]
async fn unfiltered_query_omits_filter_pair() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Countries"))
        .and(query_param_is_missing("filterColumn"))
        .and(query_param_is_missing("filterQuery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "pageIndex": 0,
            "pageSize": 10,
            "totalCount": 0,
            "totalPages": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page: PageResult<Country> = repo(&server).fetch_page(&first_page()).await.unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.sort_column, None);
}

#[tokio::test]
async fn envelope_violating_its_invariants_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Countries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "pageIndex": 4,
            "pageSize": 10,
            "totalCount": 12,
            "totalPages": 2
        })))
        .mount(&server)
        .await;

    let result: Result<PageResult<Country>, _> = repo(&server).fetch_page(&first_page()).await;

    assert!(matches!(result, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Cities"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result: Result<PageResult<City>, _> = repo(&server).fetch_page(&first_page()).await;

    assert!(matches!(result, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn server_error_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Cities"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result: Result<PageResult<City>, _> = repo(&server).fetch_page(&first_page()).await;

    match result {
        Err(ApiError::Transport(message)) => assert!(message.contains("503")),
        other => panic!("expected transport error, got {other:?}"),
    }
}

// ── Single entities ─────────────────────────────────────────────

#[tokio::test]
async fn missing_city_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Cities/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = repo(&server).get_city(CityId::new(42).unwrap()).await;

    assert_eq!(result, Err(ApiError::NotFound));
}

#[tokio::test]
async fn city_update_puts_full_record() {
    let server = MockServer::start().await;
    let stored = json!({"id": 5, "name": "Berlin", "lat": 52.52, "lon": 13.405, "countryId": 2});
    Mock::given(method("PUT"))
        .and(path("/api/Cities/5"))
        .and(body_json(stored.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored))
        .expect(1)
        .mount(&server)
        .await;

    let city = repo(&server)
        .update_city(CityId::new(5).unwrap(), &berlin())
        .await
        .unwrap();

    assert_eq!(city.id, 5);
}

#[tokio::test]
async fn country_create_posts_with_zero_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Countries"))
        .and(body_json(json!({"id": 0, "name": "Germany", "iso2": "DE", "iso3": "DEU"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9, "name": "Germany", "iso2": "DE", "iso3": "DEU"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let country = NewCountry::new(
        CountryName::new("Germany").unwrap(),
        IsoCode::new("de", 2).unwrap(),
        IsoCode::new("deu", 3).unwrap(),
    );
    let created = repo(&server).create_country(&country).await.unwrap();

    assert_eq!(created.id, 9);
}

// ── Uniqueness checks ───────────────────────────────────────────

#[tokio::test]
async fn field_check_sends_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Countries/IsDupeField"))
        .and(query_param("countryId", "0"))
        .and(query_param("fieldName", "iso2"))
        .and(query_param("fieldValue", "US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let intent = ValidationIntent::new(None, "iso2", "US".to_string());
    let is_dupe = repo(&server).is_dupe(&intent).await.unwrap();

    assert!(is_dupe);
}

#[tokio::test]
async fn record_check_posts_candidate_city() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Cities/IsDupeCity"))
        .and(body_json(json!({
            "id": 5, "name": "Berlin", "lat": 52.52, "lon": 13.405, "countryId": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .expect(1)
        .mount(&server)
        .await;

    let intent = ValidationIntent::new(Some(5), "city", berlin());
    let is_dupe = repo(&server).is_dupe(&intent).await.unwrap();

    assert!(!is_dupe);
}

async fn settled(mut verdict: tokio::sync::watch::Receiver<Verdict>) -> Verdict {
    let settled = tokio::time::timeout(
        Duration::from_secs(5),
        verdict.wait_for(|verdict| !verdict.is_pending()),
    )
    .await
    .expect("verdict settles")
    .expect("gate alive")
    .clone();
    settled
}

#[tokio::test]
async fn gate_reports_duplicate_from_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Countries/IsDupeField"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .mount(&server)
        .await;

    let probe: Arc<dyn DupeProbe<String>> = Arc::new(repo(&server));
    let mut gate = ValidationGate::new(probe, Duration::from_millis(10));
    let verdict = gate
        .validate(ValidationIntent::new(None, "iso2", "US".to_string()))
        .unwrap();

    assert_eq!(settled(verdict).await, Verdict::Duplicate);
}

#[tokio::test]
async fn gate_reports_unreachable_server_as_failed() {
    let server = MockServer::start().await;
    let repo = repo(&server);
    drop(server);

    let probe: Arc<dyn DupeProbe<String>> = Arc::new(repo);
    let mut gate = ValidationGate::new(probe, Duration::from_millis(10));
    let verdict = gate
        .validate(ValidationIntent::new(None, "iso2", "US".to_string()))
        .unwrap();

    assert!(matches!(settled(verdict).await, Verdict::Failed(_)));
}
