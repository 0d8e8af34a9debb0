use csapi_client::{ClientError, Endpoint, FetchOptions, FetchResponse, MemoryTransport};
use csapi_core::{
    Envelope, FormatTag, LimitQuery, ObservationsQuery, ResourceKind, SystemsQuery, Tier,
};
use serde_json::{json, Value};
use url::Url;

const CSAPI_CORE: &str = "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/core";

fn server() -> MemoryTransport {
    MemoryTransport::new()
        .with_json(
            "http://h",
            json!({
                "title": "Test server",
                "links": [
                    {"rel": "conformance", "href": "/conformance"},
                    {"rel": "collections", "href": "/collections"}
                ]
            }),
        )
        .with_json("http://h/conformance", json!({"conformsTo": [CSAPI_CORE]}))
        .with_json(
            "http://h/collections",
            json!({
                "collections": [{
                    "id": "sensors",
                    "links": [{"rel": "systems", "href": "/collections/sensors/systems"}]
                }]
            }),
        )
}

#[tokio::test]
async fn discovers_sensors_collection() {
    let endpoint = Endpoint::new("http://h", server()).unwrap();

    let (collection, navigator) = endpoint.find_navigator().await.unwrap();
    assert_eq!(collection.id, "sensors");
    assert_eq!(
        navigator.available_resources().iter().copied().collect::<Vec<_>>(),
        [ResourceKind::Systems]
    );
    assert_eq!(
        navigator.systems_url(&SystemsQuery::new().limit(3)).as_str(),
        "http://h/collections/sensors/systems?limit=3"
    );

    let conformance = endpoint.conformance().await.unwrap();
    assert!(conformance.contains(CSAPI_CORE));

    assert_eq!(
        endpoint.transport().requested_urls(),
        [
            "http://h/",
            "http://h/conformance",
            "http://h/collections"
        ]
    );
}

#[tokio::test]
async fn negotiation_reports_tier() {
    let endpoint = Endpoint::new("http://h", server()).unwrap();
    let collection = endpoint.collection("sensors").await.unwrap();

    let negotiation = endpoint.negotiate_collection(&collection).await.unwrap();
    assert!(matches!(
        negotiation,
        csapi_core::Negotiation::Supported {
            tier: Tier::DeclaredLinks,
            ..
        }
    ));
}

#[tokio::test]
async fn negotiates_collections_in_order() {
    let transport = MemoryTransport::new()
        .with_json(
            "http://h/api",
            json!({"links": [
                {"rel": "conformance", "href": "conformance"},
                {"rel": "data", "href": "collections"}
            ]}),
        )
        .with_json("http://h/api/conformance", json!({"conformsTo": [CSAPI_CORE]}))
        .with_json(
            "http://h/api/collections",
            json!({"collections": [
                {"id": "parcels", "links": [{"rel": "items", "href": "/api/collections/parcels/items"}]},
                {"id": "weather-sensors", "links": [{"rel": "self", "href": "/api/collections/weather-sensors"}]},
                {"id": "traffic", "links": [{"rel": "systems", "href": "/api/collections/traffic/systems"}]}
            ]}),
        );
    let endpoint = Endpoint::new("http://h/api", transport).unwrap();

    // The keyword fallback accepts the second collection before the third is tried.
    let (collection, navigator) = endpoint.find_navigator().await.unwrap();
    assert_eq!(collection.id, "weather-sensors");
    assert_eq!(navigator.available_resources().len(), 3);
    assert_eq!(
        navigator.base_url().as_str(),
        "http://h/api/collections/weather-sensors"
    );
}

#[tokio::test]
async fn capability_not_found_after_exhausting_collections() {
    let transport = MemoryTransport::new()
        .with_json("http://h", json!({"links": []}))
        .with_json(
            "http://h/collections",
            json!({"collections": [
                {"id": "sensors", "links": [{"rel": "items", "href": "/x"}]},
                {"id": "roads", "links": [{"rel": "items", "href": "/y"}]}
            ]}),
        );
    let endpoint = Endpoint::new("http://h", transport).unwrap();

    let err = endpoint.find_navigator().await.unwrap_err();
    assert!(matches!(err, ClientError::CapabilityNotFound { tried: 2 }));
}

#[tokio::test]
async fn fetches_and_walks_pages() {
    let transport = server()
        .with_response(
            "http://h/collections/sensors/systems?limit=2",
            FetchResponse::with_content_type(
                200,
                "application/geo+json",
                json!({
                    "type": "FeatureCollection",
                    "features": [
                        {"type": "Feature", "id": "s1", "properties": {}},
                        {"type": "Feature", "id": "s2", "properties": {}}
                    ],
                    "links": [{"rel": "next", "href": "systems?limit=2&offset=2"}]
                }),
            ),
        )
        .with_json(
            "http://h/collections/sensors/systems?limit=2&offset=2",
            json!({"items": [{"id": "s3"}], "links": []}),
        );
    let endpoint = Endpoint::new("http://h", transport).unwrap();
    let navigator = endpoint.navigator_for("sensors").await.unwrap();
    let url = navigator.systems_url(&SystemsQuery::new().limit(2));

    let first = endpoint.fetch_page(&url).await.unwrap();
    assert_eq!(first.format, FormatTag::GeoJson);
    assert_eq!(first.envelope, Envelope::FeatureCollection);
    assert_eq!(first.page.ids(), ["s1", "s2"]);

    let mut walker = endpoint.pages(url);
    let items = walker.collect_all().await.unwrap();
    let ids: Vec<&str> = items.iter().filter_map(|item| item["id"].as_str()).collect();
    assert_eq!(ids, ["s1", "s2", "s3"]);
    assert_eq!(walker.pages_fetched(), 2);
}

#[tokio::test]
async fn absent_resources_are_empty_not_errors() {
    let transport = server()
        .with_response(
            "http://h/collections/sensors/observations",
            FetchResponse::json(501, Value::Null),
        )
        .with_response(
            "http://h/collections/sensors/systems",
            FetchResponse::json(500, json!({"description": "boom"})),
        );
    let endpoint = Endpoint::new("http://h", transport).unwrap();
    let navigator = endpoint.navigator_for("sensors").await.unwrap();

    let missing = endpoint
        .fetch_page(&navigator.datastreams_url(&csapi_core::DatastreamsQuery::new()))
        .await
        .unwrap();
    assert!(missing.is_absent());
    assert!(missing.page.is_empty());

    let unimplemented = endpoint
        .fetch_page(&navigator.observations_url(&ObservationsQuery::new()))
        .await
        .unwrap();
    assert_eq!(unimplemented.status, 501);
    assert!(unimplemented.page.is_empty());

    let entity = endpoint
        .fetch_entity(&navigator.system_url("nope"))
        .await
        .unwrap();
    assert!(entity.is_none());

    let err = endpoint
        .fetch_page(&navigator.systems_url(&SystemsQuery::new()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn sub_resource_urls_encode_ids() {
    let endpoint = Endpoint::new("http://h", server()).unwrap();
    let navigator = endpoint.navigator_for("sensors").await.unwrap();

    assert_eq!(
        navigator
            .system_datastreams_url("urn:dev/1", &LimitQuery::limit(10))
            .as_str(),
        "http://h/collections/sensors/systems/urn:dev%2F1/datastreams?limit=10"
    );
    assert_eq!(
        navigator
            .datastream_observations_url(
                "ds 1",
                &ObservationsQuery::new().datetime("2024-01-01T00:00:00Z/..")
            )
            .as_str(),
        "http://h/collections/sensors/datastreams/ds%201/observations?datetime=2024-01-01T00%3A00%3A00Z%2F.."
    );
}

#[tokio::test]
async fn credentials_travel_with_every_request() {
    let endpoint = Endpoint::new("http://h", server())
        .unwrap()
        .with_options(FetchOptions::default().with_bearer_token("t0k3n"));

    endpoint.find_navigator().await.unwrap();

    let requests = endpoint.transport().requests();
    assert_eq!(requests.len(), 3);
    for request in requests {
        assert!(request
            .headers
            .iter()
            .any(|(name, value)| name == "Authorization" && value == "Bearer t0k3n"));
    }
}

#[tokio::test]
async fn unknown_url_is_absent() {
    let endpoint = Endpoint::new("http://h", server()).unwrap();
    let page = endpoint
        .fetch_page(&Url::parse("http://h/unknown").unwrap())
        .await
        .unwrap();
    assert_eq!(page.status, 404);
    assert_eq!(page.envelope, Envelope::Unrecognized);
}
