//! Checks against a running Connected Systems server.
//!
//! Skipped unless `CSAPI_LIVE_SERVER` is set, e.g.
//! `CSAPI_LIVE_SERVER=http://localhost:8181/sensorhub/api CSAPI_LIVE_USER=admin CSAPI_LIVE_PASS=admin`.

use csapi_client::{ClientError, Endpoint, FetchOptions, HttpTransportConfig};
use csapi_core::{ResourceKind, SystemsQuery};

fn live_endpoint() -> Option<Endpoint> {
    let Ok(server) = std::env::var("CSAPI_LIVE_SERVER") else {
        eprintln!("Skipping live server test; set CSAPI_LIVE_SERVER to run");
        return None;
    };

    let mut options = FetchOptions::default();
    if let (Ok(user), Ok(pass)) = (
        std::env::var("CSAPI_LIVE_USER"),
        std::env::var("CSAPI_LIVE_PASS"),
    ) {
        options = options.with_basic_auth(&user, &pass);
    }

    let endpoint = Endpoint::connect(&server, &HttpTransportConfig::default())
        .unwrap()
        .with_options(options);
    Some(endpoint)
}

#[tokio::test]
async fn live_landing_and_conformance() {
    let Some(endpoint) = live_endpoint() else {
        return;
    };

    let landing = endpoint.info().await.unwrap();
    assert!(!landing.links.is_empty());

    let conformance = endpoint.conformance().await.unwrap();
    assert!(conformance.is_connected_systems());
}

#[tokio::test]
async fn live_systems_page() {
    let Some(endpoint) = live_endpoint() else {
        return;
    };

    let navigator = match endpoint.find_navigator().await {
        Ok((_, navigator)) => navigator,
        Err(ClientError::CapabilityNotFound { tried }) => {
            eprintln!("Server lists {tried} collection(s), none negotiated");
            return;
        }
        Err(e) => panic!("discovery failed: {e}"),
    };

    if !navigator.supports(ResourceKind::Systems) {
        return;
    }

    let page = endpoint
        .fetch_page(&navigator.systems_url(&SystemsQuery::new().limit(5)))
        .await
        .unwrap();
    assert!((200..300).contains(&page.status) || page.is_absent());
    for id in page.page.ids() {
        assert!(!id.is_empty());
    }
}
