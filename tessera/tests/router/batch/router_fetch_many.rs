use std::sync::Arc;

use tessera::{Capability, Tessera, TesseraError, Value};
use tessera_mock::MockAdapter;

use crate::helpers::{AAPL, MSFT, UNKNOWN, eid};

fn fixture_backed() -> Tessera {
    Tessera::builder()
        .with_adapter(Arc::new(MockAdapter::new()))
        .without_cache()
        .build()
        .unwrap()
}

#[tokio::test]
async fn quotes_split_successes_from_failures() {
    let tessera = fixture_backed();
    let (ok, failed) = tessera
        .quotes(&[eid(AAPL), eid(MSFT), eid(UNKNOWN)])
        .await;

    assert_eq!(ok.len(), 2);
    assert_eq!(ok[0].entity().as_str(), AAPL);
    assert_eq!(ok[1].entity().as_str(), MSFT);
    assert!(ok.iter().all(|r| r.source_of("price") == Some("tessera-mock")));

    assert_eq!(failed.len(), 1);
    let (entity, err) = &failed[0];
    assert_eq!(entity.as_str(), UNKNOWN);
    assert!(matches!(err, TesseraError::CapabilityUnavailable { .. }));
}

#[tokio::test]
async fn empty_batch_is_empty() {
    let tessera = fixture_backed();
    let (ok, failed) = tessera.fetch_many(Capability::BatchScan, &[]).await;
    assert!(ok.is_empty());
    assert!(failed.is_empty());
}

#[tokio::test]
async fn history_fixture_normalizes_to_series() {
    let tessera = fixture_backed();
    let rec = tessera.price_history(&eid(AAPL)).await.unwrap();
    let closes = rec.get("close").and_then(Value::as_series).unwrap();
    assert_eq!(closes.len(), 5);
    assert!(closes.windows(2).all(|w| w[0].ts < w[1].ts));
}
