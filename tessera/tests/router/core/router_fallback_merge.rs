use std::collections::BTreeMap;

use tessera::{AttemptOutcome, CacheOutcome, Capability, MissReason, RawValue, SkipReason};
use tessera_mock::MockBehavior;

use crate::helpers::{AAPL, Trio, approx, eid};

#[tokio::test]
async fn fundamentals_merge_across_finnhub_and_fmp() {
    let trio = Trio::new();
    trio.script_fundamentals().await;
    let tessera = trio.builder().build().unwrap();

    let (record, report) = tessera
        .fetch_with_report(Capability::Fundamentals, &eid(AAPL))
        .await
        .unwrap();

    assert!(approx(record.number("roe"), 15.2));
    assert!(approx(record.number("eps_growth"), 18.3));
    assert!(approx(record.number("revenue_growth"), 12.0));
    assert_eq!(record.source_of("roe"), Some("finnhub"));
    assert_eq!(record.source_of("eps_growth"), Some("fmp"));
    assert_eq!(record.source_of("revenue_growth"), Some("fmp"));
    assert_eq!(record.get("market_cap"), None);
    assert_eq!(record.source_of("market_cap"), None);

    assert_eq!(trio.fallback.ctrl.call_count(Capability::Fundamentals).await, 0);
    assert!(report.complete);
    assert_eq!(report.cache, CacheOutcome::Miss(MissReason::Absent));
    assert_eq!(
        report.skips().collect::<Vec<_>>(),
        vec![("fallback", SkipReason::AlreadyComplete)]
    );
    assert_eq!(report.invoked().collect::<Vec<_>>(), vec!["finnhub", "fmp"]);
    assert_eq!(
        report.summary(),
        "finnhub: ok(1) -> fmp: ok(2) -> fallback: skipped(AlreadyComplete)"
    );
}

#[tokio::test]
async fn lower_priority_never_overwrites_populated_fields() {
    let trio = Trio::new();
    trio.script_fundamentals().await;
    let tessera = trio
        .builder()
        .completeness(Capability::Fundamentals, std::sync::Arc::new(tessera::Exhaustive))
        .build()
        .unwrap();

    let (record, report) = tessera
        .fetch_with_report(Capability::Fundamentals, &eid(AAPL))
        .await
        .unwrap();

    // The fallback was consulted but every field it knows was already set.
    assert_eq!(trio.fallback.ctrl.call_count(Capability::Fundamentals).await, 1);
    assert!(approx(record.number("roe"), 15.2));
    assert_eq!(record.source_of("roe"), Some("finnhub"));
    assert!(!report.complete);
    match &report.attempts[2].outcome {
        AttemptOutcome::Success { contributed } => assert!(contributed.is_empty()),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn partial_composite_is_a_success() {
    let trio = Trio::new();
    trio.finnhub
        .ctrl
        .set_behavior(
            Capability::Fundamentals,
            MockBehavior::numbers(&[("peTTM", 28.5)]),
        )
        .await;
    let tessera = trio.builder().build().unwrap();

    let (record, report) = tessera
        .fetch_with_report(Capability::Fundamentals, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(record.populated(), 1);
    assert!(approx(record.number("pe_ratio"), 28.5));
    assert!(!report.complete);
    // fmp and fallback have no rule for this capability and fail with NotFound.
    assert_eq!(report.errors().count(), 2);
}

#[tokio::test]
async fn composite_carries_schema_version_and_provider_set() {
    let trio = Trio::new();
    trio.script_fundamentals().await;
    let tessera = trio.builder().schema_version(7).build().unwrap();

    let record = tessera.fundamentals(&eid(AAPL)).await.unwrap();
    assert_eq!(record.schema_version(), 7);
    assert_eq!(
        record.providers().into_iter().collect::<Vec<_>>(),
        vec!["finnhub".to_string(), "fmp".to_string()]
    );
    assert_eq!(record.missing().count(), 4);
}

#[tokio::test]
async fn text_placeholder_leaves_price_to_next_provider() {
    let trio = Trio::new();
    trio.script_quotes(0.0, 101.5, 99.0).await;
    let primary = BTreeMap::from([
        ("price".to_string(), RawValue::Text("N/A".into())),
        ("previous_close".to_string(), RawValue::Number(100.0)),
    ]);
    trio.finnhub
        .ctrl
        .set_behavior(Capability::Quote, MockBehavior::Return(primary))
        .await;
    let tessera = trio.builder().without_cache().build().unwrap();

    let (record, report) = tessera
        .fetch_with_report(Capability::Quote, &eid(AAPL))
        .await
        .unwrap();

    assert!(approx(record.number("price"), 101.5));
    assert_eq!(record.source_of("price"), Some("fmp"));
    assert!(approx(record.number("previous_close"), 100.0));
    assert_eq!(record.source_of("previous_close"), Some("finnhub"));
    assert_eq!(report.invoked().collect::<Vec<_>>(), vec!["finnhub", "fmp"]);
    assert_eq!(trio.fallback.ctrl.call_count(Capability::Quote).await, 0);
}
