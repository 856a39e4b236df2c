use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tessera::{CacheOutcome, Capability, Clock, JsonFileCacheStore, MissReason, TtlPolicy};
use tessera_mock::ManualClock;

use crate::helpers::{AAPL, Trio, approx, eid};

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap(),
    ))
}

#[tokio::test]
async fn fresh_hit_contacts_no_provider() {
    let trio = Trio::new();
    trio.script_fundamentals().await;
    let tessera = trio.builder().build().unwrap();

    let (first, report) = tessera
        .fetch_with_report(Capability::Fundamentals, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(report.cache, CacheOutcome::Miss(MissReason::Absent));

    let (second, report) = tessera
        .fetch_with_report(Capability::Fundamentals, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(report.cache, CacheOutcome::Hit);
    assert!(report.attempts.is_empty());
    assert!(report.complete);
    assert_eq!(second, first);
    assert_eq!(second.source_of("eps_growth"), Some("fmp"));

    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Fundamentals).await, 1);
    assert_eq!(trio.fmp.ctrl.call_count(Capability::Fundamentals).await, 1);
}

#[tokio::test]
async fn expired_entry_is_refetched() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    let clock = clock();
    let tessera = trio
        .builder()
        .clock(Arc::clone(&clock) as Arc<dyn Clock>)
        .ttl(Capability::Quote, TtlPolicy::Fixed(Duration::from_secs(60)))
        .build()
        .unwrap();

    tessera.quote(&eid(AAPL)).await.unwrap();
    clock.advance(Duration::from_secs(30));
    tessera.quote(&eid(AAPL)).await.unwrap();
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Quote).await, 1);

    clock.advance(Duration::from_secs(30));
    let (_, report) = tessera
        .fetch_with_report(Capability::Quote, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(report.cache, CacheOutcome::Miss(MissReason::Expired));
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Quote).await, 2);
}

#[tokio::test]
async fn schema_bump_forces_refetch_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let trio = Trio::new();
    trio.script_fundamentals().await;

    let v1 = trio
        .builder()
        .cache_store(Arc::new(JsonFileCacheStore::new(dir.path())))
        .schema_version(1)
        .build()
        .unwrap();
    let old = v1.fundamentals(&eid(AAPL)).await.unwrap();
    assert_eq!(old.schema_version(), 1);
    drop(v1);

    let restarted = trio
        .builder()
        .cache_store(Arc::new(JsonFileCacheStore::new(dir.path())))
        .schema_version(1)
        .build()
        .unwrap();
    let (_, report) = restarted
        .fetch_with_report(Capability::Fundamentals, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(report.cache, CacheOutcome::Hit);

    let v2 = trio
        .builder()
        .cache_store(Arc::new(JsonFileCacheStore::new(dir.path())))
        .schema_version(2)
        .build()
        .unwrap();
    let (fresh, report) = v2
        .fetch_with_report(Capability::Fundamentals, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(
        report.cache,
        CacheOutcome::Miss(MissReason::SchemaStale {
            found: 1,
            current: 2
        })
    );
    assert_eq!(fresh.schema_version(), 2);
    assert!(approx(fresh.number("roe"), 15.2));
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Fundamentals).await, 2);
}

#[tokio::test]
async fn disabled_ttl_always_goes_upstream() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    let tessera = trio
        .builder()
        .ttl(Capability::Quote, TtlPolicy::Disabled)
        .build()
        .unwrap();

    for _ in 0..3 {
        let (_, report) = tessera
            .fetch_with_report(Capability::Quote, &eid(AAPL))
            .await
            .unwrap();
        assert_eq!(report.cache, CacheOutcome::Miss(MissReason::Absent));
    }
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Quote).await, 3);
}

#[tokio::test]
async fn invalidate_drops_one_key() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    trio.script_fundamentals().await;
    let tessera = trio.builder().build().unwrap();

    tessera.quote(&eid(AAPL)).await.unwrap();
    tessera.fundamentals(&eid(AAPL)).await.unwrap();
    tessera
        .invalidate(Capability::Quote, &eid(AAPL))
        .await
        .unwrap();

    tessera.quote(&eid(AAPL)).await.unwrap();
    tessera.fundamentals(&eid(AAPL)).await.unwrap();
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Quote).await, 2);
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Fundamentals).await, 1);
}

#[tokio::test]
async fn without_cache_reports_disabled() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    let tessera = trio.builder().without_cache().build().unwrap();

    let (_, report) = tessera
        .fetch_with_report(Capability::Quote, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(report.cache, CacheOutcome::Disabled);
    tessera
        .invalidate(Capability::Quote, &eid(AAPL))
        .await
        .unwrap();
}
