use tessera::{Capability, CircuitState, RateLimitConfig, SkipReason, TesseraError};

use crate::helpers::{AAPL, Trio, eid};

fn one_shot() -> RateLimitConfig {
    RateLimitConfig {
        capacity: 1.0,
        refill_per_second: 0.0,
    }
}

#[tokio::test(start_paused = true)]
async fn throttled_provider_is_skipped_without_breaker_penalty() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    let tessera = trio
        .builder()
        .rate_limit("finnhub", one_shot())
        .without_cache()
        .build()
        .unwrap();

    let first = tessera.quote(&eid(AAPL)).await.unwrap();
    assert_eq!(first.source_of("price"), Some("finnhub"));

    for _ in 0..5 {
        let (r, report) = tessera
            .fetch_with_report(Capability::Quote, &eid(AAPL))
            .await
            .unwrap();
        assert_eq!(r.source_of("price"), Some("fmp"));
        assert_eq!(
            report.skips().next(),
            Some(("finnhub", SkipReason::RateLimited))
        );
    }

    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Quote).await, 1);
    let snap = tessera
        .circuit_breaker()
        .snapshot("finnhub", Capability::Quote);
    assert_eq!(snap.state, CircuitState::Closed);
    assert_eq!(snap.consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn all_throttled_is_unavailable_with_rejections() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    let tessera = trio
        .builder()
        .rate_limit("finnhub", one_shot())
        .rate_limit("fmp", one_shot())
        .rate_limit("fallback", one_shot())
        .without_cache()
        .build()
        .unwrap();
    for name in ["finnhub", "fmp", "fallback"] {
        assert!(tessera.rate_limiter().try_acquire(name, Capability::Quote));
    }

    let err = tessera.quote(&eid(AAPL)).await.unwrap_err();
    let TesseraError::CapabilityUnavailable { attempts, .. } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert!(
        attempts
            .iter()
            .all(|e| matches!(e, TesseraError::ProviderRejected { .. }))
    );
    assert!(!err.is_actionable());
}

#[tokio::test(start_paused = true)]
async fn throttled_probe_slot_is_returned() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    let tessera = trio
        .builder()
        .rate_limit("finnhub", one_shot())
        .without_cache()
        .build()
        .unwrap();
    let breaker = tessera.circuit_breaker();
    for _ in 0..3 {
        breaker.record_result("finnhub", Capability::Quote, false);
    }
    assert!(tessera.rate_limiter().try_acquire("finnhub", Capability::Quote));
    tokio::time::advance(std::time::Duration::from_secs(61)).await;

    // Breaker admits the probe, the empty bucket refuses it.
    tessera.quote(&eid(AAPL)).await.unwrap();
    let snap = breaker.snapshot("finnhub", Capability::Quote);
    assert_eq!(snap.state, CircuitState::HalfOpen);
    assert!(!snap.probe_in_flight);

    tessera.rate_limiter().reset("finnhub", Capability::Quote);
    let r = tessera.quote(&eid(AAPL)).await.unwrap();
    assert_eq!(r.source_of("price"), Some("finnhub"));
    assert_eq!(
        breaker.state("finnhub", Capability::Quote),
        CircuitState::Closed
    );
}
