use std::sync::Arc;
use std::time::Duration;

use tessera::{BreakerConfig, Capability, CircuitState, SkipReason, TesseraError};
use tessera_mock::MockBehavior;

use crate::helpers::{AAPL, MSFT, Trio, eid};

fn fragile() -> BreakerConfig {
    BreakerConfig {
        failure_threshold: 2,
        cooldown: Duration::from_secs(30),
    }
}

#[tokio::test(start_paused = true)]
async fn failing_provider_is_isolated_then_probed_back() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    trio.finnhub
        .ctrl
        .set_behavior(
            Capability::Quote,
            MockBehavior::Fail(TesseraError::unreachable("finnhub", "quote", "503")),
        )
        .await;
    let tessera = trio
        .builder()
        .breaker("finnhub", fragile())
        .without_cache()
        .build()
        .unwrap();

    for _ in 0..2 {
        let r = tessera.quote(&eid(AAPL)).await.unwrap();
        assert_eq!(r.source_of("price"), Some("fmp"));
    }
    assert_eq!(
        tessera.circuit_breaker().state("finnhub", Capability::Quote),
        CircuitState::Open
    );

    let (_, report) = tessera
        .fetch_with_report(Capability::Quote, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(
        report.skips().next(),
        Some(("finnhub", SkipReason::CircuitOpen))
    );
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Quote).await, 2);

    // Other capabilities of the same provider are unaffected.
    assert_eq!(
        tessera
            .circuit_breaker()
            .state("finnhub", Capability::Fundamentals),
        CircuitState::Closed
    );

    trio.finnhub
        .ctrl
        .set_behavior(Capability::Quote, MockBehavior::numbers(&[("price", 1.0)]))
        .await;
    tokio::time::advance(Duration::from_secs(30)).await;

    let r = tessera.quote(&eid(MSFT)).await.unwrap();
    assert_eq!(r.source_of("price"), Some("finnhub"));
    let snap = tessera
        .circuit_breaker()
        .snapshot("finnhub", Capability::Quote);
    assert_eq!(snap.state, CircuitState::Closed);
    assert_eq!(snap.consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn failed_probe_reopens_and_restarts_cooldown() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    trio.finnhub
        .ctrl
        .set_behavior(
            Capability::Quote,
            MockBehavior::Fail(TesseraError::unreachable("finnhub", "quote", "503")),
        )
        .await;
    let tessera = trio
        .builder()
        .breaker("finnhub", fragile())
        .without_cache()
        .build()
        .unwrap();

    for _ in 0..2 {
        tessera.quote(&eid(AAPL)).await.unwrap();
    }
    tokio::time::advance(Duration::from_secs(30)).await;
    tessera.quote(&eid(AAPL)).await.unwrap();
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Quote).await, 3);
    assert_eq!(
        tessera.circuit_breaker().state("finnhub", Capability::Quote),
        CircuitState::Open
    );

    tokio::time::advance(Duration::from_secs(29)).await;
    tessera.quote(&eid(AAPL)).await.unwrap();
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Quote).await, 3);
}

#[tokio::test]
async fn provider_health_lists_every_served_key() {
    let trio = Trio::new();
    let tessera = trio.builder().build().unwrap();
    let health = tessera.provider_health();
    assert_eq!(health.len(), 6);
    assert!(health.iter().all(|h| h.circuit.state == CircuitState::Closed));
    let finnhub_quote = health
        .iter()
        .find(|h| h.provider == "finnhub" && h.capability == Capability::Quote)
        .unwrap();
    assert!((finnhub_quote.rate.capacity - 10.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn shared_breaker_spans_orchestrators() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    let breaker = Arc::new(tessera::CircuitBreaker::new(fragile()));
    let first = trio
        .builder()
        .circuit_breaker(Arc::clone(&breaker))
        .build()
        .unwrap();
    let second = trio
        .builder()
        .circuit_breaker(Arc::clone(&breaker))
        .without_cache()
        .build()
        .unwrap();

    breaker.record_result("finnhub", Capability::Quote, false);
    breaker.record_result("finnhub", Capability::Quote, false);
    assert!(Arc::ptr_eq(first.circuit_breaker(), second.circuit_breaker()));
    let r = second.quote(&eid(AAPL)).await.unwrap();
    assert_eq!(r.source_of("price"), Some("fmp"));
}
