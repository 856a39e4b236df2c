use std::sync::Arc;

use tessera::{BreakerConfig, Capability, CircuitBreaker, TesseraError};
use tessera_mock::MockBehavior;

use crate::helpers::{AAPL, Trio, eid, scripted};

#[tokio::test]
async fn all_circuits_open_fails_without_calling_anyone() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
        failure_threshold: 1,
        cooldown: std::time::Duration::from_secs(60),
    }));
    for name in ["finnhub", "fmp", "fallback"] {
        breaker.record_result(name, Capability::Quote, false);
    }
    let tessera = trio.builder().circuit_breaker(breaker).build().unwrap();

    let err = tessera.quote(&eid(AAPL)).await.unwrap_err();
    match err {
        TesseraError::CapabilityUnavailable {
            capability,
            entity,
            attempts,
        } => {
            assert_eq!(capability, "quote");
            assert_eq!(entity, "AAPL");
            assert_eq!(attempts.len(), 3);
            assert!(
                attempts
                    .iter()
                    .all(|e| matches!(e, TesseraError::CircuitOpen { .. }))
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    for s in [&trio.finnhub, &trio.fmp, &trio.fallback] {
        assert!(s.ctrl.calls().await.is_empty());
    }
}

#[tokio::test]
async fn every_provider_failing_reports_each_error() {
    let trio = Trio::new();
    trio.finnhub
        .ctrl
        .set_behavior(
            Capability::Quote,
            MockBehavior::Fail(TesseraError::unreachable("finnhub", "quote", "dns")),
        )
        .await;
    trio.fmp
        .ctrl
        .set_behavior(Capability::Quote, MockBehavior::empty())
        .await;
    // fallback has no rule and answers NotFound.
    let tessera = trio.builder().build().unwrap();

    let err = tessera.quote(&eid(AAPL)).await.unwrap_err();
    let TesseraError::CapabilityUnavailable { attempts, .. } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert!(matches!(attempts[0], TesseraError::ProviderUnreachable { .. }));
    assert!(matches!(attempts[1], TesseraError::ProviderDataError { .. }));
    assert!(matches!(attempts[2], TesseraError::NotFound { .. }));
    assert!(err.is_actionable());
    assert_eq!(err.flatten().len(), 3);
}

#[tokio::test]
async fn capability_without_adapters_is_unsupported() {
    let trio = Trio::new();
    let tessera = trio.builder().build().unwrap();
    let err = tessera.profile(&eid(AAPL)).await.unwrap_err();
    assert!(matches!(err, TesseraError::Unsupported { .. }));
}

#[tokio::test]
async fn single_provider_still_passes_both_guards() {
    let only = scripted("only", &[Capability::Profile]);
    only.ctrl
        .set_behavior(
            Capability::Profile,
            MockBehavior::Fail(TesseraError::unreachable("only", "profile", "down")),
        )
        .await;
    let tessera = tessera::Tessera::builder()
        .with_adapter(Arc::clone(&only.adapter))
        .breaker(
            "only",
            BreakerConfig {
                failure_threshold: 2,
                cooldown: std::time::Duration::from_secs(60),
            },
        )
        .build()
        .unwrap();

    for _ in 0..2 {
        assert!(tessera.profile(&eid(AAPL)).await.is_err());
    }
    assert_eq!(only.ctrl.call_count(Capability::Profile).await, 2);

    let err = tessera.profile(&eid(AAPL)).await.unwrap_err();
    assert_eq!(only.ctrl.call_count(Capability::Profile).await, 2);
    let TesseraError::CapabilityUnavailable { attempts, .. } = err else {
        panic!("expected CapabilityUnavailable");
    };
    assert!(matches!(attempts[..], [TesseraError::CircuitOpen { .. }]));
}
