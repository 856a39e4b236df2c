use std::time::Duration;

use tessera::{AttemptOutcome, Capability, CircuitState, TesseraError};
use tessera_mock::MockBehavior;

use crate::helpers::{AAPL, Trio, eid};

fn first_error(report: &tessera::FetchReport) -> &TesseraError {
    match &report.attempts[0].outcome {
        AttemptOutcome::Failed(e) => e,
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_counts_as_failure_and_falls_through() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    trio.finnhub
        .ctrl
        .set_behavior(Capability::Quote, MockBehavior::Hang)
        .await;
    let tessera = trio
        .builder()
        .provider_timeout(Duration::from_millis(250))
        .without_cache()
        .build()
        .unwrap();

    let (record, report) = tessera
        .fetch_with_report(Capability::Quote, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(record.source_of("price"), Some("fmp"));
    assert!(matches!(
        first_error(&report),
        TesseraError::ProviderTimeout { provider, .. } if provider == "finnhub"
    ));
    assert!(report.attempts[0].duration.unwrap() >= Duration::from_millis(250));
    assert_eq!(
        tessera
            .circuit_breaker()
            .snapshot("finnhub", Capability::Quote)
            .consecutive_failures,
        1
    );
}

#[tokio::test]
async fn panicking_adapter_is_contained() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    trio.finnhub
        .ctrl
        .set_behavior(Capability::Quote, MockBehavior::Panic("boom".into()))
        .await;
    let tessera = trio.builder().without_cache().build().unwrap();

    let (record, report) = tessera
        .fetch_with_report(Capability::Quote, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(record.source_of("price"), Some("fmp"));
    assert!(matches!(first_error(&report), TesseraError::Other(_)));
    assert_eq!(
        tessera
            .circuit_breaker()
            .snapshot("finnhub", Capability::Quote)
            .consecutive_failures,
        1
    );
}

#[tokio::test]
async fn empty_and_unusable_answers_are_failures() {
    let trio = Trio::new();
    trio.script_quotes(1.0, 2.0, 3.0).await;
    trio.finnhub
        .ctrl
        .set_behavior(Capability::Quote, MockBehavior::empty())
        .await;
    trio.fmp
        .ctrl
        .set_behavior(
            Capability::Quote,
            MockBehavior::numbers(&[("price", f64::NAN), ("unrelated", 4.0)]),
        )
        .await;
    let tessera = trio.builder().without_cache().build().unwrap();

    let (record, report) = tessera
        .fetch_with_report(Capability::Quote, &eid(AAPL))
        .await
        .unwrap();
    assert_eq!(record.source_of("price"), Some("fallback"));
    assert!(matches!(
        first_error(&report),
        TesseraError::ProviderDataError { .. }
    ));
    assert!(matches!(
        &report.attempts[1].outcome,
        AttemptOutcome::Failed(TesseraError::ProviderDataError { .. })
    ));
    for name in ["finnhub", "fmp"] {
        assert_eq!(
            tessera
                .circuit_breaker()
                .snapshot(name, Capability::Quote)
                .consecutive_failures,
            1
        );
    }
}

#[tokio::test(start_paused = true)]
async fn abandoned_fetch_still_settles_breaker() {
    let trio = Trio::new();
    trio.finnhub
        .ctrl
        .set_behavior(
            Capability::Quote,
            MockBehavior::Fail(TesseraError::unreachable("finnhub", "quote", "reset"))
                .delayed(Duration::from_secs(10)),
        )
        .await;
    let tessera = trio
        .builder()
        .breaker(
            "finnhub",
            tessera::BreakerConfig {
                failure_threshold: 1,
                cooldown: Duration::from_secs(60),
            },
        )
        .provider_timeout(Duration::from_secs(30))
        .without_cache()
        .build()
        .unwrap();

    let gave_up = tokio::time::timeout(
        Duration::from_secs(1),
        tessera.quote(&eid(AAPL)),
    )
    .await;
    assert!(gave_up.is_err());
    assert_eq!(
        tessera.circuit_breaker().state("finnhub", Capability::Quote),
        CircuitState::Closed
    );

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(
        tessera.circuit_breaker().state("finnhub", Capability::Quote),
        CircuitState::Open
    );
    assert_eq!(trio.finnhub.ctrl.call_count(Capability::Quote).await, 1);
}
