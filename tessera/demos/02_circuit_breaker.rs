mod common;

use std::sync::Arc;
use std::time::Duration;

use tessera::{BreakerConfig, Capability, EntityId, Tessera, TesseraError};
use tessera_mock::MockBehavior;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::init_logging();

    let caps = [Capability::Quote];
    let (primary, primary_ctl) = common::provider("primary", &caps);
    let (backup, backup_ctl) = common::provider("backup", &caps);
    primary_ctl
        .set_behavior(
            Capability::Quote,
            MockBehavior::Fail(TesseraError::unreachable(
                "primary",
                Capability::Quote,
                "connection reset",
            )),
        )
        .await;
    backup_ctl
        .set_behavior(Capability::Quote, MockBehavior::numbers(&[("price", 415.5)]))
        .await;

    let tessera = Tessera::builder()
        .with_adapter(Arc::clone(&primary))
        .with_adapter(Arc::clone(&backup))
        .prefer_for(Capability::Quote, &[primary, backup])
        .breaker(
            "primary",
            BreakerConfig {
                failure_threshold: 2,
                cooldown: Duration::from_secs(1),
            },
        )
        .without_cache()
        .build()?;

    let msft = EntityId::new("MSFT")?;
    for round in 1..=4 {
        let (quote, report) = tessera.fetch_with_report(Capability::Quote, &msft).await?;
        let circuit = tessera.circuit_breaker().snapshot("primary", Capability::Quote);
        println!(
            "round {round}: price {:?} from {:?}; primary circuit {} after {} failures",
            quote.number("price"),
            quote.source_of("price"),
            circuit.state,
            circuit.consecutive_failures
        );
        println!("  {}", report.summary());
    }

    println!("primary recovers; waiting out the cooldown");
    primary_ctl
        .set_behavior(Capability::Quote, MockBehavior::numbers(&[("price", 415.75)]))
        .await;
    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let quote = tessera.quote(&msft).await?;
    println!(
        "probe: price {:?} from {:?}; primary circuit {}",
        quote.number("price"),
        quote.source_of("price"),
        tessera.circuit_breaker().state("primary", Capability::Quote)
    );

    for h in tessera.provider_health() {
        println!(
            "{:<8} {:<12} circuit={} tokens={:.1}/{:.0}",
            h.provider,
            h.capability.as_str(),
            h.circuit.state,
            h.rate.tokens,
            h.rate.capacity
        );
    }
    Ok(())
}
