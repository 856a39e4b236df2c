// Each demo uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use tessera::{Capability, FieldMaps, ProviderAdapter, Transform};
use tessera_mock::{DynamicMockAdapter, DynamicMockController, MockBehavior};

/// Log to stderr, filtered by `RUST_LOG` (defaults to `tessera=debug`).
///
/// Provider-level events need the `tracing` feature:
/// `cargo run -p tessera --features tracing --example <name>`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tessera=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A scripted stand-in for a real provider.
pub fn provider(
    name: &'static str,
    capabilities: &[Capability],
) -> (Arc<dyn ProviderAdapter>, DynamicMockController) {
    DynamicMockAdapter::new_with_controller(name, capabilities)
}

/// Finnhub reports ROE as a fraction; FMP reports growth in percent.
pub fn field_maps() -> Result<FieldMaps, tessera::TesseraError> {
    FieldMaps::new()
        .with(
            "finnhub",
            Capability::Fundamentals,
            &[("roe", "roeTTM", Transform::FractionToPercent)],
        )?
        .with(
            "fmp",
            Capability::Fundamentals,
            &[
                ("eps_growth", "epsGrowth", Transform::Identity),
                ("revenue_growth", "revenueGrowth", Transform::Identity),
            ],
        )
}

pub async fn script_fundamentals(
    finnhub: &DynamicMockController,
    fmp: &DynamicMockController,
    fallback: &DynamicMockController,
) {
    finnhub
        .set_behavior(
            Capability::Fundamentals,
            MockBehavior::numbers(&[("roeTTM", 1.4725)]),
        )
        .await;
    fmp.set_behavior(
        Capability::Fundamentals,
        MockBehavior::numbers(&[("epsGrowth", 10.9), ("revenueGrowth", 2.1)]),
    )
    .await;
    fallback
        .set_behavior(
            Capability::Fundamentals,
            MockBehavior::numbers(&[("roe", 150.0), ("pe_ratio", 29.8)]),
        )
        .await;
}
