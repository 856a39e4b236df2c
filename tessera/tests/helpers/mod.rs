// Shared fixtures for orchestrator tests; not every test module uses all of them.
#![allow(dead_code)]

use std::sync::Arc;

use tessera::{Capability, EntityId, FieldMaps, ProviderAdapter, Transform};
use tessera_mock::{DynamicMockAdapter, DynamicMockController, MockBehavior};

/// Common entity constants used across tests.
pub const AAPL: &str = "AAPL";
pub const MSFT: &str = "MSFT";
pub const UNKNOWN: &str = "ZZZZ";

pub fn eid(s: &str) -> EntityId {
    EntityId::new(s).unwrap()
}

pub fn approx(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|a| (a - expected).abs() < 1e-9)
}

/// A scripted provider and the handle that drives it.
pub struct Scripted {
    pub adapter: Arc<dyn ProviderAdapter>,
    pub ctrl: DynamicMockController,
}

pub fn scripted(name: &'static str, capabilities: &[Capability]) -> Scripted {
    let (adapter, ctrl) = DynamicMockAdapter::new_with_controller(name, capabilities);
    Scripted { adapter, ctrl }
}

/// Finnhub reports ROE as a fraction under its own key; FMP reports growth
/// as percentages under camelCase keys.
pub fn fundamentals_maps() -> FieldMaps {
    FieldMaps::new()
        .with(
            "finnhub",
            Capability::Fundamentals,
            &[
                ("roe", "roeTTM", Transform::FractionToPercent),
                ("pe_ratio", "peTTM", Transform::Identity),
            ],
        )
        .unwrap()
        .with(
            "fmp",
            Capability::Fundamentals,
            &[
                ("eps_growth", "epsGrowth", Transform::Identity),
                ("revenue_growth", "revenueGrowth", Transform::Identity),
                ("roe", "returnOnEquity", Transform::Identity),
            ],
        )
        .unwrap()
}

/// Finnhub, FMP, and a generic fallback, all serving fundamentals and quotes.
pub struct Trio {
    pub finnhub: Scripted,
    pub fmp: Scripted,
    pub fallback: Scripted,
}

impl Trio {
    pub fn new() -> Self {
        let caps = [Capability::Fundamentals, Capability::Quote];
        Self {
            finnhub: scripted("finnhub", &caps),
            fmp: scripted("fmp", &caps),
            fallback: scripted("fallback", &caps),
        }
    }

    pub fn adapters(&self) -> [Arc<dyn ProviderAdapter>; 3] {
        [
            Arc::clone(&self.finnhub.adapter),
            Arc::clone(&self.fmp.adapter),
            Arc::clone(&self.fallback.adapter),
        ]
    }

    /// Builder with all three registered, ranked finnhub > fmp > fallback for
    /// every capability they serve.
    pub fn builder(&self) -> tessera::TesseraBuilder {
        let ranked = self.adapters();
        let mut b = tessera::Tessera::builder().field_maps(fundamentals_maps());
        for a in &ranked {
            b = b.with_adapter(Arc::clone(a));
        }
        b.prefer_for(Capability::Fundamentals, &ranked)
            .prefer_for(Capability::Quote, &ranked)
    }

    /// Finnhub knows only ROE, FMP only growth, the fallback everything.
    pub async fn script_fundamentals(&self) {
        self.finnhub
            .ctrl
            .set_behavior(
                Capability::Fundamentals,
                MockBehavior::numbers(&[("roeTTM", 0.152)]),
            )
            .await;
        self.fmp
            .ctrl
            .set_behavior(
                Capability::Fundamentals,
                MockBehavior::numbers(&[("epsGrowth", 18.3), ("revenueGrowth", 12.0)]),
            )
            .await;
        self.fallback
            .ctrl
            .set_behavior(
                Capability::Fundamentals,
                MockBehavior::numbers(&[
                    ("roe", 99.0),
                    ("eps_growth", 99.0),
                    ("revenue_growth", 99.0),
                ]),
            )
            .await;
    }

    pub async fn script_quotes(&self, finnhub: f64, fmp: f64, fallback: f64) {
        for (s, price) in [
            (&self.finnhub, finnhub),
            (&self.fmp, fmp),
            (&self.fallback, fallback),
        ] {
            s.ctrl
                .set_behavior(Capability::Quote, MockBehavior::numbers(&[("price", price)]))
                .await;
        }
    }
}
