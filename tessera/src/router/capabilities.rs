use tessera_core::Capability;

use crate::Tessera;
use crate::tessera_router_method;

impl Tessera {
    tessera_router_method! {
        /// Fetch the fundamentals composite (profitability, growth, valuation).
        ///
        /// Growth and ratio fields are percentages regardless of how each
        /// provider reports them.
        method: fundamentals,
        capability: Capability::Fundamentals,
        many:
            /// Fetch fundamentals for several entities.
            fundamentals_many
    }

    tessera_router_method! {
        /// Fetch a point-in-time quote.
        method: quote,
        capability: Capability::Quote,
        many:
            /// Fetch quotes for several entities.
            quotes
    }

    tessera_router_method! {
        /// Fetch daily close and volume series.
        ///
        /// Cached until the next session close by default.
        method: price_history,
        capability: Capability::PriceHistory
    }

    tessera_router_method! {
        /// Fetch the current session's intraday close and volume series.
        method: intraday_series,
        capability: Capability::IntradaySeries
    }

    tessera_router_method! {
        /// Fetch the screening row (price, change, volume, market cap) for one
        /// entity.
        method: batch_scan,
        capability: Capability::BatchScan,
        many:
            /// Fetch screening rows for a universe of entities.
            batch_scan_many
    }

    tessera_router_method! {
        /// Fetch slow-changing company attributes.
        method: profile,
        capability: Capability::Profile
    }
}
