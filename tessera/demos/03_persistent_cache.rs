mod common;

use std::sync::Arc;

use tessera::{Capability, EntityId, JsonFileCacheStore, Tessera};

async fn open(
    dir: &std::path::Path,
    schema_version: u32,
) -> Result<(Tessera, tessera_mock::DynamicMockController), Box<dyn std::error::Error>> {
    let (fallback, ctl) = common::provider("fallback", &[Capability::Fundamentals]);
    ctl.set_behavior(
        Capability::Fundamentals,
        tessera_mock::MockBehavior::numbers(&[
            ("roe", 38.5),
            ("eps_growth", 12.4),
            ("revenue_growth", 15.7),
        ]),
    )
    .await;
    let tessera = Tessera::builder()
        .with_adapter(fallback)
        .cache_store(Arc::new(JsonFileCacheStore::new(dir)))
        .schema_version(schema_version)
        .build()?;
    Ok((tessera, ctl))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::init_logging();

    let dir = std::env::temp_dir().join("tessera-demo-cache");
    let goog = EntityId::new("GOOG")?;

    for (label, version) in [("first run", 1), ("restart", 1), ("schema bump", 2)] {
        let (tessera, ctl) = open(&dir, version).await?;
        let (record, report) = tessera
            .fetch_with_report(Capability::Fundamentals, &goog)
            .await?;
        println!(
            "{label:<12} v{version}: cache {:?}, provider calls {}, roe {:?}",
            report.cache,
            ctl.call_count(Capability::Fundamentals).await,
            record.number("roe")
        );
    }

    println!("cache files under {}", dir.display());
    Ok(())
}
