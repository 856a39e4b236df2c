mod common;

use std::sync::Arc;

use tessera::{Capability, EntityId, Tessera};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::init_logging();

    let caps = [Capability::Fundamentals];
    let (finnhub, finnhub_ctl) = common::provider("finnhub", &caps);
    let (fmp, fmp_ctl) = common::provider("fmp", &caps);
    let (fallback, fallback_ctl) = common::provider("fallback", &caps);
    common::script_fundamentals(&finnhub_ctl, &fmp_ctl, &fallback_ctl).await;

    let tessera = Tessera::builder()
        .with_adapter(Arc::clone(&finnhub))
        .with_adapter(Arc::clone(&fmp))
        .with_adapter(Arc::clone(&fallback))
        .prefer_for(Capability::Fundamentals, &[finnhub, fmp, fallback])
        .field_maps(common::field_maps()?)
        .without_cache()
        .build()?;

    let aapl = EntityId::new("AAPL")?;
    let (record, report) = tessera
        .fetch_with_report(Capability::Fundamentals, &aapl)
        .await?;

    println!("{}", report.summary());
    for (field, value) in record.fields() {
        match value {
            Some(v) => println!(
                "  {:<16} {:>10.2}  ({})",
                field.as_str(),
                v.as_f64().unwrap_or(f64::NAN),
                record.source_of(field.as_str()).unwrap_or("?")
            ),
            None => println!("  {:<16} {:>10}", field.as_str(), "-"),
        }
    }
    Ok(())
}
