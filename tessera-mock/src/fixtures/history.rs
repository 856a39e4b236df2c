use tessera_core::RawValue;

// 2024-01-02 00:00:00 UTC
const DAY0: i64 = 1_704_153_600;
const DAY: i64 = 86_400;
// 2024-01-02 14:30:00 UTC
const SESSION_OPEN: i64 = DAY0 + 14 * 3_600 + 1_800;

fn closes(s: &str) -> Option<&'static [f64]> {
    match s {
        "AAPL" => Some(&[185.64, 184.25, 181.91, 181.18, 185.56]),
        "MSFT" => Some(&[370.87, 370.6, 367.94, 367.75, 374.69]),
        "GOOG" => Some(&[139.56, 140.36, 138.04, 137.39, 141.34]),
        _ => None,
    }
}

fn series(closes: &[f64], start: i64, step: i64) -> (RawValue, RawValue) {
    let mut ts = start;
    let mut close = Vec::with_capacity(closes.len());
    let mut volume = Vec::with_capacity(closes.len());
    for (i, c) in closes.iter().enumerate() {
        close.push((ts, *c));
        volume.push((ts, 1_000_000.0 * (i as f64 + 1.0)));
        ts += step;
    }
    (RawValue::Series(close), RawValue::Series(volume))
}

pub fn daily_by_symbol(s: &str) -> Option<Vec<(&'static str, RawValue)>> {
    let (close, volume) = series(closes(s)?, DAY0, DAY);
    Some(vec![("close", close), ("volume", volume)])
}

pub fn intraday_by_symbol(s: &str) -> Option<Vec<(&'static str, RawValue)>> {
    let (close, volume) = series(closes(s)?, SESSION_OPEN, 300);
    Some(vec![("close", close), ("volume", volume)])
}
