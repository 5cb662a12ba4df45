use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use tarragona_domain::{Confidence, ProductId, SalesRecord, TrendDirection, TrendMetrics, TrendStrength, VelocityTrendSignal};

/// §4.2 Velocity Analyzer. Pure function over a product's sales history;
/// no I/O, no partial results — a product with no sales returns the
/// zero-fallback rather than an error (§4.2 error case, §7 recoverables).
pub fn analyze(product_id: ProductId, history: &[SalesRecord], today: NaiveDate) -> TrendMetrics {
    if history.is_empty() {
        return TrendMetrics::zero(product_id);
    }

    let window_90 = window_velocity(history, today, 90);
    let window_180 = window_velocity(history, today, 180);
    let prior_90 = window_velocity_offset(history, today, 90, 90);

    let weekly: Vec<Decimal> = history
        .iter()
        .filter(|r| r.week_start > today - chrono::Duration::days(90))
        .map(|r| r.quantity_m2)
        .collect();
    let sample_count = weekly.len();
    let cv = coefficient_of_variation(&weekly);

    let change_pct = percent_change(prior_90, window_90);
    let (direction, strength) = classify_direction(change_pct);
    let velocity_trend_signal = classify_trend_signal(window_90, window_180);
    let confidence = classify_confidence(sample_count, cv);

    TrendMetrics {
        product_id,
        daily_velocity_m2: window_90,
        coefficient_of_variation: cv,
        sample_count,
        confidence,
        direction,
        strength,
        change_pct,
        velocity_trend_signal,
        velocity_90d: window_90,
        velocity_180d: window_180,
    }
}

/// Mean daily m² over `(today - lookback_days, today]`.
fn window_velocity(history: &[SalesRecord], today: NaiveDate, lookback_days: i64) -> Decimal {
    window_velocity_offset(history, today, lookback_days, 0)
}

/// Mean daily m² over a window of `lookback_days` ending `offset_days` before today.
fn window_velocity_offset(history: &[SalesRecord], today: NaiveDate, lookback_days: i64, offset_days: i64) -> Decimal {
    let window_end = today - chrono::Duration::days(offset_days);
    let window_start = window_end - chrono::Duration::days(lookback_days);
    let total: Decimal = history
        .iter()
        .filter(|r| r.week_start > window_start && r.week_start <= window_end)
        .map(|r| r.quantity_m2)
        .sum();
    if lookback_days == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(lookback_days)
    }
}

fn percent_change(prior: Decimal, current: Decimal) -> Decimal {
    if prior == Decimal::ZERO {
        if current == Decimal::ZERO {
            Decimal::ZERO
        } else {
            Decimal::from(100)
        }
    } else {
        (current - prior) / prior * Decimal::from(100)
    }
}

/// `stable` if |change%| < 5, else sign of change%; `strong` if |change%| >= 20,
/// `moderate` if >= 5 (§4.2).
fn classify_direction(change_pct: Decimal) -> (TrendDirection, TrendStrength) {
    let magnitude = change_pct.abs();
    if magnitude < Decimal::from(5) {
        return (TrendDirection::Stable, TrendStrength::None);
    }
    let direction = if change_pct > Decimal::ZERO {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };
    let strength = if magnitude >= Decimal::from(20) {
        TrendStrength::Strong
    } else {
        TrendStrength::Moderate
    };
    (direction, strength)
}

/// Ratio of 90-day to 180-day velocity crossed 1.20 / 0.80 thresholds (§4.2).
fn classify_trend_signal(velocity_90d: Decimal, velocity_180d: Decimal) -> VelocityTrendSignal {
    if velocity_180d == Decimal::ZERO {
        return VelocityTrendSignal::Stable;
    }
    let ratio = velocity_90d / velocity_180d;
    if ratio >= Decimal::new(120, 2) {
        VelocityTrendSignal::Growing
    } else if ratio <= Decimal::new(80, 2) {
        VelocityTrendSignal::Declining
    } else {
        VelocityTrendSignal::Stable
    }
}

/// `(sample_count >= 8 && cv < 0.5) -> high; (sample_count >= 4 && cv < 1.0) -> medium; else low` (§4.2).
fn classify_confidence(sample_count: usize, cv: Decimal) -> Confidence {
    if sample_count >= 8 && cv < Decimal::new(5, 1) {
        Confidence::High
    } else if sample_count >= 4 && cv < Decimal::ONE {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn coefficient_of_variation(weekly: &[Decimal]) -> Decimal {
    if weekly.is_empty() {
        return Decimal::ZERO;
    }
    let n = Decimal::from(weekly.len());
    let mean = weekly.iter().sum::<Decimal>() / n;
    if mean == Decimal::ZERO {
        return Decimal::ZERO;
    }
    let variance = weekly.iter().map(|v| (*v - mean) * (*v - mean)).sum::<Decimal>() / n;
    let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO);
    std_dev / mean
}

/// Convenience used by C9's safety-stock formula, which needs a plain f64
/// square root of a decimal variance; kept isolated so the rest of the
/// pipeline stays on exact decimal arithmetic (§9.1).
pub fn std_dev(weekly: &[Decimal]) -> Decimal {
    if weekly.len() < 2 {
        return Decimal::ZERO;
    }
    let n = Decimal::from(weekly.len());
    let mean = weekly.iter().sum::<Decimal>() / n;
    let variance = weekly.iter().map(|v| (*v - mean) * (*v - mean)).sum::<Decimal>() / n;
    variance.sqrt().unwrap_or(Decimal::ZERO)
}

pub fn velocity_as_f64(v: Decimal) -> f64 {
    v.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tarragona_domain::ProductId;

    fn record(product_id: ProductId, week_start: NaiveDate, qty: Decimal) -> SalesRecord {
        SalesRecord {
            product_id,
            week_start,
            quantity_m2: qty,
            customer: None,
            total_price_usd: None,
        }
    }

    #[test]
    fn zero_sales_falls_back_to_zero_velocity() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let metrics = analyze(ProductId::new(), &[], today);
        assert_eq!(metrics.daily_velocity_m2, Decimal::ZERO);
        assert_eq!(metrics.direction, TrendDirection::Stable);
        assert_eq!(metrics.confidence, Confidence::Low);
    }

    #[test]
    fn stable_trend_within_five_percent() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let product_id = ProductId::new();
        let mut history = Vec::new();
        let mut week = today - chrono::Duration::days(175);
        while week <= today {
            history.push(record(product_id, week, dec!(700)));
            week += chrono::Duration::weeks(1);
        }
        let metrics = analyze(product_id, &history, today);
        assert_eq!(metrics.direction, TrendDirection::Stable);
    }
}
