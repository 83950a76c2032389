// src/derived/cagr.rs
//! Compound annual growth rate over a price history.

/// 365.25 days.
pub const SECONDS_PER_JULIAN_YEAR: f64 = 31_557_600.0;

/// One historical observation: unix seconds and price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub ts: i64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CagrError {
    #[error("Datos insuficientes: se necesitan al menos dos cotizaciones")]
    InsufficientPoints,
    #[error("Datos insuficientes: precio inicial no válido")]
    InvalidStartPrice,
    #[error("Datos insuficientes: el histórico abarca menos de un año")]
    SpanUnderOneYear,
    #[error("Datos insuficientes: resultado no numérico")]
    NotANumber,
}

/// `((last / first) ^ (1 / years) - 1) * 100` for points ordered oldest first.
pub fn compound_annual_growth_rate(points: &[PricePoint]) -> Result<f64, CagrError> {
    let (first, last) = match points {
        [first, .., last] => (first, last),
        _ => return Err(CagrError::InsufficientPoints),
    };
    if first.price <= 0.0 {
        return Err(CagrError::InvalidStartPrice);
    }
    let years = (last.ts - first.ts) as f64 / SECONDS_PER_JULIAN_YEAR;
    if years < 1.0 {
        return Err(CagrError::SpanUnderOneYear);
    }
    let rate = ((last.price / first.price).powf(1.0 / years) - 1.0) * 100.0;
    if rate.is_finite() {
        Ok(rate)
    } else {
        Err(CagrError::NotANumber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_500_000_000;
    const YEAR: i64 = SECONDS_PER_JULIAN_YEAR as i64;

    fn p(ts: i64, price: f64) -> PricePoint {
        PricePoint { ts, price }
    }

    #[test]
    fn two_years_ten_percent() {
        let rate = compound_annual_growth_rate(&[p(T0, 100.0), p(T0 + 2 * YEAR, 121.0)]).unwrap();
        assert!((rate - 10.0).abs() < 1e-9, "got {rate}");
    }

    #[test]
    fn inner_points_are_ignored() {
        let pts = [p(T0, 100.0), p(T0 + YEAR, 50.0), p(T0 + 2 * YEAR, 121.0)];
        let rate = compound_annual_growth_rate(&pts).unwrap();
        assert!((rate - 10.0).abs() < 1e-9);
    }

    #[test]
    fn losses_are_negative() {
        let rate = compound_annual_growth_rate(&[p(T0, 100.0), p(T0 + YEAR, 90.0)]).unwrap();
        assert!((rate + 10.0).abs() < 1e-9);
    }

    #[test]
    fn insufficient_inputs_are_descriptive_errors() {
        assert_eq!(compound_annual_growth_rate(&[]), Err(CagrError::InsufficientPoints));
        assert_eq!(
            compound_annual_growth_rate(&[p(T0, 100.0)]),
            Err(CagrError::InsufficientPoints)
        );
        assert_eq!(
            compound_annual_growth_rate(&[p(T0, 0.0), p(T0 + 2 * YEAR, 10.0)]),
            Err(CagrError::InvalidStartPrice)
        );
        assert_eq!(
            compound_annual_growth_rate(&[p(T0, 100.0), p(T0 + YEAR / 2, 110.0)]),
            Err(CagrError::SpanUnderOneYear)
        );
        assert!(CagrError::InsufficientPoints
            .to_string()
            .starts_with("Datos insuficientes"));
    }
}
