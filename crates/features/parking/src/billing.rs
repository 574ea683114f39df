//! Pricing rules. Nothing here touches storage or the clock.

use chrono::{DateTime, NaiveTime, Utc};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Rounds to cents.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// What a finished stay costs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub duration_hours: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillingPolicy {
    /// Shortest billable stay, in hours.
    pub minimum_hours: f64,
    /// Largest accepted difference between a payment and the bill.
    pub payment_tolerance: f64,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self { minimum_hours: 0.01, payment_tolerance: 0.005 }
    }
}

impl BillingPolicy {
    /// Elapsed hours rounded to two decimals, never below `minimum_hours`.
    #[must_use]
    pub fn duration_hours(&self, parked_at: DateTime<Utc>, left_at: DateTime<Utc>) -> f64 {
        let seconds = (left_at - parked_at).num_milliseconds() as f64 / 1000.0;
        round2(seconds / SECONDS_PER_HOUR).max(self.minimum_hours)
    }

    #[must_use]
    pub fn quote(&self, parked_at: DateTime<Utc>, left_at: DateTime<Utc>, price_per_hour: f64) -> Quote {
        let duration_hours = self.duration_hours(parked_at, left_at);
        Quote { duration_hours, total_cost: round2(duration_hours * price_per_hour) }
    }

    #[must_use]
    pub fn accepts_payment(&self, amount: f64, total_cost: f64) -> bool {
        // Compare in cents so 0.005 itself is inside the tolerance.
        let diff = ((amount - total_cost).abs() * 1000.0).round();
        diff <= (self.payment_tolerance * 1000.0).round()
    }
}

/// Whether a lot with the given hours is open at `at`.
///
/// Missing hours (either end) mean the lot never closes. Equal ends mean open all
/// day. A close time before the open time is an overnight window.
#[must_use]
pub fn is_open(open: Option<NaiveTime>, close: Option<NaiveTime>, at: NaiveTime) -> bool {
    match (open, close) {
        (Some(open), Some(close)) if open < close => open <= at && at < close,
        (Some(open), Some(close)) if open > close => at >= open || at < close,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t(hm: &str) -> NaiveTime {
        NaiveTime::parse_from_str(hm, "%H:%M").expect("time")
    }

    #[test]
    fn durations_round_to_cents_with_a_floor() {
        let policy = BillingPolicy::default();
        let start = Utc::now();

        assert!((policy.duration_hours(start, start + Duration::minutes(90)) - 1.5).abs() < f64::EPSILON);
        assert!((policy.duration_hours(start, start + Duration::seconds(5)) - 0.01).abs() < f64::EPSILON);
        assert!((policy.duration_hours(start, start) - 0.01).abs() < f64::EPSILON);
        // 20 minutes = 0.3333 h
        assert!((policy.duration_hours(start, start + Duration::minutes(20)) - 0.33).abs() < f64::EPSILON);
    }

    #[test]
    fn quotes_multiply_by_the_hourly_price() {
        let policy = BillingPolicy::default();
        let start = Utc::now();

        let quote = policy.quote(start, start + Duration::minutes(150), 40.0);
        assert!((quote.duration_hours - 2.5).abs() < f64::EPSILON);
        assert!((quote.total_cost - 100.0).abs() < f64::EPSILON);

        let quote = policy.quote(start, start + Duration::minutes(20), 30.0);
        assert!((quote.total_cost - 9.9).abs() < 1e-9);
    }

    #[test]
    fn payments_must_match_within_half_a_cent() {
        let policy = BillingPolicy::default();
        assert!(policy.accepts_payment(100.0, 100.0));
        assert!(policy.accepts_payment(8.425, 8.42));
        assert!(policy.accepts_payment(8.415, 8.42));
        assert!(!policy.accepts_payment(8.43, 8.42));
        assert!(!policy.accepts_payment(0.0, 8.42));
    }

    #[test]
    fn opening_hours() {
        assert!(is_open(None, None, t("03:00")));
        assert!(is_open(Some(t("08:00")), None, t("03:00")));

        assert!(is_open(Some(t("08:00")), Some(t("20:00")), t("08:00")));
        assert!(is_open(Some(t("08:00")), Some(t("20:00")), t("19:59")));
        assert!(!is_open(Some(t("08:00")), Some(t("20:00")), t("20:00")));
        assert!(!is_open(Some(t("08:00")), Some(t("20:00")), t("07:00")));

        assert!(is_open(Some(t("22:00")), Some(t("06:00")), t("23:30")));
        assert!(is_open(Some(t("22:00")), Some(t("06:00")), t("05:59")));
        assert!(!is_open(Some(t("22:00")), Some(t("06:00")), t("12:00")));

        assert!(is_open(Some(t("00:00")), Some(t("00:00")), t("12:00")));
    }
}
