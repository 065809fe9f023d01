//! Financial aggregator
//!
//! Pure, order-independent sums over the current collections. All math is
//! exact [`Decimal`] arithmetic; rounding happens only in [`to_cents`] for
//! display. Empty collections contribute zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{Frequency, IncomeSource, ManualEstimate, Subscription};

/// How recurring income with a yearly frequency counts toward a month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomePolicy {
    /// Every income source counts at face value regardless of frequency
    #[default]
    FaceValue,
    /// Yearly income is divided by 12, like yearly subscriptions
    ProrateYearly,
}

impl IncomePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FaceValue => "face_value",
            Self::ProrateYearly => "prorate_yearly",
        }
    }
}

impl std::str::FromStr for IncomePolicy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "face_value" => Ok(Self::FaceValue),
            "prorate_yearly" => Ok(Self::ProrateYearly),
            other => Err(Error::Config(format!("unknown income policy: {}", other))),
        }
    }
}

/// Split subscriptions into (monthly, yearly)
pub fn partition(subs: &[Subscription]) -> (Vec<&Subscription>, Vec<&Subscription>) {
    subs.iter().partition(|s| s.frequency == Frequency::Monthly)
}

/// Monthly cost of a single subscription
pub fn monthly_equivalent(amount: Decimal, frequency: Frequency) -> Decimal {
    amount / frequency.months()
}

/// Sum of monthly subscriptions at face value
pub fn monthly_subscriptions_total(subs: &[Subscription]) -> Decimal {
    subs.iter()
        .filter(|s| s.frequency == Frequency::Monthly)
        .map(|s| s.amount)
        .sum()
}

/// Sum of yearly subscriptions at face value ("yearly commitments")
pub fn yearly_subscriptions_total(subs: &[Subscription]) -> Decimal {
    subs.iter()
        .filter(|s| s.frequency == Frequency::Yearly)
        .map(|s| s.amount)
        .sum()
}

/// Yearly subscriptions spread over twelve months
pub fn yearly_as_monthly(subs: &[Subscription]) -> Decimal {
    subs.iter()
        .filter(|s| s.frequency == Frequency::Yearly)
        .map(|s| monthly_equivalent(s.amount, s.frequency))
        .sum()
}

/// Total monthly spend obligation: monthly at face value plus yearly / 12
pub fn monthly_burn(subs: &[Subscription]) -> Decimal {
    monthly_subscriptions_total(subs) + yearly_as_monthly(subs)
}

/// Recurring income under the given policy
pub fn recurring_income(income: &[IncomeSource], policy: IncomePolicy) -> Decimal {
    income
        .iter()
        .map(|i| match policy {
            IncomePolicy::FaceValue => i.amount,
            IncomePolicy::ProrateYearly => monthly_equivalent(i.amount, i.frequency),
        })
        .sum()
}

pub fn estimates_total(estimates: &[ManualEstimate]) -> Decimal {
    estimates.iter().map(|e| e.amount).sum()
}

/// Recurring income plus manual estimates
pub fn monthly_income(
    income: &[IncomeSource],
    estimates: &[ManualEstimate],
    policy: IncomePolicy,
) -> Decimal {
    recurring_income(income, policy) + estimates_total(estimates)
}

pub fn net_cashflow(monthly_income: Decimal, monthly_burn: Decimal) -> Decimal {
    monthly_income - monthly_burn
}

/// Round to cents for display, halves away from zero
pub fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Figures behind the approved-subscriptions view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnSummary {
    /// Monthly subscriptions at face value
    pub monthly_total: Decimal,
    /// Yearly subscriptions at face value
    pub yearly_total: Decimal,
    /// Number of yearly subscriptions (the "danger zone")
    pub yearly_count: usize,
    pub monthly_burn: Decimal,
}

impl BurnSummary {
    pub fn compute(subs: &[Subscription]) -> Self {
        let (_, yearly) = partition(subs);
        Self {
            monthly_total: monthly_subscriptions_total(subs),
            yearly_total: yearly_subscriptions_total(subs),
            yearly_count: yearly.len(),
            monthly_burn: monthly_burn(subs),
        }
    }
}

/// Monthly runway: burn versus income
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunwaySummary {
    pub monthly_subscriptions: Decimal,
    pub yearly_as_monthly: Decimal,
    pub monthly_burn: Decimal,
    pub recurring_income: Decimal,
    pub estimates_total: Decimal,
    pub monthly_income: Decimal,
    pub net_cashflow: Decimal,
    pub income_policy: IncomePolicy,
}

impl RunwaySummary {
    pub fn compute(
        subs: &[Subscription],
        income: &[IncomeSource],
        estimates: &[ManualEstimate],
        policy: IncomePolicy,
    ) -> Self {
        let monthly_subscriptions = monthly_subscriptions_total(subs);
        let yearly_as_monthly = yearly_as_monthly(subs);
        let burn = monthly_subscriptions + yearly_as_monthly;
        let recurring = recurring_income(income, policy);
        let estimates_total = estimates_total(estimates);
        let income_total = recurring + estimates_total;

        Self {
            monthly_subscriptions,
            yearly_as_monthly,
            monthly_burn: burn,
            recurring_income: recurring,
            estimates_total,
            monthly_income: income_total,
            net_cashflow: net_cashflow(income_total, burn),
            income_policy: policy,
        }
    }

    /// Non-negative cashflow renders as a surplus
    pub fn is_positive(&self) -> bool {
        self.net_cashflow >= Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BankSource;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sub(merchant: &str, amount: &str, frequency: Frequency) -> Subscription {
        Subscription {
            id: format!("sub-{}", merchant),
            merchant: merchant.to_string(),
            amount: dec(amount),
            source: BankSource::new("Chase", "1234"),
            frequency,
            billing_day: 1,
            notes: String::new(),
            approved_at: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        }
    }

    fn income(amount: &str, frequency: Frequency) -> IncomeSource {
        IncomeSource {
            id: format!("inc-{}", amount),
            merchant: "Acme Payroll".into(),
            amount: dec(amount),
            source: BankSource::new("Chase", "1234"),
            frequency,
        }
    }

    fn estimate(label: &str, amount: &str) -> ManualEstimate {
        ManualEstimate {
            id: format!("est-{}", label),
            label: label.into(),
            amount: dec(amount),
        }
    }

    #[test]
    fn test_empty_collections_are_zero() {
        assert_eq!(monthly_burn(&[]), Decimal::ZERO);
        assert_eq!(monthly_income(&[], &[], IncomePolicy::FaceValue), Decimal::ZERO);
        let runway = RunwaySummary::compute(&[], &[], &[], IncomePolicy::FaceValue);
        assert_eq!(runway.net_cashflow, Decimal::ZERO);
        assert!(runway.is_positive());
    }

    #[test]
    fn test_monthly_burn_is_monthly_plus_yearly_over_twelve() {
        let subs = vec![
            sub("Netflix", "15.99", Frequency::Monthly),
            sub("Spotify", "10.99", Frequency::Monthly),
            sub("Adobe", "659.88", Frequency::Yearly),
            sub("Domain", "120.00", Frequency::Yearly),
        ];

        // 659.88 / 12 = 54.99, 120 / 12 = 10
        let expected = dec("15.99") + dec("10.99") + dec("54.99") + dec("10");
        assert_eq!(monthly_burn(&subs), expected);

        let mut reversed = subs.clone();
        reversed.reverse();
        assert_eq!(monthly_burn(&reversed), monthly_burn(&subs));
    }

    #[test]
    fn test_only_yearly_or_only_monthly() {
        let yearly = vec![sub("Domain", "120", Frequency::Yearly)];
        assert_eq!(monthly_burn(&yearly), dec("10"));

        let monthly = vec![sub("Gym", "45", Frequency::Monthly)];
        assert_eq!(monthly_burn(&monthly), dec("45"));
    }

    #[test]
    fn test_burn_summary() {
        let subs = vec![
            sub("Netflix", "15.99", Frequency::Monthly),
            sub("Adobe", "659.88", Frequency::Yearly),
            sub("NYT", "260.00", Frequency::Yearly),
        ];
        let summary = BurnSummary::compute(&subs);
        assert_eq!(summary.monthly_total, dec("15.99"));
        assert_eq!(summary.yearly_total, dec("919.88"));
        assert_eq!(summary.yearly_count, 2);
        assert_eq!(summary.monthly_burn, monthly_burn(&subs));
    }

    #[test]
    fn test_income_face_value_ignores_frequency() {
        let sources = vec![income("6000", Frequency::Monthly), income("1200", Frequency::Yearly)];
        assert_eq!(recurring_income(&sources, IncomePolicy::FaceValue), dec("7200"));
        assert_eq!(recurring_income(&sources, IncomePolicy::ProrateYearly), dec("6100"));
    }

    #[test]
    fn test_net_cashflow_exact_to_the_cent() {
        // 2762.88 monthly + 139/yr + 35.88/yr
        let subs = vec![
            sub("Rent", "2762.88", Frequency::Monthly),
            sub("Prime", "139", Frequency::Yearly),
            sub("Domain", "35.88", Frequency::Yearly),
        ];
        let sources = vec![income("6680.00", Frequency::Monthly)];

        let runway = RunwaySummary::compute(&subs, &sources, &[], IncomePolicy::FaceValue);
        assert_eq!(to_cents(runway.yearly_as_monthly), dec("14.57"));
        assert_eq!(runway.net_cashflow, runway.monthly_income - runway.monthly_burn);
        assert_eq!(to_cents(runway.net_cashflow), dec("3902.55"));
        assert!(runway.is_positive());
    }

    #[test]
    fn test_repeated_additions_do_not_drift() {
        let subs: Vec<_> = (0..1000)
            .map(|i| sub(&format!("s{}", i), "0.10", Frequency::Monthly))
            .collect();
        assert_eq!(monthly_burn(&subs), dec("100.00"));

        let estimates: Vec<_> = (0..3).map(|i| estimate(&i.to_string(), "0.1")).collect();
        assert_eq!(estimates_total(&estimates), dec("0.3"));
    }

    #[test]
    fn test_negative_runway() {
        let subs = vec![sub("Rent", "3000", Frequency::Monthly)];
        let runway = RunwaySummary::compute(
            &subs,
            &[],
            &[estimate("Side gig", "500")],
            IncomePolicy::FaceValue,
        );
        assert_eq!(runway.net_cashflow, dec("-2500"));
        assert!(!runway.is_positive());
    }

    #[test]
    fn test_to_cents_rounds_half_away_from_zero() {
        assert_eq!(to_cents(dec("1.005")), dec("1.01"));
        assert_eq!(to_cents(dec("-1.005")), dec("-1.01"));
        assert_eq!(to_cents(dec("2.004")), dec("2.00"));
    }

    #[test]
    fn test_income_policy_parse() {
        assert_eq!(
            IncomePolicy::from_str("prorate_yearly").unwrap(),
            IncomePolicy::ProrateYearly
        );
        assert!(IncomePolicy::from_str("weekly").is_err());
    }
}
