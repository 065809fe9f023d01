//! Subscription lifecycle store
//!
//! A [`Ledger`] holds one session's collections: the inbox of unreviewed
//! charges, the approved subscriptions, read-only income sources and manual
//! estimates. Approve and unapprove move a charge between inbox and approved,
//! so a logical charge is never in both.
//!
//! Unapprove is lossy: the restored transaction takes `approved_at` as its
//! date, and `notes`, `billing_day` and `frequency` are discarded.
//!
//! The ledger remembers which inbox charge each subscription came from, so
//! a later sync cannot put an approved charge back in the inbox.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::aggregate::{BurnSummary, IncomePolicy, RunwaySummary};
use crate::error::{Error, Result};
use crate::models::{
    Frequency, IncomeSource, ManualEstimate, Snapshot, Subscription, Transaction,
};

/// Amount at or above which an approval without an explicit frequency is
/// treated as a yearly charge
pub const DEFAULT_YEARLY_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;

/// Mint a prefixed id like `sub-6f1c...`
fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// In-memory collections for one session
#[derive(Debug, Clone)]
pub struct Ledger {
    inbox: Vec<Transaction>,
    approved: Vec<Subscription>,
    income: Vec<IncomeSource>,
    estimates: Vec<ManualEstimate>,
    /// Subscription id -> id of the inbox charge it was approved from
    origins: HashMap<String, String>,
    yearly_threshold: Decimal,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            inbox: Vec::new(),
            approved: Vec::new(),
            income: Vec::new(),
            estimates: Vec::new(),
            origins: HashMap::new(),
            yearly_threshold: DEFAULT_YEARLY_THRESHOLD,
        }
    }

    /// Seed a ledger from a snapshot document
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inbox: snapshot.transactions,
            approved: snapshot.subscriptions,
            income: snapshot.income,
            estimates: snapshot.estimates,
            origins: HashMap::new(),
            yearly_threshold: DEFAULT_YEARLY_THRESHOLD,
        }
    }

    pub fn with_yearly_threshold(mut self, threshold: Decimal) -> Self {
        self.yearly_threshold = threshold;
        self
    }

    pub fn yearly_threshold(&self) -> Decimal {
        self.yearly_threshold
    }

    /// Copy out the current collections
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            transactions: self.inbox.clone(),
            subscriptions: self.approved.clone(),
            income: self.income.clone(),
            estimates: self.estimates.clone(),
        }
    }

    pub fn inbox(&self) -> &[Transaction] {
        &self.inbox
    }

    pub fn approved(&self) -> &[Subscription] {
        &self.approved
    }

    pub fn income(&self) -> &[IncomeSource] {
        &self.income
    }

    pub fn estimates(&self) -> &[ManualEstimate] {
        &self.estimates
    }

    /// Swap the inbox for a freshly synced batch
    ///
    /// Approved subscriptions are untouched, and charges they were approved
    /// from are dropped from the batch.
    pub fn replace_inbox(&mut self, transactions: Vec<Transaction>) {
        let incoming = transactions.len();
        let inbox: Vec<Transaction> = transactions
            .into_iter()
            .filter(|t| !self.is_approved_charge(&t.id))
            .collect();

        debug!(
            previous = self.inbox.len(),
            incoming,
            already_approved = incoming - inbox.len(),
            "Replacing inbox"
        );
        self.inbox = inbox;
    }

    /// Whether `transaction_id` was approved into a subscription still held
    pub fn is_approved_charge(&self, transaction_id: &str) -> bool {
        self.origins.values().any(|origin| origin == transaction_id)
    }

    /// Guess a billing period from the charge amount
    pub fn infer_frequency(&self, amount: Decimal) -> Frequency {
        if amount >= self.yearly_threshold {
            Frequency::Yearly
        } else {
            Frequency::Monthly
        }
    }

    /// Confirm an inbox charge as a recurring subscription
    ///
    /// Uses `frequency` when the caller chose one, otherwise the amount
    /// heuristic. Billing day is the charge's day of month.
    pub fn approve(
        &mut self,
        transaction_id: &str,
        frequency: Option<Frequency>,
        today: NaiveDate,
    ) -> Result<Subscription> {
        let pos = self
            .inbox
            .iter()
            .position(|t| t.id == transaction_id)
            .ok_or_else(|| Error::NotFound(format!("transaction {}", transaction_id)))?;

        let txn = self.inbox.remove(pos);
        let frequency = frequency.unwrap_or_else(|| self.infer_frequency(txn.amount));

        let sub = Subscription {
            id: new_id("sub"),
            merchant: txn.merchant,
            amount: txn.amount,
            source: txn.source,
            frequency,
            billing_day: txn.date.day(),
            notes: String::new(),
            approved_at: today,
        };

        info!(
            merchant = %sub.merchant,
            amount = %sub.amount,
            frequency = %sub.frequency,
            "Approved subscription"
        );
        self.origins.insert(sub.id.clone(), txn.id);
        self.approved.push(sub.clone());
        Ok(sub)
    }

    /// Send an approved subscription back to the inbox
    pub fn unapprove(&mut self, subscription_id: &str) -> Result<Transaction> {
        let pos = self.position(subscription_id)?;
        let sub = self.approved.remove(pos);
        self.origins.remove(&sub.id);

        let txn = Transaction {
            id: new_id("txn"),
            merchant: sub.merchant,
            amount: sub.amount,
            source: sub.source,
            date: sub.approved_at,
            category: None,
        };

        info!(merchant = %txn.merchant, "Returned subscription to inbox");
        self.inbox.push(txn.clone());
        Ok(txn)
    }

    pub fn set_notes(&mut self, subscription_id: &str, notes: impl Into<String>) -> Result<()> {
        let pos = self.position(subscription_id)?;
        self.approved[pos].notes = notes.into();
        Ok(())
    }

    /// Drop an approved subscription entirely
    ///
    /// Its origin charge is forgotten, so a later sync offers it again.
    pub fn remove(&mut self, subscription_id: &str) -> Result<Subscription> {
        let pos = self.position(subscription_id)?;
        let sub = self.approved.remove(pos);
        self.origins.remove(&sub.id);
        info!(merchant = %sub.merchant, "Removed subscription");
        Ok(sub)
    }

    pub fn add_estimate(&mut self, label: &str, amount: Decimal) -> Result<ManualEstimate> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::InvalidInput("estimate label must not be empty".into()));
        }
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidInput(format!(
                "estimate amount must be positive, got {}",
                amount
            )));
        }

        let estimate = ManualEstimate {
            id: new_id("est"),
            label: label.to_string(),
            amount,
        };
        self.estimates.push(estimate.clone());
        Ok(estimate)
    }

    pub fn remove_estimate(&mut self, id: &str) -> Result<ManualEstimate> {
        let pos = self
            .estimates
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("estimate {}", id)))?;
        Ok(self.estimates.remove(pos))
    }

    pub fn burn_summary(&self) -> BurnSummary {
        BurnSummary::compute(&self.approved)
    }

    pub fn runway(&self, policy: IncomePolicy) -> RunwaySummary {
        RunwaySummary::compute(&self.approved, &self.income, &self.estimates, policy)
    }

    fn position(&self, subscription_id: &str) -> Result<usize> {
        self.approved
            .iter()
            .position(|s| s.id == subscription_id)
            .ok_or_else(|| Error::NotFound(format!("subscription {}", subscription_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BankSource;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn txn(id: &str, merchant: &str, amount: &str, day: NaiveDate) -> Transaction {
        Transaction {
            id: id.to_string(),
            merchant: merchant.to_string(),
            amount: dec(amount),
            source: BankSource::new("Chase", "4521"),
            date: day,
            category: Some("Entertainment".into()),
        }
    }

    fn seeded() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.replace_inbox(vec![
            txn("t1", "Costco Membership", "150.00", date(2026, 3, 22)),
            txn("t2", "Netflix", "9.99", date(2026, 3, 5)),
        ]);
        ledger
    }

    #[test]
    fn test_approve_large_amount_is_yearly() {
        let mut ledger = seeded();
        let today = date(2026, 4, 1);

        let sub = ledger.approve("t1", None, today).unwrap();
        assert_eq!(sub.frequency, Frequency::Yearly);
        assert_eq!(sub.billing_day, 22);
        assert_eq!(sub.approved_at, today);
        assert_eq!(sub.notes, "");
        assert!(sub.id.starts_with("sub-"));

        assert_eq!(ledger.inbox().len(), 1);
        assert_eq!(ledger.approved().len(), 1);
        assert!(ledger.inbox().iter().all(|t| t.id != "t1"));
    }

    #[test]
    fn test_approve_small_amount_is_monthly() {
        let mut ledger = seeded();
        let sub = ledger.approve("t2", None, date(2026, 4, 1)).unwrap();
        assert_eq!(sub.frequency, Frequency::Monthly);
        assert_eq!(sub.billing_day, 5);
    }

    #[test]
    fn test_approve_threshold_is_inclusive() {
        let mut ledger = Ledger::new();
        ledger.replace_inbox(vec![txn("t", "Exactly", "100", date(2026, 1, 31))]);
        let sub = ledger.approve("t", None, date(2026, 2, 1)).unwrap();
        assert_eq!(sub.frequency, Frequency::Yearly);
        assert_eq!(sub.billing_day, 31);
    }

    #[test]
    fn test_approve_explicit_frequency_overrides_heuristic() {
        let mut ledger = seeded();
        let sub = ledger
            .approve("t1", Some(Frequency::Monthly), date(2026, 4, 1))
            .unwrap();
        assert_eq!(sub.frequency, Frequency::Monthly);
    }

    #[test]
    fn test_custom_threshold() {
        let mut ledger = seeded().with_yearly_threshold(dec("5"));
        let sub = ledger.approve("t2", None, date(2026, 4, 1)).unwrap();
        assert_eq!(sub.frequency, Frequency::Yearly);
    }

    #[test]
    fn test_approve_missing_is_not_found_without_change() {
        let mut ledger = seeded();
        let before = ledger.snapshot();

        let err = ledger.approve("nope", None, date(2026, 4, 1)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_unapprove_is_lossy() {
        let mut ledger = seeded();
        let approved_on = date(2026, 4, 1);
        let sub = ledger.approve("t1", None, approved_on).unwrap();
        ledger.set_notes(&sub.id, "cancel before renewal").unwrap();

        let restored = ledger.unapprove(&sub.id).unwrap();
        assert_eq!(restored.merchant, "Costco Membership");
        assert_eq!(restored.amount, dec("150.00"));
        assert_eq!(restored.source, BankSource::new("Chase", "4521"));
        // original date and category are gone
        assert_eq!(restored.date, approved_on);
        assert_eq!(restored.category, None);
        assert!(restored.id.starts_with("txn-"));
        assert_ne!(restored.id, "t1");

        assert!(ledger.approved().is_empty());
        assert_eq!(ledger.inbox().len(), 2);

        // approving again re-derives billing day from the new date
        let again = ledger.approve(&restored.id, None, date(2026, 5, 9)).unwrap();
        assert_eq!(again.billing_day, 1);
        assert_eq!(again.notes, "");
    }

    #[test]
    fn test_set_notes_and_remove() {
        let mut ledger = seeded();
        let sub = ledger.approve("t2", None, date(2026, 4, 1)).unwrap();

        ledger.set_notes(&sub.id, "shared with family").unwrap();
        assert_eq!(ledger.approved()[0].notes, "shared with family");

        let removed = ledger.remove(&sub.id).unwrap();
        assert_eq!(removed.notes, "shared with family");
        assert!(ledger.approved().is_empty());
        // removal does not return the charge to the inbox
        assert_eq!(ledger.inbox().len(), 1);

        assert!(matches!(ledger.set_notes(&sub.id, "x"), Err(Error::NotFound(_))));
        assert!(matches!(ledger.remove(&sub.id), Err(Error::NotFound(_))));
        assert!(matches!(ledger.unapprove(&sub.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_resync_skips_approved_charges() {
        let mut ledger = seeded();
        let sub = ledger.approve("t1", None, date(2026, 4, 1)).unwrap();
        assert!(ledger.is_approved_charge("t1"));

        ledger.replace_inbox(vec![
            txn("t1", "Costco Membership", "150.00", date(2026, 3, 22)),
            txn("t2", "Netflix", "9.99", date(2026, 3, 5)),
            txn("t3", "Spotify", "10.99", date(2026, 3, 4)),
        ]);

        let ids: Vec<_> = ledger.inbox().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t3"]);
        assert_eq!(ledger.approved().len(), 1);
        assert_eq!(ledger.approved()[0].id, sub.id);
    }

    #[test]
    fn test_unapprove_and_remove_release_origin() {
        let mut ledger = seeded();
        let yearly = ledger.approve("t1", None, date(2026, 4, 1)).unwrap();
        let monthly = ledger.approve("t2", None, date(2026, 4, 1)).unwrap();

        ledger.unapprove(&yearly.id).unwrap();
        ledger.remove(&monthly.id).unwrap();
        assert!(!ledger.is_approved_charge("t1"));
        assert!(!ledger.is_approved_charge("t2"));

        ledger.replace_inbox(vec![
            txn("t1", "Costco Membership", "150.00", date(2026, 3, 22)),
            txn("t2", "Netflix", "9.99", date(2026, 3, 5)),
        ]);
        assert_eq!(ledger.inbox().len(), 2);
    }

    #[test]
    fn test_add_estimate_validates() {
        let mut ledger = Ledger::new();

        let est = ledger.add_estimate("  Freelance  ", dec("800")).unwrap();
        assert_eq!(est.label, "Freelance");
        assert!(est.id.starts_with("est-"));

        assert!(matches!(
            ledger.add_estimate("   ", dec("10")),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.add_estimate("Tips", Decimal::ZERO),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.add_estimate("Tips", dec("-5")),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(ledger.estimates().len(), 1);

        ledger.remove_estimate(&est.id).unwrap();
        assert!(ledger.estimates().is_empty());
        assert!(matches!(
            ledger.remove_estimate(&est.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_runway_tracks_mutations() {
        let mut ledger = seeded();
        ledger.approve("t2", None, date(2026, 4, 1)).unwrap();
        ledger.add_estimate("Side gig", dec("20")).unwrap();

        let runway = ledger.runway(IncomePolicy::FaceValue);
        assert_eq!(runway.monthly_burn, dec("9.99"));
        assert_eq!(runway.monthly_income, dec("20"));
        assert_eq!(runway.net_cashflow, dec("10.01"));

        let burn = ledger.burn_summary();
        assert_eq!(burn.monthly_total, dec("9.99"));
        assert_eq!(burn.yearly_count, 0);
    }

    #[test]
    fn test_snapshot_round_trip_preserves_collections() {
        let mut ledger = seeded();
        ledger.approve("t1", None, date(2026, 4, 1)).unwrap();

        let restored = Ledger::from_snapshot(ledger.snapshot());
        assert_eq!(restored.inbox(), ledger.inbox());
        assert_eq!(restored.approved(), ledger.approved());
    }
}
