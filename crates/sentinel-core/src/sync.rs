//! Sync orchestration
//!
//! Fetch from a provider, normalize, and replace the session inbox. The
//! network call happens without holding the session lock; the ledger is only
//! locked for the final swap.

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{AccountSummary, Transaction};
use crate::normalize::NormalizedBatch;
use crate::providers::{BankProvider, FetchRequest};
use crate::session::Session;

/// Outcome of one sync, returned to API and CLI callers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub provider: String,
    /// Charges placed in the inbox (already-approved ones are left out)
    pub imported: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
    pub accounts: Vec<AccountSummary>,
}

impl SyncReport {
    fn new(provider: &str, batch: &NormalizedBatch) -> Self {
        Self {
            provider: provider.to_string(),
            imported: batch.transactions.len(),
            skipped: batch.warnings.len(),
            warnings: batch.warnings.clone(),
            accounts: batch.accounts.clone(),
        }
    }
}

/// Fetch one normalized batch and log the outcome
pub async fn fetch_batch<P>(provider: &P, request: &FetchRequest) -> Result<NormalizedBatch>
where
    P: BankProvider + ?Sized,
{
    let batch = match provider.fetch(request).await {
        Ok(batch) => batch,
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "Provider fetch failed");
            return Err(e);
        }
    };

    info!(
        provider = provider.name(),
        transactions = batch.transactions.len(),
        accounts = batch.accounts.len(),
        skipped = batch.warnings.len(),
        "Fetched provider data"
    );
    Ok(batch)
}

/// Fetch into a session, replacing its inbox
///
/// The session's bank-link token (if any) is passed along; read-only
/// providers ignore it. On failure the inbox is left untouched.
pub async fn sync_session<P>(session: &Mutex<Session>, provider: &P) -> Result<SyncReport>
where
    P: BankProvider + ?Sized,
{
    let request = FetchRequest {
        access_token: session.lock().await.plaid_access_token.clone(),
        ..Default::default()
    };

    let batch = fetch_batch(provider, &request).await?;
    let mut report = SyncReport::new(provider.name(), &batch);

    // charges approved meanwhile are filtered out under the lock
    let mut guard = session.lock().await;
    guard.ledger.replace_inbox(batch.transactions);
    report.imported = guard.ledger.inbox().len();
    Ok(report)
}

/// Sort newest first, the order the inbox is shown in
pub fn newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.merchant.cmp(&b.merchant)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::BankSource;
    use crate::providers::MockProvider;
    use crate::store::Ledger;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn txn(id: &str, day: u32) -> Transaction {
        Transaction {
            id: id.to_string(),
            merchant: format!("Merchant {}", id),
            amount: Decimal::new(999, 2),
            source: BankSource::new("Chase", "4521"),
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            category: None,
        }
    }

    fn session_with_inbox(ids: &[&str]) -> Mutex<Session> {
        let mut ledger = Ledger::new();
        ledger.replace_inbox(ids.iter().map(|id| txn(id, 1)).collect());
        Mutex::new(Session::new(ledger))
    }

    #[tokio::test]
    async fn test_sync_replaces_inbox() {
        let session = session_with_inbox(&["old"]);
        let provider = MockProvider::new(vec![txn("a", 2), txn("b", 3)]);

        let report = sync_session(&session, &provider).await.unwrap();
        assert_eq!(report.provider, "mock");
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 0);

        let guard = session.lock().await;
        let ids: Vec<_> = guard.ledger.inbox().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_failed_sync_leaves_inbox() {
        let session = session_with_inbox(&["keep"]);
        let err = sync_session(&session, &MockProvider::unavailable())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable(_)));
        assert_eq!(session.lock().await.ledger.inbox()[0].id, "keep");
    }

    #[tokio::test]
    async fn test_linked_provider_needs_session_token() {
        let session = session_with_inbox(&[]);
        let provider = MockProvider::linked(vec![txn("a", 2)]);

        let err = sync_session(&session, &provider).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        session.lock().await.plaid_access_token = Some(MockProvider::ACCESS_TOKEN.into());
        let report = sync_session(&session, &provider).await.unwrap();
        assert_eq!(report.imported, 1);
    }

    #[tokio::test]
    async fn test_resync_does_not_return_approved_charge() {
        let session = session_with_inbox(&[]);
        let provider = MockProvider::new(vec![txn("t1", 2), txn("t2", 3)]);

        sync_session(&session, &provider).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 30).unwrap();
        session.lock().await.ledger.approve("t1", None, today).unwrap();

        let report = sync_session(&session, &provider).await.unwrap();
        assert_eq!(report.imported, 1);

        let guard = session.lock().await;
        let ids: Vec<_> = guard.ledger.inbox().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t2"]);
        assert_eq!(guard.ledger.approved().len(), 1);
        assert_eq!(guard.ledger.approved()[0].merchant, "Merchant t1");
    }

    #[test]
    fn test_newest_first() {
        let mut txns = vec![txn("a", 2), txn("b", 9), txn("c", 5)];
        newest_first(&mut txns);
        let ids: Vec<_> = txns.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }
}
