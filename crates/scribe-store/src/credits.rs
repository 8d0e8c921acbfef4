use chrono::Utc;
use rusqlite::Transaction;
use tracing::instrument;

use scribe_core::ids::UserId;

use crate::database::Database;
use crate::error::StoreError;

/// Per-user credit ledger. Balances never go negative: the debit is a
/// guarded UPDATE, and a zero-row result means the user could not pay.
pub struct CreditRepo {
    db: Database,
}

impl CreditRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Current balance. Users with no ledger row have zero credits.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn balance(&self, user_id: &UserId) -> Result<i64, StoreError> {
        self.db.with_conn(|conn| {
            let balance: Option<i64> = conn
                .query_row(
                    "SELECT balance FROM credits WHERE user_id = ?1",
                    [user_id.as_str()],
                    |row| row.get(0),
                )
                .ok();
            Ok(balance.unwrap_or(0))
        })
    }

    /// Add credits to a user's balance, creating the ledger row if absent.
    #[instrument(skip(self), fields(user_id = %user_id, amount))]
    pub fn grant(&self, user_id: &UserId, amount: i64) -> Result<i64, StoreError> {
        if amount <= 0 {
            return Err(StoreError::Conflict(format!("grant amount must be positive, got {amount}")));
        }
        self.db.with_conn(|conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO credits (user_id, balance, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET balance = balance + ?2, updated_at = ?3",
                rusqlite::params![user_id.as_str(), amount, now],
            )?;
            conn.query_row(
                "SELECT balance FROM credits WHERE user_id = ?1",
                [user_id.as_str()],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
        })
    }
}

/// Debit exactly one credit inside an open transaction. The WHERE guard
/// refuses the debit when the balance is already zero (or the row is
/// missing), surfacing InsufficientCredit so the whole transaction rolls
/// back.
pub fn debit_one_tx(tx: &Transaction<'_>, user_id: &UserId) -> Result<(), StoreError> {
    let now = Utc::now().to_rfc3339();
    let changed = tx.execute(
        "UPDATE credits SET balance = balance - 1, updated_at = ?1
         WHERE user_id = ?2 AND balance >= 1",
        rusqlite::params![now, user_id.as_str()],
    )?;
    if changed == 0 {
        return Err(StoreError::InsufficientCredit(user_id.as_str().to_string()));
    }
    Ok(())
}
