//! Account repository for database operations.
//!
//! Queries are runtime-checked (`sqlx::query_as`) so the workspace builds
//! without a live database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mango_stand_core::{AccountId, Email, Role};

use super::RepositoryError;
use crate::models::account::{Account, CartLine};

/// Raw account row, converted to the domain type after validation.
#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i32,
    name: String,
    email: String,
    role: String,
    cart: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> Result<Account, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = Role::parse(&self.role).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("invalid role in database: {}", self.role))
        })?;
        let cart: Vec<CartLine> = serde_json::from_value(self.cart).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cart document: {e}"))
        })?;

        Ok(Account {
            id: AccountId::new(self.id),
            name: self.name,
            email,
            role,
            cart,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, name, email, role, cart, created_at, updated_at";

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new account with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let sql = format!(
            "INSERT INTO account (name, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(name)
            .bind(email.as_str())
            .bind(password_hash)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("email already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        row.into_account()
    }

    /// Get an account by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = $1");

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(AccountRow::into_account).transpose()
    }

    /// Get an account and its password hash by email.
    ///
    /// Returns `None` if no account exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS}, password_hash FROM account WHERE email = $1"
        );

        let row = sqlx::query_as::<_, AccountPasswordRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(AccountPasswordRow {
                account,
                password_hash,
            }) => Ok(Some((account.into_account()?, password_hash))),
            None => Ok(None),
        }
    }

    /// Read an account's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::DataCorruption` if the cart document is invalid.
    pub async fn cart(&self, id: AccountId) -> Result<Vec<CartLine>, RepositoryError> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT cart FROM account WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        serde_json::from_value(value)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid cart document: {e}")))
    }

    /// Replace an account's cart wholesale.
    ///
    /// Last write wins on the whole document; there is no per-line
    /// concurrency control (see the service-level docs).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    pub async fn update_cart(
        &self,
        id: AccountId,
        cart: &[CartLine],
    ) -> Result<(), RepositoryError> {
        let document = serde_json::to_value(cart).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize cart: {e}"))
        })?;

        let result = sqlx::query(
            "UPDATE account SET cart = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(document)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Account row joined with its password hash (login path only).
#[derive(sqlx::FromRow)]
struct AccountPasswordRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}
