use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

pub struct MySqlAccountRepo {
    pool: MySqlPool,
}

impl MySqlAccountRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAccountRepo { pool }
    }

    #[inline]
    pub(super) fn id_as_bytes(id: &AccountId) -> &[u8] {
        id.0.as_bytes()
    }

    #[inline]
    fn id_from_bytes(id: &[u8]) -> Result<AccountId, AuthError> {
        Ok(AccountId(
            Uuid::from_slice(id).map_err(|e| AuthError::Store(e.to_string()))?,
        ))
    }

    fn row_to_account(row: MySqlRow) -> Result<Account, AuthError> {
        let id_bytes: Vec<u8> = row
            .try_get("account_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let id = Self::id_from_bytes(&id_bytes)?;

        let role: String = row
            .try_get("role")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let role = role
            .parse::<Role>()
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let worker_details: Option<String> = row
            .try_get("worker_details")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let hirer_details: Option<String> = row
            .try_get("hirer_details")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(Account {
            id,
            first_name: row
                .try_get("first_name")
                .map_err(|e| AuthError::Store(e.to_string()))?,
            last_name: row
                .try_get("last_name")
                .map_err(|e| AuthError::Store(e.to_string()))?,
            email: row
                .try_get("email")
                .map_err(|e| AuthError::Store(e.to_string()))?,
            phone: row
                .try_get("phone")
                .map_err(|e| AuthError::Store(e.to_string()))?,
            password_hash: row
                .try_get("password_hash")
                .map_err(|e| AuthError::Store(e.to_string()))?,
            role,
            is_blocked: row
                .try_get("is_blocked")
                .map_err(|e| AuthError::Store(e.to_string()))?,
            worker_details: Self::details_from_json(worker_details)?,
            hirer_details: Self::details_from_json(hirer_details)?,
            created_at,
        })
    }

    // Role details are stored as JSON text in nullable columns.
    fn details_to_json<T: serde::Serialize>(details: &Option<T>) -> Result<Option<String>, AuthError> {
        details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    fn details_from_json<T: serde::de::DeserializeOwned>(
        raw: Option<String>,
    ) -> Result<Option<T>, AuthError> {
        raw.as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}

const ACCOUNT_COLUMNS: &str = "account_id, first_name, last_name, email, phone, password_hash, \
    role, is_blocked, worker_details, hirer_details, created_at";

#[async_trait::async_trait]
impl AccountRepo for MySqlAccountRepo {
    async fn create(&self, account: &Account) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
INSERT INTO account (account_id, first_name, last_name, email, phone, password_hash, role, is_blocked,
                     worker_details, hirer_details, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(Self::id_as_bytes(&account.id))
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_blocked)
        .bind(Self::details_to_json(&account.worker_details)?)
        .bind(Self::details_to_json(&account.hirer_details)?)
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_dup_key(&e) => Err(AuthError::EmailTaken),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(&format!(
            "SELECT {} FROM account WHERE account_id = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(Self::id_as_bytes(&id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_account).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(&format!(
            "SELECT {} FROM account WHERE email = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_account).transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM account WHERE email = ?"#)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }

    async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE account SET password_hash = ? WHERE account_id = ?")
            .bind(password_hash)
            .bind(Self::id_as_bytes(&id))
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::AccountMissing);
        }
        Ok(())
    }

    async fn update_profile(&self, account: &Account) -> Result<(), AuthError> {
        sqlx::query(
            r#"
UPDATE account
SET first_name = ?, last_name = ?, phone = ?, worker_details = ?, hirer_details = ?
WHERE account_id = ?
"#,
        )
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.phone)
        .bind(Self::details_to_json(&account.worker_details)?)
        .bind(Self::details_to_json(&account.hirer_details)?)
        .bind(Self::id_as_bytes(&account.id))
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        if self.get_by_id(account.id).await?.is_none() {
            return Err(AuthError::AccountMissing);
        }
        Ok(())
    }

    async fn set_blocked(&self, id: AccountId, blocked: bool) -> Result<(), AuthError> {
        // MySQL reports 0 affected rows when the value is unchanged, so check existence separately.
        sqlx::query("UPDATE account SET is_blocked = ? WHERE account_id = ?")
            .bind(blocked)
            .bind(Self::id_as_bytes(&id))
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        if self.get_by_id(id).await?.is_none() {
            return Err(AuthError::AccountMissing);
        }
        Ok(())
    }
}
