use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

pub struct RealSessionService {
    accounts: Arc<dyn AccountRepo>,
    refresh_store: Arc<dyn RefreshTokenStore>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
}

impl RealSessionService {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            accounts,
            refresh_store,
            credential_hasher,
            token_codec,
        }
    }

    async fn issue_pair(&self, account_id: AccountId) -> Result<AuthTokens, AuthError> {
        let (access_token, access_exp) = self.token_codec.issue_access_token(account_id).await?;
        let (refresh_token, refresh_exp) =
            self.token_codec.issue_refresh_token(account_id).await?;
        Ok(AuthTokens {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    /// Issue a pair and overwrite the slot unconditionally.
    async fn start_session(&self, account_id: AccountId) -> Result<AuthTokens, AuthError> {
        let tokens = self.issue_pair(account_id).await?;
        self.refresh_store
            .set(account_id, &tokens.refresh_token)
            .await?;
        Ok(tokens)
    }

    async fn require_account(&self, account_id: AccountId) -> Result<Account, AuthError> {
        self.accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountMissing)
    }
}

fn clean_skills(skills: Vec<String>) -> Vec<String> {
    skills
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .collect()
}

fn clean_hirer_details(details: HirerDetails) -> HirerDetails {
    HirerDetails {
        company_name: details.company_name.trim().to_string(),
        work_location: details.work_location.trim().to_string(),
    }
}

#[async_trait::async_trait]
impl SessionService for RealSessionService {
    async fn register(&self, input: RegisterInput) -> Result<SessionResult, AuthError> {
        let input = RegisterInput {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: normalize_email(&input.email),
            phone: input.phone.trim().to_string(),
            ..input
        };
        input.validate().map_err(AuthError::from_validation)?;
        if !input.role.is_self_assignable() {
            return Err(AuthError::Validation(vec![
                "Role must be either worker or hirer".to_string(),
            ]));
        }

        if self.accounts.email_exists(&input.email).await? {
            return Err(AuthError::EmailTaken);
        }

        let (worker_details, hirer_details) = match input.role {
            Role::Worker => {
                let details = input.worker_details.unwrap_or_default();
                let details = WorkerDetails {
                    skills: clean_skills(details.skills),
                    ..details
                };
                (Some(details), None)
            }
            Role::Hirer => {
                let details = input.hirer_details.unwrap_or_default();
                (None, Some(clean_hirer_details(details)))
            }
            Role::Admin => (None, None),
        };

        let password_hash = self.credential_hasher.hash_password(&input.password).await?;
        let account = Account {
            id: AccountId::new_random(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            password_hash,
            role: input.role,
            is_blocked: false,
            worker_details,
            hirer_details,
            created_at: Utc::now(),
        };
        // The unique index still decides if two registrations race past email_exists.
        self.accounts.create(&account).await?;

        let tokens = self.start_session(account.id).await?;
        info!(account_id = %account.id, role = %account.role, "account registered");

        Ok(SessionResult { account, tokens })
    }

    async fn login(&self, input: LoginInput) -> Result<SessionResult, AuthError> {
        let input = LoginInput {
            email: normalize_email(&input.email),
            ..input
        };
        input.validate().map_err(AuthError::from_validation)?;

        let account = self
            .accounts
            .get_by_email(&input.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&input.password, &account.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        if account.is_blocked {
            return Err(AuthError::AccountBlocked);
        }

        let tokens = self.start_session(account.id).await?;
        info!(account_id = %account.id, "login");

        Ok(SessionResult { account, tokens })
    }

    async fn refresh(&self, presented: &RefreshToken) -> Result<AuthTokens, AuthError> {
        let account_id = self
            .token_codec
            .verify(presented.as_str(), TokenKind::Refresh)
            .await?;

        self.require_account(account_id).await?;

        if !self.refresh_store.matches(account_id, presented).await? {
            warn!(%account_id, "refresh with a stale token");
            return Err(AuthError::RefreshStale);
        }

        let tokens = self.issue_pair(account_id).await?;

        // Lost the race to a concurrent refresh or a logout.
        if !self
            .refresh_store
            .rotate(account_id, presented, &tokens.refresh_token)
            .await?
        {
            warn!(%account_id, "refresh lost rotation race");
            return Err(AuthError::RefreshStale);
        }

        info!(%account_id, "refresh token rotated");
        Ok(tokens)
    }

    async fn logout(&self, account_id: AccountId) -> Result<(), AuthError> {
        self.refresh_store.clear(account_id).await?;
        info!(%account_id, "logout");
        Ok(())
    }

    async fn authenticate(&self, access_token: &str) -> Result<Account, AuthError> {
        let account_id = self
            .token_codec
            .verify(access_token, TokenKind::Access)
            .await?;

        let account = self.require_account(account_id).await?;
        if account.is_blocked {
            return Err(AuthError::AccountBlocked);
        }
        Ok(account)
    }

    async fn profile(&self, account_id: AccountId) -> Result<Account, AuthError> {
        self.require_account(account_id).await
    }

    async fn update_profile(
        &self,
        account_id: AccountId,
        input: UpdateProfileInput,
    ) -> Result<Account, AuthError> {
        let input = UpdateProfileInput {
            first_name: input.first_name.map(|v| v.trim().to_string()),
            last_name: input.last_name.map(|v| v.trim().to_string()),
            phone: input.phone.map(|v| v.trim().to_string()),
            ..input
        };
        input.validate().map_err(AuthError::from_validation)?;

        let mut account = self.require_account(account_id).await?;
        if let Some(first_name) = input.first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            account.last_name = last_name;
        }
        if let Some(phone) = input.phone {
            account.phone = phone;
        }

        match account.role {
            Role::Worker => {
                let mut details = account.worker_details.take().unwrap_or_default();
                if let Some(skills) = input.skills {
                    details.skills = clean_skills(skills);
                }
                if let Some(experience) = input.experience {
                    details.experience = experience;
                }
                if let Some(daily_wage) = input.daily_wage {
                    details.daily_wage = daily_wage;
                }
                if let Some(availability) = input.availability {
                    details.availability = availability;
                }
                account.worker_details = Some(details);
            }
            Role::Hirer => {
                let mut details = account.hirer_details.take().unwrap_or_default();
                if let Some(company_name) = input.company_name {
                    details.company_name = company_name;
                }
                if let Some(work_location) = input.work_location {
                    details.work_location = work_location;
                }
                account.hirer_details = Some(clean_hirer_details(details));
            }
            Role::Admin => {}
        }

        self.accounts.update_profile(&account).await?;
        info!(%account_id, "profile updated");
        Ok(account)
    }

    async fn change_password(
        &self,
        account_id: AccountId,
        input: ChangePasswordInput,
    ) -> Result<AuthTokens, AuthError> {
        input.validate().map_err(AuthError::from_validation)?;

        let account = self.require_account(account_id).await?;
        let ok = self
            .credential_hasher
            .verify_password(&input.current_password, &account.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::IncorrectPassword);
        }

        let password_hash = self
            .credential_hasher
            .hash_password(&input.new_password)
            .await?;
        self.accounts
            .update_password_hash(account_id, &password_hash)
            .await?;

        let tokens = self.start_session(account_id).await?;
        info!(%account_id, "password changed");
        Ok(tokens)
    }

    fn authorize(&self, account: &Account, operation: Operation) -> Result<(), AuthError> {
        if is_allowed(account.role, operation) {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                role: account.role,
                operation,
            })
        }
    }
}
