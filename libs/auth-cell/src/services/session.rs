use chrono::{Duration, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use urlencoding::encode;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_models::auth::{JwtClaims, Role, TokenPair};
use shared_utils::jwt::{decode_claims, issue_token};

use crate::models::{Account, AuthError, VerifyOutcome};
use crate::services::{otp, SmsClient};

const ACCESS_TOKEN_HOURS: i64 = 1;
const REFRESH_TOKEN_DAYS: i64 = 30;

/// Phone-OTP identity flows: code generation/verification, account rows and
/// the access/refresh token pair bound to them.
pub struct AuthService {
    supabase: SupabaseClient,
    config: AppConfig,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            config: config.clone(),
        }
    }

    fn accounts_table(role: Role) -> &'static str {
        match role {
            Role::Doctor => "doctor_accounts",
            Role::Patient => "patient_accounts",
        }
    }

    fn profiles_table(role: Role) -> &'static str {
        match role {
            Role::Doctor => "doctor_profiles",
            Role::Patient => "patient_profiles",
        }
    }

    /// Generates a 4-digit code, caches its hash for five minutes and hands
    /// it to the SMS gateway.
    pub async fn generate_otp(&self, phone_number: &str) -> Result<(), AuthError> {
        let code = otp::generate_code();
        otp::store_code(phone_number, &code, &self.config.supabase_jwt_secret)?;

        let sms = SmsClient::new(&self.config)?;
        sms.send(phone_number, &format!("Your OTP code is {}.", code))
            .await?;

        info!("OTP sent to {}", phone_number);
        Ok(())
    }

    /// Verifies the code, finds or creates the role's account row and issues
    /// a fresh token pair. The outcome tells the handler which status code
    /// the original onboarding flow expects.
    pub async fn verify_otp(
        &self,
        role: Role,
        phone_number: &str,
        code: &str,
    ) -> Result<(VerifyOutcome, TokenPair, Uuid), AuthError> {
        otp::verify_code(phone_number, code, &self.config.supabase_jwt_secret)?;

        let (account, outcome) = match self.find_account_by_phone(role, phone_number).await? {
            Some(account) => {
                let outcome = if self.profile_exists(role, account.id).await? {
                    VerifyOutcome::ProfileExists
                } else {
                    VerifyOutcome::NoProfile
                };
                (account, outcome)
            }
            None => {
                let account = self.create_account(role, phone_number).await?;
                (account, VerifyOutcome::NewPhone)
            }
        };

        let tokens = self.issue_token_pair(role, &account)?;
        self.persist_refresh_token(role, account.id, Some(&tokens.refresh_token))
            .await?;

        Ok((outcome, tokens, account.id))
    }

    /// Rotates both tokens when the presented refresh token is valid and
    /// matches the stored one.
    pub async fn refresh(&self, role: Role, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = decode_claims(refresh_token, &self.config.supabase_jwt_secret)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        if let Some(exp) = claims.exp {
            if exp < Utc::now().timestamp() as u64 {
                return Err(AuthError::InvalidRefreshToken);
            }
        }

        let account_id: Uuid = claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let account = self
            .find_account_by_id(role, account_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if account.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AuthError::RefreshTokenMismatch);
        }

        let tokens = self.issue_token_pair(role, &account)?;
        self.persist_refresh_token(role, account.id, Some(&tokens.refresh_token))
            .await?;

        Ok(tokens)
    }

    /// Clears the stored refresh token so the pair can no longer be rotated.
    pub async fn logout(&self, role: Role, account_id: Uuid) -> Result<(), AuthError> {
        self.persist_refresh_token(role, account_id, None).await
    }

    fn issue_token_pair(&self, role: Role, account: &Account) -> Result<TokenPair, AuthError> {
        let now = Utc::now();

        let access_claims = JwtClaims {
            sub: account.id.to_string(),
            exp: Some((now + Duration::hours(ACCESS_TOKEN_HOURS)).timestamp() as u64),
            iat: Some(now.timestamp() as u64),
            role: Some(role.as_str().to_string()),
            phone: Some(account.phone_number.clone()),
        };
        let refresh_claims = JwtClaims {
            exp: Some((now + Duration::days(REFRESH_TOKEN_DAYS)).timestamp() as u64),
            sub: account.id.to_string(),
            iat: Some(now.timestamp() as u64),
            role: Some(role.as_str().to_string()),
            phone: Some(account.phone_number.clone()),
        };

        Ok(TokenPair {
            access_token: issue_token(&access_claims, &self.config.supabase_jwt_secret)
                .map_err(AuthError::Token)?,
            refresh_token: issue_token(&refresh_claims, &self.config.supabase_jwt_secret)
                .map_err(AuthError::Token)?,
        })
    }

    async fn find_account_by_phone(
        &self,
        role: Role,
        phone_number: &str,
    ) -> Result<Option<Account>, AuthError> {
        let path = format!(
            "/rest/v1/{}?phone_number=eq.{}&limit=1",
            Self::accounts_table(role),
            encode(phone_number)
        );
        let rows: Vec<Account> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn find_account_by_id(
        &self,
        role: Role,
        account_id: Uuid,
    ) -> Result<Option<Account>, AuthError> {
        let path = format!(
            "/rest/v1/{}?id=eq.{}&limit=1",
            Self::accounts_table(role),
            account_id
        );
        let rows: Vec<Account> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn create_account(&self, role: Role, phone_number: &str) -> Result<Account, AuthError> {
        debug!("Creating {} account for {}", role, phone_number);

        let path = format!("/rest/v1/{}", Self::accounts_table(role));
        let rows: Vec<Account> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &path,
                None,
                Some(json!({ "phone_number": phone_number })),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AuthError::Database("account insert returned no row".to_string()))
    }

    async fn profile_exists(&self, role: Role, account_id: Uuid) -> Result<bool, AuthError> {
        let path = format!(
            "/rest/v1/{}?account_id=eq.{}&select=id&limit=1",
            Self::profiles_table(role),
            account_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    async fn persist_refresh_token(
        &self,
        role: Role,
        account_id: Uuid,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        let path = format!(
            "/rest/v1/{}?id=eq.{}",
            Self::accounts_table(role),
            account_id
        );
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(json!({ "refresh_token": refresh_token })),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        Ok(())
    }
}
