// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{account_repo::NewAccount, AccountRepository, ProviderRepository},
    models::account::{
        Account, Claims, ProvisionAccountPayload, RegisterPayload, Role, UpdateAccountStatusPayload,
    },
    services::access_control::{
        ensure_provider_unlinked, filter_for, require_capability, validate_role_vertical, Capability,
    },
};

#[derive(Clone)]
pub struct AuthService {
    account_repo: AccountRepository,
    provider_repo: ProviderRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        account_repo: AccountRepository,
        provider_repo: ProviderRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self { account_repo, provider_repo, jwt_secret, pool }
    }

    /// Cadastro público: sempre cria um `customer`.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<String, AppError> {
        let password_hash = hash_password(&payload.password).await?;

        let account = self
            .account_repo
            .create(
                &self.pool,
                NewAccount {
                    name: &payload.name,
                    email: &payload.email,
                    phone: payload.phone.as_deref(),
                    password_hash: &password_hash,
                    role: Role::Customer,
                    service_type: None,
                    verticals: &[],
                    provider_id: None,
                },
            )
            .await?;

        tracing::info!(account_id = %account.id, "Nova conta de cliente registrada");
        self.create_token(&account)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let account = self
            .account_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = account.password_hash.clone();

        // bcrypt é pesado: roda fora das threads do runtime
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }
        if !account.is_active() {
            return Err(AppError::AccountInactive);
        }

        self.create_token(&account)
    }

    pub async fn validate_token(&self, token: &str) -> Result<Account, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let account = self
            .account_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !account.is_active() {
            return Err(AppError::AccountInactive);
        }
        Ok(account)
    }

    /// Provisionamento de contas internas por quem tem `ManageAccounts`.
    pub async fn provision(&self, actor: &Account, payload: &ProvisionAccountPayload) -> Result<Account, AppError> {
        require_capability(actor, Capability::ManageAccounts)?;
        validate_role_vertical(payload.role, payload.service_type)?;

        let root_only = matches!(payload.role, Role::SuperAdmin);
        if root_only && actor.role != Role::SuperAdmin {
            return Err(AppError::MissingCapability(Capability::ViewAllVerticals.slug()));
        }
        if payload.provider_id.is_some() && payload.role != Role::ServiceProvider {
            return Err(AppError::InvalidInput("providerId só vale para service_provider".to_string()));
        }

        // A conta nova não pode enxergar nada fora do escopo de quem a cria
        let own = payload.role.implied_vertical().or(payload.service_type);
        for vertical in own.iter().chain(payload.verticals.iter()) {
            filter_for(actor, Some(*vertical))?;
        }

        let password_hash = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        // Os dois lados do vínculo são gravados juntos, com o prestador travado
        if let Some(provider_id) = payload.provider_id {
            let provider = self
                .provider_repo
                .lock_for_update(&mut *tx, provider_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("Prestador".to_string()))?;
            ensure_provider_unlinked(&provider)?;
        }

        let account = self
            .account_repo
            .create(
                &mut *tx,
                NewAccount {
                    name: &payload.name,
                    email: &payload.email,
                    phone: payload.phone.as_deref(),
                    password_hash: &password_hash,
                    role: payload.role,
                    service_type: payload.service_type,
                    verticals: &payload.verticals,
                    provider_id: payload.provider_id,
                },
            )
            .await?;

        if let Some(provider_id) = payload.provider_id {
            self.provider_repo.set_account(&mut *tx, provider_id, account.id).await?;
        }

        tx.commit().await?;

        tracing::info!(
            account_id = %account.id,
            role = %account.role,
            created_by = %actor.id,
            "Conta provisionada"
        );
        Ok(account)
    }

    pub async fn update_status(
        &self,
        actor: &Account,
        account_id: Uuid,
        payload: &UpdateAccountStatusPayload,
    ) -> Result<Account, AppError> {
        require_capability(actor, Capability::ManageAccounts)?;
        if actor.id == account_id {
            return Err(AppError::InvalidInput("não é possível alterar o status da própria conta".to_string()));
        }

        let target = self
            .account_repo
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conta".to_string()))?;

        match target.own_vertical() {
            Some(vertical) => {
                filter_for(actor, Some(vertical))?;
            }
            // Contas sem vertical (clientes, super-admin) só pelo super-admin
            None if actor.role != Role::SuperAdmin => {
                return Err(AppError::MissingCapability(Capability::ViewAllVerticals.slug()));
            }
            None => {}
        }

        self.account_repo
            .update_status(account_id, payload.status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conta".to_string()))
    }

    fn create_token(&self, account: &Account) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: account.id,
            role: account.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}
