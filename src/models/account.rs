// src/models/account.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

// Linha de negócio. Funciona como discriminador de tenancy nas tabelas compartilhadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Vertical {
    Interior,
    Construction,
    Renovation,
    OnDemand,
}

text_enum!(Vertical {
    Interior => "interior",
    Construction => "construction",
    Renovation => "renovation",
    OnDemand => "on_demand",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    SuperAdmin,
    Admin,
    InteriorAdmin,
    ConstructionAdmin,
    RenovationAdmin,
    OnDemandAdmin,
    Manager,
    Designer,
    Crm,
    ServiceProvider,
}

text_enum!(Role {
    Customer => "customer",
    SuperAdmin => "super_admin",
    Admin => "admin",
    InteriorAdmin => "interior_admin",
    ConstructionAdmin => "construction_admin",
    RenovationAdmin => "renovation_admin",
    OnDemandAdmin => "on_demand_admin",
    Manager => "manager",
    Designer => "designer",
    Crm => "crm",
    ServiceProvider => "service_provider",
});

impl Role {
    /// Vertical derivada do próprio nome do cargo (os quatro admins de vertical).
    pub fn implied_vertical(&self) -> Option<Vertical> {
        match self {
            Role::InteriorAdmin => Some(Vertical::Interior),
            Role::ConstructionAdmin => Some(Vertical::Construction),
            Role::RenovationAdmin => Some(Vertical::Renovation),
            Role::OnDemandAdmin => Some(Vertical::OnDemand),
            _ => None,
        }
    }

    /// Cargos que precisam de um `service_type` explícito.
    pub fn requires_service_type(&self) -> bool {
        matches!(
            self,
            Role::Admin | Role::Manager | Role::Designer | Role::Crm | Role::ServiceProvider
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

text_enum!(AccountStatus {
    Active => "active",
    Inactive => "inactive",
    Suspended => "suspended",
});

// --- Entidade ---

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    #[schema(example = "Maria da Silva")]
    pub name: String,
    #[schema(example = "maria@email.com")]
    pub email: String,
    pub phone: Option<String>,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: Role,
    pub service_type: Option<Vertical>,
    #[schema(value_type = Vec<Vertical>)]
    pub verticals: Json<Vec<Vertical>>,
    pub status: AccountStatus,

    // Preenchido apenas para contas `service_provider`
    pub provider_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Vertical "própria": a do cargo, senão o atributo `service_type`.
    pub fn own_vertical(&self) -> Option<Vertical> {
        self.role.implied_vertical().or(self.service_type)
    }

    /// Conjunto de verticais que a conta pode enxergar (própria ∪ verticals[]).
    pub fn allowed_verticals(&self) -> Vec<Vertical> {
        let mut allowed: Vec<Vertical> = self.own_vertical().into_iter().collect();
        for v in self.verticals.iter() {
            if !allowed.contains(v) {
                allowed.push(*v);
            }
        }
        allowed
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "maria@email.com")]
    pub email: String,
    #[validate(length(min = 8, max = 15, message = "invalid_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// Provisionamento de contas internas (admin, designer, prestador...)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionAccountPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 8, max = 15, message = "invalid_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
    pub role: Role,
    pub service_type: Option<Vertical>,
    #[serde(default)]
    pub verticals: Vec<Vertical>,
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountStatusPayload {
    pub status: AccountStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // ID da conta
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}
