// src/models/service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::account::Vertical;

// Item do catálogo de serviços (o que o cliente agenda)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub id: Uuid,
    #[schema(example = "Instalação de ar-condicionado")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "appliance")]
    pub category: String,
    pub service_type: Vertical,
    #[schema(example = "650.00")]
    pub base_price: Decimal,
    #[schema(example = 120)]
    pub duration_minutes: Option<i32>,
    pub is_active: bool,
    pub total_bookings: i32,
    pub completed_bookings: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServicePayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub category: String,
    pub service_type: Vertical,
    pub base_price: Decimal,
    pub duration_minutes: Option<i32>,
}
