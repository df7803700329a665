// src/models/project.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::account::Vertical;

// Projetos e leads: CRUD simples. O `service_type` é só o discriminador de tenancy.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

text_enum!(ProjectStatus {
    Planning => "planning",
    InProgress => "in_progress",
    OnHold => "on_hold",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

text_enum!(LeadStatus {
    New => "new",
    Contacted => "contacted",
    Qualified => "qualified",
    Converted => "converted",
    Lost => "lost",
});

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    #[schema(example = "Reforma cozinha - Apto 302")]
    pub name: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub service_type: Vertical,
    pub status: ProjectStatus,
    #[schema(example = "250000.00")]
    pub budget: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service_type: Vertical,
    #[schema(example = "website")]
    pub source: Option<String>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(length(min = 1, message = "required"))]
    pub client_name: String,
    #[validate(email(message = "invalid_email"))]
    pub client_email: Option<String>,
    // Opcional: sem ele, vale a vertical do cabeçalho / da conta
    pub service_type: Option<Vertical>,
    pub budget: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

// Lista explícita do que pode mudar num projeto. Nada de copiar chaves do body.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProjectPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl UpdateProjectPayload {
    pub fn apply_to(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if self.budget.is_some() {
            project.budget = self.budget;
        }
        if self.start_date.is_some() {
            project.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            project.end_date = self.end_date;
        }
        if self.notes.is_some() {
            project.notes = self.notes;
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 15, message = "invalid_phone"))]
    pub phone: Option<String>,
    pub service_type: Option<Vertical>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateLeadPayload {
    pub status: Option<LeadStatus>,
    #[validate(length(min = 8, max = 15, message = "invalid_phone"))]
    pub phone: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl UpdateLeadPayload {
    pub fn apply_to(self, lead: &mut Lead) {
        if let Some(status) = self.status {
            lead.status = status;
        }
        if self.phone.is_some() {
            lead.phone = self.phone;
        }
        if self.source.is_some() {
            lead.source = self.source;
        }
        if self.notes.is_some() {
            lead.notes = self.notes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_payload_rejects_fields_outside_the_allow_list() {
        let attempt = serde_json::json!({ "name": "Novo nome", "createdBy": Uuid::new_v4() });
        assert!(serde_json::from_value::<UpdateProjectPayload>(attempt).is_err());

        let attempt = serde_json::json!({ "serviceType": "interior" });
        assert!(serde_json::from_value::<UpdateLeadPayload>(attempt).is_err());
    }

    #[test]
    fn update_only_touches_present_fields() {
        let now = Utc::now();
        let mut lead = Lead {
            id: Uuid::new_v4(),
            name: "Carlos".to_string(),
            email: None,
            phone: Some("11999998888".to_string()),
            service_type: Vertical::Renovation,
            source: Some("website".to_string()),
            status: LeadStatus::New,
            notes: None,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };

        let patch: UpdateLeadPayload =
            serde_json::from_value(serde_json::json!({ "status": "contacted" })).unwrap();
        patch.apply_to(&mut lead);

        assert_eq!(lead.status, LeadStatus::Contacted);
        assert_eq!(lead.phone.as_deref(), Some("11999998888"));
        assert_eq!(lead.service_type, Vertical::Renovation);
    }
}
