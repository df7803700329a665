// src/models/provider.rs

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Active,
    Inactive,
    Suspended,
    PendingVerification,
}

text_enum!(ProviderStatus {
    Active => "active",
    Inactive => "inactive",
    Suspended => "suspended",
    PendingVerification => "pending_verification",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Busy,
    Unavailable,
    OnLeave,
}

text_enum!(AvailabilityStatus {
    Available => "available",
    Busy => "busy",
    Unavailable => "unavailable",
    OnLeave => "on_leave",
});

// --- Partes embutidas (JSONB) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfferedService {
    pub service: Uuid,
    #[schema(example = "split AC")]
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAddress {
    pub street: Option<String>,
    #[schema(example = "Bengaluru")]
    pub city: String,
    pub state: Option<String>,
    #[schema(example = "560001")]
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    #[schema(example = "09:00")]
    pub start: String,
    #[schema(example = "18:00")]
    pub end: String,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self { start: "09:00".to_string(), end: "18:00".to_string() }
    }
}

// Intervalo de indisponibilidade, inclusivo nas duas pontas
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableRange {
    #[schema(value_type = String, format = Date, example = "2026-12-24")]
    pub from: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2026-12-26")]
    pub to: NaiveDate,
    pub reason: Option<String>,
}

impl UnavailableRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReview {
    pub booking_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    pub total_earned: Decimal,
    pub current_month_earnings: Decimal,
    pub pending_payment: Decimal,
}

// --- Entidade ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: Uuid,
    #[schema(example = "SP-000042")]
    pub provider_code: String,
    pub account_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: ProviderStatus,

    #[schema(value_type = Vec<OfferedService>)]
    pub services: Json<Vec<OfferedService>>,
    pub experience_years: i32,
    #[schema(value_type = ProviderAddress)]
    pub address: Json<ProviderAddress>,
    pub service_pincodes: Vec<String>,

    pub availability_status: AvailabilityStatus,
    // Nomes dos dias em minúsculo ("monday", "tuesday"...)
    pub working_days: Vec<String>,
    #[schema(value_type = WorkingHours)]
    pub working_hours: Json<WorkingHours>,
    #[schema(value_type = Vec<UnavailableRange>)]
    pub unavailable_dates: Json<Vec<UnavailableRange>>,

    pub total_bookings: i32,
    pub completed_bookings: i32,
    pub cancelled_bookings: i32,
    pub completion_rate: f64,

    pub rating_average: f64,
    pub rating_count: i32,
    #[schema(value_type = Vec<ProviderReview>)]
    pub reviews: Json<Vec<ProviderReview>>,
    #[schema(value_type = Earnings)]
    pub earnings: Json<Earnings>,

    pub documents_verified: bool,
    pub background_verified: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

impl Provider {
    pub fn offers_service(&self, service_id: Uuid) -> bool {
        self.services.iter().any(|s| s.service == service_id)
    }

    pub fn is_active(&self) -> bool {
        self.status == ProviderStatus::Active
    }

    pub fn works_on(&self, date: NaiveDate) -> bool {
        let day = weekday_name(date);
        self.working_days.iter().any(|d| d.eq_ignore_ascii_case(day))
    }

    pub fn on_leave(&self, date: NaiveDate) -> bool {
        self.unavailable_dates.iter().any(|r| r.contains(date))
    }

    pub fn available_on(&self, date: NaiveDate) -> bool {
        self.works_on(date) && !self.on_leave(date)
    }

    /// Campos derivados; roda antes de todo save.
    pub fn recompute_derived(&mut self) {
        if self.total_bookings > 0 {
            self.completion_rate = f64::from(self.completed_bookings) / f64::from(self.total_bookings);
        }
    }

    pub fn record_assignment(&mut self) {
        self.total_bookings += 1;
        self.availability_status = AvailabilityStatus::Busy;
    }

    pub fn record_completion(&mut self, amount: Decimal) {
        self.completed_bookings += 1;
        self.availability_status = AvailabilityStatus::Available;
        self.earnings.total_earned += amount;
        self.earnings.current_month_earnings += amount;
        self.earnings.pending_payment += amount;
    }

    pub fn record_cancellation(&mut self) {
        self.cancelled_bookings += 1;
        self.availability_status = AvailabilityStatus::Available;
    }

    pub fn release(&mut self) {
        self.availability_status = AvailabilityStatus::Available;
    }

    /// Média corrente: (média * n + nova) / (n + 1)
    pub fn record_rating(&mut self, booking_id: Uuid, rating: u8, comment: Option<String>, now: DateTime<Utc>) {
        let count = f64::from(self.rating_count);
        self.rating_average = (self.rating_average * count + f64::from(rating)) / (count + 1.0);
        self.rating_count += 1;
        self.reviews.push(ProviderReview {
            booking_id,
            rating,
            comment,
            created_at: now,
        });
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProviderPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 8, max = 15, message = "invalid_phone"))]
    pub phone: String,
    pub account_id: Option<Uuid>,
    #[validate(length(min = 1, message = "required"))]
    pub services: Vec<OfferedService>,
    #[serde(default)]
    pub experience_years: i32,
    pub address: ProviderAddress,
    #[serde(default)]
    pub service_pincodes: Vec<String>,
    #[schema(example = json!(["monday", "tuesday", "wednesday", "thursday", "friday"]))]
    pub working_days: Vec<String>,
    pub working_hours: Option<WorkingHours>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvailabilityPayload {
    pub status: AvailabilityStatus,
    pub working_days: Option<Vec<String>>,
    pub working_hours: Option<WorkingHours>,
    pub unavailable_dates: Option<Vec<UnavailableRange>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVerificationPayload {
    pub documents_verified: Option<bool>,
    pub background_verified: Option<bool>,
    pub status: Option<ProviderStatus>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EligibleProvidersQuery {
    pub service_id: Uuid,
    pub city: Option<String>,
    pub pincode: Option<String>,
    #[param(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn provider(services: &[Uuid]) -> Provider {
        let now = Utc::now();
        Provider {
            id: Uuid::new_v4(),
            provider_code: "SP-000001".to_string(),
            account_id: None,
            name: "Ravi Kumar".to_string(),
            email: "ravi@example.com".to_string(),
            phone: "9876543210".to_string(),
            status: ProviderStatus::Active,
            services: Json(
                services
                    .iter()
                    .map(|id| OfferedService { service: *id, specialization: None })
                    .collect(),
            ),
            experience_years: 3,
            address: Json(ProviderAddress { city: "Bengaluru".to_string(), ..Default::default() }),
            service_pincodes: vec!["560001".to_string()],
            availability_status: AvailabilityStatus::Available,
            working_days: ["monday", "tuesday", "wednesday", "thursday", "friday"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            working_hours: Json(WorkingHours::default()),
            unavailable_dates: Json(vec![]),
            total_bookings: 0,
            completed_bookings: 0,
            cancelled_bookings: 0,
            completion_rate: 0.0,
            rating_average: 0.0,
            rating_count: 0,
            reviews: Json(vec![]),
            earnings: Json(Earnings::default()),
            documents_verified: true,
            background_verified: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::provider;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn completion_rate_follows_counters() {
        let mut p = provider(&[]);
        p.recompute_derived();
        assert_eq!(p.completion_rate, 0.0);

        p.total_bookings = 4;
        p.completed_bookings = 3;
        p.recompute_derived();
        assert!((p.completion_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn leave_range_is_inclusive_on_both_ends() {
        let mut p = provider(&[]);
        p.unavailable_dates.push(UnavailableRange {
            from: date(2026, 10, 19),
            to: date(2026, 10, 21),
            reason: None,
        });

        assert!(p.on_leave(date(2026, 10, 19)));
        assert!(p.on_leave(date(2026, 10, 21)));
        assert!(!p.on_leave(date(2026, 10, 22)));
        assert!(!p.on_leave(date(2026, 10, 18)));
    }

    #[test]
    fn working_days_match_weekday_name() {
        let p = provider(&[]);
        // 2026-10-17 é sábado
        assert!(!p.works_on(date(2026, 10, 17)));
        assert!(p.works_on(date(2026, 10, 16)));
    }

    #[test]
    fn running_rating_average() {
        let mut p = provider(&[]);
        p.rating_average = 4.0;
        p.rating_count = 3;
        p.record_rating(Uuid::new_v4(), 5, None, Utc::now());

        assert!((p.rating_average - 4.25).abs() < 1e-9);
        assert_eq!(p.rating_count, 4);
        assert_eq!(p.reviews.len(), 1);
    }

    #[test]
    fn completion_pays_and_frees_the_provider() {
        let mut p = provider(&[]);
        p.record_assignment();
        assert_eq!(p.availability_status, AvailabilityStatus::Busy);

        p.record_completion(Decimal::from(770));
        assert_eq!(p.completed_bookings, 1);
        assert_eq!(p.availability_status, AvailabilityStatus::Available);
        assert_eq!(p.earnings.total_earned, Decimal::from(770));
        assert_eq!(p.earnings.pending_payment, Decimal::from(770));
        assert_eq!(p.earnings.current_month_earnings, Decimal::from(770));
        assert_eq!(p.total_bookings, 1);
    }
}
