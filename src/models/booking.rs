// src/models/booking.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::account::Vertical;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    ProviderOnWay,
    InProgress,
    WorkCompleted,
    Completed,
    CancelledByCustomer,
    CancelledByProvider,
    CancelledByAdmin,
    NoShowCustomer,
    NoShowProvider,
    Rescheduled,
}

text_enum!(BookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    ProviderOnWay => "provider_on_way",
    InProgress => "in_progress",
    WorkCompleted => "work_completed",
    Completed => "completed",
    CancelledByCustomer => "cancelled_by_customer",
    CancelledByProvider => "cancelled_by_provider",
    CancelledByAdmin => "cancelled_by_admin",
    NoShowCustomer => "no_show_customer",
    NoShowProvider => "no_show_provider",
    Rescheduled => "rescheduled",
});

const CANCELLATIONS: [BookingStatus; 3] = [
    BookingStatus::CancelledByCustomer,
    BookingStatus::CancelledByProvider,
    BookingStatus::CancelledByAdmin,
];

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed) || self.cancelled_by().is_some() || self.is_no_show()
    }

    pub fn is_no_show(&self) -> bool {
        matches!(self, BookingStatus::NoShowCustomer | BookingStatus::NoShowProvider)
    }

    /// Quem cancelou, extraído do sufixo do status.
    pub fn cancelled_by(&self) -> Option<CancelledBy> {
        match self {
            BookingStatus::CancelledByCustomer => Some(CancelledBy::Customer),
            BookingStatus::CancelledByProvider => Some(CancelledBy::Provider),
            BookingStatus::CancelledByAdmin => Some(CancelledBy::Admin),
            _ => None,
        }
    }

    /// Tabela de transições. Estados terminais não saem; repetir o status
    /// atual também não é permitido.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        if CANCELLATIONS.contains(&next) {
            return matches!(self, Pending | Confirmed | ProviderOnWay | InProgress | Rescheduled);
        }

        match (self, next) {
            (Pending, Confirmed | Rescheduled) => true,
            (Confirmed, ProviderOnWay | InProgress | Rescheduled | NoShowCustomer | NoShowProvider) => true,
            (ProviderOnWay, InProgress | Rescheduled | NoShowCustomer | NoShowProvider) => true,
            (InProgress, WorkCompleted) => true,
            (WorkCompleted, Completed) => true,
            (Rescheduled, Pending | Confirmed) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Customer,
    Provider,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    Online,
    Wallet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Completed,
    Refunded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

text_enum!(Priority {
    Low => "low",
    Normal => "normal",
    High => "high",
    Urgent => "urgent",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RatingDirection {
    CustomerToProvider,
    ProviderToCustomer,
}

// --- Partes embutidas (JSONB) ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Anita Sharma")]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "anita@example.com")]
    pub email: String,
    #[validate(length(min = 8, max = 15, message = "invalid_phone"))]
    #[schema(example = "9876543210")]
    pub phone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAddress {
    #[validate(length(min = 1, message = "required"))]
    pub street: String,
    #[validate(length(min = 1, message = "required"))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub pincode: String,
    pub landmark: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "10:00")]
    pub start: String,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "12:00")]
    pub end: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    pub description: Option<String>,
    pub requirements: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_pricing"))]
pub struct Pricing {
    #[serde(default)]
    pub service_charge: Decimal,
    #[serde(default)]
    pub material_cost: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[schema(example = "770.00")]
    pub total: Decimal,
    #[serde(default)]
    pub advance_paid: Decimal,
    // Sempre total - advance_paid; recalculado em todo save
    #[serde(default)]
    pub remaining_amount: Decimal,
}

impl Pricing {
    pub fn recompute(&mut self) {
        self.remaining_amount = self.total - self.advance_paid;
    }
}

fn validate_pricing(pricing: &Pricing) -> Result<(), ValidationError> {
    let amounts = [
        pricing.service_charge,
        pricing.material_cost,
        pricing.tax,
        pricing.discount,
        pricing.total,
        pricing.advance_paid,
    ];
    if amounts.iter().any(|a| *a < Decimal::ZERO) {
        return Err(ValidationError::new("negative_amount").with_message("negative_amount".into()));
    }
    if pricing.advance_paid > pricing.total {
        return Err(ValidationError::new("advance_exceeds_total").with_message("advance_exceeds_total".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: BookingStatus,
    pub timestamp: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub notes: Option<String>,
}

// OTP de criação da reserva (confirmação do contato do cliente)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingOtp {
    pub code: String,
    pub verified: bool,
    pub generated_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    // Tentativas erradas; no limite o código fica bloqueado
    #[serde(default)]
    pub failed_attempts: u32,
}

// OTP de conclusão: trocado presencialmente entre cliente e prestador
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOtp {
    pub code: String,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub cancelled_by: CancelledBy,
    pub cancelled_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub refund_eligible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    pub rating: u8,
    pub comment: Option<String>,
    pub rated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ratings {
    pub customer_to_provider: Option<RatingEntry>,
    pub provider_to_customer: Option<RatingEntry>,
}

// --- Entidade ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    #[schema(example = "OD-BK-000128")]
    pub booking_code: String,
    pub service_id: Uuid,
    pub service_type: Vertical,

    #[schema(value_type = CustomerSnapshot)]
    pub customer: Json<CustomerSnapshot>,
    #[schema(value_type = ServiceAddress)]
    pub service_address: Json<ServiceAddress>,
    #[schema(value_type = String, format = Date)]
    pub scheduled_date: NaiveDate,
    #[schema(value_type = TimeSlot)]
    pub time_slot: Json<TimeSlot>,
    #[schema(value_type = ServiceDetails)]
    pub service_details: Json<ServiceDetails>,

    pub service_provider: Option<Uuid>,

    #[schema(value_type = Pricing)]
    pub pricing: Json<Pricing>,
    #[schema(value_type = Payment)]
    pub payment: Json<Payment>,

    pub status: BookingStatus,
    #[schema(value_type = Vec<StatusHistoryEntry>)]
    pub status_history: Json<Vec<StatusHistoryEntry>>,

    // Os códigos nunca saem na resposta da API
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub otp: Option<Json<BookingOtp>>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub completion_otp: Option<Json<CompletionOtp>>,

    pub work_started_at: Option<DateTime<Utc>>,
    pub work_ended_at: Option<DateTime<Utc>>,
    pub actual_duration_minutes: Option<i64>,

    #[schema(value_type = Option<Cancellation>)]
    pub cancellation: Option<Json<Cancellation>>,
    #[schema(value_type = Ratings)]
    pub ratings: Json<Ratings>,

    pub priority: Priority,
    #[schema(example = "web")]
    pub source: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Guarda de consistência aplicada antes de qualquer persistência.
    pub fn prepare_for_save(&mut self) {
        self.pricing.recompute();
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    pub service_id: Uuid,
    #[validate(nested)]
    pub customer: CustomerSnapshot,
    #[validate(nested)]
    pub service_address: ServiceAddress,
    #[schema(value_type = String, format = Date, example = "2026-10-20")]
    pub scheduled_date: NaiveDate,
    #[validate(nested)]
    pub time_slot: TimeSlot,
    #[serde(default)]
    pub service_details: ServiceDetails,
    #[validate(nested)]
    pub pricing: Pricing,
    pub payment: Option<PaymentInput>,
    pub priority: Option<Priority>,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpPayload {
    #[validate(length(equal = 6, message = "invalid_otp_format"))]
    #[schema(example = "482913")]
    pub otp: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    // String crua: status desconhecido precisa virar InvalidStatus (400), não erro de JSON
    #[schema(example = "in_progress")]
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignProviderPayload {
    pub provider_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReschedulePayload {
    #[schema(value_type = String, format = Date)]
    pub scheduled_date: NaiveDate,
    #[validate(nested)]
    pub time_slot: TimeSlot,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackBookingPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "OD-BK-000128")]
    pub booking_id: String,
    #[validate(length(min = 8, max = 15, message = "invalid_phone"))]
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateBookingPayload {
    pub direction: RatingDirection,
    #[schema(example = 5)]
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn booking(service_id: Uuid, total: i64, advance: i64) -> Booking {
        let now = Utc::now();
        let mut booking = Booking {
            id: Uuid::new_v4(),
            booking_code: "OD-BK-000001".to_string(),
            service_id,
            service_type: Vertical::OnDemand,
            customer: Json(CustomerSnapshot {
                name: "Anita Sharma".to_string(),
                email: "anita@example.com".to_string(),
                phone: "9876543210".to_string(),
            }),
            service_address: Json(ServiceAddress {
                street: "12 MG Road".to_string(),
                city: "Bengaluru".to_string(),
                state: None,
                pincode: "560001".to_string(),
                landmark: None,
                coordinates: None,
            }),
            scheduled_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            time_slot: Json(TimeSlot { start: "10:00".to_string(), end: "12:00".to_string() }),
            service_details: Json(ServiceDetails::default()),
            service_provider: None,
            pricing: Json(Pricing {
                total: Decimal::from(total),
                advance_paid: Decimal::from(advance),
                ..Default::default()
            }),
            payment: Json(Payment {
                method: PaymentMethod::Cash,
                status: PaymentStatus::Pending,
                transaction_id: None,
            }),
            status: BookingStatus::Pending,
            status_history: Json(vec![StatusHistoryEntry {
                status: BookingStatus::Pending,
                timestamp: now,
                updated_by: None,
                notes: None,
            }]),
            otp: None,
            completion_otp: None,
            work_started_at: None,
            work_ended_at: None,
            actual_duration_minutes: None,
            cancellation: None,
            ratings: Json(Ratings::default()),
            priority: Priority::Normal,
            source: "web".to_string(),
            created_at: now,
            updated_at: now,
        };
        booking.prepare_for_save();
        booking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn remaining_amount_is_total_minus_advance() {
        let b = fixtures::booking(Uuid::new_v4(), 770, 0);
        assert_eq!(b.pricing.remaining_amount, Decimal::from(770));

        let mut b = fixtures::booking(Uuid::new_v4(), 1000, 250);
        assert_eq!(b.pricing.remaining_amount, Decimal::from(750));

        b.pricing.advance_paid = Decimal::from(1000);
        b.prepare_for_save();
        assert!(b.pricing.remaining_amount.is_zero());
    }

    #[rstest]
    #[case(BookingStatus::Completed)]
    #[case(BookingStatus::CancelledByCustomer)]
    #[case(BookingStatus::CancelledByProvider)]
    #[case(BookingStatus::CancelledByAdmin)]
    #[case(BookingStatus::NoShowCustomer)]
    #[case(BookingStatus::NoShowProvider)]
    fn terminal_states_have_no_exits(#[case] status: BookingStatus) {
        assert!(status.is_terminal());
        for next in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::CancelledByAdmin,
            BookingStatus::Rescheduled,
        ] {
            assert!(!status.can_transition_to(next), "{status} -> {next}");
        }
    }

    #[rstest]
    #[case(BookingStatus::Pending, BookingStatus::Confirmed, true)]
    #[case(BookingStatus::Confirmed, BookingStatus::ProviderOnWay, true)]
    #[case(BookingStatus::ProviderOnWay, BookingStatus::InProgress, true)]
    #[case(BookingStatus::InProgress, BookingStatus::WorkCompleted, true)]
    #[case(BookingStatus::WorkCompleted, BookingStatus::Completed, true)]
    #[case(BookingStatus::Rescheduled, BookingStatus::Confirmed, true)]
    #[case(BookingStatus::Pending, BookingStatus::CancelledByCustomer, true)]
    #[case(BookingStatus::Pending, BookingStatus::Completed, false)]
    #[case(BookingStatus::Confirmed, BookingStatus::Confirmed, false)]
    #[case(BookingStatus::WorkCompleted, BookingStatus::CancelledByAdmin, false)]
    #[case(BookingStatus::InProgress, BookingStatus::Rescheduled, false)]
    fn transition_table(#[case] from: BookingStatus, #[case] to: BookingStatus, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn status_strings_round_trip_through_from_str() {
        assert_eq!("provider_on_way".parse::<BookingStatus>(), Ok(BookingStatus::ProviderOnWay));
        assert!("teleported".parse::<BookingStatus>().is_err());
        assert_eq!(BookingStatus::CancelledByProvider.cancelled_by(), Some(CancelledBy::Provider));
    }

    #[test]
    fn negative_amounts_fail_validation() {
        let pricing = Pricing { total: Decimal::from(-5), ..Default::default() };
        assert!(pricing.validate().is_err());

        let pricing = Pricing { total: Decimal::from(100), advance_paid: Decimal::from(150), ..Default::default() };
        assert!(pricing.validate().is_err());

        let pricing = Pricing { total: Decimal::from(100), advance_paid: Decimal::from(40), ..Default::default() };
        assert!(pricing.validate().is_ok());
    }
}
