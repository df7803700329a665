// src/common/db_utils.rs

use sqlx::{Executor, Postgres};

use crate::common::error::AppError;

// ---
// Sequências legíveis (OD-BK-000001, SP-000001)
// ---
// O número vem de uma SEQUENCE do Postgres: nextval é atômico, então
// duas criações concorrentes nunca recebem o mesmo código.
pub(crate) async fn next_display_code<'e, E>(
    executor: E,
    sequence: &str,
    prefix: &str,
) -> Result<String, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let value: i64 = sqlx::query_scalar("SELECT nextval($1::regclass)")
        .bind(sequence)
        .fetch_one(executor)
        .await?;

    Ok(format_display_code(prefix, value))
}

pub(crate) fn format_display_code(prefix: &str, value: i64) -> String {
    format!("{}-{:06}", prefix, value)
}

#[cfg(test)]
mod tests {
    use super::format_display_code;

    #[test]
    fn pads_to_six_digits() {
        assert_eq!(format_display_code("OD-BK", 42), "OD-BK-000042");
        assert_eq!(format_display_code("SP", 1_234_567), "SP-1234567");
    }
}
