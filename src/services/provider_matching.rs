// src/services/provider_matching.rs

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::provider::{EligibleProvidersQuery, Provider};

/// Critérios da busca de prestadores elegíveis.
///
/// A primeira fase (serviço, status, disponibilidade, cidade, pincode e
/// ordenação) roda no banco em `ProviderRepository::find_eligible`. A
/// segunda fase, por data, roda aqui em memória: dia da semana e
/// intervalos de folga não se prestam a índice.
#[derive(Debug, Clone)]
pub struct EligibilityCriteria {
    pub service_id: Uuid,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub date: Option<NaiveDate>,
}

impl From<EligibleProvidersQuery> for EligibilityCriteria {
    fn from(q: EligibleProvidersQuery) -> Self {
        Self {
            service_id: q.service_id,
            city: q.city.filter(|c| !c.trim().is_empty()),
            pincode: q.pincode.filter(|p| !p.trim().is_empty()),
            date: q.date,
        }
    }
}

// Padrão para ILIKE: a cidade informada é substring, sem diferenciar caixa
pub fn city_pattern(city: &str) -> String {
    let escaped = city.trim().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Segunda fase: mantém a ordem vinda do banco.
pub fn filter_by_date(providers: Vec<Provider>, date: Option<NaiveDate>) -> Vec<Provider> {
    match date {
        Some(date) => providers.into_iter().filter(|p| p.available_on(date)).collect(),
        None => providers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::provider::{fixtures::provider, UnavailableRange};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_filter_checks_weekday_and_leave() {
        let service = Uuid::new_v4();
        let weekday_worker = provider(&[service]);

        let mut on_leave = provider(&[service]);
        on_leave.unavailable_dates.push(UnavailableRange {
            from: date(2026, 10, 19),
            to: date(2026, 10, 20),
            reason: Some("viagem".into()),
        });

        let mut weekend_worker = provider(&[service]);
        weekend_worker.working_days = vec!["saturday".into(), "sunday".into()];

        let ids = |v: &[Provider]| v.iter().map(|p| p.id).collect::<Vec<_>>();
        let all = vec![weekday_worker.clone(), on_leave.clone(), weekend_worker.clone()];

        // Terça-feira, segundo dia da folga
        let tuesday = filter_by_date(all.clone(), Some(date(2026, 10, 20)));
        assert_eq!(ids(&tuesday), vec![weekday_worker.id]);

        // Sábado
        let saturday = filter_by_date(all.clone(), Some(date(2026, 10, 24)));
        assert_eq!(ids(&saturday), vec![weekend_worker.id]);

        // Sem data: nada é removido e a ordem é preservada
        assert_eq!(ids(&filter_by_date(all.clone(), None)), ids(&all));
    }

    #[test]
    fn city_pattern_escapes_wildcards() {
        assert_eq!(city_pattern(" benga "), "%benga%");
        assert_eq!(city_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn blank_query_fields_are_ignored() {
        let criteria = EligibilityCriteria::from(EligibleProvidersQuery {
            service_id: Uuid::new_v4(),
            city: Some("  ".into()),
            pincode: Some("560001".into()),
            date: None,
        });
        assert!(criteria.city.is_none());
        assert_eq!(criteria.pincode.as_deref(), Some("560001"));
    }
}
