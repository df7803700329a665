// src/services/access_control.rs

use crate::{
    common::error::AppError,
    models::{
        account::{Account, Role, Vertical},
        provider::Provider,
    },
};

// =============================================================================
//  1. CAPACIDADES (o que cada cargo pode fazer)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewAllVerticals,
    ManageAccounts,
    ManageServices,
    ManageProviders,
    ManageBookings,
    AssignProviders,
    FulfilBookings,
    ManageProjects,
    ManageLeads,
    RateBookings,
}

impl Capability {
    pub fn slug(&self) -> &'static str {
        match self {
            Capability::ViewAllVerticals => "verticals:all",
            Capability::ManageAccounts => "accounts:write",
            Capability::ManageServices => "services:write",
            Capability::ManageProviders => "providers:write",
            Capability::ManageBookings => "bookings:write",
            Capability::AssignProviders => "bookings:assign",
            Capability::FulfilBookings => "bookings:fulfil",
            Capability::ManageProjects => "projects:write",
            Capability::ManageLeads => "leads:write",
            Capability::RateBookings => "bookings:rate",
        }
    }
}

fn capabilities_of(role: Role) -> &'static [Capability] {
    use Capability::*;

    match role {
        Role::SuperAdmin => &[
            ViewAllVerticals,
            ManageAccounts,
            ManageServices,
            ManageProviders,
            ManageBookings,
            AssignProviders,
            ManageProjects,
            ManageLeads,
            RateBookings,
        ],
        Role::Admin
        | Role::InteriorAdmin
        | Role::ConstructionAdmin
        | Role::RenovationAdmin
        | Role::OnDemandAdmin => &[
            ManageAccounts,
            ManageServices,
            ManageProviders,
            ManageBookings,
            AssignProviders,
            ManageProjects,
            ManageLeads,
            RateBookings,
        ],
        Role::Manager => &[ManageBookings, AssignProviders, ManageProjects, ManageLeads],
        Role::Designer => &[ManageProjects],
        Role::Crm => &[ManageLeads],
        Role::ServiceProvider => &[FulfilBookings, RateBookings],
        Role::Customer => &[RateBookings],
    }
}

/// Única checagem de autorização do sistema.
pub fn has_capability(account: &Account, capability: Capability) -> bool {
    account.is_active() && capabilities_of(account.role).contains(&capability)
}

pub fn require_capability(account: &Account, capability: Capability) -> Result<(), AppError> {
    if has_capability(account, capability) {
        Ok(())
    } else {
        Err(AppError::MissingCapability(capability.slug()))
    }
}

/// Cargo × vertical no provisionamento: admins de vertical derivam do nome,
/// os cargos de equipe exigem exatamente um `service_type`, cliente e
/// super-admin não carregam nenhum.
pub fn validate_role_vertical(role: Role, service_type: Option<Vertical>) -> Result<(), AppError> {
    match (role.implied_vertical(), service_type) {
        (Some(implied), Some(given)) if implied != given => Err(AppError::InvalidInput(format!(
            "o cargo {} pertence à vertical {}",
            role, implied
        ))),
        (Some(_), _) => Ok(()),
        (None, None) if role.requires_service_type() => Err(AppError::InvalidInput(format!(
            "o cargo {} exige um serviceType",
            role
        ))),
        (None, Some(_)) if matches!(role, Role::Customer | Role::SuperAdmin) => Err(AppError::InvalidInput(
            format!("o cargo {} não é restrito a uma vertical", role),
        )),
        _ => Ok(()),
    }
}

// Conta e prestador se vinculam 1:1, só uma vez
pub fn ensure_account_linkable(account: &Account) -> Result<(), AppError> {
    if account.role != Role::ServiceProvider {
        return Err(AppError::InvalidInput("a conta vinculada precisa ser service_provider".to_string()));
    }
    if account.provider_id.is_some() {
        return Err(AppError::ProviderAlreadyLinked);
    }
    Ok(())
}

pub fn ensure_provider_unlinked(provider: &Provider) -> Result<(), AppError> {
    match provider.account_id {
        Some(_) => Err(AppError::ProviderAlreadyLinked),
        None => Ok(()),
    }
}

// =============================================================================
//  2. FILTRO DE ACESSO POR VERTICAL (service type)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerticalFilter {
    All,
    Only(Vec<Vertical>),
}

impl VerticalFilter {
    /// Parâmetro para `($1::text[] IS NULL OR service_type = ANY($1))`.
    pub fn as_bind(&self) -> Option<Vec<String>> {
        match self {
            VerticalFilter::All => None,
            VerticalFilter::Only(verticals) => Some(verticals.iter().map(|v| v.as_str().to_string()).collect()),
        }
    }

    pub fn allows(&self, vertical: Vertical) -> bool {
        match self {
            VerticalFilter::All => true,
            VerticalFilter::Only(verticals) => verticals.contains(&vertical),
        }
    }
}

/// Traduz (conta, vertical pedida) num filtro de consulta.
///
/// Uma vertical pedida explicitamente fora do escopo da conta é sempre
/// `AccessDenied`: nunca troca silenciosamente pela vertical da própria conta.
pub fn filter_for(account: &Account, requested: Option<Vertical>) -> Result<VerticalFilter, AppError> {
    if has_capability(account, Capability::ViewAllVerticals) {
        return Ok(match requested {
            Some(v) => VerticalFilter::Only(vec![v]),
            None => VerticalFilter::All,
        });
    }

    let allowed = account.allowed_verticals();

    match requested {
        Some(v) if allowed.contains(&v) => Ok(VerticalFilter::Only(vec![v])),
        Some(v) => Err(AppError::AccessDenied(v.to_string())),
        None if allowed.is_empty() => Err(AppError::AccessDenied("-".to_string())),
        None => Ok(VerticalFilter::Only(allowed)),
    }
}

/// Vertical para gravar um registro novo: a informada no corpo, a do
/// cabeçalho, ou a própria da conta; sempre dentro do filtro.
pub fn resolve_write_vertical(
    account: &Account,
    requested: Option<Vertical>,
    body: Option<Vertical>,
) -> Result<Vertical, AppError> {
    let filter = filter_for(account, requested)?;

    let chosen = body
        .or(requested)
        .or_else(|| account.own_vertical())
        .ok_or_else(|| AppError::InvalidInput("serviceType é obrigatório".to_string()))?;

    if filter.allows(chosen) {
        Ok(chosen)
    } else {
        Err(AppError::AccessDenied(chosen.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    use crate::models::account::{Account, AccountStatus, Role, Vertical};

    pub fn account(role: Role, service_type: Option<Vertical>) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            name: "Conta de teste".to_string(),
            email: "conta@example.com".to_string(),
            phone: None,
            password_hash: String::new(),
            role,
            service_type,
            verticals: Json(vec![]),
            status: AccountStatus::Active,
            provider_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::account;
    use super::*;
    use crate::models::{account::AccountStatus, provider::fixtures::provider as provider_fixture};
    use rstest::rstest;
    use uuid::Uuid;
    use sqlx::types::Json;

    #[test]
    fn account_already_holding_a_provider_cannot_be_linked_again() {
        let mut account = account(Role::ServiceProvider, Some(Vertical::OnDemand));
        assert!(ensure_account_linkable(&account).is_ok());

        account.provider_id = Some(Uuid::new_v4());
        assert!(matches!(ensure_account_linkable(&account), Err(AppError::ProviderAlreadyLinked)));

        let designer = super::fixtures::account(Role::Designer, Some(Vertical::Interior));
        assert!(matches!(ensure_account_linkable(&designer), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn provider_already_owned_by_an_account_is_rejected() {
        let mut provider = provider_fixture(&[]);
        assert!(ensure_provider_unlinked(&provider).is_ok());

        provider.account_id = Some(Uuid::new_v4());
        assert!(matches!(ensure_provider_unlinked(&provider), Err(AppError::ProviderAlreadyLinked)));
    }

    #[test]
    fn super_admin_sees_everything_or_the_requested_vertical() {
        let root = account(Role::SuperAdmin, None);
        assert_eq!(filter_for(&root, None).unwrap(), VerticalFilter::All);
        assert_eq!(
            filter_for(&root, Some(Vertical::Interior)).unwrap(),
            VerticalFilter::Only(vec![Vertical::Interior])
        );
    }

    #[test]
    fn vertical_admin_requesting_another_vertical_is_denied() {
        let admin = account(Role::ConstructionAdmin, None);
        let err = filter_for(&admin, Some(Vertical::Interior)).unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(v) if v == "interior"));
    }

    #[test]
    fn vertical_admin_defaults_to_own_vertical() {
        let admin = account(Role::ConstructionAdmin, None);
        assert_eq!(
            filter_for(&admin, None).unwrap(),
            VerticalFilter::Only(vec![Vertical::Construction])
        );
        assert_eq!(
            filter_for(&admin, Some(Vertical::Construction)).unwrap(),
            VerticalFilter::Only(vec![Vertical::Construction])
        );
    }

    #[test]
    fn plain_admin_falls_back_to_service_type() {
        let admin = account(Role::Admin, Some(Vertical::Renovation));
        assert_eq!(
            filter_for(&admin, None).unwrap(),
            VerticalFilter::Only(vec![Vertical::Renovation])
        );
    }

    #[test]
    fn multiple_verticals_produce_the_union() {
        let mut manager = account(Role::Manager, Some(Vertical::Interior));
        manager.verticals = Json(vec![Vertical::Interior, Vertical::Renovation]);

        assert_eq!(
            filter_for(&manager, None).unwrap(),
            VerticalFilter::Only(vec![Vertical::Interior, Vertical::Renovation])
        );
        assert!(filter_for(&manager, Some(Vertical::Renovation)).is_ok());
        assert!(filter_for(&manager, Some(Vertical::OnDemand)).is_err());
    }

    #[test]
    fn account_without_scope_is_denied() {
        let customer = account(Role::Customer, None);
        assert!(matches!(filter_for(&customer, None), Err(AppError::AccessDenied(_))));
    }

    #[test]
    fn bind_value_matches_filter() {
        assert_eq!(VerticalFilter::All.as_bind(), None);
        assert_eq!(
            VerticalFilter::Only(vec![Vertical::OnDemand]).as_bind(),
            Some(vec!["on_demand".to_string()])
        );
    }

    #[rstest]
    #[case(Role::InteriorAdmin, None, true)]
    #[case(Role::InteriorAdmin, Some(Vertical::Interior), true)]
    #[case(Role::InteriorAdmin, Some(Vertical::Construction), false)]
    #[case(Role::Designer, None, false)]
    #[case(Role::Designer, Some(Vertical::Interior), true)]
    #[case(Role::ServiceProvider, Some(Vertical::OnDemand), true)]
    #[case(Role::Customer, None, true)]
    #[case(Role::Customer, Some(Vertical::Interior), false)]
    #[case(Role::SuperAdmin, None, true)]
    fn role_vertical_invariant(#[case] role: Role, #[case] service_type: Option<Vertical>, #[case] ok: bool) {
        assert_eq!(validate_role_vertical(role, service_type).is_ok(), ok);
    }

    #[test]
    fn inactive_accounts_have_no_capabilities() {
        let mut admin = account(Role::SuperAdmin, None);
        assert!(has_capability(&admin, Capability::ManageBookings));

        admin.status = AccountStatus::Suspended;
        assert!(!has_capability(&admin, Capability::ManageBookings));
        assert!(matches!(
            require_capability(&admin, Capability::ManageBookings),
            Err(AppError::MissingCapability("bookings:write"))
        ));
    }

    #[test]
    fn write_vertical_must_stay_inside_scope() {
        let designer = account(Role::Designer, Some(Vertical::Interior));
        assert_eq!(resolve_write_vertical(&designer, None, None).unwrap(), Vertical::Interior);
        assert!(matches!(
            resolve_write_vertical(&designer, None, Some(Vertical::Construction)),
            Err(AppError::AccessDenied(_))
        ));
    }
}
