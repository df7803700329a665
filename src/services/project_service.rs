// src/services/project_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, ProjectRepository},
    models::{
        account::{Account, Vertical},
        project::{
            CreateLeadPayload, CreateProjectPayload, Lead, Project, UpdateLeadPayload, UpdateProjectPayload,
        },
    },
    services::access_control::{filter_for, require_capability, resolve_write_vertical, Capability},
};

// Projetos (design/obra) e leads comerciais: CRUD com filtro de vertical
#[derive(Clone)]
pub struct ProjectService {
    project_repo: ProjectRepository,
    crm_repo: CrmRepository,
}

impl ProjectService {
    pub fn new(project_repo: ProjectRepository, crm_repo: CrmRepository) -> Self {
        Self { project_repo, crm_repo }
    }

    // =========================================================================
    //  PROJETOS
    // =========================================================================

    pub async fn create_project(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        payload: &CreateProjectPayload,
    ) -> Result<Project, AppError> {
        require_capability(actor, Capability::ManageProjects)?;
        check_dates(payload.start_date, payload.end_date)?;
        let vertical = resolve_write_vertical(actor, requested, payload.service_type)?;

        self.project_repo.create(payload, vertical, actor.id).await
    }

    pub async fn list_projects(&self, actor: &Account, requested: Option<Vertical>) -> Result<Vec<Project>, AppError> {
        require_capability(actor, Capability::ManageProjects)?;
        let filter = filter_for(actor, requested)?;
        self.project_repo.list(&filter).await
    }

    pub async fn get_project(&self, actor: &Account, requested: Option<Vertical>, id: Uuid) -> Result<Project, AppError> {
        require_capability(actor, Capability::ManageProjects)?;
        let filter = filter_for(actor, requested)?;

        let project = self
            .project_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Projeto".to_string()))?;

        if !filter.allows(project.service_type) {
            return Err(AppError::AccessDenied(project.service_type.to_string()));
        }
        Ok(project)
    }

    pub async fn update_project(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        id: Uuid,
        payload: UpdateProjectPayload,
    ) -> Result<Project, AppError> {
        let mut project = self.get_project(actor, requested, id).await?;
        payload.apply_to(&mut project);
        check_dates(project.start_date, project.end_date)?;

        self.project_repo.update(&project).await
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    pub async fn create_lead(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        payload: &CreateLeadPayload,
    ) -> Result<Lead, AppError> {
        require_capability(actor, Capability::ManageLeads)?;
        let vertical = resolve_write_vertical(actor, requested, payload.service_type)?;

        self.crm_repo.create_lead(payload, vertical, actor.id).await
    }

    pub async fn list_leads(&self, actor: &Account, requested: Option<Vertical>) -> Result<Vec<Lead>, AppError> {
        require_capability(actor, Capability::ManageLeads)?;
        let filter = filter_for(actor, requested)?;
        self.crm_repo.list_leads(&filter).await
    }

    pub async fn get_lead(&self, actor: &Account, requested: Option<Vertical>, id: Uuid) -> Result<Lead, AppError> {
        require_capability(actor, Capability::ManageLeads)?;
        let filter = filter_for(actor, requested)?;

        let lead = self
            .crm_repo
            .find_lead(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lead".to_string()))?;

        if !filter.allows(lead.service_type) {
            return Err(AppError::AccessDenied(lead.service_type.to_string()));
        }
        Ok(lead)
    }

    pub async fn update_lead(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        id: Uuid,
        payload: UpdateLeadPayload,
    ) -> Result<Lead, AppError> {
        let mut lead = self.get_lead(actor, requested, id).await?;
        payload.apply_to(&mut lead);
        self.crm_repo.update_lead(&lead).await
    }
}

fn check_dates(start: Option<chrono::NaiveDate>, end: Option<chrono::NaiveDate>) -> Result<(), AppError> {
    match (start, end) {
        (Some(s), Some(e)) if e < s => Err(AppError::InvalidInput("endDate antes de startDate".to_string())),
        _ => Ok(()),
    }
}
