// src/services/lead_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Paginated, Pagination},
    },
    db::LeadStore,
    models::lead::{
        CreateCommentPayload, CreateLeadPayload, Lead, LeadComment, LeadFilter, LeadStatus, LeadSummary,
        UpdateLeadPayload,
    },
    services::scoring,
};

const DEFAULT_STATE: &str = "MG";

#[derive(Clone)]
pub struct LeadService {
    leads: Arc<dyn LeadStore>,
}

impl LeadService {
    pub fn new(leads: Arc<dyn LeadStore>) -> Self {
        Self { leads }
    }

    // =========================================================================
    //  1. CADASTRO
    // =========================================================================

    pub async fn create(&self, payload: CreateLeadPayload) -> Result<Lead, AppError> {
        self.ensure_email_free(&payload.email, None).await?;
        if let Some(cpf) = payload.cpf.as_deref() {
            self.ensure_cpf_free(cpf, None).await?;
        }

        let now = Utc::now();
        let mut lead = Lead {
            id: Uuid::new_v4(),
            name: payload.name,
            email: payload.email,
            cpf: payload.cpf,
            phone: payload.phone,
            city: payload.city,
            state: payload.state.unwrap_or_else(|| DEFAULT_STATE.to_string()),
            status: payload.status.unwrap_or(LeadStatus::New),
            origin: payload.origin,
            assigned_to: payload.assigned_to,
            segment: None,
            priority_score: 0,
            is_prioritario: false,
            total_area_hectares: None,
            main_crops: Vec::new(),
            notes: payload.notes,
            created_at: now,
            updated_at: now,
            last_contact_at: None,
        };
        scoring::refresh_derived_fields(&mut lead);

        let lead = self.leads.insert(&lead).await?;
        tracing::info!("Lead criado: {} (Score: {})", lead.id, lead.priority_score);
        Ok(lead)
    }

    // =========================================================================
    //  2. CONSULTAS
    // =========================================================================

    pub async fn find_one(&self, id: Uuid) -> Result<Lead, AppError> {
        self.leads.find_by_id(id).await?.ok_or_else(|| {
            tracing::warn!("Lead {} não encontrado", id);
            AppError::LeadNotFound
        })
    }

    pub async fn find_summary(&self, id: Uuid) -> Result<LeadSummary, AppError> {
        let lead = self.find_one(id).await?;
        Ok(LeadSummary::from_lead(lead, Utc::now()))
    }

    pub async fn list(&self, filter: &LeadFilter, pagination: &Pagination) -> Result<Paginated<Lead>, AppError> {
        let (leads, total) = self.leads.list_filtered(filter, pagination).await?;
        Ok(Paginated::new(leads, total, pagination))
    }

    pub async fn list_priority(&self, pagination: &Pagination) -> Result<Paginated<Lead>, AppError> {
        let (leads, total) = self.leads.list_priority(pagination).await?;
        Ok(Paginated::new(leads, total, pagination))
    }

    // =========================================================================
    //  3. ATUALIZAÇÃO
    // =========================================================================

    pub async fn update(&self, id: Uuid, payload: UpdateLeadPayload) -> Result<Lead, AppError> {
        let mut lead = self.find_one(id).await?;

        if let Some(email) = payload.email.as_deref().filter(|e| *e != lead.email) {
            self.ensure_email_free(email, Some(id)).await?;
        }
        if let Some(cpf) = payload.cpf.as_deref().filter(|c| lead.cpf.as_deref() != Some(*c)) {
            self.ensure_cpf_free(cpf, Some(id)).await?;
        }

        if let Some(name) = payload.name {
            lead.name = name;
        }
        if let Some(email) = payload.email {
            lead.email = email;
        }
        if let Some(state) = payload.state {
            lead.state = state;
        }
        if let Some(status) = payload.status {
            lead.status = status;
        }
        lead.cpf = payload.cpf.or(lead.cpf);
        lead.phone = payload.phone.or(lead.phone);
        lead.city = payload.city.or(lead.city);
        lead.origin = payload.origin.or(lead.origin);
        lead.assigned_to = payload.assigned_to.or(lead.assigned_to);
        lead.notes = payload.notes.or(lead.notes);

        scoring::refresh_derived_fields(&mut lead);
        lead.updated_at = Utc::now();

        let lead = self.leads.update(&lead).await?;
        tracing::info!("Lead {} atualizado (Score: {})", lead.id, lead.priority_score);
        Ok(lead)
    }

    pub async fn update_status(&self, id: Uuid, status: LeadStatus) -> Result<Lead, AppError> {
        let mut lead = self.find_one(id).await?;
        let old_status = lead.status;

        let now = Utc::now();
        lead.status = status;
        if status.counts_as_contact() {
            lead.last_contact_at = Some(now);
        }
        scoring::refresh_derived_fields(&mut lead);
        lead.updated_at = now;

        let lead = self.leads.update(&lead).await?;
        tracing::info!(
            "Status do lead {} alterado: {} -> {} (Score: {})",
            id,
            old_status.as_str(),
            status.as_str(),
            lead.priority_score
        );
        Ok(lead)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.leads.delete(id).await.inspect_err(|e| {
            if matches!(e, AppError::LeadNotFound) {
                tracing::warn!("Lead {} não encontrado para remoção", id);
            }
        })?;
        tracing::info!("Lead {} removido", id);
        Ok(())
    }

    // =========================================================================
    //  4. COMENTÁRIOS
    // =========================================================================

    pub async fn add_comment(&self, lead_id: Uuid, payload: CreateCommentPayload) -> Result<LeadComment, AppError> {
        let lead = self.find_one(lead_id).await?;

        let comment = LeadComment {
            id: Uuid::new_v4(),
            lead_id,
            message: payload.comment,
            author: payload.author,
            lead_status_at_time: lead.status,
            created_at: Utc::now(),
        };
        self.leads.insert_comment(&comment).await
    }

    pub async fn list_comments(
        &self,
        lead_id: Uuid,
        pagination: &Pagination,
    ) -> Result<Paginated<LeadComment>, AppError> {
        self.find_one(lead_id).await?;
        let (comments, total) = self.leads.list_comments(lead_id, pagination).await?;
        Ok(Paginated::new(comments, total, pagination))
    }

    // --- Unicidade ---

    async fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> Result<(), AppError> {
        match self.leads.find_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => {
                tracing::warn!("Tentativa de cadastro com e-mail duplicado: {}", email);
                Err(AppError::EmailAlreadyExists)
            }
            _ => Ok(()),
        }
    }

    async fn ensure_cpf_free(&self, cpf: &str, owner: Option<Uuid>) -> Result<(), AppError> {
        match self.leads.find_by_cpf(cpf).await? {
            Some(existing) if Some(existing.id) != owner => {
                tracing::warn!("Tentativa de cadastro com CPF duplicado");
                Err(AppError::CpfAlreadyExists)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory::InMemoryStore, models::lead::LeadOrigin};

    fn service() -> LeadService {
        LeadService::new(Arc::new(InMemoryStore::new()))
    }

    fn payload(email: &str) -> CreateLeadPayload {
        CreateLeadPayload {
            name: "João Silva".into(),
            email: email.into(),
            cpf: None,
            phone: None,
            city: Some("Uberlândia".into()),
            state: None,
            status: None,
            origin: Some(LeadOrigin::Referral),
            assigned_to: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_applies_defaults_and_score() {
        let lead = service().create(payload("joao@fazenda.com.br")).await.unwrap();
        assert_eq!(lead.state, "MG");
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.segment, None);
        assert_eq!(lead.priority_score, 20 + 5);
    }

    #[tokio::test]
    async fn duplicate_email_and_cpf_conflict() {
        let service = service();
        service
            .create(CreateLeadPayload { cpf: Some("12345678901".into()), ..payload("a@fazenda.com.br") })
            .await
            .unwrap();

        let err = service.create(payload("a@fazenda.com.br")).await.unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));

        let err = service
            .create(CreateLeadPayload { cpf: Some("12345678901".into()), ..payload("b@fazenda.com.br") })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CpfAlreadyExists));
    }

    #[tokio::test]
    async fn update_keeps_own_email_and_rescoring() {
        let service = service();
        let lead = service.create(payload("c@fazenda.com.br")).await.unwrap();

        let updated = service
            .update(
                lead.id,
                UpdateLeadPayload {
                    email: Some("c@fazenda.com.br".into()),
                    status: Some(LeadStatus::Proposal),
                    assigned_to: Some(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.priority_score, 20 + 15);
        assert_eq!(updated.city.as_deref(), Some("Uberlândia"));
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_lead() {
        let service = service();
        service.create(payload("d@fazenda.com.br")).await.unwrap();
        let lead = service.create(payload("e@fazenda.com.br")).await.unwrap();

        let err = service
            .update(lead.id, UpdateLeadPayload { email: Some("d@fazenda.com.br".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn status_change_stamps_contact_only_for_active_stages() {
        let service = service();
        let lead = service.create(payload("f@fazenda.com.br")).await.unwrap();

        let lost = service.update_status(lead.id, LeadStatus::Lost).await.unwrap();
        assert!(lost.last_contact_at.is_none());

        let negotiating = service.update_status(lead.id, LeadStatus::Negotiation).await.unwrap();
        assert!(negotiating.last_contact_at.is_some());
        assert_eq!(negotiating.priority_score, 20 + 20 + 5);
    }

    #[tokio::test]
    async fn comments_freeze_status_and_list_newest_first() {
        let service = service();
        let lead = service.create(payload("g@fazenda.com.br")).await.unwrap();

        let first = CreateCommentPayload { comment: "Primeiro contato".into(), author: None };
        service.add_comment(lead.id, first).await.unwrap();
        service.update_status(lead.id, LeadStatus::Qualified).await.unwrap();
        let second = CreateCommentPayload { comment: "Pediu proposta".into(), author: Some("Ana".into()) };
        service.add_comment(lead.id, second).await.unwrap();

        let page = service.list_comments(lead.id, &Pagination::default()).await.unwrap();
        assert_eq!(page.meta.total, 2);
        assert_eq!(page.data[0].message, "Pediu proposta");
        assert_eq!(page.data[0].lead_status_at_time, LeadStatus::Qualified);
        assert_eq!(page.data[1].lead_status_at_time, LeadStatus::New);
    }

    #[tokio::test]
    async fn missing_lead_is_not_found() {
        let service = service();
        let id = Uuid::new_v4();
        assert!(matches!(service.find_one(id).await, Err(AppError::LeadNotFound)));
        assert!(matches!(service.remove(id).await, Err(AppError::LeadNotFound)));
        let comment = CreateCommentPayload { comment: "oi".into(), author: None };
        assert!(matches!(service.add_comment(id, comment).await, Err(AppError::LeadNotFound)));
    }

    #[tokio::test]
    async fn list_filters_by_search_and_pages() {
        let service = service();
        for i in 0..12 {
            service.create(payload(&format!("produtor{i}@fazenda.com.br"))).await.unwrap();
        }
        service
            .create(CreateLeadPayload { name: "Maria Souza".into(), ..payload("maria@agro.com") })
            .await
            .unwrap();

        let filter = LeadFilter { search: Some("SOUZA".into()), ..Default::default() };
        let found = service.list(&filter, &Pagination::default()).await.unwrap();
        assert_eq!(found.meta.total, 1);

        let page = Pagination { page: Some(2), limit: Some(10) };
        let second = service.list(&LeadFilter::default(), &page).await.unwrap();
        assert_eq!(second.data.len(), 3);
        assert!(!second.meta.has_next_page);
        assert!(second.meta.has_previous_page);
    }
}
