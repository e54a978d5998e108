// src/db/memory.rs

//! Store em memória para os testes dos serviços.

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Pagination},
    db::{LeadStore, PropertyStore},
    models::{
        dashboard::LeadStats,
        lead::{Lead, LeadComment, LeadFilter},
        property::{Property, PropertyFilter},
    },
};

#[derive(Default)]
pub struct InMemoryStore {
    leads: RwLock<Vec<Lead>>,
    properties: RwLock<Vec<Property>>,
    comments: RwLock<Vec<LeadComment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_of<T: Clone>(items: &[T], page: &Pagination) -> Vec<T> {
    items
        .iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect()
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

// Mesma semântica do WHERE do LeadRepository (ILIKE = contains sem caixa)
fn lead_matches(filter: &LeadFilter, lead: &Lead) -> bool {
    filter.status.is_none_or(|s| lead.status == s)
        && filter.city.as_deref().is_none_or(|c| contains_ci(lead.city.as_deref(), c))
        && filter.state.as_deref().is_none_or(|s| lead.state == s)
        && filter.origin.is_none_or(|o| lead.origin == Some(o))
        && filter.segment.is_none_or(|s| lead.segment == Some(s))
        && filter.is_prioritario.is_none_or(|p| lead.is_prioritario == p)
        && filter.assigned_to.is_none_or(|a| lead.assigned_to == Some(a))
        && filter.search.as_deref().is_none_or(|q| {
            contains_ci(Some(&lead.name), q)
                || contains_ci(Some(&lead.email), q)
                || contains_ci(lead.cpf.as_deref(), q)
        })
}

fn property_matches(filter: &PropertyFilter, property: &Property) -> bool {
    filter.lead_id.is_none_or(|id| property.lead_id == id)
        && filter.crop.is_none_or(|c| property.crop == c)
        && filter.city.as_deref().is_none_or(|c| property.city.as_deref() == Some(c))
        && filter.state.as_deref().is_none_or(|s| property.state.as_deref() == Some(s))
}

#[async_trait]
impl LeadStore for InMemoryStore {
    async fn insert(&self, lead: &Lead) -> Result<Lead, AppError> {
        let mut leads = self.leads.write();
        if leads.iter().any(|l| l.email == lead.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        leads.push(lead.clone());
        Ok(lead.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        Ok(self.leads.read().iter().find(|l| l.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>, AppError> {
        Ok(self.leads.read().iter().find(|l| l.email == email).cloned())
    }

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Lead>, AppError> {
        Ok(self.leads.read().iter().find(|l| l.cpf.as_deref() == Some(cpf)).cloned())
    }

    async fn update(&self, lead: &Lead) -> Result<Lead, AppError> {
        let mut leads = self.leads.write();
        let slot = leads.iter_mut().find(|l| l.id == lead.id).ok_or(AppError::LeadNotFound)?;
        *slot = lead.clone();
        Ok(lead.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut leads = self.leads.write();
        let before = leads.len();
        leads.retain(|l| l.id != id);
        if leads.len() == before {
            return Err(AppError::LeadNotFound);
        }
        self.properties.write().retain(|p| p.lead_id != id);
        self.comments.write().retain(|c| c.lead_id != id);
        Ok(())
    }

    async fn stats(&self) -> Result<LeadStats, AppError> {
        Ok(LeadStats::from_leads(&self.leads.read()))
    }

    async fn list_filtered(&self, filter: &LeadFilter, page: &Pagination) -> Result<(Vec<Lead>, u64), AppError> {
        let mut matching: Vec<Lead> = self.leads.read().iter().filter(|l| lead_matches(filter, l)).cloned().collect();
        matching.sort_by(|a, b| {
            b.priority_score
                .cmp(&a.priority_score)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok((page_of(&matching, page), matching.len() as u64))
    }

    async fn list_priority(&self, page: &Pagination) -> Result<(Vec<Lead>, u64), AppError> {
        let mut matching: Vec<Lead> = self.leads.read().iter().filter(|l| l.is_prioritario).cloned().collect();
        matching.sort_by(|a, b| {
            b.priority_score
                .cmp(&a.priority_score)
                .then_with(|| b.total_area_hectares.cmp(&a.total_area_hectares))
        });
        Ok((page_of(&matching, page), matching.len() as u64))
    }

    async fn insert_comment(&self, comment: &LeadComment) -> Result<LeadComment, AppError> {
        self.comments.write().push(comment.clone());
        Ok(comment.clone())
    }

    async fn list_comments(&self, lead_id: Uuid, page: &Pagination) -> Result<(Vec<LeadComment>, u64), AppError> {
        let mut matching: Vec<LeadComment> =
            self.comments.read().iter().filter(|c| c.lead_id == lead_id).cloned().collect();
        // Inseridos em ordem cronológica; mais recentes primeiro
        matching.reverse();
        Ok((page_of(&matching, page), matching.len() as u64))
    }
}

#[async_trait]
impl PropertyStore for InMemoryStore {
    async fn insert(&self, property: &Property) -> Result<Property, AppError> {
        if !self.leads.read().iter().any(|l| l.id == property.lead_id) {
            return Err(AppError::LeadNotFound);
        }
        self.properties.write().push(property.clone());
        Ok(property.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        Ok(self.properties.read().iter().find(|p| p.id == id).cloned())
    }

    async fn update(&self, property: &Property) -> Result<Property, AppError> {
        let mut properties = self.properties.write();
        let slot = properties
            .iter_mut()
            .find(|p| p.id == property.id)
            .ok_or(AppError::PropertyNotFound)?;
        *slot = property.clone();
        Ok(property.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut properties = self.properties.write();
        let before = properties.len();
        properties.retain(|p| p.id != id);
        if properties.len() == before {
            return Err(AppError::PropertyNotFound);
        }
        Ok(())
    }

    async fn list_by_lead(&self, lead_id: Uuid) -> Result<Vec<Property>, AppError> {
        Ok(self.properties.read().iter().filter(|p| p.lead_id == lead_id).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<Property>, AppError> {
        Ok(self.properties.read().clone())
    }

    async fn list_filtered(&self, filter: &PropertyFilter, page: &Pagination) -> Result<(Vec<Property>, u64), AppError> {
        let mut matching: Vec<Property> =
            self.properties.read().iter().filter(|p| property_matches(filter, p)).cloned().collect();
        matching.reverse();
        Ok((page_of(&matching, page), matching.len() as u64))
    }
}
