// src/models/dashboard.rs

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::lead::{Lead, LeadOrigin, LeadSegment, LeadStatus};

/// Contagens agrupadas da base de leads, sem ordenação.
///
/// O Postgres produz isto com GROUP BY; `from_leads` faz o mesmo em memória.
/// Cidades vazias e origens/segmentos nulos ficam de fora.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadStats {
    pub total_leads: usize,
    pub prioritarios: usize,
    pub total_area_hectares: Option<Decimal>,
    pub priority_score_sum: i64,
    pub by_status: BTreeMap<LeadStatus, usize>,
    pub by_city: Vec<(String, usize)>,
    pub by_state: Vec<(String, usize)>,
    pub by_origin: Vec<(LeadOrigin, usize)>,
    pub by_segment: Vec<(LeadSegment, usize)>,
}

impl LeadStats {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let mut by_status = BTreeMap::new();
        let mut by_city = BTreeMap::new();
        let mut by_state = BTreeMap::new();
        let mut by_origin = BTreeMap::new();
        let mut by_segment = BTreeMap::new();

        for lead in leads {
            *by_status.entry(lead.status).or_insert(0) += 1;
            if let Some(city) = lead.city.as_deref().filter(|c| !c.is_empty()) {
                *by_city.entry(city.to_string()).or_insert(0) += 1;
            }
            *by_state.entry(lead.state.clone()).or_insert(0) += 1;
            if let Some(origin) = lead.origin {
                *by_origin.entry(origin).or_insert(0) += 1;
            }
            if let Some(segment) = lead.segment {
                *by_segment.entry(segment).or_insert(0) += 1;
            }
        }

        Self {
            total_leads: leads.len(),
            prioritarios: leads.iter().filter(|l| l.is_prioritario).count(),
            total_area_hectares: leads.iter().filter_map(|l| l.total_area_hectares).reduce(|acc, area| acc + area),
            priority_score_sum: leads.iter().map(|l| i64::from(l.priority_score)).sum(),
            by_status,
            by_city: by_city.into_iter().collect(),
            by_state: by_state.into_iter().collect(),
            by_origin: by_origin.into_iter().collect(),
            by_segment: by_segment.into_iter().collect(),
        }
    }
}

// 1. Visão geral da base de leads (cards + distribuições)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_leads: usize,
    pub prioritarios: usize,
    pub total_area_hectares: Option<Decimal>,
    pub average_priority_score: f64,
    pub conversion_rate: f64,

    pub leads_by_status: BTreeMap<LeadStatus, usize>,
    pub leads_by_city: Vec<CityCount>,
    pub leads_by_state: Vec<StateCount>,
    pub leads_by_origin: Vec<OriginCount>,
    pub leads_by_segment: Vec<SegmentCount>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: usize,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct StateCount {
    pub state: String,
    pub count: usize,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct OriginCount {
    pub origin: LeadOrigin,
    pub count: usize,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct SegmentCount {
    pub segment: LeadSegment,
    pub count: usize,
}

// 2. Funil de vendas (snapshot do status atual de cada lead)
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStage {
    pub stage: LeadStatus,
    pub count: usize,
    pub conversion_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelReport {
    pub funnel: Vec<FunnelStage>,
    pub total_in_funnel: usize,
}
