// src/services/dashboard_service.rs

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    common::error::AppError,
    db::LeadStore,
    models::{
        dashboard::{
            CityCount, DashboardOverview, FunnelReport, FunnelStage, LeadStats, OriginCount, SegmentCount,
            StateCount,
        },
        lead::LeadStatus,
    },
};

const TOP_CITIES: usize = 10;

// Ordem fixa do funil; "perdido" fica de fora
const FUNNEL_STAGES: [LeadStatus; 6] = [
    LeadStatus::New,
    LeadStatus::Contacted,
    LeadStatus::Qualified,
    LeadStatus::Proposal,
    LeadStatus::Negotiation,
    LeadStatus::Won,
];

#[derive(Clone)]
pub struct DashboardService {
    leads: Arc<dyn LeadStore>,
}

impl DashboardService {
    pub fn new(leads: Arc<dyn LeadStore>) -> Self {
        Self { leads }
    }

    pub async fn overview(&self) -> Result<DashboardOverview, AppError> {
        let stats = self.leads.stats().await?;
        Ok(build_overview(&stats))
    }

    pub async fn funnel(&self) -> Result<FunnelReport, AppError> {
        let stats = self.leads.stats().await?;
        Ok(build_funnel(&stats.by_status))
    }
}

pub fn build_overview(stats: &LeadStats) -> DashboardOverview {
    let total_leads = stats.total_leads;

    let average_priority_score = if total_leads == 0 {
        0.0
    } else {
        stats.priority_score_sum as f64 / total_leads as f64
    };

    let won = stats.by_status.get(&LeadStatus::Won).copied().unwrap_or(0);
    let conversion_rate = if total_leads == 0 { 0.0 } else { won as f64 / total_leads as f64 * 100.0 };

    let leads_by_city = ranked(&stats.by_city)
        .into_iter()
        .take(TOP_CITIES)
        .map(|(city, count)| CityCount { city, count })
        .collect();

    let leads_by_state = ranked(&stats.by_state)
        .into_iter()
        .map(|(state, count)| StateCount { state, count })
        .collect();

    let leads_by_origin = ranked(&stats.by_origin)
        .into_iter()
        .map(|(origin, count)| OriginCount { origin, count })
        .collect();

    let leads_by_segment = ranked(&stats.by_segment)
        .into_iter()
        .map(|(segment, count)| SegmentCount { segment, count })
        .collect();

    DashboardOverview {
        total_leads,
        prioritarios: stats.prioritarios,
        total_area_hectares: stats.total_area_hectares,
        average_priority_score,
        conversion_rate,
        leads_by_status: stats.by_status.clone(),
        leads_by_city,
        leads_by_state,
        leads_by_origin,
        leads_by_segment,
    }
}

/// Funil pelo status atual de cada lead. Não é coorte: uma etapa pode ter
/// mais leads que a anterior, e a taxa passa de 100%.
pub fn build_funnel(by_status: &BTreeMap<LeadStatus, usize>) -> FunnelReport {
    let mut funnel: Vec<FunnelStage> = Vec::with_capacity(FUNNEL_STAGES.len());

    for stage in FUNNEL_STAGES {
        let count = by_status.get(&stage).copied().unwrap_or(0);
        let conversion_rate = funnel
            .last()
            .filter(|previous| previous.count > 0)
            .map(|previous| count as f64 / previous.count as f64 * 100.0);
        funnel.push(FunnelStage { stage, count, conversion_rate });
    }

    let total_in_funnel = funnel.iter().map(|s| s.count).sum();
    FunnelReport { funnel, total_in_funnel }
}

// Contagem decrescente, empates pela chave
fn ranked<K: Ord + Clone>(counts: &[(K, usize)]) -> Vec<(K, usize)> {
    let mut ranked = counts.to_vec();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::{
        db::memory::InMemoryStore,
        models::lead::{Lead, LeadOrigin, LeadSegment},
        services::scoring::tests::lead_fixture,
    };

    fn leads_with_status(status: LeadStatus, n: usize) -> Vec<Lead> {
        (0..n).map(|_| Lead { status, ..lead_fixture() }).collect()
    }

    fn overview_of(leads: &[Lead]) -> DashboardOverview {
        build_overview(&LeadStats::from_leads(leads))
    }

    fn funnel_of(leads: &[Lead]) -> FunnelReport {
        build_funnel(&LeadStats::from_leads(leads).by_status)
    }

    fn rate_of(report: &FunnelReport, stage: LeadStatus) -> Option<f64> {
        report.funnel.iter().find(|s| s.stage == stage).and_then(|s| s.conversion_rate)
    }

    #[test]
    fn funnel_is_a_current_status_snapshot() {
        let mut leads = leads_with_status(LeadStatus::New, 10);
        leads.extend(leads_with_status(LeadStatus::Contacted, 8));
        leads.extend(leads_with_status(LeadStatus::Won, 7));
        leads.extend(leads_with_status(LeadStatus::Lost, 3));

        let report = funnel_of(&leads);
        assert_eq!(report.funnel.len(), 6);
        assert_eq!(report.total_in_funnel, 25);
        assert_eq!(rate_of(&report, LeadStatus::New), None);
        assert_eq!(rate_of(&report, LeadStatus::Contacted), Some(80.0));
        assert_eq!(rate_of(&report, LeadStatus::Qualified), Some(0.0));
        assert_eq!(rate_of(&report, LeadStatus::Proposal), None);
        // Antecessor vazio: sem taxa
        assert_eq!(rate_of(&report, LeadStatus::Won), None);
    }

    #[test]
    fn funnel_rate_above_100_is_kept() {
        let mut leads = leads_with_status(LeadStatus::Negotiation, 2);
        leads.extend(leads_with_status(LeadStatus::Won, 7));

        let report = funnel_of(&leads);
        assert_eq!(rate_of(&report, LeadStatus::Won), Some(350.0));
    }

    #[test]
    fn empty_base_has_zeroed_overview() {
        let overview = overview_of(&[]);
        assert_eq!(overview.total_leads, 0);
        assert_eq!(overview.total_area_hectares, None);
        assert_eq!(overview.average_priority_score, 0.0);
        assert_eq!(overview.conversion_rate, 0.0);
        assert!(overview.leads_by_status.is_empty());
    }

    #[test]
    fn overview_counts_and_distributions() {
        let leads = vec![
            Lead {
                status: LeadStatus::Won,
                priority_score: 40,
                total_area_hectares: Some(Decimal::from(120)),
                is_prioritario: true,
                origin: Some(LeadOrigin::Referral),
                segment: Some(LeadSegment::Large),
                ..lead_fixture()
            },
            Lead {
                priority_score: 20,
                total_area_hectares: Some(Decimal::new(305, 1)),
                city: Some("Rio Verde".into()),
                state: "GO".into(),
                origin: Some(LeadOrigin::Referral),
                segment: Some(LeadSegment::Small),
                ..lead_fixture()
            },
            Lead { priority_score: 0, city: None, ..lead_fixture() },
            Lead { priority_score: 0, ..lead_fixture() },
        ];

        let overview = overview_of(&leads);
        assert_eq!(overview.total_leads, 4);
        assert_eq!(overview.prioritarios, 1);
        assert_eq!(overview.total_area_hectares, Some(Decimal::new(1505, 1)));
        assert_eq!(overview.average_priority_score, 15.0);
        assert_eq!(overview.conversion_rate, 25.0);
        assert_eq!(overview.leads_by_status[&LeadStatus::New], 3);
        assert_eq!(overview.leads_by_status[&LeadStatus::Won], 1);
        assert_eq!(
            overview.leads_by_city,
            vec![
                CityCount { city: "Uberlândia".into(), count: 2 },
                CityCount { city: "Rio Verde".into(), count: 1 },
            ]
        );
        assert_eq!(
            overview.leads_by_state,
            vec![StateCount { state: "MG".into(), count: 3 }, StateCount { state: "GO".into(), count: 1 }]
        );
        assert_eq!(overview.leads_by_origin, vec![OriginCount { origin: LeadOrigin::Referral, count: 2 }]);
        assert_eq!(overview.leads_by_segment.len(), 2);
    }

    #[test]
    fn grouped_counts_are_ranked_whatever_the_row_order() {
        let stats = LeadStats {
            total_leads: 6,
            by_city: vec![("Sorriso".into(), 1), ("Rio Verde".into(), 3), ("Jataí".into(), 1), ("Cristalina".into(), 1)],
            by_origin: vec![(LeadOrigin::Website, 2), (LeadOrigin::Referral, 4)],
            ..Default::default()
        };

        let overview = build_overview(&stats);
        let cities: Vec<&str> = overview.leads_by_city.iter().map(|c| c.city.as_str()).collect();
        assert_eq!(cities, ["Rio Verde", "Cristalina", "Jataí", "Sorriso"]);
        assert_eq!(overview.leads_by_origin[0], OriginCount { origin: LeadOrigin::Referral, count: 4 });
    }

    #[test]
    fn stats_skip_empty_cities_and_missing_origins() {
        let leads = vec![
            Lead { city: Some(String::new()), origin: None, ..lead_fixture() },
            Lead { city: None, origin: Some(LeadOrigin::Website), ..lead_fixture() },
            Lead { priority_score: 30, ..lead_fixture() },
        ];
        let stats = LeadStats::from_leads(&leads);
        assert_eq!(stats.total_leads, 3);
        assert_eq!(stats.by_city, vec![("Uberlândia".to_string(), 1)]);
        assert_eq!(stats.by_state, vec![("MG".to_string(), 3)]);
        assert_eq!(stats.by_origin, vec![(LeadOrigin::Website, 1)]);
        assert_eq!(stats.priority_score_sum, i64::from(lead_fixture().priority_score) * 2 + 30);
    }

    #[test]
    fn cities_are_capped_at_ten() {
        let leads: Vec<Lead> = (0..15)
            .map(|i| Lead { city: Some(format!("Cidade {i:02}")), ..lead_fixture() })
            .collect();
        assert_eq!(overview_of(&leads).leads_by_city.len(), TOP_CITIES);
    }

    #[tokio::test]
    async fn service_reads_from_store() {
        let store: Arc<dyn LeadStore> = Arc::new(InMemoryStore::new());
        for lead in leads_with_status(LeadStatus::Contacted, 3) {
            store.insert(&lead).await.unwrap();
        }
        let service = DashboardService::new(store);

        assert_eq!(service.overview().await.unwrap().total_leads, 3);
        let funnel = service.funnel().await.unwrap();
        assert_eq!(funnel.funnel[1].count, 3);
        assert_eq!(funnel.funnel[1].conversion_rate, None);
    }
}
