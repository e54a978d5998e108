// src/services/scoring.rs

use rust_decimal::Decimal;

use crate::models::lead::{Lead, LeadOrigin, LeadSegment, LeadStatus};

/// Score comercial do lead. Cada critério contribui de forma independente;
/// campos opcionais ausentes simplesmente não pontuam.
pub fn compute_priority_score(lead: &Lead) -> i32 {
    let mut score = 0;

    // Faixas de área (exclusivas, não cumulativas)
    if let Some(area) = lead.total_area_hectares {
        if area > Decimal::ONE_HUNDRED {
            score += 50;
        } else if area > Decimal::new(50, 0) {
            score += 30;
        } else if area > Decimal::ZERO {
            score += 10;
        }
    }

    score += match lead.origin {
        Some(LeadOrigin::Referral) => 20,
        Some(LeadOrigin::TradeFair) => 15,
        _ => 0,
    };

    // Apenas o status atual pontua
    score += match lead.status {
        LeadStatus::Qualified => 10,
        LeadStatus::Proposal => 15,
        LeadStatus::Negotiation => 20,
        _ => 0,
    };

    if lead.assigned_to.is_none() {
        score += 5;
    }

    score
}

/// Porte pela área total: sem área (ou zero) não há segmento.
pub fn compute_segment(total_area_hectares: Option<Decimal>) -> Option<LeadSegment> {
    let area = total_area_hectares.filter(|a| !a.is_zero())?;

    if area < Decimal::new(50, 0) {
        Some(LeadSegment::Small)
    } else if area <= Decimal::ONE_HUNDRED {
        Some(LeadSegment::Medium)
    } else {
        Some(LeadSegment::Large)
    }
}

/// Reaplica segmento e score a partir dos atributos atuais do lead.
pub fn refresh_derived_fields(lead: &mut Lead) {
    lead.segment = compute_segment(lead.total_area_hectares);
    lead.priority_score = compute_priority_score(lead);
}
