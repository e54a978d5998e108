// src/services/insights.rs

//! Relatório agronômico de um lead a partir das suas propriedades.
//!
//! Tudo aqui é puro: recebe a lista de propriedades e o mês corrente,
//! devolve o relatório. O serviço de propriedades faz a leitura do store.

use std::collections::HashSet;

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    models::{
        crop::{CropType, SeasonWindow},
        property::{CropGroup, GeographicHotspot, PropertiesInsight, Property},
    },
    services::aggregation::PRIORITY_AREA_THRESHOLD,
};

const OUTSIDE_CRITICAL_PERIODS: &str = "Fora dos períodos críticos de manejo";

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Área ponderada pelo peso da cultura, com 2 casas.
pub fn agronomic_score(area_hectares: Decimal, crop: CropType) -> Decimal {
    round2(area_hectares * crop.weight())
}

/// Monta o relatório completo. `None` quando o lead não tem propriedades.
pub fn build_insights(lead_id: Uuid, properties: &[Property], month: u32) -> Option<PropertiesInsight> {
    if properties.is_empty() {
        return None;
    }

    let total_area: Decimal = properties.iter().map(|p| p.area_hectares).sum();
    let total_agronomic_score: Decimal = properties
        .iter()
        .map(|p| agronomic_score(p.area_hectares, p.crop))
        .sum();

    let crop_mix = crop_mix(properties, total_area);
    let main_crop = crop_mix[0].crop;

    Some(PropertiesInsight {
        lead_id,
        total_properties: properties.len(),
        total_area: round2(total_area),
        total_agronomic_score: round2(total_agronomic_score),
        is_priority: total_area > PRIORITY_AREA_THRESHOLD,
        data_quality_alerts: data_quality_alerts(properties),
        action_suggestions: action_suggestions(total_area, &crop_mix),
        crop_season_insight: crop_season_insight(&distinct_crops(properties), month),
        expansion_potential: expansion_potential(properties),
        cities: distinct_cities(properties),
        crop_mix,
        main_crop,
    })
}

/// Uma entrada por cultura, da maior área para a menor (empates mantêm a ordem de aparição).
fn crop_mix(properties: &[Property], total_area: Decimal) -> Vec<CropGroup> {
    let mut groups: Vec<(CropType, Decimal, usize)> = Vec::new();
    for property in properties {
        match groups.iter_mut().find(|(crop, _, _)| *crop == property.crop) {
            Some((_, area, count)) => {
                *area += property.area_hectares;
                *count += 1;
            }
            None => groups.push((property.crop, property.area_hectares, 1)),
        }
    }

    let mut mix: Vec<CropGroup> = groups
        .into_iter()
        .map(|(crop, area, count)| CropGroup {
            crop,
            total_area: round2(area),
            total_properties: count,
            percentage: if total_area.is_zero() {
                Decimal::ZERO
            } else {
                round1(area / total_area * Decimal::ONE_HUNDRED)
            },
        })
        .collect();

    // sort_by é estável
    mix.sort_by(|a, b| b.total_area.cmp(&a.total_area));
    mix
}

fn data_quality_alerts(properties: &[Property]) -> Vec<String> {
    let mut alerts = Vec::new();

    for property in properties {
        if property.area_hectares < Decimal::ONE {
            alerts.push(format!(
                "Propriedade {}: área muito pequena (< 1 ha), revisar cadastro",
                property.id
            ));
        }
        if !property.has_location() {
            alerts.push(format!(
                "Propriedade {}: localização incompleta, adicionar cidade/estado",
                property.id
            ));
        }
    }

    // Assinaturas (cultura, área) na ordem em que aparecem
    let mut signatures: Vec<(CropType, Decimal, usize)> = Vec::new();
    for property in properties {
        match signatures
            .iter_mut()
            .find(|(crop, area, _)| *crop == property.crop && *area == property.area_hectares)
        {
            Some((_, _, count)) => *count += 1,
            None => signatures.push((property.crop, property.area_hectares, 1)),
        }
    }

    for (crop, area, count) in signatures {
        if count > 1 {
            alerts.push(format!("Possível duplicata: {count} propriedades com {crop}-{area:.2}"));
        }
    }

    alerts
}

fn action_suggestions(total_area: Decimal, crop_mix: &[CropGroup]) -> Vec<String> {
    let mut suggestions = Vec::new();

    // Só a faixa mais alta dispara
    if total_area > Decimal::from(200) {
        suggestions.push("Oferecer plano de fertilização premium para grandes produtores (200+ ha)".to_string());
        suggestions.push("Indicar para gestão de contas especiais".to_string());
    } else if total_area > Decimal::ONE_HUNDRED {
        suggestions.push("Oferecer plano intermediário com desconto progressivo".to_string());
    } else if total_area > Decimal::from(50) {
        suggestions.push("Propor pacote de fertilização básico".to_string());
    }

    for group in crop_mix {
        match group.crop {
            CropType::Cotton if group.total_area > Decimal::ZERO => {
                suggestions.push("Algodão: alta demanda de insumos, campanha prioritária de NPK".to_string());
                suggestions.push("Oferecer linha de crédito para cultura de alto investimento".to_string());
            }
            CropType::Soy if group.total_area > Decimal::from(150) => {
                suggestions.push("Soja (150+ ha): propor inoculantes e fertilizantes foliares".to_string());
            }
            CropType::Corn if group.total_area > Decimal::ONE_HUNDRED => {
                suggestions.push("Milho (100+ ha): oferecer combo de ureia + MAP para adubação".to_string());
            }
            _ => {}
        }
    }

    if crop_mix.len() == 1 {
        suggestions.push("Produtor monocultivo: oportunidade de diversificação".to_string());
    }

    suggestions
}

fn distinct_crops(properties: &[Property]) -> Vec<CropType> {
    let mut crops = Vec::new();
    for property in properties {
        if !crops.contains(&property.crop) {
            crops.push(property.crop);
        }
    }
    crops
}

/// O que cada cultura pede neste mês; cada cultura reporta no máximo uma janela.
pub fn crop_season_insight(crops: &[CropType], month: u32) -> String {
    let insights: Vec<String> = crops
        .iter()
        .filter_map(|&crop| {
            let label = match crop.season_window(month)? {
                SeasonWindow::Planting => "período de plantio",
                SeasonWindow::TopDressing => "momento ideal para adubação de cobertura",
                SeasonWindow::Harvest => "período de colheita",
            };
            Some(format!("{crop}: {label}"))
        })
        .collect();

    if insights.is_empty() {
        OUTSIDE_CRITICAL_PERIODS.to_string()
    } else {
        insights.join(" | ")
    }
}

// Duas ou mais propriedades, e (uma única cidade conhecida ou duas ou mais culturas)
fn expansion_potential(properties: &[Property]) -> bool {
    if properties.len() < 2 {
        return false;
    }

    let cities: HashSet<String> = properties
        .iter()
        .filter_map(|p| p.city.as_deref())
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase)
        .collect();
    if cities.len() == 1 {
        return true;
    }

    let crops: HashSet<CropType> = properties.iter().map(|p| p.crop).collect();
    crops.len() >= 2
}

fn distinct_cities(properties: &[Property]) -> Vec<String> {
    let mut cities: Vec<String> = Vec::new();
    for city in properties.iter().filter_map(|p| p.city.as_deref()) {
        if !city.is_empty() && !cities.iter().any(|c| c == city) {
            cities.push(city.to_string());
        }
    }
    cities
}

/// Concentração de propriedades por (cidade, UF), da maior contagem para a menor.
pub fn geographic_hotspots(properties: &[Property]) -> Vec<GeographicHotspot> {
    let mut hotspots: Vec<GeographicHotspot> = Vec::new();

    for property in properties {
        let Some(city) = property.city.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        let state = property.state.as_deref().unwrap_or_default();

        match hotspots.iter_mut().find(|h| h.city == city && h.state == state) {
            Some(hotspot) => {
                hotspot.count += 1;
                hotspot.total_area += property.area_hectares;
            }
            None => hotspots.push(GeographicHotspot {
                city: city.to_string(),
                state: state.to_string(),
                count: 1,
                total_area: property.area_hectares,
            }),
        }
    }

    for hotspot in &mut hotspots {
        hotspot.total_area = round2(hotspot.total_area);
    }
    hotspots.sort_by(|a, b| b.count.cmp(&a.count));
    hotspots
}
