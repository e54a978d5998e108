// src/models/crop.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Mapeia o CREATE TYPE crop_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "crop_type")]
pub enum CropType {
    #[serde(rename = "soja")]
    #[sqlx(rename = "soja")]
    Soy,
    #[serde(rename = "milho")]
    #[sqlx(rename = "milho")]
    Corn,
    #[serde(rename = "algodao")]
    #[sqlx(rename = "algodao")]
    Cotton,
}

/// Janelas de manejo de uma cultura, em meses do calendário (1 = janeiro).
#[derive(Debug, Clone, Copy)]
pub struct CropSeasons {
    pub planting: &'static [u32],
    pub top_dressing: &'static [u32],
    pub harvest: &'static [u32],
}

/// Etapa do manejo em que uma cultura se encontra num dado mês.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonWindow {
    Planting,
    TopDressing,
    Harvest,
}

const SOY_SEASONS: CropSeasons = CropSeasons {
    planting: &[10, 11, 12],
    top_dressing: &[1, 2],
    harvest: &[2, 3, 4],
};

const CORN_SEASONS: CropSeasons = CropSeasons {
    planting: &[9, 10, 11],
    top_dressing: &[11, 12, 1],
    harvest: &[2, 3, 4],
};

const COTTON_SEASONS: CropSeasons = CropSeasons {
    planting: &[11, 12, 1],
    top_dressing: &[2, 3],
    harvest: &[6, 7, 8],
};

impl CropType {
    /// Código usado no banco, na API e nas mensagens.
    pub fn as_str(self) -> &'static str {
        match self {
            CropType::Soy => "soja",
            CropType::Corn => "milho",
            CropType::Cotton => "algodao",
        }
    }

    /// Peso agronômico: converte hectares em "score agronômico"
    /// conforme a intensidade de uso de insumos da cultura.
    pub fn weight(self) -> Decimal {
        match self {
            CropType::Soy => Decimal::ONE,
            CropType::Corn => Decimal::new(7, 1),
            CropType::Cotton => Decimal::new(13, 1),
        }
    }

    pub fn seasons(self) -> CropSeasons {
        match self {
            CropType::Soy => SOY_SEASONS,
            CropType::Corn => CORN_SEASONS,
            CropType::Cotton => COTTON_SEASONS,
        }
    }

    /// Primeira janela que contém o mês, na ordem plantio > cobertura > colheita.
    pub fn season_window(self, month: u32) -> Option<SeasonWindow> {
        let seasons = self.seasons();
        if seasons.planting.contains(&month) {
            Some(SeasonWindow::Planting)
        } else if seasons.top_dressing.contains(&month) {
            Some(SeasonWindow::TopDressing)
        } else if seasons.harvest.contains(&month) {
            Some(SeasonWindow::Harvest)
        } else {
            None
        }
    }
}

impl std::fmt::Display for CropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
