// src/models/geometry.rs

//! Árvore de geometrias no formato GeoJSON, independente do formato de origem.
//!
//! O parser de KML produz uma [`FeatureCollection`]; a busca pelo primeiro
//! polígono e o cálculo de área ficam aqui, para que "arquivo inválido" e
//! "arquivo sem polígono" possam ser testados separadamente.

use serde::{Deserialize, Serialize};

/// Raio equatorial WGS84, o mesmo usado pelo turf/area.
const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// `[longitude, latitude]` ou `[longitude, latitude, altitude]`.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: Option<String>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl Geometry {
    /// Primeiro Polygon/MultiPolygon em profundidade, descendo em coleções aninhadas.
    pub fn first_polygon(&self) -> Option<&Geometry> {
        match self {
            Geometry::Polygon { .. } | Geometry::MultiPolygon { .. } => Some(self),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().find_map(Geometry::first_polygon)
            }
            Geometry::Point { .. } | Geometry::LineString { .. } => None,
        }
    }

    /// Área geodésica em m² (aproximação esférica do turf). Zero para pontos e linhas.
    pub fn area_square_meters(&self) -> f64 {
        match self {
            Geometry::Polygon { coordinates } => polygon_area(coordinates),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().map(|polygon| polygon_area(polygon)).sum()
            }
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().map(Geometry::area_square_meters).sum()
            }
            Geometry::Point { .. } | Geometry::LineString { .. } => 0.0,
        }
    }
}

impl FeatureCollection {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn first_polygon(&self) -> Option<&Geometry> {
        self.features.iter().find_map(|f| f.geometry.first_polygon())
    }
}

// Anel externo menos os buracos
fn polygon_area(rings: &[Vec<Position>]) -> f64 {
    let Some((outer, holes)) = rings.split_first() else {
        return 0.0;
    };
    let holes: f64 = holes.iter().map(|ring| ring_area(ring).abs()).sum();
    ring_area(outer).abs() - holes
}

fn ring_area(coords: &[Position]) -> f64 {
    let len = coords.len();
    if len <= 2 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in 0..len {
        let lower = &coords[i];
        let middle = &coords[(i + 1) % len];
        let upper = &coords[(i + 2) % len];
        total += (upper[0].to_radians() - lower[0].to_radians()) * middle[1].to_radians().sin();
    }

    total * EARTH_RADIUS_METERS * EARTH_RADIUS_METERS / 2.0
}
