// src/services/kml_processor.rs

//! Leitura de arquivos KML (Google Earth) e cálculo da área do talhão.
//!
//! O parser converte o XML numa [`FeatureCollection`] GeoJSON; a escolha do
//! polígono e a área ficam em `models::geometry`.

use quick_xml::{events::Event, Reader};
use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

use crate::models::geometry::{Feature, FeatureCollection, Geometry, Position};

#[derive(Debug, Error)]
pub enum KmlError {
    #[error("Arquivo KML vazio")]
    Empty,

    #[error("Arquivo não parece ser um KML válido. Certifique-se de que é um arquivo .kml do Google Earth.")]
    NotKml,

    #[error("Erro ao processar arquivo KML: {0}")]
    Malformed(String),

    #[error("Arquivo KML não contém geometrias válidas")]
    NoFeatures,

    #[error("Nenhum polígono encontrado no arquivo KML. Certifique-se de que o arquivo contém um Polygon ou MultiPolygon.")]
    NoPolygon,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KmlProcessResult {
    pub geometry: Geometry,
    pub area_hectares: Decimal,
    pub geojson_string: String,
}

/// Checagem barata antes do parse: conteúdo não vazio e com cara de KML/XML.
pub fn validate_kml_content(content: &str) -> Result<(), KmlError> {
    if content.trim().is_empty() {
        return Err(KmlError::Empty);
    }
    if !content.contains("<kml") && !content.contains("<?xml") {
        return Err(KmlError::NotKml);
    }
    Ok(())
}

/// Valida, extrai o primeiro polígono e calcula a área em hectares (2 casas).
pub fn process_kml_file(content: &str) -> Result<KmlProcessResult, KmlError> {
    validate_kml_content(content)?;

    let collection = parse_kml(content)?;
    if collection.is_empty() {
        return Err(KmlError::NoFeatures);
    }
    let names: Vec<&str> = collection.features.iter().filter_map(|f| f.name.as_deref()).collect();
    tracing::debug!("KML com {} feature(s): {:?}", collection.features.len(), names);

    let geometry = collection.first_polygon().cloned().ok_or(KmlError::NoPolygon)?;

    let square_meters = geometry.area_square_meters();
    let area_hectares = Decimal::from_f64(square_meters / 10_000.0)
        .ok_or_else(|| KmlError::Malformed("área inválida".into()))?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let geojson_string = serde_json::to_string(&geometry).map_err(|e| KmlError::Malformed(e.to_string()))?;

    tracing::info!("KML processado: {} hectares ({:.2} m²)", area_hectares, square_meters);

    Ok(KmlProcessResult { geometry, area_hectares, geojson_string })
}

/// Converte o KML em features GeoJSON. Só Placemarks com geometria viram feature.
pub fn parse_kml(content: &str) -> Result<FeatureCollection, KmlError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut parser = KmlParser::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => parser.open(e.local_name().as_ref()),
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                parser.open(name.as_ref());
                parser.close(name.as_ref())?;
            }
            Ok(Event::End(e)) => parser.close(e.local_name().as_ref())?,
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| KmlError::Malformed(e.to_string()))?;
                parser.text(&text);
            }
            Ok(Event::CData(e)) => parser.text(&String::from_utf8_lossy(&e)),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(KmlError::Malformed(format!(
                    "posição {}: {}",
                    reader.error_position(),
                    e
                )))
            }
        }
    }

    Ok(FeatureCollection { features: parser.features })
}

// Geometria em construção
enum Frame {
    Multi(Vec<Geometry>),
    Polygon { outer: Option<Vec<Position>>, inner: Vec<Vec<Position>> },
    LineString(Vec<Position>),
    Point(Option<Position>),
}

impl Frame {
    fn finish(self) -> Option<Geometry> {
        match self {
            Frame::Polygon { outer, inner } => {
                let mut rings = vec![outer?];
                rings.extend(inner);
                Some(Geometry::Polygon { coordinates: rings })
            }
            Frame::LineString(coordinates) if !coordinates.is_empty() => {
                Some(Geometry::LineString { coordinates })
            }
            Frame::LineString(_) => None,
            Frame::Point(coordinates) => coordinates.map(|coordinates| Geometry::Point { coordinates }),
            Frame::Multi(mut geometries) => match geometries.len() {
                0 => None,
                1 => geometries.pop(),
                _ => Some(Geometry::GeometryCollection { geometries }),
            },
        }
    }
}

#[derive(Clone, Copy)]
enum RingRole {
    Outer,
    Inner,
}

#[derive(Clone, Copy, PartialEq)]
enum Capture {
    Name,
    Coordinates,
}

#[derive(Default)]
struct KmlParser {
    features: Vec<Feature>,
    in_placemark: bool,
    placemark_name: Option<String>,
    placemark_geometry: Option<Geometry>,
    stack: Vec<Frame>,
    ring_role: Option<RingRole>,
    capture: Option<Capture>,
    buffer: String,
}

impl KmlParser {
    fn open(&mut self, tag: &[u8]) {
        match tag {
            b"Placemark" => {
                self.in_placemark = true;
                self.placemark_name = None;
                self.placemark_geometry = None;
            }
            b"name" if self.in_placemark && self.stack.is_empty() => self.start_capture(Capture::Name),
            b"MultiGeometry" => self.stack.push(Frame::Multi(Vec::new())),
            b"Polygon" => self.stack.push(Frame::Polygon { outer: None, inner: Vec::new() }),
            b"LineString" => self.stack.push(Frame::LineString(Vec::new())),
            b"Point" => self.stack.push(Frame::Point(None)),
            b"outerBoundaryIs" => self.ring_role = Some(RingRole::Outer),
            b"innerBoundaryIs" => self.ring_role = Some(RingRole::Inner),
            b"coordinates" => self.start_capture(Capture::Coordinates),
            _ => {}
        }
    }

    fn close(&mut self, tag: &[u8]) -> Result<(), KmlError> {
        match tag {
            b"Placemark" => {
                if let Some(geometry) = self.placemark_geometry.take() {
                    self.features.push(Feature { name: self.placemark_name.take(), geometry });
                }
                self.in_placemark = false;
            }
            b"name" if self.capture == Some(Capture::Name) => {
                let name = self.take_capture();
                self.placemark_name = (!name.is_empty()).then_some(name);
            }
            b"coordinates" if self.capture == Some(Capture::Coordinates) => {
                let coordinates = parse_coordinates(&self.take_capture())?;
                self.assign_coordinates(coordinates);
            }
            b"outerBoundaryIs" | b"innerBoundaryIs" => self.ring_role = None,
            b"MultiGeometry" | b"Polygon" | b"LineString" | b"Point" => {
                if let Some(geometry) = self.stack.pop().and_then(Frame::finish) {
                    self.attach(geometry);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.capture.is_some() {
            self.buffer.push_str(text);
        }
    }

    fn start_capture(&mut self, capture: Capture) {
        self.capture = Some(capture);
        self.buffer.clear();
    }

    fn take_capture(&mut self) -> String {
        self.capture = None;
        std::mem::take(&mut self.buffer).trim().to_string()
    }

    fn assign_coordinates(&mut self, mut coordinates: Vec<Position>) {
        match self.stack.last_mut() {
            Some(Frame::Polygon { outer, inner }) => {
                close_ring(&mut coordinates);
                match self.ring_role {
                    Some(RingRole::Outer) => *outer = Some(coordinates),
                    Some(RingRole::Inner) => inner.push(coordinates),
                    None => {}
                }
            }
            Some(Frame::LineString(line)) => *line = coordinates,
            Some(Frame::Point(point)) => *point = coordinates.into_iter().next(),
            Some(Frame::Multi(_)) | None => {}
        }
    }

    fn attach(&mut self, geometry: Geometry) {
        match self.stack.last_mut() {
            Some(Frame::Multi(children)) => children.push(geometry),
            _ if self.in_placemark && self.placemark_geometry.is_none() => {
                self.placemark_geometry = Some(geometry);
            }
            _ => {}
        }
    }
}

// Tuplas "lon,lat[,alt]" separadas por espaço
fn parse_coordinates(text: &str) -> Result<Vec<Position>, KmlError> {
    text.split_whitespace()
        .map(|tuple| {
            let position = tuple
                .split(',')
                .map(|n| n.trim().parse::<f64>())
                .collect::<Result<Position, _>>()
                .map_err(|_| KmlError::Malformed(format!("coordenada inválida '{tuple}'")))?;
            if position.len() < 2 {
                return Err(KmlError::Malformed(format!("coordenada incompleta '{tuple}'")));
            }
            Ok(position)
        })
        .collect()
}

fn close_ring(ring: &mut Vec<Position>) {
    let Some(last) = ring.last() else {
        return;
    };
    if ring[0][..2] != last[..2] {
        let first = ring[0].clone();
        ring.push(first);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "-48.30,-18.90,0 -48.29,-18.90,0 -48.29,-18.89,0 -48.30,-18.89,0 -48.30,-18.90,0";

    fn kml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document>{body}</Document></kml>"#
        )
    }

    fn polygon(coords: &str) -> String {
        format!("<Polygon><outerBoundaryIs><LinearRing><coordinates>{coords}</coordinates></LinearRing></outerBoundaryIs></Polygon>")
    }

    #[test]
    fn rejects_empty_and_foreign_content() {
        assert!(matches!(validate_kml_content("   \n"), Err(KmlError::Empty)));
        assert!(matches!(validate_kml_content("lat,lon\n1,2"), Err(KmlError::NotKml)));
        assert!(validate_kml_content("<kml></kml>").is_ok());
    }

    #[test]
    fn computes_area_of_single_polygon() {
        let content = kml(&format!("<Placemark><name>Talhão 1</name>{}</Placemark>", polygon(SQUARE)));
        let result = process_kml_file(&content).unwrap();

        let Geometry::Polygon { coordinates } = &result.geometry else {
            panic!("expected polygon, got {:?}", result.geometry);
        };
        assert_eq!(coordinates.len(), 1);
        assert_eq!(coordinates[0].len(), 5);
        // ~1053 m x ~1112 m em latitude -18.9
        assert!(result.area_hectares > Decimal::from(115) && result.area_hectares < Decimal::from(120));
        assert_eq!(result.area_hectares.scale(), 2);
        assert!(result.geojson_string.starts_with(r#"{"type":"Polygon","coordinates":"#));
    }

    #[test]
    fn parser_keeps_placemark_names_and_closes_rings() {
        let open_ring = "-48.30,-18.90 -48.29,-18.90 -48.29,-18.89";
        let content = kml(&format!("<Placemark><name>Sede</name>{}</Placemark>", polygon(open_ring)));
        let collection = parse_kml(&content).unwrap();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(collection.features[0].name.as_deref(), Some("Sede"));
        let Geometry::Polygon { coordinates } = &collection.features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(coordinates[0].first(), coordinates[0].last());
    }

    #[test]
    fn polygon_found_inside_multigeometry() {
        let content = kml(&format!(
            "<Placemark><MultiGeometry><Point><coordinates>-48.3,-18.9</coordinates></Point>{}</MultiGeometry></Placemark>",
            polygon(SQUARE)
        ));
        let collection = parse_kml(&content).unwrap();
        assert!(matches!(collection.features[0].geometry, Geometry::GeometryCollection { .. }));

        let result = process_kml_file(&content).unwrap();
        assert!(matches!(result.geometry, Geometry::Polygon { .. }));
    }

    #[test]
    fn inner_boundary_becomes_hole() {
        let hole = "-48.298,-18.898 -48.292,-18.898 -48.292,-18.892 -48.298,-18.892 -48.298,-18.898";
        let body = format!(
            "<Placemark><Polygon><outerBoundaryIs><LinearRing><coordinates>{SQUARE}</coordinates></LinearRing></outerBoundaryIs>\
             <innerBoundaryIs><LinearRing><coordinates>{hole}</coordinates></LinearRing></innerBoundaryIs></Polygon></Placemark>"
        );
        let with_hole = process_kml_file(&kml(&body)).unwrap();
        let full = process_kml_file(&kml(&format!("<Placemark>{}</Placemark>", polygon(SQUARE)))).unwrap();
        assert!(with_hole.area_hectares < full.area_hectares);
    }

    #[test]
    fn no_placemarks_means_no_features() {
        let result = process_kml_file(&kml("<name>vazio</name>"));
        assert!(matches!(result, Err(KmlError::NoFeatures)));
    }

    #[test]
    fn features_without_polygon_are_rejected() {
        let content = kml("<Placemark><LineString><coordinates>-48.3,-18.9 -48.2,-18.8</coordinates></LineString></Placemark>");
        assert_eq!(parse_kml(&content).unwrap().features.len(), 1);
        assert!(matches!(process_kml_file(&content), Err(KmlError::NoPolygon)));
    }

    #[test]
    fn bad_numbers_are_malformed() {
        let content = kml(&format!("<Placemark>{}</Placemark>", polygon("abc,def 1,2")));
        let err = process_kml_file(&content).unwrap_err();
        assert!(matches!(err, KmlError::Malformed(_)));
        assert!(err.to_string().starts_with("Erro ao processar arquivo KML"));
    }

    #[test]
    fn broken_xml_is_malformed() {
        let content = "<?xml version=\"1.0\"?><kml><Placemark></Document></kml>";
        assert!(matches!(parse_kml(content), Err(KmlError::Malformed(_))));
    }
}
