use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CoreError, CoreResult};
use crate::models::{severity_color, EnvironmentalRecord};

/// Layer key that disables category filtering entirely.
pub const ALL_LAYER: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Parses a stored GeoJSON Point payload. Coordinates are `[lng, lat]`
    /// per the GeoJSON convention.
    pub fn from_geojson(raw: &str) -> CoreResult<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;

        let kind = value.get("type").and_then(serde_json::Value::as_str);
        if kind != Some("Point") {
            return Err(CoreError::Parse(format!(
                "expected GeoJSON Point, got {kind:?}"
            )));
        }

        let coordinates = value
            .get("coordinates")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| CoreError::Parse("missing coordinates array".to_string()))?;
        if coordinates.len() < 2 {
            return Err(CoreError::Parse(format!(
                "coordinates need [lng, lat], got {} values",
                coordinates.len()
            )));
        }

        let lng = coordinates[0]
            .as_f64()
            .ok_or_else(|| CoreError::Parse("longitude is not a number".to_string()))?;
        let lat = coordinates[1]
            .as_f64()
            .ok_or_else(|| CoreError::Parse("latitude is not a number".to_string()))?;

        Ok(Self { lat, lng })
    }

    pub fn to_geojson(self) -> String {
        serde_json::json!({
            "type": "Point",
            "coordinates": [self.lng, self.lat],
        })
        .to_string()
    }
}

/// Active layer keys for the map view.
///
/// Starts with `all` active. Toggling a category while `all` is active
/// narrows the view to just that category; toggling the last category off
/// leaves the set empty, which legitimately shows zero records. There is
/// no automatic fallback to `all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSet {
    active: BTreeSet<String>,
}

impl Default for LayerSet {
    fn default() -> Self {
        let mut active = BTreeSet::new();
        active.insert(ALL_LAYER.to_string());
        Self { active }
    }
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            active: BTreeSet::new(),
        }
    }

    pub fn toggle(&mut self, key: &str) {
        if key == ALL_LAYER {
            self.active.clear();
            self.active.insert(ALL_LAYER.to_string());
            return;
        }

        self.active.remove(ALL_LAYER);
        if !self.active.remove(key) {
            self.active.insert(key.to_string());
        }
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active.contains(key)
    }

    pub fn is_visible(&self, category: &str) -> bool {
        self.active.contains(ALL_LAYER) || self.active.contains(category)
    }

    pub fn active_keys(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Render-ready projection of an environmental record onto the map.
#[derive(Debug, Clone, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub category: String,
    /// Raw severity label; unknown labels still render, in the neutral color.
    pub severity: String,
    pub color: &'static str,
    pub region_name: String,
    pub source: String,
    pub confidence_score: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Projects records onto map markers under the active layer filter.
/// Records with malformed location payloads are skipped and logged; a bad
/// row never aborts the batch.
pub fn project_markers(records: &[EnvironmentalRecord], layers: &LayerSet) -> Vec<MapMarker> {
    records
        .iter()
        .filter(|record| layers.is_visible(&record.data_type))
        .filter_map(|record| match GeoPoint::from_geojson(&record.location) {
            Ok(point) => Some(MapMarker {
                id: record.id.clone(),
                lat: point.lat,
                lng: point.lng,
                category: record.data_type.clone(),
                severity: record.severity_level.clone(),
                color: severity_color(&record.severity_level),
                region_name: record.region_name.clone(),
                source: record.source.clone(),
                confidence_score: record.confidence_score,
                recorded_at: record.recorded_at,
            }),
            Err(err) => {
                warn!(record_id = %record.id, %err, "skipping record with malformed location");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{project_markers, GeoPoint, LayerSet, ALL_LAYER};
    use crate::models::{EnvironmentalRecord, SEVERITY_FALLBACK_COLOR};
    use chrono::Utc;

    fn record(id: &str, data_type: &str, location: &str, severity: &str) -> EnvironmentalRecord {
        EnvironmentalRecord {
            id: id.to_string(),
            data_type: data_type.to_string(),
            location: location.to_string(),
            region_name: "Test Region".to_string(),
            metrics: serde_json::Value::Null,
            severity_level: severity.to_string(),
            source: "unit-test".to_string(),
            confidence_score: 90.0,
            recorded_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn geojson_point_round_trips_lng_lat_order() {
        let point = GeoPoint::new(40.7128, -74.006);
        let encoded = point.to_geojson();
        assert!(encoded.contains("[-74.006,40.7128]"));

        let decoded = GeoPoint::from_geojson(&encoded).expect("parse");
        assert_eq!(decoded, point);
    }

    #[test]
    fn rejects_non_point_geometry() {
        let err = GeoPoint::from_geojson(r#"{"type":"Polygon","coordinates":[]}"#)
            .expect_err("should fail");
        assert!(err.to_string().contains("Point"));
    }

    #[test]
    fn rejects_short_coordinates() {
        assert!(GeoPoint::from_geojson(r#"{"type":"Point","coordinates":[1.0]}"#).is_err());
        assert!(GeoPoint::from_geojson("not json").is_err());
    }

    #[test]
    fn toggling_category_clears_all_then_empties() {
        let mut layers = LayerSet::new();
        assert!(layers.is_active(ALL_LAYER));

        layers.toggle("deforestation");
        assert!(!layers.is_active(ALL_LAYER));
        assert!(layers.is_active("deforestation"));
        assert_eq!(layers.len(), 1);

        layers.toggle("deforestation");
        assert!(layers.is_empty());
        assert!(!layers.is_visible("deforestation"));
    }

    #[test]
    fn toggling_all_resets_to_unfiltered() {
        let mut layers = LayerSet::new();
        layers.toggle("air_quality");
        layers.toggle("temperature");
        layers.toggle(ALL_LAYER);

        assert_eq!(layers.len(), 1);
        assert!(layers.is_visible("water_quality"));
    }

    #[test]
    fn all_layer_shows_every_category() {
        let layers = LayerSet::new();
        assert!(layers.is_visible("deforestation"));
        assert!(layers.is_visible("anything_else"));
    }

    #[test]
    fn markers_skip_malformed_locations() {
        let point = GeoPoint::new(-3.4653, -62.2159).to_geojson();
        let records = vec![
            record("ok", "deforestation", &point, "critical"),
            record("bad", "deforestation", "{broken", "high"),
        ];

        let markers = project_markers(&records, &LayerSet::new());
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, "ok");
        assert_eq!(markers[0].color, "#ef4444");
        assert!((markers[0].lat - -3.4653).abs() < 1e-9);
    }

    #[test]
    fn unknown_severity_renders_in_neutral_color() {
        let point = GeoPoint::new(1.0, 2.0).to_geojson();
        let records = vec![record("odd", "air_quality", &point, "extreme")];

        let markers = project_markers(&records, &LayerSet::new());
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].severity, "extreme");
        assert_eq!(markers[0].color, SEVERITY_FALLBACK_COLOR);
    }

    #[test]
    fn markers_respect_layer_filter() {
        let point = GeoPoint::new(10.0, 20.0).to_geojson();
        let records = vec![
            record("a", "air_quality", &point, "low"),
            record("b", "temperature", &point, "medium"),
        ];

        let mut layers = LayerSet::new();
        layers.toggle("air_quality");
        let markers = project_markers(&records, &layers);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].category, "air_quality");

        layers.toggle("air_quality");
        assert!(project_markers(&records, &layers).is_empty());
    }
}
