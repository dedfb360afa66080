//! Reference (master) trajectory types

use serde::{Deserialize, Serialize};

use super::{BatchRecord, Milestone};

/// One point of a recorded curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReferencePoint {
    pub tick: u64,
    /// Bean temperature (C)
    pub temp: f64,
}

/// A previously completed roast used as the comparison target for advisories.
///
/// Immutable once built; the session holds it behind an `Arc` for its whole
/// lifetime. Deserialization goes through [`ReferenceTrajectory::new`], so
/// stored curves are sorted and deduplicated on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawTrajectory")]
pub struct ReferenceTrajectory {
    pub id: String,
    pub label: String,
    /// Ordered by tick, at most one point per tick
    points: Vec<ReferencePoint>,
    #[serde(default)]
    pub events: Vec<Milestone>,
}

/// Wire shape of a stored trajectory before normalization.
#[derive(Deserialize)]
struct RawTrajectory {
    id: String,
    label: String,
    points: Vec<ReferencePoint>,
    #[serde(default)]
    events: Vec<Milestone>,
}

impl From<RawTrajectory> for ReferenceTrajectory {
    fn from(raw: RawTrajectory) -> Self {
        Self::new(raw.id, raw.label, raw.points, raw.events)
    }
}

impl ReferenceTrajectory {
    /// Build a trajectory. Points are sorted by tick and duplicate ticks keep
    /// the last value supplied.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        mut points: Vec<ReferencePoint>,
        events: Vec<Milestone>,
    ) -> Self {
        points.sort_by_key(|p| p.tick);
        let mut deduped: Vec<ReferencePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.tick == point.tick => *last = point,
                _ => deduped.push(point),
            }
        }
        Self {
            id: id.into(),
            label: label.into(),
            points: deduped,
            events,
        }
    }

    /// Turn a saved batch into a reference for later roasts. The id is the
    /// batch (session) id.
    pub fn from_record(record: &BatchRecord) -> Self {
        let points = record
            .telemetry
            .iter()
            .map(|s| ReferencePoint {
                tick: s.tick,
                temp: s.bean_temp,
            })
            .collect();
        Self::new(
            record.session_id.to_string(),
            format!("{} ({})", record.label, record.roast_date),
            points,
            record.milestones.clone(),
        )
    }

    pub fn points(&self) -> &[ReferencePoint] {
        &self.points
    }

    /// The point recorded at exactly `tick`, if any.
    pub fn point_at(&self, tick: u64) -> Option<&ReferencePoint> {
        self.points
            .binary_search_by_key(&tick, |p| p.tick)
            .ok()
            .map(|idx| &self.points[idx])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(tick: u64, temp: f64) -> ReferencePoint {
        ReferencePoint { tick, temp }
    }

    #[test]
    fn test_new_sorts_and_dedups() {
        let reference = ReferenceTrajectory::new(
            "r1",
            "Ethiopia master",
            vec![pt(3, 30.0), pt(1, 10.0), pt(3, 31.0), pt(2, 20.0)],
            Vec::new(),
        );
        let ticks: Vec<u64> = reference.points().iter().map(|p| p.tick).collect();
        assert_eq!(ticks, vec![1, 2, 3]);
        assert_eq!(reference.point_at(3).map(|p| p.temp), Some(31.0));
    }

    #[test]
    fn test_point_at_gap_is_none() {
        let reference =
            ReferenceTrajectory::new("r1", "gappy", vec![pt(0, 25.0), pt(6, 40.0)], Vec::new());
        assert!(reference.point_at(3).is_none());
        assert!(reference.point_at(6).is_some());
        assert!(reference.point_at(7).is_none());
    }

    #[test]
    fn test_from_record_uses_batch_curve() {
        use crate::types::TelemetrySample;
        let record = BatchRecord {
            session_id: uuid::Uuid::new_v4(),
            label: "Guji".to_string(),
            source_lot: String::new(),
            roast_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).expect("date"),
            process_type: "natural".to_string(),
            green_weight_kg: 5.0,
            roasted_weight_kg: 4.3,
            total_ticks: 2,
            final_temp: 26.0,
            tenant: String::new(),
            milestones: Vec::new(),
            telemetry: vec![
                TelemetrySample {
                    tick: 0,
                    bean_temp: 25.0,
                },
                TelemetrySample {
                    tick: 1,
                    bean_temp: 25.5,
                },
                TelemetrySample {
                    tick: 2,
                    bean_temp: 26.0,
                },
            ],
        };
        let reference = ReferenceTrajectory::from_record(&record);
        assert_eq!(reference.id, record.session_id.to_string());
        assert_eq!(reference.label, "Guji (2026-03-01)");
        assert_eq!(reference.len(), 3);
        assert_eq!(reference.point_at(1).map(|p| p.temp), Some(25.5));
    }

    #[test]
    fn test_deserialize_normalizes_points() {
        let json = r#"{
            "id": "stored",
            "label": "hand-edited",
            "points": [
                {"tick": 6, "temp": 40.0},
                {"tick": 0, "temp": 25.0},
                {"tick": 3, "temp": 31.0},
                {"tick": 3, "temp": 32.0}
            ]
        }"#;
        let reference: ReferenceTrajectory = serde_json::from_str(json).expect("deserialize");
        let ticks: Vec<u64> = reference.points().iter().map(|p| p.tick).collect();
        assert_eq!(ticks, vec![0, 3, 6]);
        assert_eq!(reference.point_at(3).map(|p| p.temp), Some(32.0));
        assert_eq!(reference.point_at(6).map(|p| p.temp), Some(40.0));
        assert!(reference.events.is_empty());
    }
}
