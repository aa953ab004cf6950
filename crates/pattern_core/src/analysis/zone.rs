//! Pitch zones used by pass filters.

use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, Pitch};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Zone {
    /// Axis-aligned, bounds inclusive
    Rectangle { x_min: f64, x_max: f64, y_min: f64, y_max: f64 },
    /// Simple polygon, vertices in order
    Polygon { points: Vec<[f64; 2]> },
}

impl Zone {
    /// Both penalty areas of `pitch`, left goal first.
    pub fn penalty_areas(pitch: &Pitch) -> Vec<Zone> {
        pitch
            .penalty_areas()
            .iter()
            .map(|&(x_min, x_max, y_min, y_max)| Zone::Rectangle { x_min, x_max, y_min, y_max })
            .collect()
    }

    /// Describes what is wrong with the zone, if anything.
    pub fn check(&self) -> Result<(), String> {
        match self {
            Zone::Rectangle { x_min, x_max, y_min, y_max } => {
                if !(x_min <= x_max && y_min <= y_max) {
                    return Err(format!(
                        "rectangle bounds out of order: x {x_min}..{x_max}, y {y_min}..{y_max}"
                    ));
                }
                Ok(())
            }
            Zone::Polygon { points } => {
                if points.len() < 3 {
                    return Err(format!("polygon needs at least 3 points, got {}", points.len()));
                }
                if points.iter().flatten().any(|v| !v.is_finite()) {
                    return Err("polygon has a non-finite vertex".to_string());
                }
                Ok(())
            }
        }
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        match self {
            Zone::Rectangle { x_min, x_max, y_min, y_max } => {
                (*x_min..=*x_max).contains(&point.x) && (*y_min..=*y_max).contains(&point.y)
            }
            Zone::Polygon { points } => polygon_contains(points, point),
        }
    }
}

/// Even-odd ray casting.
fn polygon_contains(points: &[[f64; 2]], point: &Coordinate) -> bool {
    let mut inside = false;
    let mut j = points.len().wrapping_sub(1);
    for i in 0..points.len() {
        let [xi, yi] = points[i];
        let [xj, yj] = points[j];
        if (yi > point.y) != (yj > point.y) {
            let x_cross = xi + (point.y - yi) * (xj - xi) / (yj - yi);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_bounds_inclusive() {
        let zone = Zone::Rectangle { x_min: 0.0, x_max: 10.0, y_min: 0.0, y_max: 5.0 };
        assert!(zone.contains(&Coordinate::new(10.0, 5.0)));
        assert!(zone.contains(&Coordinate::new(3.0, 2.0)));
        assert!(!zone.contains(&Coordinate::new(10.1, 2.0)));
    }

    #[test]
    fn test_polygon_contains() {
        let triangle = Zone::Polygon { points: vec![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]] };
        assert!(triangle.contains(&Coordinate::new(2.0, 2.0)));
        assert!(!triangle.contains(&Coordinate::new(8.0, 8.0)));
        assert!(!triangle.contains(&Coordinate::new(-1.0, 1.0)));
    }

    #[test]
    fn test_check() {
        assert!(Zone::Polygon { points: vec![[0.0, 0.0], [1.0, 1.0]] }.check().is_err());
        assert!(Zone::Rectangle { x_min: 5.0, x_max: 1.0, y_min: 0.0, y_max: 1.0 }.check().is_err());
        assert!(Zone::penalty_areas(&Pitch::default()).iter().all(|z| z.check().is_ok()));
    }

    #[test]
    fn test_penalty_areas_on_default_pitch() {
        let zones = Zone::penalty_areas(&Pitch::default());
        assert_eq!(zones.len(), 2);
        assert!(zones[0].contains(&Coordinate::new(8.0, 34.0)));
        assert!(zones[1].contains(&Coordinate::new(97.0, 34.0)));
        assert!(!zones[1].contains(&Coordinate::new(52.5, 34.0)));
        assert!(!zones[1].contains(&Coordinate::new(97.0, 5.0)));
    }

    #[test]
    fn test_zone_serde() {
        let zone: Zone =
            serde_json::from_str(r#"{"shape":"polygon","points":[[0,0],[1,0],[0,1]]}"#).unwrap();
        assert!(matches!(zone, Zone::Polygon { ref points } if points.len() == 3));
        assert!(serde_json::from_str::<Zone>(r#"{"shape":"circle","r":3}"#).is_err());
    }
}
