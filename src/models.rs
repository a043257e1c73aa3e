//models.rs
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Coords = [f64; 2];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} has to be a positive number!")]
    NotPositive(&'static str),
    #[error("{0} has to be a number!")]
    NotANumber(&'static str),
}

/// Discriminant for the two workout variants, used by the form type
/// selector and by per-variant rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkoutType {
    #[default]
    Running,
    Cycling,
}

impl WorkoutType {
    pub fn label(&self) -> &'static str {
        match self {
            WorkoutType::Running => "Running",
            WorkoutType::Cycling => "Cycling",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            WorkoutType::Running => "🏃",
            WorkoutType::Cycling => "🚴",
        }
    }
}

/// Variant-specific fields, tagged so the variant survives persistence
/// round trips instead of collapsing into an untyped record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkoutDetails {
    #[serde(rename_all = "camelCase")]
    Running {
        cadence_steps_per_min: f64,
        pace_min_per_km: f64,
    },
    #[serde(rename_all = "camelCase")]
    Cycling {
        elevation_gain_m: f64,
        speed_km_per_h: f64,
    },
}

/// One recorded exercise session. Immutable once constructed; editing is
/// modeled as delete-then-recreate by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub created_at: DateTime<Local>,
    pub coordinates: Coords,
    pub distance_km: f64,
    pub duration_min: f64,
    pub description: String,
    #[serde(flatten)]
    pub details: WorkoutDetails,
}

impl Workout {
    pub fn running(
        coordinates: Coords,
        distance_km: f64,
        duration_min: f64,
        cadence: f64,
    ) -> Result<Self, ValidationError> {
        positive("Distance", distance_km)?;
        positive("Duration", duration_min)?;
        positive("Cadence", cadence)?;

        let pace = duration_min / distance_km;
        Ok(Self::build(
            coordinates,
            distance_km,
            duration_min,
            WorkoutType::Running,
            WorkoutDetails::Running {
                cadence_steps_per_min: cadence,
                pace_min_per_km: pace,
            },
        ))
    }

    pub fn cycling(
        coordinates: Coords,
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Result<Self, ValidationError> {
        positive("Distance", distance_km)?;
        positive("Duration", duration_min)?;
        // Elevation may be zero or negative (downhill rides), it only has
        // to be an actual number.
        finite("Elevation", elevation_gain_m)?;

        let speed = distance_km / (duration_min / 60.0);
        Ok(Self::build(
            coordinates,
            distance_km,
            duration_min,
            WorkoutType::Cycling,
            WorkoutDetails::Cycling {
                elevation_gain_m,
                speed_km_per_h: speed,
            },
        ))
    }

    fn build(
        coordinates: Coords,
        distance_km: f64,
        duration_min: f64,
        kind: WorkoutType,
        details: WorkoutDetails,
    ) -> Self {
        let created_at = Local::now();
        let description = format!(
            "{} on {} {}",
            kind.label(),
            created_at.format("%B"),
            created_at.day()
        );

        Self {
            id: generate_id(&created_at),
            created_at,
            coordinates,
            distance_km,
            duration_min,
            description,
            details,
        }
    }

    pub fn kind(&self) -> WorkoutType {
        match self.details {
            WorkoutDetails::Running { .. } => WorkoutType::Running,
            WorkoutDetails::Cycling { .. } => WorkoutType::Cycling,
        }
    }

    pub fn emoji(&self) -> &'static str {
        self.kind().emoji()
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        Err(ValidationError::NotANumber(name))
    } else if value <= 0.0 {
        Err(ValidationError::NotPositive(name))
    } else {
        Ok(())
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotANumber(name))
    }
}

// Last ten digits of the creation timestamp, plus a process-wide sequence
// suffix so two workouts created in the same millisecond still get
// distinct ids.
fn generate_id(created_at: &DateTime<Local>) -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let millis = created_at.timestamp_millis() as u64;
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{:010}{:03}", millis % 10_000_000_000, seq % 1_000)
}
