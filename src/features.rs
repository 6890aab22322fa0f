//! Input validation and feature vectorization.
//!
//! The field order below is the order the scaler and every classifier were
//! fitted with. Changing it silently corrupts every prediction.

use crate::error::ValidationError;
use crate::scaler::Scaler;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

pub const FEATURE_COUNT: usize = 7;

/// One of the seven agronomic inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl Feature {
    /// Declaration order; also the vector order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
        Feature::Temperature,
        Feature::Humidity,
        Feature::Ph,
        Feature::Rainfall,
    ];

    /// Key used in request bodies.
    pub fn key(self) -> &'static str {
        match self {
            Feature::Nitrogen => "N",
            Feature::Phosphorus => "P",
            Feature::Potassium => "K",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Ph => "ph",
            Feature::Rainfall => "rainfall",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A validated input record. Values are stored in vector order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRecord {
    values: [f64; FEATURE_COUNT],
}

impl FeatureRecord {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// Validate a raw field map.
    ///
    /// Presence of every field is checked before any value is inspected, so
    /// the reported `MissingField` is always the first declared missing one.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ValidationError> {
        if let Some(field) = Feature::ALL
            .into_iter()
            .find(|f| !map.contains_key(f.key()))
        {
            return Err(ValidationError::MissingField { field });
        }

        let mut values = [0.0; FEATURE_COUNT];
        for field in Feature::ALL {
            values[field.index()] = map
                .get(field.key())
                .and_then(coerce_f64)
                .ok_or(ValidationError::InvalidType { field })?;
        }
        Ok(Self { values })
    }

    /// Validate any JSON value; only objects are accepted.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Err(ValidationError::NotAnObject),
        }
    }

    pub fn get(&self, field: Feature) -> f64 {
        self.values[field.index()]
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// JSON object form, keyed by the request field names.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = Feature::ALL
            .into_iter()
            .map(|f| (f.key().to_string(), Value::from(self.get(f))))
            .collect();
        Value::Object(map)
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Output of the scaler for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaledVector([f64; FEATURE_COUNT]);

impl ScaledVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Inclusive agronomic bounds per feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRanges {
    bounds: [(f64, f64); FEATURE_COUNT],
}

impl Default for FeatureRanges {
    fn default() -> Self {
        Self {
            bounds: [
                (0.0, 300.0),
                (0.0, 150.0),
                (0.0, 250.0),
                (-10.0, 50.0),
                (0.0, 100.0),
                (3.0, 10.0),
                (0.0, 500.0),
            ],
        }
    }
}

impl FeatureRanges {
    pub fn bounds(&self, field: Feature) -> (f64, f64) {
        self.bounds[field.index()]
    }

    pub fn check(&self, record: &FeatureRecord) -> Result<(), ValidationError> {
        for field in Feature::ALL {
            let (min, max) = self.bounds(field);
            let value = record.get(field);
            if value < min || value > max {
                return Err(ValidationError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Turns raw input into the scaled vector the classifiers expect.
pub struct FeatureVectorizer<'a> {
    scaler: &'a Scaler,
    ranges: Option<&'a FeatureRanges>,
}

impl<'a> FeatureVectorizer<'a> {
    pub fn new(scaler: &'a Scaler) -> Self {
        Self {
            scaler,
            ranges: None,
        }
    }

    /// Also reject values outside `ranges`.
    pub fn with_ranges(mut self, ranges: Option<&'a FeatureRanges>) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn vectorize(&self, raw: &Value) -> Result<ScaledVector, ValidationError> {
        let record = FeatureRecord::from_json(raw)?;
        self.vectorize_record(&record)
    }

    pub fn vectorize_record(&self, record: &FeatureRecord) -> Result<ScaledVector, ValidationError> {
        if let Some(ranges) = self.ranges {
            ranges.check(record)?;
        }
        Ok(self.scaler.transform(record.as_array()))
    }
}
