//! Class index to crop name decoding.

use serde::Deserialize;
use std::collections::HashSet;

/// Fitted label encoder, applied in reverse.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelDecoder {
    classes: Vec<String>,
}

impl LabelDecoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("no classes".to_string());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.classes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(format!("duplicate class '{}'", dup));
        }
        Ok(())
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.classes.iter().any(|c| c == label)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
