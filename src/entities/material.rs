// Stockroom - Material model

use serde::{Deserialize, Serialize};

use crate::schema::UnitOfMeasure;

/// A stock item tracked in one of the closed units of measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub unit: UnitOfMeasure,
}

impl Material {
    pub fn new(name: impl Into<String>, unit: UnitOfMeasure) -> Self {
        Material {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            unit,
        }
    }
}
