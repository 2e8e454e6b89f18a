//! The persisted canvas record.

use super::{StorageError, StorageResult};
use crate::camera::Viewport;
use crate::canvas::Canvas;
use crate::document::CanvasDocument;
use crate::shapes::{Connector, EntityId, Group, Shape, epoch_millis};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// `null` and missing values both become `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_now<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.map_or_else(epoch_millis, |ms| ms as i64))
}

/// Everything that survives a reload: the viewport plus all entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCanvas {
    #[serde(default, deserialize_with = "null_as_default")]
    pub viewport: Viewport,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shapes: Vec<Shape>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub connectors: Vec<Connector>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<Group>,
    /// Epoch milliseconds of the write.
    #[serde(default = "epoch_millis", deserialize_with = "null_as_now")]
    pub last_saved: i64,
}

impl Default for PersistedCanvas {
    fn default() -> Self {
        Self::new(&CanvasDocument::new(), Viewport::default())
    }
}

impl PersistedCanvas {
    /// Record of a document and viewport, stamped with the current time.
    pub fn new(document: &CanvasDocument, viewport: Viewport) -> Self {
        Self {
            viewport,
            shapes: document.shapes.clone(),
            connectors: document.connectors.clone(),
            groups: document.groups.clone(),
            last_saved: epoch_millis(),
        }
    }

    pub fn from_canvas(canvas: &Canvas) -> Self {
        Self::new(canvas.document(), canvas.viewport())
    }

    pub fn document(&self) -> CanvasDocument {
        CanvasDocument {
            shapes: self.shapes.clone(),
            connectors: self.connectors.clone(),
            groups: self.groups.clone(),
        }
    }

    pub fn into_parts(self) -> (CanvasDocument, Viewport) {
        let document = CanvasDocument {
            shapes: self.shapes,
            connectors: self.connectors,
            groups: self.groups,
        };
        (document, self.viewport)
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        let Viewport { x, y, zoom } = self.viewport;
        if !(x.is_finite() && y.is_finite()) {
            return Err("viewport origin must be finite".to_string());
        }
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(format!("viewport zoom must be positive, got {zoom}"));
        }

        let mut seen: HashSet<&EntityId> = HashSet::new();
        let ids = self
            .shapes
            .iter()
            .map(|s| &s.id)
            .chain(self.connectors.iter().map(|c| &c.id))
            .chain(self.groups.iter().map(|g| &g.id));
        for id in ids {
            if !seen.insert(id) {
                return Err(format!("duplicate entity id {id}"));
            }
        }

        for shape in &self.shapes {
            let values = [shape.x, shape.y, shape.width, shape.height, shape.rotation];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(format!("shape {} has non-finite geometry", shape.id));
            }
            if shape.width < 0.0 || shape.height < 0.0 {
                return Err(format!("shape {} has negative size", shape.id));
            }
        }
        for connector in &self.connectors {
            let values = [connector.x, connector.y, connector.target_x, connector.target_y];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(format!("connector {} has non-finite endpoints", connector.id));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> StorageResult<String> {
        serde_json::to_string(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> StorageResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Parse a record from storage. Corrupt data is a serialization error.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Parse and validate untrusted JSON, e.g. a user import.
    pub fn parse_import(json: &str) -> StorageResult<Self> {
        let record: Self =
            serde_json::from_str(json).map_err(|e| StorageError::MalformedImport(e.to_string()))?;
        record.validate().map_err(StorageError::MalformedImport)?;
        Ok(record)
    }
}
