//! Orders: the unit of work handed from the queue to a cook.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{KitchenError, Result};

/// One order waiting to be cooked. Immutable once built.
///
/// Deserializing goes through [`WorkItem::new`], so a blank description is
/// rejected there too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    id: u64,
    description: String,
}

impl WorkItem {
    /// Builds an order, rejecting blank descriptions.
    pub fn new(id: u64, description: impl Into<String>) -> Result<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(KitchenError::EmptyDescription(id));
        }
        Ok(Self { id, description })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Unvalidated `{ id, description }` entry as it appears on the wire.
#[derive(Debug, Deserialize)]
struct RawWorkItem {
    id: u64,
    description: String,
}

impl<'de> Deserialize<'de> for WorkItem {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = RawWorkItem::deserialize(d)?;
        WorkItem::new(raw.id, raw.description).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pedido #{}: {}", self.id, self.description)
    }
}

/// On-disk shape of an orders file.
#[derive(Debug, Deserialize)]
struct OrderBatch {
    orders: Vec<RawWorkItem>,
}

/// Loads a seed batch from a JSON or TOML file, chosen by extension.
///
/// Both formats hold an `orders` list of `{ id, description }` entries.
/// Every entry goes through [`WorkItem::new`] so blank descriptions are
/// rejected here rather than showing up in the log.
pub fn load_orders(path: &Path) -> Result<Vec<WorkItem>> {
    let contents = std::fs::read_to_string(path)?;
    let batch: OrderBatch = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&contents)?,
        _ => serde_json::from_str(&contents)?,
    };
    batch
        .orders
        .into_iter()
        .map(|raw| WorkItem::new(raw.id, raw.description))
        .collect()
}
