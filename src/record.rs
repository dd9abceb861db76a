//! Records: the unit of data moved between stages.
//!
//! A record is an ordered collection of [`Feature`] values plus metadata
//! (position in the source, label). Records are never mutated after a stage
//! produces them; stages build new collections instead.

use crate::feature::Feature;
use anyhow::{Context, Result, anyhow, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A labeled or unlabeled observation flowing through the pipeline.
///
/// Stages are generic over this trait. Structured formats (JSON, JSON Lines)
/// go through serde; delimited formats (TSV, CSV) go through
/// [`to_row`](Record::to_row) and [`from_row`](Record::from_row).
pub trait Record: Clone + Debug + PartialEq + Serialize + DeserializeOwned {
    type Feature: Feature;

    fn features(&self) -> &[Self::Feature];

    fn label(&self) -> Option<&str>;

    /// Position of the record in its source (e.g. line number), if known.
    fn id(&self) -> Option<u64>;

    /// Flatten the record into text cells for delimited output.
    fn to_row(&self) -> Vec<String>;

    /// Rebuild a record from the cells produced by [`to_row`](Record::to_row).
    fn from_row(row: &[String]) -> Result<Self>;
}

/// General purpose record: optional id and label followed by features.
///
/// Row layout is `id, label, f1, f2, ...`; an empty `id` or `label` cell
/// stands for `None`. An empty label therefore does not survive a delimited
/// round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(bound(serialize = "F: Feature", deserialize = "F: Feature"))]
pub struct LabeledRecord<F> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(with = "crate::feature::values")]
    pub features: Vec<F>,
}

impl<F: Feature> LabeledRecord<F> {
    pub fn new(features: Vec<F>) -> Self {
        Self {
            id: None,
            label: None,
            features,
        }
    }

    pub fn labeled<S: Into<String>>(label: S, features: Vec<F>) -> Self {
        Self {
            id: None,
            label: Some(label.into()),
            features,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

impl<F: Feature> Record for LabeledRecord<F> {
    type Feature = F;

    fn features(&self) -> &[F] {
        &self.features
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(self.features.len() + 2);
        row.push(self.id.map(|id| id.to_string()).unwrap_or_default());
        row.push(self.label.clone().unwrap_or_default());
        row.extend(self.features.iter().map(Feature::to_text));
        row
    }

    fn from_row(row: &[String]) -> Result<Self> {
        if row.len() < 2 {
            bail!("expected at least 2 cells (id, label), found {}", row.len());
        }
        let id = match row[0].trim() {
            "" => None,
            s => Some(s.parse::<u64>().with_context(|| format!("parse record id {s:?}"))?),
        };
        let label = (!row[1].is_empty()).then(|| row[1].clone());
        let features = row[2..]
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                F::from_text(cell).ok_or_else(|| anyhow!("parse feature #{} from {cell:?}", i + 1))
            })
            .collect::<Result<Vec<F>>>()?;
        Ok(Self {
            id,
            label,
            features,
        })
    }
}
