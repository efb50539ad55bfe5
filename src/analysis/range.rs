//! Value ranges of a QOI over a phase selection
//!
//! The range decides how a renderer colors entities: a continuous scale
//! between two bounds, a categorical palette over a small set of values,
//! or nothing at all when the scope holds no value.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::qoi::{resolve_object_qoi, resolve_rank_qoi, ObjectQoi, RankQoi};
use super::PhaseSelection;
use crate::error::{TraceError, TraceResult};
use crate::model::{Info, QoiValue};

/// Largest number of distinct values shown with a categorical palette
pub const MAX_DISCRETE_VALUES: usize = 20;

/// How numeric values are summarized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMode {
    /// Numbers become a `[min, max]` interval
    #[default]
    Continuous,
    /// Numbers become a set of categories while there are at most
    /// [`MAX_DISCRETE_VALUES`] of them
    Categorical,
}

/// One category of a discrete range
///
/// Doubles with an integral value are folded into `Int`, so `5` and `5.0`
/// are the same category.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DiscreteValue {
    Int(i64),
    Double(f64),
    Str(String),
}

impl DiscreteValue {
    fn from_number(x: f64) -> Self {
        if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
            DiscreteValue::Int(x as i64)
        } else {
            DiscreteValue::Double(x)
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            DiscreteValue::Int(i) => Some(*i as f64),
            DiscreteValue::Double(d) => Some(*d),
            DiscreteValue::Str(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            DiscreteValue::Int(_) | DiscreteValue::Double(_) => 0,
            DiscreteValue::Str(_) => 1,
        }
    }
}

impl Ord for DiscreteValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (DiscreteValue::Str(a), DiscreteValue::Str(b)) => a.cmp(b),
            (DiscreteValue::Int(a), DiscreteValue::Int(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for DiscreteValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DiscreteValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DiscreteValue {}

/// Range of a QOI over a scope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QoiRange {
    /// No value in scope (or only NaN)
    Empty,
    Continuous { min: f64, max: f64 },
    Discrete { values: BTreeSet<DiscreteValue> },
}

/// How a renderer should color a QOI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorMapping {
    None,
    Linear { min: f64, max: f64 },
    Categorical { values: Vec<DiscreteValue> },
}

impl QoiRange {
    pub fn is_empty(&self) -> bool {
        matches!(self, QoiRange::Empty)
    }

    /// Numeric bounds of the range
    ///
    /// A discrete range of strings spans palette indices `0..=len-1`.
    ///
    /// # Errors
    /// `EmptyRange` (naming `qoi`) when there are no values.
    pub fn bounds(&self, qoi: &str) -> TraceResult<(f64, f64)> {
        match self {
            QoiRange::Empty => Err(TraceError::EmptyRange {
                qoi: qoi.to_string(),
            }),
            QoiRange::Continuous { min, max } => Ok((*min, *max)),
            QoiRange::Discrete { values } => {
                let numbers: Vec<f64> = values.iter().filter_map(DiscreteValue::as_f64).collect();
                if numbers.is_empty() {
                    Ok((0.0, values.len().saturating_sub(1) as f64))
                } else {
                    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    Ok((min, max))
                }
            }
        }
    }

    pub fn color_mapping(&self) -> ColorMapping {
        match self {
            QoiRange::Empty => ColorMapping::None,
            QoiRange::Continuous { min, max } => ColorMapping::Linear {
                min: *min,
                max: *max,
            },
            QoiRange::Discrete { values } => ColorMapping::Categorical {
                values: values.iter().cloned().collect(),
            },
        }
    }

    /// Summarize `values` of QOI `qoi`
    ///
    /// # Behavior
    /// - Strings always yield a discrete range.
    /// - Numbers yield `[min, max]` in `Continuous` mode; in `Categorical`
    ///   mode a discrete set while at most [`MAX_DISCRETE_VALUES`] distinct
    ///   values occur, `[min, max]` past that.
    /// - NaN is ignored; no remaining value yields `Empty`.
    ///
    /// # Errors
    /// `QoiTypeMismatch` when strings and numbers are mixed.
    pub fn from_values(
        qoi: &str,
        values: impl IntoIterator<Item = QoiValue>,
        mode: RangeMode,
    ) -> TraceResult<Self> {
        let mut strings = BTreeSet::new();
        let mut numbers = BTreeSet::new();
        let mut saw_number = false;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in values {
            let is_string = matches!(value, QoiValue::Str(_));
            saw_number |= !is_string;
            // NaN still counts as a number here, whatever its position
            if saw_number && (is_string || !strings.is_empty()) {
                return Err(TraceError::QoiTypeMismatch {
                    qoi: qoi.to_string(),
                });
            }

            match value {
                QoiValue::Str(s) => {
                    strings.insert(DiscreteValue::Str(s));
                }
                number => {
                    let Some(x) = number.as_f64().filter(|x| !x.is_nan()) else {
                        continue;
                    };
                    min = min.min(x);
                    max = max.max(x);
                    if mode == RangeMode::Categorical && numbers.len() <= MAX_DISCRETE_VALUES {
                        numbers.insert(DiscreteValue::from_number(x));
                    }
                }
            }
        }

        if !strings.is_empty() {
            return Ok(QoiRange::Discrete { values: strings });
        }
        if min > max {
            return Ok(QoiRange::Empty);
        }
        if mode == RangeMode::Categorical && numbers.len() <= MAX_DISCRETE_VALUES {
            return Ok(QoiRange::Discrete { values: numbers });
        }
        Ok(QoiRange::Continuous { min, max })
    }
}

/// Computes QOI ranges over a trace
#[derive(Debug, Clone, Copy)]
pub struct RangeComputer<'a> {
    info: &'a Info,
}

impl<'a> RangeComputer<'a> {
    pub fn new(info: &'a Info) -> Self {
        Self { info }
    }

    /// Range of an object QOI over every object resident in the selection
    ///
    /// Objects lacking the key are skipped.
    pub fn object_range(
        &self,
        qoi: &ObjectQoi,
        selection: PhaseSelection,
        mode: RangeMode,
    ) -> TraceResult<QoiRange> {
        let info = self.info;
        let phases = selection.phases(info)?;
        let values = phases.iter().flat_map(|&phase| {
            info.phase_objects(phase)
                .filter_map(move |(_, object)| resolve_object_qoi(info, qoi, object))
        });
        let range = QoiRange::from_values(qoi.name(), values, mode)?;
        tracing::debug!(qoi = %qoi, %selection, ?range, "object QOI range");
        Ok(range)
    }

    /// Range of a rank QOI over every rank that recorded a selected phase
    ///
    /// Rank QOIs always use a continuous range for numbers.
    pub fn rank_range(&self, qoi: &RankQoi, selection: PhaseSelection) -> TraceResult<QoiRange> {
        let info = self.info;
        let phases = selection.phases(info)?;
        let values = phases.iter().flat_map(|&phase| {
            info.ranks()
                .values()
                .filter(move |rank| rank.phase(phase).is_some())
                .filter_map(move |rank| resolve_rank_qoi(info, qoi, rank, phase))
        });
        let range = QoiRange::from_values(qoi.name(), values, RangeMode::Continuous)?;
        tracing::debug!(qoi = %qoi, %selection, ?range, "rank QOI range");
        Ok(range)
    }
}
