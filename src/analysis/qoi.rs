//! Quantity-of-interest resolution
//!
//! A QOI is either a built-in accessor (load, volumes, counts, ids) or the
//! name of an attribute / user-defined field carried by the trace. Names
//! are validated once against the whole trace ([`QoiSchema`]) so a typo
//! fails before any per-phase work; afterwards resolution for a single
//! entity yields `None` when that entity simply lacks the key.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{TraceError, TraceResult};
use crate::model::{EntityKind, Info, ObjectWork, PhaseId, QoiValue, Rank};

/// Rank QOI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankQoi {
    Load,
    ReceivedVolume,
    SentVolume,
    NumberOfObjects,
    NumberOfMigratableObjects,
    MigratableLoad,
    Id,
    /// Rank attribute, then the phase-level user-defined field
    Attribute(String),
}

impl RankQoi {
    pub const BUILTIN_NAMES: [&'static str; 7] = [
        "load",
        "received_volume",
        "sent_volume",
        "number_of_objects",
        "number_of_migratable_objects",
        "migratable_load",
        "id",
    ];

    /// Built-in QOI for `name`, if any
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "load" => Some(RankQoi::Load),
            "received_volume" => Some(RankQoi::ReceivedVolume),
            "sent_volume" => Some(RankQoi::SentVolume),
            "number_of_objects" => Some(RankQoi::NumberOfObjects),
            "number_of_migratable_objects" => Some(RankQoi::NumberOfMigratableObjects),
            "migratable_load" => Some(RankQoi::MigratableLoad),
            "id" => Some(RankQoi::Id),
            _ => None,
        }
    }

    /// Validate `name` against built-ins and the keys observed in the trace
    pub fn parse(name: &str, schema: &QoiSchema) -> TraceResult<Self> {
        if let Some(builtin) = Self::builtin(name) {
            return Ok(builtin);
        }
        if schema.rank_keys.contains(name) {
            return Ok(RankQoi::Attribute(name.to_string()));
        }
        Err(TraceError::UnknownQoi {
            kind: EntityKind::Rank,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            RankQoi::Load => "load",
            RankQoi::ReceivedVolume => "received_volume",
            RankQoi::SentVolume => "sent_volume",
            RankQoi::NumberOfObjects => "number_of_objects",
            RankQoi::NumberOfMigratableObjects => "number_of_migratable_objects",
            RankQoi::MigratableLoad => "migratable_load",
            RankQoi::Id => "id",
            RankQoi::Attribute(name) => name,
        }
    }
}

impl fmt::Display for RankQoi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Object QOI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectQoi {
    Load,
    ReceivedVolume,
    SentVolume,
    MaxVolume,
    Id,
    /// The object's home rank
    RankId,
    /// Object attribute, then the user-defined field
    Attribute(String),
}

impl ObjectQoi {
    pub const BUILTIN_NAMES: [&'static str; 6] = [
        "load",
        "received_volume",
        "sent_volume",
        "max_volume",
        "id",
        "rank_id",
    ];

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "load" => Some(ObjectQoi::Load),
            "received_volume" => Some(ObjectQoi::ReceivedVolume),
            "sent_volume" => Some(ObjectQoi::SentVolume),
            "max_volume" => Some(ObjectQoi::MaxVolume),
            "id" => Some(ObjectQoi::Id),
            "rank_id" => Some(ObjectQoi::RankId),
            _ => None,
        }
    }

    pub fn parse(name: &str, schema: &QoiSchema) -> TraceResult<Self> {
        if let Some(builtin) = Self::builtin(name) {
            return Ok(builtin);
        }
        if schema.object_keys.contains(name) {
            return Ok(ObjectQoi::Attribute(name.to_string()));
        }
        Err(TraceError::UnknownQoi {
            kind: EntityKind::Object,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            ObjectQoi::Load => "load",
            ObjectQoi::ReceivedVolume => "received_volume",
            ObjectQoi::SentVolume => "sent_volume",
            ObjectQoi::MaxVolume => "max_volume",
            ObjectQoi::Id => "id",
            ObjectQoi::RankId => "rank_id",
            ObjectQoi::Attribute(name) => name,
        }
    }
}

impl fmt::Display for ObjectQoi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Attribute and user-defined keys observed anywhere in a trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QoiSchema {
    rank_keys: BTreeSet<String>,
    object_keys: BTreeSet<String>,
}

impl QoiSchema {
    /// Scan every rank, phase and object once
    pub fn from_info(info: &Info) -> Self {
        let mut schema = Self::default();
        for rank in info.ranks().values() {
            schema.rank_keys.extend(rank.attributes().keys().cloned());
            for work in rank.phases().values() {
                schema.rank_keys.extend(work.user_defined().keys().cloned());
                for object in work.objects().values() {
                    schema.object_keys.extend(object.attributes().keys().cloned());
                    schema.object_keys.extend(object.user_defined().keys().cloned());
                }
            }
        }
        schema
    }

    pub fn rank_keys(&self) -> &BTreeSet<String> {
        &self.rank_keys
    }

    pub fn object_keys(&self) -> &BTreeSet<String> {
        &self.object_keys
    }
}

/// Value of `qoi` for `rank` at `phase`
///
/// Phase-dependent built-ins are `None` when the rank did not record the
/// phase.
pub fn resolve_rank_qoi(info: &Info, qoi: &RankQoi, rank: &Rank, phase: PhaseId) -> Option<QoiValue> {
    let work = rank.phase(phase);
    let objects = || work.into_iter().flat_map(|w| w.objects().values());
    let is_migratable =
        |object: &&ObjectWork| info.object(object.id()).map_or(false, |i| i.is_migratable());

    match qoi {
        RankQoi::Id => Some(QoiValue::from_id(u64::from(rank.id()))),
        RankQoi::Attribute(name) => rank
            .attributes()
            .get(name)
            .or_else(|| work.and_then(|w| w.user_defined().get(name)))
            .cloned(),
        _ if work.is_none() => None,
        RankQoi::Load => Some(QoiValue::Double(objects().map(ObjectWork::load).sum())),
        RankQoi::ReceivedVolume => Some(QoiValue::Double(
            objects().map(ObjectWork::received_volume).sum(),
        )),
        RankQoi::SentVolume => Some(QoiValue::Double(objects().map(ObjectWork::sent_volume).sum())),
        RankQoi::NumberOfObjects => Some(QoiValue::Int(objects().count() as i64)),
        RankQoi::NumberOfMigratableObjects => {
            Some(QoiValue::Int(objects().filter(is_migratable).count() as i64))
        }
        RankQoi::MigratableLoad => Some(QoiValue::Double(
            objects().filter(is_migratable).map(ObjectWork::load).sum(),
        )),
    }
}

/// Value of `qoi` for one object's work record
pub fn resolve_object_qoi(info: &Info, qoi: &ObjectQoi, object: &ObjectWork) -> Option<QoiValue> {
    match qoi {
        ObjectQoi::Load => Some(QoiValue::Double(object.load())),
        ObjectQoi::ReceivedVolume => Some(QoiValue::Double(object.received_volume())),
        ObjectQoi::SentVolume => Some(QoiValue::Double(object.sent_volume())),
        ObjectQoi::MaxVolume => Some(QoiValue::Double(object.max_volume())),
        ObjectQoi::Id => Some(QoiValue::from_id(object.id())),
        ObjectQoi::RankId => info
            .object(object.id())
            .map(|i| QoiValue::from_id(u64::from(i.home()))),
        ObjectQoi::Attribute(name) => object
            .attributes()
            .get(name)
            .or_else(|| object.user_defined().get(name))
            .cloned(),
    }
}

/// A validated pair of rank and object QOIs bound to one trace
#[derive(Debug, Clone)]
pub struct QoiResolver<'a> {
    info: &'a Info,
    rank_qoi: RankQoi,
    object_qoi: ObjectQoi,
}

impl<'a> QoiResolver<'a> {
    /// Validate both names against built-ins and the trace's keys
    ///
    /// # Errors
    /// `UnknownQoi` naming the first invalid QOI (rank checked first).
    pub fn new(info: &'a Info, rank_qoi: &str, object_qoi: &str) -> TraceResult<Self> {
        let schema = QoiSchema::from_info(info);
        Self::with_schema(info, &schema, rank_qoi, object_qoi)
    }

    pub fn with_schema(
        info: &'a Info,
        schema: &QoiSchema,
        rank_qoi: &str,
        object_qoi: &str,
    ) -> TraceResult<Self> {
        let rank_qoi = RankQoi::parse(rank_qoi, schema)?;
        let object_qoi = ObjectQoi::parse(object_qoi, schema)?;
        Ok(Self {
            info,
            rank_qoi,
            object_qoi,
        })
    }

    pub fn rank_qoi(&self) -> &RankQoi {
        &self.rank_qoi
    }

    pub fn object_qoi(&self) -> &ObjectQoi {
        &self.object_qoi
    }

    pub fn rank_value(&self, rank: &Rank, phase: PhaseId) -> Option<QoiValue> {
        resolve_rank_qoi(self.info, &self.rank_qoi, rank, phase)
    }

    pub fn object_value(&self, object: &ObjectWork) -> Option<QoiValue> {
        resolve_object_qoi(self.info, &self.object_qoi, object)
    }
}
