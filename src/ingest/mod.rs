//! Trace ingestion
//!
//! Turns one rank's JSON document into a partial trace ([`RankTrace`]) and
//! merges many of them into an [`Info`](crate::model::Info).
//!
//! # Communication wiring
//!
//! A rank file only describes the objects that rank hosted, so an edge A→B
//! is recorded on whichever endpoint is local:
//! - as *sent* on A when A is resident in the phase,
//! - otherwise as *received* on B when B is resident,
//! - otherwise it is dropped and reported as
//!   [`IngestDiagnostic::UnresolvedCommunication`].
//!
//! Only `SendRecv` communications describe object edges; other types are
//! reported and skipped.

mod pool;
mod reader;
mod records;
mod writer;

pub use pool::{load_directory, load_rank_files, merge_rank_traces, LoadedTrace, RankSource};
pub use reader::{
    discover_rank_files, is_compressed, rank_file_name, rank_file_path, read_rank_file,
    read_trace_text, DEFAULT_FILE_STEM,
};
pub use writer::{rank_to_json, write_rank_file};

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::diagnostics::IngestDiagnostic;
use crate::error::{TraceError, TraceResult};
use crate::model::{
    ElementId, LbIteration, ObjectInfo, ObjectWork, PhaseId, PhaseWork, QoiMap, QoiValue, Rank,
    RankId,
};
use records::{CommunicationRecord, PhaseRecord, TaskRecord, TraceDocument, OBJECT_ENTITY, SEND_RECV};

/// Everything one rank file contributes to a trace
#[derive(Debug, Clone)]
pub struct RankTrace {
    pub rank: Rank,
    /// Identities of every object the file describes
    pub object_info: BTreeMap<ElementId, ObjectInfo>,
    pub diagnostics: Vec<IngestDiagnostic>,
}

/// Parse the JSON text of rank `rank`'s trace file
///
/// # Returns
/// The rank with all its phases, the object identities it describes and
/// the non-fatal diagnostics found on the way.
///
/// # Errors
/// - `Json` when the text is not JSON at all
/// - `MalformedTrace` when a required field is missing or mistyped
pub fn parse_rank_trace(rank: RankId, text: &str) -> TraceResult<RankTrace> {
    let document: TraceDocument = serde_json::from_str(text).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => TraceError::malformed(format!("rank {}", rank), e.to_string()),
        _ => TraceError::Json(e),
    })?;

    let mut parser = RankParser {
        rank,
        object_info: BTreeMap::new(),
        diagnostics: Vec::new(),
    };

    let attributes = match &document.metadata {
        Some(metadata) => decode_qoi_map(&metadata.attributes, &format!("rank {} metadata", rank))?,
        None => QoiMap::new(),
    };

    let mut phases = BTreeMap::new();
    for record in document.phases {
        let phase_id = record.id;
        let work = parser.parse_phase(record)?;
        if phases.insert(phase_id, work).is_some() {
            return Err(TraceError::malformed(
                format!("rank {}", rank),
                format!("phase {} appears twice", phase_id),
            ));
        }
    }

    tracing::debug!(
        rank,
        phases = phases.len(),
        objects = parser.object_info.len(),
        "parsed rank trace"
    );

    Ok(RankTrace {
        rank: Rank::new(rank, phases).with_attributes(attributes),
        object_info: parser.object_info,
        diagnostics: parser.diagnostics,
    })
}

struct RankParser {
    rank: RankId,
    object_info: BTreeMap<ElementId, ObjectInfo>,
    diagnostics: Vec<IngestDiagnostic>,
}

impl RankParser {
    fn parse_phase(&mut self, record: PhaseRecord) -> TraceResult<PhaseWork> {
        let phase = record.id;
        let context = format!("rank {} phase {}", self.rank, phase);

        let mut objects = self.parse_tasks(phase, &record.tasks, &context)?;
        self.wire_communications(phase, &mut objects, &record.communications, &context)?;

        let mut iterations = Vec::with_capacity(record.lb_iterations.len());
        for iteration in &record.lb_iterations {
            let context = format!("{} lb_iteration {}", context, iteration.id);
            let mut objects = self.parse_tasks(phase, &iteration.tasks, &context)?;
            self.wire_communications(phase, &mut objects, &iteration.communications, &context)?;
            iterations.push(
                LbIteration::new(iteration.id, objects)
                    .with_user_defined(decode_qoi_map(&iteration.user_defined, &context)?),
            );
        }

        Ok(PhaseWork::new(phase, objects)
            .with_user_defined(decode_qoi_map(&record.user_defined, &context)?)
            .with_lb_iterations(iterations))
    }

    fn parse_tasks(
        &mut self,
        phase: PhaseId,
        tasks: &[TaskRecord],
        context: &str,
    ) -> TraceResult<BTreeMap<ElementId, ObjectWork>> {
        let mut objects = BTreeMap::new();

        for (position, task) in tasks.iter().enumerate() {
            let context = format!("{} task {}", context, position);
            let entity = &task.entity;
            if entity.kind != OBJECT_ENTITY {
                tracing::debug!(rank = self.rank, phase, kind = %entity.kind, "skipping non-object task");
                continue;
            }

            let id = entity
                .element_id()
                .ok_or_else(|| TraceError::malformed(&context, "entity has neither `id` nor `seq_id`"))?;
            let home = entity
                .home
                .ok_or_else(|| TraceError::malformed(&context, "entity is missing `home`"))?;
            let migratable = entity
                .migratable
                .ok_or_else(|| TraceError::malformed(&context, "entity is missing `migratable`"))?;

            let mut info = match (entity.collection_id, entity.objgroup_id) {
                (Some(_), Some(_)) => {
                    return Err(TraceError::malformed(
                        &context,
                        "entity has both `collection_id` and `objgroup_id`",
                    ))
                }
                (Some(_), None) => ObjectInfo::new(id, home, migratable, entity.index.clone()),
                _ => ObjectInfo::new(id, home, migratable, Vec::new()),
            };
            if let Some(meta) = entity.collection_id {
                info.set_collection(meta);
            } else if let Some(meta) = entity.objgroup_id {
                info.set_objgroup(meta);
            }
            self.object_info.entry(id).or_insert(info);

            let subphase_loads = task.subphases.iter().map(|s| (s.id, s.time)).collect();
            let work = ObjectWork::new(id, task.time)
                .with_subphase_loads(subphase_loads)
                .with_user_defined(decode_qoi_map(&task.user_defined, &context)?)
                .with_attributes(decode_qoi_map(&task.attributes, &context)?);

            if objects.insert(id, work).is_some() {
                return Err(TraceError::malformed(
                    &context,
                    format!("object {} appears twice in phase {}", id, phase),
                ));
            }
        }

        Ok(objects)
    }

    fn wire_communications(
        &mut self,
        phase: PhaseId,
        objects: &mut BTreeMap<ElementId, ObjectWork>,
        communications: &[CommunicationRecord],
        context: &str,
    ) -> TraceResult<()> {
        for (position, comm) in communications.iter().enumerate() {
            if comm.kind != SEND_RECV {
                self.diagnostics.push(IngestDiagnostic::IgnoredCommunication {
                    rank: self.rank,
                    phase,
                    comm_type: comm.kind.clone(),
                });
                continue;
            }

            let context = format!("{} communication {}", context, position);
            let bytes = comm
                .bytes
                .ok_or_else(|| TraceError::malformed(&context, "communication is missing `bytes`"))?;
            let from = comm
                .from
                .as_ref()
                .and_then(|e| e.element_id())
                .ok_or_else(|| TraceError::malformed(&context, "communication has no `from` id"))?;
            let to = comm
                .to
                .as_ref()
                .and_then(|e| e.element_id())
                .ok_or_else(|| TraceError::malformed(&context, "communication has no `to` id"))?;

            if from == to {
                self.diagnostics.push(IngestDiagnostic::SelfCommunication {
                    rank: self.rank,
                    phase,
                    object: from,
                    bytes,
                });
            }

            if let Some(sender) = objects.get_mut(&from) {
                sender.add_sent_communication(to, bytes);
            } else if let Some(receiver) = objects.get_mut(&to) {
                receiver.add_received_communication(from, bytes);
            } else {
                self.diagnostics.push(IngestDiagnostic::UnresolvedCommunication {
                    rank: self.rank,
                    phase,
                    from,
                    to,
                    bytes,
                });
            }
        }
        Ok(())
    }
}

/// Decode a JSON object of scalars into typed values
fn decode_qoi_map(map: &Map<String, Value>, context: &str) -> TraceResult<QoiMap> {
    map.iter()
        .map(|(key, value)| {
            QoiValue::from_json(value)
                .map(|v| (key.clone(), v))
                .ok_or_else(|| {
                    TraceError::malformed(
                        context,
                        format!("`{}` is not a number or string: {}", key, value),
                    )
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: u64, time: f64) -> Value {
        json!({
            "node": 0,
            "time": time,
            "entity": {"type": "object", "id": id, "home": 0, "migratable": true}
        })
    }

    fn send(from: u64, to: u64, bytes: f64) -> Value {
        json!({"type": "SendRecv", "bytes": bytes, "from": {"id": from}, "to": {"id": to}})
    }

    fn parse(doc: Value) -> TraceResult<RankTrace> {
        parse_rank_trace(0, &doc.to_string())
    }

    #[test]
    fn test_edge_wiring_prefers_sender() {
        let trace = parse(json!({
            "phases": [{
                "id": 0,
                "tasks": [task(1, 1.0), task(2, 2.0)],
                "communications": [send(1, 9, 4.0), send(9, 2, 3.0), send(8, 9, 1.0)]
            }]
        }))
        .unwrap();

        let phase = trace.rank.phase(0).unwrap();
        assert_eq!(phase.object(1).unwrap().sent_volume(), 4.0);
        assert_eq!(phase.object(2).unwrap().received_volume(), 3.0);
        assert_eq!(
            trace.diagnostics,
            vec![IngestDiagnostic::UnresolvedCommunication {
                rank: 0,
                phase: 0,
                from: 8,
                to: 9,
                bytes: 1.0
            }]
        );
    }

    #[test]
    fn test_seq_id_fallback() {
        let trace = parse(json!({
            "phases": [{
                "id": 3,
                "tasks": [{
                    "node": 0, "time": 0.5,
                    "entity": {"type": "object", "seq_id": 77, "home": 1, "migratable": false}
                }],
                "communications": [{"type": "SendRecv", "bytes": 2.0, "from": {"seq_id": 77}, "to": {"seq_id": 78}}]
            }]
        }))
        .unwrap();

        let info = &trace.object_info[&77];
        assert_eq!(info.home(), 1);
        assert!(!info.is_migratable());
        assert_eq!(trace.rank.phase(3).unwrap().object(77).unwrap().sent_volume(), 2.0);
    }

    #[test]
    fn test_index_kept_only_for_collections() {
        let trace = parse(json!({
            "phases": [{
                "id": 0,
                "tasks": [
                    {"node": 0, "time": 1.0, "entity": {"type": "object", "id": 1, "home": 0,
                     "migratable": true, "collection_id": 5, "index": [2, 3]}},
                    {"node": 0, "time": 1.0, "entity": {"type": "object", "id": 2, "home": 0,
                     "migratable": false, "objgroup_id": 6, "index": [4]}}
                ]
            }]
        }))
        .unwrap();

        assert_eq!(trace.object_info[&1].index(), &[2, 3]);
        assert_eq!(trace.object_info[&1].meta_id(), Some(5));
        assert!(trace.object_info[&2].index().is_empty());
        assert!(trace.object_info[&2].is_objgroup());
    }

    #[test]
    fn test_attributes_and_user_defined_are_typed() {
        let trace = parse(json!({
            "metadata": {"attributes": {"hostname": "node-a", "cores": 48}},
            "phases": [{
                "id": 0,
                "user_defined": {"budget": 1.5},
                "tasks": [{
                    "node": 0, "time": 1.0,
                    "entity": {"type": "object", "id": 1, "home": 0, "migratable": true},
                    "subphases": [{"id": 0, "time": 0.25}, {"id": 1, "time": 0.5}],
                    "user_defined": {"shared_block_id": 4},
                    "attributes": {"label": "halo"}
                }]
            }]
        }))
        .unwrap();

        assert_eq!(trace.rank.attributes()["hostname"], QoiValue::Str("node-a".into()));
        assert_eq!(trace.rank.attributes()["cores"], QoiValue::Int(48));

        let phase = trace.rank.phase(0).unwrap();
        assert_eq!(phase.user_defined()["budget"], QoiValue::Double(1.5));

        let object = phase.object(1).unwrap();
        assert_eq!(object.user_defined()["shared_block_id"], QoiValue::Int(4));
        assert_eq!(object.attributes()["label"], QoiValue::Str("halo".into()));
        assert_eq!(object.subphase_loads().get(&1), Some(&0.5));
    }

    #[test]
    fn test_missing_time_is_malformed() {
        let err = parse(json!({
            "phases": [{"id": 0, "tasks": [{"node": 0, "entity": {"type": "object", "id": 1}}]}]
        }))
        .unwrap_err();
        assert!(matches!(err, TraceError::MalformedTrace { .. }), "{:?}", err);
    }

    #[test]
    fn test_non_numeric_time_is_malformed() {
        let err = parse(json!({
            "phases": [{"id": 0, "tasks": [{"node": 0, "time": "slow",
                "entity": {"type": "object", "id": 1, "home": 0, "migratable": true}}]}]
        }))
        .unwrap_err();
        assert_eq!(err.code(), "LBS-TRC-001");
    }

    #[test]
    fn test_missing_home_is_malformed() {
        let err = parse(json!({
            "phases": [{"id": 0, "tasks": [{"node": 0, "time": 1.0,
                "entity": {"type": "object", "id": 1, "migratable": true}}]}]
        }))
        .unwrap_err();
        match err {
            TraceError::MalformedTrace { context, reason } => {
                assert_eq!(context, "rank 0 phase 0 task 0");
                assert!(reason.contains("home"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_scalar_attribute_is_malformed() {
        let err = parse(json!({
            "phases": [{"id": 0, "tasks": [{"node": 0, "time": 1.0,
                "entity": {"type": "object", "id": 1, "home": 0, "migratable": true},
                "attributes": {"coords": [1, 2]}}]}]
        }))
        .unwrap_err();
        assert!(matches!(err, TraceError::MalformedTrace { .. }));
    }

    #[test]
    fn test_invalid_json_is_json_error() {
        let err = parse_rank_trace(0, "{\"phases\": [").unwrap_err();
        assert!(matches!(err, TraceError::Json(_)));
    }

    #[test]
    fn test_other_communication_types_are_reported() {
        let trace = parse(json!({
            "phases": [{
                "id": 0,
                "tasks": [task(1, 1.0)],
                "communications": [{"type": "Broadcast", "bytes": 1.0,
                    "from": {"type": "node", "id": 0}, "to": {"id": 1}}]
            }]
        }))
        .unwrap();

        assert_eq!(trace.rank.phase(0).unwrap().object(1).unwrap().received_volume(), 0.0);
        assert!(matches!(
            trace.diagnostics.as_slice(),
            [IngestDiagnostic::IgnoredCommunication { comm_type, .. }] if comm_type == "Broadcast"
        ));
    }

    #[test]
    fn test_lb_iterations_are_recorded() {
        let trace = parse(json!({
            "phases": [{
                "id": 0,
                "tasks": [task(1, 1.0)],
                "lb_iterations": [{"id": 0, "tasks": [task(1, 0.75), task(2, 0.25)]}]
            }]
        }))
        .unwrap();

        let phase = trace.rank.phase(0).unwrap();
        assert_eq!(phase.num_objects(), 1);
        assert_eq!(phase.lb_iterations()[&0].load(), 1.0);
        // Identities seen only in an iteration still count
        assert!(trace.object_info.contains_key(&2));
    }
}
