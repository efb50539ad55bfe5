//! Writing a rank back out in the rank file format

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use super::records::{
    CommunicationRecord, EndpointRecord, EntityRecord, LbIterationRecord, MetadataRecord,
    PhaseRecord, SubphaseRecord, TaskRecord, TraceDocument, OBJECT_ENTITY, SEND_RECV,
};
use crate::error::{TraceError, TraceResult};
use crate::model::{Aggregate, ElementId, Info, ObjectWork, QoiMap, RankId};

/// Serialize rank `rank` of `info` as a rank file document
///
/// # Behavior
/// - Every sent edge is written from its owner; a received edge is written
///   only when its sender is not resident on this rank in that phase, so
///   reading the document back wires each edge onto the same side.
/// - Objects without an identity record are written as non-migratable and
///   homed on `rank`.
pub fn rank_to_json(info: &Info, rank: RankId) -> TraceResult<Value> {
    let source = info.rank(rank)?;

    let phases = source
        .phases()
        .values()
        .map(|work| {
            let lb_iterations = work
                .lb_iterations()
                .values()
                .map(|iteration| LbIterationRecord {
                    id: iteration.id(),
                    tasks: tasks(info, rank, iteration.objects()),
                    communications: communications(iteration.objects()),
                    user_defined: qoi_map_to_json(iteration.user_defined()),
                })
                .collect();

            PhaseRecord {
                id: work.id(),
                tasks: tasks(info, rank, work.objects()),
                communications: communications(work.objects()),
                user_defined: qoi_map_to_json(work.user_defined()),
                lb_iterations,
            }
        })
        .collect();

    let document = TraceDocument {
        metadata: Some(MetadataRecord {
            rank: Some(rank),
            attributes: qoi_map_to_json(source.attributes()),
        }),
        phases,
    };
    Ok(serde_json::to_value(document)?)
}

/// Write rank `rank` of `info` to `path`
///
/// A path ending in `.gz` is gzip-compressed (requires the `gzip` feature).
/// The document goes to a temporary file next to `path` that is renamed
/// into place, so readers never see a half-written rank file.
pub fn write_rank_file(info: &Info, rank: RankId, path: &Path) -> TraceResult<()> {
    let text = serde_json::to_string_pretty(&rank_to_json(info, rank)?)?;
    let bytes = if path.extension().map_or(false, |ext| ext == "gz") {
        compress(path, text.as_bytes())?
    } else {
        text.into_bytes()
    };

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(directory).map_err(|e| TraceError::io(path, e))?;
    file.write_all(&bytes).map_err(|e| TraceError::io(path, e))?;
    file.persist(path).map_err(|e| TraceError::io(path, e.error))?;
    Ok(())
}

#[cfg(feature = "gzip")]
fn compress(path: &Path, bytes: &[u8]) -> TraceResult<Vec<u8>> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| TraceError::io(path, e))?;
    encoder.finish().map_err(|e| TraceError::io(path, e))
}

#[cfg(not(feature = "gzip"))]
fn compress(path: &Path, _bytes: &[u8]) -> TraceResult<Vec<u8>> {
    Err(TraceError::InvalidConfig(format!(
        "cannot write {}: lbscope was built without the `gzip` feature",
        path.display()
    )))
}

fn tasks(info: &Info, rank: RankId, objects: &BTreeMap<ElementId, ObjectWork>) -> Vec<TaskRecord> {
    objects
        .values()
        .map(|object| {
            let identity = info.object(object.id());
            let (collection_id, objgroup_id) = match identity.map(|i| i.aggregate()) {
                Some(Aggregate::Collection(meta)) => (Some(meta), None),
                Some(Aggregate::ObjGroup(meta)) => (None, Some(meta)),
                _ => (None, None),
            };

            TaskRecord {
                node: rank,
                time: object.load(),
                entity: EntityRecord {
                    kind: OBJECT_ENTITY.to_string(),
                    id: Some(object.id()),
                    seq_id: None,
                    home: Some(identity.map_or(rank, |i| i.home())),
                    migratable: Some(identity.map_or(false, |i| i.is_migratable())),
                    collection_id,
                    objgroup_id,
                    index: identity.map(|i| i.index().to_vec()).unwrap_or_default(),
                },
                subphases: object
                    .subphase_loads()
                    .iter()
                    .map(|(id, time)| SubphaseRecord { id: *id, time: *time })
                    .collect(),
                user_defined: qoi_map_to_json(object.user_defined()),
                attributes: qoi_map_to_json(object.attributes()),
            }
        })
        .collect()
}

fn communications(objects: &BTreeMap<ElementId, ObjectWork>) -> Vec<CommunicationRecord> {
    let mut records = Vec::new();
    for object in objects.values() {
        let comm = object.communicator();
        for (to, bytes) in comm.sent() {
            records.push(send_recv(object.id(), to, bytes));
        }
        for (from, bytes) in comm.received() {
            if !objects.contains_key(&from) {
                records.push(send_recv(from, object.id(), bytes));
            }
        }
    }
    records
}

fn send_recv(from: ElementId, to: ElementId, bytes: f64) -> CommunicationRecord {
    let endpoint = |id| EndpointRecord {
        kind: Some(OBJECT_ENTITY.to_string()),
        id: Some(id),
        seq_id: None,
    };
    CommunicationRecord {
        kind: SEND_RECV.to_string(),
        bytes: Some(bytes),
        from: Some(endpoint(from)),
        to: Some(endpoint(to)),
    }
}

fn qoi_map_to_json(map: &QoiMap) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            let json = serde_json::to_value(value).unwrap_or(Value::Null);
            (key.clone(), json)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{parse_rank_trace, read_rank_file};
    use serde_json::json;
    use tempfile::TempDir;

    const DOCUMENT: &str = r#"{
        "metadata": {"attributes": {"hostname": "node-a"}},
        "phases": [{
            "id": 0,
            "tasks": [
                {"node": 1, "time": 2.0, "entity": {"type": "object", "id": 5, "home": 1,
                 "migratable": true, "collection_id": 3, "index": [0, 1]},
                 "attributes": {"color": "red"}},
                {"node": 1, "time": 1.0, "entity": {"type": "object", "id": 6, "home": 0,
                 "migratable": false}}
            ],
            "communications": [
                {"type": "SendRecv", "bytes": 4.0, "from": {"id": 5}, "to": {"id": 6}},
                {"type": "SendRecv", "bytes": 2.5, "from": {"id": 9}, "to": {"id": 6}}
            ]
        }]
    }"#;

    fn info_from(text: &str) -> Info {
        let trace = parse_rank_trace(1, text).unwrap();
        Info::from_rank(trace.object_info, trace.rank)
    }

    #[test]
    fn test_written_rank_reads_back_identically() {
        let info = info_from(DOCUMENT);
        let written = rank_to_json(&info, 1).unwrap().to_string();
        assert_eq!(info_from(&written), info);
    }

    #[test]
    fn test_received_edges_only_for_remote_senders() {
        let info = info_from(DOCUMENT);
        let json = rank_to_json(&info, 1).unwrap();
        let comms = json["phases"][0]["communications"].as_array().unwrap();
        assert_eq!(comms.len(), 2);
        assert_eq!(comms[1]["from"]["id"], json!(9));
    }

    #[test]
    fn test_gzip_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let info = info_from(DOCUMENT);

        let plain = temp_dir.path().join("data.1.json");
        let packed = temp_dir.path().join("data.1.json.gz");
        write_rank_file(&info, 1, &plain).unwrap();
        write_rank_file(&info, 1, &packed).unwrap();

        let bytes = std::fs::read(&packed).unwrap();
        assert!(crate::ingest::is_compressed(&bytes));

        let from_plain = read_rank_file(&plain, 1).unwrap();
        let from_packed = read_rank_file(&packed, 1).unwrap();
        assert_eq!(from_plain.rank, from_packed.rank);
        assert_eq!(from_plain.object_info, from_packed.object_info);
    }

    #[test]
    fn test_rank_file_replaces_target_without_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let info = info_from(DOCUMENT);
        let path = temp_dir.path().join("data.1.json");
        std::fs::write(&path, "stale").unwrap();

        write_rank_file(&info, 1, &path).unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("data.1.json")]);
        assert_eq!(read_rank_file(&path, 1).unwrap().object_info, info.object_info().clone());
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let info = info_from(DOCUMENT);
        let path = temp_dir.path().join("absent").join("data.1.json");

        let err = write_rank_file(&info, 1, &path).unwrap_err();
        assert!(matches!(err, TraceError::Io { path: ref p, .. } if *p == path));
    }

    #[test]
    fn test_unknown_rank_fails() {
        let info = info_from(DOCUMENT);
        assert!(rank_to_json(&info, 7).is_err());
    }
}
