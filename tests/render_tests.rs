//! End-to-end render tests: rank files on disk to JSON frames on disk

use lbscope::config::RunConfig;
use lbscope::ingest::load_directory;
use lbscope::render::{JsonFrameBackend, MemoryBackend, RenderOrchestrator, RenderSettings};
use lbscope::{GridShape, PhaseSelection, RangeMode, TraceError};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Four ranks, three phases; object `4r + k` starts on rank `r` and the
/// migratable ones move one rank up every phase
fn write_trace(dir: &Path) {
    for rank in 0..4u64 {
        let phases: Vec<Value> = (0..3u64)
            .map(|phase| {
                let mut tasks = vec![json!({
                    "node": rank, "time": 1.0,
                    "entity": {"type": "object", "id": 4 * rank, "home": rank, "migratable": false},
                    "user_defined": {"task_slot": 0}
                })];
                let source = (rank + 4 - phase % 4) % 4;
                for k in 1..3u64 {
                    tasks.push(json!({
                        "node": rank,
                        "time": 0.5 * k as f64 + phase as f64,
                        "entity": {"type": "object", "id": 4 * source + k, "home": source, "migratable": true},
                        "user_defined": {"task_slot": k}
                    }));
                }
                json!({
                    "id": phase,
                    "tasks": tasks,
                    "communications": [
                        {"type": "SendRecv", "bytes": 10.0, "from": {"id": 4 * rank}, "to": {"id": 4 * ((rank + 1) % 4)}}
                    ],
                    "user_defined": {"rank_tag": phase}
                })
            })
            .collect();
        let document = json!({"metadata": {"rank": rank}, "phases": phases});
        fs::write(dir.join(format!("data.{}.json", rank)), document.to_string()).unwrap();
    }
}

fn settings() -> RenderSettings {
    RenderSettings::new("load", "task_slot", GridShape::new(2, 2, 1).unwrap())
        .with_jitter(0.3, Some(2024))
}

#[test]
fn test_json_backend_writes_ranges_and_one_frame_per_phase() {
    let input = TempDir::new().unwrap();
    write_trace(input.path());
    let output = TempDir::new().unwrap();

    let loaded = load_directory(input.path(), "data", Some(4)).unwrap();
    let mut orchestrator = RenderOrchestrator::new(
        loaded.info,
        &settings().with_object_range_mode(RangeMode::Categorical),
    )
    .unwrap();
    let mut backend = JsonFrameBackend::new(output.path(), "frame");
    let report = orchestrator.render(&mut backend).unwrap();

    assert_eq!(report.phases, 3);
    assert_eq!(report.objects, 36);
    assert_eq!(backend.written_files().len(), 4);

    let ranges: Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("frameranges.json")).unwrap()).unwrap();
    assert_eq!(ranges["object_range"]["kind"], "discrete");
    assert_eq!(ranges["object_range"]["values"], json!([0, 1, 2]));
    assert_eq!(ranges["max_object_volume"], 10.0);

    for phase in 0..3 {
        let frame: Value = serde_json::from_str(
            &fs::read_to_string(output.path().join(format!("frame{}.json", phase))).unwrap(),
        )
        .unwrap();
        assert_eq!(frame["phase"], phase);
        assert_eq!(frame["ranks"].as_array().unwrap().len(), 4);
        assert_eq!(frame["objects"].as_array().unwrap().len(), 12);
        // the ring of non-migratable objects: 4 edges of 10 bytes
        assert_eq!(frame["edges"].as_array().unwrap().len(), 4);
    }
}

#[test]
fn test_migrating_object_keeps_its_jitter() {
    let input = TempDir::new().unwrap();
    write_trace(input.path());
    let loaded = load_directory(input.path(), "data", None).unwrap();

    let mut orchestrator = RenderOrchestrator::new(loaded.info, &settings()).unwrap();
    let mut backend = MemoryBackend::new();
    orchestrator.render(&mut backend).unwrap();

    // object 1 sits on rank 0, then rank 1, then rank 2, always in slot 1
    let placement = |phase: usize| {
        let frame = &backend.frames[phase];
        let object = frame.objects.iter().find(|o| o.id == 1).unwrap();
        let rank = frame.ranks.iter().find(|r| r.rank == object.rank).unwrap();
        (object.rank, object.position - rank.position)
    };
    let (rank0, offset0) = placement(0);
    let (rank1, offset1) = placement(1);
    let (rank2, offset2) = placement(2);
    assert_eq!((rank0, rank1, rank2), (0, 1, 2));
    assert!((offset0 - offset1).length() < 1e-12);
    assert!((offset1 - offset2).length() < 1e-12);
}

#[test]
fn test_rank_user_defined_qoi_and_average() {
    let input = TempDir::new().unwrap();
    write_trace(input.path());
    let loaded = load_directory(input.path(), "data", Some(4)).unwrap();

    let mut settings = settings().with_selection(PhaseSelection::Single(2));
    settings.rank_qoi = "rank_tag".to_string();
    let mut orchestrator = RenderOrchestrator::new(loaded.info, &settings).unwrap();
    assert_eq!(orchestrator.phases(), &[2]);

    let frame = orchestrator.frame(2).unwrap();
    assert_eq!(frame.rank_qoi_average, Some(2.0));
    // every rank carries 1.0 + 2 * 2.0 + 1.5 = 6.5
    assert_eq!(frame.imbalance, Some(0.0));
}

#[test]
fn test_render_from_config_file() {
    let root = TempDir::new().unwrap();
    let traces = root.path().join("traces");
    fs::create_dir(&traces).unwrap();
    write_trace(&traces);
    let config_path = root.path().join("run.yaml");
    fs::write(
        &config_path,
        "input:\n  directory: traces\n  n_ranks: 4\nviz:\n  object_qoi: load\n  x_ranks: 4\n  jitter_seed: 1\n  phase: 1\noutput:\n  directory: out\n  file_stem: f\n  minify: true\n",
    )
    .unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    let loaded = load_directory(&config.input.directory, &config.input.file_stem, config.input.n_ranks).unwrap();
    let settings = config.to_render_settings(None, loaded.info.num_ranks()).unwrap();
    let mut orchestrator = RenderOrchestrator::new(loaded.info, &settings).unwrap();
    let mut backend =
        JsonFrameBackend::new(&config.output.directory, &config.output.file_stem).with_minify(true);
    orchestrator.render(&mut backend).unwrap();

    let frame = fs::read_to_string(root.path().join("out").join("f1.json")).unwrap();
    assert!(!frame.contains('\n'));
    assert!(!root.path().join("out").join("f0.json").exists());
}

#[test]
fn test_config_without_grid_uses_square_layout() {
    let input = TempDir::new().unwrap();
    write_trace(input.path());
    let config = RunConfig::from_yaml(&format!(
        "input:\n  directory: {}\nviz:\n  jitter_seed: 5\n",
        input.path().display()
    ))
    .unwrap();

    let loaded = load_directory(&config.input.directory, &config.input.file_stem, None).unwrap();
    let settings = config.to_render_settings(None, loaded.info.num_ranks()).unwrap();
    assert_eq!(settings.shape, GridShape::new(2, 2, 1).unwrap());

    let mut orchestrator = RenderOrchestrator::new(loaded.info, &settings).unwrap();
    let frame = orchestrator.frame(0).unwrap();
    let rank3 = frame.ranks.iter().find(|r| r.rank == 3).unwrap();
    assert_eq!(rank3.position, glam::DVec3::new(1.0, 1.0, 0.0));
}

#[test]
fn test_grid_mismatch_writes_nothing() {
    let input = TempDir::new().unwrap();
    write_trace(input.path());
    let output = TempDir::new().unwrap();
    let loaded = load_directory(input.path(), "data", Some(4)).unwrap();

    let settings = RenderSettings::new("load", "load", GridShape::new(3, 1, 1).unwrap());
    assert!(matches!(
        RenderOrchestrator::new(loaded.info, &settings),
        Err(TraceError::GridMismatch { .. })
    ));
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}
