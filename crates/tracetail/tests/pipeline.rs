//! End-to-end pipeline tests over the public crate surface: raw capture
//! lines in, ordered trace forest out.

use tracetail::engine::{EngineConfig, IngestionEngine};
use tracetail::filter::FilterState;
use tracetail::record::{Level, RecordKind};

fn feed(engine: &mut IngestionEngine, capture: &str) {
    for line in capture.lines() {
        engine.ingest(line);
    }
}

#[test]
fn mixed_capture_builds_ordered_forest() {
    let mut engine = IngestionEngine::default();

    // A mangled capture: logcat-framed lines, a chunk-split payload, a
    // syslog-framed tail entry, and one plain untraced line.
    let capture = "\
01-02 10:00:00.100  1234  5678 I App: +++ checkout |{ ts=2025-01-02T10:00:00.100Z lvl=info trace=tr1 span=root kind=SPAN_START name=checkout src=cart/submit }|
01-02 10:00:00.150  1234  5678 I App: charging card |{ ts=2025-01-02T10:00:00.150Z lvl=debug trace=tr1 span=pay parent=root kind=SPAN_START name=charge }|
fetch inventory |{ ts=2025-01-02T10:00:00.120Z lvl=debug trace=tr1 (beef:kmpert...)
span=inv parent=root kind=SPAN_START name=inventory }| (beef:kmpert!)
Engine: card accepted |{ ts=2025-01-02T10:00:00.180Z lvl=info trace=tr1 span=pay }|
--- charge |{ ts=2025-01-02T10:00:00.200Z lvl=info trace=tr1 span=pay kind=SPAN_END dur=50 }|
stray diagnostics line |{ ts=2025-01-02T10:00:01.000Z lvl=warn }|
";
    feed(&mut engine, capture);
    // The syslog-style tail entry stays pending until flush.
    engine.ingest("Jun 10 12:00:01 backend[42] done |{ ts=2025-01-02T10:00:00.250Z lvl=info trace=tr1 span=inv kind=SPAN_END dur=130 }|");
    engine.flush();

    let snapshot = engine.snapshot();

    assert_eq!(snapshot.untraced.len(), 1);
    assert_eq!(snapshot.untraced[0].level, Level::Warn);
    assert_eq!(snapshot.dropped, 0);

    assert_eq!(snapshot.traces.len(), 1);
    let trace = &snapshot.traces[0];
    assert_eq!(trace.trace_id, "tr1");
    assert_eq!(trace.roots.len(), 1);

    let root = &trace.roots[0];
    assert_eq!(root.name, "checkout");
    assert_eq!(root.src_component.as_deref(), Some("cart"));
    assert_eq!(root.src_operation.as_deref(), Some("submit"));

    // Children ordered by start timestamp: inventory (.120) before charge (.150).
    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["inventory", "charge"]);

    let charge = &root.children[1];
    assert_eq!(charge.duration_ms, Some(50));
    // The plain log landed inside its span, not at the root.
    assert_eq!(charge.records.len(), 1);
    assert_eq!(charge.records[0].kind, RecordKind::Log);
    assert_eq!(charge.records[0].message.as_deref(), Some("card accepted"));

    let inventory = &root.children[0];
    assert_eq!(inventory.duration_ms, Some(130));
}

#[test]
fn filter_narrows_snapshot_and_reset_clears_it() {
    let mut engine = IngestionEngine::default();
    feed(
        &mut engine,
        "\
|{ ts=1 lvl=info trace=alpha span=a1 kind=SPAN_START name=alpha-work }|
|{ ts=2 lvl=error trace=beta span=b1 kind=SPAN_START name=beta-work }|
|{ ts=3 lvl=debug }|
",
    );

    engine.set_filter(FilterState {
        min_level: Some(Level::Error),
        exclude_untraced: true,
        ..Default::default()
    });
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.traces.len(), 1);
    assert_eq!(snapshot.traces[0].trace_id, "beta");
    assert!(snapshot.untraced.is_empty());

    engine.reset();
    let empty = engine.snapshot();
    assert!(empty.traces.is_empty());
    assert!(empty.untraced.is_empty());
}

#[test]
fn snapshot_serializes_to_json() {
    let mut engine = IngestionEngine::default();
    engine.ingest("Worker: begin |{ ts=1 lvl=info trace=tr span=s kind=SPAN_START name=job }|");
    engine.ingest("|{ ts=2 lvl=error trace=tr span=s kind=SPAN_END dur=9 stack_trace=\"boom\" }|");

    let snapshot = engine.snapshot();
    let json = serde_json::to_value(&snapshot).expect("snapshot serializes");

    let trace = &json["traces"][0];
    assert_eq!(trace["trace_id"], "tr");
    let root = &trace["roots"][0];
    assert_eq!(root["name"], "job");
    assert_eq!(root["duration_ms"], 9);
    // The stack-trace-carrying SPAN_END renders alongside the span's logs.
    assert_eq!(root["records"][0]["kind"], "span_end");
}

#[test]
fn eviction_is_visible_in_snapshot() {
    let mut engine = IngestionEngine::new(EngineConfig {
        buffer_capacity: 2,
        ..Default::default()
    });
    for i in 0..4 {
        engine.ingest(&format!("|{{ ts=t{i} lvl=info }}|"));
    }
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.dropped, 2);
    let stamps: Vec<&str> = snapshot
        .untraced
        .iter()
        .map(|r| r.timestamp.as_str())
        .collect();
    assert_eq!(stamps, vec!["t2", "t3"]);
}
