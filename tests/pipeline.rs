use std::fs;
use std::path::{Path, PathBuf};

use ssnsweep::{
    emit_sequence, load_xgmml, AnnotationFormat, AnnotationMap, ColorRegistry, ColorScheme, Error,
    FrameNaming, Graph, Layout, LayoutConfig, RenderOptions, Scene, Sweep, ThresholdSchedule,
    UNANNOTATED_COLOR,
};

const ABC_NETWORK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graph label="abc" xmlns="http://www.cs.rpi.edu/XGMML">
  <node id="1" label="A">
    <att name="Description" type="list"><att type="string" name="Description" value="A protein a"/></att>
  </node>
  <node id="2" label="B">
    <att name="Description" type="list"><att type="string" name="Description" value="B protein b"/></att>
  </node>
  <node id="3" label="C">
    <att name="Description" type="list"><att type="string" name="Description" value="C protein c"/></att>
  </node>
  <edge id="1,2" label="1,2" source="1" target="2">
    <att name="alignment_score" type="real" value="50"/>
  </edge>
  <edge id="2,3" label="2,3" source="2" target="3">
    <att name="alignment_score" type="real" value="80"/>
  </edge>
</graph>
"#;

struct Run {
    files: Vec<PathBuf>,
    layout: Layout,
    colors: ColorRegistry,
    annotations: AnnotationMap,
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn options() -> RenderOptions {
    RenderOptions {
        width: 320,
        height: 240,
        node_radius: 4,
        legend: true,
    }
}

fn run_pipeline(
    network: &Path,
    annotation: &Path,
    format: AnnotationFormat,
    out: &Path,
    parallel: bool,
) -> ssnsweep::Result<Run> {
    let graph: Graph = load_xgmml(network)?;
    let raw = format.load(annotation)?;
    let annotations = AnnotationMap::resolve(&graph, &raw);
    let sweep = Sweep::new(&graph, ThresholdSchedule::Distinct);
    let layout = Layout::compute(&graph, &LayoutConfig::default());
    let colors = ColorRegistry::build(&annotations, ColorScheme::Palette);
    let options = options();
    let scene = Scene {
        layout: &layout,
        annotations: &annotations,
        colors: &colors,
        options: &options,
    };
    let naming = FrameNaming::new("abc", &sweep);
    let files = emit_sequence(&sweep, &scene, out, &naming, "test", parallel)?;
    Ok(Run {
        files,
        layout,
        colors,
        annotations,
    })
}

#[test]
fn three_node_scenario() {
    let tmp = tempfile::tempdir().unwrap();
    let network = write(tmp.path(), "abc.xgmml", ABC_NETWORK);
    let annot = write(tmp.path(), "annot.tsv", "Hit_Id\tGene\nA\tgeneX\nB\tgeneX\n");
    let out = tmp.path().join("frames");
    fs::create_dir(&out).unwrap();

    let run = run_pipeline(&network, &annot, AnnotationFormat::Tabular, &out, false).unwrap();

    let names: Vec<String> = run
        .files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["abc.0.80.png", "abc.1.50.png"]);

    assert_eq!(run.colors.color_for(run.annotations.label(2)), UNANNOTATED_COLOR);
    assert_eq!(
        run.colors.color_for(run.annotations.label(0)),
        run.colors.color_for(run.annotations.label(1))
    );
    assert_ne!(run.colors.color_for(run.annotations.label(0)), UNANNOTATED_COLOR);

    for file in &run.files {
        let img = image::open(file).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (320, 240));
        let grey = img.pixels().filter(|p| **p == UNANNOTATED_COLOR).count();
        assert!(grey > 0, "unannotated node missing in {file:?}");
    }
    assert_eq!(run.layout.len(), 3);
}

#[test]
fn empty_network_writes_no_frames() {
    let tmp = tempfile::tempdir().unwrap();
    let network = write(tmp.path(), "empty.xgmml", "<graph label=\"empty\"></graph>");
    let annot = write(tmp.path(), "annot.tsv", "Hit_Id\tGene\n");
    let run = run_pipeline(&network, &annot, AnnotationFormat::Tabular, tmp.path(), false).unwrap();
    assert!(run.files.is_empty());
    assert!(run.colors.is_empty());
}

#[test]
fn duplicate_rows_resolve_the_same_way_every_run() {
    let tmp = tempfile::tempdir().unwrap();
    let network = write(tmp.path(), "abc.xgmml", ABC_NETWORK);
    let annot = write(
        tmp.path(),
        "annot.tsv",
        "Hit_Id\tGene\nA\tfirst\nB\tgeneY\nA\tsecond\n",
    );
    let out = tmp.path().join("frames");
    fs::create_dir(&out).unwrap();

    for _ in 0..3 {
        let run = run_pipeline(&network, &annot, AnnotationFormat::Tabular, &out, false).unwrap();
        assert_eq!(run.annotations.label(0), Some("second"));
        assert_eq!(run.colors.len(), 2);
    }
}

#[test]
fn missing_output_directory_stops_the_sweep() {
    let tmp = tempfile::tempdir().unwrap();
    let network = write(tmp.path(), "abc.xgmml", ABC_NETWORK);
    let annot = write(tmp.path(), "annot.tsv", "Hit_Id\tGene\nA\tgeneX\n");
    let out = tmp.path().join("does").join("not").join("exist");

    let err = run_pipeline(&network, &annot, AnnotationFormat::Tabular, &out, false)
        .err()
        .unwrap();
    assert!(matches!(err, Error::RenderWrite { .. }));
    assert!(!out.exists());
}

#[test]
fn malformed_network_fails_before_rendering() {
    let tmp = tempfile::tempdir().unwrap();
    let network = write(
        tmp.path(),
        "bad.xgmml",
        r#"<graph><node id="1"/><edge source="1" target="9"><att name="alignment_score" value="1"/></edge></graph>"#,
    );
    let annot = write(tmp.path(), "annot.tsv", "Hit_Id\tGene\n");
    let out = tmp.path().join("frames");
    fs::create_dir(&out).unwrap();

    let err = run_pipeline(&network, &annot, AnnotationFormat::Tabular, &out, false)
        .err()
        .unwrap();
    assert!(matches!(err, Error::Load { .. }));
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}

#[test]
fn reruns_and_parallel_runs_are_identical() {
    let tmp = tempfile::tempdir().unwrap();
    let network = write(tmp.path(), "abc.xgmml", ABC_NETWORK);
    let annot = write(
        tmp.path(),
        "eggnog.tsv",
        "## emapper\n#query\tseed_ortholog\tPreferred_name\nA\tx\tgeneX\nB\ty\tgeneX\nC\tz\t-\n",
    );

    let mut runs = Vec::new();
    for (name, parallel) in [("first", false), ("second", false), ("parallel", true)] {
        let out = tmp.path().join(name);
        fs::create_dir(&out).unwrap();
        runs.push(run_pipeline(&network, &annot, AnnotationFormat::Eggnog, &out, parallel).unwrap());
    }

    for other in &runs[1..] {
        assert_eq!(runs[0].layout, other.layout);
        assert_eq!(runs[0].colors, other.colors);
        assert_eq!(runs[0].files.len(), other.files.len());
        for (a, b) in runs[0].files.iter().zip(&other.files) {
            assert_eq!(a.file_name(), b.file_name());
            assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
        }
    }
    assert_eq!(runs[0].annotations.label(2), None);
}
