//! End-to-end pipeline scenarios: load, filter, step through time.

mod util;

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use cfd_post::prelude::*;

/// Scalar clip over loaded data: the threshold constraint follows the
/// selected field's range and out-of-range writes clamp.
#[test]
fn scalar_clip_constraint_follows_field_range() {
    let path = util::write_temp_file("clip.vtk", util::SAMPLE_VTK);
    let mut pipeline = PostPipeline::new();
    assert!(pipeline.read(&path).unwrap());

    let clip = Arc::new(RwLock::new(ScalarClipFilter::new()));
    pipeline.add_filter(clip.clone());
    pipeline.execute().unwrap();

    clip.write().select_scalar_field("p");
    pipeline.execute().unwrap();

    let constraint = clip.read().value_constraint();
    assert_eq!(constraint.lower, 0.0);
    assert_eq!(constraint.upper, 10.0);
    assert!((constraint.step - 0.1).abs() < 1e-12);

    clip.write().set_value(5.0);
    assert_eq!(clip.read().value(), 5.0);
    assert!(!clip.read().inside_out());
    pipeline.execute().unwrap();

    // p >= 5 on both vertices only for the [1, 2] segment
    let out = clip.read().data().unwrap();
    assert_eq!(out.as_set().unwrap().num_cells(), 1);

    // the clamp kicks in above the field range
    clip.write().set_value(42.0);
    assert_eq!(clip.read().value(), 10.0);
}

/// Parallel mode appends the outputs of every child fed the same
/// external input.
#[test]
fn parallel_pipeline_appends_outputs() {
    let path = util::write_temp_file("parallel.vtk", util::SAMPLE_VTK);
    let mut pipeline = PostPipeline::new();
    pipeline.read(&path).unwrap();
    let input = cfd_post::filter::new_slot();
    *input.write() = pipeline.source_data();
    pipeline.set_input_slot(Some(input));
    pipeline.set_mode(Mode::Parallel);

    let a = Arc::new(RwLock::new(WarpVectorFilter::new()));
    let b = Arc::new(RwLock::new(WarpVectorFilter::new()));
    pipeline.add_filter(a.clone());
    pipeline.add_filter(b.clone());
    pipeline.execute().unwrap();

    let source_points = pipeline
        .source_data()
        .unwrap()
        .as_set()
        .unwrap()
        .num_points();
    let out = pipeline.data().unwrap();
    let out = out.as_set().unwrap();
    assert_eq!(out.num_points(), 2 * source_points);
    // arrays shared by both inputs survive the append
    assert!(out.array(Association::Point, "p").is_some());
}

struct FakeSeries;

impl InstantReader for FakeSeries {
    fn read(&self, _path: &Path) -> Result<Vec<Instant>, PostError> {
        Ok((0..4)
            .map(|k| {
                let points = (0..=k).map(|i| [i as f64, 0.0, 0.0]).collect();
                let ds = DataSet::from_geometry(points, vec![]).unwrap();
                let mut regions = MultiBlock::new();
                regions.push("ocean", DataObject::handle(ds));
                let mut instant = Instant::new(k as f64 * 0.25);
                instant.set_regions(Arc::new(regions));
                instant
            })
            .collect())
    }
}

/// Time stepping over a multi-instant series: reading jumps to the last
/// timestep, `advance` clamps at the ends, `fetch` follows the index.
#[test]
fn advance_steps_through_a_time_series() {
    register_reader(FormatKind::NetCdf, Box::new(FakeSeries));
    let path = util::write_temp_file("series.nc", "placeholder");

    let mut pipeline = PostPipeline::new();
    assert!(pipeline.read(&path).unwrap());
    assert_eq!(pipeline.time_index_range(), (0, 3));
    assert_eq!(pipeline.time_index(), 3);
    assert_eq!(pipeline.list_time_values(), vec![0.0, 0.25, 0.5, 0.75]);
    assert_eq!(pipeline.list_regions(), vec!["ocean"]);

    pipeline.set_time_index(0);
    for _ in 0..3 {
        pipeline.advance(1);
    }
    assert_eq!(pipeline.time_index(), 3);
    // instant k holds k + 1 points
    assert_eq!(pipeline.fetch().unwrap().as_set().unwrap().num_points(), 4);

    // stepping past the end stays clamped
    pipeline.advance(5);
    assert_eq!(pipeline.time_index(), 3);
    pipeline.advance(-100);
    assert_eq!(pipeline.time_index(), 0);
    assert_eq!(pipeline.fetch().unwrap().as_set().unwrap().num_points(), 1);
}

/// Loading a result file immediately presents the latest instant as the
/// pipeline's own output, before any filter or execute.
#[test]
fn read_presents_the_latest_instant() {
    let path = util::write_temp_file("root.vtk", util::SAMPLE_VTK);
    let mut pipeline = PostPipeline::new();
    assert!(pipeline.read(&path).unwrap());

    let data = pipeline.data().unwrap();
    assert_eq!(data.as_set().unwrap().num_points(), 3);
    assert!(Arc::ptr_eq(&data, &pipeline.source_data().unwrap()));
}

/// A file the process cannot open is fatal, same as a missing one.
#[cfg(unix)]
#[test]
fn permission_denied_is_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let path = util::write_temp_file("denied.vtk", util::SAMPLE_VTK);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();
    // a root process bypasses permission bits; only assert when the
    // open actually fails
    if std::fs::File::open(&path).is_err() {
        let mut pipeline = PostPipeline::new();
        assert!(matches!(
            pipeline.read(&path),
            Err(PostError::FileUnreadable(_))
        ));
    }
    let _ = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644));
}

/// Unknown formats are reported failures, unreadable paths are fatal.
#[test]
fn read_failure_modes() {
    let mut pipeline = PostPipeline::new();
    assert!(matches!(
        pipeline.read(Path::new("/definitely/not/here.vtk")),
        Err(PostError::FileUnreadable(_))
    ));

    let unknown = util::write_temp_file("notes.txt", "not a result file");
    assert!(!pipeline.read(&unknown).unwrap());

    let garbage = util::write_temp_file("garbage.vtk", "these are not the bytes");
    assert!(!pipeline.read(&garbage).unwrap());
}
