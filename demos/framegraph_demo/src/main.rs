use framegraph::{
    read_configuration, AbsoluteDate, CatalogFrame, CatalogModels, FixedProvider, FnProvider,
    FrameError, FrameGraph, GraphConfig, PvCoordinates, Transform,
};
use log::info;
use nalgebra::{UnitQuaternion, Vector3};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::error::Error;
use std::f64::consts::TAU;
use std::sync::Arc;

const DEFAULT_CONFIG: &str = include_str!("../frames.ron");
const EARTH_RADIUS: f64 = 6_378_137.0;
const EARTH_RATE: f64 = 7.292_115_146_706_979e-5;

/// Earth rotation angle only, precession-nutation and pole motion are left out.
fn earth_models() -> CatalogModels {
    let era = FnProvider::new("earth rotation angle", |date: AbsoluteDate| {
        let days = date.j2000_seconds() / 86_400.0;
        let turns = 0.779_057_273_264_0 + 1.002_737_811_911_354_48 * days;
        Ok(Transform::from_rotation_rate(
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -turns.fract() * TAU),
            Vector3::new(0.0, 0.0, EARTH_RATE),
        ))
    });
    CatalogModels::new()
        .with_model(CatalogFrame::Irf2000A, Arc::new(FixedProvider(Transform::identity())))
        .with_model(CatalogFrame::Tirf2000A, Arc::new(era))
        .with_model(CatalogFrame::Itrf2000A, Arc::new(FixedProvider(Transform::identity())))
}

fn main() -> Result<(), Box<dyn Error>> {
    TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let config = match std::env::args().nth(1) {
        Some(path) => read_configuration(&path)?,
        None => GraphConfig::from_ron(DEFAULT_CONFIG)?,
    };
    let mut graph = FrameGraph::from_config(&config)?.with_catalog_models(earth_models());
    let frame = |graph: &FrameGraph, name: &str| {
        graph
            .find(name)
            .ok_or_else(|| FrameError::UnknownFrame(name.to_string()))
    };

    let start = AbsoluteDate::from_j2000_days(9_000.0);
    let itrf = graph.catalog_frame(CatalogFrame::Itrf2000A, start)?;
    let station = graph.add_frame(
        itrf,
        "station",
        Transform::from_translation(Vector3::new(-EARTH_RADIUS, 0.0, 0.0)),
    )?;
    let spacecraft = frame(&graph, "spacecraft")?;
    let at_start = graph.transform_from_parent(spacecraft)?;

    for step in 0..6 {
        let date = start.shifted_by(120.0 * step as f64);
        graph.set_transform(spacecraft, at_start.shifted_by(date.duration_from(&start)))?;

        // the spacecraft origin seen from the station
        let seen = graph
            .transform_to(spacecraft, station, date)?
            .transform_pv(&PvCoordinates::zero());
        let range = seen.position.norm();
        let range_rate = seen.position.dot(&seen.velocity) / range;
        info!(
            "{}: range {:.3} km, range rate {:.3} m/s",
            date,
            range / 1e3,
            range_rate
        );
    }

    // calibrate the tracker mount from an attitude measured in J2000
    let mount = frame(&graph, "tracker_mount")?;
    let tracker = frame(&graph, "star_tracker")?;
    let measured = Transform::from_rotation(UnitQuaternion::from_euler_angles(0.01, 1.58, -0.02));
    graph.update_transform_from_controls(mount, graph.root(), tracker, &measured, start)?;
    let misalignment = graph.transform_from_parent(mount)?.rotation().angle();
    info!("tracker mount misalignment {:.6} rad", misalignment);

    let veis = graph.catalog_frame(CatalogFrame::Veis1950, start)?;
    let boresight = graph
        .transform_to(tracker, veis, start)?
        .transform_vector(&Vector3::z());
    info!("tracker boresight in VEIS1950: {:.6?}", boresight.as_slice());

    Ok(())
}
