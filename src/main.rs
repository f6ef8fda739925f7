use std::{env, process::ExitCode};

use dicom_dualview::{
    DicomDecodeService, DualViewer, Plane, TokioScheduler, ViewerConfig,
    stack_loader::read_directory,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (axial_dir, sagittal_dir) = match args.as_slice() {
        [axial, sagittal, ..] => (axial, sagittal),
        _ => {
            eprintln!("usage: dicom-dualview <axial_dir> <sagittal_dir> [config.toml]");
            return ExitCode::FAILURE;
        }
    };
    let config = match args.get(2) {
        Some(path) => match ViewerConfig::load_from_path(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => ViewerConfig::default(),
    };

    let study = (read_directory(axial_dir), read_directory(sagittal_dir));
    let (axial_files, sagittal_files) = match study {
        (Ok(axial), Ok(sagittal)) => (axial, sagittal),
        (Err(err), _) | (_, Err(err)) => {
            log::error!("cannot read study: {err}");
            return ExitCode::FAILURE;
        }
    };

    let (scheduler, _timers) = TokioScheduler::new();
    let mut viewer = DualViewer::new(DicomDecodeService::new(), scheduler, config);
    if let Err(err) = viewer.load_dual_series(axial_files, sagittal_files).await {
        log::error!("{err}");
        return ExitCode::FAILURE;
    }
    viewer.settle().await;

    for plane in Plane::ALL {
        let path = format!("{plane}.png");
        if let Err(err) = viewer.canvas(plane).composite().save(&path) {
            log::error!("{path}: {err}");
            return ExitCode::FAILURE;
        }
        log::info!("{plane} slice {} written to {path}", viewer.cursor(plane));
    }
    ExitCode::SUCCESS
}
