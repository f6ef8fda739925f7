//! # DICOM-dualview library
//!
//! This crate keeps two independently acquired DICOM stacks, an axial and a
//! sagittal series, in step with each other.

//!
//! Each plane has its own cursor. Whenever a cursor moves, the other plane's
//! viewport gets a dashed crosshair marking where the current slice would
//! cut through it. The crosshair is placed by index proportion
//! (`cursor / (len - 1)` of the canvas extent), not by patient-space
//! geometry, so it assumes evenly spaced stacks covering the same extent.
//!
//! The viewer is written against two seams:
//!  - [`ImageDecodeService`] registers raw DICOM bytes, decodes them and
//!    paints them onto a [`Canvas`]. [`DicomDecodeService`] implements it on
//!    top of the dicom-rs ecosystem.
//!  - [`Scheduler`] provides the "wait one tick", "wait a bit" and timer
//!    primitives. [`TokioScheduler`] implements it on the tokio runtime.
//!
//!  Everything runs on a single thread. Both stacks are loaded concurrently
//!  by cooperative interleaving and are joined before the first paint.
//!
//! # Examples
//!
//! ## Loading a study and stepping through it
//!
//! ```no_run
//! # use dicom_dualview::{DualViewer, DicomDecodeService, TokioScheduler, Plane, ViewerConfig};
//! # use dicom_dualview::stack_loader::read_directory;
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (scheduler, mut timers) = TokioScheduler::new();
//! let mut viewer = DualViewer::new(DicomDecodeService::new(), scheduler, ViewerConfig::default());
//! viewer
//!     .load_dual_series(read_directory("study/axial")?, read_directory("study/sagittal")?)
//!     .await?;
//! viewer.advance(Plane::Axial);
//! viewer.play(Plane::Sagittal);
//! while let Some(timer) = timers.recv().await {
//!     viewer.on_timer(timer);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`Canvas`]: canvas::Canvas

pub mod canvas;
pub mod config;
pub mod crosshair;
pub mod decode;
pub mod dicom_service;
pub mod display;
pub mod dual_viewer;
pub mod enums;
pub mod input;
pub mod metadata;
pub mod scheduler;
pub mod stack;
pub mod stack_loader;
pub mod window_level;

pub use config::ViewerConfig;
pub use decode::{DecodedImage, ImageDecodeService, ImageId};
pub use dicom_service::DicomDecodeService;
pub use dual_viewer::{DualViewer, ViewerError};
pub use enums::Plane;
pub use scheduler::{Scheduler, TimerHandle, TokioScheduler};
pub use stack_loader::SourceFile;
