use log::{debug, error, info, warn};
use std::mem;
use thiserror::Error;

use crate::{
    canvas::Canvas,
    config::{DEFAULT_WINDOW_CENTER, DEFAULT_WINDOW_WIDTH, ViewerConfig},
    crosshair,
    decode::{ImageDecodeService, ViewportError},
    display::DisplaySequencer,
    enums::{CursorState, Plane},
    scheduler::{Scheduler, TimerHandle},
    stack::Stack,
    stack_loader::{SourceFile, StackLoader},
    window_level::{WindowLevel, WindowLevelController},
};

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("No usable images for the {0} plane")]
    EmptyStack(Plane),

    #[error("The {plane} viewport is not laid out yet ({width}x{height})")]
    LayoutNotReady {
        plane: Plane,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    pub cursor: usize,
    pub window: WindowLevel,
    pub playback: Option<TimerHandle>,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            cursor: 0,
            window: WindowLevel::new(DEFAULT_WINDOW_CENTER, DEFAULT_WINDOW_WIDTH),
            playback: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaneState {
    pub stack: Stack,
    pub viewport: ViewportState,
}

impl PlaneState {
    fn new(stack: Stack) -> Self {
        let viewport = ViewportState {
            cursor: stack.middle_index(),
            ..Default::default()
        };
        Self { stack, viewport }
    }

    pub fn cursor_state(&self) -> CursorState {
        if self.stack.is_empty() {
            CursorState::Idle
        } else {
            CursorState::Ready
        }
    }
}

/// Everything that belongs to one loaded study. Replaced as a whole on every
/// load, never patched field by field.
#[derive(Debug, Clone, Default)]
pub struct DualViewerState {
    pub axial: PlaneState,
    pub sagittal: PlaneState,
}

impl DualViewerState {
    /// Both cursors start on the middle slice.
    pub fn new(axial: Stack, sagittal: Stack) -> Self {
        Self {
            axial: PlaneState::new(axial),
            sagittal: PlaneState::new(sagittal),
        }
    }

    pub fn plane(&self, plane: Plane) -> &PlaneState {
        match plane {
            Plane::Axial => &self.axial,
            Plane::Sagittal => &self.sagittal,
        }
    }

    pub fn plane_mut(&mut self, plane: Plane) -> &mut PlaneState {
        match plane {
            Plane::Axial => &mut self.axial,
            Plane::Sagittal => &mut self.sagittal,
        }
    }
}

/// Current crosshair placement in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Crosshairs {
    pub axial_x: Option<f64>,
    pub sagittal_y: Option<f64>,
}

/// Two synchronized viewports over an axial and a sagittal stack.
///
/// All methods take `&mut self`, so a plane never has more than one paint in
/// flight, and a cursor is only committed once its slice painted.
pub struct DualViewer<D: ImageDecodeService, S: Scheduler> {
    service: D,
    scheduler: S,
    config: ViewerConfig,
    state: DualViewerState,
    axial_canvas: Canvas,
    sagittal_canvas: Canvas,
    window_drag: WindowLevelController,
    pending_resizes: Vec<(TimerHandle, Plane)>,
}

impl<D: ImageDecodeService, S: Scheduler> DualViewer<D, S> {
    pub fn new(service: D, scheduler: S, config: ViewerConfig) -> Self {
        Self::with_canvases(
            service,
            scheduler,
            config,
            Canvas::new("axial"),
            Canvas::new("sagittal"),
        )
    }

    pub fn with_canvases(
        service: D,
        scheduler: S,
        config: ViewerConfig,
        axial_canvas: Canvas,
        sagittal_canvas: Canvas,
    ) -> Self {
        Self {
            service,
            scheduler,
            config: config.sanitized(),
            state: DualViewerState::default(),
            axial_canvas,
            sagittal_canvas,
            window_drag: WindowLevelController::new(),
            pending_resizes: Vec::new(),
        }
    }

    pub fn service(&self) -> &D {
        &self.service
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &DualViewerState {
        &self.state
    }

    pub fn canvas(&self, plane: Plane) -> &Canvas {
        match plane {
            Plane::Axial => &self.axial_canvas,
            Plane::Sagittal => &self.sagittal_canvas,
        }
    }

    pub fn canvas_mut(&mut self, plane: Plane) -> &mut Canvas {
        match plane {
            Plane::Axial => &mut self.axial_canvas,
            Plane::Sagittal => &mut self.sagittal_canvas,
        }
    }

    pub fn cursor(&self, plane: Plane) -> usize {
        self.state.plane(plane).viewport.cursor
    }

    pub fn window(&self, plane: Plane) -> WindowLevel {
        self.state.plane(plane).viewport.window
    }

    pub fn cursor_state(&self, plane: Plane) -> CursorState {
        self.state.plane(plane).cursor_state()
    }

    pub fn is_playing(&self, plane: Plane) -> bool {
        self.state.plane(plane).viewport.playback.is_some()
    }

    pub fn pending_resizes(&self) -> usize {
        self.pending_resizes.len()
    }

    /// Load a study and paint the middle slice of both planes.
    ///
    /// The previous study is cleared first. Both stacks load concurrently and
    /// both must finish before anything is painted.
    ///
    /// # Errors
    ///
    /// [`ViewerError::EmptyStack`] if either plane has no usable image,
    /// [`ViewerError::LayoutNotReady`] if a viewport measured zero when it was
    /// about to be painted.
    pub async fn load_dual_series(
        &mut self,
        axial_files: Vec<SourceFile>,
        sagittal_files: Vec<SourceFile>,
    ) -> Result<(), ViewerError> {
        self.clear();

        if axial_files.is_empty() {
            return Err(ViewerError::EmptyStack(Plane::Axial));
        }
        if sagittal_files.is_empty() {
            return Err(ViewerError::EmptyStack(Plane::Sagittal));
        }

        let loader = StackLoader::new(&self.service, &self.scheduler)
            .with_extractor(self.config.metadata_extractor());
        let (axial, sagittal) = futures::join!(
            loader.load(Plane::Axial, axial_files),
            loader.load(Plane::Sagittal, sagittal_files),
        );
        if axial.is_empty() {
            return Err(ViewerError::EmptyStack(Plane::Axial));
        }
        if sagittal.is_empty() {
            return Err(ViewerError::EmptyStack(Plane::Sagittal));
        }

        self.state = DualViewerState::new(axial, sagittal);
        info!(
            "study loaded: {} axial / {} sagittal slices, starting at {} / {}",
            self.state.axial.stack.len(),
            self.state.sagittal.stack.len(),
            self.state.axial.viewport.cursor,
            self.state.sagittal.viewport.cursor,
        );

        let (Some(axial_handle), Some(sagittal_handle)) = (
            self.state.axial.stack.handle(self.state.axial.viewport.cursor).cloned(),
            self.state.sagittal.stack.handle(self.state.sagittal.viewport.cursor).cloned(),
        ) else {
            return Err(ViewerError::EmptyStack(Plane::Axial));
        };

        let sequencer = DisplaySequencer::new(&self.service, &self.scheduler, &self.config);
        let (axial_shown, sagittal_shown) = futures::join!(
            sequencer.show_and_paint(
                Plane::Axial,
                &mut self.axial_canvas,
                &mut self.state.axial.viewport,
                &axial_handle,
                true,
            ),
            sequencer.show_and_paint(
                Plane::Sagittal,
                &mut self.sagittal_canvas,
                &mut self.state.sagittal.viewport,
                &sagittal_handle,
                true,
            ),
        );

        let mut first_error = None;
        for (plane, shown) in [(Plane::Axial, axial_shown), (Plane::Sagittal, sagittal_shown)] {
            match shown {
                Ok(timer) => self.pending_resizes.push((timer, plane)),
                Err(err) => {
                    error!("{err}");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        self.update_crosshairs();
        Ok(())
    }

    /// Move one slice forward. Stops at the last slice.
    pub fn advance(&mut self, plane: Plane) -> bool {
        let plane_state = self.state.plane(plane);
        let next = plane_state.viewport.cursor + 1;
        if next >= plane_state.stack.len() {
            debug!("{plane}: already at the last slice");
            return false;
        }
        self.move_cursor(plane, next)
    }

    /// Move one slice back. Stops at the first slice.
    pub fn retreat(&mut self, plane: Plane) -> bool {
        let plane_state = self.state.plane(plane);
        if plane_state.stack.is_empty() || plane_state.viewport.cursor == 0 {
            debug!("{plane}: already at the first slice");
            return false;
        }
        let previous = plane_state.viewport.cursor - 1;
        self.move_cursor(plane, previous)
    }

    /// Jump to `index`, clamped into the stack.
    pub fn jump(&mut self, plane: Plane, index: usize) -> bool {
        let stack = &self.state.plane(plane).stack;
        if stack.is_empty() {
            return false;
        }
        let index = stack.clamp_index(index);
        self.move_cursor(plane, index)
    }

    fn move_cursor(&mut self, plane: Plane, index: usize) -> bool {
        if !self.paint_slice(plane, index) {
            return false;
        }
        self.state.plane_mut(plane).viewport.cursor = index;
        debug!("{plane}: cursor at {index}");
        self.update_crosshairs();
        true
    }

    // Failures are logged and leave the canvas as it was.
    fn paint_slice(&mut self, plane: Plane, index: usize) -> bool {
        let (plane_state, canvas) = match plane {
            Plane::Axial => (&self.state.axial, &mut self.axial_canvas),
            Plane::Sagittal => (&self.state.sagittal, &mut self.sagittal_canvas),
        };
        let Some(handle) = plane_state.stack.handle(index) else {
            return false;
        };
        let window = plane_state.viewport.window;
        let painted = self
            .service
            .decode(handle.id)
            .map_err(ViewportError::from)
            .and_then(|image| self.service.paint(canvas, &image, window));
        match painted {
            Ok(()) => true,
            Err(err) => {
                warn!("{plane}: painting {} failed: {err}", handle.filename);
                false
            }
        }
    }

    pub fn crosshairs(&self) -> Crosshairs {
        Crosshairs {
            axial_x: crosshair::axial_vertical_x(
                self.state.sagittal.viewport.cursor,
                self.state.sagittal.stack.len(),
                self.axial_canvas.size().width,
            ),
            sagittal_y: crosshair::sagittal_horizontal_y(
                self.state.axial.viewport.cursor,
                self.state.axial.stack.len(),
                self.sagittal_canvas.size().height,
            ),
        }
    }

    /// Redraw both crosshair overlays from the current cursors.
    pub fn update_crosshairs(&mut self) {
        let crosshairs = self.crosshairs();
        self.axial_canvas.clear_overlay();
        self.sagittal_canvas.clear_overlay();
        if let Some(x) = crosshairs.axial_x {
            self.axial_canvas
                .draw_vertical_dashed(x, &self.config.crosshair);
        }
        if let Some(y) = crosshairs.sagittal_y {
            self.sagittal_canvas
                .draw_horizontal_dashed(y, &self.config.crosshair);
        }
    }

    /// Start cine playback on `plane`. A running timer is replaced, never
    /// duplicated.
    pub fn play(&mut self, plane: Plane) {
        if self.state.plane(plane).stack.is_empty() {
            debug!("{plane}: nothing to play");
            return;
        }
        self.stop(plane);
        let timer = self
            .scheduler
            .schedule_interval(self.config.playback_period());
        self.state.plane_mut(plane).viewport.playback = Some(timer);
        info!("{plane}: playback started at {} fps", self.config.playback_fps);
    }

    pub fn stop(&mut self, plane: Plane) {
        if let Some(timer) = self.state.plane_mut(plane).viewport.playback.take() {
            self.scheduler.cancel(timer);
            info!("{plane}: playback stopped");
        }
    }

    pub fn toggle_play(&mut self, plane: Plane) {
        if self.is_playing(plane) {
            self.stop(plane);
        } else {
            self.play(plane);
        }
    }

    // Unlike `advance`, playback wraps to the first slice.
    fn playback_step(&mut self, plane: Plane) {
        let plane_state = self.state.plane(plane);
        let next = plane_state.viewport.cursor + 1;
        let next = if next >= plane_state.stack.len() { 0 } else { next };
        self.move_cursor(plane, next);
    }

    /// Handle a fired timer: a playback tick or a deferred resize pass.
    pub fn on_timer(&mut self, timer: TimerHandle) {
        if let Some(plane) = Plane::ALL
            .into_iter()
            .find(|plane| self.state.plane(*plane).viewport.playback == Some(timer))
        {
            self.playback_step(plane);
            return;
        }
        if let Some(position) = self.pending_resizes.iter().position(|(t, _)| *t == timer) {
            let (timer, plane) = self.pending_resizes.remove(position);
            self.scheduler.cancel(timer);
            self.force_resize(plane);
            return;
        }
        debug!("ignoring stale timer {}", timer.0);
    }

    /// Wait out the settle delay and run every pending resize pass now.
    pub async fn settle(&mut self) {
        if self.pending_resizes.is_empty() {
            return;
        }
        self.scheduler.delay(self.config.settle_delay()).await;
        for (timer, plane) in mem::take(&mut self.pending_resizes) {
            self.scheduler.cancel(timer);
            self.force_resize(plane);
        }
    }

    fn force_resize(&mut self, plane: Plane) {
        let canvas = match plane {
            Plane::Axial => &mut self.axial_canvas,
            Plane::Sagittal => &mut self.sagittal_canvas,
        };
        if let Err(err) = self.service.resize(canvas, true) {
            warn!("{plane}: resize failed: {err}");
            return;
        }
        let cursor = self.cursor(plane);
        self.paint_slice(plane, cursor);
        self.update_crosshairs();
    }

    pub fn begin_window_drag(&mut self, plane: Plane) {
        if self.state.plane(plane).stack.is_empty() {
            return;
        }
        let current = self.window(plane);
        self.window_drag.begin_drag(plane, current);
    }

    /// Apply a drag delta measured from where the gesture began. Only the
    /// dragged plane changes.
    pub fn drag_window(&mut self, plane: Plane, delta_x: f64, delta_y: f64) -> bool {
        let Some(window) = self.window_drag.on_drag(plane, delta_x, delta_y) else {
            return false;
        };
        self.state.plane_mut(plane).viewport.window = window;
        let cursor = self.cursor(plane);
        self.paint_slice(plane, cursor);
        true
    }

    pub fn end_window_drag(&mut self) {
        self.window_drag.end_drag();
    }

    /// Stop playback, drop pending resizes, forget the loaded study and hide
    /// both canvases until the next load shows them.
    pub fn clear(&mut self) {
        for plane in Plane::ALL {
            self.stop(plane);
        }
        for (timer, _) in self.pending_resizes.drain(..) {
            self.scheduler.cancel(timer);
        }
        self.window_drag.end_drag();
        self.state = DualViewerState::default();
        self.axial_canvas.clear();
        self.axial_canvas.hide();
        self.sagittal_canvas.clear();
        self.sagittal_canvas.hide();
    }
}

impl<D: ImageDecodeService, S: Scheduler> Drop for DualViewer<D, S> {
    fn drop(&mut self) {
        for plane in Plane::ALL {
            if let Some(timer) = self.state.plane_mut(plane).viewport.playback.take() {
                self.scheduler.cancel(timer);
            }
        }
        for (timer, _) in self.pending_resizes.drain(..) {
            self.scheduler.cancel(timer);
        }
    }
}
