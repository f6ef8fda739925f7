use log::{debug, warn};

use crate::{
    canvas::Canvas,
    config::ViewerConfig,
    decode::{DecodedImage, ImageDecodeService},
    dual_viewer::{ViewerError, ViewportState},
    enums::Plane,
    scheduler::{Scheduler, TimerHandle},
    stack::ImageHandle,
    window_level::WindowLevel,
};

/// Brings a viewport from hidden to painted.
///
/// Painting into a canvas that has not been laid out yet silently draws
/// nothing, so the order is fixed: show, yield one tick, measure, paint, then
/// schedule a forced resize for hosts that settle their size late.
pub struct DisplaySequencer<'a, D, S> {
    service: &'a D,
    scheduler: &'a S,
    config: &'a ViewerConfig,
}

impl<'a, D: ImageDecodeService, S: Scheduler> DisplaySequencer<'a, D, S> {
    pub fn new(service: &'a D, scheduler: &'a S, config: &'a ViewerConfig) -> Self {
        Self {
            service,
            scheduler,
            config,
        }
    }

    /// Returns the handle of the scheduled resize pass.
    ///
    /// # Errors
    ///
    /// [`ViewerError::LayoutNotReady`] if the canvas still measures zero
    /// after the layout tick. Nothing is painted in that case.
    pub async fn show_and_paint(
        &self,
        plane: Plane,
        canvas: &mut Canvas,
        viewport: &mut ViewportState,
        handle: &ImageHandle,
        is_first_of_stack: bool,
    ) -> Result<TimerHandle, ViewerError> {
        canvas.show(self.config.viewport_size());

        self.scheduler.yield_once().await;

        let measured = canvas.bounding_box();
        if measured.is_empty() {
            return Err(ViewerError::LayoutNotReady {
                plane,
                width: measured.width,
                height: measured.height,
            });
        }
        canvas.sync_to_layout(false);

        match self.service.decode(handle.id) {
            Ok(image) => {
                if is_first_of_stack {
                    viewport.window = self.initial_window(&image);
                    debug!("{plane}: initial window {:?}", viewport.window);
                }
                if let Err(err) = self.service.paint(canvas, &image, viewport.window) {
                    warn!("{plane}: paint of {} failed: {err}", handle.filename);
                }
            }
            Err(err) => {
                warn!("{plane}: cannot display {}: {err}", handle.filename);
                if is_first_of_stack {
                    viewport.window = self.config.default_window;
                }
            }
        }

        Ok(self.scheduler.schedule_once(self.config.settle_delay()))
    }

    /// The image's own window if it carries one, otherwise the configured
    /// fallback.
    pub fn initial_window(&self, image: &DecodedImage) -> WindowLevel {
        image.window.unwrap_or(self.config.default_window)
    }
}
