//! Translation of raw input events into viewer commands.

use crate::{
    config::ViewerConfig,
    decode::ImageDecodeService,
    dual_viewer::DualViewer,
    enums::Plane,
    scheduler::Scheduler,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(Key),
    /// Positive `delta_y` scrolls towards later slices.
    Wheel { plane: Plane, delta_y: f64 },
    PointerPressed { plane: Plane },
    /// Offset from where the pointer was pressed.
    PointerDragged { plane: Plane, delta_x: f64, delta_y: f64 },
    PointerReleased,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerCommand {
    Advance(Plane),
    Retreat(Plane),
    Jump(Plane, usize),
    TogglePlay(Plane),
    BeginWindowDrag(Plane),
    DragWindow { plane: Plane, delta_x: f64, delta_y: f64 },
    EndWindowDrag,
}

/// Arrow up/down step the axial stack, left/right the sagittal stack.
/// Home/End and Space act on the configured playback plane.
pub fn translate(event: InputEvent, config: &ViewerConfig) -> Option<ViewerCommand> {
    let command = match event {
        InputEvent::KeyPressed(key) => match key {
            Key::ArrowUp => ViewerCommand::Retreat(Plane::Axial),
            Key::ArrowDown => ViewerCommand::Advance(Plane::Axial),
            Key::ArrowLeft => ViewerCommand::Retreat(Plane::Sagittal),
            Key::ArrowRight => ViewerCommand::Advance(Plane::Sagittal),
            Key::Home => ViewerCommand::Jump(config.playback_plane, 0),
            Key::End => ViewerCommand::Jump(config.playback_plane, usize::MAX),
            Key::Space => ViewerCommand::TogglePlay(config.playback_plane),
        },
        InputEvent::Wheel { plane, delta_y } if delta_y > 0.0 => ViewerCommand::Advance(plane),
        InputEvent::Wheel { plane, delta_y } if delta_y < 0.0 => ViewerCommand::Retreat(plane),
        InputEvent::Wheel { .. } => return None,
        InputEvent::PointerPressed { plane } => ViewerCommand::BeginWindowDrag(plane),
        InputEvent::PointerDragged {
            plane,
            delta_x,
            delta_y,
        } => ViewerCommand::DragWindow {
            plane,
            delta_x,
            delta_y,
        },
        InputEvent::PointerReleased => ViewerCommand::EndWindowDrag,
    };
    Some(command)
}

impl<D: ImageDecodeService, S: Scheduler> DualViewer<D, S> {
    pub fn execute(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::Advance(plane) => {
                self.advance(plane);
            }
            ViewerCommand::Retreat(plane) => {
                self.retreat(plane);
            }
            ViewerCommand::Jump(plane, index) => {
                self.jump(plane, index);
            }
            ViewerCommand::TogglePlay(plane) => self.toggle_play(plane),
            ViewerCommand::BeginWindowDrag(plane) => self.begin_window_drag(plane),
            ViewerCommand::DragWindow {
                plane,
                delta_x,
                delta_y,
            } => {
                self.drag_window(plane, delta_x, delta_y);
            }
            ViewerCommand::EndWindowDrag => self.end_window_drag(),
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        if let Some(command) = translate(event, self.config()) {
            self.execute(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_map_to_planes() {
        let config = ViewerConfig::default();
        assert_eq!(
            translate(InputEvent::KeyPressed(Key::ArrowDown), &config),
            Some(ViewerCommand::Advance(Plane::Axial))
        );
        assert_eq!(
            translate(InputEvent::KeyPressed(Key::ArrowLeft), &config),
            Some(ViewerCommand::Retreat(Plane::Sagittal))
        );
    }

    #[test]
    fn space_toggles_the_playback_plane() {
        let config = ViewerConfig {
            playback_plane: Plane::Sagittal,
            ..Default::default()
        };
        assert_eq!(
            translate(InputEvent::KeyPressed(Key::Space), &config),
            Some(ViewerCommand::TogglePlay(Plane::Sagittal))
        );
    }

    #[test]
    fn wheel_direction_picks_the_step() {
        let config = ViewerConfig::default();
        let wheel = |delta_y| InputEvent::Wheel {
            plane: Plane::Sagittal,
            delta_y,
        };
        assert_eq!(
            translate(wheel(3.0), &config),
            Some(ViewerCommand::Advance(Plane::Sagittal))
        );
        assert_eq!(
            translate(wheel(-1.0), &config),
            Some(ViewerCommand::Retreat(Plane::Sagittal))
        );
        assert_eq!(translate(wheel(0.0), &config), None);
    }
}
