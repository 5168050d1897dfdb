use bevy::prelude::*;
use bevy::window::{MonitorSelection, WindowMode};

/// A surface that can be switched in and out of fullscreen presentation.
pub trait PresentationSurface {
    fn is_fullscreen(&self) -> bool;

    /// Ask the platform for fullscreen. Returns false when it refuses.
    fn request_fullscreen(&mut self) -> bool;

    fn exit_fullscreen(&mut self);
}

impl PresentationSurface for Window {
    fn is_fullscreen(&self) -> bool {
        !matches!(self.mode, WindowMode::Windowed)
    }

    fn request_fullscreen(&mut self) -> bool {
        self.mode = WindowMode::BorderlessFullscreen(MonitorSelection::Current);
        true
    }

    fn exit_fullscreen(&mut self) {
        self.mode = WindowMode::Windowed;
    }
}

/// Flip fullscreen on `surface` and return the resulting state. A refused
/// request leaves the surface as it was.
pub fn toggle_fullscreen(surface: &mut dyn PresentationSurface) -> bool {
    if surface.is_fullscreen() {
        surface.exit_fullscreen();
    } else if !surface.request_fullscreen() {
        info!("Fullscreen request was denied");
    }
    surface.is_fullscreen()
}
