//! Panorama showcase core: a rotatable background with a ring of navigable
//! pillars, projected with perspective foreshortening and depth cues.
//!
//! Everything here is windowing-free; the binary wires [`Scene`] to winit,
//! wgpu and egui.

pub mod angle;
pub mod background;
pub mod config;
pub mod error;
pub mod frame;
pub mod i18n;
pub mod loader;
pub mod projection;
pub mod scene;
pub mod state;

pub use background::{BackgroundFilter, BackgroundLayout, ImageSize};
pub use config::{BackgroundPolicy, Preset, ProjectorConfig};
pub use error::{PanoError, Result};
pub use frame::FrameLayout;
pub use projection::MarkerPose;
pub use scene::{Marker, Navigate, Router, Scene};
pub use state::{CameraState, Input, Mode, PointerKind};
