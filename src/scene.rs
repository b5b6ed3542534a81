// scene.rs - the projector component: config, pillar ring and camera in one owner

use std::f32::consts::TAU;
use std::path::PathBuf;

use glam::Vec2;

use crate::background::ImageSize;
use crate::config::ProjectorConfig;
use crate::frame::FrameLayout;
use crate::state::{CameraState, Input};

/// One navigable pillar on the ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub base_yaw: f32,
    pub pitch: f32,
    pub label: String,
    pub url: Option<String>,
    pub image: Option<PathBuf>,
}

impl Marker {
    /// Evenly spaced ring of `cfg.pillars.count` pillars, filled from the project table.
    pub fn ring(cfg: &ProjectorConfig) -> Vec<Marker> {
        let count = cfg.pillars.count;
        (0..count)
            .map(|i| {
                let base_yaw = (i as f32 / count as f32) * TAU;
                match cfg.projects.get(i % cfg.projects.len().max(1)) {
                    Some(p) => Marker {
                        base_yaw,
                        pitch: cfg.pillars.pitch,
                        label: p.label.clone(),
                        url: p.url.clone().filter(|u| !u.trim().is_empty()),
                        image: p.image.clone(),
                    },
                    None => Marker {
                        base_yaw,
                        pitch: cfg.pillars.pitch,
                        label: format!("P{}", i + 1),
                        url: None,
                        image: None,
                    },
                }
            })
            .collect()
    }
}

/// One-shot request to leave the scene for a pillar's target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigate {
    pub marker: usize,
    pub url: String,
}

/// Receives navigation requests emitted when a zoom completes.
pub trait Router {
    fn navigate(&mut self, request: &Navigate);
}

pub struct Scene {
    config: ProjectorConfig,
    markers: Vec<Marker>,
    camera: CameraState,
}

impl Scene {
    pub fn new(config: ProjectorConfig) -> Self {
        let markers = Marker::ring(&config);
        Self {
            config,
            markers,
            camera: CameraState::new(),
        }
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// Runtime tweaks (autoplay toggle, sensitivity slider) that keep the ring intact.
    pub fn config_mut(&mut self) -> &mut ProjectorConfig {
        &mut self.config
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// Swap to a new configuration, rebuilding the ring and resetting the camera.
    pub fn replace_config(&mut self, config: ProjectorConfig) {
        self.markers = Marker::ring(&config);
        self.config = config;
        self.camera = CameraState::new();
    }

    pub fn reset_view(&mut self) {
        self.camera = CameraState::new();
    }

    /// Feed one input at wall-clock time `now` (seconds).
    pub fn handle(&mut self, input: Input, now: f64) -> Option<Navigate> {
        self.camera.update(&self.config, &self.markers, input, now)
    }

    /// Like [`Scene::handle`], forwarding any navigation to `router`.
    pub fn handle_with(&mut self, input: Input, now: f64, router: &mut dyn Router) {
        if let Some(request) = self.handle(input, now) {
            router.navigate(&request);
        }
    }

    pub fn layout(&self, viewport: Vec2, image: Option<ImageSize>) -> FrameLayout {
        FrameLayout::compose(&self.config, &self.markers, &self.camera, viewport, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn eight_pillars_sit_at_quarter_pi_steps() {
        let markers = Marker::ring(&Preset::Showcase.config());
        assert_eq!(markers.len(), 8);
        for (i, m) in markers.iter().enumerate() {
            assert_relative_eq!(m.base_yaw, i as f32 * PI / 4.0, epsilon = 1e-6);
        }
        assert_eq!(markers[2].label, "P3");
        assert_eq!(markers[2].url.as_deref(), Some("proj3.html"));
    }

    #[test]
    fn empty_project_table_gives_inert_numbered_pillars() {
        let markers = Marker::ring(&Preset::Static.config());
        assert_eq!(markers.len(), 8);
        assert_eq!(markers[7].label, "P8");
        assert!(markers.iter().all(|m| m.url.is_none()));
    }

    #[test]
    fn project_table_wraps_and_blank_urls_are_inert() {
        let mut cfg = Preset::Showcase.config();
        cfg.pillars.count = 10;
        cfg.projects.truncate(3);
        cfg.projects[1].url = Some("  ".into());
        let markers = Marker::ring(&cfg);
        assert_eq!(markers[3].label, "P1");
        assert_eq!(markers[9].label, "P1");
        assert!(markers[1].url.is_none());
        assert!(markers[4].url.is_none());
    }

    #[test]
    fn replace_config_rebuilds_ring() {
        let mut scene = Scene::new(Preset::Showcase.config());
        let mut cfg = Preset::Classic.config();
        cfg.pillars.count = 5;
        scene.replace_config(cfg);
        assert_eq!(scene.markers().len(), 5);
        assert_eq!(scene.camera().yaw, 0.0);
    }
}
