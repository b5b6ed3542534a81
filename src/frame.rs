// frame.rs - read-only snapshot of everything one frame has to draw

use std::f32::consts::TAU;

use glam::Vec2;

use crate::angle::lerp;
use crate::background::{BackgroundFilter, BackgroundLayout, Gradient, ImageSize};
use crate::config::ProjectorConfig;
use crate::projection::{locked_yaw_to_x, MarkerPose};
use crate::scene::Marker;
use crate::state::CameraState;

/// Pillars this faint are neither drawn nor clickable.
const MIN_VISIBLE_OPACITY: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    pub viewport: Vec2,
    pub background: BackgroundLayout,
    pub filter: BackgroundFilter,
    /// Full-screen black overlay, only non-zero at the tail of a zoom.
    pub fader_opacity: f32,
    /// Sorted by ascending z-index, i.e. paint order.
    pub poses: Vec<MarkerPose>,
    pillar_size: Vec2,
    perspective: f32,
}

impl FrameLayout {
    pub fn compose(
        cfg: &ProjectorConfig,
        markers: &[Marker],
        camera: &CameraState,
        viewport: Vec2,
        image: Option<ImageSize>,
    ) -> Self {
        let background = BackgroundLayout::compute(
            cfg.background.policy,
            Gradient::from_config(&cfg.background),
            image,
            viewport,
            camera.scroll_total(),
        );

        // locked pillars share the tiles' linear mapping instead of the tan projection
        let locked_px_per_radian = match &background {
            BackgroundLayout::Tiled { draw_size, .. } if cfg.markers_follow_background() => {
                Some(draw_size.x / TAU)
            }
            _ => None,
        };

        let zoom = camera.zoom();
        let t = zoom.map_or(0.0, |z| z.progress.clamp(0.0, 1.0));
        let zc = &cfg.zoom;

        let mut poses: Vec<MarkerPose> = markers
            .iter()
            .enumerate()
            .map(|(i, marker)| {
                let rel = camera.rel_yaw(cfg, marker);
                let mut pose = MarkerPose::compute(cfg, i, rel, marker.pitch, viewport);
                if let Some(ppr) = locked_px_per_radian {
                    pose.anchor.x = locked_yaw_to_x(rel, viewport.x, ppr);
                }

                match zoom {
                    Some(z) if z.marker == i => {
                        pose.scale *= lerp(1.0, zc.max_scale, t);
                        pose.translate_z = lerp(0.0, zc.max_translate_z, t);
                        pose.z_index += zc.z_index_boost;
                    }
                    Some(_) => pose.opacity *= lerp(1.0, zc.dim_others, t),
                    None if camera.hovered == Some(i) => {
                        pose.hovered = true;
                        pose.scale *= cfg.depth.hover_boost;
                    }
                    None => {}
                }
                pose
            })
            .collect();
        poses.sort_by_key(|p| p.z_index);

        let (filter, fader_opacity) = match zoom {
            Some(_) => {
                let fader = if t > zc.fader_start {
                    ((t - zc.fader_start) / (1.0 - zc.fader_start)).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                (BackgroundFilter::for_zoom(zc, t), fader)
            }
            None => (BackgroundFilter::NONE, 0.0),
        };

        Self {
            viewport,
            background,
            filter,
            fader_opacity,
            poses,
            pillar_size: Vec2::new(cfg.pillars.width, cfg.pillars.height),
            perspective: cfg.pillars.perspective_px,
        }
    }

    /// Index of the topmost visible pillar under `point`, if any.
    pub fn hit_test(&self, point: Vec2) -> Option<usize> {
        self.poses
            .iter()
            .rev()
            .filter(|p| p.opacity > MIN_VISIBLE_OPACITY)
            .find(|p| {
                let (min, max) = self.bounds(p);
                point.cmpge(min).all() && point.cmple(max).all()
            })
            .map(|p| p.index)
    }

    pub fn bounds(&self, pose: &MarkerPose) -> (Vec2, Vec2) {
        pose.bounds(self.pillar_size, self.perspective)
    }

    pub fn pose(&self, index: usize) -> Option<&MarkerPose> {
        self.poses.iter().find(|p| p.index == index)
    }

    pub fn visible_poses(&self) -> impl Iterator<Item = &MarkerPose> {
        self.poses
            .iter()
            .filter(|p| p.opacity > MIN_VISIBLE_OPACITY)
    }
}
