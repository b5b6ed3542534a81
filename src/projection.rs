// projection.rs - yaw to screen mapping and the per-pillar depth cues

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;

use crate::angle::smoothstep;
use crate::config::ProjectorConfig;

/// Perspective projection of a relative yaw onto a screen x coordinate.
///
/// Past the outer fade threshold the result pins to the left or right edge so
/// the tangent never reaches its asymptote.
pub fn project_yaw_to_x(rel: f32, width: f32, hfov: f32, outer: f32) -> f32 {
    if rel.abs() >= outer {
        return if rel > 0.0 { width } else { 0.0 };
    }
    let half = width / 2.0;
    let nx = rel.tan() / (hfov / 2.0).tan();
    half + nx * half
}

/// Linear placement for pillars riding a scrolling panorama: the image's own
/// pixels per radian, with the camera heading at the centre column.
pub fn locked_yaw_to_x(rel: f32, width: f32, px_per_radian: f32) -> f32 {
    width / 2.0 + rel * px_per_radian
}

/// 0 at the centre of view (far), 1 at the field of view edge (near).
pub fn depth(rel: f32, hfov: f32) -> f32 {
    let edge_frac = (rel.abs() / hfov).clamp(0.0, 1.0);
    (edge_frac * FRAC_PI_2).sin()
}

/// 1 inside `inner`, 0 past `outer`, smooth in between.
pub fn edge_fade(rel: f32, inner: f32, outer: f32) -> f32 {
    1.0 - smoothstep(inner, outer, rel.abs())
}

/// Everything the painter needs to place one pillar.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPose {
    pub index: usize,
    pub rel: f32,
    /// Bottom-centre anchor of the pillar, in viewport pixels.
    pub anchor: Vec2,
    pub depth: f32,
    pub fade: f32,
    pub scale: f32,
    pub opacity: f32,
    pub rot_y_deg: f32,
    pub translate_z: f32,
    pub z_index: i32,
    pub plinth_width: f32,
    pub plinth_opacity: f32,
    /// Opacity of the capsule's top highlight and bottom shade.
    pub shade_opacity: f32,
    pub hovered: bool,
}

impl MarkerPose {
    /// Pose of pillar `index` seen at relative yaw `rel`, before any zoom or hover treatment.
    pub fn compute(
        cfg: &ProjectorConfig,
        index: usize,
        rel: f32,
        pitch: f32,
        viewport: Vec2,
    ) -> Self {
        let hfov = cfg.hfov();
        let style = &cfg.depth;
        let pillars = &cfg.pillars;

        let x = project_yaw_to_x(rel, viewport.x, hfov, cfg.fade_outer());
        let y = viewport.y * pillars.horizon + pitch * (viewport.y * pillars.pitch_gain);

        let depth = depth(rel, hfov);
        let fade = edge_fade(rel, cfg.fade_inner(), cfg.fade_outer());

        Self {
            index,
            rel,
            anchor: Vec2::new(x, y),
            depth,
            fade,
            scale: style.scale_base + style.scale_gain * depth,
            opacity: (style.opacity_base + style.opacity_gain * depth) * fade,
            rot_y_deg: -rel.to_degrees() * style.rotation_factor,
            translate_z: 0.0,
            z_index: style.z_base + (depth * style.z_range).round() as i32,
            plinth_width: pillars.plinth_base + pillars.plinth_gain * depth,
            plinth_opacity: (0.25 + 0.55 * depth) * fade,
            shade_opacity: 0.75 + 0.25 * depth,
            hovered: false,
        }
    }

    /// Apparent size multiplier from translate-z under a pinhole camera `perspective` px away.
    pub fn perspective_factor(&self, perspective: f32) -> f32 {
        if self.translate_z <= 0.0 || perspective <= 0.0 {
            return 1.0;
        }
        perspective / (perspective - self.translate_z).max(perspective * 0.05)
    }

    /// Screen rectangle `(min, max)` of a `pillar_size` capsule, anchored at
    /// its bottom centre and narrowed by its turn about the vertical axis.
    pub fn bounds(&self, pillar_size: Vec2, perspective: f32) -> (Vec2, Vec2) {
        let s = self.scale * self.perspective_factor(perspective);
        let turn = self.rot_y_deg.to_radians().cos().abs();
        let size = Vec2::new(pillar_size.x * s * turn, pillar_size.y * s);
        (
            Vec2::new(self.anchor.x - size.x / 2.0, self.anchor.y - size.y),
            Vec2::new(self.anchor.x + size.x / 2.0, self.anchor.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    const HFOV: f32 = FRAC_PI_2;
    const OUTER: f32 = HFOV * 0.995;
    const INNER: f32 = HFOV * 0.92;

    #[test]
    fn centre_of_view_projects_to_middle() {
        assert_eq!(project_yaw_to_x(0.0, 800.0, HFOV, OUTER), 400.0);
        // half the fov lands exactly on the edge
        assert_relative_eq!(
            project_yaw_to_x(HFOV / 2.0, 800.0, HFOV, OUTER),
            800.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn saturates_at_clamp() {
        assert_eq!(project_yaw_to_x(OUTER, 640.0, HFOV, OUTER), 640.0);
        assert_eq!(project_yaw_to_x(-OUTER, 640.0, HFOV, OUTER), 0.0);
        assert_eq!(project_yaw_to_x(3.0, 640.0, HFOV, OUTER), 640.0);
        assert_eq!(project_yaw_to_x(-3.0, 640.0, HFOV, OUTER), 0.0);
    }

    #[test]
    fn depth_endpoints() {
        assert_eq!(depth(0.0, HFOV), 0.0);
        assert_relative_eq!(depth(HFOV, HFOV), 1.0);
        assert_relative_eq!(depth(-HFOV, HFOV), 1.0);
        assert_relative_eq!(depth(2.5, HFOV), 1.0);
    }

    #[test]
    fn fade_plateaus() {
        assert_eq!(edge_fade(0.0, INNER, OUTER), 1.0);
        assert_eq!(edge_fade(INNER, INNER, OUTER), 1.0);
        assert_eq!(edge_fade(-INNER, INNER, OUTER), 1.0);
        assert_eq!(edge_fade(OUTER, INNER, OUTER), 0.0);
        assert_eq!(edge_fade(2.0, INNER, OUTER), 0.0);
    }

    #[test]
    fn pose_straight_ahead() {
        let cfg = crate::config::Preset::Static.config();
        let pose = MarkerPose::compute(&cfg, 0, 0.0, -0.05, Vec2::new(1000.0, 500.0));
        assert_eq!(pose.anchor.x, 500.0);
        assert_relative_eq!(pose.anchor.y, 500.0 * 0.66 - 0.05 * 600.0, epsilon = 1e-3);
        assert_eq!(pose.depth, 0.0);
        assert_relative_eq!(pose.scale, 0.72);
        assert_relative_eq!(pose.opacity, 0.6);
        assert_eq!(pose.z_index, 1000);
        assert_eq!(pose.rot_y_deg, 0.0);
        assert_relative_eq!(pose.plinth_width, 220.0);
    }

    #[test]
    fn turned_pose_faces_camera() {
        let cfg = crate::config::Preset::Static.config();
        let pose = MarkerPose::compute(&cfg, 1, 0.5, 0.0, Vec2::new(1000.0, 500.0));
        assert!(pose.anchor.x > 500.0);
        assert_relative_eq!(pose.rot_y_deg, -0.5f32.to_degrees() * 0.55, epsilon = 1e-4);
        assert!(pose.z_index > 1000);

        let (min, max) = pose.bounds(Vec2::new(170.0, 260.0), 1200.0);
        assert_relative_eq!(max.y, pose.anchor.y);
        assert!(max.x - min.x < cfg.pillars.width * pose.scale);
    }

    #[test]
    fn perspective_grows_with_translate_z() {
        let cfg = crate::config::ProjectorConfig::default();
        let mut pose = MarkerPose::compute(&cfg, 0, 0.0, 0.0, Vec2::new(800.0, 600.0));
        assert_eq!(pose.perspective_factor(1200.0), 1.0);
        pose.translate_z = 600.0;
        assert_relative_eq!(pose.perspective_factor(1200.0), 2.0);
        pose.translate_z = 5000.0;
        assert!(pose.perspective_factor(1200.0).is_finite());
    }

    proptest! {
        #[test]
        fn projection_is_finite_and_monotonic(a in -OUTER..OUTER, b in -OUTER..OUTER) {
            // tan' >= 1, so a milliradian apart is well over a float step at this width
            prop_assume!(b - a > 1e-3);
            let xa = project_yaw_to_x(a, 1280.0, HFOV, OUTER);
            let xb = project_yaw_to_x(b, 1280.0, HFOV, OUTER);
            prop_assert!(xa.is_finite() && xb.is_finite());
            prop_assert!(xa < xb, "x({}) = {} >= x({}) = {}", a, xa, b, xb);
        }

        #[test]
        fn depth_is_monotonic(a in 0.0f32..HFOV, b in 0.0f32..HFOV) {
            prop_assume!(a <= b);
            prop_assert!(depth(a, HFOV) <= depth(b, HFOV));
        }

        #[test]
        fn fade_is_non_increasing(a in INNER..OUTER, b in INNER..OUTER) {
            prop_assume!(a <= b);
            prop_assert!(edge_fade(a, INNER, OUTER) >= edge_fade(b, INNER, OUTER));
        }
    }
}
