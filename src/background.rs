// background.rs - where the panorama image goes on screen for a given yaw

use std::f32::consts::TAU;

use glam::Vec2;

use crate::angle::lerp;
use crate::config::{BackgroundConfig, BackgroundPolicy, ZoomConfig};

/// Natural pixel size of a decoded panorama.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Vertical two-stop gradient, RGB in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub top: [f32; 3],
    pub bottom: [f32; 3],
}

impl Gradient {
    pub fn from_config(cfg: &BackgroundConfig) -> Self {
        let unit = |c: [u8; 3]| c.map(|v| v as f32 / 255.0);
        Self {
            top: unit(cfg.gradient_top),
            bottom: unit(cfg.gradient_bottom),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundLayout {
    /// No usable image: fill with the gradient.
    Fallback(Gradient),
    /// One copy of the image at `x0`, scaled to the viewport height.
    Centered { x0: f32, draw_size: Vec2 },
    /// Copies of the image at each x in `tiles`, covering the whole viewport.
    Tiled {
        offset_px: f32,
        draw_size: Vec2,
        tiles: Vec<f32>,
    },
}

impl BackgroundLayout {
    /// `total` is the scroll angle `bg_phase - yaw`; the fixed policy ignores it.
    ///
    /// The column for the camera heading lands on the viewport centre, so
    /// pillars projected from the same heading stay on their spot of the image.
    pub fn compute(
        policy: BackgroundPolicy,
        gradient: Gradient,
        image: Option<ImageSize>,
        viewport: Vec2,
        total: f32,
    ) -> Self {
        let img = match image {
            Some(img) if !img.is_empty() && viewport.x > 0.0 && viewport.y > 0.0 => img,
            _ => return BackgroundLayout::Fallback(gradient),
        };

        let scale = viewport.y / img.height as f32;
        let draw_w = (img.width as f32 * scale).ceil().max(1.0);
        let draw_size = Vec2::new(draw_w, viewport.y);

        match policy {
            BackgroundPolicy::FixedCentered => BackgroundLayout::Centered {
                x0: ((viewport.x - draw_w) / 2.0).floor(),
                draw_size,
            },
            BackgroundPolicy::Scrolling => {
                let px_per_radian = draw_w / TAU;
                let offset_px =
                    (-total * px_per_radian - viewport.x / 2.0).round().rem_euclid(draw_w);
                let mut tiles = Vec::new();
                let mut x = -offset_px;
                while x < viewport.x {
                    tiles.push(x);
                    x += draw_w;
                }
                BackgroundLayout::Tiled {
                    offset_px,
                    draw_size,
                    tiles,
                }
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, BackgroundLayout::Fallback(_))
    }
}

/// Post filter applied to the background while zooming in on a pillar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundFilter {
    pub blur_px: f32,
    pub brightness: f32,
}

impl BackgroundFilter {
    pub const NONE: BackgroundFilter = BackgroundFilter {
        blur_px: 0.0,
        brightness: 1.0,
    };

    pub fn for_zoom(cfg: &ZoomConfig, t: f32) -> Self {
        Self {
            blur_px: lerp(0.0, cfg.max_blur_px, t),
            brightness: lerp(1.0, cfg.min_brightness, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackgroundConfig;

    fn gradient() -> Gradient {
        Gradient::from_config(&BackgroundConfig::default())
    }

    #[test]
    fn missing_or_empty_image_falls_back() {
        let vp = Vec2::new(800.0, 600.0);
        for img in [None, Some(ImageSize::new(0, 0)), Some(ImageSize::new(4096, 0))] {
            let layout =
                BackgroundLayout::compute(BackgroundPolicy::Scrolling, gradient(), img, vp, 0.0);
            assert!(layout.is_fallback());
        }
        let g = gradient();
        assert!((g.top[2] - 0x20 as f32 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn fixed_policy_centres_the_image() {
        let layout = BackgroundLayout::compute(
            BackgroundPolicy::FixedCentered,
            gradient(),
            Some(ImageSize::new(2000, 1000)),
            Vec2::new(800.0, 500.0),
            1.234,
        );
        assert_eq!(
            layout,
            BackgroundLayout::Centered {
                x0: -100.0,
                draw_size: Vec2::new(1000.0, 500.0)
            }
        );
    }

    #[test]
    fn scrolling_tiles_cover_viewport() {
        let vp = Vec2::new(1500.0, 500.0);
        for total in [-7.0, -0.3, 0.0, 0.1, 2.9, 13.0] {
            let layout = BackgroundLayout::compute(
                BackgroundPolicy::Scrolling,
                gradient(),
                Some(ImageSize::new(2000, 1000)),
                vp,
                total,
            );
            let BackgroundLayout::Tiled {
                offset_px,
                draw_size,
                tiles,
            } = layout
            else {
                panic!("expected tiles");
            };
            assert!((0.0..draw_size.x).contains(&offset_px));
            assert!(tiles[0] <= 0.0);
            let last = *tiles.last().unwrap();
            assert!(last + draw_size.x >= vp.x, "seam visible at total {}", total);
        }
    }

    #[test]
    fn scrolling_keeps_heading_column_centred() {
        let vp = Vec2::new(800.0, 500.0);
        for yaw in [0.0f32, 0.7, -2.0, 3.0] {
            let layout = BackgroundLayout::compute(
                BackgroundPolicy::Scrolling,
                gradient(),
                Some(ImageSize::new(2000, 1000)),
                vp,
                -yaw,
            );
            let BackgroundLayout::Tiled {
                draw_size, tiles, ..
            } = layout
            else {
                panic!("expected tiles");
            };
            let px_per_radian = draw_size.x / TAU;
            let column = (yaw * px_per_radian).rem_euclid(draw_size.x);
            assert!(
                tiles.iter().any(|t| (t + column - vp.x / 2.0).abs() <= 1.0),
                "heading column off centre at yaw {}",
                yaw
            );
        }
    }

    #[test]
    fn zoom_filter_endpoints() {
        let cfg = crate::config::ZoomConfig::default();
        assert_eq!(BackgroundFilter::for_zoom(&cfg, 0.0), BackgroundFilter::NONE);
        let end = BackgroundFilter::for_zoom(&cfg, 1.0);
        assert_eq!(end.blur_px, 6.0);
        assert!((end.brightness - 0.65).abs() < 1e-6);
    }
}
