// config.rs - projector configuration record and the built-in scene presets
//
// Every tunable lives here instead of being scattered over scenes. All
// sub-structs use `#[serde(default)]`, so a JSON file only has to name the
// values it overrides; anything missing falls back to the showcase preset.

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PanoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundPolicy {
    /// Scaled to viewport height and centred; yaw only moves the pillars.
    FixedCentered,
    /// Scrolls with yaw and wraps around horizontally.
    Scrolling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Radians of yaw per pixel of mouse travel.
    pub mouse_sensitivity: f32,
    /// Radians of yaw per pixel of touch travel.
    pub touch_sensitivity: f32,
    /// User multiplier applied on top of either sensitivity.
    pub sensitivity_scale: f32,
    /// Total horizontal travel (px) under which a release still counts as a tap.
    pub click_slop_px: f32,
    /// Net background displacement (rad) needed for a drag to pick the drift direction.
    pub direction_epsilon: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.0006,
            touch_sensitivity: 0.0003,
            sensitivity_scale: 1.0,
            click_slop_px: 6.0,
            direction_epsilon: 0.002,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoplayConfig {
    pub enabled: bool,
    /// Background drift in radians per second.
    pub speed: f32,
    /// Pillar drift as a fraction of `speed`; 0 keeps pillars glued to the background.
    pub pillar_speed_ratio: f32,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 0.32,
            pillar_speed_ratio: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// When off, tapping a pillar navigates straight away.
    pub enabled: bool,
    pub duration_secs: f32,
    pub max_scale: f32,
    pub max_translate_z: f32,
    /// Opacity multiplier the other pillars dim towards.
    pub dim_others: f32,
    pub max_blur_px: f32,
    pub min_brightness: f32,
    /// Eased progress after which the black overlay starts fading in.
    pub fader_start: f32,
    pub z_index_boost: i32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_secs: 0.8,
            max_scale: 3.8,
            max_translate_z: 900.0,
            dim_others: 0.06,
            max_blur_px: 6.0,
            min_brightness: 0.65,
            fader_start: 0.82,
            z_index_boost: 8000,
        }
    }
}

/// Depth cue tuning: how proximity turns into scale, opacity and turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthStyle {
    pub scale_base: f32,
    pub scale_gain: f32,
    pub opacity_base: f32,
    pub opacity_gain: f32,
    pub rotation_factor: f32,
    pub hover_boost: f32,
    pub z_base: i32,
    pub z_range: f32,
}

impl Default for DepthStyle {
    fn default() -> Self {
        Self {
            scale_base: 0.8,
            scale_gain: 0.5,
            opacity_base: 0.6,
            opacity_gain: 0.4,
            rotation_factor: 0.55,
            hover_boost: 1.08,
            z_base: 1000,
            z_range: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PillarStyle {
    pub count: usize,
    /// Vertical offset of every pillar, in viewport heights scaled by `pitch_gain`.
    pub pitch: f32,
    pub width: f32,
    pub height: f32,
    /// Fraction of the viewport height where the pillar feet rest.
    pub horizon: f32,
    pub pitch_gain: f32,
    pub plinth_base: f32,
    pub plinth_gain: f32,
    /// Virtual camera distance used to turn translate-z into apparent size.
    pub perspective_px: f32,
}

impl Default for PillarStyle {
    fn default() -> Self {
        Self {
            count: 8,
            pitch: -0.05,
            width: 300.0,
            height: 300.0,
            horizon: 0.78,
            pitch_gain: 1.2,
            plinth_base: 220.0,
            plinth_gain: 120.0,
            perspective_px: 1200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub policy: BackgroundPolicy,
    /// Pillars follow the background scroll (scrolling policy only).
    pub lock_markers: bool,
    pub gradient_top: [u8; 3],
    pub gradient_bottom: [u8; 3],
    pub image: Option<PathBuf>,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            policy: BackgroundPolicy::Scrolling,
            lock_markers: true,
            gradient_top: [0x0a, 0x12, 0x20],
            gradient_bottom: [0x0b, 0x0f, 0x18],
            image: Some(PathBuf::from("assets/backpano.png")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub label: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<PathBuf>,
}

impl ProjectEntry {
    fn new(label: &str, url: &str, image: &str) -> Self {
        Self {
            label: label.to_string(),
            url: Some(url.to_string()),
            image: Some(PathBuf::from("assets/pillars").join(image)),
        }
    }
}

fn showcase_projects() -> Vec<ProjectEntry> {
    vec![
        ProjectEntry::new("P1", "proj1.html", "p1.png"),
        ProjectEntry::new("P2", "proj2.html", "p2.png"),
        ProjectEntry::new("P3", "proj3.html", "p4.png"),
        ProjectEntry::new("P4", "proj4.html", "p5.png"),
        ProjectEntry::new("P5", "proj5.html", "p1.png"),
        ProjectEntry::new("P6", "proj6.html", "p1.png"),
        ProjectEntry::new("P7", "proj1.html", "p6.png"),
        ProjectEntry::new("P8", "proj1.html", "p3.png"),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Horizontal field of view in degrees.
    pub hfov_deg: f32,
    /// Fade start, as a fraction of the field of view.
    pub edge_fade_inner: f32,
    /// Fade end and projection clamp, as a fraction of the field of view.
    pub edge_fade_outer: f32,
    pub drag: DragConfig,
    pub autoplay: AutoplayConfig,
    pub zoom: ZoomConfig,
    pub depth: DepthStyle,
    pub pillars: PillarStyle,
    pub background: BackgroundConfig,
    pub projects: Vec<ProjectEntry>,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            hfov_deg: 90.0,
            edge_fade_inner: 0.92,
            edge_fade_outer: 0.995,
            drag: DragConfig::default(),
            autoplay: AutoplayConfig::default(),
            zoom: ZoomConfig::default(),
            depth: DepthStyle::default(),
            pillars: PillarStyle::default(),
            background: BackgroundConfig::default(),
            projects: showcase_projects(),
        }
    }
}

impl ProjectorConfig {
    pub fn hfov(&self) -> f32 {
        self.hfov_deg.to_radians()
    }

    pub fn fade_inner(&self) -> f32 {
        self.hfov() * self.edge_fade_inner
    }

    /// Also the projection clamp: beyond it pillars pin to the viewport edge.
    pub fn fade_outer(&self) -> f32 {
        self.hfov() * self.edge_fade_outer
    }

    /// Pillar angles include the background phase only when they are locked to a scrolling image.
    pub fn markers_follow_background(&self) -> bool {
        self.background.policy == BackgroundPolicy::Scrolling && self.background.lock_markers
    }

    /// Load a JSON scene config. Missing fields use the showcase defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ProjectorConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let hfov = self.hfov();
        if !(hfov > 0.0 && hfov < std::f32::consts::PI) {
            return Err(PanoError::InvalidConfig(format!(
                "hfov_deg must be in (0, 180), got {}",
                self.hfov_deg
            )));
        }
        if !(self.edge_fade_inner >= 0.0 && self.edge_fade_inner < self.edge_fade_outer) {
            return Err(PanoError::InvalidConfig(format!(
                "edge_fade_inner ({}) must be below edge_fade_outer ({})",
                self.edge_fade_inner, self.edge_fade_outer
            )));
        }
        // tan() blows up at +-90 degrees
        if self.fade_outer() >= FRAC_PI_2 {
            return Err(PanoError::InvalidConfig(format!(
                "projection clamp {:.1} deg reaches the tangent asymptote",
                self.fade_outer().to_degrees()
            )));
        }
        if self.pillars.count == 0 {
            return Err(PanoError::InvalidConfig("pillars.count must be at least 1".into()));
        }
        if self.zoom.enabled && self.zoom.duration_secs <= 0.0 {
            return Err(PanoError::InvalidConfig(
                "zoom.duration_secs must be positive".into(),
            ));
        }
        if self.drag.mouse_sensitivity < 0.0
            || self.drag.touch_sensitivity < 0.0
            || self.drag.sensitivity_scale < 0.0
        {
            return Err(PanoError::InvalidConfig(
                "drag sensitivities must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// The scene variants the projector replaces, kept as named starting points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Fixed centred background, slow drag, no autoplay, no zoom.
    Static,
    /// Fixed centred background with the usual 0.003 rad/px drag.
    Classic,
    /// Scrolling background that drifts on its own; drag is almost inert.
    Ambient,
    /// Scrolling background, autoplay, sprite pillars and zoom-to-target.
    Showcase,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Static,
        Preset::Classic,
        Preset::Ambient,
        Preset::Showcase,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Static => "static",
            Preset::Classic => "classic",
            Preset::Ambient => "ambient",
            Preset::Showcase => "showcase",
        }
    }

    pub fn config(self) -> ProjectorConfig {
        let showcase = ProjectorConfig::default();
        match self {
            Preset::Showcase => showcase,
            Preset::Static | Preset::Classic => {
                let sensitivity = if self == Preset::Static { 0.00012 } else { 0.003 };
                ProjectorConfig {
                    drag: DragConfig {
                        mouse_sensitivity: sensitivity,
                        touch_sensitivity: sensitivity,
                        ..DragConfig::default()
                    },
                    autoplay: AutoplayConfig {
                        enabled: false,
                        ..AutoplayConfig::default()
                    },
                    zoom: ZoomConfig {
                        enabled: false,
                        ..ZoomConfig::default()
                    },
                    depth: DepthStyle {
                        scale_base: 0.72,
                        scale_gain: 0.58,
                        ..DepthStyle::default()
                    },
                    pillars: PillarStyle {
                        width: 170.0,
                        height: 260.0,
                        horizon: 0.66,
                        ..PillarStyle::default()
                    },
                    background: BackgroundConfig {
                        policy: BackgroundPolicy::FixedCentered,
                        lock_markers: false,
                        ..BackgroundConfig::default()
                    },
                    projects: Vec::new(),
                    ..showcase
                }
            }
            Preset::Ambient => ProjectorConfig {
                drag: DragConfig {
                    mouse_sensitivity: 6e-7,
                    touch_sensitivity: 6e-7,
                    ..DragConfig::default()
                },
                zoom: ZoomConfig {
                    enabled: false,
                    ..ZoomConfig::default()
                },
                autoplay: AutoplayConfig {
                    pillar_speed_ratio: 0.25,
                    ..AutoplayConfig::default()
                },
                ..showcase
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = PanoError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PanoError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_validates() {
        for preset in Preset::ALL {
            preset.config().validate().unwrap();
        }
    }

    #[test]
    fn preset_names_parse_back() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert_eq!(" Showcase ".parse::<Preset>().unwrap(), Preset::Showcase);
        assert!(matches!(
            "gallery".parse::<Preset>(),
            Err(PanoError::UnknownPreset(_))
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: ProjectorConfig =
            serde_json::from_str(r#"{ "drag": { "mouse_sensitivity": 0.003 }, "background": { "policy": "fixed_centered" } }"#)
                .unwrap();
        assert_eq!(cfg.drag.mouse_sensitivity, 0.003);
        assert_eq!(cfg.drag.touch_sensitivity, 0.0003);
        assert_eq!(cfg.background.policy, BackgroundPolicy::FixedCentered);
        assert_eq!(cfg.pillars.count, 8);
        assert_eq!(cfg.projects.len(), 8);
    }

    #[test]
    fn rejects_clamp_past_asymptote() {
        let cfg = ProjectorConfig {
            hfov_deg: 120.0,
            ..ProjectorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(PanoError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_unordered_fade_and_empty_ring() {
        let cfg = ProjectorConfig {
            edge_fade_inner: 0.99,
            edge_fade_outer: 0.9,
            ..ProjectorConfig::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = ProjectorConfig::default();
        cfg.pillars.count = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_and_validates_file() {
        let dir = std::env::temp_dir().join(format!("pano_pillars_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.json");
        std::fs::write(&good, Preset::Classic.config().to_json_pretty().unwrap()).unwrap();
        assert_eq!(ProjectorConfig::load(&good).unwrap(), Preset::Classic.config());

        let bad = dir.join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            ProjectorConfig::load(&bad),
            Err(PanoError::ConfigParse(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
