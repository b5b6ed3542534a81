// state.rs - camera heading plus the idle / dragging / zooming machine
//
// All mutation goes through `CameraState::update`; the frame composer only
// reads, so a frame never sees a half-applied input.

use glam::Vec2;

use crate::angle::{ang_delta, direction_of, ease_out_cubic, lerp_angle, norm};
use crate::config::ProjectorConfig;
use crate::scene::{Marker, Navigate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// Press inside the viewport.
    PointerDown { pos: Vec2, kind: PointerKind },
    PointerMove { x: f32 },
    PointerUp,
    PointerCancel,
    /// Release that activates the pillar under the pointer, if the press was accepted.
    Tap { marker: Option<usize> },
    Hover(Option<usize>),
    /// Start of a new frame; advances autoplay or the zoom.
    Frame,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drag {
    pub press: Vec2,
    last_x: f32,
    start_total: f32,
    sensitivity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zoom {
    pub marker: usize,
    pub started_at: f64,
    pub start_yaw: f32,
    pub target_yaw: f32,
    pub url: String,
    /// Eased progress in `[0, 1]`.
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Idle,
    Dragging(Drag),
    Zooming(Zoom),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub yaw: f32,
    pub bg_phase: f32,
    pub pillar_phase: f32,
    /// +1 or -1: which way the background drifts when idle.
    pub auto_dir: f32,
    pub pillar_dir: f32,
    pub mode: Mode,
    pub hovered: Option<usize>,
    drag_dist: f32,
    /// A press seen outside a zoom that no tap has consumed yet.
    armed: bool,
    last_dx: f32,
    prev_frame: Option<f64>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraState {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            bg_phase: 0.0,
            pillar_phase: 0.0,
            auto_dir: 1.0,
            pillar_dir: -1.0,
            mode: Mode::Idle,
            hovered: None,
            drag_dist: 0.0,
            armed: false,
            last_dx: 0.0,
            prev_frame: None,
        }
    }

    /// Background scroll angle; its change over a drag decides the drift direction.
    pub fn scroll_total(&self) -> f32 {
        self.bg_phase - self.yaw
    }

    /// World heading of a pillar, including its drift and, when locked, the background's.
    pub fn marker_yaw(&self, cfg: &ProjectorConfig, marker: &Marker) -> f32 {
        let follow = if cfg.markers_follow_background() {
            self.bg_phase
        } else {
            0.0
        };
        norm(marker.base_yaw + self.pillar_phase + follow)
    }

    /// Pillar heading relative to the camera, in `(-PI, PI]`.
    pub fn rel_yaw(&self, cfg: &ProjectorConfig, marker: &Marker) -> f32 {
        ang_delta(self.marker_yaw(cfg, marker), self.yaw)
    }

    pub fn drag_distance(&self) -> f32 {
        self.drag_dist
    }

    pub fn zoom(&self) -> Option<&Zoom> {
        match &self.mode {
            Mode::Zooming(zoom) => Some(zoom),
            _ => None,
        }
    }

    pub fn is_zooming(&self) -> bool {
        self.zoom().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, Mode::Dragging(_))
    }

    /// Apply one input observed at `now` (seconds). Returns a navigation
    /// request at most once per activated pillar.
    pub fn update(
        &mut self,
        cfg: &ProjectorConfig,
        markers: &[Marker],
        input: Input,
        now: f64,
    ) -> Option<Navigate> {
        if self.is_zooming() {
            // the zoom cannot be interrupted
            return match input {
                Input::Frame => self.advance(cfg, now),
                _ => None,
            };
        }

        match input {
            Input::PointerDown { pos, kind } => {
                let base = match kind {
                    PointerKind::Mouse => cfg.drag.mouse_sensitivity,
                    PointerKind::Touch => cfg.drag.touch_sensitivity,
                };
                self.mode = Mode::Dragging(Drag {
                    press: pos,
                    last_x: pos.x,
                    start_total: self.scroll_total(),
                    sensitivity: base * cfg.drag.sensitivity_scale,
                });
                self.drag_dist = 0.0;
                self.armed = true;
                None
            }
            Input::PointerMove { x } => {
                if let Mode::Dragging(drag) = &mut self.mode {
                    let dx = x - drag.last_x;
                    drag.last_x = x;
                    self.last_dx = dx;
                    self.drag_dist += dx.abs();
                    self.yaw = norm(self.yaw - dx * drag.sensitivity);
                }
                None
            }
            Input::PointerUp | Input::PointerCancel => {
                self.end_drag(cfg);
                None
            }
            Input::Tap { marker } => self.activate(cfg, markers, marker, now),
            Input::Hover(marker) => {
                self.hovered = marker;
                None
            }
            Input::Frame => self.advance(cfg, now),
        }
    }

    fn end_drag(&mut self, cfg: &ProjectorConfig) {
        let Mode::Dragging(drag) = &self.mode else {
            return;
        };
        let d = ang_delta(self.scroll_total(), drag.start_total);
        if d.abs() > cfg.drag.direction_epsilon {
            self.auto_dir = direction_of(d);
        } else if self.last_dx != 0.0 {
            self.auto_dir = direction_of(self.last_dx);
        }
        self.pillar_dir = -self.auto_dir;
        self.last_dx = 0.0;
        self.mode = Mode::Idle;
    }

    fn activate(
        &mut self,
        cfg: &ProjectorConfig,
        markers: &[Marker],
        marker: Option<usize>,
        now: f64,
    ) -> Option<Navigate> {
        // presses swallowed by a zoom never arm a tap
        if !std::mem::take(&mut self.armed) || self.drag_dist > cfg.drag.click_slop_px {
            return None;
        }
        let index = marker?;
        let target = markers.get(index)?;
        let url = target.url.clone()?;

        if !cfg.zoom.enabled {
            log::debug!("pillar {} activated, navigating to {}", index, url);
            return Some(Navigate { marker: index, url });
        }

        log::debug!("zooming into pillar {} ({})", index, target.label);
        self.mode = Mode::Zooming(Zoom {
            marker: index,
            started_at: now,
            start_yaw: self.yaw,
            target_yaw: self.marker_yaw(cfg, target),
            url,
            progress: 0.0,
        });
        None
    }

    fn advance(&mut self, cfg: &ProjectorConfig, now: f64) -> Option<Navigate> {
        let dt = self.prev_frame.map_or(0.0, |prev| (now - prev).max(0.0)) as f32;
        self.prev_frame = Some(now);

        match &mut self.mode {
            Mode::Idle => {
                if cfg.autoplay.enabled {
                    let speed = cfg.autoplay.speed;
                    self.bg_phase = norm(self.bg_phase + self.auto_dir * speed * dt);
                    self.pillar_phase = norm(
                        self.pillar_phase
                            + self.pillar_dir * speed * cfg.autoplay.pillar_speed_ratio * dt,
                    );
                }
                None
            }
            Mode::Dragging(_) => None,
            Mode::Zooming(zoom) => {
                let raw = ((now - zoom.started_at) / f64::from(cfg.zoom.duration_secs))
                    .clamp(0.0, 1.0) as f32;
                zoom.progress = ease_out_cubic(raw);
                self.yaw = lerp_angle(zoom.start_yaw, zoom.target_yaw, zoom.progress);
                if raw < 1.0 {
                    return None;
                }
                let request = Navigate {
                    marker: zoom.marker,
                    url: std::mem::take(&mut zoom.url),
                };
                self.yaw = norm(zoom.target_yaw);
                self.mode = Mode::Idle;
                Some(request)
            }
        }
    }
}
