// ui.rs - 菜单、状态栏，以及立柱的 egui 绘制

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use egui::{Align2, Color32, FontId, LayerId, Pos2, Rect, Stroke};
use winit::window::{Fullscreen, Window};

use pano_pillars::config::Preset;
use pano_pillars::i18n::{self, tr, tr_with};
use pano_pillars::loader::load_rgba;
use pano_pillars::{FrameLayout, Marker, MarkerPose, Mode, Scene};

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Idle,
    Loading,
    Failed,
}

/// What the menus asked the event loop to do after this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    OpenImage(PathBuf),
    Exit,
}

/// Pillar sprites keyed by path; failures are remembered so they are logged once.
#[derive(Default)]
pub struct Sprites {
    cache: HashMap<PathBuf, Option<egui::TextureHandle>>,
}

impl Sprites {
    /// Decode every sprite the ring refers to. Paths already seen are skipped.
    pub fn preload(&mut self, ctx: &egui::Context, markers: &[Marker]) {
        for path in markers.iter().filter_map(|m| m.image.as_deref()) {
            self.texture(ctx, path);
        }
    }

    fn texture(&mut self, ctx: &egui::Context, path: &Path) -> Option<egui::TextureId> {
        self.cache
            .entry(path.to_path_buf())
            .or_insert_with(|| match load_rgba(path) {
                Ok(img) => {
                    let size = [img.width() as usize, img.height() as usize];
                    let color = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
                    Some(ctx.load_texture(
                        path.display().to_string(),
                        color,
                        egui::TextureOptions::LINEAR,
                    ))
                }
                Err(e) => {
                    log::warn!(
                        "{}",
                        tr_with(
                            "log.sprite_missing",
                            &[("path", path.display().to_string()), ("err", e.to_string())]
                        )
                    );
                    None
                }
            })
            .as_ref()
            .map(|t| t.id())
    }
}

pub struct UiState {
    /// `None` when the scene came from a config file.
    pub preset: Option<Preset>,
    pub lang: String,
    languages: Vec<String>,
    pub show_fps: bool,
    pub fps: f32,
    pub fullscreen: bool,
    pub image: ImageStatus,
    pub sprites: Sprites,
}

impl UiState {
    pub fn new(preset: Option<Preset>, lang: String) -> Self {
        Self {
            preset,
            lang,
            languages: i18n::available_languages(),
            show_fps: false,
            fps: 0.0,
            fullscreen: false,
            image: ImageStatus::Idle,
            sprites: Sprites::default(),
        }
    }

    pub fn toggle_fullscreen(&mut self, window: &Window) {
        self.fullscreen = !self.fullscreen;
        if self.fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            window.set_fullscreen(None);
        }
    }
}

pub fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(&tr("file.filter.images"), &IMAGE_EXTENSIONS)
        .pick_file()
}

fn pos(v: glam::Vec2) -> Pos2 {
    Pos2::new(v.x, v.y)
}

/// Paints every visible pillar back to front, then the zoom fader on top of everything.
pub fn draw_pillars(ctx: &egui::Context, state: &mut UiState, scene: &Scene, frame: &FrameLayout) {
    // 与面板同层且先画，菜单栏和状态栏会盖在立柱上面
    let painter = ctx.layer_painter(LayerId::background());

    for pose in frame.visible_poses() {
        let Some(marker) = scene.markers().get(pose.index) else {
            continue;
        };
        let (min, max) = frame.bounds(pose);
        let rect = Rect::from_min_max(pos(min), pos(max));
        let rounding = rect.width().min(rect.height()) * 0.12;

        paint_plinth(&painter, pose, rect);

        let shade = (255.0 * pose.shade_opacity).round() as u8;
        let tint = Color32::from_gray(shade).gamma_multiply(pose.opacity);
        let sprite = marker
            .image
            .as_deref()
            .and_then(|path| state.sprites.texture(ctx, path));
        match sprite {
            Some(texture) => {
                let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                painter.image(texture, rect, uv, tint);
            }
            None => {
                let fill = Color32::from_rgb(0x2a, 0x3a, 0x55).linear_multiply(pose.shade_opacity);
                painter.rect_filled(rect, rounding, fill.gamma_multiply(pose.opacity));
                painter.rect_stroke(
                    rect,
                    rounding,
                    Stroke::new(1.0, Color32::from_white_alpha(40).gamma_multiply(pose.opacity)),
                );
            }
        }

        if pose.hovered {
            painter.rect_stroke(
                rect.expand(2.0),
                rounding,
                Stroke::new(2.0, Color32::from_rgb(0x9c, 0xd0, 0xff).gamma_multiply(pose.opacity)),
            );
        }

        let font = FontId::proportional((rect.height() * 0.09).clamp(10.0, 64.0));
        painter.text(
            Pos2::new(rect.center().x, rect.max.y - rect.height() * 0.12),
            Align2::CENTER_CENTER,
            &marker.label,
            font,
            Color32::WHITE.gamma_multiply(pose.opacity),
        );
    }

    if frame.fader_opacity > 0.0 {
        let fader = ctx.layer_painter(LayerId::new(egui::Order::Foreground, egui::Id::new("fader")));
        fader.rect_filled(
            ctx.screen_rect(),
            0.0,
            Color32::BLACK.gamma_multiply(frame.fader_opacity),
        );
    }
}

fn paint_plinth(painter: &egui::Painter, pose: &MarkerPose, rect: Rect) {
    let half_w = pose.plinth_width * pose.scale / 2.0;
    let half_h = (half_w * 0.12).max(2.0);
    let centre = Pos2::new(rect.center().x, rect.max.y);
    painter.rect_filled(
        Rect::from_center_size(centre, egui::vec2(half_w * 2.0, half_h * 2.0)),
        half_h,
        Color32::BLACK.gamma_multiply(pose.plinth_opacity),
    );
}

pub fn draw_ui(
    ctx: &egui::Context,
    state: &mut UiState,
    scene: &mut Scene,
    frame: &FrameLayout,
    window: &Window,
) -> Option<UiAction> {
    let mut action = None;

    draw_pillars(ctx, state, scene, frame);
    if scene.camera().hovered.is_some() && !scene.camera().is_dragging() {
        ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(tr("menu.file"), |ui| {
                if ui.button(tr("menu.open_image")).clicked() {
                    ui.close_menu();
                    action = pick_image().map(UiAction::OpenImage);
                }
                if ui.button(tr("menu.exit")).clicked() {
                    ui.close_menu();
                    action = Some(UiAction::Exit);
                }
            });

            ui.menu_button(tr("menu.view"), |ui| {
                ui.menu_button(tr("view.preset"), |ui| {
                    for preset in Preset::ALL {
                        if ui
                            .radio(state.preset == Some(preset), preset.name())
                            .clicked()
                        {
                            let scale = scene.config().drag.sensitivity_scale;
                            let mut config = preset.config();
                            config.drag.sensitivity_scale = scale;
                            scene.replace_config(config);
                            state.sprites.preload(ctx, scene.markers());
                            state.preset = Some(preset);
                            log::info!("switched to preset {}", preset);
                            ui.close_menu();
                        }
                    }
                });

                let autoplay = &mut scene.config_mut().autoplay.enabled;
                ui.checkbox(autoplay, format!("{} ({})", tr("view.autoplay"), tr("view.autoplay_hint")));

                ui.menu_button(tr("view.input_sensitivity"), |ui| {
                    let drag = &mut scene.config_mut().drag;
                    ui.add(
                        egui::Slider::new(&mut drag.sensitivity_scale, 0.1..=5.0)
                            .text(tr("view.multiplier")),
                    );
                    if ui.button(tr("view.reset_1_0")).clicked() {
                        drag.sensitivity_scale = 1.0;
                    }
                });

                ui.separator();
                if ui.button(tr("view.reset")).clicked() {
                    scene.reset_view();
                    ui.close_menu();
                }
                let fullscreen_label = if state.fullscreen {
                    tr("view.fullscreen.exit")
                } else {
                    tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen_label).clicked() {
                    state.toggle_fullscreen(window);
                    ui.close_menu();
                }
                if ui.checkbox(&mut state.show_fps, tr("view.show_fps")).clicked() {
                    ui.close_menu();
                }
            });

            ui.menu_button(tr("menu.language"), |ui| {
                let UiState { lang, languages, .. } = &mut *state;
                for code in languages.iter() {
                    if ui.radio_value(lang, code.clone(), code.as_str()).clicked() {
                        i18n::init(lang.clone());
                        window.set_title(&tr("app.title"));
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            match state.image {
                ImageStatus::Loading => {
                    ui.label(egui::RichText::new(tr("status.loading_image")).color(Color32::YELLOW));
                    ui.label("|");
                }
                ImageStatus::Failed => {
                    ui.label(egui::RichText::new(tr("status.image_failed")).color(Color32::LIGHT_RED));
                    ui.label("|");
                }
                ImageStatus::Idle => {}
            }

            let preset = match state.preset {
                Some(p) => p.name().to_string(),
                None => tr("status.preset_custom"),
            };
            ui.label(format!("{} {}", tr("status.preset_prefix"), preset));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", scene.camera().yaw.to_degrees()));
            ui.label("|");
            let mode = match scene.camera().mode {
                Mode::Idle => tr("status.state.idle"),
                Mode::Dragging(_) => tr("status.state.dragging"),
                Mode::Zooming(_) => tr("status.state.zooming"),
            };
            ui.label(mode);

            if state.show_fps {
                ui.label("|");
                ui.label(egui::RichText::new(format!("FPS: {:.1}", state.fps)).color(Color32::GREEN));
            }
        });
    });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(image: Option<PathBuf>) -> Marker {
        Marker {
            base_yaw: 0.0,
            pitch: 0.0,
            label: "P1".into(),
            url: None,
            image,
        }
    }

    #[test]
    fn language_list_is_read_once() {
        let state = UiState::new(Some(Preset::Showcase), "en".into());
        assert!(state.languages.iter().any(|l| l == "en"));
        assert!(state.languages.iter().any(|l| l == "zh-Hans"));
    }

    #[test]
    fn preload_decodes_ring_sprites_up_front() {
        let dir = std::env::temp_dir().join(format!("pano_pillars_ui_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("p1.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 10, 10, 255]))
            .save(&good)
            .unwrap();
        let missing = dir.join("nope.png");

        let ctx = egui::Context::default();
        let mut sprites = Sprites::default();
        let ring = [marker(Some(good.clone())), marker(Some(missing.clone())), marker(None)];
        sprites.preload(&ctx, &ring);

        assert_eq!(sprites.cache.len(), 2);
        assert!(sprites.cache[&good].is_some());
        assert!(sprites.cache[&missing].is_none());
    }
}
