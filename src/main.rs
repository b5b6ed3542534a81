// main.rs - 窗口、事件循环，把输入交给 Scene，把 FrameLayout 交给渲染器

mod renderer;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use glam::Vec2;
use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use pano_pillars::background::Gradient;
use pano_pillars::i18n::{self, tr, tr_with};
use pano_pillars::loader::{spawn_load, Loaded};
use pano_pillars::{FrameLayout, Input, Navigate, PointerKind, Preset, ProjectorConfig, Router, Scene};
use renderer::Renderer;
use ui::{ImageStatus, UiAction, UiState};

#[derive(Debug, Parser)]
#[command(name = "pano_pillars", version, about = "Rotatable panorama with a ring of navigable pillars")]
struct Cli {
    /// Scene preset: static, classic, ambient or showcase.
    #[arg(long, default_value = "showcase")]
    preset: Preset,

    /// JSON scene config; overrides --preset.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Background panorama; overrides the config's image.
    #[arg(long)]
    image: Option<PathBuf>,

    /// UI language code (falls back to $PANO_PILLARS_LANG, then English).
    #[arg(long)]
    lang: Option<String>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

/// Desktop stand-in for a page change: the target goes to stdout.
struct StdoutRouter;

impl Router for StdoutRouter {
    fn navigate(&mut self, request: &Navigate) {
        log::info!(
            "{}",
            tr_with(
                "log.navigate",
                &[("url", request.url.clone()), ("index", request.marker.to_string())]
            )
        );
        println!("{}", request.url);
    }
}

/// Tracks the background load currently wanted; stale results are dropped.
struct ImageLoads {
    tx: Sender<Loaded>,
    rx: Receiver<Loaded>,
    pending: Option<PathBuf>,
}

impl ImageLoads {
    fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx,
            pending: None,
        }
    }

    fn start(&mut self, path: PathBuf, ui: &mut UiState) {
        self.pending = Some(path.clone());
        ui.image = ImageStatus::Loading;
        spawn_load(path, self.tx.clone());
    }

    fn poll(&mut self, renderer: &mut Renderer, ui: &mut UiState) {
        while let Ok(loaded) = self.rx.try_recv() {
            if self.pending.as_ref() != Some(&loaded.path) {
                continue;
            }
            self.pending = None;
            match loaded.image {
                Ok(img) => {
                    renderer.load_panorama(img);
                    ui.image = ImageStatus::Idle;
                }
                // 失败时保留当前背景（或渐变）
                Err(_) => ui.image = ImageStatus::Failed,
            }
        }
    }
}

fn load_config(cli: &Cli) -> pano_pillars::Result<ProjectorConfig> {
    let mut config = match &cli.config {
        Some(path) => ProjectorConfig::load(path)?,
        None => cli.preset.config(),
    };
    if let Some(image) = &cli.image {
        config.background.image = Some(image.clone());
    }
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let lang = i18n::resolve_lang(cli.lang.as_deref());
    i18n::init(lang.clone());

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.print_config {
        return match config.to_json_pretty() {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(e) => {
            log::error!("cannot create window: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut renderer = match pollster::block_on(Renderer::new(window.clone())) {
        Ok(renderer) => renderer,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let preset = cli.config.is_none().then_some(cli.preset);
    let mut ui_state = UiState::new(preset, lang);
    let mut loads = ImageLoads::new();
    if let Some(path) = config.background.image.clone() {
        loads.start(path, &mut ui_state);
    }

    let mut scene = Scene::new(config);
    ui_state.sprites.preload(&renderer.egui_ctx, scene.markers());
    let mut router = StdoutRouter;
    let mut last_layout: Option<FrameLayout> = None;

    // 逻辑像素下的指针状态
    let mut cursor = Vec2::ZERO;
    let mut mouse_pressed = false;
    let mut active_touch: Option<u64> = None;

    let clock = Instant::now();
    let mut last_fps_time = Instant::now();
    let mut frame_count = 0;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        loads.poll(&mut renderer, &mut ui_state);
        let now = clock.elapsed().as_secs_f64();
        let scale = window.scale_factor();
        let hit = |layout: &Option<FrameLayout>, p: Vec2| layout.as_ref().and_then(|l| l.hit_test(p));

        match event {
            Event::WindowEvent { event, .. } => {
                // 先让 egui 处理事件；松开总要结束拖拽
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                let releases_pointer = matches!(
                    event,
                    WindowEvent::MouseInput {
                        state: ElementState::Released,
                        button: MouseButton::Left,
                        ..
                    } | WindowEvent::Touch(Touch {
                        phase: TouchPhase::Ended | TouchPhase::Cancelled,
                        ..
                    })
                );
                if response.consumed && !releases_pointer {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = ui::pick_image() {
                                        loads.start(path, &mut ui_state);
                                    }
                                }
                                Some(VirtualKeyCode::F11) => ui_state.toggle_fullscreen(&window),
                                Some(VirtualKeyCode::Escape) => *control_flow = ControlFlow::Exit,
                                Some(VirtualKeyCode::Space) => {
                                    let autoplay = &mut scene.config_mut().autoplay.enabled;
                                    *autoplay = !*autoplay;
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        let p = position.to_logical::<f32>(scale);
                        cursor = Vec2::new(p.x, p.y);
                        if mouse_pressed {
                            scene.handle_with(Input::PointerMove { x: cursor.x }, now, &mut router);
                        }
                        scene.handle_with(Input::Hover(hit(&last_layout, cursor)), now, &mut router);
                    }

                    WindowEvent::CursorLeft { .. } => {
                        scene.handle_with(Input::Hover(None), now, &mut router);
                    }

                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => match state {
                        ElementState::Pressed => {
                            mouse_pressed = true;
                            let down = Input::PointerDown {
                                pos: cursor,
                                kind: PointerKind::Mouse,
                            };
                            scene.handle_with(down, now, &mut router);
                        }
                        ElementState::Released if mouse_pressed => {
                            mouse_pressed = false;
                            scene.handle_with(Input::PointerUp, now, &mut router);
                            if !response.consumed {
                                let tap = Input::Tap {
                                    marker: hit(&last_layout, cursor),
                                };
                                scene.handle_with(tap, now, &mut router);
                            }
                        }
                        ElementState::Released => {}
                    },

                    WindowEvent::Touch(touch) => {
                        let p = touch.location.to_logical::<f32>(scale);
                        let at = Vec2::new(p.x, p.y);
                        match touch.phase {
                            TouchPhase::Started if active_touch.is_none() => {
                                active_touch = Some(touch.id);
                                let down = Input::PointerDown {
                                    pos: at,
                                    kind: PointerKind::Touch,
                                };
                                scene.handle_with(down, now, &mut router);
                            }
                            TouchPhase::Moved if active_touch == Some(touch.id) => {
                                scene.handle_with(Input::PointerMove { x: at.x }, now, &mut router);
                            }
                            TouchPhase::Ended if active_touch == Some(touch.id) => {
                                active_touch = None;
                                scene.handle_with(Input::PointerUp, now, &mut router);
                                if !response.consumed {
                                    let tap = Input::Tap {
                                        marker: hit(&last_layout, at),
                                    };
                                    scene.handle_with(tap, now, &mut router);
                                }
                            }
                            TouchPhase::Cancelled if active_touch == Some(touch.id) => {
                                active_touch = None;
                                scene.handle_with(Input::PointerCancel, now, &mut router);
                            }
                            _ => {}
                        }
                    }

                    WindowEvent::DroppedFile(path) => {
                        loads.start(path, &mut ui_state);
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let elapsed = last_fps_time.elapsed().as_secs_f32();
                if elapsed >= 1.0 {
                    ui_state.fps = frame_count as f32 / elapsed;
                    frame_count = 0;
                    last_fps_time = Instant::now();
                }

                scene.handle_with(Input::Frame, now, &mut router);

                let logical = renderer.size.to_logical::<f32>(scale);
                let layout = scene.layout(
                    Vec2::new(logical.width, logical.height),
                    renderer.panorama_size(),
                );
                renderer.update_background(
                    &layout.background,
                    layout.filter,
                    Gradient::from_config(&scene.config().background),
                    scale as f32,
                );

                let mut action = None;
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    action = ui::draw_ui(ctx, &mut ui_state, &mut scene, &layout, &window);
                });
                last_layout = Some(layout);

                match action {
                    Some(UiAction::OpenImage(path)) => loads.start(path, &mut ui_state),
                    Some(UiAction::Exit) => *control_flow = ControlFlow::Exit,
                    None => {}
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("GPU out of memory");
                        *control_flow = ControlFlow::ExitWithCode(1);
                    }
                    Err(e) => log::warn!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    })
}
