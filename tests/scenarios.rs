use std::f32::consts::{FRAC_PI_2, PI};
use std::path::Path;

use approx::assert_relative_eq;
use glam::Vec2;

use pano_pillars::loader::load_rgba;
use pano_pillars::{
    BackgroundLayout, ImageSize, Input, MarkerPose, Navigate, PointerKind, Preset, Router, Scene,
};

const VP: Vec2 = Vec2::new(1280.0, 720.0);

#[derive(Default)]
struct Recorder {
    seen: Vec<Navigate>,
}

impl Router for Recorder {
    fn navigate(&mut self, request: &Navigate) {
        self.seen.push(request.clone());
    }
}

/// Press and release in place, then tap `marker`, the way the window shell reports a click.
fn click(scene: &mut Scene, marker: Option<usize>, now: f64, router: &mut dyn Router) {
    scene.handle_with(press(640.0), now, router);
    scene.handle_with(Input::PointerUp, now, router);
    scene.handle_with(Input::Tap { marker }, now, router);
}

fn press(x: f32) -> Input {
    Input::PointerDown {
        pos: Vec2::new(x, 400.0),
        kind: PointerKind::Mouse,
    }
}

#[test]
fn front_pillar_sits_at_screen_centre() {
    let scene = Scene::new(Preset::Showcase.config());
    let frame = scene.layout(VP, Some(ImageSize::new(4096, 2048)));
    let pose = frame.pose(0).unwrap();

    assert_eq!(pose.rel, 0.0);
    assert_eq!(pose.anchor.x, VP.x / 2.0);
    assert_eq!(pose.depth, 0.0);
    assert_eq!(pose.fade, 1.0);
    assert_relative_eq!(pose.opacity, 0.6, epsilon = 1e-6);
}

#[test]
fn ring_has_eight_quarter_pi_headings() {
    let scene = Scene::new(Preset::Showcase.config());
    let yaws: Vec<f32> = scene.markers().iter().map(|m| m.base_yaw).collect();
    assert_eq!(yaws.len(), 8);
    for (k, yaw) in yaws.iter().enumerate() {
        assert_relative_eq!(*yaw, k as f32 * PI / 4.0, epsilon = 1e-6);
    }
}

#[test]
fn hundred_pixel_drag_turns_point_three_radians() {
    let mut scene = Scene::new(Preset::Classic.config());
    assert!(scene.handle(press(100.0), 0.0).is_none());
    scene.handle(Input::PointerMove { x: 200.0 }, 0.01);
    scene.handle(Input::PointerUp, 0.02);

    assert_relative_eq!(scene.camera().yaw, -0.3, epsilon = 1e-6);
    assert!(!scene.camera().is_dragging());
}

#[test]
fn zoom_starts_at_current_yaw_and_navigates_once() {
    let mut scene = Scene::new(Preset::Showcase.config());
    let mut router = Recorder::default();

    click(&mut scene, Some(2), 0.0, &mut router);
    assert!(scene.camera().is_zooming());
    scene.handle_with(Input::Frame, 0.0, &mut router);

    assert_eq!(scene.camera().yaw, 0.0);
    let frame = scene.layout(VP, None);
    let marker = &scene.markers()[2];
    let rel = scene.camera().rel_yaw(scene.config(), marker);
    let base = MarkerPose::compute(scene.config(), 2, rel, marker.pitch, VP);
    assert_relative_eq!(frame.pose(2).unwrap().scale, base.scale, epsilon = 1e-6);

    // pointer input cannot interrupt the zoom
    scene.handle_with(press(10.0), 0.2, &mut router);
    scene.handle_with(Input::PointerMove { x: 900.0 }, 0.3, &mut router);
    assert!(scene.camera().is_zooming());

    scene.handle_with(Input::Frame, 0.4, &mut router);
    assert!(router.seen.is_empty());
    scene.handle_with(Input::Frame, 1.0, &mut router);
    assert_eq!(
        router.seen,
        vec![Navigate {
            marker: 2,
            url: "proj3.html".into()
        }]
    );
    assert_relative_eq!(scene.camera().yaw, FRAC_PI_2, epsilon = 1e-5);
    assert!(!scene.camera().is_zooming());

    for t in [1.1, 1.5, 3.0] {
        scene.handle_with(Input::Frame, t, &mut router);
    }
    assert_eq!(router.seen.len(), 1);
}

#[test]
fn without_zoom_a_tap_navigates_immediately() {
    let mut scene = Scene::new(Preset::Ambient.config());
    let mut router = Recorder::default();
    click(&mut scene, Some(5), 0.0, &mut router);
    let urls: Vec<&str> = router.seen.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, ["proj6.html"]);
    assert!(!scene.camera().is_zooming());
}

#[test]
fn drag_that_travels_is_not_a_tap() {
    let mut scene = Scene::new(Preset::Showcase.config());
    scene.handle(press(100.0), 0.0);
    scene.handle(Input::PointerMove { x: 160.0 }, 0.05);
    scene.handle(Input::PointerUp, 0.1);
    assert!(scene.handle(Input::Tap { marker: Some(0) }, 0.1).is_none());
    assert!(!scene.camera().is_zooming());
}

#[test]
fn pillars_without_target_are_inert() {
    let mut scene = Scene::new(Preset::Static.config());
    let mut router = Recorder::default();
    click(&mut scene, Some(0), 0.0, &mut router);
    click(&mut scene, None, 0.0, &mut router);
    assert!(router.seen.is_empty());
    assert!(!scene.camera().is_zooming());
}

#[test]
fn failed_background_keeps_gradient_and_pillars() {
    let image = load_rgba(Path::new("/no/such/backpano.png"))
        .ok()
        .map(|img| ImageSize::new(img.width(), img.height()));
    assert!(image.is_none());

    for preset in Preset::ALL {
        let scene = Scene::new(preset.config());
        let frame = scene.layout(VP, image);
        assert!(
            matches!(frame.background, BackgroundLayout::Fallback(_)),
            "{} did not fall back",
            preset
        );
        assert_eq!(frame.poses.len(), scene.markers().len());
        assert!(frame.poses.iter().all(|p| p.anchor.is_finite()));
        assert!(frame.visible_poses().count() > 0);
    }
}

#[test]
fn autoplay_drifts_the_background_but_not_the_camera() {
    let mut scene = Scene::new(Preset::Showcase.config());
    for i in 0..=10 {
        scene.handle(Input::Frame, i as f64 * 0.1);
    }
    assert_eq!(scene.camera().yaw, 0.0);
    assert_relative_eq!(scene.camera().bg_phase, 0.32, epsilon = 1e-4);

    scene.config_mut().autoplay.enabled = false;
    let before = scene.camera().bg_phase;
    scene.handle(Input::Frame, 2.0);
    assert_eq!(scene.camera().bg_phase, before);
}
