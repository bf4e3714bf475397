use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use cgmath::{Deg, InnerSpace, Point3, Rad, Vector3};
use gridscape::camera::{Axis, Camera, Mode, Projection, EYE_HEIGHT, FLY_SPEED, WALK_SPEED};
use gridscape::input::InputState;

fn assert_vec_eq(actual: Vector3<f32>, expected: Vector3<f32>) {
    assert!(
        (actual - expected).magnitude() < 1e-4,
        "expected {expected:?}, got {actual:?}"
    );
}

fn assert_point_eq(actual: Point3<f32>, expected: Point3<f32>) {
    assert!(
        (actual - expected).magnitude() < 1e-4,
        "expected {expected:?}, got {actual:?}"
    );
}

const FRAME_60HZ: Duration = Duration::from_nanos(1_000_000_000 / 60);

#[test]
fn upward_pitch_near_the_pole_is_rejected() {
    // 0.05 rad from the up pole, inside the clamp margin.
    let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Rad(FRAC_PI_2 - 0.05));
    let before = camera.forward();

    camera.rotate(Axis::U, 0.01);

    assert_vec_eq(camera.forward(), before);
}

#[test]
fn same_pitch_delta_away_from_the_pole_is_applied() {
    // 0.5 rad from the up pole, well clear of the clamp margin.
    let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Rad(FRAC_PI_2 - 0.5));

    camera.rotate(Axis::U, 0.01);

    assert!((camera.u_axis_angle() - 0.49).abs() < 1e-4);
}

#[test]
fn downward_pitch_near_the_down_pole_is_rejected() {
    let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Rad(-(FRAC_PI_2 - 0.05)));
    let before = camera.forward();

    camera.rotate(Axis::U, -0.01);

    assert_vec_eq(camera.forward(), before);
}

#[test]
fn horizontal_look_is_unclamped() {
    let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));

    camera.rotate(Axis::V, FRAC_PI_2);

    assert_vec_eq(camera.forward(), Vector3::new(0.0, 0.0, 1.0));
    assert!((camera.forward().magnitude() - 1.0).abs() < 1e-5);
}

#[test]
fn basis_stays_orthonormal_after_many_rotations() {
    let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    for i in 0..10_000 {
        camera.rotate(Axis::V, 0.013);
        camera.rotate(Axis::U, if i % 2 == 0 { 0.011 } else { -0.011 });
    }

    assert!((camera.forward().magnitude() - 1.0).abs() < 1e-4);
    assert!(camera.forward().dot(camera.right()).abs() < 1e-4);
    assert!(camera.forward().dot(camera.up()).abs() < 1e-4);
    assert!(camera.right().dot(camera.up()).abs() < 1e-4);
}

#[test]
fn entering_walk_mode_snaps_to_eye_height_only() {
    let mut camera = Camera::new((1.0, 7.0, 2.0), Deg(30.0), Deg(10.0));
    let forward = camera.forward();

    camera.set_mode(Mode::Walk);
    assert_point_eq(camera.position, Point3::new(1.0, EYE_HEIGHT, 2.0));
    assert_vec_eq(camera.forward(), forward);

    // Leaving walk mode preserves the position entirely.
    camera.toggle_mode();
    assert_eq!(camera.mode(), Mode::Fly);
    assert_point_eq(camera.position, Point3::new(1.0, EYE_HEIGHT, 2.0));
}

#[test]
fn walk_movement_stays_in_the_ground_plane() {
    let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(-45.0));
    camera.set_mode(Mode::Walk);

    let mut input = InputState {
        forward: true,
        ..Default::default()
    };
    camera.advance(&mut input, FRAME_60HZ);

    assert!((camera.position.y - EYE_HEIGHT).abs() < 1e-5);
    assert!(camera.position.x > 0.0);
    assert!((camera.position.x - WALK_SPEED).abs() < 1e-4);
}

#[test]
fn fly_movement_follows_the_view_axis() {
    let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    let mut input = InputState {
        forward: true,
        ..Default::default()
    };

    camera.advance(&mut input, FRAME_60HZ);

    assert_point_eq(camera.position, Point3::new(FLY_SPEED, 0.0, 0.0));
}

#[test]
fn sprint_only_applies_in_walk_mode() {
    let mut walker = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    walker.set_mode(Mode::Walk);
    let mut input = InputState {
        forward: true,
        sprint: true,
        ..Default::default()
    };
    walker.advance(&mut input, FRAME_60HZ);
    assert!((walker.position.x - 1.0).abs() < 1e-4);

    let mut flyer = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    let mut input = InputState {
        forward: true,
        sprint: true,
        ..Default::default()
    };
    flyer.advance(&mut input, FRAME_60HZ);
    assert!((flyer.position.x - FLY_SPEED).abs() < 1e-4);
}

#[test]
fn displacement_is_frame_rate_independent() {
    let mut one_frame = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    let mut two_frames = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    let mut input = InputState {
        forward: true,
        ..Default::default()
    };

    one_frame.advance(&mut input, FRAME_60HZ);
    two_frames.advance(&mut input, 2 * FRAME_60HZ);
    two_frames.advance(&mut input, 2 * FRAME_60HZ);

    assert_point_eq(two_frames.position, one_frame.position);
}

#[test]
fn advance_consumes_the_accumulated_look_delta() {
    let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    let before = camera.forward();
    let mut input = InputState::default();
    input.accumulate_look(100.0, 0.0);

    camera.advance(&mut input, FRAME_60HZ);
    assert_eq!(input.look_delta, (0.0, 0.0));
    assert!((camera.forward() - before).magnitude() > 1e-3);

    // A second frame without new pointer travel leaves the view alone.
    let settled = camera.forward();
    camera.advance(&mut input, FRAME_60HZ);
    assert_vec_eq(camera.forward(), settled);
}

#[test]
fn zero_delta_time_is_a_no_op() {
    let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    let mut input = InputState {
        forward: true,
        ..Default::default()
    };

    camera.advance(&mut input, Duration::ZERO);

    assert_point_eq(camera.position, Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn resize_only_changes_the_aspect_ratio() {
    let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 500.0);
    assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);

    projection.resize(1600, 600);
    assert!((projection.aspect() - 1600.0 / 600.0).abs() < 1e-6);
}
