// Host-side tests for the pure scene core.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod config {
    include!("../src/config.rs");
}
mod scene {
    include!("../src/core/scene.rs");
}

use glam::Vec3;
use scene::*;

fn make_scene() -> SceneCore {
    SceneCore::new(&config::SCENE, 7)
}

fn seed_at(position: Vec3, velocity: Vec3) -> ParticleSeed {
    ParticleSeed {
        snippet: "const",
        color: [1.0, 0.0, 0.0],
        position,
        velocity,
    }
}

fn dummy_segments() -> Vec<Vec3> {
    vec![Vec3::ZERO, Vec3::X]
}

#[test]
fn click_opens_only_from_closed() {
    let mut s = make_scene();
    assert_eq!(s.state(), BoxState::Closed);
    assert!(s.begin_open());
    assert_eq!(s.state(), BoxState::Opening);

    // Any number of further clicks changes nothing.
    for _ in 0..5 {
        assert!(!s.begin_open());
        assert_eq!(s.state(), BoxState::Opening);
    }
}

#[test]
fn no_spawns_while_closed() {
    let mut s = make_scene();
    assert!(s.spawn_tick().is_none());
    assert_eq!(s.state(), BoxState::Closed);
}

#[test]
fn burst_issues_exactly_the_configured_count() {
    let mut s = make_scene();
    assert!(s.begin_open());
    let mut issued = 0;
    while s.spawn_tick().is_some() {
        issued += 1;
        assert!(issued <= config::SCENE.particles.burst_count, "runaway burst");
    }
    assert_eq!(issued, config::SCENE.particles.burst_count);
    assert!(s.burst_complete());
    assert_eq!(s.state(), BoxState::Open);

    // Exhausted burst stays exhausted; clicks stay ignored.
    assert!(s.spawn_tick().is_none());
    assert!(!s.begin_open());
    assert_eq!(s.state(), BoxState::Open);
}

#[test]
fn seeds_stay_within_configured_ranges() {
    let p = &config::SCENE.particles;
    let mut s = make_scene();
    assert!(s.begin_open());
    while let Some(seed) = s.spawn_tick() {
        assert!(seed.velocity.x.abs() <= p.velocity_half_x);
        assert!(seed.velocity.y >= 0.0 && seed.velocity.y <= p.velocity_max_y);
        assert!(seed.velocity.z.abs() <= p.velocity_half_z);
        assert!(seed.position.x.abs() <= p.spawn_jitter);
        assert_eq!(seed.position.y, 0.0);
        assert!(seed.position.z.abs() <= p.spawn_jitter);
        assert!(config::SCENE.snippets.contains(&seed.snippet));
        assert!(config::SCENE.palette.contains(&seed.color));
    }
}

#[test]
fn update_applies_gravity_then_velocity() {
    let p = &config::SCENE.particles;
    let mut s = make_scene();
    s.begin_open();
    s.insert_particle(seed_at(Vec3::ZERO, Vec3::new(0.0, 0.1, 0.0)), dummy_segments());

    let removed = s.update();
    assert!(removed.is_empty());
    let part = &s.particles()[0];
    assert!((part.velocity.y - (0.1 - p.gravity)).abs() < 1e-6);
    assert!((part.position.y - (0.1 - p.gravity)).abs() < 1e-6);
}

#[test]
fn particles_below_threshold_are_pruned_the_same_pass() {
    let p = &config::SCENE.particles;
    let mut s = make_scene();
    s.begin_open();
    let id = s.insert_particle(
        seed_at(Vec3::new(0.0, p.despawn_y + 0.001, 0.0), Vec3::ZERO),
        dummy_segments(),
    );

    let removed = s.update();
    assert_eq!(removed.as_slice(), &[id]);
    assert!(s.particles().is_empty());
}

#[test]
fn removal_mid_collection_keeps_spawn_order() {
    let p = &config::SCENE.particles;
    let mut s = make_scene();
    s.begin_open();
    let high = Vec3::new(0.0, 5.0, 0.0);
    let low = Vec3::new(0.0, p.despawn_y + 0.001, 0.0);
    let a = s.insert_particle(seed_at(high, Vec3::ZERO), dummy_segments());
    let b = s.insert_particle(seed_at(low, Vec3::ZERO), dummy_segments());
    let c = s.insert_particle(seed_at(high, Vec3::ZERO), dummy_segments());

    let removed = s.update();
    assert_eq!(removed.as_slice(), &[b]);
    let ids: Vec<u64> = s.particles().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a, c]);
}

#[test]
fn no_live_particle_ends_an_update_below_threshold() {
    // Property over a full randomized burst: after any update pass, every
    // surviving particle sits at or above the despawn line.
    let p = &config::SCENE.particles;
    let mut s = make_scene();
    assert!(s.begin_open());
    while let Some(seed) = s.spawn_tick() {
        s.insert_particle(seed, dummy_segments());
    }
    assert_eq!(s.particles().len() as u32, p.burst_count);

    let mut frames = 0;
    while !s.particles().is_empty() {
        s.update();
        for part in s.particles() {
            assert!(part.position.y >= p.despawn_y);
        }
        frames += 1;
        assert!(frames < 10_000, "particles never despawned");
    }
}

#[test]
fn click_then_full_burst_reaches_open() {
    // Click at t=0: Opening immediately; Open once the delayed burst has
    // ticked its full count, 300 + 20 * 100 = 2300 ms of scheduled time.
    let p = &config::SCENE.particles;
    let mut s = make_scene();
    s.set_viewport(800, 600);

    assert!(s.begin_open());
    assert_eq!(s.state(), BoxState::Opening);

    let mut elapsed_ms = p.open_delay_ms;
    while let Some(seed) = s.spawn_tick() {
        elapsed_ms += p.spawn_interval_ms;
        s.insert_particle(seed, dummy_segments());
    }
    assert_eq!(s.state(), BoxState::Open);
    assert_eq!(elapsed_ms, 2300);
}

#[test]
fn failed_resolution_still_reaches_open() {
    // One tick's asset resolution fails: its seed is dropped, the burst
    // count is unaffected and the box still ends Open.
    let mut s = make_scene();
    assert!(s.begin_open());
    let mut tick = 0;
    while let Some(seed) = s.spawn_tick() {
        tick += 1;
        if tick != 7 {
            s.insert_particle(seed, dummy_segments());
        }
    }
    assert_eq!(s.state(), BoxState::Open);
    assert!(s.particles().len() as u32 <= config::SCENE.particles.burst_count - 1);
}

#[test]
fn resize_updates_aspect_and_nothing_else() {
    let mut s = make_scene();
    s.set_viewport(800, 600);
    assert!((s.camera.aspect - 800.0 / 600.0).abs() < 1e-6);

    s.begin_open();
    for _ in 0..3 {
        let seed = s.spawn_tick().unwrap();
        s.insert_particle(seed, dummy_segments());
    }
    let before: Vec<(Vec3, Vec3)> = s
        .particles()
        .iter()
        .map(|p| (p.position, p.velocity))
        .collect();

    s.set_viewport(400, 300);
    assert!((s.camera.aspect - 400.0 / 300.0).abs() < 1e-6);
    s.set_viewport(800, 400);
    assert!((s.camera.aspect - 2.0).abs() < 1e-6);

    let after: Vec<(Vec3, Vec3)> = s
        .particles()
        .iter()
        .map(|p| (p.position, p.velocity))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn zero_sized_viewport_is_ignored() {
    let mut s = make_scene();
    s.set_viewport(800, 600);
    let aspect = s.camera.aspect;
    s.set_viewport(0, 600);
    s.set_viewport(800, 0);
    s.set_viewport(0, 0);
    assert_eq!(s.camera.aspect, aspect);
    assert!(s.camera.projection_matrix().is_finite());
}

#[test]
fn rotation_advances_in_every_state() {
    let step = config::SCENE.animation.rotation_speed;
    let mut s = make_scene();

    s.update();
    assert!((s.yaw() - step).abs() < 1e-6, "rotates while Closed");

    s.begin_open();
    s.update();
    assert!((s.yaw() - 2.0 * step).abs() < 1e-6, "rotates while Opening");

    while s.spawn_tick().is_some() {}
    s.update();
    assert!((s.yaw() - 3.0 * step).abs() < 1e-6, "rotates while Open");
}

#[test]
fn lid_stays_shut_until_opening_then_eases_toward_target() {
    let a = &config::SCENE.animation;
    let mut s = make_scene();

    s.update();
    assert_eq!(s.lid_angle(), 0.0);

    s.begin_open();
    s.update();
    // First step is clamped by the per-frame speed limit.
    assert!((s.lid_angle() - -a.lid_open_speed).abs() < 1e-6);

    for _ in 0..10_000 {
        s.update();
    }
    assert!((s.lid_angle() - a.lid_open_angle).abs() < 1e-2);
    assert!(s.lid_angle() >= a.lid_open_angle - 1e-3, "never overshoots");
}

#[test]
fn clear_particles_is_safe_to_repeat() {
    let mut s = make_scene();
    s.begin_open();
    for _ in 0..5 {
        let seed = s.spawn_tick().unwrap();
        s.insert_particle(seed, dummy_segments());
    }
    s.clear_particles();
    assert!(s.particles().is_empty());
    s.clear_particles();
    assert!(s.update().is_empty());
}

#[test]
fn camera_matrices_are_finite() {
    let mut s = make_scene();
    s.set_viewport(800, 600);
    assert!(s.camera.view_matrix().is_finite());
    assert!(s.camera.projection_matrix().is_finite());
    assert!(s.camera.view_proj().is_finite());
    assert_eq!(
        s.camera.eye,
        Vec3::from_array(config::SCENE.camera.position)
    );
}

#[test]
fn particle_ids_are_unique_and_ordered() {
    let mut s = make_scene();
    s.begin_open();
    let mut last = None;
    while let Some(seed) = s.spawn_tick() {
        let id = s.insert_particle(seed, dummy_segments());
        if let Some(prev) = last {
            assert!(id > prev);
        }
        last = Some(id);
    }
}
