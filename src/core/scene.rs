// Pure scene state for the surprise box: the open/burst state machine, the
// particle set and its physics, and the camera.
//
// Nothing in here touches the DOM or the GPU; the wasm layer schedules
// callbacks into this module and the renderer reads transforms out of it.
// That split keeps the whole state machine natively testable.

use crate::config::{CameraTable, SceneConfig};
use glam::{Mat4, Quat, Vec3};
use rand::prelude::*;
use smallvec::SmallVec;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoxState {
    Closed,
    Opening,
    Open,
}

/// Right-handed perspective camera, fixed at construction apart from aspect.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn from_table(cfg: &CameraTable) -> Self {
        Self {
            eye: Vec3::from_array(cfg.position),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 1.0,
            fovy_radians: cfg.fov_degrees.to_radians(),
            znear: cfg.near,
            zfar: cfg.far,
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// The synchronous half of a spawn: everything decided before the typeface
/// resolves. Geometry is attached later by `insert_particle`.
#[derive(Clone, Debug)]
pub struct ParticleSeed {
    pub snippet: &'static str,
    pub color: [f32; 3],
    pub position: Vec3,
    pub velocity: Vec3,
}

/// A live snippet particle. `segments` is model-space line-list geometry
/// (vertex pairs); the renderer keys GPU buffers by `id` so pruning can
/// release them without re-inspecting the renderable.
#[derive(Clone, Debug)]
pub struct Particle {
    pub id: u64,
    pub color: [f32; 3],
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
    pub segments: Vec<Vec3>,
}

impl Particle {
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

pub struct SceneCore {
    cfg: &'static SceneConfig,
    state: BoxState,
    /// Ambient rotation of the whole box group, radians.
    yaw: f32,
    lid_angle: f32,
    /// Insertion order is spawn order.
    particles: Vec<Particle>,
    /// Spawn invocations issued this session, independent of live count.
    spawned: u32,
    next_particle_id: u64,
    rng: StdRng,
    pub camera: Camera,
}

impl SceneCore {
    pub fn new(cfg: &'static SceneConfig, seed: u64) -> Self {
        Self {
            cfg,
            state: BoxState::Closed,
            yaw: 0.0,
            lid_angle: 0.0,
            particles: Vec::new(),
            spawned: 0,
            next_particle_id: 0,
            rng: StdRng::seed_from_u64(seed),
            camera: Camera::from_table(&cfg.camera),
        }
    }

    pub fn state(&self) -> BoxState {
        self.state
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn lid_angle(&self) -> f32 {
        self.lid_angle
    }

    /// Click entry point. Only the `Closed -> Opening` edge exists; clicks in
    /// any other state are ignored, which is also what keeps the spawn-timer
    /// chain unique.
    pub fn begin_open(&mut self) -> bool {
        if self.state != BoxState::Closed {
            return false;
        }
        self.state = BoxState::Opening;
        true
    }

    /// Burst exhausted; the recurring spawn timer should be cancelled.
    pub fn burst_complete(&self) -> bool {
        self.spawned >= self.cfg.particles.burst_count
    }

    /// One spawn-timer tick. Issues the randomized parameters for one
    /// particle, counting invocations rather than surviving particles; the
    /// final issue of the burst transitions to `Open`. Returns `None` when
    /// there is nothing left to issue.
    pub fn spawn_tick(&mut self) -> Option<ParticleSeed> {
        if self.state == BoxState::Closed || self.burst_complete() {
            return None;
        }
        self.spawned += 1;
        if self.burst_complete() {
            self.state = BoxState::Open;
        }
        let p = &self.cfg.particles;
        let snippet = self.cfg.snippets[self.rng.gen_range(0..self.cfg.snippets.len())];
        let color = self.cfg.palette[self.rng.gen_range(0..self.cfg.palette.len())];
        // World position of the box is the origin; scatter around it.
        let position = Vec3::new(
            self.rng.gen_range(-p.spawn_jitter..=p.spawn_jitter),
            0.0,
            self.rng.gen_range(-p.spawn_jitter..=p.spawn_jitter),
        );
        let velocity = Vec3::new(
            self.rng.gen_range(-p.velocity_half_x..=p.velocity_half_x),
            self.rng.gen_range(0.0..=p.velocity_max_y),
            self.rng.gen_range(-p.velocity_half_z..=p.velocity_half_z),
        );
        Some(ParticleSeed {
            snippet,
            color,
            position,
            velocity,
        })
    }

    /// Attach resolved geometry to a seed and add the particle to the scene.
    /// Returns the id the renderer will use for GPU residency.
    pub fn insert_particle(&mut self, seed: ParticleSeed, segments: Vec<Vec3>) -> u64 {
        let id = self.next_particle_id;
        self.next_particle_id += 1;
        self.particles.push(Particle {
            id,
            color: seed.color,
            position: seed.position,
            velocity: seed.velocity,
            orientation: Quat::IDENTITY,
            segments,
        });
        id
    }

    /// Per-frame step. The box yaw always advances; the lid eases toward its
    /// open angle once the box is no longer closed; particles advance and are
    /// pruned in the same pass. Returns the ids of pruned particles so their
    /// GPU resources can be released this frame.
    pub fn update(&mut self) -> SmallVec<[u64; 4]> {
        let a = &self.cfg.animation;
        self.yaw += a.rotation_speed;
        if self.state != BoxState::Closed {
            let step = (a.lid_open_angle - self.lid_angle) * a.lid_blend_factor;
            self.lid_angle += step.clamp(-a.lid_open_speed, a.lid_open_speed);
        }

        let mut removed = SmallVec::new();
        if self.particles.is_empty() && self.state == BoxState::Closed {
            return removed;
        }
        let p = &self.cfg.particles;
        let rot_x = Quat::from_rotation_x(p.rotation_step[0]);
        let rot_y = Quat::from_rotation_y(p.rotation_step[1]);
        // Reverse traversal so removal never skips a neighbor.
        let mut i = self.particles.len();
        while i > 0 {
            i -= 1;
            let part = &mut self.particles[i];
            part.velocity.y -= p.gravity;
            part.position += part.velocity;
            part.orientation = (part.orientation * rot_x * rot_y).normalize();
            if part.position.y < p.despawn_y {
                removed.push(part.id);
                self.particles.remove(i);
            }
        }
        removed
    }

    /// Host-driven resize: aspect only. Zero-sized containers are ignored
    /// rather than poisoning the projection with a division by zero.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.aspect = width as f32 / height as f32;
    }

    /// Dispose path: drop every live particle from the collection. GPU-side
    /// release happens in the renderer, keyed by the same ids.
    pub fn clear_particles(&mut self) {
        self.particles.clear();
    }

    pub fn body_model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.yaw)
    }

    /// Lid transform: hinged along the rear top edge of the body, so the lid
    /// swings up and back as `lid_angle` approaches its target.
    pub fn lid_model_matrix(&self) -> Mat4 {
        let lid = &self.cfg.box_mesh.lid;
        let hinge = Vec3::new(0.0, lid.offset_y, -lid.depth * 0.5);
        let center_from_hinge = Vec3::new(0.0, lid.height * 0.5, lid.depth * 0.5);
        Mat4::from_rotation_y(self.yaw)
            * Mat4::from_translation(hinge)
            * Mat4::from_rotation_x(self.lid_angle)
            * Mat4::from_translation(center_from_hinge)
    }
}
