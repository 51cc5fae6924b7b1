//! Arcade physics: axis-separated AABB resolution
//!
//! Bodies are boxes moved by velocity, pulled by gravity, slowed by
//! horizontal drag and blocked by static solids. Contact flags record which
//! sides were blocked during the last step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{GRAVITY, PLAYER_DRAG_X, PLAYER_MAX_FALL_SPEED, PLAYER_RADIUS, PLAYER_SPEED};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box given by its top-left corner and size
    pub fn from_top_left(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Strict overlap; touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.min.x && x <= self.max.x
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Sides blocked during the last step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// What a controller may read from and write to its physics body
pub trait PhysicsPort {
    fn position(&self) -> Vec2;
    fn velocity(&self) -> Vec2;
    fn contacts(&self) -> ContactFlags;
    fn set_velocity(&mut self, velocity: Vec2);
    /// Move without sweeping; clears contacts
    fn teleport(&mut self, position: Vec2);
}

/// A dynamic box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Center
    pub pos: Vec2,
    pub half: Vec2,
    pub vel: Vec2,
    pub max_vel: Vec2,
    /// Horizontal deceleration (units/s²)
    pub drag_x: f32,
    pub contacts: ContactFlags,
}

impl Body {
    pub fn new(pos: Vec2, half: Vec2) -> Self {
        Self {
            pos,
            half,
            vel: Vec2::ZERO,
            max_vel: Vec2::new(f32::INFINITY, f32::INFINITY),
            drag_x: 0.0,
            contacts: ContactFlags::default(),
        }
    }

    /// Player-tuned body: 32x32, drag 800, max velocity (300, 1000)
    pub fn player(spawn: Vec2) -> Self {
        Self {
            max_vel: Vec2::new(PLAYER_SPEED, PLAYER_MAX_FALL_SPEED),
            drag_x: PLAYER_DRAG_X,
            ..Self::new(spawn, Vec2::splat(PLAYER_RADIUS))
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.half)
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.half.y
    }
}

impl PhysicsPort for Body {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn velocity(&self) -> Vec2 {
        self.vel
    }

    fn contacts(&self) -> ContactFlags {
        self.contacts
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.vel = velocity;
    }

    fn teleport(&mut self, position: Vec2) {
        self.pos = position;
        self.contacts = ContactFlags::default();
    }
}

/// Most a body may travel in one sub-step, as a fraction of its half extent
const SUBSTEP_FRACTION: f32 = 0.5;
const MAX_SUBSTEPS: u32 = 16;

/// The world: gravity and bounds. The bottom edge is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcadeWorld {
    pub bounds: Aabb,
    pub gravity: f32,
}

impl ArcadeWorld {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: Aabb::new(Vec2::ZERO, Vec2::new(width, height)),
            gravity: GRAVITY,
        }
    }

    /// Integrate one step of `dt_s` seconds and resolve against `solids`
    pub fn step(&self, body: &mut Body, dt_s: f32, solids: &[Aabb]) {
        body.contacts = ContactFlags::default();
        if dt_s <= 0.0 {
            return;
        }

        body.vel.y += self.gravity * dt_s;

        if body.drag_x > 0.0 {
            let drag = body.drag_x * dt_s;
            body.vel.x = if body.vel.x.abs() <= drag {
                0.0
            } else {
                body.vel.x - drag * body.vel.x.signum()
            };
        }

        body.vel = body.vel.clamp(-body.max_vel, body.max_vel);

        // Sub-step so fast falls cannot tunnel through thin platforms
        let travel = body.vel.abs() * dt_s;
        let limit = (body.half.min_element() * SUBSTEP_FRACTION).max(1.0);
        let steps = ((travel.max_element() / limit).ceil() as u32).clamp(1, MAX_SUBSTEPS);
        let sub_dt = dt_s / steps as f32;

        for _ in 0..steps {
            self.move_x(body, sub_dt, solids);
            self.move_y(body, sub_dt, solids);
        }
    }

    fn move_x(&self, body: &mut Body, dt_s: f32, solids: &[Aabb]) {
        body.pos.x += body.vel.x * dt_s;
        for solid in solids {
            if !body.aabb().overlaps(solid) {
                continue;
            }
            if body.vel.x > 0.0 {
                body.pos.x = solid.min.x - body.half.x;
                body.contacts.right = true;
            } else if body.vel.x < 0.0 {
                body.pos.x = solid.max.x + body.half.x;
                body.contacts.left = true;
            } else {
                continue;
            }
            body.vel.x = 0.0;
        }

        if body.pos.x - body.half.x < self.bounds.min.x {
            body.pos.x = self.bounds.min.x + body.half.x;
            body.vel.x = body.vel.x.max(0.0);
            body.contacts.left = true;
        } else if body.pos.x + body.half.x > self.bounds.max.x {
            body.pos.x = self.bounds.max.x - body.half.x;
            body.vel.x = body.vel.x.min(0.0);
            body.contacts.right = true;
        }
    }

    fn move_y(&self, body: &mut Body, dt_s: f32, solids: &[Aabb]) {
        body.pos.y += body.vel.y * dt_s;
        for solid in solids {
            if !body.aabb().overlaps(solid) {
                continue;
            }
            if body.vel.y > 0.0 {
                body.pos.y = solid.min.y - body.half.y;
                body.contacts.down = true;
            } else if body.vel.y < 0.0 {
                body.pos.y = solid.max.y + body.half.y;
                body.contacts.up = true;
            } else {
                continue;
            }
            body.vel.y = 0.0;
        }

        if body.pos.y - body.half.y < self.bounds.min.y {
            body.pos.y = self.bounds.min.y + body.half.y;
            body.vel.y = body.vel.y.max(0.0);
            body.contacts.up = true;
        }
    }
}
