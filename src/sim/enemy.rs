//! Patrolling, shooting enemies and their projectiles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::Aabb;
use crate::consts::*;

/// Projectile launch velocity (x is multiplied by facing)
const PROJECTILE_SPEED_X: f32 = 150.0;
const PROJECTILE_SPEED_Y: f32 = -100.0;
/// Projectiles leave from just above the enemy's feet
const MUZZLE_OFFSET_Y: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    /// Bottom-center
    pub pos: Vec2,
    pub start_x: f32,
    /// -1 or 1
    pub direction: f32,
    pub patrol_range: f32,
    pub shoot_interval_ms: f32,
    /// Counts down to the next shot; the first shot is immediate
    pub shoot_timer_ms: f32,
    pub color: u32,
}

impl Enemy {
    pub fn new(id: u32, pos: Vec2, patrol_range: Option<f32>, shoot_interval_ms: Option<f32>, color: u32) -> Self {
        Self {
            id,
            pos,
            start_x: pos.x,
            direction: 1.0,
            patrol_range: patrol_range.unwrap_or(ENEMY_PATROL_RANGE).max(0.0),
            shoot_interval_ms: shoot_interval_ms.unwrap_or(ENEMY_SHOOT_INTERVAL_MS).max(1.0),
            shoot_timer_ms: 0.0,
            color,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_top_left(
            self.pos.x - ENEMY_WIDTH * 0.5,
            self.pos.y - ENEMY_HEIGHT,
            ENEMY_WIDTH,
            ENEMY_HEIGHT,
        )
    }

    /// Patrol within ±range/2 of the start and fire on schedule
    pub fn update(&mut self, elapsed_ms: f32, next_projectile_id: u32) -> Option<Projectile> {
        let half_range = self.patrol_range * 0.5;
        self.pos.x += self.direction * ENEMY_PATROL_SPEED * elapsed_ms / 1000.0;
        if self.pos.x <= self.start_x - half_range {
            self.pos.x = self.start_x - half_range;
            self.direction = 1.0;
        } else if self.pos.x >= self.start_x + half_range {
            self.pos.x = self.start_x + half_range;
            self.direction = -1.0;
        }

        self.shoot_timer_ms -= elapsed_ms;
        if self.shoot_timer_ms > 0.0 {
            return None;
        }
        self.shoot_timer_ms = self.shoot_interval_ms;
        Some(Projectile {
            id: next_projectile_id,
            pos: Vec2::new(self.pos.x, self.pos.y - MUZZLE_OFFSET_Y),
            vel: Vec2::new(self.direction * PROJECTILE_SPEED_X, PROJECTILE_SPEED_Y),
            age_ms: 0.0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    /// Center
    pub pos: Vec2,
    pub vel: Vec2,
    pub age_ms: f32,
}

impl Projectile {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(PROJECTILE_SIZE * 0.5))
    }

    /// Ballistic flight. Returns false once expired or stopped by a solid.
    pub fn update(&mut self, elapsed_ms: f32, solids: &[Aabb]) -> bool {
        let dt = elapsed_ms / 1000.0;
        self.vel.y += GRAVITY * dt;
        self.pos += self.vel * dt;
        self.age_ms += elapsed_ms;
        if self.age_ms >= PROJECTILE_LIFETIME_MS {
            return false;
        }
        let bounds = self.aabb();
        !solids.iter().any(|s| s.overlaps(&bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patrol_turns_at_range() {
        let mut enemy = Enemy::new(1, Vec2::new(500.0, 400.0), None, Some(1e9), 0);
        enemy.update(16.0, 1);
        // 1 s right at 100 u/s hits the +100 edge
        for _ in 0..70 {
            enemy.update(16.0, 1);
        }
        assert_eq!(enemy.direction, -1.0);
        assert!(enemy.pos.x <= 600.0);
        for _ in 0..200 {
            enemy.update(16.0, 1);
            assert!(enemy.pos.x >= 400.0 && enemy.pos.x <= 600.0);
        }
    }

    #[test]
    fn test_shoots_immediately_then_on_interval() {
        let mut enemy = Enemy::new(1, Vec2::new(500.0, 400.0), None, None, 0);
        let shot = enemy.update(16.0, 7).unwrap();
        assert_eq!(shot.id, 7);
        assert_eq!(shot.vel, Vec2::new(150.0, -100.0));
        assert_eq!(shot.pos.y, 390.0);

        let mut fired = 0;
        // 2000 ms worth of 16 ms ticks
        for _ in 0..125 {
            if enemy.update(16.0, 8).is_some() {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_projectile_lifetime_and_solids() {
        let mut shot = Projectile {
            id: 1,
            pos: Vec2::new(0.0, -10_000.0),
            vel: Vec2::new(150.0, -100.0),
            age_ms: 0.0,
        };
        let mut alive_ticks = 0;
        while shot.update(100.0, &[]) {
            alive_ticks += 1;
        }
        assert_eq!(alive_ticks, 29);

        let floor = [Aabb::from_top_left(-100.0, 10.0, 400.0, 32.0)];
        let mut shot = Projectile {
            id: 2,
            pos: Vec2::ZERO,
            vel: Vec2::new(0.0, 200.0),
            age_ms: 0.0,
        };
        assert!(!shot.update(100.0, &floor));
    }
}
