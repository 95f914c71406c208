//! Entity pool: spawn, update and cull
//!
//! Entities live in one vector kept in id order, so every iteration is
//! deterministic.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPool {
    entities: Vec<Entity>,
    next_id: u32,
    max_particles: usize,
}

impl EntityPool {
    pub fn new(max_particles: usize) -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
            max_particles,
        }
    }

    /// Add an entity, assigning the next id
    pub fn spawn(&mut self, mut entity: Entity, now_ms: f64) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        entity.created_ms = now_ms;

        if entity.is_particle() {
            let live = self.entities.iter().filter(|e| e.is_particle()).count();
            if self.max_particles == 0 {
                return id;
            }
            if live >= self.max_particles {
                // Oldest particle has the lowest id
                if let Some(idx) = self.entities.iter().position(|e| e.is_particle()) {
                    self.entities.remove(idx);
                }
            }
        }

        self.entities.push(entity);
        id
    }

    pub fn get(&self, id: u32) -> Option<&Entity> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|idx| &self.entities[idx])
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Entity> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|idx| &mut self.entities[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.entities.iter().map(|e| e.id).collect()
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &Entity> {
        self.iter()
            .filter(|e| matches!(e.kind, EntityKind::Projectile(_)))
    }

    pub fn hostiles(&self) -> impl Iterator<Item = &Entity> {
        self.iter().filter(|e| matches!(e.kind, EntityKind::Hostile(_)))
    }

    pub fn bosses(&self) -> impl Iterator<Item = &Entity> {
        self.iter().filter(|e| e.is_boss())
    }

    /// Live hostiles and bosses
    pub fn targets(&self) -> impl Iterator<Item = &Entity> {
        self.iter().filter(|e| e.is_target() && e.is_alive())
    }

    pub fn pickups(&self) -> impl Iterator<Item = &Entity> {
        self.iter()
            .filter(|e| matches!(e.kind, EntityKind::Pickup { .. }))
    }

    pub fn particles(&self) -> impl Iterator<Item = &Entity> {
        self.iter().filter(|e| e.is_particle())
    }

    /// Live hostiles, excluding bosses
    pub fn hostile_count(&self) -> usize {
        self.hostiles().filter(|e| e.is_alive()).count()
    }

    pub fn has_boss(&self) -> bool {
        self.bosses().any(|e| e.is_alive())
    }

    /// Apply motion patterns and particle decay
    pub fn update(&mut self, dt: f32) {
        for entity in &mut self.entities {
            let Entity {
                pos, vel, motion, ..
            } = entity;
            motion.advance(pos, vel, dt);

            if let EntityKind::Particle(p) = &mut entity.kind {
                p.life = (p.life - p.decay * dt).max(0.0);
                p.size *= (1.0 - 0.05 * dt).max(0.0);
                if p.life <= 0.0 {
                    entity.consumed = true;
                }
            }
        }
    }

    /// Remove every entity matching `dead`, returning them in id order
    pub fn cull(&mut self, mut dead: impl FnMut(&Entity) -> bool) -> Vec<Entity> {
        let (removed, kept): (Vec<Entity>, Vec<Entity>) =
            std::mem::take(&mut self.entities).into_iter().partition(|e| dead(e));
        self.entities = kept;
        removed
    }

    /// Drop everything except particles
    pub fn clear_field(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| e.is_particle());
        before - self.entities.len()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Nearest live target to `point`; ties go to the lower id
    pub fn nearest_target(&self, point: Vec2) -> Option<&Entity> {
        self.targets().fold(None, |best: Option<&Entity>, e| match best {
            Some(b) if b.pos.distance_squared(point) <= e.pos.distance_squared(point) => Some(b),
            _ => Some(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Hostile, Motion, Particle, Shape};

    fn hostile(pos: Vec2) -> Entity {
        Entity::new(
            EntityKind::Hostile(Hostile {
                name: "drone".to_string(),
                tag: None,
                points: 10,
                solid: false,
                contact_damage: true,
                elite: false,
            }),
            pos,
            Shape::rect(8.0, 8.0),
        )
    }

    fn particle() -> Entity {
        Entity::new(
            EntityKind::Particle(Particle {
                color: 0xffffff,
                size: 3.0,
                life: 1.0,
                decay: 0.1,
            }),
            Vec2::ZERO,
            Shape::circle(1.0),
        )
    }

    #[test]
    fn test_ids_are_monotonic_and_ordered() {
        let mut pool = EntityPool::new(8);
        let a = pool.spawn(hostile(Vec2::ZERO), 0.0);
        let b = pool.spawn(hostile(Vec2::ONE), 0.0);
        pool.cull(|e| e.id == a);
        let c = pool.spawn(hostile(Vec2::ONE), 0.0);
        assert!(a < b && b < c);
        assert_eq!(pool.ids(), vec![b, c]);
        assert!(pool.get(b).is_some());
        assert!(pool.get(a).is_none());
    }

    #[test]
    fn test_particle_cap_drops_oldest() {
        let mut pool = EntityPool::new(3);
        let first = pool.spawn(particle(), 0.0);
        pool.spawn(hostile(Vec2::ZERO), 0.0);
        for _ in 0..3 {
            pool.spawn(particle(), 0.0);
        }
        assert_eq!(pool.particles().count(), 3);
        assert!(pool.get(first).is_none());
        assert_eq!(pool.hostile_count(), 1);
    }

    #[test]
    fn test_update_moves_and_decays() {
        let mut pool = EntityPool::new(8);
        let h = pool.spawn(hostile(Vec2::ZERO).with_velocity(Vec2::new(0.0, 2.0)), 0.0);
        let p = pool.spawn(particle(), 0.0);
        pool.update(1.5);
        assert_eq!(pool.get(h).unwrap().pos, Vec2::new(0.0, 3.0));

        let EntityKind::Particle(part) = &pool.get(p).unwrap().kind else {
            unreachable!()
        };
        assert!((part.life - 0.85).abs() < 1e-5);
        assert!(part.size < 3.0);

        pool.update(20.0);
        assert!(pool.get(p).unwrap().consumed);
    }

    #[test]
    fn test_cull_returns_removed_in_order() {
        let mut pool = EntityPool::new(8);
        for i in 0..5 {
            pool.spawn(hostile(Vec2::splat(i as f32)), 0.0);
        }
        let removed = pool.cull(|e| e.id % 2 == 1);
        assert_eq!(removed.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!(pool.ids(), vec![2, 4]);
    }

    #[test]
    fn test_nearest_target_tie_prefers_lower_id() {
        let mut pool = EntityPool::new(8);
        let left = pool.spawn(hostile(Vec2::new(-5.0, 0.0)), 0.0);
        pool.spawn(hostile(Vec2::new(5.0, 0.0)), 0.0);
        assert_eq!(pool.nearest_target(Vec2::ZERO).unwrap().id, left);

        pool.get_mut(left).unwrap().consumed = true;
        assert_ne!(pool.nearest_target(Vec2::ZERO).unwrap().id, left);
    }

    #[test]
    fn test_clear_field_keeps_particles() {
        let mut pool = EntityPool::new(8);
        pool.spawn(hostile(Vec2::ZERO).with_motion(Motion::Falling { gravity: 0.1 }), 0.0);
        pool.spawn(particle(), 0.0);
        assert_eq!(pool.clear_field(), 1);
        assert_eq!(pool.len(), 1);
        assert!(!pool.has_boss());
    }
}
