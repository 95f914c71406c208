//! Collision detection and response for boxes and circles
//!
//! Shape tests are pure functions over positions and shapes. Resolution
//! (what a hit *means*) lives in `resolve`.

use glam::Vec2;

use super::entity::Shape;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Normal pointing from `b` toward `a`
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Overlap test between any two shapes
pub fn overlaps(a_pos: Vec2, a: &Shape, b_pos: Vec2, b: &Shape) -> bool {
    collide(a_pos, a, b_pos, b).hit
}

/// Full collision query between any two shapes
pub fn collide(a_pos: Vec2, a: &Shape, b_pos: Vec2, b: &Shape) -> CollisionResult {
    match (*a, *b) {
        (Shape::Rect { half: ha }, Shape::Rect { half: hb }) => aabb_aabb(a_pos, ha, b_pos, hb),
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(a_pos, ra, b_pos, rb)
        }
        (Shape::Circle { radius }, Shape::Rect { half }) => {
            circle_aabb(a_pos, radius, b_pos, half)
        }
        (Shape::Rect { half }, Shape::Circle { radius }) => {
            let mut result = circle_aabb(b_pos, radius, a_pos, half);
            result.normal = -result.normal;
            result
        }
    }
}

pub fn aabb_aabb(a_pos: Vec2, a_half: Vec2, b_pos: Vec2, b_half: Vec2) -> CollisionResult {
    let delta = a_pos - b_pos;
    let overlap = a_half + b_half - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return CollisionResult::miss();
    }
    let sep = least_penetration(delta, overlap);
    CollisionResult {
        hit: true,
        normal: sep.normal(),
        penetration: sep.depth,
    }
}

pub fn circle_circle(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = a_pos - b_pos;
    let reach = a_radius + b_radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }
    let dist = dist_sq.sqrt();
    // Coincident centres: push straight up
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        Vec2::NEG_Y
    };
    CollisionResult {
        hit: true,
        normal,
        penetration: reach - dist,
    }
}

pub fn circle_aabb(c_pos: Vec2, radius: f32, b_pos: Vec2, b_half: Vec2) -> CollisionResult {
    let local = c_pos - b_pos;
    let closest = local.clamp(-b_half, b_half);
    let offset = local - closest;
    let dist_sq = offset.length_squared();

    if dist_sq > f32::EPSILON {
        if dist_sq >= radius * radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        return CollisionResult {
            hit: true,
            normal: offset / dist,
            penetration: radius - dist,
        };
    }

    // Centre inside the box: exit through the nearest face
    let overlap = b_half + Vec2::splat(radius) - local.abs();
    let sep = least_penetration(local, overlap);
    CollisionResult {
        hit: true,
        normal: sep.normal(),
        penetration: sep.depth,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Minimal push needed to separate two overlapping boxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separation {
    pub axis: Axis,
    /// -1 or +1 along the axis
    pub sign: f32,
    pub depth: f32,
}

impl Separation {
    pub fn normal(&self) -> Vec2 {
        match self.axis {
            Axis::Horizontal => Vec2::new(self.sign, 0.0),
            Axis::Vertical => Vec2::new(0.0, self.sign),
        }
    }

    /// Translation to apply to the first body
    pub fn push(&self) -> Vec2 {
        self.normal() * self.depth
    }
}

/// Pick the axis of least overlap; ties go vertical
pub fn least_penetration(delta: Vec2, overlap: Vec2) -> Separation {
    let sign_of = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
    if overlap.x < overlap.y {
        Separation {
            axis: Axis::Horizontal,
            sign: sign_of(delta.x),
            depth: overlap.x,
        }
    } else {
        Separation {
            axis: Axis::Vertical,
            sign: sign_of(delta.y),
            depth: overlap.y,
        }
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Turn `velocity` a fraction of the way toward `target`, keeping its speed
pub fn steer_toward(velocity: Vec2, from: Vec2, target: Vec2, strength: f32) -> Vec2 {
    let speed = velocity.length();
    let desired = (target - from).normalize_or_zero();
    let current = velocity.normalize_or_zero();
    if desired == Vec2::ZERO || current == Vec2::ZERO {
        return velocity;
    }
    let blended = current.lerp(desired, strength.clamp(0.0, 1.0)).normalize_or_zero();
    if blended == Vec2::ZERO {
        velocity
    } else {
        blended * speed
    }
}

/// Keep a body inside the side and top walls, reflecting its velocity.
/// The bottom edge stays open. Returns true if a wall was hit.
pub fn wall_bounce(pos: &mut Vec2, vel: &mut Vec2, extents: Vec2, width: f32) -> bool {
    let mut bounced = false;
    if pos.x - extents.x < 0.0 {
        pos.x = extents.x;
        *vel = reflect_velocity(*vel, Vec2::X);
        bounced = true;
    } else if pos.x + extents.x > width {
        pos.x = width - extents.x;
        *vel = reflect_velocity(*vel, Vec2::NEG_X);
        bounced = true;
    }
    if pos.y - extents.y < 0.0 {
        pos.y = extents.y;
        *vel = reflect_velocity(*vel, Vec2::Y);
        bounced = true;
    }
    bounced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap_and_miss() {
        let a = Shape::rect(10.0, 10.0);
        let b = Shape::rect(5.0, 5.0);
        assert!(overlaps(Vec2::ZERO, &a, Vec2::new(14.0, 0.0), &b));
        assert!(!overlaps(Vec2::ZERO, &a, Vec2::new(15.0, 0.0), &b));
    }

    #[test]
    fn test_circle_overlap() {
        let a = Shape::circle(5.0);
        let b = Shape::circle(5.0);
        assert!(overlaps(Vec2::ZERO, &a, Vec2::new(9.0, 0.0), &b));
        assert!(!overlaps(Vec2::ZERO, &a, Vec2::new(10.0, 0.0), &b));

        let result = collide(Vec2::ZERO, &a, Vec2::ZERO, &b);
        assert!(result.hit);
        assert!(result.normal.is_finite());
    }

    #[test]
    fn test_circle_box_corner() {
        let ball = Shape::circle(5.0);
        let block = Shape::rect(10.0, 10.0);
        // Just past the corner diagonal
        assert!(!overlaps(Vec2::new(14.0, 14.0), &ball, Vec2::ZERO, &block));
        assert!(overlaps(Vec2::new(13.0, 13.0), &ball, Vec2::ZERO, &block));

        // Symmetric regardless of argument order
        let r1 = collide(Vec2::new(13.0, 0.0), &ball, Vec2::ZERO, &block);
        let r2 = collide(Vec2::ZERO, &block, Vec2::new(13.0, 0.0), &ball);
        assert!(r1.hit && r2.hit);
        assert_eq!(r1.normal, -r2.normal);
    }

    #[test]
    fn test_least_penetration_tie_goes_vertical() {
        let sep = least_penetration(Vec2::new(3.0, -3.0), Vec2::new(4.0, 4.0));
        assert_eq!(sep.axis, Axis::Vertical);
        assert_eq!(sep.push(), Vec2::new(0.0, -4.0));

        let sep = least_penetration(Vec2::new(-3.0, 1.0), Vec2::new(2.0, 6.0));
        assert_eq!(sep.axis, Axis::Horizontal);
        assert_eq!(sep.push(), Vec2::new(-2.0, 0.0));
    }

    #[test]
    fn test_reflect_velocity() {
        // Moving right, hits vertical wall (normal pointing left)
        let velocity = Vec2::new(100.0, 0.0);
        let normal = Vec2::new(-1.0, 0.0);

        let reflected = reflect_velocity(velocity, normal);
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_steer_keeps_speed_and_guards_zero() {
        let v = steer_toward(Vec2::new(0.0, -10.0), Vec2::ZERO, Vec2::new(100.0, 0.0), 0.5);
        assert!((v.length() - 10.0).abs() < 0.001);
        assert!(v.x > 0.0);

        // Target on top of the projectile: unchanged
        let v = steer_toward(Vec2::new(0.0, -10.0), Vec2::ONE, Vec2::ONE, 0.5);
        assert_eq!(v, Vec2::new(0.0, -10.0));

        // Stationary projectile stays stationary
        assert_eq!(steer_toward(Vec2::ZERO, Vec2::ZERO, Vec2::X, 1.0), Vec2::ZERO);
    }

    #[test]
    fn test_wall_bounce_leaves_bottom_open() {
        let mut pos = Vec2::new(2.0, 50.0);
        let mut vel = Vec2::new(-3.0, 1.0);
        assert!(wall_bounce(&mut pos, &mut vel, Vec2::splat(4.0), 100.0));
        assert_eq!(pos.x, 4.0);
        assert_eq!(vel, Vec2::new(3.0, 1.0));

        let mut pos = Vec2::new(50.0, 500.0);
        let mut vel = Vec2::new(0.0, 5.0);
        assert!(!wall_bounce(&mut pos, &mut vel, Vec2::splat(4.0), 100.0));
        assert_eq!(vel.y, 5.0);
    }
}
