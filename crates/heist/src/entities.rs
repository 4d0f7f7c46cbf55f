//! Game entities

use std::any::Any;

use heist_engine::foundation::math::{Axis, Rect, Vec2};
use heist_engine::world::Entity;
use rand::rngs::StdRng;
use rand::Rng;

/// Draw layers, lowest first
pub mod layers {
    /// Floor props
    pub const PROPS: i32 = 10;
    /// Walls
    pub const WALLS: i32 = 20;
    /// Guards
    pub const GUARDS: i32 = 30;
    /// The player
    pub const PLAYER: i32 = 40;
}

/// Shared movement state of anything that walks
#[derive(Debug, Clone)]
pub struct Mover {
    /// Collision rect
    pub rect: Rect,
    /// Velocity in units per second
    pub velocity: Vec2,
    /// Displacement of the last step, along a single axis
    pub moving: Vec2,
}

impl Mover {
    /// Create a stationary mover
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            velocity: Vec2::zeros(),
            moving: Vec2::zeros(),
        }
    }

    /// Move along one axis only, so a wall hit can be resolved on that axis
    pub fn step(&mut self, axis: Axis, dt: f32) {
        let delta = axis.of(self.velocity) * dt;
        self.moving = match axis {
            Axis::X => Vec2::new(delta, 0.0),
            Axis::Y => Vec2::new(0.0, delta),
        };
        self.rect = self.rect.translate(self.moving);
    }

    /// Push the rect out of `other` against the last step.
    ///
    /// Returns the blocked direction, if the rects overlapped.
    pub fn push_out(&mut self, other: &Rect) -> Option<Direction> {
        if !self.rect.intersects(other) {
            return None;
        }

        let blocked = if self.moving.x > 0.0 {
            self.rect.x = other.left() - self.rect.w;
            Some(Direction::Right)
        } else if self.moving.x < 0.0 {
            self.rect.x = other.right();
            Some(Direction::Left)
        } else if self.moving.y > 0.0 {
            self.rect.y = other.top() - self.rect.h;
            Some(Direction::Down)
        } else if self.moving.y < 0.0 {
            self.rect.y = other.bottom();
            Some(Direction::Up)
        } else {
            None
        };
        self.moving = Vec2::zeros();
        blocked
    }
}

/// Compass direction on the map (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Negative y
    Up,
    /// Positive y
    Down,
    /// Negative x
    Left,
    /// Positive x
    Right,
}

impl Direction {
    /// All four directions
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit vector of this direction
    pub fn unit(self) -> Vec2 {
        match self {
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Impassable tile
#[derive(Debug, Clone)]
pub struct Wall {
    /// Tile rect
    pub rect: Rect,
}

impl Entity for Wall {
    fn rect(&self) -> Rect {
        self.rect
    }

    fn layer(&self) -> i32 {
        layers::WALLS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The burglar
#[derive(Debug, Clone)]
pub struct Player {
    /// Movement state
    pub mover: Mover,
    /// Loot collected so far
    pub loot: u32,
}

impl Player {
    /// Create a player at rest
    pub fn new(rect: Rect) -> Self {
        Self {
            mover: Mover::new(rect),
            loot: 0,
        }
    }
}

impl Entity for Player {
    fn rect(&self) -> Rect {
        self.mover.rect
    }

    fn layer(&self) -> i32 {
        layers::PLAYER
    }

    fn collision_response(&mut self, other: &dyn Entity) -> bool {
        self.mover.push_out(&other.rect()).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Patrolling guard
#[derive(Debug, Clone)]
pub struct Guard {
    /// Movement state
    pub mover: Mover,
    /// Patrol speed
    pub speed: f32,
    /// Side length of the square the guard watches
    pub sight: f32,
    /// The player is inside the watched square
    pub chasing: bool,
    rng: StdRng,
}

impl Guard {
    /// Create a guard heading right
    pub fn new(rect: Rect, speed: f32, sight: f32, rng: StdRng) -> Self {
        let mut mover = Mover::new(rect);
        mover.velocity = Direction::Right.unit() * speed;
        Self {
            mover,
            speed,
            sight,
            chasing: false,
            rng,
        }
    }

    /// Square around the guard searched for the player
    pub fn lurk_rect(&self) -> Rect {
        Rect::from_center(self.mover.rect.center(), self.sight, self.sight)
    }

    /// Head for `target`, capped at the patrol speed
    pub fn chase(&mut self, target: Vec2) {
        let offset = target - self.mover.rect.center();
        let distance = offset.norm();
        self.mover.velocity = if distance > self.speed {
            offset * (self.speed / distance)
        } else {
            offset
        };
        self.chasing = true;
    }

    /// Stop chasing and keep patrolling
    pub fn lose_track(&mut self) {
        if self.chasing {
            self.chasing = false;
            self.turn(None);
        }
    }

    /// Pick a new random heading, avoiding the blocked direction
    pub fn turn(&mut self, blocked: Option<Direction>) {
        let options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| Some(*direction) != blocked)
            .collect();
        let direction = options[self.rng.gen_range(0..options.len())];
        self.mover.velocity = direction.unit() * self.speed;
    }

    /// Bump into something impassable
    pub fn bump(&mut self, other: &Rect) -> bool {
        match self.mover.push_out(other) {
            Some(blocked) => {
                self.turn(Some(blocked));
                true
            }
            None => false,
        }
    }
}

impl Entity for Guard {
    fn rect(&self) -> Rect {
        self.mover.rect
    }

    fn layer(&self) -> i32 {
        layers::GUARDS
    }

    fn collision_response(&mut self, other: &dyn Entity) -> bool {
        self.bump(&other.rect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What an actionable prop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    /// Can be cracked for loot
    Safe,
    /// Can be searched
    Desk,
}

/// Prop the player can interact with when standing on it
#[derive(Debug, Clone)]
pub struct Actionable {
    /// Tile rect
    pub rect: Rect,
    /// Kind of prop
    pub kind: PropKind,
    /// Loot still inside
    pub loot: u32,
}

impl Actionable {
    /// Menu entries offered for this prop
    pub fn actions(&self) -> &'static [&'static str] {
        match self.kind {
            PropKind::Safe => &["crack", "inspect"],
            PropKind::Desk => &["search"],
        }
    }
}

impl Entity for Actionable {
    fn rect(&self) -> Rect {
        self.rect
    }

    fn layer(&self) -> i32 {
        layers::PROPS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
