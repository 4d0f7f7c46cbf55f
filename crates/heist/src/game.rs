//! Headless game loop
//!
//! Each tick the guard looks around, both actors move one axis at a time
//! (collisions are resolved after each axis), and the action menu is rebuilt
//! from the props under the player.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use heist_engine::core::config::ConfigError;
use heist_engine::foundation::math::{Axis, Vec2};
use heist_engine::physics::{typed, AabbStrategy, CollisionDetector, Group, TypePair};
use heist_engine::world::{World, WorldError};
use thiserror::Error;

use crate::config::{GameConfig, GameplayConfig};
use crate::entities::{Actionable, Direction, Guard, Player, PropKind, Wall};
use crate::level::{self, Level};

/// Game errors
#[derive(Error, Debug)]
pub enum GameError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// World rejected an entity or query
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// Level layout is unusable
    #[error("Invalid layout: {0}")]
    Layout(String),
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The guard reached the player
    Caught {
        /// Tick of the capture
        tick: u32,
    },
    /// The configured number of ticks elapsed
    TimeUp {
        /// Loot carried at the end
        loot: u32,
    },
}

/// Scripted player input: walk in a direction for a number of ticks
const ROUTE: &[(Direction, u32)] = &[
    (Direction::Right, 140),
    (Direction::Down, 30),
    (Direction::Down, 45),
    (Direction::Left, 60),
];

/// Running game state
pub struct Heist {
    world: World,
    level: Level,
    gameplay: GameplayConfig,
    player_detector: CollisionDetector,
    guard_detector: CollisionDetector,
    action_detector: CollisionDetector,
    caught: Rc<Cell<bool>>,
    nearby: Rc<RefCell<Vec<PropKind>>>,
    menu: Vec<PropKind>,
    tick: u32,
}

impl Heist {
    /// Spawn the built-in level and wire up the detectors
    pub fn new(config: &GameConfig) -> Result<Self, GameError> {
        let mut world = World::from_config(&config.world);
        let level = level::spawn_level(&mut world, level::MANSION, &config.gameplay)?;

        // Player against walls
        let mut player_detector = CollisionDetector::from_config(&config.collision);
        player_detector.register_once(
            "player",
            "walls",
            Group::from_ids([level.player]),
            level.walls.clone(),
            player_detector.default_strategy(),
            TypePair::of::<Player, Wall>(),
            typed(|player: &mut Player, wall: &mut Wall| {
                player.mover.push_out(&wall.rect);
            }),
        );

        // Guard against walls and the player
        let caught = Rc::new(Cell::new(false));
        let obstacles: Group = level.walls.snapshot().into_iter().chain([level.player]).collect();
        let mut guard_detector = CollisionDetector::from_config(&config.collision);
        guard_detector.register_once(
            "guard",
            "walls",
            Group::from_ids([level.guard]),
            obstacles,
            guard_detector.default_strategy(),
            TypePair::of::<Guard, Wall>(),
            typed(|guard: &mut Guard, wall: &mut Wall| {
                guard.bump(&wall.rect);
            }),
        );
        let flag = Rc::clone(&caught);
        guard_detector.on_collision(move |guard: &mut Guard, _: &mut Player| {
            guard.mover.velocity = Vec2::zeros();
            flag.set(true);
        });

        // Player against props, feeding the action menu
        let nearby = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&nearby);
        let mut action_detector = CollisionDetector::from_config(&config.collision);
        action_detector.register_once(
            "player",
            "stuff",
            Group::from_ids([level.player]),
            level.actionables.clone(),
            Rc::new(AabbStrategy),
            TypePair::of::<Player, Actionable>(),
            typed(move |player: &mut Player, prop: &mut Actionable| {
                seen.borrow_mut().push(prop.kind);
                if prop.kind == PropKind::Safe && prop.loot > 0 {
                    log::info!("Cracked the safe: {} loot", prop.loot);
                    player.loot += prop.loot;
                    prop.loot = 0;
                }
            }),
        );

        Ok(Self {
            world,
            level,
            gameplay: config.gameplay.clone(),
            player_detector,
            guard_detector,
            action_detector,
            caught,
            nearby,
            menu: Vec::new(),
            tick: 0,
        })
    }

    /// Run until caught or out of ticks
    pub fn run(&mut self) -> Result<Outcome, GameError> {
        while self.tick < self.gameplay.ticks {
            self.tick += 1;
            self.update()?;
            if self.caught.get() {
                log::info!("Caught by the guard at tick {}", self.tick);
                return Ok(Outcome::Caught { tick: self.tick });
            }
        }
        let loot = self.world.get_as::<Player>(self.level.player).map_or(0, |p| p.loot);
        Ok(Outcome::TimeUp { loot })
    }

    fn update(&mut self) -> Result<(), GameError> {
        self.steer_player();
        self.perceive()?;

        let dt = self.gameplay.timestep;
        for axis in [Axis::X, Axis::Y] {
            if let Some(player) = self.world.get_as_mut::<Player>(self.level.player) {
                player.mover.step(axis, dt);
            }
            if let Some(guard) = self.world.get_as_mut::<Guard>(self.level.guard) {
                guard.mover.step(axis, dt);
            }
            self.player_detector.check(&mut self.world);
            self.guard_detector.check(&mut self.world);
        }

        self.nearby.borrow_mut().clear();
        self.action_detector.check(&mut self.world);
        self.refresh_menu();

        let interval = self.gameplay.pick_interval;
        if interval > 0 && self.tick % interval == 0 {
            if let Some(player) = self.world.get(self.level.player) {
                let cursor = player.rect().center();
                self.pick(cursor);
            }
        }
        Ok(())
    }

    fn steer_player(&mut self) {
        let speed = self.gameplay.player_speed;
        let mut elapsed = 0;
        let mut velocity = Vec2::zeros();
        for &(direction, ticks) in ROUTE {
            elapsed += ticks;
            if self.tick <= elapsed {
                velocity = direction.unit() * speed;
                break;
            }
        }
        if let Some(player) = self.world.get_as_mut::<Player>(self.level.player) {
            player.mover.velocity = velocity;
        }
    }

    /// Guard looks for the player inside its lurk rect
    fn perceive(&mut self) -> Result<(), GameError> {
        let Some(lurk) = self.world.get_as::<Guard>(self.level.guard).map(Guard::lurk_rect) else {
            return Ok(());
        };
        let spotted = self.world.get_entities_in_region(&lurk)?.contains(&self.level.player);
        let target = self.world.get(self.level.player).map(|player| player.rect().center());

        if let Some(guard) = self.world.get_as_mut::<Guard>(self.level.guard) {
            match target {
                Some(target) if spotted => {
                    if !guard.chasing {
                        log::info!("Guard spotted the player at tick {}", self.tick);
                    }
                    guard.chase(target);
                }
                _ => guard.lose_track(),
            }
        }
        Ok(())
    }

    fn refresh_menu(&mut self) {
        let nearby = self.nearby.borrow();
        if *nearby == self.menu {
            return;
        }
        if nearby.is_empty() {
            log::debug!("Action menu closed");
        } else {
            let actions: Vec<&str> = self
                .level
                .actionables
                .snapshot()
                .into_iter()
                .filter_map(|id| self.world.get_as::<Actionable>(id))
                .filter(|prop| nearby.contains(&prop.kind))
                .flat_map(|prop| prop.actions().iter().copied())
                .collect();
            log::info!("Action menu: {actions:?}");
        }
        self.menu.clone_from(&nearby);
    }

    /// Log what sits under a cursor, top-most first
    fn pick(&self, cursor: Vec2) {
        let names: Vec<&str> = self
            .world
            .get_entities_at_point(cursor)
            .into_iter()
            .filter_map(|id| self.world.entity_type(id))
            .map(|ty| ty.name.rsplit("::").next().unwrap_or(ty.name))
            .collect();
        log::debug!("Tick {}: pick at ({:.0}, {:.0}) -> {names:?}", self.tick, cursor.x, cursor.y);
    }

    /// World being simulated
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Spawned level
    pub fn level(&self) -> &Level {
        &self.level
    }
}
