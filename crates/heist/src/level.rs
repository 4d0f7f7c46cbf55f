//! Level layout
//!
//! Levels are tile grids: `#` wall, `P` player start, `G` guard start,
//! `S` safe, `D` desk, anything else floor.

use heist_engine::foundation::math::Rect;
use heist_engine::physics::Group;
use heist_engine::world::{EntityId, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameplayConfig;
use crate::entities::{Actionable, Guard, Player, PropKind, Wall};
use crate::game::GameError;

/// Built-in level
pub const MANSION: &[&str] = &[
    "############",
    "#P.........#",
    "#..###..S..#",
    "#....#.....#",
    "#.G..#..D..#",
    "############",
];

/// Side of the player and guard rects, relative to the tile size
const ACTOR_SCALE: f32 = 0.5;

/// Entities spawned from a layout, grouped the way the detectors need them
#[derive(Debug)]
pub struct Level {
    /// The player
    pub player: EntityId,
    /// The guard
    pub guard: EntityId,
    /// Impassable tiles
    pub walls: Group,
    /// Props the player can act on
    pub actionables: Group,
}

/// Spawn every tile of `layout` into `world`
pub fn spawn_level(world: &mut World, layout: &[&str], gameplay: &GameplayConfig) -> Result<Level, GameError> {
    let tile = gameplay.tile_size;
    let actor = tile * ACTOR_SCALE;
    let walls = Group::new();
    let actionables = Group::new();
    let mut player = None;
    let mut guard = None;

    for (row, line) in layout.iter().enumerate() {
        for (col, cell) in line.chars().enumerate() {
            let rect = Rect::new(col as f32 * tile, row as f32 * tile, tile, tile);
            match cell {
                '#' => walls.push(world.spawn(Wall { rect })?),
                'S' | 'D' => {
                    let (kind, loot) = if cell == 'S' { (PropKind::Safe, 500) } else { (PropKind::Desk, 0) };
                    actionables.push(world.spawn(Actionable { rect, kind, loot })?);
                }
                'P' => {
                    let id = world.spawn(Player::new(Rect::from_center(rect.center(), actor, actor)))?;
                    if player.replace(id).is_some() {
                        return Err(GameError::Layout(format!("second player start at row {row}, column {col}")));
                    }
                }
                'G' => {
                    let rng = StdRng::seed_from_u64(gameplay.seed.wrapping_add((row * line.len() + col) as u64));
                    let body = Rect::from_center(rect.center(), actor, actor);
                    let id = world.spawn(Guard::new(body, gameplay.guard_speed, gameplay.guard_sight, rng))?;
                    if guard.replace(id).is_some() {
                        return Err(GameError::Layout(format!("second guard start at row {row}, column {col}")));
                    }
                }
                _ => {}
            }
        }
    }

    let player = player.ok_or_else(|| GameError::Layout("no player start".to_string()))?;
    let guard = guard.ok_or_else(|| GameError::Layout("no guard start".to_string()))?;
    log::info!(
        "Level spawned: {} walls, {} actionables, {} entities",
        walls.len(),
        actionables.len(),
        world.len()
    );

    Ok(Level {
        player,
        guard,
        walls,
        actionables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mansion_spawns_every_tile_kind() {
        let mut world = World::new();
        let level = spawn_level(&mut world, MANSION, &GameplayConfig::default()).unwrap();

        assert_eq!(level.actionables.len(), 2);
        assert!(level.walls.len() > 20);
        assert!(world.get_as::<Player>(level.player).is_some());
        assert!(world.get_as::<Guard>(level.guard).is_some());
    }

    #[test]
    fn test_layout_without_player_is_rejected() {
        let mut world = World::new();
        let result = spawn_level(&mut world, &["####", "#G.#", "####"], &GameplayConfig::default());
        assert!(matches!(result, Err(GameError::Layout(_))));
    }

    #[test]
    fn test_layout_with_two_guards_is_rejected() {
        let mut world = World::new();
        let result = spawn_level(&mut world, &["#####", "#PGG#", "#####"], &GameplayConfig::default());
        assert!(matches!(result, Err(GameError::Layout(msg)) if msg.contains("second guard")));
    }
}
