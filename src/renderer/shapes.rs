//! Shape generation for 2D primitives
//!
//! Projects the simulation into a flat list of screen-space shapes. The list
//! is backend-agnostic; the canvas backend only walks it.

use glam::Vec2;

use crate::sim::{Entity, Obstacle, PickupKind, Player, Simulation};

/// Linear RGBA, each channel in [0, 1]
pub type Rgba = [f32; 4];

pub const BACKGROUND: Rgba = [0.02, 0.04, 0.03, 1.0];
const GRID: Rgba = [0.22, 1.0, 0.08, 0.06];
const GROUND: Rgba = [0.22, 1.0, 0.08, 0.95];
const GROUND_CRASH: Rgba = [1.0, 0.21, 0.37, 0.95];
const PLAYER: Rgba = [0.91, 0.97, 0.93, 1.0];
const SHIELD: Rgba = [0.35, 0.8, 1.0, 0.6];

const GRID_SPACING: f32 = 70.0;
const GROUND_WIDTH: f32 = 3.0;
/// Margin beyond the frame inside which shapes are still emitted
const CULL_MARGIN: f32 = 40.0;

/// One drawable primitive in screen coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Segment {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Rgba,
    },
    Rect {
        min: Vec2,
        size: Vec2,
        color: Rgba,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
        filled: bool,
    },
}

/// CSS color string for a canvas style
pub fn css_color(c: Rgba) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({},{},{},{:.2})",
        channel(c[0]),
        channel(c[1]),
        channel(c[2]),
        c[3].clamp(0.0, 1.0)
    )
}

pub fn pickup_color(kind: PickupKind) -> Rgba {
    match kind {
        PickupKind::Coin => [0.22, 1.0, 0.08, 0.95],
        PickupKind::SpeedBoost => [1.0, 0.84, 0.0, 0.95],
        PickupKind::Shield => [0.35, 0.8, 1.0, 0.95],
        PickupKind::ComboPower => [0.75, 0.35, 1.0, 0.95],
        PickupKind::Heart => [1.0, 0.21, 0.37, 0.95],
    }
}

/// Red candles hurt; spent green candles fade
pub fn candle_color(obstacle: &Obstacle) -> Rgba {
    match (obstacle.hazardous, obstacle.consumed) {
        (true, _) => [1.0, 0.21, 0.37, 0.9],
        (false, false) => [0.22, 1.0, 0.08, 0.9],
        (false, true) => [0.22, 1.0, 0.08, 0.35],
    }
}

/// Blink while invulnerable
pub fn player_alpha(player: &Player, elapsed: f32) -> f32 {
    if player.is_invulnerable() && (elapsed * 20.0).floor() as i64 % 2 == 1 {
        0.35
    } else {
        1.0
    }
}

/// Visible screen-x range with margin
fn visible(left: f32, right: f32, view_width: f32) -> bool {
    right >= -CULL_MARGIN && left <= view_width + CULL_MARGIN
}

fn grid(view: Vec2, camera_x: f32) -> impl Iterator<Item = Shape> {
    let offset = camera_x.rem_euclid(GRID_SPACING);
    let columns = (view.x / GRID_SPACING).ceil() as i32 + 1;
    let rows = (view.y / GRID_SPACING).ceil() as i32;
    let vertical = (0..columns).map(move |i| {
        let x = i as f32 * GRID_SPACING - offset;
        Shape::Segment {
            from: Vec2::new(x, 0.0),
            to: Vec2::new(x, view.y),
            width: 1.0,
            color: GRID,
        }
    });
    let horizontal = (0..rows).map(move |j| {
        let y = j as f32 * GRID_SPACING;
        Shape::Segment {
            from: Vec2::new(0.0, y),
            to: Vec2::new(view.x, y),
            width: 1.0,
            color: GRID,
        }
    });
    vertical.chain(horizontal)
}

/// Ground polyline; crash stretches are drawn red
pub fn ground_line(sim: &Simulation) -> Vec<Shape> {
    let camera_x = sim.world().camera_x;
    let view_width = sim.tuning().world.view_width;
    let points: Vec<_> = sim.terrain().points().collect();

    points
        .windows(2)
        .filter(|pair| visible(pair[0].x - camera_x, pair[1].x - camera_x, view_width))
        .map(|pair| Shape::Segment {
            from: Vec2::new(pair[0].x - camera_x, pair[0].y),
            to: Vec2::new(pair[1].x - camera_x, pair[1].y),
            width: GROUND_WIDTH,
            color: if pair[0].crash || pair[1].crash {
                GROUND_CRASH
            } else {
                GROUND
            },
        })
        .collect()
}

fn entity_shapes(entity: &Entity, camera_x: f32) -> Vec<Shape> {
    match entity {
        Entity::Obstacle(o) => {
            let min = Vec2::new(o.pos.x - camera_x, o.pos.y);
            let color = candle_color(o);
            let wick_x = min.x + o.size.x * 0.5;
            vec![
                Shape::Segment {
                    from: Vec2::new(wick_x, min.y - 12.0),
                    to: Vec2::new(wick_x, min.y),
                    width: 2.0,
                    color,
                },
                Shape::Rect {
                    min,
                    size: o.size,
                    color,
                },
            ]
        }
        Entity::Pickup(p) => vec![Shape::Circle {
            center: Vec2::new(p.pos.x - camera_x, p.pos.y),
            radius: p.radius,
            color: pickup_color(p.kind),
            filled: true,
        }],
    }
}

/// Full frame, back to front
pub fn build_scene(sim: &Simulation) -> Vec<Shape> {
    let world = sim.world();
    let view = Vec2::new(sim.tuning().world.view_width, sim.tuning().world.view_height);
    let camera_x = world.camera_x;

    let mut shapes: Vec<Shape> = grid(view, camera_x).collect();
    shapes.extend(ground_line(sim));

    for entity in sim.entities() {
        let left = entity.left() - camera_x;
        let right = entity.right() - camera_x;
        if visible(left, right, view.x) {
            shapes.extend(entity_shapes(entity, camera_x));
        }
    }

    let player = sim.player();
    let min = Vec2::new(player.pos.x - camera_x, player.pos.y);
    let mut color = PLAYER;
    color[3] = player_alpha(player, world.elapsed);
    shapes.push(Shape::Rect {
        min,
        size: player.size,
        color,
    });
    if player.shield_charges > 0 {
        shapes.push(Shape::Circle {
            center: min + player.size * 0.5,
            radius: player.size.max_element() * 0.8,
            color: SHIELD,
            filled: false,
        });
    }

    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{RunModifiers, ShopModifiers};

    /// The player is the last rectangle emitted
    fn player_rect(shapes: &[Shape]) -> Option<(Vec2, Rgba)> {
        shapes.iter().rev().find_map(|s| match s {
            Shape::Rect { min, color, .. } => Some((*min, *color)),
            _ => None,
        })
    }

    #[test]
    fn test_css_color() {
        assert_eq!(css_color([1.0, 0.0, 0.5, 0.25]), "rgba(255,0,128,0.25)");
        assert_eq!(css_color([2.0, -1.0, 0.0, 3.0]), "rgba(255,0,0,1.00)");
    }

    #[test]
    fn test_player_drawn_at_fixed_screen_x() {
        let mut sim = Simulation::new(4);
        sim.start_run(RunModifiers::default());
        for _ in 0..90 {
            sim.update(1.0 / 60.0);
        }
        let shapes = build_scene(&sim);
        let (min, _) = player_rect(&shapes).unwrap();
        assert!((min.x - sim.tuning().player.screen_x).abs() < 1e-3);
    }

    #[test]
    fn test_offscreen_entities_are_culled() {
        let mut sim = Simulation::new(4);
        sim.start_run(RunModifiers::default());
        for _ in 0..60 {
            sim.update(1.0 / 60.0);
        }
        let camera_x = sim.world().camera_x;
        let view_width = sim.tuning().world.view_width;
        let on_screen = sim
            .entities()
            .filter(|e| matches!(e, Entity::Obstacle(_)))
            .filter(|e| visible(e.left() - camera_x, e.right() - camera_x, view_width))
            .count();

        let shapes = build_scene(&sim);
        let rects = shapes.iter().filter(|s| matches!(s, Shape::Rect { .. })).count();
        assert_eq!(rects, on_screen + 1);
        for shape in &shapes {
            if let Shape::Circle { center, radius, .. } = shape {
                assert!(center.x - radius <= view_width + CULL_MARGIN);
            }
        }
    }

    #[test]
    fn test_shield_ring_shown() {
        let mut sim = Simulation::new(4);
        sim.start_run(RunModifiers {
            shop: ShopModifiers {
                starts_with_shield: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let shapes = build_scene(&sim);
        assert!(matches!(
            shapes.last(),
            Some(Shape::Circle { filled: false, .. })
        ));
    }

    #[test]
    fn test_invulnerable_player_blinks() {
        let mut sim = Simulation::new(4);
        sim.start_run(RunModifiers::default());
        let mut player = sim.player().clone();
        player.invulnerability_timer = 0.5;
        assert_eq!(player_alpha(&player, 0.0), 1.0);
        assert_eq!(player_alpha(&player, 0.06), 0.35);
        player.invulnerability_timer = 0.0;
        assert_eq!(player_alpha(&player, 0.06), 1.0);
    }

    #[test]
    fn test_ground_covers_frame() {
        let mut sim = Simulation::new(9);
        sim.start_run(RunModifiers::default());
        let ground = ground_line(&sim);
        assert!(!ground.is_empty());
        let max_x = ground
            .iter()
            .filter_map(|s| match s {
                Shape::Segment { to, .. } => Some(to.x),
                _ => None,
            })
            .fold(f32::MIN, f32::max);
        assert!(max_x >= sim.tuning().world.view_width);
    }

    #[test]
    fn test_candle_colors() {
        let mut candle = Obstacle {
            pos: Vec2::ZERO,
            size: Vec2::ONE,
            hazardous: false,
            consumed: false,
        };
        assert_eq!(candle_color(&candle)[1], 1.0);
        candle.consumed = true;
        assert!(candle_color(&candle)[3] < 0.5);
        candle.hazardous = true;
        assert_eq!(candle_color(&candle)[0], 1.0);
    }
}
