//! World model — static city block around one crossroads
//!
//! Layout (generated once, never mutated):
//!   - One horizontal and one vertical road of equal width through the center
//!   - Buildings in the four quadrants, placed relative to the intersection
//!     so they line the roads (decorative only, no collision)
//!   - Road furniture near the intersection: stop signs, traffic lights,
//!     speed-limit markers

use drivesim_common::WorldConfig;

use super::draw::{palette, DrawList, Viewport};
use super::vehicle::{Pose, WorldBounds};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Extra border around the viewport when culling
pub const CULL_MARGIN: f32 = 50.0;
/// Gap between the road edge and the first row of buildings
pub const SETBACK: f32 = 40.0;
/// Center-line dash pattern
const DASH_LENGTH: f32 = 30.0;
const DASH_SPACING: f32 = 60.0;
const DASH_WIDTH: f32 = 4.0;
/// Spawn distance west of the intersection
const SPAWN_OFFSET: f32 = 400.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadElementKind {
    StopSign,
    TrafficLight,
    SpeedLimit { limit: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadElement {
    pub kind: RoadElementKind,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: u32,
    pub label: Option<String>,
}

/// Axis-aligned rectangle in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }
}

#[derive(Debug, Clone, Copy)]
enum Quadrant {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

/// A building slot: distances are measured outward from the corner the
/// two roads make in that quadrant.
struct Lot {
    quadrant: Quadrant,
    along_x: f32,
    along_y: f32,
    width: f32,
    height: f32,
    color: u32,
    label: Option<&'static str>,
}

const LOTS: &[Lot] = &[
    Lot { quadrant: Quadrant::NorthWest, along_x: 0.0, along_y: 0.0, width: 220.0, height: 160.0, color: 0xFFB5651D, label: Some("SCHOOL") },
    Lot { quadrant: Quadrant::NorthWest, along_x: 280.0, along_y: 0.0, width: 180.0, height: 140.0, color: 0xFF8E8E93, label: Some("LIBRARY") },
    Lot { quadrant: Quadrant::NorthWest, along_x: 0.0, along_y: 240.0, width: 160.0, height: 200.0, color: 0xFF9C6B4F, label: None },
    Lot { quadrant: Quadrant::NorthEast, along_x: 0.0, along_y: 0.0, width: 240.0, height: 180.0, color: 0xFFE8E8E8, label: Some("HOSPITAL") },
    Lot { quadrant: Quadrant::NorthEast, along_x: 320.0, along_y: 0.0, width: 200.0, height: 140.0, color: 0xFF3A5FCD, label: Some("POLICE") },
    Lot { quadrant: Quadrant::NorthEast, along_x: 0.0, along_y: 260.0, width: 180.0, height: 180.0, color: 0xFFA0522D, label: None },
    Lot { quadrant: Quadrant::SouthWest, along_x: 0.0, along_y: 0.0, width: 200.0, height: 150.0, color: 0xFFC0392B, label: Some("FIRE STATION") },
    Lot { quadrant: Quadrant::SouthWest, along_x: 260.0, along_y: 0.0, width: 220.0, height: 160.0, color: 0xFF2E8B57, label: Some("MARKET") },
    Lot { quadrant: Quadrant::SouthWest, along_x: 0.0, along_y: 230.0, width: 150.0, height: 150.0, color: 0xFF7D6E5B, label: None },
    Lot { quadrant: Quadrant::SouthEast, along_x: 0.0, along_y: 0.0, width: 180.0, height: 160.0, color: 0xFFF1C40F, label: Some("DRIVING SCHOOL") },
    Lot { quadrant: Quadrant::SouthEast, along_x: 240.0, along_y: 0.0, width: 160.0, height: 130.0, color: 0xFF8B5A2B, label: Some("CAFE") },
    Lot { quadrant: Quadrant::SouthEast, along_x: 0.0, along_y: 220.0, width: 240.0, height: 170.0, color: 0xFF6C7A89, label: Some("BANK") },
];

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct World {
    pub width: f32,
    pub height: f32,
    pub road_width: f32,
    pub buildings: Vec<Building>,
    pub elements: Vec<RoadElement>,
}

impl World {
    /// Lay out the fixed city block. Deterministic: the same config always
    /// yields the same world.
    pub fn generate(cfg: &WorldConfig) -> Self {
        let (cx, cy) = (cfg.width / 2.0, cfg.height / 2.0);
        let rh = cfg.road_width / 2.0;
        let near = rh + SETBACK;

        let buildings: Vec<Building> = LOTS
            .iter()
            .map(|lot| {
                let (x, y) = match lot.quadrant {
                    Quadrant::NorthWest => (
                        cx - near - lot.along_x - lot.width,
                        cy - near - lot.along_y - lot.height,
                    ),
                    Quadrant::NorthEast => {
                        (cx + near + lot.along_x, cy - near - lot.along_y - lot.height)
                    }
                    Quadrant::SouthWest => {
                        (cx - near - lot.along_x - lot.width, cy + near + lot.along_y)
                    }
                    Quadrant::SouthEast => (cx + near + lot.along_x, cy + near + lot.along_y),
                };
                Building {
                    x,
                    y,
                    width: lot.width,
                    height: lot.height,
                    color: lot.color,
                    label: lot.label.map(String::from),
                }
            })
            // A small world drops lots that would spill past its edge
            .filter(|b| {
                b.x >= 0.0 && b.y >= 0.0 && b.x + b.width <= cfg.width && b.y + b.height <= cfg.height
            })
            .collect();

        let post = rh + 18.0;
        let far = (cfg.width.min(cfg.height) / 2.0 - rh) * 0.45;
        let elements = vec![
            // Stop signs on the east-west approaches
            RoadElement { kind: RoadElementKind::StopSign, x: cx - post - 10.0, y: cy + post },
            RoadElement { kind: RoadElementKind::StopSign, x: cx + post + 10.0, y: cy - post },
            // Traffic lights for the north-south approaches
            RoadElement { kind: RoadElementKind::TrafficLight, x: cx - post, y: cy - post - 10.0 },
            RoadElement { kind: RoadElementKind::TrafficLight, x: cx + post, y: cy + post + 10.0 },
            // Speed limits further out on each arm
            RoadElement { kind: RoadElementKind::SpeedLimit { limit: 50 }, x: cx - rh - far, y: cy - post },
            RoadElement { kind: RoadElementKind::SpeedLimit { limit: 50 }, x: cx + rh + far, y: cy + post },
            RoadElement { kind: RoadElementKind::SpeedLimit { limit: 30 }, x: cx - post, y: cy - rh - far },
            RoadElement { kind: RoadElementKind::SpeedLimit { limit: 70 }, x: cx + post, y: cy + rh + far },
        ];

        tracing::debug!(
            "World generated: {}x{}, {} buildings, {} road elements",
            cfg.width,
            cfg.height,
            buildings.len(),
            elements.len()
        );

        Self {
            width: cfg.width,
            height: cfg.height,
            road_width: cfg.road_width,
            buildings,
            elements,
        }
    }

    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            width: self.width,
            height: self.height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// On the horizontal road, in the eastbound lane west of the
    /// intersection, facing east
    pub fn spawn_point(&self) -> Pose {
        let (cx, cy) = self.center();
        Pose {
            x: (cx - SPAWN_OFFSET).max(0.0),
            y: cy + self.road_width / 4.0,
            heading: 0.0,
        }
    }

    pub fn horizontal_road(&self) -> Rect {
        let (_, cy) = self.center();
        Rect { x: 0.0, y: cy - self.road_width / 2.0, w: self.width, h: self.road_width }
    }

    pub fn vertical_road(&self) -> Rect {
        let (cx, _) = self.center();
        Rect { x: cx - self.road_width / 2.0, y: 0.0, w: self.road_width, h: self.height }
    }

    pub fn is_on_road(&self, x: f32, y: f32) -> bool {
        self.horizontal_road().contains(x, y) || self.vertical_road().contains(x, y)
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Roads, then buildings, then road furniture, in viewport pixels
    pub fn render(&self, viewport: &Viewport, out: &mut DrawList) {
        out.fill_rect(0.0, 0.0, viewport.width, viewport.height, palette::GRASS);

        for road in [self.horizontal_road(), self.vertical_road()] {
            let (sx, sy) = viewport.to_screen(road.x, road.y);
            out.fill_rect(sx, sy, road.w, road.h, palette::ROAD);
        }
        self.render_lane_marks(viewport, out);

        for b in &self.buildings {
            if !viewport.intersects(b.x, b.y, b.width, b.height, CULL_MARGIN) {
                continue;
            }
            let (sx, sy) = viewport.to_screen(b.x, b.y);
            out.fill_rect(sx, sy, b.width, b.height, b.color);
            out.stroke_rect(sx, sy, b.width, b.height, palette::OUTLINE);
            if let Some(label) = &b.label {
                out.text_centered(sx + b.width / 2.0, sy + b.height / 2.0 - 4.0, label.as_str(), palette::BLACK, 1);
            }
        }

        for e in &self.elements {
            if !viewport.intersects(e.x - 20.0, e.y - 20.0, 40.0, 40.0, CULL_MARGIN) {
                continue;
            }
            let (sx, sy) = viewport.to_screen(e.x, e.y);
            render_element(e.kind, sx, sy, out);
        }
    }

    /// Dashed center lines, skipping the intersection box
    fn render_lane_marks(&self, viewport: &Viewport, out: &mut DrawList) {
        let (cx, cy) = self.center();
        let rh = self.road_width / 2.0;

        let mut x = 0.0;
        while x < self.width {
            let clear_of_box = x + DASH_LENGTH < cx - rh || x > cx + rh;
            if clear_of_box && viewport.intersects(x, cy - DASH_WIDTH / 2.0, DASH_LENGTH, DASH_WIDTH, 0.0) {
                let (sx, sy) = viewport.to_screen(x, cy - DASH_WIDTH / 2.0);
                out.fill_rect(sx, sy, DASH_LENGTH, DASH_WIDTH, palette::LANE_MARK);
            }
            x += DASH_SPACING;
        }

        let mut y = 0.0;
        while y < self.height {
            let clear_of_box = y + DASH_LENGTH < cy - rh || y > cy + rh;
            if clear_of_box && viewport.intersects(cx - DASH_WIDTH / 2.0, y, DASH_WIDTH, DASH_LENGTH, 0.0) {
                let (sx, sy) = viewport.to_screen(cx - DASH_WIDTH / 2.0, y);
                out.fill_rect(sx, sy, DASH_WIDTH, DASH_LENGTH, palette::LANE_MARK);
            }
            y += DASH_SPACING;
        }
    }

    /// Whole world at `scale`, origin at (`ox`, `oy`) on screen
    pub fn render_minimap(&self, ox: f32, oy: f32, scale: f32, out: &mut DrawList) {
        out.fill_rect(ox, oy, self.width * scale, self.height * scale, palette::GRASS);
        for road in [self.horizontal_road(), self.vertical_road()] {
            out.fill_rect(ox + road.x * scale, oy + road.y * scale, road.w * scale, road.h * scale, palette::ROAD);
        }
        for b in &self.buildings {
            out.fill_rect(ox + b.x * scale, oy + b.y * scale, b.width * scale, b.height * scale, b.color);
        }
        out.stroke_rect(ox, oy, self.width * scale, self.height * scale, palette::WHITE);
    }
}

fn render_element(kind: RoadElementKind, x: f32, y: f32, out: &mut DrawList) {
    match kind {
        RoadElementKind::StopSign => {
            out.line(x, y, x, y + 24.0, palette::HOUSING);
            out.fill_circle(x, y, 14.0, palette::SIGN_RED);
            out.stroke_circle(x, y, 14.0, palette::WHITE);
            out.text_centered(x, y - 3.0, "STOP", palette::WHITE, 1);
        }
        RoadElementKind::TrafficLight => {
            out.fill_rect(x - 8.0, y - 22.0, 16.0, 44.0, palette::HOUSING);
            out.fill_circle(x, y - 13.0, 5.0, palette::LIGHT_RED);
            out.fill_circle(x, y, 5.0, palette::LIGHT_AMBER);
            out.fill_circle(x, y + 13.0, 5.0, palette::LIGHT_GREEN);
        }
        RoadElementKind::SpeedLimit { limit } => {
            out.fill_circle(x, y, 15.0, palette::SIGN_RED);
            out.fill_circle(x, y, 11.0, palette::WHITE);
            out.text_centered(x, y - 3.0, limit.to_string(), palette::BLACK, 1);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
