//! Draw primitives — what the simulation emits each frame.
//!
//! Coordinates are viewport-relative pixels (after the camera transform).
//! Colors are 0xAARRGGBB like the framebuffer; alpha below 0xFF blends.

/// Palette shared by world, vehicle and HUD rendering
pub mod palette {
    pub const GRASS: u32 = 0xFF4A7C3A;
    pub const ROAD: u32 = 0xFF505055;
    pub const LANE_MARK: u32 = 0xFFF2E9A0;
    pub const OUTLINE: u32 = 0xFF222222;
    pub const WHITE: u32 = 0xFFFFFFFF;
    pub const BLACK: u32 = 0xFF000000;
    pub const SIGN_RED: u32 = 0xFFCC2222;
    pub const LIGHT_RED: u32 = 0xFFFF3030;
    pub const LIGHT_AMBER: u32 = 0xFFFFB000;
    pub const LIGHT_GREEN: u32 = 0xFF30E050;
    pub const HOUSING: u32 = 0xFF202024;
    pub const VEHICLE: u32 = 0xFF2D6CDF;
    pub const WINDSHIELD: u32 = 0xFFBFE3FF;
    pub const PANEL: u32 = 0xE01A1A2E;
    pub const PANEL_EDGE: u32 = 0xFF6666CC;
    pub const TEXT_DIM: u32 = 0xFFBBBBBB;
    pub const HIGHLIGHT: u32 = 0xFFFFFF00;
    pub const GOOD: u32 = 0xFF40D060;
    pub const BAD: u32 = 0xFFFF5050;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    FillRect { x: f32, y: f32, w: f32, h: f32, color: u32 },
    StrokeRect { x: f32, y: f32, w: f32, h: f32, color: u32 },
    FillCircle { cx: f32, cy: f32, r: f32, color: u32 },
    StrokeCircle { cx: f32, cy: f32, r: f32, color: u32 },
    FillPolygon { points: Vec<(f32, f32)>, color: u32 },
    Line { x0: f32, y0: f32, x1: f32, y1: f32, color: u32 },
    Text { x: f32, y: f32, text: String, color: u32, align: TextAlign, scale: u8 },
}

/// Ordered primitive stream for one frame (painter's order)
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    cmds: Vec<DrawCmd>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cmds(&self) -> &[DrawCmd] {
        &self.cmds
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    pub fn push(&mut self, cmd: DrawCmd) {
        self.cmds.push(cmd);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: u32) {
        self.push(DrawCmd::FillRect { x, y, w, h, color });
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: u32) {
        self.push(DrawCmd::StrokeRect { x, y, w, h, color });
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        self.push(DrawCmd::FillCircle { cx, cy, r, color });
    }

    pub fn stroke_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        self.push(DrawCmd::StrokeCircle { cx, cy, r, color });
    }

    pub fn polygon(&mut self, points: Vec<(f32, f32)>, color: u32) {
        self.push(DrawCmd::FillPolygon { points, color });
    }

    pub fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: u32) {
        self.push(DrawCmd::Line { x0, y0, x1, y1, color });
    }

    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, color: u32) {
        self.push(DrawCmd::Text {
            x,
            y,
            text: text.into(),
            color,
            align: TextAlign::Left,
            scale: 1,
        });
    }

    /// Text centered horizontally on `cx`
    pub fn text_centered(&mut self, cx: f32, y: f32, text: impl Into<String>, color: u32, scale: u8) {
        self.push(DrawCmd::Text {
            x: cx,
            y,
            text: text.into(),
            color,
            align: TextAlign::Center,
            scale,
        });
    }

    /// Count of commands matching a predicate (handy in tests)
    #[cfg(test)]
    pub fn count(&self, pred: impl Fn(&DrawCmd) -> bool) -> usize {
        self.cmds.iter().filter(|c| pred(c)).count()
    }
}

/// Visible world rectangle. Produced by the camera; converts world
/// coordinates into viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn to_screen(&self, wx: f32, wy: f32) -> (f32, f32) {
        (wx - self.x, wy - self.y)
    }

    /// Axis-aligned overlap test with the viewport grown by `margin`
    pub fn intersects(&self, x: f32, y: f32, w: f32, h: f32, margin: f32) -> bool {
        x + w >= self.x - margin
            && x <= self.x + self.width + margin
            && y + h >= self.y - margin
            && y <= self.y + self.height + margin
    }
}
