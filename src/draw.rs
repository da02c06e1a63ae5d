//! Software drawing into an RGBA frame: track, vehicles, sensor rays, HUD text.

use crate::track::Track;
use crate::vehicle::Vehicle;

pub type Rgba = (u8, u8, u8, u8);

const ROAD: Rgba = (60, 60, 68, 255);
const WALL: Rgba = (255, 255, 255, 255);
const BODY: Rgba = (220, 60, 60, 255);
const SENSOR: Rgba = (0, 255, 0, 255);
const TEXT: Rgba = (0, 0, 0, 255);

/// Borrowed RGBA8 frame with its dimensions.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    /// `None` if the buffer is smaller than `width * height` pixels.
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        (frame.len() >= width as usize * height as usize * 4).then_some(Self { frame, width, height })
    }

    /// Copies a pre-rendered background of the same size.
    pub fn blit(&mut self, background: &[u8]) {
        let n = self.frame.len().min(background.len());
        self.frame[..n].copy_from_slice(&background[..n]);
    }

    pub fn blend_pixel(&mut self, x: i64, y: i64, col: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = ((y as usize * self.width as usize) + x as usize) * 4;
        let (ar, iar) = (col.3 as u16, 255 - col.3 as u16);
        for (c, src) in [col.0, col.1, col.2].into_iter().enumerate() {
            let dst = self.frame[idx + c] as u16;
            self.frame[idx + c] = ((src as u16 * ar + dst * iar) / 255) as u8;
        }
        self.frame[idx + 3] = 255;
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, col: Rgba) {
        for py in y..y + h as i64 {
            for px in x..x + w as i64 {
                self.blend_pixel(px, py, col);
            }
        }
    }

    pub fn line(&mut self, from: (i64, i64), to: (i64, i64), col: Rgba) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.blend_pixel(x, y, col);
            if (x, y) == to {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn disc(&mut self, center: (i64, i64), radius: i64, col: Rgba) {
        for oy in -radius..=radius {
            for ox in -radius..=radius {
                if ox * ox + oy * oy <= radius * radius {
                    self.blend_pixel(center.0 + ox, center.1 + oy, col);
                }
            }
        }
    }

    pub fn text(&mut self, text: &str, x: i64, y: i64, scale: u32, col: Rgba) {
        let mut cx = x;
        for ch in text.chars() {
            if let Some(rows) = glyph_5x7(ch) {
                for (ry, row) in rows.iter().enumerate() {
                    for rx in 0..5 {
                        if (row >> (4 - rx)) & 1 == 1 {
                            let px = cx + (rx * scale) as i64;
                            let py = y + (ry as u32 * scale) as i64;
                            self.fill_rect(px, py, scale, scale, col);
                        }
                    }
                }
            }
            cx += (6 * scale) as i64;
        }
    }
}

/// Renders the crash mask once; frames then `blit` it.
pub fn track_background(track: &Track) -> Vec<u8> {
    let mut frame = Vec::with_capacity(track.width() as usize * track.height() as usize * 4);
    for y in 0..track.height() as i64 {
        for x in 0..track.width() as i64 {
            let c = if track.is_obstacle(x, y) { WALL } else { ROAD };
            frame.extend_from_slice(&[c.0, c.1, c.2, c.3]);
        }
    }
    frame
}

pub fn draw_vehicle(canvas: &mut Canvas<'_>, vehicle: &Vehicle) {
    let center = vehicle.center();
    let center = (center.x as i64, center.y as i64);
    for hit in vehicle.ray_hits() {
        canvas.line(center, hit.end, SENSOR);
        canvas.disc(hit.end, 5, SENSOR);
    }
    // 30/330 lead, 150/210 trail: walk the outline front-left, rear-left, rear-right, front-right
    let c = vehicle.corners.map(|p| (p.x as i64, p.y as i64));
    for (a, b) in [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])] {
        canvas.line(a, b, BODY);
    }
}

pub fn draw_hud(canvas: &mut Canvas<'_>, generation: u64, alive: usize, tick: u32) {
    let x = canvas.width as i64 / 2 - 100;
    let y = canvas.height as i64 / 2 - 40;
    canvas.text(&format!("GENERATION: {generation}"), x, y, 3, TEXT);
    canvas.text(&format!("STILL ALIVE: {alive}"), x, y + 40, 2, TEXT);
    canvas.text(&format!("TICK: {tick}"), x, y + 70, 2, TEXT);
}

fn glyph_5x7(ch: char) -> Option<[u8; 7]> {
    Some(match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'I' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        _ => return None,
    })
}
