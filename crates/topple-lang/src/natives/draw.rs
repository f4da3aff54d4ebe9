//! Drawing natives. Each call appends a `DrawCommand` to the frame; the host
//! paints them in order after the draw block returns.

use crate::error::RuntimeError;
use crate::Value;
use super::{Host, NativeProvider, NativeSig, arg, arg_error, as_number, as_text, number_or};

// ─── Color ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// `#rgb`, `#rrggbb`, `#rrggbbaa`, or a name from a small table.
    pub fn parse(s: &str) -> Option<Color> {
        match s.strip_prefix('#') {
            Some(hex) => parse_hex(hex),
            None => named(&s.to_ascii_lowercase()),
        }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { a: self.a * alpha.clamp(0.0, 1.0), ..self }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok().map(|n| n as f32 / 255.0);
    let nibble = |s: &str| u8::from_str_radix(s, 16).ok().map(|n| (n * 17) as f32 / 255.0);
    match hex.len() {
        3 => Some(Color::rgb(nibble(&hex[0..1])?, nibble(&hex[1..2])?, nibble(&hex[2..3])?)),
        6 => Some(Color::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
        8 => Some(Color { r: byte(&hex[0..2])?, g: byte(&hex[2..4])?, b: byte(&hex[4..6])?, a: byte(&hex[6..8])? }),
        _ => None,
    }
}

fn named(name: &str) -> Option<Color> {
    let c = match name {
        "white"       => Color::WHITE,
        "black"       => Color::BLACK,
        "red"         => Color::rgb(1.0, 0.0, 0.0),
        "green"       => Color::rgb(0.0, 0.5, 0.0),
        "lime"        => Color::rgb(0.0, 1.0, 0.0),
        "blue"        => Color::rgb(0.0, 0.0, 1.0),
        "yellow"      => Color::rgb(1.0, 1.0, 0.0),
        "cyan"        => Color::rgb(0.0, 1.0, 1.0),
        "magenta"     => Color::rgb(1.0, 0.0, 1.0),
        "orange"      => Color::rgb(1.0, 0.647, 0.0),
        "purple"      => Color::rgb(0.5, 0.0, 0.5),
        "gray" | "grey" => Color::rgb(0.5, 0.5, 0.5),
        "transparent" => Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 },
        _ => return None,
    };
    Some(c)
}

// ─── Draw command ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { color: Color },
    Rect { x: f64, y: f64, w: f64, h: f64, color: Color },
    Circle { x: f64, y: f64, radius: f64, color: Color },
    Line { x1: f64, y1: f64, x2: f64, y2: f64, color: Color, width: f64 },
    Text { text: String, x: f64, y: f64, size: f64, color: Color },
    /// A region `(sx, sy, sw, sh)` of `image` drawn into `(x, y, w, h)`.
    Sprite { image: String, src: [f64; 4], dst: [f64; 4] },
}

// ─── Provider ─────────────────────────────────────────────────────────────────

const NATIVES: &[NativeSig] = &[
    NativeSig::new("clear",  &["color"]),
    NativeSig::new("rect",   &["x", "y", "w", "h", "color", "alpha"]),
    NativeSig::new("circle", &["x", "y", "radius", "color", "alpha"]),
    NativeSig::new("line",   &["x1", "y1", "x2", "y2", "color", "width"]),
    NativeSig::new("text",   &["text", "x", "y", "size", "color"]),
    NativeSig::new("sprite", &["image", "sx", "sy", "sw", "sh", "x", "y", "w", "h"]),
];

pub struct DrawNatives;

impl NativeProvider for DrawNatives {
    fn name(&self) -> &'static str { "draw" }

    fn natives(&self) -> &'static [NativeSig] { NATIVES }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        host: &mut Host,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let num = |i: usize| as_number(name, arg(args, i), line);
        let color = |i: usize, default: Color| color_arg(name, arg(args, i), default, line);
        let alpha = |i: usize| number_or(name, arg(args, i), 1.0, line).map(|a| a as f32);

        let cmd = match name {
            "clear" => DrawCommand::Clear { color: color(0, Color::BLACK)? },
            "rect" => DrawCommand::Rect {
                x: num(0)?, y: num(1)?, w: num(2)?, h: num(3)?,
                color: color(4, Color::WHITE)?.with_alpha(alpha(5)?),
            },
            "circle" => DrawCommand::Circle {
                x: num(0)?, y: num(1)?, radius: num(2)?,
                color: color(3, Color::WHITE)?.with_alpha(alpha(4)?),
            },
            "line" => DrawCommand::Line {
                x1: num(0)?, y1: num(1)?, x2: num(2)?, y2: num(3)?,
                color: color(4, Color::WHITE)?,
                width: number_or(name, arg(args, 5), 1.0, line)?,
            },
            "text" => DrawCommand::Text {
                text: arg(args, 0).to_string(),
                x: num(1)?, y: num(2)?,
                size: number_or(name, arg(args, 3), 16.0, line)?,
                color: color(4, Color::WHITE)?,
            },
            "sprite" => {
                let src = [num(1)?, num(2)?, num(3)?, num(4)?];
                // destination size defaults to the source region's size
                let dst = [
                    num(5)?, num(6)?,
                    number_or(name, arg(args, 7), src[2], line)?,
                    number_or(name, arg(args, 8), src[3], line)?,
                ];
                DrawCommand::Sprite { image: as_text(name, arg(args, 0), line)?, src, dst }
            }
            _ => return Ok(None),
        };

        host.draw.push(cmd);
        Ok(Some(Value::Null))
    }
}

fn color_arg(name: &str, v: &Value, default: Color, line: usize) -> Result<Color, RuntimeError> {
    match v {
        Value::Null => Ok(default),
        Value::Str(s) => Color::parse(s)
            .ok_or_else(|| arg_error(name, line, format_args!("invalid color `{s}`"))),
        other => Err(arg_error(name, line, format_args!("expected color string, got {}", other.type_name()))),
    }
}
