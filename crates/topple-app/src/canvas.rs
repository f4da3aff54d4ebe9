//! Painting `DrawCommand`s with egui and turning egui events into
//! `InputState` events.

use eframe::egui::{self, Color32, FontId, Pos2, Rect, Stroke, StrokeKind};
use topple_lang::{Color, DrawCommand, InputState};

fn color32(c: Color) -> Color32 {
    let [r, g, b, a] = c.to_rgba8();
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// Paints one frame's commands in order, in canvas pixel space.
pub fn paint(painter: &egui::Painter, origin: Pos2, commands: &[DrawCommand]) {
    let at = |x: f64, y: f64| origin + egui::vec2(x as f32, y as f32);

    for cmd in commands {
        match cmd {
            DrawCommand::Clear { color } => {
                painter.rect_filled(painter.clip_rect(), 0.0, color32(*color));
            }
            DrawCommand::Rect { x, y, w, h, color } => {
                let rect = Rect::from_min_size(at(*x, *y), egui::vec2(*w as f32, *h as f32));
                painter.rect_filled(rect, 0.0, color32(*color));
            }
            DrawCommand::Circle { x, y, radius, color } => {
                painter.circle_filled(at(*x, *y), *radius as f32, color32(*color));
            }
            DrawCommand::Line { x1, y1, x2, y2, color, width } => {
                painter.line_segment(
                    [at(*x1, *y1), at(*x2, *y2)],
                    Stroke::new(*width as f32, color32(*color)),
                );
            }
            DrawCommand::Text { text, x, y, size, color } => {
                painter.text(
                    at(*x, *y),
                    egui::Align2::LEFT_TOP,
                    text,
                    FontId::proportional(*size as f32),
                    color32(*color),
                );
            }
            // no image store yet; outline the destination and name the image
            DrawCommand::Sprite { image, dst, .. } => {
                let rect = Rect::from_min_size(at(dst[0], dst[1]), egui::vec2(dst[2] as f32, dst[3] as f32));
                painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::from_rgb(200, 120, 220)), StrokeKind::Inside);
                painter.text(
                    rect.left_top(),
                    egui::Align2::LEFT_TOP,
                    image,
                    FontId::monospace(10.0),
                    Color32::from_rgb(200, 120, 220),
                );
            }
        }
    }
}

/// DOM-style button numbering: 0 primary, 1 middle, 2 secondary.
fn button_index(button: egui::PointerButton) -> u32 {
    match button {
        egui::PointerButton::Primary   => 0,
        egui::PointerButton::Middle    => 1,
        egui::PointerButton::Secondary => 2,
        egui::PointerButton::Extra1    => 3,
        egui::PointerButton::Extra2    => 4,
    }
}

/// Feeds this frame's egui events into `input`. Pointer positions are made
/// relative to `canvas`; keys are skipped while a text field has focus.
pub fn feed_input(ctx: &egui::Context, canvas: Rect, input: &mut InputState) {
    let keyboard = !ctx.wants_keyboard_input();
    let local = |pos: Pos2| ((pos.x - canvas.min.x) as f64, (pos.y - canvas.min.y) as f64);

    ctx.input(|i| {
        for event in &i.events {
            match event {
                egui::Event::Key { key, pressed, repeat: false, .. } if keyboard => {
                    if *pressed {
                        input.key_down(key.name());
                    } else {
                        input.key_up(key.name());
                    }
                }
                egui::Event::PointerMoved(pos) => {
                    let (x, y) = local(*pos);
                    input.mouse_move(x, y);
                }
                egui::Event::PointerButton { pos, button, pressed, .. } if canvas.contains(*pos) || !pressed => {
                    if *pressed {
                        input.mouse_down(button_index(*button));
                    } else {
                        input.mouse_up(button_index(*button));
                    }
                }
                egui::Event::Touch { phase, pos, .. } => {
                    let (x, y) = local(*pos);
                    match phase {
                        egui::TouchPhase::Start => input.touch_start(x, y),
                        egui::TouchPhase::Move => input.touch_move(x, y),
                        egui::TouchPhase::End | egui::TouchPhase::Cancel => input.touch_end(),
                    }
                }
                _ => {}
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_convert_to_bytes() {
        assert_eq!(color32(Color::WHITE), Color32::WHITE);
        let half = Color::BLACK.with_alpha(0.5);
        assert_eq!(color32(half).a(), 128);
    }

    #[test]
    fn buttons_use_dom_numbering() {
        assert_eq!(button_index(egui::PointerButton::Primary), 0);
        assert_eq!(button_index(egui::PointerButton::Secondary), 2);
    }
}
