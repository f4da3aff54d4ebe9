//! Input queries. All state lives in the host's `InputDevice`.

use crate::device::Phase;
use crate::error::RuntimeError;
use crate::Value;
use super::{Host, NativeProvider, NativeSig, arg, as_index, as_number, as_text};

const NATIVES: &[NativeSig] = &[
    NativeSig::new("pressed",        &["action"]),
    NativeSig::new("held",           &["action"]),
    NativeSig::new("released",       &["action"]),
    NativeSig::new("key_pressed",    &["key"]),
    NativeSig::new("key_held",       &["key"]),
    NativeSig::new("key_released",   &["key"]),
    NativeSig::new("mouse_x",        &[]),
    NativeSig::new("mouse_y",        &[]),
    NativeSig::new("mouse_pressed",  &["button"]),
    NativeSig::new("mouse_held",     &["button"]),
    NativeSig::new("mouse_released", &["button"]),
    NativeSig::new("touch_x",        &[]),
    NativeSig::new("touch_y",        &[]),
    NativeSig::new("touch_pressed",  &[]),
    NativeSig::new("touch_held",     &[]),
    NativeSig::new("touch_released", &[]),
    NativeSig::new("pad_pressed",    &["button"]),
    NativeSig::new("pad_held",       &["button"]),
    NativeSig::new("pad_released",   &["button"]),
    NativeSig::new("pad_axis",       &["axis"]),
    NativeSig::new("buffer",         &["action", "seconds"]),
    NativeSig::new("buffered",       &["action"]),
    NativeSig::new("consume",        &["action"]),
    NativeSig::new("peek_buffer",    &["action"]),
    NativeSig::new("clear_buffer",   &["action"]),
];

pub struct InputNatives;

/// `pressed` / `held` / `released` suffix of a query name.
fn phase_of(name: &str) -> Option<Phase> {
    if name.ends_with("pressed") {
        Some(Phase::Pressed)
    } else if name.ends_with("held") {
        Some(Phase::Held)
    } else if name.ends_with("released") {
        Some(Phase::Released)
    } else {
        None
    }
}

impl NativeProvider for InputNatives {
    fn name(&self) -> &'static str { "input" }

    fn natives(&self) -> &'static [NativeSig] { NATIVES }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        host: &mut Host,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let input = host.input.as_mut();
        let text = |i: usize| as_text(name, arg(args, i), line);
        let index = |i: usize| as_index(name, arg(args, i), line);

        if let Some(phase) = phase_of(name) {
            let hit = match name.rsplit_once('_').map_or(name, |(prefix, _)| prefix) {
                "key"   => input.key(&text(0)?, phase),
                "mouse" => input.mouse_button(index(0)?, phase),
                "touch" => input.touch(phase),
                "pad"   => input.pad_button(index(0)?, phase),
                _ if !name.contains('_') => input.action(&text(0)?, phase),
                _ => return Ok(None),
            };
            return Ok(Some(Value::Bool(hit)));
        }

        let v = match name {
            "mouse_x"  => Value::Number(input.mouse_position().0),
            "mouse_y"  => Value::Number(input.mouse_position().1),
            "touch_x"  => Value::Number(input.touch_position().0),
            "touch_y"  => Value::Number(input.touch_position().1),
            "pad_axis" => Value::Number(input.pad_axis(index(0)?)),

            "buffer" => {
                input.buffer(&text(0)?, as_number(name, arg(args, 1), line)?);
                Value::Null
            }
            "buffered"     => Value::Bool(input.buffered(&text(0)?)),
            "consume"      => Value::Bool(input.consume(&text(0)?)),
            "peek_buffer"  => Value::Number(input.peek_buffer(&text(0)?)),
            "clear_buffer" => {
                input.clear_buffer(&text(0)?);
                Value::Null
            }
            _ => return Ok(None),
        };
        Ok(Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_phases() {
        assert_eq!(phase_of("pressed"), Some(Phase::Pressed));
        assert_eq!(phase_of("mouse_held"), Some(Phase::Held));
        assert_eq!(phase_of("touch_released"), Some(Phase::Released));
        assert_eq!(phase_of("pad_axis"), None);
    }
}
