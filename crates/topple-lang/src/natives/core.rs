//! Always-available built-ins: printing, collections, conversion, math, random.

use tracing::info;

use crate::error::RuntimeError;
use crate::runtime::value::format_number;
use crate::Value;
use super::{Host, NativeProvider, NativeSig, arg, arg_error, as_number};

const NATIVES: &[NativeSig] = &[
    NativeSig::variadic("print"),
    NativeSig::new("len",        &["value"]),
    NativeSig::new("push",       &["array", "value"]),
    NativeSig::new("pop",        &["array"]),
    NativeSig::new("keys",       &["object"]),
    NativeSig::new("str",        &["value"]),
    NativeSig::new("num",        &["value"]),
    NativeSig::new("type",       &["value"]),
    NativeSig::new("floor",      &["x"]),
    NativeSig::new("ceil",       &["x"]),
    NativeSig::new("round",      &["x"]),
    NativeSig::new("abs",        &["x"]),
    NativeSig::new("sqrt",       &["x"]),
    NativeSig::new("sin",        &["x"]),
    NativeSig::new("cos",        &["x"]),
    NativeSig::new("atan2",      &["y", "x"]),
    NativeSig::new("min",        &["a", "b"]),
    NativeSig::new("max",        &["a", "b"]),
    NativeSig::new("clamp",      &["x", "lo", "hi"]),
    NativeSig::new("random",     &[]),
    NativeSig::new("random_int", &["lo", "hi"]),
];

pub struct CoreNatives;

impl NativeProvider for CoreNatives {
    fn name(&self) -> &'static str { "core" }

    fn natives(&self) -> &'static [NativeSig] { NATIVES }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        host: &mut Host,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let num = |i: usize| as_number(name, arg(args, i), line);

        let v = match name {
            "print" => {
                let text = args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ");
                info!(target: "topple::print", "{text}");
                host.printed.push(text);
                Value::Null
            }

            // ── Collections ────────────────────────────────────────────────
            "len" => match arg(args, 0) {
                Value::Array(items) => Value::Number(items.borrow().len() as f64),
                Value::Str(s)       => Value::Number(s.chars().count() as f64),
                Value::Prototype(p) => Value::Number(p.borrow().len() as f64),
                other => return Err(arg_error(name, line, format_args!("no length for {}", other.type_name()))),
            },
            "push" => match arg(args, 0) {
                Value::Array(items) => {
                    let mut items = items.borrow_mut();
                    items.push(arg(args, 1).clone());
                    Value::Number(items.len() as f64)
                }
                other => return Err(arg_error(name, line, format_args!("expected array, got {}", other.type_name()))),
            },
            "pop" => match arg(args, 0) {
                Value::Array(items) => items.borrow_mut().pop().unwrap_or(Value::Null),
                other => return Err(arg_error(name, line, format_args!("expected array, got {}", other.type_name()))),
            },
            "keys" => match arg(args, 0) {
                Value::Prototype(p) => Value::array(p.borrow().keys().map(Value::str).collect()),
                other => return Err(arg_error(name, line, format_args!("expected prototype, got {}", other.type_name()))),
            },

            // ── Conversion ─────────────────────────────────────────────────
            "str" => Value::Str(arg(args, 0).to_string()),
            "num" => Value::Number(to_number(arg(args, 0))),
            "type" => Value::str(arg(args, 0).type_name()),

            // ── Math ───────────────────────────────────────────────────────
            "floor" => Value::Number(num(0)?.floor()),
            "ceil"  => Value::Number(num(0)?.ceil()),
            // halves round up, as in most scripting languages
            "round" => Value::Number((num(0)? + 0.5).floor()),
            "abs"   => Value::Number(num(0)?.abs()),
            "sqrt"  => Value::Number(num(0)?.sqrt()),
            "sin"   => Value::Number(num(0)?.sin()),
            "cos"   => Value::Number(num(0)?.cos()),
            "atan2" => Value::Number(num(0)?.atan2(num(1)?)),
            "min"   => Value::Number(num(0)?.min(num(1)?)),
            "max"   => Value::Number(num(0)?.max(num(1)?)),
            "clamp" => {
                let (x, lo, hi) = (num(0)?, num(1)?, num(2)?);
                if lo > hi {
                    return Err(arg_error(name, line, format_args!("empty range {} to {}", format_number(lo), format_number(hi))));
                }
                Value::Number(x.clamp(lo, hi))
            }

            // ── Random ─────────────────────────────────────────────────────
            "random" => Value::Number(rand::random::<f64>()),
            "random_int" => {
                let (a, b) = (num(0)?.floor() as i64, num(1)?.floor() as i64);
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                Value::Number(rand::random_range(lo..=hi) as f64)
            }

            _ => return Ok(None),
        };
        Ok(Some(v))
    }

    fn constants(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("PI",  Value::Number(std::f64::consts::PI)),
            ("TAU", Value::Number(std::f64::consts::TAU)),
        ]
    }
}

/// Loose numeric conversion: unparseable text becomes `NaN`.
fn to_number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => *n,
        Value::Bool(b)   => if *b { 1.0 } else { 0.0 },
        Value::Null      => 0.0,
        Value::Str(s) => {
            let t = s.trim();
            if t.is_empty() {
                0.0
            } else if let Some(hex) = t.strip_prefix("0x") {
                i64::from_str_radix(hex, 16).map(|n| n as f64).unwrap_or(f64::NAN)
            } else if let Some(bin) = t.strip_prefix("0b") {
                i64::from_str_radix(bin, 2).map(|n| n as f64).unwrap_or(f64::NAN)
            } else {
                t.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_number_conversions() {
        assert_eq!(to_number(&Value::str(" 42 ")), 42.0);
        assert_eq!(to_number(&Value::str("0x1F")), 31.0);
        assert_eq!(to_number(&Value::str("0b101")), 5.0);
        assert_eq!(to_number(&Value::Bool(true)), 1.0);
        assert!(to_number(&Value::str("nope")).is_nan());
    }
}
