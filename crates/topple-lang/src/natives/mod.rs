use tracing::trace;

use crate::device::InputDevice;
use crate::error::{ErrorCode, RuntimeError};
use crate::Value;

pub mod core;
pub mod draw;
pub mod audio;
pub mod input;

pub use audio::AudioCommand;
pub use draw::{Color, DrawCommand};

// ─── Host ─────────────────────────────────────────────────────────────────────

/// Everything a native can touch: the input device plus the output queues
/// the host drains once per frame.
pub struct Host {
    pub input: Box<dyn InputDevice>,
    pub draw: Vec<DrawCommand>,
    pub audio: Vec<AudioCommand>,
    pub printed: Vec<String>,
}

impl Host {
    pub fn new(input: Box<dyn InputDevice>) -> Self {
        Self { input, draw: Vec::new(), audio: Vec::new(), printed: Vec::new() }
    }
}

// ─── Signatures ───────────────────────────────────────────────────────────────

/// Name and ordered parameter names of a native, used to place keyword args.
#[derive(Debug, PartialEq, Eq)]
pub struct NativeSig {
    pub name: &'static str,
    pub params: &'static [&'static str],
    /// Extra positional arguments are passed through (`print`).
    pub variadic: bool,
}

impl NativeSig {
    pub const fn new(name: &'static str, params: &'static [&'static str]) -> Self {
        Self { name, params, variadic: false }
    }

    pub const fn variadic(name: &'static str) -> Self {
        Self { name, params: &[], variadic: true }
    }
}

// ─── Provider interface ───────────────────────────────────────────────────────

pub trait NativeProvider {
    fn name(&self) -> &'static str;
    fn natives(&self) -> &'static [NativeSig];

    /// `args` is already bound: one slot per declared param (missing ones
    /// are `Null`), plus any variadic extras. `Ok(None)` means "not mine".
    fn call(
        &self,
        name: &str,
        args: &[Value],
        host: &mut Host,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError>;

    fn constants(&self) -> Vec<(&'static str, Value)> { Vec::new() }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct NativeRegistry {
    providers: Vec<Box<dyn NativeProvider>>,
}

impl NativeRegistry {
    pub fn new() -> Self { Self { providers: Vec::new() } }

    pub fn register(&mut self, p: Box<dyn NativeProvider>) { self.providers.push(p); }

    pub fn get(&self, name: &str) -> Option<&dyn NativeProvider> {
        self.providers.iter().find(|p| p.name() == name).map(|p| p.as_ref())
    }

    /// Every native across all providers, in registration order.
    pub fn sigs(&self) -> impl Iterator<Item = &'static NativeSig> + '_ {
        self.providers.iter().flat_map(|p| p.natives().iter())
    }

    pub fn lookup(&self, name: &str) -> Option<&'static NativeSig> {
        self.sigs().find(|s| s.name == name)
    }

    pub fn constants(&self) -> Vec<(&'static str, Value)> {
        self.providers.iter().flat_map(|p| p.constants()).collect()
    }

    pub fn call_any(
        &self,
        name: &str,
        args: &[Value],
        host: &mut Host,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        for p in &self.providers {
            if let Some(v) = p.call(name, args, host, line)? {
                trace!(native = name, provider = p.name(), argc = args.len(), "native call");
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    pub fn standard() -> Self {
        let mut r = Self::new();
        r.register(Box::new(core::CoreNatives));
        r.register(Box::new(draw::DrawNatives));
        r.register(Box::new(audio::AudioNatives));
        r.register(Box::new(input::InputNatives));
        r
    }
}

impl Default for NativeRegistry {
    fn default() -> Self { Self::standard() }
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

pub(crate) fn arg_error(name: &str, line: usize, msg: impl std::fmt::Display) -> RuntimeError {
    RuntimeError::new(ErrorCode::R010, line, format!("`{name}`: {msg}"))
}

pub(crate) fn as_number(name: &str, v: &Value, line: usize) -> Result<f64, RuntimeError> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(arg_error(name, line, format_args!("expected number, got {}", other.type_name()))),
    }
}

/// A number argument that may be omitted.
pub(crate) fn number_or(name: &str, v: &Value, default: f64, line: usize) -> Result<f64, RuntimeError> {
    match v {
        Value::Null => Ok(default),
        other => as_number(name, other, line),
    }
}

pub(crate) fn as_text(name: &str, v: &Value, line: usize) -> Result<String, RuntimeError> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        other => Err(arg_error(name, line, format_args!("expected string, got {}", other.type_name()))),
    }
}

/// Button and axis indices are small non-negative integers.
pub(crate) fn as_index(name: &str, v: &Value, line: usize) -> Result<u32, RuntimeError> {
    let n = as_number(name, v, line)?;
    if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
        return Err(arg_error(name, line, format_args!("expected a button index, got {n}")));
    }
    Ok(n as u32)
}

/// The value at `i`, or `Null` when the slot is absent.
pub(crate) fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&Value::Null)
}
