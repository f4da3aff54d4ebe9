use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::natives::NativeSig;
use crate::runtime::environment::ScopeId;
use crate::syntax::ast::FnDecl;

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Array(Rc<RefCell<Vec<Value>>>),
    Prototype(Rc<RefCell<Proto>>),
    Function(Rc<Function>),
    /// Constructor for a variant that carries fields.
    EnumVariantDef(Rc<VariantDef>),
    EnumVariant(Rc<Variant>),
    Native(&'static NativeSig),
}

/// A user function closed over the scope it was declared in.
#[derive(Debug)]
pub struct Function {
    pub decl: Rc<FnDecl>,
    pub env: ScopeId,
}

impl Function {
    pub fn name(&self) -> &str { &self.decl.name }
    pub fn params(&self) -> &[String] { &self.decl.params }
}

#[derive(Debug)]
pub struct VariantDef {
    pub enum_name: String,
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug)]
pub struct Variant {
    pub enum_name: String,
    pub name: String,
    pub fields: Vec<(String, Value)>,
}

impl Variant {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

// ─── Prototype ────────────────────────────────────────────────────────────────

/// Insertion-ordered string-keyed map backing `prototype()` and `{...}` literals.
#[derive(Debug, Default)]
pub struct Proto {
    entries: Vec<(String, Value)>,
}

impl Proto {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl FromIterator<(String, Value)> for Proto {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut proto = Proto::new();
        for (k, v) in iter {
            proto.set(k, v);
        }
        proto
    }
}

// ─── Construction / inspection ───────────────────────────────────────────────

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn prototype(proto: Proto) -> Self {
        Value::Prototype(Rc::new(RefCell::new(proto)))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_)         => "number",
            Value::Str(_)            => "string",
            Value::Bool(_)           => "boolean",
            Value::Null              => "null",
            Value::Array(_)          => "array",
            Value::Prototype(_)      => "prototype",
            Value::Function(_)       => "function",
            Value::EnumVariantDef(_) => "constructor",
            Value::EnumVariant(_)    => "variant",
            Value::Native(_)         => "native",
        }
    }

    /// `null`, `false`, `0`, `NaN` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null      => false,
            Value::Bool(b)   => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s)    => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Strict equality: primitives by value, composites by identity.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Prototype(a), Value::Prototype(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::EnumVariantDef(a), Value::EnumVariantDef(b)) => Rc::ptr_eq(a, b),
            (Value::EnumVariant(a), Value::EnumVariant(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.name == b.name,
            _ => false,
        }
    }
}

// ─── Numeric helpers ──────────────────────────────────────────────────────────

/// Truncates to a signed 32-bit integer, wrapping modulo 2^32.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32 as i32
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ─── Display ──────────────────────────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => write_nested(other, f),
        }
    }
}

/// Like `Display`, but strings are quoted, as inside arrays and objects.
fn write_nested(v: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match v {
        Value::Number(n) => f.write_str(&format_number(*n)),
        Value::Str(s)    => write!(f, "\"{s}\""),
        Value::Bool(b)   => write!(f, "{b}"),
        Value::Null      => f.write_str("null"),
        Value::Array(items) => {
            f.write_str("[")?;
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 { f.write_str(", ")?; }
                write_nested(item, f)?;
            }
            f.write_str("]")
        }
        Value::Prototype(proto) => {
            let proto = proto.borrow();
            if proto.is_empty() {
                return f.write_str("{}");
            }
            f.write_str("{ ")?;
            for (i, (k, item)) in proto.iter().enumerate() {
                if i > 0 { f.write_str(", ")?; }
                write!(f, "{k}: ")?;
                write_nested(item, f)?;
            }
            f.write_str(" }")
        }
        Value::Function(func)     => write!(f, "<fun {}>", func.name()),
        Value::EnumVariantDef(d)  => write!(f, "<variant {}.{}>", d.enum_name, d.name),
        Value::EnumVariant(v) => {
            f.write_str(&v.name)?;
            if !v.fields.is_empty() {
                f.write_str("(")?;
                for (i, (_, item)) in v.fields.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write_nested(item, f)?;
                }
                f.write_str(")")?;
            }
            Ok(())
        }
        Value::Native(sig) => write!(f, "<native {}>", sig.name),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
