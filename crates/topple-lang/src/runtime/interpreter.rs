//! Tree-walking interpreter.
//!
//! Statements return a `Flow` so `return` and `break` unwind through plain
//! `Result` plumbing: a function call boundary absorbs `Return`, a `loop`
//! absorbs `Break`, and anything reaching the top level is an error.
//! Native calls are dispatched through the `NativeRegistry`; the interpreter
//! itself contains no built-in function implementations.

use std::rc::Rc;

use tracing::debug;

use crate::error::{ErrorCode, RuntimeError};
use crate::natives::{Host, NativeRegistry, NativeSig};
use crate::runtime::environment::{Environments, ScopeId};
use crate::runtime::value::{Function, Proto, Value, Variant, VariantDef, to_int32};
use crate::syntax::ast::{
    ArmBody, BinOp, EnumDecl, Expr, FrameBlock, Literal, LogicalOp, MatchExpr, Pattern, Program,
    Stmt, UnOp, UpdateOp,
};
use crate::device::InputDevice;

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal(Value),
    Return(Value),
    Break,
}

/// A registered `draw` or `update` block and the scope it closes over.
#[derive(Debug, Clone)]
struct Registration {
    block: Rc<FrameBlock>,
    env: ScopeId,
}

/// Where an assignment or increment writes.
enum Place {
    Var(String),
    Index(Value, Value),
    Member(Value, String),
}

fn err(code: ErrorCode, line: usize, msg: impl Into<String>) -> RuntimeError {
    RuntimeError::new(code, line, msg)
}

// ─── Interpreter ──────────────────────────────────────────────────────────────

pub struct Interpreter {
    envs: Environments,
    natives: NativeRegistry,
    pub(crate) host: Host,
    draw: Option<Registration>,
    update: Option<Registration>,
    last_value: Value,
}

impl Interpreter {
    pub fn new(input: Box<dyn InputDevice>) -> Self {
        let mut interp = Self {
            envs: Environments::new(),
            natives: NativeRegistry::standard(),
            host: Host::new(input),
            draw: None,
            update: None,
            last_value: Value::Null,
        };
        interp.bind_natives();
        interp
    }

    /// Drops every binding, registration and pending output. The input
    /// device is kept.
    pub fn reset(&mut self) {
        self.envs = Environments::new();
        self.draw = None;
        self.update = None;
        self.last_value = Value::Null;
        self.host.draw.clear();
        self.host.audio.clear();
        self.host.printed.clear();
        self.bind_natives();
    }

    fn bind_natives(&mut self) {
        let sigs: Vec<&'static NativeSig> = self.natives.sigs().collect();
        for sig in sigs {
            self.envs.define(ScopeId::GLOBAL, sig.name, Value::Native(sig));
        }
        for (name, value) in self.natives.constants() {
            self.envs.define(ScopeId::GLOBAL, name, value);
        }
    }

    // ─── Entry points ─────────────────────────────────────────────────────────

    /// Runs every top-level statement in the global scope and returns the
    /// value of the last one.
    pub fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let mut last = Value::Null;
        for stmt in &program.body {
            match self.exec_stmt(stmt, ScopeId::GLOBAL)? {
                Flow::Normal(v) => last = v,
                Flow::Return(_) => {
                    return Err(err(ErrorCode::R008, stmt_line(stmt), "`return` outside of a function"));
                }
                Flow::Break => {
                    return Err(err(ErrorCode::R007, stmt_line(stmt), "`break` outside of a loop"));
                }
            }
        }
        self.last_value = last.clone();
        Ok(last)
    }

    /// Invokes the update block, binding the elapsed seconds.
    pub fn run_update(&mut self, dt: f64) -> Result<(), RuntimeError> {
        let Some(reg) = self.update.clone() else { return Ok(()) };
        let param = reg.block.param.as_deref().unwrap_or("dt");
        self.run_frame_block(&reg, Some((param, Value::Number(dt))))
    }

    pub fn run_draw(&mut self) -> Result<(), RuntimeError> {
        let Some(reg) = self.draw.clone() else { return Ok(()) };
        self.run_frame_block(&reg, None)
    }

    fn run_frame_block(&mut self, reg: &Registration, arg: Option<(&str, Value)>) -> Result<(), RuntimeError> {
        let scope = self.envs.child(reg.env);
        if let Some((name, value)) = arg {
            self.envs.define(scope, name, value);
        }
        let result = self.exec_block(&reg.block.body, scope);
        self.envs.release(scope);
        match result? {
            // `return` ends this frame's block early
            Flow::Normal(_) | Flow::Return(_) => Ok(()),
            Flow::Break => Err(err(ErrorCode::R007, reg.block.span.line, "`break` outside of a loop")),
        }
    }

    pub fn has_draw(&self) -> bool { self.draw.is_some() }
    pub fn has_update(&self) -> bool { self.update.is_some() }
    pub fn last_value(&self) -> &Value { &self.last_value }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.envs.get(ScopeId::GLOBAL, name)
    }

    pub fn globals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.envs.globals()
    }

    pub fn input_mut(&mut self) -> &mut dyn InputDevice {
        self.host.input.as_mut()
    }

    pub fn live_scopes(&self) -> usize {
        self.envs.live()
    }

    // ─── Statements ───────────────────────────────────────────────────────────

    fn exec_block(&mut self, stmts: &[Stmt], scope: ScopeId) -> Result<Flow, RuntimeError> {
        let mut last = Value::Null;
        for stmt in stmts {
            match self.exec_stmt(stmt, scope)? {
                Flow::Normal(v) => last = v,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(last))
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> Result<Flow, RuntimeError> {
        let value = match stmt {
            Stmt::VarDecl(v) => {
                let val = self.eval(&v.value, scope)?;
                self.envs.define(scope, &v.name, val.clone());
                val
            }

            Stmt::FnDecl(decl) => {
                self.envs.capture(scope);
                let f = Value::Function(Rc::new(Function { decl: Rc::clone(decl), env: scope }));
                self.envs.define(scope, &decl.name, f.clone());
                f
            }

            Stmt::Return(value, _) => {
                let v = match value {
                    Some(e) => self.eval(e, scope)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(v));
            }

            // `if` and `loop` bodies run in the enclosing scope
            Stmt::If(i) => {
                if self.eval(&i.condition, scope)?.is_truthy() {
                    return self.exec_block(&i.then_block.stmts, scope);
                }
                match &i.else_branch {
                    Some(branch) => return self.exec_stmt(branch, scope),
                    None => Value::Null,
                }
            }

            Stmt::Loop(l) => loop {
                match self.exec_block(&l.body.stmts, scope)? {
                    Flow::Normal(_) => {}
                    Flow::Break => break Value::Null,
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            },

            Stmt::Break(_) => return Ok(Flow::Break),

            Stmt::Block(b) => return self.exec_block(&b.stmts, scope),

            Stmt::Enum(e) => {
                self.declare_enum(e, scope);
                Value::Null
            }

            Stmt::Draw(block) => {
                self.envs.capture(scope);
                let replaced = self.draw.replace(Registration { block: Rc::clone(block), env: scope }).is_some();
                debug!(line = block.span.line, replaced, "draw block registered");
                Value::Null
            }

            Stmt::Update(block) => {
                self.envs.capture(scope);
                let replaced = self.update.replace(Registration { block: Rc::clone(block), env: scope }).is_some();
                debug!(line = block.span.line, replaced, "update block registered");
                Value::Null
            }

            // a match in statement position may `return` or `break` from a block arm
            Stmt::Expr(Expr::Match(m)) => return self.exec_match(m, scope),

            Stmt::Expr(e) => self.eval(e, scope)?,
        };
        Ok(Flow::Normal(value))
    }

    /// Binds nullary variants as values, variants with fields as
    /// constructors, and the enum name as a prototype of all of them.
    fn declare_enum(&mut self, e: &EnumDecl, scope: ScopeId) {
        let mut members = Proto::new();
        for variant in &e.variants {
            let value = if variant.fields.is_empty() {
                Value::EnumVariant(Rc::new(Variant {
                    enum_name: e.name.clone(),
                    name: variant.name.clone(),
                    fields: Vec::new(),
                }))
            } else {
                Value::EnumVariantDef(Rc::new(VariantDef {
                    enum_name: e.name.clone(),
                    name: variant.name.clone(),
                    fields: variant.fields.clone(),
                }))
            };
            members.set(variant.name.clone(), value.clone());
            self.envs.define(scope, &variant.name, value);
        }
        self.envs.define(scope, &e.name, Value::prototype(members));
    }

    // ─── Expressions ──────────────────────────────────────────────────────────

    pub fn eval(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number(n, _) => Ok(Value::Number(*n)),
            Expr::Str(s, _)    => Ok(Value::Str(s.clone())),
            Expr::Bool(b, _)   => Ok(Value::Bool(*b)),
            Expr::Null(_)      => Ok(Value::Null),
            Expr::Prototype(_) => Ok(Value::prototype(Proto::new())),

            Expr::Ident(name, span) => self.envs.get(scope, name)
                .ok_or_else(|| err(ErrorCode::R001, span.line, format!("undefined variable `{name}`"))),

            Expr::Array(items, _) => {
                let vals = items.iter().map(|e| self.eval(e, scope)).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(vals))
            }

            Expr::Object(entries, _) => {
                let mut proto = Proto::new();
                for (key, e) in entries {
                    let v = self.eval(e, scope)?;
                    proto.set(key.clone(), v);
                }
                Ok(Value::prototype(proto))
            }

            Expr::Assign { target, op, value, span } => {
                let place = self.eval_place(target, scope)?;
                let rhs = self.eval(value, scope)?;
                let new = match op.binop() {
                    None => rhs,
                    Some(bin) => {
                        let current = self.read_place(&place, scope, span.line)?;
                        binary(bin, current, rhs, span.line)?
                    }
                };
                self.write_place(place, new.clone(), scope, span.line)?;
                Ok(new)
            }

            // value-preserving short circuit: the operand itself is the result
            Expr::Logical { left, op, right, .. } => {
                let l = self.eval(left, scope)?;
                match (op, l.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(l),
                    _ => self.eval(right, scope),
                }
            }

            Expr::BinOp { left, op, right, span } => {
                let l = self.eval(left, scope)?;
                let r = self.eval(right, scope)?;
                binary(*op, l, r, span.line)
            }

            Expr::UnOp { op, operand, span } => {
                let v = self.eval(operand, scope)?;
                unary(*op, v, span.line)
            }

            Expr::Update { target, op, prefix, span } => {
                let place = self.eval_place(target, scope)?;
                let old = match self.read_place(&place, scope, span.line)? {
                    Value::Number(n) => n,
                    other => return Err(err(ErrorCode::R004, span.line, format!(
                        "cannot {} a {}",
                        if *op == UpdateOp::Inc { "increment" } else { "decrement" },
                        other.type_name()
                    ))),
                };
                let new = if *op == UpdateOp::Inc { old + 1.0 } else { old - 1.0 };
                self.write_place(place, Value::Number(new), scope, span.line)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }

            Expr::Call { callee, args, named_args, span } => {
                let f = self.eval(callee, scope)?;
                let positional = args.iter().map(|a| self.eval(a, scope)).collect::<Result<Vec<_>, _>>()?;
                let named = named_args.iter()
                    .map(|(k, e)| self.eval(e, scope).map(|v| (k.clone(), v)))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_value(&f, positional, named, span.line)
            }

            Expr::Member { object, property, span } => {
                let obj = self.eval(object, scope)?;
                member(&obj, property, span.line)
            }

            Expr::Index { object, index, span } => {
                let obj = self.eval(object, scope)?;
                let idx = self.eval(index, scope)?;
                index_value(&obj, &idx, span.line)
            }

            Expr::Slice { object, start, end, span } => {
                let obj = self.eval(object, scope)?;
                let start = match start { Some(e) => self.eval(e, scope)?, None => Value::Null };
                let end = match end { Some(e) => self.eval(e, scope)?, None => Value::Null };
                slice(&obj, &start, &end, span.line)
            }

            Expr::Match(m) => match self.exec_match(m, scope)? {
                Flow::Normal(v) => Ok(v),
                Flow::Return(_) => Err(err(ErrorCode::R008, m.span.line,
                    "`return` inside a match used as a value")),
                Flow::Break => Err(err(ErrorCode::R007, m.span.line,
                    "`break` inside a match used as a value")),
            },
        }
    }

    // ─── Places ───────────────────────────────────────────────────────────────

    /// Evaluates the object and key of an assignment target exactly once.
    fn eval_place(&mut self, target: &Expr, scope: ScopeId) -> Result<Place, RuntimeError> {
        match target {
            Expr::Ident(name, _) => Ok(Place::Var(name.clone())),
            Expr::Index { object, index, .. } => {
                let obj = self.eval(object, scope)?;
                let key = self.eval(index, scope)?;
                Ok(Place::Index(obj, key))
            }
            Expr::Member { object, property, .. } => {
                let obj = self.eval(object, scope)?;
                Ok(Place::Member(obj, property.clone()))
            }
            other => Err(err(ErrorCode::R003, other.span().line, "invalid assignment target")),
        }
    }

    fn read_place(&self, place: &Place, scope: ScopeId, line: usize) -> Result<Value, RuntimeError> {
        match place {
            Place::Var(name) => self.envs.get(scope, name)
                .ok_or_else(|| err(ErrorCode::R001, line, format!("undefined variable `{name}`"))),
            Place::Index(obj, key) => index_value(obj, key, line),
            Place::Member(obj, prop) => member(obj, prop, line),
        }
    }

    fn write_place(&mut self, place: Place, value: Value, scope: ScopeId, line: usize) -> Result<(), RuntimeError> {
        match place {
            Place::Var(name) => {
                self.envs.set(scope, &name, value);
                Ok(())
            }
            Place::Index(Value::Array(items), key) => {
                let mut items = items.borrow_mut();
                let i = array_index(&key, items.len(), line)?;
                items[i] = value;
                Ok(())
            }
            Place::Index(Value::Prototype(proto), Value::Str(key)) => {
                proto.borrow_mut().set(key, value);
                Ok(())
            }
            Place::Index(Value::Prototype(_), key) => Err(err(ErrorCode::R004, line, format!(
                "prototype keys are strings, got {}", key.type_name()
            ))),
            Place::Member(Value::Prototype(proto), prop) => {
                proto.borrow_mut().set(prop, value);
                Ok(())
            }
            Place::Index(obj, _) | Place::Member(obj, _) => Err(err(ErrorCode::R003, line, format!(
                "cannot assign into a {}", obj.type_name()
            ))),
        }
    }

    // ─── Calls ────────────────────────────────────────────────────────────────

    pub fn call_value(
        &mut self,
        callee: &Value,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Native(sig) => {
                let args = bind_args(sig.name, sig.params, positional, named, sig.variadic, line)?;
                self.natives.call_any(sig.name, &args, &mut self.host, line)?
                    .ok_or_else(|| err(ErrorCode::R002, line, format!("native `{}` is not implemented", sig.name)))
            }

            Value::Function(f) => self.call_function(f, positional, named, line),

            Value::EnumVariantDef(def) => {
                let args = bind_args(&def.name, def.fields.as_slice(), positional, named, false, line)?;
                Ok(Value::EnumVariant(Rc::new(Variant {
                    enum_name: def.enum_name.clone(),
                    name: def.name.clone(),
                    fields: def.fields.iter().cloned().zip(args).collect(),
                })))
            }

            other => Err(err(ErrorCode::R002, line, format!("{} is not callable", other.type_name()))),
        }
    }

    fn call_function(
        &mut self,
        f: &Rc<Function>,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let args = bind_args(f.name(), f.params(), positional, named, false, line)?;
        let scope = self.envs.child(f.env);
        for (param, value) in f.params().iter().zip(args) {
            self.envs.define(scope, param, value);
        }
        let result = self.exec_block(&f.decl.body, scope);
        self.envs.release(scope);
        match result? {
            Flow::Normal(_) => Ok(Value::Null),
            Flow::Return(v) => Ok(v),
            Flow::Break => Err(err(ErrorCode::R007, line, format!("`break` escaped function `{}`", f.name()))),
        }
    }

    // ─── Match ────────────────────────────────────────────────────────────────

    fn exec_match(&mut self, m: &MatchExpr, scope: ScopeId) -> Result<Flow, RuntimeError> {
        let subject = self.eval(&m.subject, scope)?;

        for arm in &m.arms {
            let Some(bindings) = match_pattern(&arm.pattern, &subject) else { continue };

            let arm_scope = self.envs.child(scope);
            for (name, value) in bindings {
                self.envs.define(arm_scope, &name, value);
            }
            let result = match &arm.body {
                ArmBody::Block(b) => self.exec_block(&b.stmts, arm_scope).map(|flow| match flow {
                    // a block arm runs for effect; the match yields null
                    Flow::Normal(_) => Flow::Normal(Value::Null),
                    other => other,
                }),
                ArmBody::Expr(e) => self.eval(e, arm_scope).map(Flow::Normal),
            };
            self.envs.release(arm_scope);
            return result;
        }

        Err(err(ErrorCode::R006, m.span.line, format!("no match arm matches {subject}")))
    }
}

// ─── Pattern matching ─────────────────────────────────────────────────────────

/// The bindings a pattern introduces, or `None` if it does not match.
fn match_pattern(pattern: &Pattern, v: &Value) -> Option<Vec<(String, Value)>> {
    match pattern {
        Pattern::Wildcard(_) => Some(Vec::new()),

        Pattern::Literal(lit, _) => {
            let lit = match lit {
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s)    => Value::Str(s.clone()),
                Literal::Bool(b)   => Value::Bool(*b),
                Literal::Null      => Value::Null,
            };
            lit.strict_eq(v).then(Vec::new)
        }

        Pattern::Binding(name, _) => Some(vec![(name.clone(), v.clone())]),

        Pattern::Variant { enum_name, name, bindings, .. } => {
            let Value::EnumVariant(variant) = v else { return None };
            if variant.name != *name {
                return None;
            }
            if enum_name.as_ref().is_some_and(|e| *e != variant.enum_name) {
                return None;
            }
            Some(
                bindings.iter().enumerate()
                    .filter(|(_, b)| b.as_str() != "_")
                    .map(|(i, b)| {
                        let field = variant.fields.get(i).map(|(_, v)| v.clone()).unwrap_or(Value::Null);
                        (b.clone(), field)
                    })
                    .collect(),
            )
        }
    }
}

// ─── Argument binding ─────────────────────────────────────────────────────────

/// Lays positional then keyword arguments out against `params`. Missing slots
/// are `Null`; extra positionals are dropped unless `keep_extra`.
fn bind_args<S: AsRef<str>>(
    callee: &str,
    params: &[S],
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
    keep_extra: bool,
    line: usize,
) -> Result<Vec<Value>, RuntimeError> {
    let mut slots = positional;
    if slots.len() > params.len() && !keep_extra {
        slots.truncate(params.len());
    }
    if slots.len() < params.len() {
        slots.resize(params.len(), Value::Null);
    }
    for (key, value) in named {
        let Some(i) = params.iter().position(|p| p.as_ref() == key) else {
            return Err(err(ErrorCode::R005, line, format!("`{callee}` has no parameter named `{key}`")));
        };
        slots[i] = value;
    }
    Ok(slots)
}

// ─── Member / index / slice ───────────────────────────────────────────────────

fn member(obj: &Value, prop: &str, line: usize) -> Result<Value, RuntimeError> {
    match obj {
        Value::Prototype(p) => Ok(p.borrow().get(prop).cloned().unwrap_or(Value::Null)),
        Value::Array(items) if prop == "length" => Ok(Value::Number(items.borrow().len() as f64)),
        Value::Str(s) if prop == "length" => Ok(Value::Number(s.chars().count() as f64)),
        Value::EnumVariant(v) => v.field(prop).cloned().ok_or_else(|| err(ErrorCode::R003, line,
            format!("variant `{}` has no field `{prop}`", v.name))),
        other => Err(err(ErrorCode::R003, line, format!("{} has no member `{prop}`", other.type_name()))),
    }
}

/// Resolves a possibly negative index against `len`.
fn array_index(key: &Value, len: usize, line: usize) -> Result<usize, RuntimeError> {
    let Value::Number(n) = key else {
        return Err(err(ErrorCode::R004, line, format!("index must be a number, got {}", key.type_name())));
    };
    let i = n.trunc() as i64;
    let resolved = if i < 0 { i + len as i64 } else { i };
    if resolved < 0 || resolved >= len as i64 {
        return Err(err(ErrorCode::R009, line, format!("index {i} out of bounds for length {len}")));
    }
    Ok(resolved as usize)
}

fn index_value(obj: &Value, key: &Value, line: usize) -> Result<Value, RuntimeError> {
    match obj {
        Value::Array(items) => {
            let items = items.borrow();
            let i = array_index(key, items.len(), line)?;
            Ok(items[i].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = array_index(key, chars.len(), line)?;
            Ok(Value::Str(chars[i].to_string()))
        }
        Value::Prototype(p) => match key {
            Value::Str(k) => Ok(p.borrow().get(k).cloned().unwrap_or(Value::Null)),
            other => Err(err(ErrorCode::R004, line, format!("prototype keys are strings, got {}", other.type_name()))),
        },
        other => Err(err(ErrorCode::R003, line, format!("cannot index a {}", other.type_name()))),
    }
}

/// Python-style bounds: negatives count from the end, then clamp to `0..=len`.
fn slice_bounds(start: &Value, end: &Value, len: usize, line: usize) -> Result<(usize, usize), RuntimeError> {
    let bound = |v: &Value, default: i64| -> Result<usize, RuntimeError> {
        let i = match v {
            Value::Null => default,
            Value::Number(n) => n.trunc() as i64,
            other => return Err(err(ErrorCode::R004, line, format!("slice bound must be a number, got {}", other.type_name()))),
        };
        let i = if i < 0 { i + len as i64 } else { i };
        Ok(i.clamp(0, len as i64) as usize)
    };
    let s = bound(start, 0)?;
    let e = bound(end, len as i64)?;
    Ok((s, e.max(s)))
}

fn slice(obj: &Value, start: &Value, end: &Value, line: usize) -> Result<Value, RuntimeError> {
    match obj {
        Value::Array(items) => {
            let items = items.borrow();
            let (s, e) = slice_bounds(start, end, items.len(), line)?;
            Ok(Value::array(items[s..e].to_vec()))
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let (s, e) = slice_bounds(start, end, chars.len(), line)?;
            Ok(Value::Str(chars[s..e].iter().collect()))
        }
        other => Err(err(ErrorCode::R003, line, format!("cannot slice a {}", other.type_name()))),
    }
}

// ─── Operators ────────────────────────────────────────────────────────────────

fn binary(op: BinOp, l: Value, r: Value, line: usize) -> Result<Value, RuntimeError> {
    use crate::runtime::value::Value::{Number as N, Str as S};

    let mismatch = |l: &Value, r: &Value| err(ErrorCode::R004, line, format!(
        "operator `{}` not supported for {} and {}", op.symbol(), l.type_name(), r.type_name()
    ));

    let v = match (op, &l, &r) {
        (BinOp::Eq, _, _)    => Value::Bool(l.strict_eq(&r)),
        (BinOp::NotEq, _, _) => Value::Bool(!l.strict_eq(&r)),

        (BinOp::Add, S(_), _) | (BinOp::Add, _, S(_)) => Value::Str(format!("{l}{r}")),
        (BinOp::Add, N(a), N(b)) => N(a + b),
        (BinOp::Sub, N(a), N(b)) => N(a - b),
        (BinOp::Mul, N(a), N(b)) => N(a * b),
        (BinOp::Div, N(a), N(b)) => N(a / b),
        (BinOp::Mod, N(a), N(b)) => N(a % b),
        (BinOp::Pow, N(a), N(b)) => N(a.powf(*b)),

        (BinOp::Lt, N(a), N(b))   => Value::Bool(a < b),
        (BinOp::LtEq, N(a), N(b)) => Value::Bool(a <= b),
        (BinOp::Gt, N(a), N(b))   => Value::Bool(a > b),
        (BinOp::GtEq, N(a), N(b)) => Value::Bool(a >= b),
        (BinOp::Lt, S(a), S(b))   => Value::Bool(a < b),
        (BinOp::LtEq, S(a), S(b)) => Value::Bool(a <= b),
        (BinOp::Gt, S(a), S(b))   => Value::Bool(a > b),
        (BinOp::GtEq, S(a), S(b)) => Value::Bool(a >= b),

        (BinOp::BitAnd, N(a), N(b)) => N((to_int32(*a) & to_int32(*b)) as f64),
        (BinOp::BitOr, N(a), N(b))  => N((to_int32(*a) | to_int32(*b)) as f64),
        (BinOp::BitXor, N(a), N(b)) => N((to_int32(*a) ^ to_int32(*b)) as f64),
        (BinOp::Shl, N(a), N(b)) => N(to_int32(*a).wrapping_shl(to_int32(*b) as u32 & 31) as f64),
        (BinOp::Shr, N(a), N(b)) => N((to_int32(*a) >> (to_int32(*b) as u32 & 31)) as f64),

        _ => return Err(mismatch(&l, &r)),
    };
    Ok(v)
}

fn unary(op: UnOp, v: Value, line: usize) -> Result<Value, RuntimeError> {
    match (op, &v) {
        (UnOp::Not, _) => Ok(Value::Bool(!v.is_truthy())),
        (UnOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnOp::BitNot, Value::Number(n)) => Ok(Value::Number(!to_int32(*n) as f64)),
        (UnOp::Neg, other) => Err(err(ErrorCode::R004, line, format!("cannot negate a {}", other.type_name()))),
        (UnOp::BitNot, other) => Err(err(ErrorCode::R004, line, format!("`~` needs a number, got {}", other.type_name()))),
    }
}

fn stmt_line(stmt: &Stmt) -> usize {
    match stmt {
        Stmt::VarDecl(v) => v.span.line,
        Stmt::FnDecl(f) => f.span.line,
        Stmt::Return(_, s) | Stmt::Break(s) => s.line,
        Stmt::If(i) => i.span.line,
        Stmt::Loop(l) => l.span.line,
        Stmt::Block(b) => b.span.line,
        Stmt::Enum(e) => e.span.line,
        Stmt::Draw(b) | Stmt::Update(b) => b.span.line,
        Stmt::Expr(e) => e.span().line,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
