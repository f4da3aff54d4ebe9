//! Lexical scopes stored in an arena and addressed by `ScopeId`.
//!
//! Closures hold the id of the scope they were declared in. A scope that has
//! been captured (or is an ancestor of one) is pinned: `release` leaves it in
//! place so the closure keeps seeing live bindings. Uncaptured scopes are
//! recycled once the call, arm or frame that opened them returns.

use crate::runtime::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

#[derive(Debug, Default)]
struct Scope {
    vars: Vec<(String, Value)>,
    parent: Option<ScopeId>,
    captured: bool,
}

#[derive(Debug)]
pub struct Environments {
    scopes: Vec<Scope>,
    free: Vec<usize>,
}

impl Default for Environments {
    fn default() -> Self { Self::new() }
}

impl Environments {
    pub fn new() -> Self {
        Self { scopes: vec![Scope { captured: true, ..Scope::default() }], free: Vec::new() }
    }

    /// Opens a fresh scope whose parent is `parent`.
    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        let scope = Scope { vars: Vec::new(), parent: Some(parent), captured: false };
        match self.free.pop() {
            Some(slot) => {
                self.scopes[slot] = scope;
                ScopeId(slot)
            }
            None => {
                self.scopes.push(scope);
                ScopeId(self.scopes.len() - 1)
            }
        }
    }

    /// Binds `name` in exactly this scope, shadowing any outer binding.
    pub fn define(&mut self, id: ScopeId, name: &str, value: Value) {
        let vars = &mut self.scopes[id.0].vars;
        match vars.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => vars.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, id: ScopeId, name: &str) -> Option<Value> {
        let owner = self.resolve(id, name)?;
        self.scopes[owner.0].vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    /// Updates the nearest scope that defines `name`; an unknown name is
    /// created in the global scope.
    pub fn set(&mut self, id: ScopeId, name: &str, value: Value) {
        let owner = self.resolve(id, name).unwrap_or(ScopeId::GLOBAL);
        self.define(owner, name, value);
    }

    /// The scope on the chain from `id` that defines `name`.
    pub fn resolve(&self, id: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(id);
        while let Some(scope_id) = current {
            let scope = &self.scopes[scope_id.0];
            if scope.vars.iter().any(|(k, _)| k == name) {
                return Some(scope_id);
            }
            current = scope.parent;
        }
        None
    }

    /// Pins `id` and all of its ancestors.
    pub fn capture(&mut self, id: ScopeId) {
        let mut current = Some(id);
        while let Some(scope_id) = current {
            let scope = &mut self.scopes[scope_id.0];
            if scope.captured { break; }
            scope.captured = true;
            current = scope.parent;
        }
    }

    /// Returns an uncaptured scope to the free list.
    pub fn release(&mut self, id: ScopeId) {
        let scope = &mut self.scopes[id.0];
        if scope.captured {
            return;
        }
        scope.vars.clear();
        scope.parent = None;
        self.free.push(id.0);
    }

    /// Scopes currently in use.
    pub fn live(&self) -> usize {
        self.scopes.len() - self.free.len()
    }

    pub fn globals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.scopes[0].vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn num(envs: &Environments, id: ScopeId, name: &str) -> f64 {
        match envs.get(id, name) {
            Some(Value::Number(n)) => n,
            other => panic!("expected number for `{name}`, got {other:?}"),
        }
    }

    #[test]
    fn lookup_walks_to_parent() {
        let mut envs = Environments::new();
        envs.define(ScopeId::GLOBAL, "x", Value::Number(1.0));
        let inner = envs.child(ScopeId::GLOBAL);
        assert_eq!(num(&envs, inner, "x"), 1.0);
        assert!(envs.get(inner, "y").is_none());
    }

    #[test]
    fn define_shadows_and_set_updates_owner() {
        let mut envs = Environments::new();
        envs.define(ScopeId::GLOBAL, "x", Value::Number(1.0));
        let inner = envs.child(ScopeId::GLOBAL);
        envs.set(inner, "x", Value::Number(2.0));
        assert_eq!(num(&envs, ScopeId::GLOBAL, "x"), 2.0);

        envs.define(inner, "x", Value::Number(9.0));
        assert_eq!(num(&envs, inner, "x"), 9.0);
        assert_eq!(num(&envs, ScopeId::GLOBAL, "x"), 2.0);
    }

    #[test]
    fn set_of_unknown_name_goes_global() {
        let mut envs = Environments::new();
        let a = envs.child(ScopeId::GLOBAL);
        let b = envs.child(a);
        envs.set(b, "fresh", Value::Number(5.0));
        assert_eq!(envs.resolve(b, "fresh"), Some(ScopeId::GLOBAL));
    }

    #[test]
    fn released_scopes_are_reused() {
        let mut envs = Environments::new();
        let a = envs.child(ScopeId::GLOBAL);
        envs.define(a, "tmp", Value::Null);
        envs.release(a);
        assert_eq!(envs.live(), 1);
        let b = envs.child(ScopeId::GLOBAL);
        assert_eq!(a, b);
        assert!(envs.get(b, "tmp").is_none());
    }

    #[test]
    fn captured_scopes_survive_release() {
        let mut envs = Environments::new();
        let outer = envs.child(ScopeId::GLOBAL);
        let inner = envs.child(outer);
        envs.define(outer, "n", Value::Number(3.0));
        envs.capture(inner);
        envs.release(inner);
        envs.release(outer);
        assert_eq!(envs.live(), 3);
        assert_eq!(num(&envs, inner, "n"), 3.0);
    }
}
