//! Post-parse pattern resolution.
//!
//! The parser cannot tell `Idle => ...` (a nullary enum variant) from
//! `state => ...` (a catch-all binding). This pass collects every nullary
//! variant declared anywhere in the program and rewrites bare-name patterns
//! that refer to one into explicit `Pattern::Variant` nodes, so the
//! interpreter never has to guess from the spelling of a name.

use std::collections::HashSet;

use tracing::debug;

use crate::syntax::ast::*;

/// Rewrite bare-name patterns naming a declared nullary variant.
pub fn resolve(program: &mut Program) {
    let mut nullary = HashSet::new();
    collect_stmts(&program.body, &mut nullary);
    if nullary.is_empty() {
        return;
    }
    let mut resolver = Resolver { nullary: &nullary, rewritten: 0 };
    resolver.stmts(&mut program.body);
    debug!(variants = nullary.len(), rewritten = resolver.rewritten, "patterns resolved");
}

// ─── Collection ──────────────────────────────────────────────────────────────

fn collect_stmts(stmts: &[Stmt], out: &mut HashSet<String>) {
    for stmt in stmts {
        collect_stmt(stmt, out);
    }
}

fn collect_stmt(stmt: &Stmt, out: &mut HashSet<String>) {
    match stmt {
        Stmt::Enum(e) => {
            out.extend(e.variants.iter().filter(|v| v.fields.is_empty()).map(|v| v.name.clone()));
        }
        Stmt::FnDecl(f) => collect_stmts(&f.body, out),
        Stmt::If(i) => {
            collect_stmts(&i.then_block.stmts, out);
            if let Some(e) = &i.else_branch { collect_stmt(e, out); }
        }
        Stmt::Loop(l) => collect_stmts(&l.body.stmts, out),
        Stmt::Block(b) => collect_stmts(&b.stmts, out),
        Stmt::Draw(b) | Stmt::Update(b) => collect_stmts(&b.body, out),
        Stmt::VarDecl(_) | Stmt::Return(..) | Stmt::Break(_) | Stmt::Expr(_) => {}
    }
}

// ─── Rewriting ───────────────────────────────────────────────────────────────

struct Resolver<'a> {
    nullary: &'a HashSet<String>,
    rewritten: usize,
}

impl Resolver<'_> {
    fn stmts(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::VarDecl(v) => self.expr(&mut v.value),
            // Function and frame bodies sit behind `Rc`; they are freshly
            // parsed here so `make_mut` never clones.
            Stmt::FnDecl(f) => self.stmts(&mut std::rc::Rc::make_mut(f).body),
            Stmt::Draw(b) | Stmt::Update(b) => self.stmts(&mut std::rc::Rc::make_mut(b).body),
            Stmt::Return(value, _) => {
                if let Some(e) = value { self.expr(e); }
            }
            Stmt::If(i) => {
                self.expr(&mut i.condition);
                self.stmts(&mut i.then_block.stmts);
                if let Some(e) = &mut i.else_branch { self.stmt(e); }
            }
            Stmt::Loop(l) => self.stmts(&mut l.body.stmts),
            Stmt::Block(b) => self.stmts(&mut b.stmts),
            Stmt::Expr(e) => self.expr(e),
            Stmt::Enum(_) | Stmt::Break(_) => {}
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Number(..) | Expr::Str(..) | Expr::Bool(..) | Expr::Null(_)
            | Expr::Prototype(_) | Expr::Ident(..) => {}
            Expr::Array(items, _) => items.iter_mut().for_each(|e| self.expr(e)),
            Expr::Object(entries, _) => entries.iter_mut().for_each(|(_, e)| self.expr(e)),
            Expr::Assign { target, value, .. } => { self.expr(target); self.expr(value); }
            Expr::Logical { left, right, .. } | Expr::BinOp { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expr::UnOp { operand, .. } => self.expr(operand),
            Expr::Update { target, .. } => self.expr(target),
            Expr::Call { callee, args, named_args, .. } => {
                self.expr(callee);
                args.iter_mut().for_each(|e| self.expr(e));
                named_args.iter_mut().for_each(|(_, e)| self.expr(e));
            }
            Expr::Member { object, .. } => self.expr(object),
            Expr::Index { object, index, .. } => { self.expr(object); self.expr(index); }
            Expr::Slice { object, start, end, .. } => {
                self.expr(object);
                if let Some(s) = start { self.expr(s); }
                if let Some(e) = end { self.expr(e); }
            }
            Expr::Match(m) => {
                self.expr(&mut m.subject);
                for arm in &mut m.arms {
                    self.pattern(&mut arm.pattern);
                    match &mut arm.body {
                        ArmBody::Block(b) => self.stmts(&mut b.stmts),
                        ArmBody::Expr(e) => self.expr(e),
                    }
                }
            }
        }
    }

    fn pattern(&mut self, pattern: &mut Pattern) {
        if let Pattern::Binding(name, span) = pattern {
            if self.nullary.contains(name.as_str()) {
                *pattern = Pattern::Variant {
                    enum_name: None,
                    name: std::mem::take(name),
                    bindings: Vec::new(),
                    span: *span,
                };
                self.rewritten += 1;
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{lexer::Lexer, parser::Parser};

    fn resolved(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let mut program = Parser::new(tokens).parse().expect("parse failed");
        resolve(&mut program);
        program
    }

    fn arm_patterns(program: &Program, stmt: usize) -> Vec<Pattern> {
        match &program.body[stmt] {
            Stmt::Expr(Expr::Match(m)) => m.arms.iter().map(|a| a.pattern.clone()).collect(),
            Stmt::VarDecl(VarDecl { value: Expr::Match(m), .. }) => {
                m.arms.iter().map(|a| a.pattern.clone()).collect()
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn nullary_variant_name_becomes_variant_pattern() {
        let p = resolved("enum S { Idle, Run(speed) }\nmatch s { Idle => 0, other => 1 }");
        let pats = arm_patterns(&p, 1);
        assert!(matches!(&pats[0], Pattern::Variant { name, bindings, .. } if name == "Idle" && bindings.is_empty()));
        assert!(matches!(&pats[1], Pattern::Binding(name, _) if name == "other"));
    }

    #[test]
    fn variant_with_fields_is_not_a_nullary_name() {
        // `Run` without parentheses stays a binding: only nullary variants are rewritten
        let p = resolved("enum S { Idle, Run(speed) }\nmatch s { Run => 0 }");
        assert!(matches!(&arm_patterns(&p, 1)[0], Pattern::Binding(..)));
    }

    #[test]
    fn enums_declared_inside_functions_are_seen() {
        let p = resolved("fun setup() { enum Dir { Left, Right } }\nd = match x { Left => 1, _ => 2 }");
        assert!(matches!(&arm_patterns(&p, 1)[0], Pattern::Variant { .. }));
    }

    #[test]
    fn patterns_nested_in_function_bodies_are_rewritten() {
        let p = resolved("enum S { Idle }\nfun f(s) { return match s { Idle => 1, _ => 0 } }");
        let Stmt::FnDecl(f) = &p.body[1] else { panic!("expected FnDecl") };
        let Stmt::Return(Some(Expr::Match(m)), _) = &f.body[0] else { panic!("expected return match") };
        assert!(matches!(m.arms[0].pattern, Pattern::Variant { .. }));
    }

    #[test]
    fn program_without_enums_is_untouched() {
        let p = resolved("match v { Idle => 1 }");
        assert!(matches!(&arm_patterns(&p, 0)[0], Pattern::Binding(..)));
    }
}
