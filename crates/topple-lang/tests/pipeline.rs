//! End-to-end pipeline tests: source → fall → tokens → AST → run.

use topple_lang::syntax::ast::{Expr, Stmt};
use topple_lang::syntax::lexer::Lexer;
use topple_lang::{compile, preview, run, ErrorCode, Failure, TokenKind, Value};

#[test]
fn grounded_declaration_end_to_end() {
    let src = "x = 10\n######";
    assert_eq!(preview(src), src);

    let kinds: Vec<TokenKind> = Lexer::new(src)
        .tokenize()
        .expect("lex failed")
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(kinds, vec![
        TokenKind::Ident("x".into()),
        TokenKind::Eq,
        TokenKind::Number(10.0),
        TokenKind::Newline,
        TokenKind::Foundation,
        TokenKind::Foundation,
        TokenKind::Foundation,
        TokenKind::Foundation,
        TokenKind::Foundation,
        TokenKind::Foundation,
        TokenKind::Eof,
    ]);

    let program = compile(src).expect("compile failed");
    match program.ast().body.as_slice() {
        [Stmt::VarDecl(v)] => {
            assert_eq!(v.name, "x");
            assert!(matches!(v.value, Expr::Number(n, _) if n == 10.0));
        }
        other => panic!("expected one declaration, got {other:?}"),
    }

    let rt = run(src).expect("run failed");
    assert!(matches!(rt.global("x"), Some(Value::Number(n)) if n == 10.0));
}

#[test]
fn overhang_changes_the_program() {
    // `10` falls out, leaving a dangling `x =`
    let err = compile("x = 10\n###").expect_err("expected a parse error");
    assert_eq!(err[0].code, ErrorCode::P001);
}

#[test]
fn fallen_characters_are_what_runs() {
    // the `1` floats two rows up and lands beside `x =`, completing the line
    let src = "    1\n\nx =\n#####";
    assert_eq!(preview(src), "\n\nx = 1\n#####");
    let rt = run(src).expect("run failed");
    assert!(matches!(rt.global("x"), Some(Value::Number(n)) if n == 1.0));
}

#[test]
fn no_foundation_runs_nothing() {
    let rt = run("x = 1").expect("run failed");
    assert!(rt.global("x").is_none());
    assert!(matches!(rt.last_value(), Value::Null));
}

#[test]
fn errors_point_into_processed_source() {
    let src = "x = 1\ny = @\n######";
    let errs = compile(src).expect_err("expected a lex error");
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::L002);
    assert_eq!((errs[0].line, errs[0].column), (2, 5));
}

#[test]
fn unterminated_string() {
    let errs = compile("#\ns = \"open").expect_err("expected a lex error");
    assert_eq!(errs[0].code, ErrorCode::L001);
}

#[test]
fn parse_errors_are_collected() {
    let errs = compile("#\nf(a=1, 2)\nfun g() { 1 = 2 }\nfun (a) {}").expect_err("expected parse errors");
    let codes: Vec<ErrorCode> = errs.iter().map(|e| e.code).collect();
    assert_eq!(codes, vec![ErrorCode::P005, ErrorCode::P003, ErrorCode::P001]);
    assert_eq!(errs[1].line, 3);
}

#[test]
fn invalid_increment_target() {
    let errs = compile("#\n5++").expect_err("expected a parse error");
    assert_eq!(errs[0].code, ErrorCode::P004);
}

#[test]
fn run_reports_which_half_failed() {
    assert!(matches!(run("#\nx = ("), Err(Failure::Compile(_))));
    match run("#\nmissing") {
        Err(Failure::Runtime(e)) => assert_eq!(e.code, ErrorCode::R001),
        other => panic!("expected runtime failure, got {:?}", other.err()),
    }
}

#[test]
fn comments_are_ignored() {
    let rt = run("#\nx = 1 // one\n// y = 2\nz = x + 1").expect("run failed");
    assert!(rt.global("y").is_none());
    assert!(matches!(rt.global("z"), Some(Value::Number(n)) if n == 2.0));
}

#[test]
fn game_shaped_program() {
    let src = "\
#
enum State { Idle, Moving(dx) }
player = { x: 100, y: 50, state: Idle }
speed = 120
update(dt) {
  if held(\"right\") { player.state = Moving(1) } else { player.state = Idle }
  match player.state {
    Moving(dx) => { player.x += dx * speed * dt },
    Idle => {}
  }
}
draw {
  clear(\"#202020\")
  rect(player.x, player.y, 16, 16, color=\"orange\")
  text(\"x=\" + floor(player.x), 8, 8)
}";
    let mut rt = run(src).expect("run failed");
    let frame = rt.tick(0.5).expect("tick failed");
    assert_eq!(frame.draw.len(), 3);
    match &frame.draw[2] {
        topple_lang::DrawCommand::Text { text, size, .. } => {
            assert_eq!(text, "x=100");
            assert_eq!(*size, 16.0);
        }
        other => panic!("expected text, got {other:?}"),
    }
}
