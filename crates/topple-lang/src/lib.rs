pub mod gravity;
pub mod syntax;
pub mod analysis;
pub mod runtime;
pub mod natives;
pub mod device;
pub mod error;

pub use device::{InputDevice, InputState, Phase};
pub use error::{Error, ErrorCode, RuntimeError};
pub use gravity::{process, unsupported_positions};
pub use natives::{AudioCommand, Color, DrawCommand};
pub use runtime::value::Value;
pub use syntax::token::{Token, TokenKind};

use thiserror::Error as ThisError;

use crate::runtime::interpreter::Interpreter;
use crate::syntax::ast::Program as AstProgram;

// ─── Public API types ─────────────────────────────────────────────────────────

/// A compiled Topple program. Produced by `compile`.
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) ast: AstProgram,
    /// The source after falling, which every error position refers to.
    pub processed: String,
}

impl Program {
    pub fn ast(&self) -> &AstProgram { &self.ast }
}

/// Host-visible output accumulated since the previous frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub draw: Vec<DrawCommand>,
    pub audio: Vec<AudioCommand>,
    pub printed: Vec<String>,
}

/// Either half of `run` can fail.
#[derive(Debug, ThisError)]
pub enum Failure {
    #[error("compile failed with {} error(s)", .0.len())]
    Compile(Vec<Error>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<Vec<Error>> for Failure {
    fn from(errors: Vec<Error>) -> Self { Failure::Compile(errors) }
}

// ─── Public API ───────────────────────────────────────────────────────────────

/// The source as it looks after every unsupported character has fallen.
pub fn preview(source: &str) -> String {
    gravity::process(source)
}

/// Preprocess, tokenize and parse source text, then resolve match patterns.
pub fn compile(source: &str) -> Result<Program, Vec<Error>> {
    let processed = gravity::process(source);
    let tokens = syntax::lexer::Lexer::new(&processed).tokenize()?;
    let mut ast = syntax::parser::Parser::new(tokens).parse()?;
    analysis::resolve(&mut ast);
    Ok(Program { ast, processed })
}

/// Compile and run the top level with the default input bindings.
pub fn run(source: &str) -> Result<Runtime, Failure> {
    let program = compile(source)?;
    Ok(Runtime::new(program, Box::new(InputState::with_default_bindings()))?)
}

// ─── Runtime ──────────────────────────────────────────────────────────────────

/// Persistent runtime that owns the program, its global scope and the
/// registered frame blocks between ticks.
///
/// Lifecycle:
///   1. `Runtime::new(program, input)` runs every top-level statement once,
///      which binds globals and registers `update` / `draw` blocks.
///   2. `runtime.tick(dt)` advances the input device, runs `update(dt)`, then
///      `draw`, and hands back everything they emitted.
pub struct Runtime {
    program: Program,
    interp: Interpreter,
}

impl Runtime {
    pub fn new(program: Program, input: Box<dyn InputDevice>) -> Result<Self, RuntimeError> {
        let mut interp = Interpreter::new(input);
        interp.run(&program.ast)?;
        Ok(Self { program, interp })
    }

    /// Execute one frame.
    pub fn tick(&mut self, dt: f64) -> Result<Frame, RuntimeError> {
        self.interp.input_mut().update(dt);
        self.interp.run_update(dt)?;
        self.interp.run_draw()?;
        Ok(self.take_output())
    }

    /// Drains draw, audio and print output, including anything the top
    /// level emitted before the first tick.
    pub fn take_output(&mut self) -> Frame {
        let host = &mut self.interp.host;
        Frame {
            draw: std::mem::take(&mut host.draw),
            audio: std::mem::take(&mut host.audio),
            printed: std::mem::take(&mut host.printed),
        }
    }

    /// Clears all program state and runs the top level again.
    pub fn reset(&mut self) -> Result<(), RuntimeError> {
        self.interp.reset();
        self.interp.run(&self.program.ast)?;
        Ok(())
    }

    pub fn global(&self, name: &str) -> Option<Value> { self.interp.global(name) }

    /// Value of the last top-level statement.
    pub fn last_value(&self) -> &Value { self.interp.last_value() }

    pub fn has_draw(&self) -> bool { self.interp.has_draw() }
    pub fn has_update(&self) -> bool { self.interp.has_update() }

    pub fn input_mut(&mut self) -> &mut dyn InputDevice { self.interp.input_mut() }

    pub fn program(&self) -> &Program { &self.program }
}
