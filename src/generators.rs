use crate::error::CompileError;
use crate::gocode::{Expr, Stmt};
use crate::inputs::resolve_input;
use crate::project::{Block, Input};
use std::collections::HashMap;

/// Maps one block to the Go statements of its callback. `t` is the `*Target`.
pub type Generator = fn(&Block) -> Result<Vec<Stmt>, CompileError>;

#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    by_opcode: HashMap<String, Generator>,
    by_namespace: HashMap<String, Generator>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_opcode("motion_movesteps", motion_move_steps);
        registry.register_opcode("looks_say", looks_say);
        registry
    }

    pub fn register_opcode(&mut self, opcode: &str, generator: Generator) -> &mut Self {
        self.by_opcode.insert(opcode.to_string(), generator);
        self
    }

    /// Handles every opcode under `namespace_` that has no exact registration.
    pub fn register_namespace(&mut self, namespace: &str, generator: Generator) -> &mut Self {
        self.by_namespace.insert(namespace.to_string(), generator);
        self
    }

    pub fn lookup(&self, block: &Block) -> Option<Generator> {
        self.by_opcode
            .get(&block.opcode)
            .or_else(|| self.by_namespace.get(block.namespace()))
            .copied()
    }

    pub fn generate(&self, block: &Block) -> Result<Vec<Stmt>, CompileError> {
        match self.lookup(block) {
            Some(generator) => generator(block),
            None => Err(CompileError::UnsupportedOpcode {
                opcode: block.opcode.clone(),
            }),
        }
    }
}

fn required_input<'a>(block: &'a Block, name: &str) -> Result<&'a Input, CompileError> {
    block.input(name).ok_or_else(|| CompileError::MissingInput {
        opcode: block.opcode.clone(),
        input: name.to_string(),
    })
}

fn target_field(name: &str) -> Expr {
    Expr::ident("t").field(name)
}

// Multiplies by 180/pi rather than pi/180; see DESIGN.md before changing.
fn heading_angle() -> Expr {
    Expr::Int(90)
        .op("-", target_field("Direction"))
        .paren()
        .op("*", Expr::Int(180))
        .op("/", Expr::qual("math", "Pi"))
}

pub fn motion_move_steps(block: &Block) -> Result<Vec<Stmt>, CompileError> {
    let input = required_input(block, "STEPS")?;
    let steps = resolve_input(input, true)?.ok_or_else(|| CompileError::UnresolvedInput {
        opcode: block.opcode.clone(),
        input: "STEPS".to_string(),
    })?;
    Ok(vec![
        Stmt::Assign {
            target: target_field("X"),
            op: "+=",
            value: steps
                .clone()
                .op("*", Expr::qual("math", "Cos").call(vec![heading_angle()])),
        },
        Stmt::Assign {
            target: target_field("Y"),
            op: "+=",
            value: steps.op("*", Expr::qual("math", "Sin").call(vec![heading_angle()])),
        },
        Stmt::Return(Expr::Bool(true)),
    ])
}

pub fn looks_say(block: &Block) -> Result<Vec<Stmt>, CompileError> {
    let input = required_input(block, "MESSAGE")?;
    let unsupported = |found| CompileError::UnsupportedInputType {
        opcode: block.opcode.clone(),
        input: "MESSAGE".to_string(),
        found,
    };
    let message = match resolve_input(input, false)? {
        Some(Expr::Text(message)) => message,
        Some(_) => return Err(unsupported("number")),
        None if input.reporter_id().is_some() => return Err(unsupported("reporter block")),
        None => return Err(unsupported("non-literal value")),
    };
    Ok(vec![
        Stmt::Expr(Expr::qual("fmt", "Println").call(vec![Expr::Text(message)])),
        Stmt::Return(Expr::Bool(true)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(json: &str) -> Block {
        serde_json::from_str(json).unwrap()
    }

    fn rendered(stmts: &[Stmt]) -> Vec<String> {
        stmts.iter().map(Stmt::render).collect()
    }

    #[test]
    fn move_steps_keeps_the_source_formula() {
        let b = block(r#"{"opcode": "motion_movesteps", "inputs": {"STEPS": [1, [4, "100"]]}}"#);
        let stmts = GeneratorRegistry::with_builtins().generate(&b).unwrap();
        assert_eq!(
            rendered(&stmts),
            vec![
                "t.X += 100.0 * math.Cos((90 - t.Direction) * 180 / math.Pi)",
                "t.Y += 100.0 * math.Sin((90 - t.Direction) * 180 / math.Pi)",
                "return true",
            ]
        );
    }

    #[test]
    fn move_steps_with_bad_literal_fails() {
        let b = block(r#"{"opcode": "motion_movesteps", "inputs": {"STEPS": [1, [4, "ten"]]}}"#);
        assert!(matches!(
            motion_move_steps(&b),
            Err(CompileError::InvalidNumericLiteral { .. })
        ));
    }

    #[test]
    fn move_steps_with_reporter_degrades() {
        let b = block(
            r#"{"opcode": "motion_movesteps", "inputs": {"STEPS": [3, "rep", [4, "10"]]}}"#,
        );
        let err = motion_move_steps(&b).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn missing_input_is_reported() {
        let b = block(r#"{"opcode": "motion_movesteps"}"#);
        assert_eq!(
            motion_move_steps(&b).unwrap_err(),
            CompileError::MissingInput {
                opcode: "motion_movesteps".to_string(),
                input: "STEPS".to_string()
            }
        );
    }

    #[test]
    fn say_prints_the_message() {
        let b = block(r#"{"opcode": "looks_say", "inputs": {"MESSAGE": [1, [10, "Hello!"]]}}"#);
        let stmts = looks_say(&b).unwrap();
        assert_eq!(rendered(&stmts), vec!["fmt.Println(\"Hello!\")", "return true"]);
    }

    #[test]
    fn say_rejects_non_string_messages() {
        let number = block(r#"{"opcode": "looks_say", "inputs": {"MESSAGE": [1, [4, 5]]}}"#);
        let reporter = block(
            r#"{"opcode": "looks_say", "inputs": {"MESSAGE": [3, "rep", [10, "x"]]}}"#,
        );
        for b in [number, reporter] {
            let err = looks_say(&b).unwrap_err();
            assert!(matches!(err, CompileError::UnsupportedInputType { .. }));
            assert!(err.is_fatal());
        }
    }

    #[test]
    fn unknown_opcode_is_unsupported() {
        let b = block(r#"{"opcode": "sound_play"}"#);
        assert_eq!(
            GeneratorRegistry::with_builtins().generate(&b).unwrap_err(),
            CompileError::UnsupportedOpcode {
                opcode: "sound_play".to_string()
            }
        );
    }

    fn noop(_: &Block) -> Result<Vec<Stmt>, CompileError> {
        Ok(vec![Stmt::Return(Expr::Bool(false))])
    }

    #[test]
    fn namespace_registration_is_a_fallback() {
        let mut registry = GeneratorRegistry::with_builtins();
        registry.register_namespace("motion", noop);
        registry.register_namespace("sound", noop);

        let play = block(r#"{"opcode": "sound_play"}"#);
        assert_eq!(rendered(&registry.generate(&play).unwrap()), vec!["return false"]);

        let steps = block(r#"{"opcode": "motion_movesteps", "inputs": {"STEPS": [1, [4, 1]]}}"#);
        assert_eq!(registry.generate(&steps).unwrap().len(), 3);
    }
}
