use crate::error::CompileError;
use crate::project::Target;

/// Hat opcodes that start an executable stack.
pub const TRIGGER_OPCODES: &[&str] = &[
    "event_whenflagclicked",
    "event_whenkeypressed",
    "event_whenthisspriteclicked",
    "event_whenstageclicked",
    "event_whenbackdropswitchesto",
    "event_whengreaterthan",
    "event_whenbroadcastreceived",
    "control_start_as_clone",
    "procedures_definition",
];

pub fn is_trigger(opcode: &str) -> bool {
    TRIGGER_OPCODES.contains(&opcode)
}

/// The chain hanging below one trigger block. The trigger itself is not in `body`.
#[derive(Debug, Clone, PartialEq)]
pub struct StackChain {
    pub trigger_id: String,
    pub opcode: String,
    pub body: Vec<String>,
}

pub fn walk_target(target: &Target) -> Result<Vec<StackChain>, CompileError> {
    walk_target_isolated(target).into_iter().collect()
}

/// One result per trigger, so a broken chain does not hide its siblings.
pub fn walk_target_isolated(target: &Target) -> Vec<Result<StackChain, CompileError>> {
    target
        .blocks
        .blocks()
        .filter(|(_, block)| is_trigger(&block.opcode))
        .map(|(id, block)| {
            let body = walk_chain(target, id, block.next.as_deref())?;
            Ok(StackChain {
                trigger_id: id.to_string(),
                opcode: block.opcode.clone(),
                body,
            })
        })
        .collect()
}

fn walk_chain(
    target: &Target,
    trigger_id: &str,
    start: Option<&str>,
) -> Result<Vec<String>, CompileError> {
    let limit = target.blocks.len();
    let mut body = Vec::new();
    let mut current = start;
    while let Some(id) = current {
        if body.len() >= limit {
            return Err(CompileError::CyclicChain {
                target: target.name.clone(),
                trigger: trigger_id.to_string(),
                block: id.to_string(),
            });
        }
        let block = target
            .blocks
            .get(id)
            .ok_or_else(|| CompileError::DanglingReference {
                target: target.name.clone(),
                trigger: trigger_id.to_string(),
                missing: id.to_string(),
            })?;
        body.push(id.to_string());
        current = block.next.as_deref();
    }
    Ok(body)
}
