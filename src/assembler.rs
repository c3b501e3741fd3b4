use crate::error::{CompileError, Diagnostic};
use crate::generators::GeneratorRegistry;
use crate::gocode::Stmt;
use crate::project::{Project, Target};
use crate::walker::{walk_target_isolated, StackChain};
use log::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Drop a failing stack and keep compiling its siblings instead of aborting.
    pub isolate_failures: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockDescriptor {
    pub opcode: String,
    pub callback: Vec<Stmt>,
    /// Reserved for C-blocks; always empty for now.
    pub blocks: Vec<BlockDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackDescriptor {
    pub opcode: String,
    pub running: bool,
    pub current_block: u64,
    pub blocks: Vec<BlockDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetDescriptor {
    pub name: String,
    pub is_stage: bool,
    pub current_costume: u64,
    pub layer: i64,
    pub volume: f64,
    pub visible: bool,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub direction: f64,
    pub rotation_style: String,
    pub stacks: Vec<StackDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub targets: Vec<TargetDescriptor>,
}

#[derive(Debug, Clone, Default)]
pub struct Compilation {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn compile_project(
    project: &Project,
    registry: &GeneratorRegistry,
    options: CompileOptions,
) -> Result<Compilation, CompileError> {
    let mut compilation = Compilation::default();
    for target in &project.targets {
        let descriptor = compile_target(target, registry, options, &mut compilation.diagnostics)?;
        debug!(
            "Compiled target '{}' into {} stack(s).",
            descriptor.name,
            descriptor.stacks.len()
        );
        compilation.program.targets.push(descriptor);
    }
    for diagnostic in &compilation.diagnostics {
        warn!("{}", diagnostic);
    }
    Ok(compilation)
}

pub fn compile_target(
    target: &Target,
    registry: &GeneratorRegistry,
    options: CompileOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<TargetDescriptor, CompileError> {
    let mut stacks = Vec::new();
    for chain in walk_target_isolated(target) {
        let stack = match chain {
            Ok(chain) => compile_stack(target, &chain, registry, diagnostics),
            Err(error) => Err(Diagnostic {
                target: target.name.clone(),
                stack: failing_stack(&error),
                block: None,
                error,
            }),
        };
        match stack {
            Ok(stack) => stacks.push(stack),
            Err(diagnostic) if options.isolate_failures => diagnostics.push(diagnostic),
            Err(diagnostic) => return Err(diagnostic.error),
        }
    }

    Ok(TargetDescriptor {
        name: target.name.clone(),
        is_stage: target.is_stage,
        current_costume: target.current_costume.max(0.0) as u64,
        layer: target.layer_order as i64,
        volume: target.volume,
        visible: target.visible,
        x: target.x,
        y: target.y,
        size: target.size,
        direction: target.direction,
        rotation_style: target.rotation_style.clone(),
        stacks,
    })
}

fn compile_stack(
    target: &Target,
    chain: &StackChain,
    registry: &GeneratorRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<StackDescriptor, Diagnostic> {
    let scoped = |block: &str, error: CompileError| Diagnostic {
        target: target.name.clone(),
        stack: Some(chain.trigger_id.clone()),
        block: Some(block.to_string()),
        error,
    };
    let mut blocks = Vec::with_capacity(chain.body.len());
    // Non-fatal problems only become diagnostics once the whole stack succeeds.
    let mut degraded = Vec::new();
    for id in &chain.body {
        let block = target.blocks.get(id).ok_or_else(|| {
            scoped(
                id.as_str(),
                CompileError::DanglingReference {
                    target: target.name.clone(),
                    trigger: chain.trigger_id.clone(),
                    missing: id.clone(),
                },
            )
        })?;
        let callback = match registry.generate(block) {
            Ok(stmts) => stmts,
            Err(error) if !error.is_fatal() => {
                degraded.push(scoped(id.as_str(), error));
                Vec::new()
            }
            Err(error) => return Err(scoped(id.as_str(), error)),
        };
        blocks.push(BlockDescriptor {
            opcode: block.opcode.clone(),
            callback,
            blocks: Vec::new(),
        });
    }
    diagnostics.append(&mut degraded);

    Ok(StackDescriptor {
        opcode: chain.opcode.clone(),
        running: false,
        current_block: 0,
        blocks,
    })
}

fn failing_stack(error: &CompileError) -> Option<String> {
    match error {
        CompileError::DanglingReference { trigger, .. }
        | CompileError::CyclicChain { trigger, .. } => Some(trigger.clone()),
        _ => None,
    }
}
