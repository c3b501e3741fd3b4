pub mod assembler;
pub mod emit;
pub mod error;
pub mod generators;
pub mod gocode;
pub mod inputs;
pub mod project;
pub mod walker;

#[cfg(not(target_arch = "wasm32"))]
pub mod archive;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(not(target_arch = "wasm32"))]
pub mod fetch;

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

use anyhow::Result;
use assembler::{compile_project, CompileOptions, Program};
use emit::{render_program, EmitOptions};
use generators::GeneratorRegistry;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    let source = args.project_input()?;
    let progress = CliProgress::new("Compile", 5);

    progress.emit(1, "Resolving input");
    // A download lives in a temp file that must outlast parsing.
    let (_download, input) = match source {
        cli::ProjectInput::Path(path) => (None, canonicalize_file(&path)?),
        cli::ProjectInput::Remote(id) => {
            let file = fetch::fetch_project(id)?;
            let path = file.path().to_path_buf();
            (Some(file), path)
        }
    };

    progress.emit(2, "Locating project.json");
    let located = archive::locate_project_json(&input)?;

    progress.emit(3, "Parsing project");
    let project = project::parse_project_file(&located.project_json)?;

    progress.emit(4, "Compiling stacks");
    let options = CompileOptions {
        isolate_failures: args.keep_going,
    };
    let compilation = compile_project(&project, &GeneratorRegistry::with_builtins(), options)?;

    progress.emit(5, "Writing Go source");
    let emit_options = EmitOptions {
        window_title: args.title.clone(),
        ..EmitOptions::default()
    };
    write_go_file(&compilation.program, &emit_options, &args.output)?;
    log::info!(
        "Wrote {} target(s) to '{}'.",
        compilation.program.targets.len(),
        args.output.display()
    );
    Ok(())
}

/// Compiles a `project.json` or `.sb3` on disk with the built-in generators.
#[cfg(not(target_arch = "wasm32"))]
pub fn compile_project_file(
    input: &Path,
    options: CompileOptions,
) -> Result<assembler::Compilation> {
    let input = canonicalize_file(input)?;
    let located = archive::locate_project_json(&input)?;
    let project = project::parse_project_file(&located.project_json)?;
    Ok(compile_project(
        &project,
        &GeneratorRegistry::with_builtins(),
        options,
    )?)
}

pub fn compile_source_to_go(
    source: &str,
    options: CompileOptions,
    emit_options: &EmitOptions,
) -> Result<String> {
    let project = project::parse_project_str(source)?;
    let compilation = compile_project(&project, &GeneratorRegistry::with_builtins(), options)?;
    Ok(render_program(&compilation.program, emit_options))
}

pub fn write_go_file(program: &Program, emit_options: &EmitOptions, output: &Path) -> Result<()> {
    let source = render_program(program, emit_options);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, source)?;
    Ok(())
}

pub fn canonicalize_file(path: &Path) -> Result<PathBuf> {
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!("Input file not found: '{}'.", path.display()));
    }
    Ok(path.canonicalize()?)
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        let bar = render_progress_bar(step, self.total, 14);
        eprintln!(
            "[{}] {}... ({}/{}) {}",
            self.prefix, label, step, self.total, bar
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_progress_bar(step: usize, total: usize, width: usize) -> String {
    let width = width.max(1);
    let filled = ((step * width) + (total / 2)) / total;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < filled { '=' } else { '-' });
    }
    s.push(']');
    s
}
