use crate::assembler::{BlockDescriptor, Program, StackDescriptor, TargetDescriptor};
use crate::gocode::{go_float, go_quote, Stmt};
use std::collections::BTreeSet;

const EBITEN: &str = "github.com/hajimehoshi/ebiten/v2";

const RUNTIME_TYPES: &str = r#"type Block struct {
	Opcode   string
	Blocks   []Block
	Callback func(t *Target) bool
}

type Stack struct {
	Opcode       string
	Blocks       []Block
	CurrentBlock uint64
	Running      bool
}

type Target struct {
	Name           string
	IsStage        bool
	CurrentCostume uint64
	Costumes       []*ebiten.Image
	Layer          int64
	Volume         float64
	Visible        bool
	X              float64
	Y              float64
	Size           float64
	Direction      float64
	RotationStyle  string
	Stacks         []Stack
}

type Game struct {
	Targets []Target
}
"#;

// Each target owns its stacks and steps them one at a time, so two scripts of
// the same sprite never write its fields concurrently.
const TARGET_EXECUTOR: &str = r#"// Trigger starts every idle stack of t whose hat block is opcode.
func (t *Target) Trigger(opcode string) {
	for i := range t.Stacks {
		if t.Stacks[i].Opcode == opcode && !t.Stacks[i].Running {
			t.Stacks[i].Running = true
			t.Stacks[i].CurrentBlock = 0
		}
	}
}

// Step runs the current block of each running stack of t, in order.
func (t *Target) Step() {
	for i := range t.Stacks {
		s := &t.Stacks[i]
		if !s.Running {
			continue
		}
		if s.CurrentBlock >= uint64(len(s.Blocks)) {
			s.Running = false
			continue
		}
		if s.Blocks[s.CurrentBlock].Callback(t) {
			s.CurrentBlock++
		}
	}
}
"#;

#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            window_title: "LIT Project".to_string(),
            window_width: 480,
            window_height: 360,
        }
    }
}

/// Renders the whole Go program for `program`.
pub fn render_program(program: &Program, options: &EmitOptions) -> String {
    let mut out = String::new();
    out.push_str("package main\n\n");
    write_imports(&mut out, program);
    out.push('\n');
    out.push_str(RUNTIME_TYPES);
    out.push('\n');
    write_lifecycle(&mut out, options);
    out.push('\n');
    out.push_str(TARGET_EXECUTOR);
    out.push('\n');
    write_main(&mut out, program, options);
    out
}

fn write_imports(out: &mut String, program: &Program) {
    let mut std_imports = BTreeSet::new();
    std_imports.insert("log");
    for stmt in program
        .targets
        .iter()
        .flat_map(|t| &t.stacks)
        .flat_map(|s| &s.blocks)
        .flat_map(all_statements)
    {
        stmt.collect_imports(&mut std_imports);
    }
    for value in program
        .targets
        .iter()
        .flat_map(|t| [t.volume, t.x, t.y, t.size, t.direction])
    {
        if !value.is_finite() {
            std_imports.insert("math");
        }
    }
    out.push_str("import (\n");
    for package in std_imports {
        out.push_str(&format!("\t{}\n", go_quote(package)));
    }
    out.push('\n');
    out.push_str(&format!("\t{}\n", go_quote(EBITEN)));
    out.push_str(")\n");
}

fn all_statements(block: &BlockDescriptor) -> Vec<&Stmt> {
    let mut stmts: Vec<&Stmt> = block.callback.iter().collect();
    for nested in &block.blocks {
        stmts.extend(all_statements(nested));
    }
    stmts
}

fn write_lifecycle(out: &mut String, options: &EmitOptions) {
    out.push_str("func (g *Game) Update() error {\n\treturn nil\n}\n\n");
    out.push_str("func (g *Game) Draw(screen *ebiten.Image) {}\n\n");
    out.push_str(
        "func (g *Game) Layout(outsideWidth, outsideHeight int) (screenWidth, screenHeight int) {\n",
    );
    out.push_str(&format!(
        "\treturn {}, {}\n}}\n",
        options.window_width, options.window_height
    ));
}

fn write_main(out: &mut String, program: &Program, options: &EmitOptions) {
    out.push_str("func main() {\n");
    out.push_str(&format!(
        "\tebiten.SetWindowSize({}, {})\n",
        options.window_width, options.window_height
    ));
    out.push_str(&format!(
        "\tebiten.SetWindowTitle({})\n",
        go_quote(&options.window_title)
    ));
    out.push_str("\tif err := ebiten.RunGame(&Game{Targets: []Target{\n");
    for target in &program.targets {
        write_target(out, target, 2);
    }
    out.push_str("\t}}); err != nil {\n");
    out.push_str("\t\tlog.Fatal(err)\n");
    out.push_str("\t}\n");
    out.push_str("}\n");
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push('\t');
    }
    out.push_str(text);
    out.push('\n');
}

fn write_target(out: &mut String, target: &TargetDescriptor, depth: usize) {
    let d = depth + 1;
    line(out, depth, "{");
    line(out, d, &format!("Name:           {},", go_quote(&target.name)));
    line(out, d, &format!("IsStage:        {},", target.is_stage));
    line(out, d, &format!("CurrentCostume: {},", target.current_costume));
    line(out, d, "Costumes:       []*ebiten.Image{},");
    line(out, d, &format!("Layer:          {},", target.layer));
    line(out, d, &format!("Volume:         {},", go_float(target.volume)));
    line(out, d, &format!("Visible:        {},", target.visible));
    line(out, d, &format!("X:              {},", go_float(target.x)));
    line(out, d, &format!("Y:              {},", go_float(target.y)));
    line(out, d, &format!("Size:           {},", go_float(target.size)));
    line(out, d, &format!("Direction:      {},", go_float(target.direction)));
    line(
        out,
        d,
        &format!("RotationStyle:  {},", go_quote(&target.rotation_style)),
    );
    if target.stacks.is_empty() {
        line(out, d, "Stacks:         []Stack{},");
    } else {
        line(out, d, "Stacks: []Stack{");
        for stack in &target.stacks {
            write_stack(out, stack, d + 1);
        }
        line(out, d, "},");
    }
    line(out, depth, "},");
}

fn write_stack(out: &mut String, stack: &StackDescriptor, depth: usize) {
    let d = depth + 1;
    line(out, depth, "{");
    line(out, d, &format!("Opcode:       {},", go_quote(&stack.opcode)));
    line(out, d, &format!("Running:      {},", stack.running));
    line(out, d, &format!("CurrentBlock: {},", stack.current_block));
    write_blocks(out, &stack.blocks, d);
    line(out, depth, "},");
}

fn write_blocks(out: &mut String, blocks: &[BlockDescriptor], depth: usize) {
    if blocks.is_empty() {
        line(out, depth, "Blocks:       []Block{},");
        return;
    }
    line(out, depth, "Blocks: []Block{");
    for block in blocks {
        write_block(out, block, depth + 1);
    }
    line(out, depth, "},");
}

fn write_block(out: &mut String, block: &BlockDescriptor, depth: usize) {
    let d = depth + 1;
    line(out, depth, "{");
    line(out, d, &format!("Opcode: {},", go_quote(&block.opcode)));
    write_blocks(out, &block.blocks, d);
    line(out, d, "Callback: func(t *Target) bool {");
    for stmt in &block.callback {
        line(out, d + 1, &stmt.render());
    }
    // Blocks without a generator still signal that the stack may move on.
    if !block.callback.last().is_some_and(Stmt::is_return) {
        line(out, d + 1, "return true");
    }
    line(out, d, "},");
    line(out, depth, "},");
}
