//! Go expression and statement trees emitted by the opcode generators.

use std::collections::BTreeSet;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A float64 literal.
    Number(f64),
    /// An untyped integer constant.
    Int(i64),
    Text(String),
    Bool(bool),
    Ident(String),
    Field(Box<Expr>, String),
    /// A package-qualified name such as `math.Pi`.
    Qual(&'static str, String),
    Binary(Box<Expr>, &'static str, Box<Expr>),
    Paren(Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
}

impl Expr {
    pub fn ident(name: &str) -> Self {
        Expr::Ident(name.to_string())
    }

    pub fn qual(package: &'static str, name: &str) -> Self {
        Expr::Qual(package, name.to_string())
    }

    pub fn field(self, name: &str) -> Self {
        Expr::Field(Box::new(self), name.to_string())
    }

    pub fn op(self, op: &'static str, rhs: Expr) -> Self {
        Expr::Binary(Box::new(self), op, Box::new(rhs))
    }

    pub fn paren(self) -> Self {
        Expr::Paren(Box::new(self))
    }

    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(self), args)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Expr::Number(v) => out.push_str(&go_float(*v)),
            Expr::Int(v) => {
                let _ = write!(out, "{}", v);
            }
            Expr::Text(s) => out.push_str(&go_quote(s)),
            Expr::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Expr::Ident(name) => out.push_str(name),
            Expr::Field(base, name) => {
                base.write_to(out);
                out.push('.');
                out.push_str(name);
            }
            Expr::Qual(package, name) => {
                out.push_str(package);
                out.push('.');
                out.push_str(name);
            }
            Expr::Binary(lhs, op, rhs) => {
                lhs.write_to(out);
                out.push(' ');
                out.push_str(op);
                out.push(' ');
                rhs.write_to(out);
            }
            Expr::Paren(inner) => {
                out.push('(');
                inner.write_to(out);
                out.push(')');
            }
            Expr::Call(callee, args) => {
                callee.write_to(out);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    arg.write_to(out);
                }
                out.push(')');
            }
        }
    }

    fn collect_imports(&self, imports: &mut BTreeSet<&'static str>) {
        match self {
            Expr::Number(v) if !v.is_finite() => {
                imports.insert("math");
            }
            Expr::Qual(package, _) => {
                imports.insert(*package);
            }
            Expr::Field(base, _) => base.collect_imports(imports),
            Expr::Binary(lhs, _, rhs) => {
                lhs.collect_imports(imports);
                rhs.collect_imports(imports);
            }
            Expr::Paren(inner) => inner.collect_imports(imports),
            Expr::Call(callee, args) => {
                callee.collect_imports(imports);
                for arg in args {
                    arg.collect_imports(imports);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `target op value`, e.g. `t.X += ...`.
    Assign {
        target: Expr,
        op: &'static str,
        value: Expr,
    },
    Expr(Expr),
    Return(Expr),
}

impl Stmt {
    pub fn render(&self) -> String {
        match self {
            Stmt::Assign { target, op, value } => {
                format!("{} {} {}", target.render(), op, value.render())
            }
            Stmt::Expr(expr) => expr.render(),
            Stmt::Return(expr) => format!("return {}", expr.render()),
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Stmt::Return(_))
    }

    pub fn collect_imports(&self, imports: &mut BTreeSet<&'static str>) {
        match self {
            Stmt::Assign { target, value, .. } => {
                target.collect_imports(imports);
                value.collect_imports(imports);
            }
            Stmt::Expr(expr) | Stmt::Return(expr) => expr.collect_imports(imports),
        }
    }
}

/// Float literal in Go syntax; whole numbers keep a `.0` so they stay float64.
pub fn go_float(v: f64) -> String {
    if v.is_nan() {
        "math.NaN()".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "math.Inf(1)".to_string()
        } else {
            "math.Inf(-1)".to_string()
        }
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{:?}", v)
    }
}

// C1 controls and Unicode format characters. Go rejects a raw BOM past the
// start of a file, and the rest would be invisible in the generated source.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{80}'..='\u{9f}'
            | '\u{ad}'
            | '\u{600}'..='\u{605}'
            | '\u{61c}'
            | '\u{6dd}'
            | '\u{70f}'
            | '\u{180e}'
            | '\u{200b}'..='\u{200f}'
            | '\u{2028}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206f}'
            | '\u{feff}'
            | '\u{fff9}'..='\u{fffb}'
            | '\u{110bd}'
            | '\u{1d173}'..='\u{1d17a}'
            | '\u{e0001}'
            | '\u{e0020}'..='\u{e007f}'
    )
}

pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if is_invisible(c) && (c as u32) <= 0xffff => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if is_invisible(c) => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
