//! Indented text rendering of the AST. A debugging aid, not a
//! persistence format.

use crate::parser::ast::{Node, ProtoNode};

/// Pretty printer with two spaces of indentation per level.
pub struct PrettyPrinter {
    out: String,
    indent: usize,
}

impl PrettyPrinter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    /// Render a whole tree.
    pub fn render(node: &Node) -> String {
        let mut printer = Self::new();
        printer.visit(node);
        printer.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Run `f` one indentation level deeper.
    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    fn visit(&mut self, node: &Node) {
        match node {
            Node::Program { body } => {
                self.line("Program:");
                self.indented(|p| {
                    for stmt in body {
                        p.visit(stmt);
                    }
                });
            }
            Node::Literal { value, .. } => {
                self.line(&format!("Literal: {value}"));
            }
            Node::VarDecl {
                name,
                ty,
                value,
                is_const,
            } => {
                self.line(&format!("VarDecl: {} : {}", name, ty.name));
                self.indented(|p| {
                    p.visit(value);
                    p.line(&format!("Constant: {is_const}"));
                });
            }
            Node::Assign { name, value } => {
                self.line("Assign:");
                self.indented(|p| {
                    p.line(&format!("Variable: {name}"));
                    p.visit(value);
                });
            }
            Node::Variable { name } => {
                self.line(&format!("Variable: {name}"));
            }
            Node::If { cond, body } => {
                self.line("If:");
                self.indented(|p| {
                    p.visit(cond);
                    p.visit(body);
                });
            }
            Node::IfElse {
                if_node,
                else_block,
            } => {
                self.line("IfElse:");
                self.indented(|p| {
                    p.visit(if_node);
                    p.visit(else_block);
                });
            }
            Node::Binary { lhs, rhs, op } => {
                self.line(&format!("Binary: {op}"));
                self.indented(|p| {
                    p.visit(lhs);
                    p.visit(rhs);
                });
            }
            Node::Unary { operand, op } => {
                self.line(&format!("Unary: {op}"));
                self.indented(|p| {
                    p.visit(operand);
                });
            }
            Node::Proto(proto) => {
                self.visit_proto(proto);
            }
            Node::Block { body } => {
                self.line("Block:");
                self.indented(|p| {
                    for stmt in body {
                        p.visit(stmt);
                    }
                });
            }
            Node::FuncDecl { proto, body } => {
                self.line("FuncDecl:");
                self.indented(|p| {
                    p.visit_proto(proto);
                    p.visit(body);
                });
            }
            Node::Call { callee, args } => {
                self.line("Call:");
                self.indented(|p| {
                    p.visit(callee);
                    p.line("Args:");
                    p.indented(|p| {
                        for arg in args {
                            p.visit(arg);
                        }
                    });
                });
            }
            Node::Return { value } => {
                self.line("Return:");
                self.indented(|p| {
                    p.visit(value);
                });
            }
        }
    }

    fn visit_proto(&mut self, proto: &ProtoNode) {
        self.line(&format!("Proto: {}", proto.name));
        self.indented(|p| {
            for param in &proto.params {
                p.line(&format!("Arg: {} : {}", param.name, param.ty.name));
            }
            p.line(&format!("Return: {}", proto.ret.name));
        });
    }
}

impl Default for PrettyPrinter {
    fn default() -> Self {
        Self::new()
    }
}
