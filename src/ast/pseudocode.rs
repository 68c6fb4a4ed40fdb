//! Human-readable rendering of programs.

use super::arena::Arena;
use super::node::{Node, NodeId};
use super::program::AlgorithmProgram;
use std::fmt::Write;

impl AlgorithmProgram {
    /// Renders the program as indented pseudocode with a one-line header.
    ///
    /// The output is a pure function of the tree and header, so two
    /// structurally identical programs render identically.
    pub fn to_pseudocode(&self) -> String {
        let h = self.header();
        let mut out = format!(
            "# {} seed={} depth={} size={} constructor-first\n",
            h.problem_family, h.seed, h.depth, h.size
        );
        render(self.arena(), self.root(), 0, &mut out);
        out
    }
}

/// Renders a bare tree without header.
pub fn arena_to_pseudocode(arena: &Arena) -> String {
    let mut out = String::new();
    render(arena, arena.root(), 0, &mut out);
    out
}

fn condition(arena: &Arena, id: NodeId) -> String {
    match arena.node(id) {
        Node::Improves => "improves".to_string(),
        Node::Feasible => "feasible".to_string(),
        Node::StagnationCount(k) => format!("stagnation >= {k}"),
        Node::TimeLimit(ms) => format!("elapsed > {ms}ms"),
        other => format!("<{}>", other.kind()),
    }
}

fn render(arena: &Arena, id: NodeId, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    let _ = match arena.node(id) {
        Node::Seq(children) => {
            let _ = writeln!(out, "{pad}SEQ");
            for &c in children {
                render(arena, c, indent + 1, out);
            }
            Ok(())
        }
        Node::If {
            cond,
            then,
            otherwise,
        } => {
            let _ = writeln!(out, "{pad}IF {}", condition(arena, *cond));
            let _ = writeln!(out, "{pad}THEN");
            render(arena, *then, indent + 1, out);
            if let Some(e) = otherwise {
                let _ = writeln!(out, "{pad}ELSE");
                render(arena, *e, indent + 1, out);
            }
            Ok(())
        }
        Node::While {
            cond,
            body,
            max_iter,
        } => {
            let _ = writeln!(
                out,
                "{pad}WHILE {} MAX {max_iter}",
                condition(arena, *cond)
            );
            render(arena, *body, indent + 1, out);
            Ok(())
        }
        Node::For { n, body } => {
            let _ = writeln!(out, "{pad}REPEAT {n}");
            render(arena, *body, indent + 1, out);
            Ok(())
        }
        Node::Constructive(op) => writeln!(out, "{pad}CONSTRUCT {op}"),
        Node::LocalSearch { op, max_iter } => match max_iter {
            Some(m) => writeln!(out, "{pad}LOCAL_SEARCH {op} [max_iter={m}]"),
            None => writeln!(out, "{pad}LOCAL_SEARCH {op}"),
        },
        Node::Perturbation { op, intensity } => match intensity {
            Some(x) => writeln!(out, "{pad}PERTURB {op} [intensity={x:.3}]"),
            None => writeln!(out, "{pad}PERTURB {op}"),
        },
        Node::Repair(op) => writeln!(out, "{pad}REPAIR {}", op.as_deref().unwrap_or("default")),
        Node::Improves | Node::Feasible | Node::StagnationCount(_) | Node::TimeLimit(_) => {
            writeln!(out, "{pad}EVAL {}", condition(arena, id))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SizeCaps, TreeBuilder};
    use crate::problem::ProblemFamily;

    #[test]
    fn test_skeleton_rendering() {
        let mut b = TreeBuilder::new();
        let c = b.constructive("dsatur");
        let cond = b.feasible();
        let ls = b.local_search("min_conflicts", Some(50));
        let p = b.perturbation("random_recolor", Some(0.3));
        let branch = b.if_else(cond, ls, p);
        let root = b.seq(vec![c, branch]);
        let program = AlgorithmProgram::new(
            b.build(root),
            ProblemFamily::GraphColoring,
            42,
            SizeCaps {
                max_depth: 5,
                max_size: 25,
            },
        )
        .unwrap();

        let text = program.to_pseudocode();
        let expected = "\
# gcp seed=42 depth=3 size=6 constructor-first
SEQ
  CONSTRUCT dsatur
  IF feasible
  THEN
    LOCAL_SEARCH min_conflicts [max_iter=50]
  ELSE
    PERTURB random_recolor [intensity=0.300]
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_loops_and_default_repair() {
        let mut b = TreeBuilder::new();
        let cond = b.stagnation_count(3);
        let r = b.repair(None);
        let w = b.while_loop(cond, r, 4);
        let f = b.for_loop(2, w);
        let text = arena_to_pseudocode(&b.build(f));
        assert_eq!(
            text,
            "REPEAT 2\n  WHILE stagnation >= 3 MAX 4\n    REPAIR default\n"
        );
    }
}
