use std::fmt::Write as _;

use crate::arena::{NodeArena, NodeId};
use crate::node::{NodeValue, Resolve};
use crate::tree::{resolve, TreeError};

impl NodeArena {
    /// Renders the tree below `id` as an outline for inspection.
    ///
    /// Every node gets a line `KIND - name - value`, indented by one space per
    /// level. Lists with children have no value; their children follow
    /// instead. Empty lists show `(null)`.
    pub fn dump<R: Resolve + ?Sized>(&self, id: NodeId, resolver: &R) -> Result<String, TreeError> {
        let mut out = String::new();
        let mut stack = vec![(id, 0)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id)?;
            let name = match node.name() {
                Some(name) => resolve(resolver, name)?,
                None => "",
            };
            let _ = write!(out, "{:depth$}{} - {}", "", node.kind(), name);

            match node.value() {
                NodeValue::List { .. } if node.has_children() => {
                    out.push('\n');
                    let children: Vec<_> = self.children(id).collect();
                    stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
                }
                NodeValue::List { .. } => out.push_str(" - (null)\n"),
                NodeValue::Long(value) => {
                    let _ = writeln!(out, " - {value}");
                }
                NodeValue::Real(value) => {
                    let _ = writeln!(out, " - {value:.6}");
                }
                NodeValue::Text(text) => {
                    let _ = writeln!(out, " - \"{}\"", resolve(resolver, text)?);
                }
            }
        }
        Ok(out)
    }
}
