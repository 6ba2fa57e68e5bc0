//! Tree inspection
//!
//! Read-only views of a learned tree for debugging: an indented outline for
//! the terminal and a serializable [`TreeView`] for JSON export. Both only
//! walk the public tree structure.

use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;

use crate::learning::DecisionTree;

/// Serializable mirror of a decision tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeView {
    Leaf {
        label: Option<String>,
    },
    Node {
        attribute: String,
        index: usize,
        default: String,
        branches: Vec<BranchView>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchView {
    pub value: String,
    pub subtree: TreeView,
}

/// Shape summary of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub depth: usize,
    pub nodes: usize,
    pub leaves: usize,
}

impl TreeView {
    /// Build a view; branches are sorted by value
    pub fn from_tree<L: Display, V: Display + Ord + Hash>(tree: &DecisionTree<L, V>) -> Self {
        match tree {
            DecisionTree::Leaf(label) => TreeView::Leaf {
                label: label.as_ref().map(|l| l.to_string()),
            },
            DecisionTree::Node { index, attribute, children, default } => {
                let mut sorted: Vec<_> = children.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(b.0));
                let branches = sorted
                    .into_iter()
                    .map(|(value, child)| BranchView {
                        value: value.to_string(),
                        subtree: TreeView::from_tree(child),
                    })
                    .collect();
                TreeView::Node {
                    attribute: attribute.name(),
                    index: *index,
                    default: default.to_string(),
                    branches,
                }
            }
        }
    }

    /// Indented text outline
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        match self {
            TreeView::Leaf { label: Some(label) } => {
                out.push_str(&format!("{}-> {}\n", pad, label));
            }
            TreeView::Leaf { label: None } => {
                out.push_str(&format!("{}-> (no prediction)\n", pad));
            }
            TreeView::Node { attribute, default, branches, .. } => {
                out.push_str(&format!("{}split on {} (otherwise {})\n", pad, attribute, default));
                for branch in branches {
                    out.push_str(&format!("{}  {} = {}\n", pad, attribute, branch.value));
                    branch.subtree.render_into(out, depth + 2);
                }
            }
        }
    }
}

pub fn stats<L, V: Eq + Hash>(tree: &DecisionTree<L, V>) -> TreeStats {
    TreeStats {
        depth: tree.depth(),
        nodes: tree.node_count(),
        leaves: tree.leaf_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributeId;
    use std::collections::HashMap;

    fn weekday_tree() -> DecisionTree<&'static str, &'static str> {
        DecisionTree::Node {
            index: 0,
            attribute: AttributeId::WEEKDAY,
            children: HashMap::from([
                ("Tue", DecisionTree::Leaf(Some("gym"))),
                ("Mon", DecisionTree::Leaf(None)),
            ]),
            default: "gym",
        }
    }

    #[test]
    fn test_render_outline() {
        let view = TreeView::from_tree(&weekday_tree());
        let expected = "\
split on weekday (otherwise gym)
  weekday = Mon
    -> (no prediction)
  weekday = Tue
    -> gym
";
        assert_eq!(view.render(), expected);
    }

    #[test]
    fn test_json_shape() {
        let view = TreeView::from_tree(&weekday_tree());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "node");
        assert_eq!(json["attribute"], "weekday");
        assert_eq!(json["branches"][0]["value"], "Mon");
        assert_eq!(json["branches"][1]["subtree"]["label"], "gym");
    }

    #[test]
    fn test_weekday_branches_in_calendar_order() {
        use crate::types::AttributeValue;
        use chrono::Weekday;

        let children = [Weekday::Fri, Weekday::Mon, Weekday::Thu, Weekday::Tue, Weekday::Wed]
            .into_iter()
            .map(|d| (AttributeValue::Weekday(d), DecisionTree::Leaf(Some("x"))))
            .collect();
        let tree = DecisionTree::Node {
            index: 0,
            attribute: AttributeId::WEEKDAY,
            children,
            default: "x",
        };

        let TreeView::Node { branches, .. } = TreeView::from_tree(&tree) else {
            panic!("expected a node view");
        };
        let values: Vec<&str> = branches.iter().map(|b| b.value.as_str()).collect();
        assert_eq!(values, vec!["Mon", "Tue", "Wed", "Thu", "Fri"]);
    }

    #[test]
    fn test_stats() {
        assert_eq!(
            stats(&weekday_tree()),
            TreeStats { depth: 1, nodes: 1, leaves: 2 }
        );
    }
}
