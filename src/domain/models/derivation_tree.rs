//! Derivation trees: the samples produced by solvers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A concrete sample of a grammar's language.
///
/// Rendering (via `Display`) concatenates terminal leaves left to right and
/// is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationTree {
    Terminal(String),
    Node {
        symbol: String,
        children: Vec<DerivationTree>,
    },
}

/// Position of a subtree as child indices from the root.
pub type TreePath = Vec<usize>;

impl DerivationTree {
    pub fn terminal(text: impl Into<String>) -> Self {
        Self::Terminal(text.into())
    }

    pub fn node(symbol: impl Into<String>, children: Vec<Self>) -> Self {
        Self::Node {
            symbol: symbol.into(),
            children,
        }
    }

    /// Nonterminal symbol of a node, or the text of a terminal.
    pub fn symbol(&self) -> &str {
        match self {
            Self::Terminal(text) => text,
            Self::Node { symbol, .. } => symbol,
        }
    }

    pub fn children(&self) -> &[Self] {
        match self {
            Self::Terminal(_) => &[],
            Self::Node { children, .. } => children,
        }
    }

    /// Number of nodes, terminals included.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(Self::size).sum::<usize>()
    }

    /// Paths of every nonterminal node, root first (pre-order).
    pub fn node_paths(&self) -> Vec<TreePath> {
        let mut paths = Vec::new();
        collect_node_paths(self, &mut Vec::new(), &mut paths);
        paths
    }

    pub fn get(&self, path: &[usize]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |tree, &index| tree.children().get(index))
    }

    /// Copy of this tree with the subtree at `path` replaced.
    ///
    /// Returns `None` if `path` does not address a subtree.
    pub fn replace(&self, path: &[usize], replacement: Self) -> Option<Self> {
        let Some((&first, rest)) = path.split_first() else {
            return Some(replacement);
        };
        match self {
            Self::Terminal(_) => None,
            Self::Node { symbol, children } => {
                let child = children.get(first)?.replace(rest, replacement)?;
                let mut children = children.clone();
                children[first] = child;
                Some(Self::node(symbol.clone(), children))
            }
        }
    }

    /// Nodes whose symbol is `symbol`, in pre-order.
    pub fn find_all<'a>(&'a self, symbol: &str) -> Vec<&'a Self> {
        let mut found = Vec::new();
        collect_matching(self, symbol, &mut found);
        found
    }

    fn write_terminals(&self, out: &mut String) {
        match self {
            Self::Terminal(text) => out.push_str(text),
            Self::Node { children, .. } => {
                for child in children {
                    child.write_terminals(out);
                }
            }
        }
    }
}

fn collect_node_paths(tree: &DerivationTree, current: &mut TreePath, out: &mut Vec<TreePath>) {
    if let DerivationTree::Node { children, .. } = tree {
        out.push(current.clone());
        for (index, child) in children.iter().enumerate() {
            current.push(index);
            collect_node_paths(child, current, out);
            current.pop();
        }
    }
}

fn collect_matching<'a>(tree: &'a DerivationTree, symbol: &str, out: &mut Vec<&'a DerivationTree>) {
    if let DerivationTree::Node { symbol: own, children } = tree {
        if own == symbol {
            out.push(tree);
        }
        for child in children {
            collect_matching(child, symbol, out);
        }
    }
}

impl fmt::Display for DerivationTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = String::new();
        self.write_terminals(&mut rendered);
        f.write_str(&rendered)
    }
}
