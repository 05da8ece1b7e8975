//! Directory listings for before/after display.
//!
//! [`DirectoryMapper`] snapshots a tree into a [`DirectoryMap`] without
//! modifying anything. Both the traversal and the rendering use an explicit
//! stack, so deep trees cannot exhaust the call stack. Directories that cannot
//! be listed get an [`NodeKind::AccessDenied`] child instead of failing the
//! whole map.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
    /// Marker for a directory whose contents could not be listed.
    AccessDenied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub kind: NodeKind,
    children: Vec<usize>,
}

/// A snapshot of a directory tree. Children are sorted directories first,
/// then by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryMap {
    nodes: Vec<TreeNode>,
}

/// One rendered line: tree-drawing prefix plus the node it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    pub prefix: String,
    pub name: String,
    pub kind: NodeKind,
}

impl TreeLine {
    /// The node name with its icon.
    pub fn label(&self) -> String {
        match self.kind {
            NodeKind::Directory => format!("📁 {}", self.name),
            NodeKind::File => format!("📄 {}", self.name),
            NodeKind::AccessDenied => "❌ Access Denied".to_string(),
        }
    }
}

impl DirectoryMap {
    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    pub fn children<'a>(&'a self, node: &'a TreeNode) -> impl Iterator<Item = &'a TreeNode> + 'a {
        node.children.iter().map(move |&id| &self.nodes[id])
    }

    /// Number of files anywhere in the map.
    pub fn file_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::File)
            .count()
    }

    /// Flattens the tree into display lines, root first.
    pub fn render(&self) -> Vec<TreeLine> {
        let root = self.root();
        let mut lines = vec![TreeLine {
            prefix: String::new(),
            name: root.name.clone(),
            kind: root.kind,
        }];

        let mut stack: Vec<(usize, String, bool)> = Vec::new();
        push_children(&mut stack, &root.children, "");

        while let Some((id, prefix, is_last)) = stack.pop() {
            let node = &self.nodes[id];
            let branch = if is_last { "└── " } else { "├── " };
            lines.push(TreeLine {
                prefix: format!("{}{}", prefix, branch),
                name: node.name.clone(),
                kind: node.kind,
            });

            let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            push_children(&mut stack, &node.children, &child_prefix);
        }
        lines
    }
}

/// Pushes children in reverse so they pop in display order.
fn push_children(stack: &mut Vec<(usize, String, bool)>, children: &[usize], prefix: &str) {
    let count = children.len();
    for (i, &child) in children.iter().enumerate().rev() {
        stack.push((child, prefix.to_string(), i + 1 == count));
    }
}

impl fmt::Display for DirectoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.render() {
            writeln!(f, "{}{}", line.prefix, line.label())?;
        }
        Ok(())
    }
}

/// Builds [`DirectoryMap`]s.
#[derive(Debug, Clone, Default)]
pub struct DirectoryMapper {
    max_depth: Option<usize>,
}

impl DirectoryMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop descending below `depth` levels; the root's entries are depth 1.
    pub fn with_max_depth(depth: usize) -> Self {
        Self {
            max_depth: Some(depth),
        }
    }

    pub fn map(&self, root: &Path) -> DirectoryMap {
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());

        let mut nodes = vec![TreeNode {
            name: root_name,
            kind: NodeKind::Directory,
            children: Vec::new(),
        }];
        let mut stack: Vec<(PathBuf, usize, usize)> = vec![(root.to_path_buf(), 0, 0)];

        while let Some((dir, parent, depth)) = stack.pop() {
            if self.max_depth.is_some_and(|max| depth >= max) {
                continue;
            }

            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::debug!(path = %dir.display(), error = %e, "Cannot list directory");
                    let id = nodes.len();
                    nodes.push(TreeNode {
                        name: e.to_string(),
                        kind: NodeKind::AccessDenied,
                        children: Vec::new(),
                    });
                    nodes[parent].children.push(id);
                    continue;
                }
            };

            let mut listed: Vec<(String, bool, PathBuf)> = entries
                .flatten()
                .map(|entry| {
                    let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                    (
                        entry.file_name().to_string_lossy().to_string(),
                        is_dir,
                        entry.path(),
                    )
                })
                .collect();
            listed.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

            for (name, is_dir, path) in listed {
                let id = nodes.len();
                nodes.push(TreeNode {
                    name,
                    kind: if is_dir {
                        NodeKind::Directory
                    } else {
                        NodeKind::File
                    },
                    children: Vec::new(),
                });
                nodes[parent].children.push(id);
                if is_dir {
                    stack.push((path, id, depth + 1));
                }
            }
        }

        DirectoryMap { nodes }
    }
}
