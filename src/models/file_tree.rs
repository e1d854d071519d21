//! 文件树数据模型
//!
//! 由扁平路径集合推导出的层级树，每次快照变化时整体重建，从不持久化。

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: BTreeMap::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// 目录在前、文件在后，两组内部按名称字典序排列
    pub fn sorted_children(&self) -> Vec<&TreeNode> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for child in self.children.values() {
            if child.is_leaf() {
                files.push(child);
            } else {
                dirs.push(child);
            }
        }
        dirs.extend(files);
        dirs
    }

    fn insert_path(&mut self, path: &str) {
        let mut current = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .children
                .entry(segment.to_string())
                .or_insert_with(|| TreeNode::new(segment));
        }
    }

    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut current = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current.children.get(segment)?;
        }
        Some(current)
    }
}

/// 从路径集合构建文件树；与输入顺序无关
pub fn build_tree<'a, I>(paths: I) -> TreeNode
where
    I: IntoIterator<Item = &'a str>,
{
    let mut root = TreeNode::default();
    for path in paths {
        root.insert_path(path);
    }
    root
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: u16,
    pub name: String,
    pub path: String,
    pub is_leaf: bool,
    pub is_expanded: bool,
}

impl TreeNode {
    /// 按显示顺序展开为行，只进入 `expanded` 中的目录
    pub fn flatten_for_view(&self, expanded: &FxHashSet<String>) -> Vec<TreeRow> {
        let mut result = Vec::new();
        let mut stack: Vec<(&TreeNode, String, u16)> = Vec::new();

        for child in self.sorted_children().into_iter().rev() {
            stack.push((child, child.name.clone(), 0));
        }

        while let Some((node, path, depth)) = stack.pop() {
            let is_expanded = !node.is_leaf() && expanded.contains(&path);
            result.push(TreeRow {
                depth,
                name: node.name.clone(),
                path: path.clone(),
                is_leaf: node.is_leaf(),
                is_expanded,
            });

            if is_expanded {
                for child in node.sorted_children().into_iter().rev() {
                    stack.push((child, format!("{}/{}", path, child.name), depth + 1));
                }
            }
        }

        result
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/file_tree.rs"]
mod tests;
