//! A tag tree is a pattern over tag paths in which item positions may be
//! wildcards, matching an item at any index.

use crate::tag_path::{parse_path_element, parse_tag};
use crate::{DataElementTag, TagPath, TagPathNode};

/// A single node in a [`TagTree`].
///
/// [`TagTreeNode::Item`] and [`TagTreeNode::AnyItem`] nodes are trunks, i.e.
/// may have further nodes following them. [`TagTreeNode::Tag`] terminates a
/// tree.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagTreeNode {
  /// A data element at the current level.
  Tag { tag: DataElementTag },

  /// An item at a specific 1-based index in a sequence data element.
  Item { tag: DataElementTag, index: usize },

  /// An item at any index in a sequence data element.
  AnyItem { tag: DataElementTag },
}

impl TagTreeNode {
  /// Returns the data element tag for a tag tree node.
  ///
  pub fn tag(&self) -> DataElementTag {
    match self {
      TagTreeNode::Tag { tag }
      | TagTreeNode::Item { tag, .. }
      | TagTreeNode::AnyItem { tag } => *tag,
    }
  }

  /// Returns whether this tree node matches the given path node under
  /// wildcard-tolerant comparison. Item nodes also match the sequence
  /// start/end nodes of the sequence that holds them, since an index can't
  /// be checked against those.
  ///
  fn matches(&self, path_node: &TagPathNode) -> bool {
    if self.tag() != path_node.tag() {
      return false;
    }

    match (self, path_node) {
      (TagTreeNode::Tag { .. }, _) => true,

      (TagTreeNode::AnyItem { .. }, _) => true,

      (
        TagTreeNode::Item { index, .. },
        TagPathNode::Item { index: path_index, .. }
        | TagPathNode::ItemEnd { index: path_index, .. },
      ) => index == path_index,

      (
        TagTreeNode::Item { .. },
        TagPathNode::SequenceStart { .. } | TagPathNode::SequenceEnd { .. },
      ) => true,

      (TagTreeNode::Item { .. }, TagPathNode::Tag { .. }) => false,
    }
  }
}

impl std::fmt::Display for TagTreeNode {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      TagTreeNode::Tag { tag } => write!(f, "{tag}"),
      TagTreeNode::Item { tag, index } => write!(f, "{tag}[{index}]"),
      TagTreeNode::AnyItem { tag } => write!(f, "{tag}[*]"),
    }
  }
}

/// An ordered list of [`TagTreeNode`]s forming a pattern that tag paths can
/// be matched against.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagTree(Vec<TagTreeNode>);

impl TagTree {
  /// Returns the empty tag tree.
  ///
  pub fn new() -> Self {
    Self(vec![])
  }

  /// Creates a tag tree with a single data element node.
  ///
  pub fn from_tag(tag: DataElementTag) -> Self {
    Self(vec![TagTreeNode::Tag { tag }])
  }

  /// Creates a tag tree with a single item node.
  ///
  pub fn from_item(tag: DataElementTag, index: usize) -> Self {
    Self(vec![TagTreeNode::Item { tag, index }])
  }

  /// Creates a tag tree with a single wildcard item node.
  ///
  pub fn from_any_item(tag: DataElementTag) -> Self {
    Self(vec![TagTreeNode::AnyItem { tag }])
  }

  /// Returns the nodes of a tag tree, root first.
  ///
  pub fn nodes(&self) -> &[TagTreeNode] {
    &self.0
  }

  /// Returns the number of nodes in a tag tree.
  ///
  pub fn depth(&self) -> usize {
    self.0.len()
  }

  /// Returns whether a tag tree is a trunk, i.e. whether it can be extended
  /// with further nodes.
  ///
  pub fn is_trunk(&self) -> bool {
    matches!(
      self.0.last(),
      None
        | Some(TagTreeNode::Item { .. })
        | Some(TagTreeNode::AnyItem { .. })
    )
  }

  /// Extends a trunk tree with a data element node.
  ///
  pub fn then_tag(self, tag: DataElementTag) -> Result<Self, String> {
    self.then(TagTreeNode::Tag { tag })
  }

  /// Extends a trunk tree with an item node.
  ///
  pub fn then_item(
    self,
    tag: DataElementTag,
    index: usize,
  ) -> Result<Self, String> {
    self.then(TagTreeNode::Item { tag, index })
  }

  /// Extends a trunk tree with a wildcard item node.
  ///
  pub fn then_any_item(self, tag: DataElementTag) -> Result<Self, String> {
    self.then(TagTreeNode::AnyItem { tag })
  }

  fn then(mut self, node: TagTreeNode) -> Result<Self, String> {
    if !self.is_trunk() {
      return Err(format!(
        "Tag tree '{}' is not a trunk and can't be extended with '{}'",
        self, node
      ));
    }

    self.0.push(node);

    Ok(self)
  }

  /// Returns whether this tree matches the whole of the given path.
  ///
  pub fn is_path_of(&self, path: &TagPath) -> bool {
    self.0.len() == path.depth()
      && self
        .0
        .iter()
        .zip(path.nodes())
        .all(|(tree_node, path_node)| tree_node.matches(path_node))
  }

  /// Returns whether this tree's leading nodes match the whole of the given
  /// path, i.e. whether a descendant of the path's location could still
  /// match this tree.
  ///
  pub fn has_trunk(&self, path: &TagPath) -> bool {
    self.0.len() >= path.depth()
      && self
        .0
        .iter()
        .zip(path.nodes())
        .all(|(tree_node, path_node)| tree_node.matches(path_node))
  }

  /// Returns whether this tree matches a prefix of the given path, i.e.
  /// whether the path's location lies inside the subtree this tree names.
  ///
  pub fn is_trunk_of(&self, path: &TagPath) -> bool {
    self.0.len() <= path.depth()
      && self
        .0
        .iter()
        .zip(path.nodes())
        .all(|(tree_node, path_node)| tree_node.matches(path_node))
  }

  /// Returns whether this tree matches a suffix of the given path.
  ///
  pub fn has_twig(&self, path: &TagPath) -> bool {
    self.0.len() <= path.depth()
      && self
        .0
        .iter()
        .zip(&path.nodes()[path.depth() - self.0.len()..])
        .all(|(tree_node, path_node)| tree_node.matches(path_node))
  }

  /// Parses a tag tree from its textual form, e.g.
  /// `"(0008,9215)[*].(0010,0010)"`. This is the tag path grammar with the
  /// wildcard item index `*` also accepted.
  ///
  pub fn from_string(s: &str) -> Result<Self, String> {
    if s.is_empty() {
      return Ok(Self::new());
    }

    let elements: Vec<&str> = s.split('.').collect();
    let last_index = elements.len() - 1;

    let mut tree = Self::new();

    for (i, element) in elements.iter().enumerate() {
      let node = parse_tree_element(element)
        .ok_or_else(|| format!("Malformed tag tree element: '{element}'"))?;

      if i != last_index && matches!(node, TagTreeNode::Tag { .. }) {
        return Err(format!(
          "Malformed tag tree: non-final element '{element}' has no item \
           index"
        ));
      }

      tree = tree.then(node)?;
    }

    Ok(tree)
  }
}

/// Parses one textual tree element, accepting the `[*]` wildcard form in
/// addition to the tag path element grammar.
///
fn parse_tree_element(element: &str) -> Option<TagTreeNode> {
  if let Some(tag_part) = element.strip_suffix("[*]") {
    let tag = parse_tag(tag_part)?;
    return Some(TagTreeNode::AnyItem { tag });
  }

  let (tag, index) = parse_path_element(element)?;

  match index {
    Some(index) => Some(TagTreeNode::Item { tag, index }),
    None => Some(TagTreeNode::Tag { tag }),
  }
}

impl std::fmt::Display for TagTree {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let tree = self
      .0
      .iter()
      .map(|node| node.to_string())
      .collect::<Vec<_>>()
      .join(".");

    f.write_str(&tree)
  }
}
