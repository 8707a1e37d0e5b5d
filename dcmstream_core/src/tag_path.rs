//! A tag path names a single location inside a data set, from the root down
//! to a leaf, including the sequences and sequence items passed through on
//! the way.

use crate::{dictionary, DataElementTag};

/// A single node in a [`TagPath`].
///
/// Only [`TagPathNode::Item`] nodes are trunks, i.e. may have further nodes
/// following them. All other nodes terminate a path.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagPathNode {
  /// A data element at the current level.
  Tag { tag: DataElementTag },

  /// The start of a sequence data element.
  SequenceStart { tag: DataElementTag },

  /// The end of a sequence data element.
  SequenceEnd { tag: DataElementTag },

  /// An item, numbered 1-based, in a sequence data element.
  Item { tag: DataElementTag, index: usize },

  /// The end of an item in a sequence data element.
  ItemEnd { tag: DataElementTag, index: usize },
}

impl TagPathNode {
  /// Returns the data element tag for a tag path node.
  ///
  pub fn tag(&self) -> DataElementTag {
    match self {
      TagPathNode::Tag { tag }
      | TagPathNode::SequenceStart { tag }
      | TagPathNode::SequenceEnd { tag }
      | TagPathNode::Item { tag, .. }
      | TagPathNode::ItemEnd { tag, .. } => *tag,
    }
  }

  /// Nodes at the same tag order as: sequence start, item, item end,
  /// sequence end. A plain data element node orders after all of these.
  ///
  fn rank(&self) -> u8 {
    match self {
      TagPathNode::SequenceStart { .. } => 0,
      TagPathNode::Item { .. } => 1,
      TagPathNode::ItemEnd { .. } => 2,
      TagPathNode::SequenceEnd { .. } => 3,
      TagPathNode::Tag { .. } => 4,
    }
  }

  fn index(&self) -> usize {
    match self {
      TagPathNode::Item { index, .. } | TagPathNode::ItemEnd { index, .. } => {
        *index
      }
      _ => 0,
    }
  }
}

impl Ord for TagPathNode {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self
      .tag()
      .to_int()
      .cmp(&other.tag().to_int())
      .then(self.rank().cmp(&other.rank()))
      .then(self.index().cmp(&other.index()))
  }
}

impl PartialOrd for TagPathNode {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl std::fmt::Display for TagPathNode {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      TagPathNode::Tag { tag }
      | TagPathNode::SequenceStart { tag }
      | TagPathNode::SequenceEnd { tag } => write!(f, "{tag}"),

      TagPathNode::Item { tag, index }
      | TagPathNode::ItemEnd { tag, index } => {
        write!(f, "{tag}[{index}]")
      }
    }
  }
}

/// An ordered list of [`TagPathNode`]s running from the root of a data set
/// down to the location the path names. The empty path names the root data
/// set itself.
///
/// Paths are totally ordered: nodes compare pairwise from the root, tags as
/// unsigned 32-bit integers, items by their index, and nodes at the same tag
/// in stream order (sequence start, item, item end, sequence end). A path
/// that is a strict prefix of another orders before it.
///
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TagPath(Vec<TagPathNode>);

impl TagPath {
  /// Returns the empty tag path, which names the root data set.
  ///
  pub fn new() -> Self {
    Self(vec![])
  }

  /// Creates a tag path with a single data element node.
  ///
  pub fn from_tag(tag: DataElementTag) -> Self {
    Self(vec![TagPathNode::Tag { tag }])
  }

  /// Creates a tag path with a single sequence start node.
  ///
  pub fn from_sequence(tag: DataElementTag) -> Self {
    Self(vec![TagPathNode::SequenceStart { tag }])
  }

  /// Creates a tag path with a single sequence end node.
  ///
  pub fn from_sequence_end(tag: DataElementTag) -> Self {
    Self(vec![TagPathNode::SequenceEnd { tag }])
  }

  /// Creates a tag path with a single item node.
  ///
  pub fn from_item(tag: DataElementTag, index: usize) -> Self {
    Self(vec![TagPathNode::Item { tag, index }])
  }

  /// Creates a tag path with a single item end node.
  ///
  pub fn from_item_end(tag: DataElementTag, index: usize) -> Self {
    Self(vec![TagPathNode::ItemEnd { tag, index }])
  }

  /// Returns the nodes of a tag path, root first.
  ///
  pub fn nodes(&self) -> &[TagPathNode] {
    &self.0
  }

  /// Returns the number of nodes in a tag path.
  ///
  pub fn depth(&self) -> usize {
    self.0.len()
  }

  /// Returns whether a tag path is the empty path.
  ///
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Returns whether a tag path is a trunk, i.e. whether it can be extended
  /// with further nodes. Only the empty path and paths ending in an item
  /// node are trunks.
  ///
  pub fn is_trunk(&self) -> bool {
    matches!(self.0.last(), None | Some(TagPathNode::Item { .. }))
  }

  /// Returns whether a tag path names a location in the root data set, i.e.
  /// it passes through no sequence items.
  ///
  pub fn is_root(&self) -> bool {
    !self
      .0
      .iter()
      .any(|node| matches!(node, TagPathNode::Item { .. }))
  }

  /// Returns the last node of a tag path.
  ///
  pub fn last_node(&self) -> Option<&TagPathNode> {
    self.0.last()
  }

  /// Returns the tag of the last node of a tag path.
  ///
  pub fn final_tag(&self) -> Option<DataElementTag> {
    self.0.last().map(TagPathNode::tag)
  }

  /// Extends a trunk path with a data element node.
  ///
  pub fn then_tag(self, tag: DataElementTag) -> Result<Self, String> {
    self.then(TagPathNode::Tag { tag })
  }

  /// Extends a trunk path with a sequence start node.
  ///
  pub fn then_sequence(self, tag: DataElementTag) -> Result<Self, String> {
    self.then(TagPathNode::SequenceStart { tag })
  }

  /// Extends a trunk path with a sequence end node.
  ///
  pub fn then_sequence_end(self, tag: DataElementTag) -> Result<Self, String> {
    self.then(TagPathNode::SequenceEnd { tag })
  }

  /// Extends a trunk path with an item node.
  ///
  pub fn then_item(
    self,
    tag: DataElementTag,
    index: usize,
  ) -> Result<Self, String> {
    self.then(TagPathNode::Item { tag, index })
  }

  /// Extends a trunk path with an item end node.
  ///
  pub fn then_item_end(
    self,
    tag: DataElementTag,
    index: usize,
  ) -> Result<Self, String> {
    self.then(TagPathNode::ItemEnd { tag, index })
  }

  fn then(mut self, node: TagPathNode) -> Result<Self, String> {
    if !self.is_trunk() {
      return Err(format!(
        "Tag path '{}' is not a trunk and can't be extended with '{}'",
        self, node
      ));
    }

    self.0.push(node);

    Ok(self)
  }

  /// Adds a node onto a trunk path in place. This is the mutating
  /// counterpart of the `then_*` builders, used where a path is tracked
  /// incrementally.
  ///
  pub fn push(&mut self, node: TagPathNode) -> Result<(), String> {
    if !self.is_trunk() {
      return Err(format!(
        "Tag path '{}' is not a trunk and can't be extended with '{}'",
        self, node
      ));
    }

    self.0.push(node);

    Ok(())
  }

  /// Removes the last node of a tag path. Does nothing on the empty path.
  ///
  pub fn pop(&mut self) -> Option<TagPathNode> {
    self.0.pop()
  }

  /// Returns a tag path holding the first `count` nodes of this path.
  ///
  pub fn take(&self, count: usize) -> Self {
    Self(self.0.iter().take(count).copied().collect())
  }

  /// Returns a tag path with the first `count` nodes of this path removed.
  ///
  pub fn drop(&self, count: usize) -> Self {
    Self(self.0.iter().skip(count).copied().collect())
  }

  /// Returns whether the given path is a node-wise prefix of this path.
  ///
  pub fn starts_with(&self, other: &TagPath) -> bool {
    self.0.len() >= other.0.len() && self.0[..other.0.len()] == other.0[..]
  }

  /// Returns whether the given path is a node-wise suffix of this path.
  ///
  pub fn ends_with(&self, other: &TagPath) -> bool {
    self.0.len() >= other.0.len()
      && self.0[self.0.len() - other.0.len()..] == other.0[..]
  }

  /// Returns whether any node in this path has the given tag.
  ///
  pub fn contains(&self, tag: DataElementTag) -> bool {
    self.0.iter().any(|node| node.tag() == tag)
  }

  /// Parses a tag path from its textual form, e.g.
  /// `"(0008,9215)[1].(0010,0010)"`. Dictionary keywords are accepted in
  /// place of explicit tags, e.g. `"DerivationCodeSequence[1].PatientName"`.
  ///
  /// All nodes other than the last must be items; the last node is an item
  /// when it carries an index and a plain data element otherwise.
  ///
  pub fn from_string(s: &str) -> Result<Self, String> {
    if s.is_empty() {
      return Ok(Self::new());
    }

    let elements: Vec<&str> = s.split('.').collect();
    let last_index = elements.len() - 1;

    let mut path = Self::new();

    for (i, element) in elements.iter().enumerate() {
      let (tag, item_index) = parse_path_element(element)
        .ok_or_else(|| format!("Malformed tag path element: '{element}'"))?;

      let node = match item_index {
        Some(index) => TagPathNode::Item { tag, index },
        None if i == last_index => TagPathNode::Tag { tag },
        None => {
          return Err(format!(
            "Malformed tag path: non-final element '{element}' has no item \
             index"
          ));
        }
      };

      path.push(node)?;
    }

    Ok(path)
  }
}

/// Parses one textual path element into its tag and optional item index.
/// Returns `None` if the element doesn't match the
/// `( "(" hex4 "," hex4 ")" | keyword ) [ "[" decimal "]" ]` grammar.
///
pub(crate) fn parse_path_element(
  element: &str,
) -> Option<(DataElementTag, Option<usize>)> {
  let (tag_part, index_part) = match element.find('[') {
    Some(open) => {
      if !element.ends_with(']') {
        return None;
      }

      (&element[..open], Some(&element[open + 1..element.len() - 1]))
    }
    None => (element, None),
  };

  let tag = parse_tag(tag_part)?;

  match index_part {
    Some(index) => {
      let index = index.parse::<usize>().ok()?;
      Some((tag, Some(index)))
    }
    None => Some((tag, None)),
  }
}

/// Parses a `"(gggg,eeee)"` tag or a dictionary keyword.
///
pub(crate) fn parse_tag(s: &str) -> Option<DataElementTag> {
  if let Some(s) = s.strip_prefix('(') {
    let s = s.strip_suffix(')')?;

    let (group, element) = s.split_once(',')?;
    if group.len() != 4 || element.len() != 4 {
      return None;
    }

    let group = u16::from_str_radix(group, 16).ok()?;
    let element = u16::from_str_radix(element, 16).ok()?;

    return Some(DataElementTag::new(group, element));
  }

  dictionary::tag_of_keyword(s).ok()
}

impl std::fmt::Display for TagPath {
  /// Formats a tag path in its canonical textual form with nodes separated
  /// by periods. Sequence start/end and item end nodes render as their
  /// bare tag and item forms; only plain data element and item nodes are
  /// parseable back.
  ///
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let path = self
      .0
      .iter()
      .map(|node| node.to_string())
      .collect::<Vec<_>>()
      .join(".");

    f.write_str(&path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tag(i: u16) -> DataElementTag {
    DataElementTag::new(0, i)
  }

  #[test]
  fn builder_test() {
    let path = TagPath::from_item(tag(1), 2).then_tag(tag(3)).unwrap();

    assert_eq!(
      path.nodes(),
      &[
        TagPathNode::Item {
          tag: tag(1),
          index: 2
        },
        TagPathNode::Tag { tag: tag(3) },
      ]
    );

    // A data element node terminates a path
    assert!(TagPath::from_tag(tag(1)).then_tag(tag(2)).is_err());

    // A sequence start node terminates a path
    assert!(TagPath::from_sequence(tag(1)).then_tag(tag(2)).is_err());
  }

  #[test]
  fn ordering_test() {
    let a = TagPath::from_sequence(tag(1))
      .then_item(tag(2), 1)
      .unwrap()
      .then_tag(tag(3))
      .unwrap();
    let b = TagPath::from_sequence(tag(1))
      .then_item(tag(2), 2)
      .unwrap()
      .then_tag(tag(3))
      .unwrap();

    assert!(a < b);

    assert!(TagPath::new() < TagPath::from_tag(DataElementTag::ZERO));

    let path = TagPath::from_item(tag(1), 1);
    assert!(!(path.clone() < path.clone()));
    assert!(path == path.clone());

    // Stream ordering of nodes at the same tag
    assert!(TagPath::from_sequence(tag(1)) < TagPath::from_item(tag(1), 1));
    assert!(TagPath::from_item(tag(1), 1) < TagPath::from_item_end(tag(1), 1));
    assert!(
      TagPath::from_item_end(tag(1), 9) < TagPath::from_sequence_end(tag(1))
    );

    // Tags compare as unsigned 32-bit integers
    assert!(
      TagPath::from_tag(DataElementTag::new(0x7FE0, 0x0010))
        < TagPath::from_tag(DataElementTag::new(0xFFFE, 0xE000))
    );
  }

  #[test]
  fn prefix_suffix_test() {
    let path = TagPath::from_item(tag(1), 1)
      .then_item(tag(2), 3)
      .unwrap()
      .then_tag(tag(4))
      .unwrap();

    assert!(path.starts_with(&TagPath::from_item(tag(1), 1)));
    assert!(!path.starts_with(&TagPath::from_item(tag(1), 2)));

    assert!(path.ends_with(&TagPath::from_tag(tag(4))));
    assert!(!path.ends_with(&TagPath::from_tag(tag(2))));

    assert!(path.contains(tag(2)));
    assert!(!path.contains(tag(9)));

    assert_eq!(path.take(1), TagPath::from_item(tag(1), 1));
    assert_eq!(path.drop(2), TagPath::from_tag(tag(4)));
  }

  #[test]
  fn from_string_test() {
    assert_eq!(TagPath::from_string(""), Ok(TagPath::new()));

    assert_eq!(
      TagPath::from_string("(0008,9215)[3].(0010,0010)"),
      Ok(
        TagPath::from_item(DataElementTag::new(0x0008, 0x9215), 3)
          .then_tag(DataElementTag::new(0x0010, 0x0010))
          .unwrap()
      )
    );

    assert_eq!(
      TagPath::from_string("DerivationCodeSequence[3].PatientName"),
      TagPath::from_string("(0008,9215)[3].(0010,0010)"),
    );

    // Non-final elements must be items
    assert!(TagPath::from_string("(0008,9215).(0010,0010)").is_err());

    assert!(TagPath::from_string("(0008,9215)[x]").is_err());
    assert!(TagPath::from_string("NotAKeyword").is_err());
  }

  #[test]
  fn to_string_round_trip_test() {
    let paths = [
      TagPath::new(),
      TagPath::from_tag(DataElementTag::new(0x0010, 0x0010)),
      TagPath::from_item(DataElementTag::new(0x0008, 0x9215), 3),
      TagPath::from_item(DataElementTag::new(0x0008, 0x9215), 1)
        .then_item(DataElementTag::new(0x0008, 0x1140), 2)
        .unwrap()
        .then_tag(DataElementTag::new(0x0008, 0x0020))
        .unwrap(),
    ];

    for path in paths {
      assert_eq!(TagPath::from_string(&path.to_string()), Ok(path));
    }
  }
}
