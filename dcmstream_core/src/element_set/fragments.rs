//! Encapsulated pixel data fragments and their frame iterator.

use crate::{DataElementTag, RcByteSlice, ValueRepresentation};

/// A single fragment of encapsulated pixel data.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
  pub bytes: RcByteSlice,
}

/// An encapsulated pixel data element: an optional basic offset table
/// followed by one or more fragments of pixel data.
///
/// `offsets` is present exactly when a first item was observed in the
/// original stream, even if that item was empty. The offsets give the byte
/// positions of frame boundaries inside the concatenation of all fragments.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Fragments {
  pub tag: DataElementTag,
  pub vr: ValueRepresentation,
  pub big_endian: bool,
  pub explicit_vr: bool,
  pub offsets: Option<Vec<u32>>,
  pub fragments: Vec<Fragment>,
}

impl Fragments {
  /// Creates a new little endian, explicit VR fragments value.
  ///
  pub fn new(
    tag: DataElementTag,
    vr: ValueRepresentation,
    offsets: Option<Vec<u32>>,
    fragments: Vec<Fragment>,
  ) -> Self {
    Self {
      tag,
      vr,
      big_endian: false,
      explicit_vr: true,
      offsets,
      fragments,
    }
  }

  /// Returns the total number of bytes across all fragments, excluding the
  /// offset table.
  ///
  pub fn total_fragment_length(&self) -> usize {
    self
      .fragments
      .iter()
      .fold(0, |total, fragment| total + fragment.bytes.len())
  }

  /// Returns an iterator over the frames of pixel data held in these
  /// fragments.
  ///
  /// When an offset table is present and non-empty its entries define the
  /// frame boundaries inside the concatenated fragment data: a single frame
  /// may span many fragments, and a single fragment may contain bytes for
  /// many frames. When the offset table is empty or absent, each fragment
  /// is one frame.
  ///
  pub fn frame_iterator(&self) -> FrameIterator<'_> {
    FrameIterator {
      fragments: self,
      next_frame: 0,
    }
  }

  /// Returns the bytes for the frame at the given zero-based index by
  /// slicing the concatenated fragment data at the offset table boundaries.
  ///
  fn offset_table_frame(&self, frame: usize) -> Option<Vec<u8>> {
    let offsets = self.offsets.as_ref()?;

    if frame >= offsets.len() {
      return None;
    }

    let start = offsets[frame] as usize;
    let end = match offsets.get(frame + 1) {
      Some(end) => *end as usize,
      None => self.total_fragment_length(),
    };

    if end < start || end > self.total_fragment_length() {
      return None;
    }

    let mut bytes = Vec::with_capacity(end - start);

    // Walk the fragments, copying the parts of each that fall inside the
    // frame's range in the concatenated data
    let mut fragment_start = 0;
    for fragment in self.fragments.iter() {
      let fragment_end = fragment_start + fragment.bytes.len();

      if fragment_end > start && fragment_start < end {
        let copy_start = start.max(fragment_start) - fragment_start;
        let copy_end = end.min(fragment_end) - fragment_start;

        bytes.extend_from_slice(&fragment.bytes[copy_start..copy_end]);
      }

      if fragment_end >= end {
        break;
      }

      fragment_start = fragment_end;
    }

    Some(bytes)
  }
}

/// Iterator over the frames of a [`Fragments`] value. Each frame is returned
/// as its own byte vector.
///
pub struct FrameIterator<'a> {
  fragments: &'a Fragments,
  next_frame: usize,
}

impl Iterator for FrameIterator<'_> {
  type Item = Vec<u8>;

  fn next(&mut self) -> Option<Vec<u8>> {
    let frame = self.next_frame;
    self.next_frame += 1;

    match self.fragments.offsets {
      Some(ref offsets) if !offsets.is_empty() => {
        self.fragments.offset_table_frame(frame)
      }

      // With no usable offset table each fragment is one frame
      _ => self
        .fragments
        .fragments
        .get(frame)
        .map(|fragment| fragment.bytes.to_vec()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dictionary;

  fn fragments_with_offsets(offsets: Option<Vec<u32>>) -> Fragments {
    Fragments::new(
      dictionary::PIXEL_DATA.tag,
      ValueRepresentation::OtherWordString,
      offsets,
      vec![
        Fragment {
          bytes: vec![1, 2, 3, 4].into(),
        },
        Fragment {
          bytes: vec![5, 6, 7, 8].into(),
        },
      ],
    )
  }

  #[test]
  fn frame_iterator_with_offsets_test() {
    // A frame can span fragments, and a fragment can contain bytes of more
    // than one frame
    let fragments = fragments_with_offsets(Some(vec![0, 6]));

    let frames: Vec<Vec<u8>> = fragments.frame_iterator().collect();

    assert_eq!(frames, vec![vec![1, 2, 3, 4, 5, 6], vec![7, 8]]);
  }

  #[test]
  fn frame_iterator_without_offsets_test() {
    for offsets in [None, Some(vec![])] {
      let fragments = fragments_with_offsets(offsets);

      let frames: Vec<Vec<u8>> = fragments.frame_iterator().collect();

      assert_eq!(frames, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
    }
  }
}
