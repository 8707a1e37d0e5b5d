//! Composable, stateful transformations over streams of DICOM parts.
//!
//! The [`DicomFlow`] trait defines one callback per part variant with an
//! `on_part` catch-all; orthogonal capabilities — start/end event markers,
//! guaranteed value events, guaranteed delimitation events, and tag path
//! tracking — compose as wrappers around a flow, each filtering only the
//! events it introduces. The built-in flows cover filtering, group length
//! handling, sequence length rewriting, UTF-8 transcoding, transfer syntax
//! normalization, deflating, context validation, value modification, and
//! element collection.

pub mod collect_flow;
pub mod deflate_flow;
pub mod explicit_vr_little_endian_flow;
pub mod filters;
pub mod flow;
pub mod fmi_group_length_flow;
pub mod guaranteed_delimitation_events;
pub mod guaranteed_value_event;
pub mod modify_flow;
pub mod sequence_length_flows;
pub mod start_end_events;
pub mod tag_path_tracking;
pub mod utf8_flow;
pub mod validate_context_flow;

pub use collect_flow::{collect_flow, CollectedPart};
pub use deflate_flow::deflate_dataset_flow;
pub use explicit_vr_little_endian_flow::to_explicit_vr_little_endian_flow;
pub use filters::{
  blacklist_filter, bulk_data_filter, fmi_discard_filter,
  group_length_discard_filter, tag_filter, whitelist_filter, TagFilter,
};
pub use flow::{create, DicomFlow, FlowTransform, IdentityFlow};
pub use fmi_group_length_flow::fmi_group_length_flow;
pub use guaranteed_delimitation_events::GuaranteedDelimitationEvents;
pub use guaranteed_value_event::GuaranteedValueEvent;
pub use modify_flow::{modify_flow, Modification};
pub use sequence_length_flows::{
  to_defined_length_sequences, to_undefined_length_sequences,
};
pub use start_end_events::{EndEvent, EndHandler, StartEvent, StartHandler};
pub use tag_path_tracking::{
  tag_path_tracking, PathAwareFlow, TagPathTracker, TagPathTracking,
};
pub use utf8_flow::to_utf8_flow;
pub use validate_context_flow::{validate_context_flow, ValidationContext};
