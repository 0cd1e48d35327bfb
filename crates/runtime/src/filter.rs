//! Network request filtering applied while a page loads.
//!
//! Interception is resolved through a plain predicate: every paused request is
//! classified into a [`ResourceKind`] and either continued or aborted based on
//! [`ResourceFilter::should_allow`].

use chromiumoxide::cdp::browser_protocol::network::ResourceType;
use serde::{Deserialize, Serialize};

/// Coarse resource classification used by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
	Document,
	Stylesheet,
	Image,
	Media,
	Font,
	Script,
	Xhr,
	Fetch,
	Other,
}

impl From<&ResourceType> for ResourceKind {
	fn from(value: &ResourceType) -> Self {
		match value {
			ResourceType::Document => ResourceKind::Document,
			ResourceType::Stylesheet => ResourceKind::Stylesheet,
			ResourceType::Image => ResourceKind::Image,
			ResourceType::Media => ResourceKind::Media,
			ResourceType::Font => ResourceKind::Font,
			ResourceType::Script => ResourceKind::Script,
			ResourceType::Xhr => ResourceKind::Xhr,
			ResourceType::Fetch => ResourceKind::Fetch,
			_ => ResourceKind::Other,
		}
	}
}

/// Decides which resource requests a scanned page may issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
	blocked: Vec<ResourceKind>,
}

impl ResourceFilter {
	/// Filter that blocks the given kinds and lets everything else through.
	pub fn blocking(kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
		let mut blocked = Vec::new();
		for kind in kinds {
			if !blocked.contains(&kind) {
				blocked.push(kind);
			}
		}
		Self { blocked }
	}

	pub fn should_allow(&self, kind: ResourceKind) -> bool {
		!self.blocked.contains(&kind)
	}
}

impl Default for ResourceFilter {
	fn default() -> Self {
		Self::blocking([ResourceKind::Image])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_filter_aborts_only_images() {
		let filter = ResourceFilter::default();
		assert!(!filter.should_allow(ResourceKind::Image));
		for kind in [
			ResourceKind::Document,
			ResourceKind::Stylesheet,
			ResourceKind::Script,
			ResourceKind::Font,
			ResourceKind::Media,
			ResourceKind::Xhr,
			ResourceKind::Fetch,
			ResourceKind::Other,
		] {
			assert!(filter.should_allow(kind), "{kind:?} should be allowed");
		}
	}

	#[test]
	fn cdp_resource_types_map_to_kinds() {
		assert_eq!(ResourceKind::from(&ResourceType::Image), ResourceKind::Image);
		assert_eq!(ResourceKind::from(&ResourceType::Document), ResourceKind::Document);
		assert_eq!(ResourceKind::from(&ResourceType::WebSocket), ResourceKind::Other);
	}

	#[test]
	fn custom_filter_blocks_listed_kinds() {
		let filter = ResourceFilter::blocking([ResourceKind::Image, ResourceKind::Media, ResourceKind::Font]);
		assert!(!filter.should_allow(ResourceKind::Font));
		assert!(filter.should_allow(ResourceKind::Script));
		assert!(ResourceFilter::blocking(Vec::new()).should_allow(ResourceKind::Image));
	}

	#[test]
	fn resource_kind_deserializes_lowercase() {
		let kinds: Vec<ResourceKind> = serde_json::from_str(r#"["image","font"]"#).unwrap();
		assert_eq!(kinds, vec![ResourceKind::Image, ResourceKind::Font]);
	}
}
