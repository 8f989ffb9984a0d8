use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::i18n::Locale;

/// Maximum number of image slots a content block carries.
pub const MAX_IMAGE_SLOTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApartmentId(pub String);

/// Locale-qualified text fields. Missing fields deserialize to empty
/// strings rather than failing the write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedCopy {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub secondary_description: String,
}

/// One image reference with an optional mobile variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlot {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_src: Option<String>,
}

/// A hierarchical, multi-locale, orderable unit of homepage content.
///
/// `order` ranks the block among siblings sharing the same
/// `(page, parent_id)` group; values need not be contiguous. `parent_id`
/// of `None` marks a root block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: BlockId,
    pub key: String,
    pub page: String,
    #[serde(default)]
    pub parent_id: Option<BlockId>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub copy: BTreeMap<Locale, LocalizedCopy>,
    #[serde(default)]
    pub images: Vec<ImageSlot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied block fields; the store assigns id and timestamps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlockDraft {
    #[serde(default)]
    pub id: Option<BlockId>,
    pub key: String,
    pub page: String,
    #[serde(default)]
    pub parent_id: Option<BlockId>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub copy: BTreeMap<Locale, LocalizedCopy>,
    #[serde(default)]
    pub images: Vec<ImageSlot>,
}

/// A rental-apartment listing entry. `order_show` is its display rank in
/// the flat listing; ranks need not be contiguous or unique at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apartment {
    pub id: ApartmentId,
    pub name: String,
    #[serde(default)]
    pub published: bool,
    #[serde(rename = "orderShow")]
    pub order_show: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApartmentDraft {
    #[serde(default)]
    pub id: Option<ApartmentId>,
    pub name: String,
    #[serde(default)]
    pub published: bool,
    #[serde(rename = "orderShow", default)]
    pub order_show: i64,
}

/// Resolves relative media paths against the configured public base domain.
#[derive(Debug, Clone)]
pub struct MediaResolver {
    base_url: String,
}

impl MediaResolver {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn resolve(&self, src: &str) -> String {
        if src.starts_with("http://") || src.starts_with("https://") {
            return src.to_string();
        }
        if src.starts_with('/') {
            format!("{}{}", self.base_url, src)
        } else {
            format!("{}/{}", self.base_url, src)
        }
    }

    /// Rewrite every image slot of a block to an absolute URL.
    pub fn resolve_block(&self, mut block: ContentBlock) -> ContentBlock {
        for slot in &mut block.images {
            slot.src = self.resolve(&slot.src);
            if let Some(mobile) = slot.mobile_src.take() {
                slot.mobile_src = Some(self.resolve(&mobile));
            }
        }
        block
    }
}
