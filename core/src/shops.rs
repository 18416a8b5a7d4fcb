use serde::{Deserialize, Serialize};

use crate::listings::{ListingState, default_limit, limit_or_default, null_as_default};

/// Operations addressed by a shop alone. `shop_id` falls back to the
/// configured shop when omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShopRef {
    pub shop_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShopListings {
    pub shop_id: Option<u64>,
    #[serde(default = "default_limit", deserialize_with = "limit_or_default")]
    pub limit: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub offset: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: ListingState,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchShops {
    pub shop_name: String,
    #[serde(default = "default_limit", deserialize_with = "limit_or_default")]
    pub limit: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub offset: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShopsByLocation {
    /// Free-form place name, e.g. "Portland, Oregon"
    pub location: String,
    #[serde(default = "default_limit", deserialize_with = "limit_or_default")]
    pub limit: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateShopSection {
    #[serde(skip_serializing)]
    pub shop_id: Option<u64>,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateShopSection {
    #[serde(skip_serializing)]
    pub shop_id: Option<u64>,
    #[serde(skip_serializing)]
    pub shop_section_id: u64,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShopSectionRef {
    pub shop_id: Option<u64>,
    pub shop_section_id: u64,
}

/// Shop profile update. Absent fields are left untouched on Etsy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateShop {
    #[serde(skip_serializing)]
    pub shop_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_welcome: Option<String>,
}
