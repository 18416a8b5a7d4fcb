use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Page size applied when a paged read omits `limit`
pub const DEFAULT_LIMIT: u32 = 25;
/// Largest page Etsy serves
pub const MAX_LIMIT: u32 = 100;
/// Etsy rejects listings with more tags than this. Documented, not enforced here.
pub const MAX_TAGS: usize = 13;
/// Etsy rejects longer titles. Documented, not enforced here.
pub const MAX_TITLE_CHARS: usize = 140;

pub fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// `limit: null` means the same as leaving `limit` out.
pub fn limit_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(DEFAULT_LIMIT))
}

/// Explicit `null` falls back to the type's default, like an omitted field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reject page sizes Etsy would refuse, before any request leaves the process.
pub fn check_limit(limit: u32) -> Result<u32, String> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(format!("'limit' must be between 1 and {MAX_LIMIT}, got {limit}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOn {
    Created,
    Price,
    Updated,
    Score,
}

impl SortOn {
    pub const VALUES: &'static [&'static str] = &["created", "price", "updated", "score"];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOn::Created => "created",
            SortOn::Price => "price",
            SortOn::Updated => "updated",
            SortOn::Score => "score",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub const VALUES: &'static [&'static str] = &["asc", "desc"];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Lifecycle state of a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingState {
    #[default]
    Active,
    Inactive,
    SoldOut,
    Draft,
    Expired,
}

impl ListingState {
    pub const VALUES: &'static [&'static str] =
        &["active", "inactive", "sold_out", "draft", "expired"];

    pub fn as_str(self) -> &'static str {
        match self {
            ListingState::Active => "active",
            ListingState::Inactive => "inactive",
            ListingState::SoldOut => "sold_out",
            ListingState::Draft => "draft",
            ListingState::Expired => "expired",
        }
    }
}

/// Who made the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhoMade {
    IDid,
    SomeoneElse,
    Collective,
}

impl WhoMade {
    pub const VALUES: &'static [&'static str] = &["i_did", "someone_else", "collective"];
}

/// Era the item was made in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhenMade {
    #[serde(rename = "made_to_order")]
    MadeToOrder,
    #[serde(rename = "2020_2025")]
    From2020To2025,
    #[serde(rename = "2010_2019")]
    From2010To2019,
    #[serde(rename = "2006_2009")]
    From2006To2009,
    #[serde(rename = "before_2006")]
    Before2006,
    #[serde(rename = "2000_2005")]
    From2000To2005,
    #[serde(rename = "1990s")]
    Nineties,
    #[serde(rename = "1980s")]
    Eighties,
    #[serde(rename = "1970s")]
    Seventies,
    #[serde(rename = "1960s")]
    Sixties,
    #[serde(rename = "1950s")]
    Fifties,
    #[serde(rename = "1940s")]
    Forties,
    #[serde(rename = "1930s")]
    Thirties,
    #[serde(rename = "1920s")]
    Twenties,
    #[serde(rename = "1910s")]
    Tens,
    #[serde(rename = "1900s")]
    Nineteen00s,
    #[serde(rename = "1800s")]
    Eighteen00s,
    #[serde(rename = "1700s")]
    Seventeen00s,
    #[serde(rename = "before_1700")]
    Before1700,
}

impl WhenMade {
    pub const VALUES: &'static [&'static str] = &[
        "made_to_order",
        "2020_2025",
        "2010_2019",
        "2006_2009",
        "before_2006",
        "2000_2005",
        "1990s",
        "1980s",
        "1970s",
        "1960s",
        "1950s",
        "1940s",
        "1930s",
        "1920s",
        "1910s",
        "1900s",
        "1800s",
        "1700s",
        "before_1700",
    ];
}

/// Associations Etsy can embed in a listing response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingInclude {
    Shipping,
    Images,
    Shop,
    User,
    Translations,
    Inventory,
    Videos,
}

impl ListingInclude {
    pub const VALUES: &'static [&'static str] = &[
        "Shipping",
        "Images",
        "Shop",
        "User",
        "Translations",
        "Inventory",
        "Videos",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ListingInclude::Shipping => "Shipping",
            ListingInclude::Images => "Images",
            ListingInclude::Shop => "Shop",
            ListingInclude::User => "User",
            ListingInclude::Translations => "Translations",
            ListingInclude::Inventory => "Inventory",
            ListingInclude::Videos => "Videos",
        }
    }
}

/// Keyword search across active listings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchListings {
    pub keywords: String,
    #[serde(default = "default_limit", deserialize_with = "limit_or_default")]
    pub limit: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub offset: u32,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_on: Option<SortOn>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetListing {
    pub listing_id: u64,
    /// Sent comma-joined as the `includes` query parameter
    pub includes: Option<Vec<ListingInclude>>,
}

/// Any operation addressed by a listing id alone (inventory, images, delete)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingRef {
    pub listing_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrendingListings {
    #[serde(default = "default_limit", deserialize_with = "limit_or_default")]
    pub limit: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub offset: u32,
}

/// New listing. Serializes to the request body; `shop_id` only goes into the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateListing {
    #[serde(skip_serializing)]
    pub shop_id: Option<u64>,
    pub quantity: u32,
    /// At most [`MAX_TITLE_CHARS`] characters
    pub title: String,
    pub description: String,
    pub price: f64,
    pub who_made: WhoMade,
    pub when_made: WhenMade,
    pub taxonomy_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_profile_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_section_id: Option<u64>,
    /// At most [`MAX_TAGS`] entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<String>>,
}

/// Partial listing update. Only fields present in the arguments reach the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateListing {
    #[serde(skip_serializing)]
    pub shop_id: Option<u64>,
    #[serde(skip_serializing)]
    pub listing_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub who_made: Option<WhoMade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when_made: Option<WhenMade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxonomy_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_profile_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_section_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ListingState>,
}

/// Full inventory replacement. `products` is passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateListingInventory {
    #[serde(skip_serializing)]
    pub listing_id: u64,
    pub products: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_on_property: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_on_property: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku_on_property: Option<Vec<u64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadListingImage {
    #[serde(skip_serializing)]
    pub shop_id: Option<u64>,
    #[serde(skip_serializing)]
    pub listing_id: u64,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}
