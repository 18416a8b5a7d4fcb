//! The Etsy operation catalog: one descriptor per MCP tool, each with the
//! planner that turns validated arguments into its single API request.

use etsy_core::listings::{
    CreateListing, GetListing, ListingInclude, ListingRef, ListingState, MAX_LIMIT, SearchListings,
    SortOn, SortOrder, TrendingListings, UpdateListing, UpdateListingInventory,
    UploadListingImage, WhenMade, WhoMade, check_limit,
};
use etsy_core::shops::{
    CreateShopSection, SearchShops, ShopListings, ShopRef, ShopSectionRef, ShopsByLocation,
    UpdateShop, UpdateShopSection,
};
use etsy_core::{Credentials, DispatchError};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::registry::{Access, FieldDefault, FieldKind, InputField, OperationDescriptor};
use crate::transport::ApiRequest;

pub const SEARCH_LISTINGS: &str = "etsy_search_listings";
pub const GET_LISTING: &str = "etsy_get_listing";
pub const GET_SHOP: &str = "etsy_get_shop";
pub const GET_SHOP_LISTINGS: &str = "etsy_get_shop_listings";
pub const SEARCH_SHOPS: &str = "etsy_search_shops";
pub const GET_LISTING_INVENTORY: &str = "etsy_get_listing_inventory";
pub const GET_LISTING_IMAGES: &str = "etsy_get_listing_images";
pub const GET_SHOP_SECTIONS: &str = "etsy_get_shop_sections";
pub const GET_TRENDING_LISTINGS: &str = "etsy_get_trending_listings";
pub const FIND_SHOPS_BY_LOCATION: &str = "etsy_find_shops_by_location";
pub const CREATE_LISTING: &str = "etsy_create_listing";
pub const UPDATE_LISTING: &str = "etsy_update_listing";
pub const DELETE_LISTING: &str = "etsy_delete_listing";
pub const UPDATE_LISTING_INVENTORY: &str = "etsy_update_listing_inventory";
pub const UPLOAD_LISTING_IMAGE: &str = "etsy_upload_listing_image";
pub const CREATE_SHOP_SECTION: &str = "etsy_create_shop_section";
pub const UPDATE_SHOP_SECTION: &str = "etsy_update_shop_section";
pub const DELETE_SHOP_SECTION: &str = "etsy_delete_shop_section";
pub const UPDATE_SHOP: &str = "etsy_update_shop";

const SHOP_ID_DOC: &str = "Numeric shop id. Defaults to the configured ETSY_SHOP_ID.";

fn limit_field() -> InputField {
    InputField::optional("limit", FieldKind::Integer, "Results per page (1-100)")
        .default_value(FieldDefault::Integer(u64::from(etsy_core::listings::DEFAULT_LIMIT)))
        .minimum(1)
        .maximum(u64::from(MAX_LIMIT))
}

fn offset_field() -> InputField {
    InputField::optional("offset", FieldKind::Integer, "Number of results to skip")
        .default_value(FieldDefault::Integer(0))
}

fn shop_id_field() -> InputField {
    InputField::optional("shop_id", FieldKind::Integer, SHOP_ID_DOC)
}

fn listing_id_field() -> InputField {
    InputField::required("listing_id", FieldKind::Integer, "Numeric listing id")
}

fn listing_body_fields(required: bool) -> Vec<InputField> {
    let field = if required {
        InputField::required
    } else {
        InputField::optional
    };
    vec![
        field("quantity", FieldKind::Integer, "Units available for sale"),
        field(
            "title",
            FieldKind::String,
            "Listing title. Etsy allows at most 140 characters.",
        ),
        field("description", FieldKind::String, "Listing description"),
        field("price", FieldKind::Number, "Price in the shop currency"),
        field("who_made", FieldKind::String, "Who made the item").one_of(WhoMade::VALUES),
        field("when_made", FieldKind::String, "When the item was made").one_of(WhenMade::VALUES),
        field("taxonomy_id", FieldKind::Integer, "Etsy seller taxonomy category id"),
        InputField::optional("shipping_profile_id", FieldKind::Integer, "Shipping profile id"),
        InputField::optional("shop_section_id", FieldKind::Integer, "Shop section id"),
        InputField::optional(
            "tags",
            FieldKind::StringArray,
            "Search tags. Etsy allows at most 13.",
        ),
        InputField::optional("materials", FieldKind::StringArray, "Materials used"),
    ]
}

pub fn etsy_operations() -> Vec<OperationDescriptor> {
    let mut update_listing_fields = vec![shop_id_field(), listing_id_field()];
    update_listing_fields.extend(listing_body_fields(false));
    update_listing_fields.push(
        InputField::optional("state", FieldKind::String, "Listing state")
            .one_of(ListingState::VALUES),
    );

    let mut create_listing_fields = vec![shop_id_field()];
    create_listing_fields.extend(listing_body_fields(true));

    vec![
        OperationDescriptor {
            name: SEARCH_LISTINGS,
            description: "Search active Etsy listings by keyword with optional price range and sorting.",
            access: Access::Read,
            method: Method::GET,
            path: "/listings/active",
            fields: vec![
                InputField::required("keywords", FieldKind::String, "Search terms"),
                limit_field(),
                offset_field(),
                InputField::optional("min_price", FieldKind::Number, "Minimum price"),
                InputField::optional("max_price", FieldKind::Number, "Maximum price"),
                InputField::optional("sort_on", FieldKind::String, "Sort field")
                    .one_of(SortOn::VALUES),
                InputField::optional("sort_order", FieldKind::String, "Sort direction")
                    .one_of(SortOrder::VALUES),
            ],
            planner: plan_search_listings,
        },
        OperationDescriptor {
            name: GET_LISTING,
            description: "Get one listing by id, optionally embedding related resources.",
            access: Access::Read,
            method: Method::GET,
            path: "/listings/{listing_id}",
            fields: vec![
                listing_id_field(),
                InputField::optional(
                    "includes",
                    FieldKind::StringArray,
                    "Associations to embed in the response",
                )
                .one_of(ListingInclude::VALUES),
            ],
            planner: plan_get_listing,
        },
        OperationDescriptor {
            name: GET_SHOP,
            description: "Get a shop profile.",
            access: Access::Read,
            method: Method::GET,
            path: "/shops/{shop_id}",
            fields: vec![shop_id_field()],
            planner: plan_get_shop,
        },
        OperationDescriptor {
            name: GET_SHOP_LISTINGS,
            description: "List a shop's listings in a given state (active by default).",
            access: Access::Read,
            method: Method::GET,
            path: "/shops/{shop_id}/listings",
            fields: vec![
                shop_id_field(),
                limit_field(),
                offset_field(),
                InputField::optional("state", FieldKind::String, "Listing state filter")
                    .one_of(ListingState::VALUES)
                    .default_value(FieldDefault::Text("active")),
            ],
            planner: plan_get_shop_listings,
        },
        OperationDescriptor {
            name: SEARCH_SHOPS,
            description: "Find shops by name.",
            access: Access::Read,
            method: Method::GET,
            path: "/shops",
            fields: vec![
                InputField::required("shop_name", FieldKind::String, "Shop name to search for"),
                limit_field(),
                offset_field(),
            ],
            planner: plan_search_shops,
        },
        OperationDescriptor {
            name: GET_LISTING_INVENTORY,
            description: "Get products, offerings and variation properties of a listing.",
            access: Access::Read,
            method: Method::GET,
            path: "/listings/{listing_id}/inventory",
            fields: vec![listing_id_field()],
            planner: plan_get_listing_inventory,
        },
        OperationDescriptor {
            name: GET_LISTING_IMAGES,
            description: "Get all images of a listing.",
            access: Access::Read,
            method: Method::GET,
            path: "/listings/{listing_id}/images",
            fields: vec![listing_id_field()],
            planner: plan_get_listing_images,
        },
        OperationDescriptor {
            name: GET_SHOP_SECTIONS,
            description: "List the sections of a shop.",
            access: Access::Read,
            method: Method::GET,
            path: "/shops/{shop_id}/sections",
            fields: vec![shop_id_field()],
            planner: plan_get_shop_sections,
        },
        OperationDescriptor {
            name: GET_TRENDING_LISTINGS,
            description: "Get currently trending listings.",
            access: Access::Read,
            method: Method::GET,
            path: "/listings/trending",
            fields: vec![limit_field(), offset_field()],
            planner: plan_get_trending_listings,
        },
        OperationDescriptor {
            name: FIND_SHOPS_BY_LOCATION,
            description: "Find shops located in a city, region or country.",
            access: Access::Read,
            method: Method::GET,
            path: "/shops",
            fields: vec![
                InputField::required("location", FieldKind::String, "Place name"),
                limit_field(),
                offset_field(),
            ],
            planner: plan_find_shops_by_location,
        },
        OperationDescriptor {
            name: CREATE_LISTING,
            description: "Create a draft listing in a shop. Requires an OAuth access token.",
            access: Access::Write,
            method: Method::POST,
            path: "/shops/{shop_id}/listings",
            fields: create_listing_fields,
            planner: plan_create_listing,
        },
        OperationDescriptor {
            name: UPDATE_LISTING,
            description: "Update any subset of a listing's fields. Requires an OAuth access token.",
            access: Access::Write,
            method: Method::PATCH,
            path: "/shops/{shop_id}/listings/{listing_id}",
            fields: update_listing_fields,
            planner: plan_update_listing,
        },
        OperationDescriptor {
            name: DELETE_LISTING,
            description: "Delete a listing. Requires an OAuth access token.",
            access: Access::Write,
            method: Method::DELETE,
            path: "/listings/{listing_id}",
            fields: vec![listing_id_field()],
            planner: plan_delete_listing,
        },
        OperationDescriptor {
            name: UPDATE_LISTING_INVENTORY,
            description: "Replace a listing's inventory (products, offerings, property links). Requires an OAuth access token.",
            access: Access::Write,
            method: Method::PUT,
            path: "/listings/{listing_id}/inventory",
            fields: vec![
                listing_id_field(),
                InputField::required(
                    "products",
                    FieldKind::ObjectArray,
                    "Products with sku, property_values and offerings",
                ),
                InputField::optional(
                    "price_on_property",
                    FieldKind::IntegerArray,
                    "Property ids that vary price",
                ),
                InputField::optional(
                    "quantity_on_property",
                    FieldKind::IntegerArray,
                    "Property ids that vary quantity",
                ),
                InputField::optional(
                    "sku_on_property",
                    FieldKind::IntegerArray,
                    "Property ids that vary sku",
                ),
            ],
            planner: plan_update_listing_inventory,
        },
        OperationDescriptor {
            name: UPLOAD_LISTING_IMAGE,
            description: "Attach an image to a listing from a public URL. Requires an OAuth access token.",
            access: Access::Write,
            method: Method::POST,
            path: "/shops/{shop_id}/listings/{listing_id}/images",
            fields: vec![
                shop_id_field(),
                listing_id_field(),
                InputField::required("image_url", FieldKind::String, "Public image URL"),
                InputField::optional("rank", FieldKind::Integer, "Position, 1 is the primary image"),
                InputField::optional("alt_text", FieldKind::String, "Alt text for accessibility"),
            ],
            planner: plan_upload_listing_image,
        },
        OperationDescriptor {
            name: CREATE_SHOP_SECTION,
            description: "Create a shop section. Requires an OAuth access token.",
            access: Access::Write,
            method: Method::POST,
            path: "/shops/{shop_id}/sections",
            fields: vec![
                shop_id_field(),
                InputField::required("title", FieldKind::String, "Section title"),
            ],
            planner: plan_create_shop_section,
        },
        OperationDescriptor {
            name: UPDATE_SHOP_SECTION,
            description: "Rename a shop section. Requires an OAuth access token.",
            access: Access::Write,
            method: Method::PUT,
            path: "/shops/{shop_id}/sections/{shop_section_id}",
            fields: vec![
                shop_id_field(),
                InputField::required("shop_section_id", FieldKind::Integer, "Section id"),
                InputField::required("title", FieldKind::String, "New section title"),
            ],
            planner: plan_update_shop_section,
        },
        OperationDescriptor {
            name: DELETE_SHOP_SECTION,
            description: "Delete a shop section. Requires an OAuth access token.",
            access: Access::Write,
            method: Method::DELETE,
            path: "/shops/{shop_id}/sections/{shop_section_id}",
            fields: vec![
                shop_id_field(),
                InputField::required("shop_section_id", FieldKind::Integer, "Section id"),
            ],
            planner: plan_delete_shop_section,
        },
        OperationDescriptor {
            name: UPDATE_SHOP,
            description: "Update shop title, announcement, sale message or welcome policy. Requires an OAuth access token.",
            access: Access::Write,
            method: Method::PUT,
            path: "/shops/{shop_id}",
            fields: vec![
                shop_id_field(),
                InputField::optional("title", FieldKind::String, "Shop headline"),
                InputField::optional("announcement", FieldKind::String, "Shop announcement"),
                InputField::optional(
                    "sale_message",
                    FieldKind::String,
                    "Message sent to buyers after purchase",
                ),
                InputField::optional("policy_welcome", FieldKind::String, "Policy welcome text"),
            ],
            planner: plan_update_shop,
        },
    ]
}

fn parse_args<T: DeserializeOwned>(
    operation: &str,
    args: &Map<String, Value>,
) -> Result<T, DispatchError> {
    serde_json::from_value(Value::Object(args.clone()))
        .map_err(|e| DispatchError::invalid_arguments(operation, e.to_string()))
}

fn page_limit(operation: &str, limit: u32) -> Result<u32, DispatchError> {
    check_limit(limit).map_err(|message| DispatchError::invalid_arguments(operation, message))
}

fn resolve_shop_id(
    operation: &str,
    explicit: Option<u64>,
    credentials: &Credentials,
) -> Result<u64, DispatchError> {
    if let Some(shop_id) = explicit {
        return Ok(shop_id);
    }
    let configured = credentials.shop_id().ok_or_else(|| {
        DispatchError::invalid_arguments(
            operation,
            "missing 'shop_id' and no ETSY_SHOP_ID is configured",
        )
    })?;
    configured.parse::<u64>().map_err(|_| {
        DispatchError::invalid_arguments(
            operation,
            format!("configured ETSY_SHOP_ID '{configured}' is not a numeric shop id"),
        )
    })
}

fn json_body<T: Serialize>(operation: &str, body: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(body).map_err(|e| DispatchError::Transport {
        operation: operation.to_string(),
        message: format!("request body could not be encoded: {e}"),
    })
}

fn plan_search_listings(
    args: &Map<String, Value>,
    _credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: SearchListings = parse_args(SEARCH_LISTINGS, args)?;
    let limit = page_limit(SEARCH_LISTINGS, req.limit)?;
    Ok(ApiRequest::get("/listings/active")
        .query("keywords", &req.keywords)
        .query("limit", limit)
        .query("offset", req.offset)
        .query_opt("min_price", req.min_price)
        .query_opt("max_price", req.max_price)
        .query_opt("sort_on", req.sort_on.map(SortOn::as_str))
        .query_opt("sort_order", req.sort_order.map(SortOrder::as_str)))
}

fn plan_get_listing(
    args: &Map<String, Value>,
    _credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: GetListing = parse_args(GET_LISTING, args)?;
    let includes = req
        .includes
        .filter(|items| !items.is_empty())
        .map(|items| {
            items
                .iter()
                .map(|item| item.as_str())
                .collect::<Vec<_>>()
                .join(",")
        });
    Ok(ApiRequest::get(format!("/listings/{}", req.listing_id)).query_opt("includes", includes))
}

fn plan_get_shop(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: ShopRef = parse_args(GET_SHOP, args)?;
    let shop_id = resolve_shop_id(GET_SHOP, req.shop_id, credentials)?;
    Ok(ApiRequest::get(format!("/shops/{shop_id}")))
}

fn plan_get_shop_listings(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: ShopListings = parse_args(GET_SHOP_LISTINGS, args)?;
    let shop_id = resolve_shop_id(GET_SHOP_LISTINGS, req.shop_id, credentials)?;
    let limit = page_limit(GET_SHOP_LISTINGS, req.limit)?;
    Ok(ApiRequest::get(format!("/shops/{shop_id}/listings"))
        .query("state", req.state.as_str())
        .query("limit", limit)
        .query("offset", req.offset))
}

fn plan_search_shops(
    args: &Map<String, Value>,
    _credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: SearchShops = parse_args(SEARCH_SHOPS, args)?;
    let limit = page_limit(SEARCH_SHOPS, req.limit)?;
    Ok(ApiRequest::get("/shops")
        .query("shop_name", &req.shop_name)
        .query("limit", limit)
        .query("offset", req.offset))
}

fn plan_get_listing_inventory(
    args: &Map<String, Value>,
    _credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: ListingRef = parse_args(GET_LISTING_INVENTORY, args)?;
    Ok(ApiRequest::get(format!("/listings/{}/inventory", req.listing_id)))
}

fn plan_get_listing_images(
    args: &Map<String, Value>,
    _credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: ListingRef = parse_args(GET_LISTING_IMAGES, args)?;
    Ok(ApiRequest::get(format!("/listings/{}/images", req.listing_id)))
}

fn plan_get_shop_sections(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: ShopRef = parse_args(GET_SHOP_SECTIONS, args)?;
    let shop_id = resolve_shop_id(GET_SHOP_SECTIONS, req.shop_id, credentials)?;
    Ok(ApiRequest::get(format!("/shops/{shop_id}/sections")))
}

fn plan_get_trending_listings(
    args: &Map<String, Value>,
    _credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: TrendingListings = parse_args(GET_TRENDING_LISTINGS, args)?;
    let limit = page_limit(GET_TRENDING_LISTINGS, req.limit)?;
    Ok(ApiRequest::get("/listings/trending")
        .query("limit", limit)
        .query("offset", req.offset))
}

fn plan_find_shops_by_location(
    args: &Map<String, Value>,
    _credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: ShopsByLocation = parse_args(FIND_SHOPS_BY_LOCATION, args)?;
    let limit = page_limit(FIND_SHOPS_BY_LOCATION, req.limit)?;
    Ok(ApiRequest::get("/shops")
        .query("location", &req.location)
        .query("limit", limit)
        .query("offset", req.offset))
}

fn plan_create_listing(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: CreateListing = parse_args(CREATE_LISTING, args)?;
    let shop_id = resolve_shop_id(CREATE_LISTING, req.shop_id, credentials)?;
    Ok(ApiRequest::post(format!("/shops/{shop_id}/listings"))
        .body(json_body(CREATE_LISTING, &req)?))
}

fn plan_update_listing(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: UpdateListing = parse_args(UPDATE_LISTING, args)?;
    let shop_id = resolve_shop_id(UPDATE_LISTING, req.shop_id, credentials)?;
    Ok(
        ApiRequest::patch(format!("/shops/{shop_id}/listings/{}", req.listing_id))
            .body(json_body(UPDATE_LISTING, &req)?),
    )
}

fn plan_delete_listing(
    args: &Map<String, Value>,
    _credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: ListingRef = parse_args(DELETE_LISTING, args)?;
    Ok(ApiRequest::delete(format!("/listings/{}", req.listing_id)))
}

fn plan_update_listing_inventory(
    args: &Map<String, Value>,
    _credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: UpdateListingInventory = parse_args(UPDATE_LISTING_INVENTORY, args)?;
    Ok(ApiRequest::put(format!("/listings/{}/inventory", req.listing_id))
        .body(json_body(UPDATE_LISTING_INVENTORY, &req)?))
}

fn plan_upload_listing_image(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: UploadListingImage = parse_args(UPLOAD_LISTING_IMAGE, args)?;
    let shop_id = resolve_shop_id(UPLOAD_LISTING_IMAGE, req.shop_id, credentials)?;
    Ok(ApiRequest::post(format!(
        "/shops/{shop_id}/listings/{}/images",
        req.listing_id
    ))
    .body(json_body(UPLOAD_LISTING_IMAGE, &req)?))
}

fn plan_create_shop_section(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: CreateShopSection = parse_args(CREATE_SHOP_SECTION, args)?;
    let shop_id = resolve_shop_id(CREATE_SHOP_SECTION, req.shop_id, credentials)?;
    Ok(ApiRequest::post(format!("/shops/{shop_id}/sections"))
        .body(json_body(CREATE_SHOP_SECTION, &req)?))
}

fn plan_update_shop_section(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: UpdateShopSection = parse_args(UPDATE_SHOP_SECTION, args)?;
    let shop_id = resolve_shop_id(UPDATE_SHOP_SECTION, req.shop_id, credentials)?;
    Ok(ApiRequest::put(format!(
        "/shops/{shop_id}/sections/{}",
        req.shop_section_id
    ))
    .body(json_body(UPDATE_SHOP_SECTION, &req)?))
}

fn plan_delete_shop_section(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: ShopSectionRef = parse_args(DELETE_SHOP_SECTION, args)?;
    let shop_id = resolve_shop_id(DELETE_SHOP_SECTION, req.shop_id, credentials)?;
    Ok(ApiRequest::delete(format!(
        "/shops/{shop_id}/sections/{}",
        req.shop_section_id
    )))
}

fn plan_update_shop(
    args: &Map<String, Value>,
    credentials: &Credentials,
) -> Result<ApiRequest, DispatchError> {
    let req: UpdateShop = parse_args(UPDATE_SHOP, args)?;
    let shop_id = resolve_shop_id(UPDATE_SHOP, req.shop_id, credentials)?;
    Ok(ApiRequest::put(format!("/shops/{shop_id}")).body(json_body(UPDATE_SHOP, &req)?))
}
