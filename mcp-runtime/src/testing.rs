use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::tools;
use crate::transport::{ApiRequest, Transport, TransportError};

/// Stub transport that records every request and answers with a fixed result.
pub struct RecordingTransport {
    response: Result<Value, TransportError>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl RecordingTransport {
    pub fn ok(body: Value) -> Self {
        Self {
            response: Ok(body),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn err(error: TransportError) -> Self {
        Self {
            response: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        self.response.clone()
    }
}

pub fn as_args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("tool arguments must be an object, got {other}"),
    }
}

/// Minimal valid arguments for each catalog operation.
pub fn sample_args(name: &str) -> Map<String, Value> {
    let args = match name {
        tools::SEARCH_LISTINGS => json!({ "keywords": "ceramic mug" }),
        tools::GET_LISTING
        | tools::GET_LISTING_INVENTORY
        | tools::GET_LISTING_IMAGES
        | tools::DELETE_LISTING => json!({ "listing_id": 1001 }),
        tools::GET_SHOP | tools::GET_SHOP_LISTINGS | tools::GET_SHOP_SECTIONS => json!({}),
        tools::SEARCH_SHOPS => json!({ "shop_name": "clayworks" }),
        tools::GET_TRENDING_LISTINGS => json!({}),
        tools::FIND_SHOPS_BY_LOCATION => json!({ "location": "Portland" }),
        tools::CREATE_LISTING => json!({
            "quantity": 1,
            "title": "Speckled mug",
            "description": "Wheel thrown stoneware",
            "price": 32.0,
            "who_made": "i_did",
            "when_made": "made_to_order",
            "taxonomy_id": 1062
        }),
        tools::UPDATE_LISTING => json!({ "listing_id": 1001, "quantity": 4 }),
        tools::UPDATE_LISTING_INVENTORY => json!({ "listing_id": 1001, "products": [] }),
        tools::UPLOAD_LISTING_IMAGE => json!({
            "listing_id": 1001,
            "image_url": "https://example.com/mug.jpg"
        }),
        tools::CREATE_SHOP_SECTION => json!({ "title": "Mugs" }),
        tools::UPDATE_SHOP_SECTION => json!({ "shop_section_id": 7, "title": "Cups" }),
        tools::DELETE_SHOP_SECTION => json!({ "shop_section_id": 7 }),
        tools::UPDATE_SHOP => json!({ "announcement": "Kiln firing this week" }),
        other => panic!("no sample arguments for {other}"),
    };
    as_args(args)
}
