//! Read-only reference documents served through `resources/list` and
//! `resources/read`.

use std::fmt::Write as _;

use serde_json::{Value, json};
use thiserror::Error;

use crate::registry::OperationRegistry;

pub const OPERATIONS_URI: &str = "etsy://reference/operations";

const MARKDOWN: &str = "text/markdown";

const LISTING_BEST_PRACTICES: &str = include_str!("../guides/listing-best-practices.md");
const SEO_GUIDE: &str = include_str!("../guides/seo.md");
const FEES_GUIDE: &str = include_str!("../guides/fees.md");
const SHOP_POLICIES: &str = include_str!("../guides/shop-policies.md");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Unknown resource uri '{0}'")]
    UnknownResource(String),
}

#[derive(Debug)]
struct ResourceDefinition {
    uri: &'static str,
    name: &'static str,
    description: &'static str,
}

fn resource_definitions() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: "etsy://guides/listing-best-practices",
            name: "Listing Best Practices",
            description: "Titles, photos, descriptions and variations that convert",
        },
        ResourceDefinition {
            uri: "etsy://guides/seo",
            name: "Etsy SEO Guide",
            description: "How Etsy search ranks listings and how to pick tags",
        },
        ResourceDefinition {
            uri: "etsy://guides/fees",
            name: "Etsy Fee Reference",
            description: "Listing, transaction and payment processing fees",
        },
        ResourceDefinition {
            uri: "etsy://guides/shop-policies",
            name: "Shop Policies Guide",
            description: "Processing times, returns, custom orders and privacy",
        },
        ResourceDefinition {
            uri: OPERATIONS_URI,
            name: "Operation Reference",
            description: "Every tool with its HTTP method, path and access level",
        },
    ]
}

pub fn list_payload() -> Value {
    let resources: Vec<Value> = resource_definitions()
        .into_iter()
        .map(|res| {
            json!({
                "uri": res.uri,
                "name": res.name,
                "description": res.description,
                "mimeType": MARKDOWN
            })
        })
        .collect();
    json!({ "resources": resources })
}

pub fn read(uri: &str, registry: &OperationRegistry) -> Result<Value, ResourceError> {
    let text = match uri {
        "etsy://guides/listing-best-practices" => LISTING_BEST_PRACTICES.to_string(),
        "etsy://guides/seo" => SEO_GUIDE.to_string(),
        "etsy://guides/fees" => FEES_GUIDE.to_string(),
        "etsy://guides/shop-policies" => SHOP_POLICIES.to_string(),
        OPERATIONS_URI => operations_reference(registry),
        _ => return Err(ResourceError::UnknownResource(uri.to_string())),
    };

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": MARKDOWN,
            "text": text
        }]
    }))
}

fn operations_reference(registry: &OperationRegistry) -> String {
    let mut out = String::from("# Etsy operations\n\n");
    out.push_str(
        "Write operations need an OAuth access token (`ETSY_ACCESS_TOKEN`); \
         read operations only need the API key.\n\n",
    );
    out.push_str("| Tool | Method | Path | Access |\n|---|---|---|---|\n");
    for op in registry.iter() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "| `{}` | {} | `{}` | {} |",
            op.name,
            op.method,
            op.path,
            op.access.as_str()
        );
    }
    out
}
