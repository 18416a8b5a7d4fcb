//! Static prompt templates served through `prompts/list` and `prompts/get`.

use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::tools;

/// Etsy transaction fee, charged on the sale price
pub const TRANSACTION_FEE_RATE: f64 = 0.065;
/// Etsy Payments processing fee (US), percentage part
pub const PAYMENT_PROCESSING_RATE: f64 = 0.03;
/// Etsy Payments processing fee (US), fixed part
pub const PAYMENT_PROCESSING_FIXED: f64 = 0.25;
pub const LISTING_FEE: f64 = 0.20;
/// Retail is conventionally twice wholesale
const RETAIL_MULTIPLIER: f64 = 2.0;

const DEFAULT_HOURLY_RATE: f64 = 20.0;
const DEFAULT_OVERHEAD_PERCENT: f64 = 10.0;
const DEFAULT_MARKUP: f64 = 2.0;

const OPTIMIZE_FOCUS_VALUES: &[&str] = &["seo", "photos", "description", "pricing", "all"];

#[derive(Debug, Error, PartialEq)]
pub enum PromptError {
    #[error("unknown prompt '{0}'")]
    UnknownPrompt(String),
    #[error("prompt '{prompt}' requires argument '{argument}'")]
    MissingArgument {
        prompt: &'static str,
        argument: &'static str,
    },
    #[error("prompt '{prompt}' argument '{argument}': {message}")]
    InvalidArgument {
        prompt: &'static str,
        argument: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct PromptArgument {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

type Renderer = fn(&Map<String, Value>) -> Result<String, PromptError>;

#[derive(Debug, Clone)]
pub struct PromptDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<PromptArgument>,
    render: Renderer,
}

fn arg(name: &'static str, description: &'static str, required: bool) -> PromptArgument {
    PromptArgument {
        name,
        description,
        required,
    }
}

pub fn prompt_definitions() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition {
            name: "optimize_listing",
            description: "Review an existing listing and propose concrete improvements.",
            arguments: vec![
                arg("listing_id", "Numeric id of the listing to review", true),
                arg(
                    "focus",
                    "One of seo, photos, description, pricing, all (default all)",
                    false,
                ),
            ],
            render: render_optimize_listing,
        },
        PromptDefinition {
            name: "pricing_strategy",
            description: "Work out cost, wholesale and retail prices and Etsy fees for a handmade item.",
            arguments: vec![
                arg("material_cost", "Material cost per item", true),
                arg("labor_hours", "Hours of work per item", true),
                arg("hourly_rate", "Hourly labor rate (default 20)", false),
                arg("overhead_percent", "Overhead as a percentage of base cost (default 10)", false),
                arg("markup", "Wholesale multiplier on total cost (default 2)", false),
            ],
            render: render_pricing_strategy,
        },
        PromptDefinition {
            name: "shop_setup",
            description: "Step-by-step checklist for launching or reorganising a shop.",
            arguments: vec![
                arg("product_type", "What the shop sells", true),
                arg("shop_name", "Shop name, if already chosen", false),
            ],
            render: render_shop_setup,
        },
        PromptDefinition {
            name: "seo_keywords",
            description: "Research titles and tags for a product within Etsy's limits.",
            arguments: vec![
                arg("product_description", "Short description of the product", true),
                arg("target_audience", "Who the product is for", false),
            ],
            render: render_seo_keywords,
        },
    ]
}

pub fn list_payload() -> Value {
    let prompts: Vec<Value> = prompt_definitions()
        .into_iter()
        .map(|prompt| {
            let arguments: Vec<Value> = prompt
                .arguments
                .iter()
                .map(|a| {
                    json!({
                        "name": a.name,
                        "description": a.description,
                        "required": a.required
                    })
                })
                .collect();
            json!({
                "name": prompt.name,
                "description": prompt.description,
                "arguments": arguments
            })
        })
        .collect();
    json!({ "prompts": prompts })
}

/// Render a prompt into the `prompts/get` result shape.
pub fn get_prompt(name: &str, args: &Map<String, Value>) -> Result<Value, PromptError> {
    let prompt = prompt_definitions()
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| PromptError::UnknownPrompt(name.to_string()))?;

    for required in prompt.arguments.iter().filter(|a| a.required) {
        if text_arg(args, required.name).is_none() {
            return Err(PromptError::MissingArgument {
                prompt: prompt.name,
                argument: required.name,
            });
        }
    }

    let text = (prompt.render)(args)?;
    Ok(json!({
        "description": prompt.description,
        "messages": [{
            "role": "user",
            "content": { "type": "text", "text": text }
        }]
    }))
}

/// Prompt arguments arrive as strings; numbers are tolerated too.
fn text_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn number_arg(
    prompt: &'static str,
    args: &Map<String, Value>,
    argument: &'static str,
    default: f64,
) -> Result<f64, PromptError> {
    let Some(raw) = text_arg(args, argument) else {
        return Ok(default);
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(PromptError::InvalidArgument {
            prompt,
            argument,
            message: format!("expected a non-negative number, got '{raw}'"),
        }),
    }
}

fn render_optimize_listing(args: &Map<String, Value>) -> Result<String, PromptError> {
    let listing_id = text_arg(args, "listing_id").unwrap_or_default();
    let focus = text_arg(args, "focus").unwrap_or_else(|| "all".to_string());
    if !OPTIMIZE_FOCUS_VALUES.contains(&focus.as_str()) {
        return Err(PromptError::InvalidArgument {
            prompt: "optimize_listing",
            argument: "focus",
            message: format!("must be one of {}", OPTIMIZE_FOCUS_VALUES.join(", ")),
        });
    }

    let focus_line = match focus.as_str() {
        "seo" => "Concentrate on the title, tags and the first 160 characters of the description.",
        "photos" => "Concentrate on image count, ordering, the primary image and alt text.",
        "description" => "Concentrate on description structure, clarity and buyer questions it leaves open.",
        "pricing" => "Concentrate on price positioning against comparable listings and variation pricing.",
        _ => "Cover title, tags, description, photos and pricing.",
    };

    Ok(format!(
        "Review Etsy listing {listing_id} and suggest improvements.\n\n\
         1. Call {get} with listing_id={listing_id} and includes [\"Images\", \"Inventory\"].\n\
         2. Call {images} and {inventory} if those sections are missing.\n\
         3. Call {search} with keywords taken from the title to see how comparable items are presented.\n\n\
         {focus_line}\n\n\
         Keep the title under 140 characters and use at most 13 tags. \
         List each suggestion with the current value, the proposed value and why it should help. \
         Do not call any write tool until the seller confirms the changes.",
        get = tools::GET_LISTING,
        images = tools::GET_LISTING_IMAGES,
        inventory = tools::GET_LISTING_INVENTORY,
        search = tools::SEARCH_LISTINGS,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInputs {
    pub material_cost: f64,
    pub labor_hours: f64,
    pub hourly_rate: f64,
    pub overhead_percent: f64,
    pub markup: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakdown {
    pub labor_cost: f64,
    pub base_cost: f64,
    pub overhead: f64,
    pub total_cost: f64,
    pub wholesale_price: f64,
    pub retail_price: f64,
    pub transaction_fee: f64,
    pub processing_fee: f64,
    pub listing_fee: f64,
    pub total_fees: f64,
    pub net_profit: f64,
}

impl PricingInputs {
    pub fn breakdown(&self) -> PriceBreakdown {
        let labor_cost = cents(self.labor_hours * self.hourly_rate);
        let base_cost = cents(self.material_cost + labor_cost);
        let overhead = cents(base_cost * self.overhead_percent / 100.0);
        let total_cost = cents(base_cost + overhead);
        let wholesale_price = cents(total_cost * self.markup);
        let retail_price = cents(wholesale_price * RETAIL_MULTIPLIER);
        let transaction_fee = cents(retail_price * TRANSACTION_FEE_RATE);
        let processing_fee = cents(retail_price * PAYMENT_PROCESSING_RATE + PAYMENT_PROCESSING_FIXED);
        let total_fees = cents(transaction_fee + processing_fee + LISTING_FEE);
        let net_profit = cents(retail_price - total_fees - total_cost);
        PriceBreakdown {
            labor_cost,
            base_cost,
            overhead,
            total_cost,
            wholesale_price,
            retail_price,
            transaction_fee,
            processing_fee,
            listing_fee: LISTING_FEE,
            total_fees,
            net_profit,
        }
    }
}

fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn render_pricing_strategy(args: &Map<String, Value>) -> Result<String, PromptError> {
    const PROMPT: &str = "pricing_strategy";
    let inputs = PricingInputs {
        material_cost: number_arg(PROMPT, args, "material_cost", 0.0)?,
        labor_hours: number_arg(PROMPT, args, "labor_hours", 0.0)?,
        hourly_rate: number_arg(PROMPT, args, "hourly_rate", DEFAULT_HOURLY_RATE)?,
        overhead_percent: number_arg(PROMPT, args, "overhead_percent", DEFAULT_OVERHEAD_PERCENT)?,
        markup: number_arg(PROMPT, args, "markup", DEFAULT_MARKUP)?,
    };
    let b = inputs.breakdown();

    Ok(format!(
        "Help me price a handmade item for Etsy. My numbers:\n\n\
         - Materials: ${material:.2}\n\
         - Labor: {hours} h at ${rate:.2}/h = ${labor:.2}\n\
         - Base cost: ${base:.2}\n\
         - Overhead ({overhead_pct}%): ${overhead:.2}\n\
         - Total cost: ${total:.2}\n\
         - Wholesale price (x{markup}): ${wholesale:.2}\n\
         - Retail price (x2 wholesale): ${retail:.2}\n\n\
         Etsy fees on a ${retail:.2} sale:\n\
         - Transaction fee (6.5%): ${transaction:.2}\n\
         - Payment processing (3% + $0.25): ${processing:.2}\n\
         - Listing fee: ${listing:.2}\n\
         - Total fees: ${fees:.2}\n\n\
         Net profit per retail sale: ${net:.2}\n\n\
         Use {search} to check what comparable items sell for, then tell me whether ${retail:.2} \
         is competitive, where I could trim costs, and whether offering free shipping by folding \
         it into the price makes sense.",
        material = inputs.material_cost,
        hours = inputs.labor_hours,
        rate = inputs.hourly_rate,
        labor = b.labor_cost,
        base = b.base_cost,
        overhead_pct = inputs.overhead_percent,
        overhead = b.overhead,
        total = b.total_cost,
        markup = inputs.markup,
        wholesale = b.wholesale_price,
        retail = b.retail_price,
        transaction = b.transaction_fee,
        processing = b.processing_fee,
        listing = b.listing_fee,
        fees = b.total_fees,
        net = b.net_profit,
        search = tools::SEARCH_LISTINGS,
    ))
}

fn render_shop_setup(args: &Map<String, Value>) -> Result<String, PromptError> {
    let product_type = text_arg(args, "product_type").unwrap_or_default();
    let shop_line = match text_arg(args, "shop_name") {
        Some(name) => format!("The shop is called \"{name}\"."),
        None => "The shop does not have a name yet; suggest five options.".to_string(),
    };

    Ok(format!(
        "I am setting up an Etsy shop selling {product_type}. {shop_line}\n\n\
         Walk me through:\n\
         1. Shop title, announcement and sale message (apply with {update_shop}).\n\
         2. A section structure for the catalog (create with {create_section}).\n\
         3. The first three listings: titles, descriptions, 13 tags each and prices \
         (create with {create_listing} once I approve).\n\
         4. Policies buyers expect for {product_type}: processing time, returns, custom orders.\n\n\
         Check {get_shop} and {get_sections} first so you do not duplicate anything that already exists.",
        update_shop = tools::UPDATE_SHOP,
        create_section = tools::CREATE_SHOP_SECTION,
        create_listing = tools::CREATE_LISTING,
        get_shop = tools::GET_SHOP,
        get_sections = tools::GET_SHOP_SECTIONS,
    ))
}

fn render_seo_keywords(args: &Map<String, Value>) -> Result<String, PromptError> {
    let description = text_arg(args, "product_description").unwrap_or_default();
    let audience = text_arg(args, "target_audience")
        .map(|a| format!(" aimed at {a}"))
        .unwrap_or_default();

    Ok(format!(
        "Find Etsy search keywords for this product{audience}: {description}\n\n\
         Use {search} and {trending} to see which phrases similar listings rank with. Then give me:\n\
         - a title of at most 140 characters with the strongest phrase first,\n\
         - exactly 13 tags of at most 20 characters each, no repeats of title words unless they are multi-word phrases,\n\
         - three long-tail phrases worth weaving into the description.",
        search = tools::SEARCH_LISTINGS,
        trending = tools::GET_TRENDING_LISTINGS,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::as_args;

    #[test]
    fn pricing_breakdown_arithmetic() {
        let b = PricingInputs {
            material_cost: 10.0,
            labor_hours: 2.0,
            hourly_rate: 20.0,
            overhead_percent: 10.0,
            markup: 2.0,
        }
        .breakdown();

        assert_eq!(b.labor_cost, 40.0);
        assert_eq!(b.base_cost, 50.0);
        assert_eq!(b.overhead, 5.0);
        assert_eq!(b.total_cost, 55.0);
        assert_eq!(b.wholesale_price, 110.0);
        assert_eq!(b.retail_price, 220.0);
        assert_eq!(b.transaction_fee, 14.3);
        assert_eq!(b.processing_fee, 6.85);
        assert_eq!(b.total_fees, 21.35);
        assert_eq!(b.net_profit, 143.65);
    }

    #[test]
    fn pricing_prompt_applies_defaults_and_embeds_numbers() {
        let result = get_prompt(
            "pricing_strategy",
            &as_args(json!({ "material_cost": "10", "labor_hours": "2" })),
        )
        .unwrap();
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("Retail price (x2 wholesale): $220.00"));
        assert!(text.contains("Net profit per retail sale: $143.65"));
        assert_eq!(result["messages"][0]["role"], "user");
    }

    #[test]
    fn pricing_prompt_rejects_non_numbers() {
        let err = get_prompt(
            "pricing_strategy",
            &as_args(json!({ "material_cost": "ten", "labor_hours": "2" })),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PromptError::InvalidArgument {
                argument: "material_cost",
                ..
            }
        ));
    }

    #[test]
    fn missing_required_argument_is_reported() {
        let err = get_prompt("optimize_listing", &Map::new()).unwrap_err();
        assert_eq!(
            err,
            PromptError::MissingArgument {
                prompt: "optimize_listing",
                argument: "listing_id"
            }
        );
    }

    #[test]
    fn unknown_prompt_is_reported() {
        assert_eq!(
            get_prompt("write_poem", &Map::new()).unwrap_err(),
            PromptError::UnknownPrompt("write_poem".to_string())
        );
    }

    #[test]
    fn optimize_listing_validates_focus() {
        let ok = get_prompt(
            "optimize_listing",
            &as_args(json!({ "listing_id": "123", "focus": "seo" })),
        )
        .unwrap();
        let text = ok["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("listing_id=123"));
        assert!(text.contains("title, tags"));

        let err = get_prompt(
            "optimize_listing",
            &as_args(json!({ "listing_id": "123", "focus": "vibes" })),
        )
        .unwrap_err();
        assert!(matches!(err, PromptError::InvalidArgument { .. }));
    }

    #[test]
    fn prompts_reference_only_registered_tools() {
        let registry = crate::registry::OperationRegistry::etsy();
        let text = get_prompt(
            "shop_setup",
            &as_args(json!({ "product_type": "candles" })),
        )
        .unwrap()["messages"][0]["content"]["text"]
            .as_str()
            .unwrap()
            .to_string();
        for word in text.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
            if word.starts_with("etsy_") {
                assert!(registry.get(word).is_some(), "{word}");
            }
        }
    }

    #[test]
    fn list_payload_marks_required_arguments() {
        let payload = list_payload();
        let prompts = payload["prompts"].as_array().unwrap();
        assert_eq!(prompts.len(), 4);
        let pricing = prompts
            .iter()
            .find(|p| p["name"] == "pricing_strategy")
            .unwrap();
        assert_eq!(pricing["arguments"][0]["required"], true);
        assert_eq!(pricing["arguments"][2]["required"], false);
    }
}
