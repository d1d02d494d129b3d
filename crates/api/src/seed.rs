//! Demo data for the in-memory collaborators.

use domain::{DomainError, Money, Product, ProductId};

/// Flat shipping quote, in USD cents.
pub const DEMO_SHIPPING_QUOTE_CENTS: i64 = 899;

/// Currencies the demo currency service converts to, in billionths per USD.
pub const DEMO_RATES: [(&str, i64); 6] = [
    ("EUR", 920_000_000),
    ("GBP", 790_000_000),
    ("JPY", 150_120_000_000),
    ("CAD", 1_360_000_000),
    ("CHF", 880_000_000),
    ("AUD", 1_520_000_000),
];

/// The demo product catalog, priced in USD.
pub fn demo_products() -> Result<Vec<Product>, DomainError> {
    let rows: [(&str, &str, &str, i64, &[&str]); 8] = [
        (
            "OLJCESPC7Z",
            "Sunglasses",
            "Add a modern touch to your outfits with these sleek aviator sunglasses.",
            1_999,
            &["accessories"],
        ),
        (
            "66VCHSJNUP",
            "Tank Top",
            "Perfectly cropped cotton tank, with a scooped neckline.",
            1_899,
            &["clothing", "tops"],
        ),
        (
            "1YMWWN1N4O",
            "Watch",
            "This gold-tone stainless steel watch will work with most of your outfits.",
            10_999,
            &["accessories"],
        ),
        (
            "L9ECAV7KIM",
            "Loafers",
            "A neat addition to your summer wardrobe.",
            8_999,
            &["footwear"],
        ),
        (
            "2ZYFJ3GM2N",
            "Hairdryer",
            "This lightweight hairdryer has 3 heat and speed settings.",
            2_499,
            &["hair", "beauty"],
        ),
        (
            "0PUK6V6EV0",
            "Candle Holder",
            "This small but intricate candle holder is an excellent gift.",
            1_895,
            &["decor", "home"],
        ),
        (
            "LS4PSXUNUM",
            "Salt & Pepper Shakers",
            "Add some flavor to your kitchen.",
            1_849,
            &["kitchen"],
        ),
        (
            "9SIQT8TOJO",
            "Bamboo Glass Jar",
            "This bamboo glass jar can hold 57 oz (1.7 l) and is perfect for any kitchen.",
            549,
            &["kitchen"],
        ),
    ];

    rows.into_iter()
        .map(|(id, name, description, cents, categories)| -> Result<Product, DomainError> {
            Ok(Product {
                id: ProductId::new(id),
                name: name.to_string(),
                description: description.to_string(),
                price_usd: Money::from_cents("USD", cents)?,
                categories: categories.iter().map(|c| c.to_string()).collect(),
            })
        })
        .collect()
}

/// The flat shipping quote as money.
pub fn demo_shipping_quote() -> Result<Money, DomainError> {
    Money::from_cents("USD", DEMO_SHIPPING_QUOTE_CENTS)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_demo_catalog_has_unique_ids() {
        let products = demo_products().unwrap();
        let ids: HashSet<_> = products.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), products.len());
        assert!(products.iter().all(|p| p.price_usd.currency_code() == "USD"));
    }

    #[test]
    fn test_demo_rates_are_positive() {
        assert!(DEMO_RATES.iter().all(|(code, rate)| code.len() == 3 && *rate > 0));
        assert_eq!(demo_shipping_quote().unwrap().to_string(), "8.99 USD");
    }
}
