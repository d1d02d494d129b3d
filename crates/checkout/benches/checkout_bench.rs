use std::sync::Arc;

use checkout::services::generate_tracking_id;
use checkout::{
    CartService, CheckoutConfig, CheckoutOrchestrator, Collaborators, CurrencyService,
    InMemoryCartService, InMemoryCurrencyService, InMemoryPaymentService, InMemoryProductCatalog,
    InMemoryShippingService, PlaceOrderRequest,
};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Address, CartItem, CreditCardInfo, Money, Product, ProductId};
use order_store::InMemoryOrderStore;

fn catalog(size: usize) -> InMemoryProductCatalog {
    InMemoryProductCatalog::with_products((0..size).map(|i| Product {
        id: ProductId::new(format!("P{i}")),
        name: format!("Product {i}"),
        description: "Benchmark product".to_string(),
        price_usd: Money::from_cents("USD", 1_000 + i as i64).unwrap(),
        categories: vec!["bench".to_string()],
    }))
}

fn request(user_id: &str) -> PlaceOrderRequest {
    PlaceOrderRequest {
        user_id: user_id.to_string(),
        user_currency: "EUR".to_string(),
        address: Address {
            street_address: "1600 Amphitheatre Parkway".to_string(),
            city: "Mountain View".to_string(),
            state: "CA".to_string(),
            country: "US".to_string(),
            zip_code: 94043,
        },
        credit_card: CreditCardInfo {
            credit_card_number: "4432801561520454".to_string(),
            credit_card_cvv: 672,
            credit_card_expiration_year: 2099,
            credit_card_expiration_month: 1,
        },
        email: None,
    }
}

fn orchestrator(rt: &tokio::runtime::Runtime, lines: usize) -> CheckoutOrchestrator {
    let cart = InMemoryCartService::new();
    rt.block_on(async {
        for i in 0..lines {
            cart.add_item("bench", CartItem::new(format!("P{i}").as_str(), 2))
                .await
                .unwrap();
        }
    });

    let services = Collaborators::new(
        Arc::new(cart),
        Arc::new(catalog(lines)),
        Arc::new(InMemoryCurrencyService::with_rates([("EUR", 900_000_000)])),
        Arc::new(InMemoryShippingService::new(
            Money::from_cents("USD", 899).unwrap(),
        )),
        Arc::new(InMemoryPaymentService::new()),
    );
    let config = CheckoutConfig {
        empty_cart_on_success: false,
        ..CheckoutConfig::default()
    };

    CheckoutOrchestrator::new(Arc::new(InMemoryOrderStore::new()), services, config)
}

fn bench_place_order_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orchestrator = orchestrator(&rt, 1);

    c.bench_function("checkout/place_order_single_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                orchestrator.place_order(request("bench")).await.unwrap();
            });
        });
    });
}

fn bench_place_order_20_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orchestrator = orchestrator(&rt, 20);

    c.bench_function("checkout/place_order_20_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                orchestrator.place_order(request("bench")).await.unwrap();
            });
        });
    });
}

fn bench_currency_convert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let currency = InMemoryCurrencyService::with_rates([("EUR", 900_000_000)]);
    let amount = Money::new("USD", 1_234, 560_000_000).unwrap();

    c.bench_function("checkout/currency_convert", |b| {
        b.iter(|| {
            rt.block_on(async {
                currency.convert(&amount, "EUR").await.unwrap();
            });
        });
    });
}

fn bench_tracking_id(c: &mut Criterion) {
    let salt = "1600 Amphitheatre Parkway, Mountain View, CA, US 94043";

    c.bench_function("checkout/generate_tracking_id", |b| {
        b.iter(|| generate_tracking_id(salt));
    });
}

criterion_group!(
    benches,
    bench_place_order_single_line,
    bench_place_order_20_lines,
    bench_currency_convert,
    bench_tracking_id,
);
criterion_main!(benches);
