//! Integration tests for a full checkout against the storefront fixtures.
//!
//! Cart used throughout: one Margherita Classic (₹249.00) and two Pepperoni Delight (₹349.00),
//! delivered for ₹5.00 with 8.5% tax.
//!
//! - No promo: subtotal ₹947.00, taxable base ₹952.00, tax ₹80.92, total ₹1032.92
//! - SAVE10: discount ₹94.70, taxable base ₹857.30, tax ₹72.87, total ₹930.17

use rusty_money::{Money, iso::INR};
use testresult::TestResult;

use crust::{
    billing::FulfillmentMode,
    catalog::{Catalog, StaticCatalog, YamlCatalog},
    config::EngineConfig,
    order::{InMemoryBackend, OrderError, OrderFailure, SimulatedBackend},
    pricing::Price,
    promotions::PromoError,
    receipt::{Customer, CustomerIdentity, PaymentMethod, render::render_receipt},
    session::{RecordingObserver, SessionError, SessionEvent, ShoppingSession},
};

fn rupees(minor: i64) -> Price {
    Money::from_minor(minor, INR)
}

async fn storefront() -> TestResult<(Catalog, ShoppingSession<RecordingObserver>)> {
    let config = EngineConfig::from_path("fixtures/config/default.yml")?;
    let catalog = Catalog::load(&YamlCatalog::new("fixtures/catalog/pizzas.yml"), config.currency)
        .await?;
    let mut session = ShoppingSession::with_observer(config, RecordingObserver::default())?;

    for id in ["1", "2", "2"] {
        session.add_item(catalog.get(id)?)?;
    }

    Ok((catalog, session))
}

#[tokio::test]
async fn fixture_catalog_matches_built_in_menu() -> TestResult {
    let from_yaml = Catalog::load(&YamlCatalog::new("fixtures/catalog/pizzas.yml"), INR).await?;
    let built_in = Catalog::load(&StaticCatalog::pizzas(), INR).await?;

    assert_eq!(
        from_yaml.iter().collect::<Vec<_>>(),
        built_in.iter().collect::<Vec<_>>()
    );

    Ok(())
}

#[tokio::test]
async fn bill_without_promo() -> TestResult {
    let (_, session) = storefront().await?;
    let bill = session.view_bill()?;

    assert_eq!(session.cart().total_item_count(), 3);
    assert_eq!(bill.subtotal(), rupees(94_700));
    assert_eq!(bill.taxable_base(), rupees(95_200));
    assert_eq!(bill.tax(), rupees(8_092));
    assert_eq!(bill.total(), rupees(103_292));

    Ok(())
}

#[tokio::test]
async fn bill_with_save10() -> TestResult {
    let (_, mut session) = storefront().await?;

    session.apply_promo("SAVE10")?;

    let bill = session.view_bill()?;

    assert_eq!(bill.discount(), rupees(9_470));
    assert_eq!(bill.taxable_base(), rupees(85_730));
    assert_eq!(bill.tax(), rupees(7_287));
    assert_eq!(bill.total(), rupees(93_017));

    Ok(())
}

#[tokio::test]
async fn promo_errors_leave_bill_alone() -> TestResult {
    let (_, mut session) = storefront().await?;
    let before = session.bill().total();

    assert!(matches!(
        session.apply_promo(""),
        Err(SessionError::Promo(PromoError::EmptyCode))
    ));
    assert!(matches!(
        session.apply_promo("BOGUS"),
        Err(SessionError::Promo(PromoError::InvalidCode(code))) if code == "BOGUS"
    ));

    assert_eq!(session.bill().total(), before);
    assert!(!session.promo().is_active());

    Ok(())
}

#[tokio::test]
async fn set_quantity_zero_matches_remove() -> TestResult {
    let (_, mut by_quantity) = storefront().await?;
    let (_, mut by_remove) = storefront().await?;

    let _token = by_quantity.set_quantity("2", 0)?;
    let _token = by_remove.remove_item("2")?;

    assert_eq!(by_quantity.cart(), by_remove.cart());
    assert_eq!(by_quantity.bill().total(), by_remove.bill().total());

    Ok(())
}

#[tokio::test]
async fn full_checkout_produces_receipt_and_empties_cart() -> TestResult {
    let (_, mut session) = storefront().await?;
    session.apply_promo("save10")?;
    session.set_fulfillment(FulfillmentMode::Delivery)?;

    let backend = InMemoryBackend::new();
    let customer = CustomerIdentity::Registered(Customer {
        name: "Raj Kumar".to_string(),
        email: "raj@example.com".to_string(),
        phone: Some("+91 98765 43210".to_string()),
        address: Some("Sector 17, Chandigarh".to_string()),
    });

    let receipt = session
        .place_order(&backend, customer.clone(), PaymentMethod::DigitalWallet)
        .await?;

    assert_eq!(receipt.customer(), &customer);
    assert_eq!(receipt.items().len(), 2);
    assert_eq!(receipt.subtotal(), rupees(94_700));
    assert_eq!(receipt.tax(), rupees(7_287));
    assert_eq!(receipt.total(), rupees(93_017));
    assert!(session.cart().is_empty());
    assert!(matches!(session.view_bill(), Err(SessionError::EmptyCart)));

    let text = render_receipt(&receipt)?;

    assert!(text.contains("One Bite Pizza's"));
    assert!(text.contains("Discount (SAVE10):"));
    assert!(text.contains("TOTAL AMOUNT:"));
    assert!(text.contains("₹930.17"));
    assert!(text.contains("Payment Method: Digital Wallet"));

    let stored = backend.orders();

    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored.first().map(|order| order.order_id().clone()),
        Some(receipt.order_id().clone())
    );

    Ok(())
}

#[tokio::test]
async fn rejected_order_keeps_cart_for_retry() -> TestResult {
    let (_, mut session) = storefront().await?;
    let before = session.cart().clone();

    let refusing = SimulatedBackend::failing(OrderFailure::Reject("kitchen closed".to_string()));
    let result = session
        .place_order(&refusing, CustomerIdentity::Guest, PaymentMethod::CashOnDelivery)
        .await;

    assert!(matches!(
        result,
        Err(SessionError::OrderPlacementFailed(OrderError::Rejected { .. }))
    ));
    assert_eq!(session.cart(), &before);

    let receipt = session
        .place_order(
            &SimulatedBackend::accepting(),
            CustomerIdentity::Guest,
            PaymentMethod::CashOnDelivery,
        )
        .await?;

    assert_eq!(receipt.total(), rupees(103_292));
    assert!(session.cart().is_empty());

    Ok(())
}

#[tokio::test]
async fn empty_cart_order_fails_without_receipt() -> TestResult {
    let mut session = ShoppingSession::new(EngineConfig::default())?;
    let backend = InMemoryBackend::new();

    let result = session
        .place_order(&backend, CustomerIdentity::Guest, PaymentMethod::CashOnDelivery)
        .await;

    assert!(matches!(result, Err(SessionError::EmptyCart)));
    assert!(backend.orders().is_empty());

    Ok(())
}

#[tokio::test]
async fn observer_sees_each_committed_change() -> TestResult {
    let (catalog, mut session) = storefront().await?;

    session.observer_mut().clear();

    session.add_item(catalog.get("3")?)?;
    let token = session.remove_item("1")?;
    session.undo(token)?;
    session.apply_promo("NEW25")?;
    session.set_fulfillment(FulfillmentMode::Pickup)?;
    let _err = session.apply_promo("NOPE");

    assert_eq!(
        session.observer().events(),
        [
            SessionEvent::CartChanged { item_count: 4 },
            SessionEvent::CartChanged { item_count: 3 },
            SessionEvent::CartChanged { item_count: 4 },
            SessionEvent::PromoApplied {
                code: "NEW25".to_string(),
                discount: rupees(31_150),
            },
            SessionEvent::FulfillmentChanged(FulfillmentMode::Pickup),
        ]
    );

    Ok(())
}
