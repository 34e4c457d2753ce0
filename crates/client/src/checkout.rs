//! Checkout payloads.
//!
//! Card capture happens in the payment processor's hosted UI; this module
//! only builds the amounts and order summary the backend needs to create and
//! verify a payment intent.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use storefront_sync_core::{CurrencyCode, Price, ProductId};

use crate::cart::Cart;

/// Tax and shipping rules applied to a cart subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PricingPolicy {
    /// Tax as a fraction of the subtotal (e.g. `0.18`).
    pub tax_rate: Decimal,
    /// Flat shipping charge.
    pub flat_shipping: Decimal,
    /// Subtotal above which shipping is free.
    pub free_shipping_over: Option<Decimal>,
}

impl PricingPolicy {
    /// Price breakdown for a subtotal. Amounts are rounded to cents.
    #[must_use]
    pub fn prices(&self, subtotal: Decimal) -> OrderPrices {
        let shipping = match self.free_shipping_over {
            Some(threshold) if subtotal > threshold => Decimal::ZERO,
            _ if subtotal.is_zero() => Decimal::ZERO,
            _ => self.flat_shipping,
        };
        let tax = cents(subtotal * self.tax_rate);

        OrderPrices {
            items_price: cents(subtotal),
            tax_price: tax,
            shipping_price: cents(shipping),
            total_price: cents(subtotal + tax + shipping),
        }
    }
}

fn cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Order price breakdown, sent as JSON numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPrices {
    #[serde(with = "rust_decimal::serde::float")]
    pub items_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

/// Delivery address collected before payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pin_code: String,
    pub phone_no: String,
}

/// One purchased line in the order summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub product: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    /// Image URL, empty when the product has none.
    pub image: String,
}

/// Payment processor's record of the confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentInfo {
    /// Payment intent id.
    pub id: String,
    /// Processor status, e.g. `succeeded`.
    pub status: String,
}

/// Body of `POST /payment/stripe/create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: CurrencyCode,
    pub metadata: BTreeMap<String, String>,
}

impl PaymentIntentRequest {
    /// Intent for the cart's total including tax and shipping.
    #[must_use]
    pub fn for_cart(cart: &Cart, currency: CurrencyCode, policy: &PricingPolicy) -> Self {
        let prices = policy.prices(cart.total());
        let mut metadata = BTreeMap::new();
        metadata.insert("item_count".to_string(), cart.item_count().to_string());

        Self {
            amount: Price::new(prices.total_price, currency).to_minor_units(),
            currency,
            metadata,
        }
    }
}

/// Body of `POST /payment/stripe/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    pub payment_intent_id: String,
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<OrderItem>,
    #[serde(rename = "PaymentInfo")]
    pub payment_info: PaymentInfo,
    pub prices: OrderPrices,
}

impl PaymentVerification {
    /// Order summary for the cart's current lines.
    #[must_use]
    pub fn from_cart(
        cart: &Cart,
        payment: PaymentInfo,
        shipping_info: ShippingInfo,
        policy: &PricingPolicy,
    ) -> Self {
        let order_items = cart
            .lines()
            .iter()
            .map(|line| OrderItem {
                product: line.product_id.clone(),
                name: line.name.clone(),
                price: line.unit_price,
                quantity: line.quantity,
                image: line
                    .image
                    .as_ref()
                    .map(|i| i.url.clone())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            payment_intent_id: payment.id.clone(),
            shipping_info,
            order_items,
            payment_info: payment,
            prices: policy.prices(cart.total()),
        }
    }
}
