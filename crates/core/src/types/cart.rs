//! Cart lines and derived totals.
//!
//! [`CartLines`] is the state a visitor's cart holds, whether it lives in the
//! guest session or mirrors the server cart. [`CartSummary`] is always
//! derived from it and never trusted as input: the server recomputes its own
//! totals on every sync.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::checkout::DeliveryOption;
use super::id::{CartItemId, ProductId};
use super::price::{CurrencyCode, ExchangeRates, round_money};
use super::product::Product;

/// Most units of one product a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors from cart line operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// Quantity must be a positive integer.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    /// More units than one line may hold.
    #[error("at most {max} units per product")]
    QuantityTooLarge { max: u32 },
    /// Product cannot be purchased right now.
    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),
    /// The cart already holds every available unit.
    #[error("only {available} of product {product_id} available")]
    StockLimit {
        product_id: ProductId,
        available: u32,
    },
    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Server-assigned line id, absent for guest lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CartItemId>,
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Upper bound on units of one product, honouring reported stock.
fn cap_to_stock(product: &Product, wanted: u32) -> u32 {
    product.stock.map_or(wanted, |stock| wanted.min(stock))
}

/// The ordered line items of a cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLines {
    items: Vec<CartItem>,
}

impl CartLines {
    /// Build from server lines, dropping any with a zero quantity.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        Self {
            items: items.into_iter().filter(|i| i.quantity > 0).collect(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .map(|i| i.quantity)
            .fold(0u32, u32::saturating_add)
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn find(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product.id == product_id)
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// Returns the line's new quantity. The result is capped at the product's
    /// reported stock.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` for zero
    /// - `QuantityTooLarge` if the line would exceed [`MAX_LINE_QUANTITY`]
    /// - `OutOfStock` if the product is not purchasable
    /// - `StockLimit` if the line already holds all available units
    pub fn add(&mut self, product: Product, quantity: u32) -> Result<u32, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                max: MAX_LINE_QUANTITY,
            });
        }
        if !product.is_purchasable() {
            return Err(CartError::OutOfStock(product.id));
        }

        if let Some(line) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            let wanted = line.quantity.saturating_add(quantity);
            if wanted > MAX_LINE_QUANTITY {
                return Err(CartError::QuantityTooLarge {
                    max: MAX_LINE_QUANTITY,
                });
            }
            let capped = cap_to_stock(&product, wanted);
            if capped <= line.quantity {
                return Err(CartError::StockLimit {
                    available: capped,
                    product_id: product.id,
                });
            }
            // Refresh the embedded product so price and stock stay current.
            line.product = product;
            line.quantity = capped;
            return Ok(capped);
        }

        let capped = cap_to_stock(&product, quantity);
        self.items.push(CartItem {
            id: None,
            product,
            quantity: capped,
        });
        Ok(capped)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// Returns the stored quantity after capping at stock.
    ///
    /// # Errors
    ///
    /// - `NotInCart` when no line holds the product
    /// - `QuantityTooLarge` above [`MAX_LINE_QUANTITY`]
    /// - `StockLimit` when the product reports no stock left
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<u32, CartError> {
        if quantity == 0 {
            self.remove(product_id)?;
            return Ok(0);
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                max: MAX_LINE_QUANTITY,
            });
        }
        let line = self
            .items
            .iter_mut()
            .find(|i| &i.product.id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;
        let capped = cap_to_stock(&line.product, quantity);
        if capped == 0 {
            return Err(CartError::StockLimit {
                product_id: product_id.clone(),
                available: 0,
            });
        }
        line.quantity = capped;
        Ok(capped)
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns `NotInCart` when no line holds the product.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<CartItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|i| &i.product.id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Totals the server attached to its copy of the cart.
///
/// Every field is optional: endpoints disagree on which ones they send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTotals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

/// Local pricing rules used when the server did not supply a figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsPolicy {
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_fee: Decimal,
    pub express_fee: Decimal,
    pub overnight_fee: Decimal,
    pub tax_rate: Decimal,
}

impl Default for TotalsPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(50, 0),
            flat_shipping_fee: Decimal::new(599, 2),
            express_fee: Decimal::new(999, 2),
            overnight_fee: Decimal::new(1999, 2),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

impl TotalsPolicy {
    /// Shipping for a subtotal under this policy.
    ///
    /// Empty carts ship for free. Standard delivery is free at or above the
    /// threshold. Faster options always charge their fee.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal, delivery: DeliveryOption) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match delivery {
            DeliveryOption::Standard if subtotal >= self.free_shipping_threshold => Decimal::ZERO,
            DeliveryOption::Standard => self.flat_shipping_fee,
            DeliveryOption::Express => self.express_fee,
            DeliveryOption::Overnight => self.overnight_fee,
        }
    }

    /// Derive a summary from line items and whatever the server supplied.
    ///
    /// Server shipping only applies to standard delivery since that is the
    /// option the server cart was priced for.
    #[must_use]
    pub fn summarize(
        &self,
        lines: &CartLines,
        server: Option<&ServerTotals>,
        delivery: DeliveryOption,
    ) -> CartSummary {
        let floor = |d: Decimal| round_money(d.max(Decimal::ZERO));

        let subtotal = floor(lines.subtotal());
        let discount = floor(server.and_then(|s| s.discount).unwrap_or_default()).min(subtotal);
        let shipping = floor(
            server
                .and_then(|s| s.shipping)
                .filter(|_| delivery == DeliveryOption::Standard)
                .unwrap_or_else(|| self.shipping_for(subtotal, delivery)),
        );
        let tax = floor(
            server
                .and_then(|s| s.tax)
                .unwrap_or_else(|| (subtotal - discount) * self.tax_rate),
        );
        let total = floor(subtotal - discount + shipping + tax);

        CartSummary {
            subtotal,
            shipping,
            tax,
            discount,
            total,
            currency: CurrencyCode::USD,
            coupon_code: server.and_then(|s| s.coupon_code.clone()),
            item_count: lines.item_count(),
            delivery,
        }
    }
}

/// Derived cart totals, in the summary's currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub item_count: u32,
    pub delivery: DeliveryOption,
}

impl CartSummary {
    /// Re-express a base-currency summary in another currency.
    ///
    /// Each figure is converted on its own, so the converted total can differ
    /// from the converted sum by a cent. Display code shows the converted
    /// total as-is.
    #[must_use]
    pub fn converted(&self, rates: &ExchangeRates, target: CurrencyCode) -> Self {
        let conv = |d| rates.convert(d, target);
        let total = conv(self.total);
        Self {
            subtotal: conv(self.subtotal).amount,
            shipping: conv(self.shipping).amount,
            tax: conv(self.tax).amount,
            discount: conv(self.discount).amount,
            total: total.amount,
            currency: total.currency_code,
            coupon_code: self.coupon_code.clone(),
            item_count: self.item_count,
            delivery: self.delivery,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::product::tests::product;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_add_merges_lines() {
        let mut lines = CartLines::default();
        assert_eq!(lines.add(product("a", 1000), 2).unwrap(), 2);
        assert_eq!(lines.add(product("a", 1000), 1).unwrap(), 3);
        assert_eq!(lines.add(product("b", 250), 1).unwrap(), 1);
        assert_eq!(lines.items().len(), 2);
        assert_eq!(lines.item_count(), 4);
        assert_eq!(lines.subtotal(), dec(3250));
    }

    #[test]
    fn test_add_rejects_zero_and_out_of_stock() {
        let mut lines = CartLines::default();
        assert_eq!(lines.add(product("a", 100), 0), Err(CartError::InvalidQuantity));

        let mut sold_out = product("b", 100);
        sold_out.in_stock = false;
        assert!(matches!(lines.add(sold_out, 1), Err(CartError::OutOfStock(_))));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_add_caps_at_stock() {
        let mut limited = product("a", 100);
        limited.stock = Some(3);
        let mut lines = CartLines::default();
        assert_eq!(lines.add(limited.clone(), 5).unwrap(), 3);
        assert_eq!(
            lines.add(limited, 1),
            Err(CartError::StockLimit {
                product_id: ProductId::new("a"),
                available: 3
            })
        );
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut lines = CartLines::default();
        lines.add(product("a", 100), 1).unwrap();
        assert_eq!(lines.set_quantity(&ProductId::new("a"), 4).unwrap(), 4);
        assert_eq!(lines.set_quantity(&ProductId::new("a"), 0).unwrap(), 0);
        assert!(lines.is_empty());
        assert_eq!(
            lines.set_quantity(&ProductId::new("a"), 2),
            Err(CartError::NotInCart(ProductId::new("a")))
        );
        assert!(lines.remove(&ProductId::new("zzz")).is_err());
    }

    #[test]
    fn test_oversized_quantities_are_rejected() {
        let too_many = Err(CartError::QuantityTooLarge {
            max: MAX_LINE_QUANTITY,
        });
        let mut lines = CartLines::default();
        assert_eq!(lines.add(product("a", 100), u32::MAX), too_many);
        assert!(lines.is_empty());

        lines.add(product("a", 100), MAX_LINE_QUANTITY).unwrap();
        assert_eq!(lines.add(product("a", 100), 1), too_many);
        assert_eq!(lines.set_quantity(&ProductId::new("a"), u32::MAX), too_many);

        lines.add(product("b", 100), 1).unwrap();
        let summary = TotalsPolicy::default().summarize(&lines, None, DeliveryOption::Standard);
        assert_eq!(summary.item_count, MAX_LINE_QUANTITY + 1);
    }

    #[test]
    fn test_item_count_saturates() {
        let lines = CartLines::from_items(vec![
            CartItem {
                id: None,
                product: product("a", 100),
                quantity: u32::MAX,
            },
            CartItem {
                id: None,
                product: product("b", 100),
                quantity: 1,
            },
        ]);
        assert_eq!(lines.item_count(), u32::MAX);
    }

    #[test]
    fn test_set_quantity_with_no_stock_left() {
        let mut lines = CartLines::default();
        lines.add(product("a", 100), 2).unwrap();
        let mut refreshed = lines.clone().into_items();
        if let Some(line) = refreshed.first_mut() {
            line.product.stock = Some(0);
        }
        let mut lines = CartLines::from_items(refreshed);

        assert_eq!(
            lines.set_quantity(&ProductId::new("a"), 1),
            Err(CartError::StockLimit {
                product_id: ProductId::new("a"),
                available: 0
            })
        );
        assert_eq!(lines.find(&ProductId::new("a")).unwrap().quantity, 2);
    }

    #[test]
    fn test_from_items_drops_zero_quantity() {
        let lines = CartLines::from_items(vec![
            CartItem {
                id: Some(CartItemId::new("1")),
                product: product("a", 100),
                quantity: 0,
            },
            CartItem {
                id: Some(CartItemId::new("2")),
                product: product("b", 100),
                quantity: 2,
            },
        ]);
        assert_eq!(lines.items().len(), 1);
    }

    #[test]
    fn test_summary_local_policy_below_threshold() {
        let mut lines = CartLines::default();
        lines.add(product("a", 2000), 1).unwrap();
        let summary = TotalsPolicy::default().summarize(&lines, None, DeliveryOption::Standard);
        assert_eq!(summary.subtotal, dec(2000));
        assert_eq!(summary.shipping, dec(599));
        assert_eq!(summary.tax, dec(160));
        assert_eq!(summary.discount, Decimal::ZERO);
        assert_eq!(summary.total, dec(2759));
        assert_eq!(summary.item_count, 1);
    }

    #[test]
    fn test_summary_free_shipping_at_threshold() {
        let mut lines = CartLines::default();
        lines.add(product("a", 2500), 2).unwrap();
        let summary = TotalsPolicy::default().summarize(&lines, None, DeliveryOption::Standard);
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.total, dec(5400));

        let express = TotalsPolicy::default().summarize(&lines, None, DeliveryOption::Express);
        assert_eq!(express.shipping, dec(999));
    }

    #[test]
    fn test_summary_prefers_server_fields() {
        let mut lines = CartLines::default();
        lines.add(product("a", 1000), 3).unwrap();
        let server = ServerTotals {
            shipping: Some(dec(250)),
            tax: Some(dec(100)),
            discount: Some(dec(500)),
            coupon_code: Some("GLOW10".to_string()),
        };
        let summary =
            TotalsPolicy::default().summarize(&lines, Some(&server), DeliveryOption::Standard);
        assert_eq!(summary.total, dec(3000 - 500 + 250 + 100));
        assert_eq!(summary.coupon_code.as_deref(), Some("GLOW10"));

        let overnight =
            TotalsPolicy::default().summarize(&lines, Some(&server), DeliveryOption::Overnight);
        assert_eq!(overnight.shipping, dec(1999));
    }

    #[test]
    fn test_summary_clamps_negatives() {
        let mut lines = CartLines::default();
        lines.add(product("a", 1000), 1).unwrap();
        let server = ServerTotals {
            shipping: Some(dec(-300)),
            tax: Some(dec(-50)),
            discount: Some(dec(5000)),
            coupon_code: None,
        };
        let summary =
            TotalsPolicy::default().summarize(&lines, Some(&server), DeliveryOption::Standard);
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.tax, Decimal::ZERO);
        assert_eq!(summary.discount, dec(1000));
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_empty_cart_summary_is_zero() {
        let summary =
            TotalsPolicy::default().summarize(&CartLines::default(), None, DeliveryOption::Express);
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.shipping, Decimal::ZERO);
    }

    #[test]
    fn test_summary_conversion() {
        let mut lines = CartLines::default();
        lines.add(product("a", 10000), 1).unwrap();
        let summary = TotalsPolicy::default().summarize(&lines, None, DeliveryOption::Standard);
        let eur = summary.converted(&ExchangeRates::default(), CurrencyCode::EUR);
        assert_eq!(eur.currency, CurrencyCode::EUR);
        assert_eq!(eur.subtotal, dec(9200));
        assert_eq!(eur.total, dec(9936));
    }
}
