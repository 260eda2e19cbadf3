//! Shopping cart lines sent with purchases.

use rust_decimal::Decimal;

use crate::{
    error::{IpcError, Result},
    validate::{is_valid_amount, is_valid_cart_quantity},
};

/// Kind of cart line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CartItemType {
    /// Regular article.
    #[default]
    Article,
    /// Delivery fee.
    Delivery,
    /// Discount; the price is always stored negative.
    Discount,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Article name.
    pub name: String,
    /// Number of units, at least 1.
    pub quantity: u32,
    /// Unit price.
    pub price: Decimal,
    /// Line kind.
    pub kind: CartItemType,
}

impl CartItem {
    /// `price * quantity`.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Ordered cart lines.
///
/// # Examples
///
/// ```
/// use ipc_sdk::operations::{Cart, CartItemType};
/// use rust_decimal::Decimal;
///
/// let mut cart = Cart::new();
/// cart.add("Book", 2, Decimal::new(1050, 2), CartItemType::Article)?
///     .add("Shipping", 1, Decimal::new(500, 2), CartItemType::Delivery)?
///     .add("Coupon", 1, Decimal::new(300, 2), CartItemType::Discount)?;
///
/// assert_eq!(cart.total(), Decimal::new(2300, 2));
/// assert_eq!(cart.len(), 3);
/// # Ok::<(), ipc_sdk::IpcError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends a line.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Validation`] for an empty name, zero quantity, or a zero or
    /// malformed price.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        quantity: u32,
        price: Decimal,
        kind: CartItemType,
    ) -> Result<&mut Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(IpcError::Validation("Invalid cart item name".to_owned()));
        }
        if !is_valid_cart_quantity(quantity) {
            return Err(IpcError::Validation("Invalid cart item quantity".to_owned()));
        }
        if price.is_zero() || !is_valid_amount(&price.to_string()) {
            return Err(IpcError::Validation("Invalid cart item price".to_owned()));
        }

        let price = if kind == CartItemType::Discount { -price.abs() } else { price };
        self.items.push(CartItem { name, quantity, price, kind });
        Ok(self)
    }

    /// Sum of all line amounts.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::amount).sum()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`IpcError::Validation`] if the cart is empty.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(IpcError::Validation("Missing cart items".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_price_is_negative() {
        let mut cart = Cart::new();
        cart.add("Coupon", 1, Decimal::new(-250, 2), CartItemType::Discount).unwrap();
        cart.add("Coupon", 1, Decimal::new(250, 2), CartItemType::Discount).unwrap();
        assert!(cart.items().iter().all(|item| item.price == Decimal::new(-250, 2)));
        assert_eq!(cart.total(), Decimal::new(-500, 2));
    }

    #[test]
    fn test_line_amount_and_total() {
        let mut cart = Cart::new();
        cart.add("Pen", 3, Decimal::new(199, 2), CartItemType::Article).unwrap();
        assert_eq!(cart.items()[0].amount().to_string(), "5.97");
        assert_eq!(cart.total().to_string(), "5.97");
    }

    #[test]
    fn test_rejected_lines() {
        let mut cart = Cart::new();
        for (name, quantity, price, expected) in [
            ("", 1, Decimal::ONE, "Invalid cart item name"),
            ("Pen", 0, Decimal::ONE, "Invalid cart item quantity"),
            ("Pen", 1, Decimal::ZERO, "Invalid cart item price"),
            ("Pen", 1, Decimal::new(1001, 3), "Invalid cart item price"),
        ] {
            let err = cart.add(name, quantity, price, CartItemType::Article).unwrap_err();
            assert!(matches!(&err, IpcError::Validation(msg) if msg == expected), "{err}");
        }
        assert!(cart.is_empty());
    }

    #[test]
    fn test_empty_cart_invalid() {
        let err = Cart::new().validate().unwrap_err();
        assert!(matches!(err, IpcError::Validation(msg) if msg == "Missing cart items"));
    }
}
