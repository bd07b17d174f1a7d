//! Cart model.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s keyed by product id. Order is
//! insertion order and survives serialization unchanged. The structural
//! invariants (one line per product, every line holds at least one unit) are
//! checked on every change and on deserialization, so a `Cart` value can never
//! hold a duplicate or an empty line. Stock limits depend on the network and
//! are enforced by the cart manager, not here.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// A change or snapshot that would break a cart invariant.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidCart {
    /// Two lines for the same product.
    #[error("product {0} appears more than once")]
    DuplicateProduct(ProductId),
    /// A line with zero units.
    #[error("product {0} has an amount of zero")]
    ZeroAmount(ProductId),
    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    UnknownProduct(ProductId),
}

/// One product line in the cart.
///
/// Serialized as the product record plus an `amount` field, which is the shape
/// stored in the durable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier, unique within a cart.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Image URL.
    pub image: String,
    /// Units selected. Always at least one.
    pub amount: u32,
}

impl CartItem {
    /// Create a line for `product` holding `amount` units.
    #[must_use]
    pub fn new(product: Product, amount: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount,
        }
    }

    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * self.amount
    }
}

/// The shopper's ordered set of selected products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line for `id`.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Units of `id` currently selected, or zero.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> u32 {
        self.get(id).map_or(0, |item| item.amount)
    }

    /// Units per product, as shown next to each product in a listing.
    #[must_use]
    pub fn amounts_by_product(&self) -> BTreeMap<ProductId, u32> {
        self.items.iter().map(|item| (item.id, item.amount)).collect()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_amount(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Append a new line.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCart::DuplicateProduct`] if the product already has a
    /// line, or [`InvalidCart::ZeroAmount`] if the line is empty.
    pub fn push(&mut self, item: CartItem) -> Result<(), InvalidCart> {
        if item.amount == 0 {
            return Err(InvalidCart::ZeroAmount(item.id));
        }
        if self.get(item.id).is_some() {
            return Err(InvalidCart::DuplicateProduct(item.id));
        }
        self.items.push(item);
        Ok(())
    }

    /// Replace the amount of an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCart::ZeroAmount`] for `amount == 0` (use
    /// [`Cart::remove`] instead) or [`InvalidCart::UnknownProduct`] if the
    /// product has no line.
    pub fn set_amount(&mut self, id: ProductId, amount: u32) -> Result<(), InvalidCart> {
        if amount == 0 {
            return Err(InvalidCart::ZeroAmount(id));
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(InvalidCart::UnknownProduct(id))?;
        item.amount = amount;
        Ok(())
    }

    /// Remove the line for `id`, returning it if it existed.
    pub fn remove(&mut self, id: ProductId) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = InvalidCart;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        let mut cart = Self::new();
        for item in items {
            cart.push(item)?;
        }
        Ok(cart)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, amount: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            title: format!("Sneaker {id}"),
            price: Price::from_cents(10_000),
            image: format!("https://example.com/{id}.jpg"),
            amount,
        }
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut cart = Cart::new();
        cart.push(item(3, 1)).unwrap();
        cart.push(item(1, 1)).unwrap();
        cart.push(item(2, 1)).unwrap();

        let ids: Vec<i32> = cart.items().iter().map(|i| i.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_push_rejects_duplicate() {
        let mut cart = Cart::new();
        cart.push(item(1, 1)).unwrap();

        assert_eq!(
            cart.push(item(1, 2)),
            Err(InvalidCart::DuplicateProduct(ProductId::new(1)))
        );
        assert_eq!(cart.amount_of(ProductId::new(1)), 1);
    }

    #[test]
    fn test_push_rejects_zero_amount() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.push(item(1, 0)),
            Err(InvalidCart::ZeroAmount(ProductId::new(1)))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_amount() {
        let mut cart = Cart::try_from(vec![item(1, 1)]).unwrap();
        cart.set_amount(ProductId::new(1), 4).unwrap();
        assert_eq!(cart.amount_of(ProductId::new(1)), 4);

        assert_eq!(
            cart.set_amount(ProductId::new(9), 1),
            Err(InvalidCart::UnknownProduct(ProductId::new(9)))
        );
        assert_eq!(
            cart.set_amount(ProductId::new(1), 0),
            Err(InvalidCart::ZeroAmount(ProductId::new(1)))
        );
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::try_from(vec![item(1, 2), item(2, 1)]).unwrap();

        let removed = cart.remove(ProductId::new(1)).unwrap();
        assert_eq!(removed.amount, 2);
        assert!(cart.get(ProductId::new(1)).is_none());
        assert!(cart.remove(ProductId::new(1)).is_none());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_totals() {
        let cart = Cart::try_from(vec![item(1, 2), item(2, 3)]).unwrap();

        assert_eq!(cart.total_amount(), 5);
        assert_eq!(cart.subtotal(), Decimal::new(500, 0));

        let amounts = cart.amounts_by_product();
        assert_eq!(amounts.get(&ProductId::new(1)), Some(&2));
        assert_eq!(amounts.get(&ProductId::new(2)), Some(&3));
    }

    #[test]
    fn test_snapshot_shape() {
        let cart = Cart::try_from(vec![item(1, 2)]).unwrap();
        let json = serde_json::to_value(&cart).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{
                "id": 1,
                "title": "Sneaker 1",
                "price": 100.0,
                "image": "https://example.com/1.jpg",
                "amount": 2
            }])
        );

        let restored: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let json = r#"[
            {"id":1,"title":"a","price":1,"image":"a","amount":1},
            {"id":1,"title":"a","price":1,"image":"a","amount":2}
        ]"#;
        let err = serde_json::from_str::<Cart>(json).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_deserialize_rejects_zero_amount() {
        let json = r#"[{"id":1,"title":"a","price":1,"image":"a","amount":0}]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }
}
