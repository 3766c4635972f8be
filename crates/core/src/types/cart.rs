//! Cart and cart line types.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s with at most one entry per
//! product. Quantities are `NonZeroU32`: an item that would drop to zero is
//! removed instead, so a zero-quantity line has no representation.
//!
//! The serialized form is a bare JSON array of products, each carrying its
//! `amount`:
//!
//! ```json
//! [{ "id": 1, "title": "Tênis", "price": 179.9, "image": "...", "amount": 2 }]
//! ```

use std::collections::HashSet;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize, Serializer};

use super::id::ProductId;
use super::product::Product;

/// Errors raised when cart data breaks a structural invariant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartDataError {
    /// The same product appears in more than one line.
    #[error("product {0} appears more than once in the cart")]
    DuplicateProduct(ProductId),
}

/// One distinct product in the cart.
///
/// The product metadata is a snapshot taken when the product first entered
/// the cart; later quantity changes never refresh it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: NonZeroU32,
}

impl CartItem {
    /// Create a line for `product` with a quantity of one.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self {
            product,
            amount: NonZeroU32::MIN,
        }
    }

    /// The product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }
}

/// The shopping cart: ordered, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<CartItem>")]
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

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the line for `id`, if any.
    #[must_use]
    pub fn position(&self, id: ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.product_id() == id)
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id() == id)
    }

    pub fn get_mut(&mut self, id: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.product_id() == id)
    }

    /// Append a new line.
    ///
    /// # Errors
    ///
    /// Returns `CartDataError::DuplicateProduct` if the cart already has a
    /// line for the item's product; quantity changes go through
    /// [`Cart::get_mut`] instead.
    pub fn push(&mut self, item: CartItem) -> Result<(), CartDataError> {
        if self.position(item.product_id()).is_some() {
            return Err(CartDataError::DuplicateProduct(item.product_id()));
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove and return the line at `index`, or `None` if out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<CartItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.amount.get()))
            .sum()
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartDataError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.product_id()) {
                return Err(CartDataError::DuplicateProduct(item.product_id()));
            }
        }
        Ok(Self { items })
    }
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
