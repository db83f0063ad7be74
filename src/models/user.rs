//! User model and shopping cart.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Authorization role carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Trainer,
    Admin,
}

/// One product line in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    pub username: String,
    /// Unique email address, used for confirmations
    pub email: String,
    #[serde(default)]
    pub role: Role,
    /// Product lines awaiting checkout
    #[serde(default)]
    pub cart_items: Vec<CartLine>,
    /// Profile picture URL
    pub profile_image: Option<String>,
    /// Set once an admin has promoted this user to trainer
    #[serde(default)]
    pub has_trainer_profile: bool,
    /// When the account was created (ISO 8601)
    pub created_at: String,
}

impl User {
    /// Add `quantity` of a product, merging with an existing line for the same product.
    pub fn add_to_cart(&mut self, product_id: &str, quantity: u32) {
        match self
            .cart_items
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.cart_items.push(CartLine {
                product_id: product_id.to_string(),
                quantity,
            }),
        }
    }

    /// Remove the line for a product. Returns `false` if it was not in the cart.
    pub fn remove_from_cart(&mut self, product_id: &str) -> bool {
        let before = self.cart_items.len();
        self.cart_items.retain(|line| line.product_id != product_id);
        self.cart_items.len() != before
    }
}
