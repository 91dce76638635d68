//! Cart commands.
//!
//! All of these go through the cart store, so a failed change is followed by
//! a reload and the printed cart is always what the server holds.

use sheshape_client::services::CartService;
use sheshape_client::types::Cart;
use sheshape_client::{ClientError, Storefront};
use sheshape_core::ProductId;

use super::money;

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for item in &cart.items {
        let name = match item.name() {
            "" => format!("Product {}", item.product_id),
            name => name.to_string(),
        };
        let flag = if item.available { "" } else { "  (unavailable)" };
        println!(
            "{:>6}  {:<36} x{:<3} {}{flag}",
            item.product_id,
            name,
            item.quantity,
            money(item.total_price)
        );
    }
    let units: u32 = cart.items.iter().map(|item| item.quantity).sum();
    println!("{:-<64}", "");
    println!("{units:>3} item(s){:>45}", money(cart.total_price));
}

/// Print the cart loaded while resolving the session.
pub fn show(storefront: &Storefront) {
    print_cart(&storefront.cart().cart());
}

/// # Errors
///
/// Returns an error if nobody is signed in or the server rejects the change.
pub async fn add(
    storefront: &Storefront,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), ClientError> {
    let cart = storefront.cart().add_item(product_id, quantity).await?;
    print_cart(&cart);
    Ok(())
}

/// # Errors
///
/// Returns an error if nobody is signed in or the server rejects the change.
pub async fn update(
    storefront: &Storefront,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), ClientError> {
    let cart = storefront
        .cart()
        .update_quantity(product_id, quantity)
        .await?;
    print_cart(&cart);
    Ok(())
}

/// # Errors
///
/// Returns an error if nobody is signed in or the server rejects the change.
pub async fn remove(storefront: &Storefront, product_id: ProductId) -> Result<(), ClientError> {
    let cart = storefront.cart().remove_item(product_id).await?;
    print_cart(&cart);
    Ok(())
}

/// # Errors
///
/// Returns an error if nobody is signed in or the server rejects the change.
pub async fn clear(storefront: &Storefront) -> Result<(), ClientError> {
    storefront.cart().clear_cart().await
}

/// # Errors
///
/// Returns [`ClientError::InvalidCart`] when some lines can no longer be
/// bought.
#[allow(clippy::print_stdout)]
pub async fn validate(storefront: &Storefront) -> Result<(), ClientError> {
    if !storefront.cart().validate_cart().await {
        let cart = storefront.cart().cart();
        for item in cart.unavailable_items() {
            println!("unavailable: {} (product {})", item.name(), item.product_id);
        }
        return Err(ClientError::InvalidCart);
    }
    println!("All items are available");
    Ok(())
}

/// # Errors
///
/// Returns an error if the count cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn count(storefront: &Storefront) -> Result<(), ClientError> {
    let count = CartService::new(storefront.api().clone())
        .item_count()
        .await?;
    println!("{count}");
    Ok(())
}
