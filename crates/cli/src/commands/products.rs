//! Catalog commands.

use sheshape_client::Storefront;
use sheshape_client::api::ApiError;
use sheshape_client::services::ProductQuery;
use sheshape_client::types::Product;
use sheshape_core::ProductId;

use super::money;

fn stock_label(product: &Product) -> &'static str {
    if product.in_stock() { "in stock" } else { "sold out" }
}

/// Print one page of the catalog.
///
/// # Errors
///
/// Returns an error if the page cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn list(storefront: &Storefront, query: &ProductQuery) -> Result<(), ApiError> {
    let page = storefront.products().list(query).await?;

    for product in &page.content {
        println!(
            "{:>6}  {:<36} {}  {}",
            product.id,
            product.name,
            money(product.effective_price()),
            stock_label(product)
        );
    }
    println!(
        "page {} of {} ({} products)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    );
    Ok(())
}

/// Print one product.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn show(storefront: &Storefront, id: ProductId) -> Result<(), ApiError> {
    let product = storefront.products().get(id).await?;

    println!("{} (id {})", product.name, product.id);
    match product.discount_price {
        Some(discount) if discount < product.price => {
            println!("  price: {} (was {})", discount.display(), product.price.display());
        }
        _ => println!("  price: {}", product.price.display()),
    }
    println!("  stock: {}", stock_label(&product));
    if !product.categories.is_empty() {
        println!("  categories: {}", product.categories.join(", "));
    }
    if let Some(image) = product.main_image() {
        println!("  image: {}", image.image_url);
    }
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("{description}");
    }
    Ok(())
}
