//! Order history commands.

use sheshape_client::Storefront;
use sheshape_client::api::ApiError;
use sheshape_client::services::OrderQuery;
use sheshape_client::types::Order;
use sheshape_core::{OrderId, PaymentStatus};

use super::{CommandError, money};

/// Refuse locally instead of sending a cancellation the backend will reject.
fn ensure_cancellable(order: &Order) -> Result<(), CommandError> {
    if order.can_cancel() {
        return Ok(());
    }
    let status = if order.payment_status == PaymentStatus::Refunded {
        format!("{}, payment {}", order.status, order.payment_status)
    } else {
        order.status.to_string()
    };
    Err(CommandError::NotCancellable {
        order_number: order.order_number.clone(),
        status,
    })
}

#[allow(clippy::print_stdout)]
fn print_summary(order: &Order) {
    let placed = order
        .created_at
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    println!(
        "{:>6}  {:<20} {:<10} {:<16} {:>3} item(s) {}",
        order.id,
        order.order_number,
        placed,
        order.status,
        order.item_count(),
        money(order.total_amount)
    );
}

#[allow(clippy::print_stdout)]
fn print_detail(order: &Order) {
    println!("Order #{} (id {})", order.order_number, order.id);
    println!("  status:  {}", order.status);
    println!("  payment: {}", order.payment_status);
    if order.can_cancel() {
        println!("  cancellable: yes");
    }
    if let Some(method) = order.payment_method {
        println!("  method:  {}", method.label());
    }
    if let Some(tracking) = &order.tracking_number {
        println!("  tracking: {tracking}");
    }
    if let Some(eta) = order.estimated_delivery_date {
        println!("  estimated delivery: {}", eta.format("%Y-%m-%d"));
    }
    println!();
    for item in &order.items {
        println!(
            "  {:<40} x{:<3} {}",
            item.product_name,
            item.quantity,
            money(item.total_price)
        );
    }
    for (label, amount) in [
        ("subtotal", order.subtotal),
        ("shipping", order.shipping_amount),
        ("tax", order.tax_amount),
        ("discount", order.discount_amount),
    ] {
        if let Some(amount) = amount {
            println!("  {label:>48} {}", money(amount));
        }
    }
    println!("  {:>48} {}", "total", money(order.total_amount));
    if let Some(address) = &order.shipping_address {
        println!();
        println!("Ship to:");
        for line in address.lines() {
            println!("  {line}");
        }
    }
}

/// # Errors
///
/// Returns an error if the page cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn list(storefront: &Storefront, query: &OrderQuery) -> Result<(), ApiError> {
    let page = storefront.orders().my_orders(query).await?;
    if page.content.is_empty() {
        println!("No orders yet");
        return Ok(());
    }
    page.content.iter().for_each(print_summary);
    println!(
        "page {} of {} ({} orders)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    );
    Ok(())
}

/// # Errors
///
/// Returns an error if the orders cannot be fetched.
pub async fn recent(storefront: &Storefront, limit: u32) -> Result<(), ApiError> {
    let orders = storefront.orders().recent_orders(limit).await?;
    orders.iter().for_each(print_summary);
    Ok(())
}

/// # Errors
///
/// Returns an error if the order cannot be fetched.
pub async fn show(storefront: &Storefront, id: OrderId) -> Result<(), ApiError> {
    let order = storefront.orders().get_order(id).await?;
    print_detail(&order);
    Ok(())
}

/// # Errors
///
/// Returns an error if the order can no longer be cancelled or the backend
/// refuses the cancellation.
#[allow(clippy::print_stdout)]
pub async fn cancel(
    storefront: &Storefront,
    id: OrderId,
    reason: Option<&str>,
) -> Result<(), CommandError> {
    ensure_cancellable(&storefront.orders().get_order(id).await?)?;
    let order = storefront.orders().cancel_order(id, reason).await?;
    println!("Order #{} is now {}", order.order_number, order.status);
    Ok(())
}

/// # Errors
///
/// Returns an error if no order has this number.
pub async fn track(storefront: &Storefront, order_number: &str) -> Result<(), ApiError> {
    let order = storefront.orders().track_order(order_number).await?;
    print_detail(&order);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(status: &str, payment: &str) -> Order {
        serde_yaml::from_str(&format!(
            "id: 5\norderNumber: SS-000005\nstatus: {status}\npaymentStatus: {payment}\n"
        ))
        .unwrap()
    }

    #[test]
    fn test_processing_order_can_be_cancelled() {
        assert!(ensure_cancellable(&order("PROCESSING", "COMPLETED")).is_ok());
    }

    #[test]
    fn test_shipped_order_is_refused() {
        let err = ensure_cancellable(&order("SHIPPED", "COMPLETED")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Order #SS-000005 cannot be cancelled (SHIPPED)"
        );
    }

    #[test]
    fn test_refunded_order_is_refused() {
        let err = ensure_cancellable(&order("CONFIRMED", "REFUNDED")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Order #SS-000005 cannot be cancelled (CONFIRMED, payment REFUNDED)"
        );
    }
}
