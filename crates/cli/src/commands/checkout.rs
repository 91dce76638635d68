//! Place an order from a YAML checkout form.
//!
//! # File format
//!
//! Keys follow the backend's JSON field names:
//!
//! ```yaml
//! paymentMethod: CREDIT_CARD
//! shippingAddress:
//!   firstName: Jane
//!   lastName: Doe
//!   phone: "+1 512 555 0100"
//!   street: 1 Main St
//!   city: Austin
//!   state: TX
//!   zipCode: "73301"
//!   country: USA
//! customerNotes: Leave at the door
//! paymentDetails:
//!   cardHolderName: Jane Doe
//!   cardNumber: "4111 1111 1111 1111"
//!   expiryMonth: 12
//!   expiryYear: 2030
//!   cvv: "123"
//! ```

use std::path::Path;

use sheshape_client::Storefront;
use sheshape_client::types::CheckoutRequest;

use super::{CommandError, money};

/// Read a checkout form.
///
/// Card numbers may be written with spaces or dashes.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_request(path: &Path) -> Result<CheckoutRequest, CommandError> {
    let content = std::fs::read_to_string(path).map_err(|source| CommandError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    parse_request(&content)
}

fn parse_request(content: &str) -> Result<CheckoutRequest, CommandError> {
    let mut request: CheckoutRequest = serde_yaml::from_str(content)?;
    if let Some(details) = request.payment_details.as_mut()
        && let Some(number) = details.card_number.as_mut()
    {
        number.retain(|c| c != ' ' && c != '-');
    }
    Ok(request)
}

/// Validate, submit and print the order.
///
/// # Errors
///
/// Returns an error if the file is unusable or no order was placed. The
/// reason has already been reported as a notice.
#[allow(clippy::print_stdout)]
pub async fn run(storefront: &Storefront, path: &Path) -> Result<(), CommandError> {
    let request = load_request(path)?;

    let Some(order) = storefront.checkout().submit(&request).await else {
        let reason = storefront
            .checkout()
            .error()
            .unwrap_or_else(|| "Failed to place order".to_string());
        return Err(CommandError::CheckoutFailed(reason));
    };

    println!("Order #{} placed", order.order_number);
    println!("  status: {}", order.status);
    println!("  items:  {}", order.item_count());
    println!("  total:  {}", money(order.total_amount).trim_start());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sheshape_core::PaymentMethod;

    use super::*;

    #[test]
    fn test_parse_checkout_form() {
        let yaml = r#"
paymentMethod: CREDIT_CARD
shippingAddress:
  firstName: Jane
  lastName: Doe
  phone: "+1 512 555 0100"
  street: 1 Main St
  city: Austin
  state: TX
  zipCode: "73301"
  country: USA
paymentDetails:
  cardHolderName: Jane Doe
  cardNumber: "4111 1111-1111 1111"
  expiryMonth: 3
  expiryYear: 2030
  cvv: "123"
"#;
        let request = parse_request(yaml).unwrap();

        assert_eq!(request.payment_method, PaymentMethod::CreditCard);
        assert_eq!(request.shipping_address.city, "Austin");
        assert!(request.billing_address.is_none());
        let details = request.payment_details.unwrap();
        assert_eq!(details.card_number.as_deref(), Some("4111111111111111"));
        assert_eq!(details.expiry_month, Some(3));
        assert_eq!(details.expiry_year, Some(2030));
    }

    #[test]
    fn test_unknown_payment_method_is_rejected() {
        let yaml = "paymentMethod: BARTER\nshippingAddress: {}\n";
        assert!(matches!(
            parse_request(yaml),
            Err(CommandError::InvalidCheckoutFile(_))
        ));
    }
}
