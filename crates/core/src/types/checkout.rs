//! Checkout input and saved addresses.

use serde::{Deserialize, Serialize};

use super::contact::{ContactError, Email, Phone};
use super::id::AddressId;

/// How fast an order ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOption {
    #[default]
    Standard,
    Express,
    Overnight,
}

/// Accepted payment methods. Payment capture itself happens on the API side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    Wallet,
    CashOnDelivery,
}

/// Errors validating checkout details.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShippingError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid contact details: {0}")]
    Contact(#[from] ContactError),
}

/// Contact and address details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub delivery_option: DeliveryOption,
}

impl ShippingDetails {
    /// Trim every field and check that the required ones are present.
    ///
    /// Email and phone are normalized through [`Email`] and [`Phone`].
    ///
    /// # Errors
    ///
    /// Returns the first missing field or the contact parse error.
    pub fn validated(mut self) -> Result<Self, ShippingError> {
        let required = [
            ("full name", &mut self.full_name),
            ("address", &mut self.address_line1),
            ("city", &mut self.city),
            ("state", &mut self.state),
            ("postal code", &mut self.postal_code),
            ("country", &mut self.country),
        ];
        for (label, field) in required {
            let trimmed = field.trim();
            if trimmed.is_empty() {
                return Err(ShippingError::Missing(label));
            }
            *field = trimmed.to_owned();
        }
        self.address_line2 = self
            .address_line2
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        self.email = Email::parse(&self.email)?.as_str().to_owned();
        self.phone = Phone::parse(&self.phone)?.as_str().to_owned();
        Ok(self)
    }
}

/// A saved address on the customer's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn details() -> ShippingDetails {
        ShippingDetails {
            full_name: " Ada Lovelace ".to_string(),
            email: "ADA@example.com".to_string(),
            phone: "+44 20 7946 0958".to_string(),
            address_line1: "12 St James's Square".to_string(),
            address_line2: Some("   ".to_string()),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            postal_code: "SW1Y 4JH".to_string(),
            country: "GB".to_string(),
            delivery_option: DeliveryOption::Express,
        }
    }

    #[test]
    fn test_validated_normalizes() {
        let d = details().validated().unwrap();
        assert_eq!(d.full_name, "Ada Lovelace");
        assert_eq!(d.email, "ada@example.com");
        assert_eq!(d.phone, "+442079460958");
        assert_eq!(d.address_line2, None);
    }

    #[test]
    fn test_validated_missing_field() {
        let mut d = details();
        d.city = " ".to_string();
        assert_eq!(d.validated(), Err(ShippingError::Missing("city")));
    }

    #[test]
    fn test_validated_bad_email() {
        let mut d = details();
        d.email = "nope".to_string();
        assert!(matches!(d.validated(), Err(ShippingError::Contact(_))));
    }

    #[test]
    fn test_delivery_option_wire_format() {
        let d: ShippingDetails = serde_json::from_value(serde_json::json!({
            "fullName": "A", "email": "a@b.co", "phone": "5550100999",
            "addressLine1": "1 Road", "city": "C", "state": "S",
            "postalCode": "1", "country": "US", "deliveryOption": "overnight"
        }))
        .unwrap();
        assert_eq!(d.delivery_option, DeliveryOption::Overnight);
    }
}
