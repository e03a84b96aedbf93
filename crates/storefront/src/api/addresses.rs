//! Saved address endpoints.

use lumen_core::{Address, AddressId};
use reqwest::Method;
use tracing::instrument;

use super::envelope;
use super::{ApiClient, ApiError, Auth, InvalidInput};

/// Check the fields the API requires on an address.
///
/// # Errors
///
/// Returns the first blank required field.
pub fn validate_address(address: &Address) -> Result<(), InvalidInput> {
    let required = [
        (&address.full_name, "full name is required"),
        (&address.address_line1, "address is required"),
        (&address.city, "city is required"),
        (&address.postal_code, "postal code is required"),
        (&address.country, "country is required"),
    ];
    for (value, message) in required {
        if value.trim().is_empty() {
            return Err(InvalidInput(message));
        }
    }
    Ok(())
}

impl ApiClient {
    /// The customer's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn list_addresses(&self, token: &str) -> Result<Vec<Address>, ApiError> {
        let body = self.get(&["addresses"], &[], Auth::Bearer(token)).await?;
        let addresses: Vec<Address> = match body.get("addresses") {
            Some(inner) => envelope::list(inner),
            None => envelope::list(&body),
        };
        Ok(addresses)
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn create_address(
        &self,
        token: &str,
        address: &Address,
    ) -> Result<Option<Address>, ApiError> {
        let body = self
            .call(Method::POST, &["addresses"], &[], Some(address), Auth::Bearer(token))
            .await?;
        Ok(envelope::single(&body, &["address"]))
    }

    /// Replace a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, address), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        token: &str,
        id: &AddressId,
        address: &Address,
    ) -> Result<Option<Address>, ApiError> {
        let body = self
            .call(
                Method::PUT,
                &["addresses", id.as_str()],
                &[],
                Some(address),
                Auth::Bearer(token),
            )
            .await?;
        Ok(envelope::single(&body, &["address"]))
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(address_id = %id))]
    pub async fn delete_address(&self, token: &str, id: &AddressId) -> Result<(), ApiError> {
        self.call::<()>(
            Method::DELETE,
            &["addresses", id.as_str()],
            &[],
            None,
            Auth::Bearer(token),
        )
        .await?;
        Ok(())
    }

    /// Make an address the default for checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(address_id = %id))]
    pub async fn set_default_address(&self, token: &str, id: &AddressId) -> Result<(), ApiError> {
        self.call::<()>(
            Method::POST,
            &["addresses", id.as_str(), "default"],
            &[],
            None,
            Auth::Bearer(token),
        )
        .await?;
        Ok(())
    }
}
