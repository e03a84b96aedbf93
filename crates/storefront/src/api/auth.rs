//! One-time-code sign-in and profile endpoints.

use lumen_core::{LoginIdentifier, OtpCode, User};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::envelope;
use super::{ApiClient, ApiError, Auth};

/// Keys a verify response may put the bearer token under.
const TOKEN_KEYS: &[&str] = &["token", "accessToken", "access_token"];

/// Result of a successful code verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
}

/// Fields a customer may change on their profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    #[serde(flatten)]
    identifier: &'a LoginIdentifier,
    code: &'a str,
}

fn find_token(body: &Value) -> Option<String> {
    let scopes = [Some(body), body.get("data")];
    scopes.into_iter().flatten().find_map(|scope| {
        TOKEN_KEYS
            .iter()
            .find_map(|key| scope.get(*key)?.as_str())
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned)
    })
}

/// Parse a verify response into a token and user.
#[must_use]
pub fn parse_grant(body: &Value) -> Option<AuthGrant> {
    let token = find_token(body)?;
    let user: User = envelope::single(body, &["user", "customer"])?;
    Some(AuthGrant { token, user })
}

impl ApiClient {
    /// Ask the API to send a sign-in code.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn request_otp(&self, identifier: &LoginIdentifier) -> Result<(), ApiError> {
        self.call(
            Method::POST,
            &["auth", "otp", "request"],
            &[],
            Some(identifier),
            Auth::Anonymous,
        )
        .await?;
        Ok(())
    }

    /// Exchange a sign-in code for a bearer token.
    ///
    /// A success body without a token is treated as a rejected code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is rejected or the API request fails.
    #[instrument(skip_all)]
    pub async fn verify_otp(
        &self,
        identifier: &LoginIdentifier,
        code: &OtpCode,
    ) -> Result<AuthGrant, ApiError> {
        let body = VerifyBody {
            identifier,
            code: code.as_str(),
        };
        let response = self
            .call(
                Method::POST,
                &["auth", "otp", "verify"],
                &[],
                Some(&body),
                Auth::Anonymous,
            )
            .await?;
        parse_grant(&response).ok_or(ApiError::Unauthorized)
    }

    /// Revoke a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.call::<()>(Method::POST, &["auth", "logout"], &[], None, Auth::Bearer(token))
            .await?;
        Ok(())
    }

    /// The signed-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid.
    #[instrument(skip_all)]
    pub async fn me(&self, token: &str) -> Result<Option<User>, ApiError> {
        let body = self.get(&["auth", "me"], &[], Auth::Bearer(token)).await?;
        Ok(envelope::single(&body, &["user", "customer"]))
    }

    /// Update the signed-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn update_me(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, ApiError> {
        let body = self
            .call(Method::PUT, &["auth", "me"], &[], Some(update), Auth::Bearer(token))
            .await?;
        Ok(envelope::single(&body, &["user", "customer"]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lumen_core::UserId;
    use serde_json::json;

    #[test]
    fn test_parse_grant_shapes() {
        let bodies = [
            json!({"token": "t-1", "user": {"id": 9, "name": "Ada"}}),
            json!({"data": {"accessToken": "t-1", "user": {"id": 9, "name": "Ada"}}}),
            json!({"access_token": "t-1", "data": {"customer": {"id": "9", "name": "Ada"}}}),
        ];
        for body in bodies {
            let grant = parse_grant(&body).unwrap();
            assert_eq!(grant.token, "t-1", "body: {body}");
            assert_eq!(grant.user.id, UserId::new("9"), "body: {body}");
        }
    }

    #[test]
    fn test_parse_grant_requires_token() {
        assert!(parse_grant(&json!({"user": {"id": 1}})).is_none());
        assert!(parse_grant(&json!({"token": "", "user": {"id": 1}})).is_none());
        assert!(parse_grant(&json!({"token": "t"})).is_none());
    }

    #[test]
    fn test_verify_body_shape() {
        let identifier = LoginIdentifier::parse("ada@example.com").unwrap();
        let body = VerifyBody {
            identifier: &identifier,
            code: "123456",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"email": "ada@example.com", "code": "123456"})
        );
    }
}
