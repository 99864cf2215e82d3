use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AppState, USER_HEADER};
use crate::error::{EcommerceError, Result};
use crate::permissions::{CurrentUser, PermissionGate};

/// The back-office user named by the `x-user-id` header.
#[derive(Clone, Debug)]
pub struct AdminUser(pub CurrentUser);

impl AdminUser {
    /// Fails with `Forbidden` unless `gate` admits this user.
    pub fn require(&self, gate: PermissionGate) -> Result<&CurrentUser> {
        if gate.allows(Some(&self.0)) {
            Ok(&self.0)
        } else {
            tracing::warn!(user_id = %self.0.user.id, role = %self.0.role.name, ?gate, "access denied");
            Err(EcommerceError::Forbidden)
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(EcommerceError::Unauthorized)?;
        state.store.current_user(user_id).await.map(AdminUser).ok_or(EcommerceError::Unauthorized)
    }
}
