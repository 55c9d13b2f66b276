//! Authentication state passed explicitly into every note operation.

use serde::Serialize;

use crate::entity::ANONYMOUS_USER;

/// Who is acting: nobody, or a signed-in user with a provider-issued id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    Anonymous,
    SignedIn { user_id: String },
}

impl AuthState {
    /// Build from an optional session id. Blank ids count as signed out.
    pub fn from_session(user_id: Option<&str>) -> Self {
        match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => AuthState::SignedIn {
                user_id: id.to_string(),
            },
            _ => AuthState::Anonymous,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn { .. })
    }

    /// Owner id stamped on notes; the anonymous sentinel when signed out.
    pub fn owner_id(&self) -> &str {
        match self {
            AuthState::SignedIn { user_id } => user_id,
            AuthState::Anonymous => ANONYMOUS_USER,
        }
    }
}
