//! User directory entries (read-only collaborator)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account as seen by this service: identity, receipt address, role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}
