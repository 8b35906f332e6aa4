/// Normalized snapshot of a Clerk user, valid for one audit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    /// Opaque Clerk user identifier (`user_...`).
    pub id: String,
    /// First listed email address, empty if the account has none.
    pub email: String,
    /// Account creation time, UTC, `YYYY-MM-DD HH:MM:SS`.
    pub created_at: String,
}
