// Endpoint wrappers built on the authenticated call pipeline. Resource CRUD
// modules live in the embedding applications; only the credential lifecycle
// belongs to the SDK itself.
pub mod auth;
