/// Middleware modules for the API server
///
/// - `security`: hardening response headers
///
/// Authentication is wired in `app::jwt_auth_layer`.

pub mod security;
