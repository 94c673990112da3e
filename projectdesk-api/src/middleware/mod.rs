/// HTTP middleware owned by the API server
///
/// Authentication lives in `app::jwt_auth_layer`; this module holds the
/// tower layers that apply to every response.

pub mod security;
