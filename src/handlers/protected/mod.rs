// handlers/protected/mod.rs - Handlers behind `require_auth`
//
// The router wraps every route in this module with the bearer-token middleware,
// so handlers can take `Extension<AuthUser>` without checking for it.

pub mod auth;
pub mod books;
