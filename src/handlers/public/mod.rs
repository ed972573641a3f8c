// handlers/public/mod.rs - Handlers reachable without a token
//
// Reads here still look at the Authorization header through the `Viewer`
// extractor: a valid token widens what the caller sees but is never required.

pub mod auth;
pub mod books;
pub mod formats;
