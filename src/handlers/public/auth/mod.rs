// handlers/public/auth/mod.rs - Token acquisition
//
// The only unauthenticated auth endpoint: trade a magic key for a JWT.

pub mod login; // GET /api/login/:magic_id

pub use login::login;
