pub mod me; // GET /api/me

pub use me::me;
