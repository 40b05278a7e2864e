pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod token;

pub use error::GateError;
pub use router::{AppState, gatehouse_router};
pub use token::TokenService;
