//! The API layer, containing web handlers and routing.

pub mod handlers;
pub mod router;

pub use handlers::{ApiDoc, NOT_FOUND_BODY};
pub use router::{
    DEFAULT_STATIC_DIR, PROOF_ALIAS_PATH, PROOF_PATH, RateLimitConfig, RouterOptions,
    create_router, create_router_with_options, create_router_with_rate_limit,
};
