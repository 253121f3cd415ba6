pub mod jwt;
pub mod middleware;
pub mod oauth_state;
pub mod provider;
pub mod rate_limit;
