//! Two ways to stay logged in, side by side: signed bearer tokens that carry
//! their own state, and opaque session identifiers backed by a server table.

pub mod clock;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod jwt;
    pub mod session_id;
}

pub mod models {
    pub mod claims;
    pub mod principal;
    pub mod session;
}

pub mod repositories {
    pub mod session;
}

pub mod services {
    pub mod credentials;
    pub mod sessions;
    pub mod tokens;
}

pub mod handlers {
    pub mod cookies;
    pub mod jwt;
    pub mod session;
}

pub mod validation {
    pub mod auth;
}
