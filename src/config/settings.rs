use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

use crate::posts::timeline::{clamp_page_size, DEFAULT_PAGE_SIZE};

#[derive(Clone)]
pub struct Settings {
    pub port: u16,
    pub addr: SocketAddr,
    /// Postgres connection string. Without one the server runs on the
    /// in-process store, which forgets everything on restart.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Timeline page size used when a request names none.
    pub page_size: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let page_size = env::var("FEED_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(clamp_page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(Self {
            port,
            addr,
            database_url,
            jwt_secret,
            page_size,
        })
    }

    /// Settings for an in-process server, as used by tests.
    pub fn local(jwt_secret: impl Into<String>) -> Self {
        Self {
            port: 0,
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: None,
            jwt_secret: jwt_secret.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
