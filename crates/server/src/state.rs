use configs::AuthConfig;
use store::Store;

/// JWT signing settings shared by the auth handlers and middleware.
#[derive(Clone, Debug)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl AuthSettings {
    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self { jwt_secret: cfg.jwt_secret.clone(), token_ttl_hours: cfg.token_ttl_hours }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(store: Store, auth: AuthSettings) -> Self {
        Self { store, auth }
    }
}
