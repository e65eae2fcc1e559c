use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub cors_origin: Option<String>,
    pub workshop_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "workshop.db".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
            workshop_name: env::var("WORKSHOP_NAME").unwrap_or_else(|_| "Workshop".to_string()),
        }
    }
}
