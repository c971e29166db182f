use std::env;

/// Runtime settings, all taken from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub database: String,
    pub secret: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let mongodb_uri =
            env::var("MONGODB_URI").expect("You need to add the MONGODB_URI to the env");
        let secret = env::var("APP_SECRET").expect("You need to add the APP_SECRET to the env");
        let database = env::var("MONGODB_DATABASE").unwrap_or_else(|_| "splitledger".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(8080);
        Config {
            mongodb_uri,
            database,
            secret,
            port,
        }
    }
}
