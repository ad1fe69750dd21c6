use std::env;

/// How the Tron client is wired.
///
/// `Mock` is only ever selected explicitly (TRON_MODE=mock or tests);
/// there is no silent runtime fallback to a fake client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TronMode {
    Grid,
    Mock,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub eth_rpc_url: String,
    pub btc_api_url: String,
    pub btc_testnet: bool,
    /// Bitcoin fee rate in sat/vB used for flat transfers.
    pub btc_fee_rate: u64,
    pub tron_api_url: String,
    pub tron_api_key: String,
    pub tron_mode: TronMode,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:flashpay.db".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set in environment")?;

        let jwt_expiration_hours = env::var("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .map_err(|_| "JWT_EXPIRATION_HOURS must be a valid number")?;

        let eth_rpc_url = env::var("ETH_RPC_URL")
            .unwrap_or_else(|_| "https://eth.llamarpc.com".to_string());

        let btc_testnet = env::var("BTC_TESTNET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let btc_api_url = env::var("BTC_API_URL").unwrap_or_else(|_| {
            if btc_testnet {
                "https://blockstream.info/testnet/api".to_string()
            } else {
                "https://blockstream.info/api".to_string()
            }
        });

        let btc_fee_rate = env::var("BTC_FEE_RATE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| "BTC_FEE_RATE must be a valid number")?;

        let tron_api_url = env::var("TRON_API_URL")
            .unwrap_or_else(|_| "https://api.trongrid.io".to_string());

        let tron_api_key = env::var("TRON_API_KEY").unwrap_or_default();

        let tron_mode = match env::var("TRON_MODE").as_deref() {
            Ok("mock") => TronMode::Mock,
            _ => TronMode::Grid,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            eth_rpc_url,
            btc_api_url,
            btc_testnet,
            btc_fee_rate,
            tron_api_url,
            tron_api_key,
            tron_mode,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters long".to_string());
        }

        if self.jwt_expiration_hours < 1 || self.jwt_expiration_hours > 720 {
            return Err("JWT_EXPIRATION_HOURS must be between 1 and 720 (30 days)".to_string());
        }

        if self.btc_fee_rate == 0 {
            return Err("BTC_FEE_RATE must be at least 1 sat/vB".to_string());
        }

        if self.eth_rpc_url.is_empty() || self.btc_api_url.is_empty() || self.tron_api_url.is_empty()
        {
            return Err("Chain endpoint URLs cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-key-must-be-at-least-32-characters!".to_string(),
            jwt_expiration_hours: 24,
            eth_rpc_url: "http://localhost:8545".to_string(),
            btc_api_url: "http://localhost:3002".to_string(),
            btc_testnet: true,
            btc_fee_rate: 10,
            tron_api_url: "http://localhost:9090".to_string(),
            tron_api_key: String::new(),
            tron_mode: TronMode::Mock,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn short_jwt_secret_rejected() {
        let mut config = test_config();
        config.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_fee_rate_rejected() {
        let mut config = test_config();
        config.btc_fee_rate = 0;
        assert!(config.validate().is_err());
    }
}
