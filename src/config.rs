use std::net::{IpAddr, Ipv4Addr};

/// Registry limits and defaults
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of connected players
    pub max_players: usize,
    /// Maximum number of concurrent matches
    pub max_matches: usize,
    /// Display name given to players until they pick one
    pub default_player_name: String,
    /// Maximum display name length in characters
    pub max_name_len: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_players: 10_000,
            max_matches: 5_000,
            default_player_name: "Anonymous".to_string(),
            max_name_len: 32,
        }
    }
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the admin endpoint binds to
    pub bind_address: IpAddr,
    /// Admin endpoint port (metrics, match table)
    pub admin_port: u16,
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            admin_port: 9090,
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            if let Ok(parsed) = addr.parse() {
                config.bind_address = parsed;
            } else {
                tracing::warn!("Invalid BIND_ADDRESS '{}', using default", addr);
            }
        }

        if let Ok(port) = std::env::var("ADMIN_PORT") {
            match port.parse::<u16>() {
                Ok(parsed) if parsed > 0 => config.admin_port = parsed,
                Ok(_) => tracing::warn!("ADMIN_PORT must be > 0, using default"),
                Err(_) => tracing::warn!("Invalid ADMIN_PORT '{}', using default", port),
            }
        }

        if let Some(parsed) = parse_limit("MAX_PLAYERS", 1_000_000) {
            config.registry.max_players = parsed;
        }

        if let Some(parsed) = parse_limit("MAX_MATCHES", 500_000) {
            config.registry.max_matches = parsed;
        }

        if let Some(parsed) = parse_limit("MAX_NAME_LEN", 256) {
            config.registry.max_name_len = parsed;
        }

        if let Ok(name) = std::env::var("DEFAULT_PLAYER_NAME") {
            if name.trim().is_empty() {
                tracing::warn!("DEFAULT_PLAYER_NAME is blank, using default");
            } else {
                config.registry.default_player_name = name;
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.admin_port == 0 {
            return Err("Admin port cannot be 0".to_string());
        }
        if self.registry.max_players < 2 {
            return Err("max_players must be at least 2".to_string());
        }
        if self.registry.max_matches == 0 {
            return Err("max_matches must be at least 1".to_string());
        }
        if self.registry.max_name_len == 0 {
            return Err("max_name_len must be at least 1".to_string());
        }
        if self.registry.default_player_name.chars().count() > self.registry.max_name_len {
            return Err("default_player_name cannot exceed max_name_len".to_string());
        }
        Ok(())
    }
}

/// Read a positive bounded count from the environment, warning on bad values
fn parse_limit(var: &str, max: usize) -> Option<usize> {
    let raw = std::env::var(var).ok()?;
    match raw.parse::<usize>() {
        Ok(parsed) if parsed > 0 && parsed <= max => Some(parsed),
        Ok(_) => {
            tracing::warn!("{} must be 1-{}, using default", var, max);
            None
        }
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", var, raw);
            None
        }
    }
}
