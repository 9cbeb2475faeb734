use std::{env, net::SocketAddr};

use thiserror::Error;

use crate::domain::profile::{Profile, ToolSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Stdio,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub api_token: Option<String>,
    pub bind_addr: String,
    pub bind_port: u16,
    pub profile: Profile,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_TRANSPORT must be one of: http, stdio")]
    InvalidTransport,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("MCP_TOOL_SET must be one of: calculator, parity")]
    InvalidToolSet,
    #[error("MCP_NAME_SUFFIX may only contain ASCII letters, digits, '-' or '_'")]
    InvalidNameSuffix,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let transport = match non_empty_var("MCP_TRANSPORT")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("http") => Transport::Http,
            Some("stdio") => Transport::Stdio,
            Some(_) => return Err(ConfigError::InvalidTransport),
        };

        let api_token = non_empty_var("MCP_API_TOKEN");
        let bind_addr = non_empty_var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = non_empty_var("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let tool_set = match non_empty_var("MCP_TOOL_SET")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("calculator") => ToolSet::Calculator,
            Some("parity") => ToolSet::Parity,
            Some(_) => return Err(ConfigError::InvalidToolSet),
        };

        let name_suffix = non_empty_var("MCP_NAME_SUFFIX").unwrap_or_default();
        if !name_suffix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidNameSuffix);
        }

        let config = Self {
            transport,
            api_token,
            bind_addr,
            bind_port,
            profile: Profile::new(name_suffix, tool_set),
        };

        if config.transport == Transport::Http {
            let _ = config.bind_socket()?;
        }
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}
