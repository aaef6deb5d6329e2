use crate::media::MediaConstraints;
use crate::session::SessionOptions;
use duet_core::IceServerConfig;
use duet_core::utils::default_ice_servers;
use std::env;

pub const DEFAULT_SIGNALING_URL: &str = "ws://127.0.0.1:3000";

pub const SIGNALING_URL_VAR: &str = "DUET_SIGNALING_URL";
pub const AUTO_ANSWER_VAR: &str = "DUET_AUTO_ANSWER";
pub const TURN_URL_VAR: &str = "TURN_URL";
pub const TURN_USERNAME_VAR: &str = "TURN_USERNAME";
pub const TURN_CREDENTIAL_VAR: &str = "TURN_CREDENTIAL";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub signaling_url: String,
    pub ice_servers: Vec<IceServerConfig>,
    pub auto_answer: bool,
    pub media: MediaConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: DEFAULT_SIGNALING_URL.to_string(),
            ice_servers: default_ice_servers(),
            auto_answer: true,
            media: MediaConstraints::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from `lookup`, falling back to defaults for anything missing.
    /// A TURN server is appended after the public STUN servers when `TURN_URL` is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(SIGNALING_URL_VAR).filter(|v| !v.is_empty()) {
            config.signaling_url = url;
        }

        if let Some(flag) = lookup(AUTO_ANSWER_VAR) {
            config.auto_answer = parse_flag(&flag).unwrap_or(config.auto_answer);
        }

        if let Some(turn_url) = lookup(TURN_URL_VAR).filter(|v| !v.is_empty()) {
            config.ice_servers.push(IceServerConfig {
                urls: vec![turn_url],
                username: lookup(TURN_USERNAME_VAR),
                credential: lookup(TURN_CREDENTIAL_VAR),
            });
        }

        config
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            auto_answer: self.auto_answer,
            media: self.media,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
