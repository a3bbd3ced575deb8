use crate::error::MembershipError;
use crate::gossip::NodeId;
use config::builder::DefaultState;
use config::{Config as ConfigSource, ConfigBuilder, ConfigError, Environment, File};
use failure::Error;
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// `<host>:<port>` this node listens on and is known by.
    pub bind: String,
    pub peers: Vec<String>,
    pub protocol_period_secs: u64,
    pub suspicion_threshold_beats: u32,
    pub failure_threshold_beats: u32,
    pub fanout: usize,
    pub push_timeout_ms: u64,
}

impl Config {
    pub fn new(config_path: &str) -> Result<Self, Error> {
        Self::from_builder(Self::layered_builder(config_path)?)
    }

    /// Defaults, then the optional file at `config_path`, then `MURMUR_*`
    /// environment variables.
    pub fn layered_builder(config_path: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Self::default_builder()?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("murmur")))
    }

    pub fn default_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        ConfigSource::builder()
            .set_default("peers", Vec::<String>::new())?
            .set_default("protocol_period_secs", 1)?
            .set_default("suspicion_threshold_beats", 5)?
            .set_default("failure_threshold_beats", 10)?
            .set_default("fanout", 2)?
            .set_default("push_timeout_ms", 500)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, Error> {
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MembershipError> {
        validate_bind(&self.bind)?;
        if self.protocol_period_secs == 0 {
            return Err(invalid("protocol_period_secs must be at least 1"));
        }
        if self.suspicion_threshold_beats == 0 {
            return Err(invalid("suspicion_threshold_beats must be at least 1"));
        }
        if self.failure_threshold_beats <= self.suspicion_threshold_beats {
            return Err(invalid(
                "failure_threshold_beats must be greater than suspicion_threshold_beats",
            ));
        }
        if self.fanout == 0 {
            return Err(invalid("fanout must be at least 1"));
        }
        if self.push_timeout_ms == 0 || self.push_timeout() >= self.protocol_period() {
            return Err(invalid(
                "push_timeout_ms must be positive and shorter than the protocol period",
            ));
        }
        self.peers.iter().try_for_each(|peer| validate_peer(peer))
    }

    pub fn node_id(&self) -> NodeId {
        NodeId::new(self.bind.as_str())
    }

    pub fn peer_ids(&self) -> Vec<NodeId> {
        let node_id = self.node_id();
        self.peers
            .iter()
            .map(|peer| NodeId::new(peer.as_str()))
            .filter(|peer| *peer != node_id)
            .collect()
    }

    pub fn protocol_period(&self) -> Duration {
        Duration::from_secs(self.protocol_period_secs)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }
}

fn invalid(message: &str) -> MembershipError {
    MembershipError::InvalidConfig(message.to_string())
}

fn split_address(address: &str) -> Option<(&str, u16)> {
    let (host, port) = address.rsplit_once(':')?;
    let port = port.parse().ok()?;
    if host.is_empty() {
        return None;
    }
    Some((host, port))
}

fn validate_bind(bind: &str) -> Result<(), MembershipError> {
    let (host, _) = split_address(bind)
        .ok_or_else(|| invalid(&format!("bind '{}' is not <host>:<port>", bind)))?;
    match host {
        "0.0.0.0" | "::" | "[::]" | "*" => Err(invalid(&format!(
            "bind '{}' is a wildcard address and cannot identify this node",
            bind
        ))),
        _ => Ok(()),
    }
}

fn validate_peer(peer: &str) -> Result<(), MembershipError> {
    split_address(peer)
        .map(|_| ())
        .ok_or_else(|| invalid(&format!("peer '{}' is not <host>:<port>", peer)))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn builder(bind: &str) -> ConfigBuilder<DefaultState> {
        Config::default_builder()
            .unwrap()
            .set_override("bind", bind)
            .unwrap()
    }

    fn config() -> Config {
        Config::from_builder(builder("127.0.0.1:7000")).unwrap()
    }

    fn assert_invalid(config: &Config) {
        match config.validate() {
            Err(MembershipError::InvalidConfig(_)) => (),
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.node_id(), NodeId::from("127.0.0.1:7000"));
        assert!(config.peers.is_empty());
        assert_eq!(config.protocol_period(), Duration::from_secs(1));
        assert_eq!(config.suspicion_threshold_beats, 5);
        assert_eq!(config.failure_threshold_beats, 10);
        assert_eq!(config.fanout, 2);
        assert_eq!(config.push_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_missing_bind_is_fatal() {
        assert!(Config::from_builder(Config::default_builder().unwrap()).is_err());
    }

    #[test]
    fn test_rejects_bad_bind() {
        for bind in &["0.0.0.0:7000", "[::]:7000", "localhost", "127.0.0.1:http", ":7000"] {
            let mut config = config();
            config.bind = bind.to_string();
            assert_invalid(&config);
        }
        assert!(Config::from_builder(builder("0.0.0.0:7000")).is_err());
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let mut config = config();
        config.failure_threshold_beats = config.suspicion_threshold_beats;
        assert_invalid(&config);

        let mut config = self::config();
        config.suspicion_threshold_beats = 0;
        assert_invalid(&config);

        let mut config = self::config();
        config.protocol_period_secs = 0;
        assert_invalid(&config);

        let mut config = self::config();
        config.fanout = 0;
        assert_invalid(&config);

        let mut config = self::config();
        config.push_timeout_ms = 1_000;
        assert_invalid(&config);
    }

    #[test]
    fn test_rejects_bad_peer() {
        let mut config = config();
        config.peers = vec!["127.0.0.1:7001".to_string(), "nope".to_string()];
        assert_invalid(&config);
    }

    #[test]
    fn test_peer_ids_skip_self() {
        let mut config = config();
        config.peers = vec!["127.0.0.1:7001".to_string(), "127.0.0.1:7000".to_string()];
        assert_eq!(config.peer_ids(), vec![NodeId::from("127.0.0.1:7001")]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("murmur.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "bind = \"10.0.0.5:9000\"\npeers = [\"10.0.0.6:9000\"]\nprotocol_period_secs = 2\nfailure_threshold_beats = 12"
        )
        .unwrap();

        let config = Config::new(path.to_str().unwrap()).unwrap();
        assert_eq!(config.bind, "10.0.0.5:9000");
        assert_eq!(config.peers, vec!["10.0.0.6:9000".to_string()]);
        assert_eq!(config.protocol_period(), Duration::from_secs(2));
        assert_eq!(config.failure_threshold_beats, 12);
        assert_eq!(config.suspicion_threshold_beats, 5);
    }
}
