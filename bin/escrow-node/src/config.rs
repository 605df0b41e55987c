use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// The configuration values that dictate the behavior of the escrow node.
///
/// Unlike the params, these values are local to a node: parties running with different values
/// still agree on which proposals are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// The directory to store all the data in.
    pub datadir: PathBuf,

    /// The number of worker threads of the runtime.
    ///
    /// Default is [`DEFAULT_THREAD_COUNT`](crate::constants::DEFAULT_THREAD_COUNT).
    pub num_threads: Option<u8>,

    /// The stack size of each worker thread, in bytes.
    pub thread_stack_size: Option<usize>,

    /// The configuration for the sessions between parties.
    pub session: SessionConfig,

    /// The deposit to run through its lifecycle.
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SessionConfig {
    /// How long a party waits for the next message from a counterparty.
    pub receive_timeout: Duration,

    /// The number of messages buffered per direction of a session.
    pub channel_capacity: usize,
}

/// Amounts are in major units of the configured currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ScenarioConfig {
    /// The address of the let property.
    pub property_id: String,

    /// The deposit the tenant pays into escrow.
    pub deposit: u64,

    /// What the landlord claims for damage at the end of the tenancy.
    pub landlord_claim: u64,

    /// What the tenant is prepared to concede.
    ///
    /// The landlord accepts the offer when it differs from the claim.
    pub tenant_offer: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_toml() {
        let config = r#"
            datadir = ".data"
            num_threads = 4

            [session]
            receive_timeout = { secs = 30, nanos = 0 }
            channel_capacity = 64

            [scenario]
            property_id = "12 Acacia Avenue"
            deposit = 1000
            landlord_claim = 80
            tenant_offer = 30
        "#;

        let config = toml::from_str::<Config>(config);
        assert!(
            config.is_ok(),
            "must be able to deserialize config from toml but got: {}",
            config.unwrap_err()
        );

        let config = config.unwrap();
        assert_eq!(config.thread_stack_size, None);
        assert_eq!(config.session.receive_timeout, Duration::from_secs(30));

        let serialized = toml::to_string(&config).unwrap();
        let deserialized = toml::from_str::<Config>(&serialized).unwrap();
        assert_eq!(
            deserialized, config,
            "must be able to serialize and deserialize config to toml"
        );
    }
}
