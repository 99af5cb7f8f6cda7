use std::convert::TryFrom;
use tokio::time::Duration;

/// Tunables for a node and for the edge client. Unset values fall back to defaults.
#[derive(Clone, Default)]
pub struct NodeOptions {
    /// Upper bound on every call to a peer, connect included.
    pub peer_rpc_timeout: Option<Duration>,
    /// Upper bound on the liveness probe the election coordinator sends to each candidate.
    pub election_probe_timeout: Option<Duration>,
}

pub(super) struct NodeOptionsValidated {
    pub peer_rpc_timeout: Duration,
    pub election_probe_timeout: Duration,
}

impl NodeOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.peer_rpc_timeout == Duration::from_millis(0) {
            return Err("Peer RPC timeout must be non-zero");
        }
        if self.election_probe_timeout == Duration::from_millis(0) {
            return Err("Election probe timeout must be non-zero");
        }
        if self.election_probe_timeout > self.peer_rpc_timeout {
            return Err("Election probe timeout must not exceed the peer RPC timeout");
        }

        Ok(())
    }
}

impl TryFrom<NodeOptions> for NodeOptionsValidated {
    type Error = &'static str;

    fn try_from(options: NodeOptions) -> Result<Self, Self::Error> {
        let values = NodeOptionsValidated {
            peer_rpc_timeout: options.peer_rpc_timeout.unwrap_or(Duration::from_millis(500)),
            election_probe_timeout: options.election_probe_timeout.unwrap_or(Duration::from_millis(300)),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeOptions, NodeOptionsValidated};
    use std::convert::TryFrom;
    use tokio::time::Duration;

    #[test]
    fn defaults_are_valid() {
        let options = NodeOptionsValidated::try_from(NodeOptions::default()).unwrap();
        assert_eq!(Duration::from_millis(500), options.peer_rpc_timeout);
        assert_eq!(Duration::from_millis(300), options.election_probe_timeout);
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let options = NodeOptions {
            peer_rpc_timeout: Some(Duration::from_millis(0)),
            ..Default::default()
        };
        assert!(NodeOptionsValidated::try_from(options).is_err());

        let options = NodeOptions {
            election_probe_timeout: Some(Duration::from_millis(0)),
            ..Default::default()
        };
        assert!(NodeOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn probe_timeout_bounded_by_rpc_timeout() {
        let options = NodeOptions {
            peer_rpc_timeout: Some(Duration::from_millis(200)),
            election_probe_timeout: Some(Duration::from_millis(201)),
        };
        assert!(NodeOptionsValidated::try_from(options).is_err());

        let options = NodeOptions {
            peer_rpc_timeout: Some(Duration::from_millis(200)),
            election_probe_timeout: Some(Duration::from_millis(200)),
        };
        assert!(NodeOptionsValidated::try_from(options).is_ok());
    }
}
