use crate::StoreError;
use icn_crypto::PublicKey;
use std::collections::HashMap;

/// Failure rate assumed for peers nobody has rated.
pub const DEFAULT_EXCHANGE_FAILURE_RATE: u8 = 5;

/// A peer at this rate always misattributes keys.
pub const MAX_EXCHANGE_FAILURE_RATE: u8 = 10;

/// What the identity-assurance search needs to know about peers.
pub trait PeerDirectory {
    /// The local owner's current public key (the trust anchor).
    fn current_owner_public_key(&self) -> PublicKey;

    /// How often (0–10, out of ten) `peer_id` attaches a key to the wrong
    /// person during an in-person exchange.
    fn exchange_failure_rate(&self, peer_id: &str) -> u8;
}

/// Peer directory backed by a map of per-peer failure rates.
#[derive(Clone, Debug)]
pub struct InMemoryPeerDirectory {
    owner_public_key: PublicKey,
    default_rate: u8,
    rates: HashMap<String, u8>,
}

impl InMemoryPeerDirectory {
    pub fn new(owner_public_key: PublicKey) -> Self {
        Self {
            owner_public_key,
            default_rate: DEFAULT_EXCHANGE_FAILURE_RATE,
            rates: HashMap::new(),
        }
    }

    /// Replace the rate used for peers without an explicit entry.
    pub fn with_default_rate(mut self, rate: u8) -> Result<Self, StoreError> {
        check_rate("*", rate)?;
        self.default_rate = rate;
        Ok(self)
    }

    pub fn set_exchange_failure_rate(
        &mut self,
        peer_id: impl Into<String>,
        rate: u8,
    ) -> Result<(), StoreError> {
        let peer_id = peer_id.into();
        check_rate(&peer_id, rate)?;
        self.rates.insert(peer_id, rate);
        Ok(())
    }

    pub fn set_owner_public_key(&mut self, key: PublicKey) {
        self.owner_public_key = key;
    }
}

fn check_rate(peer_id: &str, rate: u8) -> Result<(), StoreError> {
    if rate > MAX_EXCHANGE_FAILURE_RATE {
        return Err(StoreError::InvalidFailureRate {
            peer_id: peer_id.to_string(),
            rate,
        });
    }
    Ok(())
}

impl PeerDirectory for InMemoryPeerDirectory {
    fn current_owner_public_key(&self) -> PublicKey {
        self.owner_public_key.clone()
    }

    fn exchange_failure_rate(&self, peer_id: &str) -> u8 {
        self.rates
            .get(peer_id)
            .copied()
            .unwrap_or(self.default_rate)
    }
}
