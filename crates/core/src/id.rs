//! Strongly-typed identifiers used by the agent.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a generated worker id, in hex characters.
pub const WORKER_ID_LEN: usize = 12;

const WORKER_SEED_BYTES: usize = 8;

/// Identity of this agent process as seen by the queue service.
///
/// Regenerated on every start; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Generate a fresh worker id.
    ///
    /// 64 bits of seed from the thread-local CSPRNG (itself seeded by the OS), hashed and
    /// truncated to [`WORKER_ID_LEN`] hex characters (48 bits).
    pub fn generate() -> Self {
        let mut seed = [0u8; WORKER_SEED_BYTES];
        rand::rng().fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    /// Derive an id from explicit seed bytes. Deterministic; useful in tests.
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        let mut id = hex::encode(digest);
        id.truncate(WORKER_ID_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<WorkerId> for String {
    fn from(value: WorkerId) -> Self {
        value.0
    }
}

/// Identifier of a feed job, assigned by the queue service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for JobId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<JobId> for String {
    fn from(value: JobId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn generated_id_is_fixed_length_hex() {
        let id = WorkerId::generate();
        assert_eq!(id.as_str().len(), WORKER_ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ten_thousand_draws_do_not_collide() {
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let id = WorkerId::generate();
            assert!(seen.insert(id.clone()), "duplicate worker id: {id}");
        }
    }

    #[test]
    fn seed_derivation_is_deterministic() {
        assert_eq!(
            WorkerId::from_seed(&[1, 2, 3, 4]),
            WorkerId::from_seed(&[1, 2, 3, 4])
        );
        assert_ne!(
            WorkerId::from_seed(&[1, 2, 3, 4]),
            WorkerId::from_seed(&[4, 3, 2, 1])
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any seed yields a printable id of the fixed length.
        #[test]
        fn any_seed_yields_printable_fixed_length_id(seed in prop::array::uniform8(any::<u8>())) {
            let id = WorkerId::from_seed(&seed);
            prop_assert_eq!(id.as_str().len(), WORKER_ID_LEN);
            prop_assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }

        /// Property: distinct seeds map to distinct ids.
        #[test]
        fn distinct_seeds_yield_distinct_ids(
            a in prop::array::uniform8(any::<u8>()),
            b in prop::array::uniform8(any::<u8>()),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(WorkerId::from_seed(&a), WorkerId::from_seed(&b));
        }
    }
}
