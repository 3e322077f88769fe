// Receiving
pub mod receiving;
pub mod reconciliation;

// Stock and locations
pub mod inventory;
pub mod locations;
pub mod notifications;

// Purchasing
pub mod orders;

/// Patch fields that can be cleared: an absent key deserializes to `None`,
/// an explicit `null` to `Some(None)`. Pair with `#[serde(default)]`.
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
