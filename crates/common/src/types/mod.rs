use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Health {
    pub status: &'static str,
    /// Active data backend (`postgres` or `memory`).
    pub backend: &'static str,
}
