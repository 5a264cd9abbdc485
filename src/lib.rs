use serde::{Deserialize, Serialize};

pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod question;
pub mod random;
pub mod scope;
pub mod session;

/// How questions are picked and presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingMode {
    /// Starting points are picked at random but presented in corpus order.
    #[serde(rename = "sequential")]
    Sequential,
    /// Starting points are picked and presented in random order.
    #[serde(rename = "random")]
    Random,
}

impl Default for OrderingMode {
    fn default() -> Self {
        Self::Random
    }
}
