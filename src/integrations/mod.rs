//! External service integrations.

pub mod ledger_client {
    pub use crate::ledger_client::*;
}

pub mod wallet_client {
    pub use crate::wallet_client::*;
}
