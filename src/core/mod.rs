// Domain-layer modules and shared errors/models
pub mod gateway {
    pub use crate::gateway::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod view_model {
    pub use crate::view_model::*;
}

pub mod errors {
    pub use crate::errors::*;
}
