pub mod callback;
pub mod conf;
pub mod event;
pub mod logger;
pub mod model;
pub mod node;

pub mod error {
    pub use anyhow::*;
}

pub mod json {
    pub use serde::de::DeserializeOwned;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::*;

    pub mod prelude {
        pub use serde::*;
    }
}

pub mod chan {
    pub use crossbeam_channel::*;
}
