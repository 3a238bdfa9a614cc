mod channel;
mod node_uri;

pub use node_uri::NodeAddress;

pub mod request {
    pub use crate::model::channel::request::*;
}

pub mod response {
    pub use crate::model::channel::response::*;
}
