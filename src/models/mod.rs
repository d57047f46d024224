pub mod cleanup;
pub mod logo;
pub mod resource;

pub use cleanup::CleanResult;
pub use logo::{LogoFormat, LogoRequest, Sizing};
pub use resource::{NewResource, ResourceMetadata};
