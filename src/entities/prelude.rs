pub use super::resources::Entity as Resources;
