//! SeaORM repository implementations

pub mod resource;

pub use resource::ResourceSeaOrmRepository;
