mod memory;
mod postgres;
mod repository;

pub use memory::MemoryAssetRepository;
pub use postgres::PgAssetRepository;
pub use repository::AssetRepository;
