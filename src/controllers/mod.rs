//! Demo application: a pet store plus a guarded admin area.
//!
//! Used by the `bounce` binary and the end-to-end tests.

mod admin;
mod pets;

pub use admin::AdminController;
pub use pets::{seed_pets, Pet, PetController};

use crate::app::Bounce;
use crate::config::AppConfig;
use crate::container::Container;
use crate::error::ConfigError;
use crate::middleware::{ApiKeyGuard, RequestLogger};
use crate::repository::MemoryRepository;
use crate::scanner::Catalog;
use crate::worker_pool::BlockingPool;
use std::sync::Arc;

/// Packages scanned when the configuration names none.
pub const DEFAULT_PACKAGES: &[&str] = &["bounce::controllers", "bounce::middleware"];

/// Path pattern guarded by the API key.
pub const ADMIN_PATTERN: &str = "/admin/*";

/// Every type the demo registers.
#[must_use]
pub fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .controller::<PetController>()
        .controller::<AdminController>()
        .interceptor::<ApiKeyGuard>()
        .interceptor::<RequestLogger>();
    catalog
}

/// Instances for the demo types.
pub fn container(config: &AppConfig, repo: MemoryRepository<Pet>, pool: BlockingPool) -> Container {
    let container = Container::new();
    container
        .instance(ApiKeyGuard::new(
            ADMIN_PATTERN,
            config.security.api_key_header.clone(),
            config.security.api_keys.clone(),
        ))
        .instance(RequestLogger)
        .instance(repo)
        .provide(|c| Ok(PetController::new((*c.resolve::<MemoryRepository<Pet>>()?).clone())))
        .provide(move |_| Ok(AdminController::new(pool.clone())));
    container
}

/// Build the demo application with a seeded pet store.
pub async fn build_app(mut config: AppConfig) -> Result<Bounce, ConfigError> {
    if config.packages.is_empty() {
        config.packages = DEFAULT_PACKAGES.iter().map(|p| (*p).to_string()).collect();
    }
    let pool = BlockingPool::new("blocking", config.blocking.pool_config());
    let repo = MemoryRepository::new(pool.clone());
    repo.save_all(seed_pets())
        .await
        .map_err(|e| ConfigError::Startup {
            reason: e.to_string(),
        })?;

    let container = container(&config, repo, pool.clone());
    Bounce::builder()
        .config(config)
        .catalog(catalog())
        .resolver(Arc::new(container))
        .build_async(&pool)
        .await
}
