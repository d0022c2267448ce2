//! Application state wiring all services together.
//!
//! Services are generic over the repository and hasher traits; AppState pins
//! them to the storage [`Gateway`] and the argon2 hasher.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use connectvit_core::realtime::{MessagingService, RoomRegistry, SessionManager};
use connectvit_core::service::group::GroupService;
use connectvit_core::service::history::HistoryService;
use connectvit_core::service::post::PostService;
use connectvit_core::service::user::UserService;
use connectvit_infra::config::database_url;
use connectvit_infra::crypto::password::Argon2PasswordHasher;
use connectvit_infra::gateway::Gateway;
use connectvit_types::config::ServerConfig;
use tokio_util::sync::CancellationToken;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteMessagingService = MessagingService<Gateway>;
pub type ConcreteUserService = UserService<Gateway, Argon2PasswordHasher>;
pub type ConcreteGroupService = GroupService<Gateway, Gateway>;
pub type ConcretePostService = PostService<Gateway>;
pub type ConcreteHistoryService = HistoryService<Gateway, Gateway>;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub messaging: Arc<ConcreteMessagingService>,
    pub sessions: SessionManager,
    pub user_service: Arc<ConcreteUserService>,
    pub group_service: Arc<ConcreteGroupService>,
    pub post_service: Arc<ConcretePostService>,
    pub history_service: Arc<ConcreteHistoryService>,
    pub gateway: Gateway,
    pub config: Arc<ServerConfig>,
    /// Cancelled on shutdown; open WebSocket loops watch it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Connect to the configured database and wire services.
    pub async fn init(config: ServerConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;
        let url = database_url(&config, &data_dir);
        let gateway = Gateway::connect(&url, &config.database).await?;
        Ok(Self::with_gateway(gateway, config))
    }

    pub fn with_gateway(gateway: Gateway, config: ServerConfig) -> Self {
        let registry = RoomRegistry::new();
        let sessions = SessionManager::new(registry.clone(), config.messaging.session_buffer);
        let messaging = MessagingService::new(gateway.clone(), registry)
            .with_persist_timeout(Duration::from_millis(config.messaging.persist_timeout_ms));

        Self {
            messaging: Arc::new(messaging),
            sessions,
            user_service: Arc::new(UserService::new(
                gateway.clone(),
                Argon2PasswordHasher::default(),
            )),
            group_service: Arc::new(GroupService::new(gateway.clone(), gateway.clone())),
            post_service: Arc::new(PostService::new(gateway.clone())),
            history_service: Arc::new(HistoryService::new(gateway.clone(), gateway.clone())),
            gateway,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }
}
