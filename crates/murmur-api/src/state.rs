//! Service wiring.
//!
//! Pins the generic core services to the concrete infra adapters and builds
//! everything `murmur run` needs from the parsed arguments.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use murmur_core::consumer::{ConsumerSettings, StreamConsumer};
use murmur_core::dispatch::{EventDispatcher, PostHandler};
use murmur_core::eligibility::EligibilityFilter;
use murmur_core::queue::{ReplyReceiver, reply_queue};
use murmur_core::record::TidClock;
use murmur_core::reply::ReplyComposer;
use murmur_core::session::{SessionManager, SessionSettings};
use murmur_core::thread::ThreadContextBuilder;
use murmur_core::tools::ToolService;
use murmur_infra::atproto::{AuthSession, LoginCredentials, XrpcClient};
use murmur_infra::clickhouse::{ClickHouseArchive, ClickHouseConfig};
use murmur_infra::config::load_runtime_config;
use murmur_infra::filesystem::FileCursorStore;
use murmur_infra::jetstream::JetstreamSource;
use murmur_infra::letta::{LettaClient, LettaConfig};
use murmur_infra::sqlite::block::{SqliteBlockRepository, SqliteLegacyMemoryRepository};
use murmur_infra::sqlite::pool::{DatabasePool, default_database_url};
use murmur_types::config::{EligibilityConfig, RuntimeConfig};
use secrecy::SecretString;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::http::extractors::auth::hash_api_key;

/// Timeout for XRPC and archive requests.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub type ConcreteSessionManager = SessionManager<
    LettaClient,
    XrpcClient,
    SqliteBlockRepository,
    SqliteLegacyMemoryRepository,
    ClickHouseArchive,
>;

pub type ConcreteToolService = ToolService<XrpcClient>;

pub type ConcreteConsumer = StreamConsumer<JetstreamSource, FileCursorStore, PostHandler>;

/// State shared by the tool endpoint handlers.
#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<ConcreteToolService>,
    pub api_key_hash: Arc<String>,
}

/// Everything the service runs.
pub struct Services {
    pub config: RuntimeConfig,
    pub app_state: AppState,
    pub auth: Arc<AuthSession>,
    pub sessions: Arc<ConcreteSessionManager>,
    pub consumer: ConcreteConsumer,
    pub replies: ReplyReceiver,
}

impl Services {
    /// Connect to every backend and wire the pipeline.
    ///
    /// Fails if the database cannot be opened or the PDS login is rejected.
    pub async fn init(args: &RunArgs) -> anyhow::Result<Self> {
        let config = load_runtime_config(args.config.as_deref()).await;

        let database_url = args.database_url.clone().unwrap_or_else(default_database_url);
        let db_pool = DatabasePool::new(&database_url)
            .await
            .with_context(|| format!("failed to open database at {database_url}"))?;

        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build http client")?;

        let credentials = LoginCredentials {
            identifier: args.bot_identifier.clone(),
            password: SecretString::from(args.bot_password.clone()),
        };
        let auth = Arc::new(
            AuthSession::login(http.clone(), &args.bot_pds_host, &credentials)
                .await
                .context("failed to authenticate with pds")?,
        );
        let session_did = auth.did().await;
        if session_did != args.bot_did {
            warn!(%session_did, bot_did = %args.bot_did, "logged-in account differs from the configured bot DID");
        }
        let social = Arc::new(XrpcClient::new(Arc::clone(&auth)));

        let agent = Arc::new(LettaClient::new(LettaConfig {
            base_url: args.letta_host.clone(),
            api_key: SecretString::from(args.letta_api_key.clone()),
            agent_id: args.letta_agent_id.clone(),
            timeout: config.turn_timeout(),
        })?);

        let archive = Arc::new(ClickHouseArchive::new(
            http,
            ClickHouseConfig {
                url: args.clickhouse_addr.clone(),
                database: args.clickhouse_database.clone(),
                user: args.clickhouse_user.clone(),
                password: SecretString::from(args.clickhouse_pass.clone()),
            },
        ));

        let clock = Arc::new(TidClock::random());
        let thread = ThreadContextBuilder::new(
            archive,
            config.thread_depth_limit,
            config.thread_window_days,
        );
        let sessions = Arc::new(SessionManager::new(
            agent,
            Arc::clone(&social),
            Arc::new(SqliteBlockRepository::new(db_pool.clone())),
            Arc::new(SqliteLegacyMemoryRepository::new(db_pool)),
            thread,
            ReplyComposer::new(&args.bot_did, config.chunk_budget, Arc::clone(&clock)),
            SessionSettings::from(&config),
        ));

        let tools = Arc::new(ToolService::new(
            social,
            ReplyComposer::new(&args.bot_did, config.chunk_budget, Arc::clone(&clock)),
            clock,
        ));

        let eligibility = EligibilityConfig {
            bot_did: args.bot_did.clone(),
            admin_dids: args.bot_admins.clone(),
            admin_only: args.admin_only,
            ignore_dids: args.ignore_dids.clone(),
        };
        let (sender, replies) = reply_queue(config.reply_queue_capacity);
        let dispatcher = EventDispatcher::new(PostHandler::new(EligibilityFilter::new(eligibility), sender));
        let consumer = StreamConsumer::new(
            Arc::new(JetstreamSource::new(&args.relay_host)),
            Arc::new(FileCursorStore::new(&args.cursor_file)),
            dispatcher,
            ConsumerSettings::from(&config),
        );

        info!(bot_did = %args.bot_did, agent_id = %args.letta_agent_id, "services initialized");

        Ok(Self {
            config,
            app_state: AppState {
                tools,
                api_key_hash: Arc::new(hash_api_key(&args.api_key)),
            },
            auth,
            sessions,
            consumer,
            replies,
        })
    }
}
