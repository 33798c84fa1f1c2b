//! Application state

use std::sync::Arc;

use crate::auth::claims::{ClaimSigner, CredentialFormat};
use crate::auth::codec::{Alphabet, ClaimCodec};
use crate::auth::pipeline::CredentialVerifier;
use crate::auth::session::SessionService;
use crate::auth::temp::TempCredentialService;
use crate::config::{AuthConfig, Config, ConfigError};
use crate::delivery::{LogDelivery, ResetDelivery};
use crate::store::{MemoryStore, PgStore, Stores, SubjectDirectory};

use crate::BoxError;

/// Shared application state. Everything inside is immutable or behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub verifier: CredentialVerifier,
    pub sessions: SessionService,
    pub temp_credentials: TempCredentialService,
    pub subjects: Arc<dyn SubjectDirectory>,
    pub reset_delivery: Arc<dyn ResetDelivery>,
    /// Present when running against Postgres (health check pings it)
    pub database: Option<PgStore>,
}

impl AppState {
    /// Connect the configured backend and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let (stores, database) = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url).await?;
                tracing::info!("Connected to PostgreSQL, migrations applied");
                (Stores::postgres(pg.clone()), Some(pg))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                (Stores::memory(MemoryStore::new()), None)
            }
        };

        let delivery = Arc::new(LogDelivery {
            reveal_token: config.is_development(),
        });

        let mut state = Self::build(&config.auth, stores, delivery)?;
        state.database = database;
        Ok(state)
    }

    /// Assemble the services over given collaborators
    pub fn build(
        auth: &AuthConfig,
        stores: Stores,
        reset_delivery: Arc<dyn ResetDelivery>,
    ) -> Result<Self, ConfigError> {
        let codec = ClaimCodec::new(Alphabet::new(&auth.alphabet)?, auth.separator)?;
        let signer = auth
            .signing_key
            .as_deref()
            .map(ClaimSigner::new)
            .transpose()
            .map_err(|_| ConfigError::SigningKey)?;
        if signer.is_none() {
            tracing::warn!("CLAIM_SIGNING_KEY not set, access claims carry no integrity tag");
        }

        let format = Arc::new(CredentialFormat::new(codec.clone(), signer));

        Ok(Self {
            verifier: CredentialVerifier::new(format.clone(), stores.subjects.clone()),
            sessions: SessionService::new(
                format,
                stores.subjects.clone(),
                stores.records.clone(),
                auth.access_ttl_ms,
                auth.refresh_ttl_ms,
            ),
            temp_credentials: TempCredentialService::new(
                Arc::new(codec),
                stores.temp_credentials.clone(),
                auth.temp_credential_ttl_ms,
            ),
            subjects: stores.subjects,
            reset_delivery,
            database: None,
        })
    }
}
