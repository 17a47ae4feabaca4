use std::sync::Arc;

use redis::aio::ConnectionManager;

use super::{config::Config, database::init_redis, face::FaceClient, mailer::Mailer};

pub struct AppState {
    pub config: Config,
    pub redis_connection: ConnectionManager,
    pub face: FaceClient,
    pub mailer: Mailer,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let redis_connection = init_redis(&config.redis_url).await;
        let face = FaceClient::new(&config.face_service_url);
        let mailer = Mailer::new(&config);

        Arc::new(Self {
            config,
            redis_connection,
            face,
            mailer,
        })
    }
}
