//! Shared state every handler closes over.

use std::sync::Arc;

use logdy_engine::{ClientsHub, Ingress};
use logdy_protocol::VersionUpdateInfo;
use tokio::sync::RwLock;

use crate::config::Config;

pub struct AppState {
    pub hub: Arc<ClientsHub>,
    pub ingress: Arc<Ingress>,
    pub config: Config,
    pub update_info: Arc<RwLock<VersionUpdateInfo>>,
}

impl AppState {
    pub fn new(
        hub: Arc<ClientsHub>,
        ingress: Arc<Ingress>,
        config: Config,
        update_info: Arc<RwLock<VersionUpdateInfo>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            hub,
            ingress,
            config,
            update_info,
        })
    }
}
