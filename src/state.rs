use std::sync::Arc;

use tracing::warn;

use super::{config::Config, notify::Notifier, session::SessionRegistry, store::FeedbackStore};

pub struct State {
    pub config: Config,
    pub store: FeedbackStore,
    pub notifier: Notifier,
    pub sessions: SessionRegistry,
}

impl State {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        let store = FeedbackStore::new(&config.feedback_file);
        let notifier = Notifier::from_config(&config).expect("SMTP misconfigured!");
        let sessions = SessionRegistry::new(config.admin_user.clone(), config.admin_pass.clone());

        if !notifier.configured() {
            warn!("SMTP not configured, feedback alerts will not be sent");
        }

        Arc::new(Self {
            config,
            store,
            notifier,
            sessions,
        })
    }
}
