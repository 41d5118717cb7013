use std::sync::Arc;

use crate::{
    runner::Scheduler, season::SeasonSource, subscribers::SubscriberStore,
};

#[derive(Clone)]
pub struct AppState {
    pub season: Arc<dyn SeasonSource>,
    pub scheduler: Arc<Scheduler>,
    pub subscribers: Arc<SubscriberStore>,
    /// Name of the role `/raceping` toggles and announcements mention.
    pub notify_role: String,
}
