use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::AppConfig;
use crate::services::backend::{AvailabilityProvider, BookingStore};
use crate::services::wizard::WizardSession;

pub struct AppState {
    pub config: AppConfig,
    pub availability: Box<dyn AvailabilityProvider>,
    pub store: Box<dyn BookingStore>,
    pub sessions: Mutex<HashMap<String, WizardSession>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        availability: Box<dyn AvailabilityProvider>,
        store: Box<dyn BookingStore>,
    ) -> Self {
        Self {
            config,
            availability,
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}
