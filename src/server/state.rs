use crate::report::zip::BundleLayout;
use crate::store::ConfigStore;
use std::sync::Arc;

/// Shared per-process state. The store is created with the server and
/// dropped with it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConfigStore>,
    pub layout: Arc<BundleLayout>,
}

impl AppState {
    pub fn new(store: Arc<dyn ConfigStore>, layout: BundleLayout) -> Self {
        Self {
            store,
            layout: Arc::new(layout),
        }
    }
}
