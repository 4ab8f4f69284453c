use std::sync::Arc;

use crate::database::Database;
use crate::ports::view::ViewRenderer;

pub struct AppState {
    pub db: Arc<Database>,
    pub renderer: Arc<dyn ViewRenderer>,
}
