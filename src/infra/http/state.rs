use std::sync::Arc;

use crate::application::reads::ReadService;

#[derive(Clone)]
pub struct HttpState {
    pub reads: Arc<ReadService>,
}

impl HttpState {
    pub fn new(reads: ReadService) -> Self {
        Self {
            reads: Arc::new(reads),
        }
    }
}
