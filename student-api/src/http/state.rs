use crate::store::StudentStore;

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: StudentStore,
}

impl AppState {
    pub fn new(store: StudentStore) -> Self {
        Self { store }
    }
}
