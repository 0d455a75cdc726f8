use std::path::PathBuf;

use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub upload_dir: PathBuf,
}
