mod cache;
mod simple;
mod templates;
mod user;

use crate::{cache::statement_cache, simple::simple, templates::templates, user::users};
use log::LevelFilter;
use quill::{Connection, Executor};
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every scenario against the database behind `executor`.
///
/// Scenarios create and drop their own tables, prefixed with `quill_`.
pub async fn execute_tests<C: Connection>(executor: &Executor<C>) {
    simple(executor).await;
    users(executor).await;
    templates(executor).await;
    statement_cache(executor).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
