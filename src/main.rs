//! `margin` binary: the comment routes over an in-memory store.
//!
//! Run with:
//!   RUST_LOG=margin=debug cargo run
//!
//! Try:
//!   curl -X POST http://localhost:3000/comments/doc-123 -d '{"text":"hello"}'
//!   curl http://localhost:3000/comments/doc-123
//!   curl -X DELETE http://localhost:3000/comments/doc-123/<id>

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use margin::comments::{self, CommentService};
use margin::config::Config;
use margin::events::LogPublisher;
use margin::storage::MemoryStorage;
use margin::{Error, Server, telemetry};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::parse();
    telemetry::init(config.log_format);
    config.validate()?;

    let service = CommentService::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(LogPublisher),
        config.owner_resolver(),
        config.comment_options(),
    );
    let router = comments::router(Arc::new(service))?;
    for (method, pattern) in router.routes() {
        info!(%method, pattern, "route registered");
    }

    Server::bind(config.bind).serve(router).await
}
