use anyhow::{Context as _, Error};
use axum::Server;
use tower::{
    limit::GlobalConcurrencyLimitLayer, load_shed::LoadShedLayer, make::Shared, ServiceBuilder,
};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contact_book::{
    config::Config,
    data_path_from_env,
    server::{router, Context},
    store::Store,
    uploads::Uploads,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_path = data_path_from_env();

    let config = Config::read(&data_path)?;

    let uploads = Uploads::open(&config.uploads)
        .with_context(|| format!("Failed to open {}", config.uploads.display()))?;

    let store = Store::open(&config.database)
        .with_context(|| format!("Failed to open {}", config.database.display()))?;

    let context = &*Box::leak(Box::new(Context { store, uploads }));

    let make_service = Shared::new(
        ServiceBuilder::new()
            .layer(LoadShedLayer::new())
            .layer(GlobalConcurrencyLimitLayer::new(config.request_limit))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::default().include_headers(true)),
            )
            .service(router(context)),
    );

    tracing::info!("Listening on {}", config.bind_addr);
    Server::bind(&config.bind_addr).serve(make_service).await?;

    Ok(())
}
