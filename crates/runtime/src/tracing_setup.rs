use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .compact()
        .with_max_level(tracing::Level::INFO)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("purrtts=debug".parse().unwrap()),
        )
        .init();
}
