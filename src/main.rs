use mongo_migrate::{cli, logging, Registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::set_panic_hook();
    logging::init_logging_with_fallback();

    // The stock binary knows no compiled migrations: `status`, `pending` and
    // `create` work as-is, while `up`/`down` report scripts with no unit.
    cli::run(Registry::<mongodb::Database>::new()).await
}
