use clap::Parser;
use sea_orm_migration::MigratorTrait;
use socialmarket::config::{AppConfig, setup_logging};
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = socialmarket::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!("Configuration error: {}", err);
            return;
        }
    };
    info!("Loaded configuration: {:?}", config);

    let db = match socialmarket::db::connect_db(&cli.database_path).await {
        Ok(db) => db,
        Err(err) => {
            error!("Database connection error: {}", err);
            return;
        }
    };

    if let Err(err) = socialmarket::db::migrations::Migrator::up(&db, None).await {
        error!("Database migration error: {}", err);
        return;
    }

    if let Err(err) =
        socialmarket::web::setup_server(&cli.listen_address, cli.port, config, db).await
    {
        error!("Application error: {}", err);
    }
}
