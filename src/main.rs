use std::io;

use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use config::Config;
use dotenvy::dotenv;

use catalog_api::db::{establish_connection_pool, run_migrations};
use catalog_api::models::config::ServerConfig;
use catalog_api::repository::DieselRepository;
use catalog_api::routes::{self, json_config, multipart_config};
use catalog_api::storage::LocalFileStorage;

fn load_config() -> Result<ServerConfig, config::ConfigError> {
    let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    Config::builder()
        .add_source(config::File::with_name("config/default"))
        .add_source(config::File::with_name(&format!("config/{app_env}")).required(false))
        .add_source(config::Environment::with_prefix("APP"))
        .build()?
        .try_deserialize()
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let server_config = match load_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    match pool.get() {
        Ok(mut conn) => {
            if let Err(e) = run_migrations(&mut conn) {
                log::error!("Failed to run migrations: {e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            log::error!("Failed to get a connection for migrations: {e}");
            std::process::exit(1);
        }
    }

    let storage = LocalFileStorage::new(&server_config.upload_dir);
    if let Err(e) = storage.ensure_root() {
        log::error!(
            "Failed to create upload directory {}: {e}",
            storage.root().display()
        );
        std::process::exit(1);
    }

    if server_config.api_token.is_none() {
        log::warn!("No api_token configured; write routes are open");
    }

    let bind_address = (server_config.address.clone(), server_config.port);
    let repo = DieselRepository::new(pool);
    log::info!(
        "Starting server at http://{}:{}",
        bind_address.0,
        bind_address.1
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(json_config())
            .app_data(multipart_config(server_config.max_image_bytes()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(server_config.clone()))
            .configure(routes::configure)
            .service(Files::new("/uploads", storage.root()))
    })
    .bind(bind_address)?
    .run()
    .await
}
