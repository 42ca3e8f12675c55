use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use log::info;

use healthdash_api::handlers;
use healthdash_db::{
    connection::Connection,
    measurement::{MeasurementRepository, MeasurementRepositoryImpl},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    log4rs::init_file("log4rs.yml", Default::default()).unwrap();

    info!("Connecting to database");
    let conn = Connection::establish().await.unwrap();
    let repository = MeasurementRepositoryImpl::new(conn.clone());

    info!("Seeding measurement types");
    repository.seed_default_types().await.unwrap();

    let repository: Arc<dyn MeasurementRepository> = Arc::new(repository);

    info!("Starting HTTP server");
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::from(repository.clone()))
            .configure(handlers::configure)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
