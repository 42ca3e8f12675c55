use actix_web::{delete, get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use healthdash_db::measurement::MeasurementRepository;
use healthdash_model::{
    dashboard::DashboardSummary,
    measurement::{NewMeasurement, SaveMeasurement},
};

use crate::{auth::AuthenticatedUser, error::ApiError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_types)
        .service(list_records)
        .service(save_record)
        .service(delete_record)
        .service(dashboard);
}

#[get("/types")]
async fn list_types(
    repository: web::Data<dyn MeasurementRepository>,
) -> Result<HttpResponse, ApiError> {
    let types = repository.fetch_types().await?;
    Ok(HttpResponse::Ok().json(types))
}

#[derive(Debug, Deserialize)]
struct RecordsQuery {
    select: Option<String>,
}

#[get("/records")]
async fn list_records(
    user: AuthenticatedUser,
    query: web::Query<RecordsQuery>,
    repository: web::Data<dyn MeasurementRepository>,
) -> Result<HttpResponse, ApiError> {
    let mut records = repository.fetch_records(user.id()).await?;

    if let Some(select) = &query.select {
        let names: Vec<&str> = select.split(',').filter(|name| !name.is_empty()).collect();
        records.retain(|record| names.contains(&record.type_name.as_str()));
    }

    Ok(HttpResponse::Ok().json(records))
}

#[post("/records")]
async fn save_record(
    user: AuthenticatedUser,
    body: web::Json<SaveMeasurement>,
    repository: web::Data<dyn MeasurementRepository>,
) -> Result<HttpResponse, ApiError> {
    let save = body.into_inner();
    if !save.value.is_finite() {
        return Err(ApiError::Validation(
            "value must be a finite number".to_string(),
        ));
    }

    let record = repository
        .upsert_record(NewMeasurement::from_save(user.id(), save))
        .await?;

    Ok(HttpResponse::Ok().json(record))
}

#[delete("/records/{id}")]
async fn delete_record(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    repository: web::Data<dyn MeasurementRepository>,
) -> Result<HttpResponse, ApiError> {
    repository
        .delete_record(user.id(), path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

#[get("/dashboard")]
async fn dashboard(
    user: AuthenticatedUser,
    repository: web::Data<dyn MeasurementRepository>,
) -> Result<HttpResponse, ApiError> {
    let types = repository.fetch_types().await?;
    let records = repository.fetch_records(user.id()).await?;

    Ok(HttpResponse::Ok().json(DashboardSummary::build(types, &records)))
}
