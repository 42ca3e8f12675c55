use async_trait::async_trait;
use itertools::Itertools;
use uuid::Uuid;

use healthdash_model::{
    dashboard::DashboardSummary,
    measurement::{MeasurementRecord, MeasurementType, SaveMeasurement},
};

/// Header carrying the opaque user handle; matches the API's auth extractor.
const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("server unreachable")]
    CommunicationError,
    #[error("internal server error")]
    InternalServerError,
    #[error("invalid request")]
    RequestError,
    #[error("incorrect server response")]
    ResponseError,
}

type Result<T> = std::result::Result<T, Error>;

#[mockall::automock]
#[async_trait]
pub trait Client: Send + Sync {
    async fn get_measurement_types(&self) -> Result<Vec<MeasurementType>>;
    async fn get_records(&self) -> Result<Vec<MeasurementRecord>>;
    async fn get_records_with_types(&self, type_names: &[String])
        -> Result<Vec<MeasurementRecord>>;
    async fn save_record(&self, measurement: &SaveMeasurement) -> Result<MeasurementRecord>;
    async fn delete_record(&self, id: Uuid) -> Result<()>;
    async fn get_dashboard(&self) -> Result<DashboardSummary>;
}

pub struct ClientImpl {
    url: String,
    user_id: Uuid,
    client: reqwest::Client,
}

impl ClientImpl {
    fn new(url: String, user_id: Uuid) -> Self {
        Self {
            url,
            user_id,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }
}

pub fn create(url: String, user_id: Uuid) -> impl Client {
    ClientImpl::new(url, user_id)
}

fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_client_error() {
        Err(Error::RequestError)
    } else if resp.status().is_server_error() {
        Err(Error::InternalServerError)
    } else {
        Ok(resp)
    }
}

#[async_trait]
impl Client for ClientImpl {
    async fn get_measurement_types(&self) -> Result<Vec<MeasurementType>> {
        self.client
            .get(self.endpoint("/types"))
            .send()
            .await
            .map_err(|_| Error::CommunicationError)
            .and_then(check_status)?
            .json()
            .await
            .map_err(|_| Error::ResponseError)
    }

    async fn get_records(&self) -> Result<Vec<MeasurementRecord>> {
        self.client
            .get(self.endpoint("/records"))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await
            .map_err(|_| Error::CommunicationError)
            .and_then(check_status)?
            .json()
            .await
            .map_err(|_| Error::ResponseError)
    }

    async fn get_records_with_types(
        &self,
        type_names: &[String],
    ) -> Result<Vec<MeasurementRecord>> {
        self.client
            .get(self.endpoint("/records"))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .query(&[("select", type_names.iter().join(","))])
            .send()
            .await
            .map_err(|_| Error::CommunicationError)
            .and_then(check_status)?
            .json()
            .await
            .map_err(|_| Error::ResponseError)
    }

    async fn save_record(&self, measurement: &SaveMeasurement) -> Result<MeasurementRecord> {
        self.client
            .post(self.endpoint("/records"))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .json(measurement)
            .send()
            .await
            .map_err(|_| Error::CommunicationError)
            .and_then(check_status)?
            .json()
            .await
            .map_err(|_| Error::ResponseError)
    }

    async fn delete_record(&self, id: Uuid) -> Result<()> {
        self.client
            .delete(self.endpoint(&format!("/records/{}", id)))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await
            .map_err(|_| Error::CommunicationError)
            .and_then(check_status)?;
        Ok(())
    }

    async fn get_dashboard(&self) -> Result<DashboardSummary> {
        self.client
            .get(self.endpoint("/dashboard"))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await
            .map_err(|_| Error::CommunicationError)
            .and_then(check_status)?
            .json()
            .await
            .map_err(|_| Error::ResponseError)
    }
}
