use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use time::{Date, Month};

use crate::dates::format_date;
use crate::domain::{
    DailyMovement, ItemKind, MonthSummaryRow, NewTag, SearchScope, Tag, TagSearchHit,
};
use crate::dto::{ErrorBody, MovementDto, MovementUpsert};
use crate::ports::MovementsApi;

/// The backend rejects list requests above this many days.
pub const MAX_LIST_LIMIT: u32 = 100;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("Backend returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("RequestError: {0}")]
    Request(String),
    #[error("ParsingError: {0}")]
    Parsing(String),
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// HTTP client for the movements backend.
#[derive(Debug, Clone)]
pub struct MovementsClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl MovementsClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn send(&self, request: RequestBuilder, call_name: &str) -> Result<Response, ApiError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        tracing::debug!(call = call_name, "calling backend");
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(format!("Failed to call {}: {}", call_name, e)))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ApiError::Unauthorized);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            let detail = match response.json::<ErrorBody>().await {
                Ok(body) => body.message(),
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            tracing::warn!(call = call_name, status = status.as_u16(), %detail, "backend error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(request, call_name).await?;
        response.json::<T>().await.map_err(|e| {
            ApiError::Parsing(format!("Failed to parse {} response: {}", call_name, e))
        })
    }

    async fn send_without_body(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<(), ApiError> {
        let response = self.send(request, call_name).await?;
        response.bytes().await.map_err(|e| {
            ApiError::Request(format!("Failed to read {} response: {}", call_name, e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl MovementsApi for MovementsClient {
    async fn list_movements(&self, limit: u32) -> Result<Vec<DailyMovement>, ApiError> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT).to_string();
        let dtos: Vec<MovementDto> = self
            .get_json(
                self.client
                    .get(self.endpoint("/api/movimientos/")?)
                    .query(&[("todos", "true"), ("limit", limit.as_str())]),
                "GET /api/movimientos/",
            )
            .await?;

        Ok(dtos.into_iter().map(DailyMovement::from).collect())
    }

    async fn movement_on(&self, date: Date) -> Result<Option<DailyMovement>, ApiError> {
        let path = format!("/api/movimientos/{}", format_date(date));
        let result: Result<Option<MovementDto>, ApiError> = self
            .get_json(
                self.client.get(self.endpoint(&path)?),
                "GET /api/movimientos/:fecha",
            )
            .await;

        match result {
            Ok(dto) => Ok(dto.map(DailyMovement::from)),
            Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save_movement(&self, movement: &DailyMovement) -> Result<DailyMovement, ApiError> {
        let dto: MovementDto = self
            .get_json(
                self.client
                    .post(self.endpoint("/api/movimientos/")?)
                    .json(&MovementUpsert::from(movement)),
                "POST /api/movimientos/",
            )
            .await?;

        Ok(dto.into())
    }

    async fn delete_movement(&self, date: Date) -> Result<(), ApiError> {
        let path = format!("/api/movimientos/{}", format_date(date));
        self.send_without_body(
            self.client.delete(self.endpoint(&path)?),
            "DELETE /api/movimientos/:fecha",
        )
        .await
    }

    async fn delete_item(&self, date: Date, kind: ItemKind, id: i64) -> Result<(), ApiError> {
        let path = format!(
            "/api/movimientos/{}/{}/{}",
            format_date(date),
            kind.path_segment(),
            id
        );
        let result = self
            .send_without_body(
                self.client.delete(self.endpoint(&path)?),
                "DELETE /api/movimientos/:fecha/:tipo/:id",
            )
            .await;

        match result {
            Err(ApiError::NotFound) => {
                tracing::debug!(%kind, id, "item already deleted on the backend");
                Ok(())
            }
            other => other,
        }
    }

    async fn month_summary(
        &self,
        year: i32,
        month: Month,
    ) -> Result<Vec<MonthSummaryRow>, ApiError> {
        let path = format!("/api/movimientos/mes/{}/{}", year, month as u8);
        self.get_json(
            self.client.get(self.endpoint(&path)?),
            "GET /api/movimientos/mes/:anio/:mes",
        )
        .await
    }

    async fn search_by_label(
        &self,
        label: &str,
        scope: SearchScope,
        limit: u32,
    ) -> Result<Vec<TagSearchHit>, ApiError> {
        let path = format!(
            "/api/movimientos/buscar/etiqueta/{}",
            urlencoding::encode(label)
        );
        let limit = limit.clamp(1, 200).to_string();
        self.get_json(
            self.client
                .get(self.endpoint(&path)?)
                .query(&[("tipo", scope.as_query()), ("limit", limit.as_str())]),
            "GET /api/movimientos/buscar/etiqueta/:etiqueta",
        )
        .await
    }

    async fn tags(&self) -> Result<Vec<Tag>, ApiError> {
        let mut tags: Vec<Tag> = self
            .get_json(
                self.client.get(self.endpoint("/api/etiquetas")?),
                "GET /api/etiquetas",
            )
            .await?;
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag, ApiError> {
        self.get_json(
            self.client.post(self.endpoint("/api/etiquetas")?).json(tag),
            "POST /api/etiquetas",
        )
        .await
    }

    async fn update_tag(&self, id: i64, tag: &NewTag) -> Result<Tag, ApiError> {
        self.get_json(
            self.client
                .put(self.endpoint(&format!("/api/etiquetas/{}", id))?)
                .json(tag),
            "PUT /api/etiquetas/:id",
        )
        .await
    }

    async fn delete_tag(&self, id: i64) -> Result<(), ApiError> {
        self.send_without_body(
            self.client
                .delete(self.endpoint(&format!("/api/etiquetas/{}", id))?),
            "DELETE /api/etiquetas/:id",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_rooted_at_the_origin() {
        let client = MovementsClient::new("http://localhost:8000/", None).unwrap();
        assert_eq!(
            client.endpoint("/api/movimientos/").unwrap().as_str(),
            "http://localhost:8000/api/movimientos/"
        );
        assert_eq!(
            client
                .endpoint("/api/movimientos/2024-03-15/gasto/4")
                .unwrap()
                .as_str(),
            "http://localhost:8000/api/movimientos/2024-03-15/gasto/4"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            MovementsClient::new("not a url", None),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn empty_token_is_dropped() {
        let client = MovementsClient::new("http://localhost:8000", Some(String::new())).unwrap();
        assert!(client.token.is_none());
    }

    #[tokio::test]
    async fn truncated_response_body_is_an_error() {
        use time::macros::date;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 64\r\n\r\n{\"ok\"")
                .await
                .unwrap();
        });

        let client = MovementsClient::new(&format!("http://{}", addr), None).unwrap();
        let result = client.delete_movement(date!(2024 - 03 - 15)).await;

        assert!(matches!(result, Err(ApiError::Request(_))));
    }
}
