//! HTTP API Client
//!
//! Admin API calls over `gloo-net`. Every call returns an [`ApiResult`] so the
//! views can show what went wrong.

use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use termine_admin::{ApiError, ApiResult, AppointmentBatch, NewUser, User};

/// Admin API client bound to one base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminApi {
    base_url: String,
}

impl AdminApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /user`
    pub async fn fetch_users(&self) -> ApiResult<Vec<User>> {
        let response = Request::get(&self.url("/user"))
            .send()
            .await
            .map_err(network_error)?;
        let response = accept(response, |status| status == 200).await?;
        decode(response).await
    }

    /// `PATCH /user` with the full user record
    pub async fn patch_user(&self, user: &User) -> ApiResult<()> {
        let response = Request::patch(&self.url("/user"))
            .json(user)
            .map_err(encode_error)?
            .send()
            .await
            .map_err(network_error)?;
        accept(response, |status| status == 200).await?;
        Ok(())
    }

    /// `PUT /user`
    pub async fn add_user(&self, user: &NewUser) -> ApiResult<()> {
        let response = Request::put(&self.url("/user"))
            .json(user)
            .map_err(encode_error)?
            .send()
            .await
            .map_err(network_error)?;
        accept(response, is_created).await?;
        Ok(())
    }

    /// `PUT /appointments`
    pub async fn add_appointments(&self, batch: &AppointmentBatch) -> ApiResult<()> {
        let response = Request::put(&self.url("/appointments"))
            .json(batch)
            .map_err(encode_error)?
            .send()
            .await
            .map_err(network_error)?;
        accept(response, is_created).await?;
        Ok(())
    }
}

fn is_created(status: u16) -> bool {
    status == 200 || status == 201
}

async fn accept(response: Response, accept: fn(u16) -> bool) -> ApiResult<Response> {
    let status = response.status();
    if accept(status) {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    web_sys::console::error_1(&format!("{} {}: {}", status, response.url(), message).into());
    Err(ApiError::Server { status, message })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn network_error(e: gloo_net::Error) -> ApiError {
    web_sys::console::error_1(&format!("Network error: {}", e).into());
    ApiError::Network(e.to_string())
}

fn encode_error(e: gloo_net::Error) -> ApiError {
    ApiError::Decode(format!("Request build error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let api = AdminApi::new("https://termine.example/admin_api");
        assert_eq!(api.url("/user"), "https://termine.example/admin_api/user");
        assert_eq!(
            api.url("/appointments"),
            "https://termine.example/admin_api/appointments"
        );
    }

    #[test]
    fn test_created_statuses() {
        assert!(is_created(200));
        assert!(is_created(201));
        assert!(!is_created(204));
        assert!(!is_created(400));
    }
}
