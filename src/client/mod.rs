//! Admin API Client
//!
//! The [`UserApi`] trait describes the admin REST endpoints the back office
//! talks to; [`HttpUserApi`] implements it over `reqwest`.

mod http;

use async_trait::async_trait;

use crate::users::{ApiResult, AppointmentBatch, NewUser, User};

pub use http::{ClientConfig, HttpUserApi, REQUEST_ID_HEADER};

/// Operations of the admin REST API
#[async_trait]
pub trait UserApi: Send + Sync {
    /// `GET /user`
    async fn fetch_users(&self) -> ApiResult<Vec<User>>;

    /// `PATCH /user` with the full user record
    async fn patch_user(&self, user: &User) -> ApiResult<()>;

    /// `PUT /user`
    async fn add_user(&self, user: &NewUser) -> ApiResult<()>;

    /// `PUT /appointments`
    async fn add_appointments(&self, batch: &AppointmentBatch) -> ApiResult<()>;

    /// `PATCH /coupon`: relative coupon change, negative to take coupons away
    async fn increment_coupons(&self, user_name: &str, increment: i64) -> ApiResult<()>;

    /// `GET /healthcheck`
    async fn health(&self) -> ApiResult<()>;
}
