//! Catalog endpoint.

use axum::Json;

use crmflow_domain::catalog::{Catalog, catalog};

/// `GET /api/catalog`: triggers, actions and target groups on offer.
pub async fn get() -> Json<Catalog> {
    Json(catalog())
}
