use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::config::HydrationSettings;
use crate::domain::Page;
use crate::hydration::{parse_filter, HydrationError, OrderHydrator, SimpleStrategy, Strategy};

use super::ApiError;

pub struct AppState {
    pub hydrator: OrderHydrator,
    pub settings: HydrationSettings,
}

/// Query string shared by both order listings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub member_name: Option<String>,
    pub status: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub strategy: Option<String>,
}

impl OrderQuery {
    fn page(&self, settings: &HydrationSettings) -> Result<Page, ApiError> {
        let page = Page::capped(
            self.offset.unwrap_or(0),
            self.limit.unwrap_or(settings.default_page_limit),
            settings.max_page_limit,
        )
        .map_err(HydrationError::from)?;
        Ok(page)
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse, ApiError> {
    let strategy = match query.strategy.as_deref() {
        Some(raw) => raw
            .parse::<Strategy>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => state.settings.default_strategy,
    };
    let search = parse_filter(query.member_name.as_deref(), query.status.as_deref())?;
    let page = query.page(&state.settings)?;

    let summaries = state
        .hydrator
        .fetch_order_summaries(&search, Some(page), strategy)
        .await?;

    Ok(HttpResponse::Ok().json(ListResponse::from(summaries)))
}

pub async fn list_simple_orders(
    state: web::Data<AppState>,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse, ApiError> {
    let strategy = match query.strategy.as_deref() {
        Some(raw) => raw
            .parse::<SimpleStrategy>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => SimpleStrategy::default(),
    };
    let search = parse_filter(query.member_name.as_deref(), query.status.as_deref())?;
    let page = query.page(&state.settings)?;

    let hydrated = state
        .hydrator
        .fetch_simple_summaries(&search, Some(page), strategy)
        .await?;

    Ok(HttpResponse::Ok().json(ListResponse::from(hydrated.summaries)))
}
