// ABOUTME: HTTP handlers for solution endpoints
// ABOUTME: CRUD plus departments listing and per-solution tag management

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use std::str::FromStr;
use tracing::info;

use compass_core::{SolutionCreateInput, SolutionUpdateInput};
use compass_storage::{DbState, SolutionFilter};

use crate::auth::Actor;
use crate::pagination::{default_limit, PageQuery};
use crate::response::{bad_request, not_found, ApiResult, ListResponse};

pub fn router() -> Router<DbState> {
    Router::new()
        .route("/", get(list_solutions).post(create_solution))
        .route("/departments", get(list_departments))
        .route(
            "/{slug}",
            get(get_solution).put(update_solution).delete(delete_solution),
        )
        .route("/{slug}/tags", get(list_solution_tags))
        .route(
            "/{slug}/tags/{name}",
            put(add_solution_tag).delete(remove_solution_tag),
        )
}

#[derive(Debug, Deserialize)]
struct SolutionListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    sort: Option<String>,
    category: Option<String>,
    department: Option<String>,
    team: Option<String>,
    recommend_status: Option<String>,
    radar_status: Option<String>,
    stage: Option<String>,
}

impl SolutionListQuery {
    fn filter(&self) -> ApiResult<SolutionFilter> {
        Ok(SolutionFilter {
            category: self.category.clone(),
            department: self.department.clone(),
            team: self.team.clone(),
            recommend_status: self
                .recommend_status
                .as_deref()
                .map(FromStr::from_str)
                .transpose()
                .map_err(|e: String| bad_request("recommend_status", e))?,
            radar_status: self
                .radar_status
                .as_deref()
                .map(FromStr::from_str)
                .transpose()
                .map_err(|e: String| bad_request("radar_status", e))?,
            stage: self
                .stage
                .as_deref()
                .map(FromStr::from_str)
                .transpose()
                .map_err(|e: String| bad_request("stage", e))?,
        })
    }

    fn page(&self) -> PageQuery {
        PageQuery {
            skip: self.skip,
            limit: self.limit,
            sort: self.sort.clone(),
        }
    }
}

async fn create_solution(
    State(state): State<DbState>,
    actor: Actor,
    Json(input): Json<SolutionCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let solution = state.solution_storage.create(input, &actor.0).await?;
    info!("Created solution: {}", solution.slug);
    Ok((StatusCode::CREATED, Json(solution)))
}

async fn list_solutions(
    State(state): State<DbState>,
    Query(query): Query<SolutionListQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = query.filter()?;
    let page = query.page();
    let (items, total) = state
        .solution_storage
        .list(&filter, page.skip(), page.limit(), page.sort("name"))
        .await?;

    Ok(Json(ListResponse {
        items,
        total,
        skip: page.skip(),
        limit: page.limit(),
    }))
}

async fn get_solution(
    State(state): State<DbState>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let solution = state
        .solution_storage
        .get_by_slug(&slug)
        .await?
        .ok_or(not_found("Solution"))?;
    Ok(Json(solution))
}

async fn update_solution(
    State(state): State<DbState>,
    Path(slug): Path<String>,
    actor: Actor,
    Json(input): Json<SolutionUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    let solution = state
        .solution_storage
        .update_by_slug(&slug, input, &actor.0)
        .await?;
    info!("Updated solution: {}", solution.slug);
    Ok(Json(solution))
}

async fn delete_solution(
    State(state): State<DbState>,
    Path(slug): Path<String>,
    actor: Actor,
) -> ApiResult<impl IntoResponse> {
    if !state.solution_storage.delete_by_slug(&slug).await? {
        return Err(not_found("Solution"));
    }
    info!("Deleted solution: {} (by {})", slug, actor.0);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_departments(State(state): State<DbState>) -> ApiResult<impl IntoResponse> {
    let departments = state.solution_storage.departments().await?;
    Ok(Json(departments))
}

async fn list_solution_tags(
    State(state): State<DbState>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let solution = state
        .solution_storage
        .get_by_slug(&slug)
        .await?
        .ok_or(not_found("Solution"))?;
    Ok(Json(solution.tags))
}

async fn add_solution_tag(
    State(state): State<DbState>,
    Path((slug, name)): Path<(String, String)>,
    actor: Actor,
) -> ApiResult<impl IntoResponse> {
    let solution = state
        .solution_storage
        .get_by_slug(&slug)
        .await?
        .ok_or(not_found("Solution"))?;

    if solution.tags.iter().any(|t| t == &name) {
        return Ok(Json(solution));
    }

    let mut tags = solution.tags;
    tags.push(name);
    let update = SolutionUpdateInput {
        tags: Some(tags),
        ..Default::default()
    };
    let solution = state
        .solution_storage
        .update_by_slug(&slug, update, &actor.0)
        .await?;
    Ok(Json(solution))
}

async fn remove_solution_tag(
    State(state): State<DbState>,
    Path((slug, name)): Path<(String, String)>,
    actor: Actor,
) -> ApiResult<impl IntoResponse> {
    let solution = state
        .solution_storage
        .get_by_slug(&slug)
        .await?
        .ok_or(not_found("Solution"))?;

    if !solution.tags.iter().any(|t| t == &name) {
        return Err(not_found("Tag"));
    }

    let tags = solution.tags.into_iter().filter(|t| t != &name).collect();
    let update = SolutionUpdateInput {
        tags: Some(tags),
        ..Default::default()
    };
    let solution = state
        .solution_storage
        .update_by_slug(&slug, update, &actor.0)
        .await?;
    Ok(Json(solution))
}
