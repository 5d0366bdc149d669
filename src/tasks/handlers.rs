use axum::{
    extract::State,
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::{method_not_allowed, AppError, RepoError},
    extract::{ApiJson, TaskIdPath},
    state::AppState,
    tasks::{
        dto::{CreateTaskRequest, UpdateTaskRequest},
        repo_types::Task,
    },
};

const TASK_NOT_FOUND: AppError = AppError::NotFound("Task not found");

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tasks",
            get(list_tasks)
                .post(create_task)
                .fallback(method_not_allowed("GET, HEAD, POST")),
        )
        .route(
            "/tasks/:id",
            get(get_task)
                .patch(update_task)
                .delete(delete_task)
                .fallback(method_not_allowed("GET, HEAD, PATCH, DELETE")),
        )
}

#[instrument(skip(state, auth), fields(user_id = %auth.id()))]
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.tasks.list_by_owner(auth.id()).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state, auth), fields(user_id = %auth.id()))]
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    TaskIdPath(id): TaskIdPath,
) -> Result<Json<Task>, AppError> {
    match state.tasks.get_by_id_for_owner(auth.id(), id).await? {
        Some(task) => Ok(Json(task)),
        None => Err(TASK_NOT_FOUND),
    }
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.id()))]
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Task>), AppError> {
    let draft = payload
        .into_new_task(auth.id())
        .map_err(AppError::Validation)?;

    let task = match state.tasks.create(draft).await {
        Ok(t) => t,
        Err(RepoError::UnknownOwner) => {
            // user vanished between auth and insert
            error!("authenticated user has no row");
            return Err(AppError::Unauthorized("Invalid or expired token"));
        }
        Err(e) => return Err(e.into()),
    };

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/tasks/{}", task.id)) {
        headers.insert(LOCATION, location);
    }

    info!(task_id = task.id, "task created");
    Ok((StatusCode::CREATED, headers, Json(task)))
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.id()))]
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthUser,
    TaskIdPath(id): TaskIdPath,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let mut task = state
        .tasks
        .get_by_id_for_owner(auth.id(), id)
        .await?
        .ok_or(TASK_NOT_FOUND)?;
    payload.apply_to(&mut task);

    match state.tasks.update(&task).await {
        Ok(updated) => {
            info!(task_id = id, "task updated");
            Ok(Json(updated))
        }
        Err(RepoError::NotFound) => {
            // deleted concurrently
            warn!(task_id = id, "task disappeared during update");
            Err(TASK_NOT_FOUND)
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, auth), fields(user_id = %auth.id()))]
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    TaskIdPath(id): TaskIdPath,
) -> Result<StatusCode, AppError> {
    if state.tasks.delete_for_owner(auth.id(), id).await? {
        info!(task_id = id, "task deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(TASK_NOT_FOUND)
    }
}
