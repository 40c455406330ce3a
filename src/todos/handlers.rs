use axum::{
    extract::State,
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
};

use super::dto::{CreateTodoForm, DeleteTodoForm, UpdateTodoForm};
use super::repo_types::{Todo, TodoPatch};

const MAX_TITLE_LEN: usize = 500;

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/update", post(update_todo))
        .route("/todos/delete", post(delete_todo))
}

fn clean_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::InvalidInput("Title is too long"));
    }
    Ok(title.to_string())
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_todos(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state.todos.list_by_user(user.id).await?;
    Ok(Json(todos))
}

#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create_todo(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<CreateTodoForm>,
) -> Result<Redirect, AppError> {
    let title = clean_title(&form.title)?;
    let todo = state.todos.create(user.id, &title).await?;
    info!(todo_id = %todo.id, "todo created");
    Ok(Redirect::to("/todos"))
}

#[instrument(skip(state, user, form), fields(user_id = %user.id, todo_id = %form.id))]
pub async fn update_todo(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<UpdateTodoForm>,
) -> Result<Redirect, AppError> {
    let patch = TodoPatch {
        title: form.title.as_deref().map(clean_title).transpose()?,
        completed: form.completed,
    };
    match state.todos.update(user.id, form.id, patch).await? {
        Some(todo) => {
            info!(completed = todo.completed, "todo updated");
            Ok(Redirect::to("/todos"))
        }
        None => {
            warn!("update of unknown todo");
            Err(AppError::NotFound)
        }
    }
}

#[instrument(skip(state, user, form), fields(user_id = %user.id, todo_id = %form.id))]
pub async fn delete_todo(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<DeleteTodoForm>,
) -> Result<Redirect, AppError> {
    if !state.todos.delete(user.id, form.id).await? {
        warn!("delete of unknown todo");
        return Err(AppError::NotFound);
    }
    info!("todo deleted");
    Ok(Redirect::to("/todos"))
}
