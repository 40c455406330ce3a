use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{CallbackParams, LoginForm, RegisterForm},
        identity::resolve_external_identity,
        oauth::Provider,
        services::{login_local, register_local},
        session::{self, AuthState},
    },
    error::AppError,
    pages,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout))
        .route("/auth/google", get(google_start))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/github", get(github_start))
        .route("/auth/github/callback", get(github_callback))
}

pub async fn login_page(auth: AuthState) -> Response {
    match auth {
        AuthState::Authenticated(_) => Redirect::to("/todos").into_response(),
        AuthState::Unauthenticated => Html(pages::LOGIN).into_response(),
    }
}

pub async fn register_page(auth: AuthState) -> Response {
    match auth {
        AuthState::Authenticated(_) => Redirect::to("/todos").into_response(),
        AuthState::Unauthenticated => Html(pages::REGISTER).into_response(),
    }
}

#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    let user = register_local(state.users.as_ref(), &form.name, &form.email, &form.password).await?;
    session::establish(&session, &user).await?;
    Ok(Redirect::to("/todos"))
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    let user = login_local(state.users.as_ref(), &form.email, &form.password).await?;
    session::establish(&session, &user).await?;
    Ok(Redirect::to("/todos"))
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    session::clear(&session).await?;
    Ok(Redirect::to("/"))
}

pub async fn google_start(state: State<AppState>, session: Session) -> Result<Redirect, AppError> {
    start(state, session, Provider::Google).await
}

pub async fn github_start(state: State<AppState>, session: Session) -> Result<Redirect, AppError> {
    start(state, session, Provider::Github).await
}

pub async fn google_callback(
    state: State<AppState>,
    session: Session,
    params: Query<CallbackParams>,
) -> Result<Redirect, AppError> {
    callback(state, session, params, Provider::Google).await
}

pub async fn github_callback(
    state: State<AppState>,
    session: Session,
    params: Query<CallbackParams>,
) -> Result<Redirect, AppError> {
    callback(state, session, params, Provider::Github).await
}

#[instrument(skip(state, session))]
async fn start(
    State(state): State<AppState>,
    session: Session,
    provider: Provider,
) -> Result<Redirect, AppError> {
    let Some(client) = state.oauth.get(provider) else {
        warn!(%provider, "oauth provider not configured");
        return Ok(Redirect::to("/login?error=provider_unavailable"));
    };

    let (url, pending) = client.authorize_url();
    session::store_pending(&session, &pending).await?;
    info!(provider = %client.provider(), "redirecting to oauth provider");
    Ok(Redirect::to(&url))
}

#[instrument(skip(state, session, params))]
async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
    provider: Provider,
) -> Result<Redirect, AppError> {
    let pending = session::take_pending(&session).await?;

    if let Some(error) = params.error {
        return Err(AppError::OAuth(format!("{provider} returned error: {error}")));
    }
    let client = state
        .oauth
        .get(provider)
        .ok_or_else(|| AppError::OAuth(format!("{provider} is not configured")))?;
    let code = params
        .code
        .ok_or_else(|| AppError::OAuth("callback missing code".into()))?;
    let pending = pending
        .filter(|p| p.provider == provider)
        .ok_or_else(|| AppError::OAuth("no authorization in progress".into()))?;
    if params.state.as_deref() != Some(pending.csrf_state.as_str()) {
        return Err(AppError::OAuth("state mismatch".into()));
    }

    let profile = client.exchange_code(&code, pending.pkce_verifier).await?;
    let user = resolve_external_identity(state.users.as_ref(), provider, &profile).await?;
    session::establish(&session, &user).await?;
    info!(%provider, user_id = %user.id, "user logged in via oauth");
    Ok(Redirect::to("/todos"))
}
