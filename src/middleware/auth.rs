use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::Backend;
use crate::config::Config;
use crate::error::AppError;
use crate::models::UserRole;
use crate::services::{
    AuthService, EventBus, LiveView, MatchingService, Notifier, RequestService, ReviewService,
};

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if is_admin(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if is_staff(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn Backend>,
    pub events: EventBus,
    pub notifier: Arc<dyn Notifier>,
    pub live_view: Arc<RwLock<LiveView>>,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn Backend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            backend,
            events: EventBus::default(),
            notifier,
            live_view: Arc::new(RwLock::new(LiveView::new())),
        }
    }

    pub fn requests(&self) -> RequestService {
        RequestService::new(
            self.backend.clone(),
            self.events.clone(),
            self.notifier.clone(),
        )
    }

    pub fn matching(&self) -> MatchingService {
        MatchingService::new(self.backend.clone(), self.events.clone())
    }

    pub fn reviews(&self) -> ReviewService {
        ReviewService::new(self.backend.clone(), self.events.clone())
    }
}

pub fn is_admin(role: &UserRole) -> bool {
    matches!(role, UserRole::Admin)
}

pub fn is_staff(role: &UserRole) -> bool {
    matches!(role, UserRole::Admin | UserRole::Technician)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(state);
    next.run(request).await
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let app_state = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| AppError::Internal("auth middleware not installed".to_string()))?;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let secret = app_state
            .config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| AppError::Internal("SUPABASE_JWT_SECRET is not set".to_string()))?;

        let (user_id, token_role) = AuthService::new(secret).authenticate(token)?;

        // The profile row is authoritative; token metadata covers users without one.
        let role = app_state
            .backend
            .get_profile(user_id)
            .await?
            .map_or(token_role, |profile| profile.role);

        Ok(AuthUser { user_id, role })
    }
}
