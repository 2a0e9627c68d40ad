use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{
    Backend, BackendError, BackendResult, RequestFilter, PARTS_CATALOG, PROFILES, REVIEWS,
    SERVICE_REQUESTS, TECHNICIANS,
};
use crate::config::Config;
use crate::models::{
    AuthUserRecord, NewAuthUser, NewReview, NewServiceRequest, Part, Profile, Review,
    ServiceRequest, ServiceRequestPatch, ServiceType, Technician, TechnicianFilter,
    TechnicianStatus, UpsertProfile,
};

const RETURN_REPRESENTATION: &str = "return=representation";
const UPSERT_REPRESENTATION: &str = "resolution=merge-duplicates,return=representation";

/// HTTP client for the hosted backend: data API under `/rest/v1`, auth admin
/// API under `/auth/v1`. Authenticates every call with the service key.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct UserList {
    users: Vec<AuthUserRecord>,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            service_key: config.service_role_key.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, &format!("/rest/v1/{}", table))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> BackendResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("Backend API error: {} - {}", status, body);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> BackendResult<Vec<T>> {
        let builder = self
            .table(Method::GET, table)
            .query(&[("select", "*")])
            .query(filters);
        self.send(builder).await
    }

    async fn select_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        id: Uuid,
    ) -> BackendResult<Option<T>> {
        let rows: Vec<T> = self.select(table, &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &'static str,
        body: &B,
    ) -> BackendResult<T> {
        let builder = self
            .table(Method::POST, table)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body);
        let rows: Vec<T> = self.send(builder).await?;
        rows.into_iter().next().ok_or_else(|| BackendError::Status {
            status: 201,
            body: format!("insert into {} returned no rows", table),
        })
    }

    async fn update<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &'static str,
        id: Uuid,
        body: &B,
    ) -> BackendResult<T> {
        let builder = self
            .table(Method::PATCH, table)
            .query(&[("id", eq(id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body);
        let rows: Vec<T> = self.send(builder).await?;
        rows.into_iter()
            .next()
            .ok_or(BackendError::NotFound { table, id })
    }

    /// Calls a database function exposed through the data API.
    pub async fn rpc(&self, function: &str, args: &Value) -> BackendResult<Value> {
        let builder = self
            .request(Method::POST, &format!("/rest/v1/rpc/{}", function))
            .json(args);
        self.send(builder).await
    }

    /// Cheap read used to prove the data API answers with this key.
    pub async fn probe_table(&self, table: &str) -> BackendResult<Vec<Value>> {
        let builder = self
            .table(Method::GET, table)
            .query(&[("select", "*"), ("limit", "1")]);
        self.send(builder).await
    }

    pub async fn create_auth_user(&self, user: &NewAuthUser) -> BackendResult<AuthUserRecord> {
        let builder = self
            .request(Method::POST, "/auth/v1/admin/users")
            .json(user);
        self.send(builder).await
    }

    pub async fn list_auth_users(&self) -> BackendResult<Vec<AuthUserRecord>> {
        let list: UserList = self
            .send(self.request(Method::GET, "/auth/v1/admin/users"))
            .await?;
        Ok(list.users)
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

fn request_filters(filter: &RequestFilter) -> Vec<(&'static str, String)> {
    let mut filters = vec![("order", "created_at.desc".to_string())];
    if let Some(statuses) = &filter.statuses {
        let list: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        filters.push(("status", format!("in.({})", list.join(","))));
    }
    if let Some(technician) = filter.assigned_technician {
        filters.push(("assigned_technician", eq(technician)));
    }
    filters
}

fn technician_filters(filter: &TechnicianFilter) -> Vec<(&'static str, String)> {
    let mut filters = Vec::new();
    if let Some(status) = filter.status {
        filters.push(("status", eq(status.as_str())));
    }
    if let Some(skill) = filter.skill {
        filters.push(("skills", format!("cs.{{{}}}", skill.as_str())));
    }
    filters
}

#[axum::async_trait]
impl Backend for SupabaseClient {
    async fn list_service_requests(
        &self,
        filter: &RequestFilter,
    ) -> BackendResult<Vec<ServiceRequest>> {
        self.select(SERVICE_REQUESTS, &request_filters(filter)).await
    }

    async fn get_service_request(&self, id: Uuid) -> BackendResult<Option<ServiceRequest>> {
        self.select_by_id(SERVICE_REQUESTS, id).await
    }

    async fn insert_service_request(
        &self,
        request: &NewServiceRequest,
    ) -> BackendResult<ServiceRequest> {
        self.insert(SERVICE_REQUESTS, request).await
    }

    async fn update_service_request(
        &self,
        id: Uuid,
        patch: &ServiceRequestPatch,
    ) -> BackendResult<ServiceRequest> {
        self.update(SERVICE_REQUESTS, id, patch).await
    }

    async fn list_technicians(&self, filter: &TechnicianFilter) -> BackendResult<Vec<Technician>> {
        self.select(TECHNICIANS, &technician_filters(filter)).await
    }

    async fn get_technician(&self, id: Uuid) -> BackendResult<Option<Technician>> {
        self.select_by_id(TECHNICIANS, id).await
    }

    async fn update_technician_status(
        &self,
        id: Uuid,
        status: TechnicianStatus,
    ) -> BackendResult<Technician> {
        self.update(TECHNICIANS, id, &json!({ "status": status }))
            .await
    }

    async fn list_parts(&self, category: ServiceType) -> BackendResult<Vec<Part>> {
        self.select(
            PARTS_CATALOG,
            &[
                ("category", eq(category.as_str())),
                ("is_active", eq(true)),
                ("order", "name.asc".to_string()),
            ],
        )
        .await
    }

    async fn get_part(&self, id: Uuid) -> BackendResult<Option<Part>> {
        self.select_by_id(PARTS_CATALOG, id).await
    }

    async fn insert_review(&self, review: &NewReview) -> BackendResult<Review> {
        self.insert(REVIEWS, review).await
    }

    async fn list_reviews(&self, request_id: Uuid) -> BackendResult<Vec<Review>> {
        self.select(
            REVIEWS,
            &[
                ("request_id", eq(request_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn get_profile(&self, id: Uuid) -> BackendResult<Option<Profile>> {
        self.select_by_id(PROFILES, id).await
    }

    async fn list_profiles(&self) -> BackendResult<Vec<Profile>> {
        self.select(PROFILES, &[]).await
    }

    async fn upsert_profile(&self, profile: &UpsertProfile) -> BackendResult<Profile> {
        let builder = self
            .table(Method::POST, PROFILES)
            .header("Prefer", UPSERT_REPRESENTATION)
            .json(profile);
        let rows: Vec<Profile> = self.send(builder).await?;
        rows.into_iter()
            .next()
            .ok_or(BackendError::NotFound {
                table: PROFILES,
                id: profile.id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestStatus;

    #[test]
    fn request_filters_use_in_list_and_newest_first() {
        let filter = RequestFilter {
            statuses: Some(vec![RequestStatus::Pending, RequestStatus::InProgress]),
            assigned_technician: None,
        };
        let filters = request_filters(&filter);
        assert_eq!(filters[0], ("order", "created_at.desc".to_string()));
        assert_eq!(filters[1], ("status", "in.(pending,in_progress)".to_string()));
    }

    #[test]
    fn technician_filters_use_array_containment() {
        let filters = technician_filters(&TechnicianFilter::available_for(ServiceType::Ac));
        assert_eq!(
            filters,
            vec![
                ("status", "eq.available".to_string()),
                ("skills", "cs.{ac}".to_string()),
            ]
        );
    }
}
