use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HomeFix API",
        version = "1.0.0",
        description = "Backend API for HomeFix - home services booking and technician dispatch",
        contact(
            name = "HomeFix Team",
            email = "support@homefix.sa"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "requests", description = "Customer intake, tracking and ratings"),
        (name = "parts", description = "Spare parts catalog"),
        (name = "admin", description = "Dispatch console"),
        (name = "technician", description = "Technician task list"),
        (name = "events", description = "Live change feed")
    ),
    paths(
        // Requests
        crate::api::requests::create_request,
        crate::api::requests::track_request,
        crate::api::requests::submit_review,
        // Parts
        crate::api::parts::list_parts,
        // Admin
        crate::api::admin::dashboard,
        crate::api::admin::list_requests,
        crate::api::admin::get_request,
        crate::api::admin::list_candidates,
        crate::api::admin::assign_technician,
        crate::api::admin::update_status,
        crate::api::admin::update_notes,
        crate::api::admin::list_reviews,
        // Technician
        crate::api::technician::list_tasks,
        crate::api::technician::update_status,
        // Events
        crate::api::events::stream_events,
    ),
    components(
        schemas(
            // Requests
            crate::models::ServiceType,
            crate::models::PreferredTime,
            crate::models::RequestStatus,
            crate::models::Location,
            crate::models::CreateServiceRequest,
            crate::models::ServiceRequestResponse,
            crate::models::RequestTrackingResponse,
            crate::models::UpdateStatusRequest,
            crate::models::UpdateNotesRequest,
            crate::models::AssignTechnicianRequest,
            // Technicians
            crate::models::TechnicianStatus,
            crate::models::GeoPoint,
            crate::models::Technician,
            crate::models::RankedTechnician,
            crate::models::AssignmentResponse,
            // Reviews
            crate::models::SatisfactionLevel,
            crate::models::Review,
            crate::models::SubmitReviewRequest,
            // Parts
            crate::models::Part,
            // Events
            crate::models::Table,
            crate::models::ChangeKind,
            crate::models::ChangeEvent,
            crate::models::StatusCount,
            crate::models::DashboardResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
