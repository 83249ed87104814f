use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Charm Cards API",
        version = "1.0.0",
        description = "API documentation for the Charm digital business card service. \n\n**Authentication:** Most endpoints require a JWT Bearer token under the `/charm` prefix.\n\n**Features:**\n- Email/password authentication with OTP password reset\n- Digital card (vCard) management with photo upload\n- Public QR scan tracking with location telemetry\n- Admin notifications fan-out\n- Staff and billing administration",
        contact(
            name = "Charm Cards Team",
            email = "support@charmcards.app"
        )
    ),
    paths(
        // Auth endpoints
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::forgot_password,

        // Cards & scans
        crate::api::vcards::public_card,
        crate::api::scans::track_scan,

        // Notifications
        crate::api::notifications::list_notifications,

        // Admin
        crate::api::admin::list_staff,
        crate::api::admin::update_bills,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::ForgotPasswordRequest,
            crate::models::UserInfo,
            crate::models::Agility,
            crate::models::Bills,

            // Cards
            crate::models::CreateVCardRequest,
            crate::models::UpdateVCardRequest,
            crate::models::VCardResponse,

            // Scans
            crate::services::scan_service::TrackRequest,
            crate::services::scan_service::GeoPoint,
            crate::models::ScanLogResponse,

            // Notifications
            crate::models::NotificationResponse,

            // Admin
            crate::services::admin_service::CreateStaffRequest,
            crate::services::admin_service::CreateStaffResponse,
            crate::services::admin_service::UpdateBillsRequest,
            crate::services::admin_service::UserWithStats,
            crate::services::admin_service::CardWithStats,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and OTP-based password reset."),
        (name = "Cards", description = "Digital business card management and the public QR landing payload."),
        (name = "Scans", description = "Public scan tracking. Every scan writes an audit log and notifies the card owner plus all admins."),
        (name = "Notifications", description = "Per-user notification inbox fed by the fan-out on every relevant mutation."),
        (name = "Admin", description = "Staff management, user administration and billing status updates."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
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
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
