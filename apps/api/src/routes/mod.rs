pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{achievements, auth, billing, calendar, contacts, insights, jobs, oauth, pipeline};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/auth/session", post(auth::handlers::handle_mint_session))
        .route("/api/v1/auth/logout", post(auth::handlers::handle_logout))
        .route("/api/v1/auth/me", get(auth::handlers::handle_me))
        // OAuth handshake (both providers go through the same handlers)
        .route(
            "/api/v1/oauth/:provider/connect",
            get(oauth::handshake::handle_connect),
        )
        .route(
            "/api/v1/oauth/:provider/callback",
            get(oauth::handshake::handle_callback),
        )
        .route("/api/v1/oauth/status", get(oauth::handshake::handle_status))
        // Calendar
        .route(
            "/api/v1/calendar/events",
            get(calendar::handlers::handle_list_events),
        )
        .route(
            "/api/v1/calendar/disconnect",
            post(calendar::handlers::handle_disconnect),
        )
        // Processes & interview steps
        .route(
            "/api/v1/processes",
            post(pipeline::handlers::handle_create_process)
                .get(pipeline::handlers::handle_list_processes),
        )
        .route(
            "/api/v1/processes/:id",
            get(pipeline::handlers::handle_get_process)
                .patch(pipeline::handlers::handle_update_process)
                .delete(pipeline::handlers::handle_delete_process),
        )
        .route(
            "/api/v1/processes/:id/steps",
            post(pipeline::handlers::handle_create_step),
        )
        .route(
            "/api/v1/processes/:id/steps/from-event",
            post(pipeline::handlers::handle_import_event),
        )
        .route(
            "/api/v1/processes/:id/recommendation",
            post(insights::handlers::handle_recommend),
        )
        .route("/api/v1/steps/:id", patch(pipeline::handlers::handle_update_step))
        .route(
            "/api/v1/steps/:id/link-event",
            post(pipeline::handlers::handle_link_event),
        )
        .route(
            "/api/v1/steps/:id/unlink-event",
            post(pipeline::handlers::handle_unlink_event),
        )
        // Achievements
        .route(
            "/api/v1/achievements",
            post(achievements::handle_create_achievement).get(achievements::handle_list_achievements),
        )
        .route(
            "/api/v1/achievements/:id",
            patch(achievements::handle_update_achievement)
                .delete(achievements::handle_delete_achievement),
        )
        // Contacts
        .route(
            "/api/v1/contacts",
            post(contacts::handle_create_contact).get(contacts::handle_list_contacts),
        )
        .route(
            "/api/v1/contacts/:id",
            patch(contacts::handle_update_contact).delete(contacts::handle_delete_contact),
        )
        // Insights
        .route("/api/v1/insights/ask", post(insights::handlers::handle_ask))
        // Bookings & billing
        .route(
            "/api/v1/bookings",
            post(billing::handlers::handle_create_booking).get(billing::handlers::handle_list_bookings),
        )
        .route("/api/v1/billing/webhook", post(billing::handlers::handle_webhook))
        // Jobs
        .route("/api/v1/jobs/reminders", post(jobs::handle_reminders))
        .with_state(state)
}
