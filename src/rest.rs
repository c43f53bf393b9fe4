//! REST API for the CAPS registry.
//!
//! Handlers are thin: they parse path and query parameters, call a core service, and map
//! [`CapsError`] onto a status code. Error details are logged, never returned to the client.

use axum::{
    Router,
    extract::{Path as AxumPath, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
};
use caps_core::{
    AttendanceService, CapsError, CoreConfig, DashboardService, ExportService, PatientService,
    ProcedureService, ProfessionalService, Registry,
};
use caps_types::{
    Address, Attendance, AttendanceAction, AttendanceActionDetails, AttendanceDetails, Contact,
    PatientDestination, PatientDetails, PatientOrigin, Patient, Procedure, ProcedureDetails,
    Professional, ProfessionalDetails, RaceColor, RecordId, Sex, YesNo,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, &'static str);

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    patients: PatientService,
    professionals: ProfessionalService,
    procedures: ProcedureService,
    attendances: AttendanceService,
    dashboard: DashboardService,
    export: ExportService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, registry: Arc<Registry>) -> Self {
        Self {
            patients: PatientService::new(registry.clone()),
            professionals: ProfessionalService::new(registry.clone()),
            procedures: ProcedureService::new(registry.clone()),
            attendances: AttendanceService::new(registry.clone()),
            dashboard: DashboardService::new(registry.clone()),
            export: ExportService::new(cfg, registry),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct StatsRes {
    pub patients: usize,
    pub professionals: usize,
    pub procedures: usize,
    pub attendances: usize,
    pub actions: usize,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActiveFilter {
    /// Leave out inactive records
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Generation date (YYYY-MM-DD); defaults to today
    #[param(value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        stats,
        list_patients,
        create_patient,
        get_patient,
        update_patient,
        delete_patient,
        list_professionals,
        create_professional,
        get_professional,
        update_professional,
        delete_professional,
        list_procedures,
        create_procedure,
        get_procedure,
        update_procedure,
        delete_procedure,
        list_attendances,
        create_attendance,
        get_attendance,
        update_attendance,
        delete_attendance,
        list_actions,
        create_action,
        delete_action,
        export_raas,
    ),
    components(schemas(
        HealthRes,
        StatsRes,
        Patient,
        PatientDetails,
        Address,
        Contact,
        Sex,
        RaceColor,
        Professional,
        ProfessionalDetails,
        Procedure,
        ProcedureDetails,
        Attendance,
        AttendanceDetails,
        PatientOrigin,
        PatientDestination,
        YesNo,
        AttendanceAction,
        AttendanceActionDetails,
    ))
)]
struct ApiDoc;

/// Builds the REST router, including the OpenAPI document and Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route(
            "/professionals",
            get(list_professionals).post(create_professional),
        )
        .route(
            "/professionals/:id",
            get(get_professional)
                .put(update_professional)
                .delete(delete_professional),
        )
        .route("/procedures", get(list_procedures).post(create_procedure))
        .route(
            "/procedures/:id",
            get(get_procedure)
                .put(update_procedure)
                .delete(delete_procedure),
        )
        .route(
            "/attendances",
            get(list_attendances).post(create_attendance),
        )
        .route(
            "/attendances/:id",
            get(get_attendance)
                .put(update_attendance)
                .delete(delete_attendance),
        )
        .route(
            "/attendances/:id/actions",
            get(list_actions).post(create_action),
        )
        .route("/actions/:id", delete(delete_action))
        .route("/export/raas", get(export_raas))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn map_error(context: &str, err: CapsError) -> ApiError {
    match err {
        CapsError::InvalidInput(_) | CapsError::Uuid(_) | CapsError::Text(_) => {
            tracing::warn!("{} rejected: {}", context, err);
            (StatusCode::BAD_REQUEST, "Invalid input")
        }
        CapsError::NotFound { .. } => {
            tracing::warn!("{}: {}", context, err);
            (StatusCode::NOT_FOUND, "Not found")
        }
        CapsError::Conflict(_) => {
            tracing::warn!("{} refused: {}", context, err);
            (StatusCode::CONFLICT, "Conflict")
        }
        CapsError::Raas(raas::RaasError::EmptyExport) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "There are no attendances to export",
        ),
        other => {
            tracing::error!("{} error: {:?}", context, other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid record id"))
}

// ============================================================================
// HEALTH & STATS
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok".into(),
    })
}

#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Record counts per collection", body = StatsRes),
        (status = 500, description = "Internal server error")
    )
)]
async fn stats(State(state): State<AppState>) -> Result<Json<StatsRes>, ApiError> {
    let counts = state
        .dashboard
        .counts()
        .map_err(|e| map_error("Stats", e))?;

    Ok(Json(StatsRes {
        patients: counts.patients,
        professionals: counts.professionals,
        procedures: counts.procedures,
        attendances: counts.attendances,
        actions: counts.actions,
    }))
}

// ============================================================================
// PATIENTS
// ============================================================================

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "Patients ordered by name", body = [Patient]),
        (status = 500, description = "Internal server error")
    )
)]
async fn list_patients(State(state): State<AppState>) -> Result<Json<Vec<Patient>>, ApiError> {
    state
        .patients
        .list()
        .map(Json)
        .map_err(|e| map_error("List patients", e))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientDetails,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Missing CNS and CPF or invalid fields"),
        (status = 500, description = "Internal server error")
    )
)]
/// Register a patient. A CNS or a CPF is required.
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<PatientDetails>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let patient = state
        .patients
        .create(req)
        .map_err(|e| map_error("Create patient", e))?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 400, description = "Invalid record id"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    state
        .patients
        .get(id)
        .map(Json)
        .map_err(|e| map_error("Get patient", e))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientDetails,
    responses(
        (status = 200, description = "Patient updated", body = Patient),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Unknown patient")
    )
)]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<PatientDetails>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    state
        .patients
        .update(id, req)
        .map(Json)
        .map_err(|e| map_error("Update patient", e))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "Unknown patient"),
        (status = 409, description = "Patient still has attendances")
    )
)]
async fn delete_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state
        .patients
        .delete(id)
        .map_err(|e| map_error("Delete patient", e))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// PROFESSIONALS
// ============================================================================

#[utoipa::path(
    get,
    path = "/professionals",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Professionals ordered by name", body = [Professional]),
        (status = 500, description = "Internal server error")
    )
)]
async fn list_professionals(
    State(state): State<AppState>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<Professional>>, ApiError> {
    state
        .professionals
        .list(filter.active_only)
        .map(Json)
        .map_err(|e| map_error("List professionals", e))
}

#[utoipa::path(
    post,
    path = "/professionals",
    request_body = ProfessionalDetails,
    responses(
        (status = 201, description = "Professional created", body = Professional),
        (status = 500, description = "Internal server error")
    )
)]
async fn create_professional(
    State(state): State<AppState>,
    Json(req): Json<ProfessionalDetails>,
) -> Result<(StatusCode, Json<Professional>), ApiError> {
    let professional = state
        .professionals
        .create(req)
        .map_err(|e| map_error("Create professional", e))?;
    Ok((StatusCode::CREATED, Json(professional)))
}

#[utoipa::path(
    get,
    path = "/professionals/{id}",
    params(("id" = String, Path, description = "Professional id")),
    responses(
        (status = 200, description = "Professional", body = Professional),
        (status = 404, description = "Unknown professional")
    )
)]
async fn get_professional(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Professional>, ApiError> {
    let id = parse_id(&id)?;
    state
        .professionals
        .get(id)
        .map(Json)
        .map_err(|e| map_error("Get professional", e))
}

#[utoipa::path(
    put,
    path = "/professionals/{id}",
    params(("id" = String, Path, description = "Professional id")),
    request_body = ProfessionalDetails,
    responses(
        (status = 200, description = "Professional updated", body = Professional),
        (status = 404, description = "Unknown professional")
    )
)]
async fn update_professional(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<ProfessionalDetails>,
) -> Result<Json<Professional>, ApiError> {
    let id = parse_id(&id)?;
    state
        .professionals
        .update(id, req)
        .map(Json)
        .map_err(|e| map_error("Update professional", e))
}

#[utoipa::path(
    delete,
    path = "/professionals/{id}",
    params(("id" = String, Path, description = "Professional id")),
    responses(
        (status = 204, description = "Professional deleted"),
        (status = 404, description = "Unknown professional"),
        (status = 409, description = "Professional is referenced by actions")
    )
)]
async fn delete_professional(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state
        .professionals
        .delete(id)
        .map_err(|e| map_error("Delete professional", e))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// PROCEDURES
// ============================================================================

#[utoipa::path(
    get,
    path = "/procedures",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Procedures ordered by SIGTAP code", body = [Procedure]),
        (status = 500, description = "Internal server error")
    )
)]
async fn list_procedures(
    State(state): State<AppState>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<Procedure>>, ApiError> {
    state
        .procedures
        .list(filter.active_only)
        .map(Json)
        .map_err(|e| map_error("List procedures", e))
}

#[utoipa::path(
    post,
    path = "/procedures",
    request_body = ProcedureDetails,
    responses(
        (status = 201, description = "Procedure created", body = Procedure),
        (status = 409, description = "SIGTAP code already registered")
    )
)]
async fn create_procedure(
    State(state): State<AppState>,
    Json(req): Json<ProcedureDetails>,
) -> Result<(StatusCode, Json<Procedure>), ApiError> {
    let procedure = state
        .procedures
        .create(req)
        .map_err(|e| map_error("Create procedure", e))?;
    Ok((StatusCode::CREATED, Json(procedure)))
}

#[utoipa::path(
    get,
    path = "/procedures/{id}",
    params(("id" = String, Path, description = "Procedure id")),
    responses(
        (status = 200, description = "Procedure", body = Procedure),
        (status = 404, description = "Unknown procedure")
    )
)]
async fn get_procedure(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Procedure>, ApiError> {
    let id = parse_id(&id)?;
    state
        .procedures
        .get(id)
        .map(Json)
        .map_err(|e| map_error("Get procedure", e))
}

#[utoipa::path(
    put,
    path = "/procedures/{id}",
    params(("id" = String, Path, description = "Procedure id")),
    request_body = ProcedureDetails,
    responses(
        (status = 200, description = "Procedure updated", body = Procedure),
        (status = 404, description = "Unknown procedure"),
        (status = 409, description = "SIGTAP code already registered")
    )
)]
async fn update_procedure(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<ProcedureDetails>,
) -> Result<Json<Procedure>, ApiError> {
    let id = parse_id(&id)?;
    state
        .procedures
        .update(id, req)
        .map(Json)
        .map_err(|e| map_error("Update procedure", e))
}

#[utoipa::path(
    delete,
    path = "/procedures/{id}",
    params(("id" = String, Path, description = "Procedure id")),
    responses(
        (status = 204, description = "Procedure deleted"),
        (status = 404, description = "Unknown procedure"),
        (status = 409, description = "Procedure is referenced by actions")
    )
)]
async fn delete_procedure(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state
        .procedures
        .delete(id)
        .map_err(|e| map_error("Delete procedure", e))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ATTENDANCES
// ============================================================================

#[utoipa::path(
    get,
    path = "/attendances",
    responses(
        (status = 200, description = "Attendances, newest admission first", body = [Attendance]),
        (status = 500, description = "Internal server error")
    )
)]
async fn list_attendances(
    State(state): State<AppState>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
    state
        .attendances
        .list()
        .map(Json)
        .map_err(|e| map_error("List attendances", e))
}

#[utoipa::path(
    post,
    path = "/attendances",
    request_body = AttendanceDetails,
    responses(
        (status = 201, description = "Attendance created", body = Attendance),
        (status = 400, description = "Unknown patient or too many secondary CIDs")
    )
)]
/// Open an attendance. The month reference is derived from the admission date.
async fn create_attendance(
    State(state): State<AppState>,
    Json(req): Json<AttendanceDetails>,
) -> Result<(StatusCode, Json<Attendance>), ApiError> {
    let attendance = state
        .attendances
        .create(req)
        .map_err(|e| map_error("Create attendance", e))?;
    Ok((StatusCode::CREATED, Json(attendance)))
}

#[utoipa::path(
    get,
    path = "/attendances/{id}",
    params(("id" = String, Path, description = "Attendance id")),
    responses(
        (status = 200, description = "Attendance", body = Attendance),
        (status = 404, description = "Unknown attendance")
    )
)]
async fn get_attendance(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Attendance>, ApiError> {
    let id = parse_id(&id)?;
    state
        .attendances
        .get(id)
        .map(Json)
        .map_err(|e| map_error("Get attendance", e))
}

#[utoipa::path(
    put,
    path = "/attendances/{id}",
    params(("id" = String, Path, description = "Attendance id")),
    request_body = AttendanceDetails,
    responses(
        (status = 200, description = "Attendance updated", body = Attendance),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Unknown attendance")
    )
)]
async fn update_attendance(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<AttendanceDetails>,
) -> Result<Json<Attendance>, ApiError> {
    let id = parse_id(&id)?;
    state
        .attendances
        .update(id, req)
        .map(Json)
        .map_err(|e| map_error("Update attendance", e))
}

#[utoipa::path(
    delete,
    path = "/attendances/{id}",
    params(("id" = String, Path, description = "Attendance id")),
    responses(
        (status = 204, description = "Attendance and its actions deleted"),
        (status = 404, description = "Unknown attendance")
    )
)]
async fn delete_attendance(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state
        .attendances
        .delete(id)
        .map_err(|e| map_error("Delete attendance", e))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/attendances/{id}/actions",
    params(("id" = String, Path, description = "Attendance id")),
    responses(
        (status = 200, description = "Actions, newest first", body = [AttendanceAction]),
        (status = 404, description = "Unknown attendance")
    )
)]
async fn list_actions(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Vec<AttendanceAction>>, ApiError> {
    let id = parse_id(&id)?;
    state
        .attendances
        .list_actions(id)
        .map(Json)
        .map_err(|e| map_error("List actions", e))
}

#[utoipa::path(
    post,
    path = "/attendances/{id}/actions",
    params(("id" = String, Path, description = "Attendance id")),
    request_body = AttendanceActionDetails,
    responses(
        (status = 201, description = "Action recorded", body = AttendanceAction),
        (status = 400, description = "Zero quantity, or unknown/inactive professional or procedure"),
        (status = 404, description = "Unknown attendance")
    )
)]
async fn create_action(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<AttendanceActionDetails>,
) -> Result<(StatusCode, Json<AttendanceAction>), ApiError> {
    let id = parse_id(&id)?;
    let action = state
        .attendances
        .add_action(id, req)
        .map_err(|e| map_error("Create action", e))?;
    Ok((StatusCode::CREATED, Json(action)))
}

#[utoipa::path(
    delete,
    path = "/actions/{id}",
    params(("id" = String, Path, description = "Action id")),
    responses(
        (status = 204, description = "Action deleted"),
        (status = 404, description = "Unknown action")
    )
)]
async fn delete_action(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state
        .attendances
        .delete_action(id)
        .map_err(|e| map_error("Delete action", e))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// EXPORT
// ============================================================================

#[utoipa::path(
    get,
    path = "/export/raas",
    params(ExportQuery),
    responses(
        (status = 200, description = "RAAS production file", content_type = "text/plain", body = String),
        (status = 422, description = "There are no attendances to export"),
        (status = 500, description = "Internal server error")
    )
)]
/// Download the RAAS production file as an attachment.
async fn export_raas(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let generated_on = query
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let file = state
        .export
        .build(generated_on)
        .map_err(|e| map_error("Export RAAS", e))?;

    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.contents,
    )
        .into_response())
}
