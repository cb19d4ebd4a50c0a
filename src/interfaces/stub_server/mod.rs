use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::dev::ServerHandle;
use actix_web::{delete, get, post, put, web, App, HttpResponse, HttpServer, Responder};
use chrono::Utc;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domain::error::{AppError, Result};
use crate::domain::provider::{AiProviderConfig, AiProviderDraft};
use crate::domain::test_case::{Category, Priority, TestCase, TestCaseUpdate};
use crate::domain::transcript::{title_from_file_name, Transcript, TranscriptDraft};

/// The last generation submission, as the stub decoded it. Tests assert
/// against this to prove what actually went over the wire.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReceivedGeneration {
    pub prompt: String,
    pub requirements: String,
    pub test_type: String,
    pub num_test_cases: u8,
    pub file_names: Vec<String>,
    pub selected_transcripts: Vec<String>,
    pub selected_alm: String,
    pub selected_alm_items: Vec<String>,
}

/// In-memory state of the development backend.
pub struct StubState {
    pub test_cases: Mutex<Vec<TestCase>>,
    pub transcripts: Mutex<Vec<Transcript>>,
    pub providers: Mutex<Vec<AiProviderConfig>>,
    pub fail_generation: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub last_generation: Mutex<Option<ReceivedGeneration>>,
    pub last_export_ids: Mutex<Option<Vec<String>>>,
}

impl StubState {
    pub fn new() -> Self {
        Self {
            test_cases: Mutex::new(Vec::new()),
            transcripts: Mutex::new(Vec::new()),
            providers: Mutex::new(Vec::new()),
            fail_generation: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            last_generation: Mutex::new(None),
            last_export_ids: Mutex::new(None),
        }
    }
}

impl Default for StubState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StubServer {
    pub base_url: String,
    pub state: Arc<StubState>,
    handle: ServerHandle,
}

impl StubServer {
    pub async fn stop(&self) {
        self.handle.stop(true).await;
    }

    pub fn last_generation(&self) -> Option<ReceivedGeneration> {
        self.state.last_generation.lock().unwrap().clone()
    }

    pub fn last_export_ids(&self) -> Option<Vec<String>> {
        self.state.last_export_ids.lock().unwrap().clone()
    }
}

/// Binds the stub backend on 127.0.0.1 (port 0 picks an ephemeral port)
/// and spawns it onto the current runtime.
pub async fn start(port: u16) -> Result<StubServer> {
    let state = Arc::new(StubState::new());
    let server_state = state.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(server_state.clone()))
            .wrap(Cors::permissive())
            .service(health)
            .service(list_test_cases)
            .service(bulk_select_test_cases)
            .service(get_test_case)
            .service(update_test_case)
            .service(delete_test_case)
            .service(delete_all_test_cases)
            .service(export_test_cases)
            .service(generate_test_cases)
            .service(active_provider)
            .service(list_providers)
            .service(save_provider)
            .service(upload_transcripts)
            .service(list_transcripts)
            .service(get_transcript)
            .service(create_transcript)
            .service(delete_transcript)
    })
    .workers(1)
    .bind(("127.0.0.1", port))
    .map_err(|err| AppError::Internal(format!("Failed to bind stub backend: {}", err)))?;

    let addr = server
        .addrs()
        .first()
        .copied()
        .ok_or_else(|| AppError::Internal("Stub backend has no bound address".to_string()))?;

    let server = server.run();
    let handle = server.handle();
    tokio::spawn(server);

    info!(addr = %addr, "Stub backend started");

    Ok(StubServer {
        base_url: format!("http://{}", addr),
        state,
        handle,
    })
}

fn parse_category(name: &str) -> Category {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .unwrap_or(Category::Functional)
}

#[get("/api/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[get("/api/test-cases")]
async fn list_test_cases(data: web::Data<Arc<StubState>>) -> impl Responder {
    let cases = data.test_cases.lock().unwrap().clone();
    HttpResponse::Ok().json(cases)
}

#[get("/api/test-cases/{id}")]
async fn get_test_case(data: web::Data<Arc<StubState>>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    let cases = data.test_cases.lock().unwrap();
    match cases.iter().find(|case| case.id == id) {
        Some(case) => HttpResponse::Ok().json(case),
        None => HttpResponse::NotFound().json(serde_json::json!({"detail": "Test case not found"})),
    }
}

#[put("/api/test-cases/{id}")]
async fn update_test_case(
    data: web::Data<Arc<StubState>>,
    path: web::Path<String>,
    update: web::Json<TestCaseUpdate>,
) -> impl Responder {
    let id = path.into_inner();
    let mut cases = data.test_cases.lock().unwrap();
    let Some(case) = cases.iter_mut().find(|case| case.id == id) else {
        return HttpResponse::NotFound().json(serde_json::json!({"detail": "Test case not found"}));
    };

    let update = update.into_inner();
    if let Some(title) = update.title {
        case.title = title;
    }
    if let Some(description) = update.description {
        case.description = description;
    }
    if let Some(preconditions) = update.preconditions {
        case.preconditions = preconditions;
    }
    if let Some(steps) = update.steps {
        case.steps = steps;
    }
    if let Some(expected_result) = update.expected_result {
        case.expected_result = expected_result;
    }
    if let Some(priority) = update.priority {
        case.priority = priority;
    }
    if let Some(category) = update.category {
        case.category = category;
    }
    if let Some(is_selected) = update.is_selected {
        case.is_selected = is_selected;
    }
    case.updated_at = Utc::now();

    HttpResponse::Ok().json(case.clone())
}

#[delete("/api/test-cases/{id}")]
async fn delete_test_case(
    data: web::Data<Arc<StubState>>,
    path: web::Path<String>,
) -> impl Responder {
    if data.fail_deletes.load(Ordering::SeqCst) {
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({"detail": "Delete failed"}));
    }
    let id = path.into_inner();
    let mut cases = data.test_cases.lock().unwrap();
    let before = cases.len();
    cases.retain(|case| case.id != id);
    if cases.len() == before {
        return HttpResponse::NotFound().json(serde_json::json!({"detail": "Test case not found"}));
    }
    HttpResponse::Ok().json(serde_json::json!({"message": "Test case deleted successfully"}))
}

#[delete("/api/test-cases")]
async fn delete_all_test_cases(data: web::Data<Arc<StubState>>) -> impl Responder {
    if data.fail_deletes.load(Ordering::SeqCst) {
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({"detail": "Delete failed"}));
    }
    let mut cases = data.test_cases.lock().unwrap();
    let deleted = cases.len();
    cases.clear();
    HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Deleted {} test cases", deleted)
    }))
}

#[post("/api/test-cases/bulk-select")]
async fn bulk_select_test_cases(
    data: web::Data<Arc<StubState>>,
    ids: web::Json<Vec<String>>,
) -> impl Responder {
    let ids = ids.into_inner();
    let mut cases = data.test_cases.lock().unwrap();
    for case in cases.iter_mut() {
        if ids.contains(&case.id) {
            case.is_selected = true;
        }
    }
    HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Selected {} test cases", ids.len())
    }))
}

#[derive(Deserialize)]
struct ExportQuery {
    #[serde(default)]
    ids: String,
}

#[get("/api/export/{format}")]
async fn export_test_cases(
    data: web::Data<Arc<StubState>>,
    path: web::Path<String>,
    query: web::Query<ExportQuery>,
) -> impl Responder {
    let format = path.into_inner();
    let ids: Vec<String> = query
        .ids
        .split(',')
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
        .collect();

    let selected: Vec<TestCase> = {
        let cases = data.test_cases.lock().unwrap();
        cases
            .iter()
            .filter(|case| ids.contains(&case.id))
            .cloned()
            .collect()
    };
    *data.last_export_ids.lock().unwrap() = Some(ids);

    if selected.is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({"detail": "No test cases selected for export"}));
    }

    match format.as_str() {
        "json" => {
            let body = serde_json::to_vec_pretty(&selected).unwrap_or_default();
            HttpResponse::Ok()
                .content_type("application/json")
                .insert_header((
                    "Content-Disposition",
                    "attachment; filename=test_cases.json",
                ))
                .body(body)
        }
        "excel" => {
            // Stand-in payload: a tab-separated sheet, not a real workbook.
            let mut body = String::from(
                "ID\tTitle\tDescription\tPreconditions\tSteps\tExpected Result\tPriority\tCategory\n",
            );
            for case in &selected {
                body.push_str(&format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{:?}\t{}\n",
                    case.id,
                    case.title,
                    case.description,
                    case.preconditions,
                    case.steps.join(" | "),
                    case.expected_result,
                    case.priority,
                    case.category.as_str(),
                ));
            }
            HttpResponse::Ok()
                .content_type(
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                )
                .insert_header((
                    "Content-Disposition",
                    "attachment; filename=test_cases.xlsx",
                ))
                .body(body.into_bytes())
        }
        _ => HttpResponse::BadRequest()
            .json(serde_json::json!({"detail": "Unsupported export format"})),
    }
}

async fn read_field_bytes(field: &mut actix_multipart::Field) -> Vec<u8> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        if let Ok(chunk) = chunk {
            bytes.extend_from_slice(&chunk);
        }
    }
    bytes
}

#[post("/api/generate-test-cases")]
async fn generate_test_cases(
    data: web::Data<Arc<StubState>>,
    mut payload: Multipart,
) -> impl Responder {
    let mut received = ReceivedGeneration {
        num_test_cases: 5,
        ..ReceivedGeneration::default()
    };

    while let Some(item) = payload.next().await {
        let Ok(mut field) = item else {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({"detail": "Malformed multipart payload"}));
        };
        let Some(disposition) = field.content_disposition() else {
            continue;
        };
        let Some(name) = disposition.get_name().map(|name| name.to_string()) else {
            continue;
        };

        if name == "files" {
            if let Some(file_name) = disposition.get_filename().map(|f| f.to_string()) {
                // The stub only records the attachment; extraction is the
                // real backend's job.
                let _ = read_field_bytes(&mut field).await;
                received.file_names.push(file_name);
            }
            continue;
        }

        let value = String::from_utf8(read_field_bytes(&mut field).await).unwrap_or_default();
        match name.as_str() {
            "prompt" => received.prompt = value,
            "requirements" => received.requirements = value,
            "test_type" => received.test_type = value,
            "num_test_cases" => {
                received.num_test_cases = value.parse().unwrap_or(received.num_test_cases)
            }
            "selected_transcripts" => {
                received.selected_transcripts = serde_json::from_str(&value).unwrap_or_default()
            }
            "selected_alm" => received.selected_alm = value,
            "selected_alm_items" => {
                received.selected_alm_items = serde_json::from_str(&value).unwrap_or_default()
            }
            _ => {}
        }
    }

    if received.prompt.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({"detail": "Prompt is required"}));
    }

    if data.fail_generation.load(Ordering::SeqCst) {
        *data.last_generation.lock().unwrap() = Some(received);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({"detail": "AI generation failed"}));
    }

    let category = parse_category(&received.test_type);
    let now = Utc::now();
    let generated: Vec<TestCase> = (0..received.num_test_cases)
        .map(|index| TestCase {
            id: Uuid::new_v4().to_string(),
            title: format!("{} test {}: {}", received.test_type, index + 1, received.prompt),
            description: format!("Covers: {}", received.prompt),
            preconditions: "System is reachable".to_string(),
            steps: vec![
                "Prepare the scenario".to_string(),
                "Execute the action under test".to_string(),
                "Observe the outcome".to_string(),
            ],
            expected_result: "The system behaves as described".to_string(),
            priority: Priority::Medium,
            category,
            is_selected: false,
            created_at: now,
            updated_at: now,
        })
        .collect();

    {
        let mut cases = data.test_cases.lock().unwrap();
        cases.splice(0..0, generated.iter().cloned());
    }
    *data.last_generation.lock().unwrap() = Some(received);

    HttpResponse::Ok().json(generated)
}

#[get("/api/ai-providers/active")]
async fn active_provider(data: web::Data<Arc<StubState>>) -> impl Responder {
    let providers = data.providers.lock().unwrap();
    match providers.iter().find(|provider| provider.is_active) {
        Some(provider) => HttpResponse::Ok().json(provider),
        None => {
            HttpResponse::NotFound().json(serde_json::json!({"detail": "No active provider"}))
        }
    }
}

#[get("/api/ai-providers")]
async fn list_providers(data: web::Data<Arc<StubState>>) -> impl Responder {
    let providers = data.providers.lock().unwrap().clone();
    HttpResponse::Ok().json(providers)
}

#[post("/api/ai-providers")]
async fn save_provider(
    data: web::Data<Arc<StubState>>,
    draft: web::Json<AiProviderDraft>,
) -> impl Responder {
    let draft = draft.into_inner();
    let mut providers = data.providers.lock().unwrap();
    for provider in providers.iter_mut() {
        provider.is_active = false;
    }
    let config = AiProviderConfig {
        id: Uuid::new_v4().to_string(),
        provider: draft.provider,
        model: draft.model,
        max_tokens: draft.max_tokens,
        temperature: draft.temperature,
        created_at: Utc::now(),
        is_active: true,
    };
    providers.push(config.clone());
    HttpResponse::Ok().json(config)
}

#[get("/api/transcripts")]
async fn list_transcripts(data: web::Data<Arc<StubState>>) -> impl Responder {
    let transcripts = data.transcripts.lock().unwrap().clone();
    HttpResponse::Ok().json(transcripts)
}

#[get("/api/transcripts/{id}")]
async fn get_transcript(
    data: web::Data<Arc<StubState>>,
    path: web::Path<String>,
) -> impl Responder {
    let id = path.into_inner();
    let transcripts = data.transcripts.lock().unwrap();
    match transcripts.iter().find(|transcript| transcript.id == id) {
        Some(transcript) => HttpResponse::Ok().json(transcript),
        None => {
            HttpResponse::NotFound().json(serde_json::json!({"detail": "Transcript not found"}))
        }
    }
}

#[post("/api/transcripts")]
async fn create_transcript(
    data: web::Data<Arc<StubState>>,
    draft: web::Json<TranscriptDraft>,
) -> impl Responder {
    let draft = draft.into_inner();
    if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({"detail": "Title and content are required"}));
    }
    let transcript = Transcript {
        id: Uuid::new_v4().to_string(),
        title: draft.title,
        content: draft.content,
        meeting_date: draft.meeting_date,
        participants: draft.participants,
        created_at: Utc::now(),
    };
    data.transcripts.lock().unwrap().insert(0, transcript.clone());
    HttpResponse::Ok().json(transcript)
}

#[post("/api/transcripts/upload")]
async fn upload_transcripts(
    data: web::Data<Arc<StubState>>,
    mut payload: Multipart,
) -> impl Responder {
    let mut created = Vec::new();

    while let Some(item) = payload.next().await {
        let Ok(mut field) = item else {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({"detail": "Malformed multipart payload"}));
        };
        let Some(file_name) = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(|name| name.to_string())
        else {
            continue;
        };
        if !file_name.ends_with(".txt") {
            let _ = read_field_bytes(&mut field).await;
            continue;
        }

        let content =
            String::from_utf8(read_field_bytes(&mut field).await).unwrap_or_default();
        created.push(Transcript {
            id: Uuid::new_v4().to_string(),
            title: title_from_file_name(&file_name),
            content,
            meeting_date: None,
            participants: None,
            created_at: Utc::now(),
        });
    }

    {
        let mut transcripts = data.transcripts.lock().unwrap();
        transcripts.splice(0..0, created.iter().cloned());
    }

    HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Uploaded {} transcripts", created.len()),
        "transcripts": created,
    }))
}

#[delete("/api/transcripts/{id}")]
async fn delete_transcript(
    data: web::Data<Arc<StubState>>,
    path: web::Path<String>,
) -> impl Responder {
    let id = path.into_inner();
    let mut transcripts = data.transcripts.lock().unwrap();
    let before = transcripts.len();
    transcripts.retain(|transcript| transcript.id != id);
    if transcripts.len() == before {
        return HttpResponse::NotFound()
            .json(serde_json::json!({"detail": "Transcript not found"}));
    }
    HttpResponse::Ok().json(serde_json::json!({"message": "Transcript deleted successfully"}))
}
