use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::ServeConfig;
use crate::error::TeamError;
use crate::roster::{
    load_players, load_players_from_path, parse_date, Player, PlayerId, DEFAULT_PLAYERS, DEFAULT_SEED_LEVEL,
};
use crate::store::{GeneratedTeams, PlayerFields, Store, TeamId, TeamSummary};

pub struct AppState {
    pub store: Store,
    pub admin_password: String,
}

impl AppState {
    fn check_admin(&self, req: &HttpRequest) -> Result<(), TeamError> {
        let password = req
            .headers()
            .get("X-Admin-Password")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if password != self.admin_password {
            warn!(path = %req.path(), "rejected admin request");
            return Err(TeamError::Unauthorized);
        }
        Ok(())
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct AttendanceRequest {
    date: Option<String>,
    #[serde(default)]
    confirmed: Vec<PlayerId>,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    date: Option<String>,
}

#[derive(Deserialize)]
pub struct TeamEditRequest {
    roster: Vec<PlayerId>,
    reserve: Option<PlayerId>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    success: bool,
    message: String,
    #[serde(flatten)]
    generated: GeneratedTeams,
}

#[derive(Serialize)]
pub struct TeamDetailResponse {
    team: TeamSummary,
    available_players: Vec<Player>,
}

async fn admin_login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        warn!("rejected admin login");
        Ok(HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Invalid password"})))
    }
}

async fn list_players(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.players()))
}

async fn create_player(
    fields: web::Json<PlayerFields>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let player = state.store.add_player(fields.into_inner())?;
    Ok(HttpResponse::Created().json(player))
}

async fn update_player(
    id: web::Path<PlayerId>,
    fields: web::Json<PlayerFields>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let player = state.store.update_player(id.into_inner(), fields.into_inner())?;
    Ok(HttpResponse::Ok().json(player))
}

async fn delete_player(
    id: web::Path<PlayerId>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let player = state.store.delete_player(id.into_inner())?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "deleted": player})))
}

// CSV body, password in the X-Admin-Password header
async fn import_players(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.check_admin(&req)?;
    let players = load_players(&body[..])?;
    let imported = state.store.import_players(players);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("{} players imported", imported)
    })))
}

async fn attendance_by_date(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.confirmed_by_date()))
}

async fn attendance_sheet(
    date: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let date = parse_date(Some(date.as_str()))?;
    Ok(HttpResponse::Ok().json(state.store.attendance_sheet(date)))
}

async fn update_attendance(
    req: web::Json<AttendanceRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let date = parse_date(req.date.as_deref())?;
    let confirmed: HashSet<PlayerId> = req.confirmed.iter().copied().collect();
    let update = state.store.set_attendance(date, &confirmed);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Attendance updated for {}", date.format("%d/%m/%Y")),
        "recorded": update.recorded,
        "present": update.present
    })))
}

async fn list_teams(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.teams_by_date()))
}

async fn team_dates(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.confirmed_dates()))
}

async fn generate_teams(
    req: web::Json<GenerateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let date = parse_date(req.date.as_deref())?;
    let generated = state.store.generate_teams(date, &mut rand::thread_rng())?;
    let mut message = format!(
        "{} teams generated for {}",
        generated.teams.len(),
        date.format("%d/%m/%Y")
    );
    if !generated.unplaced.is_empty() {
        message.push_str(&format!(", {} players could not be placed", generated.unplaced.len()));
    }
    Ok(HttpResponse::Ok().json(GenerateResponse {
        success: true,
        message,
        generated,
    }))
}

async fn team_detail(
    id: web::Path<TeamId>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = id.into_inner();
    let team = state.store.team(id)?;
    let available_players = state.store.available_players(id)?;
    Ok(HttpResponse::Ok().json(TeamDetailResponse { team, available_players }))
}

async fn edit_team(
    id: web::Path<TeamId>,
    req: web::Json<TeamEditRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let team = state.store.edit_team(id.into_inner(), req.roster, req.reserve)?;
    Ok(HttpResponse::Ok().json(team))
}

async fn delete_team(
    id: web::Path<TeamId>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.store.delete_team(id.into_inner())?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

/// Registers the JSON API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/login", web::post().to(admin_login))
        .route("/api/players", web::get().to(list_players))
        .route("/api/players", web::post().to(create_player))
        .route("/api/players/import", web::post().to(import_players))
        .route("/api/players/{id}", web::put().to(update_player))
        .route("/api/players/{id}", web::delete().to(delete_player))
        .route("/api/attendance", web::get().to(attendance_by_date))
        .route("/api/attendance", web::post().to(update_attendance))
        .route("/api/attendance/{date}", web::get().to(attendance_sheet))
        .route("/api/teams", web::get().to(list_teams))
        .route("/api/teams/dates", web::get().to(team_dates))
        .route("/api/teams/generate", web::post().to(generate_teams))
        .route("/api/teams/{id}", web::get().to(team_detail))
        .route("/api/teams/{id}", web::put().to(edit_team))
        .route("/api/teams/{id}", web::delete().to(delete_team));
}

/// Builds the store the server starts with
pub fn prepare_store(config: &ServeConfig) -> Result<Store, TeamError> {
    let store = Store::new();
    if let Some(path) = &config.players_csv {
        let players = load_players_from_path(path)?;
        info!(path = %path.display(), count = players.len(), "loaded players");
        store.import_players(players);
    }
    if config.seed_defaults {
        store.seed_players(&DEFAULT_PLAYERS, DEFAULT_SEED_LEVEL)?;
    }
    Ok(store)
}

pub async fn start_server(config: ServeConfig, store: Store) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState {
        store,
        admin_password: config.admin_password,
    });

    info!(bind = %config.bind, port = config.port, "starting web server");
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((config.bind.as_str(), config.port))?
    .run()
    .await
}
