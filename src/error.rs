use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

/// All errors that can occur while managing players, attendance and teams.
#[derive(thiserror::Error, Debug)]
pub enum TeamError {
    /// Not enough confirmed players to build teams for a date.
    #[error("at least {required} confirmed players are needed, only {confirmed} confirmed")]
    InsufficientPlayers { confirmed: usize, required: usize },

    /// Date input was missing or not `YYYY-MM-DD`.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Player fields failed validation (empty name, level out of range).
    #[error("invalid player: {0}")]
    InvalidPlayer(String),

    /// A manual team edit broke a roster invariant.
    #[error("invalid team: {0}")]
    InvalidTeam(String),

    #[error("player {0} not found")]
    PlayerNotFound(u32),

    #[error("team {0} not found")]
    TeamNotFound(u32),

    #[error("unauthorized")]
    Unauthorized,

    /// A CSV row could not be interpreted.
    #[error("csv row {row}: {message}")]
    CsvRow { row: usize, message: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TeamError>;

impl ResponseError for TeamError {
    fn status_code(&self) -> StatusCode {
        match self {
            TeamError::PlayerNotFound(_) | TeamError::TeamNotFound(_) => StatusCode::NOT_FOUND,
            TeamError::Unauthorized => StatusCode::UNAUTHORIZED,
            TeamError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({"success": false, "error": self.to_string()}))
    }
}
