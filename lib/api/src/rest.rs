use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError, Result as ActixResult};
use booksim_core::{Engine, Error, Recommendation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{debug, error};

#[derive(Deserialize)]
struct RecommendRequest {
    #[serde(default)]
    book_title: Option<String>,
    #[serde(default)]
    num_recommendations: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct RecommendResponse {
    recommendations: Vec<Recommendation>,
}

#[derive(Serialize)]
struct TitlesResponse {
    titles: Vec<String>,
}

/// Errors returned to HTTP clients as `{"error": ...}`
#[derive(ThisError, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            e if e.is_construction() => ApiError::Unavailable(e.to_string()),
            e => {
                error!("Recommendation failed: {}", e);
                ApiError::Internal
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

pub struct RestApi;

impl RestApi {
    pub async fn start(engine: Arc<Engine>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(engine.clone()))
                .configure(routes)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every route; the engine must be provided as `web::Data<Arc<Engine>>`
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/book-titles", web::get().to(book_titles))
        .route("/api/recommend", web::post().to(recommend))
        .route("/api/reload", web::post().to(reload));
}

async fn health(engine: web::Data<Arc<Engine>>) -> ActixResult<HttpResponse> {
    let stats = engine.stats();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "corpus_size": stats.corpus_size,
        "vocabulary_size": stats.vocabulary_size,
    })))
}

async fn book_titles(engine: web::Data<Arc<Engine>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(TitlesResponse { titles: engine.titles() }))
}

async fn recommend(
    engine: web::Data<Arc<Engine>>,
    req: web::Json<RecommendRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let title = req.book_title.unwrap_or_default();
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("Book title is required".to_string()));
    }

    let top_n = parse_top_n(req.num_recommendations.as_ref(), engine.config().default_top_n)?;
    debug!("Recommend '{}' (top {})", title, top_n);

    let recommendations = engine.recommend(&title, top_n)?;
    Ok(HttpResponse::Ok().json(RecommendResponse { recommendations }))
}

async fn reload(engine: web::Data<Arc<Engine>>) -> Result<HttpResponse, ApiError> {
    let stats = engine.reload()?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Accepts integers, integral floats and numeric strings. Negative counts
/// mean "nothing".
fn parse_top_n(value: Option<&serde_json::Value>, default: usize) -> Result<usize, ApiError> {
    let n = match value {
        None | Some(serde_json::Value::Null) => return Ok(default),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    match n {
        Some(n) => Ok(usize::try_from(n).unwrap_or(0)),
        None => Err(ApiError::BadRequest(
            "num_recommendations must be a number".to_string(),
        )),
    }
}
