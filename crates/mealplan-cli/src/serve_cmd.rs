//! `mealplan serve`: the JSON HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use mealplan_core::catalog::service::{self as catalog, CatalogError, FoodInput, FoodUpdate};
use mealplan_core::catalog::{
    LOW_CALORIE_DEFAULT, RECOMMEND_MAX_CALORIES_DEFAULT, SEARCH_TOP_K,
};
use mealplan_core::embedding::{DistanceRanker, Embedder};
use mealplan_core::planner::{self, PgPlanStore, PlanError, Week};
use mealplan_db::models::{Buffet, Food, User};
use mealplan_db::queries::{buffets as buffet_db, foods as food_db, users as user_db};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::UserNotFound(_) | PlanError::PlanNotFound(_) => {
                Self::not_found(err.to_string())
            }
            PlanError::InvalidWeek { .. } => Self::bad_request(err.to_string()),
            PlanError::Store(e) => Self::internal(e),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidFood(_) => Self::bad_request(err.to_string()),
            CatalogError::FoodNotFound(_) => Self::not_found(err.to_string()),
            CatalogError::Store(e) => Self::internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State and request types
// ---------------------------------------------------------------------------

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub embedder: Arc<dyn Embedder>,
    pub ranker: Arc<dyn DistanceRanker>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    allergies: Option<String>,
    top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct PageParams {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_page_limit")]
    limit: i64,
}

const DEFAULT_PAGE_LIMIT: i64 = 100;

fn default_page_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Deserialize)]
struct LowCalorieParams {
    max_calories: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RecommendParams {
    query: String,
    allergies: Option<String>,
    max_calories: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct EmailParams {
    email: String,
}

#[derive(Debug, Deserialize)]
struct UserInput {
    name: String,
    email: String,
    #[serde(default)]
    allergies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlanRequest {
    user_id: Uuid,
    week: String,
}

#[derive(Debug, Deserialize)]
struct BuffetInput {
    name: String,
    description: Option<String>,
}

/// Split a comma-separated allergy list, dropping empty entries.
fn parse_allergies(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

/// `0` disables the calorie ceiling.
fn calorie_ceiling(max_calories: Option<i32>) -> Option<i32> {
    match max_calories.unwrap_or(RECOMMEND_MAX_CALORIES_DEFAULT) {
        0 => None,
        max => Some(max),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/foods", post(create_food).get(search_foods))
        .route("/api/foods/all", get(list_foods))
        .route("/api/foods/category/{category}", get(foods_by_category))
        .route("/api/foods/low-calorie", get(low_calorie_foods))
        .route("/api/foods/recommendations", get(recommendations))
        .route(
            "/api/foods/{id}",
            get(get_food).put(update_food).delete(delete_food),
        )
        .route("/api/users", post(create_user).get(user_by_email))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/meal-plans", get(list_user_plans))
        .route("/api/meal-plans", post(generate_plan))
        .route(
            "/api/meal-plans/current-week/{user_id}",
            post(generate_current_week),
        )
        .route("/api/meal-plans/{id}", get(get_plan))
        .route("/api/buffets", post(create_buffet))
        .route("/api/buffets/{id}", get(get_buffet))
        .route(
            "/api/buffets/{id}/foods",
            put(add_buffet_foods).get(list_buffet_foods),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("mealplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("mealplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers: service
// ---------------------------------------------------------------------------

async fn index(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "mealplan",
        "version": env!("CARGO_PKG_VERSION"),
        "embedder": state.embedder.name(),
        "endpoints": ["/api/foods", "/api/users", "/api/meal-plans", "/api/buffets"],
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ---------------------------------------------------------------------------
// Handlers: foods
// ---------------------------------------------------------------------------

async fn create_food(
    State(state): State<AppState>,
    Json(input): Json<FoodInput>,
) -> Result<(StatusCode, Json<Food>), AppError> {
    let food = catalog::create_food(&state.pool, state.embedder.as_ref(), &input).await?;
    Ok((StatusCode::CREATED, Json(food)))
}

async fn search_foods(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Food>>, AppError> {
    let allergies = parse_allergies(params.allergies.as_deref());
    let foods = catalog::search(
        &state.pool,
        state.embedder.as_ref(),
        state.ranker.as_ref(),
        &params.q,
        &allergies,
        params.top_k.unwrap_or(SEARCH_TOP_K),
    )
    .await
    .map_err(AppError::internal)?;
    Ok(Json(foods))
}

async fn list_foods(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<Food>>, AppError> {
    if page.skip < 0 || page.limit < 0 {
        return Err(AppError::bad_request("skip and limit must not be negative"));
    }
    let foods = food_db::list_foods_page(&state.pool, page.skip, page.limit)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(foods))
}

async fn foods_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Food>>, AppError> {
    let foods = food_db::list_foods_by_category(&state.pool, &category)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(foods))
}

async fn low_calorie_foods(
    State(state): State<AppState>,
    Query(params): Query<LowCalorieParams>,
) -> Result<Json<Vec<Food>>, AppError> {
    let max = params.max_calories.unwrap_or(LOW_CALORIE_DEFAULT);
    let foods = food_db::list_foods_max_calories(&state.pool, max)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(foods))
}

async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<Vec<Food>>, AppError> {
    let allergies = parse_allergies(params.allergies.as_deref());
    let foods = catalog::recommendations(
        &state.pool,
        state.embedder.as_ref(),
        state.ranker.as_ref(),
        &params.query,
        &allergies,
        calorie_ceiling(params.max_calories),
    )
    .await
    .map_err(AppError::internal)?;
    Ok(Json(foods))
}

async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Food>, AppError> {
    let food = food_db::get_food(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("food {id} not found")))?;
    Ok(Json(food))
}

async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<FoodUpdate>,
) -> Result<Json<Food>, AppError> {
    let food = catalog::update_food(&state.pool, state.embedder.as_ref(), id, &update).await?;
    Ok(Json(food))
}

async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog::delete_food(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Handlers: users
// ---------------------------------------------------------------------------

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<UserInput>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let email = input.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request(format!("invalid email: {email:?}")));
    }
    let user = user_db::insert_user(
        &state.pool,
        &user_db::NewUser {
            name: input.name.trim(),
            email,
            allergies: &catalog::normalize_allergens(&input.allergies),
        },
    )
    .await
    .map_err(AppError::internal)?
    .ok_or_else(|| AppError::conflict(format!("a user with email {email} already exists")))?;

    tracing::info!(user_id = %user.id, "created user");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn user_by_email(
    State(state): State<AppState>,
    Query(params): Query<EmailParams>,
) -> Result<Json<User>, AppError> {
    let user = user_db::get_user_by_email(&state.pool, &params.email)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("no user with email {}", params.email)))?;
    Ok(Json(user))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = user_db::get_user(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("user {id} not found")))?;
    Ok(Json(user))
}

async fn list_user_plans(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<planner::MealPlanDetail>>, AppError> {
    let mut store = PgPlanStore::begin(&state.pool)
        .await
        .map_err(AppError::internal)?;
    let plans = planner::list_plans_for_user(&mut store, user_id).await?;
    store.commit().await.map_err(AppError::internal)?;
    Ok(Json(plans))
}

// ---------------------------------------------------------------------------
// Handlers: meal plans
// ---------------------------------------------------------------------------

async fn generate_plan(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<(StatusCode, Json<planner::MealPlanDetail>), AppError> {
    let week = Week::parse(&request.week)?;
    let plan = planner::generate_plan_in_transaction(&state.pool, request.user_id, week).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn generate_current_week(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<planner::MealPlanDetail>), AppError> {
    let week = Week::current()?;
    let plan = planner::generate_plan_in_transaction(&state.pool, user_id, week).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<planner::MealPlanDetail>, AppError> {
    let mut store = PgPlanStore::begin(&state.pool)
        .await
        .map_err(AppError::internal)?;
    let plan = planner::get_plan(&mut store, id).await?;
    store.commit().await.map_err(AppError::internal)?;
    Ok(Json(plan))
}

// ---------------------------------------------------------------------------
// Handlers: buffets
// ---------------------------------------------------------------------------

async fn create_buffet(
    State(state): State<AppState>,
    Json(input): Json<BuffetInput>,
) -> Result<(StatusCode, Json<Buffet>), AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("buffet name must not be empty"));
    }
    let buffet = buffet_db::insert_buffet(&state.pool, name, input.description.as_deref())
        .await
        .map_err(AppError::internal)?;
    Ok((StatusCode::CREATED, Json(buffet)))
}

async fn find_buffet(pool: &PgPool, id: Uuid) -> Result<Buffet, AppError> {
    buffet_db::get_buffet(pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("buffet {id} not found")))
}

async fn get_buffet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Buffet>, AppError> {
    Ok(Json(find_buffet(&state.pool, id).await?))
}

/// Add foods to a buffet. Ids that match no food are skipped.
async fn add_buffet_foods(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(food_ids): Json<Vec<Uuid>>,
) -> Result<Json<Vec<Food>>, AppError> {
    let buffet = find_buffet(&state.pool, id).await?;

    let known = food_db::get_foods_by_ids(&state.pool, &food_ids)
        .await
        .map_err(AppError::internal)?;
    let mut tx = state.pool.begin().await.map_err(|e| {
        AppError::internal(anyhow::Error::new(e).context("failed to begin transaction"))
    })?;
    let mut added = 0;
    for food_id in food_ids.iter().filter(|id| known.iter().any(|f| f.id == **id)) {
        if buffet_db::add_food_to_buffet(&mut *tx, buffet.id, *food_id)
            .await
            .map_err(AppError::internal)?
        {
            added += 1;
        }
    }
    tx.commit().await.map_err(|e| {
        AppError::internal(anyhow::Error::new(e).context("failed to commit transaction"))
    })?;
    tracing::info!(
        buffet_id = %buffet.id,
        requested = food_ids.len(),
        added,
        "added foods to buffet"
    );

    let foods = buffet_db::list_buffet_foods(&state.pool, buffet.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(foods))
}

async fn list_buffet_foods(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Food>>, AppError> {
    let buffet = find_buffet(&state.pool, id).await?;
    let foods = buffet_db::list_buffet_foods(&state.pool, buffet.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(foods))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use mealplan_core::embedding::{HashingEmbedder, NegativeInnerProduct};
    use mealplan_test_utils::{create_test_db, drop_test_db};

    use super::*;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn state(pool: PgPool) -> AppState {
        AppState {
            pool,
            embedder: Arc::new(HashingEmbedder::new(64)),
            ranker: Arc::new(NegativeInnerProduct),
        }
    }

    async fn send(
        pool: &PgPool,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let app = build_router(state(pool.clone()));
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn get(pool: &PgPool, uri: &str) -> axum::response::Response {
        send(pool, Method::GET, uri, None).await
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_food(pool: &PgPool, name: &str, calories: i32, allergens: &[&str]) -> Value {
        let resp = send(
            pool,
            Method::POST,
            "/api/foods",
            Some(json!({
                "name": name,
                "category": "Plat",
                "calories": calories,
                "allergens": allergens,
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }

    async fn create_user(pool: &PgPool, email: &str, allergies: &[&str]) -> Value {
        let resp = send(
            pool,
            Method::POST,
            "/api/users",
            Some(json!({ "name": "Ada", "email": email, "allergies": allergies })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }

    fn names(json: &Value) -> Vec<&str> {
        json.as_array()
            .expect("expected an array")
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Pure helpers
    // -----------------------------------------------------------------------

    #[test]
    fn parse_allergies_drops_empty_entries() {
        assert_eq!(
            parse_allergies(Some("Gluten,,Lactose,")),
            vec!["Gluten".to_owned(), "Lactose".to_owned()]
        );
        assert!(parse_allergies(Some("")).is_empty());
        assert!(parse_allergies(None).is_empty());
    }

    #[test]
    fn calorie_ceiling_defaults_and_disables() {
        assert_eq!(calorie_ceiling(None), Some(RECOMMEND_MAX_CALORIES_DEFAULT));
        assert_eq!(calorie_ceiling(Some(0)), None);
        assert_eq!(calorie_ceiling(Some(450)), Some(450));
    }

    #[test]
    fn plan_errors_map_to_statuses() {
        let cases = [
            (PlanError::UserNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (PlanError::PlanNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                PlanError::InvalidWeek {
                    value: "x".into(),
                    reason: "bad".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                PlanError::Store(anyhow::anyhow!("down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn catalog_errors_map_to_statuses() {
        assert_eq!(
            AppError::from(CatalogError::InvalidFood("x".into())).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CatalogError::FoodNotFound(Uuid::nil())).status,
            StatusCode::NOT_FOUND
        );
    }

    // -----------------------------------------------------------------------
    // Routes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_health_and_index() {
        let (pool, db_name) = create_test_db().await;

        let resp = get(&pool, "/health").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "healthy" }));

        let resp = get(&pool, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["name"], "mealplan");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_food_crud() {
        let (pool, db_name) = create_test_db().await;

        let apple = create_food(&pool, "Apple", 52, &[]).await;
        assert!(apple.get("embedding").is_none());
        let id = apple["id"].as_str().unwrap().to_owned();

        let resp = get(&pool, &format!("/api/foods/{id}")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["name"], "Apple");

        let resp = send(
            &pool,
            Method::PUT,
            &format!("/api/foods/{id}"),
            Some(json!({ "name": "Green apple", "calories": 60 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated = body_json(resp).await;
        assert_eq!(updated["name"], "Green apple");
        assert_eq!(updated["calories"], 60);
        assert_eq!(updated["category"], "Plat");

        let resp = send(&pool, Method::DELETE, &format!("/api/foods/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = get(&pool, &format!("/api/foods/{id}")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_json(resp).await["error"].is_string());

        let resp = send(&pool, Method::DELETE, &format!("/api/foods/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_invalid_food_is_bad_request() {
        let (pool, db_name) = create_test_db().await;

        let resp = send(
            &pool,
            Method::POST,
            "/api/foods",
            Some(json!({ "name": "", "category": "Plat", "calories": 10 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = get(&pool, "/api/foods/not-a-uuid").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_food_listings() {
        let (pool, db_name) = create_test_db().await;

        create_food(&pool, "Bread", 265, &["Gluten"]).await;
        create_food(&pool, "Apple", 52, &[]).await;
        create_food(&pool, "Lasagna", 600, &["Gluten", "Lactose"]).await;

        let all = body_json(get(&pool, "/api/foods/all").await).await;
        assert_eq!(names(&all), vec!["Bread", "Apple", "Lasagna"]);

        let low = body_json(get(&pool, "/api/foods/low-calorie").await).await;
        assert_eq!(names(&low), vec!["Bread", "Apple"]);

        let lower = body_json(get(&pool, "/api/foods/low-calorie?max_calories=100").await).await;
        assert_eq!(names(&lower), vec!["Apple"]);

        let plats = body_json(get(&pool, "/api/foods/category/Plat").await).await;
        assert_eq!(plats.as_array().unwrap().len(), 3);
        let none = body_json(get(&pool, "/api/foods/category/Dessert").await).await;
        assert_eq!(none, json!([]));

        let safe = body_json(get(&pool, "/api/foods?allergies=Gluten").await).await;
        assert_eq!(names(&safe), vec!["Apple"]);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_food_list_pages() {
        let (pool, db_name) = create_test_db().await;

        for name in ["Apple", "Bread", "Cheese", "Dates", "Eggplant"] {
            create_food(&pool, name, 100, &[]).await;
        }

        let first = body_json(get(&pool, "/api/foods/all?limit=2").await).await;
        assert_eq!(names(&first), vec!["Apple", "Bread"]);

        let second = body_json(get(&pool, "/api/foods/all?skip=2&limit=2").await).await;
        assert_eq!(names(&second), vec!["Cheese", "Dates"]);

        let rest = body_json(get(&pool, "/api/foods/all?skip=4").await).await;
        assert_eq!(names(&rest), vec!["Eggplant"]);

        let past_end = body_json(get(&pool, "/api/foods/all?skip=10").await).await;
        assert_eq!(past_end, json!([]));

        let resp = get(&pool, "/api/foods/all?limit=-1").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_food_list_default_page_size() {
        let (pool, db_name) = create_test_db().await;

        let records: Vec<FoodInput> = (0..(DEFAULT_PAGE_LIMIT + 5))
            .map(|i| FoodInput {
                name: format!("Food {i:03}"),
                category: "Plat".to_owned(),
                calories: 100,
                allergens: vec![],
                image_url: None,
            })
            .collect();
        let embedder = HashingEmbedder::new(64);
        for record in &records {
            catalog::create_food(&pool, &embedder, record).await.unwrap();
        }

        let page = body_json(get(&pool, "/api/foods/all").await).await;
        let page = page.as_array().unwrap();
        assert_eq!(page.len() as i64, DEFAULT_PAGE_LIMIT);
        assert_eq!(page[0]["name"], "Food 000");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_search_and_recommendations() {
        let (pool, db_name) = create_test_db().await;

        create_food(&pool, "Grilled salmon", 450, &["Fish"]).await;
        create_food(&pool, "Salmon lasagna", 900, &["Fish", "Gluten"]).await;
        create_food(&pool, "Rice bowl", 300, &[]).await;

        let hits = body_json(get(&pool, "/api/foods?q=Grilled%20salmon&top_k=1").await).await;
        assert_eq!(names(&hits), vec!["Grilled salmon"]);

        let recs = body_json(get(&pool, "/api/foods/recommendations?query=salmon").await).await;
        let rec_names = names(&recs);
        assert!(rec_names.contains(&"Grilled salmon"));
        assert!(!rec_names.contains(&"Salmon lasagna"), "over 800 kcal");

        let unbounded = body_json(
            get(&pool, "/api/foods/recommendations?query=salmon&max_calories=0").await,
        )
        .await;
        assert!(names(&unbounded).contains(&"Salmon lasagna"));

        let no_fish = body_json(
            get(
                &pool,
                "/api/foods/recommendations?query=salmon&allergies=Fish&max_calories=0",
            )
            .await,
        )
        .await;
        assert_eq!(names(&no_fish), vec!["Rice bowl"]);

        let resp = get(&pool, "/api/foods/recommendations").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_users() {
        let (pool, db_name) = create_test_db().await;

        let user = create_user(&pool, "ada@example.com", &["Gluten"]).await;
        let id = user["id"].as_str().unwrap();
        assert_eq!(user["allergies"], json!(["Gluten"]));

        let resp = send(
            &pool,
            Method::POST,
            "/api/users",
            Some(json!({ "name": "Other", "email": "ada@example.com" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = get(&pool, &format!("/api/users/{id}")).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = get(&pool, "/api/users?email=ada@example.com").await;
        assert_eq!(body_json(resp).await["id"], id);

        let resp = get(&pool, "/api/users?email=nobody@example.com").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = get(&pool, &format!("/api/users/{}", Uuid::new_v4())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_concurrent_creates_with_one_email() {
        let (pool, db_name) = create_test_db().await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                send(
                    &pool,
                    Method::POST,
                    "/api/users",
                    Some(json!({ "name": format!("Racer {i}"), "email": "race@example.com" })),
                )
                .await
                .status()
            }));
        }
        let mut statuses = Vec::new();
        for handle in handles {
            statuses.push(handle.await.unwrap());
        }

        let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
        let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
        assert_eq!(created, 1, "statuses: {statuses:?}");
        assert_eq!(conflicts, 15, "statuses: {statuses:?}");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_meal_plan_routes() {
        let (pool, db_name) = create_test_db().await;

        create_food(&pool, "Bread", 265, &["Gluten"]).await;
        let apple = create_food(&pool, "Apple", 52, &[]).await;
        let user = create_user(&pool, "ada@example.com", &["Gluten"]).await;
        let user_id = user["id"].as_str().unwrap();

        let resp = send(
            &pool,
            Method::POST,
            "/api/meal-plans",
            Some(json!({ "user_id": user_id, "week": "2024-01-04" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let plan = body_json(resp).await;
        assert_eq!(plan["week"], "2024-01-01");
        let days = plan["days"].as_array().unwrap();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0]["weekday"], "Monday");
        assert_eq!(days[6]["weekday"], "Sunday");
        for day in days {
            let foods = day["foods"].as_array().unwrap();
            assert_eq!(foods.len(), 1);
            assert_eq!(foods[0]["id"], apple["id"]);
        }

        let plan_id = plan["id"].as_str().unwrap();
        let resp = get(&pool, &format!("/api/meal-plans/{plan_id}")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["id"], plan_id);

        let resp = send(
            &pool,
            Method::POST,
            &format!("/api/meal-plans/current-week/{user_id}"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let plans = body_json(get(&pool, &format!("/api/users/{user_id}/meal-plans")).await).await;
        assert_eq!(plans.as_array().unwrap().len(), 2);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_meal_plan_errors() {
        let (pool, db_name) = create_test_db().await;
        let user = create_user(&pool, "ada@example.com", &[]).await;

        let resp = send(
            &pool,
            Method::POST,
            "/api/meal-plans",
            Some(json!({ "user_id": user["id"], "week": "next week" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(
            &pool,
            Method::POST,
            "/api/meal-plans",
            Some(json!({ "user_id": Uuid::new_v4(), "week": "2024-01-01" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = get(&pool, &format!("/api/meal-plans/{}", Uuid::new_v4())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meal_plans")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_buffets() {
        let (pool, db_name) = create_test_db().await;

        let apple = create_food(&pool, "Apple", 52, &[]).await;
        let pear = create_food(&pool, "Pear", 57, &[]).await;

        let resp = send(
            &pool,
            Method::POST,
            "/api/buffets",
            Some(json!({ "name": "Brunch", "description": "Sunday brunch" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let buffet = body_json(resp).await;
        let id = buffet["id"].as_str().unwrap();

        let resp = send(
            &pool,
            Method::PUT,
            &format!("/api/buffets/{id}/foods"),
            Some(json!([apple["id"], Uuid::new_v4(), pear["id"], apple["id"]])),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(names(&body_json(resp).await), vec!["Apple", "Pear"]);

        let foods = body_json(get(&pool, &format!("/api/buffets/{id}/foods")).await).await;
        assert_eq!(names(&foods), vec!["Apple", "Pear"]);

        let resp = get(&pool, &format!("/api/buffets/{id}")).await;
        assert_eq!(body_json(resp).await["name"], "Brunch");

        let missing = Uuid::new_v4();
        let resp = send(
            &pool,
            Method::PUT,
            &format!("/api/buffets/{missing}/foods"),
            Some(json!([apple["id"]])),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = get(&pool, &format!("/api/buffets/{missing}/foods")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
