use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info};

use crate::auth::middleware::AuthUser;
use crate::category::model::{Category, CategoryError, CategorySearchValues};
use crate::category::service::CategoryService;
use crate::validation::is_present;

fn not_acceptable(message: impl Into<String>) -> Response {
    (StatusCode::NOT_ACCEPTABLE, message.into()).into_response()
}

fn category_error_to_response(err: CategoryError) -> Response {
    match err {
        CategoryError::NotFound(id) => not_acceptable(format!("id={} not found", id)),
        CategoryError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// All categories of a user
#[utoipa::path(
    post,
    path = "/category/all",
    tag = "categories",
    request_body(content = String, description = "User id", content_type = "application/json"),
    responses(
        (status = 200, description = "Categories ordered by title", body = [Category]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn find_all(
    State(service): State<Arc<CategoryService>>,
    _user: AuthUser,
    Json(user_id): Json<String>,
) -> Response {
    match service.find_all(&user_id).await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => category_error_to_response(e),
    }
}

/// Create a category owned by the caller
#[utoipa::path(
    post,
    path = "/category/add",
    tag = "categories",
    request_body = Category,
    responses(
        (status = 200, description = "Created category with its id", body = Category),
        (status = 406, description = "Invalid category", body = String),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add(
    State(service): State<Arc<CategoryService>>,
    user: AuthUser,
    Json(mut category): Json<Category>,
) -> Response {
    category.user_id = Some(user.user_id);

    // ids come from the database sequence
    if category.has_id() {
        return not_acceptable("redundant param: category id MUST be null");
    }

    if !category.has_title() {
        return not_acceptable("missed param: title MUST be not null");
    }

    if !is_present(category.user_id.as_deref()) {
        return not_acceptable(format!(
            "user id={} not found",
            category.user_id.unwrap_or_default()
        ));
    }

    info!(
        "Adding category {:?} for user {:?}",
        category.title, category.user_id
    );

    match service.add(category).await {
        Ok(created) => Json(created).into_response(),
        Err(e) => category_error_to_response(e),
    }
}

/// Update (or re-create) a category by id
#[utoipa::path(
    put,
    path = "/category/update",
    tag = "categories",
    request_body = Category,
    responses(
        (status = 200, description = "Category saved"),
        (status = 406, description = "Invalid category", body = String),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update(
    State(service): State<Arc<CategoryService>>,
    user: AuthUser,
    Json(mut category): Json<Category>,
) -> Response {
    if !category.has_id() {
        return not_acceptable("missed param: id");
    }

    if !category.has_title() {
        return not_acceptable("missed param: title");
    }

    category.user_id = Some(user.user_id);

    match service.update(category).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => category_error_to_response(e),
    }
}

/// Delete a category by id
#[utoipa::path(
    delete,
    path = "/category/delete/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 406, description = "No category with this id", body = String),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete(
    State(service): State<Arc<CategoryService>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Response {
    match service.delete_by_id(id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("Failed to delete category {}: {}", id, e);
            category_error_to_response(e)
        }
    }
}

/// Search the caller's categories by title
#[utoipa::path(
    post,
    path = "/category/search",
    tag = "categories",
    request_body = CategorySearchValues,
    responses(
        (status = 200, description = "Matching categories ordered by title", body = [Category]),
        (status = 406, description = "No user id in token", body = String),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn search(
    State(service): State<Arc<CategoryService>>,
    user: AuthUser,
    Json(mut search_values): Json<CategorySearchValues>,
) -> Response {
    search_values.user_id = Some(user.user_id);

    let user_id = match search_values.user_id.as_deref() {
        Some(id) if !id.trim().is_empty() => id,
        _ => return not_acceptable("missed param: user id"),
    };

    match service.find_by_title(search_values.title.clone(), user_id).await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => category_error_to_response(e),
    }
}

/// Find a category by id
#[utoipa::path(
    post,
    path = "/category/id",
    tag = "categories",
    request_body(content = i64, description = "Category id", content_type = "application/json"),
    responses(
        (status = 200, description = "The category", body = Category),
        (status = 406, description = "No category with this id", body = String),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn find_by_id(
    State(service): State<Arc<CategoryService>>,
    _user: AuthUser,
    Json(id): Json<i64>,
) -> Response {
    match service.find_by_id(id).await {
        Ok(category) => Json(category).into_response(),
        Err(e) => category_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_token, JwtVerifier, Role};
    use crate::category::repository::MockCategoryRepository;
    use crate::routes;
    use axum::{body::Body, http::Request, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"category_secret";

    fn app(repository: MockCategoryRepository) -> Router {
        let service = Arc::new(CategoryService::new(Arc::new(repository)));
        let verifier = Arc::new(JwtVerifier::hs256(SECRET));
        routes::categories::routes(service, verifier)
    }

    fn json_request(method: &str, uri: &str, subject: &str, body: Value) -> Request<Body> {
        let token = generate_token(SECRET, subject, &[Role::User]).unwrap();
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn stored(id: i64, title: &str, user_id: &str) -> Category {
        Category {
            id: Some(id),
            title: Some(title.to_string()),
            completed_count: Some(0),
            uncompleted_count: Some(0),
            user_id: Some(user_id.to_string()),
        }
    }

    #[tokio::test]
    async fn test_add_assigns_owner_from_token() {
        let mut repository = MockCategoryRepository::new();
        repository
            .expect_insert()
            .withf(|category: &Category| {
                category.user_id.as_deref() == Some("u1") && category.id.is_none()
            })
            .times(1)
            .returning(|category| {
                Ok(stored(
                    1,
                    category.title.as_deref().unwrap_or_default(),
                    category.user_id.as_deref().unwrap_or_default(),
                ))
            });

        let response = app(repository)
            .oneshot(json_request("POST", "/category/add", "u1", json!({"title": "Work"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["id"], 1);
        assert_eq!(body["title"], "Work");
        assert_eq!(body["userId"], "u1");
    }

    #[tokio::test]
    async fn test_add_ignores_client_supplied_owner() {
        let mut repository = MockCategoryRepository::new();
        repository
            .expect_insert()
            .withf(|category: &Category| category.user_id.as_deref() == Some("u1"))
            .times(1)
            .returning(|_| Ok(stored(2, "Home", "u1")));

        let response = app(repository)
            .oneshot(json_request(
                "POST",
                "/category/add",
                "u1",
                json!({"title": "Home", "userId": "intruder"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_add_with_id_is_rejected() {
        let mut repository = MockCategoryRepository::new();
        repository.expect_insert().never();

        let response = app(repository)
            .oneshot(json_request(
                "POST",
                "/category/add",
                "u1",
                json!({"id": 5, "title": "Work"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            body_text(response).await,
            "redundant param: category id MUST be null"
        );
    }

    #[tokio::test]
    async fn test_add_with_zero_id_is_accepted() {
        let mut repository = MockCategoryRepository::new();
        repository
            .expect_insert()
            .times(1)
            .returning(|_| Ok(stored(9, "Work", "u1")));

        let response = app(repository)
            .oneshot(json_request(
                "POST",
                "/category/add",
                "u1",
                json!({"id": 0, "title": "Work"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_add_without_title_is_rejected() {
        for body in [json!({}), json!({"title": null}), json!({"title": "  "})] {
            let mut repository = MockCategoryRepository::new();
            repository.expect_insert().never();

            let response = app(repository)
                .oneshot(json_request("POST", "/category/add", "u1", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
            assert_eq!(
                body_text(response).await,
                "missed param: title MUST be not null"
            );
        }
    }

    #[tokio::test]
    async fn test_add_with_blank_subject_is_rejected() {
        let mut repository = MockCategoryRepository::new();
        repository.expect_insert().never();

        let response = app(repository)
            .oneshot(json_request("POST", "/category/add", " ", json!({"title": "Work"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body_text(response).await, "user id=  not found");
    }

    #[tokio::test]
    async fn test_update_requires_id_and_title() {
        let cases = [
            (json!({"title": "Work"}), "missed param: id"),
            (json!({"id": 0, "title": "Work"}), "missed param: id"),
            (json!({"id": 3}), "missed param: title"),
            (json!({"id": 3, "title": ""}), "missed param: title"),
        ];

        for (body, message) in cases {
            let mut repository = MockCategoryRepository::new();
            repository.expect_update().never();

            let response = app(repository)
                .oneshot(json_request("PUT", "/category/update", "u1", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
            assert_eq!(body_text(response).await, message);
        }
    }

    #[tokio::test]
    async fn test_update_saves_category() {
        let mut repository = MockCategoryRepository::new();
        repository
            .expect_update()
            .withf(|category: &Category| {
                category.id == Some(3) && category.user_id.as_deref() == Some("u1")
            })
            .times(1)
            .returning(|_| Ok(Some(stored(3, "Renamed", "u1"))));

        let response = app(repository)
            .oneshot(json_request(
                "PUT",
                "/category/update",
                "u1",
                json!({"id": 3, "title": "Renamed"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_not_found() {
        let mut repository = MockCategoryRepository::new();
        repository.expect_delete_by_id().returning(|_| Ok(0));

        let response = app(repository)
            .oneshot(json_request("DELETE", "/category/delete/77", "u1", json!(null)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body_text(response).await, "id=77 not found");
    }

    #[tokio::test]
    async fn test_delete_existing_id() {
        let mut repository = MockCategoryRepository::new();
        repository
            .expect_delete_by_id()
            .withf(|id| *id == 4)
            .returning(|_| Ok(1));

        let response = app(repository)
            .oneshot(json_request("DELETE", "/category/delete/4", "u1", json!(null)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_search_is_scoped_to_token_subject() {
        let mut repository = MockCategoryRepository::new();
        repository
            .expect_find_by_title()
            .withf(|title: &Option<String>, user_id: &str| {
                title.as_deref() == Some("wo") && user_id == "u1"
            })
            .times(1)
            .returning(|_, _| Ok(vec![stored(1, "Work", "u1")]));

        let response = app(repository)
            .oneshot(json_request(
                "POST",
                "/category/search",
                "u1",
                json!({"title": "wo", "userId": "u2"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["userId"], "u1");
    }

    #[tokio::test]
    async fn test_search_with_blank_subject_is_rejected() {
        let mut repository = MockCategoryRepository::new();
        repository.expect_find_by_title().never();

        let response = app(repository)
            .oneshot(json_request("POST", "/category/search", "", json!({"title": "wo"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body_text(response).await, "missed param: user id");
    }

    #[tokio::test]
    async fn test_find_all_for_user() {
        let mut repository = MockCategoryRepository::new();
        repository
            .expect_find_by_user_id()
            .withf(|user_id: &str| user_id == "u1")
            .returning(|_| Ok(vec![stored(1, "Home", "u1"), stored(2, "Work", "u1")]));

        let response = app(repository)
            .oneshot(json_request("POST", "/category/all", "u1", json!("u1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body[0]["title"], "Home");
        assert_eq!(body[1]["title"], "Work");
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let mut repository = MockCategoryRepository::new();
        repository
            .expect_find_by_id()
            .returning(|id| Ok((id == 1).then(|| stored(1, "Work", "u1"))));

        let found = app(repository)
            .oneshot(json_request("POST", "/category/id", "u1", json!(1)))
            .await
            .unwrap();
        assert_eq!(found.status(), StatusCode::OK);

        let mut repository = MockCategoryRepository::new();
        repository.expect_find_by_id().returning(|_| Ok(None));

        let missing = app(repository)
            .oneshot(json_request("POST", "/category/id", "u1", json!(2)))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body_text(missing).await, "id=2 not found");
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() {
        let mut repository = MockCategoryRepository::new();
        repository
            .expect_insert()
            .returning(|_| Err(sqlx::Error::PoolTimedOut));

        let response = app(repository)
            .oneshot(json_request("POST", "/category/add", "u1", json!({"title": "Work"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_requests_without_token_are_unauthorized() {
        let mut repository = MockCategoryRepository::new();
        repository.expect_find_by_user_id().never();

        let request = Request::builder()
            .method("POST")
            .uri("/category/all")
            .header("Content-Type", "application/json")
            .body(Body::from("\"u1\""))
            .unwrap();
        let response = app(repository).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
