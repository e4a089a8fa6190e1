//! Category creation endpoint.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    Error, FieldErrors, Identity,
    category::{CategoryForm, CategoryName, CategoryState, CategoryType, create_category},
};

/// A route handler for creating a category for the logged-in user.
///
/// Responds with 201 and the new category. Both fields are validated before
/// responding so that all problems are reported together.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CategoryForm>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(form) = payload?;

    let mut errors = FieldErrors::new();
    let name = errors.record(CategoryName::new(&form.name))?;
    let kind = errors.record(form.kind.parse::<CategoryType>())?;

    let (Some(name), Some(kind)) = (name, kind) else {
        return Err(Error::Validation(errors));
    };

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    create_category(identity.id, name, kind, &connection)
        .map(|category| (StatusCode::CREATED, Json(category)))
}

#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        CategoryType, Email, Error, Identity, PasswordHash, UserName,
        category::{CategoryForm, CategoryState, get_categories},
        db::initialize,
        user::create_user,
    };

    use super::create_category_endpoint;

    fn get_state_and_identity() -> (CategoryState, Identity) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            UserName::new_unchecked("Alice"),
            Email::new_unchecked("alice@example.com"),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        (
            CategoryState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.identity(),
        )
    }

    fn form(name: &str, kind: &str) -> Json<CategoryForm> {
        Json(CategoryForm {
            name: name.to_owned(),
            kind: kind.to_owned(),
        })
    }

    #[tokio::test]
    async fn creates_category() {
        let (state, identity) = get_state_and_identity();

        let response = create_category_endpoint(
            State(state.clone()),
            Extension(identity.clone()),
            Ok(form("Groceries", "EXPENSE")),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let categories = get_categories(identity.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_ref(), "Groceries");
        assert_eq!(categories[0].kind, CategoryType::Expense);
    }

    #[tokio::test]
    async fn reports_every_invalid_field() {
        let (state, identity) = get_state_and_identity();

        let result =
            create_category_endpoint(State(state), Extension(identity), Ok(form("  ", "SAVINGS")))
                .await
                .map(|_| ());

        let Err(Error::Validation(errors)) = result else {
            panic!("want validation error, got {result:?}");
        };
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "type"]);
    }

    #[tokio::test]
    async fn rejects_duplicate_name() {
        let (state, identity) = get_state_and_identity();
        create_category_endpoint(
            State(state.clone()),
            Extension(identity.clone()),
            Ok(form("Groceries", "EXPENSE")),
        )
        .await
        .unwrap();

        let result = create_category_endpoint(
            State(state),
            Extension(identity),
            Ok(form("Groceries", "INCOME")),
        )
        .await
        .map(|_| ());

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Groceries".to_owned()))
        );
    }
}
