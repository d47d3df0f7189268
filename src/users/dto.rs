use serde::{Deserialize, Serialize};

/// Wire shape of a user. The passport travels in plaintext; only the stored
/// copy is encrypted.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    #[serde(rename = "passportNumber")]
    pub passport_number: String,
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub address: String,
}

/// Request body for user creation.
#[derive(Debug, Deserialize)]
pub struct NewUserRequest {
    #[serde(rename = "passportNumber")]
    pub passport_number: String,
}

/// Request body for partial update; absent fields keep their stored value.
/// The passport number is immutable after creation and has no field here.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub surname: Option<String>,
    pub name: Option<String>,
    pub patronymic: Option<String>,
    pub address: Option<String>,
}

/// Query string of `GET /users`: optional exact-match filters plus 1-based
/// pagination.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub passport: Option<String>,
    pub surname: Option<String>,
    pub name: Option<String>,
    pub patronymic: Option<String>,
    pub address: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    10
}

/// Filter predicates for the user listing; a `None` field adds no condition.
#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    pub passport: Option<String>,
    pub surname: Option<String>,
    pub name: Option<String>,
    pub patronymic: Option<String>,
    pub address: Option<String>,
}

impl From<&UserListQuery> for UserFilter {
    fn from(q: &UserListQuery) -> Self {
        Self {
            passport: q.passport.clone(),
            surname: q.surname.clone(),
            name: q.name.clone(),
            patronymic: q.patronymic.clone(),
            address: q.address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_passport_in_camel_case() {
        let user = User {
            id: 1,
            passport_number: "1234 567890".into(),
            surname: "Ivanov".into(),
            name: "Ivan".into(),
            patronymic: "Ivanovich".into(),
            address: "Moscow".into(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains(r#""passportNumber":"1234 567890""#));
        assert!(!json.contains("passport_number"));
    }

    #[test]
    fn list_query_defaults_to_first_page_of_ten() {
        let q: UserListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert!(q.passport.is_none());
        assert!(q.surname.is_none());
    }

    #[test]
    fn update_request_fields_are_all_optional() {
        let u: UpdateUserRequest = serde_json::from_str(r#"{"surname":"Petrov"}"#).unwrap();
        assert_eq!(u.surname.as_deref(), Some("Petrov"));
        assert!(u.name.is_none());
        assert!(u.patronymic.is_none());
        assert!(u.address.is_none());
    }
}
