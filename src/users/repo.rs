use std::sync::Arc;

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::crypto::PassportCodec;
use crate::error::AppError;
use crate::identity::IdentityProfile;
use crate::users::dto::{UpdateUserRequest, User, UserFilter};

const USER_COLUMNS: &str = "id, passport_encrypted, surname, name, patronymic, address";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    passport_encrypted: String,
    surname: String,
    name: String,
    patronymic: String,
    address: String,
}

#[derive(Clone)]
pub struct UsersRepo {
    db: PgPool,
    codec: Arc<dyn PassportCodec>,
}

impl UsersRepo {
    pub fn new(db: PgPool, codec: Arc<dyn PassportCodec>) -> Self {
        Self { db, codec }
    }

    /// Filtered, paginated listing ordered by id. Text filters compile to
    /// bound equality predicates; the passport filter cannot (the stored
    /// blob is nonce-randomized) and is applied after decryption, together
    /// with the page slice, so page numbering stays correct.
    pub async fn get_all_users(
        &self,
        filter: &UserFilter,
        page: i64,
        limit: i64,
    ) -> Result<Vec<User>, AppError> {
        let sql_page = if filter.passport.is_none() {
            Some((page, limit))
        } else {
            None
        };

        let mut query = list_query(filter, sql_page);
        let rows: Vec<UserRow> = query.build_query_as().fetch_all(&self.db).await?;
        let mut users = decrypt_rows(rows, self.codec.as_ref())?;

        if let Some(wanted) = filter.passport.as_deref() {
            users.retain(|u| u.passport_number == wanted);
            let offset = ((page - 1) * limit) as usize;
            users = users
                .into_iter()
                .skip(offset)
                .take(limit as usize)
                .collect();
        }
        Ok(users)
    }

    /// Encrypts the passport and inserts the row, returning the generated id.
    pub async fn add_user(
        &self,
        passport: &str,
        profile: &IdentityProfile,
    ) -> Result<i32, AppError> {
        let passport_encrypted = self.codec.encrypt(passport)?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO users (passport_encrypted, surname, name, patronymic, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&passport_encrypted)
        .bind(&profile.surname)
        .bind(&profile.name)
        .bind(&profile.patronymic)
        .bind(&profile.address)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    pub async fn find_user_by_id(&self, user_id: i32) -> Result<User, AppError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        let row = row.ok_or(AppError::UserNotFound)?;
        decrypt_row(row, self.codec.as_ref())
    }

    /// Partial update of the identity attributes; the passport column is
    /// never touched here. The updated row comes back re-decrypted.
    pub async fn update_user(
        &self,
        update: &UpdateUserRequest,
        user_id: i32,
    ) -> Result<User, AppError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET surname = COALESCE($2, surname),
                name = COALESCE($3, name),
                patronymic = COALESCE($4, patronymic),
                address = COALESCE($5, address)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(update.surname.as_deref())
        .bind(update.name.as_deref())
        .bind(update.patronymic.as_deref())
        .bind(update.address.as_deref())
        .fetch_optional(&self.db)
        .await?;

        let row = row.ok_or(AppError::UserNotFound)?;
        decrypt_row(row, self.codec.as_ref())
    }

    pub async fn delete_user(&self, user_id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}

/// Builds the listing query from a fixed column whitelist; every filter
/// value goes through a bind parameter. `sql_page` is `None` when pagination
/// has to happen after decryption instead.
fn list_query<'a>(
    filter: &'a UserFilter,
    sql_page: Option<(i64, i64)>,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));

    let predicates = [
        ("surname", filter.surname.as_deref()),
        ("name", filter.name.as_deref()),
        ("patronymic", filter.patronymic.as_deref()),
        ("address", filter.address.as_deref()),
    ];

    let mut prefix = " WHERE ";
    for (column, value) in predicates {
        if let Some(value) = value {
            qb.push(prefix);
            qb.push(column);
            qb.push(" = ");
            qb.push_bind(value);
            prefix = " AND ";
        }
    }

    qb.push(" ORDER BY id");
    if let Some((page, limit)) = sql_page {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind((page - 1) * limit);
    }
    qb
}

fn decrypt_row(row: UserRow, codec: &dyn PassportCodec) -> Result<User, AppError> {
    let passport_number = codec.decrypt(&row.passport_encrypted)?;
    Ok(User {
        id: row.id,
        passport_number,
        surname: row.surname,
        name: row.name,
        patronymic: row.patronymic,
        address: row.address,
    })
}

/// A single undecryptable row aborts the whole listing; no partial results.
fn decrypt_rows(rows: Vec<UserRow>, codec: &dyn PassportCodec) -> Result<Vec<User>, AppError> {
    rows.into_iter().map(|row| decrypt_row(row, codec)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CodecError;

    /// Deterministic stand-in: "encryption" reverses the string.
    struct ReverseCodec;

    impl PassportCodec for ReverseCodec {
        fn encrypt(&self, plain: &str) -> Result<String, CodecError> {
            Ok(plain.chars().rev().collect())
        }

        fn decrypt(&self, blob: &str) -> Result<String, CodecError> {
            if blob == "unreadable" {
                return Err(CodecError::Decrypt);
            }
            Ok(blob.chars().rev().collect())
        }
    }

    fn row(id: i32, blob: &str) -> UserRow {
        UserRow {
            id,
            passport_encrypted: blob.into(),
            surname: "Ivanov".into(),
            name: "Ivan".into(),
            patronymic: "Ivanovich".into(),
            address: "Moscow".into(),
        }
    }

    #[test]
    fn list_query_without_filters_paginates_in_sql() {
        let sql = list_query(&UserFilter::default(), Some((1, 10))).into_sql();
        assert_eq!(
            sql,
            format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2")
        );
    }

    #[test]
    fn list_query_chains_supplied_filters_conjunctively() {
        let filter = UserFilter {
            surname: Some("Ivanov".into()),
            address: Some("Moscow".into()),
            ..UserFilter::default()
        };
        let sql = list_query(&filter, Some((2, 5))).into_sql();
        assert_eq!(
            sql,
            format!(
                "SELECT {USER_COLUMNS} FROM users \
                 WHERE surname = $1 AND address = $2 ORDER BY id LIMIT $3 OFFSET $4"
            )
        );
    }

    #[test]
    fn list_query_skips_sql_pagination_when_asked() {
        let filter = UserFilter {
            name: Some("Ivan".into()),
            ..UserFilter::default()
        };
        let sql = list_query(&filter, None).into_sql();
        assert_eq!(
            sql,
            format!("SELECT {USER_COLUMNS} FROM users WHERE name = $1 ORDER BY id")
        );
    }

    #[test]
    fn decrypt_rows_restores_the_plaintext_passport() {
        let users = decrypt_rows(vec![row(1, "098765 4321")], &ReverseCodec).unwrap();
        assert_eq!(users[0].passport_number, "1234 567890");
        assert_eq!(users[0].surname, "Ivanov");
    }

    #[test]
    fn one_bad_row_aborts_the_whole_listing() {
        let rows = vec![row(1, "098765 4321"), row(2, "unreadable")];
        let res = decrypt_rows(rows, &ReverseCodec);
        assert!(matches!(res, Err(AppError::Codec(CodecError::Decrypt))));
    }
}
