use crate::error::AppError;
use crate::identity::IdentityProfile;
use crate::users::dto::{UpdateUserRequest, User, UserFilter};
use crate::users::repo::UsersRepo;

/// Thin orchestration over the repository; no business logic of its own.
#[derive(Clone)]
pub struct UserService {
    repo: UsersRepo,
}

impl UserService {
    pub fn new(repo: UsersRepo) -> Self {
        Self { repo }
    }

    pub async fn get_all_users(
        &self,
        filter: &UserFilter,
        page: i64,
        limit: i64,
    ) -> Result<Vec<User>, AppError> {
        self.repo.get_all_users(filter, page, limit).await
    }

    /// Persists the new user and assembles the response from the plaintext
    /// passport plus the profile the identity lookup produced.
    pub async fn create_user(
        &self,
        passport: &str,
        profile: &IdentityProfile,
    ) -> Result<User, AppError> {
        let id = self.repo.add_user(passport, profile).await?;

        Ok(User {
            id,
            passport_number: passport.to_string(),
            surname: profile.surname.clone(),
            name: profile.name.clone(),
            patronymic: profile.patronymic.clone(),
            address: profile.address.clone(),
        })
    }

    pub async fn get_user_by_id(&self, user_id: i32) -> Result<User, AppError> {
        self.repo.find_user_by_id(user_id).await
    }

    pub async fn update_user(
        &self,
        update: &UpdateUserRequest,
        user_id: i32,
    ) -> Result<User, AppError> {
        self.repo.update_user(update, user_id).await
    }

    pub async fn delete_user(&self, user_id: i32) -> Result<(), AppError> {
        self.repo.delete_user(user_id).await
    }
}
