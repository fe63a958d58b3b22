//! Account creation shared by registration and the operator CLI.

use diesel::prelude::*;

use crate::auth::hash_password;
use crate::error::{unique_violation, ApiError, FieldErrors};
use crate::models::{NewUser, User};
use crate::schema::users;
use crate::validation;

pub struct NewAccount<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
}

impl NewAccount<'_> {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validation::check_email(&mut errors, self.email);
        validation::check_username(&mut errors, self.username);
        validation::check_person_name(&mut errors, "first_name", self.first_name);
        validation::check_person_name(&mut errors, "last_name", self.last_name);
        validation::check_password(&mut errors, "password", self.password);
        errors
    }
}

/// Validates and inserts a user. Duplicate email or username comes back as a
/// field error on the offending field.
pub fn create_account(
    conn: &mut PgConnection,
    account: &NewAccount<'_>,
    is_staff: bool,
) -> Result<User, ApiError> {
    account.validate().into_result()?;

    let password_hash = hash_password(account.password)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))?;

    let new_user = NewUser {
        email: account.email.trim(),
        username: account.username,
        first_name: account.first_name,
        last_name: account.last_name,
        password_hash: &password_hash,
        is_staff,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| match unique_violation(&e) {
            Some("users_email_key") => ApiError::Validation(FieldErrors::single(
                "email",
                "A user with that email already exists.",
            )),
            Some("users_username_key") => ApiError::Validation(FieldErrors::single(
                "username",
                "A user with that username already exists.",
            )),
            _ => ApiError::from(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account<'a>(email: &'a str, username: &'a str, password: &'a str) -> NewAccount<'a> {
        NewAccount {
            email,
            username,
            first_name: "Anna",
            last_name: "Petrova",
            password,
        }
    }

    #[test]
    fn test_valid_account() {
        assert!(account("cook@example.com", "cook", "pw").validate().is_empty());
    }

    #[test]
    fn test_every_bad_field_reported() {
        let errors = account("nope", "bad name", "").validate();
        assert!(errors.get("email").is_some());
        assert!(errors.get("username").is_some());
        assert!(errors.get("password").is_some());
        assert!(errors.get("first_name").is_none());
    }
}
