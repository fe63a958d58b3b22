//! Request validation shared by the user, recipe and admin endpoints.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::FieldErrors;

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_USER_NAME_LENGTH: usize = 150;
pub const MAX_RECIPE_NAME_LENGTH: usize = 256;
pub const MAX_INGREDIENT_NAME_LENGTH: usize = 128;
pub const MAX_INGREDIENT_UNIT_LENGTH: usize = 64;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32000;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_INGREDIENT_AMOUNT: i32 = 32000;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

/// One `{id, amount}` entry of a recipe payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i32,
}

fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    } else if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        );
    }
}

pub fn check_email(errors: &mut FieldErrors, email: &str) {
    check_text(errors, "email", email, MAX_EMAIL_LENGTH);
    if !email.trim().is_empty() && !EMAIL_RE.is_match(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

pub fn check_username(errors: &mut FieldErrors, username: &str) {
    check_text(errors, "username", username, MAX_USER_NAME_LENGTH);
    if !username.is_empty() && !USERNAME_RE.is_match(username) {
        errors.add(
            "username",
            "Username may contain only letters, digits and @/./+/-/_ characters.",
        );
    }
}

/// First or last name.
pub fn check_person_name(errors: &mut FieldErrors, field: &str, value: &str) {
    check_text(errors, field, value, MAX_USER_NAME_LENGTH);
}

pub fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    if password.is_empty() {
        errors.add(field, BLANK);
    }
}

pub fn check_recipe_name(errors: &mut FieldErrors, name: &str) {
    check_text(errors, "name", name, MAX_RECIPE_NAME_LENGTH);
}

pub fn check_recipe_text(errors: &mut FieldErrors, text: &str) {
    if text.trim().is_empty() {
        errors.add("text", BLANK);
    }
}

pub fn check_cooking_time(errors: &mut FieldErrors, minutes: i32) {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&minutes) {
        errors.add(
            "cooking_time",
            format!("Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes."),
        );
    }
}

/// The ingredient list of a recipe: present, non-empty, no repeated ids and
/// every amount within bounds.
pub fn check_recipe_ingredients(errors: &mut FieldErrors, ingredients: Option<&[IngredientAmount]>) {
    let Some(ingredients) = ingredients else {
        errors.add("ingredients", REQUIRED);
        return;
    };

    if ingredients.is_empty() {
        errors.add("ingredients", "At least one ingredient is required.");
        return;
    }

    let unique: HashSet<i64> = ingredients.iter().map(|i| i.id).collect();
    if unique.len() < ingredients.len() {
        errors.add("ingredients", "Ingredients must not repeat.");
    }

    for item in ingredients {
        if !(MIN_INGREDIENT_AMOUNT..=MAX_INGREDIENT_AMOUNT).contains(&item.amount) {
            errors.add(
                "ingredients",
                format!(
                    "Amount of ingredient {} must be between {MIN_INGREDIENT_AMOUNT} and {MAX_INGREDIENT_AMOUNT}.",
                    item.id
                ),
            );
        }
    }
}

pub fn check_ingredient(errors: &mut FieldErrors, name: &str, measurement_unit: &str) {
    check_text(errors, "name", name, MAX_INGREDIENT_NAME_LENGTH);
    check_text(
        errors,
        "measurement_unit",
        measurement_unit,
        MAX_INGREDIENT_UNIT_LENGTH,
    );
}

/// Parse a boolean-like query flag (`1`, `0`, `true`, `false`).
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
