//! Request body shared by recipe create and update.

use std::collections::HashSet;

use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ApiError, FieldErrors};
use crate::images::{decode_image_payload, DecodedImage};
use crate::models::{NewIngredientInRecipe, Recipe};
use crate::schema::{ingredients, ingredients_in_recipe, recipes};
use crate::validation::{
    check_cooking_time, check_recipe_ingredients, check_recipe_name, check_recipe_text,
    IngredientAmount,
};

const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecipePayload {
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientAmount>>,
    /// `data:image/<ext>;base64,...` URI
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Minutes
    #[serde(default)]
    pub cooking_time: Option<i32>,
}

/// A payload that passed validation. On update, `None` fields are left alone;
/// the ingredient list is always present and replaces the stored one.
#[derive(Debug, Default)]
pub struct RecipeInput {
    pub ingredients: Vec<IngredientAmount>,
    pub image: Option<DecodedImage>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

impl RecipePayload {
    /// Field checks that need no database access. Every write carries the
    /// full ingredient list; the image is only required on create.
    pub fn check(&self, mode: Mode, errors: &mut FieldErrors) {
        let required = mode == Mode::Create;

        match &self.name {
            Some(name) => check_recipe_name(errors, name),
            None if required => errors.add("name", REQUIRED),
            None => {}
        }
        match &self.text {
            Some(text) => check_recipe_text(errors, text),
            None if required => errors.add("text", REQUIRED),
            None => {}
        }
        match self.cooking_time {
            Some(minutes) => check_cooking_time(errors, minutes),
            None if required => errors.add("cooking_time", REQUIRED),
            None => {}
        }
        check_recipe_ingredients(errors, self.ingredients.as_deref());
        if self.image.is_none() && required {
            errors.add("image", REQUIRED);
        }
    }

    pub fn validate(self, conn: &mut PgConnection, mode: Mode) -> Result<RecipeInput, ApiError> {
        let mut errors = FieldErrors::new();
        self.check(mode, &mut errors);

        if errors.get("ingredients").is_none() {
            if let Some(items) = &self.ingredients {
                check_ingredients_exist(conn, items, &mut errors)?;
            }
        }

        let image = match self.image.as_deref().map(decode_image_payload) {
            Some(Ok(image)) => Some(image),
            Some(Err(message)) => {
                errors.add("image", message);
                None
            }
            None => None,
        };

        errors.into_result()?;

        Ok(RecipeInput {
            ingredients: self.ingredients.unwrap_or_default(),
            image,
            name: self.name.map(|n| n.trim().to_string()),
            text: self.text,
            cooking_time: self.cooking_time,
        })
    }
}

fn check_ingredients_exist(
    conn: &mut PgConnection,
    items: &[IngredientAmount],
    errors: &mut FieldErrors,
) -> QueryResult<()> {
    let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    let known: HashSet<i64> = ingredients::table
        .filter(ingredients::id.eq_any(&ids))
        .select(ingredients::id)
        .load::<i64>(conn)?
        .into_iter()
        .collect();

    for id in ids.iter().filter(|id| !known.contains(id)) {
        errors.add("ingredients", format!("Ingredient {id} does not exist."));
    }
    Ok(())
}

/// Replaces the ingredient set of a recipe.
pub fn replace_ingredients(
    conn: &mut PgConnection,
    recipe_id: i64,
    items: &[IngredientAmount],
) -> QueryResult<()> {
    diesel::delete(ingredients_in_recipe::table.filter(ingredients_in_recipe::recipe_id.eq(recipe_id)))
        .execute(conn)?;

    let rows: Vec<NewIngredientInRecipe> = items
        .iter()
        .map(|item| NewIngredientInRecipe {
            recipe_id,
            ingredient_id: item.id,
            amount: item.amount,
        })
        .collect();

    diesel::insert_into(ingredients_in_recipe::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

pub fn load_recipe(conn: &mut PgConnection, id: i64) -> Result<Recipe, ApiError> {
    recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Recipe"))
}

/// Loads a recipe the caller is allowed to change.
pub fn load_own_recipe(conn: &mut PgConnection, id: i64, user_id: i64) -> Result<Recipe, ApiError> {
    let recipe = load_recipe(conn, id)?;
    if recipe.author_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the author may change this recipe".to_string(),
        ));
    }
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> RecipePayload {
        RecipePayload {
            ingredients: Some(vec![IngredientAmount { id: 1, amount: 10 }]),
            image: Some("data:image/png;base64,AAAA".to_string()),
            name: Some("Soup".to_string()),
            text: Some("Boil".to_string()),
            cooking_time: Some(30),
        }
    }

    #[test]
    fn test_create_requires_every_field() {
        let mut errors = FieldErrors::new();
        RecipePayload::default().check(Mode::Create, &mut errors);
        for field in ["name", "text", "cooking_time", "ingredients", "image"] {
            assert!(errors.get(field).is_some(), "{field} should be required");
        }
    }

    #[test]
    fn test_update_requires_ingredients() {
        let payload = RecipePayload {
            name: Some("New name".to_string()),
            ..Default::default()
        };
        let mut errors = FieldErrors::new();
        payload.check(Mode::Update, &mut errors);
        assert!(errors.get("ingredients").is_some());
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn test_update_allows_other_fields_absent() {
        let payload = RecipePayload {
            ingredients: Some(vec![IngredientAmount { id: 1, amount: 10 }]),
            ..Default::default()
        };
        let mut errors = FieldErrors::new();
        payload.check(Mode::Update, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_update_still_checks_present_fields() {
        let payload = RecipePayload {
            ingredients: Some(vec![]),
            cooking_time: Some(0),
            ..Default::default()
        };
        let mut errors = FieldErrors::new();
        payload.check(Mode::Update, &mut errors);
        assert!(errors.get("ingredients").is_some());
        assert!(errors.get("cooking_time").is_some());
    }

    #[test]
    fn test_duplicate_ingredient_in_payload() {
        let payload = RecipePayload {
            ingredients: Some(vec![
                IngredientAmount { id: 1, amount: 10 },
                IngredientAmount { id: 1, amount: 20 },
            ]),
            ..full()
        };
        let mut errors = FieldErrors::new();
        payload.check(Mode::Create, &mut errors);
        assert_eq!(
            errors.get("ingredients"),
            Some(&["Ingredients must not repeat.".to_string()][..])
        );
    }

    #[test]
    fn test_payload_deserializes() {
        let payload: RecipePayload = serde_json::from_value(serde_json::json!({
            "ingredients": [{"id": 1123, "amount": 10}],
            "image": "data:image/png;base64,AAAA",
            "name": "string",
            "text": "string",
            "cooking_time": 1
        }))
        .unwrap();
        assert_eq!(payload.ingredients.unwrap()[0], IngredientAmount { id: 1123, amount: 10 });
        assert_eq!(payload.cooking_time, Some(1));
    }
}
