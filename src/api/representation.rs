//! JSON representations of users and recipes, loaded in batches for a page of
//! rows and a given viewer.

use std::collections::{HashMap, HashSet};

use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Recipe, User};
use crate::schema::{
    favorites, ingredients, ingredients_in_recipe, recipes, shopping_lists, subscriptions, users,
};

pub fn media_url(base_url: &str, photo_id: Uuid) -> String {
    format!("{}/media/{}", base_url.trim_end_matches('/'), photo_id)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Whether the caller follows this user
    pub is_subscribed: bool,
    /// Avatar URL, if one is set
    pub avatar: Option<String>,
}

impl UserResponse {
    pub fn new(user: &User, is_subscribed: bool, base_url: &str) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            is_subscribed,
            avatar: user.avatar_id.map(|id| media_url(base_url, id)),
        }
    }
}

/// Short projection of a recipe.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeShort {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeShort {
    pub fn new(recipe: &Recipe, base_url: &str) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: media_url(base_url, recipe.image_id),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserWithRecipesResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    /// Ingredient id
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    /// Minutes
    pub cooking_time: i32,
}

#[derive(Queryable)]
struct RecipeIngredientRow {
    recipe_id: i64,
    id: i64,
    name: String,
    measurement_unit: String,
    amount: i32,
}

/// Ids among `candidates` that `viewer` follows.
fn followed_ids(
    conn: &mut PgConnection,
    viewer: Option<i64>,
    candidates: &[i64],
) -> QueryResult<HashSet<i64>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    let ids: Vec<i64> = subscriptions::table
        .filter(subscriptions::subscriber_id.eq(viewer))
        .filter(subscriptions::subscription_id.eq_any(candidates))
        .select(subscriptions::subscription_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

pub fn user_responses(
    conn: &mut PgConnection,
    viewer: Option<i64>,
    users: &[User],
    base_url: &str,
) -> QueryResult<Vec<UserResponse>> {
    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    let followed = followed_ids(conn, viewer, &ids)?;
    Ok(users
        .iter()
        .map(|u| UserResponse::new(u, followed.contains(&u.id), base_url))
        .collect())
}

pub fn user_response(
    conn: &mut PgConnection,
    viewer: Option<i64>,
    user: &User,
    base_url: &str,
) -> QueryResult<UserResponse> {
    let followed = followed_ids(conn, viewer, &[user.id])?;
    Ok(UserResponse::new(user, followed.contains(&user.id), base_url))
}

/// Users extended with their newest recipes (up to `recipes_limit` each) and
/// their total recipe count.
pub fn users_with_recipes(
    conn: &mut PgConnection,
    viewer: Option<i64>,
    users: &[User],
    recipes_limit: Option<usize>,
    base_url: &str,
) -> QueryResult<Vec<UserWithRecipesResponse>> {
    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    let followed = followed_ids(conn, viewer, &ids)?;

    let counts: HashMap<i64, i64> = recipes::table
        .filter(recipes::author_id.eq_any(&ids))
        .group_by(recipes::author_id)
        .select((recipes::author_id, count_star()))
        .load::<(i64, i64)>(conn)?
        .into_iter()
        .collect();

    let authored: Vec<Recipe> = recipes::table
        .filter(recipes::author_id.eq_any(&ids))
        .order((recipes::created_at.desc(), recipes::id.desc()))
        .select(Recipe::as_select())
        .load(conn)?;

    let mut by_author: HashMap<i64, Vec<RecipeShort>> = HashMap::new();
    for recipe in &authored {
        let list = by_author.entry(recipe.author_id).or_default();
        if recipes_limit.is_none_or(|limit| list.len() < limit) {
            list.push(RecipeShort::new(recipe, base_url));
        }
    }

    Ok(users
        .iter()
        .map(|u| UserWithRecipesResponse {
            user: UserResponse::new(u, followed.contains(&u.id), base_url),
            recipes: by_author.remove(&u.id).unwrap_or_default(),
            recipes_count: counts.get(&u.id).copied().unwrap_or(0),
        })
        .collect())
}

/// Full representations of `recipes`, preserving their order.
pub fn recipe_responses(
    conn: &mut PgConnection,
    viewer: Option<i64>,
    recipes: &[Recipe],
    base_url: &str,
) -> QueryResult<Vec<RecipeResponse>> {
    let recipe_ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<i64> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors: Vec<User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select(User::as_select())
        .load(conn)?;
    let authors: HashMap<i64, UserResponse> = user_responses(conn, viewer, &authors, base_url)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let rows: Vec<RecipeIngredientRow> = ingredients_in_recipe::table
        .inner_join(ingredients::table)
        .filter(ingredients_in_recipe::recipe_id.eq_any(&recipe_ids))
        .order(ingredients_in_recipe::id)
        .select((
            ingredients_in_recipe::recipe_id,
            ingredients::id,
            ingredients::name,
            ingredients::measurement_unit,
            ingredients_in_recipe::amount,
        ))
        .load(conn)?;
    let mut ingredients_by_recipe: HashMap<i64, Vec<RecipeIngredientResponse>> = HashMap::new();
    for row in rows {
        ingredients_by_recipe
            .entry(row.recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id: row.id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                amount: row.amount,
            });
    }

    let (favorited, in_cart): (HashSet<i64>, HashSet<i64>) = match viewer {
        Some(viewer) => (
            favorites::table
                .filter(favorites::user_id.eq(viewer))
                .filter(favorites::recipe_id.eq_any(&recipe_ids))
                .select(favorites::recipe_id)
                .load::<i64>(conn)?
                .into_iter()
                .collect(),
            shopping_lists::table
                .filter(shopping_lists::user_id.eq(viewer))
                .filter(shopping_lists::recipe_id.eq_any(&recipe_ids))
                .select(shopping_lists::recipe_id)
                .load::<i64>(conn)?
                .into_iter()
                .collect(),
        ),
        None => Default::default(),
    };

    let mut responses = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let author = match authors.get(&recipe.author_id) {
            Some(author) => author.clone(),
            None => return Err(diesel::result::Error::NotFound),
        };
        responses.push(RecipeResponse {
            id: recipe.id,
            author,
            ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            name: recipe.name.clone(),
            image: media_url(base_url, recipe.image_id),
            text: recipe.text.clone(),
            cooking_time: recipe.cooking_time,
        });
    }
    Ok(responses)
}

pub fn recipe_response(
    conn: &mut PgConnection,
    viewer: Option<i64>,
    recipe: &Recipe,
    base_url: &str,
) -> QueryResult<RecipeResponse> {
    recipe_responses(conn, viewer, std::slice::from_ref(recipe), base_url)?
        .pop()
        .ok_or(diesel::result::Error::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: 7,
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            password_hash: "$argon2id$...".to_string(),
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
            avatar_id: None,
        }
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let json = serde_json::to_value(UserResponse::new(&user(), true, "http://h")).unwrap();
        assert_eq!(json["username"], "cook");
        assert_eq!(json["is_subscribed"], true);
        assert!(json["avatar"].is_null());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_avatar_is_media_url() {
        let id = Uuid::nil();
        let mut u = user();
        u.avatar_id = Some(id);
        let response = UserResponse::new(&u, false, "https://foodgram.example/");
        assert_eq!(
            response.avatar.as_deref(),
            Some("https://foodgram.example/media/00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn test_user_with_recipes_is_flattened() {
        let response = UserWithRecipesResponse {
            user: UserResponse::new(&user(), true, "http://h"),
            recipes: vec![],
            recipes_count: 3,
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["recipes_count"], 3);
        assert!(json["recipes"].as_array().unwrap().is_empty());
    }
}
