//! PostgreSQL fixtures for tests. Tests using [`test_conn`] return early when
//! `DATABASE_URL` is unset; otherwise they run inside a transaction that is
//! rolled back when the connection drops.

use std::sync::Once;

use diesel::prelude::*;
use diesel_migrations::MigrationHarness;

use crate::db::MIGRATIONS;

static MIGRATE: Once = Once::new();

pub fn test_conn() -> Option<PgConnection> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let mut conn = PgConnection::establish(&url).expect("connect to DATABASE_URL");
    MIGRATE.call_once(|| {
        conn.run_pending_migrations(MIGRATIONS)
            .expect("run migrations");
    });
    conn.begin_test_transaction()
        .expect("begin test transaction");
    Some(conn)
}

pub mod fixtures {
    use diesel::prelude::*;

    use crate::api::recipes::create::insert_recipe;
    use crate::api::recipes::payload::RecipeInput;
    use crate::images::DecodedImage;
    use crate::models::{Ingredient, NewIngredient, NewUser, Recipe, User};
    use crate::schema::{ingredients, users};
    use crate::validation::IngredientAmount;

    pub fn user(conn: &mut PgConnection, username: &str) -> User {
        let email = format!("{username}@example.com");
        diesel::insert_into(users::table)
            .values(&NewUser {
                email: &email,
                username,
                first_name: "Test",
                last_name: "Cook",
                password_hash: "unusable",
                is_staff: false,
            })
            .returning(User::as_returning())
            .get_result(conn)
            .expect("insert user")
    }

    pub fn ingredient(conn: &mut PgConnection, name: &str, unit: &str) -> Ingredient {
        diesel::insert_into(ingredients::table)
            .values(&NewIngredient {
                name: name.to_string(),
                measurement_unit: unit.to_string(),
            })
            .returning(Ingredient::as_returning())
            .get_result(conn)
            .expect("insert ingredient")
    }

    pub fn image() -> DecodedImage {
        DecodedImage {
            data: b"\x89PNG\r\n\x1a\n".to_vec(),
            content_type: "image/png".to_string(),
        }
    }

    /// A recipe by `author` using one ingredient, stored the way the create
    /// endpoint stores it.
    pub fn recipe(conn: &mut PgConnection, author: &User, name: &str, ingredient_id: i64) -> Recipe {
        let input = RecipeInput {
            ingredients: vec![IngredientAmount {
                id: ingredient_id,
                amount: 100,
            }],
            image: Some(image()),
            name: Some(name.to_string()),
            text: Some(format!("How to cook {name}")),
            cooking_time: Some(20),
        };
        insert_recipe(conn, author.id, &input).expect("insert recipe")
    }
}
