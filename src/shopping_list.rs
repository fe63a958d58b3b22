//! Shopping list aggregation for the cart download.

use std::collections::HashMap;

use diesel::prelude::*;

use crate::schema::{ingredients, ingredients_in_recipe, shopping_lists};

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

/// One ingredient row of a recipe sitting in a user's cart.
#[derive(Debug, Clone, Queryable)]
pub struct CartRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Ingredient rows of every recipe in the user's cart.
pub fn load_cart_rows(conn: &mut PgConnection, user_id: i64) -> QueryResult<Vec<CartRow>> {
    ingredients_in_recipe::table
        .inner_join(ingredients::table)
        .filter(
            ingredients_in_recipe::recipe_id.eq_any(
                shopping_lists::table
                    .filter(shopping_lists::user_id.eq(user_id))
                    .select(shopping_lists::recipe_id),
            ),
        )
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            ingredients_in_recipe::amount,
        ))
        .load(conn)
}

/// Sum amounts per (name, unit) and sort by name, case-insensitively.
pub fn aggregate<I>(rows: I) -> Vec<ShoppingListLine>
where
    I: IntoIterator<Item = CartRow>,
{
    let mut totals: HashMap<(String, String), i64> = HashMap::new();
    for row in rows {
        *totals
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }

    let mut lines: Vec<ShoppingListLine> = totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListLine {
            name,
            measurement_unit,
            total,
        })
        .collect();

    lines.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
    });
    lines
}

pub fn render(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{} ({}) — {}", line.name, line.measurement_unit, line.total))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartRow {
        CartRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_shared_ingredient_is_summed() {
        let lines = aggregate(vec![row("Salt", "g", 5), row("Salt", "g", 10)]);
        assert_eq!(render(&lines), "Salt (g) — 15");
    }

    #[test]
    fn test_units_are_kept_apart() {
        let lines = aggregate(vec![
            row("Milk", "ml", 200),
            row("Milk", "cup", 1),
            row("Milk", "ml", 300),
        ]);
        assert_eq!(render(&lines), "Milk (cup) — 1\nMilk (ml) — 500");
    }

    #[test]
    fn test_sorted_by_name() {
        let lines = aggregate(vec![
            row("sugar", "g", 100),
            row("Butter", "g", 50),
            row("apples", "pcs", 3),
        ]);
        let names: Vec<&str> = lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["apples", "Butter", "sugar"]);
    }

    #[test]
    fn test_empty_cart_renders_empty_document() {
        assert_eq!(render(&aggregate(Vec::new())), "");
    }

    #[test]
    fn test_large_totals_do_not_overflow() {
        let rows = (0..100_000).map(|_| row("Flour", "g", 32_000));
        let lines = aggregate(rows);
        assert_eq!(lines[0].total, 3_200_000_000);
    }
}
