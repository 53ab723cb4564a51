use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use warp::Reply;

use crate::constants::FILE_SHOPPING_LIST;

/// One ingredient line, either a raw join-table row or an aggregated total.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Groups rows by the exact (name, measurement_unit) pair and sums amounts
/// within each group. No case or whitespace normalization: "Sugar" and
/// "sugar" stay separate lines. Output is sorted by name, then unit.
pub fn aggregate_ingredients(
    rows: impl IntoIterator<Item = IngredientAmount>,
) -> Vec<IngredientAmount> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for row in rows {
        *totals.entry((row.name, row.measurement_unit)).or_insert(0) += row.amount;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| IngredientAmount {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

/// Renders the plain-text report:
///
/// ```text
/// Shopping list for: Jane Doe
///
/// - Flour (g) - 500
/// - Salt (g) - 10
/// ```
pub fn render_shopping_list(display_name: &str, items: &[IngredientAmount]) -> String {
    let header = format!("Shopping list for: {display_name}\n\n");
    let lines = items
        .iter()
        .map(|item| format!("- {} ({}) - {}", item.name, item.measurement_unit, item.amount))
        .collect::<Vec<String>>()
        .join("\n");

    header + &lines
}

/// Wraps the rendered report as a `text/plain` attachment download.
pub fn shopping_list_reply(body: String) -> impl Reply {
    warp::reply::with_header(
        warp::reply::with_header(body, "Content-Type", "text/plain"),
        "Content-Disposition",
        format!("attachment; filename={FILE_SHOPPING_LIST}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i64) -> IngredientAmount {
        IngredientAmount {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn sums_amounts_per_group() {
        let rows = vec![
            row("Flour", "g", 300),
            row("Salt", "g", 10),
            row("Flour", "g", 200),
        ];

        let aggregated = aggregate_ingredients(rows);

        assert_eq!(aggregated, vec![row("Flour", "g", 500), row("Salt", "g", 10)]);
    }

    #[test]
    fn distinct_units_stay_separate() {
        let rows = vec![
            row("Milk", "ml", 200),
            row("Milk", "tbsp", 2),
            row("Milk", "ml", 100),
        ];

        let aggregated = aggregate_ingredients(rows);

        assert_eq!(
            aggregated,
            vec![row("Milk", "ml", 300), row("Milk", "tbsp", 2)]
        );
    }

    #[test]
    fn grouping_is_exact_match() {
        let rows = vec![row("Sugar", "g", 50), row("sugar", "g", 50)];

        assert_eq!(aggregate_ingredients(rows).len(), 2);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rows = vec![
            row("Flour", "g", 300),
            row("Salt", "g", 10),
            row("Flour", "g", 200),
        ];

        let once = aggregate_ingredients(rows);
        let twice = aggregate_ingredients(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate_ingredients(vec![]).is_empty());
    }

    #[test]
    fn output_row_count_matches_distinct_pairs() {
        use std::collections::BTreeSet;

        let rows = vec![
            row("A", "g", 1),
            row("A", "g", 2),
            row("A", "ml", 3),
            row("B", "g", 4),
            row("B", "g", 5),
        ];

        let distinct: BTreeSet<(String, String)> = rows
            .iter()
            .map(|r| (r.name.to_owned(), r.measurement_unit.to_owned()))
            .collect();
        let aggregated = aggregate_ingredients(rows);

        assert_eq!(aggregated.len(), distinct.len());
    }

    #[test]
    fn renders_report() {
        let items = vec![row("Flour", "g", 500), row("Salt", "g", 10)];

        assert_eq!(
            render_shopping_list("Jane Doe", &items),
            "Shopping list for: Jane Doe\n\n- Flour (g) - 500\n- Salt (g) - 10"
        );
    }

    #[test]
    fn renders_empty_report() {
        assert_eq!(
            render_shopping_list("Jane Doe", &[]),
            "Shopping list for: Jane Doe\n\n"
        );
    }

    #[test]
    fn reply_sets_download_headers() {
        let response = shopping_list_reply(String::from("Shopping list for: x\n\n"))
            .into_response();

        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/plain"
        );
        assert_eq!(
            response.headers().get("Content-Disposition").unwrap(),
            &format!("attachment; filename={FILE_SHOPPING_LIST}")
        );
    }
}
