//! Card components for displaying next-month spending forecasts.
//!
//! Each card shows a category's predicted spend for the coming month, cycling
//! through the same palette as the spending chart.

use maud::{Markup, html};

use crate::{
    dashboard::{charts::CATEGORY_COLORS, forecast::CategoryPrediction},
    html::format_currency,
};

/// Renders the forecast cards section.
///
/// Categories whose forecast is zero are left out. When no category has a
/// positive forecast the section is omitted entirely.
///
/// # Arguments
/// * `predictions` - The per-category forecasts to display
/// * `next_month` - The label of the month being forecast, e.g. "2025-07"
///
/// # Returns
/// Maud markup containing the forecast cards section, or empty markup.
pub(super) fn prediction_cards_view(
    predictions: &[CategoryPrediction],
    next_month: &str,
) -> Markup {
    let visible: Vec<&CategoryPrediction> = predictions
        .iter()
        .filter(|prediction| prediction.predicted > 0.0)
        .collect();

    if visible.is_empty() {
        return html! {};
    }

    let total: f64 = visible.iter().map(|prediction| prediction.predicted).sum();

    html! {
        section class="w-full mx-auto mt-8 mb-8" {
            h3 class="text-xl font-semibold mb-2" {
                "Predicted next month"
            }
            p class="text-sm text-gray-600 dark:text-gray-400 mb-4" {
                "Based on your recent spending, here's what we expect for "
                b { (next_month) }
                "."
            }

            div class="grid grid-cols-1 sm:grid-cols-2 md:grid-cols-3 lg:grid-cols-4 gap-4" {
                @for (index, prediction) in visible.iter().enumerate() {
                    (prediction_card(
                        prediction,
                        next_month,
                        CATEGORY_COLORS[index % CATEGORY_COLORS.len()],
                    ))
                }
            }

            p class="mt-4 text-sm" {
                "Total predicted spending: "
                b { (format_currency(total)) }
            }
        }
    }
}

/// Renders a single forecast card for a category.
fn prediction_card(prediction: &CategoryPrediction, next_month: &str, color: &str) -> Markup {
    html! {
        div
            class="bg-white dark:bg-gray-800 border-2 rounded-lg p-4 shadow-md
                   hover:shadow-lg transition-shadow flex flex-col"
            style=(format!("border-color: {color}"))
        {
            h4 class="text-lg font-semibold mb-2 truncate"
               title=(prediction.category)
               style=(format!("color: {color}"))
            {
                (prediction.category)
            }

            div class="mb-1" {
                "Predicted: "
                b { (format_currency(prediction.predicted)) }
            }

            div class="text-sm text-gray-600 dark:text-gray-400" {
                "Month: " (next_month)
            }
        }
    }
}
