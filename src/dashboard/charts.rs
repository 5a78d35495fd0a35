//! Chart generation and rendering for the dashboard.
//!
//! Builds the ECharts configuration for the monthly spending chart (one line
//! per category, plus detached markers for next-month forecasts) and renders
//! the HTML containers and JavaScript initialization code around it.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, ItemStyle, JsFunction, LineStyle,
        LineStyleType, Symbol, Tooltip, Trigger,
    },
    series::Line,
};
use maud::{Markup, PreEscaped, html};

use crate::{dashboard::forecast::CategoryPrediction, html::HeadElement};

/// Palette for category series. Colors are assigned by the category's
/// position in the spending table and repeat once the palette runs out.
pub(super) const CATEGORY_COLORS: [&str; 10] = [
    "#2E86AB", "#F6C85F", "#6AB187", "#F37C7C", "#8D6CAB", "#FF9F1C", "#A2D2FF", "#FFB5E8",
    "#7D5A50", "#00A6A6",
];

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
///
/// # Arguments
/// * `charts` - The charts to render containers for
///
/// # Returns
/// Maud markup containing a grid of chart container divs.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[420px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
///
/// # Arguments
/// * `charts` - The charts to generate initialization scripts for
///
/// # Returns
/// HeadElement containing the initialization JavaScript, deferred until the
/// document has loaded.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        chart_init_statements(charts)
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Generates an inline script tag that initializes dashboard charts.
///
/// Used when re-rendering the dashboard through htmx: swapped-in script tags
/// are executed immediately, and the chart containers already exist by then,
/// so the `DOMContentLoaded` wrapper of [charts_script] must be skipped.
pub(super) fn charts_inline_script(charts: &[DashboardChart]) -> Markup {
    html!(
        script {
            (PreEscaped(chart_init_statements(charts)))
        }
    )
}

fn chart_init_statements(charts: &[DashboardChart]) -> String {
    charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn spending_chart(
    month_labels: &[String],
    next_month: &str,
    spending: &[(String, Vec<f64>)],
    predictions: &[CategoryPrediction],
    show_forecast: bool,
) -> Chart {
    let mut labels = month_labels.to_vec();
    if !predictions.is_empty() {
        labels.push(next_month.to_owned());
    }

    let title = if show_forecast {
        "Monthly spending by category (history + predicted next month)"
    } else {
        "Monthly spending by category (history)"
    };

    let mut chart = Chart::new()
        .title(Title::new().text(title))
        .tooltip(currency_tooltip())
        .legend(Legend::new().bottom(0))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom(60)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        );

    for (index, (category, values)) in spending.iter().enumerate() {
        let color = CATEGORY_COLORS[index % CATEGORY_COLORS.len()];
        let mut data = values.clone();
        if !predictions.is_empty() {
            // NaN serializes to null, which ECharts renders as a gap.
            data.push(f64::NAN);
        }

        chart = chart.series(
            Line::new()
                .name(category.as_str())
                .smooth(0.25)
                .item_style(ItemStyle::new().color(color))
                .line_style(LineStyle::new().color(color))
                .data(data),
        );
    }

    for prediction in predictions {
        let index = spending
            .iter()
            .position(|(category, _)| *category == prediction.category)
            .unwrap_or(0);
        let color = CATEGORY_COLORS[index % CATEGORY_COLORS.len()];
        let mut data = vec![f64::NAN; month_labels.len()];
        data.push(prediction.predicted);

        chart = chart.series(
            Line::new()
                .name(format!("{} (predicted)", prediction.category))
                .symbol(Symbol::Circle)
                .symbol_size(14)
                .item_style(
                    ItemStyle::new()
                        .color("#ffffff")
                        .border_color(color)
                        .border_width(2),
                )
                .line_style(LineStyle::new().color(color).type_(LineStyleType::Dashed))
                .data(data),
        );
    }

    chart
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-IN', {
              style: 'currency',
              currency: 'INR'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
