//! Table view for the dashboard's recent transactions list.

use maud::{Markup, html};

use crate::{
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        format_currency,
    },
    transaction::Transaction,
};

/// Renders the recent transactions table with a delete action per row.
pub(super) fn recent_transactions_table(transactions: &[Transaction]) -> Markup {
    html!(
        section class="w-full mx-auto mt-8 mb-8"
        {
            h3 class="text-xl font-semibold mb-4" { "Recent transactions" }

            div class="overflow-x-auto dark:bg-gray-800 rounded-lg shadow"
            {
                table class="w-full text-sm text-left rtl:text-right
                    text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Action" }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            (table_row(transaction))
                        }
                    }
                }
            }
        }
    )
}

/// Renders a single transaction row with its delete button.
fn table_row(transaction: &Transaction) -> Markup {
    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                (transaction.date)
            }

            td class=(TABLE_CELL_STYLE)
            {
                (transaction.category)
            }

            td class=(TABLE_CELL_STYLE)
            {
                (format_currency(transaction.amount))
            }

            td class=(TABLE_CELL_STYLE)
            {
                (transaction.description.as_deref().unwrap_or(""))
            }

            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                    hx-confirm={
                        "Are you sure you want to delete this "
                        (transaction.category) " transaction?"
                    }
                    hx-target="closest tr"
                    hx-target-error="#alert-container"
                    hx-swap="delete"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    )
}
