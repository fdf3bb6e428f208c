//! Public rate table for one table group

use leptos::prelude::*;

use crate::format::format_currency;
use crate::models::TableGroupWithItems;

#[component]
pub fn RateTable(table: TableGroupWithItems) -> impl IntoView {
    let empty = table.items.is_empty();

    view! {
        <section class="rate-table">
            <h2>{table.table_name}</h2>
            <table>
                <thead>
                    <tr>
                        <th>"S.No"</th>
                        <th>"Count"</th>
                        <th>"Quality"</th>
                        <th>"Rate"</th>
                    </tr>
                </thead>
                <tbody>
                    {empty.then(|| view! {
                        <tr><td colspan="4" class="empty-message">"No items available"</td></tr>
                    })}
                    {table.items.into_iter().map(|item| view! {
                        <tr>
                            <td>{item.serial_number}</td>
                            <td class="count">{item.count}</td>
                            <td>{item.quality}</td>
                            <td class="rate">{format_currency(item.rate)}</td>
                        </tr>
                    }).collect_view()}
                </tbody>
            </table>
        </section>
    }
}
