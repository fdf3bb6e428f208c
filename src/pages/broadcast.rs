//! Broadcast Page
//!
//! Compose a broadcast to active groups, either auto-generated from table
//! groups or a custom text, and review recent sends.

use std::collections::BTreeSet;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::{use_api, HISTORY_LIMIT};
use crate::components::{alert, use_toaster};
use crate::error::ApiError;
use crate::format::{format_date, truncate};
use crate::models::{BroadcastHistory, BroadcastRequest, MessageType, TableGroup, WhatsAppGroup};
use crate::query::{report_read_error, use_query_client, Mutation, QueryKey};
use crate::routes::{use_router, Route};
use crate::session;

const PREVIEW_LEN: usize = 80;

/// Validate the form and build the request
fn build_request(
    groups: &BTreeSet<u32>,
    kind: MessageType,
    tables: &BTreeSet<u32>,
    message: &str,
) -> Result<BroadcastRequest, ApiError> {
    if groups.is_empty() {
        return Err(ApiError::Validation("Please select at least one group".into()));
    }
    let group_ids = groups.iter().copied().collect();
    match kind {
        MessageType::AutoGenerate => {
            if tables.is_empty() {
                return Err(ApiError::Validation("Please select at least one table".into()));
            }
            Ok(BroadcastRequest::auto_generate(group_ids, tables.iter().copied().collect()))
        }
        MessageType::Custom => {
            let message = message.trim();
            if message.is_empty() {
                return Err(ApiError::Validation("Please enter a message".into()));
            }
            Ok(BroadcastRequest::custom(group_ids, message.to_string()))
        }
    }
}

fn toggle(set: RwSignal<BTreeSet<u32>>, id: u32) {
    set.update(|s| {
        if !s.remove(&id) {
            s.insert(id);
        }
    });
}

#[component]
fn HistoryRow(entry: BroadcastHistory) -> impl IntoView {
    let when = entry.sent_at.as_deref().unwrap_or(&entry.scheduled_for).to_string();
    view! {
        <tr>
            <td>{entry.group_name}</td>
            <td>{entry.message_type.label()}</td>
            <td class="preview">{truncate(&entry.message_preview, PREVIEW_LEN)}</td>
            <td>{format_date(&when)}</td>
            <td>
                <span class=entry.status.badge_class() title=entry.error_message.unwrap_or_default()>
                    {entry.status.as_str()}
                </span>
            </td>
        </tr>
    }
}

#[component]
pub fn BroadcastPage() -> impl IntoView {
    let api = use_api();
    let query = use_query_client();
    let router = use_router();
    let toaster = use_toaster();

    let groups = RwSignal::new(Vec::<WhatsAppGroup>::new());
    let tables = RwSignal::new(Vec::<TableGroup>::new());
    let history = RwSignal::new(Vec::<BroadcastHistory>::new());
    let load_error = RwSignal::new(None::<String>);

    let selected_groups = RwSignal::new(BTreeSet::<u32>::new());
    let selected_tables = RwSignal::new(BTreeSet::<u32>::new());
    let kind = RwSignal::new(MessageType::AutoGenerate);
    let (message, set_message) = signal(String::new());
    let sending = RwSignal::new(false);

    let fail = move |what: &str, e: ApiError| {
        if e.is_auth() {
            session::clear_session();
            router.navigate(Route::Login);
        } else {
            load_error.try_set(Some(report_read_error(what, &e)));
        }
    };

    let groups_api = api.clone();
    Effect::new(move |_| {
        let version = query.version(QueryKey::WhatsAppGroups);
        let api = groups_api.clone();
        spawn_local(async move {
            let result = query
                .fetch(QueryKey::WhatsAppGroups, || {
                    let api = api.clone();
                    async move { api.list_whatsapp_groups().await }
                })
                .await;
            if !query.is_current(QueryKey::WhatsAppGroups, version) {
                return;
            }
            match result {
                Ok(list) => {
                    groups.try_set(list);
                }
                Err(e) => fail("whatsapp groups", e),
            }
        });
    });

    let tables_api = api.clone();
    Effect::new(move |_| {
        let version = query.version(QueryKey::TableGroups);
        let api = tables_api.clone();
        spawn_local(async move {
            let result = query
                .fetch(QueryKey::TableGroups, || {
                    let api = api.clone();
                    async move { api.list_table_groups().await }
                })
                .await;
            if !query.is_current(QueryKey::TableGroups, version) {
                return;
            }
            match result {
                Ok(list) => {
                    tables.try_set(list);
                }
                Err(e) => fail("table groups", e),
            }
        });
    });

    let history_api = api.clone();
    Effect::new(move |_| {
        let version = query.version(QueryKey::BroadcastHistory);
        let api = history_api.clone();
        spawn_local(async move {
            let result = query
                .fetch(QueryKey::BroadcastHistory, || {
                    let api = api.clone();
                    async move { api.broadcast_history(HISTORY_LIMIT).await }
                })
                .await;
            if !query.is_current(QueryKey::BroadcastHistory, version) {
                return;
            }
            match result {
                Ok(page) => {
                    history.try_set(page.history);
                }
                Err(e) => fail("broadcast history", e),
            }
        });
    });

    let send = move |_| {
        let request = selected_groups.with_untracked(|g| {
            selected_tables.with_untracked(|t| build_request(g, kind.get_untracked(), t, &message.get_untracked()))
        });
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                alert(&e.to_string());
                return;
            }
        };
        let api = api.clone();
        sending.set(true);
        spawn_local(async move {
            let result = api.send_broadcast(&request).await;
            sending.try_set(false);
            match result {
                Ok(resp) => {
                    log::info!("[BROADCAST] {} ({} result(s))", resp.message, resp.results.len());
                    query.invalidate_after(Mutation::SendBroadcast);
                    selected_groups.try_set(BTreeSet::new());
                    set_message.try_set(String::new());
                    toaster.notify("Broadcast sent successfully!");
                }
                Err(e) if e.is_auth() => {
                    session::clear_session();
                    router.navigate(Route::Login);
                }
                Err(e) => alert(&e.to_string()),
            }
        });
    };

    view! {
        <div class="broadcast-page">
            <header class="page-header"><h2>"Broadcast"</h2></header>
            {move || load_error.get().map(|msg| view! { <p class="form-error">{msg}</p> })}

            <section class="broadcast-form">
                <h3>"Select Groups:"</h3>
                {move || {
                    let active: Vec<WhatsAppGroup> = groups.get().into_iter().filter(|g| g.is_active).collect();
                    if active.is_empty() {
                        return view! { <p class="empty-message">"No active WhatsApp groups. Add groups first."</p> }.into_any();
                    }
                    active.into_iter().map(|g| {
                        let id = g.id;
                        view! {
                            <label class="checkbox">
                                <input
                                    type="checkbox"
                                    prop:checked=move || selected_groups.with(|s| s.contains(&id))
                                    on:change=move |_| toggle(selected_groups, id)
                                />
                                {g.group_name}
                            </label>
                        }
                    }).collect_view().into_any()
                }}

                <h3>"Message"</h3>
                <div class="message-kind">
                    {[MessageType::AutoGenerate, MessageType::Custom].into_iter().map(|k| view! {
                        <label class="radio">
                            <input
                                type="radio"
                                name="message-kind"
                                prop:checked=move || kind.get() == k
                                on:change=move |_| kind.set(k)
                            />
                            {k.label()}
                        </label>
                    }).collect_view()}
                </div>

                {move || match kind.get() {
                    MessageType::AutoGenerate => view! {
                        <div class="table-picker">
                            {tables.get().into_iter().map(|t| {
                                let id = t.id;
                                view! {
                                    <label class="checkbox">
                                        <input
                                            type="checkbox"
                                            prop:checked=move || selected_tables.with(|s| s.contains(&id))
                                            on:change=move |_| toggle(selected_tables, id)
                                        />
                                        {t.table_name}
                                    </label>
                                }
                            }).collect_view()}
                        </div>
                    }.into_any(),
                    MessageType::Custom => view! {
                        <textarea
                            rows="6"
                            placeholder="Type your message..."
                            prop:value=move || message.get()
                            on:input=move |ev| set_message.set(event_target_value(&ev))
                        />
                    }.into_any(),
                }}

                <button class="primary" on:click=send disabled=move || sending.get()>
                    {move || if sending.get() { "Sending..." } else { "Send Broadcast" }}
                </button>
            </section>

            <section class="broadcast-history">
                <h3>"Recent Broadcasts"</h3>
                {move || {
                    let entries = history.get();
                    if entries.is_empty() {
                        return view! { <p class="empty-message">"No broadcasts yet."</p> }.into_any();
                    }
                    view! {
                        <table>
                            <thead>
                                <tr>
                                    <th>"Group"</th>
                                    <th>"Type"</th>
                                    <th>"Message"</th>
                                    <th>"When"</th>
                                    <th>"Status"</th>
                                </tr>
                            </thead>
                            <tbody>
                                {entries.into_iter().map(|entry| view! { <HistoryRow entry=entry /> }).collect_view()}
                            </tbody>
                        </table>
                    }.into_any()
                }}
            </section>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[u32]) -> BTreeSet<u32> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_groups_required() {
        let err = build_request(&ids(&[]), MessageType::Custom, &ids(&[]), "hello").unwrap_err();
        assert_eq!(err.to_string(), "Please select at least one group");
    }

    #[test]
    fn test_auto_generate_needs_tables() {
        assert!(build_request(&ids(&[1]), MessageType::AutoGenerate, &ids(&[]), "").is_err());
        let req = build_request(&ids(&[2, 1]), MessageType::AutoGenerate, &ids(&[7]), "").unwrap();
        assert_eq!(req.group_ids, vec![1, 2]);
        assert_eq!(req.table_group_ids, Some(vec![7]));
    }

    #[test]
    fn test_custom_message_trimmed() {
        assert!(build_request(&ids(&[1]), MessageType::Custom, &ids(&[]), "   ").is_err());
        let req = build_request(&ids(&[1]), MessageType::Custom, &ids(&[]), "  New rates  ").unwrap();
        assert_eq!(req.custom_message.as_deref(), Some("New rates"));
        assert_eq!(req.table_group_ids, None);
    }
}
