use std::collections::BTreeSet;

use chrono::NaiveDate;
use maud::{html, Markup, DOCTYPE};

use crate::calendar::{Navigation, Week, WEEKDAY_HEADER};
use crate::db::Entry;
use crate::form::{messages_for, EntryForm, FieldError};
use crate::months::Month;

const CSS: &str = "
body { font-family: sans-serif; margin: 2em auto; max-width: 48em; }
nav a { margin-right: 1em; }
table.calendar td { width: 2.5em; text-align: right; }
td.busy a { font-weight: bold; }
span.error { color: #b00; margin-left: 0.5em; }
";

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (title) }
                style { (CSS) }
            }
            body {
                h1 { (title) }
                (body)
            }
        }
    }
}

fn pager(nav: &Navigation, suffix: &str) -> Markup {
    html! {
        nav {
            a.prev href={ "/tracker/" (nav.prev) (suffix) } { "< " (nav.prev) }
            a.next href={ "/tracker/" (nav.next) (suffix) } { (nav.next) " >" }
        }
    }
}

pub fn index_page(today: NaiveDate) -> Markup {
    let year = today.format("%Y").to_string();
    let month = today.format("%Y/%b").to_string();
    let day = today.format("%Y/%b/%d").to_string();

    layout(
        "Tracker",
        html! {
            ul {
                li { a href={ "/tracker/" (year) "/" } { "This year" } }
                li { a href={ "/tracker/" (month) "/" } { "This month" } }
                li { a href={ "/tracker/" (day) } { "Today" } }
            }
        },
    )
}

pub fn year_page(year: i32, nav: &Navigation, months: &[Month]) -> Markup {
    layout(
        &year.to_string(),
        html! {
            (pager(nav, "/"))
            ul.months {
                @for month in months {
                    li { a href={ "/tracker/" (year) "/" (month.abbrev) "/" } { (month.name) } }
                }
            }
        },
    )
}

pub fn month_page(
    year: i32,
    month: Month,
    weeks: &[Week],
    busy_days: &BTreeSet<u32>,
    nav: &Navigation,
) -> Markup {
    layout(
        &format!("{} {}", month.name, year),
        html! {
            (pager(nav, "/"))
            p { a href={ "/tracker/" (year) "/" } { "Back to " (year) } }
            table.calendar {
                thead {
                    tr {
                        @for name in WEEKDAY_HEADER.iter() {
                            th { (name) }
                        }
                    }
                }
                tbody {
                    @for week in weeks {
                        tr {
                            @for day in week.iter() {
                                @if *day == 0 {
                                    td {}
                                } @else {
                                    td.busy[busy_days.contains(day)] {
                                        a href={ "/tracker/" (year) "/" (month.abbrev) "/" (day) } { (day) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub struct DayPage<'a> {
    pub date: NaiveDate,
    pub month: Month,
    pub entries: &'a [Entry],
    pub nav: &'a Navigation,
    pub form: &'a EntryForm,
    pub errors: &'a [FieldError],
}

fn field_errors(errors: &[FieldError], field: &str) -> Markup {
    html! {
        @for message in messages_for(errors, field) {
            span.error { (message) }
        }
    }
}

pub fn day_page(page: &DayPage) -> Markup {
    let title = format!("{} {}", page.month.name, page.date.format("%-d, %Y"));
    let year = page.date.format("%Y").to_string();

    layout(
        &title,
        html! {
            (pager(page.nav, ""))
            p { a href={ "/tracker/" (year) "/" (page.month.abbrev) "/" } { "Back to " (page.month.name) } }
            @if page.entries.is_empty() {
                p.empty { "No entries yet." }
            } @else {
                table.entries {
                    thead {
                        tr { th { "Start" } th { "Stop" } th { "Task" } th {} }
                    }
                    tbody {
                        @for entry in page.entries {
                            tr {
                                td { (entry.start) }
                                td { (entry.stop) }
                                td { (entry.task) }
                                td {
                                    form method="post" {
                                        button type="submit" name="delete" value=(entry.id) { "Delete" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
            form.add method="post" {
                label { "Start Time " input type="text" name="start" value=(page.form.start); }
                (field_errors(page.errors, "start"))
                label { "Stop Time " input type="text" name="stop" value=(page.form.stop); }
                (field_errors(page.errors, "stop"))
                label { "Task " input type="text" name="task" value=(page.form.task); }
                (field_errors(page.errors, "task"))
                input type="submit" name="add" value="Add";
            }
        },
    )
}

pub fn not_found_page() -> Markup {
    layout(
        "Not Found",
        html! {
            p { "Nothing lives here. " a href="/tracker/" { "Back to the tracker" } }
        },
    )
}

pub fn bad_request_page(reason: &str) -> Markup {
    layout("Bad Request", html! { p { (reason) } })
}

pub fn server_error_page() -> Markup {
    layout(
        "Something went wrong",
        html! { p { "The tracker could not reach its database. Try again shortly." } },
    )
}
