use std::collections::HashMap;
use std::convert::Infallible;

use chrono::{Local, NaiveDate};
use maud::Markup;
use tracing::{debug, error, info};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::calendar::{self, Navigation};
use crate::db;
use crate::form::{EntryForm, FieldError};
use crate::months::Month;
use crate::views::{self, DayPage};
use crate::AppContext;

type Fields = HashMap<String, String>;

fn form_body() -> impl Filter<Extract = (Fields,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(1024 * 16).and(warp::body::form())
}

fn with_context(ctx: AppContext) -> impl Filter<Extract = (AppContext,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

/// Every route of the tracker, with unmatched requests turned into pages.
pub fn routes(ctx: AppContext) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    landing()
        .or(tracker_index())
        .or(year_view(ctx.clone()))
        .or(month_view(ctx.clone()))
        .or(day_view(ctx.clone()))
        .or(post_day(ctx.clone()))
        .or(get_entries_for_date(ctx.clone()))
        .or(get_entry(ctx))
        .recover(handle_rejection)
        .with(warp::trace::request())
}

// Filters
pub fn landing() -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path::end().and(warp::get()).map(|| "")
}

pub fn tracker_index() -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path!("tracker")
        .and(warp::get())
        .map(|| warp::reply::html(views::index_page(Local::now().date_naive()).into_string()))
}

pub fn year_view(ctx: AppContext) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path!("tracker" / u32)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(year_handler)
}

pub fn month_view(ctx: AppContext) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path!("tracker" / u32 / String)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(month_handler)
}

pub fn day_view(ctx: AppContext) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path!("tracker" / u32 / String / u32)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(day_handler)
}

pub fn post_day(ctx: AppContext) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path!("tracker" / u32 / String / u32)
        .and(warp::post())
        .and(form_body())
        .and(with_context(ctx))
        .and_then(post_day_handler)
}

pub fn get_entries_for_date(
    ctx: AppContext,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "entries" / String)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(entries_json_handler)
}

pub fn get_entry(ctx: AppContext) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "entry" / i64)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(entry_json_handler)
}

// Handlers
fn page(markup: Markup, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::html(markup.into_string()), status).into_response()
}

fn not_found() -> Response {
    page(views::not_found_page(), StatusCode::NOT_FOUND)
}

fn bad_request(reason: &str) -> Response {
    page(views::bad_request_page(reason), StatusCode::BAD_REQUEST)
}

fn server_error(err: anyhow::Error) -> Response {
    error!(error = ?err, "Database request failed");
    page(views::server_error_page(), StatusCode::INTERNAL_SERVER_ERROR)
}

fn year_from_path(year: u32) -> Option<i32> {
    i32::try_from(year).ok().filter(|y| *y > 0)
}

/// Resolve the `year/month/day` path segments of a day page.
fn resolve_day(
    ctx: &AppContext,
    year: u32,
    month: &str,
    day: u32,
) -> Option<(Month, NaiveDate, Navigation)> {
    let month = ctx.resolve_month(month)?;
    let date = NaiveDate::from_ymd_opt(year_from_path(year)?, month.number, day)?;
    let nav = calendar::day_navigation(date)?;
    Some((month, date, nav))
}

#[tracing::instrument(name = "Year view", skip(ctx))]
async fn year_handler(year: u32, ctx: AppContext) -> Result<Response, Infallible> {
    let page_data = year_from_path(year).and_then(|y| Some((y, calendar::year_navigation(y)?)));
    match page_data {
        Some((year, nav)) => Ok(page(
            views::year_page(year, &nav, ctx.months),
            StatusCode::OK,
        )),
        None => Ok(not_found()),
    }
}

#[tracing::instrument(name = "Month view", skip(ctx))]
async fn month_handler(year: u32, month: String, ctx: AppContext) -> Result<Response, Infallible> {
    let month = match ctx.resolve_month(&month) {
        Some(month) => month,
        None => {
            debug!("Unknown month token");
            return Ok(not_found());
        }
    };
    let year = match year_from_path(year) {
        Some(year) => year,
        None => return Ok(not_found()),
    };
    let (weeks, nav) = match (
        calendar::month_grid(year, month.number),
        calendar::month_navigation(year, month.number),
    ) {
        (Some(weeks), Some(nav)) => (weeks, nav),
        _ => return Ok(not_found()),
    };

    match db::dates_with_entries(&ctx.pool, year, month.number).await {
        Ok(busy_days) => Ok(page(
            views::month_page(year, month, &weeks, &busy_days, &nav),
            StatusCode::OK,
        )),
        Err(e) => Ok(server_error(e)),
    }
}

#[tracing::instrument(name = "Day view", skip(ctx))]
async fn day_handler(year: u32, month: String, day: u32, ctx: AppContext) -> Result<Response, Infallible> {
    match resolve_day(&ctx, year, &month, day) {
        Some((month, date, nav)) => {
            Ok(render_day(&ctx, month, date, &nav, &EntryForm::default(), &[]).await)
        }
        None => Ok(not_found()),
    }
}

#[tracing::instrument(name = "Day form submission", skip(fields, ctx))]
async fn post_day_handler(
    year: u32,
    month: String,
    day: u32,
    fields: Fields,
    ctx: AppContext,
) -> Result<Response, Infallible> {
    let (month, date, nav) = match resolve_day(&ctx, year, &month, day) {
        Some(resolved) => resolved,
        None => return Ok(not_found()),
    };

    let mut form = EntryForm::default();
    let mut errors = Vec::new();

    if fields.contains_key("add") {
        let submitted = EntryForm {
            start: fields.get("start").cloned().unwrap_or_default(),
            stop: fields.get("stop").cloned().unwrap_or_default(),
            task: fields.get("task").cloned().unwrap_or_default(),
        };
        match submitted.validate() {
            Ok(valid) => {
                let new_entry = db::NewEntry {
                    date,
                    start: valid.start,
                    stop: valid.stop,
                    task: valid.task,
                };
                match db::write_entry(&ctx.pool, &new_entry).await {
                    Ok(entry) => info!(id = entry.id, date = %entry.date, "Entry added"),
                    Err(e) => return Ok(server_error(e)),
                }
            }
            Err(field_errors) => {
                debug!(errors = field_errors.len(), "Rejected entry submission");
                form = submitted;
                errors = field_errors;
            }
        }
    } else if let Some(id) = fields.get("delete") {
        let id: i64 = match id.trim().parse() {
            Ok(id) => id,
            Err(_) => return Ok(bad_request("The entry to delete must be given by its numeric id.")),
        };
        match db::delete_entry(&ctx.pool, id).await {
            Ok(removed) => info!(id, removed, "Entry deleted"),
            Err(e) => return Ok(server_error(e)),
        }
    } else {
        return Ok(bad_request("Submit the form with either an add or a delete action."));
    }

    Ok(render_day(&ctx, month, date, &nav, &form, &errors).await)
}

async fn render_day(
    ctx: &AppContext,
    month: Month,
    date: NaiveDate,
    nav: &Navigation,
    form: &EntryForm,
    errors: &[FieldError],
) -> Response {
    match db::read_entries_for_date(&ctx.pool, date).await {
        Ok(entries) => page(
            views::day_page(&DayPage {
                date,
                month,
                entries: &entries,
                nav,
                form,
                errors,
            }),
            StatusCode::OK,
        ),
        Err(e) => server_error(e),
    }
}

#[tracing::instrument(name = "Entries for date", skip(ctx))]
async fn entries_json_handler(date: String, ctx: AppContext) -> Result<Response, Infallible> {
    let date = match NaiveDate::parse_from_str(&date, db::DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => {
            return Ok(
                warp::reply::with_status("Invalid date", StatusCode::BAD_REQUEST).into_response(),
            )
        }
    };

    match db::read_entries_for_date(&ctx.pool, date).await {
        Ok(entries) => Ok(warp::reply::json(&entries).into_response()),
        Err(e) => Ok(server_error(e)),
    }
}

#[tracing::instrument(name = "Entry by id", skip(ctx))]
async fn entry_json_handler(id: i64, ctx: AppContext) -> Result<Response, Infallible> {
    match db::read_entry(&ctx.pool, id).await {
        Ok(Some(entry)) => Ok(warp::reply::json(&entry).into_response()),
        Ok(None) => Ok(warp::reply::with_status("Invalid id", StatusCode::NOT_FOUND).into_response()),
        Err(e) => Ok(server_error(e)),
    }
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        Ok(bad_request("The form could not be read."))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        Ok(page(
            views::bad_request_page("The form is too large."),
            StatusCode::PAYLOAD_TOO_LARGE,
        ))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        Ok(page(
            views::bad_request_page("Method not allowed."),
            StatusCode::METHOD_NOT_ALLOWED,
        ))
    } else if err.is_not_found() {
        Ok(not_found())
    } else {
        debug!(rejection = ?err, "Unhandled rejection");
        Ok(bad_request("The request could not be handled."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{new_entry, setup_test_db};
    use anyhow::Result;

    async fn setup() -> Result<AppContext> {
        Ok(AppContext::new(setup_test_db().await?))
    }

    fn body(res: &warp::http::Response<warp::hyper::body::Bytes>) -> String {
        String::from_utf8_lossy(res.body()).to_string()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn post_form(ctx: &AppContext, path: &str, form: &str) -> warp::http::Response<warp::hyper::body::Bytes> {
        warp::test::request()
            .method("POST")
            .path(path)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(form)
            .reply(&routes(ctx.clone()))
            .await
    }

    #[tokio::test]
    async fn test_landing_is_empty() -> Result<()> {
        let ctx = setup().await?;

        let res = warp::test::request().path("/").reply(&routes(ctx)).await;

        assert_eq!(res.status(), 200);
        assert!(res.body().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_tracker_index() -> Result<()> {
        let ctx = setup().await?;

        let res = warp::test::request().path("/tracker/").reply(&routes(ctx)).await;

        assert_eq!(res.status(), 200);
        assert!(body(&res).contains("Today"));

        Ok(())
    }

    #[tokio::test]
    async fn test_year_view() -> Result<()> {
        let ctx = setup().await?;

        let res = warp::test::request().path("/tracker/2024/").reply(&routes(ctx)).await;
        let html = body(&res);

        assert_eq!(res.status(), 200);
        assert!(html.contains("href=\"/tracker/2023/\""));
        assert!(html.contains("href=\"/tracker/2025/\""));
        assert!(html.contains("href=\"/tracker/2024/Jan/\""));
        assert!(html.contains("December"));

        Ok(())
    }

    #[tokio::test]
    async fn test_month_view() -> Result<()> {
        let ctx = setup().await?;
        db::write_entry(&ctx.pool, &new_entry(day(2024, 2, 14), "09:00", "10:00")).await?;

        let res = warp::test::request().path("/tracker/2024/feb/").reply(&routes(ctx)).await;
        let html = body(&res);

        assert_eq!(res.status(), 200);
        assert!(html.contains("February 2024"));
        assert!(html.contains("href=\"/tracker/2024/Feb/29\""));
        assert!(!html.contains("href=\"/tracker/2024/Feb/30\""));
        assert!(html.contains("href=\"/tracker/2024/Jan/\""));
        assert!(html.contains("href=\"/tracker/2024/Mar/\""));
        assert!(html.contains("class=\"busy\""));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_month_is_not_found() -> Result<()> {
        let ctx = setup().await?;

        for path in &["/tracker/2024/13/", "/tracker/2024/Foo/", "/tracker/2024/Foo/3"] {
            let res = warp::test::request().path(path).reply(&routes(ctx.clone())).await;
            assert_eq!(res.status(), 404, "path {}", path);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_impossible_day_is_not_found() -> Result<()> {
        let ctx = setup().await?;

        let res = warp::test::request().path("/tracker/2023/Feb/29").reply(&routes(ctx)).await;

        assert_eq!(res.status(), 404);

        Ok(())
    }

    #[tokio::test]
    async fn test_day_view_navigation() -> Result<()> {
        let ctx = setup().await?;

        let res = warp::test::request().path("/tracker/2024/Feb/29").reply(&routes(ctx)).await;
        let html = body(&res);

        assert_eq!(res.status(), 200);
        assert!(html.contains("href=\"/tracker/2024/Feb/28\""));
        assert!(html.contains("href=\"/tracker/2024/Mar/01\""));
        assert!(html.contains("No entries yet."));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_entry() -> Result<()> {
        let ctx = setup().await?;

        let res = post_form(&ctx, "/tracker/2024/3/5", "add=Add&start=1%3A00pm&stop=2%3A00pm&task=review").await;
        assert_eq!(res.status(), 200);

        let res = post_form(
            &ctx,
            "/tracker/2024/Mar/5",
            "add=Add&start=9%3A00am&stop=10%3A30am&task=write+spec",
        )
        .await;
        assert_eq!(res.status(), 200);
        assert!(body(&res).contains("write spec"));

        let entries = db::read_entries_for_date(&ctx.pool, day(2024, 3, 5)).await?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].start, "09:00");
        assert_eq!(entries[0].stop, "10:30");
        assert_eq!(entries[0].task, "write spec");
        assert_eq!(entries[0].date, "2024-03-05");
        assert_eq!(entries[1].start, "13:00");

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_entry_is_not_saved() -> Result<()> {
        let ctx = setup().await?;

        let res = post_form(&ctx, "/tracker/2024/Mar/5", "add=Add&start=24%3A00&stop=10%3A00&task=").await;
        let html = body(&res);

        assert_eq!(res.status(), 200);
        assert!(html.contains("This field is required."));
        assert!(html.contains("value=\"24:00\""));
        assert!(db::read_entries_for_date(&ctx.pool, day(2024, 3, 5)).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_entry() -> Result<()> {
        let ctx = setup().await?;
        let entry = db::write_entry(&ctx.pool, &new_entry(day(2024, 3, 5), "09:00", "10:00")).await?;
        let form = format!("delete={}", entry.id);

        let res = post_form(&ctx, "/tracker/2024/Mar/5", &form).await;
        assert_eq!(res.status(), 200);
        assert!(db::read_entries_for_date(&ctx.pool, day(2024, 3, 5)).await?.is_empty());

        // Deleting again is a no-op.
        let res = post_form(&ctx, "/tracker/2024/Mar/5", &form).await;
        assert_eq!(res.status(), 200);

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_submissions() -> Result<()> {
        let ctx = setup().await?;

        let res = post_form(&ctx, "/tracker/2024/Mar/5", "start=09%3A00").await;
        assert_eq!(res.status(), 400);

        let res = post_form(&ctx, "/tracker/2024/Mar/5", "delete=abc").await;
        assert_eq!(res.status(), 400);

        Ok(())
    }

    #[tokio::test]
    async fn test_entries_json() -> Result<()> {
        let ctx = setup().await?;
        let late = db::write_entry(&ctx.pool, &new_entry(day(2024, 3, 5), "11:00", "12:00")).await?;
        let early = db::write_entry(&ctx.pool, &new_entry(day(2024, 3, 5), "08:00", "09:00")).await?;

        let res = warp::test::request()
            .path("/api/entries/2024-03-05")
            .reply(&routes(ctx.clone()))
            .await;

        assert_eq!(res.status(), 200);
        assert_eq!(body(&res), serde_json::to_string(&vec![early, late.clone()])?);

        let res = warp::test::request()
            .path(&format!("/api/entry/{}", late.id))
            .reply(&routes(ctx.clone()))
            .await;
        assert_eq!(body(&res), serde_json::to_string(&late)?);

        let res = warp::test::request().path("/api/entry/999").reply(&routes(ctx.clone())).await;
        assert_eq!(res.status(), 404);

        let res = warp::test::request().path("/api/entries/March").reply(&routes(ctx)).await;
        assert_eq!(res.status(), 400);

        Ok(())
    }

    #[tokio::test]
    async fn test_unmatched_routes() -> Result<()> {
        let ctx = setup().await?;

        let res = warp::test::request().path("/nowhere").reply(&routes(ctx.clone())).await;
        assert_eq!(res.status(), 404);

        let res = warp::test::request()
            .method("POST")
            .path("/tracker/2024/")
            .reply(&routes(ctx))
            .await;
        assert_eq!(res.status(), 405);

        Ok(())
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() -> Result<()> {
        let ctx = setup().await?;
        ctx.pool.close().await;

        let res = warp::test::request().path("/tracker/2024/Mar/5").reply(&routes(ctx.clone())).await;
        assert_eq!(res.status(), 500);
        assert!(body(&res).contains("could not reach its database"));

        let res = post_form(
            &ctx,
            "/tracker/2024/Mar/5",
            "add=Add&start=9%3A00am&stop=10%3A30am&task=write+spec",
        )
        .await;
        assert_eq!(res.status(), 500);

        let res = post_form(&ctx, "/tracker/2024/Mar/5", "delete=1").await;
        assert_eq!(res.status(), 500);

        let res = warp::test::request().path("/tracker/2024/Mar/").reply(&routes(ctx.clone())).await;
        assert_eq!(res.status(), 500);

        let res = warp::test::request()
            .path("/api/entries/2024-03-05")
            .reply(&routes(ctx.clone()))
            .await;
        assert_eq!(res.status(), 500);

        let res = warp::test::request().path("/api/entry/1").reply(&routes(ctx)).await;
        assert_eq!(res.status(), 500);

        Ok(())
    }
}
