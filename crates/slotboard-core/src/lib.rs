pub mod agenda;
pub mod api;
pub mod availability;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod datetime;
pub mod feed;
pub mod model;
pub mod partition;
pub mod render;

use std::ffi::OsString;

use anyhow::Context;
use chrono::{
  NaiveDate,
  Utc
};
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::api::BookingApi;
use crate::controller::{
  CalendarController,
  SyncReport
};

#[tracing::instrument(skip_all)]
pub async fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting slotboard"
  );
  debug!(
    overrides = pre.rc_overrides.len(),
    "preprocessed rc overrides"
  );

  let mut cfg = config::Config::load(
    cli.slotboardrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let session = cfg
    .session()
    .context("no signed-in provider")?;
  let options = cfg.dashboard_options()?;
  let zone = cfg.display_zone();
  let api = api::HttpBookingApi::new(
    &cfg.api_base_url(),
    cfg.api_timeout()?,
    session.clone()
  )?;
  let renderer =
    render::Renderer::new(&cfg);

  let now = Utc::now();
  let today = zone.today(now);
  let mut controller =
    CalendarController::new(
      session, zone, now
    );

  let report = apply_navigation(
    &mut controller,
    &api,
    cli.month,
    cli.day,
    today
  )
  .await;

  if !report.is_clean() {
    warn!(
      failures = report.failures.len(),
      "some dashboard data could not be \
       refreshed"
    );
  }

  let view =
    dashboard::DashboardView::derive(
      &controller,
      Utc::now(),
      &options
    );
  renderer.print_dashboard(&view)?;

  info!("done");
  Ok(())
}

/// Performs the mount refreshes, then
/// moves the calendar to `month` and
/// selects `day`. Requests before the
/// current month are refused with a
/// warning. The returned report covers
/// every sync performed.
#[tracing::instrument(skip(
  controller, api
))]
pub async fn apply_navigation<A>(
  controller: &mut CalendarController,
  api: &A,
  month: Option<NaiveDate>,
  day: Option<NaiveDate>,
  today: NaiveDate
) -> SyncReport
where
  A: BookingApi + ?Sized
{
  let earliest =
    calendar::earliest_month(today);

  if let Some(month) = month {
    if month < earliest {
      warn!(
        month = %month,
        "months before the current one are not shown"
      );
    } else {
      controller.change_month(month);
    }
  }

  let mut report =
    controller.sync(api).await;

  let Some(day) = day else {
    return report;
  };

  if day < earliest {
    warn!(
      day = %day,
      "days before the current month are not shown"
    );
    return report;
  }

  if !datetime::same_month(
    controller.selection().viewed_month,
    day
  ) {
    controller.change_month(day);
    report.merge(
      controller.sync(api).await
    );
  }

  if controller
    .pick_day_on_calendar(day, today)
  {
    report.merge(
      controller.sync(api).await
    );
  } else {
    warn!(
      day = %day,
      "day cannot be selected; keeping \
       current selection"
    );
  }

  report
}
