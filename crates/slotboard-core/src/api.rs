use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use slotboard_shared::{
  AppointmentDto,
  DayAgendaArgs,
  DayAvailabilityDto,
  MonthAvailabilityArgs
};
use tracing::{
  debug,
  instrument,
  warn
};

use crate::model::{
  Appointment,
  DayAvailability,
  Session
};

const ERROR_BODY_PREVIEW_CHARS: usize =
  200;

/// A failed remote read. Always
/// recoverable: stores keep their
/// previous contents.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  thiserror::Error,
)]
pub enum FetchError {
  #[error(
    "request to {endpoint} failed: \
     {message}"
  )]
  Transport {
    endpoint: String,
    message:  String
  },
  #[error(
    "{endpoint} answered HTTP \
     {status}: {body}"
  )]
  Status {
    endpoint: String,
    status:   u16,
    body:     String
  },
  #[error(
    "failed decoding {endpoint} \
     response: {message}"
  )]
  Decode {
    endpoint: String,
    message:  String
  }
}

/// The two read-only remote operations
/// the dashboard consumes.
#[async_trait]
pub trait BookingApi: Send + Sync {
  async fn month_availability(
    &self,
    args: MonthAvailabilityArgs
  ) -> Result<Vec<DayAvailability>, FetchError>;

  async fn day_agenda(
    &self,
    args: DayAgendaArgs
  ) -> Result<Vec<Appointment>, FetchError>;
}

pub struct HttpBookingApi {
  client:   reqwest::Client,
  base_url: Url,
  session:  Session
}

impl HttpBookingApi {
  pub fn new(
    base_url: &str,
    timeout: Duration,
    session: Session
  ) -> anyhow::Result<Self> {
    let base_url = Url::parse(
      base_url.trim()
    )
    .with_context(|| {
      format!(
        "invalid api.base_url: \
         {base_url}"
      )
    })?;
    if base_url.cannot_be_a_base() {
      anyhow::bail!(
        "api.base_url cannot carry a \
         path: {base_url}"
      );
    }

    let client =
      reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context(
          "failed building HTTP client \
           for booking api"
        )?;

    Ok(Self {
      client,
      base_url,
      session
    })
  }

  pub fn month_availability_url(
    &self,
    args: MonthAvailabilityArgs
  ) -> Url {
    self.endpoint_url(
      &[
        "providers",
        self.session.user.id.as_str(),
        "month-availability"
      ],
      &[
        ("year", args.year.to_string()),
        ("month", args.month.to_string())
      ]
    )
  }

  pub fn day_agenda_url(
    &self,
    args: DayAgendaArgs
  ) -> Url {
    self.endpoint_url(
      &["appointments", "me"],
      &[
        ("day", args.day.to_string()),
        ("month", args.month.to_string()),
        ("year", args.year.to_string())
      ]
    )
  }

  fn endpoint_url(
    &self,
    segments: &[&str],
    params: &[(&str, String)]
  ) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) =
      url.path_segments_mut()
    {
      path
        .pop_if_empty()
        .extend(segments);
    }
    {
      let mut query =
        url.query_pairs_mut();
      for (key, value) in params {
        query.append_pair(key, value);
      }
    }
    url
  }

  #[instrument(skip(self), fields(endpoint = %url.path()))]
  async fn get_json<T>(
    &self,
    url: Url
  ) -> Result<T, FetchError>
  where
    T: DeserializeOwned
  {
    let endpoint =
      url.path().to_string();
    let response = self
      .client
      .get(url)
      .header(
        reqwest::header::ACCEPT,
        "application/json"
      )
      .header(
        reqwest::header::AUTHORIZATION,
        format!(
          "Bearer {}",
          self.session.token
        )
      )
      .send()
      .await
      .map_err(|error| {
        warn!(
          endpoint = %endpoint,
          error = %error,
          "booking api request failed"
        );
        FetchError::Transport {
          endpoint: endpoint.clone(),
          message:  error.to_string()
        }
      })?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|error| {
        FetchError::Transport {
          endpoint: endpoint.clone(),
          message:  format!(
            "failed reading body: \
             {error}"
          )
        }
      })?;

    if !status.is_success() {
      warn!(
        endpoint = %endpoint,
        status = status.as_u16(),
        "booking api returned error status"
      );
      return Err(FetchError::Status {
        endpoint,
        status: status.as_u16(),
        body: body
          .chars()
          .take(ERROR_BODY_PREVIEW_CHARS)
          .collect()
      });
    }

    debug!(
      endpoint = %endpoint,
      bytes = body.len(),
      "booking api response received"
    );
    serde_json::from_str::<T>(&body)
      .map_err(|error| {
        FetchError::Decode {
          endpoint,
          message: error.to_string()
        }
      })
  }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
  #[instrument(skip(self), fields(year = args.year, month = args.month))]
  async fn month_availability(
    &self,
    args: MonthAvailabilityArgs
  ) -> Result<Vec<DayAvailability>, FetchError>
  {
    let url =
      self.month_availability_url(args);
    let days: Vec<DayAvailabilityDto> =
      self.get_json(url).await?;
    Ok(
      days
        .into_iter()
        .map(DayAvailability::from)
        .collect()
    )
  }

  #[instrument(skip(self), fields(day = args.day, month = args.month, year = args.year))]
  async fn day_agenda(
    &self,
    args: DayAgendaArgs
  ) -> Result<Vec<Appointment>, FetchError>
  {
    let url = self.day_agenda_url(args);
    let endpoint =
      url.path().to_string();
    let raw: Vec<AppointmentDto> =
      self.get_json(url).await?;
    raw
      .into_iter()
      .map(|dto| {
        let id = dto.id.clone();
        Appointment::try_from(dto)
          .map_err(|error| {
            FetchError::Decode {
              endpoint: endpoint.clone(),
              message:  format!(
                "appointment {id}: \
                 {error:#}"
              )
            }
          })
      })
      .collect()
  }
}
