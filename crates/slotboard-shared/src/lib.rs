use serde::{
  Deserialize,
  Serialize
};

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct DayAvailabilityDto {
  pub day:       u32,
  pub available: bool
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct AppointmentUserDto {
  #[serde(default)]
  pub name:       String,
  #[serde(default)]
  pub avatar_url: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct AppointmentDto {
  pub id:   String,
  /// ISO-8601 instant as sent by the
  /// server.
  pub date: String,
  pub user: AppointmentUserDto
}

/// Query for
/// `/providers/{id}/month-availability`.
/// `month` is 1-based.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
pub struct MonthAvailabilityArgs {
  pub year:  i32,
  pub month: u32
}

/// Query for `/appointments/me`.
/// `month` is 1-based.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
pub struct DayAgendaArgs {
  pub day:   u32,
  pub month: u32,
  pub year:  i32
}

#[cfg(test)]
mod tests {
  use super::{
    AppointmentDto,
    DayAvailabilityDto
  };

  #[test]
  fn decodes_appointment_without_avatar()
  {
    let raw = r#"{
      "id": "a1",
      "date": "2024-03-11T09:00:00.000Z",
      "user": { "name": "Ana" }
    }"#;
    let parsed: AppointmentDto =
      serde_json::from_str(raw)
        .expect("decode appointment");
    assert_eq!(parsed.id, "a1");
    assert_eq!(parsed.user.name, "Ana");
    assert_eq!(
      parsed.user.avatar_url,
      None
    );
  }

  #[test]
  fn decodes_null_avatar_as_none() {
    let raw = r#"{
      "id": "a2",
      "date": "2024-03-11T14:00:00Z",
      "user": { "name": "Bia", "avatar_url": null }
    }"#;
    let parsed: AppointmentDto =
      serde_json::from_str(raw)
        .expect("decode appointment");
    assert!(
      parsed.user.avatar_url.is_none()
    );
  }

  #[test]
  fn decodes_month_availability_feed() {
    let raw = r#"[
      { "day": 1, "available": true },
      { "day": 10, "available": false }
    ]"#;
    let parsed: Vec<DayAvailabilityDto> =
      serde_json::from_str(raw)
        .expect("decode availability");
    assert_eq!(parsed.len(), 2);
    assert!(!parsed[1].available);
  }
}
