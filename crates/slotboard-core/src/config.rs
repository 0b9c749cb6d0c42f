use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::dashboard::DashboardOptions;
use crate::datetime::{
  DisplayZone,
  resolve_display_zone
};
use crate::model::{
  Session,
  User
};
use crate::partition::AgendaOrdering;

pub const RC_ENV_VAR: &str =
  "SLOTBOARDRC";
const RC_FILE_NAME: &str =
  ".slotboardrc";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    for (key, value) in [
      (
        "api.base_url",
        "http://localhost:3333"
      ),
      ("api.timeout_secs", "30"),
      ("locale", "en_US"),
      ("time.zone", "local"),
      ("agenda.ordering", "feed"),
      ("color", "on")
    ] {
      map.insert(
        key.to_string(),
        value.to_string()
      );
    }
    Config {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(
      rc_override
    )?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading slotboardrc");
      cfg.load_file(&path)?;
    } else {
      warn!(
        "no slotboardrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      if key.starts_with("session.token")
      {
        debug!(key = %key, "applying override");
      } else {
        debug!(key = %key, value = %v, "applying override");
      }
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn api_base_url(&self) -> String {
    self
      .get("api.base_url")
      .unwrap_or_default()
  }

  pub fn api_timeout(
    &self
  ) -> anyhow::Result<Duration> {
    let raw = self
      .get("api.timeout_secs")
      .unwrap_or_else(|| {
        "30".to_string()
      });
    let secs: u64 = raw
      .trim()
      .parse()
      .with_context(|| {
        format!(
          "invalid api.timeout_secs: \
           {raw}"
        )
      })?;
    if secs == 0 {
      return Err(anyhow!(
        "api.timeout_secs must be \
         positive"
      ));
    }
    Ok(Duration::from_secs(secs))
  }

  pub fn display_zone(
    &self
  ) -> DisplayZone {
    resolve_display_zone(
      self.get("time.zone").as_deref()
    )
  }

  pub fn dashboard_options(
    &self
  ) -> anyhow::Result<DashboardOptions>
  {
    let ordering = match self
      .get("agenda.ordering")
    {
      | Some(raw) => {
        raw.parse::<AgendaOrdering>()?
      }
      | None => AgendaOrdering::default()
    };
    Ok(DashboardOptions {
      locale: self
        .get("locale")
        .unwrap_or_else(|| {
          "en_US".to_string()
        }),
      ordering
    })
  }

  /// The signed-in provider. Sign-in
  /// itself happens elsewhere; the rc
  /// file carries its result.
  pub fn session(
    &self
  ) -> anyhow::Result<Session> {
    let required = |key: &str| {
      self
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
          anyhow!(
            "missing {key}; set it in \
             ~/{RC_FILE_NAME} or pass \
             --rc {key}=..."
          )
        })
    };
    let optional = |key: &str| {
      self
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    };

    let id = required("session.user_id")?;
    let token =
      required("session.token")?;
    Ok(Session {
      user: User {
        name: optional(
          "session.user_name"
        )
        .unwrap_or_else(|| id.clone()),
        id,
        email: optional("session.email"),
        avatar_url: optional(
          "session.avatar_url"
        )
      },
      token
    })
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once(" #")
      {
        line = before.trim();
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory"
    );
    return Ok(None);
  };
  let candidate =
    home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
