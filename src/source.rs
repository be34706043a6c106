use std::{
    io,
    path::PathBuf,
    time::Duration,
};

use reqwest::blocking::Client;

use crate::alarm::{decode_all, Alarm, WireAlarm};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("couldn't read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("alarm list is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// where the alarm list comes from.
/// failures never reach the caller, they just mean no alarms this time
pub trait AlarmSource {
    fn fetch_alarms(&mut self) -> Vec<Alarm>;
}

impl<T: AlarmSource + ?Sized> AlarmSource for Box<T> {
    fn fetch_alarms(&mut self) -> Vec<Alarm> {
        (**self).fetch_alarms()
    }
}

/// logs a failed fetch and turns it into an empty list
fn or_empty(result: Result<Vec<WireAlarm>, FetchError>) -> Vec<Alarm> {
    match result {
        Ok(records) => {
            log::info!("fetched {} alarm(s)", records.len());
            decode_all(records)
        }
        Err(e) => {
            log::warn!("couldn't fetch alarms: {e}");
            Vec::new()
        }
    }
}

/// asks the alarm server
#[derive(Debug)]
pub struct HttpAlarmSource {
    client: Client,
    url: String,
}

impl HttpAlarmSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }

    fn try_fetch(&self) -> Result<Vec<WireAlarm>, FetchError> {
        Ok(self
            .client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .json()?)
    }
}

impl AlarmSource for HttpAlarmSource {
    fn fetch_alarms(&mut self) -> Vec<Alarm> {
        log::info!("fetching alarms from {}", self.url);
        or_empty(self.try_fetch())
    }
}

/// reads the alarm list from a json file, same format as the server sends
#[derive(Debug, Clone)]
pub struct FileAlarmSource {
    path: PathBuf,
}

impl FileAlarmSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn try_fetch(&self) -> Result<Vec<WireAlarm>, FetchError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| FetchError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl AlarmSource for FileAlarmSource {
    fn fetch_alarms(&mut self) -> Vec<Alarm> {
        or_empty(self.try_fetch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("dawnlight-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_alarms_from_file() {
        let path = temp_file(
            "alarms.json",
            r#"[{ "id": "a", "name": "x", "time": "06:30", "length": 5,
                  "intensityCurve": { "startIntensity": 0, "endIntensity": 100, "curve": "linear" },
                  "isActive": true, "recurrence": { "type": "daily" } }]"#,
        );
        let alarms = FileAlarmSource::new(&path).fetch_alarms();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].id, "a");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_no_alarms() {
        let mut source = FileAlarmSource::new("/definitely/not/here.json");
        assert!(source.fetch_alarms().is_empty());
    }

    #[test]
    fn garbage_is_no_alarms() {
        let path = temp_file("garbage.json", "{ not json");
        assert!(FileAlarmSource::new(&path).fetch_alarms().is_empty());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn failed_fetch_is_no_alarms() {
        let err = serde_json::from_str::<Vec<WireAlarm>>("[").unwrap_err();
        assert!(or_empty(Err(FetchError::Json(err))).is_empty());
        let missing = FetchError::Io {
            path: PathBuf::from("/nowhere"),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(or_empty(Err(missing)).is_empty());
    }
}
