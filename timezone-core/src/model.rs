use anyhow::{Context, anyhow};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

/// Caller-supplied options for a single lookup.
///
/// Only `location` is required; it is still an `Option` so that options
/// deserialized from a mapping can be validated at lookup time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOptions {
    /// `"lat,lng"`, e.g. `"43.7182713,-79.3777061"`.
    pub location: Option<String>,
    /// Seconds since the Unix epoch. Defaults to the current time.
    pub timestamp: Option<i64>,
    /// API key sent as the `key` query parameter.
    pub key: Option<String>,
    /// Language of the returned data, e.g. `"en"`.
    pub language: Option<String>,
}

impl LookupOptions {
    pub fn new(location: impl Into<String>) -> Self {
        Self { location: Some(location.into()), ..Self::default() }
    }

    pub fn at(coordinates: Coordinates) -> Self {
        Self::new(coordinates.to_string())
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> anyhow::Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(anyhow!("Latitude {latitude} is out of range (-90..=90)"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow!("Longitude {longitude} is out of range (-180..=180)"));
        }
        Ok(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("Expected coordinates as 'lat,lng', got '{s}'"))?;

        let latitude: f64 =
            lat.trim().parse().with_context(|| format!("Invalid latitude '{}'", lat.trim()))?;
        let longitude: f64 =
            lng.trim().parse().with_context(|| format!("Invalid longitude '{}'", lng.trim()))?;

        Self::new(latitude, longitude)
    }
}

/// The parsed JSON document returned by the time zone API.
///
/// The shape is owned by the remote service; accessors read well-known
/// fields without validating the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimezoneResponse(Value);

impl TimezoneResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn status(&self) -> Option<&str> {
        self.str_field("status")
    }

    pub fn is_ok(&self) -> bool {
        self.status() == Some("OK")
    }

    pub fn time_zone_id(&self) -> Option<&str> {
        self.str_field("timeZoneId")
    }

    pub fn time_zone_name(&self) -> Option<&str> {
        self.str_field("timeZoneName")
    }

    pub fn error_message(&self) -> Option<&str> {
        self.str_field("errorMessage")
    }

    /// Offset from UTC in seconds, without daylight saving.
    pub fn raw_offset(&self) -> Option<i64> {
        self.seconds_field("rawOffset")
    }

    /// Daylight saving offset in seconds.
    pub fn dst_offset(&self) -> Option<i64> {
        self.seconds_field("dstOffset")
    }

    /// Total offset from UTC (`rawOffset + dstOffset`).
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        let total = self.raw_offset()?.checked_add(self.dst_offset().unwrap_or(0))?;
        FixedOffset::east_opt(i32::try_from(total).ok()?)
    }

    /// Wall-clock time at the looked-up location for `timestamp`.
    pub fn local_time(&self, timestamp: i64) -> Option<DateTime<FixedOffset>> {
        let offset = self.utc_offset()?;
        DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&offset))
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    fn seconds_field(&self, field: &str) -> Option<i64> {
        let value = self.0.get(field)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f.round() as i64))
    }
}

impl From<Value> for TimezoneResponse {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
