use chrono::{DateTime, Utc};

use crate::{error::TimezoneError, model::LookupOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

struct Field {
    name: &'static str,
    presence: Presence,
    read: fn(&LookupOptions) -> Option<String>,
}

/// Query parameters in wire order. `timestamp` is defaulted before collection,
/// so its `Required` marker only fixes its position.
const FIELDS: [Field; 4] = [
    Field { name: "location", presence: Presence::Required, read: |o| o.location.clone() },
    Field {
        name: "timestamp",
        presence: Presence::Required,
        read: |o| o.timestamp.map(|t| t.to_string()),
    },
    Field { name: "key", presence: Presence::Optional, read: |o| o.key.clone() },
    Field { name: "language", presence: Presence::Optional, read: |o| o.language.clone() },
];

/// Validated query parameters for one request, in the order they are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParams {
    pairs: Vec<(&'static str, String)>,
}

impl PathParams {
    /// Validates `options` and collects the parameters to send.
    ///
    /// A missing `timestamp` becomes `now` rounded to the nearest second.
    /// Stops at the first missing required field.
    pub fn collect(options: &LookupOptions, now: DateTime<Utc>) -> Result<Self, TimezoneError> {
        let mut resolved = options.clone();
        resolved.timestamp.get_or_insert_with(|| {
            let round_up = now.timestamp_subsec_millis() >= 500;
            now.timestamp() + i64::from(round_up)
        });

        let mut pairs = Vec::with_capacity(FIELDS.len());
        for field in &FIELDS {
            match ((field.read)(&resolved), field.presence) {
                (Some(value), _) => pairs.push((field.name, value)),
                (None, Presence::Required) => return Err(TimezoneError::MissingField(field.name)),
                (None, Presence::Optional) => {}
            }
        }

        Ok(Self { pairs })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.pairs.iter().map(|(n, _)| *n).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.pairs.iter().map(|(n, v)| (*n, v.as_str()))
    }

    /// Percent-encoded `name=value&...` string.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new()).extend_pairs(self.iter()).finish()
    }
}
