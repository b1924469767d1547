use std::ops::Deref;

use serde::Deserialize;

/// A duration written as whitespace separated parts like `"1d 2h 3m 4s 500ms"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration(pub std::time::Duration);

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut out = std::time::Duration::default();
        for part in s.split_whitespace() {
            let split = part
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(part.len());
            let (value, unit) = part.split_at(split);
            let value = value
                .parse::<u64>()
                .map_err(|_| serde::de::Error::custom("Invalid duration"))?;
            let part = match unit {
                "ms" => Some(std::time::Duration::from_millis(value)),
                "" | "s" => Some(std::time::Duration::from_secs(value)),
                "m" => value.checked_mul(60).map(std::time::Duration::from_secs),
                "h" => value.checked_mul(3600).map(std::time::Duration::from_secs),
                "d" => value.checked_mul(24 * 3600).map(std::time::Duration::from_secs),
                _ => None,
            };
            out = part
                .and_then(|part| out.checked_add(part))
                .ok_or_else(|| serde::de::Error::custom("Invalid duration"))?;
        }
        Ok(Self(out))
    }
}
