//! Delivery channels: the media a notification can travel over.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A medium of notification, abstracted behind the gateway's uniform send
/// contract.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
  /// Short text message.
  Sms,
  /// Outbound phone call that plays synthesized speech or an audio asset.
  VoiceCall,
}

impl Channel {
  /// The discriminant string stored in the database and sent to providers.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Sms => "sms",
      Self::VoiceCall => "voice_call",
    }
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Channel {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "sms" => Ok(Self::Sms),
      "voice_call" => Ok(Self::VoiceCall),
      other => Err(Error::UnknownChannel(other.to_owned())),
    }
  }
}

/// Collapse a list of channels into an ordered set: first occurrence wins,
/// later duplicates are dropped.
pub fn dedup_channels(channels: impl IntoIterator<Item = Channel>) -> Vec<Channel> {
  let mut out: Vec<Channel> = Vec::new();
  for c in channels {
    if !out.contains(&c) {
      out.push(c);
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn discriminant_matches_serde_tag() {
    for c in [Channel::Sms, Channel::VoiceCall] {
      let json = serde_json::to_string(&c).unwrap();
      assert_eq!(json, format!("\"{}\"", c.as_str()));
      assert_eq!(c.as_str().parse::<Channel>().unwrap(), c);
    }
  }

  #[test]
  fn dedup_keeps_first_occurrence_order() {
    let got = dedup_channels([
      Channel::VoiceCall,
      Channel::Sms,
      Channel::VoiceCall,
    ]);
    assert_eq!(got, vec![Channel::VoiceCall, Channel::Sms]);
  }

  #[test]
  fn unknown_channel_is_rejected() {
    assert!(matches!(
      "fax".parse::<Channel>(),
      Err(Error::UnknownChannel(s)) if s == "fax"
    ));
  }
}
