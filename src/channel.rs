use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Error;
use crate::point::ControlPointSet;
use crate::range::RangeClamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Value,
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const COUNT: usize = 4;
    pub const ALL: [Channel; Channel::COUNT] =
        [Channel::Value, Channel::Red, Channel::Green, Channel::Blue];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Value => "value",
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

impl TryFrom<usize> for Channel {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Channel::ALL
            .get(index)
            .copied()
            .ok_or(Error::InvalidChannel(index))
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown channel {s:?}, expected value, red, green or blue"))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Everything that defines one channel's adjustment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    pub points: ControlPointSet,
    pub range: RangeClamp,
}

/// One preset per channel plus the live state being edited.
///
/// The live state belongs to the active channel. Its preset slot is only
/// brought up to date by [`ChannelBank::snapshot`] or when switching away.
#[derive(Debug, Clone)]
pub struct ChannelBank {
    presets: [ChannelState; Channel::COUNT],
    default: ChannelState,
    live: ChannelState,
    active: Channel,
}

impl Default for ChannelBank {
    fn default() -> Self {
        ChannelBank::new(ChannelState::default())
    }
}

impl ChannelBank {
    /// Every slot starts as a copy of `default`, which is also what
    /// [`ChannelBank::reset`] restores.
    pub fn new(default: ChannelState) -> Self {
        ChannelBank {
            presets: std::array::from_fn(|_| default.clone()),
            live: default.clone(),
            default,
            active: Channel::default(),
        }
    }

    /// Rebuilds a bank from saved presets. The reset state is the stock default.
    pub fn from_presets(presets: [ChannelState; Channel::COUNT], active: Channel) -> Self {
        ChannelBank {
            live: presets[active.index()].clone(),
            presets,
            default: ChannelState::default(),
            active,
        }
    }

    pub fn active(&self) -> Channel {
        self.active
    }

    pub fn live(&self) -> &ChannelState {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut ChannelState {
        &mut self.live
    }

    /// The current state of `channel`: the live state for the active channel,
    /// the stored preset otherwise.
    pub fn state(&self, channel: Channel) -> &ChannelState {
        if channel == self.active {
            &self.live
        } else {
            &self.presets[channel.index()]
        }
    }

    /// Copies the live state into `channel`'s slot.
    pub fn snapshot(&mut self, channel: Channel) {
        self.presets[channel.index()] = self.live.clone();
    }

    pub fn switch_to(&mut self, channel: Channel) {
        self.snapshot(self.active);
        self.live = self.presets[channel.index()].clone();
        info!(from = %self.active, to = %channel, "switched channel");
        self.active = channel;
    }

    /// Restores `channel` to the construction-time default. Resetting the
    /// active channel also resets the live state.
    pub fn reset(&mut self, channel: Channel) {
        self.presets[channel.index()] = self.default.clone();
        if channel == self.active {
            self.live = self.default.clone();
        }
        info!(%channel, "reset channel");
    }
}
