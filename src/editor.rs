use crate::channel::{Channel, ChannelBank, ChannelState};
use crate::error::Result;
use crate::interpolate::Curve;
use crate::lut::{BitDepth, Lut, LutEngine, LutSet};
use crate::point::{ControlPointSet, Point, PointId};
use crate::range::RangeClamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorConfig {
    pub bit_depth: BitDepth,
}

/// Sent to subscribers after every edit that changed a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelChange {
    pub channel: Channel,
    pub range: RangeClamp,
    /// `false` when the points do not define a curve. `lut` is then the last
    /// good table.
    pub curve_available: bool,
    pub lut: Lut,
}

type Subscriber = Box<dyn FnMut(&LevelChange)>;

/// The single mutator of the curve state.
///
/// Views turn their input into the intents below. Each intent that changes
/// something rebuilds the live curve, republishes the channel's LUT and
/// notifies subscribers before returning.
pub struct LevelEditor {
    bank: ChannelBank,
    engine: LutEngine,
    curve: Option<Curve>,
    subscribers: Vec<Subscriber>,
}

impl Default for LevelEditor {
    fn default() -> Self {
        LevelEditor::new(EditorConfig::default())
    }
}

impl LevelEditor {
    pub fn new(config: EditorConfig) -> Self {
        LevelEditor::with_bank(ChannelBank::default(), config.bit_depth)
    }

    /// Builds an editor around an existing bank, computing every channel's LUT.
    pub fn with_bank(bank: ChannelBank, bit_depth: BitDepth) -> Self {
        let mut editor = LevelEditor {
            bank,
            engine: LutEngine::new(bit_depth),
            curve: None,
            subscribers: Vec::new(),
        };
        for channel in Channel::ALL {
            let state = editor.bank.state(channel);
            let curve = Curve::build(&state.points.ordered_points());
            editor.engine.refresh(channel, curve.as_ref(), &state.range).ok();
        }
        editor.bank.live_mut().points.sort_by_x();
        editor.curve = Curve::build(&editor.bank.live().points.ordered_points()).ok();
        editor
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&LevelChange) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Adds a point to the active channel. Returns `None` (and changes
    /// nothing) if the point already exists.
    pub fn add_point(&mut self, x: f64, y: f64) -> Option<PointId> {
        let id = self.bank.live_mut().points.add_point(x, y)?;
        self.rebuild();
        Some(id)
    }

    pub fn move_point(&mut self, id: PointId, x: f64, y: f64) -> Result<()> {
        self.bank.live_mut().points.move_point(id, x, y)?;
        self.rebuild();
        Ok(())
    }

    pub fn remove_point(&mut self, id: PointId) -> Result<Point> {
        let removed = self.bank.live_mut().points.remove_point(id)?;
        self.rebuild();
        Ok(removed)
    }

    pub fn set_start(&mut self, v: f64) {
        self.bank.live_mut().range.set_start(v);
        self.rebuild();
    }

    pub fn set_stop(&mut self, v: f64) {
        self.bank.live_mut().range.set_stop(v);
        self.rebuild();
    }

    pub fn switch_to(&mut self, channel: Channel) {
        self.bank.switch_to(channel);
        self.rebuild();
    }

    /// Switches by combo-box position. Out-of-range indices are an error.
    pub fn switch_to_index(&mut self, index: usize) -> Result<()> {
        let channel = Channel::try_from(index)?;
        self.switch_to(channel);
        Ok(())
    }

    /// Restores `channel` to the default curve and full range.
    pub fn reset(&mut self, channel: Channel) {
        self.bank.reset(channel);
        if channel == self.bank.active() {
            self.rebuild();
            return;
        }

        let state = self.bank.state(channel);
        let curve = Curve::build(&state.points.ordered_points());
        let range = state.range;
        let curve_available = self.engine.refresh(channel, curve.as_ref(), &range).is_ok();
        self.publish(channel, range, curve_available);
    }

    pub fn reset_live(&mut self) {
        self.reset(self.bank.active());
    }

    pub fn active(&self) -> Channel {
        self.bank.active()
    }

    pub fn points(&self) -> &ControlPointSet {
        &self.bank.live().points
    }

    pub fn range(&self) -> RangeClamp {
        self.bank.live().range
    }

    /// The live curve, or `None` while the points are degenerate.
    pub fn curve(&self) -> Option<&Curve> {
        self.curve.as_ref()
    }

    pub fn state(&self, channel: Channel) -> &ChannelState {
        self.bank.state(channel)
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.engine.bit_depth()
    }

    pub fn lut(&self, channel: Channel) -> &Lut {
        self.engine.lut(channel)
    }

    pub fn luts(&self) -> &LutSet {
        self.engine.luts()
    }

    fn rebuild(&mut self) {
        let channel = self.bank.active();
        let live = self.bank.live_mut();
        live.points.sort_by_x();
        let range = live.range;

        let curve = Curve::build(&live.points.ordered_points());
        // a failed build is logged by the engine, which keeps the last good LUT
        self.engine.refresh(channel, curve.as_ref(), &range).ok();
        self.curve = curve.ok();
        self.publish(channel, range, self.curve.is_some());
    }

    fn publish(&mut self, channel: Channel, range: RangeClamp, curve_available: bool) {
        let change = LevelChange {
            channel,
            range,
            curve_available,
            lut: self.engine.lut(channel).clone(),
        };
        for subscriber in &mut self.subscribers {
            subscriber(&change);
        }
    }
}
