use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::channel::{Channel, ChannelBank, ChannelState};
use crate::editor::LevelEditor;
use crate::error::{Error, Result};
use crate::lut::BitDepth;
use crate::point::{clamp_interior_x, ControlPointSet, Point};
use crate::range::RangeClamp;

pub const SESSION_VERSION: u32 = 1;

/// One channel as stored on disk. The boundary points keep their fixed x, so
/// only their heights are recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel: Channel,
    /// y of the left and right boundary points.
    pub boundaries: [f64; 2],
    /// Interior points as `[x, y]`, in x order.
    pub points: Vec<[f64; 2]>,
    /// The ruler as `[start, stop]`.
    pub range: [f64; 2],
}

/// Everything needed to recreate a [`LevelEditor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub version: u32,
    pub bit_depth: BitDepth,
    pub active: Channel,
    pub channels: Vec<ChannelRecord>,
}

impl Session {
    /// Records every channel. The active channel is taken from the live state.
    pub fn capture(editor: &LevelEditor) -> Self {
        let channels = Channel::ALL
            .into_iter()
            .map(|channel| {
                let state = editor.state(channel);
                ChannelRecord {
                    channel,
                    boundaries: state.points.boundary_ys(),
                    points: state
                        .points
                        .interior_points()
                        .into_iter()
                        .map(|p| [p.x, p.y])
                        .collect(),
                    range: [state.range.start(), state.range.stop()],
                }
            })
            .collect();

        Session {
            version: SESSION_VERSION,
            bit_depth: editor.bit_depth(),
            active: editor.active(),
            channels,
        }
    }

    /// Rebuilds the editor. Channels missing from the record start at the
    /// default curve.
    pub fn restore(self) -> Result<LevelEditor> {
        if self.version != SESSION_VERSION {
            return Err(Error::Session(format!(
                "unsupported version {}, expected {}",
                self.version, SESSION_VERSION
            )));
        }

        let mut presets: [Option<ChannelState>; Channel::COUNT] = Default::default();
        for record in self.channels {
            let slot = &mut presets[record.channel.index()];
            if slot.is_some() {
                return Err(Error::Session(format!(
                    "channel {} appears more than once",
                    record.channel
                )));
            }
            *slot = Some(record.into_state()?);
        }

        let presets = presets.map(Option::unwrap_or_default);
        let bank = ChannelBank::from_presets(presets, self.active);
        Ok(LevelEditor::with_bank(bank, self.bit_depth))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let session = serde_json::from_str::<Session>(&data)?;
        info!(path = %path.display(), "loaded session");
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(&file, self)?;
        info!(path = %path.display(), "saved session");
        Ok(())
    }
}

impl ChannelRecord {
    fn into_state(self) -> Result<ChannelState> {
        let interior: Vec<Point> = self.points.iter().map(|&[x, y]| Point::new(x, y)).collect();
        let finite = self.boundaries.iter().all(|y| y.is_finite())
            && interior.iter().all(|p| p.x.is_finite() && p.y.is_finite());
        if !finite {
            return Err(Error::Session(format!(
                "channel {} has non-finite points",
                self.channel
            )));
        }
        if let Some(p) = interior.iter().find(|p| clamp_interior_x(p.x) != p.x) {
            return Err(Error::Session(format!(
                "channel {} has an interior point at x = {}, outside the boundaries",
                self.channel, p.x
            )));
        }

        let points = ControlPointSet::from_parts(self.boundaries, &interior).ok_or_else(|| {
            Error::Session(format!("channel {} has no interior points", self.channel))
        })?;

        let [start, stop] = self.range;
        Ok(ChannelState {
            points,
            range: RangeClamp::new(start, stop),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PointError;
    use crate::point::{EDGE_MARGIN, RIGHT_X};

    fn edited_editor() -> LevelEditor {
        let mut editor = LevelEditor::default();
        editor.add_point(0.2, 0.9);
        editor.set_stop(0.85);
        editor.switch_to(Channel::Blue);
        editor.add_point(0.7, 0.1);
        editor.set_start(0.05);
        editor
    }

    fn record(points: Vec<[f64; 2]>) -> ChannelRecord {
        ChannelRecord {
            channel: Channel::Red,
            boundaries: [1.0, 0.0],
            points,
            range: [0.0, 1.0],
        }
    }

    #[test]
    fn test_capture_restore_round_trip() {
        let editor = edited_editor();
        let session = Session::capture(&editor);
        assert_eq!(session.channels.len(), 4);
        assert_eq!(session.active, Channel::Blue);

        let restored = session.clone().restore().unwrap();
        assert_eq!(restored.active(), Channel::Blue);
        for channel in Channel::ALL {
            let (a, b) = (editor.state(channel), restored.state(channel));
            assert_eq!(a.points.ordered_points(), b.points.ordered_points());
            assert_eq!(a.range, b.range);
            assert_eq!(editor.lut(channel), restored.lut(channel));
        }
        assert_eq!(Session::capture(&restored), session);
    }

    #[test]
    fn test_restored_boundaries_stay_pinned() {
        let editor = Session::capture(&edited_editor()).restore().unwrap();
        let boundaries: Vec<Point> = editor
            .points()
            .iter()
            .filter(|p| !p.movable)
            .map(|p| p.point)
            .collect();
        assert_eq!(boundaries, vec![Point::new(0.0, 1.0), Point::new(1.0, 0.0)]);
    }

    #[test]
    fn test_clamped_point_does_not_replace_boundary() {
        let mut editor = LevelEditor::default();
        editor.add_point(1.5, 0.3).unwrap();
        let pinned = |editor: &LevelEditor| -> Vec<(Point, bool)> {
            let ids = editor.points().ordered_ids();
            ids.iter()
                .map(|&id| editor.points().get(id).unwrap())
                .map(|p| (p.point, p.movable))
                .collect()
        };
        let before = pinned(&editor);
        assert_eq!(before.last(), Some(&(Point::new(1.0, 0.0), false)));

        let restored = Session::capture(&editor).restore().unwrap();
        assert_eq!(pinned(&restored), before);

        let mut editor = restored;
        let ids = editor.points().ordered_ids();
        assert!(matches!(
            editor.remove_point(ids[3]),
            Err(Error::Point(PointError::Pinned(_)))
        ));
        assert_eq!(
            editor.remove_point(ids[2]).unwrap(),
            Point::new(RIGHT_X - EDGE_MARGIN, 0.3)
        );
    }

    #[test]
    fn test_missing_channels_use_default() {
        let session = Session {
            version: SESSION_VERSION,
            bit_depth: BitDepth::EIGHT,
            active: Channel::Value,
            channels: vec![ChannelRecord {
                boundaries: [0.8, 0.2],
                ..record(vec![[0.5, 0.5]])
            }],
        };
        let editor = session.restore().unwrap();
        assert_eq!(editor.state(Channel::Green), &ChannelState::default());
        let red = &editor.state(Channel::Red).points;
        assert_eq!(
            red.ordered_points(),
            vec![Point::new(0.0, 0.8), Point::new(0.5, 0.5), Point::new(1.0, 0.2)]
        );
    }

    #[test]
    fn test_rejects_bad_records() {
        let mut session = Session::capture(&LevelEditor::default());
        session.version = 2;
        assert!(matches!(session.restore(), Err(Error::Session(_))));

        // no interior point
        let mut session = Session::capture(&LevelEditor::default());
        session.channels[1] = record(vec![]);
        assert!(matches!(session.restore(), Err(Error::Session(_))));

        // red twice
        let mut session = Session::capture(&LevelEditor::default());
        session.channels[0] = record(vec![[0.5, 0.5]]);
        assert!(matches!(session.restore(), Err(Error::Session(_))));

        let mut session = Session::capture(&LevelEditor::default());
        session.channels[1] = record(vec![[0.5, f64::NAN]]);
        assert!(matches!(session.restore(), Err(Error::Session(_))));

        let mut session = Session::capture(&LevelEditor::default());
        session.channels[1].boundaries = [f64::INFINITY, 0.0];
        assert!(matches!(session.restore(), Err(Error::Session(_))));

        // interior points on or past a boundary's x
        for x in [0.0, 1.0, 0.3 - 1.0] {
            let mut session = Session::capture(&LevelEditor::default());
            session.channels[1] = record(vec![[0.5, 0.5], [x, 0.2]]);
            assert!(matches!(session.restore(), Err(Error::Session(_))), "x = {x}");
        }
    }

    #[test]
    fn test_rejects_invalid_bit_depth() {
        let json = r#"{"version":1,"bit_depth":0,"active":"value","channels":[]}"#;
        assert!(serde_json::from_str::<Session>(json).is_err());

        let json = r#"{"version":1,"bit_depth":10,"active":"green","channels":[]}"#;
        let editor = serde_json::from_str::<Session>(json)
            .unwrap()
            .restore()
            .unwrap();
        assert_eq!(editor.active(), Channel::Green);
        assert_eq!(editor.lut(Channel::Green).len(), 1024);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("leveled-session-{}.json", std::process::id()));
        let session = Session::capture(&edited_editor());
        session.save(&path).unwrap();
        let loaded = Session::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, session);
    }
}
