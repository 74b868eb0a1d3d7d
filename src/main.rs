use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use leveled::{BitDepth, Channel, EditorConfig, LevelEditor, PixelRemapper, PointId, Session};

#[derive(Parser, Debug)]
#[command(name = "leveled")]
#[command(about = "Shape per-channel tone curves and apply them to images", long_about = None)]
struct Args {
    #[arg(short, long)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a session with the default curve on every channel.
    Init {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 8)]
        bit_depth: u8,
    },
    /// Edit one channel of a session in place.
    Edit(EditOpts),
    /// Print a channel's LUT as JSON.
    Lut {
        #[arg(short, long)]
        session: PathBuf,
        #[arg(short, long, default_value = "value")]
        channel: Channel,
    },
    /// Remap an image through a session's LUTs.
    Apply {
        #[arg(short, long)]
        session: PathBuf,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct EditOpts {
    #[arg(short, long)]
    session: PathBuf,
    #[arg(short, long, default_value = "value")]
    channel: Channel,
    /// Restore the default curve before applying the other edits.
    #[arg(long)]
    reset: bool,
    /// Add a point, as `x,y`.
    #[arg(long, value_parser = parse_xy)]
    add: Vec<(f64, f64)>,
    /// Move the n-th point (x order), as `n:x,y`.
    #[arg(long = "move", value_parser = parse_move)]
    moves: Vec<(usize, (f64, f64))>,
    /// Remove the n-th point (x order).
    #[arg(long)]
    remove: Vec<usize>,
    #[arg(long)]
    start: Option<f64>,
    #[arg(long)]
    stop: Option<f64>,
}

fn parse_xy(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {s:?}"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x {x:?}: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y {y:?}: {e}"))?;
    Ok((x, y))
}

fn parse_move(s: &str) -> Result<(usize, (f64, f64)), String> {
    let (index, xy) = s
        .split_once(':')
        .ok_or_else(|| format!("expected n:x,y, got {s:?}"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad index {index:?}: {e}"))?;
    Ok((index, parse_xy(xy)?))
}

fn load_editor(path: &Path) -> anyhow::Result<LevelEditor> {
    let session = Session::load(path)
        .with_context(|| format!("failed to read session {}", path.display()))?;
    Ok(session.restore()?)
}

fn point_at(ids: &[PointId], index: usize) -> anyhow::Result<PointId> {
    match ids.get(index) {
        Some(id) => Ok(*id),
        None => bail!("no point {index}, the channel has {} points", ids.len()),
    }
}

fn edit(opts: EditOpts) -> anyhow::Result<()> {
    let mut editor = load_editor(&opts.session)?;
    editor.subscribe(|change| {
        debug!(
            channel = %change.channel,
            curve = change.curve_available,
            start = change.range.start(),
            stop = change.range.stop(),
            "level changed"
        );
    });

    editor.switch_to(opts.channel);
    if opts.reset {
        editor.reset_live();
    }

    // indices refer to the points as they were before this edit
    let ids = editor.points().ordered_ids();
    for (index, (x, y)) in opts.moves {
        editor.move_point(point_at(&ids, index)?, x, y)?;
    }
    for index in opts.remove {
        editor.remove_point(point_at(&ids, index)?)?;
    }
    for (x, y) in opts.add {
        if editor.add_point(x, y).is_none() {
            info!(x, y, "point already present");
        }
    }
    if let Some(start) = opts.start {
        editor.set_start(start);
    }
    if let Some(stop) = opts.stop {
        editor.set_stop(stop);
    }

    if editor.curve().is_none() {
        info!(channel = %opts.channel, "points do not form a curve, keeping the previous LUT");
    }

    Session::capture(&editor)
        .save(&opts.session)
        .with_context(|| format!("failed to write session {}", opts.session.display()))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match args.command {
        Command::Init { output, bit_depth } => {
            let config = EditorConfig {
                bit_depth: BitDepth::new(bit_depth)?,
            };
            Session::capture(&LevelEditor::new(config))
                .save(&output)
                .with_context(|| format!("failed to write session {}", output.display()))?;
        }
        Command::Edit(opts) => edit(opts)?,
        Command::Lut { session, channel } => {
            let editor = load_editor(&session)?;
            println!("{}", serde_json::to_string(editor.lut(channel).entries())?);
        }
        Command::Apply {
            session,
            input,
            output,
        } => {
            let editor = load_editor(&session)?;
            let remapper = PixelRemapper::new(editor.luts().clone());

            let image = image::open(&input)
                .with_context(|| format!("failed to open {}", input.display()))?;
            info!(
                width = image.width(),
                height = image.height(),
                "remapping {}",
                input.display()
            );
            remapper
                .apply(&image)
                .save(&output)
                .with_context(|| format!("failed to save {}", output.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xy() {
        assert_eq!(parse_xy("0.25,0.75"), Ok((0.25, 0.75)));
        assert_eq!(parse_xy(" 1 , 0 "), Ok((1.0, 0.0)));
        assert!(parse_xy("0.5").is_err());
        assert!(parse_xy("a,0.5").is_err());
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(parse_move("1:0.3,0.4"), Ok((1, (0.3, 0.4))));
        assert!(parse_move("x:0.3,0.4").is_err());
        assert!(parse_move("0.3,0.4").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "leveled", "edit", "-s", "s.json", "-c", "red", "--add", "0.2,0.3", "--move",
            "1:0.4,0.5", "--stop", "0.9",
        ])
        .unwrap();
        match args.command {
            Command::Edit(opts) => {
                assert_eq!(opts.channel, Channel::Red);
                assert_eq!(opts.add, vec![(0.2, 0.3)]);
                assert_eq!(opts.moves, vec![(1, (0.4, 0.5))]);
                assert_eq!(opts.stop, Some(0.9));
                assert!(!opts.reset);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_edit_round_trip() {
        let path = std::env::temp_dir().join(format!("leveled-edit-{}.json", std::process::id()));
        Session::capture(&LevelEditor::default()).save(&path).unwrap();

        edit(EditOpts {
            session: path.clone(),
            channel: Channel::Green,
            reset: false,
            add: vec![(0.25, 0.9)],
            moves: vec![(1, (0.5, 0.3))],
            remove: vec![],
            start: Some(0.1),
            stop: None,
        })
        .unwrap();

        let editor = load_editor(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let green = editor.state(Channel::Green);
        assert_eq!(green.points.len(), 4);
        assert_eq!(green.range.start(), 0.1);
        assert!(green
            .points
            .ordered_points()
            .contains(&leveled::Point::new(0.5, 0.3)));
        assert_eq!(editor.active(), Channel::Green);
    }
}
