//! Line protocol driving a shell from a terminal or a script
//!
//! One command per line, arguments separated by whitespace. Blank lines and lines
//! starting with `#` are skipped.
//!
//! ```text
//! launch app://clock.localhost/index.html --background
//! paint 2
//! advance 400
//! popup 2 https://example.com/
//! kill 2
//! status
//! ```

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;

use crate::shell::{LaunchOptions, Shell};
use crate::stack::StackSnapshot;
use crate::surface::SurfaceEvent;
use crate::window::{
    ChildRequest, ManifestRef, Orientation, TransitionState, VisibilityState, WindowFeatures,
    WindowId, WindowKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Launch {
        url: String,
        manifest: Option<String>,
        options: LaunchOptions,
    },
    Spawn {
        parent: WindowId,
        url: String,
        features: String,
    },
    Activity { caller: WindowId, url: String },
    Popup { opener: WindowId, url: String },
    Attention { owner: WindowId, url: String },
    Open(WindowId),
    Close(WindowId),
    Cancel(WindowId),
    Kill(WindowId),
    Display(WindowId),
    Home,
    Previous,
    Next,

    // Signals from the visual layer and the surfaces
    Finish(WindowId),
    Paint(WindowId),
    Loaded(WindowId),
    Crash { id: WindowId, reason: String },
    SelfClose(WindowId),
    Advance(Duration),

    // Host layout
    Keyboard(u32),
    Screen { width: u32, height: u32 },
    Lock(bool),
    Orientation {
        id: WindowId,
        orientation: Option<Orientation>,
    },
    Resize {
        id: WindowId,
        width: Option<u32>,
        height: Option<u32>,
    },

    Reload(WindowId),
    Back(WindowId),
    Forward(WindowId),
    Screenshot(WindowId),

    Status,
    Quit,
}

impl Command {
    /// Parse one line. Blank lines and comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        line.parse().map(Some)
    }
}

fn id_arg(args: &[&str], index: usize) -> Result<WindowId> {
    let raw = args
        .get(index)
        .ok_or_else(|| anyhow!("missing window id"))?;
    let id = raw
        .trim_start_matches('#')
        .parse::<u64>()
        .with_context(|| format!("invalid window id: {}", raw))?;
    Ok(WindowId(id))
}

fn text_arg(args: &[&str], index: usize, what: &str) -> Result<String> {
    args.get(index)
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("missing {}", what))
}

fn number_arg(args: &[&str], index: usize, what: &str) -> Result<u32> {
    let raw = args.get(index).ok_or_else(|| anyhow!("missing {}", what))?;
    raw.parse()
        .with_context(|| format!("invalid {}: {}", what, raw))
}

/// `-` leaves a dimension to the layout
fn optional_number(args: &[&str], index: usize, what: &str) -> Result<Option<u32>> {
    match args.get(index) {
        None | Some(&"-") => Ok(None),
        Some(_) => number_arg(args, index, what).map(Some),
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = words.split_first() else {
            bail!("empty command");
        };

        let command = match verb {
            "launch" => {
                let url = text_arg(args, 0, "url")?;
                let mut options = LaunchOptions::default();
                let mut manifest = None;
                let mut rest = args[1..].iter();
                while let Some(&flag) = rest.next() {
                    match flag {
                        "--background" => options.stay_background = true,
                        "--fullscreen" => options.fullscreen = true,
                        "--manifest" => {
                            let url = rest.next().ok_or_else(|| anyhow!("missing manifest url"))?;
                            manifest = Some(url.to_string());
                        }
                        other => bail!("unknown launch flag: {}", other),
                    }
                }
                Command::Launch {
                    url,
                    manifest,
                    options,
                }
            }
            "spawn" => Command::Spawn {
                parent: id_arg(args, 0)?,
                url: text_arg(args, 1, "url")?,
                features: args.get(2).copied().unwrap_or("").to_string(),
            },
            "activity" => Command::Activity {
                caller: id_arg(args, 0)?,
                url: text_arg(args, 1, "url")?,
            },
            "popup" => Command::Popup {
                opener: id_arg(args, 0)?,
                url: text_arg(args, 1, "url")?,
            },
            "attention" => Command::Attention {
                owner: id_arg(args, 0)?,
                url: text_arg(args, 1, "url")?,
            },
            "open" => Command::Open(id_arg(args, 0)?),
            "close" => Command::Close(id_arg(args, 0)?),
            "cancel" => Command::Cancel(id_arg(args, 0)?),
            "kill" => Command::Kill(id_arg(args, 0)?),
            "display" => Command::Display(id_arg(args, 0)?),
            "home" => Command::Home,
            "prev" | "previous" => Command::Previous,
            "next" => Command::Next,

            "finish" => Command::Finish(id_arg(args, 0)?),
            "paint" => Command::Paint(id_arg(args, 0)?),
            "loaded" => Command::Loaded(id_arg(args, 0)?),
            "crash" => Command::Crash {
                id: id_arg(args, 0)?,
                reason: if args.len() > 1 {
                    args[1..].join(" ")
                } else {
                    "crashed".to_string()
                },
            },
            "self-close" => Command::SelfClose(id_arg(args, 0)?),
            "advance" => {
                let ms = number_arg(args, 0, "milliseconds")?;
                Command::Advance(Duration::from_millis(u64::from(ms)))
            }

            "keyboard" => Command::Keyboard(number_arg(args, 0, "keyboard height")?),
            "screen" => Command::Screen {
                width: number_arg(args, 0, "width")?,
                height: number_arg(args, 1, "height")?,
            },
            "lock" => Command::Lock(true),
            "unlock" => Command::Lock(false),
            "orientation" => {
                let id = id_arg(args, 0)?;
                let orientation = match args.get(1) {
                    None | Some(&"none") => None,
                    Some(name) => Some(name.parse::<Orientation>().map_err(|e| anyhow!(e))?),
                };
                Command::Orientation { id, orientation }
            }
            "resize" => Command::Resize {
                id: id_arg(args, 0)?,
                width: optional_number(args, 1, "width")?,
                height: optional_number(args, 2, "height")?,
            },

            "reload" => Command::Reload(id_arg(args, 0)?),
            "back" => Command::Back(id_arg(args, 0)?),
            "forward" => Command::Forward(id_arg(args, 0)?),
            "screenshot" => Command::Screenshot(id_arg(args, 0)?),

            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command: {}", other),
        };
        Ok(command)
    }
}

/// What a command produced besides notifications
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Done,
    Created(WindowId),
    /// An edge swipe found nothing to go to
    Nothing,
    Screenshot(Option<Vec<u8>>),
    Status(Status),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowStatus {
    pub id: WindowId,
    pub kind: WindowKind,
    pub state: TransitionState,
    pub visibility: VisibilityState,
    pub url: String,
    pub killed: bool,
}

/// Snapshot of the shell for `status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub now_ms: u64,
    pub home: Option<WindowId>,
    pub displayed: Option<WindowId>,
    pub exchanging: bool,
    pub orientation: Orientation,
    pub stack: StackSnapshot,
    pub windows: Vec<WindowStatus>,
}

impl Status {
    pub fn of(shell: &Shell) -> Self {
        let windows = shell
            .window_ids()
            .into_iter()
            .filter_map(|id| shell.window(id))
            .map(|w| WindowStatus {
                id: w.id(),
                kind: w.kind(),
                state: w.state(),
                visibility: w.visibility(),
                url: w.location().to_string(),
                killed: w.is_killed(),
            })
            .collect();

        Self {
            now_ms: shell.now().as_millis() as u64,
            home: shell.home(),
            displayed: shell.displayed(),
            exchanging: shell.is_exchanging(),
            orientation: shell.orientation(),
            stack: shell.stack(),
            windows,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "t={}ms home={:?} displayed={:?} exchanging={} orientation={:?}",
            self.now_ms, self.home, self.displayed, self.exchanging, self.orientation
        )?;
        writeln!(f, "stack={:?} current={:?}", self.stack.entries, self.stack.current)?;
        for w in &self.windows {
            writeln!(
                f,
                "  {} {:?} {:?} {:?}{} {}",
                w.id,
                w.kind,
                w.state,
                w.visibility,
                if w.killed { " (killed)" } else { "" },
                w.url
            )?;
        }
        Ok(())
    }
}

impl Command {
    /// Run the command against `shell`
    pub fn apply(self, shell: &mut Shell) -> Result<Reply> {
        let reply = match self {
            Command::Launch {
                url,
                manifest,
                options,
            } => {
                let manifest = manifest.map(|m| ManifestRef::new(&m, &url));
                Reply::Created(shell.launch(&url, manifest, options)?)
            }
            Command::Spawn {
                parent,
                url,
                features,
            } => {
                let request =
                    ChildRequest::window(&url).with_features(WindowFeatures::parse(&features));
                Reply::Created(shell.spawn_child(parent, request)?)
            }
            Command::Activity { caller, url } => {
                Reply::Created(shell.spawn_activity(caller, &url)?)
            }
            Command::Popup { opener, url } => Reply::Created(shell.spawn_popup(opener, &url)?),
            Command::Attention { owner, url } => {
                Reply::Created(shell.spawn_attention(owner, &url)?)
            }
            Command::Open(id) => {
                shell.request_open(id, None)?;
                Reply::Done
            }
            Command::Close(id) => {
                shell.request_close(id, None)?;
                Reply::Done
            }
            Command::Cancel(id) => {
                shell.request_cancel(id)?;
                Reply::Done
            }
            Command::Kill(id) => {
                shell.request_kill(id)?;
                Reply::Done
            }
            Command::Display(id) => {
                shell.display(id)?;
                Reply::Done
            }
            Command::Home => {
                shell.request_home();
                Reply::Done
            }
            Command::Previous => swipe(shell.go_previous()),
            Command::Next => swipe(shell.go_next()),

            Command::Finish(id) => {
                shell.transition_completed(id)?;
                Reply::Done
            }
            Command::Paint(id) => {
                shell.paint_completed(id)?;
                Reply::Done
            }
            Command::Loaded(id) => {
                shell.surface_event(id, SurfaceEvent::LoadEnd)?;
                Reply::Done
            }
            Command::Crash { id, reason } => {
                shell.surface_event(id, SurfaceEvent::FatalError(reason))?;
                Reply::Done
            }
            Command::SelfClose(id) => {
                shell.surface_event(id, SurfaceEvent::ClosedByContent)?;
                Reply::Done
            }
            Command::Advance(delta) => {
                shell.advance(delta);
                Reply::Done
            }

            Command::Keyboard(height) => {
                shell.set_keyboard_height(height);
                Reply::Done
            }
            Command::Screen { width, height } => {
                shell.set_screen_size(width, height);
                Reply::Done
            }
            Command::Lock(locked) => {
                shell.set_locked(locked);
                Reply::Done
            }
            Command::Orientation { id, orientation } => {
                shell.request_orientation(id, orientation)?;
                Reply::Done
            }
            Command::Resize { id, width, height } => {
                shell.resize(id, width, height)?;
                Reply::Done
            }

            Command::Reload(id) => {
                shell.reload(id)?;
                Reply::Done
            }
            Command::Back(id) => {
                shell.go_back(id)?;
                Reply::Done
            }
            Command::Forward(id) => {
                shell.go_forward(id)?;
                Reply::Done
            }
            Command::Screenshot(id) => Reply::Screenshot(shell.screenshot(id)?),

            Command::Status => Reply::Status(Status::of(shell)),
            Command::Quit => Reply::Quit,
        };
        Ok(reply)
    }
}

fn swipe(target: Option<WindowId>) -> Reply {
    match target {
        Some(id) => Reply::Created(id),
        None => Reply::Nothing,
    }
}
