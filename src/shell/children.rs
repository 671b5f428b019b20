//! Launches and dependent windows

use log::{debug, info};

use super::Shell;
use crate::error::{Relation, ShellError, ShellResult};
use crate::scheduler::TimerKind;
use crate::surface::Container;
use crate::window::hierarchy::kind_for;
use crate::window::{
    ChildRequest, LaunchConfig, ManifestRef, Placement, TransitionEvent, WindowId, WindowKind,
};

/// Options of a top-level launch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Create (or find) the window without displaying it
    pub stay_background: bool,
    pub fullscreen: bool,
}

impl Shell {
    /// Launch an app, reusing its running window when there is one
    pub fn launch(
        &mut self,
        url: &str,
        manifest: Option<ManifestRef>,
        options: LaunchOptions,
    ) -> ShellResult<WindowId> {
        let mut config = LaunchConfig::new(url)?
            .stay_background(options.stay_background)
            .fullscreen(options.fullscreen);
        if let Some(manifest) = manifest {
            config = config.with_manifest(manifest);
        }

        let running = self
            .stack
            .entries()
            .iter()
            .copied()
            .find(|&id| {
                self.windows
                    .get(&id)
                    .map_or(false, |w| !w.is_killed() && w.origin().same_origin(&config.origin))
            });

        if let Some(existing) = running {
            debug!("launch of {} matches running window {}", url, existing);
            let change = self.stack.on_launch_existing(existing, options.stay_background);
            self.publish_stack(change);
            if !options.stay_background {
                let target = self.group_leaf(existing);
                self.set_displayed(target);
            }
            return Ok(existing);
        }

        let id = self.create_window(WindowKind::App, config, Container::TopLevel, None);
        let change = self.stack.on_created(id, options.stay_background);
        self.publish_stack(change);

        info!("🚀 launched {} as {}", url, id);
        if !options.stay_background {
            self.set_displayed(id);
        }
        Ok(id)
    }

    /// Spawn a dependent window, classified by the request and the parent origin
    pub fn spawn_child(&mut self, parent: WindowId, request: ChildRequest) -> ShellResult<WindowId> {
        if !self.check_id(parent)? {
            return Err(ShellError::UnknownWindow(parent));
        }
        let Some(opener) = self.windows.get(&parent) else {
            return Err(ShellError::UnknownWindow(parent));
        };
        if opener.is_killed() {
            return Err(ShellError::UnknownWindow(parent));
        }

        let relation = request.classify(opener.origin())?;
        if let Some(existing) = opener.links().child(relation) {
            let same_url = self
                .windows
                .get(&existing)
                .map_or(false, |w| !w.is_killed() && w.config().url == request.url);
            if same_url {
                debug!("reusing {} {} of {}", relation, existing, parent);
                self.request_open(existing, None)?;
                return Ok(existing);
            }
            return Err(ShellError::HierarchyConflict {
                parent,
                existing,
                relation,
            });
        }

        let kind = kind_for(relation);
        let container = match kind.policy().placement {
            Placement::Inline => Container::Inline { parent },
            Placement::TopLevel => Container::TopLevel,
        };
        let mut config = LaunchConfig::new(&request.url)?;
        if let Some(manifest) = request.manifest {
            config = config.with_manifest(manifest);
        }

        let id = self.create_window(kind, config, container, Some(parent));
        if let Some(opener) = self.windows.get_mut(&parent) {
            opener.links.set_child(relation, Some(id));
        }
        if let Some(child) = self.windows.get_mut(&id) {
            child.links.set_parent(relation, Some(parent));
        }
        info!("👶 {} spawned {} {}", parent, relation, id);

        match relation {
            Relation::Chain => self.set_displayed(id),
            Relation::Activity | Relation::Popup => {
                self.apply_event(id, TransitionEvent::Open, None);
            }
            Relation::Attention => {
                let timer = self.scheduler.schedule(
                    self.config.readiness.attention_load_timeout(),
                    TimerKind::AttentionLoad { window: id },
                );
                debug!("attention window {} waits for its content ({:?})", id, timer);
            }
        }
        Ok(id)
    }

    pub fn spawn_activity(&mut self, caller: WindowId, url: &str) -> ShellResult<WindowId> {
        self.spawn_child(caller, ChildRequest::activity(url))
    }

    pub fn spawn_popup(&mut self, opener: WindowId, url: &str) -> ShellResult<WindowId> {
        self.spawn_child(opener, ChildRequest::popup(url))
    }

    pub fn spawn_attention(&mut self, owner: WindowId, url: &str) -> ShellResult<WindowId> {
        self.spawn_child(owner, ChildRequest::attention(url))
    }
}
