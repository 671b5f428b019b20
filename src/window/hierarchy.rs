//! Parent/child relationships between windows
//!
//! Links are stored on both sides by id. Each window has at most one parent and at
//! most one child per relationship:
//!
//! - previous/next: same-origin child app windows (a chain)
//! - rear/front: popups
//! - caller/callee: activities
//! - attention owner/attention: attention overlays
//!
//! A window's dependents are its children; they die with it.

use log::debug;
use url::Url;

use crate::error::{Relation, ShellError, ShellResult};
use crate::window::{ManifestRef, WindowId, WindowKind};

pub const ALL_RELATIONS: [Relation; 4] = [
    Relation::Chain,
    Relation::Popup,
    Relation::Activity,
    Relation::Attention,
];

/// Hierarchy links of one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowLinks {
    pub previous: Option<WindowId>,
    pub next: Option<WindowId>,
    pub rear: Option<WindowId>,
    pub front: Option<WindowId>,
    pub caller: Option<WindowId>,
    pub callee: Option<WindowId>,
    pub attention_owner: Option<WindowId>,
    pub attention: Option<WindowId>,
}

impl WindowLinks {
    /// Child in `relation`
    pub fn child(&self, relation: Relation) -> Option<WindowId> {
        match relation {
            Relation::Chain => self.next,
            Relation::Popup => self.front,
            Relation::Activity => self.callee,
            Relation::Attention => self.attention,
        }
    }

    /// Parent in `relation`
    pub fn parent(&self, relation: Relation) -> Option<WindowId> {
        match relation {
            Relation::Chain => self.previous,
            Relation::Popup => self.rear,
            Relation::Activity => self.caller,
            Relation::Attention => self.attention_owner,
        }
    }

    pub fn set_child(&mut self, relation: Relation, child: Option<WindowId>) {
        let slot = match relation {
            Relation::Chain => &mut self.next,
            Relation::Popup => &mut self.front,
            Relation::Activity => &mut self.callee,
            Relation::Attention => &mut self.attention,
        };
        *slot = child;
    }

    pub fn set_parent(&mut self, relation: Relation, parent: Option<WindowId>) {
        let slot = match relation {
            Relation::Chain => &mut self.previous,
            Relation::Popup => &mut self.rear,
            Relation::Activity => &mut self.caller,
            Relation::Attention => &mut self.attention_owner,
        };
        *slot = parent;
    }

    /// The single parent link, with its relationship
    pub fn opener(&self) -> Option<(Relation, WindowId)> {
        ALL_RELATIONS
            .iter()
            .find_map(|&relation| self.parent(relation).map(|id| (relation, id)))
    }

    /// Every child, in cascade order
    pub fn dependents(&self) -> Vec<WindowId> {
        ALL_RELATIONS
            .iter()
            .filter_map(|&relation| self.child(relation))
            .collect()
    }

    /// Clear every link pointing at `other`
    pub fn unlink(&mut self, other: WindowId) {
        for slot in [
            &mut self.previous,
            &mut self.next,
            &mut self.rear,
            &mut self.front,
            &mut self.caller,
            &mut self.callee,
            &mut self.attention_owner,
            &mut self.attention,
        ] {
            if *slot == Some(other) {
                *slot = None;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == WindowLinks::default()
    }
}

/// Window kind spawned for each relationship
pub fn kind_for(relation: Relation) -> WindowKind {
    match relation {
        Relation::Chain => WindowKind::App,
        Relation::Popup => WindowKind::Popup,
        Relation::Activity => WindowKind::Activity,
        Relation::Attention => WindowKind::Attention,
    }
}

/// (scheme, host, port) origin tuple
///
/// Custom schemes such as `app://` have opaque origins in the URL standard, which
/// never compare equal; comparing the tuple keeps two windows of the same packaged
/// app in one origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
}

impl Origin {
    pub fn parse(url: &str) -> ShellResult<Self> {
        let parsed = Url::parse(url).map_err(|e| ShellError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            host: parsed.host_str().map(|h| h.to_ascii_lowercase()),
            port: parsed.port_or_known_default(),
        })
    }

    pub fn same_origin(&self, other: &Origin) -> bool {
        self == other
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host.as_deref().unwrap_or(""))?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

/// Features passed along with a window.open-style request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowFeatures {
    pub dialog: bool,
    pub attention: bool,
}

impl WindowFeatures {
    /// Parse a comma separated feature list such as `"dialog"` or `"attention"`
    pub fn parse(features: &str) -> Self {
        let mut parsed = WindowFeatures::default();
        for feature in features.split(',').map(str::trim) {
            match feature.split('=').next().unwrap_or("") {
                "dialog" => parsed.dialog = true,
                "attention" => parsed.attention = true,
                "" => {}
                other => debug!("ignoring window feature {:?}", other),
            }
        }
        parsed
    }
}

/// Request to spawn a dependent window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRequest {
    pub url: String,
    pub features: WindowFeatures,
    /// Explicit activity request rather than a window.open
    pub activity: bool,
    pub manifest: Option<ManifestRef>,
}

impl ChildRequest {
    pub fn window(url: &str) -> Self {
        Self {
            url: url.to_string(),
            features: WindowFeatures::default(),
            activity: false,
            manifest: None,
        }
    }

    pub fn activity(url: &str) -> Self {
        Self {
            activity: true,
            ..Self::window(url)
        }
    }

    pub fn popup(url: &str) -> Self {
        Self::window(url).with_features(WindowFeatures {
            dialog: true,
            attention: false,
        })
    }

    pub fn attention(url: &str) -> Self {
        Self::window(url).with_features(WindowFeatures {
            dialog: false,
            attention: true,
        })
    }

    pub fn with_features(mut self, features: WindowFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn with_manifest(mut self, manifest: ManifestRef) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Decide which relationship a spawn from a window of `parent_origin` creates
    pub fn classify(&self, parent_origin: &Origin) -> ShellResult<Relation> {
        if self.activity {
            return Ok(Relation::Activity);
        }
        if self.features.attention {
            return Ok(Relation::Attention);
        }

        let origin = Origin::parse(&self.url)?;
        if self.features.dialog || !origin.same_origin(parent_origin) {
            Ok(Relation::Popup)
        } else {
            Ok(Relation::Chain)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(url: &str) -> Origin {
        Origin::parse(url).unwrap()
    }

    #[test]
    fn test_origin_tuple_comparison() {
        assert!(origin("app://clock/index.html").same_origin(&origin("app://clock/alarm.html")));
        assert!(!origin("app://clock/").same_origin(&origin("app://gallery/")));
        assert!(origin("https://example.com/a").same_origin(&origin("https://example.com:443/b")));
        assert!(!origin("http://example.com/").same_origin(&origin("https://example.com/")));
        assert_eq!(origin("https://Example.com/").to_string(), "https://example.com:443");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = Origin::parse("not a url").unwrap_err();
        assert!(matches!(err, ShellError::InvalidUrl { .. }));
    }

    #[test]
    fn test_classification() {
        let parent = origin("app://mail/index.html");

        assert_eq!(
            ChildRequest::activity("app://camera/pick.html").classify(&parent),
            Ok(Relation::Activity)
        );
        assert_eq!(
            ChildRequest::window("app://mail/compose.html").classify(&parent),
            Ok(Relation::Chain)
        );
        assert_eq!(
            ChildRequest::window("https://example.com/").classify(&parent),
            Ok(Relation::Popup)
        );
        assert_eq!(
            ChildRequest::popup("app://mail/confirm.html").classify(&parent),
            Ok(Relation::Popup)
        );
        assert_eq!(
            ChildRequest::attention("app://mail/call.html").classify(&parent),
            Ok(Relation::Attention)
        );
    }

    #[test]
    fn test_feature_parsing() {
        assert_eq!(WindowFeatures::parse(""), WindowFeatures::default());
        assert!(WindowFeatures::parse("dialog").dialog);
        assert!(WindowFeatures::parse("width=10, attention").attention);
        assert!(!WindowFeatures::parse("remote=true").dialog);
    }

    #[test]
    fn test_links_by_relation() {
        let mut links = WindowLinks::default();
        assert!(links.is_empty());

        links.set_child(Relation::Activity, Some(WindowId(4)));
        links.set_child(Relation::Popup, Some(WindowId(5)));
        links.set_parent(Relation::Chain, Some(WindowId(1)));

        assert_eq!(links.callee, Some(WindowId(4)));
        assert_eq!(links.dependents(), vec![WindowId(5), WindowId(4)]);
        assert_eq!(links.opener(), Some((Relation::Chain, WindowId(1))));

        links.unlink(WindowId(4));
        links.unlink(WindowId(1));
        assert_eq!(links.dependents(), vec![WindowId(5)]);
        assert_eq!(links.opener(), None);
    }
}
