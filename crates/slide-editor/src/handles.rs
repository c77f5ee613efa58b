//! Selection handles.
//!
//! One move handle near the top of the box and eight resize handles, one
//! per role. The handle table is the single description of where each
//! resize handle sits and which cursor it shows; handle placement, hit
//! testing and resize math all read it.

use crate::config::EditorConfig;
use serde::Serialize;
use slide_core::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HandleRole {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl HandleRole {
    pub const ALL: [HandleRole; 8] = [
        HandleRole::NW,
        HandleRole::N,
        HandleRole::NE,
        HandleRole::E,
        HandleRole::SE,
        HandleRole::S,
        HandleRole::SW,
        HandleRole::W,
    ];

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            HandleRole::NE | HandleRole::NW | HandleRole::SE | HandleRole::SW
        )
    }

    pub fn affects_width(self) -> bool {
        !matches!(self, HandleRole::N | HandleRole::S)
    }

    pub fn affects_height(self) -> bool {
        !matches!(self, HandleRole::E | HandleRole::W)
    }

    /// Dragging this handle moves the left edge.
    pub fn moves_left(self) -> bool {
        matches!(self, HandleRole::W | HandleRole::NW | HandleRole::SW)
    }

    /// Dragging this handle moves the top edge.
    pub fn moves_top(self) -> bool {
        matches!(self, HandleRole::N | HandleRole::NE | HandleRole::NW)
    }

    pub fn name(self) -> &'static str {
        match self {
            HandleRole::N => "n",
            HandleRole::S => "s",
            HandleRole::E => "e",
            HandleRole::W => "w",
            HandleRole::NE => "ne",
            HandleRole::NW => "nw",
            HandleRole::SE => "se",
            HandleRole::SW => "sw",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        HandleRole::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name))
    }

    pub fn spec(self) -> &'static HandleSpec {
        // The table is exhaustive over ALL.
        HANDLE_TABLE
            .iter()
            .find(|h| h.role == self)
            .unwrap_or(&HANDLE_TABLE[0])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleSpec {
    pub role: HandleRole,
    /// Fractional position on the box, `(0,0)` top-left.
    pub anchor: (f32, f32),
    pub cursor: &'static str,
}

pub const HANDLE_TABLE: [HandleSpec; 8] = [
    HandleSpec {
        role: HandleRole::NW,
        anchor: (0.0, 0.0),
        cursor: "nwse-resize",
    },
    HandleSpec {
        role: HandleRole::N,
        anchor: (0.5, 0.0),
        cursor: "ns-resize",
    },
    HandleSpec {
        role: HandleRole::NE,
        anchor: (1.0, 0.0),
        cursor: "nesw-resize",
    },
    HandleSpec {
        role: HandleRole::E,
        anchor: (1.0, 0.5),
        cursor: "ew-resize",
    },
    HandleSpec {
        role: HandleRole::SE,
        anchor: (1.0, 1.0),
        cursor: "nwse-resize",
    },
    HandleSpec {
        role: HandleRole::S,
        anchor: (0.5, 1.0),
        cursor: "ns-resize",
    },
    HandleSpec {
        role: HandleRole::SW,
        anchor: (0.0, 1.0),
        cursor: "nesw-resize",
    },
    HandleSpec {
        role: HandleRole::W,
        anchor: (0.0, 0.5),
        cursor: "ew-resize",
    },
];

pub const MOVE_CURSOR: &str = "move";

/// A placed handle: its square in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacedHandle {
    pub role: Option<HandleRole>,
    pub cursor: &'static str,
    pub rect: Bounds,
}

impl PlacedHandle {
    pub fn center(&self) -> (f32, f32) {
        self.rect.center()
    }
}

/// What a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleHit {
    Move,
    Resize(HandleRole),
}

/// The handle squares for one selection box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandleSet {
    pub target: Bounds,
    pub move_handle: PlacedHandle,
    pub resize: Vec<PlacedHandle>,
}

impl HandleSet {
    pub fn anchored_to(target: Bounds, cfg: &EditorConfig) -> Self {
        let (cx, _) = target.center();
        let m = cfg.move_handle_size;
        let move_handle = PlacedHandle {
            role: None,
            cursor: MOVE_CURSOR,
            rect: Bounds::new(cx - m / 2.0, target.y + cfg.move_handle_inset - m / 2.0, m, m),
        };

        let r = cfg.resize_handle_size;
        let resize = HANDLE_TABLE
            .iter()
            .map(|spec| {
                let (ax, ay) = target.anchor(spec.anchor.0, spec.anchor.1);
                PlacedHandle {
                    role: Some(spec.role),
                    cursor: spec.cursor,
                    rect: Bounds::new(ax - r / 2.0, ay - r / 2.0, r, r),
                }
            })
            .collect();

        Self {
            target,
            move_handle,
            resize,
        }
    }

    pub fn get(&self, role: HandleRole) -> Option<&PlacedHandle> {
        self.resize.iter().find(|h| h.role == Some(role))
    }

    /// Resize handles win over the move handle; later table entries win
    /// over earlier ones on tiny boxes where squares overlap.
    pub fn hit(&self, x: f32, y: f32) -> Option<HandleHit> {
        if let Some(h) = self.resize.iter().rev().find(|h| h.rect.contains(x, y)) {
            return h.role.map(HandleHit::Resize);
        }
        self.move_handle
            .rect
            .contains(x, y)
            .then_some(HandleHit::Move)
    }

    /// Largest distance between a handle center and its anchor.
    pub fn max_anchor_error(&self) -> f32 {
        self.resize
            .iter()
            .filter_map(|h| {
                let spec = h.role?.spec();
                let (ax, ay) = self.target.anchor(spec.anchor.0, spec.anchor.1);
                let (cx, cy) = h.center();
                Some((ax - cx).abs().max((ay - cy).abs()))
            })
            .fold(0.0, f32::max)
    }
}
