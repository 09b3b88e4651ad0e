//! Component indices, storage locations, and buffer-slot identifiers.
//!
//! The prognostic state carries five components in a fixed order. The
//! indices below are shared by every stage; tracer fields live in a
//! separate array indexed from zero.

/// Index of the alpha horizontal momentum component (rho u^alpha).
pub const UIX: usize = 0;

/// Index of the beta horizontal momentum component (rho u^beta).
pub const VIX: usize = 1;

/// Index of the potential-temperature density component (rho theta).
pub const PIX: usize = 2;

/// Index of the vertical momentum component (rho w).
pub const WIX: usize = 3;

/// Index of the density component.
pub const RIX: usize = 4;

/// Number of prognostic state components.
pub const STATE_COMPONENTS: usize = 5;

/// Vertical placement of a field.
///
/// Node fields live on model levels (cell centers, L values per column);
/// interface fields live on level edges (L+1 values per column).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarLocation {
    /// Model levels (cell centers).
    Node,
    /// Model interfaces (cell edges).
    REdge,
}

/// Named state buffer slot.
///
/// The grid holds several logically distinct snapshots of the same field
/// layout. The dynamics never own these; stages receive slot identifiers
/// and read or accumulate through the grid. The reference state is held
/// separately by each patch and is not addressable as a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateSlot {
    Initial,
    Update,
    Working,
}

/// Number of addressable state slots.
pub const STATE_SLOTS: usize = 3;

impl StateSlot {
    /// Storage index of this slot.
    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            StateSlot::Initial => 0,
            StateSlot::Update => 1,
            StateSlot::Working => 2,
        }
    }
}

/// Field family addressed by grid-level copy, zero, and continuity
/// operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// The five prognostic components, at both vertical placements.
    State,
    /// The tracer mass fields (node placement only).
    Tracers,
}
