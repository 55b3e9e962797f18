//! History navigation over the backup sequence
//!
//! The backup history is a linear timeline with no explicit cursor: the
//! "current position" is implied by whichever persisted pointer anchors the
//! operation at hand. Everything here is a pure function over the
//! newest-first snapshot sequence plus the loaded [`PointerState`] - no
//! store access, no clocks - so each transition can be tested in isolation
//! and the orchestrator decides when the resulting writes actually happen.
//!
//! The transition rules, including their asymmetry between rollback and
//! roll-forward, are load-bearing: operators rely on the observed pointer
//! movement, so the rules are reproduced exactly rather than normalized
//! into textbook undo/redo.
//!
//! ## Transitions
//!
//! | event | anchor (reference) | rollback pointer | roll-forward pointer |
//! |---|---|---|---|
//! | backup created | the new snapshot | older neighbor, if any | untouched |
//! | rollback | roll-forward pointer | older neighbor, else cleared | newer neighbor, else untouched |
//! | roll-forward | roll-forward pointer | newer neighbor, else untouched | older neighbor, else cleared |
//! | restore to S | S | older neighbor, else cleared | newer neighbor, else cleared |

use crate::error::{Result, StagingError};
use crate::options::{option_key, OptionStore, ROLLBACK_POINT, ROLLFORWARD_POINT};
use crate::types::{Neighbors, PointerState, Snapshot};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locate the snapshots adjacent to `reference` in the newest-first sequence
///
/// `older` is the element one step further back in time, `newer` one step
/// forward. A reference that is not in the sequence (a stale pointer, a
/// deleted file) yields neither neighbor; that is a recoverable condition,
/// never an error.
pub fn neighbors<'a>(sequence: &'a [Snapshot], reference: &Path) -> Neighbors<'a> {
    let Some(index) = sequence.iter().position(|s| s.is(reference)) else {
        debug!("Reference {:?} not found in sequence", reference);
        return Neighbors::default();
    };
    Neighbors {
        older: sequence.get(index + 1),
        newer: index.checked_sub(1).and_then(|i| sequence.get(i)),
    }
}

/// One pending write to a persisted pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerWrite {
    /// Point at the given artifact
    Set(PathBuf),
    /// Remove the pointer entirely
    Clear,
    /// Leave whatever is stored untouched
    Keep,
}

impl PointerWrite {
    fn set_or(neighbor: Option<&Snapshot>, fallback: PointerWrite) -> Self {
        match neighbor {
            Some(snapshot) => PointerWrite::Set(snapshot.path.clone()),
            None => fallback,
        }
    }
}

/// The pointer writes a transition has decided on
///
/// Plans are inert until [`PointerPlan::apply`] persists them; the
/// orchestrator only applies a plan after the import step it belongs to has
/// succeeded, so a failed external tool never moves the pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerPlan {
    /// Pending write to the rollback pointer
    pub rollback: PointerWrite,
    /// Pending write to the roll-forward pointer
    pub rollforward: PointerWrite,
}

impl PointerPlan {
    /// Persist the planned writes through the option store
    pub fn apply(&self, store: &mut dyn OptionStore) -> Result<()> {
        for (name, write) in [
            (ROLLBACK_POINT, &self.rollback),
            (ROLLFORWARD_POINT, &self.rollforward),
        ] {
            match write {
                PointerWrite::Set(path) => {
                    store.set(&option_key(name), &path.to_string_lossy())?;
                    debug!("{} -> {:?}", name, path);
                }
                PointerWrite::Clear => {
                    store.delete(&option_key(name))?;
                    debug!("{} cleared", name);
                }
                PointerWrite::Keep => {}
            }
        }
        Ok(())
    }
}

/// A rollback or roll-forward step: what to import, then what to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationStep {
    /// Artifact whose data gets imported into the environment
    pub import_target: PathBuf,
    /// Pointer writes to apply once the import succeeds
    pub plan: PointerPlan,
}

/// Transition: a new backup was just created
///
/// The fresh snapshot anchors the computation; its older neighbor (the
/// previously newest backup) becomes the rollback point. The roll-forward
/// pointer is never touched by a backup.
pub fn plan_backup_created(sequence: &[Snapshot], created: &Path) -> PointerPlan {
    let adjacent = neighbors(sequence, created);
    PointerPlan {
        rollback: PointerWrite::set_or(adjacent.older, PointerWrite::Keep),
        rollforward: PointerWrite::Keep,
    }
}

/// Transition: roll the environment back to the stored rollback point
///
/// The roll-forward pointer anchors the neighbor computation. Both pointers
/// must be set before anything happens; either one missing aborts with
/// [`StagingError::NoRollbackPoint`] and zero writes. A rollback point whose
/// file has since disappeared is reported as
/// [`StagingError::SnapshotMissing`] instead of being imported blindly.
pub fn plan_rollback(sequence: &[Snapshot], state: &PointerState) -> Result<NavigationStep> {
    let target = state
        .rollback_point
        .clone()
        .ok_or(StagingError::NoRollbackPoint)?;
    let reference = state
        .rollforward_point
        .clone()
        .ok_or(StagingError::NoRollbackPoint)?;

    if !sequence.iter().any(|s| s.is(&target)) {
        return Err(StagingError::SnapshotMissing(target));
    }

    let adjacent = neighbors(sequence, &reference);
    Ok(NavigationStep {
        import_target: target,
        plan: PointerPlan {
            rollback: PointerWrite::set_or(adjacent.older, PointerWrite::Clear),
            rollforward: PointerWrite::set_or(adjacent.newer, PointerWrite::Keep),
        },
    })
}

/// Transition: roll the environment forward to the stored roll-forward point
///
/// The roll-forward pointer is both the import target and the reference.
/// Its older neighbor becomes the next roll-forward target; when none
/// exists this was the last possible roll-forward and the pointer is
/// cleared. The rollback pointer moves to the newer neighbor when one
/// exists, otherwise it stays the same.
pub fn plan_rollforward(sequence: &[Snapshot], state: &PointerState) -> Result<NavigationStep> {
    let reference = state
        .rollforward_point
        .clone()
        .ok_or(StagingError::NoRollforwardPoint)?;

    if !sequence.iter().any(|s| s.is(&reference)) {
        return Err(StagingError::SnapshotMissing(reference));
    }

    let adjacent = neighbors(sequence, &reference);
    Ok(NavigationStep {
        import_target: reference,
        plan: PointerPlan {
            rollback: PointerWrite::set_or(adjacent.newer, PointerWrite::Keep),
            rollforward: PointerWrite::set_or(adjacent.older, PointerWrite::Clear),
        },
    })
}

/// Transition: restore an explicitly chosen snapshot
///
/// Both pointers re-anchor on the chosen snapshot's neighbors; a missing
/// neighbor clears the corresponding pointer rather than leaving it stale.
pub fn plan_restore(sequence: &[Snapshot], chosen: &Snapshot) -> PointerPlan {
    let adjacent = neighbors(sequence, &chosen.path);
    PointerPlan {
        rollback: PointerWrite::set_or(adjacent.older, PointerWrite::Clear),
        rollforward: PointerWrite::set_or(adjacent.newer, PointerWrite::Clear),
    }
}
