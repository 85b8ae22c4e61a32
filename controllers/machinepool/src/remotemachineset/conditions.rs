//! Set-if-changed helpers for MachinePool status conditions.
//!
//! Pool status is only written when a condition actually changes, so an
//! unchanged state never produces a status write (and the watch event that
//! would follow it).

use chrono::Utc;
use crds::{ConditionStatus, MachinePoolCondition};

/// Decides whether a condition whose status is unchanged should still be
/// rewritten, given `(old_reason, old_message, new_reason, new_message)`.
pub type UpdateConditionCheck = fn(&str, &str, &str, &str) -> bool;

/// Rewrite when the reason or message differs.
pub fn update_condition_if_reason_or_message_change(
    old_reason: &str,
    old_message: &str,
    new_reason: &str,
    new_message: &str,
) -> bool {
    old_reason != new_reason || old_message != new_message
}

/// Only rewrite on a status flip.
pub fn update_condition_never(_: &str, _: &str, _: &str, _: &str) -> bool {
    false
}

/// Pure comparison: does `existing` need rewriting to reach the desired
/// status/reason/message?
pub fn condition_needs_update(
    existing: &MachinePoolCondition,
    status: ConditionStatus,
    reason: &str,
    message: &str,
    update_check: UpdateConditionCheck,
) -> bool {
    if existing.status != status {
        return true;
    }
    update_check(&existing.reason, &existing.message, reason, message)
}

/// Find the condition of `condition_type`, if present.
pub fn find_condition<'a>(
    conditions: &'a [MachinePoolCondition],
    condition_type: &str,
) -> Option<&'a MachinePoolCondition> {
    conditions.iter().find(|c| c.type_ == condition_type)
}

/// Apply the desired condition to `conditions`, returning the new list and
/// whether anything changed.
///
/// An absent condition is only added when it is `True`. The transition
/// time moves only when the status flips.
pub fn set_condition_with_change_check(
    conditions: &[MachinePoolCondition],
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
    update_check: UpdateConditionCheck,
) -> (Vec<MachinePoolCondition>, bool) {
    let now = Utc::now();
    let mut conditions = conditions.to_vec();

    match conditions.iter().position(|c| c.type_ == condition_type) {
        None => {
            if status != ConditionStatus::True {
                return (conditions, false);
            }
            conditions.push(MachinePoolCondition {
                type_: condition_type.to_string(),
                status,
                reason: reason.to_string(),
                message: message.to_string(),
                last_probe_time: Some(now),
                last_transition_time: Some(now),
            });
            (conditions, true)
        }
        Some(index) => {
            let existing = &mut conditions[index];
            if !condition_needs_update(existing, status, reason, message, update_check) {
                return (conditions, false);
            }
            if existing.status != status {
                existing.last_transition_time = Some(now);
            }
            existing.status = status;
            existing.reason = reason.to_string();
            existing.message = message.to_string();
            existing.last_probe_time = Some(now);
            (conditions, true)
        }
    }
}
