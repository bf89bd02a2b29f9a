//! VM power actions and the legal transition table.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::VmStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerAction {
    PowerOn,
    PowerOff,
    Suspend,
    Reset,
}

impl PowerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerAction::PowerOn => "powerOn",
            PowerAction::PowerOff => "powerOff",
            PowerAction::Suspend => "suspend",
            PowerAction::Reset => "reset",
        }
    }

    /// Parse an action path segment (`powerOn`, `powerOff`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "powerOn" => Some(PowerAction::PowerOn),
            "powerOff" => Some(PowerAction::PowerOff),
            "suspend" => Some(PowerAction::Suspend),
            "reset" => Some(PowerAction::Reset),
            _ => None,
        }
    }

    /// Apply the transition table: returns the resulting status, or a
    /// conflict error when the action is not legal from `current`.
    pub fn apply(&self, current: VmStatus) -> Result<VmStatus, Error> {
        use VmStatus::*;
        let next = match (self, current) {
            (PowerAction::PowerOn, PoweredOff | Suspended | Unresolved) => PoweredOn,
            (PowerAction::PowerOff, PoweredOn | Suspended) => PoweredOff,
            (PowerAction::Suspend, PoweredOn) => Suspended,
            (PowerAction::Reset, PoweredOn) => PoweredOn,
            _ => {
                return Err(Error::conflict(format!(
                    "cannot {} a VM in state {}",
                    self.as_str(),
                    current.as_str()
                )))
            }
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VmStatus::*;

    #[test]
    fn allowed_transitions() {
        assert_eq!(PowerAction::PowerOn.apply(PoweredOff).unwrap(), PoweredOn);
        assert_eq!(PowerAction::PowerOn.apply(Suspended).unwrap(), PoweredOn);
        assert_eq!(PowerAction::PowerOn.apply(Unresolved).unwrap(), PoweredOn);
        assert_eq!(PowerAction::PowerOff.apply(PoweredOn).unwrap(), PoweredOff);
        assert_eq!(PowerAction::PowerOff.apply(Suspended).unwrap(), PoweredOff);
        assert_eq!(PowerAction::Suspend.apply(PoweredOn).unwrap(), Suspended);
        assert_eq!(PowerAction::Reset.apply(PoweredOn).unwrap(), PoweredOn);
    }

    #[test]
    fn disallowed_transitions_conflict() {
        for (action, from) in [
            (PowerAction::PowerOn, PoweredOn),
            (PowerAction::PowerOff, PoweredOff),
            (PowerAction::PowerOff, Unresolved),
            (PowerAction::Suspend, PoweredOff),
            (PowerAction::Suspend, Suspended),
            (PowerAction::Reset, PoweredOff),
            (PowerAction::Reset, Suspended),
            (PowerAction::Reset, Unresolved),
        ] {
            let err = action.apply(from).unwrap_err();
            assert!(matches!(err, Error::Conflict(_)), "{action:?} from {from:?}");
        }
    }

    #[test]
    fn action_path_segments() {
        assert_eq!(PowerAction::parse("powerOn"), Some(PowerAction::PowerOn));
        assert_eq!(PowerAction::parse("powerOff"), Some(PowerAction::PowerOff));
        assert_eq!(PowerAction::parse("poweron"), None);
    }
}
