//! # Navigation control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A telecommand which can be executed by navigation control.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NavTc {
    /// Append a waypoint to the end of the target queue.
    AddTarget {
        /// Latitude of the waypoint in degrees.
        lat_deg: f64,

        /// Longitude of the waypoint in degrees.
        lon_deg: f64,
    },

    /// Empty the target queue, abandon the current target and stop immediately.
    ClearTargets,

    /// Set the wheel speed ceiling.
    ///
    /// The value is clamped by navigation control into its supported PWM range.
    SetSpeed {
        /// Ceiling wheel PWM.
        pwm: f64,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mission_toml() {
        #[derive(Deserialize)]
        struct Mission {
            tcs: Vec<NavTc>,
        }

        let mission: Mission = toml::from_str(
            r#"
            [[tcs]]
            type = "SetSpeed"
            pwm = 200.0

            [[tcs]]
            type = "AddTarget"
            lat_deg = 50.0001
            lon_deg = 19.999

            [[tcs]]
            type = "ClearTargets"
            "#,
        )
        .unwrap();

        assert_eq!(
            mission.tcs,
            vec![
                NavTc::SetSpeed { pwm: 200.0 },
                NavTc::AddTarget {
                    lat_deg: 50.0001,
                    lon_deg: 19.999
                },
                NavTc::ClearTargets
            ]
        );
    }
}
