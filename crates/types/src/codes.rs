//! Coded values used by the registry forms and by the RAAS layout.
//!
//! Each code maps to the exact characters written into the export file, so the wire form of every
//! variant is fixed by the government layout and must not change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a string is not a known code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} code: '{value}'")]
pub struct CodeError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            /// Returns the code as written in the export file.
            pub fn code(self) -> &'static str {
                match self {
                    $( $name::$variant => $code, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $name {
            type Err = CodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $( $code => Ok($name::$variant), )+
                    other => Err(CodeError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

code_enum! {
    /// Patient sex as recorded on the RAAS line.
    Sex, "sex" {
        Male => "M",
        Female => "F",
    }
}

code_enum! {
    /// IBGE race/color classification.
    RaceColor, "race/color" {
        White => "01",
        Black => "02",
        /// Parda; the registry default.
        Brown => "03",
        Yellow => "04",
        Indigenous => "05",
    }
}

code_enum! {
    /// Where the patient was referred from.
    PatientOrigin, "origin" {
        /// Spontaneous demand; the registry default.
        SpontaneousDemand => "01",
        PrimaryCare => "02",
        EmergencyService => "03",
        OtherCaps => "04",
        DayHospital => "05",
        PsychiatricHospital => "06",
    }
}

code_enum! {
    /// Outcome of the attendance for the reporting period.
    PatientDestination, "destination" {
        /// Patient stays in care; the registry default.
        Permanence => "00",
        ContinuityOtherCaps => "01",
        ContinuityPrimaryCare => "02",
        Discharge => "03",
        Death => "04",
    }
}

code_enum! {
    /// `S`/`N` flag.
    YesNo, "yes/no" {
        Yes => "S",
        No => "N",
    }
}

impl Default for RaceColor {
    fn default() -> Self {
        RaceColor::Brown
    }
}

impl Default for PatientOrigin {
    fn default() -> Self {
        PatientOrigin::SpontaneousDemand
    }
}

impl Default for PatientDestination {
    fn default() -> Self {
        PatientDestination::Permanence
    }
}

impl Default for YesNo {
    fn default() -> Self {
        YesNo::No
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_layout_widths() {
        assert_eq!(Sex::Female.code().len(), 1);
        assert_eq!(RaceColor::Indigenous.code().len(), 2);
        assert_eq!(PatientOrigin::PsychiatricHospital.code().len(), 2);
        assert_eq!(PatientDestination::Death.code().len(), 2);
        assert_eq!(YesNo::Yes.code().len(), 1);
    }

    #[test]
    fn test_from_str_accepts_codes() {
        assert_eq!("F".parse::<Sex>().expect("parse should succeed"), Sex::Female);
        assert_eq!(
            "04".parse::<PatientOrigin>().expect("parse should succeed"),
            PatientOrigin::OtherCaps
        );
        assert_eq!(
            " 03 ".parse::<PatientDestination>().expect("parse should succeed"),
            PatientDestination::Discharge
        );
    }

    #[test]
    fn test_from_str_rejects_unknown_code() {
        let err = "07".parse::<PatientOrigin>().expect_err("unknown code should fail");
        assert_eq!(err.kind, "origin");
        assert_eq!(err.value, "07");
        assert!("X".parse::<YesNo>().is_err());
    }

    #[test]
    fn test_defaults_follow_registry_forms() {
        assert_eq!(RaceColor::default(), RaceColor::Brown);
        assert_eq!(PatientOrigin::default().code(), "01");
        assert_eq!(PatientDestination::default().code(), "00");
        assert_eq!(YesNo::default(), YesNo::No);
    }

    #[test]
    fn test_serde_uses_wire_codes() {
        let json = serde_json::to_string(&RaceColor::Brown).expect("serialize should succeed");
        assert_eq!(json, "\"03\"");

        let flag: YesNo = serde_json::from_str("\"S\"").expect("deserialize should succeed");
        assert_eq!(flag, YesNo::Yes);
    }
}
