//! Constants used throughout the CAPS core crate.
//!
//! Collection directory names and record file names live here so the YAML store layout is
//! defined in one place.

/// Default directory for registry data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "caps_data";

/// Directory name for patient records.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Directory name for professional records.
pub const PROFESSIONALS_DIR_NAME: &str = "professionals";

/// Directory name for procedure records.
pub const PROCEDURES_DIR_NAME: &str = "procedures";

/// Directory name for attendance records.
pub const ATTENDANCES_DIR_NAME: &str = "attendances";

/// Directory name for attendance action records.
pub const ACTIONS_DIR_NAME: &str = "attendance_actions";

/// Filename for patient YAML files.
pub const PATIENT_FILENAME: &str = "patient.yaml";

/// Filename for professional YAML files.
pub const PROFESSIONAL_FILENAME: &str = "professional.yaml";

/// Filename for procedure YAML files.
pub const PROCEDURE_FILENAME: &str = "procedure.yaml";

/// Filename for attendance YAML files.
pub const ATTENDANCE_FILENAME: &str = "attendance.yaml";

/// Filename for attendance action YAML files.
pub const ACTION_FILENAME: &str = "action.yaml";

/// Environment variable naming the store root directory.
pub const DATA_DIR_ENV: &str = "CAPS_DATA_DIR";

/// Environment variable naming an optional facility YAML file.
pub const FACILITY_FILE_ENV: &str = "CAPS_FACILITY_FILE";

/// Environment variable selecting the store backend (`file` or `memory`).
pub const STORE_ENV: &str = "CAPS_STORE";
